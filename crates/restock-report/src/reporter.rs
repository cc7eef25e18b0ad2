//! 報告產生器

use crate::{ranking, Evaluated, SummaryReport, UrgentOrdering};

/// 報告產生器
///
/// 純彙總，不做 I/O；輸出格式由外部匯出層負責。
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    ordering: UrgentOrdering,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置緊急清單的同值次序
    pub fn with_ordering(mut self, ordering: UrgentOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// 彙總統計
    pub fn summarize(&self, decisions: &[Evaluated]) -> SummaryReport {
        let report = SummaryReport::from_decisions(decisions);
        tracing::info!(
            "彙總完成：共 {} 筆，緊急 {} 筆，斷貨 {} 筆，高銷量 {} 筆，建議採購 {}",
            report.total_items,
            report.urgent_items,
            report.out_of_stock_items,
            report.high_sales_items,
            report.total_suggested_purchase
        );
        report
    }

    /// 緊急清單
    pub fn urgent(&self, decisions: &[Evaluated]) -> Vec<Evaluated> {
        ranking::urgent(decisions, self.ordering)
    }

    /// 高銷量清單
    pub fn high_sales(&self, decisions: &[Evaluated]) -> Vec<Evaluated> {
        ranking::high_sales(decisions)
    }
}
