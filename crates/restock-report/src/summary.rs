//! 彙總統計

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Evaluated;

/// 平均可售天數保留的小數位
const AVG_DAYS_SCALE: u32 = 2;

/// 單一店鋪的統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStats {
    pub items: usize,
    pub urgent_items: usize,
    pub suggested_purchase: u64,
}

/// 補貨彙總報告
///
/// 每次都由完整的建議集合重新計算，不做增量更新。
/// 分類不互斥：同一筆可以同時計入緊急與高銷量。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryReport {
    /// 總筆數
    pub total_items: usize,

    /// 緊急筆數（斷貨或低於門檻）
    pub urgent_items: usize,

    /// 斷貨筆數
    pub out_of_stock_items: usize,

    /// 高銷量筆數
    pub high_sales_items: usize,

    /// 建議採購總量
    pub total_suggested_purchase: u64,

    /// 平均可售天數（只計有限且大於 0 的值）
    pub avg_available_days: Decimal,

    /// 按店鋪統計
    pub account_stats: BTreeMap<String, AccountStats>,
}

impl SummaryReport {
    /// 由建議集合計算彙總
    pub fn from_decisions(decisions: &[Evaluated]) -> Self {
        let mut report = SummaryReport {
            total_items: decisions.len(),
            ..Default::default()
        };

        let mut days_sum = Decimal::ZERO;
        let mut days_count: u32 = 0;

        for (fact, decision) in decisions {
            let urgent = decision.is_urgent();
            if urgent {
                report.urgent_items += 1;
            }
            if decision.flags.out_of_stock {
                report.out_of_stock_items += 1;
            }
            if decision.flags.high_sales {
                report.high_sales_items += 1;
            }
            report.total_suggested_purchase = report
                .total_suggested_purchase
                .saturating_add(u64::from(decision.purchase_qty));

            if let Some(days) = decision.available_sale_days.finite() {
                if days > Decimal::ZERO {
                    // 上游天數不做上限檢查，累加須飽和
                    days_sum = days_sum.saturating_add(days);
                    days_count += 1;
                }
            }

            let stats = report
                .account_stats
                .entry(fact.account_id.clone())
                .or_default();
            stats.items += 1;
            if urgent {
                stats.urgent_items += 1;
            }
            stats.suggested_purchase += u64::from(decision.purchase_qty);
        }

        if days_count > 0 {
            report.avg_available_days =
                (days_sum / Decimal::from(days_count)).round_dp(AVG_DAYS_SCALE);
        }

        report
    }
}
