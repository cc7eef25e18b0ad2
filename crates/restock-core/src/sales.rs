//! 銷量視窗模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 固定回看視窗的日均銷量（3/7/14/30 天）
///
/// `None` 表示上游沒有提供該視窗。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesWindows {
    pub avg_3: Option<Decimal>,
    pub avg_7: Option<Decimal>,
    pub avg_14: Option<Decimal>,
    pub avg_30: Option<Decimal>,
}

impl SalesWindows {
    /// 創建空的銷量視窗
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置 3 天日均
    pub fn with_avg_3(mut self, avg: Decimal) -> Self {
        self.avg_3 = Some(avg);
        self
    }

    /// 建構器模式：設置 7 天日均
    pub fn with_avg_7(mut self, avg: Decimal) -> Self {
        self.avg_7 = Some(avg);
        self
    }

    /// 建構器模式：設置 14 天日均
    pub fn with_avg_14(mut self, avg: Decimal) -> Self {
        self.avg_14 = Some(avg);
        self
    }

    /// 建構器模式：設置 30 天日均
    pub fn with_avg_30(mut self, avg: Decimal) -> Self {
        self.avg_30 = Some(avg);
        self
    }

    /// 按回退順序排列的視窗：30 → 14 → 7 → 3
    pub fn fallback_order(&self) -> [Option<Decimal>; 4] {
        [self.avg_30, self.avg_14, self.avg_7, self.avg_3]
    }

    /// 30 天日均（未提供視為 0）
    pub fn avg_30_or_zero(&self) -> Decimal {
        self.avg_30.unwrap_or(Decimal::ZERO)
    }

    /// 以另一組視窗補齊缺少的值
    pub fn fill_missing(&self, other: &SalesWindows) -> SalesWindows {
        SalesWindows {
            avg_3: self.avg_3.or(other.avg_3),
            avg_7: self.avg_7.or(other.avg_7),
            avg_14: self.avg_14.or(other.avg_14),
            avg_30: self.avg_30.or(other.avg_30),
        }
    }

    /// 第一個為負的視窗（天數, 值）
    pub fn first_negative(&self) -> Option<(u32, Decimal)> {
        [
            (3, self.avg_3),
            (7, self.avg_7),
            (14, self.avg_14),
            (30, self.avg_30),
        ]
        .into_iter()
        .find_map(|(days, avg)| avg.filter(|v| v.is_sign_negative() && !v.is_zero()).map(|v| (days, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_missing_keeps_existing_values() {
        let page = SalesWindows::new()
            .with_avg_7(Decimal::from(4))
            .with_avg_30(Decimal::from(3));
        let detail = SalesWindows::new()
            .with_avg_3(Decimal::from(6))
            .with_avg_7(Decimal::from(99))
            .with_avg_14(Decimal::from(5));

        let merged = page.fill_missing(&detail);

        assert_eq!(merged.avg_3, Some(Decimal::from(6)));
        assert_eq!(merged.avg_7, Some(Decimal::from(4)));
        assert_eq!(merged.avg_14, Some(Decimal::from(5)));
        assert_eq!(merged.avg_30, Some(Decimal::from(3)));
    }

    #[test]
    fn test_first_negative() {
        let windows = SalesWindows::new()
            .with_avg_7(Decimal::from(2))
            .with_avg_14(Decimal::from(-1));
        assert_eq!(windows.first_negative(), Some((14, Decimal::from(-1))));
        assert_eq!(SalesWindows::new().first_negative(), None);
    }
}
