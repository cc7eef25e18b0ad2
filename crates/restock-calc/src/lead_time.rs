//! 建議日期計算

use chrono::{Days, NaiveDate};

/// 交期計算器
pub struct LeadTimeCalculator;

impl LeadTimeCalculator {
    /// 計算某一段的建議日期
    ///
    /// 數量為 0 的段沒有日期；否則為 `as_of + lead_days`。
    pub fn action_date(as_of: NaiveDate, lead_days: u32, quantity: u32) -> Option<NaiveDate> {
        if quantity == 0 {
            return None;
        }
        as_of.checked_add_days(Days::new(u64::from(lead_days)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_date_offset() {
        let as_of = NaiveDate::from_ymd_opt(2025, 11, 28).unwrap();

        assert_eq!(
            LeadTimeCalculator::action_date(as_of, 5, 10),
            NaiveDate::from_ymd_opt(2025, 12, 3)
        );
        assert_eq!(LeadTimeCalculator::action_date(as_of, 0, 1), Some(as_of));
    }

    #[test]
    fn test_zero_quantity_has_no_date() {
        let as_of = NaiveDate::from_ymd_opt(2025, 11, 28).unwrap();
        assert_eq!(LeadTimeCalculator::action_date(as_of, 5, 0), None);
    }
}
