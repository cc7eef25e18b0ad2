//! 緊急程度分類

use restock_core::{PlanningConfig, SaleDays, SkuFact, UrgencyFlags};

/// 緊急程度分類器
pub struct UrgencyClassifier;

impl UrgencyClassifier {
    /// 計算分類命中情況
    ///
    /// 斷貨：可售天數 ≤ 0 或 FBA 現有庫存為 0（不論銷量）；
    /// 緊急：可售天數低於門檻（`Unbounded` 永不緊急）；
    /// 高銷量：30 天日均高於門檻。
    pub fn classify(fact: &SkuFact, days: SaleDays, config: &PlanningConfig) -> UrgencyFlags {
        UrgencyFlags {
            out_of_stock: days.is_exhausted() || fact.fba.on_hand == 0,
            urgent: days.is_below(config.urgent_days_threshold),
            high_sales: fact.sales.avg_30_or_zero() > config.high_sales_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restock_core::{ChannelStock, Mode, SalesWindows, SkuId, UrgencyTier};
    use rust_decimal::Decimal;

    fn fact(on_hand: u32, avg_30: i64) -> SkuFact {
        SkuFact::new("1", SkuId::Asin("B0TEST".to_string()), Mode::Direct)
            .with_fba(ChannelStock::on_hand(on_hand))
            .with_sales(SalesWindows::new().with_avg_30(Decimal::from(avg_30)))
    }

    #[test]
    fn test_unbounded_is_never_urgent() {
        let flags = UrgencyClassifier::classify(
            &fact(10, 0),
            SaleDays::Unbounded,
            &PlanningConfig::default(),
        );
        assert_eq!(flags.tier(), UrgencyTier::Normal);
    }

    #[test]
    fn test_empty_fba_is_out_of_stock_even_unbounded() {
        let flags = UrgencyClassifier::classify(
            &fact(0, 0),
            SaleDays::Unbounded,
            &PlanningConfig::default(),
        );
        assert!(flags.out_of_stock);
        assert!(!flags.urgent);
    }

    #[test]
    fn test_categories_are_not_exclusive() {
        let flags = UrgencyClassifier::classify(
            &fact(10, 50),
            SaleDays::Finite(Decimal::from(3)),
            &PlanningConfig::default(),
        );
        assert!(flags.urgent);
        assert!(flags.high_sales);
        assert_eq!(flags.tier(), UrgencyTier::Urgent);
    }

    #[test]
    fn test_threshold_boundaries() {
        let config = PlanningConfig::default();

        // 剛好等於門檻不算
        let flags = UrgencyClassifier::classify(&fact(10, 10), SaleDays::Finite(Decimal::from(7)), &config);
        assert!(!flags.urgent);
        assert!(!flags.high_sales);
    }
}
