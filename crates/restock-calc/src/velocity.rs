//! 日均銷量與可售天數

use restock_core::{SaleDays, SalesWindows, SkuFact};
use rust_decimal::Decimal;

/// 可售天數保留的小數位
const SALE_DAYS_SCALE: u32 = 2;

/// 銷量計算器
pub struct VelocityCalculator;

impl VelocityCalculator {
    /// 有效日均銷量
    ///
    /// 依序取 30 → 14 → 7 → 3 天視窗中第一個大於 0 的值，都沒有則為 0。
    pub fn effective(sales: &SalesWindows) -> Decimal {
        sales
            .fallback_order()
            .into_iter()
            .flatten()
            .find(|avg| *avg > Decimal::ZERO)
            .unwrap_or(Decimal::ZERO)
    }

    /// 可售天數
    ///
    /// 上游有提供時直接採用；否則以 FBA 現有庫存除以有效日均推算，日均為 0 時為 `Unbounded`。
    pub fn available_days(fact: &SkuFact, velocity: Decimal) -> SaleDays {
        if let Some(days) = fact.available_sale_days {
            return SaleDays::Finite(days);
        }

        if velocity <= Decimal::ZERO {
            return SaleDays::Unbounded;
        }

        match Decimal::from(fact.fba.on_hand).checked_div(velocity) {
            Some(days) => SaleDays::Finite(days.round_dp(SALE_DAYS_SCALE)),
            None => SaleDays::Unbounded,
        }
    }
}
