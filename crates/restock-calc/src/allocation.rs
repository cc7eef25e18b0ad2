//! 分倉數量分配

use restock_core::{Mode, SkuFact};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// 各段建議數量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Allocation {
    /// 建議採購量
    pub purchase: u32,
    /// 本地倉發 FBA
    pub local_to_fba: u32,
    /// 本地倉發海外倉
    pub local_to_overseas: u32,
    /// 海外倉發 FBA
    pub overseas_to_fba: u32,
}

/// 分配計算器
pub struct AllocationCalculator;

impl AllocationCalculator {
    /// 目標備貨量：`ceil(日均 × 備貨天數)`
    pub fn target_quantity(velocity: Decimal, cover_days: u32) -> u64 {
        if velocity <= Decimal::ZERO {
            return 0;
        }
        velocity
            .checked_mul(Decimal::from(cover_days))
            .map(|qty| qty.ceil().to_u64().unwrap_or(u64::MAX))
            .unwrap_or(u64::MAX)
    }

    /// FBA 缺口：目標量扣除 FBA 現有與在途
    pub fn fba_need(fact: &SkuFact, target: u64) -> u64 {
        target.saturating_sub(fact.fba.pipeline())
    }

    /// 依路由模式分配
    pub fn allocate(fact: &SkuFact, need: u64) -> Allocation {
        match fact.mode {
            Mode::Direct => Self::direct(fact, need),
            Mode::OverseasTransit => Self::overseas_transit(fact, need),
        }
    }

    /// 普通模式：缺口先由本地倉直發 FBA，本地在途抵扣後不足部分採購
    fn direct(fact: &SkuFact, need: u64) -> Allocation {
        let local_to_fba = need.min(u64::from(fact.local.on_hand));
        let purchase = need
            .saturating_sub(local_to_fba)
            .saturating_sub(u64::from(fact.local.in_transit));

        Allocation {
            purchase: clamp(purchase),
            local_to_fba: clamp(local_to_fba),
            local_to_overseas: 0,
            overseas_to_fba: 0,
        }
    }

    /// 海外倉中轉模式：海外倉現有 → 海外倉在途 → 本地倉現有 → 本地在途，不足部分採購
    ///
    /// 本地倉不直發 FBA，發往海外倉的量不超過海外倉扣除現有與在途後的缺口。
    fn overseas_transit(fact: &SkuFact, need: u64) -> Allocation {
        let overseas_to_fba = need.min(u64::from(fact.overseas.on_hand));
        let remaining = need
            .saturating_sub(overseas_to_fba)
            .saturating_sub(u64::from(fact.overseas.in_transit));

        let local_to_overseas = remaining.min(u64::from(fact.local.on_hand));
        let purchase = remaining
            .saturating_sub(local_to_overseas)
            .saturating_sub(u64::from(fact.local.in_transit));

        Allocation {
            purchase: clamp(purchase),
            local_to_fba: 0,
            local_to_overseas: clamp(local_to_overseas),
            overseas_to_fba: clamp(overseas_to_fba),
        }
    }
}

fn clamp(qty: u64) -> u32 {
    u32::try_from(qty).unwrap_or(u32::MAX)
}
