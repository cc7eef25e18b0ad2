//! 補貨建議主計算器

use chrono::NaiveDate;
use rayon::prelude::*;
use restock_core::{PlanningConfig, ReplenishmentDecision, SkuFact};

use crate::{AllocationCalculator, LeadTimeCalculator, UrgencyClassifier, VelocityCalculator};

/// 補貨建議計算器
///
/// 純計算：只依賴輸入的 `SkuFact`、配置與基準日期，不做任何 I/O。
#[derive(Debug, Clone)]
pub struct SuggestionCalculator {
    /// 計劃配置
    config: PlanningConfig,

    /// 基準日期（建議日期 = 基準日期 + 偏移）
    as_of: NaiveDate,
}

impl SuggestionCalculator {
    /// 創建新的計算器
    pub fn new(config: PlanningConfig, as_of: NaiveDate) -> Self {
        Self { config, as_of }
    }

    pub fn config(&self) -> &PlanningConfig {
        &self.config
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// 計算單一 SKU 的補貨建議
    ///
    /// # Panics
    /// 輸入資料不合法（例如銷量為負）時直接 panic，這屬於呼叫端錯誤。
    pub fn evaluate(&self, fact: &SkuFact) -> ReplenishmentDecision {
        if let Err(err) = fact.validate() {
            panic!("不合法的 SKU 資料傳入計算器: {}", err);
        }

        // Step 1: 有效日均銷量
        let velocity = VelocityCalculator::effective(&fact.sales);

        // Step 2: 可售天數
        let days = VelocityCalculator::available_days(fact, velocity);

        // Step 3: 目標量與 FBA 缺口
        let target = AllocationCalculator::target_quantity(velocity, self.config.target_cover_days);
        let need = AllocationCalculator::fba_need(fact, target);

        // Step 4: 依模式分配
        let allocation = AllocationCalculator::allocate(fact, need);

        // Step 5: 建議日期
        let local_leg = allocation.local_to_fba.max(allocation.local_to_overseas);
        let purchase_date = LeadTimeCalculator::action_date(
            self.as_of,
            self.config.purchase_lead_days,
            allocation.purchase,
        );
        let local_ship_date = LeadTimeCalculator::action_date(
            self.as_of,
            self.config.local_ship_lead_days,
            local_leg,
        );
        let overseas_ship_date = LeadTimeCalculator::action_date(
            self.as_of,
            self.config.overseas_ship_lead_days,
            allocation.overseas_to_fba,
        );

        // Step 6: 緊急分類
        let flags = UrgencyClassifier::classify(fact, days, &self.config);

        tracing::debug!(
            "SKU {} 日均 {} 可售天數 {:?} 目標 {} 缺口 {} 分類 {}",
            fact.sku,
            velocity,
            days,
            target,
            need,
            flags.tier().label()
        );

        ReplenishmentDecision {
            account_id: fact.account_id.clone(),
            sku: fact.sku.clone(),
            mode: fact.mode,
            effective_velocity: velocity,
            available_sale_days: days,
            purchase_qty: allocation.purchase,
            local_to_fba_qty: allocation.local_to_fba,
            local_to_overseas_qty: allocation.local_to_overseas,
            overseas_to_fba_qty: allocation.overseas_to_fba,
            purchase_date,
            local_ship_date,
            overseas_ship_date,
            flags,
        }
    }

    /// 批次計算（並行），結果順序與輸入一致
    pub fn evaluate_all(&self, facts: Vec<SkuFact>) -> Vec<(SkuFact, ReplenishmentDecision)> {
        tracing::info!("開始計算補貨建議：SKU {} 筆", facts.len());
        let start_time = std::time::Instant::now();

        let results: Vec<(SkuFact, ReplenishmentDecision)> = facts
            .into_par_iter()
            .map(|fact| {
                let decision = self.evaluate(&fact);
                (fact, decision)
            })
            .collect();

        tracing::info!("補貨建議計算完成，耗時 {:?}", start_time.elapsed());
        results
    }
}
