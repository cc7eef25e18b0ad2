//! 緊急與高銷量清單排序

use serde::{Deserialize, Serialize};

use crate::Evaluated;

/// 緊急清單中可售天數相同時的次序
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgentOrdering {
    /// 有效日均高者在前
    #[default]
    VelocityDesc,
    /// 保留輸入順序
    InputOrder,
}

/// 緊急清單：可售天數由小到大，`Unbounded` 排最後
pub fn urgent(decisions: &[Evaluated], ordering: UrgentOrdering) -> Vec<Evaluated> {
    let mut items: Vec<Evaluated> = decisions
        .iter()
        .filter(|(_, decision)| decision.is_urgent())
        .cloned()
        .collect();

    items.sort_by(|(_, a), (_, b)| {
        let by_days = a.available_sale_days.cmp(&b.available_sale_days);
        match ordering {
            UrgentOrdering::VelocityDesc => {
                by_days.then_with(|| b.effective_velocity.cmp(&a.effective_velocity))
            }
            UrgentOrdering::InputOrder => by_days,
        }
    });

    items
}

/// 高銷量清單：30 天日均由大到小
pub fn high_sales(decisions: &[Evaluated]) -> Vec<Evaluated> {
    let mut items: Vec<Evaluated> = decisions
        .iter()
        .filter(|(_, decision)| decision.flags.high_sales)
        .cloned()
        .collect();

    items.sort_by(|(a, _), (b, _)| {
        b.sales.avg_30_or_zero().cmp(&a.sales.avg_30_or_zero())
    });

    items
}
