//! 補貨建議模型（計算結果）

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Mode, SkuId};

/// 可售天數
///
/// 銷量為 0 時庫存永遠賣不完，記為 `Unbounded`；排序時排在所有有限值之後。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleDays {
    Finite(Decimal),
    Unbounded,
}

impl SaleDays {
    pub fn finite(&self) -> Option<Decimal> {
        match self {
            SaleDays::Finite(days) => Some(*days),
            SaleDays::Unbounded => None,
        }
    }

    /// 是否已經斷貨（有限且 ≤ 0）
    pub fn is_exhausted(&self) -> bool {
        matches!(self, SaleDays::Finite(days) if *days <= Decimal::ZERO)
    }

    /// 是否低於門檻（有限且 < threshold）
    pub fn is_below(&self, threshold: Decimal) -> bool {
        matches!(self, SaleDays::Finite(days) if *days < threshold)
    }
}

/// 緊急程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyTier {
    /// 已斷貨
    OutOfStock,
    /// 可售天數低於門檻
    Urgent,
    /// 30 天日均高於門檻
    HighSales,
    /// 正常
    Normal,
}

impl UrgencyTier {
    pub fn label(self) -> &'static str {
        match self {
            UrgencyTier::OutOfStock => "out_of_stock",
            UrgencyTier::Urgent => "urgent",
            UrgencyTier::HighSales => "high_sales",
            UrgencyTier::Normal => "normal",
        }
    }
}

/// 各分類的命中情況（可同時命中多個）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UrgencyFlags {
    pub out_of_stock: bool,
    pub urgent: bool,
    pub high_sales: bool,
}

impl UrgencyFlags {
    /// 主分類：斷貨 > 緊急 > 高銷量 > 正常
    pub fn tier(&self) -> UrgencyTier {
        if self.out_of_stock {
            UrgencyTier::OutOfStock
        } else if self.urgent {
            UrgencyTier::Urgent
        } else if self.high_sales {
            UrgencyTier::HighSales
        } else {
            UrgencyTier::Normal
        }
    }

    /// 需要緊急處理（斷貨或低於門檻）
    pub fn needs_attention(&self) -> bool {
        self.out_of_stock || self.urgent
    }
}

/// 單一 SKU 的補貨建議
///
/// 只由一筆 `SkuFact` 推導，同樣輸入得到同樣結果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplenishmentDecision {
    /// 店鋪ID
    pub account_id: String,

    /// SKU 識別碼
    pub sku: SkuId,

    /// 路由模式
    pub mode: Mode,

    /// 有效日均銷量
    pub effective_velocity: Decimal,

    /// 可售天數
    pub available_sale_days: SaleDays,

    /// 建議採購量
    pub purchase_qty: u32,

    /// 建議本地倉發 FBA
    pub local_to_fba_qty: u32,

    /// 建議本地倉發海外倉
    pub local_to_overseas_qty: u32,

    /// 建議海外倉發 FBA
    pub overseas_to_fba_qty: u32,

    /// 建議採購日期
    pub purchase_date: Option<NaiveDate>,

    /// 建議本地發貨日期
    pub local_ship_date: Option<NaiveDate>,

    /// 建議海外倉發貨日期
    pub overseas_ship_date: Option<NaiveDate>,

    /// 分類命中情況
    pub flags: UrgencyFlags,
}

impl ReplenishmentDecision {
    /// 主分類
    pub fn tier(&self) -> UrgencyTier {
        self.flags.tier()
    }

    /// 是否需要緊急處理
    pub fn is_urgent(&self) -> bool {
        self.flags.needs_attention()
    }

    /// 調撥總量（不含採購）
    pub fn total_transfer_qty(&self) -> u64 {
        u64::from(self.local_to_fba_qty)
            + u64::from(self.local_to_overseas_qty)
            + u64::from(self.overseas_to_fba_qty)
    }

    /// 是否有任何建議動作
    pub fn has_action(&self) -> bool {
        self.purchase_qty > 0 || self.total_transfer_qty() > 0
    }
}
