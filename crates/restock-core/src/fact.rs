//! SKU 原始資料模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ChannelStock, RestockError, SalesWindows};

/// 資料維度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// ASIN 維度
    Asin,
    /// MSKU 維度
    Msku,
}

impl Dimension {
    /// 上游 API 使用的維度代碼
    pub fn code(self) -> u8 {
        match self {
            Dimension::Asin => 1,
            Dimension::Msku => 2,
        }
    }

    /// 從上游代碼解析
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Dimension::Asin),
            2 => Some(Dimension::Msku),
            _ => None,
        }
    }
}

/// 補貨路由模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// 普通模式：本地倉直發 FBA
    Direct,
    /// 海外倉中轉模式：本地倉 → 海外倉 → FBA
    OverseasTransit,
}

impl Mode {
    /// 上游 API 使用的模式代碼
    pub fn code(self) -> u8 {
        match self {
            Mode::Direct => 0,
            Mode::OverseasTransit => 1,
        }
    }

    /// 從上游代碼解析
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Mode::Direct),
            1 => Some(Mode::OverseasTransit),
            _ => None,
        }
    }
}

/// SKU 識別碼：MSKU 或 ASIN
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SkuId {
    Msku(String),
    Asin(String),
}

impl SkuId {
    pub fn as_str(&self) -> &str {
        match self {
            SkuId::Msku(value) | SkuId::Asin(value) => value,
        }
    }

    /// 對應的資料維度
    pub fn dimension(&self) -> Dimension {
        match self {
            SkuId::Msku(_) => Dimension::Msku,
            SkuId::Asin(_) => Dimension::Asin,
        }
    }
}

impl std::fmt::Display for SkuId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkuId::Msku(value) => write!(f, "msku:{}", value),
            SkuId::Asin(value) => write!(f, "asin:{}", value),
        }
    }
}

/// 單一 SKU 的原始資料（一次抓取的快照）
///
/// 以 `(account_id, sku)` 為鍵；抓取後不再修改，下一次抓取取代之。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuFact {
    /// 店鋪ID
    pub account_id: String,

    /// SKU 識別碼
    pub sku: SkuId,

    /// 路由模式
    pub mode: Mode,

    /// 日均銷量
    pub sales: SalesWindows,

    /// 上游提供的可售天數（可能缺失）
    pub available_sale_days: Option<Decimal>,

    /// 本地倉（在途 = 採購在途）
    pub local: ChannelStock,

    /// 海外倉
    pub overseas: ChannelStock,

    /// FBA 倉
    pub fba: ChannelStock,
}

impl SkuFact {
    /// 創建新的 SKU 資料（無銷量、無庫存）
    pub fn new(account_id: impl Into<String>, sku: SkuId, mode: Mode) -> Self {
        Self {
            account_id: account_id.into(),
            sku,
            mode,
            sales: SalesWindows::default(),
            available_sale_days: None,
            local: ChannelStock::default(),
            overseas: ChannelStock::default(),
            fba: ChannelStock::default(),
        }
    }

    /// 建構器模式：設置銷量視窗
    pub fn with_sales(mut self, sales: SalesWindows) -> Self {
        self.sales = sales;
        self
    }

    /// 建構器模式：設置上游可售天數
    pub fn with_available_sale_days(mut self, days: Decimal) -> Self {
        self.available_sale_days = Some(days);
        self
    }

    /// 建構器模式：設置本地倉庫存
    pub fn with_local(mut self, stock: ChannelStock) -> Self {
        self.local = stock;
        self
    }

    /// 建構器模式：設置海外倉庫存
    pub fn with_overseas(mut self, stock: ChannelStock) -> Self {
        self.overseas = stock;
        self
    }

    /// 建構器模式：設置 FBA 庫存
    pub fn with_fba(mut self, stock: ChannelStock) -> Self {
        self.fba = stock;
        self
    }

    /// FBA 現有可售數量
    pub fn on_hand(&self) -> u32 {
        self.fba.on_hand
    }

    /// 檢查資料是否合法（銷量不得為負）
    pub fn validate(&self) -> crate::Result<()> {
        if let Some((days, value)) = self.sales.first_negative() {
            return Err(RestockError::InvalidFact {
                sku: self.sku.to_string(),
                reason: format!("{} 天日均銷量為負: {}", days, value),
            });
        }
        Ok(())
    }

    /// 以明細資料補齊缺少的銷量視窗與可售天數，庫存以本筆為準
    pub fn merged_with(&self, detail: &SkuFact) -> SkuFact {
        SkuFact {
            sales: self.sales.fill_missing(&detail.sales),
            available_sale_days: self.available_sale_days.or(detail.available_sale_days),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SkuFact {
        SkuFact::new("101", SkuId::Msku("MSKU-A".to_string()), Mode::Direct)
            .with_sales(SalesWindows::new().with_avg_30(Decimal::from(5)))
            .with_fba(ChannelStock::new(40, 10))
            .with_local(ChannelStock::on_hand(100))
    }

    #[test]
    fn test_create_fact() {
        let fact = sample();
        assert_eq!(fact.account_id, "101");
        assert_eq!(fact.sku.as_str(), "MSKU-A");
        assert_eq!(fact.sku.dimension(), Dimension::Msku);
        assert_eq!(fact.on_hand(), 40);
        assert!(fact.validate().is_ok());
    }

    #[test]
    fn test_negative_sales_rejected() {
        let fact = sample().with_sales(SalesWindows::new().with_avg_7(Decimal::from(-2)));
        let err = fact.validate().unwrap_err();
        assert!(matches!(err, RestockError::InvalidFact { .. }));
    }

    #[test]
    fn test_merged_with_detail() {
        let detail = SkuFact::new("101", SkuId::Msku("MSKU-A".to_string()), Mode::Direct)
            .with_sales(
                SalesWindows::new()
                    .with_avg_3(Decimal::from(8))
                    .with_avg_30(Decimal::from(99)),
            )
            .with_available_sale_days(Decimal::from(12))
            .with_fba(ChannelStock::on_hand(1));

        let merged = sample().merged_with(&detail);

        assert_eq!(merged.sales.avg_3, Some(Decimal::from(8)));
        assert_eq!(merged.sales.avg_30, Some(Decimal::from(5)));
        assert_eq!(merged.available_sale_days, Some(Decimal::from(12)));
        assert_eq!(merged.fba, ChannelStock::new(40, 10));
    }

    #[test]
    fn test_codes_round_trip() {
        assert_eq!(Dimension::from_code(i64::from(Dimension::Msku.code())), Some(Dimension::Msku));
        assert_eq!(Mode::from_code(1), Some(Mode::OverseasTransit));
        assert_eq!(Mode::from_code(7), None);
    }
}
