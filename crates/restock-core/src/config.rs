//! 補貨計劃配置模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::RestockError;

/// 補貨計劃參數配置
///
/// 緊急與高銷量門檻在各業務場景下並不一致，因此都是必填輸入，
/// `Default` 只提供常見值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningConfig {
    /// 目標備貨天數
    pub target_cover_days: u32,

    /// 緊急門檻（可售天數低於此值）
    pub urgent_days_threshold: Decimal,

    /// 高銷量門檻（30 天日均高於此值）
    pub high_sales_threshold: Decimal,

    /// 採購建議日期偏移（天）
    pub purchase_lead_days: u32,

    /// 本地發貨建議日期偏移（天）
    pub local_ship_lead_days: u32,

    /// 海外倉發貨建議日期偏移（天）
    pub overseas_ship_lead_days: u32,
}

impl PlanningConfig {
    /// 創建新的計劃配置
    pub fn new(urgent_days_threshold: Decimal, high_sales_threshold: Decimal) -> Self {
        Self {
            target_cover_days: 30,
            urgent_days_threshold,
            high_sales_threshold,
            purchase_lead_days: 0,
            local_ship_lead_days: 0,
            overseas_ship_lead_days: 0,
        }
    }

    /// 建構器模式：設置目標備貨天數
    pub fn with_target_cover_days(mut self, days: u32) -> Self {
        self.target_cover_days = days;
        self
    }

    /// 建構器模式：設置採購日期偏移
    pub fn with_purchase_lead_days(mut self, days: u32) -> Self {
        self.purchase_lead_days = days;
        self
    }

    /// 建構器模式：設置本地發貨日期偏移
    pub fn with_local_ship_lead_days(mut self, days: u32) -> Self {
        self.local_ship_lead_days = days;
        self
    }

    /// 建構器模式：設置海外倉發貨日期偏移
    pub fn with_overseas_ship_lead_days(mut self, days: u32) -> Self {
        self.overseas_ship_lead_days = days;
        self
    }

    /// 檢查配置是否合法
    pub fn validate(&self) -> crate::Result<()> {
        if self.target_cover_days == 0 {
            return Err(RestockError::InvalidConfig(
                "目標備貨天數必須大於 0".to_string(),
            ));
        }
        if self.urgent_days_threshold < Decimal::ZERO {
            return Err(RestockError::InvalidConfig(format!(
                "緊急門檻不可為負: {}",
                self.urgent_days_threshold
            )));
        }
        if self.high_sales_threshold < Decimal::ZERO {
            return Err(RestockError::InvalidConfig(format!(
                "高銷量門檻不可為負: {}",
                self.high_sales_threshold
            )));
        }
        Ok(())
    }
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self::new(Decimal::from(7), Decimal::from(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlanningConfig::default();
        assert_eq!(config.target_cover_days, 30);
        assert_eq!(config.urgent_days_threshold, Decimal::from(7));
        assert_eq!(config.high_sales_threshold, Decimal::from(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = PlanningConfig::new(Decimal::from(5), Decimal::from(100))
            .with_target_cover_days(45)
            .with_purchase_lead_days(2)
            .with_local_ship_lead_days(1)
            .with_overseas_ship_lead_days(3);

        assert_eq!(config.target_cover_days, 45);
        assert_eq!(config.purchase_lead_days, 2);
        assert_eq!(config.local_ship_lead_days, 1);
        assert_eq!(config.overseas_ship_lead_days, 3);
    }

    #[test]
    fn test_invalid_config() {
        let config = PlanningConfig::default().with_target_cover_days(0);
        assert!(matches!(config.validate(), Err(RestockError::InvalidConfig(_))));

        let config = PlanningConfig::new(Decimal::from(-1), Decimal::from(10));
        assert!(config.validate().is_err());
    }
}
