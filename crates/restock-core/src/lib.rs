//! # Restock Core
//!
//! 補貨建議引擎的核心資料模型與類型定義

pub mod account;
pub mod config;
pub mod decision;
pub mod fact;
pub mod inventory;
pub mod sales;

// Re-export 主要類型
pub use account::Account;
pub use config::PlanningConfig;
pub use decision::{ReplenishmentDecision, SaleDays, UrgencyFlags, UrgencyTier};
pub use fact::{Dimension, Mode, SkuFact, SkuId};
pub use inventory::ChannelStock;
pub use sales::SalesWindows;

/// 補貨核心錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum RestockError {
    #[error("無效的配置: {0}")]
    InvalidConfig(String),

    #[error("無效的 SKU 資料 {sku}: {reason}")]
    InvalidFact { sku: String, reason: String },

    #[error("其他錯誤: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RestockError>;
