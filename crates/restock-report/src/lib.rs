//! # Restock Report
//!
//! 補貨建議彙總：分類統計、緊急清單、高銷量清單

pub mod ranking;
pub mod reporter;
pub mod summary;

// Re-export 主要類型
pub use ranking::UrgentOrdering;
pub use reporter::Reporter;
pub use summary::{AccountStats, SummaryReport};

/// 一筆 SKU 資料與其補貨建議
pub type Evaluated = (restock_core::SkuFact, restock_core::ReplenishmentDecision);
