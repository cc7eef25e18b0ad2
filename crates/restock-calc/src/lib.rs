//! # Restock Calculation Engine
//!
//! 補貨建議計算引擎：日均銷量、可售天數、分倉分配、建議日期、緊急分類

pub mod allocation;
pub mod calculator;
pub mod lead_time;
pub mod urgency;
pub mod velocity;

// Re-export 主要類型
pub use allocation::{Allocation, AllocationCalculator};
pub use calculator::SuggestionCalculator;
pub use lead_time::LeadTimeCalculator;
pub use urgency::UrgencyClassifier;
pub use velocity::VelocityCalculator;
