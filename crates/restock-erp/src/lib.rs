//! # Restock ERP
//!
//! ERP API 客戶端、資料來源抽象與多店鋪聚合器

pub mod aggregator;
pub mod client;
pub mod config;
pub mod error;
pub mod sign;
pub mod source;
pub mod token;
pub mod transport;
pub mod wire;

// Re-export 主要類型
pub use aggregator::{Aggregator, Collection};
pub use client::{ConnectionStatus, ErpClient};
pub use config::{DetailEndpoint, DetailKey, ErpConfig};
pub use error::{AccountFailure, ErpError, PartialAggregationError, Result};
pub use source::{DataSource, FixtureSource, SkuPage, SkuSource};
pub use token::{Token, TokenSession};
pub use transport::{HttpTransport, Transport};
