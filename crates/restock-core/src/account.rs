//! 店鋪（賣家帳號）模型

use serde::{Deserialize, Serialize};

/// 店鋪
///
/// 每次執行抓取一次，不持久化。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    /// 外部系統的店鋪ID（sid）
    pub account_id: String,

    /// 顯示名稱
    pub display_name: String,
}

impl Account {
    /// 創建新的店鋪
    pub fn new(account_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            display_name: display_name.into(),
        }
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.display_name, self.account_id)
    }
}
