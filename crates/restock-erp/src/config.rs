//! ERP 連線配置

use std::env;
use std::time::Duration;

use restock_core::{Dimension, Mode, SkuId};
use serde_json::{json, Value};

use crate::{token::mask, ErpError, Result};

pub const DEFAULT_BASE_URL: &str = "https://openapi.lingxing.com";

/// 單次請求最大筆數（上游上限 50）
pub const MAX_PAGE_SIZE: u32 = 50;

/// 明細端點接受的識別碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailKey {
    Msku,
    Asin,
}

impl DetailKey {
    fn field(self) -> &'static str {
        match self {
            DetailKey::Msku => "msku",
            DetailKey::Asin => "asin",
        }
    }
}

/// 明細端點（依序嘗試的備援策略之一）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailEndpoint {
    pub path: String,
    pub key: DetailKey,
}

impl DetailEndpoint {
    pub fn new(path: impl Into<String>, key: DetailKey) -> Self {
        Self {
            path: path.into(),
            key,
        }
    }

    /// 此端點能否查詢該 SKU
    pub fn accepts(&self, sku: &SkuId) -> bool {
        matches!(
            (self.key, sku),
            (DetailKey::Msku, SkuId::Msku(_)) | (DetailKey::Asin, SkuId::Asin(_))
        )
    }

    /// 請求內容 `{sid, msku|asin, mode}`
    pub fn body(&self, account_id: &str, sku: &SkuId, mode: Mode) -> Value {
        let mut body = json!({
            "sid": account_id,
            "mode": mode.code(),
        });
        body[self.key.field()] = Value::String(sku.as_str().to_string());
        body
    }
}

/// 預設的明細端點順序
pub fn default_detail_endpoints() -> Vec<DetailEndpoint> {
    vec![
        DetailEndpoint::new("/erp/sc/routing/fbaSug/msku/getInfo", DetailKey::Msku),
        DetailEndpoint::new("/erp/sc/routing/restocking/info/msku", DetailKey::Msku),
        DetailEndpoint::new("/erp/sc/routing/fbaSug/asin/getInfo", DetailKey::Asin),
    ]
}

/// ERP 連線配置
///
/// 由呼叫端建立並傳入 `ErpClient`，不使用全域狀態。
#[derive(Clone)]
pub struct ErpConfig {
    pub app_id: String,
    pub app_secret: String,
    pub base_url: String,

    /// 單次請求逾時
    pub timeout: Duration,

    /// 暫時性錯誤的最大重試次數
    pub max_retries: u32,

    /// 首次重試間隔（之後每次加倍）
    pub retry_delay: Duration,

    /// 權杖在到期前多久視為需要刷新
    pub token_refresh_threshold: Duration,

    /// 每頁筆數
    pub page_size: u32,

    /// 單一店鋪最多抓取頁數
    pub max_pages: Option<u32>,

    /// 翻頁間隔
    pub page_delay: Duration,

    pub default_dimension: Dimension,
    pub default_mode: Mode,

    /// 預設並行店鋪數
    pub default_concurrency: usize,

    /// 明細端點備援順序
    pub detail_endpoints: Vec<DetailEndpoint>,
}

impl ErpConfig {
    /// 創建新的配置（其餘欄位使用預設值）
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            token_refresh_threshold: Duration::from_secs(300),
            page_size: MAX_PAGE_SIZE,
            max_pages: None,
            page_delay: Duration::ZERO,
            default_dimension: Dimension::Msku,
            default_mode: Mode::Direct,
            default_concurrency: 5,
            detail_endpoints: default_detail_endpoints(),
        }
    }

    /// 從環境變數讀取
    ///
    /// `RESTOCK_APP_ID`、`RESTOCK_APP_SECRET` 必填；
    /// `RESTOCK_BASE_URL`、`RESTOCK_CONCURRENCY`、`RESTOCK_TIMEOUT_SECS` 選填。
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ErpError::Config(format!("缺少環境變數 {}", key)))
        };

        let mut config = Self::new(required("RESTOCK_APP_ID")?, required("RESTOCK_APP_SECRET")?);

        if let Some(base_url) = lookup("RESTOCK_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(concurrency) = lookup("RESTOCK_CONCURRENCY") {
            config.default_concurrency = concurrency.trim().parse().map_err(|_| {
                ErpError::Config(format!("RESTOCK_CONCURRENCY 不是有效數字: {}", concurrency))
            })?;
        }
        if let Some(timeout) = lookup("RESTOCK_TIMEOUT_SECS") {
            let secs: u64 = timeout.trim().parse().map_err(|_| {
                ErpError::Config(format!("RESTOCK_TIMEOUT_SECS 不是有效數字: {}", timeout))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 建構器模式：設置重試策略
    pub fn with_retry(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_token_refresh_threshold(mut self, threshold: Duration) -> Self {
        self.token_refresh_threshold = threshold;
        self
    }

    /// 建構器模式：設置翻頁參數
    pub fn with_paging(mut self, page_size: u32, max_pages: Option<u32>, page_delay: Duration) -> Self {
        self.page_size = page_size;
        self.max_pages = max_pages;
        self.page_delay = page_delay;
        self
    }

    pub fn with_defaults(mut self, dimension: Dimension, mode: Mode, concurrency: usize) -> Self {
        self.default_dimension = dimension;
        self.default_mode = mode;
        self.default_concurrency = concurrency;
        self
    }

    pub fn with_detail_endpoints(mut self, endpoints: Vec<DetailEndpoint>) -> Self {
        self.detail_endpoints = endpoints;
        self
    }

    /// 檢查配置是否合法
    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() {
            return Err(ErpError::Config("app_id 不可為空".to_string()));
        }
        if self.app_secret.trim().is_empty() {
            return Err(ErpError::Config("app_secret 不可為空".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ErpError::Config("base_url 不可為空".to_string()));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ErpError::Config(format!(
                "page_size 必須介於 1 到 {}: {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        if self.default_concurrency == 0 {
            return Err(ErpError::Config("並行數必須大於 0".to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ErpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErpConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &mask(&self.app_secret))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("page_size", &self.page_size)
            .field("default_concurrency", &self.default_concurrency)
            .finish_non_exhaustive()
    }
}
