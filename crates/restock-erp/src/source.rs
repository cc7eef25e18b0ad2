//! 資料來源抽象
//!
//! `SkuSource` 是聚合器唯一依賴的能力介面；`DataSource` 在建構時選定
//! 線上 API 或記憶體資料，兩者對外的回應形狀一致。

use std::collections::{BTreeMap, HashMap};

use restock_core::{Account, Dimension, Mode, SkuFact, SkuId};
use serde_json::Value;

use crate::client::ErpClient;
use crate::transport::{HttpTransport, Transport};
use crate::{wire, ErpConfig, ErpError, Result};

/// 一頁 SKU 資料
#[derive(Debug, Clone, PartialEq)]
pub struct SkuPage {
    /// 解析成功的資料
    pub facts: Vec<SkuFact>,

    /// 是否還有下一頁
    pub has_more: bool,

    /// 上游回報的總筆數
    pub total: Option<u64>,

    /// 本頁原始列數（含略過的）
    pub row_count: usize,

    /// 無法解析而略過的列數
    pub skipped: usize,
}

impl SkuPage {
    pub fn empty() -> Self {
        Self {
            facts: Vec::new(),
            has_more: false,
            total: Some(0),
            row_count: 0,
            skipped: 0,
        }
    }
}

/// SKU 資料來源
pub trait SkuSource: Send + Sync {
    /// 店鋪列表
    fn list_accounts(&self) -> Result<Vec<Account>>;

    /// 單一店鋪的一頁資料
    fn fetch_sku_page(
        &self,
        account_id: &str,
        dimension: Dimension,
        mode: Mode,
        offset: u32,
        limit: u32,
    ) -> Result<SkuPage>;

    /// 單一 SKU 明細
    fn fetch_sku_detail(&self, account_id: &str, sku: &SkuId, mode: Mode) -> Result<SkuFact>;
}

impl<T: Transport> SkuSource for ErpClient<T> {
    fn list_accounts(&self) -> Result<Vec<Account>> {
        ErpClient::list_accounts(self)
    }

    fn fetch_sku_page(
        &self,
        account_id: &str,
        dimension: Dimension,
        mode: Mode,
        offset: u32,
        limit: u32,
    ) -> Result<SkuPage> {
        ErpClient::fetch_sku_page(self, account_id, dimension, mode, offset, limit)
    }

    fn fetch_sku_detail(&self, account_id: &str, sku: &SkuId, mode: Mode) -> Result<SkuFact> {
        ErpClient::fetch_sku_detail(self, account_id, sku, mode)
    }
}

/// 記憶體資料來源（離線執行與測試）
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    accounts: Vec<Account>,
    facts: BTreeMap<String, Vec<SkuFact>>,
    details: HashMap<(String, SkuId), SkuFact>,
    failures: HashMap<String, ErpError>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：加入店鋪及其 SKU 資料（依序）
    pub fn with_account(mut self, account: Account, facts: Vec<SkuFact>) -> Self {
        self.facts.insert(account.account_id.clone(), facts);
        self.accounts.push(account);
        self
    }

    /// 建構器模式：加入 SKU 明細
    pub fn with_detail(mut self, detail: SkuFact) -> Self {
        self.details
            .insert((detail.account_id.clone(), detail.sku.clone()), detail);
        self
    }

    /// 建構器模式：指定店鋪抓取時回傳錯誤
    pub fn with_failure(mut self, account_id: impl Into<String>, error: ErpError) -> Self {
        self.failures.insert(account_id.into(), error);
        self
    }

    /// 從上游格式的 JSON 建立
    ///
    /// ```json
    /// {
    ///   "accounts": [{"sid": 101, "name": "US"}],
    ///   "rows": {"101": [ /* getSummaryList 資料列 */ ]},
    ///   "details": {"101": [ /* 明細資料列，需含 msku 或 asin */ ]}
    /// }
    /// ```
    pub fn from_wire(document: &Value, dimension: Dimension) -> Result<Self> {
        let accounts = wire::parse_accounts(&serde_json::json!({
            "code": 0,
            "data": document.get("accounts").cloned().unwrap_or(Value::Null),
        }))?;

        let mut source = Self::new();
        for account in accounts {
            let rows = rows_for(document, "rows", &account.account_id);
            let facts = rows
                .iter()
                .map(|row| wire::parse_row(row, &account.account_id, dimension, Mode::Direct))
                .collect::<Result<Vec<_>>>()?;

            for row in rows_for(document, "details", &account.account_id) {
                let detail = wire::parse_row(&row, &account.account_id, dimension, Mode::Direct)?;
                source = source.with_detail(detail);
            }
            source = source.with_account(account, facts);
        }

        tracing::info!(
            "載入離線資料：店鋪 {} 個，SKU {} 筆",
            source.accounts.len(),
            source.facts.values().map(Vec::len).sum::<usize>()
        );
        Ok(source)
    }

    fn check_failure(&self, account_id: &str) -> Result<()> {
        match self.failures.get(account_id) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn rows_for(document: &Value, key: &str, account_id: &str) -> Vec<Value> {
    document
        .get(key)
        .and_then(|rows| rows.get(account_id))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

impl SkuSource for FixtureSource {
    fn list_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.accounts.clone())
    }

    fn fetch_sku_page(
        &self,
        account_id: &str,
        dimension: Dimension,
        mode: Mode,
        offset: u32,
        limit: u32,
    ) -> Result<SkuPage> {
        self.check_failure(account_id)?;

        let Some(facts) = self.facts.get(account_id) else {
            return Ok(SkuPage::empty());
        };

        // 上游依模式計算，離線資料以請求的模式為準
        let matching: Vec<&SkuFact> = facts
            .iter()
            .filter(|fact| fact.sku.dimension() == dimension)
            .collect();
        let total = matching.len();
        let start = (offset as usize).min(total);
        let end = start.saturating_add(limit.max(1) as usize).min(total);

        let page: Vec<SkuFact> = matching[start..end]
            .iter()
            .map(|fact| SkuFact {
                mode,
                ..SkuFact::clone(fact)
            })
            .collect();

        Ok(SkuPage {
            has_more: wire::has_more(offset, page.len(), limit, Some(total as u64)),
            row_count: page.len(),
            facts: page,
            total: Some(total as u64),
            skipped: 0,
        })
    }

    fn fetch_sku_detail(&self, account_id: &str, sku: &SkuId, mode: Mode) -> Result<SkuFact> {
        self.details
            .get(&(account_id.to_string(), sku.clone()))
            .map(|detail| SkuFact {
                mode,
                ..detail.clone()
            })
            .ok_or_else(|| ErpError::Permanent {
                code: None,
                message: format!("離線資料沒有 {} 的明細", sku),
            })
    }
}

/// 資料來源：建構時選定線上或離線
pub enum DataSource {
    Live(ErpClient<HttpTransport>),
    Fixture(FixtureSource),
}

impl DataSource {
    /// 線上 API
    pub fn live(config: ErpConfig) -> Result<Self> {
        Ok(DataSource::Live(ErpClient::new(config)?))
    }

    /// 離線資料
    pub fn fixture(source: FixtureSource) -> Self {
        DataSource::Fixture(source)
    }

    pub fn is_live(&self) -> bool {
        matches!(self, DataSource::Live(_))
    }
}

impl SkuSource for DataSource {
    fn list_accounts(&self) -> Result<Vec<Account>> {
        match self {
            DataSource::Live(client) => SkuSource::list_accounts(client),
            DataSource::Fixture(fixture) => fixture.list_accounts(),
        }
    }

    fn fetch_sku_page(
        &self,
        account_id: &str,
        dimension: Dimension,
        mode: Mode,
        offset: u32,
        limit: u32,
    ) -> Result<SkuPage> {
        match self {
            DataSource::Live(client) => {
                SkuSource::fetch_sku_page(client, account_id, dimension, mode, offset, limit)
            }
            DataSource::Fixture(fixture) => {
                fixture.fetch_sku_page(account_id, dimension, mode, offset, limit)
            }
        }
    }

    fn fetch_sku_detail(&self, account_id: &str, sku: &SkuId, mode: Mode) -> Result<SkuFact> {
        match self {
            DataSource::Live(client) => SkuSource::fetch_sku_detail(client, account_id, sku, mode),
            DataSource::Fixture(fixture) => fixture.fetch_sku_detail(account_id, sku, mode),
        }
    }
}
