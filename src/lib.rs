//! # Restock
//!
//! 補貨建議引擎：抓取多店鋪 SKU 資料 → 計算補貨建議 → 彙總報告

use chrono::NaiveDate;
use uuid::Uuid;

pub use restock_calc::SuggestionCalculator;
pub use restock_core::{
    Account, ChannelStock, Dimension, Mode, PlanningConfig, ReplenishmentDecision, RestockError,
    SaleDays, SalesWindows, SkuFact, SkuId, UrgencyFlags, UrgencyTier,
};
pub use restock_erp::{
    AccountFailure, Aggregator, Collection, DataSource, ErpClient, ErpConfig, ErpError,
    FixtureSource, PartialAggregationError, SkuSource,
};
pub use restock_report::{AccountStats, Evaluated, Reporter, SummaryReport, UrgentOrdering};

/// 執行錯誤
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] RestockError),

    #[error(transparent)]
    Erp(#[from] ErpError),
}

/// 單次執行參數
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// 指定店鋪（`None` 表示全部）
    pub accounts: Option<Vec<Account>>,

    pub dimension: Dimension,
    pub mode: Mode,

    /// 並行店鋪數
    pub max_concurrency: usize,

    /// 是否逐筆抓取明細補齊銷量視窗
    pub enrich: bool,

    /// 基準日期
    pub as_of: NaiveDate,

    /// 緊急清單的同值次序
    pub ordering: UrgentOrdering,
}

impl RunOptions {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            accounts: None,
            dimension: Dimension::Msku,
            mode: Mode::Direct,
            max_concurrency: 5,
            enrich: false,
            as_of,
            ordering: UrgentOrdering::default(),
        }
    }

    /// 以 ERP 配置的預設值創建
    pub fn from_config(config: &ErpConfig, as_of: NaiveDate) -> Self {
        Self::new(as_of)
            .with_dimension(config.default_dimension)
            .with_mode(config.default_mode)
            .with_max_concurrency(config.default_concurrency)
    }

    pub fn with_accounts(mut self, accounts: Vec<Account>) -> Self {
        self.accounts = Some(accounts);
        self
    }

    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_enrich(mut self, enrich: bool) -> Self {
        self.enrich = enrich;
        self
    }

    pub fn with_ordering(mut self, ordering: UrgentOrdering) -> Self {
        self.ordering = ordering;
        self
    }
}

/// 單次執行結果
///
/// 同時帶有成功的建議集合與失敗的店鋪，部分資料不會被當成完整資料。
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,

    /// 全部建議
    pub decisions: Vec<Evaluated>,

    pub summary: SummaryReport,

    /// 緊急清單（可售天數由小到大）
    pub urgent: Vec<Evaluated>,

    /// 高銷量清單（30 天日均由大到小）
    pub high_sales: Vec<Evaluated>,

    /// 失敗的店鋪
    pub failures: Vec<AccountFailure>,

    /// 執行耗時（毫秒）
    pub elapsed_ms: u128,
}

impl RunOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn partial_error(&self) -> Option<PartialAggregationError> {
        PartialAggregationError::from_failures(&self.failures)
    }
}

/// 完整流程：聚合 → 計算 → 彙總
pub fn run<S: SkuSource>(
    aggregator: &Aggregator<S>,
    planning: &PlanningConfig,
    options: &RunOptions,
) -> Result<RunOutcome, RunError> {
    planning.validate()?;

    let run_id = Uuid::new_v4();
    let start_time = std::time::Instant::now();
    tracing::info!("補貨建議執行開始 run_id={} 基準日 {}", run_id, options.as_of);

    // Step 1: 聚合
    tracing::debug!("Step 1: 聚合店鋪資料");
    let collection = aggregator.collect(
        options.accounts.clone(),
        options.dimension,
        options.mode,
        options.max_concurrency,
    )?;

    // Step 2: 補齊明細
    let facts = if options.enrich {
        tracing::debug!("Step 2: 補齊明細");
        aggregator.enrich(collection.facts, options.mode, options.max_concurrency)?
    } else {
        collection.facts
    };

    // Step 3: 計算建議
    tracing::debug!("Step 3: 計算補貨建議");
    let calculator = SuggestionCalculator::new(planning.clone(), options.as_of);
    let decisions = calculator.evaluate_all(facts);

    // Step 4: 彙總
    tracing::debug!("Step 4: 彙總報告");
    let reporter = Reporter::new().with_ordering(options.ordering);
    let summary = reporter.summarize(&decisions);
    let urgent = reporter.urgent(&decisions);
    let high_sales = reporter.high_sales(&decisions);

    if !collection.failures.is_empty() {
        tracing::warn!(
            "run_id={} 有 {} 個店鋪失敗，結果不完整",
            run_id,
            collection.failures.len()
        );
    }

    let elapsed = start_time.elapsed();
    tracing::info!("補貨建議執行完成 run_id={}，耗時 {:?}", run_id, elapsed);

    Ok(RunOutcome {
        run_id,
        decisions,
        summary,
        urgent,
        high_sales,
        failures: collection.failures,
        elapsed_ms: elapsed.as_millis(),
    })
}
