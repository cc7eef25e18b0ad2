//! 多店鋪聚合器

use std::time::Duration;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use restock_core::{Account, Dimension, Mode, SkuFact};

use crate::config::MAX_PAGE_SIZE;
use crate::source::SkuSource;
use crate::{AccountFailure, ErpConfig, ErpError, PartialAggregationError, Result};

/// 聚合結果：成功的資料與失敗的店鋪
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    /// 所有成功店鋪的資料（店鋪內依頁序，店鋪間無固定順序）
    pub facts: Vec<SkuFact>,

    /// 失敗的店鋪
    pub failures: Vec<AccountFailure>,

    /// 處理的店鋪數
    pub account_count: usize,
}

impl Collection {
    /// 是否所有店鋪都成功
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// 有店鋪失敗時回傳部分失敗錯誤
    pub fn partial_error(&self) -> Option<PartialAggregationError> {
        PartialAggregationError::from_failures(&self.failures)
    }
}

/// 多店鋪聚合器
///
/// 以固定大小的工作執行緒池並行處理店鋪；上游有未公開的頻率上限，
/// 並行數必須有界。
pub struct Aggregator<S: SkuSource> {
    source: S,
    page_size: u32,
    max_pages: Option<u32>,
    page_delay: Duration,
}

impl<S: SkuSource> Aggregator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            page_size: MAX_PAGE_SIZE,
            max_pages: None,
            page_delay: Duration::ZERO,
        }
    }

    /// 以 ERP 配置的翻頁參數創建
    pub fn from_config(source: S, config: &ErpConfig) -> Self {
        Self::new(source)
            .with_page_size(config.page_size)
            .with_max_pages(config.max_pages)
            .with_page_delay(config.page_delay)
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// 建構器模式：單一店鋪最多抓取頁數
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// 抓取多個店鋪的全部 SKU 資料
    ///
    /// 未指定店鋪時先取得店鋪列表。單一店鋪失敗只記錄並略過，
    /// 只有認證失敗或店鋪列表取得失敗才中止。
    pub fn collect(
        &self,
        accounts: Option<Vec<Account>>,
        dimension: Dimension,
        mode: Mode,
        max_concurrency: usize,
    ) -> Result<Collection> {
        let accounts = match accounts {
            Some(accounts) => accounts,
            None => self.source.list_accounts()?,
        };

        tracing::info!(
            "開始聚合：店鋪 {} 個，維度 {:?}，模式 {:?}，並行 {}",
            accounts.len(),
            dimension,
            mode,
            max_concurrency
        );
        let start_time = std::time::Instant::now();

        let pool = build_pool(max_concurrency)?;
        let results: Vec<(String, Result<Vec<SkuFact>>)> = pool.install(|| {
            accounts
                .par_iter()
                .map(|account| {
                    (
                        account.account_id.clone(),
                        self.collect_account(account, dimension, mode),
                    )
                })
                .collect()
        });

        let mut collection = Collection {
            account_count: accounts.len(),
            ..Default::default()
        };

        for (account_id, result) in results {
            match result {
                Ok(facts) => collection.facts.extend(facts),
                Err(err @ ErpError::Auth(_)) => {
                    tracing::warn!("店鋪 {} 認證失敗，中止聚合", account_id);
                    return Err(err);
                }
                Err(error) => {
                    tracing::warn!("店鋪 {} 抓取失敗，已略過: {}", account_id, error);
                    collection.failures.push(AccountFailure { account_id, error });
                }
            }
        }

        tracing::info!(
            "聚合完成：SKU {} 筆，失敗店鋪 {} 個，耗時 {:?}",
            collection.facts.len(),
            collection.failures.len(),
            start_time.elapsed()
        );
        Ok(collection)
    }

    /// 單一店鋪逐頁抓取；中途失敗時整個店鋪視為失敗，不回傳部分資料
    fn collect_account(&self, account: &Account, dimension: Dimension, mode: Mode) -> Result<Vec<SkuFact>> {
        let mut facts = Vec::new();
        let mut offset: u32 = 0;
        let mut pages: u32 = 0;

        loop {
            if pages > 0 && !self.page_delay.is_zero() {
                std::thread::sleep(self.page_delay);
            }

            let page = self.source.fetch_sku_page(
                &account.account_id,
                dimension,
                mode,
                offset,
                self.page_size,
            )?;
            pages += 1;
            // 上游可能回傳少於請求的筆數，偏移量以實際列數前進
            let advance = u32::try_from(page.row_count).unwrap_or(u32::MAX);
            facts.extend(page.facts);

            if !page.has_more {
                break;
            }
            if self.max_pages.is_some_and(|max| pages >= max) {
                tracing::warn!("店鋪 {} 已達頁數上限 {}，停止翻頁", account, pages);
                break;
            }
            offset = offset.saturating_add(advance);
        }

        tracing::info!("店鋪 {} 完成：{} 頁，{} 筆", account, pages, facts.len());
        Ok(facts)
    }

    /// 以明細補齊資料（3/14 天日均與可售天數）
    ///
    /// 單筆明細失敗時保留原資料。
    pub fn enrich(&self, facts: Vec<SkuFact>, mode: Mode, max_concurrency: usize) -> Result<Vec<SkuFact>> {
        tracing::info!("開始補齊明細：SKU {} 筆", facts.len());

        let pool = build_pool(max_concurrency)?;
        let enriched = pool.install(|| {
            facts
                .into_par_iter()
                .map(|fact| {
                    match self.source.fetch_sku_detail(&fact.account_id, &fact.sku, mode) {
                        Ok(detail) => fact.merged_with(&detail),
                        Err(err) => {
                            tracing::warn!("{} 明細取得失敗，保留原資料: {}", fact.sku, err);
                            fact
                        }
                    }
                })
                .collect()
        });

        Ok(enriched)
    }
}

fn build_pool(max_concurrency: usize) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(max_concurrency.max(1))
        .thread_name(|i| format!("restock-worker-{}", i))
        .build()
        .map_err(|err| ErpError::Pool(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FixtureSource, SkuPage};
    use restock_core::{ChannelStock, SalesWindows, SkuId};
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 包裝離線資料並記錄並行度、模擬中途失敗
    struct RecordingSource {
        inner: FixtureSource,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        list_calls: AtomicUsize,
        fail_at_offset: Option<(String, u32)>,
        page_cap: Option<u32>,
    }

    impl RecordingSource {
        fn new(inner: FixtureSource) -> Self {
            Self {
                inner,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                list_calls: AtomicUsize::new(0),
                fail_at_offset: None,
                page_cap: None,
            }
        }
    }

    impl SkuSource for RecordingSource {
        fn list_accounts(&self) -> Result<Vec<Account>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.list_accounts()
        }

        fn fetch_sku_page(
            &self,
            account_id: &str,
            dimension: Dimension,
            mode: Mode,
            offset: u32,
            limit: u32,
        ) -> Result<SkuPage> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if let Some((failing, at)) = &self.fail_at_offset {
                if failing == account_id && *at == offset {
                    return Err(ErpError::Transient("connection reset".to_string()));
                }
            }
            let limit = self.page_cap.map_or(limit, |cap| limit.min(cap));
            self.inner.fetch_sku_page(account_id, dimension, mode, offset, limit)
        }

        fn fetch_sku_detail(&self, account_id: &str, sku: &SkuId, mode: Mode) -> Result<SkuFact> {
            self.inner.fetch_sku_detail(account_id, sku, mode)
        }
    }

    fn facts(account_id: &str, count: u32) -> Vec<SkuFact> {
        (0..count)
            .map(|i| {
                SkuFact::new(account_id, SkuId::Msku(format!("{}-{}", account_id, i)), Mode::Direct)
                    .with_fba(ChannelStock::on_hand(i))
            })
            .collect()
    }

    fn fixture(accounts: usize, per_account: u32) -> FixtureSource {
        (0..accounts).fold(FixtureSource::new(), |source, i| {
            let id = format!("{}", 100 + i);
            source.with_account(Account::new(id.clone(), format!("Shop {}", i)), facts(&id, per_account))
        })
    }

    #[test]
    fn test_collect_all_accounts_in_page_order() {
        let aggregator = Aggregator::new(RecordingSource::new(fixture(3, 7))).with_page_size(3);

        let collection = aggregator.collect(None, Dimension::Msku, Mode::Direct, 5).unwrap();

        assert!(collection.is_complete());
        assert_eq!(collection.account_count, 3);
        assert_eq!(collection.facts.len(), 21);
        assert_eq!(aggregator.source().list_calls.load(Ordering::SeqCst), 1);

        let shop_100: Vec<&str> = collection
            .facts
            .iter()
            .filter(|f| f.account_id == "100")
            .map(|f| f.sku.as_str())
            .collect();
        let expected: Vec<String> = (0..7).map(|i| format!("100-{}", i)).collect();
        assert_eq!(shop_100, expected);
    }

    #[test]
    fn test_short_pages_do_not_skip_rows() {
        let mut source = RecordingSource::new(fixture(1, 6));
        source.page_cap = Some(2);
        let aggregator = Aggregator::new(source).with_page_size(3);

        let collection = aggregator.collect(None, Dimension::Msku, Mode::Direct, 1).unwrap();

        assert!(collection.is_complete());
        let skus: Vec<&str> = collection.facts.iter().map(|f| f.sku.as_str()).collect();
        assert_eq!(skus, ["100-0", "100-1", "100-2", "100-3", "100-4", "100-5"]);
    }

    #[test]
    fn test_explicit_accounts_skip_listing() {
        let aggregator = Aggregator::new(RecordingSource::new(fixture(3, 2)));

        let collection = aggregator
            .collect(Some(vec![Account::new("101", "Shop 1")]), Dimension::Msku, Mode::Direct, 2)
            .unwrap();

        assert_eq!(collection.facts.len(), 2);
        assert_eq!(aggregator.source().list_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failed_account_is_isolated() {
        let source = fixture(3, 4).with_failure(
            "101",
            ErpError::Permanent {
                code: Some(3_001_002),
                message: "ip".to_string(),
            },
        );
        let aggregator = Aggregator::new(source);

        let collection = aggregator.collect(None, Dimension::Msku, Mode::Direct, 5).unwrap();

        assert_eq!(collection.facts.len(), 8);
        assert!(collection.facts.iter().all(|f| f.account_id != "101"));
        assert_eq!(collection.failures.len(), 1);
        assert_eq!(collection.failures[0].account_id, "101");

        let partial = collection.partial_error().unwrap();
        assert_eq!(partial.failures.len(), 1);
    }

    #[test]
    fn test_mid_account_failure_drops_partial_data() {
        let mut source = RecordingSource::new(fixture(2, 10));
        source.fail_at_offset = Some(("100".to_string(), 4));
        let aggregator = Aggregator::new(source).with_page_size(4);

        let collection = aggregator.collect(None, Dimension::Msku, Mode::Direct, 2).unwrap();

        assert_eq!(collection.facts.len(), 10);
        assert!(collection.facts.iter().all(|f| f.account_id == "101"));
        assert!(collection.failures[0].error.is_retryable());
    }

    #[test]
    fn test_auth_failure_aborts() {
        let source = fixture(2, 1).with_failure("100", ErpError::Auth("rejected".to_string()));
        let aggregator = Aggregator::new(source);

        let result = aggregator.collect(None, Dimension::Msku, Mode::Direct, 2);
        assert!(matches!(result, Err(ErpError::Auth(_))));
    }

    #[test]
    fn test_concurrency_is_bounded() {
        let aggregator = Aggregator::new(RecordingSource::new(fixture(8, 3))).with_page_size(1);

        aggregator.collect(None, Dimension::Msku, Mode::Direct, 2).unwrap();

        let peak = aggregator.source().peak.load(Ordering::SeqCst);
        assert!(peak <= 2, "peak in-flight {} exceeds bound", peak);
    }

    #[test]
    fn test_max_pages_guard() {
        let aggregator = Aggregator::new(fixture(1, 10))
            .with_page_size(2)
            .with_max_pages(Some(3));

        let collection = aggregator.collect(None, Dimension::Msku, Mode::Direct, 1).unwrap();
        assert_eq!(collection.facts.len(), 6);
    }

    #[test]
    fn test_enrich_fills_missing_windows() {
        let base = SkuFact::new("100", SkuId::Msku("A".to_string()), Mode::Direct)
            .with_sales(SalesWindows::new().with_avg_30(Decimal::from(2)))
            .with_fba(ChannelStock::on_hand(20));
        let other = SkuFact::new("100", SkuId::Msku("B".to_string()), Mode::Direct);
        let detail = SkuFact::new("100", SkuId::Msku("A".to_string()), Mode::Direct)
            .with_sales(
                SalesWindows::new()
                    .with_avg_3(Decimal::from(5))
                    .with_avg_14(Decimal::from(3)),
            )
            .with_available_sale_days(Decimal::from(10));

        let source = FixtureSource::new()
            .with_account(Account::new("100", "Shop"), vec![base.clone(), other.clone()])
            .with_detail(detail);
        let aggregator = Aggregator::new(source);

        let enriched = aggregator.enrich(vec![base, other.clone()], Mode::Direct, 2).unwrap();

        assert_eq!(enriched[0].sales.avg_3, Some(Decimal::from(5)));
        assert_eq!(enriched[0].sales.avg_14, Some(Decimal::from(3)));
        assert_eq!(enriched[0].sales.avg_30, Some(Decimal::from(2)));
        assert_eq!(enriched[0].available_sale_days, Some(Decimal::from(10)));
        assert_eq!(enriched[0].fba.on_hand, 20);
        assert_eq!(enriched[1], other);
    }
}
