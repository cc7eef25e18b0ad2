//! ERP API 客戶端

use std::thread;

use restock_core::{Account, Dimension, Mode, SkuFact, SkuId};
use serde_json::{json, Value};

use crate::config::MAX_PAGE_SIZE;
use crate::source::SkuPage;
use crate::token::{Token, TokenSession};
use crate::transport::{HttpTransport, Transport};
use crate::{wire, ErpConfig, ErpError, Result};

const TOKEN_PATH: &str = "/api/auth-server/oauth/access-token";
const REFRESH_PATH: &str = "/api/auth-server/oauth/refresh";
const SELLER_LIST_PATH: &str = "/erp/sc/data/seller/lists";
const SUMMARY_LIST_PATH: &str = "/erp/sc/routing/restocking/analysis/getSummaryList";

/// 業務請求方法：店鋪列表為 GET，其餘為 JSON POST
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
}

/// 連線檢查結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub account_count: usize,
    pub token_masked: String,
}

/// ERP API 客戶端
///
/// 持有配置與權杖工作階段；可在多個工作執行緒之間共用（`&self`）。
pub struct ErpClient<T: Transport = HttpTransport> {
    config: ErpConfig,
    transport: T,
    session: TokenSession,
}

impl ErpClient<HttpTransport> {
    /// 以 HTTP 傳輸層創建客戶端
    pub fn new(config: ErpConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> ErpClient<T> {
    pub fn with_transport(config: ErpConfig, transport: T) -> Self {
        let session = TokenSession::new(config.token_refresh_threshold);
        Self {
            config,
            transport,
            session,
        }
    }

    pub fn config(&self) -> &ErpConfig {
        &self.config
    }

    /// 以應用憑證換取存取權杖
    pub fn authenticate(&self) -> Result<Token> {
        tracing::info!("取得存取權杖 (appId={})", self.config.app_id);

        let envelope = self.with_retry(TOKEN_PATH, || {
            self.transport.post_form(
                TOKEN_PATH,
                &[
                    ("appId", self.config.app_id.as_str()),
                    ("appSecret", self.config.app_secret.as_str()),
                ],
            )
        })?;

        let token = wire::parse_token(&envelope)?;
        tracing::info!("取得權杖成功: {}", token.masked());
        Ok(token)
    }

    fn refresh(&self, refresh_token: &str) -> Result<Token> {
        tracing::info!("刷新存取權杖");

        let envelope = self.with_retry(REFRESH_PATH, || {
            self.transport.post_form(
                REFRESH_PATH,
                &[
                    ("appId", self.config.app_id.as_str()),
                    ("refreshToken", refresh_token),
                ],
            )
        })?;

        let token = wire::parse_token(&envelope)?;
        tracing::info!("刷新權杖成功: {}", token.masked());
        Ok(token)
    }

    /// 取得新權杖：先嘗試刷新，失敗則重新認證
    fn issue_token(&self, previous: Option<Token>) -> Result<Token> {
        if let Some(refresh_token) = previous.as_ref().and_then(Token::usable_refresh_token) {
            match self.refresh(refresh_token) {
                Ok(token) => return Ok(token),
                Err(err) => tracing::warn!("刷新權杖失敗，改為重新認證: {}", err),
            }
        }
        self.authenticate()
    }

    fn access_token(&self) -> Result<String> {
        self.session.get_or_issue(|previous| self.issue_token(previous))
    }

    /// 暫時性錯誤以指數退避重試
    fn with_retry<F>(&self, path: &str, mut op: F) -> Result<Value>
    where
        F: FnMut() -> Result<Value>,
    {
        let mut attempt: u32 = 0;
        loop {
            match op() {
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self
                        .config
                        .retry_delay
                        .saturating_mul(1u32 << attempt.min(16));
                    attempt += 1;
                    tracing::warn!(
                        "{} 請求失敗，{:?} 後第 {} 次重試: {}",
                        path,
                        delay,
                        attempt,
                        err
                    );
                    thread::sleep(delay);
                }
                other => return other,
            }
        }
    }

    /// 帶權杖呼叫業務端點；權杖失效時重新取得並重發一次
    fn call(&self, method: Method, path: &str, body: &Value) -> Result<Value> {
        let mut reissued = false;
        loop {
            let token = self.access_token()?;
            let result = self.with_retry(path, || {
                let response = match method {
                    Method::Get => self.transport.get_json(path, &token, body),
                    Method::Post => self.transport.post_json(path, &token, body),
                };
                response.and_then(wire::check)
            });

            match result {
                Err(err) if err.is_token_invalid() => {
                    if reissued {
                        return Err(ErpError::Auth(err.to_string()));
                    }
                    tracing::warn!("權杖失效，重新取得後重發: {}", err);
                    self.session.invalidate();
                    reissued = true;
                }
                other => return other,
            }
        }
    }

    /// 店鋪列表
    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        let envelope = self.call(Method::Get, SELLER_LIST_PATH, &json!({}))?;
        let accounts = wire::parse_accounts(&envelope)?;
        tracing::info!("取得店鋪 {} 個", accounts.len());
        Ok(accounts)
    }

    /// 單一店鋪的一頁 SKU 資料
    pub fn fetch_sku_page(
        &self,
        account_id: &str,
        dimension: Dimension,
        mode: Mode,
        offset: u32,
        limit: u32,
    ) -> Result<SkuPage> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let body = json!({
            "sid": account_id,
            "dimension": dimension.code(),
            "mode": mode.code(),
            "offset": offset,
            "length": limit,
        });

        let envelope = self.call(Method::Post, SUMMARY_LIST_PATH, &body)?;
        let page = wire::parse_page(&envelope, account_id, dimension, mode, offset, limit)?;

        tracing::debug!(
            "店鋪 {} offset={} 取得 {} 筆（略過 {}），total={:?}",
            account_id,
            offset,
            page.facts.len(),
            page.skipped,
            page.total
        );
        Ok(page)
    }

    /// 單一 SKU 明細：依序嘗試配置中的端點，直到有一個回傳 `code == 0`
    pub fn fetch_sku_detail(&self, account_id: &str, sku: &SkuId, mode: Mode) -> Result<SkuFact> {
        let mut last_error: Option<ErpError> = None;

        for endpoint in self.config.detail_endpoints.iter().filter(|e| e.accepts(sku)) {
            let body = endpoint.body(account_id, sku, mode);
            let outcome = self
                .call(Method::Post, &endpoint.path, &body)
                .and_then(|envelope| wire::parse_detail(&envelope, account_id, sku, mode));

            match outcome {
                Ok(fact) => {
                    tracing::debug!("{} 明細取自 {}", sku, endpoint.path);
                    return Ok(fact);
                }
                Err(err @ ErpError::Auth(_)) => return Err(err),
                Err(err) => {
                    tracing::warn!("{} 明細端點 {} 失敗: {}", sku, endpoint.path, err);
                    last_error = Some(err);
                }
            }
        }

        Err(match last_error {
            Some(err) => ErpError::Permanent {
                code: err.code(),
                message: format!("所有明細端點皆失敗: {}", err),
            },
            None => ErpError::Permanent {
                code: None,
                message: format!("沒有可查詢 {} 的明細端點", sku),
            },
        })
    }

    /// 連線檢查：取得權杖並列出店鋪
    pub fn test_connection(&self) -> Result<ConnectionStatus> {
        let accounts = self.list_accounts()?;
        let token_masked = self
            .session
            .current()
            .map(|token| token.masked())
            .unwrap_or_default();

        Ok(ConnectionStatus {
            account_count: accounts.len(),
            token_masked,
        })
    }
}
