//! ERP 錯誤類型

use thiserror::Error;

/// 上游回傳的權杖失效代碼：清除權杖後重發一次
pub const TOKEN_INVALID_CODES: [i64; 4] = [2_001_003, 2_001_005, 2_001_008, 2_001_009];

/// 上游限流代碼（可重試）
pub const RATE_LIMIT_CODE: i64 = 3_001_008;

/// ERP 客戶端錯誤
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ErpError {
    /// 憑證被拒絕，整次執行無法繼續，不重試
    #[error("認證失敗: {0}")]
    Auth(String),

    /// 網路、逾時、HTTP 5xx/429 或限流，可重試
    #[error("暫時性錯誤: {0}")]
    Transient(String),

    /// 業務錯誤碼或所有備援端點皆失敗，不重試
    #[error("上游拒絕請求 (code={code:?}): {message}")]
    Permanent { code: Option<i64>, message: String },

    /// 回應格式無法辨識
    #[error("回應解析失敗: {0}")]
    Decode(String),

    #[error("無效的配置: {0}")]
    Config(String),

    /// 工作執行緒池建立失敗
    #[error("執行緒池錯誤: {0}")]
    Pool(String),
}

impl ErpError {
    /// 業務錯誤（附帶代碼說明）
    pub fn business(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = match describe_code(code) {
            Some(description) => format!("{} ({})", message, description),
            None => message,
        };

        if code == RATE_LIMIT_CODE {
            ErpError::Transient(format!("請求過於頻繁 (code={}): {}", code, message))
        } else {
            ErpError::Permanent {
                code: Some(code),
                message,
            }
        }
    }

    /// 非 2xx 的 HTTP 狀態：429 與 5xx 可重試，其餘為永久錯誤
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 429 || (500..600).contains(&status) {
            ErpError::Transient(message)
        } else {
            ErpError::Permanent {
                code: Some(i64::from(status)),
                message,
            }
        }
    }

    /// 是否可以重試
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErpError::Transient(_))
    }

    /// 是否為權杖失效
    pub fn is_token_invalid(&self) -> bool {
        matches!(self, ErpError::Permanent { code: Some(code), .. } if TOKEN_INVALID_CODES.contains(code))
    }

    /// 上游業務代碼
    pub fn code(&self) -> Option<i64> {
        match self {
            ErpError::Permanent { code, .. } => *code,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ErpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            ErpError::Transient(err.to_string())
        } else if err.is_decode() {
            ErpError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ErpError::from_status(status.as_u16(), err.to_string())
        } else {
            ErpError::Transient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ErpError {
    fn from(err: serde_json::Error) -> Self {
        ErpError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ErpError>;

/// 上游錯誤碼說明
pub fn describe_code(code: i64) -> Option<&'static str> {
    let description = match code {
        2_001_001 => "appId 不存在",
        2_001_002 => "appSecret 不正確",
        2_001_003 => "access_token 不存在或已過期",
        2_001_004 => "API 未授權",
        2_001_005 => "access_token 不正確",
        2_001_006 => "簽名不正確",
        2_001_007 => "簽名已過期",
        2_001_008 => "refresh_token 已過期",
        2_001_009 => "refresh_token 不正確",
        3_001_001 => "缺少必傳參數",
        3_001_002 => "IP 未加入白名單",
        3_001_008 => "請求過於頻繁",
        _ => return None,
    };
    Some(description)
}

/// 單一店鋪的抓取失敗
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFailure {
    pub account_id: String,
    pub error: ErpError,
}

/// 部分店鋪抓取失敗：不致命，與成功的資料一起回傳
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{} 個店鋪抓取失敗: {}", .failures.len(), failed_ids(.failures))]
pub struct PartialAggregationError {
    pub failures: Vec<AccountFailure>,
}

impl PartialAggregationError {
    /// 有失敗店鋪時才產生錯誤
    pub fn from_failures(failures: &[AccountFailure]) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self {
                failures: failures.to_vec(),
            })
        }
    }
}

fn failed_ids(failures: &[AccountFailure]) -> String {
    failures
        .iter()
        .map(|f| f.account_id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
