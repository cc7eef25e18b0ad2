//! 存取權杖與工作階段

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

/// 權杖未提供有效期時的預設值（秒）
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 7200;

/// 刷新權杖的有效期（秒）
pub const REFRESH_TOKEN_LIFETIME_SECS: i64 = 7200;

/// 上游回傳的有效期上限（秒）
const MAX_TOKEN_LIFETIME_SECS: i64 = 30 * 24 * 3600;

/// 存取權杖
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

impl Token {
    /// 以有效秒數創建權杖
    pub fn issued_now(access_token: String, refresh_token: Option<String>, expires_in: i64) -> Self {
        let now = Utc::now();
        let expires_in = expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS);
        Self {
            access_token,
            refresh_token,
            expires_at: now + Duration::seconds(expires_in),
            refresh_expires_at: now + Duration::seconds(REFRESH_TOKEN_LIFETIME_SECS),
        }
    }

    /// 是否在 `threshold` 內到期
    pub fn expires_within(&self, threshold: Duration) -> bool {
        Utc::now() + threshold >= self.expires_at
    }

    /// 可用於刷新的 refresh_token
    pub fn usable_refresh_token(&self) -> Option<&str> {
        self.refresh_token
            .as_deref()
            .filter(|_| Utc::now() < self.refresh_expires_at)
    }

    pub fn masked(&self) -> String {
        mask(&self.access_token)
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &self.masked())
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// 遮罩敏感字串：`abcd****wxyz`
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}****{}", head, tail)
}

/// 權杖工作階段
///
/// 取得 → 使用 → 到期前刷新 → 丟棄。所有並行工作共用一份，
/// 刷新時持有鎖，只有第一個發現過期的執行緒發出請求，其他執行緒等待。
#[derive(Debug)]
pub struct TokenSession {
    state: Mutex<Option<Token>>,
    refresh_threshold: Duration,
}

impl TokenSession {
    pub fn new(refresh_threshold: std::time::Duration) -> Self {
        Self {
            state: Mutex::new(None),
            refresh_threshold: Duration::from_std(refresh_threshold).unwrap_or(Duration::zero()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Token>> {
        // 持鎖的執行緒 panic 後權杖本身仍然有效
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 取得有效權杖；需要時以 `issue` 取得新權杖（傳入舊權杖供刷新使用）
    pub fn get_or_issue<F, E>(&self, issue: F) -> std::result::Result<String, E>
    where
        F: FnOnce(Option<Token>) -> std::result::Result<Token, E>,
    {
        let mut guard = self.lock();

        if let Some(token) = guard.as_ref() {
            if !token.expires_within(self.refresh_threshold) {
                return Ok(token.access_token.clone());
            }
        }

        let token = issue(guard.take())?;
        let access_token = token.access_token.clone();
        *guard = Some(token);
        Ok(access_token)
    }

    /// 清除權杖（上游回報失效時）
    pub fn invalidate(&self) {
        self.lock().take();
    }

    pub fn current(&self) -> Option<Token> {
        self.lock().clone()
    }
}
