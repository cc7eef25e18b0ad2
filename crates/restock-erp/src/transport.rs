//! HTTP 傳輸層

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::Value;

use crate::sign;
use crate::{ErpConfig, ErpError, Result};

/// 傳輸層抽象：ERP 客戶端只依賴此介面，測試時以記憶體實作替換
pub trait Transport: Send + Sync {
    /// 表單 POST（權杖端點）
    fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<Value>;

    /// 帶權杖的 JSON POST（業務端點）
    fn post_json(&self, path: &str, access_token: &str, body: &Value) -> Result<Value>;

    /// 帶權杖的 GET（業務參數放在查詢字串）
    fn get_json(&self, path: &str, access_token: &str, params: &Value) -> Result<Value>;
}

/// 以 reqwest 同步客戶端實作的傳輸層
pub struct HttpTransport {
    http_client: Client,
    base_url: String,
    app_id: String,
}

impl HttpTransport {
    pub fn new(config: &ErpConfig) -> Result<Self> {
        let http_client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 公共參數加上簽章；`business` 為參與簽章的業務參數
    fn signed_query(&self, access_token: &str, business: &Value) -> Vec<(String, String)> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let common = [
            ("access_token", access_token),
            ("app_key", self.app_id.as_str()),
            ("timestamp", timestamp.as_str()),
        ];

        let signature = sign::sign(&sign::sign_params(&common, business), &self.app_id);

        let mut query: Vec<(String, String)> = common
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        query.push(("sign".to_string(), signature));
        query
    }

    fn send(request: RequestBuilder) -> Result<Value> {
        let response = request.header("Accept", "application/json").send()?;
        Self::read(response)
    }

    fn read(response: Response) -> Result<Value> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<Value>()?);
        }

        let text = response.text().unwrap_or_default();
        Err(ErpError::from_status(
            status.as_u16(),
            format!("HTTP {}: {}", status, text),
        ))
    }
}

impl Transport for HttpTransport {
    fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<Value> {
        tracing::debug!("POST {}", path);
        Self::send(self.http_client.post(self.url(path)).form(form))
    }

    fn post_json(&self, path: &str, access_token: &str, body: &Value) -> Result<Value> {
        tracing::debug!("POST {} {}", path, body);
        let query = self.signed_query(access_token, body);
        Self::send(self.http_client.post(self.url(path)).query(&query).json(body))
    }

    fn get_json(&self, path: &str, access_token: &str, params: &Value) -> Result<Value> {
        tracing::debug!("GET {} {}", path, params);
        let mut query = self.signed_query(access_token, params);
        if let Value::Object(map) = params {
            for (key, value) in map {
                match value {
                    Value::Null => {}
                    Value::String(text) if text.is_empty() => {}
                    Value::String(text) => query.push((key.clone(), text.clone())),
                    other => query.push((key.clone(), other.to_string())),
                }
            }
        }
        Self::send(self.http_client.get(self.url(path)).query(&query))
    }
}
