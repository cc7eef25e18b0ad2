//! 請求簽章
//!
//! 業務請求須在查詢參數附上 `sign`：
//! 公共參數與業務參數合併、略過空值、依鍵名 ASCII 排序後以 `k=v&...` 串接，
//! 取 MD5 大寫十六進位，再以 app_id 為金鑰做 AES-128-ECB（PKCS#7 填充）並 Base64 編碼。

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ecb::cipher::block_padding::Pkcs7;
use ecb::cipher::{BlockEncryptMut, KeyInit};
use md5::{Digest, Md5};
use serde_json::Value;

type Aes128EcbEnc = ecb::Encryptor<aes::Aes128>;

const AES_KEY_LEN: usize = 16;

/// 簽章用參數表（業務參數覆蓋同名公共參數）
pub fn sign_params(common: &[(&str, &str)], business: &Value) -> BTreeMap<String, String> {
    let mut params: BTreeMap<String, String> = common
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    if let Value::Object(map) = business {
        for (key, value) in map {
            if let Some(text) = param_text(value) {
                params.insert(key.clone(), text);
            }
        }
    }
    params
}

/// 參數值的簽章文字；`null` 與空字串不參與簽章
fn param_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        // 陣列與物件以緊湊 JSON 參與簽章
        other => Some(other.to_string()),
    }
}

/// 排序後的 `k=v&...` 串
pub fn canonical_string(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// 計算簽章
pub fn sign(params: &BTreeMap<String, String>, app_id: &str) -> String {
    let digest = Md5::digest(canonical_string(params).as_bytes());
    let hex: String = digest.iter().map(|byte| format!("{:02X}", byte)).collect();

    // app_id 不足 16 位元組補零，超過則截斷
    let mut key = [0u8; AES_KEY_LEN];
    let bytes = app_id.as_bytes();
    let len = bytes.len().min(AES_KEY_LEN);
    key[..len].copy_from_slice(&bytes[..len]);

    let encrypted = Aes128EcbEnc::new(&key.into()).encrypt_padded_vec_mut::<Pkcs7>(hex.as_bytes());
    STANDARD.encode(encrypted)
}
