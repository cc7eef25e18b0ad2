//! 上游回應格式的正規化與解析
//!
//! 上游的回應外層固定為 `{code, message, data}`，但 `data` 可能是陣列、
//! 多包一層的 `{data: [...], total}`，或單筆物件。數字欄位可能以字串傳回。
//! 這裡把各種形狀統一轉成核心模型，無法辨識的單列記錄警告後略過。

use std::str::FromStr;

use restock_core::{Account, ChannelStock, Dimension, Mode, SalesWindows, SkuFact, SkuId};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::source::SkuPage;
use crate::token::{Token, DEFAULT_TOKEN_LIFETIME_SECS};
use crate::{error::describe_code, ErpError, Result};

/// 回應代碼（數字或字串）
pub fn code_of(envelope: &Value) -> Option<i64> {
    envelope.get("code").and_then(integer_of)
}

pub fn message_of(envelope: &Value) -> String {
    envelope
        .get("message")
        .or_else(|| envelope.get("msg"))
        .and_then(text_of)
        .unwrap_or_default()
}

/// 檢查業務回應：`code == 0` 才算成功
pub fn check(envelope: Value) -> Result<Value> {
    match code_of(&envelope) {
        Some(0) => Ok(envelope),
        Some(code) => Err(ErpError::business(code, message_of(&envelope))),
        None => Err(ErpError::Decode(format!("回應缺少 code: {}", envelope))),
    }
}

/// 解析權杖回應
///
/// 成功代碼為 `200`、`"200"` 或 `0`；權杖可能在 `data` 內或最外層。
pub fn parse_token(envelope: &Value) -> Result<Token> {
    let code = code_of(envelope);
    if !matches!(code, Some(0) | Some(200)) {
        let message = message_of(envelope);
        let message = match code.and_then(describe_code) {
            Some(description) => format!("{} ({})", message, description),
            None => message,
        };
        return Err(ErpError::Auth(format!("code={:?}: {}", code, message)));
    }

    let data = envelope.get("data").filter(|d| d.is_object()).unwrap_or(envelope);
    let field = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| data.get(*key).or_else(|| envelope.get(*key)).and_then(text_of))
            .filter(|value| !value.is_empty())
    };

    let access_token = field(&["access_token", "tenant_access_token"])
        .ok_or_else(|| ErpError::Auth("權杖回應缺少 access_token".to_string()))?;
    let refresh_token = field(&["refresh_token"]);
    let expires_in = ["expires_in", "expire"]
        .iter()
        .find_map(|key| data.get(*key).or_else(|| envelope.get(*key)).and_then(integer_of))
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

    Ok(Token::issued_now(access_token, refresh_token, expires_in))
}

/// 取出列表資料與總筆數
pub fn extract_rows(envelope: &Value) -> Result<(Vec<Value>, Option<u64>)> {
    let envelope_total = envelope.get("total").and_then(integer_of);

    match envelope.get("data") {
        None | Some(Value::Null) => Ok((Vec::new(), envelope_total.map(to_total))),
        Some(Value::Array(rows)) => Ok((rows.clone(), envelope_total.map(to_total))),
        Some(Value::Object(inner)) => {
            let total = inner.get("total").and_then(integer_of).or(envelope_total);
            match inner.get("data").or_else(|| inner.get("list")) {
                Some(Value::Array(rows)) => Ok((rows.clone(), total.map(to_total))),
                None | Some(Value::Null) => Ok((Vec::new(), total.map(to_total))),
                Some(other) => Err(ErpError::Decode(format!("無法辨識的列表資料: {}", other))),
            }
        }
        Some(other) => Err(ErpError::Decode(format!("無法辨識的列表資料: {}", other))),
    }
}

/// 取出單筆明細
pub fn extract_detail(envelope: &Value) -> Result<Value> {
    fn first_object(value: &Value) -> Option<&Value> {
        match value {
            Value::Array(rows) => rows.first().filter(|row| row.is_object()),
            Value::Object(inner) => match inner.get("data").or_else(|| inner.get("list")) {
                Some(nested @ (Value::Array(_) | Value::Object(_))) => first_object(nested),
                _ => Some(value),
            },
            _ => None,
        }
    }

    envelope
        .get("data")
        .and_then(first_object)
        .cloned()
        .ok_or_else(|| ErpError::Decode("明細回應沒有資料".to_string()))
}

/// 解析店鋪列表
pub fn parse_accounts(envelope: &Value) -> Result<Vec<Account>> {
    let (rows, _) = extract_rows(envelope)?;

    let accounts = rows
        .iter()
        .filter_map(|row| {
            let Some(sid) = row.get("sid").and_then(text_of).filter(|s| !s.is_empty()) else {
                tracing::warn!("略過缺少 sid 的店鋪資料: {}", row);
                return None;
            };
            let name = ["name", "seller_name", "store_name"]
                .iter()
                .find_map(|key| row.get(*key).and_then(text_of))
                .unwrap_or_else(|| sid.clone());
            Some(Account::new(sid, name))
        })
        .collect();

    Ok(accounts)
}

/// 是否還有下一頁
///
/// 有總筆數時以 `offset + 本頁筆數 < total` 判斷，否則本頁滿頁才繼續；空頁一律結束。
pub fn has_more(offset: u32, row_count: usize, limit: u32, total: Option<u64>) -> bool {
    if row_count == 0 {
        return false;
    }
    match total {
        Some(total) => u64::from(offset) + (row_count as u64) < total,
        None => row_count as u64 >= u64::from(limit),
    }
}

/// 解析一頁 SKU 資料
pub fn parse_page(
    envelope: &Value,
    account_id: &str,
    dimension: Dimension,
    mode: Mode,
    offset: u32,
    limit: u32,
) -> Result<SkuPage> {
    let (rows, total) = extract_rows(envelope)?;
    let row_count = rows.len();

    let facts: Vec<SkuFact> = rows
        .iter()
        .filter_map(|row| match parse_row(row, account_id, dimension, mode) {
            Ok(fact) => Some(fact),
            Err(err) => {
                tracing::warn!("店鋪 {} 略過無法解析的資料列: {}", account_id, err);
                None
            }
        })
        .collect();

    Ok(SkuPage {
        skipped: row_count - facts.len(),
        has_more: has_more(offset, row_count, limit, total),
        facts,
        total,
        row_count,
    })
}

/// 解析單列資料（識別碼取自資料列本身）
pub fn parse_row(row: &Value, account_id: &str, dimension: Dimension, mode: Mode) -> Result<SkuFact> {
    let sections = RowSections::parse(row)?;
    let sku = sections
        .sku_id(dimension)
        .ok_or_else(|| ErpError::Decode(format!("資料列缺少 {:?} 識別碼", dimension)))?;
    sections.into_fact(account_id, sku, mode)
}

/// 解析明細資料（識別碼以請求為準）
pub fn parse_detail(envelope: &Value, account_id: &str, sku: &SkuId, mode: Mode) -> Result<SkuFact> {
    let row = extract_detail(envelope)?;
    RowSections::parse(&row)?.into_fact(account_id, sku.clone(), mode)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MskuFnsku {
    #[serde(deserialize_with = "lenient::text")]
    msku: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BasicInfo {
    #[serde(deserialize_with = "lenient::text")]
    asin: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    msku: Option<String>,
    msku_fnsku_list: Option<Vec<MskuFnsku>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AmazonQuantityInfo {
    #[serde(deserialize_with = "lenient::quantity")]
    amazon_quantity_valid: u32,
    #[serde(deserialize_with = "lenient::quantity")]
    amazon_quantity_shipping: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScmQuantityInfo {
    #[serde(deserialize_with = "lenient::quantity")]
    sc_quantity_local_valid: u32,
    #[serde(deserialize_with = "lenient::quantity")]
    sc_quantity_purchase_shipping: u32,
    #[serde(deserialize_with = "lenient::quantity")]
    sc_quantity_oversea_valid: u32,
    #[serde(deserialize_with = "lenient::quantity")]
    sc_quantity_oversea_shipping: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SalesInfo {
    #[serde(deserialize_with = "lenient::decimal")]
    sales_avg_3: Option<Decimal>,
    #[serde(deserialize_with = "lenient::decimal")]
    sales_avg_7: Option<Decimal>,
    #[serde(deserialize_with = "lenient::decimal")]
    sales_avg_14: Option<Decimal>,
    #[serde(deserialize_with = "lenient::decimal")]
    sales_avg_30: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SuggestInfo {
    #[serde(deserialize_with = "lenient::decimal")]
    available_sale_days: Option<Decimal>,
}

/// 資料列的各區段；區段不存在時（扁平明細）直接從整列讀取
struct RowSections {
    basic: BasicInfo,
    amazon: AmazonQuantityInfo,
    scm: ScmQuantityInfo,
    sales: SalesInfo,
    suggest: SuggestInfo,
}

impl RowSections {
    fn parse(row: &Value) -> Result<Self> {
        Ok(Self {
            basic: section(row, "basic_info")?,
            amazon: section(row, "amazon_quantity_info")?,
            scm: section(row, "scm_quantity_info")?,
            sales: section(row, "sales_info")?,
            suggest: section(row, "suggest_info")?,
        })
    }

    fn sku_id(&self, dimension: Dimension) -> Option<SkuId> {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        match dimension {
            Dimension::Msku => self
                .basic
                .msku_fnsku_list
                .iter()
                .flatten()
                .find_map(|entry| non_empty(&entry.msku))
                .or_else(|| non_empty(&self.basic.msku))
                .map(SkuId::Msku),
            Dimension::Asin => non_empty(&self.basic.asin).map(SkuId::Asin),
        }
    }

    fn into_fact(self, account_id: &str, sku: SkuId, mode: Mode) -> Result<SkuFact> {
        let sales = SalesWindows {
            avg_3: self.sales.sales_avg_3,
            avg_7: self.sales.sales_avg_7,
            avg_14: self.sales.sales_avg_14,
            avg_30: self.sales.sales_avg_30,
        };

        let mut fact = SkuFact::new(account_id, sku, mode)
            .with_sales(sales)
            .with_fba(ChannelStock::new(
                self.amazon.amazon_quantity_valid,
                self.amazon.amazon_quantity_shipping,
            ))
            .with_local(ChannelStock::new(
                self.scm.sc_quantity_local_valid,
                self.scm.sc_quantity_purchase_shipping,
            ))
            .with_overseas(ChannelStock::new(
                self.scm.sc_quantity_oversea_valid,
                self.scm.sc_quantity_oversea_shipping,
            ));
        fact.available_sale_days = self.suggest.available_sale_days;

        fact.validate()
            .map_err(|err| ErpError::Decode(err.to_string()))?;
        Ok(fact)
    }
}

fn section<T: DeserializeOwned>(row: &Value, key: &str) -> Result<T> {
    let source = row.get(key).filter(|v| v.is_object()).unwrap_or(row);
    T::deserialize(source).map_err(|err| ErpError::Decode(format!("{}: {}", key, err)))
}

fn to_total(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decimal_of(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn integer_of(value: &Value) -> Option<i64> {
    decimal_of(value).and_then(|d| d.trunc().to_i64())
}

fn quantity_of(value: &Value) -> u32 {
    decimal_of(value)
        .filter(|d| *d > Decimal::ZERO)
        .map(|d| d.trunc().to_u32().unwrap_or(u32::MAX))
        .unwrap_or(0)
}

mod lenient {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        Ok(super::quantity_of(&Value::deserialize(deserializer)?))
    }

    pub fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decimal>, D::Error> {
        Ok(super::decimal_of(&Value::deserialize(deserializer)?))
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(super::text_of(&Value::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn nested_row(msku: &str) -> Value {
        json!({
            "basic_info": {
                "hash_id": "h1",
                "asin": "B0TEST",
                "sid": 101,
                "msku_fnsku_list": [{"msku": msku, "fnsku": "X00"}]
            },
            "amazon_quantity_info": {"amazon_quantity_valid": "120", "amazon_quantity_shipping": 30},
            "scm_quantity_info": {
                "sc_quantity_local_valid": 200,
                "sc_quantity_purchase_shipping": "50",
                "sc_quantity_oversea_valid": 10,
                "sc_quantity_oversea_shipping": 5
            },
            "sales_info": {"sales_avg_3": "4.5", "sales_avg_7": 4, "sales_avg_14": null, "sales_avg_30": 3.25},
            "suggest_info": {"available_sale_days": "26.7"}
        })
    }

    #[test]
    fn test_parse_nested_row() {
        let fact = parse_row(&nested_row("MSKU-A"), "101", Dimension::Msku, Mode::Direct).unwrap();

        assert_eq!(fact.sku, SkuId::Msku("MSKU-A".to_string()));
        assert_eq!(fact.fba, ChannelStock::new(120, 30));
        assert_eq!(fact.local, ChannelStock::new(200, 50));
        assert_eq!(fact.overseas, ChannelStock::new(10, 5));
        assert_eq!(fact.sales.avg_3, Some(Decimal::new(45, 1)));
        assert_eq!(fact.sales.avg_14, None);
        assert_eq!(fact.sales.avg_30, Some(Decimal::new(325, 2)));
        assert_eq!(fact.available_sale_days, Some(Decimal::new(267, 1)));
    }

    #[test]
    fn test_parse_row_asin_dimension() {
        let fact = parse_row(&nested_row("MSKU-A"), "101", Dimension::Asin, Mode::Direct).unwrap();
        assert_eq!(fact.sku, SkuId::Asin("B0TEST".to_string()));
    }

    #[test]
    fn test_parse_flat_detail() {
        let envelope = json!({
            "code": 0,
            "data": {
                "sales_avg_3": 6,
                "sales_avg_14": "5",
                "available_sale_days": 9,
                "amazon_quantity_valid": 40
            }
        });
        let sku = SkuId::Msku("MSKU-A".to_string());

        let fact = parse_detail(&envelope, "101", &sku, Mode::Direct).unwrap();

        assert_eq!(fact.sku, sku);
        assert_eq!(fact.sales.avg_3, Some(Decimal::from(6)));
        assert_eq!(fact.sales.avg_14, Some(Decimal::from(5)));
        assert_eq!(fact.available_sale_days, Some(Decimal::from(9)));
        assert_eq!(fact.fba.on_hand, 40);
    }

    #[rstest]
    #[case::flat(json!({"code": 0, "data": [{"a": 1}, {"a": 2}], "total": 5}), 2, Some(5))]
    #[case::nested(json!({"code": 0, "data": {"data": [{"a": 1}], "total": "7"}}), 1, Some(7))]
    #[case::list_key(json!({"code": 0, "data": {"list": [{"a": 1}]}}), 1, None)]
    #[case::missing(json!({"code": 0}), 0, None)]
    #[case::null_inner(json!({"code": 0, "data": {"data": null, "total": 0}}), 0, Some(0))]
    fn test_extract_rows_shapes(
        #[case] envelope: Value,
        #[case] expected_rows: usize,
        #[case] expected_total: Option<u64>,
    ) {
        let (rows, total) = extract_rows(&envelope).unwrap();
        assert_eq!(rows.len(), expected_rows);
        assert_eq!(total, expected_total);
    }

    #[test]
    fn test_extract_rows_rejects_scalar() {
        assert!(matches!(
            extract_rows(&json!({"code": 0, "data": "oops"})),
            Err(ErpError::Decode(_))
        ));
    }

    #[test]
    fn test_parse_page_skips_bad_rows() {
        let envelope = json!({
            "code": 0,
            "data": {
                "data": [
                    nested_row("MSKU-A"),
                    {"basic_info": {"msku_fnsku_list": []}},
                    {"basic_info": {"msku": "NEG"}, "sales_info": {"sales_avg_7": -3}}
                ],
                "total": 3
            }
        });

        let page = parse_page(&envelope, "101", Dimension::Msku, Mode::Direct, 0, 50).unwrap();

        assert_eq!(page.facts.len(), 1);
        assert_eq!(page.row_count, 3);
        assert_eq!(page.skipped, 2);
        assert!(!page.has_more);
    }

    #[rstest]
    #[case(0, 50, 50, Some(120), true)]
    #[case(100, 20, 50, Some(120), false)]
    #[case(0, 50, 50, None, true)]
    #[case(0, 49, 50, None, false)]
    #[case(0, 0, 50, Some(120), false)]
    fn test_has_more(
        #[case] offset: u32,
        #[case] row_count: usize,
        #[case] limit: u32,
        #[case] total: Option<u64>,
        #[case] expected: bool,
    ) {
        assert_eq!(has_more(offset, row_count, limit, total), expected);
    }

    #[test]
    fn test_check_envelope() {
        assert!(check(json!({"code": 0, "data": []})).is_ok());
        assert!(check(json!({"code": "0"})).is_ok());

        let err = check(json!({"code": 3001001, "message": "missing"})).unwrap_err();
        assert_eq!(err.code(), Some(3_001_001));

        assert!(matches!(check(json!({"data": []})), Err(ErpError::Decode(_))));
    }

    #[test]
    fn test_parse_token() {
        let token = parse_token(&json!({
            "code": "200",
            "data": {"access_token": "abcdefghijklmnop", "refresh_token": "r-1", "expires_in": 3600}
        }))
        .unwrap();
        assert_eq!(token.access_token, "abcdefghijklmnop");
        assert_eq!(token.refresh_token.as_deref(), Some("r-1"));

        let token = parse_token(&json!({"code": 0, "tenant_access_token": "t-2", "expire": 1800})).unwrap();
        assert_eq!(token.access_token, "t-2");

        let err = parse_token(&json!({"code": 2001002, "message": "bad"})).unwrap_err();
        assert!(matches!(err, ErpError::Auth(ref m) if m.contains("appSecret")));
    }

    #[test]
    fn test_parse_accounts() {
        let accounts = parse_accounts(&json!({
            "code": 0,
            "data": [
                {"sid": 101, "name": "US Store"},
                {"sid": "102", "seller_name": "EU Store"},
                {"name": "no sid"}
            ]
        }))
        .unwrap();

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].account_id, "101");
        assert_eq!(accounts[1].display_name, "EU Store");
    }
}
