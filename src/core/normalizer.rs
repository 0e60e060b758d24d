use crate::domain::model::{CanonicalListing, RawListing};
use serde_json::Value;

pub const UNKNOWN: &str = "Unknown";

/// 把一筆 API 原始職缺轉成固定欄位格式。不會失敗，缺漏或格式錯誤的欄位一律套用預設值。
pub fn normalize(raw: &RawListing, search_term: &str) -> CanonicalListing {
    CanonicalListing {
        job_title: search_term.to_string(),
        title: text_or_unknown(raw.get("title")),
        company: text_or_unknown(display_name(raw, "company")),
        location: text_or_unknown(display_name(raw, "location")),
        posted_at: optional_text(raw.get("created")),
        description: text_or_unknown(raw.get("description")),
        salary_min: optional_number(raw.get("salary_min")),
        salary_max: optional_number(raw.get("salary_max")),
        contract_type: optional_text(raw.get("contract_type")),
        contract_time: optional_text(raw.get("contract_time")),
        apply_link: text_or_unknown(raw.get("redirect_url")),
    }
}

/// 標題與公司都落回預設值時，這筆資料多半是壞的
pub fn is_missing_identity(listing: &CanonicalListing) -> bool {
    listing.title == UNKNOWN && listing.company == UNKNOWN
}

// Adzuna 把公司與地點包在 { "display_name": ... } 裡
fn display_name<'a>(raw: &'a RawListing, key: &str) -> Option<&'a Value> {
    raw.get(key).and_then(|value| value.get("display_name"))
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn text_or_unknown(value: Option<&Value>) -> String {
    optional_text(value).unwrap_or_else(|| UNKNOWN.to_string())
}

fn optional_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    number.is_finite().then_some(number)
}
