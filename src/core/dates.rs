use crate::domain::model::INVALID_DATE;
use chrono::{NaiveDate, NaiveDateTime};

const TEXT_PATTERN: &str = "%Y-%m-%d %H:%M:%S";
const OUTPUT_PATTERN: &str = "%Y%m%d";

/// 匯出檔裡的日期欄位，可能已是日期型別或仍是文字
#[derive(Debug, Clone, PartialEq)]
pub enum DateValue {
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Text(String),
}

impl From<NaiveDate> for DateValue {
    fn from(date: NaiveDate) -> Self {
        DateValue::Date(date)
    }
}

impl From<NaiveDateTime> for DateValue {
    fn from(datetime: NaiveDateTime) -> Self {
        DateValue::DateTime(datetime)
    }
}

impl From<&str> for DateValue {
    fn from(text: &str) -> Self {
        DateValue::Text(text.to_string())
    }
}

/// 轉成 8 碼 YYYYMMDD；文字只接受 `YYYY-MM-DD HH:MM:SS`，其他一律回傳 INVALID_DATE
pub fn format_date(value: &DateValue) -> String {
    match value {
        DateValue::DateTime(datetime) => datetime.format(OUTPUT_PATTERN).to_string(),
        DateValue::Date(date) => date.format(OUTPUT_PATTERN).to_string(),
        DateValue::Text(text) => match NaiveDateTime::parse_from_str(text.trim(), TEXT_PATTERN) {
            Ok(datetime) => datetime.format(OUTPUT_PATTERN).to_string(),
            Err(_) => INVALID_DATE.to_string(),
        },
    }
}

/// 缺值視為型別不符
pub fn format_optional(value: Option<&str>) -> String {
    match value {
        Some(text) => format_date(&DateValue::from(text)),
        None => INVALID_DATE.to_string(),
    }
}
