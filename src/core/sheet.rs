//! 匯出檔讀寫：欄位檢查、平台判定、出貨單 CSV。

use crate::domain::model::{Platform, ShipmentRow};
use crate::domain::orders::OrderSheet;
use crate::utils::error::{EtlError, Result};
use serde::de::DeserializeOwned;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 出貨範本欄位，順序與 `ShipmentRow` 相同
pub const SHIPMENT_HEADERS: [&str; 15] = [
    "貨主編號",
    "貨主單號",
    "客戶端代號(店號)",
    "訂購日期",
    "商品編號",
    "商品名稱",
    "訂購數量",
    "配送方式",
    "收貨人姓名",
    "收貨人地址",
    "收貨人聯絡電話",
    "到貨時段",
    "訂單 / 宅配單備註",
    "品項備註",
    "指定配送溫層",
];

/// 匯出工具多出來的索引欄 (`Unnamed: 0`) 與空白欄名不算
pub fn significant_columns<'a, I>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    headers
        .into_iter()
        .map(str::trim)
        .filter(|h| !h.is_empty() && !h.starts_with("Unnamed"))
        .map(str::to_string)
        .collect()
}

fn missing_columns(columns: &[String], expected: &[&str]) -> Vec<String> {
    expected
        .iter()
        .filter(|name| !columns.iter().any(|c| c == *name))
        .map(|name| name.to_string())
        .collect()
}

/// 識別欄位全部出現才算符合
pub fn detect_platform(columns: &[String]) -> Result<Platform> {
    Platform::ALL
        .into_iter()
        .find(|platform| missing_columns(columns, platform.schema().identify_by).is_empty())
        .ok_or_else(|| EtlError::UnknownPlatform {
            columns: columns.to_vec(),
        })
}

pub fn validate_columns(platform: Platform, columns: &[String]) -> Result<()> {
    let missing = missing_columns(columns, platform.schema().required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(EtlError::SchemaMismatch {
            platform: platform.to_string(),
            missing,
        })
    }
}

fn deserialize_lines<T: DeserializeOwned>(reader: &mut csv::Reader<&[u8]>) -> Result<Vec<T>> {
    let mut lines = Vec::new();
    for record in reader.deserialize() {
        lines.push(record?);
    }
    Ok(lines)
}

/// 讀入匯出檔；未指定平台時由欄位自動判定
pub fn read_order_sheet(data: &[u8], platform: Option<Platform>) -> Result<OrderSheet> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(data);

    let columns = significant_columns(reader.headers()?.iter());
    let platform = match platform {
        Some(platform) => platform,
        None => {
            let detected = detect_platform(&columns)?;
            tracing::info!("🔍 Detected {} export", detected);
            detected
        }
    };
    validate_columns(platform, &columns)?;

    let sheet = match platform {
        Platform::C2c => OrderSheet::C2c(deserialize_lines(&mut reader)?),
        Platform::Mixx => OrderSheet::Mixx(deserialize_lines(&mut reader)?),
        Platform::Shopline => OrderSheet::Shopline(deserialize_lines(&mut reader)?),
    };

    tracing::debug!("Read {} {} rows", sheet.len(), platform);
    Ok(sheet)
}

pub fn write_shipment_csv(rows: &[ShipmentRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if rows.is_empty() {
        writer.write_record(SHIPMENT_HEADERS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}
