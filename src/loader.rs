//! Загрузка выгрузки операций (Excel или JSON) и пользовательских настроек.

use std::fs;
use std::path::Path;

use crate::error::ReportError;
use crate::table::{Cell, OperationTable};
use crate::types::UserSettings;
use crate::utils::money_from_f64;
use calamine::{Data, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

/// Загружает операции, выбирая формат по расширению файла.
pub fn load_operations<P: AsRef<Path>>(path: P) -> Result<OperationTable, ReportError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("xlsx" | "xlsm" | "xls" | "xlsb" | "ods") => load_operations_from_excel(path),
        Some("json") => load_operations_from_json(path),
        _ => Err(ReportError::UnsupportedSource {
            path: path.to_path_buf(),
        }),
    }
}

fn ensure_exists(path: &Path) -> Result<(), ReportError> {
    if path.is_file() {
        Ok(())
    } else {
        tracing::error!(path = %path.display(), "file not found");
        Err(ReportError::FileNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Читает первый лист книги; первая строка содержит названия столбцов.
pub fn load_operations_from_excel<P: AsRef<Path>>(path: P) -> Result<OperationTable, ReportError> {
    let path = path.as_ref();
    ensure_exists(path)?;
    tracing::info!(path = %path.display(), "reading operations workbook");

    let mut workbook =
        open_workbook_auto(path).map_err(|err| ReportError::Spreadsheet(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReportError::InvalidSource {
            path: path.to_path_buf(),
            reason: "workbook has no sheets".to_string(),
        })?
        .map_err(|err| ReportError::Spreadsheet(err.to_string()))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(OperationTable::default());
    };
    let mut table = OperationTable::new(header.iter().map(|cell| cell.to_string().trim().to_string()));
    for row in rows {
        table.push_row(row.iter().map(cell_from_excel).collect());
    }
    tracing::info!(path = %path.display(), rows = table.len(), "operations workbook loaded");
    Ok(table)
}

fn cell_from_excel(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s.clone()),
        Data::Float(f) => money_from_f64(*f).map_or(Cell::Empty, Cell::Number),
        Data::Int(i) => Cell::Number(Decimal::from(*i)),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64()).map_or(Cell::Empty, Cell::DateTime),
    }
}

/// Наибольший серийный номер Excel, 9999-12-31.
const EXCEL_MAX_SERIAL: f64 = 2_958_465.999_999;

/// Серийный номер даты Excel: дни с 1899-12-30, дробная часть задаёт время суток.
/// Значения вне диапазона дат Excel дают `None`.
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !(0.0..=EXCEL_MAX_SERIAL).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    #[allow(clippy::cast_possible_truncation)]
    let seconds = (serial * 86_400.0).round() as i64;
    base.checked_add_signed(Duration::try_seconds(seconds)?)
}

/// Читает JSON-массив объектов; ключи объектов становятся столбцами в порядке появления.
pub fn load_operations_from_json<P: AsRef<Path>>(path: P) -> Result<OperationTable, ReportError> {
    let path = path.as_ref();
    ensure_exists(path)?;
    tracing::info!(path = %path.display(), "reading operations json");

    let data = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&data)?;
    let Value::Array(records) = value else {
        return Err(ReportError::InvalidSource {
            path: path.to_path_buf(),
            reason: "expected a list of operations".to_string(),
        });
    };

    let mut table = OperationTable::default();
    for record in records {
        let Value::Object(fields) = record else {
            return Err(ReportError::InvalidSource {
                path: path.to_path_buf(),
                reason: "every operation must be an object".to_string(),
            });
        };
        table.push_record(fields.into_iter().map(|(k, v)| (k, cell_from_json(v))));
    }
    tracing::info!(path = %path.display(), rows = table.len(), "operations json loaded");
    Ok(table)
}

fn cell_from_json(value: Value) -> Cell {
    match value {
        Value::Null => Cell::Empty,
        Value::String(s) => Cell::text(s),
        Value::Number(n) => n
            .as_i64()
            .map(|i| Cell::Number(Decimal::from(i)))
            .or_else(|| n.as_f64().and_then(money_from_f64).map(Cell::Number))
            .unwrap_or(Cell::Empty),
        Value::Bool(b) => Cell::Text(b.to_string()),
        other => Cell::Text(other.to_string()),
    }
}

/// Читает пользовательские настройки: JSON-массив объектов без пустых элементов.
///
/// Отсутствующий, повреждённый файл или файл не со списком дают пустой результат.
pub fn load_user_settings<P: AsRef<Path>>(path: P) -> Vec<Map<String, Value>> {
    let path = path.as_ref();
    if !path.is_file() {
        tracing::error!(path = %path.display(), "settings file not found");
        return Vec::new();
    }
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) => {
            tracing::error!(path = %path.display(), %err, "cannot read settings");
            return Vec::new();
        }
    };
    match serde_json::from_str::<Value>(&data) {
        Ok(Value::Array(items)) => {
            let settings: Vec<Map<String, Value>> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) if !map.is_empty() => Some(map),
                    _ => None,
                })
                .collect();
            tracing::info!(path = %path.display(), entries = settings.len(), "settings loaded");
            settings
        }
        Ok(_) => {
            tracing::error!(path = %path.display(), "settings file is not a list");
            Vec::new()
        }
        Err(err) => {
            tracing::error!(path = %path.display(), %err, "cannot parse settings json");
            Vec::new()
        }
    }
}

impl UserSettings {
    /// Валюты и акции из первой записи настроек; отсутствующие списки считаются пустыми.
    pub fn from_entries(entries: &[Map<String, Value>]) -> Self {
        let Some(first) = entries.first() else {
            return Self::default();
        };
        Self {
            user_currencies: string_list(first.get("user_currencies")),
            user_stocks: string_list(first.get("user_stocks")),
        }
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
