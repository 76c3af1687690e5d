//! Вспомогательные парсеры чисел и дат, округление и приветствие.

use crate::error::ReportError;
use crate::types::Money;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::ser::Error as _;
use std::str::FromStr;

/// Форматы даты и времени операции, встречающиеся в выгрузках (день идёт первым).
const DATETIME_FORMATS: [&str; 5] = [
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Форматы, в которых дата указана без времени.
const DATE_FORMATS: [&str; 2] = ["%d.%m.%Y", "%Y-%m-%d"];

/// Форматы даты, которые принимает пользовательский ввод.
const REFERENCE_DATE_FORMAT: &str = "%Y-%m-%d";
const REFERENCE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Нормализует числовую строку, удаляя пробелы и знак плюса, запятая становится точкой.
fn normalize_number(input: &str) -> String {
    input
        .chars()
        .filter(|ch| !matches!(*ch, ' ' | '\u{a0}' | '\u{202f}' | '+'))
        .map(|ch| if ch == ',' { '.' } else { ch })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Разбирает денежное значение из текста. Пустая строка означает отсутствие значения.
pub fn parse_money(value: &str, column: &'static str) -> Result<Option<Money>, ReportError> {
    let normalized = normalize_number(value);
    if normalized.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(&normalized)
        .map(Some)
        .map_err(|_| ReportError::Number {
            value: value.trim().to_string(),
            column,
        })
}

/// Переводит `f64` в `Decimal` через кратчайшее десятичное представление,
/// чтобы `-20.55` не превращалось в `-20.550000000000000710...`.
pub fn money_from_f64(value: f64) -> Option<Money> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string()).ok()
}

/// Округляет до копеек (банковское округление).
///
/// Округляется точное десятичное значение, без перевода в `f64`, поэтому ровно
/// половина копейки уходит к чётной цифре: `0.025` → `0.02`, `0.035` → `0.04`.
/// При округлении двоичного представления с плавающей точкой такие значения могут
/// дать соседний результат (`abs(-0.25) * 0.1` как `f64` округляется до `0.03`).
#[inline]
pub fn round_money(value: Money) -> Money {
    value.round_dp(2)
}

/// Разбирает дату и время операции (`dd.mm.yyyy HH:MM:SS` и совместимые форматы).
/// Дата без времени трактуется как полночь.
pub fn parse_operation_datetime(
    value: &str,
    column: &'static str,
) -> Result<NaiveDateTime, ReportError> {
    let trimmed = value.trim();
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(parsed.and_time(chrono::NaiveTime::MIN));
        }
    }
    Err(ReportError::Date {
        value: trimmed.to_string(),
        column,
    })
}

/// Год из ровно четырёх цифр в начале строки. `%Y` у chrono принимает и знак,
/// и более длинные годы.
fn starts_with_four_digit_year(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() > 4 && bytes[..4].iter().all(u8::is_ascii_digit) && bytes[4] == b'-'
}

/// Проверяет дату, введённую пользователем: `YYYY-MM-DD` или `YYYY-MM-DD HH:MM:SS`.
pub fn parse_reference_date(value: &str) -> Result<NaiveDateTime, ReportError> {
    let trimmed = value.trim();
    if !starts_with_four_digit_year(trimmed) {
        return Err(ReportError::UnsupportedDateFormat {
            value: trimmed.to_string(),
        });
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, REFERENCE_DATETIME_FORMAT) {
        return Ok(parsed);
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, REFERENCE_DATE_FORMAT) {
        return Ok(parsed.and_time(chrono::NaiveTime::MIN));
    }
    Err(ReportError::UnsupportedDateFormat {
        value: trimmed.to_string(),
    })
}

/// Приветствие по времени суток.
pub fn greeting(moment: NaiveDateTime) -> &'static str {
    match moment.hour() {
        0..=5 => "Доброй ночи",
        6..=11 => "Доброе утро",
        12..=17 => "Добрый день",
        _ => "Добрый вечер",
    }
}

/// JSON с отступом в четыре пробела, не-ASCII символы не экранируются.
pub fn to_json_4space<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    // serde_json пишет только корректный UTF-8.
    String::from_utf8(buf).map_err(serde_json::Error::custom)
}

/// Последние четыре символа номера карты (`*7197` → `7197`).
pub fn last_digits(card: &str) -> String {
    let chars: Vec<char> = card.chars().collect();
    let start = chars.len().saturating_sub(4);
    chars[start..].iter().collect()
}
