//! Окна отчётов: начало и конец периода включительно.

use crate::error::ReportError;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Длина окна отчёта о тратах по категории, в днях.
pub const SPENDING_LOOKBACK_DAYS: i64 = 90;

/// Период `[start, end]`, обе границы включены.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    /// Начало периода.
    pub start: NaiveDateTime,
    /// Конец периода.
    pub end: NaiveDateTime,
}

impl ReportWindow {
    /// С первого числа месяца (00:00:00) по `reference` включительно.
    pub fn month_to_date(reference: NaiveDateTime) -> Self {
        let first = reference.date().with_day(1).unwrap_or_else(|| reference.date());
        Self {
            start: first.and_time(NaiveTime::MIN),
            end: reference,
        }
    }

    /// Весь календарный месяц: с 1-го числа 00:00:00 до конца последнего дня,
    /// включая доли последней секунды.
    pub fn calendar_month(year: i32, month: u32) -> Result<Self, ReportError> {
        let invalid = || ReportError::InvalidPeriod { year, month };
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let next_first = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(invalid)?;
        let last = next_first.pred_opt().ok_or_else(invalid)?;
        let end_of_day =
            NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).ok_or_else(invalid)?;
        Ok(Self {
            start: first.and_time(NaiveTime::MIN),
            end: last.and_time(end_of_day),
        })
    }

    /// Последние `days` дней до `reference` включительно.
    pub fn trailing_days(reference: NaiveDateTime, days: i64) -> Result<Self, ReportError> {
        let start = Duration::try_days(days)
            .and_then(|span| reference.checked_sub_signed(span))
            .ok_or(ReportError::WindowOutOfRange { reference, days })?;
        Ok(Self {
            start,
            end: reference,
        })
    }

    /// Попадает ли момент в окно.
    #[inline]
    pub fn contains(&self, moment: NaiveDateTime) -> bool {
        self.start <= moment && moment <= self.end
    }
}
