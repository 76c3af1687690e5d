//! Траты по категории за последние 90 дней.

use crate::error::ReportError;
use crate::table::{OperationTable, STATUS_OK, columns};
use crate::utils::parse_reference_date;
use crate::window::{ReportWindow, SPENDING_LOOKBACK_DAYS};
use chrono::{Local, NaiveDateTime};
use rust_decimal::Decimal;

/// Расходы категории `category` за 90 дней до `date` включительно.
///
/// `date` принимается в форматах `YYYY-MM-DD` и `YYYY-MM-DD HH:MM:SS`; без даты отчёт
/// строится от текущего момента. Возвращаются исходные строки со всеми столбцами.
pub fn spending_by_category(
    table: &OperationTable,
    category: &str,
    date: Option<&str>,
) -> Result<OperationTable, ReportError> {
    let reference = match date {
        Some(text) => parse_reference_date(text)?,
        None => {
            tracing::info!("no date given, using current time");
            Local::now().naive_local()
        }
    };
    spending_by_category_at(table, category, reference)
}

/// То же, что [`spending_by_category`], с уже разобранной датой отчёта.
pub fn spending_by_category_at(
    table: &OperationTable,
    category: &str,
    reference: NaiveDateTime,
) -> Result<OperationTable, ReportError> {
    let [date_idx, status_idx, amount_idx, category_idx] = table.require([
        columns::OPERATION_DATE,
        columns::STATUS,
        columns::PAYMENT_AMOUNT,
        columns::CATEGORY,
    ])?;
    let window = ReportWindow::trailing_days(reference, SPENDING_LOOKBACK_DAYS)?;
    tracing::info!(category, start = %window.start, end = %window.end, "spending by category");

    let filtered = table.retain_rows(|row| {
        let in_window = row[date_idx]
            .datetime(columns::OPERATION_DATE)?
            .is_some_and(|dt| window.contains(dt));
        let is_expense = row[amount_idx]
            .money(columns::PAYMENT_AMOUNT)?
            .is_some_and(|amount| amount < Decimal::ZERO);
        Ok(in_window
            && is_expense
            && row[status_idx].text_eq(STATUS_OK)
            && row[category_idx].text_eq(category))
    })?;
    tracing::info!(category, kept = filtered.len(), "spending by category done");
    Ok(filtered)
}
