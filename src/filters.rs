//! Отбор операций по окну «с начала месяца».

use crate::error::ReportError;
use crate::table::{OperationTable, STATUS_OK, columns};
use crate::window::ReportWindow;
use chrono::NaiveDateTime;

/// Операции со статусом `OK`, совершённые с первого числа месяца `reference` по `reference`
/// включительно.
///
/// Даты разбираются для всех строк до отбора, поэтому некорректная дата в любой строке
/// приводит к ошибке. Строки с пустой датой или статусом в результат не попадают.
pub fn filter_by_month_to_date(
    table: &OperationTable,
    reference: NaiveDateTime,
) -> Result<OperationTable, ReportError> {
    if table.is_empty() {
        return Ok(table.clone());
    }
    let [date_idx, status_idx] = table.require([columns::OPERATION_DATE, columns::STATUS])?;
    let window = ReportWindow::month_to_date(reference);
    tracing::debug!(start = %window.start, end = %window.end, "month-to-date filter");

    let filtered = table.retain_rows(|row| {
        let in_window = row[date_idx]
            .datetime(columns::OPERATION_DATE)?
            .is_some_and(|dt| window.contains(dt));
        Ok(in_window && row[status_idx].text_eq(STATUS_OK))
    })?;
    tracing::info!(
        total = table.len(),
        kept = filtered.len(),
        "operations filtered by month to date"
    );
    Ok(filtered)
}
