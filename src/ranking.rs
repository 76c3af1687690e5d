//! Топ операций по сумме платежа.

use std::cmp::Ordering;

use crate::error::ReportError;
use crate::table::{Cell, OperationTable, columns};
use crate::types::TransactionEntry;

/// Сколько операций попадает в топ.
pub const TOP_TRANSACTIONS: usize = 5;

/// Пять операций с наибольшей суммой платежа со знаком: доходы идут раньше расходов,
/// среди расходов первыми идут наименьшие по модулю. Пустые суммы в конце.
pub fn top_transactions(table: &OperationTable) -> Result<Vec<TransactionEntry>, ReportError> {
    if table.is_empty() {
        tracing::info!("top transactions: no operations");
        return Ok(Vec::new());
    }
    let [date_idx, amount_idx, category_idx, description_idx] = table.require([
        columns::PAYMENT_DATE,
        columns::PAYMENT_AMOUNT,
        columns::CATEGORY,
        columns::DESCRIPTION,
    ])?;

    let mut ranked = Vec::with_capacity(table.len());
    for row in table.rows() {
        ranked.push((row[amount_idx].money(columns::PAYMENT_AMOUNT)?, row));
    }
    // Стабильная сортировка: при равных суммах сохраняется исходный порядок.
    ranked.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    Ok(ranked
        .into_iter()
        .take(TOP_TRANSACTIONS)
        .map(|(amount, row)| TransactionEntry {
            date: payment_date(&row[date_idx]),
            amount,
            category: row[category_idx].as_text(),
            description: row[description_idx].as_text(),
        })
        .collect())
}

/// Дата платежа в виде `dd.mm.yyyy`.
fn payment_date(cell: &Cell) -> Option<String> {
    match cell {
        Cell::DateTime(dt) => Some(dt.format("%d.%m.%Y").to_string()),
        other => other.as_text(),
    }
}
