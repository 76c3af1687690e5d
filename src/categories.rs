//! Кэшбэк по категориям за календарный месяц.

use std::collections::BTreeMap;

use crate::error::ReportError;
use crate::table::{OperationTable, STATUS_OK, columns};
use crate::types::{CategoryCashback, Money, TopCategories};
use crate::utils::round_money;
use crate::window::ReportWindow;
use rust_decimal::Decimal;

/// Сколько категорий попадает в отчёт.
pub const TOP_CATEGORIES: usize = 3;

/// Ставка кэшбэка по категориям, 10%.
pub const CATEGORY_CASHBACK_RATE: Money = Decimal::from_parts(1, 0, 0, false, 1);

/// Кэшбэк по первым трём категориям расходов за месяц `year`-`month`.
///
/// Категории группируются в порядке сортировки названий, и в отчёт попадают первые три
/// группы, а не три самые крупные. Для каждой считается `|сумма| * 10%` с округлением
/// до копеек. Учитываются только операции со статусом `OK` и отрицательной суммой.
pub fn top_categories(
    table: &OperationTable,
    year: i32,
    month: u32,
) -> Result<TopCategories, ReportError> {
    let [date_idx, status_idx, amount_idx, category_idx] = table.require([
        columns::OPERATION_DATE,
        columns::STATUS,
        columns::PAYMENT_AMOUNT,
        columns::CATEGORY,
    ])?;
    let window = ReportWindow::calendar_month(year, month)?;
    tracing::info!(year, month, rows = table.len(), "top categories report");

    let mut groups: BTreeMap<String, Money> = BTreeMap::new();
    for row in table.rows() {
        // Даты разбираем для всех строк, как и при фильтрации по месяцу.
        let Some(date) = row[date_idx].datetime(columns::OPERATION_DATE)? else {
            continue;
        };
        if !window.contains(date) || !row[status_idx].text_eq(STATUS_OK) {
            continue;
        }
        let Some(amount) = row[amount_idx].money(columns::PAYMENT_AMOUNT)? else {
            continue;
        };
        if amount >= Decimal::ZERO {
            continue;
        }
        let Some(category) = row[category_idx].as_text() else {
            continue;
        };
        *groups.entry(category).or_insert(Decimal::ZERO) += amount;
    }

    let entries: Vec<CategoryCashback> = groups
        .into_iter()
        .take(TOP_CATEGORIES)
        .map(|(category, total)| CategoryCashback {
            category,
            cashback: round_money(total.abs() * CATEGORY_CASHBACK_RATE),
        })
        .collect();
    tracing::info!(categories = entries.len(), "top categories computed");
    Ok(TopCategories { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn fixture() -> OperationTable {
        let mut table = OperationTable::new([
            columns::OPERATION_DATE,
            columns::STATUS,
            columns::PAYMENT_AMOUNT,
            columns::CATEGORY,
        ]);
        for (date, status, amount, category) in [
            ("10.05.2018 00:00:00", "FAILED", -100, "Аптеки"),
            ("10.05.2018 00:00:00", "OK", -100, "Аптеки"),
            ("10.06.2018 00:00:00", "OK", -1500, "ООО ДОМ"),
            ("10.06.2018 00:00:00", "OK", -1000, "ООО ДОМ"),
        ] {
            table.push_row(vec![
                Cell::text(date),
                Cell::text(status),
                Cell::Number(Decimal::from(amount)),
                Cell::text(category),
            ]);
        }
        table
    }

    #[test]
    fn failed_operations_are_ignored() {
        let result = top_categories(&fixture(), 2018, 5).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.get("Аптеки"), Some(Decimal::new(100, 1)));
        assert_eq!(result.to_json().unwrap(), "{\n  \"Аптеки\": 10.0\n}");
    }

    #[test]
    fn sums_within_category() {
        let result = top_categories(&fixture(), 2018, 6).unwrap();
        assert_eq!(result.to_json().unwrap(), "{\n  \"ООО ДОМ\": 250.0\n}");
    }

    #[test]
    fn empty_month_serializes_to_empty_object() {
        let result = top_categories(&fixture(), 2018, 7).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.to_json().unwrap(), "{}");
    }

    #[test]
    fn takes_first_three_groups_by_label() {
        let mut table = fixture();
        for (category, amount) in [("Ж", -1), ("Б", -5000), ("А", -20), ("В", -30)] {
            table.push_row(vec![
                Cell::text("15.06.2018 12:00:00"),
                Cell::text("OK"),
                Cell::Number(Decimal::from(amount)),
                Cell::text(category),
            ]);
        }
        let result = top_categories(&table, 2018, 6).unwrap();
        let labels: Vec<&str> = result.entries.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(labels, vec!["А", "Б", "В"]);
        assert_eq!(result.get("Б"), Some(Decimal::from(500)));
    }

    #[test]
    fn last_day_of_month_is_included() {
        let mut table = fixture();
        table.push_row(vec![
            Cell::text("30.06.2018 18:45:00"),
            Cell::text("OK"),
            Cell::Number(Decimal::from(-500)),
            Cell::text("ООО ДОМ"),
        ]);
        let result = top_categories(&table, 2018, 6).unwrap();
        assert_eq!(result.get("ООО ДОМ"), Some(Decimal::from(300)));
    }

    #[test]
    fn fraction_of_last_second_is_included() {
        let mut table = OperationTable::new([
            columns::OPERATION_DATE,
            columns::STATUS,
            columns::PAYMENT_AMOUNT,
            columns::CATEGORY,
        ]);
        table.push_row(vec![
            Cell::text("2018-06-30 23:59:59.5"),
            Cell::text("OK"),
            Cell::Number(Decimal::from(-100)),
            Cell::text("A"),
        ]);
        let result = top_categories(&table, 2018, 6).unwrap();
        assert_eq!(result.to_json().unwrap(), "{\n  \"A\": 10.0\n}");
        assert!(top_categories(&table, 2018, 7).unwrap().is_empty());
    }

    #[test]
    fn missing_columns_are_listed() {
        let mut table = OperationTable::new([columns::OPERATION_DATE, columns::CATEGORY]);
        table.push_row(vec![Cell::text("10.05.2018 00:00:00"), Cell::text("Аптеки")]);
        let err = top_categories(&table, 2018, 6).unwrap_err();
        match err {
            ReportError::MissingColumns { columns: missing } => {
                assert_eq!(missing, vec![columns::STATUS, columns::PAYMENT_AMOUNT]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
