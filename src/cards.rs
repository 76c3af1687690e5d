//! Сводка расходов и кэшбэка по картам.

use std::collections::BTreeMap;

use crate::error::ReportError;
use crate::table::{OperationTable, columns};
use crate::types::{CardSummary, Money};
use crate::utils::{last_digits, round_money};
use rust_decimal::Decimal;

/// Откуда берётся кэшбэк в сводке по картам.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CashbackPolicy {
    /// Сумма значений столбца «Кэшбэк» (пустые ячейки не учитываются).
    #[default]
    Recorded,
    /// 1 рубль на каждые 100 рублей расходов; столбец «Кэшбэк» не нужен.
    OnePerHundred,
}

#[derive(Debug, Default)]
struct CardTotals {
    spent: Money,
    cashback: Money,
}

/// Расходы по каждой карте. Учитываются только операции с отрицательной суммой;
/// статус не проверяется, ожидается уже отфильтрованная таблица.
///
/// Карты идут в порядке сортировки номеров.
pub fn card_report(
    table: &OperationTable,
    policy: CashbackPolicy,
) -> Result<Vec<CardSummary>, ReportError> {
    if table.is_empty() {
        tracing::info!("card report: no operations");
        return Ok(Vec::new());
    }
    let [card_idx, amount_idx] = table.require([columns::CARD_NUMBER, columns::PAYMENT_AMOUNT])?;
    let cashback_idx = match policy {
        CashbackPolicy::Recorded => Some(table.require([columns::CASHBACK])?[0]),
        CashbackPolicy::OnePerHundred => None,
    };

    let mut groups: BTreeMap<String, CardTotals> = BTreeMap::new();
    for row in table.rows() {
        let Some(amount) = row[amount_idx].money(columns::PAYMENT_AMOUNT)? else {
            continue;
        };
        if amount >= Decimal::ZERO {
            continue;
        }
        let Some(card) = row[card_idx].as_text() else {
            continue;
        };
        let cashback = match cashback_idx {
            Some(idx) => row[idx].money(columns::CASHBACK)?.unwrap_or(Decimal::ZERO),
            None => Decimal::ZERO,
        };
        let totals = groups.entry(card).or_default();
        totals.spent += amount;
        totals.cashback += cashback;
    }

    let cards: Vec<CardSummary> = groups
        .into_iter()
        .map(|(card, totals)| {
            let total_spent = round_money(totals.spent).abs();
            let cashback = match policy {
                CashbackPolicy::Recorded => totals.cashback,
                CashbackPolicy::OnePerHundred => {
                    round_money(total_spent / Decimal::ONE_HUNDRED)
                }
            };
            CardSummary {
                last_digits: last_digits(&card),
                total_spent,
                cashback,
            }
        })
        .collect();
    tracing::info!(cards = cards.len(), ?policy, "card report built");
    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn fixture() -> OperationTable {
        let mut table = OperationTable::new([
            columns::CARD_NUMBER,
            columns::PAYMENT_AMOUNT,
            columns::CASHBACK,
        ]);
        table.push_row(vec![
            Cell::text("*1234"),
            Cell::Number(Decimal::new(-105, 1)),
            Cell::Number(Decimal::new(15, 1)),
        ]);
        table.push_row(vec![
            Cell::text("*4321"),
            Cell::Number(Decimal::new(1009, 1)),
            Cell::Empty,
        ]);
        table.push_row(vec![
            Cell::text("*1234"),
            Cell::Number(Decimal::new(-2055, 2)),
            Cell::Number(Decimal::new(25, 1)),
        ]);
        table
    }

    #[test]
    fn recorded_cashback_is_summed() {
        let cards = card_report(&fixture(), CashbackPolicy::Recorded).unwrap();
        assert_eq!(
            cards,
            vec![CardSummary {
                last_digits: "1234".to_string(),
                total_spent: Decimal::new(3105, 2),
                cashback: Decimal::new(40, 1),
            }]
        );
        let json = serde_json::to_string(&cards).unwrap();
        assert_eq!(
            json,
            r#"[{"last_digits":"1234","total_spent":31.05,"cashback":4.0}]"#
        );
    }

    #[test]
    fn computed_cashback_is_one_percent() {
        let cards = card_report(&fixture(), CashbackPolicy::OnePerHundred).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].total_spent, Decimal::new(3105, 2));
        assert_eq!(cards[0].cashback, Decimal::new(31, 2));
    }

    #[test]
    fn computed_cashback_does_not_need_cashback_column() {
        let mut table = OperationTable::new([columns::CARD_NUMBER, columns::PAYMENT_AMOUNT]);
        table.push_row(vec![Cell::text("*5814"), Cell::Number(Decimal::from(-1262))]);
        table.push_row(vec![Cell::text("*7512"), Cell::Number(Decimal::new(-794, 2))]);
        let cards = card_report(&table, CashbackPolicy::OnePerHundred).unwrap();
        assert_eq!(cards[0].last_digits, "5814");
        assert_eq!(cards[0].cashback, Decimal::new(1262, 2));
        assert_eq!(cards[1].last_digits, "7512");
        assert_eq!(cards[1].cashback, Decimal::new(8, 2));

        let err = card_report(&table, CashbackPolicy::Recorded).unwrap_err();
        assert!(matches!(err, ReportError::MissingColumns { columns: ref missing } if missing == &[columns::CASHBACK]));
    }

    #[test]
    fn empty_table_gives_empty_report() {
        let table = OperationTable::new([
            columns::CARD_NUMBER,
            columns::PAYMENT_AMOUNT,
            columns::CASHBACK,
        ]);
        assert!(card_report(&table, CashbackPolicy::Recorded).unwrap().is_empty());
        assert!(card_report(&OperationTable::default(), CashbackPolicy::OnePerHundred)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn missing_card_column_is_schema_error() {
        let mut table = OperationTable::new([columns::PAYMENT_AMOUNT]);
        table.push_row(vec![Cell::Number(Decimal::from(-10))]);
        let err = card_report(&table, CashbackPolicy::OnePerHundred).unwrap_err();
        assert!(matches!(err, ReportError::MissingColumns { columns: ref missing } if missing == &[columns::CARD_NUMBER]));
    }

    #[test]
    fn report_is_idempotent_on_expenses_only_input() {
        let mut expenses = fixture();
        expenses = expenses
            .retain_rows(|row| {
                Ok(row[1]
                    .money(columns::PAYMENT_AMOUNT)?
                    .is_some_and(|a| a < Decimal::ZERO))
            })
            .unwrap();
        assert_eq!(
            card_report(&expenses, CashbackPolicy::Recorded).unwrap(),
            card_report(&fixture(), CashbackPolicy::Recorded).unwrap()
        );
    }
}
