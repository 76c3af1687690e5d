//! Таблица операций: столбцы выгрузки и значения ячеек.

use crate::error::ReportError;
use crate::types::Money;
use crate::utils::{parse_money, parse_operation_datetime};
use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Имена столбцов выгрузки банковских операций.
pub mod columns {
    /// Дата и время операции.
    pub const OPERATION_DATE: &str = "Дата операции";
    /// Дата списания.
    pub const PAYMENT_DATE: &str = "Дата платежа";
    /// Маскированный номер карты.
    pub const CARD_NUMBER: &str = "Номер карты";
    /// Статус операции.
    pub const STATUS: &str = "Статус";
    /// Сумма платежа со знаком.
    pub const PAYMENT_AMOUNT: &str = "Сумма платежа";
    /// Начисленный кэшбэк.
    pub const CASHBACK: &str = "Кэшбэк";
    /// Категория.
    pub const CATEGORY: &str = "Категория";
    /// Описание операции.
    pub const DESCRIPTION: &str = "Описание";
}

/// Статус успешно проведённой операции.
pub const STATUS_OK: &str = "OK";

/// Значение ячейки таблицы операций.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cell {
    /// Пустая ячейка.
    #[default]
    Empty,
    /// Текст.
    Text(String),
    /// Число.
    Number(Money),
    /// Дата и время, уже приведённые к типу.
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Создаёт текстовую ячейку, пустая строка становится `Empty`.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    /// Пустая ли ячейка.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Текстовое значение ячейки, если оно есть.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(n.normalize().to_string()),
            Self::DateTime(dt) => Some(dt.format("%d.%m.%Y %H:%M:%S").to_string()),
        }
    }

    /// Совпадает ли текст ячейки с `expected`.
    pub fn text_eq(&self, expected: &str) -> bool {
        matches!(self, Self::Text(s) if s == expected)
    }

    /// Денежное значение ячейки; `None` для пустой ячейки.
    pub fn money(&self, column: &'static str) -> Result<Option<Money>, ReportError> {
        match self {
            Self::Empty => Ok(None),
            Self::Number(n) => Ok(Some(*n)),
            Self::Text(s) => parse_money(s, column),
            Self::DateTime(dt) => Err(ReportError::Number {
                value: dt.to_string(),
                column,
            }),
        }
    }

    /// Дата и время ячейки; `None` для пустой ячейки.
    pub fn datetime(&self, column: &'static str) -> Result<Option<NaiveDateTime>, ReportError> {
        match self {
            Self::Empty => Ok(None),
            Self::DateTime(dt) => Ok(Some(*dt)),
            Self::Text(s) => parse_operation_datetime(s, column).map(Some),
            Self::Number(n) => Err(ReportError::Date {
                value: n.to_string(),
                column,
            }),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.serialize_none(),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) => match n.to_f64() {
                Some(f) => serializer.serialize_f64(f),
                None => serializer.serialize_str(&n.to_string()),
            },
            Self::DateTime(dt) => {
                serializer.serialize_str(&dt.format("%d.%m.%Y %H:%M:%S").to_string())
            }
        }
    }
}

/// Упорядоченный набор операций с именованными столбцами.
///
/// Строки хранятся в порядке исходного файла, каждая строка выровнена по `columns`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl OperationTable {
    /// Создаёт пустую таблицу с заданными столбцами.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Добавляет строку, дополняя недостающие ячейки пустыми значениями.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    /// Добавляет строку, заданную парами (столбец, значение).
    /// Неизвестные столбцы добавляются в конец таблицы.
    pub fn push_record<I, S>(&mut self, record: I)
    where
        I: IntoIterator<Item = (S, Cell)>,
        S: AsRef<str>,
    {
        let mut row = vec![Cell::Empty; self.columns.len()];
        for (name, cell) in record {
            let idx = if let Some(idx) = self.column_index(name.as_ref()) {
                idx
            } else {
                self.columns.push(name.as_ref().to_string());
                for existing in &mut self.rows {
                    existing.push(Cell::Empty);
                }
                row.push(Cell::Empty);
                self.columns.len() - 1
            };
            row[idx] = cell;
        }
        self.rows.push(row);
    }

    /// Имена столбцов.
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Строки таблицы.
    #[inline]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Количество строк.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Нет ли в таблице строк.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Индекс столбца по имени.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Возвращает индексы обязательных столбцов или перечисляет все отсутствующие.
    pub fn require<const N: usize>(
        &self,
        names: [&'static str; N],
    ) -> Result<[usize; N], ReportError> {
        let mut indices = [0; N];
        let mut missing = Vec::new();
        for (slot, name) in indices.iter_mut().zip(names) {
            match self.column_index(name) {
                Some(idx) => *slot = idx,
                None => missing.push(name),
            }
        }
        if missing.is_empty() {
            Ok(indices)
        } else {
            Err(ReportError::MissingColumns { columns: missing })
        }
    }

    /// Новая таблица с теми же столбцами и строками, для которых `keep` вернул `true`.
    pub fn retain_rows<F>(&self, mut keep: F) -> Result<Self, ReportError>
    where
        F: FnMut(&[Cell]) -> Result<bool, ReportError>,
    {
        let mut rows = Vec::new();
        for row in &self.rows {
            if keep(row)? {
                rows.push(row.clone());
            }
        }
        Ok(Self {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Приводит текстовые даты столбца к типу даты на месте.
    ///
    /// Повторный вызов ничего не меняет: уже приведённые ячейки остаются как есть.
    /// При ошибке таблица не изменяется.
    pub fn coerce_datetime(&mut self, column: &'static str) -> Result<(), ReportError> {
        let [idx] = self.require([column])?;
        let mut parsed = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            parsed.push(row[idx].datetime(column)?);
        }
        for (row, value) in self.rows.iter_mut().zip(parsed) {
            if let Some(dt) = value {
                row[idx] = Cell::DateTime(dt);
            }
        }
        Ok(())
    }
}

/// Строка таблицы, сериализуемая как объект с именами столбцов.
struct RowRef<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl Serialize for RowRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}

impl Serialize for OperationTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for cells in &self.rows {
            seq.serialize_element(&RowRef {
                columns: &self.columns,
                cells,
            })?;
        }
        seq.end()
    }
}
