//! Доменные типы отчётов.

use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Денежное значение, используем `Decimal` для точных расчётов.
pub type Money = Decimal;

/// Расходы и кэшбэк по одной карте.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardSummary {
    /// Последние 4 символа номера карты.
    pub last_digits: String,
    /// Сумма расходов по модулю.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_spent: Money,
    /// Кэшбэк.
    #[serde(with = "rust_decimal::serde::float")]
    pub cashback: Money,
}

/// Кэшбэк по одной категории.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCashback {
    /// Название категории.
    pub category: String,
    /// Кэшбэк по категории.
    pub cashback: Money,
}

/// Лучшие категории месяца; сериализуется как объект `{категория: кэшбэк}`
/// с сохранением порядка.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopCategories {
    /// Категории в порядке группировки.
    pub entries: Vec<CategoryCashback>,
}

impl TopCategories {
    /// Нет ни одной категории.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Кэшбэк по названию категории.
    pub fn get(&self, category: &str) -> Option<Money> {
        self.entries
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.cashback)
    }

    /// JSON с отступом в два пробела, кириллица не экранируется.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Денежное значение, записываемое в JSON числом.
struct AsFloat(Money);

impl Serialize for AsFloat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl Serialize for TopCategories {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.category, &AsFloat(entry.cashback))?;
        }
        map.end()
    }
}

/// Операция из топа по сумме платежа.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionEntry {
    /// Дата платежа.
    pub date: Option<String>,
    /// Сумма платежа со знаком.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub amount: Option<Money>,
    /// Категория.
    pub category: Option<String>,
    /// Описание.
    pub description: Option<String>,
}

/// Курс валюты в рублях.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyRate {
    /// Код валюты.
    pub currency: String,
    /// Курс.
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Money,
}

/// Цена закрытия акции.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockPrice {
    /// Тикер.
    pub stock: String,
    /// Цена.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Money,
}

/// Данные главной страницы. Порядок полей задаёт порядок ключей в JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomeView {
    /// Приветствие.
    pub greeting: String,
    /// Сводка по картам.
    pub cards: Vec<CardSummary>,
    /// Топ-5 операций.
    pub top_transactions: Vec<TransactionEntry>,
    /// Курсы валют.
    pub currency_rates: Vec<CurrencyRate>,
    /// Цены акций.
    pub stock_prices: Vec<StockPrice>,
}

/// Пользовательские настройки: какие валюты и акции показывать.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSettings {
    /// Коды валют.
    pub user_currencies: Vec<String>,
    /// Тикеры акций.
    pub user_stocks: Vec<String>,
}
