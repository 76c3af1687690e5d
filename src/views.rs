//! Главная страница: приветствие, карты, топ операций, курсы валют и акций.

use std::path::Path;

use crate::cards::{CashbackPolicy, card_report};
use crate::error::ReportError;
use crate::filters::filter_by_month_to_date;
use crate::loader::{load_operations, load_user_settings};
use crate::market::{CurrencyRates, StockQuotes, currency_rates_in_rub, stock_prices};
use crate::ranking::top_transactions;
use crate::table::{OperationTable, columns};
use crate::types::{HomeView, UserSettings};
use crate::utils::{greeting, parse_reference_date, to_json_4space};
use chrono::NaiveDateTime;

impl HomeView {
    /// JSON с отступом в четыре пробела, кириллица не экранируется.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        to_json_4space(self)
    }
}

/// Builder главной страницы.
///
/// # Пример
///
/// ```no_run
/// # use operations_report::{AlphaVantageClient, ApiLayerClient, Config, HomeViewBuilder, OperationTable};
/// # fn run(operations: &OperationTable) -> Result<(), operations_report::ReportError> {
/// let config = Config::from_env();
/// let rates = ApiLayerClient::new(&config)?;
/// let quotes = AlphaVantageClient::new(&config)?;
/// let reference = operations_report::parse_reference_date("2021-12-20 20:17:35")?;
/// let view = HomeViewBuilder::new(operations, &rates, &quotes).build(reference)?;
/// println!("{}", view.to_json()?);
/// # Ok(())
/// # }
/// ```
pub struct HomeViewBuilder<'a> {
    operations: &'a OperationTable,
    rates: &'a dyn CurrencyRates,
    quotes: &'a dyn StockQuotes,
    settings: UserSettings,
    policy: CashbackPolicy,
}

impl<'a> HomeViewBuilder<'a> {
    /// Создаёт builder для таблицы операций и внешних источников данных.
    #[inline]
    pub fn new(
        operations: &'a OperationTable,
        rates: &'a dyn CurrencyRates,
        quotes: &'a dyn StockQuotes,
    ) -> Self {
        Self {
            operations,
            rates,
            quotes,
            settings: UserSettings::default(),
            policy: CashbackPolicy::Recorded,
        }
    }

    /// Валюты и акции пользователя.
    #[inline]
    pub fn settings(mut self, settings: UserSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Способ расчёта кэшбэка по картам (по умолчанию из столбца «Кэшбэк»).
    #[inline]
    pub const fn cashback_policy(mut self, policy: CashbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Строит страницу на момент `reference`.
    ///
    /// Сначала считаются отчёты по операциям, затем запрашиваются курсы и котировки.
    /// Ошибка любого внешнего запроса прерывает построение целиком.
    pub fn build(self, reference: NaiveDateTime) -> Result<HomeView, ReportError> {
        tracing::info!(%reference, "building home view");
        let greeting = greeting(reference).to_string();

        let filtered = filter_by_month_to_date(self.operations, reference)?;
        let cards = card_report(&filtered, self.policy)?;
        let top_transactions = top_transactions(&filtered)?;

        let currency_rates =
            currency_rates_in_rub(self.rates, &self.settings.user_currencies, reference.date())?;
        let stock_prices = stock_prices(self.quotes, &self.settings.user_stocks)?;

        tracing::info!(
            cards = cards.len(),
            top = top_transactions.len(),
            rates = currency_rates.len(),
            stocks = stock_prices.len(),
            "home view built"
        );
        Ok(HomeView {
            greeting,
            cards,
            top_transactions,
            currency_rates,
            stock_prices,
        })
    }
}

/// Главная страница по строке даты и путям к операциям и настройкам, в виде JSON.
pub fn home_view<P, Q>(
    reference: &str,
    operations_path: P,
    settings_path: Q,
    rates: &dyn CurrencyRates,
    quotes: &dyn StockQuotes,
) -> Result<String, ReportError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let reference = parse_reference_date(reference)?;
    let mut operations = load_operations(operations_path)?;
    if !operations.is_empty() && operations.column_index(columns::OPERATION_DATE).is_some() {
        operations.coerce_datetime(columns::OPERATION_DATE)?;
    }
    let settings = UserSettings::from_entries(&load_user_settings(settings_path));

    let view = HomeViewBuilder::new(&operations, rates, quotes)
        .settings(settings)
        .build(reference)?;
    Ok(view.to_json()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use crate::types::Money;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    struct FixedRates;

    impl CurrencyRates for FixedRates {
        fn rate_in_rub(&self, _date: NaiveDate, currency: &str) -> Result<Money, ReportError> {
            Ok(if currency == "USD" {
                Decimal::new(7350, 2)
            } else {
                Decimal::new(8701, 2)
            })
        }
    }

    struct FailingQuotes;

    impl StockQuotes for FailingQuotes {
        fn latest_close(&self, _symbol: &str) -> Result<Money, ReportError> {
            Err(ReportError::RateLimited {
                service: "Alpha Vantage",
                message: "API rate limit is 25 requests per day".to_string(),
            })
        }
    }

    struct FixedQuotes;

    impl StockQuotes for FixedQuotes {
        fn latest_close(&self, _symbol: &str) -> Result<Money, ReportError> {
            Ok(Decimal::new(23593, 2))
        }
    }

    fn operations() -> OperationTable {
        let mut table = OperationTable::new([
            columns::OPERATION_DATE,
            columns::PAYMENT_DATE,
            columns::CARD_NUMBER,
            columns::STATUS,
            columns::PAYMENT_AMOUNT,
            columns::CASHBACK,
            columns::CATEGORY,
            columns::DESCRIPTION,
        ]);
        table.push_row(vec![
            Cell::text("20.12.2020 10:00:00"),
            Cell::text("20.12.2020"),
            Cell::text("*5814"),
            Cell::text("OK"),
            Cell::Number(Decimal::from(-1262)),
            Cell::Number(Decimal::from(12)),
            Cell::text("Супермаркеты"),
            Cell::text("Магнит"),
        ]);
        table.push_row(vec![
            Cell::text("20.11.2020 10:00:00"),
            Cell::text("20.11.2020"),
            Cell::text("*5814"),
            Cell::text("OK"),
            Cell::Number(Decimal::from(-999)),
            Cell::Empty,
            Cell::text("Супермаркеты"),
            Cell::text("Пятёрочка"),
        ]);
        table
    }

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 12, 20)
            .unwrap()
            .and_hms_opt(20, 17, 35)
            .unwrap()
    }

    #[test]
    fn composes_all_sections_in_order() {
        let settings = UserSettings {
            user_currencies: vec!["USD".into(), "EUR".into()],
            user_stocks: vec!["AAPL".into()],
        };
        let table = operations();
        let view = HomeViewBuilder::new(&table, &FixedRates, &FixedQuotes)
            .settings(settings)
            .build(reference())
            .unwrap();
        assert_eq!(view.greeting, "Добрый вечер");
        assert_eq!(view.cards.len(), 1);
        assert_eq!(view.cards[0].total_spent, Decimal::from(1262));
        assert_eq!(view.cards[0].cashback, Decimal::from(12));
        assert_eq!(view.top_transactions.len(), 1);
        assert_eq!(view.currency_rates[1].rate, Decimal::new(8701, 2));

        let json = view.to_json().unwrap();
        let keys = ["greeting", "cards", "top_transactions", "currency_rates", "stock_prices"];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(json.contains("\n    \"greeting\": \"Добрый вечер\""));
    }

    #[test]
    fn computed_cashback_policy() {
        let table = operations();
        let view = HomeViewBuilder::new(&table, &FixedRates, &FixedQuotes)
            .cashback_policy(CashbackPolicy::OnePerHundred)
            .build(reference())
            .unwrap();
        assert_eq!(view.cards[0].cashback, Decimal::new(1262, 2));
        assert!(view.currency_rates.is_empty());
        assert!(view.stock_prices.is_empty());
    }

    #[test]
    fn external_failure_aborts_composition() {
        let settings = UserSettings {
            user_currencies: Vec::new(),
            user_stocks: vec!["AAPL".into()],
        };
        let table = operations();
        let err = HomeViewBuilder::new(&table, &FixedRates, &FailingQuotes)
            .settings(settings)
            .build(reference())
            .unwrap_err();
        assert!(err.is_external());
    }
}
