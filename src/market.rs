//! Курсы валют и котировки акций из внешних API.
//!
//! Запросы выполняются последовательно, без повторов: первая же ошибка прерывает
//! построение отчёта.

use std::time::Duration;

use crate::config::Config;
use crate::error::ReportError;
use crate::types::{CurrencyRate, Money, StockPrice};
use crate::utils::{money_from_f64, parse_money, round_money};
use chrono::NaiveDate;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde_json::Value;

/// Валюта, в которую переводятся курсы.
pub const TARGET_CURRENCY: &str = "RUB";

const APILAYER: &str = "Exchange Rates Data API";
const ALPHAVANTAGE: &str = "Alpha Vantage";

/// Источник курсов валют в рублях.
pub trait CurrencyRates {
    /// Курс `currency` в рублях на дату `date`, округлённый до копеек.
    fn rate_in_rub(&self, date: NaiveDate, currency: &str) -> Result<Money, ReportError>;
}

/// Источник котировок акций.
pub trait StockQuotes {
    /// Цена закрытия последнего торгового дня, округлённая до центов.
    fn latest_close(&self, symbol: &str) -> Result<Money, ReportError>;
}

/// Курсы всех валют из списка. Пустой список не порождает запросов.
pub fn currency_rates_in_rub<P: CurrencyRates + ?Sized>(
    provider: &P,
    currencies: &[String],
    date: NaiveDate,
) -> Result<Vec<CurrencyRate>, ReportError> {
    if currencies.is_empty() {
        tracing::info!("no currencies configured");
        return Ok(Vec::new());
    }
    tracing::info!(?currencies, %date, "fetching currency rates");
    currencies
        .iter()
        .map(|currency| -> Result<CurrencyRate, ReportError> {
            Ok(CurrencyRate {
                currency: currency.clone(),
                rate: provider.rate_in_rub(date, currency)?,
            })
        })
        .collect()
}

/// Цены всех акций из списка. Пустой список не порождает запросов.
pub fn stock_prices<P: StockQuotes + ?Sized>(
    provider: &P,
    symbols: &[String],
) -> Result<Vec<StockPrice>, ReportError> {
    if symbols.is_empty() {
        tracing::info!("no stocks configured");
        return Ok(Vec::new());
    }
    tracing::info!(?symbols, "fetching stock prices");
    symbols
        .iter()
        .map(|symbol| -> Result<StockPrice, ReportError> {
            Ok(StockPrice {
                stock: symbol.clone(),
                price: provider.latest_close(symbol)?,
            })
        })
        .collect()
}

fn build_client(timeout: Duration, service: &'static str) -> Result<Client, ReportError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|source| ReportError::Http { service, source })
}

fn transport_error(service: &'static str, source: reqwest::Error) -> ReportError {
    if source.is_connect() {
        ReportError::Connection { service, source }
    } else {
        ReportError::Http { service, source }
    }
}

/// Читает тело ответа, проверив статус 200.
fn read_json(service: &'static str, response: Response) -> Result<Value, ReportError> {
    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().unwrap_or_default();
        tracing::error!(service, status = status.as_u16(), %body, "API error");
        return Err(ReportError::Api {
            service,
            status: status.as_u16(),
            body,
        });
    }
    response
        .json::<Value>()
        .map_err(|source| transport_error(service, source))
}

/// Число из JSON: допускаются как числа, так и строки.
fn json_money(value: &Value, field: &'static str) -> Option<Money> {
    match value {
        Value::Number(n) => n.as_f64().and_then(money_from_f64),
        Value::String(s) => parse_money(s, field).ok().flatten(),
        _ => None,
    }
}

fn unexpected(service: &'static str, detail: impl Into<String>) -> ReportError {
    let detail = detail.into();
    tracing::error!(service, %detail, "unexpected API response");
    ReportError::UnexpectedResponse { service, detail }
}

/// Разбирает ответ `GET /exchangerates_data/convert`: поле `result`.
pub fn parse_convert_response(body: &Value) -> Result<Money, ReportError> {
    body.get("result")
        .and_then(|v| json_money(v, "result"))
        .map(round_money)
        .ok_or_else(|| unexpected(APILAYER, "missing key 'result'"))
}

/// Разбирает ответ `TIME_SERIES_DAILY`: цена закрытия дня из `3. Last Refreshed`.
pub fn parse_daily_close(body: &Value) -> Result<Money, ReportError> {
    let series = body.get("Time Series (Daily)");
    if series.is_none() {
        if let Some(message) = body
            .get("Information")
            .or_else(|| body.get("Note"))
            .and_then(Value::as_str)
        {
            tracing::error!(%message, "Alpha Vantage rate limit");
            return Err(ReportError::RateLimited {
                service: ALPHAVANTAGE,
                message: message.to_string(),
            });
        }
    }
    let last_refreshed = body
        .get("Meta Data")
        .and_then(|meta| meta.get("3. Last Refreshed"))
        .and_then(Value::as_str)
        .ok_or_else(|| unexpected(ALPHAVANTAGE, "missing key '3. Last Refreshed'"))?;
    // Для дневного ряда ключ совпадает с датой, но иногда в нём бывает и время.
    let day = last_refreshed.split_whitespace().next().unwrap_or(last_refreshed);
    let bar = series
        .and_then(|s| s.get(day))
        .ok_or_else(|| unexpected(ALPHAVANTAGE, format!("missing key '{day}'")))?;
    bar.get("4. close")
        .and_then(|v| json_money(v, "4. close"))
        .map(round_money)
        .ok_or_else(|| unexpected(ALPHAVANTAGE, "missing key '4. close'"))
}

/// Клиент Exchange Rates Data API (apilayer.com).
#[derive(Debug, Clone)]
pub struct ApiLayerClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ApiLayerClient {
    /// Создаёт клиента из конфигурации.
    pub fn new(config: &Config) -> Result<Self, ReportError> {
        Ok(Self {
            http: build_client(config.http_timeout, APILAYER)?,
            base_url: config.apilayer_base_url.trim_end_matches('/').to_string(),
            api_key: config.apilayer_key.clone(),
        })
    }
}

impl CurrencyRates for ApiLayerClient {
    fn rate_in_rub(&self, date: NaiveDate, currency: &str) -> Result<Money, ReportError> {
        let url = format!("{}/exchangerates_data/convert", self.base_url);
        let date_param = date.format("%Y-%m-%d").to_string();
        tracing::info!(currency, date = %date_param, "GET exchangerates_data/convert");

        let mut request = self.http.get(&url).query(&[
            ("to", TARGET_CURRENCY),
            ("from", currency),
            ("amount", "1"),
            ("date", date_param.as_str()),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key);
        }
        let response = request
            .send()
            .map_err(|source| transport_error(APILAYER, source))?;
        let rate = parse_convert_response(&read_json(APILAYER, response)?)?;
        tracing::info!(currency, %rate, "currency rate received");
        Ok(rate)
    }
}

/// Клиент Alpha Vantage.
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AlphaVantageClient {
    /// Создаёт клиента из конфигурации.
    pub fn new(config: &Config) -> Result<Self, ReportError> {
        Ok(Self {
            http: build_client(config.http_timeout, ALPHAVANTAGE)?,
            base_url: config.alphavantage_base_url.trim_end_matches('/').to_string(),
            api_key: config.alphavantage_key.clone(),
        })
    }
}

impl StockQuotes for AlphaVantageClient {
    fn latest_close(&self, symbol: &str) -> Result<Money, ReportError> {
        let url = format!("{}/query", self.base_url);
        tracing::info!(symbol, "GET query?function=TIME_SERIES_DAILY");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_deref().unwrap_or_default()),
            ])
            .send()
            .map_err(|source| transport_error(ALPHAVANTAGE, source))?;
        let price = parse_daily_close(&read_json(ALPHAVANTAGE, response)?)?;
        tracing::info!(symbol, %price, "stock price received");
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::cell::RefCell;

    #[test]
    fn convert_result_is_rounded() {
        let body = json!({"success": true, "result": 89.3456});
        assert_eq!(parse_convert_response(&body).unwrap(), Decimal::new(8935, 2));
    }

    #[test]
    fn convert_without_result_is_error() {
        let body = json!({"success": false});
        assert!(matches!(
            parse_convert_response(&body),
            Err(ReportError::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn daily_close_of_last_refreshed_day() {
        let body = json!({
            "Meta Data": {"3. Last Refreshed": "2025-03-05"},
            "Time Series (Daily)": {
                "2025-03-05": {"4. close": "235.9300"},
                "2025-03-04": {"4. close": "230.0000"}
            }
        });
        assert_eq!(parse_daily_close(&body).unwrap(), Decimal::new(23593, 2));
    }

    #[test]
    fn daily_close_accepts_numbers() {
        let body = json!({
            "Meta Data": {"3. Last Refreshed": "2025-03-05"},
            "Time Series (Daily)": {"2025-03-05": {"4. close": 203.8}}
        });
        assert_eq!(parse_daily_close(&body).unwrap(), Decimal::new(2038, 1));
    }

    #[test]
    fn missing_close_names_the_key() {
        let body = json!({
            "Meta Data": {"3. Last Refreshed": "2025-03-05"},
            "Time Series (Daily)": {"2025-03-05": {}}
        });
        let err = parse_daily_close(&body).unwrap_err();
        assert!(err.to_string().contains("'4. close'"));
    }

    #[test]
    fn information_message_means_rate_limit() {
        let body = json!({"Information": "API rate limit is 25 requests per day"});
        let err = parse_daily_close(&body).unwrap_err();
        assert!(err.is_external());
        assert!(matches!(err, ReportError::RateLimited { ref message, .. }
            if message == "API rate limit is 25 requests per day"));
    }

    struct Recorder {
        calls: RefCell<Vec<String>>,
    }

    impl CurrencyRates for Recorder {
        fn rate_in_rub(&self, _date: NaiveDate, currency: &str) -> Result<Money, ReportError> {
            self.calls.borrow_mut().push(currency.to_string());
            match currency {
                "USD" => Ok(Decimal::new(893, 1)),
                "EUR" => Ok(Decimal::new(9393, 2)),
                _ => Err(ReportError::Api {
                    service: APILAYER,
                    status: 429,
                    body: "You have exceeded your daily rate limit".to_string(),
                }),
            }
        }
    }

    #[test]
    fn rates_are_fetched_in_order() {
        let recorder = Recorder {
            calls: RefCell::new(Vec::new()),
        };
        let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        let rates =
            currency_rates_in_rub(&recorder, &["USD".into(), "EUR".into()], date).unwrap();
        assert_eq!(rates[0].currency, "USD");
        assert_eq!(rates[1].rate, Decimal::new(9393, 2));
        assert_eq!(*recorder.calls.borrow(), vec!["USD", "EUR"]);
    }

    #[test]
    fn first_failure_aborts() {
        let recorder = Recorder {
            calls: RefCell::new(Vec::new()),
        };
        let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        let err = currency_rates_in_rub(
            &recorder,
            &["CNY".into(), "USD".into()],
            date,
        )
        .unwrap_err();
        assert!(err.to_string().contains("429 - You have"));
        assert_eq!(recorder.calls.borrow().len(), 1);
    }

    #[test]
    fn empty_lists_make_no_calls() {
        let recorder = Recorder {
            calls: RefCell::new(Vec::new()),
        };
        let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        assert!(currency_rates_in_rub(&recorder, &[], date).unwrap().is_empty());
        assert!(recorder.calls.borrow().is_empty());
    }
}
