#![warn(missing_docs)]
//! Библиотека для построения аналитических отчётов по выгрузке банковских операций:
//! траты и кэшбэк по категориям и картам, топ операций, курсы валют и акций.

mod cards;
mod categories;
mod config;
mod error;
mod filters;
mod loader;
mod market;
mod ranking;
mod reports;
mod table;
mod types;
mod utils;
mod views;
mod window;

use std::sync::Once;

pub use crate::cards::{CashbackPolicy, card_report};
pub use crate::categories::{CATEGORY_CASHBACK_RATE, TOP_CATEGORIES, top_categories};
pub use crate::config::Config;
pub use crate::error::ReportError;
pub use crate::filters::filter_by_month_to_date;
pub use crate::loader::{
    load_operations, load_operations_from_excel, load_operations_from_json, load_user_settings,
};
pub use crate::market::{
    AlphaVantageClient, ApiLayerClient, CurrencyRates, StockQuotes, TARGET_CURRENCY,
    currency_rates_in_rub, parse_convert_response, parse_daily_close, stock_prices,
};
pub use crate::ranking::{TOP_TRANSACTIONS, top_transactions};
pub use crate::reports::{spending_by_category, spending_by_category_at};
pub use crate::table::{Cell, OperationTable, STATUS_OK, columns};
pub use crate::types::*;
pub use crate::utils::{greeting, parse_reference_date, to_json_4space};
pub use crate::views::{HomeViewBuilder, home_view};
pub use crate::window::{ReportWindow, SPENDING_LOOKBACK_DAYS};

static INIT_TRACING: Once = Once::new();

/// Включает журналирование через `tracing` (фильтр из `RUST_LOG`,
/// по умолчанию `operations_report=info`). Повторные вызовы ничего не делают.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("operations_report=info"));
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        tracing::debug!("tracing initialized");
    });
}
