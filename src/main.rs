//! CLI: главная страница, кэшбэк по категориям и траты по категории.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use operations_report::{
    AlphaVantageClient, ApiLayerClient, Config, home_view, load_operations, spending_by_category,
    to_json_4space, top_categories,
};

#[derive(Parser)]
#[command(name = "operations-report", version, about = "Отчёты по банковским операциям")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Главная страница на дату `YYYY-MM-DD` или `YYYY-MM-DD HH:MM:SS`.
    Home {
        /// Дата отчёта.
        date: String,
        /// Выгрузка операций (.xlsx или .json).
        #[arg(long, default_value = "data/operations.xlsx")]
        operations: PathBuf,
        /// Пользовательские настройки (.json).
        #[arg(long, default_value = "user_settings.json")]
        settings: PathBuf,
    },
    /// Кэшбэк по первым трём категориям за месяц.
    Categories {
        /// Выгрузка операций (.xlsx или .json).
        #[arg(long, default_value = "data/operations.xlsx")]
        operations: PathBuf,
        /// Год.
        #[arg(long)]
        year: i32,
        /// Месяц (1–12).
        #[arg(long)]
        month: u32,
    },
    /// Траты по категории за 90 дней.
    Spending {
        /// Выгрузка операций (.xlsx или .json).
        #[arg(long, default_value = "data/operations.xlsx")]
        operations: PathBuf,
        /// Категория.
        #[arg(long)]
        category: String,
        /// Дата отчёта; по умолчанию текущая.
        #[arg(long)]
        date: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    operations_report::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Home {
            date,
            operations,
            settings,
        } => {
            let config = Config::from_env();
            let rates = ApiLayerClient::new(&config)?;
            let quotes = AlphaVantageClient::new(&config)?;
            println!(
                "{}",
                home_view(&date, &operations, &settings, &rates, &quotes)?
            );
        }
        Command::Categories {
            operations,
            year,
            month,
        } => {
            let table = load_operations(&operations)?;
            println!("{}", top_categories(&table, year, month)?.to_json()?);
        }
        Command::Spending {
            operations,
            category,
            date,
        } => {
            let table = load_operations(&operations)?;
            let spending = spending_by_category(&table, &category, date.as_deref())?;
            println!("{}", to_json_4space(&spending)?);
        }
    }
    Ok(())
}
