//! Ошибки загрузки операций, построения отчётов и обращения к внешним API.

use std::path::PathBuf;

use chrono::NaiveDateTime;

/// Ошибка загрузки данных, построения отчёта или запроса к внешнему сервису.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// Ошибка ввода-вывода при чтении исходного файла.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Ошибка разбора JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Исходный файл не найден.
    #[error("File '{}' not found", path.display())]
    FileNotFound {
        /// Путь к файлу.
        path: PathBuf,
    },
    /// Расширение файла не поддерживается загрузчиком.
    #[error("Unsupported source file '{}'", path.display())]
    UnsupportedSource {
        /// Путь к файлу.
        path: PathBuf,
    },
    /// Файл прочитан, но его содержимое не похоже на таблицу операций.
    #[error("Invalid source '{}': {reason}", path.display())]
    InvalidSource {
        /// Путь к файлу.
        path: PathBuf,
        /// Причина.
        reason: String,
    },
    /// Ошибка чтения электронной таблицы.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),
    /// В таблице операций отсутствуют обязательные столбцы.
    #[error("Missing required columns: {}", columns.join(", "))]
    MissingColumns {
        /// Имена отсутствующих столбцов.
        columns: Vec<&'static str>,
    },
    /// Ошибка разбора даты в ячейке.
    #[error("Invalid date '{value}' in column '{column}'")]
    Date {
        /// Некорректное исходное значение.
        value: String,
        /// Название столбца.
        column: &'static str,
    },
    /// Ошибка разбора числового значения.
    #[error("Invalid number '{value}' in column '{column}'")]
    Number {
        /// Некорректное исходное значение.
        value: String,
        /// Название столбца.
        column: &'static str,
    },
    /// Дата, переданная пользователем, не соответствует поддерживаемым форматам.
    #[error("Date format not supported: '{value}'")]
    UnsupportedDateFormat {
        /// Исходная строка.
        value: String,
    },
    /// Несуществующий месяц.
    #[error("Invalid period {year}-{month:02}")]
    InvalidPeriod {
        /// Год.
        year: i32,
        /// Месяц.
        month: u32,
    },
    /// Начало окна отчёта выходит за пределы представимых дат.
    #[error("Report window of {days} days before {reference} is out of range")]
    WindowOutOfRange {
        /// Дата отчёта.
        reference: NaiveDateTime,
        /// Длина окна в днях.
        days: i64,
    },
    /// Внешний сервис ответил статусом, отличным от 200.
    #[error("{service} API error: {status} - {body}")]
    Api {
        /// Название сервиса.
        service: &'static str,
        /// HTTP-статус.
        status: u16,
        /// Тело ответа.
        body: String,
    },
    /// Не удалось установить соединение с внешним сервисом.
    #[error("{service}: connection error, please check your network connection")]
    Connection {
        /// Название сервиса.
        service: &'static str,
        /// Исходная ошибка.
        #[source]
        source: reqwest::Error,
    },
    /// Прочие ошибки HTTP-клиента.
    #[error("{service}: HTTP error: {source}")]
    Http {
        /// Название сервиса.
        service: &'static str,
        /// Исходная ошибка.
        #[source]
        source: reqwest::Error,
    },
    /// Сервис сообщил о превышении лимита запросов.
    #[error("{service} rate limit: {message}")]
    RateLimited {
        /// Название сервиса.
        service: &'static str,
        /// Сообщение сервиса.
        message: String,
    },
    /// Ответ сервиса не содержит ожидаемых данных.
    #[error("{service}: unexpected response, {detail}")]
    UnexpectedResponse {
        /// Название сервиса.
        service: &'static str,
        /// Что именно не найдено.
        detail: String,
    },
}

impl ReportError {
    /// Ошибка относится к внешнему сервису (курсы валют, котировки).
    pub const fn is_external(&self) -> bool {
        matches!(
            self,
            Self::Api { .. }
                | Self::Connection { .. }
                | Self::Http { .. }
                | Self::RateLimited { .. }
                | Self::UnexpectedResponse { .. }
        )
    }
}
