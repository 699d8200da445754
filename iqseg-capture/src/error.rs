use thiserror::Error;

pub type CaptureResult<T> = std::result::Result<T, CaptureError>;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// Источник данных не найден / не открывается
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    /// Ошибка пайплайна нарезки блоков
    #[error("Block pipeline error: {0}")]
    Pipeline(#[from] iqseg_types::IqsegError),

    /// Ошибка ввода/вывода
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Некорректный файл настроек
    #[error("Config file error: {0}")]
    ConfigFile(#[from] serde_json::Error),

    /// Некорректная конфигурация
    #[error("Config error: {0}")]
    Config(String),
}
