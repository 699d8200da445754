use thiserror::Error;

/// Результат для операций iqseg
pub type IqsegResult<T> = std::result::Result<T, IqsegError>;

/// Типы ошибок пайплайна нарезки блоков.
#[derive(Debug, Error)]
pub enum IqsegError {
    /// Некорректный размер выходного блока
    #[error("Invalid block size: {0}")]
    InvalidBlockSize(usize),

    /// История должна быть строго меньше размера блока
    #[error("Invalid history: {history} must be less than block size {size}")]
    InvalidHistory { history: usize, size: usize },

    /// Ошибки источника байт (передаются без изменений)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
