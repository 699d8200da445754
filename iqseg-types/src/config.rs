use serde::{Deserialize, Serialize};

use crate::{IqsegError, IqsegResult, BYTES_PER_SAMPLE};

/// Размер блока по умолчанию (выборок).
pub const DEFAULT_BLOCK_SIZE: usize = 16_384;

/// История по умолчанию (выборок из конца предыдущего блока).
pub const DEFAULT_BLOCK_HISTORY: usize = 4_920;

/// Параметры нарезки потока на перекрывающиеся блоки.
///
/// Соответствует ключам `block.size` и `block.history` файла настроек.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    /// Длина выходного блока (выборок)
    pub size: usize,
    /// Сколько выборок из хвоста предыдущего блока повторяется в начале нового
    pub history: usize,
}

impl BlockConfig {
    pub fn new(
        size: usize,
        history: usize,
    ) -> IqsegResult<Self> {
        let cfg = Self { size, history };
        cfg.validate()?;

        Ok(cfg)
    }

    /// Проверяет `size >= 1` и `history < size`.
    pub fn validate(&self) -> IqsegResult<()> {
        if self.size == 0 {
            return Err(IqsegError::InvalidBlockSize(self.size));
        }

        if self.history >= self.size {
            return Err(IqsegError::InvalidHistory {
                history: self.history,
                size: self.size,
            });
        }

        Ok(())
    }

    /// Количество новых выборок на блок (`size - history`).
    pub fn new_samples(&self) -> usize {
        self.size.saturating_sub(self.history)
    }

    /// Размер сырого блока в байтах, запрашиваемого у источника.
    pub fn raw_block_bytes(&self) -> usize {
        self.new_samples() * BYTES_PER_SAMPLE
    }
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_BLOCK_SIZE,
            history: DEFAULT_BLOCK_HISTORY,
        }
    }
}
