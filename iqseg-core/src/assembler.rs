use std::io::{self, Read};

use iqseg_types::BYTES_PER_SAMPLE;
use log::debug;

use crate::ChunkReader;

/// Собирает чанки источника в блоки размером не меньше `block_size` байт.
///
/// Размер запроса к [`ChunkReader`] фиксирован и равен `block_size` на всё
/// время жизни сборщика, он не уменьшается до недостающего остатка. Поэтому
/// при коротких чтениях накопитель может "перескочить" `block_size`, и тогда
/// блок выдаётся целиком, длиннее `block_size`.
///
/// Длина выдаваемого блока всегда кратна [`BYTES_PER_SAMPLE`]: если чтения
/// нечётной длины оставили непарный байт I, он переносится в начало
/// следующего блока, и пары I/Q не сдвигаются.
///
/// Неполный хвост в конце потока отбрасывается без ошибки. Его размер доступен
/// через [`BlockAssembler::dropped_bytes`].
pub struct BlockAssembler<R: Read> {
    chunks: ChunkReader<R>,
    block_size: usize,
    acc: Vec<u8>,
    dropped_bytes: usize,
}

impl<R: Read> BlockAssembler<R> {
    pub fn new(
        source: R,
        block_size: usize,
    ) -> Self {
        Self {
            chunks: ChunkReader::new(source, block_size),
            block_size,
            acc: Vec::with_capacity(block_size),
            dropped_bytes: 0,
        }
    }

    /// Целевой размер блока (байт).
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Сколько байт отброшено в конце потока (0, пока поток не закончился).
    pub fn dropped_bytes(&self) -> usize {
        self.dropped_bytes
    }

    /// Забирает накопленные целые выборки. Непарный остаток остаётся в
    /// накопителе.
    fn take_block(&mut self) -> Vec<u8> {
        let whole = self.acc.len() - self.acc.len() % BYTES_PER_SAMPLE;
        let mut next = Vec::with_capacity(self.block_size);
        next.extend_from_slice(&self.acc[whole..]);
        self.acc.truncate(whole);

        std::mem::replace(&mut self.acc, next)
    }
}

impl<R: Read> Iterator for BlockAssembler<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.chunks.next() {
                Some(Ok(chunk)) => {
                    self.acc.extend_from_slice(&chunk);

                    if self.acc.len() >= self.block_size {
                        return Some(Ok(self.take_block()));
                    }
                }
                Some(Err(e)) => return Some(Err(e)),
                None => {
                    if !self.acc.is_empty() {
                        self.dropped_bytes = self.acc.len();
                        debug!(
                            "End of stream: dropping {} of {} bytes of partial block",
                            self.dropped_bytes, self.block_size
                        );
                        self.acc.clear();
                    }

                    return None;
                }
            }
        }
    }
}
