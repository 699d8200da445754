use std::{
    io::Read,
    time::{SystemTime, UNIX_EPOCH},
};

use iqseg_types::{BlockConfig, IqsegResult, Sample, SampleBlock, BYTES_PER_SAMPLE};
use log::trace;

use crate::{BlockAssembler, IqCodec};

/// Читает из потока RTL-SDR блоки фиксированной длины с перекрытием.
///
/// Каждый блок содержит `size` выборок: последние `history` выборок
/// предыдущего блока (нули для первого) и `size - history` новых. Блок
/// сопровождается временем выдачи и порядковым номером с нуля.
///
/// Итератор ленивый: следующий сырой блок читается только по запросу
/// потребителя. Чтобы остановиться, достаточно перестать вызывать `next()`.
/// Источник не закрывается, он остаётся за вызывающим.
pub struct OverlappingBlockReader<R: Read> {
    blocks: BlockAssembler<R>,
    codec: IqCodec,
    size: usize,
    history: usize,
    /// Хвост предыдущего блока длиной `history`
    tail: Vec<Sample>,
    block_idx: u64,
}

impl<R: Read> OverlappingBlockReader<R> {
    /// Создаёт читатель. Требует `size >= 1` и `history < size`.
    pub fn new(
        source: R,
        size: usize,
        history: usize,
    ) -> IqsegResult<Self> {
        Self::from_config(source, BlockConfig::new(size, history)?)
    }

    pub fn from_config(
        source: R,
        config: BlockConfig,
    ) -> IqsegResult<Self> {
        config.validate()?;

        Ok(Self {
            blocks: BlockAssembler::new(source, config.raw_block_bytes()),
            codec: IqCodec::default(),
            size: config.size,
            history: config.history,
            tail: vec![Sample::new(0.0, 0.0); config.history],
            block_idx: 0,
        })
    }

    /// Заменяет параметры квантования (по умолчанию RTL-SDR).
    pub fn with_codec(
        mut self,
        codec: IqCodec,
    ) -> Self {
        self.codec = codec;
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn history(&self) -> usize {
        self.history
    }

    /// Новых выборок на блок.
    pub fn new_samples(&self) -> usize {
        self.size - self.history
    }

    /// Сколько блоков уже выдано.
    pub fn blocks_emitted(&self) -> u64 {
        self.block_idx
    }

    /// Байт неполного последнего блока, отброшенных в конце потока.
    pub fn dropped_bytes(&self) -> usize {
        self.blocks.dropped_bytes()
    }
}

impl<R: Read> Iterator for OverlappingBlockReader<R> {
    type Item = IqsegResult<SampleBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = match self.blocks.next()? {
            Ok(raw) => raw,
            Err(e) => return Some(Err(e.into())),
        };

        let mut data = Vec::with_capacity(self.history + raw.len() / BYTES_PER_SAMPLE);
        data.extend_from_slice(&self.tail);
        self.codec.decode_into(&raw, &mut data);

        let timestamp = unix_time_secs();
        let block_idx = self.block_idx;
        self.block_idx += 1;

        // Под перескоком сборщика блок бывает длиннее `size`,
        // хвост всегда берётся с конца фактических данных
        let tail_start = data.len() - self.history;
        self.tail.clear();
        self.tail.extend_from_slice(&data[tail_start..]);

        trace!("Block #{block_idx}: {} samples at {timestamp:.6}", data.len());

        Some(Ok(SampleBlock::new(timestamp, block_idx, data)))
    }
}

/// Создаёт [`OverlappingBlockReader`] с кодеком RTL-SDR.
pub fn block_reader<R: Read>(
    source: R,
    size: usize,
    history: usize,
) -> IqsegResult<OverlappingBlockReader<R>> {
    OverlappingBlockReader::new(source, size, history)
}

fn unix_time_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use std::io;

    use iqseg_types::IqsegError;

    use super::*;
    use crate::{chunk::tests::ShortReads, raw_to_complex};

    fn collect<R: Read>(reader: OverlappingBlockReader<R>) -> Vec<SampleBlock> {
        reader.collect::<IqsegResult<_>>().unwrap()
    }

    #[test]
    fn test_rejects_invalid_history() {
        assert!(matches!(
            block_reader(io::empty(), 4, 4),
            Err(IqsegError::InvalidHistory { history: 4, size: 4 })
        ));
        assert!(matches!(
            block_reader(io::empty(), 0, 0),
            Err(IqsegError::InvalidBlockSize(0))
        ));
    }

    #[test]
    fn test_first_block_starts_with_zeros() {
        let raw: Vec<u8> = (0..16).collect();
        let blocks = collect(block_reader(&raw[..], 6, 2).unwrap());

        // new = 4 выборки = 8 байт на блок
        assert_eq!(blocks.len(), 2);
        assert_eq!(&blocks[0].data[..2], &[Sample::new(0.0, 0.0); 2]);
        assert_eq!(&blocks[0].data[2..], raw_to_complex(&raw[..8]).as_slice());
    }

    #[test]
    fn test_history_overlap() {
        let raw: Vec<u8> = (0..200u32).map(|i| (i * 37 % 256) as u8).collect();
        let (size, history) = (10, 3);
        let blocks = collect(block_reader(&raw[..], size, history).unwrap());

        assert_eq!(blocks.len(), 200 / ((size - history) * 2));

        for w in blocks.windows(2) {
            assert_eq!(w[1].data.len(), size);
            assert_eq!(&w[1].data[..history], &w[0].data[size - history..]);
        }
    }

    #[test]
    fn test_zero_history_has_no_tail() {
        let raw = [127u8, 127, 1, 253, 127, 127, 1, 253];
        let blocks = collect(block_reader(&raw[..], 2, 0).unwrap());

        assert_eq!(blocks.len(), 2);
        for b in &blocks {
            assert_eq!(b.data.len(), 2);
            assert_eq!(b.data, raw_to_complex(&raw[..4]));
        }
    }

    #[test]
    fn test_indices_and_timestamps() {
        let raw = vec![100u8; 64];
        let blocks = collect(block_reader(&raw[..], 4, 1).unwrap());

        let indices: Vec<u64> = blocks.iter().map(|b| b.block_idx).collect();
        assert_eq!(indices, (0..blocks.len() as u64).collect::<Vec<_>>());

        for w in blocks.windows(2) {
            assert!(w[1].timestamp >= w[0].timestamp);
        }
        assert!(blocks[0].timestamp > 0.0);
    }

    #[test]
    fn test_overshoot_block_is_longer() {
        // new = 4 выборки → запрос 8 байт; источник отдаёт по 6 байт
        let raw: Vec<u8> = (0..24).collect();
        let src = ShortReads {
            data: &raw,
            max_read: 6,
        };
        let blocks = collect(block_reader(src, 5, 1).unwrap());

        assert_eq!(blocks.len(), 2);
        // 1 выборка истории + 12 байт / 2
        assert_eq!(blocks[0].data.len(), 7);
        assert_eq!(blocks[1].data.len(), 7);
        assert_eq!(blocks[1].data[0], blocks[0].data[6]);
    }

    #[test]
    fn test_odd_short_reads_keep_iq_order() {
        // 60 выборок (I=10, Q=240), чтения по 3 байта против запроса 8
        let raw: Vec<u8> = [10u8, 240].repeat(60);
        let src = ShortReads {
            data: &raw,
            max_read: 3,
        };
        let mut reader = block_reader(src, 4, 0).unwrap();
        let blocks: Vec<SampleBlock> = reader.by_ref().collect::<IqsegResult<_>>().unwrap();
        let expected = raw_to_complex(&[10, 240])[0];

        let samples_out: usize = blocks.iter().map(|b| b.len()).sum();
        assert_eq!(samples_out, 58);
        assert_eq!(reader.dropped_bytes(), 4);
        assert!(blocks.iter().flat_map(|b| &b.data).all(|s| *s == expected));
    }

    #[test]
    fn test_dropped_tail_reported() {
        let raw = vec![0u8; 11];
        let mut reader = block_reader(&raw[..], 2, 0).unwrap();

        assert_eq!(reader.by_ref().count(), 2);
        assert_eq!(reader.dropped_bytes(), 3);
        assert_eq!(reader.blocks_emitted(), 2);
    }

    #[test]
    fn test_custom_codec_applied() {
        let raw = [255u8, 1];
        let mut reader = block_reader(&raw[..], 1, 0)
            .unwrap()
            .with_codec(IqCodec::new(128.0, 127.0));

        let block = reader.next().unwrap().unwrap();
        assert_eq!(block.data, vec![Sample::new(1.0, -1.0)]);
    }
}
