use num_complex::Complex32;

/// Комплексная выборка одинарной точности.
pub type Sample = Complex32;

/// Постоянная составляющая 8-битного АЦП RTL-SDR (номинальный "ноль").
pub const RTL_SDR_DC_OFFSET: f32 = 127.4;

/// Масштаб, приводящий 8-битный отсчёт к единичной амплитуде.
pub const RTL_SDR_SCALE: f32 = 128.0;

/// Байт на одну I/Q пару (по одному байту на I и Q).
pub const BYTES_PER_SAMPLE: usize = 2;

/// Выходной блок: хвост истории + новые выборки.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBlock {
    /// Время выдачи блока, секунды с UNIX epoch (не время захвата)
    pub timestamp: f64,
    /// Порядковый номер блока, начиная с нуля
    pub block_idx: u64,
    /// Выборки блока
    pub data: Vec<Sample>,
}

impl SampleBlock {
    pub fn new(
        timestamp: f64,
        block_idx: u64,
        data: Vec<Sample>,
    ) -> Self {
        Self {
            timestamp,
            block_idx,
            data,
        }
    }

    /// Количество выборок в блоке.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Средняя мощность блока (|x|^2), 0.0 для пустого блока.
    pub fn mean_power(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }

        self.data.iter().map(|s| s.norm_sqr()).sum::<f32>() / self.data.len() as f32
    }

    /// Разбирает блок в кортеж `(timestamp, block_idx, data)`.
    pub fn into_parts(self) -> (f64, u64, Vec<Sample>) {
        (self.timestamp, self.block_idx, self.data)
    }
}
