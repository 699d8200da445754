//! Конвертация 8-битных I/Q пар RTL-SDR в комплексные выборки и обратно.
//!
//! `real = (I - offset) / scale`, `imag = (Q - offset) / scale`.
//! Обратное преобразование отсекает дробную часть и заворачивает результат по
//! модулю 256, как при нативном приведении к `uint8`, без насыщения.

use iqseg_types::{Sample, BYTES_PER_SAMPLE, RTL_SDR_DC_OFFSET, RTL_SDR_SCALE};

/// Параметры квантования 8-битного АЦП.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqCodec {
    /// Постоянная составляющая (номинальный ноль)
    pub offset: f32,
    /// Делитель, приводящий отсчёт к единичной амплитуде
    pub scale: f32,
}

impl IqCodec {
    /// Кодек RTL-SDR: offset 127.4, scale 128.
    pub const RTL_SDR: IqCodec = IqCodec {
        offset: RTL_SDR_DC_OFFSET,
        scale: RTL_SDR_SCALE,
    };

    pub fn new(
        offset: f32,
        scale: f32,
    ) -> Self {
        Self { offset, scale }
    }

    /// Сырые байты → комплексные выборки. Непарный последний байт игнорируется.
    pub fn decode(
        &self,
        raw: &[u8],
    ) -> Vec<Sample> {
        let mut out = Vec::with_capacity(raw.len() / BYTES_PER_SAMPLE);
        self.decode_into(raw, &mut out);
        out
    }

    /// Как [`IqCodec::decode`], но дописывает выборки в `out`.
    pub fn decode_into(
        &self,
        raw: &[u8],
        out: &mut Vec<Sample>,
    ) {
        out.extend(
            raw.chunks_exact(BYTES_PER_SAMPLE)
                .map(|iq| Sample::new(self.decode_value(iq[0]), self.decode_value(iq[1]))),
        );
    }

    /// Комплексные выборки → сырые байты (I, Q, I, Q, ...).
    pub fn encode(
        &self,
        samples: &[Sample],
    ) -> Vec<u8> {
        samples.iter().flat_map(|s| self.encode_sample(*s)).collect()
    }

    /// Одна выборка → пара байт `[I, Q]`.
    #[inline]
    pub fn encode_sample(
        &self,
        s: Sample,
    ) -> [u8; 2] {
        [self.encode_value(s.re), self.encode_value(s.im)]
    }

    #[inline]
    fn decode_value(
        &self,
        v: u8,
    ) -> f32 {
        (v as f32 - self.offset) / self.scale
    }

    #[inline]
    fn encode_value(
        &self,
        v: f32,
    ) -> u8 {
        truncate_wrap_u8(v * self.scale + self.offset)
    }
}

impl Default for IqCodec {
    fn default() -> Self {
        Self::RTL_SDR
    }
}

/// Отсекает дробную часть и берёт младшие 8 бит (NaN → 0).
#[inline]
pub fn truncate_wrap_u8(v: f32) -> u8 {
    // `f32 as i64` отбрасывает дробь к нулю, `i64 as u8` берёт младшие 8 бит
    (v as i64) as u8
}

/// Декодирует блок с параметрами RTL-SDR по умолчанию.
pub fn raw_to_complex(raw: &[u8]) -> Vec<Sample> {
    IqCodec::RTL_SDR.decode(raw)
}

/// Кодирует выборки обратно в байты RTL-SDR.
pub fn complex_to_raw(samples: &[Sample]) -> Vec<u8> {
    IqCodec::RTL_SDR.encode(samples)
}
