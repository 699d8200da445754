// Генератор выдаёт поток байт в том же виде, что и `rtl_sdr -`: чередующиеся
// беззнаковые I и Q. Ограничение `short_read` имитирует USB-транспорт, который
// отдаёт меньше запрошенного, так что сборщик блоков видит короткие чтения.

use std::{
    f64::consts::PI,
    fs::File,
    io::{self, Read},
};

use iqseg_core::IqCodec;
use iqseg_types::{Sample, BYTES_PER_SAMPLE};
use log::info;

use crate::{CaptureConfig, CaptureError, CaptureResult, SimConfig, SourceKind};

/// Синтетический 8-битный I/Q поток (комплексный тон).
pub struct SimulatedSource {
    pub sample_rate_hz: u32,
    pub tone_freq_hz: f32,
    pub amplitude: f32,
    pub short_read: Option<usize>,
    codec: IqCodec,
    /// Позиция в потоке (байт)
    pos: u64,
    /// Длина потока (байт), None = бесконечный
    len: Option<u64>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl SimulatedSource {
    pub fn new(
        sample_rate_hz: u32,
        sim: &SimConfig,
    ) -> Self {
        Self {
            sample_rate_hz,
            tone_freq_hz: sim.tone_freq_hz,
            amplitude: sim.amplitude,
            short_read: sim.short_read,
            codec: IqCodec::RTL_SDR,
            pos: 0,
            len: sim.total_samples.map(|n| n * BYTES_PER_SAMPLE as u64),
        }
    }

    /// Выборка номер `k` до квантования.
    pub fn sample_at(
        &self,
        k: u64,
    ) -> Sample {
        let t = k as f64 / self.sample_rate_hz as f64;
        let phase = (2.0 * PI * self.tone_freq_hz as f64 * t) as f32;

        Sample::new(self.amplitude * phase.cos(), self.amplitude * phase.sin())
    }

    /// Сколько байт уже выдано.
    pub fn bytes_produced(&self) -> u64 {
        self.pos
    }
}

impl Read for SimulatedSource {
    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> io::Result<usize> {
        let mut n = buf.len();

        if let Some(limit) = self.short_read {
            n = n.min(limit);
        }

        if let Some(len) = self.len {
            n = n.min(len.saturating_sub(self.pos) as usize);
        }

        for byte in buf.iter_mut().take(n) {
            let k = self.pos / BYTES_PER_SAMPLE as u64;
            let iq = self.codec.encode_sample(self.sample_at(k));
            *byte = iq[(self.pos % BYTES_PER_SAMPLE as u64) as usize];
            self.pos += 1;
        }

        Ok(n)
    }
}

/// Открывает источник байт по конфигурации.
pub fn open_source(config: &CaptureConfig) -> CaptureResult<Box<dyn Read>> {
    match &config.source {
        SourceKind::File(path) => {
            let file = File::open(path)
                .map_err(|e| CaptureError::SourceNotFound(format!("{}: {e}", path.display())))?;
            info!("Reading raw samples from {}", path.display());

            // Без BufReader: его внутренний буфер дробит запросы на короткие чтения
            Ok(Box::new(file))
        }
        SourceKind::Stdin => {
            info!("Reading raw samples from stdin");

            stdin_source()
        }
        SourceKind::Simulated => {
            info!(
                "Simulated source: tone {} Hz, amplitude {}",
                config.sim.tone_freq_hz, config.sim.amplitude
            );

            Ok(Box::new(SimulatedSource::new(
                config.sample_rate_hz,
                &config.sim,
            )))
        }
    }
}

/// Стандартный ввод без буфера `Stdin`.
///
/// `io::stdin()` читает через внутренний `BufReader` на 8 КиБ и режет запросы
/// меньше этого размера на короткие чтения. На unix читаем дубликат fd 0.
#[cfg(unix)]
fn stdin_source() -> CaptureResult<Box<dyn Read>> {
    use std::os::fd::AsFd;

    Ok(Box::new(unbuffered(io::stdin().as_fd())?))
}

#[cfg(not(unix))]
fn stdin_source() -> CaptureResult<Box<dyn Read>> {
    Ok(Box::new(io::stdin()))
}

#[cfg(unix)]
fn unbuffered(fd: std::os::fd::BorrowedFd<'_>) -> io::Result<File> {
    Ok(File::from(fd.try_clone_to_owned()?))
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use iqseg_core::raw_to_complex;

    use super::*;

    fn sim(
        total_samples: Option<u64>,
        short_read: Option<usize>,
    ) -> SimConfig {
        SimConfig {
            tone_freq_hz: 250.0,
            amplitude: 0.5,
            total_samples,
            short_read,
        }
    }

    #[test]
    fn test_finite_stream_length() {
        let mut src = SimulatedSource::new(1_000, &sim(Some(100), None));
        let mut out = Vec::new();
        src.read_to_end(&mut out).unwrap();

        assert_eq!(out.len(), 200);
        assert_eq!(src.bytes_produced(), 200);
    }

    #[test]
    fn test_short_read_limit() {
        let mut src = SimulatedSource::new(1_000, &sim(None, Some(7)));
        let mut buf = [0u8; 64];

        assert_eq!(src.read(&mut buf).unwrap(), 7);
        assert_eq!(src.read(&mut buf).unwrap(), 7);
    }

    #[test]
    fn test_tone_layout() {
        // 250 Гц при 1 kHz → четверть периода на выборку
        let mut src = SimulatedSource::new(1_000, &sim(Some(4), None));
        let mut raw = Vec::new();
        src.read_to_end(&mut raw).unwrap();
        let s = raw_to_complex(&raw);

        // cos(0) = 1, sin(0) = 0 с точностью до шага квантования
        assert!((s[0].re - 0.5).abs() < 2.0 / 128.0);
        assert!(s[0].im.abs() < 2.0 / 128.0);
        // вторая выборка: cos = 0, sin = 1
        assert!(s[1].re.abs() < 2.0 / 128.0);
        assert!((s[1].im - 0.5).abs() < 2.0 / 128.0);
    }

    #[test]
    fn test_odd_buffer_keeps_iq_alignment() {
        let mut a = SimulatedSource::new(1_000, &sim(Some(10), Some(3)));
        let mut b = SimulatedSource::new(1_000, &sim(Some(10), None));
        let mut ra = Vec::new();
        let mut rb = Vec::new();
        a.read_to_end(&mut ra).unwrap();
        b.read_to_end(&mut rb).unwrap();

        assert_eq!(ra, rb);
    }

    #[cfg(unix)]
    #[test]
    fn test_unbuffered_fd_reads_whole_request() {
        use std::{io::Write, os::fd::AsFd};

        let mut file = tempfile::tempfile().unwrap();
        file.write_all(&[3u8; 64]).unwrap();

        let mut dup = unbuffered(file.as_fd()).unwrap();
        io::Seek::rewind(&mut dup).unwrap();
        let mut buf = [0u8; 48];

        assert_eq!(dup.read(&mut buf).unwrap(), 48);
        assert_eq!(dup.read(&mut buf).unwrap(), 16);
    }

    #[test]
    fn test_io_error_converts() {
        let err: CaptureError = io::Error::from(io::ErrorKind::BrokenPipe).into();

        assert!(matches!(err, CaptureError::Io(_)));
        assert!(err.to_string().starts_with("I/O error"));
    }

    #[test]
    fn test_open_missing_file() {
        let cfg = CaptureConfig {
            source: SourceKind::File(PathBuf::from("/nonexistent/capture.bin")),
            ..Default::default()
        };

        assert!(matches!(
            open_source(&cfg),
            Err(CaptureError::SourceNotFound(_))
        ));
    }
}
