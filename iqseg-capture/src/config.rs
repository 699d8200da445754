use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use iqseg_types::BlockConfig;
use serde::{Deserialize, Serialize};

use crate::{CaptureError, CaptureResult};

/// Откуда брать сырой поток I/Q байт.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Записанный поток (например, вывод `rtl_sdr` в файл)
    File(PathBuf),
    /// Стандартный ввод (`rtl_sdr ... - | iqseg-capture -`)
    Stdin,
    /// Встроенный генератор тона (не требует железа)
    #[serde(rename = "sim")]
    Simulated,
}

/// Параметры встроенного генератора.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Частота тона относительно центра (Гц)
    pub tone_freq_hz: f32,
    /// Амплитуда тона (доля полной шкалы, 0.0..1.0)
    pub amplitude: f32,
    /// Сколько выборок выдать (None = бесконечно)
    pub total_samples: Option<u64>,
    /// Максимум байт за одно чтение (None = сколько запрошено)
    pub short_read: Option<usize>,
}

/// Полная конфигурация сессии.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Источник данных
    pub source: SourceKind,
    /// Размер блока и история
    pub block: BlockConfig,
    /// Частота дискретизации (Гц)
    pub sample_rate_hz: u32,
    /// Ограничение по числу блоков (None = до конца потока или Ctrl+C)
    pub max_blocks: Option<u64>,
    /// Интервал вывода статистики (секунды)
    pub stats_interval_secs: u64,
    /// Параметры генератора для `SourceKind::Simulated`
    pub sim: SimConfig,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl CaptureConfig {
    /// Загружает конфигурацию из JSON файла. Отсутствующие ключи берутся по
    /// умолчанию.
    pub fn load<P: AsRef<Path>>(path: P) -> CaptureResult<Self> {
        let file = File::open(path.as_ref()).map_err(|e| {
            CaptureError::Config(format!("cannot open {:?}: {e}", path.as_ref()))
        })?;
        let config: CaptureConfig = serde_json::from_reader(BufReader::new(file))?;

        Ok(config)
    }

    /// Проверяет согласованность параметров.
    pub fn validate(&self) -> CaptureResult<()> {
        self.block.validate()?;

        if self.sample_rate_hz == 0 {
            return Err(CaptureError::Config("sample rate must be > 0".to_string()));
        }

        if self.stats_interval_secs == 0 {
            return Err(CaptureError::Config(
                "stats interval must be > 0".to_string(),
            ));
        }

        if self.sim.short_read == Some(0) {
            return Err(CaptureError::Config("short read must be > 0".to_string()));
        }

        Ok(())
    }

    /// Длительность новых данных одного блока (секунды).
    pub fn block_duration_secs(&self) -> f64 {
        self.block.new_samples() as f64 / self.sample_rate_hz as f64
    }

    /// Ширина бина БПФ по длине блока (Гц).
    pub fn bin_freq_hz(&self) -> f64 {
        self.sample_rate_hz as f64 / self.block.size as f64
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для SourceKind, SimConfig, CaptureConfig
////////////////////////////////////////////////////////////////////////////////

impl std::fmt::Display for SourceKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            SourceKind::File(path) => write!(f, "{}", path.display()),
            SourceKind::Stdin => write!(f, "stdin"),
            SourceKind::Simulated => write!(f, "sim"),
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("Empty source. Use: <path>, -, sim".to_string()),
            "-" | "stdin" => Ok(SourceKind::Stdin),
            "sim" | "simulated" => Ok(SourceKind::Simulated),
            path => Ok(SourceKind::File(PathBuf::from(path))),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tone_freq_hz: 100_000.0,
            amplitude: 0.5,
            total_samples: None,
            short_read: None,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Stdin,
            block: BlockConfig::default(),
            sample_rate_hz: 2_400_000,
            max_blocks: None,
            stats_interval_secs: 5,
            sim: SimConfig::default(),
        }
    }
}

/// Парсит строку частоты в герцы.
///
/// Поддерживает суффиксы: `GHz`, `MHz`, `kHz`, `Hz` (регистронезависимо).
///
/// # Примеры
/// ```
/// use iqseg_capture::config::parse_freq_hz;
/// assert_eq!(parse_freq_hz("2.4MHz").unwrap(), 2_400_000);
/// assert_eq!(parse_freq_hz("2400000").unwrap(), 2_400_000);
/// ```
pub fn parse_freq_hz(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let lower = s.to_lowercase();

    let (num_str, mult) = if let Some(v) = lower.strip_suffix("ghz") {
        (v.trim(), 1_000_000_000_f64)
    } else if let Some(v) = lower.strip_suffix("mhz") {
        (v.trim(), 1_000_000_f64)
    } else if let Some(v) = lower.strip_suffix("khz") {
        (v.trim(), 1_000_f64)
    } else if let Some(v) = lower.strip_suffix("hz") {
        (v.trim(), 1_f64)
    } else {
        // Без суффикса — число в герцах
        return s
            .parse::<u64>()
            .map_err(|e| format!("Invalid frequency '{s}': {e}"));
    };

    let n: f64 = num_str
        .parse()
        .map_err(|e| format!("Invalid frequency value '{num_str}': {e}"))?;

    if !n.is_finite() || n < 0.0 {
        return Err(format!("Invalid frequency value '{num_str}'"));
    }

    Ok((n * mult).round() as u64)
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
