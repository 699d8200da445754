use std::{
    sync::{
        atomic::{AtomicU32, AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};

/// Метрики потока блоков, обновляемые lock-free.
#[derive(Debug, Default)]
pub struct StreamMetrics {
    pub blocks_emitted: AtomicU64,
    /// Всего выборок в выданных блоках (с учётом истории)
    pub samples_emitted: AtomicU64,
    /// Новых выборок из источника
    pub new_samples: AtomicU64,
    /// Байт неполного последнего блока, отброшенных в конце потока
    pub bytes_dropped: AtomicU64,
    /// Блоков длиннее номинального размера (перескок при коротких чтениях)
    pub oversized_blocks: AtomicU64,
    /// Мощность последнего блока, биты f32
    last_power_bits: AtomicU32,
    /// Пиковая мощность блока, биты f32
    peak_power_bits: AtomicU32,
}

/// Snapshot метрик для отображения / тестирования.
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub duration_secs: f64,
    pub blocks_emitted: u64,
    pub samples_emitted: u64,
    pub new_samples: u64,
    pub bytes_dropped: u64,
    pub oversized_blocks: u64,
    pub throughput_msps: f64,
    pub last_power_dbfs: f32,
    pub peak_power_dbfs: f32,
}

impl StreamMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Учитывает мощность очередного блока.
    pub fn record_power(
        &self,
        power: f32,
    ) {
        let power = if power > 0.0 && power.is_finite() { power } else { 0.0 };
        let bits = power.to_bits();

        self.last_power_bits.store(bits, Ordering::Relaxed);
        // для неотрицательных f32 порядок битов совпадает с порядком чисел
        self.peak_power_bits.fetch_max(bits, Ordering::Relaxed);
    }

    pub fn last_power(&self) -> f32 {
        f32::from_bits(self.last_power_bits.load(Ordering::Relaxed))
    }

    pub fn peak_power(&self) -> f32 {
        f32::from_bits(self.peak_power_bits.load(Ordering::Relaxed))
    }

    /// Новых выборок в секунду (Msps).
    pub fn throughput_msps(
        &self,
        elapsed: &Instant,
    ) -> f64 {
        let secs = elapsed.elapsed().as_secs_f64();

        if secs < 1e-9 {
            return 0.0;
        }

        self.new_samples.load(Ordering::Relaxed) as f64 / secs / 1_000_000.0
    }

    /// Итоговая сводка для вывода в конце сессии.
    pub fn summary(
        &self,
        elapsed: &Instant,
    ) -> MetricsSummary {
        MetricsSummary {
            duration_secs: elapsed.elapsed().as_secs_f64(),
            blocks_emitted: self.blocks_emitted.load(Ordering::Relaxed),
            samples_emitted: self.samples_emitted.load(Ordering::Relaxed),
            new_samples: self.new_samples.load(Ordering::Relaxed),
            bytes_dropped: self.bytes_dropped.load(Ordering::Relaxed),
            oversized_blocks: self.oversized_blocks.load(Ordering::Relaxed),
            throughput_msps: self.throughput_msps(elapsed),
            last_power_dbfs: power_dbfs(self.last_power()),
            peak_power_dbfs: power_dbfs(self.peak_power()),
        }
    }
}

/// Мощность относительно полной шкалы, дБ (нижняя граница -120 дБ).
pub fn power_dbfs(power: f32) -> f32 {
    10.0 * power.max(1e-12).log10()
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(f, "  Duration      : {:.1}s", self.duration_secs)?;
        writeln!(f, "  Blocks        : {}", self.blocks_emitted)?;
        writeln!(f, "  Samples       : {}", self.samples_emitted)?;
        writeln!(f, "  New samples   : {}", self.new_samples)?;
        writeln!(f, "  Dropped tail  : {} bytes", self.bytes_dropped)?;
        writeln!(f, "  Oversized     : {}", self.oversized_blocks)?;
        writeln!(f, "  Throughput    : {:.3} Msps", self.throughput_msps)?;
        writeln!(f, "  Last power    : {:.1} dBFS", self.last_power_dbfs)?;
        write!(f, "  Peak power    : {:.1} dBFS", self.peak_power_dbfs)
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::*;

    #[test]
    fn test_initial_metrics_zero() {
        let metrics = StreamMetrics::new();
        let start = Instant::now();
        let summary = metrics.summary(&start);

        assert_eq!(summary.blocks_emitted, 0);
        assert_eq!(summary.samples_emitted, 0);
        assert_eq!(summary.new_samples, 0);
        assert_eq!(summary.bytes_dropped, 0);
        assert_eq!(summary.throughput_msps, 0.0);
        assert!((summary.peak_power_dbfs + 120.0).abs() < 1e-3);
    }

    #[test]
    fn test_power_tracking() {
        let metrics = StreamMetrics::new();

        metrics.record_power(0.25);
        metrics.record_power(1.0);
        metrics.record_power(0.01);

        assert_eq!(metrics.last_power(), 0.01);
        assert_eq!(metrics.peak_power(), 1.0);
        assert!((power_dbfs(0.01) + 20.0).abs() < 1e-4);

        metrics.record_power(f32::NAN);
        assert_eq!(metrics.last_power(), 0.0);
        assert_eq!(metrics.peak_power(), 1.0);
    }

    #[test]
    fn test_throughput() {
        let metrics = StreamMetrics::new();
        metrics.new_samples.store(4_000_000, Ordering::Relaxed);

        let start = Instant::now() - Duration::from_secs(2);

        // 4_000_000 / 2 / 1_000_000 = 2.0 Msps
        assert!((metrics.throughput_msps(&start) - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_summary_display() {
        let metrics = StreamMetrics::new();
        metrics.blocks_emitted.store(3, Ordering::Relaxed);
        metrics.bytes_dropped.store(5, Ordering::Relaxed);

        let text = metrics.summary(&Instant::now()).to_string();

        assert!(text.contains("Blocks        : 3"));
        assert!(text.contains("Dropped tail  : 5 bytes"));
    }

    #[test]
    fn test_multithreaded_updates() {
        let metrics = StreamMetrics::new();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let m = metrics.clone();
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        m.blocks_emitted.fetch_add(1, Ordering::Relaxed);
                    }
                    m.record_power(i as f32);
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(metrics.blocks_emitted.load(Ordering::Relaxed), 4_000);
        assert_eq!(metrics.peak_power(), 3.0);
    }
}
