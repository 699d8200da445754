use std::{
    io::Read,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use iqseg_core::OverlappingBlockReader;
use iqseg_types::SampleBlock;
use log::{debug, info, warn};

use crate::{metrics::power_dbfs, CaptureConfig, CaptureResult, StreamMetrics};

/// Оркестрирует сессию: источник → блоки с историей → потребитель.
pub struct CapturePipeline {
    config: CaptureConfig,
    metrics: Arc<StreamMetrics>,
    stop_flag: Arc<AtomicBool>,
}

impl CapturePipeline {
    /// Создаёт пайплайн. Возвращает также shared-ссылку на метрики.
    pub fn new(config: CaptureConfig) -> (Self, Arc<StreamMetrics>) {
        let metrics = StreamMetrics::new();
        let p = Self {
            config,
            metrics: metrics.clone(),
            stop_flag: Arc::new(AtomicBool::new(false)),
        };

        (p, metrics)
    }

    /// Флаг остановки. Установка в `true` прекращает чтение следующих блоков.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Прогоняет поток до конца, лимита блоков или флага остановки.
    pub fn run<R: Read>(
        self,
        source: R,
    ) -> CaptureResult<()> {
        self.run_with(source, |_| {})
    }

    /// Как [`CapturePipeline::run`], но передаёт каждый блок в `on_block`.
    pub fn run_with<R, F>(
        self,
        source: R,
        mut on_block: F,
    ) -> CaptureResult<()>
    where
        R: Read,
        F: FnMut(&SampleBlock),
    {
        let cfg = &self.config;
        let metrics = &self.metrics;

        cfg.validate()?;

        let mut reader = OverlappingBlockReader::from_config(source, cfg.block)?;
        let stats_interval = Duration::from_secs(cfg.stats_interval_secs);

        info!(
            "Block size {} samples, history {}, {} new per block ({:.3} ms, bin {:.1} Hz)",
            cfg.block.size,
            cfg.block.history,
            cfg.block.new_samples(),
            cfg.block_duration_secs() * 1e3,
            cfg.bin_freq_hz(),
        );

        let session_start = Instant::now();
        let mut last_stats = Instant::now();

        loop {
            if let Some(max) = cfg.max_blocks {
                if reader.blocks_emitted() >= max {
                    info!("Block limit reached ({max}). Stopping...");
                    break;
                }
            }

            if self.stop_flag.load(Ordering::Relaxed) {
                info!("Stop signal received. Stopping...");
                break;
            }

            let block = match reader.next() {
                Some(Ok(b)) => b,
                Some(Err(e)) => {
                    warn!(
                        "Source failed after {} blocks: {e}",
                        reader.blocks_emitted()
                    );
                    return Err(e.into());
                }
                None => {
                    info!("End of stream after {} blocks", reader.blocks_emitted());
                    break;
                }
            };

            let new = (block.len() - cfg.block.history) as u64;
            let power = block.mean_power();

            metrics.blocks_emitted.fetch_add(1, Ordering::Relaxed);
            metrics
                .samples_emitted
                .fetch_add(block.len() as u64, Ordering::Relaxed);
            metrics.new_samples.fetch_add(new, Ordering::Relaxed);
            if block.len() > cfg.block.size {
                metrics.oversized_blocks.fetch_add(1, Ordering::Relaxed);
            }
            metrics.record_power(power);

            debug!(
                "block={} ts={:.6} samples={} power={:.1}dBFS",
                block.block_idx,
                block.timestamp,
                block.len(),
                power_dbfs(power)
            );

            on_block(&block);

            if last_stats.elapsed() >= stats_interval {
                self.log_progress(&session_start);
                last_stats = Instant::now();
            }
        }

        let dropped = reader.dropped_bytes();
        if dropped > 0 {
            warn!("Dropped {dropped} trailing bytes (incomplete block)");
            metrics
                .bytes_dropped
                .store(dropped as u64, Ordering::Relaxed);
        }

        Ok(())
    }

    fn log_progress(
        &self,
        start: &Instant,
    ) {
        let m = &self.metrics;

        info!(
            "[ {:.0}s ] blocks={} samples={} speed={:.3}Msps power={:.1}dBFS",
            start.elapsed().as_secs_f64(),
            m.blocks_emitted.load(Ordering::Relaxed),
            m.new_samples.load(Ordering::Relaxed),
            m.throughput_msps(start),
            power_dbfs(m.last_power()),
        );
    }
}
