use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use clap::Parser;
use iqseg_capture::{open_source, parse_freq_hz, CaptureConfig, CapturePipeline, SourceKind};
use log::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "iqseg-capture",
    version = env!("CARGO_PKG_VERSION"),
    about = "Split a raw 8-bit RTL-SDR I/Q stream into overlapping complex blocks",
    long_about = None,
)]
struct Cli {
    /// Источник: путь к файлу, `-` (stdin) или `sim`
    input: Option<String>,
    /// JSON файл настроек (ключи перекрываются флагами)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Длина блока (выборок)
    #[arg(short = 'b', long)]
    block_size: Option<usize>,
    /// История: выборок из конца предыдущего блока
    #[arg(long)]
    history: Option<usize>,
    /// Частота дискретизации (2.4MHz, 2400000)
    #[arg(short = 'r', long)]
    rate: Option<String>,
    /// Остановиться после N блоков
    #[arg(short = 'n', long)]
    max_blocks: Option<u64>,
    /// Интервал вывода статистики (секунды)
    #[arg(long)]
    stats_interval: Option<u64>,
    /// Частота тона генератора `sim` (Гц)
    #[arg(long)]
    tone: Option<f32>,
    /// Сколько выборок выдаёт генератор `sim`
    #[arg(long)]
    sim_samples: Option<u64>,
    /// Максимум байт за одно чтение генератора `sim`
    #[arg(long)]
    short_read: Option<usize>,
    /// Подробный вывод (каждый блок)
    #[arg(short, long)]
    verbose: bool,
    /// Тихий режим (только ошибки)
    #[arg(short, long)]
    quiet: bool,
}

fn build_config(cli: &Cli) -> Result<CaptureConfig, String> {
    let mut config = match &cli.config {
        Some(path) => CaptureConfig::load(path).map_err(|e| e.to_string())?,
        None => CaptureConfig::default(),
    };

    if let Some(input) = &cli.input {
        config.source = input.parse::<SourceKind>()?;
    }
    if let Some(size) = cli.block_size {
        config.block.size = size;
    }
    if let Some(history) = cli.history {
        config.block.history = history;
    }
    if let Some(rate) = &cli.rate {
        let hz = parse_freq_hz(rate).map_err(|e| format!("--rate: {e}"))?;
        config.sample_rate_hz =
            u32::try_from(hz).map_err(|_| format!("--rate {hz} Hz exceeds u32::MAX"))?;
    }
    if cli.max_blocks.is_some() {
        config.max_blocks = cli.max_blocks;
    }
    if let Some(secs) = cli.stats_interval {
        config.stats_interval_secs = secs;
    }
    if let Some(tone) = cli.tone {
        config.sim.tone_freq_hz = tone;
    }
    if cli.sim_samples.is_some() {
        config.sim.total_samples = cli.sim_samples;
    }
    if cli.short_read.is_some() {
        config.sim.short_read = cli.short_read;
    }

    config.validate().map_err(|e| e.to_string())?;

    Ok(config)
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.quiet {
        log::LevelFilter::Error
    } else if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .format_timestamp_secs()
        .init();

    let config = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let source = match open_source(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open source: {e}");
            std::process::exit(1);
        }
    };

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Source        : {}", config.source);
    info!("  Sample rate   : {:.3} Msps", config.sample_rate_hz as f64 / 1e6);
    info!("  Block size    : {} samples", config.block.size);
    info!("  History       : {} samples", config.block.history);
    info!("  Block time    : {:.3} ms", config.block_duration_secs() * 1e3);
    info!("  Bin width     : {:.1} Hz", config.bin_freq_hz());
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let (pipeline, metrics) = CapturePipeline::new(config);
    let stop_flag: Arc<AtomicBool> = pipeline.stop_flag();
    let stop_ctrlc = stop_flag.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        if stop_ctrlc.swap(true, Ordering::SeqCst) {
            // Второй Ctrl+C — принудительный выход
            warn!("Force exit");
            std::process::exit(130);
        }
        warn!("Ctrl+C received — stopping after the current block...");
    }) {
        warn!("Failed to set Ctrl+C handler: {e}");
    }

    let session_start = Instant::now();

    if let Err(e) = pipeline.run(source) {
        error!("Capture failed: {e}");
        std::process::exit(1);
    }

    let summary = metrics.summary(&session_start);
    info!("\n{summary}");

    if summary.oversized_blocks > 0 {
        warn!(
            "⚠ {} blocks exceeded the nominal size because of short reads",
            summary.oversized_blocks
        );
    }

    info!("✓ Done: {} blocks", summary.blocks_emitted);
}
