// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use log::{error, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use kotonami::app_config::{self, CacheBackend, Config};
use kotonami::app_controller::Controller;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for CacheBackend to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliCacheBackend {
    Memory,
    Json,
    Sqlite,
}

impl From<CliCacheBackend> for CacheBackend {
    fn from(cli_backend: CliCacheBackend) -> Self {
        match cli_backend {
            CliCacheBackend::Memory => CacheBackend::Memory,
            CliCacheBackend::Json => CacheBackend::Json,
            CliCacheBackend::Sqlite => CacheBackend::Sqlite,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download a subtitle track and enrich every line
    Track {
        /// Video id, e.g. dQw4w9WgXcQ
        #[arg(value_name = "CONTENT_ID")]
        content_id: String,

        /// Track language (defaults to the configured language)
        #[arg(short = 'L', long)]
        lang: Option<String>,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Enrich a single sentence
    Text {
        #[arg(value_name = "SENTENCE")]
        sentence: String,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a local VTT file into cues without enrichment
    Parse {
        #[arg(value_name = "VTT_FILE")]
        vtt_file: PathBuf,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show word cache statistics
    CacheStats,

    /// Generate shell completions for kotonami
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// kotonami - subtitles with word-level Japanese annotations
#[derive(Parser, Debug)]
#[command(name = "kotonami")]
#[command(version)]
#[command(about = "Fetch subtitles and annotate every word with reading, romaji and meaning")]
#[command(long_about = "kotonami downloads a video's subtitle track, parses it into cues and
annotates every word with its reading, romaji, dictionary meaning and JLPT level.

EXAMPLES:
    kotonami track dQw4w9WgXcQ                  # Enrich the configured language's track
    kotonami track dQw4w9WgXcQ -L ja -o out.json
    kotonami text '猫が好き'                     # Enrich one sentence
    kotonami parse episode.ja.vtt               # Show parsed cues only
    kotonami cache-stats                        # Word cache statistics
    kotonami completions bash > kotonami.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the config file doesn't
    exist, a default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Override the word cache backend
    #[arg(long, value_enum, global = true)]
    cache_backend: Option<CliCacheBackend>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    // Filtering happens through log::set_max_level once the config is loaded
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Failed to initialize logger: {}", e);
    }
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: CommandLineOptions) -> Result<()> {
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "kotonami", &mut std::io::stdout());
        return Ok(());
    }

    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &cli.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.into());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }
    if let Some(backend) = &cli.cache_backend {
        config.cache.backend = backend.clone().into();
    }
    log::set_max_level(config.log_level.into());

    let controller = Controller::with_config(config)?;

    match cli.command {
        Commands::Track { content_id, lang, output } => {
            controller.run_track(&content_id, lang.as_deref(), output.as_deref()).await
        }
        Commands::Text { sentence, output } => controller.run_text(&sentence, output.as_deref()).await,
        Commands::Parse { vtt_file, output } => controller.run_parse(&vtt_file, output.as_deref()),
        Commands::CacheStats => controller.run_cache_stats().await,
        Commands::Completions { .. } => Ok(()),
    }
}
