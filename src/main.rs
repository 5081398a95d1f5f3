//! kafka-replay - offline tools for container files

use clap::{Parser, Subcommand, ValueEnum};
use kafka_replay::config::{ConfigFile, DEFAULT_LOG_LEVEL};
use kafka_replay::replay::{
    cat, CatConfig, CatFormat, DiscardSink, ReplayConfig, ReplaySession,
};
use kafka_replay::transcoder::Decoder;
use kafka_replay::{ReplayError, Result};
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "kafka-replay", version, about = "Inspect and verify recorded message containers")]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, env = "KAFKA_REPLAY_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL, global = true)]
    log_level: String,

    /// TOML config file providing replay defaults
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every record of a container
    Cat {
        /// Container file
        input: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Only print payloads containing this string
        #[arg(long)]
        find: Option<String>,
    },

    /// Count the records of a container
    Count {
        /// Container file
        input: PathBuf,

        /// Only count payloads containing this string
        #[arg(long)]
        find: Option<String>,
    },

    /// Decode every record through a dry-run replay
    Verify {
        /// Container file
        input: PathBuf,

        /// Records per second (0 = unbounded)
        #[arg(long)]
        rate: Option<u32>,

        /// Only replay payloads containing this string
        #[arg(long)]
        find: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Json,
    Raw,
}

impl From<OutputFormat> for CatFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CatFormat::Json,
            OutputFormat::Raw => CatFormat::Raw,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(ReplayError::Cancelled) => {
            eprintln!("kafka-replay: interrupted");
            ExitCode::from(130)
        }
        Err(e) => {
            eprintln!("kafka-replay: {e}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let log_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(log_filter)
        .init();

    let config_file = match cli.config {
        Some(ref path) => ConfigFile::from_file(path)?,
        None => ConfigFile::default(),
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return Err(e.into());
        }
    };

    runtime.block_on(async move {
        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping");
                interrupt.cancel();
            }
        });

        run_command(cli.command, config_file, cancel).await
    })
}

async fn run_command(
    command: Command,
    config_file: ConfigFile,
    cancel: CancellationToken,
) -> Result<()> {
    match command {
        Command::Cat {
            input,
            format,
            find,
        } => {
            let config = CatConfig {
                format: format.into(),
                find: find.filter(|f| !f.is_empty()).map(Into::into),
                count_only: false,
            };
            cat_file(input, config, cancel).await.map(|_| ())
        }
        Command::Count { input, find } => {
            let config = CatConfig {
                find: find.filter(|f| !f.is_empty()).map(Into::into),
                count_only: true,
                ..Default::default()
            };
            let count = cat_file(input, config, cancel).await?;
            println!("{}", count);
            Ok(())
        }
        Command::Verify { input, rate, find } => {
            verify_file(input, config_file.replay, rate, find, cancel).await
        }
    }
}

async fn cat_file(input: PathBuf, config: CatConfig, cancel: CancellationToken) -> Result<u64> {
    let decoder = Decoder::open_path(&input)?;
    info!(path = %input.display(), version = %decoder.version(), "Reading container");

    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        cat(decoder, &config, BufWriter::new(stdout.lock()), &cancel)
    });
    match handle.await {
        Ok(result) => result,
        Err(e) => Err(ReplayError::Io(std::io::Error::other(e))),
    }
}

async fn verify_file(
    input: PathBuf,
    base: ReplayConfig,
    rate: Option<u32>,
    find: Option<String>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut config = base.with_dry_run();
    config.loop_replay = false;
    if let Some(rate) = rate {
        config = config.with_rate(rate);
    }
    if let Some(find) = find {
        config = config.with_find(find);
    }

    let decoder = Decoder::open_path(&input)?;
    let mut session = ReplaySession::new(config).with_cancellation(cancel);
    let stats = session.run(decoder, DiscardSink::new()).await.into_result()?;

    println!(
        "{}: {} records ok ({} skipped by filter) in {} ms",
        input.display(),
        stats.records_replayed,
        stats.records_skipped,
        stats.duration_ms
    );
    Ok(())
}
