use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::{
    format::FmtSpan,
    writer::{BoxMakeWriter, MakeWriterExt},
};

pub const CLI_PREFIX: &str = "numwatch";
pub const PROGRESS_PREFIX: &str = "numwatch-progress";

/// Used when neither `--log` nor `RUST_LOG` ask for anything else. Stdout belongs to the
/// readings, so diagnostics stay quiet unless asked for.
const DEFAULT_LEVEL: &str = "warn";

#[derive(Debug, Clone, clap::Args)]
pub struct LoggingArgs {
    #[arg(long, help = "Print trace logs to stderr")]
    pub log: bool,
    #[arg(
        long = "log-dir",
        value_name = "DIR",
        help = "Also write logs into daily rotated files in this directory"
    )]
    pub log_dir: Option<PathBuf>,
}

impl LoggingArgs {
    pub fn enable(&self, prefix: &str) -> Result<()> {
        let level = self.log.then_some(LevelFilter::TRACE);
        enable_logging(prefix, self.log_dir.as_deref(), level, self.log)
    }
}

pub fn enable_logging(
    prefix: &str,
    log_dir: Option<&Path>,
    log_level: Option<LevelFilter>,
    show_std: bool,
) -> Result<()> {
    let stderr = std::io::stderr.with_filter(move |_| show_std);

    let writer = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::Builder::new()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix(prefix)
                .build(dir)?;
            BoxMakeWriter::new(stderr.and(appender))
        }
        None => BoxMakeWriter::new(stderr),
    };

    let level = log_level
        .map(|v| v.to_string())
        .unwrap_or_else(|| std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LEVEL.into()));

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!(
            "{}={level}",
            env!("CARGO_PKG_NAME").replace("-", "_"),
        )))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(writer)
        .pretty()
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});
