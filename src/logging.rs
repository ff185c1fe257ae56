//! Tracing setup. The terminal belongs to the UI, so logs go to a file.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` wins over the verbosity flag.
pub fn level_for(verbosity: u8) -> tracing::Level {
    match verbosity {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

pub fn build_subscriber(log_file: File, verbosity: u8) -> anyhow::Result<impl tracing::Subscriber + Send + Sync> {
    let level = level_for(verbosity);
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    let fmt_layer = fmt::layer()
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .with_target(verbosity > 0)
        .with_line_number(verbosity > 1);

    Ok(tracing_subscriber::registry().with(fmt_layer).with(env_filter))
}

pub fn init_logging(path: &Path, verbosity: u8) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let log_file = File::create(path).with_context(|| format!("opening log file {}", path.display()))?;
    build_subscriber(log_file, verbosity)?.try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_for(0), tracing::Level::INFO);
        assert_eq!(level_for(1), tracing::Level::DEBUG);
        assert_eq!(level_for(5), tracing::Level::TRACE);
    }

    #[test]
    fn events_reach_the_log_file() {
        let log_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(log_file.reopen().unwrap(), 0).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(resource = "skills", "cache miss");
            tracing::debug!("filtered out at info");
        });
        let written = std::fs::read_to_string(log_file.path()).unwrap();
        assert!(written.contains("cache miss"));
        assert!(written.contains("resource=\"skills\""));
        assert!(!written.contains("filtered out"));
    }
}
