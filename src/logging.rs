//! Logging setup.
//!
//! Everything goes to stdout and, without ANSI colours, to `LOG_FILE` so
//! `GET /logs` can serve the tail of it.

use std::{
    ffi::OsStr,
    path::Path,
};

use tokio::io::AsyncReadExt;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber. Keep the guard alive for the whole
/// process; dropping it flushes and stops the file writer.
pub fn init(log_file: &Path) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let name = log_file.file_name().unwrap_or(OsStr::new("stockwatch.log"));

    let (file_writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    guard
}

/// Last `limit` lines of the log file, oldest first. A missing file reads as
/// empty.
pub async fn tail(path: &Path, limit: usize) -> std::io::Result<Vec<String>> {
    let mut file = match tokio::fs::File::open(path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut raw = Vec::new();
    file.read_to_end(&mut raw).await?;
    let text = String::from_utf8_lossy(&raw);

    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(limit);
    Ok(lines[start..].iter().map(|l| l.to_string()).collect())
}
