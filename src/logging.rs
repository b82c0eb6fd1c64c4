use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

const FILTER_VAR: &str = "YTPLAY_LOG";

/// Send logs to `ytplay.log` in the cache dir so the terminal stays free for prompts and the player.
/// Falls back to warnings on stderr. Keep the returned guard alive until exit to flush the file.
pub fn init() -> Option<WorkerGuard> {
  match init_file() {
    Ok(guard) => Some(guard),
    Err(e) => {
      let _ = tracing_subscriber::fmt().with_env_filter(filter("warn")).with_writer(std::io::stderr).try_init();
      warn!(err = %format!("{e:#}"), "logging: file log unavailable, using stderr");
      None
    }
  }
}

fn init_file() -> Result<WorkerGuard> {
  let dirs = ProjectDirs::from("", "", "ytplay").context("no home directory to place the log in")?;
  let dir = dirs.cache_dir();
  std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

  let appender = RollingFileAppender::builder()
    .rotation(Rotation::NEVER)
    .filename_prefix("ytplay")
    .filename_suffix("log")
    .build(dir)
    .context("failed to open log file")?;
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(filter("info"))
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| anyhow!("failed to install subscriber: {e}"))?;
  Ok(guard)
}

fn filter(default: &str) -> EnvFilter {
  EnvFilter::try_from_env(FILTER_VAR).unwrap_or_else(|_| EnvFilter::new(default))
}
