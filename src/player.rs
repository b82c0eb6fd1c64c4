use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::Config;
use crate::constants::constants;
use crate::error::AppError;

/// Hands a resolved URL to something that plays it and waits for it to finish.
#[allow(async_fn_in_trait)]
pub trait Play {
  async fn play(&mut self, url: &str, flags: &str) -> Result<(), AppError>;
}

/// Fail with `DependencyMissing` for the first program not found on `PATH`.
pub fn check_deps<'a>(programs: impl IntoIterator<Item = &'a str>) -> Result<(), AppError> {
  for program in programs {
    if which::which(program).is_err() {
      return Err(AppError::DependencyMissing(program.to_string()));
    }
  }
  Ok(())
}

/// Set while a child owns the terminal; Ctrl+C is then the child's to handle.
static CHILD_IN_FOREGROUND: AtomicBool = AtomicBool::new(false);

pub fn child_in_foreground() -> bool {
  CHILD_IN_FOREGROUND.load(Ordering::SeqCst)
}

struct ForegroundGuard;

impl ForegroundGuard {
  fn enter() -> Self {
    CHILD_IN_FOREGROUND.store(true, Ordering::SeqCst);
    ForegroundGuard
  }
}

impl Drop for ForegroundGuard {
  fn drop(&mut self) {
    CHILD_IN_FOREGROUND.store(false, Ordering::SeqCst);
  }
}

/// Run `program args..` attached to the terminal and wait for it to exit.
async fn run_attached(program: &str, args: &[&str]) -> Result<ExitStatus, AppError> {
  let _foreground = ForegroundGuard::enter();
  Command::new(program)
    .args(args)
    .stdin(Stdio::inherit())
    .stdout(Stdio::inherit())
    .stderr(Stdio::inherit())
    .status()
    .await
    .map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        AppError::DependencyMissing(program.to_string())
      } else {
        AppError::Launch { program: program.to_string(), source: e }
      }
    })
}

/// External media player (mpv by default). It uses the downloader to open YouTube URLs.
pub struct MediaPlayer {
  program: String,
  downloader: String,
}

impl MediaPlayer {
  pub fn new(config: &Config) -> Self {
    Self { program: config.player.clone(), downloader: config.downloader.clone() }
  }

  /// Programs that must be installed before anything is played.
  pub fn check_deps(&self) -> Result<(), AppError> {
    check_deps([self.program.as_str(), self.downloader.as_str()])
  }
}

impl Play for MediaPlayer {
  async fn play(&mut self, url: &str, flags: &str) -> Result<(), AppError> {
    let mut args: Vec<&str> = flags.split_whitespace().collect();
    args.push(url);
    info!(player = %self.program, flags, url, "player: starting");

    let status = run_attached(&self.program, &args).await?;
    // mpv exits non-zero when quit by signal or on a broken stream; neither ends the session.
    if !status.success() {
      warn!(player = %self.program, %status, "player: exited with failure status");
    }
    Ok(())
  }
}

pub struct Downloader {
  program: String,
}

impl Downloader {
  pub fn new(config: &Config) -> Self {
    Self { program: config.downloader.clone() }
  }

  /// Programs that must be installed before a download is attempted.
  pub fn check_deps(&self) -> Result<(), AppError> {
    check_deps([self.program.as_str(), constants().merger.as_str()])
  }

  /// Save `url` into `dir`, named by the downloader's title/extension template.
  pub async fn download(&self, url: &str, dir: &Path) -> Result<(), AppError> {
    let template = output_template(dir);
    info!(downloader = %self.program, output = %template, url, "download: starting");

    let status = run_attached(&self.program, &["-o", &template, url]).await?;
    if !status.success() {
      return Err(AppError::ProcessFailed { program: self.program.clone(), status });
    }
    Ok(())
  }
}

/// `<dir>/%(title)s.%(ext)s`; placeholders are left for the downloader to fill in.
fn output_template(dir: &Path) -> String {
  dir.join(&constants().output_template).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn output_template_keeps_placeholders() {
    let template = output_template(Path::new("/media/videos"));
    assert_eq!(template, format!("/media/videos{}%(title)s.%(ext)s", std::path::MAIN_SEPARATOR));
  }

  #[test]
  fn missing_program_is_reported_by_name() {
    let err = check_deps(["ytplay-test-no-such-program-3f9c"]).unwrap_err();
    assert!(matches!(err, AppError::DependencyMissing(ref name) if name == "ytplay-test-no-such-program-3f9c"));
    assert_eq!(err.exit_code(), 1);
  }

  #[test]
  fn no_programs_is_fine() {
    assert!(check_deps(std::iter::empty()).is_ok());
  }

  #[tokio::test]
  async fn launching_unknown_program_is_dependency_missing() {
    let err = run_attached("ytplay-test-no-such-program-3f9c", &[]).await.unwrap_err();
    assert!(matches!(err, AppError::DependencyMissing(_)));
    assert!(!child_in_foreground());
  }
}
