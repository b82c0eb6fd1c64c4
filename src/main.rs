mod cli;
mod config;
mod constants;
mod error;
mod extract;
mod logging;
mod player;
mod prompt;
mod query;
mod session;
mod youtube;

use std::error::Error as _;
use std::future::Future;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;

use cli::{Invocation, OperationIntent};
use config::Config;
use error::AppError;
use player::{Downloader, MediaPlayer};
use prompt::StdinPrompt;
use session::PlaybackSession;
use youtube::{Resolve, Resolver};

const FAREWELL: &str = "Quitting...";

#[tokio::main]
async fn main() -> ExitCode {
  let invocation = match cli::parse(std::env::args_os()) {
    Ok(invocation) => invocation,
    Err(e) => return report(&e),
  };
  // Answered before logging or config, so -h works in a broken environment.
  if invocation == Invocation::Help {
    show_help();
    return ExitCode::SUCCESS;
  }

  spawn_interrupt_listener(logging::init());

  match run(invocation).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => report(&e),
  }
}

async fn run(invocation: Invocation) -> Result<(), AppError> {
  let config = Config::load()?;
  debug!(?config, "config: loaded");

  let mut prompt = StdinPrompt::new();
  let Some(intent) = invocation.into_intent(config.mode, &mut prompt).await? else {
    println!("{FAREWELL}");
    return Ok(());
  };
  info!(?intent, "intent resolved");

  let flags = intent.player_flags();
  match intent {
    // main answers -h before config loads; this arm keeps dispatch total over intents.
    OperationIntent::ShowHelp => show_help(),
    OperationIntent::FetchUrlOnly(query) => {
      let url = Resolver::new()?.resolve(&query, config.rank).await?;
      println!("{url}");
    }
    OperationIntent::Download(query) => {
      let downloader = Downloader::new(&config);
      downloader.check_deps()?;
      let url = Resolver::new()?.resolve(&query, config.rank).await?;
      downloader.download(&url, &config.download_dir).await?;
    }
    OperationIntent::PlayVideo(query) | OperationIntent::PlayAudio(query) => {
      let mut player = MediaPlayer::new(&config);
      player.check_deps()?;
      let resolver = Resolver::new()?;
      PlaybackSession::new(query, flags).run(config.rank, &resolver, &mut player, &mut prompt).await?;
      println!("{FAREWELL}");
    }
  }
  Ok(())
}

fn show_help() {
  print!("{}", cli::help_text());
}

/// Ctrl+C outside a running child ends the program cleanly; inside one, the child deals with it.
/// The task owns the log guard, so it is also dropped with the runtime on a normal exit.
fn spawn_interrupt_listener(log_guard: Option<WorkerGuard>) {
  tokio::spawn(async move {
    if wait_for_quit(tokio::signal::ctrl_c, player::child_in_foreground).await {
      farewell(log_guard);
      std::process::exit(0);
    }
    // No interrupts to wait for; keep the guard until the runtime shuts down.
    std::future::pending::<()>().await;
  });
}

/// Resolves `true` on the first interrupt that arrives with no child in the foreground,
/// `false` once interrupts can no longer be received.
async fn wait_for_quit<F, Fut>(mut next_interrupt: F, mut child_in_foreground: impl FnMut() -> bool) -> bool
where
  F: FnMut() -> Fut,
  Fut: Future<Output = std::io::Result<()>>,
{
  while next_interrupt().await.is_ok() {
    if child_in_foreground() {
      debug!("interrupt left to foreground child");
      continue;
    }
    return true;
  }
  false
}

/// `process::exit` skips destructors, so the log guard is dropped here to flush the file first.
fn farewell(log_guard: Option<WorkerGuard>) {
  info!("interrupted, quitting");
  println!("\n{FAREWELL}");
  drop(log_guard);
}

fn report(e: &AppError) -> ExitCode {
  error!(err = %e, code = e.exit_code(), "exiting with error");
  eprintln!("{e}");
  let mut source = e.source();
  while let Some(cause) = source {
    eprintln!("  caused by: {cause}");
    source = cause.source();
  }
  ExitCode::from(e.exit_code())
}
