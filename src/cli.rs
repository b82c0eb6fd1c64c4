use clap::{CommandFactory, Parser};
use std::ffi::OsString;

use crate::config::Mode;
use crate::error::AppError;
use crate::prompt::{Prompt, ask_for_query};
use crate::query::Query;

const HOTKEYS: &str = "List of mpv hotkeys: https://defkey.com/mpv-media-player-shortcuts";

/// Play media from YouTube. Plays audio only unless -v is given or YT_MODE=video.
#[derive(Parser, Debug)]
#[command(
  name = "ytplay",
  disable_help_flag = true,
  override_usage = "ytplay [OPTIONS] <search query>",
  after_help = HOTKEYS
)]
struct Args {
  /// Show this help text
  #[arg(short = 'h', conflicts_with_all = ["url", "download", "video"])]
  help: bool,

  /// Fetch video URL
  #[arg(short = 'u', value_name = "search query", conflicts_with_all = ["download", "video"])]
  url: Option<String>,

  /// Download video
  #[arg(short = 'd', value_name = "search query", conflicts_with = "video")]
  download: Option<String>,

  /// Play video
  #[arg(short = 'v', value_name = "search query")]
  video: Option<String>,

  /// Search words; appended to a flag's query when one is given
  #[arg(value_name = "search query", num_args = 1.., trailing_var_arg = true)]
  query: Vec<String>,
}

/// What the command line asked for, before any prompting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
  Help,
  UrlOnly(Query),
  Download(Query),
  Video(Query),
  /// No flag: play in the configured mode, asking for a query if none was given.
  Default(Option<Query>),
}

/// The single action this run performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationIntent {
  ShowHelp,
  FetchUrlOnly(Query),
  Download(Query),
  PlayVideo(Query),
  PlayAudio(Query),
}

impl OperationIntent {
  /// Player arguments for the play intents; empty for everything else.
  pub fn player_flags(&self) -> &'static str {
    match self {
      OperationIntent::PlayAudio(_) => Mode::Music.player_flags(),
      _ => Mode::Video.player_flags(),
    }
  }
}

pub fn help_text() -> String {
  Args::command().render_help().to_string()
}

/// Parse `argv` (program name first). Never exits the process.
pub fn parse<I, T>(argv: I) -> Result<Invocation, AppError>
where
  I: IntoIterator<Item = T>,
  T: Into<OsString> + Clone,
{
  let args = Args::try_parse_from(argv).map_err(|e| AppError::Argument(e.render().to_string().trim_end().to_string()))?;
  if args.help {
    return Ok(Invocation::Help);
  }

  let flagged: [(Option<String>, fn(Query) -> Invocation, &str); 3] = [
    (args.url, Invocation::UrlOnly, "-u"),
    (args.download, Invocation::Download, "-d"),
    (args.video, Invocation::Video, "-v"),
  ];
  for (value, variant, flag) in flagged {
    let Some(value) = value else { continue };
    let missing =
      || AppError::Argument(format!("Option {flag} requires a search query.\nUsage: ytplay {flag} <search query>"));
    if value.trim().is_empty() {
      return Err(missing());
    }
    let words: Vec<&str> = std::iter::once(value.as_str()).chain(args.query.iter().map(String::as_str)).collect();
    return Query::from_words(&words).map(variant).ok_or_else(missing);
  }

  Ok(Invocation::Default(Query::from_words(&args.query)))
}

impl Invocation {
  /// Settle on an intent, asking for a query when none was given.
  /// `Ok(None)` means the user left at the query prompt.
  pub async fn into_intent(self, mode: Mode, prompt: &mut impl Prompt) -> Result<Option<OperationIntent>, AppError> {
    let intent = match self {
      Invocation::Help => OperationIntent::ShowHelp,
      Invocation::UrlOnly(query) => OperationIntent::FetchUrlOnly(query),
      Invocation::Download(query) => OperationIntent::Download(query),
      Invocation::Video(query) => OperationIntent::PlayVideo(query),
      Invocation::Default(query) => {
        let query = match query {
          Some(query) => query,
          None => match ask_for_query(prompt, mode.prompt_symbol()).await? {
            Some(query) => query,
            None => return Ok(None),
          },
        };
        match mode {
          Mode::Music => OperationIntent::PlayAudio(query),
          Mode::Video => OperationIntent::PlayVideo(query),
        }
      }
    };
    Ok(Some(intent))
  }
}
