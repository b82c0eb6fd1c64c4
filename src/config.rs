use directories::{BaseDirs, ProjectDirs, UserDirs};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::constants;
use crate::error::AppError;

const RANK_VAR: &str = "YT_NUM";
const MODE_VAR: &str = "YT_MODE";
const DOWNLOAD_DIR_VAR: &str = "YT_DLOAD_DIR";

/// What to play when no flag picks a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Music,
  Video,
}

impl Mode {
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "music" => Some(Mode::Music),
      "video" => Some(Mode::Video),
      _ => None,
    }
  }

  /// Extra player arguments; empty means full-quality video.
  pub fn player_flags(self) -> &'static str {
    match self {
      Mode::Music => constants().audio_flags.as_str(),
      Mode::Video => "",
    }
  }

  /// Decoration for the interactive query prompt.
  pub fn prompt_symbol(self) -> &'static str {
    match self {
      Mode::Music => "🎵",
      Mode::Video => "🎬",
    }
  }
}

/// 1-based position in the deduplicated result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank(NonZeroUsize);

impl Rank {
  pub const FIRST: Rank = Rank(NonZeroUsize::MIN);

  pub fn new(n: usize) -> Option<Self> {
    NonZeroUsize::new(n).map(Rank)
  }

  pub fn get(self) -> usize {
    self.0.get()
  }

  fn parse(raw: &str, source: &str) -> Result<Self, AppError> {
    raw
      .trim()
      .parse::<usize>()
      .ok()
      .and_then(Rank::new)
      .ok_or_else(|| AppError::Config(format!("{source} must be a whole number of at least 1, got '{raw}'")))
  }
}

impl Default for Rank {
  fn default() -> Self {
    Rank::FIRST
  }
}

/// Optional overrides read from `prefs.toml`.
#[derive(Deserialize, Default, Debug)]
#[serde(default, deny_unknown_fields)]
struct Prefs {
  rank: Option<usize>,
  mode: Option<String>,
  download_dir: Option<String>,
  player: Option<String>,
  downloader: Option<String>,
}

impl Prefs {
  fn load() -> Result<Self, AppError> {
    let Some(proj_dirs) = ProjectDirs::from("", "", "ytplay") else {
      return Ok(Self::default());
    };
    let config_file = proj_dirs.config_dir().join("prefs.toml");
    let Ok(content) = std::fs::read_to_string(&config_file) else {
      return Ok(Self::default());
    };
    debug!(path = %config_file.display(), "config: loaded preferences file");
    Self::parse(&content).map_err(|e| AppError::Config(format!("{}: {e}", config_file.display())))
  }

  fn parse(content: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(content)
  }
}

/// Settings fixed for the whole run. Built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
  pub rank: Rank,
  pub mode: Mode,
  pub download_dir: PathBuf,
  pub player: String,
  pub downloader: String,
}

impl Config {
  /// Defaults, then `prefs.toml`, then `YT_NUM` / `YT_MODE` / `YT_DLOAD_DIR`.
  pub fn load() -> Result<Self, AppError> {
    let prefs = Prefs::load()?;
    let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
    let videos = UserDirs::new().and_then(|dirs| dirs.video_dir().map(Path::to_path_buf));
    Self::build(prefs, |key| std::env::var(key).ok(), home.as_deref(), videos)
  }

  fn build(
    prefs: Prefs,
    env: impl Fn(&str) -> Option<String>,
    home: Option<&Path>,
    video_dir: Option<PathBuf>,
  ) -> Result<Self, AppError> {
    let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    let rank = match (env(RANK_VAR), prefs.rank) {
      (Some(raw), _) => Rank::parse(&raw, RANK_VAR)?,
      (None, Some(n)) => Rank::new(n).ok_or_else(|| AppError::Config("rank in prefs.toml must be at least 1".into()))?,
      (None, None) => Rank::default(),
    };

    let mode = match env(MODE_VAR).or(prefs.mode) {
      Some(raw) => Mode::parse(&raw).ok_or_else(|| {
        AppError::Config(format!("{MODE_VAR} has an unknown value '{raw}'.\nValid options are \"music\" and \"video\""))
      })?,
      None => Mode::Music,
    };

    let download_dir = match env(DOWNLOAD_DIR_VAR).or(prefs.download_dir) {
      Some(raw) => expand_home(&raw, home),
      None => video_dir.or_else(|| home.map(|h| h.join("Videos"))).unwrap_or_else(|| PathBuf::from("Videos")),
    };

    let c = constants();
    Ok(Self {
      rank,
      mode,
      download_dir,
      player: prefs.player.unwrap_or_else(|| c.default_player.clone()),
      downloader: prefs.downloader.unwrap_or_else(|| c.default_downloader.clone()),
    })
  }
}

/// Expand a leading `~` or `$HOME` against the home directory.
fn expand_home(raw: &str, home: Option<&Path>) -> PathBuf {
  let raw = raw.trim();
  let Some(home) = home else { return PathBuf::from(raw) };
  for prefix in ["~", "$HOME", "${HOME}"] {
    if let Some(rest) = raw.strip_prefix(prefix) {
      if rest.is_empty() {
        return home.to_path_buf();
      }
      if let Some(rest) = rest.strip_prefix(['/', '\\']) {
        return home.join(rest);
      }
    }
  }
  PathBuf::from(raw)
}
