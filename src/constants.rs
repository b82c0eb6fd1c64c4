//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! with no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// Fixed endpoints, patterns and program names.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Search source
  pub search_url: String,
  pub watch_url: String,
  /// Regex whose first capture group is a video identifier.
  pub id_pattern: String,

  // External programs
  pub audio_flags: String,
  pub output_template: String,
  pub default_player: String,
  pub default_downloader: String,
  /// Needed by the downloader to merge separate audio/video streams.
  pub merger: String,

  // HTTP
  pub request_timeout_secs: u64,
  pub user_agent: String,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed the first test run catches it.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
