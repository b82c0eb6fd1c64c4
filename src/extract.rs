//! Pulling video identifiers out of a search-result page.
//!
//! The page embeds its results as script data (`"videoId":"xxxxxxxxxxx"`), so a
//! plain text scan is enough. Markup changes upstream only touch [`IdPattern`].

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::constants::constants;

static DEFAULT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
  // Safety: the pattern is an embedded constant; the constants test compiles it.
  Regex::new(&constants().id_pattern).expect("id_pattern in constants.ron must be a valid regex")
});

/// Text pattern whose first capture group is one identifier.
#[derive(Debug, Clone)]
pub struct IdPattern {
  re: Regex,
}

impl Default for IdPattern {
  fn default() -> Self {
    Self { re: DEFAULT_PATTERN.clone() }
  }
}

impl IdPattern {
  #[cfg(test)]
  pub fn new(pattern: &str) -> Result<Self, regex::Error> {
    Ok(Self { re: Regex::new(pattern)? })
  }

  /// Every identifier in `page`, in page order, duplicates included.
  pub fn extract<'a>(&self, page: &'a str) -> Vec<&'a str> {
    self.re.captures_iter(page).filter_map(|caps| caps.get(1)).map(|m| m.as_str()).collect()
  }
}

/// Keep the first occurrence of each identifier, preserving order.
pub fn dedup<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
  let mut seen = HashSet::new();
  ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
