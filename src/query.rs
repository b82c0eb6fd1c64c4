use std::fmt;

/// A search string with surrounding whitespace trimmed and inner runs collapsed to one space.
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
  /// Normalize `text`, returning `None` if nothing but whitespace remains.
  pub fn new(text: &str) -> Option<Self> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() { None } else { Some(Self(normalized)) }
  }

  /// Join several words (e.g. trailing CLI arguments) into one query.
  pub fn from_words<S: AsRef<str>>(words: &[S]) -> Option<Self> {
    let joined = words.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
    Self::new(&joined)
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Query {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn collapses_whitespace() {
    let q = Query::new("  never   gonna\tgive \n you up ").unwrap();
    assert_eq!(q.as_str(), "never gonna give you up");
  }

  #[test]
  fn blank_is_rejected() {
    assert!(Query::new("").is_none());
    assert!(Query::new(" \t\n ").is_none());
  }

  #[test]
  fn words_are_space_joined() {
    let q = Query::from_words(&["foo", " bar ", "", "baz"]).unwrap();
    assert_eq!(q.to_string(), "foo bar baz");
    assert!(Query::from_words::<&str>(&[]).is_none());
  }
}
