use std::process::ExitStatus;
use thiserror::Error;

/// What went wrong while fetching the search page.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error(transparent)]
  Http(#[from] reqwest::Error),

  #[error("Response body is not valid UTF-8")]
  Body(#[from] std::string::FromUtf8Error),
}

/// Why a query could not be turned into a watch URL.
#[derive(Debug, Error)]
pub enum ResolveError {
  /// Transport failure, error status, or an undecodable body.
  #[error("No internet connection.")]
  NoConnection(#[source] FetchError),

  #[error("No results found for '{query}'.")]
  NoResults { query: String },

  #[error("Result #{rank} requested, but only {available} unique result(s) found for '{query}'.")]
  RankOutOfRange { query: String, rank: usize, available: usize },
}

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error("{0}")]
  Argument(String),

  #[error("Invalid configuration: {0}")]
  Config(String),

  #[error("Dependency {0} not found.\nPlease install it.")]
  DependencyMissing(String),

  #[error("Failed to launch {program}")]
  Launch {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("{program} exited with {status}")]
  ProcessFailed { program: String, status: ExitStatus },

  #[error("Terminal I/O failed")]
  Io(#[from] std::io::Error),
}

impl AppError {
  /// Process exit status for this error: 1 for operational failures, 2 for user or config mistakes.
  pub fn exit_code(&self) -> u8 {
    match self {
      AppError::Argument(_) | AppError::Config(_) => 2,
      // The rank comes from configuration, so asking past the end is a config mistake.
      AppError::Resolve(ResolveError::RankOutOfRange { .. }) => 2,
      AppError::Resolve(_)
      | AppError::DependencyMissing(_)
      | AppError::Launch { .. }
      | AppError::ProcessFailed { .. }
      | AppError::Io(_) => 1,
    }
  }
}
