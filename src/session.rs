//! The play / repeat / next loop.
//!
//! ```text
//! Ready ──resolve+play──▶ Played ──"y"──▶ Ready (same query)
//!                           │
//!                           ├─"n"/empty──▶ next query? ──text──▶ Ready (new query)
//!                           │                    └──empty/"q"/EOF──▶ Done
//!                           └─anything else──▶ error (exit 2)
//! ```

use tracing::{debug, info};

use crate::config::Rank;
use crate::error::AppError;
use crate::player::Play;
use crate::prompt::Prompt;
use crate::query::Query;
use crate::youtube::Resolve;

const REPEAT_QUESTION: &str = "Play again? (y/n): ";
const NEXT_QUESTION: &str = "Play next (q to quit): ";

/// What the user is currently listening to.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
  pub query: Query,
  pub flags: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  /// Holding a query that hasn't been played yet.
  Ready,
  /// The player has exited; waiting on the user.
  Played,
  Done,
}

impl PlaybackSession {
  pub fn new(query: Query, flags: impl Into<String>) -> Self {
    Self { query, flags: flags.into() }
  }

  /// Drive the loop until the user quits. Resolve and launch failures end the session.
  pub async fn run(
    mut self,
    rank: Rank,
    resolver: &impl Resolve,
    player: &mut impl Play,
    prompt: &mut impl Prompt,
  ) -> Result<(), AppError> {
    let mut state = State::Ready;
    while state != State::Done {
      state = match state {
        State::Ready => {
          let url = resolver.resolve(&self.query, rank).await?;
          player.play(&url, &self.flags).await?;
          State::Played
        }
        State::Played => self.ask_what_next(&mut *prompt).await?,
        State::Done => State::Done,
      };
    }
    info!("session: finished");
    Ok(())
  }

  async fn ask_what_next(&mut self, prompt: &mut impl Prompt) -> Result<State, AppError> {
    let Some(answer) = prompt.ask(REPEAT_QUESTION).await? else {
      return Ok(State::Done);
    };
    match answer.trim().to_lowercase().as_str() {
      "y" => {
        debug!(query = %self.query, "session: repeating");
        Ok(State::Ready)
      }
      "n" | "" => {
        let Some(next) = prompt.ask(NEXT_QUESTION).await? else {
          return Ok(State::Done);
        };
        match Query::new(&next) {
          Some(query) if query.as_str() != "q" => {
            debug!(query = %query, "session: next query");
            self.query = query;
            Ok(State::Ready)
          }
          _ => Ok(State::Done),
        }
      }
      _ => Err(AppError::Argument("Unrecognized option. Quitting...".to_string())),
    }
  }
}
