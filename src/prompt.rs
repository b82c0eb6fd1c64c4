use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::error::AppError;
use crate::query::Query;

/// Line-based questions to the user. `None` means input has ended and the user is gone.
#[allow(async_fn_in_trait)]
pub trait Prompt {
  async fn ask(&mut self, question: &str) -> Result<Option<String>, AppError>;
}

pub struct StdinPrompt {
  lines: Lines<BufReader<Stdin>>,
}

impl StdinPrompt {
  pub fn new() -> Self {
    Self { lines: BufReader::new(tokio::io::stdin()).lines() }
  }
}

impl Prompt for StdinPrompt {
  async fn ask(&mut self, question: &str) -> Result<Option<String>, AppError> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{question}")?;
    stdout.flush()?;
    let line = self.lines.next_line().await?;
    if line.is_none() {
      // Keep the farewell off the prompt line.
      println!();
    }
    Ok(line)
  }
}

/// Keep asking until a non-blank query is given.
pub async fn ask_for_query(prompt: &mut impl Prompt, symbol: &str) -> Result<Option<Query>, AppError> {
  loop {
    println!("Please enter search query:");
    let Some(answer) = prompt.ask(&format!("❮{symbol}❯ ")).await? else {
      return Ok(None);
    };
    if let Some(query) = Query::new(&answer) {
      return Ok(Some(query));
    }
  }
}

/// Prompt that replays canned answers, for driving interactive code in tests.
#[cfg(test)]
pub mod scripted {
  use super::*;
  use std::collections::VecDeque;

  #[derive(Default)]
  pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    pub questions: Vec<String>,
  }

  impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
      Self { answers: answers.iter().map(|a| a.to_string()).collect(), questions: Vec::new() }
    }
  }

  impl Prompt for ScriptedPrompt {
    async fn ask(&mut self, question: &str) -> Result<Option<String>, AppError> {
      self.questions.push(question.to_string());
      Ok(self.answers.pop_front())
    }
  }
}
