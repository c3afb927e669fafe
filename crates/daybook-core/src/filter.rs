use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{
  Deserialize,
  Serialize
};
use tracing::trace;

use crate::config::Locale;
use crate::task::Task;

/// List selector. The wire names match the values earlier releases
/// stored, hence `delete` for the trash.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
  #[default]
  All,
  Current,
  Completed,
  #[serde(rename = "delete", alias = "trash")]
  Trash
}

impl Filter {
  pub const ALL: [Filter; 4] = [
    Filter::All,
    Filter::Current,
    Filter::Completed,
    Filter::Trash
  ];

  pub fn as_key(
    self
  ) -> &'static str {
    match self {
      | Filter::All => "all",
      | Filter::Current => "current",
      | Filter::Completed => {
        "completed"
      }
      | Filter::Trash => "delete"
    }
  }

  pub fn label(
    self,
    locale: Locale
  ) -> &'static str {
    match (locale, self) {
      | (Locale::Ja, Filter::All) => {
        "すべてのタスク"
      }
      | (Locale::Ja, Filter::Current) => {
        "現在のタスク"
      }
      | (
        Locale::Ja,
        Filter::Completed
      ) => "完了したタスク",
      | (Locale::Ja, Filter::Trash) => {
        "ごみ箱"
      }
      | (Locale::En, Filter::All) => {
        "All tasks"
      }
      | (Locale::En, Filter::Current) => {
        "Current tasks"
      }
      | (
        Locale::En,
        Filter::Completed
      ) => "Completed tasks",
      | (Locale::En, Filter::Trash) => {
        "Trash"
      }
    }
  }

  /// `All` keeps soft-deleted tasks visible; only `Trash` isolates them.
  pub fn matches(
    self,
    task: &Task
  ) -> bool {
    match self {
      | Filter::All => true,
      | Filter::Current => {
        !task.deleted
          && !task.is_completed()
      }
      | Filter::Completed => {
        !task.deleted
          && task.is_completed()
      }
      | Filter::Trash => task.deleted
    }
  }

  pub fn apply(
    self,
    tasks: &[Task]
  ) -> Vec<&Task> {
    let out: Vec<&Task> = tasks
      .iter()
      .filter(|task| self.matches(task))
      .collect();
    trace!(
      filter = %self,
      total = tasks.len(),
      matched = out.len(),
      "applied filter"
    );
    out
  }
}

impl fmt::Display for Filter {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_key())
  }
}

impl FromStr for Filter {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "all" => Ok(Filter::All),
      | "current" => Ok(Filter::Current),
      | "completed" => {
        Ok(Filter::Completed)
      }
      | "delete" | "trash" => {
        Ok(Filter::Trash)
      }
      | other => Err(anyhow!(
        "unknown filter: {other}"
      ))
    }
  }
}
