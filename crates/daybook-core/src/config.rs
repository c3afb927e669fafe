use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{
  NaiveDate,
  Weekday
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::calendar::EventStyle;
use crate::datetime::today_in;

pub const DEFAULT_TASKS_KEY: &str =
  "todos-v3";
pub const DEFAULT_COUNTER_KEY: &str =
  "nextId-v3";

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
  #[default]
  Ja,
  En
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct Config {
  #[serde(default)]
  pub locale:   Locale,
  #[serde(default)]
  pub timezone: Option<String>,
  #[serde(default)]
  pub storage:  StorageKeys,
  #[serde(default)]
  pub calendar: CalendarConfig
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct StorageKeys {
  #[serde(
    default = "default_tasks_key"
  )]
  pub tasks_key:   String,
  #[serde(
    default = "default_counter_key"
  )]
  pub counter_key: String
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct CalendarConfig {
  #[serde(
    default = "default_week_start"
  )]
  pub week_start:     String,
  #[serde(
    default = "default_day_max_events"
  )]
  pub day_max_events: usize,
  #[serde(
    default = "default_title_prefix"
  )]
  pub title_prefix:   String,
  #[serde(
    default = "default_event_color"
  )]
  pub background:     String,
  #[serde(
    default = "default_event_color"
  )]
  pub border:         String,
  #[serde(
    default = "default_text_color"
  )]
  pub text:           String
}

impl Default for StorageKeys {
  fn default() -> Self {
    Self {
      tasks_key:   default_tasks_key(),
      counter_key: default_counter_key()
    }
  }
}

impl Default for CalendarConfig {
  fn default() -> Self {
    Self {
      week_start:     default_week_start(
      ),
      day_max_events:
        default_day_max_events(),
      title_prefix:
        default_title_prefix(),
      background:
        default_event_color(),
      border:         default_event_color(
      ),
      text:           default_text_color()
    }
  }
}

impl Config {
  #[tracing::instrument(skip(raw))]
  pub fn from_toml_str(
    raw: &str
  ) -> anyhow::Result<Self> {
    let mut cfg: Config =
      toml::from_str(raw).context(
        "failed to parse daybook \
         config"
      )?;
    cfg.sanitize();
    info!(
      locale = ?cfg.locale,
      timezone = ?cfg.timezone,
      tasks_key = %cfg.storage.tasks_key,
      "loaded config"
    );
    Ok(cfg)
  }

  #[tracing::instrument(skip(path))]
  pub fn load(
    path: &Path
  ) -> anyhow::Result<Self> {
    let text =
      fs::read_to_string(path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    debug!(file = %path.display(), "read config file");
    Self::from_toml_str(&text)
      .with_context(|| {
        format!(
          "invalid config in {}",
          path.display()
        )
      })
  }

  /// Falls back to UTC, the zone the browser app derived "today" from.
  pub fn timezone(&self) -> Tz {
    let Some(raw) =
      self.timezone.as_deref()
    else {
      return Tz::UTC;
    };

    match raw.trim().parse::<Tz>() {
      | Ok(tz) => tz,
      | Err(error) => {
        warn!(timezone = %raw, %error, "unknown timezone; using UTC");
        Tz::UTC
      }
    }
  }

  pub fn today(&self) -> NaiveDate {
    today_in(self.timezone())
  }

  pub fn week_start(&self) -> Weekday {
    if self
      .calendar
      .week_start
      .trim()
      .eq_ignore_ascii_case("monday")
    {
      Weekday::Mon
    } else {
      Weekday::Sun
    }
  }

  pub fn event_style(
    &self
  ) -> EventStyle {
    EventStyle {
      title_prefix: self
        .calendar
        .title_prefix
        .clone(),
      background:   self
        .calendar
        .background
        .clone(),
      border:       self
        .calendar
        .border
        .clone(),
      text:         self
        .calendar
        .text
        .clone()
    }
  }

  fn sanitize(&mut self) {
    if self
      .storage
      .tasks_key
      .trim()
      .is_empty()
    {
      self.storage.tasks_key =
        default_tasks_key();
    }
    if self
      .storage
      .counter_key
      .trim()
      .is_empty()
    {
      self.storage.counter_key =
        default_counter_key();
    }
    if self.storage.tasks_key
      == self.storage.counter_key
    {
      warn!(key = %self.storage.tasks_key, "tasks and counter share a key; restoring defaults");
      self.storage =
        StorageKeys::default();
    }

    let week_start = self
      .calendar
      .week_start
      .trim()
      .to_ascii_lowercase();
    if week_start != "sunday"
      && week_start != "monday"
    {
      warn!(week_start = %self.calendar.week_start, "unsupported week start; using sunday");
      self.calendar.week_start =
        default_week_start();
    }

    if self.calendar.day_max_events == 0
    {
      self.calendar.day_max_events =
        default_day_max_events();
    }
    if self
      .calendar
      .background
      .trim()
      .is_empty()
    {
      self.calendar.background =
        default_event_color();
    }
    if self
      .calendar
      .border
      .trim()
      .is_empty()
    {
      self.calendar.border =
        default_event_color();
    }
    if self
      .calendar
      .text
      .trim()
      .is_empty()
    {
      self.calendar.text =
        default_text_color();
    }
  }
}

fn default_tasks_key() -> String {
  DEFAULT_TASKS_KEY.to_string()
}

fn default_counter_key() -> String {
  DEFAULT_COUNTER_KEY.to_string()
}

fn default_week_start() -> String {
  "sunday".to_string()
}

fn default_day_max_events() -> usize {
  3
}

fn default_title_prefix() -> String {
  "• ".to_string()
}

fn default_event_color() -> String {
  "#ff8c42".to_string()
}

fn default_text_color() -> String {
  "#fff".to_string()
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  #[test]
  fn empty_document_uses_defaults() {
    let cfg = Config::from_toml_str("")
      .expect("parse empty config");
    assert_eq!(cfg, Config::default());
    assert_eq!(
      cfg.storage.tasks_key,
      "todos-v3"
    );
    assert_eq!(
      cfg.storage.counter_key,
      "nextId-v3"
    );
    assert_eq!(cfg.timezone(), Tz::UTC);
    assert_eq!(
      cfg.week_start(),
      Weekday::Sun
    );
  }

  #[test]
  fn sanitizes_blank_and_invalid_values(
  ) {
    let raw = r#"
locale = "en"
timezone = "Asia/Tokyo"

[storage]
tasks_key = "  "

[calendar]
week_start = "friday"
day_max_events = 0
text = ""
"#;
    let cfg = Config::from_toml_str(raw)
      .expect("parse config");
    assert_eq!(cfg.locale, Locale::En);
    assert_eq!(
      cfg.timezone(),
      chrono_tz::Asia::Tokyo
    );
    assert_eq!(
      cfg.storage.tasks_key,
      DEFAULT_TASKS_KEY
    );
    assert_eq!(
      cfg.calendar.week_start,
      "sunday"
    );
    assert_eq!(
      cfg.calendar.day_max_events,
      3
    );
    assert_eq!(cfg.calendar.text, "#fff");
  }

  #[test]
  fn unknown_timezone_falls_back_to_utc()
  {
    let cfg = Config {
      timezone: Some(
        "Mars/Olympus".to_string()
      ),
      ..Config::default()
    };
    assert_eq!(cfg.timezone(), Tz::UTC);
  }

  #[test]
  fn shared_key_is_rejected() {
    let raw = r#"
[storage]
tasks_key = "same"
counter_key = "same"
"#;
    let cfg = Config::from_toml_str(raw)
      .expect("parse config");
    assert_eq!(
      cfg.storage,
      StorageKeys::default()
    );
  }

  #[test]
  fn loads_from_file() {
    let mut file =
      tempfile::NamedTempFile::new()
        .expect("temp file");
    writeln!(
      file,
      "[calendar]\nweek_start = \"monday\""
    )
    .expect("write config");

    let cfg = Config::load(file.path())
      .expect("load config");
    assert_eq!(
      cfg.week_start(),
      Weekday::Mon
    );
  }

  #[test]
  fn missing_file_is_an_error() {
    let err = Config::load(Path::new(
      "/nonexistent/daybook.toml"
    ))
    .expect_err("missing file");
    assert!(
      format!("{err:#}")
        .contains("failed to read")
    );
  }
}
