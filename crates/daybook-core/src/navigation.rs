use chrono::NaiveDate;
use serde::{
  Deserialize,
  Serialize
};
use tracing::warn;

use crate::datetime::{
  format_iso_date,
  parse_iso_date
};

/// One-shot state handed to the list view on arrival. Never persisted.
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct ListArrival {
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub selected_date:  Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub expand_todo_id: Option<u64>
}

/// One-shot state handed to the calendar view on arrival.
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct CalendarArrival {
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub initial_date: Option<String>
}

impl ListArrival {
  pub fn day(date: NaiveDate) -> Self {
    Self {
      selected_date:  Some(
        format_iso_date(date)
      ),
      expand_todo_id: None
    }
  }

  pub fn expanding(
    date: NaiveDate,
    task_id: u64
  ) -> Self {
    Self {
      selected_date:  Some(
        format_iso_date(date)
      ),
      expand_todo_id: Some(task_id)
    }
  }

  pub fn selected_day(
    &self
  ) -> Option<NaiveDate> {
    parse_transient_date(
      self.selected_date.as_deref()?,
      "selectedDate"
    )
  }
}

impl CalendarArrival {
  pub fn at(date: NaiveDate) -> Self {
    Self {
      initial_date: Some(
        format_iso_date(date)
      )
    }
  }

  pub fn initial_day(
    &self
  ) -> Option<NaiveDate> {
    parse_transient_date(
      self.initial_date.as_deref()?,
      "initialDate"
    )
  }
}

fn parse_transient_date(
  raw: &str,
  field: &str
) -> Option<NaiveDate> {
  let parsed = parse_iso_date(raw);
  if parsed.is_none() {
    warn!(field, value = %raw, "ignoring unparseable navigation date");
  }
  parsed
}
