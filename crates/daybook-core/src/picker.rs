use chrono::{
  Datelike,
  NaiveDate,
  Weekday
};
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  warn
};

use crate::book::{
  EditError,
  TaskBook
};
use crate::datetime::{
  YearMonth,
  add_days
};
use crate::task::DateField;

/// Page coordinates of the clicked date field; the popup opens below it.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct Anchor {
  pub top:  f64,
  pub left: f64
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct PickerSession {
  pub task_id: u64,
  pub field:   DateField,
  pub anchor:  Anchor,
  pub cursor:  YearMonth
}

/// The inline date popup. At most one date field across the list is edited
/// at a time.
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub enum DatePicker {
  #[default]
  Closed,
  Open(PickerSession)
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct PickerDay {
  pub date:     NaiveDate,
  pub weekday:  Weekday,
  pub is_today: bool
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickerGrid {
  pub month:          YearMonth,
  pub leading_blanks: usize,
  pub days:           Vec<PickerDay>,
  pub can_go_prev:    bool
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct Picked {
  pub task_id: u64,
  pub field:   DateField,
  pub date:    NaiveDate
}

/// The month the popup opens on: the field's current value, or `fallback`
/// when the task is gone.
pub fn seed_date(
  book: &TaskBook,
  task_id: u64,
  field: DateField,
  fallback: NaiveDate
) -> NaiveDate {
  book
    .get(task_id)
    .map(|task| task.date(field))
    .unwrap_or(fallback)
}

impl DatePicker {
  pub fn is_open(&self) -> bool {
    matches!(self, DatePicker::Open(_))
  }

  pub fn session(
    &self
  ) -> Option<&PickerSession> {
    match self {
      | DatePicker::Open(session) => {
        Some(session)
      }
      | DatePicker::Closed => None
    }
  }

  pub fn is_editing(
    &self,
    task_id: u64,
    field: DateField
  ) -> bool {
    self.session().is_some_and(|s| {
      s.task_id == task_id
        && s.field == field
    })
  }

  /// Clicking the field being edited closes the popup; any other field
  /// takes it over.
  pub fn toggle(
    &mut self,
    task_id: u64,
    field: DateField,
    anchor: Anchor,
    seed: NaiveDate
  ) {
    if self.is_editing(task_id, field) {
      debug!(task_id, ?field, "closing date picker");
      *self = DatePicker::Closed;
      return;
    }

    debug!(task_id, ?field, %seed, "opening date picker");
    *self =
      DatePicker::Open(PickerSession {
        task_id,
        field,
        anchor,
        cursor: YearMonth::of(seed)
      });
  }

  pub fn close(&mut self) {
    *self = DatePicker::Closed;
  }

  /// Browsing back is only allowed while the cursor is after the current
  /// month.
  pub fn can_go_prev(
    &self,
    today: NaiveDate
  ) -> bool {
    self.session().is_some_and(|s| {
      s.cursor > YearMonth::of(today)
    })
  }

  pub fn prev_month(
    &mut self,
    today: NaiveDate
  ) -> bool {
    if !self.can_go_prev(today) {
      return false;
    }
    if let DatePicker::Open(session) =
      self
    {
      session.cursor =
        session.cursor.shift(-1);
    }
    true
  }

  pub fn next_month(&mut self) {
    if let DatePicker::Open(session) =
      self
    {
      session.cursor =
        session.cursor.shift(1);
    }
  }

  pub fn grid(
    &self,
    today: NaiveDate,
    week_start: Weekday
  ) -> Option<PickerGrid> {
    let session = self.session()?;
    let month = session.cursor;
    let first = month.first_day();
    let leading_blanks = ((7
      + first
        .weekday()
        .num_days_from_monday()
      - week_start
        .num_days_from_monday())
      % 7)
      as usize;

    let days = (0..month.day_count())
      .map(|offset| {
        let date = add_days(
          first,
          i64::from(offset)
        );
        PickerDay {
          date,
          weekday: date.weekday(),
          is_today: date == today
        }
      })
      .collect();

    Some(PickerGrid {
      month,
      leading_blanks,
      days,
      can_go_prev: self
        .can_go_prev(today)
    })
  }

  /// Applies the picked day to the edited field. A due date before the
  /// start date leaves the popup open and the book untouched.
  #[tracing::instrument(skip(
    self, book
  ))]
  pub fn select(
    &mut self,
    book: &mut TaskBook,
    date: NaiveDate
  ) -> Result<Option<Picked>, EditError>
  {
    let Some(session) = self.session()
    else {
      return Ok(None);
    };
    let (task_id, field) =
      (session.task_id, session.field);

    match book
      .set_date(task_id, field, date)
    {
      | Ok(()) => {
        self.close();
        Ok(Some(Picked {
          task_id,
          field,
          date
        }))
      }
      | Err(
        err @ EditError::DueBeforeStart {
          ..
        }
      ) => {
        warn!(task_id, %err, "rejected date pick");
        Err(err)
      }
      | Err(err) => {
        warn!(task_id, %err, "date pick on unavailable task");
        self.close();
        Err(err)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  fn anchor() -> Anchor {
    Anchor {
      top:  120.0,
      left: 40.0
    }
  }

  #[test]
  fn same_field_toggles_closed() {
    let mut picker = DatePicker::default();
    picker.toggle(
      1,
      DateField::Start,
      anchor(),
      day(2024, 6, 1)
    );
    assert!(
      picker
        .is_editing(1, DateField::Start)
    );

    picker.toggle(
      1,
      DateField::Due,
      anchor(),
      day(2024, 6, 1)
    );
    assert!(
      picker.is_editing(1, DateField::Due)
    );
    assert!(
      !picker
        .is_editing(1, DateField::Start)
    );

    picker.toggle(
      1,
      DateField::Due,
      anchor(),
      day(2024, 6, 1)
    );
    assert!(!picker.is_open());
  }

  #[test]
  fn month_back_stops_at_current_month() {
    let today = day(2024, 6, 15);
    let mut picker = DatePicker::default();
    picker.toggle(
      1,
      DateField::Start,
      anchor(),
      day(2024, 8, 3)
    );

    assert!(picker.prev_month(today));
    assert!(picker.prev_month(today));
    assert!(!picker.can_go_prev(today));
    assert!(!picker.prev_month(today));
    assert_eq!(
      picker.session().map(|s| s.cursor),
      Some(YearMonth::of(today))
    );

    picker.next_month();
    assert!(picker.can_go_prev(today));
  }

  #[test]
  fn past_seed_cannot_go_further_back() {
    let today = day(2024, 6, 15);
    let mut picker = DatePicker::default();
    picker.toggle(
      1,
      DateField::Start,
      anchor(),
      day(2024, 3, 1)
    );
    assert!(!picker.can_go_prev(today));
  }

  #[test]
  fn grid_has_leading_blanks_and_today() {
    let mut picker = DatePicker::default();
    picker.toggle(
      1,
      DateField::Start,
      anchor(),
      day(2024, 6, 20)
    );
    let grid = picker
      .grid(day(2024, 6, 20), Weekday::Sun)
      .expect("open picker grid");

    // June 1st 2024 is a Saturday.
    assert_eq!(grid.leading_blanks, 6);
    assert_eq!(grid.days.len(), 30);
    assert_eq!(
      grid
        .days
        .iter()
        .filter(|d| d.is_today)
        .count(),
      1
    );
    assert!(!grid.can_go_prev);

    let monday = picker
      .grid(day(2024, 6, 20), Weekday::Mon)
      .expect("grid");
    assert_eq!(monday.leading_blanks, 5);
    assert!(
      DatePicker::Closed
        .grid(day(2024, 6, 20), Weekday::Sun)
        .is_none()
    );
  }

  #[test]
  fn select_applies_and_closes() {
    let mut book = TaskBook::default();
    let id = book
      .create("report", day(2024, 6, 1))
      .expect("created");
    let mut picker = DatePicker::default();
    picker.toggle(
      id,
      DateField::Start,
      anchor(),
      seed_date(
        &book,
        id,
        DateField::Start,
        day(2024, 6, 1)
      )
    );

    let picked = picker
      .select(&mut book, day(2024, 6, 10))
      .expect("select start");
    assert_eq!(
      picked,
      Some(Picked {
        task_id: id,
        field:   DateField::Start,
        date:    day(2024, 6, 10)
      })
    );
    assert!(!picker.is_open());
    let task = book.get(id).expect("task");
    assert_eq!(task.due_date, day(2024, 6, 10));
  }

  #[test]
  fn rejected_due_date_keeps_picker_open() {
    let mut book = TaskBook::default();
    let id = book
      .create("report", day(2024, 6, 5))
      .expect("created");
    let mut picker = DatePicker::default();
    picker.toggle(
      id,
      DateField::Due,
      anchor(),
      day(2024, 6, 5)
    );

    let err = picker
      .select(&mut book, day(2024, 6, 1))
      .expect_err("rejected");
    assert!(matches!(
      err,
      EditError::DueBeforeStart { .. }
    ));
    assert!(
      picker.is_editing(id, DateField::Due)
    );
    assert_eq!(
      book.get(id).map(|t| t.due_date),
      Some(day(2024, 6, 5))
    );
  }

  #[test]
  fn missing_task_closes_picker() {
    let mut book = TaskBook::default();
    let mut picker = DatePicker::default();
    picker.toggle(
      42,
      DateField::Start,
      anchor(),
      seed_date(
        &book,
        42,
        DateField::Start,
        day(2024, 6, 9)
      )
    );
    assert_eq!(
      picker.session().map(|s| s.cursor),
      Some(YearMonth::of(day(2024, 6, 9)))
    );

    assert_eq!(
      picker
        .select(&mut book, day(2024, 6, 1)),
      Err(EditError::NotFound(42))
    );
    assert!(!picker.is_open());
    assert_eq!(
      DatePicker::Closed
        .select(&mut book, day(2024, 6, 1)),
      Ok(None)
    );
  }
}
