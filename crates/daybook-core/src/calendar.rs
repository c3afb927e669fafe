use chrono::{
  Datelike,
  NaiveDate,
  Weekday
};
use serde::{
  Deserialize,
  Serialize
};
use tracing::debug;

use crate::config::Locale;
use crate::datetime::{
  YearMonth,
  add_days,
  start_of_week
};
use crate::task::Task;

const GRID_CELLS: i64 = 42;

#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct EventStyle {
  pub title_prefix: String,
  pub background:   String,
  pub border:       String,
  pub text:         String
}

impl Default for EventStyle {
  fn default() -> Self {
    crate::config::Config::default()
      .event_style()
  }
}

/// An all-day event as the month widget consumes it. `end` is exclusive.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
  pub id:               String,
  pub title:            String,
  pub start:            NaiveDate,
  pub end:              NaiveDate,
  pub all_day:          bool,
  pub background_color: String,
  pub border_color:     String,
  pub text_color:       String
}

impl CalendarEvent {
  pub fn covers(
    &self,
    day: NaiveDate
  ) -> bool {
    self.start <= day && day < self.end
  }

  pub fn task_id(&self) -> Option<u64> {
    self.id.parse().ok()
  }
}

/// One event per task still out of the trash, spanning its start and due
/// dates inclusive.
#[tracing::instrument(skip(
  tasks, style
))]
pub fn project_events(
  tasks: &[Task],
  style: &EventStyle
) -> Vec<CalendarEvent> {
  let events: Vec<CalendarEvent> = tasks
    .iter()
    .filter(|task| !task.deleted)
    .map(|task| {
      let last =
        task.due_date.max(task.start_date);
      CalendarEvent {
        id:               task
          .id
          .to_string(),
        title:            format!(
          "{}{}",
          style.title_prefix, task.title
        ),
        start:            task.start_date,
        end:              add_days(last, 1),
        all_day:          true,
        background_color: style
          .background
          .clone(),
        border_color:     style
          .border
          .clone(),
        text_color:       style
          .text
          .clone()
      }
    })
    .collect();
  debug!(
    tasks = tasks.len(),
    events = events.len(),
    "projected calendar events"
  );
  events
}

/// Everything a month widget needs to draw the calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarRender {
  pub events:         Vec<CalendarEvent>,
  pub initial_date:   NaiveDate,
  pub today:          NaiveDate,
  pub day_max_events: usize,
  pub week_start:     Weekday,
  pub locale:         Locale
}

pub struct CalendarCallbacks {
  pub on_date_click:  Box<dyn Fn(NaiveDate)>,
  pub on_event_click: Box<dyn Fn(String)>
}

impl std::fmt::Debug
  for CalendarCallbacks
{
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>
  ) -> std::fmt::Result {
    f.write_str("CalendarCallbacks")
  }
}

/// Rendering port for the month calendar. The core builds the events and
/// interprets the callbacks; drawing belongs to the implementation.
pub trait CalendarRenderer {
  fn render(
    &mut self,
    request: CalendarRender,
    callbacks: CalendarCallbacks
  );

  fn dispose(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
  pub date:     NaiveDate,
  pub weekday:  Weekday,
  pub in_month: bool,
  pub is_today: bool,
  pub events:   Vec<CalendarEvent>,
  pub overflow: usize
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthLayout {
  pub month: YearMonth,
  pub weeks: Vec<Vec<DayCell>>
}

impl MonthLayout {
  /// Six week rows starting on `week_start`. Each cell shows at most
  /// `day_max_events` events and counts the rest as overflow.
  pub fn build(
    month: YearMonth,
    week_start: Weekday,
    events: &[CalendarEvent],
    day_max_events: usize,
    today: NaiveDate
  ) -> Self {
    let grid_start = start_of_week(
      month.first_day(),
      week_start
    );

    let cells: Vec<DayCell> = (0
      ..GRID_CELLS)
      .map(|offset| {
        let date =
          add_days(grid_start, offset);
        let mut covering: Vec<
          CalendarEvent
        > = events
          .iter()
          .filter(|event| {
            event.covers(date)
          })
          .cloned()
          .collect();
        let overflow = covering
          .len()
          .saturating_sub(day_max_events);
        covering.truncate(day_max_events);

        DayCell {
          date,
          weekday: date.weekday(),
          in_month: YearMonth::of(date)
            == month,
          is_today: date == today,
          events: covering,
          overflow
        }
      })
      .collect();

    Self {
      month,
      weeks: cells
        .chunks(7)
        .map(<[DayCell]>::to_vec)
        .collect()
    }
  }
}
