use std::collections::BTreeSet;
use std::rc::Rc;

use chrono::NaiveDate;
use tracing::{
  debug,
  info
};

use crate::book::TaskBook;
use crate::calendar::{
  CalendarCallbacks,
  CalendarRender,
  CalendarRenderer,
  project_events
};
use crate::config::{
  Config,
  Locale
};
use crate::datetime::{
  add_days,
  format_day_heading
};
use crate::filter::Filter;
use crate::navigation::{
  CalendarArrival,
  ListArrival
};
use crate::picker::{
  Anchor,
  DatePicker,
  seed_date
};
use crate::task::{
  DateField,
  Task
};

/// UI state of the list page. Lives only as long as the page is mounted.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
  pub selected_day: NaiveDate,
  pub filter:       Filter,
  pub expanded:     BTreeSet<u64>,
  pub picker:       DatePicker,
  pub draft:        String
}

impl ListView {
  pub fn new(today: NaiveDate) -> Self {
    Self {
      selected_day: today,
      filter:       Filter::All,
      expanded:     BTreeSet::new(),
      picker:       DatePicker::Closed,
      draft:        String::new()
    }
  }

  pub fn step_day(&mut self, days: i64) {
    self.selected_day =
      add_days(self.selected_day, days);
  }

  pub fn heading(
    &self,
    locale: Locale
  ) -> String {
    format_day_heading(
      self.selected_day,
      locale
    )
  }

  pub fn visible<'a>(
    &self,
    book: &'a TaskBook
  ) -> Vec<&'a Task> {
    book.filtered(self.filter)
  }

  /// Returns whether the task is expanded afterwards.
  pub fn toggle_expand(
    &mut self,
    task_id: u64
  ) -> bool {
    if self.expanded.remove(&task_id) {
      false
    } else {
      self.expanded.insert(task_id);
      true
    }
  }

  pub fn is_expanded(
    &self,
    task_id: u64
  ) -> bool {
    self.expanded.contains(&task_id)
  }

  /// Creates a task from the draft text. The draft is cleared only when a
  /// task was created.
  pub fn submit(
    &mut self,
    book: &mut TaskBook,
    today: NaiveDate
  ) -> Option<u64> {
    let id =
      book.create(&self.draft, today)?;
    self.draft.clear();
    Some(id)
  }

  /// Opens (or closes) the date popup for a task field. Trashed tasks keep
  /// their date fields locked.
  pub fn open_picker(
    &mut self,
    book: &TaskBook,
    task_id: u64,
    field: DateField,
    anchor: Anchor
  ) {
    if book
      .get(task_id)
      .is_some_and(|task| task.deleted)
    {
      debug!(task_id, "date fields of trashed tasks are locked");
      return;
    }

    let seed = seed_date(
      book,
      task_id,
      field,
      self.selected_day
    );
    self
      .picker
      .toggle(task_id, field, anchor, seed);
  }

  pub fn apply_arrival(
    &mut self,
    arrival: &ListArrival
  ) {
    if let Some(day) =
      arrival.selected_day()
    {
      self.selected_day = day;
    }
    if let Some(id) =
      arrival.expand_todo_id
    {
      self.expanded.insert(id);
    }
    debug!(?arrival, "applied list arrival");
  }

  pub fn to_calendar(
    &mut self
  ) -> CalendarArrival {
    self.picker.close();
    CalendarArrival::at(
      self.selected_day
    )
  }
}

/// State of the calendar page: the day it was opened on.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct CalendarView {
  pub initial_date: NaiveDate
}

impl CalendarView {
  pub fn from_arrival(
    arrival: Option<&CalendarArrival>,
    today: NaiveDate
  ) -> Self {
    Self {
      initial_date: arrival
        .and_then(
          CalendarArrival::initial_day
        )
        .unwrap_or(today)
    }
  }

  pub fn on_date_click(
    &self,
    date: NaiveDate
  ) -> ListArrival {
    ListArrival::day(date)
  }

  /// Unknown or trashed ids produce no navigation.
  pub fn on_event_click(
    &self,
    event_id: &str,
    tasks: &[Task]
  ) -> Option<ListArrival> {
    let id: u64 = event_id.parse().ok()?;
    let task = tasks
      .iter()
      .find(|t| t.id == id && !t.deleted);
    if task.is_none() {
      debug!(event_id, "event click for unknown task");
    }
    task.map(|t| {
      ListArrival::expanding(
        t.start_date,
        t.id
      )
    })
  }

  pub fn back_to_list(
    &self
  ) -> ListArrival {
    ListArrival::day(self.initial_date)
  }

  pub fn render_request(
    &self,
    tasks: &[Task],
    config: &Config,
    today: NaiveDate
  ) -> CalendarRender {
    CalendarRender {
      events: project_events(
        tasks,
        &config.event_style()
      ),
      initial_date: self.initial_date,
      today,
      day_max_events: config
        .calendar
        .day_max_events,
      week_start: config.week_start(),
      locale: config.locale
    }
  }

  /// Hands the projected events to `renderer`, wiring its click callbacks
  /// back into list-view arrivals for `navigate`.
  pub fn mount(
    &self,
    renderer: &mut dyn CalendarRenderer,
    tasks: &[Task],
    config: &Config,
    today: NaiveDate,
    navigate: Rc<dyn Fn(ListArrival)>
  ) {
    let request = self.render_request(
      tasks, config, today
    );
    info!(
      events = request.events.len(),
      initial = %self.initial_date,
      "mounting calendar"
    );

    let view = *self;
    let snapshot: Vec<Task> = tasks
      .iter()
      .filter(|t| !t.deleted)
      .cloned()
      .collect();
    let on_date = Rc::clone(&navigate);
    let callbacks = CalendarCallbacks {
      on_date_click:  Box::new(
        move |date: NaiveDate| {
          on_date(view.on_date_click(date))
        }
      ),
      on_event_click: Box::new(
        move |event_id: String| {
          if let Some(arrival) = view
            .on_event_click(
              &event_id, &snapshot
            )
          {
            navigate(arrival);
          }
        }
      )
    };

    renderer.render(request, callbacks);
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;

  use super::*;
  use crate::book::EditError;

  fn day(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[derive(Default)]
  struct RecordingRenderer {
    mounted: Option<(
      CalendarRender,
      CalendarCallbacks
    )>,
    disposed: bool
  }

  impl CalendarRenderer for RecordingRenderer {
    fn render(
      &mut self,
      request: CalendarRender,
      callbacks: CalendarCallbacks
    ) {
      self.mounted =
        Some((request, callbacks));
    }

    fn dispose(&mut self) {
      self.mounted = None;
      self.disposed = true;
    }
  }

  #[test]
  fn day_cursor_steps_across_months() {
    let mut view =
      ListView::new(day(2024, 6, 30));
    view.step_day(1);
    assert_eq!(
      view.selected_day,
      day(2024, 7, 1)
    );
    view.step_day(-2);
    assert_eq!(
      view.selected_day,
      day(2024, 6, 29)
    );
    assert_eq!(
      view.heading(Locale::Ja),
      "2024年6月29日（土）"
    );
  }

  #[test]
  fn submit_clears_draft_only_on_create() {
    let mut book = TaskBook::default();
    let mut view =
      ListView::new(day(2024, 6, 1));

    view.draft = "  ".to_string();
    assert_eq!(
      view.submit(&mut book, day(2024, 6, 1)),
      None
    );
    assert_eq!(view.draft, "  ");

    view.draft = "Buy milk".to_string();
    assert_eq!(
      view.submit(&mut book, day(2024, 6, 1)),
      Some(1)
    );
    assert!(view.draft.is_empty());
  }

  #[test]
  fn trashed_tasks_do_not_open_picker() {
    let mut book = TaskBook::default();
    let id = book
      .create("old", day(2024, 6, 1))
      .expect("created");
    book.toggle_deleted(id).expect("trash");

    let mut view =
      ListView::new(day(2024, 6, 1));
    view.open_picker(
      &book,
      id,
      DateField::Start,
      Anchor::default()
    );
    assert!(!view.picker.is_open());
  }

  #[test]
  fn picker_rejection_leaves_dates_ordered() {
    let mut book = TaskBook::default();
    let id = book
      .create("report", day(2024, 6, 5))
      .expect("created");
    let mut view =
      ListView::new(day(2024, 6, 5));
    view.open_picker(
      &book,
      id,
      DateField::Due,
      Anchor::default()
    );

    let result = view
      .picker
      .select(&mut book, day(2024, 6, 1));
    assert!(matches!(
      result,
      Err(EditError::DueBeforeStart { .. })
    ));
    let task = book.get(id).expect("task");
    assert!(task.start_date <= task.due_date);
  }

  #[test]
  fn list_to_calendar_and_back() {
    let mut list =
      ListView::new(day(2024, 6, 1));
    list.step_day(3);
    list.picker = DatePicker::Open(
      crate::picker::PickerSession {
        task_id: 1,
        field:   DateField::Start,
        anchor:  Anchor::default(),
        cursor:
          crate::datetime::YearMonth::of(
            day(2024, 6, 1)
          )
      }
    );

    let arrival = list.to_calendar();
    assert!(!list.picker.is_open());

    let calendar =
      CalendarView::from_arrival(
        Some(&arrival),
        day(2030, 1, 1)
      );
    assert_eq!(
      calendar.initial_date,
      day(2024, 6, 4)
    );

    let mut fresh =
      ListView::new(day(2030, 1, 1));
    fresh.apply_arrival(
      &calendar.back_to_list()
    );
    assert_eq!(
      fresh.selected_day,
      day(2024, 6, 4)
    );
    assert!(fresh.expanded.is_empty());
  }

  #[test]
  fn calendar_without_arrival_opens_today() {
    let today = day(2024, 6, 15);
    assert_eq!(
      CalendarView::from_arrival(
        None, today
      )
      .initial_date,
      today
    );
    let bogus = CalendarArrival {
      initial_date: Some(
        "not a date".to_string()
      )
    };
    assert_eq!(
      CalendarView::from_arrival(
        Some(&bogus),
        today
      )
      .initial_date,
      today
    );
  }

  #[test]
  fn event_click_expands_task() {
    let mut book = TaskBook::default();
    let id = book
      .create("report", day(2024, 6, 3))
      .expect("created");
    let calendar = CalendarView {
      initial_date: day(2024, 6, 1)
    };

    let arrival = calendar
      .on_event_click(
        &id.to_string(),
        book.tasks()
      )
      .expect("arrival");
    assert_eq!(
      arrival,
      ListArrival::expanding(
        day(2024, 6, 3),
        id
      )
    );
    assert_eq!(
      calendar
        .on_event_click("99", book.tasks()),
      None
    );
    assert_eq!(
      calendar
        .on_event_click("x", book.tasks()),
      None
    );

    let mut list =
      ListView::new(day(2024, 6, 1));
    list.apply_arrival(&arrival);
    assert!(list.is_expanded(id));
    assert_eq!(
      list.selected_day,
      day(2024, 6, 3)
    );
    assert!(!list.toggle_expand(id));
    assert!(!list.is_expanded(id));
  }

  #[test]
  fn mount_wires_callbacks_to_navigation() {
    let mut book = TaskBook::default();
    let id = book
      .create("report", day(2024, 6, 3))
      .expect("created");
    let trashed = book
      .create("gone", day(2024, 6, 3))
      .expect("created");
    book.toggle_deleted(trashed).expect("trash");

    let calendar = CalendarView {
      initial_date: day(2024, 6, 1)
    };
    let seen: Rc<RefCell<Vec<ListArrival>>> =
      Rc::default();
    let sink = Rc::clone(&seen);
    let navigate: Rc<dyn Fn(ListArrival)> =
      Rc::new(move |arrival: ListArrival| {
        sink.borrow_mut().push(arrival)
      });

    let mut renderer =
      RecordingRenderer::default();
    calendar.mount(
      &mut renderer,
      book.tasks(),
      &Config::default(),
      day(2024, 6, 1),
      navigate
    );

    let (request, callbacks) = renderer
      .mounted
      .as_ref()
      .expect("rendered");
    assert_eq!(request.events.len(), 1);
    assert_eq!(request.day_max_events, 3);

    (callbacks.on_date_click)(day(2024, 6, 9));
    (callbacks.on_event_click)(id.to_string());
    (callbacks.on_event_click)(
      trashed.to_string()
    );

    assert_eq!(
      *seen.borrow(),
      vec![
        ListArrival::day(day(2024, 6, 9)),
        ListArrival::expanding(
          day(2024, 6, 3),
          id
        ),
      ]
    );

    renderer.dispose();
    assert!(renderer.disposed);
    assert!(renderer.mounted.is_none());
  }
}
