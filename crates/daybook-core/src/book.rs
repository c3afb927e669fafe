use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::filter::Filter;
use crate::task::{DateField, Task};

/// Counter value of a book that has never handed out an id.
pub const INITIAL_COUNTER: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("task {0} not found")]
    NotFound(u64),

    #[error("due date {due} is before start date {start}")]
    DueBeforeStart { start: NaiveDate, due: NaiveDate },

    #[error("task {0} is in the trash")]
    Trashed(u64),
}

/// A single field change requested by the list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEdit {
    Title(String),
    Progress(u32),
    Detail(String),
    StartDate(NaiveDate),
    DueDate(NaiveDate),
    Deleted(bool),
}

impl TaskEdit {
    pub fn date(field: DateField, date: NaiveDate) -> Self {
        match field {
            DateField::Start => Self::StartDate(date),
            DateField::Due => Self::DueDate(date),
        }
    }
}

/// The task collection plus its id counter, newest task first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskBook {
    tasks: Vec<Task>,
    next_id: u64,
}

impl Default for TaskBook {
    fn default() -> Self {
        Self {
            tasks: vec![],
            next_id: INITIAL_COUNTER,
        }
    }
}

impl TaskBook {
    /// Builds a book from persisted parts. A counter that lags behind the
    /// highest stored id (lost counter write) is raised past it.
    pub fn from_parts(tasks: Vec<Task>, counter: Option<u64>) -> Self {
        let floor = tasks
            .iter()
            .map(|t| t.id)
            .max()
            .map_or(INITIAL_COUNTER, |max| max.saturating_add(1));
        let stored = counter.unwrap_or(INITIAL_COUNTER);
        if stored < floor {
            warn!(stored, floor, "id counter behind stored tasks; raising");
        }

        Self {
            tasks,
            next_id: stored.max(floor).max(INITIAL_COUNTER),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn filtered(&self, filter: Filter) -> Vec<&Task> {
        filter.apply(&self.tasks)
    }

    /// Prepends a new task. Blank titles are ignored; the title is kept as
    /// typed otherwise. Returns `None` once the id counter is exhausted.
    #[tracing::instrument(skip(self, title))]
    pub fn create(&mut self, title: &str, today: NaiveDate) -> Option<u64> {
        if title.trim().is_empty() {
            debug!("ignoring blank task title");
            return None;
        }

        let id = self.next_id;
        let Some(next_id) = id.checked_add(1) else {
            warn!(id, "id counter exhausted; refusing to create task");
            return None;
        };
        self.tasks.insert(0, Task::new(title.to_string(), id, today));
        self.next_id = next_id;
        debug!(id, next_id = self.next_id, "created task");
        Some(id)
    }

    #[tracing::instrument(skip(self, edit))]
    pub fn apply(&mut self, id: u64, edit: TaskEdit) -> Result<(), EditError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(EditError::NotFound(id))?;

        if task.deleted && !matches!(edit, TaskEdit::Deleted(_)) {
            return Err(EditError::Trashed(id));
        }

        match edit {
            TaskEdit::Title(title) => task.title = title,
            TaskEdit::Progress(progress) => task.progress = progress,
            TaskEdit::Detail(detail) => task.detail = detail,
            TaskEdit::Deleted(deleted) => task.deleted = deleted,
            TaskEdit::StartDate(date) => {
                if date > task.due_date {
                    debug!(id, %date, "start moved past due date; advancing due date");
                    task.due_date = date;
                }
                task.start_date = date;
            }
            TaskEdit::DueDate(date) => {
                if date < task.start_date {
                    return Err(EditError::DueBeforeStart {
                        start: task.start_date,
                        due: date,
                    });
                }
                task.due_date = date;
            }
        }

        Ok(())
    }

    pub fn set_date(&mut self, id: u64, field: DateField, date: NaiveDate) -> Result<(), EditError> {
        self.apply(id, TaskEdit::date(field, date))
    }

    /// Flips the soft-delete flag and returns the new value.
    pub fn toggle_deleted(&mut self, id: u64) -> Result<bool, EditError> {
        let deleted = !self.get(id).ok_or(EditError::NotFound(id))?.deleted;
        self.apply(id, TaskEdit::Deleted(deleted))?;
        Ok(deleted)
    }

    /// Drops every soft-deleted task. The counter is left untouched so purged
    /// ids are never handed out again.
    #[tracing::instrument(skip(self))]
    pub fn empty_trash(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.deleted);
        let purged = before - self.tasks.len();
        info!(before, after = self.tasks.len(), "emptied trash");
        purged
    }
}
