use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Progress values offered by the editor. The model itself accepts any value.
pub const PROGRESS_STEPS: [u32; 11] = [0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100];

pub const PROGRESS_DONE: u32 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DateField {
    Start,
    Due,
}

/// A single to-do item. Field names on the wire match the records written by
/// earlier releases of the browser app, so existing storage keeps loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub title: String,

    pub id: u64,

    #[serde(default)]
    pub progress: u32,

    pub start_date: NaiveDate,

    pub due_date: NaiveDate,

    #[serde(default)]
    pub detail: String,

    #[serde(default, rename = "delete_flg", alias = "deleted")]
    pub deleted: bool,
}

impl Task {
    pub fn new(title: String, id: u64, today: NaiveDate) -> Self {
        Self {
            title,
            id,
            progress: 0,
            start_date: today,
            due_date: today,
            detail: String::new(),
            deleted: false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.progress == PROGRESS_DONE
    }

    pub fn date(&self, field: DateField) -> NaiveDate {
        match field {
            DateField::Start => self.start_date,
            DateField::Due => self.due_date,
        }
    }
}
