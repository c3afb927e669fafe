mod date_picker;
mod month_grid;
mod task_row;

use chrono::Weekday;
use daybook_core::config::Locale;

pub use self::date_picker::DatePickerPopup;
pub use self::month_grid::{
  MonthGrid,
  MountedCalendar
};
pub use self::task_row::TaskRow;

/// Fixed interface strings for one locale.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct UiText {
  pub prev_day:         &'static str,
  pub next_day:         &'static str,
  pub to_calendar:      &'static str,
  pub to_list:          &'static str,
  pub add:              &'static str,
  pub empty_trash:      &'static str,
  pub progress:         &'static str,
  pub start_date:       &'static str,
  pub due_date:         &'static str,
  pub edit:             &'static str,
  pub delete:           &'static str,
  pub restore:          &'static str,
  pub today:            &'static str,
  pub loading:          &'static str,
  pub due_before_start: &'static str
}

pub fn ui_text(locale: Locale) -> UiText {
  match locale {
    | Locale::Ja => {
      UiText {
        prev_day:         "前の日",
        next_day:         "次の日",
        to_calendar:      "カレンダーに戻る",
        to_list:          "リストに戻る",
        add:              "追加",
        empty_trash:      "🗑️ ごみ箱を空にする",
        progress:         "進捗率",
        start_date:       "開始日",
        due_date:         "完了予定日",
        edit:             "編集",
        delete:           "削除",
        restore:          "復元",
        today:            "今日",
        loading:          "読み込み中…",
        due_before_start: "完了予定日は開始日以降の日付を選択してください"
      }
    }
    | Locale::En => {
      UiText {
        prev_day:         "Previous day",
        next_day:         "Next day",
        to_calendar:      "Calendar",
        to_list:          "Back to list",
        add:              "Add",
        empty_trash:      "🗑️ Empty trash",
        progress:         "Progress",
        start_date:       "Start",
        due_date:         "Due",
        edit:             "Edit",
        delete:           "Delete",
        restore:          "Restore",
        today:            "Today",
        loading:          "Loading…",
        due_before_start: "Pick a due date on or after the start date"
      }
    }
  }
}

/// Sundays and Saturdays get their own colour in both calendars.
pub fn weekday_class(
  weekday: Weekday
) -> Option<&'static str> {
  match weekday {
    | Weekday::Sun => Some("sunday"),
    | Weekday::Sat => Some("saturday"),
    | _ => None
  }
}
