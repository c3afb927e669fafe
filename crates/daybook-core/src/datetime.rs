use std::fmt;

use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};

use crate::config::Locale;

const ISO_DATE: &str = "%Y-%m-%d";

const MONTH_NAMES_EN: [&str; 12] = [
  "January",
  "February",
  "March",
  "April",
  "May",
  "June",
  "July",
  "August",
  "September",
  "October",
  "November",
  "December"
];

#[must_use]
pub fn today_in(tz: Tz) -> NaiveDate {
  Utc::now()
    .with_timezone(&tz)
    .date_naive()
}

/// Accepts `YYYY-MM-DD`, or a longer ISO timestamp whose first ten
/// characters are one.
pub fn parse_iso_date(
  raw: &str
) -> Option<NaiveDate> {
  let trimmed = raw.trim();
  let head = trimmed
    .get(..10)
    .filter(|_| {
      trimmed.len() == 10
        || trimmed[10..]
          .starts_with(['T', ' '])
    })?;
  NaiveDate::parse_from_str(
    head, ISO_DATE
  )
  .ok()
}

#[must_use]
pub fn format_iso_date(
  date: NaiveDate
) -> String {
  date.format(ISO_DATE).to_string()
}

pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}

pub fn first_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .unwrap_or(NaiveDate::MIN)
}

pub fn last_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  add_days(
    first_day_of_month(
      next_year, next_month
    ),
    -1
  )
}

pub fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  last_day_of_month(year, month).day()
}

pub fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let day_idx = day
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = week_start
    .num_days_from_monday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}

/// A calendar month without a day component, used as the cursor of the
/// month grids.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
)]
pub struct YearMonth {
  pub year:  i32,
  pub month: u32
}

impl YearMonth {
  pub fn of(date: NaiveDate) -> Self {
    Self {
      year:  date.year(),
      month: date.month()
    }
  }

  pub fn shift(
    self,
    months: i32
  ) -> Self {
    let index = self.year as i64 * 12
      + (self.month as i64 - 1)
      + months as i64;
    Self {
      year:  index.div_euclid(12) as i32,
      month: index.rem_euclid(12) as u32
        + 1
    }
  }

  pub fn first_day(self) -> NaiveDate {
    first_day_of_month(
      self.year, self.month
    )
  }

  pub fn day_count(self) -> u32 {
    days_in_month(self.year, self.month)
  }

  pub fn label(
    self,
    locale: Locale
  ) -> String {
    match locale {
      | Locale::Ja => {
        format!(
          "{}年{}月",
          self.year, self.month
        )
      }
      | Locale::En => {
        let name = MONTH_NAMES_EN
          [(self.month as usize)
            .saturating_sub(1)
            .min(11)];
        format!("{name} {}", self.year)
      }
    }
  }
}

impl fmt::Display for YearMonth {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{:04}-{:02}",
      self.year, self.month
    )
  }
}

pub fn weekday_short_label(
  weekday: Weekday,
  locale: Locale
) -> &'static str {
  match locale {
    | Locale::Ja => {
      match weekday {
        | Weekday::Sun => "日",
        | Weekday::Mon => "月",
        | Weekday::Tue => "火",
        | Weekday::Wed => "水",
        | Weekday::Thu => "木",
        | Weekday::Fri => "金",
        | Weekday::Sat => "土"
      }
    }
    | Locale::En => {
      match weekday {
        | Weekday::Sun => "Su",
        | Weekday::Mon => "Mo",
        | Weekday::Tue => "Tu",
        | Weekday::Wed => "We",
        | Weekday::Thu => "Th",
        | Weekday::Fri => "Fr",
        | Weekday::Sat => "Sa"
      }
    }
  }
}

pub fn weekday_labels(
  week_start: Weekday,
  locale: Locale
) -> Vec<&'static str> {
  (0..7)
    .scan(week_start, |day, _| {
      let current = *day;
      *day = day.succ();
      Some(weekday_short_label(
        current, locale
      ))
    })
    .collect()
}

/// Heading shown above the list view for the cursor day.
pub fn format_day_heading(
  date: NaiveDate,
  locale: Locale
) -> String {
  match locale {
    | Locale::Ja => {
      format!(
        "{}年{}月{}日（{}）",
        date.year(),
        date.month(),
        date.day(),
        weekday_short_label(
          date.weekday(),
          locale
        )
      )
    }
    | Locale::En => {
      date
        .format("%A, %B %-d, %Y")
        .to_string()
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

  #[test]
  fn parses_dates_and_timestamps() {
    assert_eq!(
      parse_iso_date("2024-06-01"),
      Some(day(2024, 6, 1))
    );
    assert_eq!(
      parse_iso_date(
        "2024-06-01T09:30:00Z"
      ),
      Some(day(2024, 6, 1))
    );
    assert_eq!(
      parse_iso_date("2024-6-1"),
      None
    );
    assert_eq!(
      parse_iso_date("2024-06-011"),
      None
    );
    assert_eq!(
      parse_iso_date("tomorrow"),
      None
    );
  }

  #[test]
  fn add_days_crosses_month_and_year() {
    assert_eq!(
      add_days(day(2024, 2, 28), 1),
      day(2024, 2, 29)
    );
    assert_eq!(
      add_days(day(2024, 12, 31), 1),
      day(2025, 1, 1)
    );
    assert_eq!(
      add_days(day(2024, 1, 1), -1),
      day(2023, 12, 31)
    );
  }

  #[test]
  fn year_month_shift_wraps() {
    let jan = YearMonth {
      year:  2024,
      month: 1
    };
    assert_eq!(
      jan.shift(-1),
      YearMonth {
        year:  2023,
        month: 12
      }
    );
    assert_eq!(
      jan.shift(13),
      YearMonth {
        year:  2025,
        month: 2
      }
    );
    assert_eq!(jan.to_string(), "2024-01");
    assert_eq!(
      YearMonth::of(day(2024, 2, 10))
        .day_count(),
      29
    );
  }

  #[test]
  fn start_of_week_respects_week_start() {
    // 2024-06-05 is a Wednesday.
    assert_eq!(
      start_of_week(
        day(2024, 6, 5),
        Weekday::Sun
      ),
      day(2024, 6, 2)
    );
    assert_eq!(
      start_of_week(
        day(2024, 6, 5),
        Weekday::Mon
      ),
      day(2024, 6, 3)
    );
  }

  #[test]
  fn headings_are_localized() {
    assert_eq!(
      format_day_heading(
        day(2024, 6, 1),
        Locale::Ja
      ),
      "2024年6月1日（土）"
    );
    assert_eq!(
      format_day_heading(
        day(2024, 6, 1),
        Locale::En
      ),
      "Saturday, June 1, 2024"
    );
    assert_eq!(
      YearMonth::of(day(2024, 6, 1))
        .label(Locale::En),
      "June 2024"
    );
  }

  #[test]
  fn weekday_labels_rotate() {
    assert_eq!(
      weekday_labels(
        Weekday::Sun,
        Locale::En
      ),
      vec![
        "Su", "Mo", "Tu", "We", "Th",
        "Fr", "Sa"
      ]
    );
    assert_eq!(
      weekday_labels(
        Weekday::Mon,
        Locale::Ja
      )[6],
      "日"
    );
  }
}
