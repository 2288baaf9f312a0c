//! Monthly work statistics over task histories.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::{Result, ValidationError};
use crate::task::{round_hundredths, TaskRecord};

/// Work recorded on one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayWork {
    pub date: NaiveDate,
    pub minutes: f64,
}

impl DayWork {
    /// Hours rounded to one decimal.
    pub fn hours(&self) -> f64 {
        (self.minutes / 60.0 * 10.0).round() / 10.0
    }

    /// Day of month plus a two-letter weekday, e.g. `01mo`.
    pub fn label(&self) -> String {
        let weekday = match self.date.weekday() {
            Weekday::Mon => "mo",
            Weekday::Tue => "tu",
            Weekday::Wed => "we",
            Weekday::Thu => "th",
            Weekday::Fri => "fr",
            Weekday::Sat => "sa",
            Weekday::Sun => "su",
        };
        format!("{:02}{weekday}", self.date.day())
    }
}

/// Every day of one month with the minutes worked on it.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyWork {
    pub year: i32,
    pub month: u32,
    pub days: Vec<DayWork>,
}

impl MonthlyWork {
    pub fn total_minutes(&self) -> f64 {
        round_hundredths(self.days.iter().map(|d| d.minutes).sum())
    }

    /// English month name, e.g. `October`.
    pub fn month_name(&self) -> &'static str {
        const NAMES: [&str; 12] = [
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
            "December",
        ];
        NAMES[(self.month.clamp(1, 12) - 1) as usize]
    }
}

/// Sum history minutes per day of `year`/`month` across all tasks.
///
/// Returns `Ok(None)` when no task has history in that month.
///
/// # Errors
/// `InvalidValue` when `month` is not 1..=12 or the year is out of range.
pub fn minutes_by_date(tasks: &[TaskRecord], year: i32, month: u32) -> Result<Option<MonthlyWork>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        ValidationError::InvalidValue {
            field: "month".into(),
            message: format!("{year}-{month} is not a valid month"),
        }
    })?;

    let mut days: Vec<DayWork> = first
        .iter_days()
        .take_while(|d| d.month() == month)
        .map(|date| DayWork { date, minutes: 0.0 })
        .collect();

    let mut seen = false;
    for task in tasks {
        for (date, sessions) in &task.history {
            if date.year() != year || date.month() != month {
                continue;
            }
            seen = true;
            let index = (date.day() - 1) as usize;
            if let Some(day) = days.get_mut(index) {
                day.minutes += sessions.iter().map(|s| s.minutes).sum::<f64>();
            }
        }
    }
    if !seen {
        return Ok(None);
    }

    for day in &mut days {
        day.minutes = round_hundredths(day.minutes);
    }
    Ok(Some(MonthlyWork { year, month, days }))
}
