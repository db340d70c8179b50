use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Reporting window selected on the dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PeriodFilter {
    All,
    Year(i32),
    Month { year: i32, month: u32 },
}

impl PeriodFilter {
    /// Month filter; out-of-range months fall back to the whole year.
    pub fn month(year: i32, month: u32) -> Self {
        if (1..=12).contains(&month) {
            PeriodFilter::Month { year, month }
        } else {
            PeriodFilter::Year(year)
        }
    }

    /// First day of the window; `None` for the unbounded filter.
    pub fn start(&self) -> Option<NaiveDate> {
        match *self {
            PeriodFilter::All => None,
            PeriodFilter::Year(year) => NaiveDate::from_ymd_opt(year, 1, 1),
            PeriodFilter::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1),
        }
    }

    /// Last day of the window, inclusive; `None` for the unbounded filter.
    pub fn cutoff(&self) -> Option<NaiveDate> {
        match *self {
            PeriodFilter::All => None,
            PeriodFilter::Year(year) => NaiveDate::from_ymd_opt(year, 12, 31),
            PeriodFilter::Month { year, month } => {
                let (next_year, next_month) = if month == 12 {
                    (year + 1, 1)
                } else {
                    (year, month + 1)
                };
                NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|d| d.pred_opt())
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            PeriodFilter::All => true,
            PeriodFilter::Year(year) => date.year() == year,
            PeriodFilter::Month { year, month } => date.year() == year && date.month() == month,
        }
    }

    /// Strictly before the window start.
    pub fn is_before(&self, date: NaiveDate) -> bool {
        self.start().is_some_and(|start| date < start)
    }

    pub fn label(&self) -> String {
        match *self {
            PeriodFilter::All => "All periods".into(),
            PeriodFilter::Year(year) => format!("Year {}", year),
            PeriodFilter::Month { year, month } => format!("{}/{}", month_label(month), year),
        }
    }
}

pub fn month_label(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|index| MONTH_LABELS.get(index as usize))
        .copied()
        .unwrap_or("")
}
