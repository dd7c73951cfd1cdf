//! Age arithmetic on calendar dates.
//!
//! Differences truncate toward zero, counting a unit only once it has fully elapsed. Adding a
//! month clamps to the end of a shorter month, so 31 January to 28 February is one month.

use crate::observation::{Duration, DurationUnit};
use chrono::{Datelike, Months, NaiveDate};

/// Whole months from `from` to `to` (negative when `to` is earlier).
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    if to < from {
        return -months_between(to, from);
    }
    let raw = i64::from(to.year() - from.year()) * 12 + i64::from(to.month())
        - i64::from(from.month());
    let mut months = raw.max(0);
    while months > 0 && add_months(from, months).map_or(true, |anchor| anchor > to) {
        months -= 1;
    }
    months
}

fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let months = u32::try_from(months).ok()?;
    date.checked_add_months(Months::new(months))
}

/// Whole years from `from` to `to`.
pub fn years_between(from: NaiveDate, to: NaiveDate) -> i64 {
    months_between(from, to) / 12
}

/// Whole weeks from `from` to `to`.
pub fn weeks_between(from: NaiveDate, to: NaiveDate) -> i64 {
    days_between(from, to) / 7
}

pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Human-readable age on `today` of someone born on `date_of_birth`.
///
/// Under one year the age is given in weeks (days in the first week), under two years in months,
/// from two to six years in years and months, and in years after that.
pub fn display_age(date_of_birth: NaiveDate, today: NaiveDate) -> String {
    let years = years_between(date_of_birth, today);
    if years < 1 {
        let weeks = weeks_between(date_of_birth, today);
        if weeks == 0 {
            return in_unit(days_between(date_of_birth, today), DurationUnit::Days);
        }
        return in_unit(weeks, DurationUnit::Weeks);
    }
    if years < 2 {
        return in_unit(months_between(date_of_birth, today), DurationUnit::Months);
    }
    if years < 6 {
        let months = months_between(date_of_birth, today) % 12;
        let years = in_unit(years, DurationUnit::Years);
        if months == 0 {
            return years;
        }
        return format!("{years} {}", in_unit(months, DurationUnit::Months));
    }
    in_unit(years, DurationUnit::Years)
}

fn in_unit(value: i64, unit: DurationUnit) -> String {
    Duration::new(value as f64, unit).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
    }

    fn today() -> NaiveDate {
        date("2023-06-13")
    }

    #[test]
    fn years_and_months_between_two_and_six() {
        assert_eq!(display_age(date("2021-04-15"), today()), "2 years 1 month");
    }

    #[test]
    fn whole_years_omit_months() {
        assert_eq!(display_age(date("2020-06-13"), today()), "3 years");
    }

    #[test]
    fn months_under_two_years() {
        assert_eq!(display_age(date("2021-07-10"), today()), "23 months");
    }

    #[test]
    fn years_over_six() {
        assert_eq!(display_age(date("2015-07-10"), today()), "7 years");
    }

    #[test]
    fn weeks_then_days_under_one_year() {
        assert_eq!(display_age(date("2023-05-30"), today()), "2 weeks");
        assert_eq!(display_age(date("2023-06-10"), today()), "3 days");
        assert_eq!(display_age(date("2023-06-12"), today()), "1 day");
    }

    #[test]
    fn month_end_clamps() {
        assert_eq!(months_between(date("2023-01-31"), date("2023-02-28")), 1);
        assert_eq!(months_between(date("2023-01-31"), date("2023-02-27")), 0);
        assert_eq!(months_between(date("2023-03-15"), date("2023-01-20")), -1);
    }

    #[test]
    fn years_truncate() {
        assert_eq!(years_between(date("2000-06-14"), today()), 22);
        assert_eq!(years_between(date("2000-06-13"), today()), 23);
    }
}
