// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Calendar month keys and the trailing retention window.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::UptimeError;

/// Number of whole months before the current one that aggregation and
/// queries look at by default.
pub const DEFAULT_RETENTION_MONTHS: u32 = 12;

/// A calendar month in UTC, rendered as "YYYY-MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
	year: i32,
	month: u32,
}

impl YearMonth {
	pub fn new(year: i32, month: u32) -> Result<Self, UptimeError> {
		if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
			return Err(UptimeError::InvalidYearMonth(format!("{year:04}-{month:02}")));
		}
		Ok(Self { year, month })
	}

	/// Month of a wall-clock time. Use [`YearMonth::try_from_datetime`] for
	/// times that come from outside.
	pub fn from_datetime(time: DateTime<Utc>) -> Self {
		Self {
			year: time.year(),
			month: time.month(),
		}
	}

	/// Month of `time`, rejecting years that do not fit "YYYY".
	pub fn try_from_datetime(time: DateTime<Utc>) -> Result<Self, UptimeError> {
		Self::new(time.year(), time.month())
	}

	pub fn year(&self) -> i32 {
		self.year
	}

	pub fn month(&self) -> u32 {
		self.month
	}

	/// The month `months` calendar months before this one.
	pub fn minus_months(&self, months: u32) -> Self {
		let index = i64::from(self.year) * 12 + i64::from(self.month) - 1 - i64::from(months);
		Self {
			year: index.div_euclid(12) as i32,
			month: index.rem_euclid(12) as u32 + 1,
		}
	}

	/// Midnight UTC on the first day of the month.
	pub fn start_time(&self) -> DateTime<Utc> {
		NaiveDate::from_ymd_opt(self.year, self.month, 1)
			.and_then(|date| date.and_hms_opt(0, 0, 0))
			.map(|naive| Utc.from_utc_datetime(&naive))
			// month is always 1..=12 and the year is within chrono's range
			.unwrap_or(DateTime::<Utc>::MIN_UTC)
	}
}

impl fmt::Display for YearMonth {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:04}-{:02}", self.year, self.month)
	}
}

impl FromStr for YearMonth {
	type Err = UptimeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let invalid = || UptimeError::InvalidYearMonth(s.to_string());

		let (year, month) = s.split_once('-').ok_or_else(invalid)?;
		if year.len() != 4 || month.len() != 2 {
			return Err(invalid());
		}
		if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
			return Err(invalid());
		}

		let year: i32 = year.parse().map_err(|_| invalid())?;
		let month: u32 = month.parse().map_err(|_| invalid())?;
		Self::new(year, month).map_err(|_| invalid())
	}
}

impl TryFrom<String> for YearMonth {
	type Error = UptimeError;

	fn try_from(s: String) -> Result<Self, Self::Error> {
		s.parse()
	}
}

impl From<YearMonth> for String {
	fn from(month: YearMonth) -> Self {
		month.to_string()
	}
}

/// The trailing window of months covered by aggregation and queries.
///
/// Starts at the first day of the month `months` months before `now` and is
/// open-ended, so with the default of 12 it spans the twelve previous months
/// plus the current, partial one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionWindow {
	start: YearMonth,
}

impl RetentionWindow {
	pub fn new(now: DateTime<Utc>, months: u32) -> Self {
		Self {
			start: YearMonth::from_datetime(now).minus_months(months),
		}
	}

	pub fn start_month(&self) -> YearMonth {
		self.start
	}

	pub fn start_time(&self) -> DateTime<Utc> {
		self.start.start_time()
	}

	pub fn includes(&self, month: YearMonth) -> bool {
		month >= self.start
	}
}
