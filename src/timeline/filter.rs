//! Timeline filters.
//!
//! Filters work on a copy: the built timeline is never modified, so the
//! presentation layer can switch filters without rebuilding.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

use crate::core::task::{MemberId, SubsystemId};
use crate::error::{Error, Result};
use crate::timeline::entry::TimelineEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOption {
    All,
    CriticalPath,
    Subsystem,
    TeamMember,
    Overdue,
    Completed,
    BehindSchedule,
}

impl FilterOption {
    pub fn name(&self) -> &'static str {
        match self {
            FilterOption::All => "ALL",
            FilterOption::CriticalPath => "CRITICAL_PATH",
            FilterOption::Subsystem => "SUBSYSTEM",
            FilterOption::TeamMember => "TEAM_MEMBER",
            FilterOption::Overdue => "OVERDUE",
            FilterOption::Completed => "COMPLETED",
            FilterOption::BehindSchedule => "BEHIND_SCHEDULE",
        }
    }
}

impl std::fmt::Display for FilterOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterOption {
    type Err = Error;

    /// Accepts `CRITICAL_PATH`, `critical-path` and `Critical Path` alike.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "ALL" => Ok(FilterOption::All),
            "CRITICAL_PATH" => Ok(FilterOption::CriticalPath),
            "SUBSYSTEM" => Ok(FilterOption::Subsystem),
            "TEAM_MEMBER" => Ok(FilterOption::TeamMember),
            "OVERDUE" => Ok(FilterOption::Overdue),
            "COMPLETED" => Ok(FilterOption::Completed),
            "BEHIND_SCHEDULE" => Ok(FilterOption::BehindSchedule),
            _ => Err(Error::UnsupportedFilter(s.to_string())),
        }
    }
}

/// Parameters for a filter run.
///
/// `start`/`end` narrow any filter to a date range. `today` pins the
/// reference date for the overdue and behind-schedule filters; the local
/// date is used when it is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub subsystem: Option<SubsystemId>,
    pub member: Option<MemberId>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub today: Option<NaiveDate>,
}

impl FilterCriteria {
    pub fn subsystem(id: SubsystemId) -> Self {
        Self {
            subsystem: Some(id),
            ..Self::default()
        }
    }

    pub fn member(id: MemberId) -> Self {
        Self {
            member: Some(id),
            ..Self::default()
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn with_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Parse string criteria such as those coming from a query string.
    ///
    /// Known keys are `subsystem`, `member`, `start`, `end` and `today`.
    /// Other keys are ignored.
    ///
    /// # Errors
    /// Returns `Validation` when a known key has an unparseable value.
    pub fn from_pairs(pairs: &BTreeMap<String, String>) -> Result<Self> {
        let mut criteria = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "subsystem" => criteria.subsystem = Some(parse_value(key, value)?),
                "member" => criteria.member = Some(parse_value(key, value)?),
                "start" => criteria.start = Some(parse_value(key, value)?),
                "end" => criteria.end = Some(parse_value(key, value)?),
                "today" => criteria.today = Some(parse_value(key, value)?),
                _ => {}
            }
        }
        Ok(criteria)
    }

    fn reference_date(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| {
            Error::Validation(format!("Invalid value '{}' for criterion '{}'", value, key))
        })
}

pub struct TimelineFilter;

impl TimelineFilter {
    /// Narrow `entries` according to `option`.
    ///
    /// # Errors
    /// - `Validation` if the subsystem or team member filter is missing its
    ///   criterion
    /// - `InvalidRange` if the criteria's `end` is before `start`
    pub fn apply(
        entries: &[TimelineEntry],
        option: FilterOption,
        criteria: &FilterCriteria,
    ) -> Result<Vec<TimelineEntry>> {
        if let (Some(start), Some(end)) = (criteria.start, criteria.end) {
            if end < start {
                return Err(Error::InvalidRange { start, end });
            }
        }

        let keep: Box<dyn Fn(&TimelineEntry) -> bool> = match option {
            FilterOption::All => Box::new(|_: &TimelineEntry| true),
            FilterOption::CriticalPath => {
                Box::new(|e: &TimelineEntry| e.is_milestone() || e.on_critical_path)
            }
            FilterOption::Subsystem => {
                let subsystem = criteria.subsystem.ok_or_else(|| {
                    Error::Validation(
                        "SUBSYSTEM filter requires a 'subsystem' criterion".to_string(),
                    )
                })?;
                Box::new(move |e: &TimelineEntry| {
                    e.is_milestone() || e.subsystem_id == Some(subsystem)
                })
            }
            FilterOption::TeamMember => {
                let member = criteria.member.ok_or_else(|| {
                    Error::Validation(
                        "TEAM_MEMBER filter requires a 'member' criterion".to_string(),
                    )
                })?;
                Box::new(move |e: &TimelineEntry| {
                    e.is_milestone() || e.assigned_members.contains(&member)
                })
            }
            FilterOption::Overdue => {
                let today = criteria.reference_date();
                Box::new(move |e: &TimelineEntry| e.is_overdue(today))
            }
            FilterOption::Completed => Box::new(|e: &TimelineEntry| e.is_task() && e.completed),
            FilterOption::BehindSchedule => {
                let today = criteria.reference_date();
                Box::new(move |e: &TimelineEntry| e.is_task() && e.is_behind_schedule(today))
            }
        };

        let filtered: Vec<TimelineEntry> = entries
            .iter()
            .filter(|&e| keep(e) && in_range(e, criteria))
            .cloned()
            .collect();

        debug!(
            filter = %option,
            before = entries.len(),
            after = filtered.len(),
            "timeline filtered"
        );
        Ok(filtered)
    }

    /// Same as [`TimelineFilter::apply`] with the filter given by name.
    ///
    /// # Errors
    /// Returns `UnsupportedFilter` for unknown names.
    pub fn apply_named(
        entries: &[TimelineEntry],
        name: &str,
        criteria: &FilterCriteria,
    ) -> Result<Vec<TimelineEntry>> {
        Self::apply(entries, name.parse()?, criteria)
    }
}

fn in_range(entry: &TimelineEntry, criteria: &FilterCriteria) -> bool {
    match (criteria.start, criteria.end) {
        (None, None) => true,
        (start, end) => entry.intersects(
            start.unwrap_or(NaiveDate::MIN),
            end.unwrap_or(NaiveDate::MAX),
        ),
    }
}
