//! Zoom and pan state of the timeline window.

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};

/// Column granularity of the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewMode {
    Day,
    #[default]
    Week,
    Month,
}

impl ViewMode {
    /// Days covered by one chart column.
    pub fn column_days(&self) -> i64 {
        match self {
            ViewMode::Day => 1,
            ViewMode::Week => 7,
            ViewMode::Month => 30,
        }
    }

    /// Window span used when switching to this mode.
    pub fn preset_span_days(&self) -> i64 {
        match self {
            ViewMode::Day => 14,
            ViewMode::Week => 56,
            ViewMode::Month => 180,
        }
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewMode::Day => write!(f, "Day"),
            ViewMode::Week => write!(f, "Week"),
            ViewMode::Month => write!(f, "Month"),
        }
    }
}

/// The visible `[start, end]` window and its zoom limits.
///
/// Zooming never leaves the `[min_span, max_span]` limits: a zoom in that
/// would go below the minimum does nothing, and a zoom out is clamped to the
/// maximum. Neither is an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomController {
    window_start: NaiveDate,
    window_end: NaiveDate,
    view_mode: ViewMode,
    fraction: f64,
    min_span_days: i64,
    max_span_days: i64,
}

impl ZoomController {
    /// Controller over `[start, end]` with the default limits.
    ///
    /// # Errors
    /// Returns `InvalidRange` if `end` is before `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let config = Config::default();
        let mut controller = Self::with_limits(
            start,
            config.zoom_fraction,
            config.min_span_days,
            config.max_span_days,
        );
        controller.set_range(start, end)?;
        Ok(controller)
    }

    /// Controller with the configured limits over the configured default
    /// window around `today`.
    pub fn from_config(config: &Config, today: NaiveDate) -> Self {
        let mut controller = Self::with_limits(
            today,
            config.zoom_fraction,
            config.min_span_days,
            config.max_span_days,
        );
        let before = config.days_before_today.checked_neg();
        controller.window_start = before.and_then(|days| shift(today, days)).unwrap_or(today);
        controller.window_end = shift(today, config.days_after_today).unwrap_or(today);
        controller
    }

    fn with_limits(
        anchor: NaiveDate,
        fraction: f64,
        min_span_days: i64,
        max_span_days: i64,
    ) -> Self {
        Self {
            window_start: anchor,
            window_end: anchor,
            view_mode: ViewMode::default(),
            fraction,
            min_span_days,
            max_span_days,
        }
    }

    pub fn window(&self) -> (NaiveDate, NaiveDate) {
        (self.window_start, self.window_end)
    }

    pub fn window_start(&self) -> NaiveDate {
        self.window_start
    }

    pub fn window_end(&self) -> NaiveDate {
        self.window_end
    }

    pub fn span_days(&self) -> i64 {
        (self.window_end - self.window_start).num_days()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    fn center(&self) -> NaiveDate {
        self.window_start + Duration::days(self.span_days() / 2)
    }

    /// Span `span` days centered on `center`. Returns `false`, leaving the
    /// window alone, if that window does not fit in the calendar.
    fn recenter(&mut self, center: NaiveDate, span: i64) -> bool {
        let Some(start) = shift(center, -(span / 2)) else {
            return false;
        };
        let Some(end) = shift(start, span) else {
            return false;
        };
        self.window_start = start;
        self.window_end = end;
        true
    }

    /// Replace the window.
    ///
    /// # Errors
    /// Returns `InvalidRange` if `end` is before `start`; the window is left
    /// unchanged.
    pub fn set_range(&mut self, start: NaiveDate, end: NaiveDate) -> Result<()> {
        if end < start {
            return Err(Error::InvalidRange { start, end });
        }
        self.window_start = start;
        self.window_end = end;
        debug!(%start, %end, "zoom window set");
        Ok(())
    }

    /// Shrink the window by the zoom fraction off each end.
    ///
    /// Returns `false`, leaving the window alone, when the result would be
    /// shorter than the minimum span or the step rounds down to nothing.
    pub fn zoom_in(&mut self) -> bool {
        let span = self.span_days();
        let step = (span as f64 * self.fraction).floor() as i64;
        if step == 0 || span - 2 * step < self.min_span_days {
            debug!(span, "zoom in ignored at minimum span");
            return false;
        }
        self.window_start += Duration::days(step);
        self.window_end -= Duration::days(step);
        debug!(from = span, to = self.span_days(), "zoomed in");
        true
    }

    /// Grow the window by the zoom fraction on each end, up to the maximum
    /// span.
    ///
    /// Returns `false` when the window is already at the maximum.
    pub fn zoom_out(&mut self) -> bool {
        let span = self.span_days();
        if span >= self.max_span_days {
            debug!(span, "zoom out ignored at maximum span");
            return false;
        }
        let step = ((span as f64 * self.fraction).ceil() as i64).max(1);
        let grown = if span + 2 * step > self.max_span_days {
            let center = self.center();
            self.recenter(center, self.max_span_days)
        } else {
            match (shift(self.window_start, -step), shift(self.window_end, step)) {
                (Some(start), Some(end)) => {
                    self.window_start = start;
                    self.window_end = end;
                    true
                }
                _ => false,
            }
        };
        if grown {
            debug!(from = span, to = self.span_days(), "zoomed out");
        } else {
            debug!(span, "zoom out ignored at calendar edge");
        }
        grown
    }

    /// Center the window on the local date, keeping the span.
    pub fn jump_to_today(&mut self) {
        self.jump_to(Local::now().date_naive());
    }

    /// Center the window on `date`, keeping the span. Near the ends of the
    /// calendar the window may not fit; it is then left where it was.
    pub fn jump_to(&mut self, date: NaiveDate) {
        let span = self.span_days();
        if self.recenter(date, span) {
            debug!(%date, "zoom window recentered");
        }
    }

    /// Shift the window by `days`; negative goes back in time.
    ///
    /// Returns `false`, leaving the window alone, when the shifted window
    /// would fall off the calendar.
    pub fn pan(&mut self, days: i64) -> bool {
        match (shift(self.window_start, days), shift(self.window_end, days)) {
            (Some(start), Some(end)) => {
                self.window_start = start;
                self.window_end = end;
                true
            }
            _ => {
                debug!(days, "pan ignored at calendar edge");
                false
            }
        }
    }

    /// Switch granularity and re-span the window around its center to the
    /// mode's preset, kept within the zoom limits.
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        let span = mode
            .preset_span_days()
            .clamp(self.min_span_days, self.max_span_days);
        let center = self.center();
        self.view_mode = mode;
        if !self.recenter(center, span) {
            debug!(mode = %mode, span, "view mode changed, window kept at calendar edge");
            return;
        }
        debug!(mode = %mode, span, "view mode changed");
    }
}

/// `date` moved by `days`, or `None` past the representable range.
fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|delta| date.checked_add_signed(delta))
}
