//! # Shift Duration and Mandated-Break Classification
//!
//! A pure data transform from raw arrival/departure strings to shift
//! durations and the rest break the duration mandates. Timesheet data is
//! user-entered, so every parse failure degrades to a pending entry
//! instead of erroring; the numbers that do parse follow fixed repair
//! rules (missing departure, departure before arrival) so a summary can
//! always be produced.

use chrono::{Duration, NaiveDateTime};
use log::warn;
use serde::Serialize;

use crate::model::EmployeeRow;

/// Accepted local date-time layouts: `YYYY-MM-DD HH:MM[:SS]` with a space
/// or `T` separator. Anything else is treated as absent.
const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Canonical rendering of a parsed timestamp.
const ISO_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A shift shorter than this needs no mandated break.
const NO_BREAK_MAX_MINUTES: i64 = 360;
/// Above this, 45 minutes of break are mandated instead of 30.
const LONG_SHIFT_MIN_MINUTES: i64 = 540;

/// Fallback shift length when the departure is absent or invalid.
const DEFAULT_SHIFT_MINUTES: i64 = 60;
/// Forced minimum when the entered departure is not after the arrival.
const MIN_SHIFT_MINUTES: i64 = 15;

/// Mandated-break category for a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BreakCode {
    /// Up to 6 hours: no break required.
    None,
    /// Over 6 and up to 9 hours: 30 minutes required.
    Min30,
    /// Over 9 hours: 45 minutes required.
    Min45,
    /// No valid arrival; pending until corrected.
    Unknown,
}

impl BreakCode {
    /// Short label used in the rendered timesheet column.
    pub fn label(&self) -> &'static str {
        match self {
            BreakCode::None => "none",
            BreakCode::Min30 => "30 min",
            BreakCode::Min45 => "45 min",
            BreakCode::Unknown => "pending",
        }
    }
}

/// The classified shape of one shift.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftClassification {
    /// Canonicalized arrival, empty when unparseable.
    pub arrival_iso: String,
    /// Canonicalized (possibly defaulted or repaired) departure.
    pub departure_iso: String,
    pub duration_minutes: i64,
    pub break_code: BreakCode,
    pub break_required_minutes: i64,
}

/// One timesheet row after classification. Read-only thereafter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeShiftEntry {
    pub index: usize,
    pub name: String,
    pub role: String,
    #[serde(flatten)]
    pub shift: ShiftClassification,
}

/// Counts per break category across a timesheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakStats {
    pub none: usize,
    pub min30: usize,
    pub min45: usize,
    pub unknown: usize,
}

/// Aggregate over all classified entries.
///
/// Pending (unknown) entries are counted in `break_stats` but excluded
/// from the minute totals; summaries surface them separately.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSummary {
    pub entries: Vec<EmployeeShiftEntry>,
    pub total_minutes: i64,
    pub total_break_minutes: i64,
    pub break_stats: BreakStats,
}

impl ShiftSummary {
    pub fn pending_count(&self) -> usize {
        self.break_stats.unknown
    }
}

/// Parse a strict local date-time string, or `None`.
pub fn parse_local(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

/// Break category and required minutes for a shift duration.
pub fn break_for_duration(duration_minutes: i64) -> (BreakCode, i64) {
    if duration_minutes <= NO_BREAK_MAX_MINUTES {
        (BreakCode::None, 0)
    } else if duration_minutes <= LONG_SHIFT_MIN_MINUTES {
        (BreakCode::Min30, 30)
    } else {
        (BreakCode::Min45, 45)
    }
}

/// Classify one raw arrival/departure pair.
///
/// Repair rules, applied in order:
/// - no valid arrival: the whole entry is pending ([`BreakCode::Unknown`]);
/// - no valid departure: the shift defaults to one hour;
/// - departure not after arrival: the shift is forced to 15 minutes.
pub fn classify(arrival_raw: &str, departure_raw: &str) -> ShiftClassification {
    let Some(arrival) = parse_local(arrival_raw) else {
        return ShiftClassification {
            arrival_iso: String::new(),
            departure_iso: String::new(),
            duration_minutes: 0,
            break_code: BreakCode::Unknown,
            break_required_minutes: 0,
        };
    };

    let mut departure = parse_local(departure_raw)
        .unwrap_or_else(|| arrival + Duration::minutes(DEFAULT_SHIFT_MINUTES));

    let mut duration_minutes = (departure - arrival).num_minutes();
    if duration_minutes <= 0 {
        departure = arrival + Duration::minutes(MIN_SHIFT_MINUTES);
        duration_minutes = MIN_SHIFT_MINUTES;
    }

    let (break_code, break_required_minutes) = break_for_duration(duration_minutes);

    ShiftClassification {
        arrival_iso: arrival.format(ISO_OUTPUT_FORMAT).to_string(),
        departure_iso: departure.format(ISO_OUTPUT_FORMAT).to_string(),
        duration_minutes,
        break_code,
        break_required_minutes,
    }
}

/// Classify every timesheet row and aggregate the totals.
pub fn summarize(rows: &[EmployeeRow]) -> ShiftSummary {
    let mut summary = ShiftSummary::default();

    for (index, row) in rows.iter().enumerate() {
        let shift = classify(&row.arrival, &row.departure);
        match shift.break_code {
            BreakCode::None => summary.break_stats.none += 1,
            BreakCode::Min30 => summary.break_stats.min30 += 1,
            BreakCode::Min45 => summary.break_stats.min45 += 1,
            BreakCode::Unknown => {
                summary.break_stats.unknown += 1;
                warn!(
                    "timesheet row {} ({}) has no parseable arrival; marked pending",
                    index, row.name
                );
            }
        }
        if shift.break_code != BreakCode::Unknown {
            summary.total_minutes += shift.duration_minutes;
            summary.total_break_minutes += shift.break_required_minutes;
        }
        summary.entries.push(EmployeeShiftEntry {
            index,
            name: row.name.clone(),
            role: row.role.clone(),
            shift,
        });
    }

    summary
}

/// Render minutes as `"H h MM min"`, the timesheet column format.
pub fn format_minutes(minutes: i64) -> String {
    format!("{} h {:02} min", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, arrival: &str, departure: &str) -> EmployeeRow {
        EmployeeRow {
            name: name.to_string(),
            role: "technician".to_string(),
            arrival: arrival.to_string(),
            departure: departure.to_string(),
        }
    }

    #[test]
    fn parses_all_accepted_layouts() {
        for raw in [
            "2024-06-24 08:00",
            "2024-06-24 08:00:30",
            "2024-06-24T08:00",
            "2024-06-24T08:00:30",
            "  2024-06-24 08:00  ",
        ] {
            assert!(parse_local(raw).is_some(), "should parse {raw:?}");
        }
        for raw in ["", "24.06.2024 08:00", "2024-06-24", "08:00", "yesterday"] {
            assert!(parse_local(raw).is_none(), "should reject {raw:?}");
        }
    }

    #[test]
    fn break_thresholds_are_exact() {
        assert_eq!(break_for_duration(360), (BreakCode::None, 0));
        assert_eq!(break_for_duration(361), (BreakCode::Min30, 30));
        assert_eq!(break_for_duration(540), (BreakCode::Min30, 30));
        assert_eq!(break_for_duration(541), (BreakCode::Min45, 45));
    }

    #[test]
    fn nine_and_a_half_hour_shift_mandates_45() {
        let shift = classify("2024-06-24 08:00", "2024-06-24 17:30");
        assert_eq!(shift.duration_minutes, 570);
        assert_eq!(shift.break_code, BreakCode::Min45);
        assert_eq!(shift.break_required_minutes, 45);
    }

    #[test]
    fn missing_departure_defaults_to_one_hour() {
        let shift = classify("2024-06-24 08:00", "");
        assert_eq!(shift.departure_iso, "2024-06-24 09:00");
        assert_eq!(shift.duration_minutes, 60);
        assert_eq!(shift.break_code, BreakCode::None);
    }

    #[test]
    fn departure_before_arrival_is_forced_to_15_minutes() {
        let shift = classify("2024-06-24 08:00", "2024-06-24 07:00");
        assert_eq!(shift.duration_minutes, 15);
        assert_eq!(shift.departure_iso, "2024-06-24 08:15");
        assert_eq!(shift.break_code, BreakCode::None);
    }

    #[test]
    fn departure_equal_to_arrival_is_forced_to_15_minutes() {
        let shift = classify("2024-06-24 08:00", "2024-06-24 08:00");
        assert_eq!(shift.duration_minutes, 15);
    }

    #[test]
    fn unparseable_arrival_is_pending() {
        let shift = classify("soon", "2024-06-24 17:00");
        assert_eq!(shift.break_code, BreakCode::Unknown);
        assert_eq!(shift.duration_minutes, 0);
        assert_eq!(shift.break_required_minutes, 0);
        assert!(shift.arrival_iso.is_empty());
    }

    #[test]
    fn summary_tallies_categories_and_totals() {
        let rows = [
            row("a", "2024-06-24 08:00", "2024-06-24 11:20"), // 200 min
            row("b", "2024-06-24 08:00", "2024-06-24 14:40"), // 400 min
            row("c", "2024-06-24 07:00", "2024-06-24 17:50"), // 650 min
        ];
        let summary = summarize(&rows);
        assert_eq!(
            summary.break_stats,
            BreakStats {
                none: 1,
                min30: 1,
                min45: 1,
                unknown: 0
            }
        );
        assert_eq!(summary.total_break_minutes, 75);
        assert_eq!(summary.total_minutes, 1250);
    }

    #[test]
    fn pending_rows_are_excluded_from_totals() {
        let rows = [
            row("a", "2024-06-24 08:00", "2024-06-24 16:00"), // 480 min
            row("b", "invalid", "2024-06-24 16:00"),
        ];
        let summary = summarize(&rows);
        assert_eq!(summary.total_minutes, 480);
        assert_eq!(summary.total_break_minutes, 30);
        assert_eq!(summary.pending_count(), 1);
    }

    #[test]
    fn classification_is_deterministic_across_passes() {
        // Summaries are derived from raw strings at assembly time; a second
        // derivation over the same rows must agree with the first.
        let rows = [
            row("a", "2024-06-24 08:00", "2024-06-24 17:30"),
            row("b", "2024-06-24 09:15", ""),
        ];
        let first = summarize(&rows);
        let second = summarize(&rows);
        for (x, y) in first.entries.iter().zip(second.entries.iter()) {
            assert_eq!(x.shift, y.shift);
        }
        assert_eq!(first.total_minutes, second.total_minutes);
    }

    #[test]
    fn minutes_format() {
        assert_eq!(format_minutes(570), "9 h 30 min");
        assert_eq!(format_minutes(60), "1 h 00 min");
        assert_eq!(format_minutes(5), "0 h 05 min");
    }
}
