use chrono::{Duration, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::EngineError;

/// Maximal contiguous run of calendar days, used for display grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DateRange {
    #[schema(example = "2026-06-10", value_type = String, format = "date")]
    pub start: NaiveDate,
    #[schema(example = "2026-06-12", value_type = String, format = "date")]
    pub end: NaiveDate,
}

/// Three-letter weekday label stored alongside each record.
pub fn weekday_label(date: NaiveDate) -> String {
    date.format("%a").to_string()
}

/// Expands `[start, end]` inclusive into the ordered day sequence.
pub fn expand_date_range(
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<NaiveDate>, EngineError> {
    if end < start {
        return Err(EngineError::Validation(
            "end_date cannot be before start_date".into(),
        ));
    }

    let mut dates = Vec::with_capacity((end - start).num_days() as usize + 1);
    let mut day = start;
    while day <= end {
        dates.push(day);
        day += Duration::days(1);
    }
    Ok(dates)
}

/// First and last calendar day of a year, the window every balance query
/// filters on.
pub fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), EngineError> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year, 12, 31);
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(EngineError::Validation(format!("year {} out of range", year))),
    }
}

/// Collapses a sorted day sequence into maximal contiguous ranges; a gap
/// of more than one day starts a new range.
pub fn build_continuous_ranges(sorted_dates: &[NaiveDate]) -> Vec<DateRange> {
    let mut ranges: Vec<DateRange> = Vec::new();

    for &date in sorted_dates {
        match ranges.last_mut() {
            Some(range) if date - range.end <= Duration::days(1) => {
                range.end = range.end.max(date);
            }
            _ => ranges.push(DateRange {
                start: date,
                end: date,
            }),
        }
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn expand_inclusive_both_ends() {
        let dates = expand_date_range(d(2024, 6, 9), d(2024, 6, 11)).unwrap();
        assert_eq!(dates, vec![d(2024, 6, 9), d(2024, 6, 10), d(2024, 6, 11)]);
    }

    #[test]
    fn expand_single_day() {
        let dates = expand_date_range(d(2024, 6, 9), d(2024, 6, 9)).unwrap();
        assert_eq!(dates, vec![d(2024, 6, 9)]);
    }

    #[test]
    fn expand_rejects_reversed_range() {
        let err = expand_date_range(d(2024, 6, 10), d(2024, 6, 9)).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn expand_crosses_month_boundary() {
        let dates = expand_date_range(d(2024, 1, 30), d(2024, 2, 2)).unwrap();
        assert_eq!(
            dates,
            vec![d(2024, 1, 30), d(2024, 1, 31), d(2024, 2, 1), d(2024, 2, 2)]
        );
    }

    #[test]
    fn ranges_collapse_contiguous_runs() {
        let dates = [d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 10)];
        let ranges = build_continuous_ranges(&dates);
        assert_eq!(
            ranges,
            vec![
                DateRange {
                    start: d(2024, 1, 1),
                    end: d(2024, 1, 3)
                },
                DateRange {
                    start: d(2024, 1, 10),
                    end: d(2024, 1, 10)
                },
            ]
        );
    }

    #[test]
    fn ranges_single_date_yields_degenerate_range() {
        let ranges = build_continuous_ranges(&[d(2024, 3, 15)]);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start, ranges[0].end);
    }

    #[test]
    fn ranges_empty_input() {
        assert!(build_continuous_ranges(&[]).is_empty());
    }

    #[test]
    fn year_bounds_cover_the_whole_year() {
        let (start, end) = year_bounds(2026).unwrap();
        assert_eq!(start, d(2026, 1, 1));
        assert_eq!(end, d(2026, 12, 31));
    }

    #[test]
    fn weekday_labels_are_three_letters() {
        assert_eq!(weekday_label(d(2026, 6, 10)), "Wed");
        assert_eq!(weekday_label(d(2026, 6, 13)), "Sat");
    }
}
