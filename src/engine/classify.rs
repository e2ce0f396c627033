use chrono::NaiveDate;

use crate::engine::HOURS_PER_DAY;
use crate::model::leave_record::LeaveRecord;
use crate::model::status::ApprovalStatus;

/// Classification of one submitted day before it becomes a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub is_pto: bool,
}

/// PTO day-slots still open this calendar year. Approved and pending
/// requests both count, so the allowance cannot be over-committed while
/// a manager review is outstanding. May go negative.
pub fn remaining_pto_slots(base_limit_days: f64, records: &[LeaveRecord]) -> f64 {
    let committed_hours: f64 = records
        .iter()
        .filter(|r| r.is_pto && !matches!(r.status, ApprovalStatus::Rejected))
        .map(|r| r.hours)
        .sum();

    base_limit_days - committed_hours / HOURS_PER_DAY
}

/// Dates of the submission that already carry a record, any status.
/// Non-empty means the whole batch is refused; there is no partial
/// insertion.
pub fn find_conflicts(existing: &[NaiveDate], requested: &[NaiveDate]) -> Vec<NaiveDate> {
    let mut conflicts: Vec<NaiveDate> = requested
        .iter()
        .filter(|date| existing.contains(*date))
        .copied()
        .collect();
    conflicts.sort();
    conflicts
}

/// Running-counter classification: the first `remaining` dates (by
/// position in the submission) are PTO, everything after is overflow
/// Non-PTO. A single batch can span the boundary.
pub fn classify_days(dates: &[NaiveDate], remaining: f64) -> Vec<DayPlan> {
    dates
        .iter()
        .enumerate()
        .map(|(position, &date)| DayPlan {
            date,
            is_pto: (position as f64) < remaining,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn record(day: u32, hours: f64, is_pto: bool, status: ApprovalStatus) -> LeaveRecord {
        LeaveRecord {
            id: day as u64,
            employee_id: 1000,
            employee_name: "John Doe".into(),
            sender_email: "john@company.com".into(),
            date: d(day),
            weekday: "Mon".into(),
            hours,
            is_pto,
            status,
            request_reason: None,
            approved_at: None,
            updated_at: None::<DateTime<Utc>>,
        }
    }

    #[test]
    fn fifteen_days_against_twelve_remaining() {
        let dates: Vec<NaiveDate> = (1..=15).map(d).collect();
        let plan = classify_days(&dates, 12.0);

        let pto: Vec<_> = plan.iter().filter(|p| p.is_pto).collect();
        let non_pto: Vec<_> = plan.iter().filter(|p| !p.is_pto).collect();
        assert_eq!(pto.len(), 12);
        assert_eq!(non_pto.len(), 3);
        // PTO days are the first twelve in date order
        assert_eq!(pto.last().unwrap().date, d(12));
        assert_eq!(non_pto.first().unwrap().date, d(13));
    }

    #[test]
    fn negative_remaining_classifies_everything_as_non_pto() {
        let dates: Vec<NaiveDate> = (1..=3).map(d).collect();
        let plan = classify_days(&dates, -2.0);
        assert!(plan.iter().all(|p| !p.is_pto));
    }

    #[test]
    fn fractional_remaining_rounds_up_the_boundary_day() {
        let dates: Vec<NaiveDate> = (1..=3).map(d).collect();
        let plan = classify_days(&dates, 2.5);
        assert_eq!(plan.iter().filter(|p| p.is_pto).count(), 3);

        let plan = classify_days(&dates, 2.0);
        assert_eq!(plan.iter().filter(|p| p.is_pto).count(), 2);
    }

    #[test]
    fn overlap_with_one_existing_record_is_reported() {
        let existing = vec![d(10)];
        let requested = vec![d(9), d(10), d(11)];
        assert_eq!(find_conflicts(&existing, &requested), vec![d(10)]);
    }

    #[test]
    fn disjoint_dates_do_not_conflict() {
        let existing = vec![d(1), d(2)];
        let requested = vec![d(3), d(4)];
        assert!(find_conflicts(&existing, &requested).is_empty());
    }

    #[test]
    fn pending_and_approved_both_reduce_remaining() {
        let records = vec![
            record(1, 8.0, true, ApprovalStatus::Approved),
            record(2, 8.0, true, ApprovalStatus::Pending),
            record(3, 8.0, true, ApprovalStatus::Rejected),
            record(4, 8.0, false, ApprovalStatus::Approved),
        ];
        // rejected and non-PTO rows leave the allowance untouched
        assert_eq!(remaining_pto_slots(12.0, &records), 10.0);
    }

    #[test]
    fn remaining_can_go_negative() {
        let records: Vec<LeaveRecord> = (1..=14)
            .map(|day| record(day, 8.0, true, ApprovalStatus::Approved))
            .collect();
        assert_eq!(remaining_pto_slots(12.0, &records), -2.0);
    }
}
