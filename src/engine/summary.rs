use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::HOURS_PER_DAY;
use crate::model::leave_record::LeaveRecord;
use crate::model::status::ApprovalStatus;

/// Derived per-employee, per-year view. Never persisted; recomputed from
/// the full record snapshot on every load.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "employee_id": 1000,
    "employee_name": "John Doe",
    "sender_email": "john.doe@company.com",
    "total_pto_days": 11.0,
    "total_pto_hours": 88.0,
    "non_pto_days": 1.0,
    "non_pto_hours": 8.0,
    "effective_pto_limit": 12.0,
    "remaining_pto_days": 1.0,
    "needs_notification": true
}))]
pub struct EmployeePtoSummary {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    #[schema(example = "john.doe@company.com")]
    pub sender_email: String,
    pub total_pto_days: f64,
    pub total_pto_hours: f64,
    pub non_pto_days: f64,
    pub non_pto_hours: f64,
    /// Base annual allowance plus approved carry-forward into this year.
    pub effective_pto_limit: f64,
    /// Clamped at zero even when usage exceeds the limit.
    pub remaining_pto_days: f64,
    /// Within the last day of exhausting the allowance.
    pub needs_notification: bool,
}

#[derive(Default)]
struct Acc {
    employee_name: String,
    sender_email: String,
    pto_hours: f64,
    non_pto_hours: f64,
}

/// Pure summary computation over one year's records. Only `approved`
/// rows contribute hours; grouping is by `employee_id`, output ordered
/// by id so identical input always yields identical output.
pub fn compute_summaries(
    records: &[LeaveRecord],
    carry_forward_by_employee: &HashMap<u64, f64>,
    base_limit_days: f64,
) -> Vec<EmployeePtoSummary> {
    let mut groups: BTreeMap<u64, Acc> = BTreeMap::new();

    for record in records {
        let acc = groups.entry(record.employee_id).or_default();
        if acc.employee_name.is_empty() {
            acc.employee_name = record.employee_name.clone();
            acc.sender_email = record.sender_email.clone();
        }
        if record.status != ApprovalStatus::Approved {
            continue;
        }
        if record.is_pto {
            acc.pto_hours += record.hours;
        } else {
            acc.non_pto_hours += record.hours;
        }
    }

    groups
        .into_iter()
        .map(|(employee_id, acc)| {
            let carried = carry_forward_by_employee
                .get(&employee_id)
                .copied()
                .unwrap_or(0.0);
            let effective_limit = base_limit_days + carried;
            let pto_days = acc.pto_hours / HOURS_PER_DAY;
            let remaining = (effective_limit - pto_days).max(0.0);

            EmployeePtoSummary {
                employee_id,
                employee_name: acc.employee_name,
                sender_email: acc.sender_email,
                total_pto_days: pto_days,
                total_pto_hours: acc.pto_hours,
                non_pto_days: acc.non_pto_hours / HOURS_PER_DAY,
                non_pto_hours: acc.non_pto_hours,
                effective_pto_limit: effective_limit,
                remaining_pto_days: remaining,
                needs_notification: remaining > 0.0 && pto_days >= effective_limit - 1.0,
            }
        })
        .collect()
}

/// Recipients for the threshold alert, straight off the computed view.
pub fn employees_needing_notification(
    summaries: &[EmployeePtoSummary],
) -> Vec<&EmployeePtoSummary> {
    summaries.iter().filter(|s| s.needs_notification).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(
        employee_id: u64,
        day: u32,
        hours: f64,
        is_pto: bool,
        status: ApprovalStatus,
    ) -> LeaveRecord {
        LeaveRecord {
            id: employee_id * 100 + day as u64,
            employee_id,
            employee_name: format!("Employee {}", employee_id),
            sender_email: format!("emp{}@company.com", employee_id),
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            weekday: "Mon".into(),
            hours,
            is_pto,
            status,
            request_reason: None,
            approved_at: None,
            updated_at: None,
        }
    }

    fn approved_days(employee_id: u64, count: u32) -> Vec<LeaveRecord> {
        (1..=count)
            .map(|day| record(employee_id, day, 8.0, true, ApprovalStatus::Approved))
            .collect()
    }

    #[test]
    fn identical_input_yields_identical_output() {
        let records = vec![
            record(1000, 1, 8.0, true, ApprovalStatus::Approved),
            record(1000, 2, 4.0, false, ApprovalStatus::Approved),
            record(2000, 3, 8.0, true, ApprovalStatus::Pending),
        ];
        let carried = HashMap::from([(1000, 2.0)]);

        let first = compute_summaries(&records, &carried, 12.0);
        let second = compute_summaries(&records, &carried, 12.0);
        assert_eq!(first, second);
    }

    #[test]
    fn hours_are_conserved_across_the_pto_split() {
        let records = vec![
            record(1000, 1, 8.0, true, ApprovalStatus::Approved),
            record(1000, 2, 4.0, true, ApprovalStatus::Approved),
            record(1000, 3, 8.0, false, ApprovalStatus::Approved),
            record(1000, 4, 8.0, true, ApprovalStatus::Rejected),
            record(1000, 5, 8.0, true, ApprovalStatus::Pending),
        ];
        let summaries = compute_summaries(&records, &HashMap::new(), 12.0);
        assert_eq!(summaries.len(), 1);

        let s = &summaries[0];
        let approved_hours: f64 = records
            .iter()
            .filter(|r| r.status == ApprovalStatus::Approved)
            .map(|r| r.hours)
            .sum();
        assert_eq!(
            s.total_pto_days + s.non_pto_days,
            approved_hours / HOURS_PER_DAY
        );
        assert_eq!(s.total_pto_hours + s.non_pto_hours, approved_hours);
    }

    #[test]
    fn remaining_is_clamped_at_zero() {
        let summaries = compute_summaries(&approved_days(1000, 14), &HashMap::new(), 12.0);
        assert_eq!(summaries[0].remaining_pto_days, 0.0);
        assert_eq!(summaries[0].total_pto_days, 14.0);
    }

    #[test]
    fn carry_forward_raises_the_effective_limit() {
        let carried = HashMap::from([(1000, 2.5)]);
        let summaries = compute_summaries(&approved_days(1000, 13), &carried, 12.0);
        assert_eq!(summaries[0].effective_pto_limit, 14.5);
        assert_eq!(summaries[0].remaining_pto_days, 1.5);
    }

    #[test]
    fn notification_fires_inside_the_last_day() {
        let at_eleven = compute_summaries(&approved_days(1000, 11), &HashMap::new(), 12.0);
        assert!(at_eleven[0].needs_notification);
        assert_eq!(at_eleven[0].remaining_pto_days, 1.0);

        let at_ten = compute_summaries(&approved_days(1000, 10), &HashMap::new(), 12.0);
        assert!(!at_ten[0].needs_notification);
    }

    #[test]
    fn notification_stays_quiet_once_exhausted() {
        // remaining is 0, nothing left to warn about
        let summaries = compute_summaries(&approved_days(1000, 12), &HashMap::new(), 12.0);
        assert!(!summaries[0].needs_notification);
    }

    #[test]
    fn notification_filter_matches_the_flag() {
        let mut records = approved_days(1000, 11);
        records.extend(approved_days(2000, 5));
        let summaries = compute_summaries(&records, &HashMap::new(), 12.0);

        let recipients = employees_needing_notification(&summaries);
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].employee_id, 1000);
    }

    #[test]
    fn output_is_ordered_by_employee_id() {
        let mut records = approved_days(2000, 2);
        records.extend(approved_days(1000, 2));
        let summaries = compute_summaries(&records, &HashMap::new(), 12.0);
        let ids: Vec<u64> = summaries.iter().map(|s| s.employee_id).collect();
        assert_eq!(ids, vec![1000, 2000]);
    }
}
