use crate::error::EngineError;
use crate::model::leave_record::LeaveRecord;

const HEADER: [&str; 6] = ["employee_id", "name", "date", "hours", "type", "status"];

/// Flat CSV rendering of leave records for the manager export.
pub fn leave_records_csv(records: &[LeaveRecord]) -> Result<String, EngineError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(HEADER)
        .map_err(|e| EngineError::Collaborator(format!("csv write failed: {}", e)))?;

    for record in records {
        writer
            .write_record([
                record.employee_id.to_string(),
                record.employee_name.clone(),
                record.date.to_string(),
                record.hours.to_string(),
                if record.is_pto { "PTO" } else { "Non-PTO" }.to_string(),
                record.status.to_string(),
            ])
            .map_err(|e| EngineError::Collaborator(format!("csv write failed: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| EngineError::Collaborator(format!("csv flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| EngineError::Collaborator(format!("csv not utf-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::status::ApprovalStatus;
    use chrono::NaiveDate;

    fn record(name: &str, is_pto: bool) -> LeaveRecord {
        LeaveRecord {
            id: 1,
            employee_id: 1000,
            employee_name: name.into(),
            sender_email: "x@company.com".into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            weekday: "Mon".into(),
            hours: 8.0,
            is_pto,
            status: ApprovalStatus::Approved,
            request_reason: None,
            approved_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn renders_header_and_rows() {
        let csv = leave_records_csv(&[record("John Doe", true), record("Jane Roe", false)]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "employee_id,name,date,hours,type,status");
        assert_eq!(lines[1], "1000,John Doe,2024-06-10,8,PTO,approved");
        assert_eq!(lines[2], "1000,Jane Roe,2024-06-10,8,Non-PTO,approved");
    }

    #[test]
    fn quotes_names_containing_commas() {
        let csv = leave_records_csv(&[record("Doe, John", true)]).unwrap();
        assert!(csv.lines().nth(1).unwrap().contains("\"Doe, John\""));
    }

    #[test]
    fn empty_input_yields_header_only() {
        let csv = leave_records_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
