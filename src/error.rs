use actix_web::{HttpResponse, http::StatusCode};
use chrono::NaiveDate;
use derive_more::Display;
use serde_json::json;

/// Error taxonomy for the leave engine. Every failure is scoped to the
/// single requested operation; there is no fatal class.
#[derive(Debug, Display)]
pub enum EngineError {
    /// Required field missing or out of domain range.
    #[display(fmt = "validation failed: {}", _0)]
    Validation(String),

    /// Requested date(s) already carry a leave record for this employee.
    #[display(fmt = "requested dates already have leave records")]
    Conflict { dates: Vec<NaiveDate> },

    /// Decision target no longer exists.
    #[display(fmt = "{} not found", _0)]
    NotFound(&'static str),

    /// Second decision on an already approved/rejected record.
    #[display(fmt = "{} already processed", _0)]
    AlreadyDecided(&'static str),

    /// Record store or email dispatch failure, propagated untouched.
    #[display(fmt = "collaborator failure: {}", _0)]
    Collaborator(String),
}

impl std::error::Error for EngineError {}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        EngineError::Collaborator(e.to_string())
    }
}

impl actix_web::ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::Conflict { .. } => StatusCode::CONFLICT,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::AlreadyDecided(_) => StatusCode::CONFLICT,
            EngineError::Collaborator(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            EngineError::Conflict { dates } => json!({
                "message": self.to_string(),
                "conflicts": dates,
            }),
            // internal detail stays in the logs
            EngineError::Collaborator(_) => json!({
                "message": "Internal Server Error"
            }),
            _ => json!({ "message": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Maps a batch-insert failure: a unique-key violation on
/// (employee_id, date) is the authoritative conflict signal, everything
/// else is a plain collaborator failure.
pub fn map_insert_error(e: sqlx::Error, dates: &[NaiveDate]) -> EngineError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some("23000") {
            return EngineError::Conflict {
                dates: dates.to_vec(),
            };
        }
    }
    EngineError::Collaborator(e.to_string())
}
