use serde::Serialize;
use tracing::{error, info};

use crate::engine::summary::EmployeePtoSummary;
use crate::error::EngineError;

const ALERT_SUBJECT: &str = "PTO allowance almost exhausted";
const ALERT_BODY: &str = "Hi {name},\n\nYou are within one day of your annual PTO allowance. \
Please plan remaining leave with your manager.\n";

#[derive(Serialize)]
struct EmailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: String,
}

/// Client for the outbound email-dispatch endpoint. No retry or backoff;
/// a failure aborts the run and reports how far it got.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    endpoint: String,
    from: String,
}

impl Mailer {
    pub fn new(endpoint: String, from: String) -> Self {
        Mailer {
            client: reqwest::Client::new(),
            endpoint,
            from,
        }
    }

    /// Sends one templated alert per recipient, sequentially. Returns the
    /// number of emails accepted by the dispatch endpoint.
    pub async fn send_threshold_alerts(
        &self,
        recipients: &[&EmployeePtoSummary],
    ) -> Result<usize, EngineError> {
        let mut sent = 0usize;

        for summary in recipients {
            let payload = EmailPayload {
                from: &self.from,
                to: &summary.sender_email,
                subject: ALERT_SUBJECT,
                body: ALERT_BODY.replace("{name}", &summary.employee_name),
            };

            let response = self
                .client
                .post(&self.endpoint)
                .json(&payload)
                .send()
                .await
                .and_then(|r| r.error_for_status());

            if let Err(e) = response {
                error!(error = %e, recipient = %summary.sender_email, sent, "Email dispatch failed");
                return Err(EngineError::Collaborator(format!(
                    "email dispatch failed after {} of {} sends: {}",
                    sent,
                    recipients.len(),
                    e
                )));
            }
            sent += 1;
        }

        info!(sent, "Threshold alerts dispatched");
        Ok(sent)
    }
}
