//! Best-effort secondary effects.
//!
//! Guardian notification always runs after the primary entity (message,
//! incident, activity) is committed. Its failure is logged and reported as
//! an outcome value; it never becomes the caller's error and never rolls the
//! primary write back.

use anyhow::Result;
use std::future::Future;
use tracing::{debug, warn};

/// What happened to the guardian notification attached to an operation
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationOutcome {
    Sent { alert_id: String },
    Skipped { reason: String },
    Failed { error: String },
}

impl NotificationOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        NotificationOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, NotificationOutcome::Sent { .. })
    }
}

/// Run `effect` once, converting any error into `NotificationOutcome::Failed`
pub async fn notify_best_effort<F, Fut>(label: &str, effect: F) -> NotificationOutcome
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<NotificationOutcome>>,
{
    match effect().await {
        Ok(outcome) => {
            debug!("{} notification: {:?}", label, outcome);
            outcome
        }
        Err(e) => {
            warn!("{} notification failed, continuing without it: {:#}", label, e);
            NotificationOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_passes_outcome_through() {
        let outcome = notify_best_effort("test", || async {
            Ok(NotificationOutcome::Sent {
                alert_id: "alert::1".to_string(),
            })
        })
        .await;
        assert!(outcome.is_sent());
    }

    #[tokio::test]
    async fn test_error_is_captured() {
        let outcome = notify_best_effort("test", || async {
            Err::<NotificationOutcome, _>(anyhow::anyhow!("mail server down"))
        })
        .await;
        assert_eq!(
            outcome,
            NotificationOutcome::Failed {
                error: "mail server down".to_string()
            }
        );
    }
}
