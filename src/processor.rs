use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::display::{Language, Messages};
use crate::model::{Outcome, ScanResult, StatusUpdateRequest, UpdateOutcome};
use crate::store::RealtimeStore;

/// Flags every scanned sensor as used with one multi-path update per scan.
#[derive(Clone)]
pub struct ScanResultProcessor {
    store: Arc<dyn RealtimeStore>,
    sensors_path: String,
    used_status: i64,
    messages: Messages,
}

impl ScanResultProcessor {
    pub fn new(
        store: Arc<dyn RealtimeStore>,
        sensors_path: impl Into<String>,
        used_status: i64,
        language: Language,
    ) -> Self {
        Self {
            store,
            sensors_path: sensors_path.into(),
            used_status,
            messages: language.messages(),
        }
    }

    pub fn from_config(store: Arc<dyn RealtimeStore>, cfg: &Config) -> Self {
        Self::new(
            store,
            cfg.store.sensors_path.clone(),
            cfg.app.used_status,
            cfg.app.language,
        )
    }

    #[instrument(skip_all, fields(payloads = scan.len()))]
    pub async fn process_scan(&self, scan: &ScanResult) -> UpdateOutcome {
        let Some(request) = StatusUpdateRequest::for_scan(scan, self.used_status) else {
            debug!("no code scanned");
            return UpdateOutcome::nothing();
        };
        for payload in scan.payloads() {
            debug!(%payload, "scanned code");
        }

        let entries = request.len();
        let result = self
            .store
            .update_children(&self.sensors_path, request.into_updates())
            .await;

        let (outcome, message) = match result {
            Ok(()) => {
                info!(entries, "status saved");
                (Outcome::Success, self.messages.success)
            }
            Err(err) => {
                warn!(%err, entries, "status could not be saved");
                (Outcome::Failure(err.to_string()), self.messages.failure)
            }
        };
        UpdateOutcome {
            outcome,
            message: message.to_string(),
            payloads: scan.concatenated(),
        }
    }

    /// Run the update in the background; the outcome arrives on the receiver.
    pub fn submit(&self, scan: ScanResult) -> oneshot::Receiver<UpdateOutcome> {
        let (tx, rx) = oneshot::channel();
        let processor = self.clone();
        tokio::spawn(async move {
            let outcome = processor.process_scan(&scan).await;
            let _ = tx.send(outcome);
        });
        rx
    }
}
