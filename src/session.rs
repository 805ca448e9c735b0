//! One scan session: scanner → processor → display.
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::display::Display;
use crate::model::{ScanResult, SessionState, UpdateOutcome};
use crate::processor::ScanResultProcessor;
use crate::scanner::{ScanRequest, ScanResponse, Scanner};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a scan is already in progress ({0})")]
    Busy(&'static str),
}

pub struct ScanSession {
    scanner: Arc<dyn Scanner>,
    processor: ScanResultProcessor,
    display: Arc<dyn Display>,
    request: ScanRequest,
    state: Mutex<SessionState>,
    last_message: Mutex<String>,
}

/// Puts the session back to idle however the scan ends.
struct IdleOnDrop<'a>(&'a Mutex<SessionState>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        let mut state = self.0.lock().unwrap_or_else(|e| e.into_inner());
        *state = SessionState::Idle;
    }
}

impl ScanSession {
    pub fn new(
        scanner: Arc<dyn Scanner>,
        processor: ScanResultProcessor,
        display: Arc<dyn Display>,
        request: ScanRequest,
    ) -> Self {
        Self {
            scanner,
            processor,
            display,
            request,
            state: Mutex::new(SessionState::Idle),
            last_message: Mutex::new(String::new()),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn last_message(&self) -> String {
        self.last_message
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn scanner_exhausted(&self) -> bool {
        self.scanner.exhausted()
    }

    fn set_state(&self, next: SessionState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    fn begin(&self) -> Result<IdleOnDrop<'_>, SessionError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state != SessionState::Idle {
            return Err(SessionError::Busy(state.as_str()));
        }
        *state = SessionState::Scanning;
        Ok(IdleOnDrop(&self.state))
    }

    #[instrument(skip_all)]
    pub async fn scan_once(&self) -> Result<UpdateOutcome, SessionError> {
        let _idle = self.begin()?;
        self.display.set_status("");

        let response = match self.scanner.scan(&self.request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(?err, "scanner failed; treating as empty scan");
                ScanResponse::Cancelled
            }
        };
        self.set_state(SessionState::ResultReceived);
        let scan = ScanResult::from(response);
        debug!(codes = scan.len(), "scan result received");

        let outcome = if scan.is_empty() {
            UpdateOutcome::nothing()
        } else {
            self.set_state(SessionState::Updating);
            self.display.busy(true);
            let outcome = self.processor.process_scan(&scan).await;
            self.display.busy(false);
            outcome
        };

        self.display.set_status(&outcome.message);
        if let Some(notice) = outcome.notice() {
            self.display.notify(&notice);
        }
        *self.last_message.lock().unwrap_or_else(|e| e.into_inner()) = outcome.message.clone();
        Ok(outcome)
    }
}
