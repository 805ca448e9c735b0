//! Scanner collaborators: turn decoder output into scan responses.
use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::formats::BarcodeFormat;
use crate::model::ScanResult;

static SYMBOLOGY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9][A-Za-z0-9/\-]*):(.*)$").expect("valid regex"));

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ScanningMode {
    /// First recognized code ends the session.
    #[default]
    SingleAuto,
    /// First recognized code, confirmed by the user on a camera front end.
    SingleManual,
    /// Collect every code until the batch ends.
    Continuous,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanRequest {
    pub mode: ScanningMode,
    pub formats: Vec<BarcodeFormat>,
}

impl ScanRequest {
    pub fn new(mode: ScanningMode, formats: Vec<BarcodeFormat>) -> Self {
        Self { mode, formats }
    }

    /// An empty filter or one containing `AllFormats` accepts anything.
    /// Otherwise the code's format must be known and listed.
    pub fn accepts(&self, format: Option<BarcodeFormat>) -> bool {
        if self.formats.is_empty() || self.formats.contains(&BarcodeFormat::AllFormats) {
            return true;
        }
        format.map_or(false, |f| self.formats.contains(&f))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcode {
    pub format: Option<BarcodeFormat>,
    pub raw_value: String,
}

impl Barcode {
    /// Parse one decoder output line: `Symbology:payload` or a bare payload.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return None;
        }
        if let Some(caps) = SYMBOLOGY_LINE.captures(line) {
            if let Some(format) = BarcodeFormat::from_symbology(&caps[1]) {
                return Some(Self {
                    format: Some(format),
                    raw_value: caps[2].to_string(),
                });
            }
        }
        Some(Self {
            format: None,
            raw_value: line.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResponse {
    Single(Barcode),
    Multiple(Vec<Barcode>),
    Cancelled,
}

impl From<ScanResponse> for ScanResult {
    fn from(response: ScanResponse) -> Self {
        match response {
            ScanResponse::Single(barcode) => ScanResult::new(vec![barcode.raw_value]),
            ScanResponse::Multiple(barcodes) => {
                barcodes.into_iter().map(|b| b.raw_value).collect()
            }
            ScanResponse::Cancelled => ScanResult::empty(),
        }
    }
}

#[async_trait]
pub trait Scanner: Send + Sync {
    async fn scan(&self, request: &ScanRequest) -> Result<ScanResponse>;

    /// True once no further scan can produce a code.
    fn exhausted(&self) -> bool {
        false
    }
}

/// Reads decoder output (e.g. `zbarcam`, `zbarimg`) line by line.
///
/// Single modes return the first accepted code. Continuous mode collects
/// accepted codes until a blank line or end of input.
pub struct LineScanner<R> {
    lines: Mutex<Lines<R>>,
    eof: AtomicBool,
}

impl<R: AsyncBufRead + Unpin + Send> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
            eof: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Scanner for LineScanner<R> {
    async fn scan(&self, request: &ScanRequest) -> Result<ScanResponse> {
        let mut lines = self.lines.lock().await;
        let mut collected = Vec::new();

        while let Some(line) = lines.next_line().await? {
            let Some(barcode) = Barcode::parse_line(&line) else {
                if request.mode == ScanningMode::Continuous && !collected.is_empty() {
                    break;
                }
                continue;
            };
            if !request.accepts(barcode.format) {
                trace!(format = ?barcode.format, "skipping filtered code");
                continue;
            }
            match request.mode {
                ScanningMode::SingleAuto | ScanningMode::SingleManual => {
                    return Ok(ScanResponse::Single(barcode));
                }
                ScanningMode::Continuous => collected.push(barcode),
            }
        }

        if collected.is_empty() {
            self.eof.store(true, Ordering::SeqCst);
            debug!("scanner input ended without a code");
            return Ok(ScanResponse::Cancelled);
        }
        Ok(ScanResponse::Multiple(collected))
    }

    fn exhausted(&self) -> bool {
        self.eof.load(Ordering::SeqCst)
    }
}

/// Hands out a fixed set of already decoded payloads once, then reports
/// cancellation.
///
/// The payloads form one scan result whatever the mode: a single accepted
/// code is answered as `Single`, several as `Multiple`.
#[derive(Debug)]
pub struct PresetScanner {
    payloads: Mutex<Option<Vec<String>>>,
    used: AtomicBool,
}

impl PresetScanner {
    pub fn new(payloads: Vec<String>) -> Self {
        Self {
            payloads: Mutex::new(Some(payloads)),
            used: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Scanner for PresetScanner {
    async fn scan(&self, request: &ScanRequest) -> Result<ScanResponse> {
        let payloads = self.payloads.lock().await.take().unwrap_or_default();
        self.used.store(true, Ordering::SeqCst);

        let mut accepted: Vec<Barcode> = payloads
            .iter()
            .filter_map(|p| Barcode::parse_line(p))
            .filter(|b| request.accepts(b.format))
            .collect();

        let response = match accepted.len() {
            0 => ScanResponse::Cancelled,
            1 => ScanResponse::Single(accepted.remove(0)),
            _ => ScanResponse::Multiple(accepted),
        };
        Ok(response)
    }

    fn exhausted(&self) -> bool {
        self.used.load(Ordering::SeqCst)
    }
}
