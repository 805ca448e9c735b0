//! Scan barcodes and flag the scanned sensors as used in a realtime database.

pub mod config;
pub mod display;
pub mod formats;
pub mod model;
pub mod processor;
pub mod registrar;
pub mod scanner;
pub mod session;
pub mod store;
