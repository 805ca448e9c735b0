//! Barcode formats understood by the scanner, keyed by the recognizer's codes.
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Config files and the command line share the same snake_case names.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    clap::ValueEnum,
)]
pub enum BarcodeFormat {
    #[serde(rename = "all_formats")]
    #[value(name = "all_formats")]
    AllFormats,
    #[serde(rename = "code_128")]
    #[value(name = "code_128")]
    Code128,
    #[serde(rename = "code_39")]
    #[value(name = "code_39")]
    Code39,
    #[serde(rename = "code_93")]
    #[value(name = "code_93")]
    Code93,
    #[serde(rename = "codabar")]
    #[value(name = "codabar")]
    Codabar,
    #[serde(rename = "data_matrix")]
    #[value(name = "data_matrix")]
    DataMatrix,
    #[serde(rename = "ean_13")]
    #[value(name = "ean_13")]
    Ean13,
    #[serde(rename = "ean_8")]
    #[value(name = "ean_8")]
    Ean8,
    #[serde(rename = "itf")]
    #[value(name = "itf")]
    Itf,
    #[serde(rename = "qr_code")]
    #[value(name = "qr_code")]
    QrCode,
    #[serde(rename = "upc_a")]
    #[value(name = "upc_a")]
    UpcA,
    #[serde(rename = "upc_e")]
    #[value(name = "upc_e")]
    UpcE,
    #[serde(rename = "pdf_417")]
    #[value(name = "pdf_417")]
    Pdf417,
    #[serde(rename = "aztec")]
    #[value(name = "aztec")]
    Aztec,
}

/// Format code → display name.
pub const FORMAT_TABLE: &[(BarcodeFormat, u32, &str)] = &[
    (BarcodeFormat::AllFormats, 0, "All Formats"),
    (BarcodeFormat::Code128, 1, "Code 128"),
    (BarcodeFormat::Code39, 2, "Code 39"),
    (BarcodeFormat::Code93, 4, "Code 93"),
    (BarcodeFormat::Codabar, 8, "Codabar"),
    (BarcodeFormat::DataMatrix, 16, "Data Matrix"),
    (BarcodeFormat::Ean13, 32, "EAN-13"),
    (BarcodeFormat::Ean8, 64, "EAN-8"),
    (BarcodeFormat::Itf, 128, "ITF"),
    (BarcodeFormat::QrCode, 256, "QR Code"),
    (BarcodeFormat::UpcA, 512, "UPC-A"),
    (BarcodeFormat::UpcE, 1024, "UPC-E"),
    (BarcodeFormat::Pdf417, 2048, "PDF417"),
    (BarcodeFormat::Aztec, 4096, "Aztec"),
];

static SORTED_NAMES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut names: Vec<&'static str> = FORMAT_TABLE.iter().map(|(_, _, name)| *name).collect();
    names.sort_unstable();
    names
});

impl BarcodeFormat {
    fn entry(self) -> &'static (BarcodeFormat, u32, &'static str) {
        FORMAT_TABLE
            .iter()
            .find(|(format, _, _)| *format == self)
            .unwrap_or(&FORMAT_TABLE[0])
    }

    pub fn code(self) -> u32 {
        self.entry().1
    }

    pub fn display_name(self) -> &'static str {
        self.entry().2
    }

    pub fn from_code(code: u32) -> Option<Self> {
        FORMAT_TABLE
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(format, _, _)| *format)
    }

    /// Map a zbar symbology name (`QR-Code`, `EAN-13`, `I2/5`, ...) to a format.
    pub fn from_symbology(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();
        let format = match normalized.as_str() {
            "QRCODE" | "QR" => BarcodeFormat::QrCode,
            "CODE128" => BarcodeFormat::Code128,
            "CODE39" => BarcodeFormat::Code39,
            "CODE93" => BarcodeFormat::Code93,
            "CODABAR" => BarcodeFormat::Codabar,
            "DATAMATRIX" => BarcodeFormat::DataMatrix,
            "EAN13" => BarcodeFormat::Ean13,
            "EAN8" => BarcodeFormat::Ean8,
            "I25" | "ITF" => BarcodeFormat::Itf,
            "UPCA" => BarcodeFormat::UpcA,
            "UPCE" => BarcodeFormat::UpcE,
            "PDF417" => BarcodeFormat::Pdf417,
            "AZTEC" => BarcodeFormat::Aztec,
            _ => return None,
        };
        Some(format)
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Display names of every format, sorted for selection menus.
pub fn format_type_items() -> &'static [&'static str] {
    &SORTED_NAMES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_table() {
        assert_eq!(BarcodeFormat::QrCode.code(), 256);
        assert_eq!(BarcodeFormat::AllFormats.code(), 0);
        assert_eq!(BarcodeFormat::from_code(256), Some(BarcodeFormat::QrCode));
        assert_eq!(BarcodeFormat::from_code(3), None);
    }

    #[test]
    fn display_names() {
        assert_eq!(BarcodeFormat::QrCode.to_string(), "QR Code");
        assert_eq!(BarcodeFormat::AllFormats.display_name(), "All Formats");
    }

    #[test]
    fn type_items_are_sorted() {
        let items = format_type_items();
        assert_eq!(items.len(), FORMAT_TABLE.len());
        assert_eq!(items[0], "All Formats");
        assert!(items.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn zbar_symbology_names() {
        let cases = [
            ("QR-Code", BarcodeFormat::QrCode),
            ("EAN-13", BarcodeFormat::Ean13),
            ("I2/5", BarcodeFormat::Itf),
            ("CODE-128", BarcodeFormat::Code128),
        ];
        for (name, expected) in cases {
            assert_eq!(BarcodeFormat::from_symbology(name), Some(expected));
        }
        assert_eq!(BarcodeFormat::from_symbology("http"), None);
    }

    #[test]
    fn config_and_cli_names_agree() {
        use clap::ValueEnum;

        for format in BarcodeFormat::value_variants() {
            let cli_name = format.to_possible_value().unwrap().get_name().to_string();
            let yaml_name = serde_json::to_value(format).unwrap();
            assert_eq!(yaml_name, serde_json::Value::String(cli_name.clone()));
            assert_eq!(
                serde_yaml::from_str::<BarcodeFormat>(&cli_name).unwrap(),
                *format
            );
        }
        assert_eq!(
            serde_yaml::from_str::<BarcodeFormat>("ean_13").unwrap(),
            BarcodeFormat::Ean13
        );
        assert_eq!(
            BarcodeFormat::from_str("qr_code", false).unwrap(),
            BarcodeFormat::QrCode
        );
    }
}
