//! Barcode symbology encoding.
//!
//! Linear symbologies come from the barcoders crate, QR from qrcode. The
//! output is a plain module pattern; turning modules into pixels is the
//! barcode renderer's job.

use barcoders::sym::codabar::Codabar;
use barcoders::sym::code39::Code39;
use barcoders::sym::code93::Code93;
use barcoders::sym::code128::Code128;
use barcoders::sym::ean8::EAN8;
use barcoders::sym::ean13::EAN13;
use barcoders::sym::tf::TF;
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supported barcode formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Symbology {
    #[default]
    Code128,
    Code39,
    Code93,
    Ean13,
    Ean8,
    Itf,
    Codabar,
    Qr,
}

impl Symbology {
    pub const ALL: [Symbology; 8] = [
        Symbology::Code128,
        Symbology::Code39,
        Symbology::Code93,
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::Itf,
        Symbology::Codabar,
        Symbology::Qr,
    ];

    /// Parse a format name leniently ("code-128", "ean_13", "qrcode").
    pub fn parse(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();
        match key.as_str() {
            "CODE128" | "C128" => Some(Self::Code128),
            "CODE39" | "C39" => Some(Self::Code39),
            "CODE93" | "C93" => Some(Self::Code93),
            "EAN13" | "EAN" => Some(Self::Ean13),
            "EAN8" => Some(Self::Ean8),
            "ITF" | "ITF14" | "I25" => Some(Self::Itf),
            "CODABAR" => Some(Self::Codabar),
            "QR" | "QRCODE" => Some(Self::Qr),
            _ => None,
        }
    }

    /// Like [`Symbology::parse`], falling back to Code 128.
    pub fn parse_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code128 => "CODE128",
            Self::Code39 => "CODE39",
            Self::Code93 => "CODE93",
            Self::Ean13 => "EAN13",
            Self::Ean8 => "EAN8",
            Self::Itf => "ITF",
            Self::Codabar => "CODABAR",
            Self::Qr => "QR",
        }
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, Self::Qr)
    }
}

impl std::fmt::Display for Symbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An encoded symbol. `true` = dark module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Linear { modules: Vec<bool> },
    /// Square matrix, row-major, `size * size` modules.
    Matrix { size: usize, modules: Vec<bool> },
}

impl Symbol {
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        match self {
            Symbol::Linear { modules } => modules.get(x).copied().unwrap_or(false),
            Symbol::Matrix { size, modules } => {
                x < *size && y < *size && modules[y * size + x]
            }
        }
    }

    pub fn module_count(&self) -> usize {
        match self {
            Symbol::Linear { modules } => modules.len(),
            Symbol::Matrix { size, .. } => *size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("Barcode generator unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid {symbology} value {value:?}: {reason}")]
    InvalidValue {
        symbology: Symbology,
        value: String,
        reason: String,
    },
}

/// Encodes values as barcode symbols.
pub trait SymbolGenerator: Send + Sync {
    fn generate(&self, value: &str, symbology: Symbology) -> Result<Symbol, SymbolError>;
}

/// Generator backed by barcoders and qrcode.
#[derive(Debug, Clone, Copy, Default)]
pub struct BarcodeSymbols;

impl BarcodeSymbols {
    fn invalid(symbology: Symbology, value: &str, reason: impl ToString) -> SymbolError {
        SymbolError::InvalidValue {
            symbology,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn linear(&self, value: &str, symbology: Symbology) -> Result<Vec<u8>, SymbolError> {
        let fail = |e: barcoders::error::Error| Self::invalid(symbology, value, e);
        match symbology {
            // Character set B covers printable ASCII
            Symbology::Code128 => Ok(Code128::new(format!("\u{0181}{}", value)).map_err(fail)?.encode()),
            Symbology::Code39 => Ok(Code39::new(value.to_ascii_uppercase()).map_err(fail)?.encode()),
            Symbology::Code93 => Ok(Code93::new(value.to_ascii_uppercase()).map_err(fail)?.encode()),
            Symbology::Ean13 => {
                let digits = strip_check_digit(value, 12);
                Ok(EAN13::new(digits).map_err(fail)?.encode())
            }
            Symbology::Ean8 => {
                let digits = strip_check_digit(value, 7);
                Ok(EAN8::new(digits).map_err(fail)?.encode())
            }
            Symbology::Itf => {
                let padded = if value.len() % 2 == 1 {
                    format!("0{}", value)
                } else {
                    value.to_string()
                };
                Ok(TF::interleaved(padded).map_err(fail)?.encode())
            }
            Symbology::Codabar => {
                Ok(Codabar::new(with_codabar_guards(value)).map_err(fail)?.encode())
            }
            Symbology::Qr => Err(Self::invalid(symbology, value, "not a linear symbology")),
        }
    }

    fn matrix(&self, value: &str) -> Result<Symbol, SymbolError> {
        let code = QrCode::with_error_correction_level(value, EcLevel::M)
            .map_err(|e| Self::invalid(Symbology::Qr, value, e))?;
        let size = code.width();
        let mut modules = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                modules.push(code[(x, y)] == qrcode::Color::Dark);
            }
        }
        Ok(Symbol::Matrix { size, modules })
    }
}

impl SymbolGenerator for BarcodeSymbols {
    fn generate(&self, value: &str, symbology: Symbology) -> Result<Symbol, SymbolError> {
        if value.is_empty() {
            return Err(Self::invalid(symbology, value, "empty value"));
        }
        if symbology.is_matrix() {
            return self.matrix(value);
        }
        let encoded = self.linear(value, symbology)?;
        Ok(Symbol::Linear {
            modules: encoded.into_iter().map(|m| m == 1).collect(),
        })
    }
}

/// EAN payloads may arrive with their check digit; barcoders computes its own.
fn strip_check_digit(value: &str, data_len: usize) -> String {
    if value.len() == data_len + 1 && value.chars().all(|c| c.is_ascii_digit()) {
        value[..data_len].to_string()
    } else {
        value.to_string()
    }
}

fn with_codabar_guards(value: &str) -> String {
    let is_guard = |c: char| matches!(c.to_ascii_uppercase(), 'A' | 'B' | 'C' | 'D');
    let upper = value.to_ascii_uppercase();
    let starts = upper.chars().next().is_some_and(is_guard);
    let ends = upper.chars().last().is_some_and(is_guard);
    if starts && ends && upper.len() > 1 {
        upper
    } else {
        format!("A{}A", upper)
    }
}

/// Generator that always reports itself unavailable.
#[derive(Debug, Clone, Default)]
pub struct UnavailableSymbols;

impl SymbolGenerator for UnavailableSymbols {
    fn generate(&self, _value: &str, _symbology: Symbology) -> Result<Symbol, SymbolError> {
        Err(SymbolError::Unavailable("no barcode backend configured".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!(Symbology::parse("code-128"), Some(Symbology::Code128));
        assert_eq!(Symbology::parse("ean_13"), Some(Symbology::Ean13));
        assert_eq!(Symbology::parse("QRCode"), Some(Symbology::Qr));
        assert_eq!(Symbology::parse("pdf417"), None);
        assert_eq!(Symbology::parse_or_default("pdf417"), Symbology::Code128);
    }

    #[test]
    fn test_code128() {
        let symbol = BarcodeSymbols.generate("Hello", Symbology::Code128).unwrap();
        match symbol {
            Symbol::Linear { modules } => {
                assert!(!modules.is_empty());
                assert!(modules[0]);
            }
            other => panic!("expected linear symbol, got {:?}", other),
        }
    }

    #[test]
    fn test_qr_is_square() {
        let symbol = BarcodeSymbols.generate("https://example.com", Symbology::Qr).unwrap();
        match symbol {
            Symbol::Matrix { size, modules } => {
                assert!(size >= 21);
                assert_eq!(modules.len(), size * size);
                // finder pattern corner
                assert!(modules[0]);
            }
            other => panic!("expected matrix symbol, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_value_rejected() {
        let err = BarcodeSymbols.generate("", Symbology::Code128).unwrap_err();
        assert!(matches!(err, SymbolError::InvalidValue { .. }));
    }

    #[test]
    fn test_ean13_rejects_letters() {
        let err = BarcodeSymbols.generate("ABCDEFGHIJKL", Symbology::Ean13).unwrap_err();
        assert!(matches!(err, SymbolError::InvalidValue { .. }));
    }

    #[test]
    fn test_codabar_guards() {
        assert_eq!(with_codabar_guards("1234"), "A1234A");
        assert_eq!(with_codabar_guards("b1234d"), "B1234D");
    }

    #[test]
    fn test_unavailable() {
        let err = UnavailableSymbols.generate("1", Symbology::Qr).unwrap_err();
        assert!(matches!(err, SymbolError::Unavailable(_)));
    }
}
