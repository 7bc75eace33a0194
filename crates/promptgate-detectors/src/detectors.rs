//! PII detectors
//!
//! Each detector scans a text blob for one category of personally
//! identifiable information and emits at most one violation per call:
//! presence, not count, is what matters for policy purposes.
//!
//! The payment-card detector deliberately avoids regex. Card numbers are
//! found by a single linear pass that collects digit runs and validates
//! them with the Luhn checksum, so arbitrary long digit strings (phone
//! numbers, account ids) are not flagged.

use promptgate_core::{Error, Result, Violation};
use regex::Regex;

/// A deterministic, stateless scanner for one violation category
pub trait Detector: Send + Sync {
    /// Detector name (matches the violation category suffix)
    fn name(&self) -> &str;

    /// Scan the text, returning zero or one violation
    fn detect(&self, text: &str) -> Vec<Violation>;
}

/// Email address detector
///
/// Matches the standard `local@domain.tld` shape: ASCII local part,
/// dotted domain, 2+ letter TLD, case-insensitive.
pub struct EmailDetector {
    pattern: Regex,
}

impl EmailDetector {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b")
            .map_err(|e| Error::internal(format!("failed to compile email pattern: {}", e)))?;
        Ok(Self { pattern })
    }
}

impl Detector for EmailDetector {
    fn name(&self) -> &str {
        "email"
    }

    fn detect(&self, text: &str) -> Vec<Violation> {
        if self.pattern.is_match(text) {
            vec![Violation::new("pii.email", "email address detected")]
        } else {
            Vec::new()
        }
    }
}

/// Phone number detector (NANP-style numbering)
///
/// Optional country-code prefix followed by a 10-digit number in common
/// separator styles: dashes, dots, spaces, parentheses around the area
/// code.
pub struct PhoneDetector {
    pattern: Regex,
}

impl PhoneDetector {
    pub fn new() -> Result<Self> {
        let pattern =
            Regex::new(r"(?:\+?1[-.\s]?)?(?:\(\d{3}\)\s?|\d{3}[-.\s]?)\d{3}[-.\s]?\d{4}\b")
                .map_err(|e| Error::internal(format!("failed to compile phone pattern: {}", e)))?;
        Ok(Self { pattern })
    }
}

impl Detector for PhoneDetector {
    fn name(&self) -> &str {
        "phone"
    }

    fn detect(&self, text: &str) -> Vec<Violation> {
        if self.pattern.is_match(text) {
            vec![Violation::new("pii.phone", "phone number detected")]
        } else {
            Vec::new()
        }
    }
}

/// National id detector
///
/// Strict `###-##-####` digit grouping only.
pub struct NationalIdDetector {
    pattern: Regex,
}

impl NationalIdDetector {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").map_err(|e| {
            Error::internal(format!("failed to compile national id pattern: {}", e))
        })?;
        Ok(Self { pattern })
    }
}

impl Detector for NationalIdDetector {
    fn name(&self) -> &str {
        "national_id"
    }

    fn detect(&self, text: &str) -> Vec<Violation> {
        if self.pattern.is_match(text) {
            vec![Violation::new("pii.national_id", "national id number detected")]
        } else {
            Vec::new()
        }
    }
}

/// Payment card number detector
///
/// Two-stage check: extract maximal digit runs (spaces and dashes
/// allowed inside) with a stripped length of 13-19 digits, then apply
/// the Luhn mod-10 checksum to each candidate. A violation is emitted
/// only when at least one candidate passes.
pub struct CardDetector;

impl CardDetector {
    pub fn new() -> Self {
        Self
    }

    /// Collect candidate digit runs from the text in one linear pass
    fn candidates(text: &str) -> Vec<Vec<u8>> {
        let mut candidates = Vec::new();
        let mut digits: Vec<u8> = Vec::new();
        let mut in_run = false;

        for ch in text.chars() {
            if ch.is_ascii_digit() {
                digits.push(ch as u8 - b'0');
                in_run = true;
            } else if in_run && (ch == ' ' || ch == '-') {
                // separator inside a run, keep scanning
            } else {
                if (13..=19).contains(&digits.len()) {
                    candidates.push(std::mem::take(&mut digits));
                } else {
                    digits.clear();
                }
                in_run = false;
            }
        }
        if (13..=19).contains(&digits.len()) {
            candidates.push(digits);
        }

        candidates
    }
}

impl Default for CardDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for CardDetector {
    fn name(&self) -> &str {
        "credit_card"
    }

    fn detect(&self, text: &str) -> Vec<Violation> {
        let valid = Self::candidates(text).iter().any(|c| luhn_valid(c));
        if valid {
            vec![Violation::new("pii.credit_card", "payment card number detected")]
        } else {
            Vec::new()
        }
    }
}

/// Luhn mod-10 checksum
///
/// Starting from the rightmost digit, double every second digit moving
/// leftward, subtract 9 from doubled values exceeding 9, sum, valid iff
/// divisible by 10.
pub fn luhn_valid(digits: &[u8]) -> bool {
    if digits.is_empty() {
        return false;
    }

    let mut sum = 0u32;
    for (i, &d) in digits.iter().rev().enumerate() {
        let mut value = u32::from(d);
        if i % 2 == 1 {
            value *= 2;
            if value > 9 {
                value -= 9;
            }
        }
        sum += value;
    }
    sum % 10 == 0
}

/// All PII detectors in their fixed evaluation order
pub struct DetectorSet {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorSet {
    /// Build the full detector set
    pub fn new() -> Result<Self> {
        Ok(Self {
            detectors: vec![
                Box::new(EmailDetector::new()?),
                Box::new(PhoneDetector::new()?),
                Box::new(NationalIdDetector::new()?),
                Box::new(CardDetector::new()),
            ],
        })
    }

    /// Run every detector against the text, preserving detector order
    pub fn detect(&self, text: &str) -> Vec<Violation> {
        self.detectors
            .iter()
            .flat_map(|d| d.detect(text))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_detection() {
        let detector = EmailDetector::new().unwrap();
        let found = detector.detect("Contact me at jane@example.com");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].category, "pii.email");
    }

    #[test]
    fn test_email_case_insensitive() {
        let detector = EmailDetector::new().unwrap();
        assert!(!detector.detect("JANE@EXAMPLE.COM").is_empty());
    }

    #[test]
    fn test_email_single_violation_for_multiple_matches() {
        let detector = EmailDetector::new().unwrap();
        let found = detector.detect("a@example.com and b@example.org");
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_no_email_in_clean_text() {
        let detector = EmailDetector::new().unwrap();
        assert!(detector.detect("nothing to see here").is_empty());
    }

    #[test]
    fn test_phone_separator_styles() {
        let detector = PhoneDetector::new().unwrap();
        for text in [
            "555-123-4567",
            "555.123.4567",
            "555 123 4567",
            "(555) 123-4567",
            "+1 555-123-4567",
            "1-555-123-4567",
        ] {
            assert!(!detector.detect(text).is_empty(), "should match {:?}", text);
        }
    }

    #[test]
    fn test_national_id_strict_grouping() {
        let detector = NationalIdDetector::new().unwrap();
        assert!(!detector.detect("ssn is 123-45-6789").is_empty());
        assert!(detector.detect("123-456-789").is_empty());
        assert!(detector.detect("123456789").is_empty());
    }

    #[test]
    fn test_luhn_known_vectors() {
        // 4111111111111111 is the canonical Visa test number
        let valid: Vec<u8> = "4111111111111111".bytes().map(|b| b - b'0').collect();
        assert!(luhn_valid(&valid));

        let invalid: Vec<u8> = "4111111111111112".bytes().map(|b| b - b'0').collect();
        assert!(!luhn_valid(&invalid));
    }

    #[test]
    fn test_card_detection_with_separators() {
        let detector = CardDetector::new();
        assert!(!detector.detect("card: 4111 1111 1111 1111").is_empty());
        assert!(!detector.detect("card: 4111-1111-1111-1111").is_empty());
        assert!(!detector.detect("card: 4111111111111111").is_empty());
    }

    #[test]
    fn test_card_rejects_luhn_invalid_runs() {
        let detector = CardDetector::new();
        assert!(detector.detect("4111111111111112").is_empty());
    }

    #[test]
    fn test_card_ignores_short_and_long_runs() {
        let detector = CardDetector::new();
        // Phone-length and id-length digit runs never reach the checksum
        assert!(detector.detect("5551234567").is_empty());
        assert!(detector.detect("123-45-6789").is_empty());
        // 20 digits is past the candidate bound even if the checksum would pass
        assert!(detector.detect("41111111111111110000 5").is_empty());
    }

    #[test]
    fn test_detector_set_order_and_aggregation() {
        let set = DetectorSet::new().unwrap();
        let found = set.detect("jane@example.com or 123-45-6789");
        let categories: Vec<&str> = found.iter().map(|v| v.category.as_str()).collect();
        assert_eq!(categories, vec!["pii.email", "pii.national_id"]);
    }

    #[test]
    fn test_detectors_safe_on_empty_and_large_input() {
        let set = DetectorSet::new().unwrap();
        assert!(set.detect("").is_empty());

        let large = "word ".repeat(100_000);
        assert!(set.detect(&large).is_empty());
    }

    #[test]
    fn test_detection_is_idempotent() {
        let set = DetectorSet::new().unwrap();
        let text = "reach me at jane@example.com or 555-123-4567";
        assert_eq!(set.detect(text), set.detect(text));
    }
}
