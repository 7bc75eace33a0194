//! Promptgate Detectors
//!
//! Deterministic, stateless text scanners:
//! - PII detectors (email, phone, national id, payment card with Luhn)
//! - A coarse risk-phrase heuristic (prompt injection, system leak,
//!   self-harm cues)
//!
//! Every scanner is a pure function over its input text: no shared
//! state, identical output for identical input, safe on empty and very
//! large inputs.

pub mod detectors;
pub mod heuristic;

pub use detectors::{
    CardDetector, Detector, DetectorSet, EmailDetector, NationalIdDetector, PhoneDetector,
};
pub use heuristic::HeuristicClassifier;
