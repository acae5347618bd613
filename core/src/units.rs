//! # Measurement Units and Nominal System Frequency
//!
//! This module defines the unit-level metadata of the six measured signals and the
//! nominal power-system frequency the estimator is tuned to.
//!
//! ## Key Components
//!
//! - `SignalType`: Voltage or current, with display names, symbols and physical units.
//! - `SignalPhase`: Phase A, B or C.
//! - `NominalFrequency`: The nominal system frequency (50 Hz or 60 Hz).
//!
//! ## Usage
//!
//! `SignalType` selects which calibration pair applies to a channel, and
//! `NominalFrequency` drives fundamental-bin selection and frequency tracking.

use crate::common::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of phases (A, B, C).
pub const PHASE_COUNT: usize = 3;

/// Kind of quantity carried by a channel.
///
/// # Variants
///
/// * `Voltage`: Measured in volts.
/// * `Current`: Measured in amperes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalType {
    Voltage,
    Current,
}

impl SignalType {
    /// Full name, e.g. "Voltage".
    pub fn name(&self) -> &'static str {
        match self {
            SignalType::Voltage => "Voltage",
            SignalType::Current => "Current",
        }
    }

    /// Quantity symbol, `V` for voltage and `I` for current.
    pub fn symbol(&self) -> char {
        match self {
            SignalType::Voltage => 'V',
            SignalType::Current => 'I',
        }
    }

    /// Name of the physical unit, e.g. "Volts".
    pub fn unit_name(&self) -> &'static str {
        match self {
            SignalType::Voltage => "Volts",
            SignalType::Current => "Amperes",
        }
    }

    /// Symbol of the physical unit, `V` for volts and `A` for amperes.
    pub fn unit_symbol(&self) -> char {
        match self {
            SignalType::Voltage => 'V',
            SignalType::Current => 'A',
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Phase of a three-phase system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalPhase {
    A,
    B,
    C,
}

impl SignalPhase {
    /// Zero-based position of the phase (A = 0).
    pub fn index(&self) -> usize {
        match self {
            SignalPhase::A => 0,
            SignalPhase::B => 1,
            SignalPhase::C => 2,
        }
    }

    /// Single-letter name of the phase.
    pub fn name(&self) -> char {
        match self {
            SignalPhase::A => 'A',
            SignalPhase::B => 'B',
            SignalPhase::C => 'C',
        }
    }
}

impl fmt::Display for SignalPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Indicates the nominal frequency of the power system.
///
/// # Variants
///
/// * `Hz50`: 50 Hz systems (Europe, most of Asia and Africa).
/// * `Hz60`: 60 Hz systems (the Americas, parts of Asia).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NominalFrequency {
    #[default]
    Hz50,
    Hz60,
}

impl NominalFrequency {
    /// The nominal frequency in hertz.
    pub fn hz(&self) -> f64 {
        match self {
            NominalFrequency::Hz50 => 50.0,
            NominalFrequency::Hz60 => 60.0,
        }
    }
}

impl FromStr for NominalFrequency {
    type Err = ParseError;

    /// Parses "50", "60", "50Hz" or "60 Hz"; the unit suffix is case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = match trimmed.len().checked_sub(2) {
            Some(split)
                if trimmed.is_char_boundary(split)
                    && trimmed[split..].eq_ignore_ascii_case("hz") =>
            {
                trimmed[..split].trim_end()
            }
            _ => trimmed,
        };
        match value {
            "50" => Ok(NominalFrequency::Hz50),
            "60" => Ok(NominalFrequency::Hz60),
            _ => Err(ParseError::InvalidFormat {
                message: format!(
                    "Invalid nominal frequency: expected {} or {}, got {:?}",
                    NominalFrequency::Hz50,
                    NominalFrequency::Hz60,
                    s
                ),
            }),
        }
    }
}

impl fmt::Display for NominalFrequency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NominalFrequency::Hz50 => write!(f, "50 Hz"),
            NominalFrequency::Hz60 => write!(f, "60 Hz"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominal_frequency_parsing() {
        assert_eq!("50".parse::<NominalFrequency>().unwrap(), NominalFrequency::Hz50);
        assert_eq!("60 Hz".parse::<NominalFrequency>().unwrap(), NominalFrequency::Hz60);
        assert_eq!("50Hz".parse::<NominalFrequency>().unwrap(), NominalFrequency::Hz50);
        assert_eq!(" 60hz ".parse::<NominalFrequency>().unwrap(), NominalFrequency::Hz60);
        for bad in ["55", "5.0", "-50", "x5y0", "50 Hz Hz", "Hz", "", "500"] {
            assert!(
                matches!(
                    bad.parse::<NominalFrequency>(),
                    Err(ParseError::InvalidFormat { .. })
                ),
                "{:?} should not parse",
                bad
            );
        }
        assert_eq!(NominalFrequency::default().hz(), 50.0);
    }

    #[test]
    fn test_signal_type_units() {
        assert_eq!(SignalType::Voltage.unit_symbol(), 'V');
        assert_eq!(SignalType::Current.unit_symbol(), 'A');
        assert_eq!(SignalType::Current.symbol(), 'I');
        assert_eq!(SignalType::Current.unit_name(), "Amperes");
    }
}
