//! Discrete value tables for Canon exposure properties.
//!
//! The camera exchanges shutter speed, aperture, ISO and AF mode as opaque
//! device codes. Each table below pairs a code with its semantic value (seconds,
//! f-number, ISO sensitivity) and a display label. Codes that do not stand for
//! a regular number (Bulb, Auto, Not valid) carry `None` as their value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::camera::error::{CameraError, Result};

use super::types::{
    EdsPropertyID, PROP_ID_AF_MODE, PROP_ID_AV, PROP_ID_ISO_SPEED, PROP_ID_TV,
};

/// Device code used by every table for "not valid".
pub const INVALID_CODE: u32 = 0xFFFF_FFFF;

/// Device code for automatic ISO.
pub const ISO_AUTO_CODE: u32 = 0x0000_0000;

/// 2^(-1/3): the 1/3-stop variants of some shutter speeds.
const THIRD_STOP_SHORTER: f64 = 0.793_700_525_984_099_8;

/// 2^(1/6): the 1/3-stop variants of some apertures.
const SIXTH_STOP_WIDER: f64 = 1.122_462_048_309_373;

/// One entry of a discrete value table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscreteValue {
    /// Device code as read from or written to the camera.
    pub code: u32,
    /// Semantic value, or `None` for Bulb/Auto/Not valid.
    pub value: Option<f64>,
    /// Display label.
    pub label: &'static str,
}

const fn defined(code: u32, value: f64, label: &'static str) -> DiscreteValue {
    DiscreteValue {
        code,
        value: Some(value),
        label,
    }
}

const fn undefined(code: u32, label: &'static str) -> DiscreteValue {
    DiscreteValue {
        code,
        value: None,
        label,
    }
}

/// Shutter speeds, in seconds.
pub static SHUTTER_SPEEDS: &[DiscreteValue] = &[
    undefined(0x0C, "Bulb"),
    defined(0x10, 30.0, "30\""),
    defined(0x13, 25.0, "25\""),
    defined(0x14, 20.0, "20\""),
    defined(0x15, 20.0 * THIRD_STOP_SHORTER, "20\" (1/3)"),
    defined(0x18, 15.0, "15\""),
    defined(0x1B, 13.0, "13\""),
    defined(0x1C, 10.0, "10\""),
    defined(0x1D, 10.0 * THIRD_STOP_SHORTER, "10\" (1/3)"),
    defined(0x20, 8.0, "8\""),
    defined(0x23, 6.0, "6\""),
    defined(0x24, 6.0 * THIRD_STOP_SHORTER, "6\" (1/3)"),
    defined(0x25, 5.0, "5\""),
    defined(0x28, 4.0, "4\""),
    defined(0x2B, 3.2, "3\"2"),
    defined(0x2C, 3.0, "3\""),
    defined(0x2D, 2.5, "2\"5"),
    defined(0x30, 2.0, "2\""),
    defined(0x33, 1.6, "1\"6"),
    defined(0x34, 1.5, "1\"5"),
    defined(0x35, 1.3, "1\"3"),
    defined(0x38, 1.0, "1\""),
    defined(0x3B, 0.8, "0\"8"),
    defined(0x3C, 0.7, "0\"7"),
    defined(0x3D, 0.6, "0\"6"),
    defined(0x40, 0.5, "0\"5"),
    defined(0x43, 0.4, "0\"4"),
    defined(0x44, 0.3, "0\"3"),
    defined(0x45, 0.3 * THIRD_STOP_SHORTER, "0\"3 (1/3)"),
    defined(0x48, 1.0 / 4.0, "1/4"),
    defined(0x4B, 1.0 / 5.0, "1/5"),
    defined(0x4C, 1.0 / 6.0, "1/6"),
    defined(0x4D, (1.0 / 6.0) * THIRD_STOP_SHORTER, "1/6 (1/3)"),
    defined(0x50, 1.0 / 8.0, "1/8"),
    defined(0x53, (1.0 / 10.0) * THIRD_STOP_SHORTER, "1/10 (1/3)"),
    defined(0x54, 1.0 / 10.0, "1/10"),
    defined(0x55, 1.0 / 13.0, "1/13"),
    defined(0x58, 1.0 / 15.0, "1/15"),
    defined(0x5B, (1.0 / 20.0) * THIRD_STOP_SHORTER, "1/20 (1/3)"),
    defined(0x5C, 1.0 / 20.0, "1/20"),
    defined(0x5D, 1.0 / 25.0, "1/25"),
    defined(0x60, 1.0 / 30.0, "1/30"),
    defined(0x63, 1.0 / 40.0, "1/40"),
    defined(0x64, 1.0 / 45.0, "1/45"),
    defined(0x65, 1.0 / 50.0, "1/50"),
    defined(0x68, 1.0 / 60.0, "1/60"),
    defined(0x6B, 1.0 / 80.0, "1/80"),
    defined(0x6C, 1.0 / 90.0, "1/90"),
    defined(0x6D, 1.0 / 100.0, "1/100"),
    defined(0x70, 1.0 / 125.0, "1/125"),
    defined(0x73, 1.0 / 160.0, "1/160"),
    defined(0x74, 1.0 / 180.0, "1/180"),
    defined(0x75, 1.0 / 200.0, "1/200"),
    defined(0x78, 1.0 / 250.0, "1/250"),
    defined(0x7B, 1.0 / 320.0, "1/320"),
    defined(0x7C, 1.0 / 350.0, "1/350"),
    defined(0x7D, 1.0 / 400.0, "1/400"),
    defined(0x80, 1.0 / 500.0, "1/500"),
    defined(0x83, 1.0 / 640.0, "1/640"),
    defined(0x84, 1.0 / 750.0, "1/750"),
    defined(0x85, 1.0 / 800.0, "1/800"),
    defined(0x88, 1.0 / 1000.0, "1/1000"),
    defined(0x8B, 1.0 / 1250.0, "1/1250"),
    defined(0x8C, 1.0 / 1500.0, "1/1500"),
    defined(0x8D, 1.0 / 1600.0, "1/1600"),
    defined(0x90, 1.0 / 2000.0, "1/2000"),
    defined(0x93, 1.0 / 2500.0, "1/2500"),
    defined(0x94, 1.0 / 3000.0, "1/3000"),
    defined(0x95, 1.0 / 3200.0, "1/3200"),
    defined(0x98, 1.0 / 4000.0, "1/4000"),
    defined(0x9B, 1.0 / 5000.0, "1/5000"),
    defined(0x9C, 1.0 / 6000.0, "1/6000"),
    defined(0x9D, 1.0 / 6400.0, "1/6400"),
    defined(0xA0, 1.0 / 8000.0, "1/8000"),
    defined(0xA3, 1.0 / 10000.0, "1/10000"),
    defined(0xA5, 1.0 / 12800.0, "1/12800"),
    defined(0xA8, 1.0 / 16000.0, "1/16000"),
    defined(0xAB, 1.0 / 20000.0, "1/20000"),
    defined(0xAD, 1.0 / 25600.0, "1/25600"),
    defined(0xB0, 1.0 / 32000.0, "1/32000"),
    undefined(INVALID_CODE, "Not valid"),
];

/// Apertures, as f-numbers.
pub static APERTURES: &[DiscreteValue] = &[
    defined(0x08, 1.0, "f/1"),
    defined(0x0B, 1.1, "f/1.1"),
    defined(0x0C, 1.2, "f/1.2"),
    defined(0x0D, 1.2 * SIXTH_STOP_WIDER, "f/1.2 (1/3)"),
    defined(0x10, 1.4, "f/1.4"),
    defined(0x13, 1.6, "f/1.6"),
    defined(0x14, 1.8, "f/1.8"),
    defined(0x15, 1.8 * SIXTH_STOP_WIDER, "f/1.8 (1/3)"),
    defined(0x18, 2.0, "f/2"),
    defined(0x1B, 2.2, "f/2.2"),
    defined(0x1C, 2.5, "f/2.5"),
    defined(0x1D, 2.5 * SIXTH_STOP_WIDER, "f/2.5 (1/3)"),
    defined(0x20, 2.8, "f/2.8"),
    defined(0x23, 3.2, "f/3.2"),
    defined(0x85, 3.4, "f/3.4"),
    defined(0x24, 3.5, "f/3.5"),
    defined(0x25, 3.5 * SIXTH_STOP_WIDER, "f/3.5 (1/3)"),
    defined(0x28, 4.0, "f/4"),
    defined(0x2B, 4.5, "f/4.5"),
    defined(0x2D, 5.0, "f/5"),
    defined(0x30, 5.6, "f/5.6"),
    defined(0x33, 6.3, "f/6.3"),
    defined(0x34, 6.7, "f/6.7"),
    defined(0x35, 7.1, "f/7.1"),
    defined(0x38, 8.0, "f/8"),
    defined(0x3B, 9.0, "f/9"),
    defined(0x3C, 9.5, "f/9.5"),
    defined(0x3D, 10.0, "f/10"),
    defined(0x40, 11.0, "f/11"),
    defined(0x43, 13.0 * SIXTH_STOP_WIDER, "f/13 (1/3)"),
    defined(0x44, 13.0, "f/13"),
    defined(0x45, 14.0, "f/14"),
    defined(0x48, 16.0, "f/16"),
    defined(0x4B, 18.0, "f/18"),
    defined(0x4C, 19.0, "f/19"),
    defined(0x4D, 20.0, "f/20"),
    defined(0x50, 22.0, "f/22"),
    defined(0x53, 25.0, "f/25"),
    defined(0x54, 27.0, "f/27"),
    defined(0x55, 29.0, "f/29"),
    defined(0x58, 32.0, "f/32"),
    defined(0x5B, 36.0, "f/36"),
    defined(0x5C, 38.0, "f/38"),
    defined(0x5D, 40.0, "f/40"),
    defined(0x60, 45.0, "f/45"),
    defined(0x63, 51.0, "f/51"),
    defined(0x64, 54.0, "f/54"),
    defined(0x65, 57.0, "f/57"),
    defined(0x68, 64.0, "f/64"),
    defined(0x6B, 72.0, "f/72"),
    defined(0x6C, 76.0, "f/76"),
    defined(0x6D, 80.0, "f/80"),
    defined(0x70, 91.0, "f/91"),
    undefined(INVALID_CODE, "Not valid"),
];

/// ISO sensitivities.
pub static ISO_SPEEDS: &[DiscreteValue] = &[
    undefined(ISO_AUTO_CODE, "Auto"),
    defined(0x28, 6.0, "ISO 6"),
    defined(0x30, 12.0, "ISO 12"),
    defined(0x38, 25.0, "ISO 25"),
    defined(0x40, 50.0, "ISO 50"),
    defined(0x48, 100.0, "ISO 100"),
    defined(0x4B, 125.0, "ISO 125"),
    defined(0x4D, 160.0, "ISO 160"),
    defined(0x50, 200.0, "ISO 200"),
    defined(0x53, 250.0, "ISO 250"),
    defined(0x55, 320.0, "ISO 320"),
    defined(0x58, 400.0, "ISO 400"),
    defined(0x5B, 500.0, "ISO 500"),
    defined(0x5D, 640.0, "ISO 640"),
    defined(0x60, 800.0, "ISO 800"),
    defined(0x63, 1000.0, "ISO 1000"),
    defined(0x65, 1250.0, "ISO 1250"),
    defined(0x68, 1600.0, "ISO 1600"),
    defined(0x6B, 2000.0, "ISO 2000"),
    defined(0x6D, 2500.0, "ISO 2500"),
    defined(0x70, 3200.0, "ISO 3200"),
    defined(0x73, 4000.0, "ISO 4000"),
    defined(0x75, 5000.0, "ISO 5000"),
    defined(0x78, 6400.0, "ISO 6400"),
    defined(0x7B, 8000.0, "ISO 8000"),
    defined(0x7D, 10000.0, "ISO 10000"),
    defined(0x80, 12800.0, "ISO 12800"),
    defined(0x83, 16000.0, "ISO 16000"),
    defined(0x85, 20000.0, "ISO 20000"),
    defined(0x88, 25600.0, "ISO 25600"),
    defined(0x8B, 32000.0, "ISO 32000"),
    defined(0x8D, 40000.0, "ISO 40000"),
    defined(0x90, 51200.0, "ISO 51200"),
    defined(0x93, 64000.0, "ISO 64000"),
    defined(0x95, 80000.0, "ISO 80000"),
    defined(0x98, 102400.0, "ISO 102400"),
    defined(0xA0, 204800.0, "ISO 204800"),
    defined(0xA8, 409600.0, "ISO 409600"),
    defined(0xB0, 819200.0, "ISO 819200"),
    undefined(INVALID_CODE, "Not valid"),
];

/// Autofocus modes. None of them is numeric.
pub static AF_MODES: &[DiscreteValue] = &[
    undefined(0, "One-Shot AF"),
    undefined(1, "AI Servo AF"),
    undefined(2, "AI Focus AF"),
    undefined(3, "Manual Focus"),
    undefined(INVALID_CODE, "Not valid"),
];

/// A camera property backed by a discrete value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    ShutterSpeed,
    Aperture,
    Iso,
    AfMode,
}

impl Quantity {
    pub fn table(self) -> &'static [DiscreteValue] {
        match self {
            Self::ShutterSpeed => SHUTTER_SPEEDS,
            Self::Aperture => APERTURES,
            Self::Iso => ISO_SPEEDS,
            Self::AfMode => AF_MODES,
        }
    }

    pub fn property_id(self) -> EdsPropertyID {
        match self {
            Self::ShutterSpeed => PROP_ID_TV,
            Self::Aperture => PROP_ID_AV,
            Self::Iso => PROP_ID_ISO_SPEED,
            Self::AfMode => PROP_ID_AF_MODE,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ShutterSpeed => "shutter speed",
            Self::Aperture => "aperture",
            Self::Iso => "ISO",
            Self::AfMode => "AF mode",
        })
    }
}

/// The meaning of a device code read back from the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Semantic {
    /// The code is in the table.
    Known(&'static DiscreteValue),
    /// The camera reported a code the table does not list.
    Unknown(u32),
}

impl Semantic {
    pub fn code(&self) -> u32 {
        match self {
            Self::Known(entry) => entry.code,
            Self::Unknown(code) => *code,
        }
    }

    /// Semantic value; `None` for undefined entries and unknown codes alike.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Known(entry) => entry.value,
            Self::Unknown(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Known(entry) => entry.label,
            Self::Unknown(_) => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(entry) => f.write_str(entry.label),
            Self::Unknown(code) => write!(f, "Unknown (0x{code:X})"),
        }
    }
}

/// Look up a table entry by device code.
pub fn lookup(quantity: Quantity, code: u32) -> Option<&'static DiscreteValue> {
    quantity.table().iter().find(|e| e.code == code)
}

/// Translate a device code into its semantic value.
pub fn to_semantic(quantity: Quantity, code: u32) -> Semantic {
    lookup(quantity, code).map_or(Semantic::Unknown(code), Semantic::Known)
}

/// Pick the candidate closest to `target` in log2 space.
///
/// Candidates without a semantic value never win. Ties go to the earliest
/// candidate. Returns `None` for a non-positive or non-finite target, or when
/// no candidate has a value.
pub fn nearest<'a, I>(target: f64, candidates: I) -> Option<&'a DiscreteValue>
where
    I: IntoIterator<Item = &'a DiscreteValue>,
{
    if !target.is_finite() || target <= 0.0 {
        return None;
    }
    let wanted = target.log2();

    candidates
        .into_iter()
        .filter_map(|entry| {
            let value = entry.value.filter(|v| v.is_finite() && *v > 0.0)?;
            Some((entry, (value.log2() - wanted).abs()))
        })
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(entry, _)| entry)
}

/// [`nearest`] with the failure cases mapped to camera errors.
pub fn resolve(
    quantity: Quantity,
    target: f64,
    available: &[&'static DiscreteValue],
) -> Result<&'static DiscreteValue> {
    if !target.is_finite() || target <= 0.0 {
        return Err(CameraError::InvalidTarget { quantity, target });
    }
    nearest(target, available.iter().copied()).ok_or(CameraError::NoAvailableValues(quantity))
}

/// Map the codes a camera reports as supported onto table entries.
///
/// Order is preserved. Codes the table does not list are dropped.
pub fn available(quantity: Quantity, codes: &[u32]) -> Vec<&'static DiscreteValue> {
    codes
        .iter()
        .filter_map(|&code| {
            let entry = lookup(quantity, code);
            if entry.is_none() {
                tracing::debug!("Ignoring unlisted {quantity} code 0x{code:X}");
            }
            entry
        })
        .collect()
}

/// Image quality (size, format and compression) written at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImageQuality {
    /// RAW only.
    #[default]
    Raw,
    /// Large fine JPEG only.
    LargeFineJpeg,
    /// RAW plus large fine JPEG.
    RawAndLargeFineJpeg,
}

impl ImageQuality {
    pub fn code(self) -> u32 {
        match self {
            Self::Raw => 0x0064_FF0F,
            Self::LargeFineJpeg => 0x0013_FF0F,
            Self::RawAndLargeFineJpeg => 0x0064_1F0F,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        [Self::Raw, Self::LargeFineJpeg, Self::RawAndLargeFineJpeg]
            .into_iter()
            .find(|q| q.code() == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(quantity: Quantity, codes: &[u32]) -> Vec<&'static DiscreteValue> {
        available(quantity, codes)
    }

    #[test]
    fn every_table_code_round_trips_through_to_semantic() {
        for quantity in [
            Quantity::ShutterSpeed,
            Quantity::Aperture,
            Quantity::Iso,
            Quantity::AfMode,
        ] {
            for entry in quantity.table() {
                assert_eq!(to_semantic(quantity, entry.code), Semantic::Known(entry));
            }
        }
    }

    #[test]
    fn tables_have_unique_codes() {
        for quantity in [
            Quantity::ShutterSpeed,
            Quantity::Aperture,
            Quantity::Iso,
            Quantity::AfMode,
        ] {
            let table = quantity.table();
            for (i, a) in table.iter().enumerate() {
                assert!(
                    table[i + 1..].iter().all(|b| b.code != a.code),
                    "{quantity} code 0x{:X} listed twice",
                    a.code
                );
            }
        }
    }

    #[test]
    fn unknown_code_is_never_zero() {
        let semantic = to_semantic(Quantity::ShutterSpeed, 0x01);
        assert_eq!(semantic, Semantic::Unknown(0x01));
        assert_eq!(semantic.value(), None);
        assert_eq!(semantic.label(), "Unknown");
    }

    #[test]
    fn sentinels_have_undefined_values() {
        assert_eq!(to_semantic(Quantity::ShutterSpeed, 0x0C).value(), None);
        assert_eq!(to_semantic(Quantity::Iso, ISO_AUTO_CODE).label(), "Auto");
        assert_eq!(to_semantic(Quantity::Iso, ISO_AUTO_CODE).value(), None);
        assert_eq!(to_semantic(Quantity::Aperture, INVALID_CODE).value(), None);
    }

    #[test]
    fn known_values_translate() {
        let tv = to_semantic(Quantity::ShutterSpeed, 0x70);
        assert_eq!(tv.label(), "1/125");
        assert!((tv.value().unwrap() - 0.008).abs() < 1e-12);

        assert_eq!(to_semantic(Quantity::Aperture, 0x85).value(), Some(3.4));
        assert_eq!(to_semantic(Quantity::Iso, 0x98).value(), Some(102400.0));
        assert_eq!(to_semantic(Quantity::AfMode, 1).label(), "AI Servo AF");
    }

    #[test]
    fn nearest_works_in_log_space() {
        // 100, 200, 400, 800
        let isos = entries(Quantity::Iso, &[0x48, 0x50, 0x58, 0x60]);
        let picked = nearest(750.0, isos.iter().copied()).unwrap();
        assert_eq!(picked.value, Some(800.0));
    }

    #[test]
    fn nearest_skips_undefined_values() {
        let a = defined(1, 2.0, "A");
        let b = undefined(2, "B");
        let c = defined(3, 8.0, "C");

        let picked = nearest(4.0, [&a, &b, &c]).unwrap();
        assert_ne!(picked.label, "B");
        // Equidistant in log2: the first candidate wins.
        assert_eq!(picked.label, "A");
    }

    #[test]
    fn nearest_returns_exact_match() {
        for entry in APERTURES.iter().filter(|e| e.value.is_some()) {
            let picked = nearest(entry.value.unwrap(), APERTURES.iter()).unwrap();
            assert_eq!(picked.code, entry.code);
        }
    }

    #[test]
    fn nearest_rejects_bad_targets() {
        assert!(nearest(0.0, SHUTTER_SPEEDS.iter()).is_none());
        assert!(nearest(-1.0, SHUTTER_SPEEDS.iter()).is_none());
        assert!(nearest(f64::NAN, SHUTTER_SPEEDS.iter()).is_none());
        assert!(nearest(f64::INFINITY, SHUTTER_SPEEDS.iter()).is_none());
    }

    #[test]
    fn nearest_with_only_sentinels_finds_nothing() {
        let candidates = entries(Quantity::Iso, &[ISO_AUTO_CODE, INVALID_CODE]);
        assert!(nearest(100.0, candidates.iter().copied()).is_none());
    }

    #[test]
    fn resolve_maps_failures_to_errors() {
        let candidates = entries(Quantity::Aperture, &[0x20, 0x40]);

        let picked = resolve(Quantity::Aperture, 10.0, &candidates).unwrap();
        assert_eq!(picked.label, "f/11");

        assert!(matches!(
            resolve(Quantity::Aperture, 0.0, &candidates),
            Err(CameraError::InvalidTarget { .. })
        ));
        assert!(matches!(
            resolve(Quantity::Aperture, 4.0, &[]),
            Err(CameraError::NoAvailableValues(Quantity::Aperture))
        ));
    }

    #[test]
    fn available_keeps_device_order_and_drops_unlisted_codes() {
        let list = available(Quantity::ShutterSpeed, &[0x70, 0x01, 0x38, 0x0C]);
        let labels: Vec<_> = list.iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["1/125", "1\"", "Bulb"]);
    }

    #[test]
    fn image_quality_codes() {
        assert_eq!(ImageQuality::default(), ImageQuality::Raw);
        assert_eq!(ImageQuality::Raw.code(), 0x0064_FF0F);
        assert_eq!(
            ImageQuality::from_code(0x0013_FF0F),
            Some(ImageQuality::LargeFineJpeg)
        );
        assert_eq!(ImageQuality::from_code(0x1234), None);
    }

    #[test]
    fn image_quality_serializes_snake_case() {
        let json = serde_json::to_string(&ImageQuality::RawAndLargeFineJpeg).unwrap();
        assert_eq!(json, "\"raw_and_large_fine_jpeg\"");
    }

    #[test]
    fn quantity_property_ids() {
        assert_eq!(Quantity::ShutterSpeed.property_id(), PROP_ID_TV);
        assert_eq!(Quantity::Aperture.property_id(), PROP_ID_AV);
        assert_eq!(Quantity::Iso.property_id(), PROP_ID_ISO_SPEED);
        assert_eq!(Quantity::AfMode.property_id(), PROP_ID_AF_MODE);
    }
}
