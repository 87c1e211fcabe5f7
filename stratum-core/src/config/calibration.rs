//! Touch calibration
//!
//! A two-point linear calibration per axis maps raw controller readings to
//! screen coordinates. Coefficients are 16.16 fixed point.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Magic number to identify valid calibration data
pub const CALIBRATION_MAGIC: u32 = 0x5354_434C; // "STCL"

/// Current calibration data version
pub const CALIBRATION_VERSION: u8 = 1;

/// Size of the serialized calibration record upper bound
pub const CALIBRATION_MAX_SIZE: usize = 32;

const FRAC_BITS: u32 = 16;

/// Per-axis `screen = (raw * k + b) >> 16`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TouchCalibration {
    pub kx: i32,
    pub ky: i32,
    pub bx: i32,
    pub by: i32,
}

impl Default for TouchCalibration {
    /// Identity mapping
    fn default() -> Self {
        Self {
            kx: 1 << FRAC_BITS,
            ky: 1 << FRAC_BITS,
            bx: 0,
            by: 0,
        }
    }
}

impl TouchCalibration {
    /// Fit both axes through two raw/screen point pairs
    ///
    /// Fails with `BadParameter` if the raw readings do not differ on an axis.
    pub fn from_two_points(
        raw_a: (i32, i32),
        target_a: (i32, i32),
        raw_b: (i32, i32),
        target_b: (i32, i32),
    ) -> Result<Self> {
        let (kx, bx) = fit(raw_a.0, target_a.0, raw_b.0, target_b.0)?;
        let (ky, by) = fit(raw_a.1, target_a.1, raw_b.1, target_b.1)?;
        Ok(Self { kx, ky, bx, by })
    }

    /// Map a raw reading to screen coordinates
    pub fn apply(&self, raw: (i32, i32)) -> (i32, i32) {
        (
            scale(raw.0, self.kx, self.bx),
            scale(raw.1, self.ky, self.by),
        )
    }
}

fn fit(raw_a: i32, target_a: i32, raw_b: i32, target_b: i32) -> Result<(i32, i32)> {
    let raw_span = (raw_b - raw_a) as i64;
    if raw_span == 0 {
        return Err(Error::BadParameter);
    }
    let k = (((target_b - target_a) as i64) << FRAC_BITS) / raw_span;
    let b = ((target_a as i64) << FRAC_BITS) - k * raw_a as i64;
    let k = i32::try_from(k).map_err(|_| Error::Overflow)?;
    let b = i32::try_from(b).map_err(|_| Error::Overflow)?;
    Ok((k, b))
}

fn scale(raw: i32, k: i32, b: i32) -> i32 {
    let value = raw as i64 * k as i64 + b as i64;
    // Round to nearest
    ((value + (1 << (FRAC_BITS - 1))) >> FRAC_BITS) as i32
}

/// Calibration record as stored in flash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TouchCalibrationData {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    pub calibration: TouchCalibration,
    /// CRC32 checksum (calculated over magic..calibration)
    pub crc: u32,
}

impl TouchCalibrationData {
    /// Wrap coefficients in a record with a valid CRC
    pub fn new(calibration: TouchCalibration) -> Self {
        let mut data = Self {
            magic: CALIBRATION_MAGIC,
            version: CALIBRATION_VERSION,
            calibration,
            crc: 0,
        };
        data.update_crc();
        data
    }

    /// Check if the data is valid (magic and version match)
    pub fn is_valid(&self) -> bool {
        self.magic == CALIBRATION_MAGIC && self.version == CALIBRATION_VERSION
    }

    /// Calculate CRC32 for the data (excluding the crc field itself)
    pub fn calculate_crc(&self) -> u32 {
        let cal = &self.calibration;
        let mut crc: u32 = 0xFFFF_FFFF;
        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);
        for value in [cal.kx, cal.ky, cal.bx, cal.by] {
            crc = crc32_update(crc, &value.to_le_bytes());
        }
        !crc
    }

    pub fn update_crc(&mut self) {
        self.crc = self.calculate_crc();
    }

    pub fn verify_crc(&self) -> bool {
        self.crc == self.calculate_crc()
    }

    /// Serialize into `buf`, returning the used part
    #[cfg(feature = "serde")]
    pub fn to_slice<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8]> {
        postcard::to_slice(self, buf).map_err(|_| Error::Overflow)
    }

    /// Decode and validate a stored record
    ///
    /// Returns `InvalidItem` for foreign or outdated data and `BadChecksum`
    /// when the CRC does not match.
    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let data: Self = postcard::from_bytes(bytes).map_err(|_| Error::InvalidItem)?;
        if !data.is_valid() {
            return Err(Error::InvalidItem);
        }
        if !data.verify_crc() {
            return Err(Error::BadChecksum);
        }
        Ok(data)
    }
}

/// CRC32 update (IEEE 802.3 polynomial, reflected)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
