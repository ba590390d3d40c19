//! ADS-L fixed-point field codecs (ADS-L.4.SRD860.G.1.7).
//!
//! Altitude, ground speed and vertical speed are sent as a small exponent
//! plus mantissa, so resolution coarsens as the magnitude grows. Track is a
//! plain 9-bit circular value. Round-tripping a value through encode/decode
//! reproduces the quantization loss a receiver observes.

use serde::{Deserialize, Serialize};

/// Two exponent bits on every exponent/mantissa field.
pub const MAX_EXPONENT: u8 = 3;
const EXPONENT_MASK: u16 = 0b11;

pub const ALTITUDE_OFFSET_M: f64 = -320.0;
pub const GROUND_SPEED_SCALE: f64 = 0.25;
pub const VERTICAL_SPEED_SCALE: f64 = 0.125;

pub const TRACK_STEPS: i64 = 512;
pub const TRACK_RESOLUTION_DEG: f64 = 360.0 / TRACK_STEPS as f64;

/// Layout of one exponent/mantissa field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPointFormat {
    pub mantissa_bits: u32,
    /// Physical units per encoded unit
    pub scale: f64,
    /// Physical value of the all-zero word
    pub offset: f64,
}

pub const ALTITUDE: FixedPointFormat = FixedPointFormat {
    mantissa_bits: 12,
    scale: 1.0,
    offset: ALTITUDE_OFFSET_M,
};

pub const GROUND_SPEED: FixedPointFormat = FixedPointFormat {
    mantissa_bits: 6,
    scale: GROUND_SPEED_SCALE,
    offset: 0.0,
};

pub const VERTICAL_SPEED: FixedPointFormat = FixedPointFormat {
    mantissa_bits: 6,
    scale: VERTICAL_SPEED_SCALE,
    offset: 0.0,
};

/// Encoded exponent/mantissa pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPoint {
    pub exponent: u8,
    pub mantissa: u16,
}

impl FixedPoint {
    /// Pack into the wire word: `exponent << mantissa_bits | mantissa`.
    pub fn to_bits(self, format: &FixedPointFormat) -> u16 {
        ((self.exponent as u16 & EXPONENT_MASK) << format.mantissa_bits)
            | (self.mantissa & format.mantissa_mask())
    }

    pub fn from_bits(bits: u16, format: &FixedPointFormat) -> Self {
        Self {
            exponent: ((bits >> format.mantissa_bits) & EXPONENT_MASK) as u8,
            mantissa: bits & format.mantissa_mask(),
        }
    }
}

/// Sign-magnitude field used for vertical speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedFixedPoint {
    pub negative: bool,
    pub magnitude: FixedPoint,
}

impl SignedFixedPoint {
    /// Sign bit sits above the two exponent bits.
    pub fn to_bits(self, format: &FixedPointFormat) -> u16 {
        let sign = (self.negative as u16) << (format.mantissa_bits + 2);
        sign | self.magnitude.to_bits(format)
    }

    pub fn from_bits(bits: u16, format: &FixedPointFormat) -> Self {
        Self {
            negative: (bits >> (format.mantissa_bits + 2)) & 1 == 1,
            magnitude: FixedPoint::from_bits(bits, format),
        }
    }
}

impl FixedPointFormat {
    fn base(&self) -> f64 {
        (1u32 << self.mantissa_bits) as f64
    }

    fn mantissa_mask(&self) -> u16 {
        ((1u32 << self.mantissa_bits) - 1) as u16
    }

    /// Lower bound (exclusive) of the normalized range covered by `exponent`.
    fn threshold(&self, exponent: u8) -> f64 {
        2f64.powi(exponent as i32) * self.base() - self.base()
    }

    /// Largest representable normalized value.
    pub fn max_normalized(&self) -> f64 {
        self.decode_normalized(FixedPoint {
            exponent: MAX_EXPONENT,
            mantissa: self.mantissa_mask(),
        })
    }

    /// Quantize a value already expressed in encoded units.
    ///
    /// Never fails: non-finite input falls back to the top exponent with a
    /// zero mantissa, values at or below zero clamp to the zero word and
    /// values past the top of the range clamp to the largest word.
    /// The top-exponent fallback is kept for non-finite input only, so level
    /// flight and a stationary aircraft still decode to zero.
    pub fn encode_normalized(&self, normalized: f64) -> FixedPoint {
        if !normalized.is_finite() {
            tracing::debug!(value = normalized, "non-finite codec input, using top exponent");
            return FixedPoint {
                exponent: MAX_EXPONENT,
                mantissa: 0,
            };
        }

        let Some(mut exponent) = (0..=MAX_EXPONENT)
            .rev()
            .find(|&e| normalized > self.threshold(e))
        else {
            if normalized < 0.0 {
                tracing::debug!(value = normalized, "codec input below range, clamping to zero word");
            }
            return FixedPoint {
                exponent: 0,
                mantissa: 0,
            };
        };

        let base = self.base();
        let raw = (normalized + base) / 2f64.powi(exponent as i32) - base;
        let mut mantissa = raw.round_ties_even();

        if mantissa >= base {
            if exponent < MAX_EXPONENT {
                exponent += 1;
                mantissa = 0.0;
            } else {
                tracing::debug!(value = normalized, "codec input above range, clamping to max word");
                mantissa = self.mantissa_mask() as f64;
            }
        }

        FixedPoint {
            exponent,
            mantissa: mantissa as u16,
        }
    }

    pub fn decode_normalized(&self, value: FixedPoint) -> f64 {
        let base = self.base();
        2f64.powi(value.exponent as i32) * (base + value.mantissa as f64) - base
    }

    /// Size of one quantization step at `exponent`, in physical units.
    pub fn step(&self, exponent: u8) -> f64 {
        2f64.powi(exponent as i32) * self.scale
    }
}

// ========== ALTITUDE ==========

pub fn encode_altitude(altitude_m: f64) -> FixedPoint {
    ALTITUDE.encode_normalized((altitude_m - ALTITUDE.offset) / ALTITUDE.scale)
}

pub fn decode_altitude(value: FixedPoint) -> f64 {
    ALTITUDE.decode_normalized(value) * ALTITUDE.scale + ALTITUDE.offset
}

pub fn round_trip_altitude(altitude_m: f64) -> f64 {
    decode_altitude(encode_altitude(altitude_m))
}

// ========== GROUND SPEED ==========

/// Negative speeds are sent as the smallest nonzero word.
pub fn encode_ground_speed(speed_mps: f64) -> FixedPoint {
    let normalized = if speed_mps < 0.0 {
        1.0
    } else {
        speed_mps / GROUND_SPEED.scale
    };
    GROUND_SPEED.encode_normalized(normalized)
}

pub fn decode_ground_speed(value: FixedPoint) -> f64 {
    GROUND_SPEED.decode_normalized(value) * GROUND_SPEED.scale
}

pub fn round_trip_ground_speed(speed_mps: f64) -> f64 {
    decode_ground_speed(encode_ground_speed(speed_mps))
}

// ========== VERTICAL SPEED ==========

pub fn encode_vertical_speed(vs_mps: f64) -> SignedFixedPoint {
    SignedFixedPoint {
        negative: vs_mps < 0.0,
        magnitude: VERTICAL_SPEED.encode_normalized(vs_mps.abs() / VERTICAL_SPEED.scale),
    }
}

pub fn decode_vertical_speed(value: SignedFixedPoint) -> f64 {
    let magnitude = VERTICAL_SPEED.decode_normalized(value.magnitude) * VERTICAL_SPEED.scale;
    if value.negative {
        -magnitude
    } else {
        magnitude
    }
}

pub fn round_trip_vertical_speed(vs_mps: f64) -> f64 {
    decode_vertical_speed(encode_vertical_speed(vs_mps))
}

// ========== TRACK ==========

/// `None` (or a non-finite angle) means no track is available.
pub fn encode_track(track_deg: Option<f64>) -> Option<u16> {
    let track_deg = track_deg.filter(|t| t.is_finite())?;
    let steps = (track_deg / TRACK_RESOLUTION_DEG).round_ties_even() as i64;
    Some(steps.rem_euclid(TRACK_STEPS) as u16)
}

pub fn decode_track(encoded: Option<u16>) -> Option<f64> {
    encoded.map(|steps| steps as f64 * TRACK_RESOLUTION_DEG)
}

pub fn round_trip_track(track_deg: Option<f64>) -> Option<f64> {
    decode_track(encode_track(track_deg))
}
