//! Sexagesimal to decimal-degree conversion for equatorial coordinates.
//!
//! Right ascension is entered as hours/minutes/seconds and declination as
//! degrees/arcminutes/arcseconds, each bounded the way the input form bounds
//! them. The sign of the declination comes from the degree field alone, so a
//! position between 0° and -1° (e.g. -0° 30') cannot be entered.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Largest accepted seconds value for either coordinate
pub const MAX_SECONDS: f64 = 59.9999;

/// Errors from out-of-range coordinate components
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), CoordinateError> {
    if value.is_nan() || value < min || value > max {
        return Err(CoordinateError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Convert hours, minutes, seconds of right ascension to degrees
pub fn hms_to_degrees(hours: f64, minutes: f64, seconds: f64) -> f64 {
    (hours + minutes / 60.0 + seconds / 3600.0) * 15.0
}

/// Convert degrees, arcminutes, arcseconds of declination to degrees
///
/// The sign is taken from `degrees` only; minutes and seconds are magnitudes.
pub fn dms_to_degrees(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    let sign = if degrees < 0.0 { -1.0 } else { 1.0 };
    sign * (degrees.abs() + minutes / 60.0 + seconds / 3600.0)
}

/// Right ascension as hours, minutes, seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hms {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: f64,
}

impl Hms {
    pub fn new(hours: u8, minutes: u8, seconds: f64) -> Result<Self, CoordinateError> {
        check_range("RA hours", hours as f64, 0.0, 23.0)?;
        check_range("RA minutes", minutes as f64, 0.0, 59.0)?;
        check_range("RA seconds", seconds, 0.0, MAX_SECONDS)?;
        Ok(Self {
            hours,
            minutes,
            seconds,
        })
    }

    pub fn to_degrees(&self) -> f64 {
        hms_to_degrees(self.hours as f64, self.minutes as f64, self.seconds)
    }
}

/// Declination as signed degrees, arcminutes, arcseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dms {
    pub degrees: i8,
    pub minutes: u8,
    pub seconds: f64,
}

impl Dms {
    pub fn new(degrees: i8, minutes: u8, seconds: f64) -> Result<Self, CoordinateError> {
        check_range("Dec degrees", degrees as f64, -90.0, 90.0)?;
        check_range("Dec minutes", minutes as f64, 0.0, 59.0)?;
        check_range("Dec seconds", seconds, 0.0, MAX_SECONDS)?;
        Ok(Self {
            degrees,
            minutes,
            seconds,
        })
    }

    pub fn to_degrees(&self) -> f64 {
        dms_to_degrees(self.degrees as f64, self.minutes as f64, self.seconds)
    }
}

/// An equatorial position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CelestialCoordinate {
    ra_degrees: f64,
    dec_degrees: f64,
}

impl CelestialCoordinate {
    /// Validate a position with RA in [0, 360) and Dec in [-90, 90]
    pub fn new(ra_degrees: f64, dec_degrees: f64) -> Result<Self, CoordinateError> {
        if ra_degrees.is_nan() || !(0.0..360.0).contains(&ra_degrees) {
            return Err(CoordinateError::OutOfRange {
                field: "RA",
                value: ra_degrees,
                min: 0.0,
                max: 360.0,
            });
        }
        check_range("Dec", dec_degrees, -90.0, 90.0)?;
        Ok(Self {
            ra_degrees,
            dec_degrees,
        })
    }

    /// Combine sexagesimal components; rejects declinations beyond the poles
    /// such as -90° 30'
    pub fn from_sexagesimal(ra: Hms, dec: Dms) -> Result<Self, CoordinateError> {
        Self::new(ra.to_degrees(), dec.to_degrees())
    }

    pub fn ra_degrees(&self) -> f64 {
        self.ra_degrees
    }

    pub fn dec_degrees(&self) -> f64 {
        self.dec_degrees
    }

    /// True at RA 0, Dec 0, which is usually an unfilled form rather than a target
    pub fn is_origin(&self) -> bool {
        self.ra_degrees == 0.0 && self.dec_degrees == 0.0
    }
}

impl fmt::Display for CelestialCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RA {:.6}°, Dec {:+.6}°",
            self.ra_degrees, self.dec_degrees
        )
    }
}
