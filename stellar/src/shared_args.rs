//! Command line form fields shared by the stellar binaries.
//!
//! The numeric bounds mirror the input form: RA hours 0-23, minutes 0-59,
//! seconds 0-59.9999, Dec degrees -90..90.

use clap::{Args, ValueEnum};
use skyview::ImageFormat;

use crate::coordinates::{CelestialCoordinate, CoordinateError, Dms, Hms, MAX_SECONDS};
use crate::photometry::{MagnitudeInput, StellarInputs};

/// Parse a seconds field bounded to [0, 59.9999]
fn parse_seconds(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid seconds value: {s}"))?;

    if !(0.0..=MAX_SECONDS).contains(&value) {
        return Err(format!("Seconds must be within 0 to {MAX_SECONDS}"));
    }
    Ok(value)
}

/// Photometric parameters of the star to classify
#[derive(Args, Debug, Clone)]
pub struct StellarArgs {
    /// B-V color index
    #[arg(long, allow_negative_numbers = true)]
    pub bv: f64,

    /// Luminosity in solar units
    #[arg(long, allow_negative_numbers = true)]
    pub luminosity: f64,

    /// Absolute magnitude, when known (defaults to 0 if no parallax is given)
    #[arg(
        long,
        allow_negative_numbers = true,
        conflicts_with_all = ["parallax", "apparent_magnitude"]
    )]
    pub absolute_magnitude: Option<f64>,

    /// Parallax, used with --apparent-magnitude when the absolute magnitude is unknown
    #[arg(long, allow_negative_numbers = true, requires = "apparent_magnitude")]
    pub parallax: Option<f64>,

    /// Apparent magnitude, used with --parallax
    #[arg(long, allow_negative_numbers = true, requires = "parallax")]
    pub apparent_magnitude: Option<f64>,
}

impl StellarArgs {
    pub fn magnitude_input(&self) -> MagnitudeInput {
        match (self.parallax, self.apparent_magnitude) {
            (Some(parallax), Some(apparent_magnitude)) => MagnitudeInput::FromParallax {
                parallax,
                apparent_magnitude,
            },
            _ => MagnitudeInput::Absolute(self.absolute_magnitude.unwrap_or(0.0)),
        }
    }

    pub fn to_inputs(&self) -> StellarInputs {
        StellarInputs::new(self.bv, self.luminosity, self.magnitude_input())
    }
}

/// Equatorial position in sexagesimal form
#[derive(Args, Debug, Clone)]
pub struct CoordinateArgs {
    /// Right ascension hours
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=23))]
    pub ra_h: u8,

    /// Right ascension minutes
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=59))]
    pub ra_m: u8,

    /// Right ascension seconds
    #[arg(long, default_value_t = 0.0, value_parser = parse_seconds)]
    pub ra_s: f64,

    /// Declination degrees (sign applies to the whole angle)
    #[arg(
        long,
        default_value_t = 0,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(i8).range(-90..=90)
    )]
    pub dec_d: i8,

    /// Declination arcminutes
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=59))]
    pub dec_m: u8,

    /// Declination arcseconds
    #[arg(long, default_value_t = 0.0, value_parser = parse_seconds)]
    pub dec_s: f64,
}

impl CoordinateArgs {
    pub fn to_coordinate(&self) -> Result<CelestialCoordinate, CoordinateError> {
        let ra = Hms::new(self.ra_h, self.ra_m, self.ra_s)?;
        let dec = Dms::new(self.dec_d, self.dec_m, self.dec_s)?;
        CelestialCoordinate::from_sexagesimal(ra, dec)
    }
}

/// Image payload selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImageFormatArg {
    /// Plain raster image
    Raster,
    /// FITS survey data, normalized to 8-bit grayscale
    Fits,
}

impl From<ImageFormatArg> for ImageFormat {
    fn from(arg: ImageFormatArg) -> Self {
        match arg {
            ImageFormatArg::Raster => ImageFormat::Raster,
            ImageFormatArg::Fits => ImageFormat::Fits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct StarCli {
        #[command(flatten)]
        star: StellarArgs,
    }

    #[derive(Parser, Debug)]
    struct CoordCli {
        #[command(flatten)]
        coords: CoordinateArgs,
    }

    #[test]
    fn test_seconds_parsing() {
        assert_eq!(parse_seconds("59.9999").unwrap(), 59.9999);
        assert_eq!(parse_seconds(" 0 ").unwrap(), 0.0);
        assert!(parse_seconds("60").is_err());
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("abc").is_err());
    }

    #[test]
    fn test_absolute_magnitude_form() {
        let cli = StarCli::try_parse_from([
            "test",
            "--bv",
            "0.65",
            "--luminosity",
            "1",
            "--absolute-magnitude",
            "-1.5",
        ])
        .unwrap();

        let inputs = cli.star.to_inputs();
        assert!(inputs.magnitude_known());
        assert_eq!(inputs.magnitude, MagnitudeInput::Absolute(-1.5));
    }

    #[test]
    fn test_parallax_form() {
        let cli = StarCli::try_parse_from([
            "test",
            "--bv=-0.1",
            "--luminosity",
            "25",
            "--parallax",
            "100",
            "--apparent-magnitude",
            "5",
        ])
        .unwrap();

        let inputs = cli.star.to_inputs();
        assert!(!inputs.magnitude_known());
        assert_eq!(inputs.bv, -0.1);
        assert_eq!(
            inputs.magnitude,
            MagnitudeInput::FromParallax {
                parallax: 100.0,
                apparent_magnitude: 5.0
            }
        );
    }

    #[test]
    fn test_magnitude_defaults_to_zero() {
        let cli =
            StarCli::try_parse_from(["test", "--bv", "0.65", "--luminosity", "1"]).unwrap();
        assert_eq!(cli.star.magnitude_input(), MagnitudeInput::Absolute(0.0));
    }

    #[test]
    fn test_conflicting_magnitude_forms() {
        assert!(StarCli::try_parse_from([
            "test",
            "--bv",
            "0.65",
            "--luminosity",
            "1",
            "--absolute-magnitude",
            "4.8",
            "--parallax",
            "10",
            "--apparent-magnitude",
            "5",
        ])
        .is_err());

        assert!(StarCli::try_parse_from([
            "test",
            "--bv",
            "0.65",
            "--luminosity",
            "1",
            "--parallax",
            "10",
        ])
        .is_err());
    }

    #[test]
    fn test_coordinate_bounds() {
        let cli = CoordCli::try_parse_from([
            "test", "--ra-h", "5", "--ra-m", "35", "--ra-s", "17.3", "--dec-d", "-5", "--dec-m",
            "23", "--dec-s", "28",
        ])
        .unwrap();
        let coord = cli.coords.to_coordinate().unwrap();
        assert!((coord.ra_degrees() - 83.822083).abs() < 1e-5);
        assert!((coord.dec_degrees() + 5.391111).abs() < 1e-5);

        assert!(CoordCli::try_parse_from(["test", "--ra-h", "24"]).is_err());
        assert!(CoordCli::try_parse_from(["test", "--dec-d", "-91"]).is_err());
        assert!(CoordCli::try_parse_from(["test", "--ra-s", "60"]).is_err());
    }
}
