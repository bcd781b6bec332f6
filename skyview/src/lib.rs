//! Sky imagery for the stellar classification tools
//!
//! Fetches survey cutouts from NASA SkyView for a position in decimal
//! degrees and turns the response into something displayable:
//!
//! - [`client`]: blocking HTTP access to the `pskcall` endpoint
//! - [`fits`]: image HDU decoding for `Return=FITS` payloads
//! - [`display`]: NaN cleanup and min-max scaling to 8-bit grayscale

pub mod client;
pub mod display;
pub mod fits;

pub use client::{
    ImageFormat, SkyImage, SkyViewClient, SkyViewConfig, SkyViewError, DEFAULT_SKYVIEW_URL,
    DEFAULT_SURVEY,
};
pub use fits::{FitsError, FitsHeader, FitsImage};
