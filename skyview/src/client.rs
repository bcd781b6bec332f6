//! Blocking client for the NASA SkyView `pskcall` image endpoint.

use std::path::Path;

use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::display::to_display_image;
use crate::fits::{self, FitsError, FitsHeader};

/// Default SkyView endpoint
pub const DEFAULT_SKYVIEW_URL: &str = "https://skyview.gsfc.nasa.gov/cgi-bin/pskcall";

/// Default survey (Digitized Sky Survey)
pub const DEFAULT_SURVEY: &str = "DSS";

/// Upper bound on a response body
const MAX_PAYLOAD_BYTES: u64 = 64 * 1024 * 1024;

/// Errors raised while fetching or decoding a sky image
#[derive(Debug, Error)]
pub enum SkyViewError {
    #[error("invalid image service URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("coordinates out of range: RA {ra_deg}, Dec {dec_deg}")]
    Coordinates { ra_deg: f64, dec_deg: f64 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("image service returned status {0}")]
    Status(u16),

    #[error("image service returned an empty body")]
    EmptyBody,

    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("could not decode FITS payload: {0}")]
    Fits(#[from] FitsError),
}

/// Payload requested from the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// A standard raster image (JPEG)
    #[default]
    Raster,
    /// Calibrated survey data as FITS
    Fits,
}

impl ImageFormat {
    fn return_param(&self) -> &'static str {
        match self {
            ImageFormat::Raster => "JPEG",
            ImageFormat::Fits => "FITS",
        }
    }
}

/// Settings for the image service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyViewConfig {
    /// Endpoint URL
    pub base_url: String,
    /// Survey name, e.g. "DSS" or "2MASS-J"
    pub survey: String,
    /// Image size in pixels (square); service default when unset
    pub pixels: Option<u32>,
    /// Angular size of the field in degrees; service default when unset
    pub size_deg: Option<f64>,
}

impl Default for SkyViewConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SKYVIEW_URL.to_string(),
            survey: DEFAULT_SURVEY.to_string(),
            pixels: None,
            size_deg: None,
        }
    }
}

/// A decoded image ready for display
#[derive(Debug, Clone)]
pub enum SkyImage {
    Raster(DynamicImage),
    Fits { image: GrayImage, header: FitsHeader },
}

impl SkyImage {
    /// Decode a response payload according to the requested format
    pub fn decode(bytes: &[u8], format: ImageFormat) -> Result<Self, SkyViewError> {
        if bytes.is_empty() {
            return Err(SkyViewError::EmptyBody);
        }

        match format {
            ImageFormat::Raster => Ok(SkyImage::Raster(image::load_from_memory(bytes)?)),
            ImageFormat::Fits => {
                let decoded = fits::decode(bytes)?;
                let image = to_display_image(&decoded.data);
                Ok(SkyImage::Fits {
                    image,
                    header: decoded.header,
                })
            }
        }
    }

    /// Width and height in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            SkyImage::Raster(img) => (img.width(), img.height()),
            SkyImage::Fits { image, .. } => image.dimensions(),
        }
    }

    /// Write to disk, format chosen from the file extension
    pub fn save(&self, path: &Path) -> Result<(), image::ImageError> {
        match self {
            SkyImage::Raster(img) => img.save(path),
            SkyImage::Fits { image, .. } => image.save(path),
        }
    }
}

/// Client for the SkyView image service
#[derive(Clone)]
pub struct SkyViewClient {
    config: SkyViewConfig,
    agent: ureq::Agent,
}

impl std::fmt::Debug for SkyViewClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkyViewClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SkyViewClient {
    pub fn new(config: SkyViewConfig) -> Self {
        Self {
            config,
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    pub fn config(&self) -> &SkyViewConfig {
        &self.config
    }

    /// Build the request URL for a position in decimal degrees
    pub fn request_url(
        &self,
        ra_deg: f64,
        dec_deg: f64,
        format: ImageFormat,
    ) -> Result<Url, SkyViewError> {
        if !(0.0..360.0).contains(&ra_deg) || !(-90.0..=90.0).contains(&dec_deg) {
            return Err(SkyViewError::Coordinates { ra_deg, dec_deg });
        }

        let mut url = Url::parse(&self.config.base_url)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("RA", &ra_deg.to_string())
                .append_pair("DEC", &dec_deg.to_string())
                .append_pair("Survey", &self.config.survey)
                .append_pair("Return", format.return_param());
            if let Some(pixels) = self.config.pixels {
                query.append_pair("Pixels", &pixels.to_string());
            }
            if let Some(size) = self.config.size_deg {
                query.append_pair("Size", &size.to_string());
            }
        }
        Ok(url)
    }

    /// Fetch and decode the survey image centred on a position
    ///
    /// Issues a single blocking request; any failure is returned as-is.
    pub fn fetch(
        &self,
        ra_deg: f64,
        dec_deg: f64,
        format: ImageFormat,
    ) -> Result<SkyImage, SkyViewError> {
        let url = self.request_url(ra_deg, dec_deg, format)?;
        log::info!("Requesting sky image: {url}");

        let mut response = match self.agent.get(url.as_str()).call() {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(code)) => {
                log::warn!("Image service returned status {code}");
                return Err(SkyViewError::Status(code));
            }
            Err(e) => return Err(SkyViewError::Http(e)),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(SkyViewError::Status(status.as_u16()));
        }

        let bytes = response
            .body_mut()
            .with_config()
            .limit(MAX_PAYLOAD_BYTES)
            .read_to_vec()?;
        log::debug!("Received {} bytes", bytes.len());

        SkyImage::decode(&bytes, format)
    }
}

impl Default for SkyViewClient {
    fn default() -> Self {
        Self::new(SkyViewConfig::default())
    }
}
