//! FITS decoding for `Return=FITS` payloads.
//!
//! The payload arrives in memory; it is staged to a temporary file and read
//! with the FITS reader. The first HDU holding an image with at least two axes
//! is used (SkyView puts it in the primary HDU), and only the first plane of a
//! cube is kept.
//!
//! Before anything is handed to the reader the primary header's declared
//! geometry is checked against the payload size, so a header claiming more
//! data than was received is rejected without allocating for it.

use std::io::Write;

use fitsio::compat::fitsfile::FitsFile;
use fitsio::compat::hdu::FitsHdu;
use fitsio::compat::images::ReadImage;
use ndarray::Array2;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Size of a FITS logical record in bytes
pub const BLOCK_SIZE: usize = 2880;

/// Size of a single header card in bytes
pub const CARD_SIZE: usize = 80;

/// Largest NAXIS the standard allows
const MAX_NAXIS: i64 = 999;

/// Errors raised while decoding a FITS payload
#[derive(Debug, Error)]
pub enum FitsError {
    #[error("payload is not a FITS file (first card is not SIMPLE)")]
    NotFits,

    #[error("header is not terminated by an END card")]
    MissingEnd,

    #[error("missing required keyword {0}")]
    MissingKeyword(String),

    #[error("unsupported BITPIX {0}")]
    UnsupportedBitpix(i64),

    #[error("invalid axis length {name} = {value}")]
    InvalidAxis { name: String, value: i64 },

    #[error("data truncated: expected {expected}, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("payload holds no image with at least two axes")]
    NoImage,

    #[error("FITS I/O error: {0}")]
    FitsIo(#[from] fitsio::compat::errors::Error),

    #[error("failed to stage payload: {0}")]
    Io(#[from] std::io::Error),
}

/// Geometry and identification of the decoded image
#[derive(Debug, Clone, PartialEq)]
pub struct FitsHeader {
    pub bitpix: i64,
    /// `NAXIS1..NAXISn` of the HDU the image came from
    pub axes: Vec<usize>,
    /// `SURVEY` keyword when present
    pub survey: Option<String>,
}

/// A decoded image indexed `[row, column]`, rows following `NAXIS2`
#[derive(Debug, Clone)]
pub struct FitsImage {
    pub header: FitsHeader,
    pub data: Array2<f64>,
}

impl FitsImage {
    /// Image width (`NAXIS1`)
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    /// Image height (`NAXIS2`)
    pub fn height(&self) -> usize {
        self.data.nrows()
    }
}

fn bytes_per_pixel(bitpix: i64) -> Result<usize, FitsError> {
    match bitpix {
        8 => Ok(1),
        16 => Ok(2),
        32 | -32 => Ok(4),
        64 | -64 => Ok(8),
        other => Err(FitsError::UnsupportedBitpix(other)),
    }
}

/// Validate one axis length and fold it into a running element count
fn checked_axis(name: String, value: i64, count: usize) -> Result<(usize, usize), FitsError> {
    let length = match usize::try_from(value) {
        Ok(length) if length > 0 => length,
        _ => return Err(FitsError::InvalidAxis { name, value }),
    };
    match count.checked_mul(length) {
        Some(count) => Ok((length, count)),
        None => Err(FitsError::InvalidAxis { name, value }),
    }
}

/// Read the primary header's mandatory cards and check the declared data size
///
/// Mandatory keywords use the fixed format, so their values sit in columns
/// 11-30 of the card.
pub fn primary_header(bytes: &[u8]) -> Result<FitsHeader, FitsError> {
    let mut bitpix = None;
    let mut naxis = None;
    let mut lengths: Vec<(usize, i64)> = Vec::new();

    for (index, card) in bytes.chunks_exact(CARD_SIZE).enumerate() {
        let keyword = std::str::from_utf8(&card[..8]).unwrap_or("").trim_end();

        if index == 0 && keyword != "SIMPLE" {
            return Err(FitsError::NotFits);
        }

        if keyword == "END" {
            let header_len = ((index + 1) * CARD_SIZE).div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
            let available = bytes.len().saturating_sub(header_len);
            return finish_primary(bitpix, naxis, &lengths, available);
        }

        if &card[8..10] != b"= " {
            continue;
        }
        let value = std::str::from_utf8(&card[10..30])
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok());

        match keyword {
            "BITPIX" => bitpix = value,
            "NAXIS" => naxis = value,
            _ => {
                let axis = keyword
                    .strip_prefix("NAXIS")
                    .and_then(|n| n.parse::<usize>().ok());
                if let (Some(axis), Some(value)) = (axis, value) {
                    lengths.push((axis, value));
                }
            }
        }
    }

    Err(FitsError::MissingEnd)
}

fn finish_primary(
    bitpix: Option<i64>,
    naxis: Option<i64>,
    lengths: &[(usize, i64)],
    available: usize,
) -> Result<FitsHeader, FitsError> {
    let bitpix = bitpix.ok_or_else(|| FitsError::MissingKeyword("BITPIX".to_string()))?;
    let pixel_size = bytes_per_pixel(bitpix)?;

    let naxis = naxis.ok_or_else(|| FitsError::MissingKeyword("NAXIS".to_string()))?;
    if !(0..=MAX_NAXIS).contains(&naxis) {
        return Err(FitsError::InvalidAxis {
            name: "NAXIS".to_string(),
            value: naxis,
        });
    }

    let mut axes = Vec::new();
    let mut expected = pixel_size;
    for n in 1..=naxis as usize {
        let name = format!("NAXIS{n}");
        let value = lengths
            .iter()
            .find(|(axis, _)| *axis == n)
            .map(|(_, value)| *value)
            .ok_or_else(|| FitsError::MissingKeyword(name.clone()))?;
        let (length, count) = checked_axis(name, value, expected)?;
        axes.push(length);
        expected = count;
    }
    if axes.is_empty() {
        expected = 0;
    }

    if available < expected {
        return Err(FitsError::Truncated {
            expected,
            actual: available,
        });
    }

    Ok(FitsHeader {
        bitpix,
        axes,
        survey: None,
    })
}

fn read_axes(fptr: &FitsFile, hdu: &FitsHdu, naxis: i64) -> Result<Vec<usize>, FitsError> {
    if naxis > MAX_NAXIS {
        return Err(FitsError::InvalidAxis {
            name: "NAXIS".to_string(),
            value: naxis,
        });
    }

    let mut axes = Vec::new();
    let mut count = 1usize;
    for n in 1..=naxis {
        let name = format!("NAXIS{n}");
        let value = hdu
            .read_key::<i64>(fptr, &name)
            .map_err(|_| FitsError::MissingKeyword(name.clone()))?;
        let (length, next) = checked_axis(name, value, count)?;
        axes.push(length);
        count = next;
    }
    Ok(axes)
}

/// Decode the first image HDU of a FITS payload
pub fn decode(bytes: &[u8]) -> Result<FitsImage, FitsError> {
    let primary = primary_header(bytes)?;

    let mut staged = NamedTempFile::new()?;
    staged.write_all(bytes)?;
    staged.flush()?;

    let fptr = FitsFile::open(staged.path())?;

    let mut hdu_idx = 0;
    while let Ok(hdu) = fptr.hdu(hdu_idx) {
        let naxis = hdu.read_key::<i64>(&fptr, "NAXIS").unwrap_or(0);
        if naxis < 2 {
            hdu_idx += 1;
            continue;
        }

        let axes = read_axes(&fptr, &hdu, naxis)?;
        let (width, height) = (axes[0], axes[1]);
        let plane = width * height;

        let mut pixels = f64::read_image(&fptr, &hdu)?;
        if pixels.len() < plane {
            return Err(FitsError::Truncated {
                expected: plane,
                actual: pixels.len(),
            });
        }
        pixels.truncate(plane);

        let data = Array2::from_shape_vec((height, width), pixels).map_err(|_| {
            FitsError::Truncated {
                expected: plane,
                actual: 0,
            }
        })?;

        let header = FitsHeader {
            bitpix: hdu
                .read_key::<i64>(&fptr, "BITPIX")
                .unwrap_or(primary.bitpix),
            axes,
            survey: hdu.read_key::<String>(&fptr, "SURVEY").ok(),
        };
        log::debug!(
            "Decoded FITS image {width}x{height} from HDU {hdu_idx} (BITPIX {})",
            header.bitpix
        );

        return Ok(FitsImage { header, data });
    }

    Err(FitsError::NoImage)
}

/// Build FITS payloads for tests
#[cfg(test)]
pub(crate) mod test_payload {
    use super::{BLOCK_SIZE, CARD_SIZE};

    pub fn card(text: &str) -> String {
        format!("{text:<width$}", width = CARD_SIZE)
    }

    pub fn pad_block(bytes: &mut Vec<u8>, fill: u8) {
        let rem = bytes.len() % BLOCK_SIZE;
        if rem != 0 {
            bytes.resize(bytes.len() + BLOCK_SIZE - rem, fill);
        }
    }

    /// A header block built from the given cards, END appended
    pub fn header(cards: &[&str]) -> Vec<u8> {
        let mut text: Vec<String> = cards.iter().map(|c| card(c)).collect();
        text.push(card("END"));
        let mut bytes = text.concat().into_bytes();
        pad_block(&mut bytes, b' ');
        bytes
    }

    /// A BITPIX -32 primary image with the given rows
    pub fn f32_image(rows: &[Vec<f32>], extra_cards: &[&str]) -> Vec<u8> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());

        let naxis1 = format!("NAXIS1  = {width:>20}");
        let naxis2 = format!("NAXIS2  = {height:>20}");
        let mut cards = vec![
            "SIMPLE  =                    T",
            "BITPIX  =                  -32",
            "NAXIS   =                    2",
            naxis1.as_str(),
            naxis2.as_str(),
        ];
        cards.extend_from_slice(extra_cards);

        let mut bytes = header(&cards);
        for row in rows {
            for v in row {
                bytes.extend_from_slice(&v.to_be_bytes());
            }
        }
        pad_block(&mut bytes, 0);
        bytes
    }
}
