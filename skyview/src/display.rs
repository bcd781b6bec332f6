//! Conversion of survey data into displayable 8-bit rasters.

use image::{GrayImage, Luma};
use ndarray::Array2;

/// Replace non-finite samples (NaN, ±inf) with zero in place
pub fn replace_non_finite(data: &mut Array2<f64>) {
    data.mapv_inplace(|v| if v.is_finite() { v } else { 0.0 });
}

/// Min-max scale a finite array into the full `u8` range
///
/// The minimum maps to 0 and the maximum to 255, fractional levels are
/// truncated. A constant (or empty) array maps to all zeros.
pub fn normalize_to_u8(data: &Array2<f64>) -> Array2<u8> {
    let (min, max) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return Array2::zeros(data.raw_dim());
    }

    data.mapv(|v| (((v - min) / range) * 255.0).clamp(0.0, 255.0) as u8)
}

/// Converts an ndarray Array2<u8> to an image::GrayImage
///
/// Array indices `[y, x]` map to pixel coordinates `(x, y)`, so array
/// dimensions are (height, width) while image dimensions are (width, height).
pub fn array2_to_gray_image(arr: &Array2<u8>) -> GrayImage {
    let (height, width) = arr.dim();
    let mut img = GrayImage::new(width as u32, height as u32);

    for ((y, x), value) in arr.indexed_iter() {
        img.put_pixel(x as u32, y as u32, Luma([*value]));
    }

    img
}

/// Full display pipeline for scientific data: zero NaNs, min-max scale, rasterize
pub fn to_display_image(data: &Array2<f64>) -> GrayImage {
    let mut cleaned = data.clone();
    replace_non_finite(&mut cleaned);
    array2_to_gray_image(&normalize_to_u8(&cleaned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_normalize_spans_full_range() {
        let data = array![[10.0, 20.0], [30.0, 40.0]];
        let scaled = normalize_to_u8(&data);

        assert_eq!(scaled[[0, 0]], 0);
        assert_eq!(scaled[[1, 1]], 255);
        // (20 - 10) / 30 * 255 = 85
        assert_eq!(scaled[[0, 1]], 85);
    }

    #[test]
    fn test_constant_image_is_black() {
        let data = Array2::from_elem((3, 4), 7.5);
        let scaled = normalize_to_u8(&data);
        assert!(scaled.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_nan_becomes_zero_before_scaling() {
        let data = array![[f64::NAN, 50.0], [100.0, f64::INFINITY]];
        let img = to_display_image(&data);

        // NaN and inf both become 0, which is the minimum
        assert_eq!(img.get_pixel(0, 0).0[0], 0);
        assert_eq!(img.get_pixel(1, 1).0[0], 0);
        assert_eq!(img.get_pixel(0, 1).0[0], 255);
        assert_eq!(img.get_pixel(1, 0).0[0], 127);
    }

    #[test]
    fn test_gray_image_orientation() {
        let arr = array![[1u8, 2, 3], [4, 5, 6]];
        let img = array2_to_gray_image(&arr);

        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(2, 0).0[0], 3);
        assert_eq!(img.get_pixel(0, 1).0[0], 4);
    }
}
