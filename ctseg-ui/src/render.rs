//! Slice compositing: grayscale base with run contours painted over

use ctseg_common::volume::bytescale;
use ctseg_common::{Error, Result};
use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma, Rgb, RgbImage};
use imageproc::contours::{find_contours, Contour};
use ndarray::ArrayView2;
use std::io::Cursor;

/// Threshold above which a mask voxel counts as segmented
pub const CONTOUR_LEVEL: f32 = 0.8;

/// Contour colors: run 1 red, run 2 green
const RUN_1_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const RUN_2_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Compose one axial slice: the bytescaled base in gray with each
/// run's contour pixels painted on top.
///
/// The output is transposed relative to array order (array row becomes
/// image x), the orientation the scans are reviewed in.
pub fn compose_slice<'a>(
    base: ArrayView2<'_, f32>,
    mask_1: ArrayView2<'a, f32>,
    mask_2: ArrayView2<'a, f32>,
) -> Result<RgbImage> {
    let dim = base.dim();
    if mask_1.dim() != dim || mask_2.dim() != dim {
        return Err(Error::InvalidInput(format!(
            "mask shapes {:?}/{:?} do not match base {:?}",
            mask_1.dim(),
            mask_2.dim(),
            dim
        )));
    }

    let (rows, cols) = dim;
    let mut out = RgbImage::new(rows as u32, cols as u32);

    let gray = bytescale(base);
    for ((r, c), &v) in gray.indexed_iter() {
        out.put_pixel(r as u32, c as u32, Rgb([v, v, v]));
    }

    for (mask, color) in [(mask_1, RUN_1_COLOR), (mask_2, RUN_2_COLOR)] {
        for contour in mask_contours(mask) {
            for point in contour.points {
                out.put_pixel(point.x, point.y, color);
            }
        }
    }

    Ok(out)
}

/// Threshold a mask slice and trace the boundaries of its regions.
/// Outer borders and holes are both painted.
fn mask_contours(mask: ArrayView2<'_, f32>) -> Vec<Contour<u32>> {
    let (rows, cols) = mask.dim();
    let mut binary = GrayImage::new(rows as u32, cols as u32);
    for ((r, c), &v) in mask.indexed_iter() {
        if v >= CONTOUR_LEVEL {
            binary.put_pixel(r as u32, c as u32, Luma([255]));
        }
    }

    find_contours(&binary)
}

/// Encode the composed image as PNG bytes
pub fn encode_png(image: RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .map_err(|e| Error::Internal(format!("PNG encode failed: {}", e)))?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn square_mask(rows: usize, cols: usize, lo: usize, hi: usize) -> Array2<f32> {
        let mut mask = Array2::<f32>::zeros((rows, cols));
        for r in lo..hi {
            for c in lo..hi {
                mask[(r, c)] = 1.0;
            }
        }
        mask
    }

    #[test]
    fn composite_is_transposed() {
        let base = Array2::from_shape_fn((6, 4), |(r, c)| (r * 4 + c) as f32);
        let empty = Array2::<f32>::zeros((6, 4));

        let img = compose_slice(base.view(), empty.view(), empty.view()).unwrap();

        // width = array rows, height = array columns
        assert_eq!(img.dimensions(), (6, 4));
        // brightest voxel (5, 3) lands at pixel (5, 3) of the transposed image
        assert_eq!(img.get_pixel(5, 3), &Rgb([255, 255, 255]));
        assert_eq!(img.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn run_1_contour_is_red() {
        let base = Array2::<f32>::zeros((8, 8));
        let mask_1 = square_mask(8, 8, 2, 6);
        let mask_2 = Array2::<f32>::zeros((8, 8));

        let img = compose_slice(base.view(), mask_1.view(), mask_2.view()).unwrap();

        // Perimeter voxels of the square are painted
        assert_eq!(img.get_pixel(2, 2), &Rgb([255, 0, 0]));
        assert_eq!(img.get_pixel(5, 3), &Rgb([255, 0, 0]));
        assert_eq!(img.get_pixel(3, 5), &Rgb([255, 0, 0]));
        // Interior and exterior stay at the base gray
        assert_eq!(img.get_pixel(3, 3), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn run_2_contour_is_green() {
        let base = Array2::<f32>::zeros((8, 8));
        let mask_1 = Array2::<f32>::zeros((8, 8));
        let mask_2 = square_mask(8, 8, 1, 4);

        let img = compose_slice(base.view(), mask_1.view(), mask_2.view()).unwrap();

        assert_eq!(img.get_pixel(1, 1), &Rgb([0, 255, 0]));
        assert_eq!(img.get_pixel(3, 2), &Rgb([0, 255, 0]));
    }

    #[test]
    fn sub_threshold_mask_paints_nothing() {
        let base = Array2::<f32>::zeros((8, 8));
        let mut faint = Array2::<f32>::zeros((8, 8));
        faint[(4, 4)] = 0.5;
        let empty = Array2::<f32>::zeros((8, 8));

        let img = compose_slice(base.view(), faint.view(), empty.view()).unwrap();

        assert_eq!(img.get_pixel(4, 4), &Rgb([0, 0, 0]));
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let base = Array2::<f32>::zeros((8, 8));
        let small = Array2::<f32>::zeros((4, 4));
        let empty = Array2::<f32>::zeros((8, 8));

        assert!(compose_slice(base.view(), small.view(), empty.view()).is_err());
    }

    #[test]
    fn png_encoding_round_trips() {
        let base = Array2::<f32>::zeros((8, 8));
        let mask_1 = square_mask(8, 8, 2, 6);
        let empty = Array2::<f32>::zeros((8, 8));

        let img = compose_slice(base.view(), mask_1.view(), empty.view()).unwrap();
        let png = encode_png(img).unwrap();

        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (8, 8));
        assert_eq!(decoded.get_pixel(2, 2), &Rgb([255, 0, 0]));
    }
}
