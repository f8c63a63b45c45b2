//! NIfTI volume loading and display scaling

use crate::{Error, Result};
use ndarray::{Array2, Array3, ArrayView2, Axis, Ix3};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use std::path::Path;
use tracing::info;

/// A CT volume (base image or segmentation mask) held in memory.
///
/// Axes follow NIfTI on-disk order: (height, width, depth). Axial
/// slices index the third axis.
#[derive(Debug, Clone)]
pub struct CtVolume {
    data: Array3<f32>,
}

impl CtVolume {
    /// Load a `.nii` or `.nii.gz` volume, converting voxels to f32.
    pub fn load(path: &Path) -> Result<CtVolume> {
        info!("loading {}", path.display());

        let object = ReaderOptions::new()
            .read_file(path)
            .map_err(|e| Error::nifti(path, e))?;
        let mut data = object
            .into_volume()
            .into_ndarray::<f32>()
            .map_err(|e| Error::nifti(path, e))?;

        // Some exports carry trailing singleton axes (H x W x D x 1)
        while data.ndim() > 3 && data.shape()[data.ndim() - 1] == 1 {
            let last = data.ndim() - 1;
            data = data.index_axis_move(Axis(last), 0);
        }

        let data = data.into_dimensionality::<Ix3>().map_err(|_| {
            Error::InvalidInput(format!("{}: expected a 3-D volume", path.display()))
        })?;

        Ok(CtVolume { data })
    }

    /// Wrap an in-memory array as a volume.
    pub fn from_array(data: Array3<f32>) -> CtVolume {
        CtVolume { data }
    }

    /// (height, width, depth)
    pub fn dims(&self) -> (usize, usize, usize) {
        let s = self.data.shape();
        (s[0], s[1], s[2])
    }

    /// Number of axial slices
    pub fn depth(&self) -> usize {
        self.data.shape()[2]
    }

    /// Axial slice `z` as a 2-D view
    pub fn slice(&self, z: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(2), z)
    }
}

/// Linear rescale of a slice to the full u8 display range.
///
/// The slice minimum maps to 0 and the maximum to 255; a constant slice
/// maps to all zeros. NaN voxels are ignored for the range and come out
/// as 0.
pub fn bytescale(slice: ArrayView2<'_, f32>) -> Array2<u8> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in slice.iter() {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }

    if !(max > min) {
        return Array2::zeros(slice.raw_dim());
    }

    let scale = 255.0 / (max - min);
    slice.mapv(|v| {
        if v.is_nan() {
            0
        } else {
            ((v - min) * scale).round().clamp(0.0, 255.0) as u8
        }
    })
}
