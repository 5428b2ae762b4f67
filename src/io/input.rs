use anyhow::{bail, Context, Result};
use nalgebra::Matrix4;
use ndarray::{Axis, Ix3, Ix4};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::path::Path;

use super::{CoordinateMapping, Sequence};

fn mapping_from_header(header: &NiftiHeader) -> CoordinateMapping {
    let mut affine = Matrix4::identity();
    if header.sform_code > 0 {
        let rows = [header.srow_x, header.srow_y, header.srow_z];
        for (r, row) in rows.iter().enumerate() {
            for c in 0..4 {
                affine[(r, c)] = row[c] as f64;
            }
        }
    } else {
        // No stored orientation, fall back to voxel-size scaling.
        for (i, &size) in header.pixdim[1..4].iter().enumerate() {
            affine[(i, i)] = size as f64;
        }
    }

    let repetition_time = if header.pixdim[4] > 0.0 {
        header.pixdim[4] as f64
    } else {
        1.0
    };

    CoordinateMapping {
        affine,
        axis_names: ["x".to_string(), "y".to_string(), "z".to_string()],
        spatial_unit: "mm".to_string(),
        repetition_time,
    }
}

/// Load a NIfTI volume or sequence (.nii / .nii.gz). A 3-D file comes back
/// as a single-volume sequence so callers see one shape everywhere.
pub fn load_sequence<P: AsRef<Path>>(path: P) -> Result<Sequence> {
    let obj = ReaderOptions::new()
        .read_file(&path)
        .with_context(|| format!("failed to read NIfTI file {:?}", path.as_ref()))?;
    let header = obj.header().clone();
    let mapping = mapping_from_header(&header);

    let array = obj
        .into_volume()
        .into_ndarray::<f64>()
        .context("failed to convert NIfTI volume to ndarray")?;

    let mut data = match array.ndim() {
        3 => array
            .into_dimensionality::<Ix3>()
            .context("volume claims 3 dimensions but is not 3-D")?
            .insert_axis(Axis(3)),
        4 => array
            .into_dimensionality::<Ix4>()
            .context("volume claims 4 dimensions but is not 4-D")?,
        n => bail!("expected a 3-D or 4-D image, got {} dimensions", n),
    };

    // Apply the header's intensity scaling; slope 0 means unscaled.
    let slope = if header.scl_slope == 0.0 {
        1.0
    } else {
        header.scl_slope as f64
    };
    let inter = header.scl_inter as f64;
    if slope != 1.0 || inter != 0.0 {
        data.mapv_inplace(|v| v * slope + inter);
    }

    Ok(Sequence::new(data, mapping))
}

#[cfg(test)]
mod input_tests {
    use super::*;
    use crate::io::output::save_sequence;
    use crate::io::Volume;
    use ndarray::Array3;
    use tempfile::tempdir;

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("phantom.nii");

        let mut data = Array3::zeros((5, 6, 7));
        data[[1, 2, 3]] = 42.0;
        data[[4, 5, 6]] = 7.5;
        let mut mapping = CoordinateMapping::identity();
        mapping.affine[(0, 0)] = 2.0;
        mapping.repetition_time = 2.5;
        let seq = Volume::new(data, mapping.clone()).replicate(3).unwrap();

        save_sequence(&seq, &path).unwrap();
        let loaded = load_sequence(&path).unwrap();

        assert_eq!(loaded.num_volumes(), 3);
        assert_eq!(loaded.spatial_shape(), (5, 6, 7));
        for t in 0..3 {
            assert!((loaded.data[[1, 2, 3, t]] - 42.0).abs() < 1e-6);
            assert!((loaded.data[[4, 5, 6, t]] - 7.5).abs() < 1e-6);
        }
        assert!((loaded.mapping.affine[(0, 0)] - 2.0).abs() < 1e-6);
        assert!((loaded.mapping.repetition_time - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_missing_file_is_surfaced() {
        let err = load_sequence("/nonexistent/path/image.nii");
        assert!(err.is_err());
    }
}
