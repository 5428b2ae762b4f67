pub mod input;
pub mod output;

use nalgebra::Matrix4;
use ndarray::{Array3, Array4, Axis};

use crate::error::SimError;

/// Mapping from voxel indices to physical space, shared by every volume of a
/// sequence. The affine covers the three spatial axes; the temporal axis is
/// described by a fixed sampling interval.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateMapping {
    /// 4x4 affine taking (i, j, k, 1) voxel indices to physical coordinates.
    pub affine: Matrix4<f64>,
    pub axis_names: [String; 3],
    pub spatial_unit: String,
    /// Seconds between consecutive volumes.
    pub repetition_time: f64,
}

impl CoordinateMapping {
    /// Identity mapping with unit voxels, used for synthetic phantoms.
    pub fn identity() -> Self {
        CoordinateMapping {
            affine: Matrix4::identity(),
            axis_names: ["x".to_string(), "y".to_string(), "z".to_string()],
            spatial_unit: "mm".to_string(),
            repetition_time: 1.0,
        }
    }

    /// Voxel size along each spatial axis, the column norms of the affine.
    pub fn voxel_size(&self) -> [f64; 3] {
        let mut size = [0.0; 3];
        for c in 0..3 {
            let col = self.affine.fixed_view::<3, 1>(0, c);
            size[c] = col.norm();
        }
        size
    }
}

/// A single 3-D image volume with its coordinate mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub data: Array3<f64>,
    pub mapping: CoordinateMapping,
}

impl Volume {
    pub fn new(data: Array3<f64>, mapping: CoordinateMapping) -> Self {
        Volume { data, mapping }
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        let s = self.data.shape();
        (s[0], s[1], s[2])
    }

    pub fn max_intensity(&self) -> f64 {
        self.data.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Promote a 3-D volume to a temporally constant 4-D sequence by
    /// replicating it `count` times along the time axis.
    pub fn replicate(&self, count: usize) -> Result<Sequence, SimError> {
        if count == 0 {
            return Err(SimError::InvalidParameter(
                "replication count must be at least 1".to_string(),
            ));
        }
        let views: Vec<_> = (0..count).map(|_| self.data.view()).collect();
        let data = ndarray::stack(Axis(3), &views)
            .expect("replicated views share one shape");
        Ok(Sequence {
            data,
            mapping: self.mapping.clone(),
        })
    }
}

/// An ordered series of volumes sharing one spatial mapping, stored as a
/// 4-D array indexed (x, y, z, t).
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub data: Array4<f64>,
    pub mapping: CoordinateMapping,
}

impl Sequence {
    pub fn new(data: Array4<f64>, mapping: CoordinateMapping) -> Self {
        Sequence { data, mapping }
    }

    /// Stack a list of volumes along the temporal axis. Every volume must
    /// share the spatial shape of the first.
    pub fn from_volumes(
        volumes: &[Array3<f64>],
        mapping: CoordinateMapping,
    ) -> Result<Self, SimError> {
        if volumes.is_empty() {
            return Err(SimError::InvalidParameter(
                "cannot build a sequence from zero volumes".to_string(),
            ));
        }
        let first = volumes[0].shape();
        let expected = (first[0], first[1], first[2]);
        for vol in volumes.iter().skip(1) {
            let s = vol.shape();
            let found = (s[0], s[1], s[2]);
            if found != expected {
                return Err(SimError::ShapeMismatch { expected, found });
            }
        }
        let views: Vec<_> = volumes.iter().map(|v| v.view()).collect();
        let data = ndarray::stack(Axis(3), &views)
            .expect("volume shapes checked above");
        Ok(Sequence { data, mapping })
    }

    pub fn num_volumes(&self) -> usize {
        self.data.shape()[3]
    }

    pub fn spatial_shape(&self) -> (usize, usize, usize) {
        let s = self.data.shape();
        (s[0], s[1], s[2])
    }

    /// Isolate a single volume from the sequence as an owned copy.
    pub fn volume(&self, t: usize) -> Volume {
        let data = self.data.index_axis(Axis(3), t).to_owned();
        Volume {
            data,
            mapping: self.mapping.clone(),
        }
    }

    pub fn max_intensity(&self) -> f64 {
        self.data.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn mean_intensity(&self) -> f64 {
        self.data.sum() / self.data.len() as f64
    }
}

#[cfg(test)]
mod sequence_tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_replicate_volume() {
        let mut data = Array3::zeros((4, 4, 4));
        data[[1, 2, 3]] = 7.0;
        let vol = Volume::new(data, CoordinateMapping::identity());

        let seq = vol.replicate(5).unwrap();
        assert_eq!(seq.num_volumes(), 5);
        assert_eq!(seq.spatial_shape(), (4, 4, 4));
        for t in 0..5 {
            assert_eq!(seq.data[[1, 2, 3, t]], 7.0);
        }
    }

    #[test]
    fn test_replicate_zero_count_rejected() {
        let vol = Volume::new(Array3::zeros((2, 2, 2)), CoordinateMapping::identity());
        assert!(vol.replicate(0).is_err());
    }

    #[test]
    fn test_from_volumes_shape_mismatch() {
        let a = Array3::<f64>::zeros((4, 4, 4));
        let b = Array3::<f64>::zeros((4, 4, 3));
        let err = Sequence::from_volumes(&[a, b], CoordinateMapping::identity());
        assert_eq!(
            err.unwrap_err(),
            SimError::ShapeMismatch {
                expected: (4, 4, 4),
                found: (4, 4, 3)
            }
        );
    }

    #[test]
    fn test_isolate_volume_is_a_copy() {
        let mut volumes = Vec::new();
        for t in 0..3 {
            let mut v = Array3::zeros((2, 2, 2));
            v[[0, 0, 0]] = t as f64;
            volumes.push(v);
        }
        let seq = Sequence::from_volumes(&volumes, CoordinateMapping::identity()).unwrap();

        let mut vol = seq.volume(1);
        assert_eq!(vol.data[[0, 0, 0]], 1.0);
        vol.data[[0, 0, 0]] = 99.0;
        assert_eq!(seq.data[[0, 0, 0, 1]], 1.0);
    }

    #[test]
    fn test_voxel_size_from_affine() {
        let mut mapping = CoordinateMapping::identity();
        mapping.affine[(0, 0)] = 2.0;
        mapping.affine[(1, 1)] = 3.0;
        let size = mapping.voxel_size();
        assert!((size[0] - 2.0).abs() < 1e-12);
        assert!((size[1] - 3.0).abs() < 1e-12);
        assert!((size[2] - 1.0).abs() < 1e-12);
    }
}
