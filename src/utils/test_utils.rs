//! Synthetic phantom builders shared across the test modules.

use ndarray::Array3;

use crate::io::{CoordinateMapping, Sequence, Volume};

/// Solid sphere of constant intensity on a zero background.
pub fn sphere_volume(
    shape: (usize, usize, usize),
    center: (f64, f64, f64),
    radius: f64,
    intensity: f64,
) -> Volume {
    let mut data = Array3::zeros((shape.0, shape.1, shape.2));
    for ((i, j, k), value) in data.indexed_iter_mut() {
        let dx = i as f64 - center.0;
        let dy = j as f64 - center.1;
        let dz = k as f64 - center.2;
        if dx * dx + dy * dy + dz * dz <= radius * radius {
            *value = intensity;
        }
    }
    Volume::new(data, CoordinateMapping::identity())
}

/// Temporally constant sequence of a centered sphere phantom.
pub fn sphere_sequence(shape: (usize, usize, usize), count: usize) -> Sequence {
    let center = (
        shape.0 as f64 / 2.0,
        shape.1 as f64 / 2.0,
        shape.2 as f64 / 2.0,
    );
    let radius = shape.0.min(shape.1).min(shape.2) as f64 / 4.0;
    sphere_volume(shape, center, radius, 100.0)
        .replicate(count)
        .expect("count is non-zero in fixtures")
}

/// All-zero sequence, useful when only the injected signal should remain.
pub fn zero_sequence(shape: (usize, usize, usize), count: usize) -> Sequence {
    Volume::new(
        Array3::zeros((shape.0, shape.1, shape.2)),
        CoordinateMapping::identity(),
    )
    .replicate(count)
    .expect("count is non-zero in fixtures")
}

/// Binary mask selecting exactly one voxel.
pub fn single_voxel_roi(shape: (usize, usize, usize), index: (usize, usize, usize)) -> Volume {
    let mut data = Array3::zeros((shape.0, shape.1, shape.2));
    data[[index.0, index.1, index.2]] = 1.0;
    Volume::new(data, CoordinateMapping::identity())
}
