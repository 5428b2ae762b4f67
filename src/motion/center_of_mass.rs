use nalgebra::Vector3;

use crate::error::SimError;
use crate::io::Volume;

/// Intensity-weighted center of mass of the foreground, rounded to the
/// nearest voxel index.
///
/// The foreground is everything strictly above zero intensity. An empty
/// foreground is an explicit error; fabricating a centroid (for example the
/// image center) would silently corrupt the rotation pivot downstream.
pub fn center_of_mass(volume: &Volume) -> Result<Vector3<f64>, SimError> {
    let mut weight = 0.0;
    let mut sum = Vector3::zeros();

    for ((i, j, k), &value) in volume.data.indexed_iter() {
        if value > 0.0 {
            weight += value;
            sum += Vector3::new(i as f64, j as f64, k as f64) * value;
        }
    }

    if weight == 0.0 {
        return Err(SimError::EmptyForeground);
    }

    let centroid = sum / weight;
    Ok(Vector3::new(
        centroid[0].round(),
        centroid[1].round(),
        centroid[2].round(),
    ))
}

#[cfg(test)]
mod com_tests {
    use super::*;
    use crate::io::CoordinateMapping;
    use ndarray::Array3;

    #[test]
    fn test_single_voxel_centroid() {
        let mut data = Array3::zeros((8, 8, 8));
        data[[2, 5, 6]] = 3.0;
        let vol = Volume::new(data, CoordinateMapping::identity());
        let com = center_of_mass(&vol).unwrap();
        assert_eq!(com, Vector3::new(2.0, 5.0, 6.0));
    }

    #[test]
    fn test_weighted_centroid_rounds_to_voxel() {
        let mut data = Array3::zeros((8, 8, 8));
        // Twice the weight at x=4 pulls the centroid to 3, which rounds up.
        data[[1, 0, 0]] = 1.0;
        data[[4, 0, 0]] = 2.0;
        let vol = Volume::new(data, CoordinateMapping::identity());
        let com = center_of_mass(&vol).unwrap();
        assert_eq!(com, Vector3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_negative_intensities_are_background() {
        let mut data = Array3::zeros((4, 4, 4));
        data[[0, 0, 0]] = -5.0;
        let vol = Volume::new(data, CoordinateMapping::identity());
        assert_eq!(center_of_mass(&vol).unwrap_err(), SimError::EmptyForeground);
    }

    #[test]
    fn test_empty_foreground_is_an_error() {
        let vol = Volume::new(Array3::zeros((4, 4, 4)), CoordinateMapping::identity());
        assert_eq!(center_of_mass(&vol).unwrap_err(), SimError::EmptyForeground);
    }
}
