use nalgebra::Vector3;
use ndarray::Array3;

use crate::io::Volume;
use crate::transform::RigidTransform;

/// Resample a volume through a rigid transform, producing a new volume of
/// identical shape. The input is never mutated.
///
/// Resampling convention: the transform maps an *output* voxel index to the
/// *input* voxel index it samples from. Interpolation is fixed to nearest
/// neighbor so injected motion stays exactly invertible in index space up to
/// rounding; samples falling outside the input volume are filled with 0.
pub fn resample(volume: &Volume, transform: &RigidTransform) -> Volume {
    let (nx, ny, nz) = volume.shape();
    let mut output = Array3::zeros((nx, ny, nz));

    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                let source =
                    transform.apply(Vector3::new(i as f64, j as f64, k as f64));
                let si = source[0].round() as isize;
                let sj = source[1].round() as isize;
                let sk = source[2].round() as isize;

                if si >= 0
                    && sj >= 0
                    && sk >= 0
                    && (si as usize) < nx
                    && (sj as usize) < ny
                    && (sk as usize) < nz
                {
                    output[[i, j, k]] =
                        volume.data[[si as usize, sj as usize, sk as usize]];
                }
            }
        }
    }

    Volume::new(output, volume.mapping.clone())
}
