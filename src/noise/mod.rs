pub mod fft;

use ndarray::Array3;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use serde::Deserialize;

use crate::error::SimError;
use crate::io::{Sequence, Volume};
use crate::noise::fft::{fft3d, fftshift, ifft3d, ifftshift};

/// Tunables for the k-space thermal noise synthesizer.
///
/// The magnitude/phase scales differ deliberately: phase noise perturbs the
/// spectrum far more per unit amplitude than magnitude noise does.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseConfig {
    /// Intensities are expressed relative to this maximum before and after
    /// the Fourier round trip.
    pub reference_max: f64,
    /// Scale of the real (magnitude) noise channel.
    pub magnitude_scale: f64,
    /// Scale of the imaginary (phase) noise channel.
    pub phase_scale: f64,
    pub seed: u64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        NoiseConfig {
            reference_max: 1000.0,
            magnitude_scale: 2.0,
            phase_scale: 0.05,
            seed: 42,
        }
    }
}

/// Run one volume through the Fourier half of the pipeline: normalize,
/// transform, add complex Gaussian noise in the centered spectrum, transform
/// back, keep the real part. The final rescale/round/clip happens separately
/// in `cleaned`, because its denominator depends on the caller's scope.
///
/// `global_max` is the maximum the normalization is taken against; for a
/// sequence this is the sequence-wide maximum so the per-volume
/// normalization itself cannot introduce temporal intensity drift.
fn noisy_real(
    data: &Array3<f64>,
    global_max: f64,
    config: &NoiseConfig,
    seed: u64,
) -> Result<Array3<f64>, SimError> {
    if global_max <= 0.0 {
        return Err(SimError::ZeroIntensity);
    }

    let shape = data.shape();
    let (nx, ny, nz) = (shape[0], shape[1], shape[2]);

    // Normalize to the reference maximum before transforming.
    let scale = config.reference_max / global_max;
    let mut kspace: Vec<Complex64> = data
        .iter()
        .map(|&v| Complex64::new(v * scale, 0.0))
        .collect();

    fft3d(&mut kspace, nx, ny, nz);
    let mut centered = fftshift(&kspace, nx, ny, nz);

    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).expect("unit normal is always valid");
    for value in centered.iter_mut() {
        let noise = Complex64::new(
            normal.sample(&mut rng) * config.magnitude_scale,
            normal.sample(&mut rng) * config.phase_scale,
        );
        *value += noise;
    }

    let mut kspace = ifftshift(&centered, nx, ny, nz);
    ifft3d(&mut kspace, nx, ny, nz);

    let real: Vec<f64> = kspace.iter().map(|c| c.re).collect();
    Ok(Array3::from_shape_vec((nx, ny, nz), real)
        .expect("real buffer has the input shape"))
}

/// Rescale to the reference maximum against `max`, round to 8 decimals,
/// hard-clip to the reference range.
fn cleaned(real: Array3<f64>, max: f64, config: &NoiseConfig) -> Result<Array3<f64>, SimError> {
    if max <= 0.0 {
        return Err(SimError::ZeroIntensity);
    }
    let rescale = config.reference_max / max;
    Ok(real.mapv(|v| {
        let v = ((v * rescale) * 1e8).round() / 1e8;
        v.clamp(0.0, config.reference_max)
    }))
}

fn max_of(data: &Array3<f64>) -> f64 {
    data.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
}

/// Add k-space noise to a single volume, normalized against its own maximum.
pub fn add_kspace_noise_volume(
    volume: &Volume,
    config: &NoiseConfig,
) -> Result<Volume, SimError> {
    let real = noisy_real(&volume.data, volume.max_intensity(), config, config.seed)?;
    let max = max_of(&real);
    let data = cleaned(real, max, config)?;
    Ok(Volume::new(data, volume.mapping.clone()))
}

/// Add k-space noise to every volume of a sequence independently.
///
/// All volumes normalize against the single sequence-wide maximum, and each
/// gets its own RNG stream derived from the base seed, so they can be
/// processed in parallel without changing the result. The final rescale also
/// uses one shared denominator, the post-noise sequence-wide maximum, so the
/// cleanup step cannot flatten inter-volume brightness differences either.
pub fn add_kspace_noise(
    sequence: &Sequence,
    config: &NoiseConfig,
) -> Result<Sequence, SimError> {
    let global_max = sequence.max_intensity();

    let reals: Vec<Array3<f64>> = (0..sequence.num_volumes())
        .into_par_iter()
        .map(|t| {
            let data = sequence.volume(t).data;
            noisy_real(
                &data,
                global_max,
                config,
                config.seed.wrapping_add(t as u64),
            )
        })
        .collect::<Result<_, _>>()?;

    let post_noise_max = reals
        .iter()
        .map(max_of)
        .fold(f64::NEG_INFINITY, f64::max);
    let volumes: Vec<Array3<f64>> = reals
        .into_iter()
        .map(|real| cleaned(real, post_noise_max, config))
        .collect::<Result<_, _>>()?;

    Sequence::from_volumes(&volumes, sequence.mapping.clone())
}
