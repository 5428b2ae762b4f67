use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::f64::consts::PI;

use crate::error::SimError;
use crate::io::{Sequence, Volume};

/// How the signal amplitude `s` is derived from the host sequence.
///
/// The historical fraction varied between 2% and 15% across experiments, so
/// it is a tunable rather than a physical constant.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Amplitude {
    /// Fraction of the sequence-wide maximum intensity.
    MaxFraction(f64),
    /// Fraction of the sequence-wide mean intensity.
    MeanFraction(f64),
    /// Absolute amplitude, independent of the host sequence.
    Fixed(f64),
}

/// Tunables for the periodic BOLD activation signal.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoldConfig {
    pub amplitude: Amplitude,
    /// Fundamental frequency in Hz; 0.04 Hz matches low-frequency
    /// physiological fluctuation.
    pub frequency: f64,
    /// Draw each voxel's temporal shift uniformly over one period so voxels
    /// are phase-decorrelated. When off, every voxel peaks together.
    pub phase_jitter: bool,
    /// Constant amplitude offset added inside the envelope.
    pub amplitude_offset: f64,
    pub seed: u64,
}

impl Default for BoldConfig {
    fn default() -> Self {
        BoldConfig {
            amplitude: Amplitude::MaxFraction(0.10),
            frequency: 0.04,
            phase_jitter: true,
            amplitude_offset: 0.0,
            seed: 42,
        }
    }
}

/// The host sequence with the signal added, plus the signal alone. The
/// signal-only sequence is the second ground-truth artifact, used later for
/// correlation analysis of extracted components.
#[derive(Debug, Clone)]
pub struct BoldOutput {
    pub sequence: Sequence,
    pub signal: Sequence,
}

fn resolve_amplitude(sequence: &Sequence, amplitude: Amplitude) -> f64 {
    match amplitude {
        Amplitude::MaxFraction(f) => f * sequence.max_intensity(),
        Amplitude::MeanFraction(f) => f * sequence.mean_intensity(),
        Amplitude::Fixed(s) => s,
    }
}

/// Additively superimpose `s * (cos(2π f0 (t - t_shift)) + a_shift)` at
/// every voxel selected by the ROI mask, for every time index.
///
/// The addition is purely local: voxels outside the mask are untouched and
/// the host intensity range is never renormalized or clipped.
pub fn inject_bold(
    sequence: &Sequence,
    roi: &Volume,
    config: &BoldConfig,
) -> Result<BoldOutput, SimError> {
    let spatial = sequence.spatial_shape();
    if roi.shape() != spatial {
        return Err(SimError::ShapeMismatch {
            expected: spatial,
            found: roi.shape(),
        });
    }
    if config.frequency <= 0.0 {
        return Err(SimError::InvalidParameter(format!(
            "frequency must be positive, got {}",
            config.frequency
        )));
    }

    let s = resolve_amplitude(sequence, config.amplitude);
    let period = 1.0 / config.frequency;
    let tr = sequence.mapping.repetition_time;
    let count = sequence.num_volumes();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut host = sequence.clone();
    let mut signal_only = Sequence::new(
        ndarray::Array4::zeros(host.data.raw_dim()),
        sequence.mapping.clone(),
    );

    for ((i, j, k), &mask) in roi.data.indexed_iter() {
        if mask == 0.0 {
            continue;
        }
        let t_shift = if config.phase_jitter {
            rng.random_range(0.0..period)
        } else {
            0.0
        };
        for t in 0..count {
            let t_sec = t as f64 * tr;
            let value = s
                * ((2.0 * PI * config.frequency * (t_sec - t_shift)).cos()
                    + config.amplitude_offset);
            host.data[[i, j, k, t]] += value;
            signal_only.data[[i, j, k, t]] = value;
        }
    }

    Ok(BoldOutput {
        sequence: host,
        signal: signal_only,
    })
}

#[cfg(test)]
mod signal_tests {
    use super::*;
    use crate::io::CoordinateMapping;
    use crate::utils::test_utils::{single_voxel_roi, zero_sequence};
    use ndarray::Array3;

    #[test]
    fn test_single_voxel_cosine() {
        // 64x64x64x10 zero sequence, one active voxel, fixed amplitude 10,
        // no jitter, no offset: the voxel must trace 10*cos(2*pi*0.04*t).
        let seq = zero_sequence((64, 64, 64), 10);
        let roi = single_voxel_roi((64, 64, 64), (10, 20, 30));
        let config = BoldConfig {
            amplitude: Amplitude::Fixed(10.0),
            frequency: 0.04,
            phase_jitter: false,
            amplitude_offset: 0.0,
            seed: 0,
        };

        let out = inject_bold(&seq, &roi, &config).unwrap();
        for t in 0..10 {
            let expected = 10.0 * (2.0 * PI * 0.04 * t as f64).cos();
            assert!(
                (out.sequence.data[[10, 20, 30, t]] - expected).abs() < 1e-10,
                "t={}",
                t
            );
            assert!((out.signal.data[[10, 20, 30, t]] - expected).abs() < 1e-10);
        }
    }

    #[test]
    fn test_voxels_outside_roi_untouched() {
        let mut seq = zero_sequence((8, 8, 8), 4);
        seq.data.fill(3.25);
        let roi = single_voxel_roi((8, 8, 8), (1, 1, 1));

        let out = inject_bold(&seq, &roi, &BoldConfig::default()).unwrap();
        for ((i, j, k, t), &v) in out.sequence.data.indexed_iter() {
            if (i, j, k) != (1, 1, 1) {
                assert_eq!(v, 3.25, "voxel ({},{},{}) changed at t={}", i, j, k, t);
                assert_eq!(out.signal.data[[i, j, k, t]], 0.0);
            }
        }
    }

    #[test]
    fn test_injection_is_exactly_additive() {
        let mut seq = zero_sequence((8, 8, 8), 5);
        seq.data.fill(100.0);
        let roi = single_voxel_roi((8, 8, 8), (2, 3, 4));

        let out = inject_bold(&seq, &roi, &BoldConfig::default()).unwrap();
        for t in 0..5 {
            let host = out.sequence.data[[2, 3, 4, t]];
            let sig = out.signal.data[[2, 3, 4, t]];
            assert!((host - (100.0 + sig)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_amplitude_fraction_of_max() {
        let mut seq = zero_sequence((8, 8, 8), 3);
        seq.data[[0, 0, 0, 0]] = 200.0;
        assert!((resolve_amplitude(&seq, Amplitude::MaxFraction(0.10)) - 20.0).abs() < 1e-12);
        assert!((resolve_amplitude(&seq, Amplitude::Fixed(7.0)) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_phase_jitter_decorrelates_voxels() {
        let seq = zero_sequence((6, 6, 6), 8);
        let mut roi_data = Array3::zeros((6, 6, 6));
        roi_data[[1, 1, 1]] = 1.0;
        roi_data[[4, 4, 4]] = 1.0;
        let roi = Volume::new(roi_data, CoordinateMapping::identity());

        let config = BoldConfig {
            amplitude: Amplitude::Fixed(10.0),
            ..BoldConfig::default()
        };
        let out = inject_bold(&seq, &roi, &config).unwrap();

        let a: Vec<f64> = (0..8).map(|t| out.signal.data[[1, 1, 1, t]]).collect();
        let b: Vec<f64> = (0..8).map(|t| out.signal.data[[4, 4, 4, t]]).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_repetition_time_scales_the_argument() {
        let mut seq = zero_sequence((4, 4, 4), 2);
        seq.mapping.repetition_time = 2.0;
        let roi = single_voxel_roi((4, 4, 4), (0, 0, 0));
        let config = BoldConfig {
            amplitude: Amplitude::Fixed(1.0),
            frequency: 0.04,
            phase_jitter: false,
            amplitude_offset: 0.0,
            seed: 0,
        };

        let out = inject_bold(&seq, &roi, &config).unwrap();
        let expected = (2.0 * PI * 0.04 * 2.0).cos();
        assert!((out.sequence.data[[0, 0, 0, 1]] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_mask_shape_mismatch_is_rejected() {
        let seq = zero_sequence((8, 8, 8), 3);
        let roi = single_voxel_roi((8, 8, 4), (0, 0, 0));
        let err = inject_bold(&seq, &roi, &BoldConfig::default()).unwrap_err();
        assert_eq!(
            err,
            SimError::ShapeMismatch {
                expected: (8, 8, 8),
                found: (8, 8, 4)
            }
        );
    }
}
