use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::io::Sequence;
use crate::motion::center_of_mass::center_of_mass;
use crate::motion::resample::resample;
use crate::transform::RigidTransform;

/// Rotation angles (degrees) and translations carried forward across the
/// volumes of a sequence. Volume 0 is always simulated from the zero state,
/// leaving it untouched as the reference frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    pub x_angle: f64,
    pub y_angle: f64,
    pub z_angle: f64,
    pub x_shift: f64,
    pub y_shift: f64,
    pub z_shift: f64,
}

impl MotionState {
    pub fn zero() -> Self {
        MotionState {
            x_angle: 0.0,
            y_angle: 0.0,
            z_angle: 0.0,
            x_shift: 0.0,
            y_shift: 0.0,
            z_shift: 0.0,
        }
    }
}

/// One row of the ground-truth motion log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MotionRecord {
    #[serde(rename = "Volume Number")]
    pub volume: usize,
    #[serde(rename = "X Angle")]
    pub x_angle: f64,
    #[serde(rename = "Y Angle")]
    pub y_angle: f64,
    #[serde(rename = "Z Angle")]
    pub z_angle: f64,
    #[serde(rename = "X Translation")]
    pub x_translation: f64,
    #[serde(rename = "Y Translation")]
    pub y_translation: f64,
    #[serde(rename = "Z Translation")]
    pub z_translation: f64,
}

/// Tunables for the bounded random-walk motion simulator.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotionConfig {
    /// Standard deviation (degrees) of the per-volume rotation increments.
    pub rotation_std: f64,
    /// Standard deviation of the per-volume translation increments; the
    /// translation walk is disabled when absent, which is the default.
    pub translation_std: Option<f64>,
    /// Anatomically plausible clamp intervals per rotation axis, degrees.
    pub x_bounds: (f64, f64),
    pub y_bounds: (f64, f64),
    pub z_bounds: (f64, f64),
    pub seed: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        MotionConfig {
            rotation_std: 1.0,
            translation_std: None,
            x_bounds: (-30.0, 30.0),
            y_bounds: (-20.0, 45.0),
            z_bounds: (-75.0, 75.0),
            seed: 42,
        }
    }
}

/// The transformed sequence plus the exact corruption bookkeeping: one log
/// row and one transform per volume, aligned by index.
#[derive(Debug, Clone)]
pub struct MotionOutput {
    pub sequence: Sequence,
    pub log: Vec<MotionRecord>,
    pub transforms: Vec<RigidTransform>,
}

fn clamp(value: f64, bounds: (f64, f64)) -> f64 {
    value.clamp(bounds.0, bounds.1)
}

/// Advance the motion state by one step of the random walk and clamp the
/// angles back into their plausible intervals. Out-of-range values are
/// clamped rather than rejected; the walk never resets.
pub fn advance_state(
    state: &MotionState,
    config: &MotionConfig,
    rng: &mut StdRng,
) -> Result<MotionState, SimError> {
    let rotation = Normal::new(0.0, config.rotation_std).map_err(|_| {
        SimError::InvalidParameter(format!(
            "rotation_std must be finite and non-negative, got {}",
            config.rotation_std
        ))
    })?;

    let mut next = *state;
    next.z_angle += rotation.sample(rng);
    next.y_angle += rotation.sample(rng);
    next.x_angle += rotation.sample(rng);

    if let Some(std) = config.translation_std {
        let translation = Normal::new(0.0, std).map_err(|_| {
            SimError::InvalidParameter(format!(
                "translation_std must be finite and non-negative, got {}",
                std
            ))
        })?;
        next.z_shift += translation.sample(rng);
        next.y_shift += translation.sample(rng);
        next.x_shift += translation.sample(rng);
    }

    next.x_angle = clamp(next.x_angle, config.x_bounds);
    next.y_angle = clamp(next.y_angle, config.y_bounds);
    next.z_angle = clamp(next.z_angle, config.z_bounds);

    Ok(next)
}

/// Drive the bounded random walk across a whole sequence.
///
/// Per volume: the rotation pivot is recomputed from the current,
/// not-yet-transformed volume; the log row records the state used to
/// transform *this* volume; then the state advances for the next one.
pub fn simulate_motion(
    sequence: &Sequence,
    config: &MotionConfig,
) -> Result<MotionOutput, SimError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut state = MotionState::zero();

    let count = sequence.num_volumes();
    let mut volumes = Vec::with_capacity(count);
    let mut log = Vec::with_capacity(count);
    let mut transforms = Vec::with_capacity(count);

    for t in 0..count {
        let volume = sequence.volume(t);
        let pivot = center_of_mass(&volume)?;

        log.push(MotionRecord {
            volume: t,
            x_angle: state.x_angle,
            y_angle: state.y_angle,
            z_angle: state.z_angle,
            x_translation: state.x_shift,
            y_translation: state.y_shift,
            z_translation: state.z_shift,
        });

        let transform = RigidTransform::rigid_motion(
            state.x_angle,
            state.y_angle,
            state.z_angle,
            Vector3::new(state.x_shift, state.y_shift, state.z_shift),
            pivot,
        );

        let moved = resample(&volume, &transform);
        volumes.push(moved.data);
        transforms.push(transform);

        state = advance_state(&state, config, &mut rng)?;
    }

    let sequence = Sequence::from_volumes(&volumes, sequence.mapping.clone())?;
    Ok(MotionOutput {
        sequence,
        log,
        transforms,
    })
}
