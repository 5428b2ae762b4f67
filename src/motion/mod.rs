pub mod center_of_mass;
pub mod resample;
pub mod trajectory;

pub use center_of_mass::center_of_mass;
pub use resample::resample;
pub use trajectory::{simulate_motion, MotionConfig, MotionOutput, MotionRecord, MotionState};
