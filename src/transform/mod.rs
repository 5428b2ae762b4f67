use nalgebra::{Matrix3, Matrix4, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Axis of rotation. The matrix layout behind each label follows the frame
/// convention of the scanner data this simulator was built against, so the
/// labels must never be reinterpreted against a textbook convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Public parsing entry point for callers that take user-facing axis
    /// labels (frontends, scripts driving the library). Unknown labels are a
    /// hard error, never a default.
    pub fn from_label(label: &str) -> Result<Axis, SimError> {
        match label.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            other => Err(SimError::InvalidAxis(other.to_string())),
        }
    }
}

/// A rigid-body transform in voxel space: a rotation/scale matrix, a
/// translation, and the pivot the matrix is applied around.
///
/// Application convention: `out = M * (p - center) + center + translation`.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidTransform {
    pub matrix: Matrix3<f64>,
    pub translation: Vector3<f64>,
    pub center: Vector3<f64>,
}

impl RigidTransform {
    pub fn identity() -> Self {
        RigidTransform {
            matrix: Matrix3::identity(),
            translation: Vector3::zeros(),
            center: Vector3::zeros(),
        }
    }

    /// Rotation about one axis by an angle in degrees, pivoting on `center`.
    ///
    /// The angle is negated before conversion to radians so that a positive
    /// input matches the physical rotation direction of the target frame.
    pub fn rotation(axis: Axis, degrees: f64, center: Vector3<f64>) -> Self {
        let rad = (-degrees).to_radians();
        let (sin, cos) = rad.sin_cos();
        let matrix = match axis {
            Axis::Z => Matrix3::new(
                1.0, 0.0, 0.0, //
                0.0, cos, -sin, //
                0.0, sin, cos,
            ),
            Axis::X => Matrix3::new(
                cos, 0.0, sin, //
                0.0, 1.0, 0.0, //
                -sin, 0.0, cos,
            ),
            Axis::Y => Matrix3::new(
                cos, -sin, 0.0, //
                sin, cos, 0.0, //
                0.0, 0.0, 1.0,
            ),
        };
        RigidTransform {
            matrix,
            translation: Vector3::zeros(),
            center,
        }
    }

    /// Uniform scaling about the origin.
    pub fn scaling(factor: f64) -> Self {
        RigidTransform {
            matrix: Matrix3::identity() * factor,
            translation: Vector3::zeros(),
            center: Vector3::zeros(),
        }
    }

    /// Translation-only transform.
    pub fn translation(shift: Vector3<f64>, center: Vector3<f64>) -> Self {
        RigidTransform {
            matrix: Matrix3::identity(),
            translation: shift,
            center,
        }
    }

    /// Composite rotation about all three axes plus a translation, pivoting
    /// on `center`. The rotation matrices multiply as Z * X * Y, so a point
    /// is rotated about Y first, then X, then Z.
    pub fn rigid_motion(
        xdeg: f64,
        ydeg: f64,
        zdeg: f64,
        shift: Vector3<f64>,
        center: Vector3<f64>,
    ) -> Self {
        let z = Self::rotation(Axis::Z, zdeg, center).matrix;
        let x = Self::rotation(Axis::X, xdeg, center).matrix;
        let y = Self::rotation(Axis::Y, ydeg, center).matrix;
        RigidTransform {
            matrix: z * x * y,
            translation: shift,
            center,
        }
    }

    /// Apply the transform to a point.
    pub fn apply(&self, point: Vector3<f64>) -> Vector3<f64> {
        self.matrix * (point - self.center) + self.center + self.translation
    }

    /// Fold an ordered list of transforms into one. The first element of the
    /// list is applied to a point first, making composition order an explicit
    /// parameter instead of implicit call order.
    pub fn compose(transforms: &[RigidTransform]) -> Self {
        let mut matrix = Matrix3::identity();
        let mut offset = Vector3::zeros();
        for t in transforms {
            // Affine form: p -> M*p + b with b folding center and translation.
            let b = t.center + t.translation - t.matrix * t.center;
            matrix = t.matrix * matrix;
            offset = t.matrix * offset + b;
        }
        RigidTransform {
            matrix,
            translation: offset,
            center: Vector3::zeros(),
        }
    }

    /// Homogeneous 4x4 form, with the center folded into the offset column:
    /// `offset = translation + center - M * center`.
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        let offset = self.translation + self.center - self.matrix * self.center;
        let mut m = Matrix4::identity();
        for r in 0..3 {
            for c in 0..3 {
                m[(r, c)] = self.matrix[(r, c)];
            }
            m[(r, 3)] = offset[r];
        }
        m
    }
}

/// Serialized form of a rigid transform, written once per simulated volume
/// so estimated motion can later be scored against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransformArtifact {
    /// Rotation matrix in row-major order.
    pub matrix: [[f64; 3]; 3],
    pub translation: [f64; 3],
    pub center: [f64; 3],
}

impl From<&RigidTransform> for TransformArtifact {
    fn from(t: &RigidTransform) -> Self {
        let mut matrix = [[0.0; 3]; 3];
        for r in 0..3 {
            for c in 0..3 {
                matrix[r][c] = t.matrix[(r, c)];
            }
        }
        TransformArtifact {
            matrix,
            translation: [t.translation[0], t.translation[1], t.translation[2]],
            center: [t.center[0], t.center[1], t.center[2]],
        }
    }
}

impl TransformArtifact {
    pub fn to_transform(&self) -> RigidTransform {
        let m = &self.matrix;
        RigidTransform {
            matrix: Matrix3::new(
                m[0][0], m[0][1], m[0][2], //
                m[1][0], m[1][1], m[1][2], //
                m[2][0], m[2][1], m[2][2],
            ),
            translation: Vector3::new(
                self.translation[0],
                self.translation[1],
                self.translation[2],
            ),
            center: Vector3::new(self.center[0], self.center[1], self.center[2]),
        }
    }
}
