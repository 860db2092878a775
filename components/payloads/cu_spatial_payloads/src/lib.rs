use bincode::{Decode, Encode};
use core::fmt::Debug;
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Transform3D is a 4x4 homogeneous transform stored row-major.
///
/// The top-left 3x3 block is the rotation, the last column holds the
/// translation and the bottom row is `[0, 0, 0, 1]` for every transform built
/// through the constructors of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct Transform3D<T: Copy + Debug + 'static> {
    pub mat: [[T; 4]; 4],
}

/// Unit quaternion in (x, y, z, w) order, the layout used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct Quaternion<T: Copy + Debug + 'static> {
    pub x: T,
    pub y: T,
    pub z: T,
    pub w: T,
}

impl<T: Copy + Debug + 'static> Transform3D<T> {
    /// Create a transform from a row-major 4x4 matrix
    pub fn from_matrix(mat: [[T; 4]; 4]) -> Self {
        Self { mat }
    }

    /// Get the transform as a row-major 4x4 matrix
    pub fn to_matrix(self) -> [[T; 4]; 4] {
        self.mat
    }
}

macro_rules! impl_float_transform {
    ($t:ty, $length:ty) => {
        impl Default for Transform3D<$t> {
            fn default() -> Self {
                Self::identity()
            }
        }

        impl Transform3D<$t> {
            pub fn identity() -> Self {
                Self::from_matrix([
                    [1.0, 0.0, 0.0, 0.0],
                    [0.0, 1.0, 0.0, 0.0],
                    [0.0, 0.0, 1.0, 0.0],
                    [0.0, 0.0, 0.0, 1.0],
                ])
            }

            /// Pure translation, identity rotation.
            pub fn from_translation(xyz: [$t; 3]) -> Self {
                let mut transform = Self::identity();
                transform.mat[0][3] = xyz[0];
                transform.mat[1][3] = xyz[1];
                transform.mat[2][3] = xyz[2];
                transform
            }

            /// Rotation of `angle` radians about `axis` (Rodrigues).
            ///
            /// The axis does not need to be normalized. Returns `None` when its
            /// norm is zero or not finite, as no rotation is defined then.
            pub fn from_axis_angle(axis: [$t; 3], angle: $t) -> Option<Self> {
                let norm = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
                if !norm.is_finite() || norm <= <$t>::EPSILON {
                    return None;
                }
                let (x, y, z) = (axis[0] / norm, axis[1] / norm, axis[2] / norm);
                let (s, c) = angle.sin_cos();
                let v = 1.0 - c;

                Some(Self::from_matrix([
                    [c + x * x * v, x * y * v - z * s, x * z * v + y * s, 0.0],
                    [y * x * v + z * s, c + y * y * v, y * z * v - x * s, 0.0],
                    [z * x * v - y * s, z * y * v + x * s, c + z * z * v, 0.0],
                    [0.0, 0.0, 0.0, 1.0],
                ]))
            }

            /// Rotation-only transform from a quaternion, normalized first.
            pub fn from_quaternion(q: &Quaternion<$t>) -> Self {
                let q = q.normalize();
                let (x, y, z, w) = (q.x, q.y, q.z, q.w);
                Self::from_matrix([
                    [
                        1.0 - 2.0 * (y * y + z * z),
                        2.0 * (x * y - z * w),
                        2.0 * (x * z + y * w),
                        0.0,
                    ],
                    [
                        2.0 * (x * y + z * w),
                        1.0 - 2.0 * (x * x + z * z),
                        2.0 * (y * z - x * w),
                        0.0,
                    ],
                    [
                        2.0 * (x * z - y * w),
                        2.0 * (y * z + x * w),
                        1.0 - 2.0 * (x * x + y * y),
                        0.0,
                    ],
                    [0.0, 0.0, 0.0, 1.0],
                ])
            }

            pub fn translation_vector(&self) -> [$t; 3] {
                [self.mat[0][3], self.mat[1][3], self.mat[2][3]]
            }

            /// Translation as typed lengths, in meters.
            pub fn translation(&self) -> [$length; 3] {
                use uom::si::length::meter;
                let [x, y, z] = self.translation_vector();
                [
                    <$length>::new::<meter>(x),
                    <$length>::new::<meter>(y),
                    <$length>::new::<meter>(z),
                ]
            }

            pub fn rotation_matrix(&self) -> [[$t; 3]; 3] {
                let m = &self.mat;
                [
                    [m[0][0], m[0][1], m[0][2]],
                    [m[1][0], m[1][1], m[1][2]],
                    [m[2][0], m[2][1], m[2][2]],
                ]
            }

            /// Decompose the rotation block into a unit quaternion.
            ///
            /// Branches on the largest of the trace and the diagonal terms so
            /// the square root argument never gets close to zero. The result is
            /// renormalized and its scalar part is kept non-negative. A
            /// non-finite rotation block gives an all-NaN quaternion.
            pub fn to_quaternion(&self) -> Quaternion<$t> {
                let m = self.rotation_matrix();
                let trace = m[0][0] + m[1][1] + m[2][2];

                let q = if trace > 0.0 {
                    let s = (trace + 1.0).sqrt() * 2.0;
                    Quaternion {
                        x: (m[2][1] - m[1][2]) / s,
                        y: (m[0][2] - m[2][0]) / s,
                        z: (m[1][0] - m[0][1]) / s,
                        w: 0.25 * s,
                    }
                } else if m[0][0] > m[1][1] && m[0][0] > m[2][2] {
                    let s = (1.0 + m[0][0] - m[1][1] - m[2][2]).sqrt() * 2.0;
                    Quaternion {
                        x: 0.25 * s,
                        y: (m[0][1] + m[1][0]) / s,
                        z: (m[0][2] + m[2][0]) / s,
                        w: (m[2][1] - m[1][2]) / s,
                    }
                } else if m[1][1] > m[2][2] {
                    let s = (1.0 + m[1][1] - m[0][0] - m[2][2]).sqrt() * 2.0;
                    Quaternion {
                        x: (m[0][1] + m[1][0]) / s,
                        y: 0.25 * s,
                        z: (m[1][2] + m[2][1]) / s,
                        w: (m[0][2] - m[2][0]) / s,
                    }
                } else {
                    let s = (1.0 + m[2][2] - m[0][0] - m[1][1]).sqrt() * 2.0;
                    Quaternion {
                        x: (m[0][2] + m[2][0]) / s,
                        y: (m[1][2] + m[2][1]) / s,
                        z: 0.25 * s,
                        w: (m[1][0] - m[0][1]) / s,
                    }
                };

                let q = q.normalize();
                if q.w < 0.0 {
                    Quaternion {
                        x: -q.x,
                        y: -q.y,
                        z: -q.z,
                        w: -q.w,
                    }
                } else {
                    q
                }
            }

            /// Computes the inverse of a rigid transform (R^T, -R^T t).
            pub fn inverse(&self) -> Self {
                let r = self.rotation_matrix();
                let t = self.translation_vector();
                let mut inv = Self::identity();
                for i in 0..3 {
                    for j in 0..3 {
                        inv.mat[i][j] = r[j][i];
                    }
                    inv.mat[i][3] = -(r[0][i] * t[0] + r[1][i] * t[1] + r[2][i] * t[2]);
                }
                inv
            }

            /// True when the rotation block is orthonormal with determinant +1
            /// and the bottom row is `[0, 0, 0, 1]`, within `epsilon`.
            pub fn is_rigid(&self, epsilon: $t) -> bool {
                let r = self.rotation_matrix();
                for i in 0..3 {
                    for j in 0..3 {
                        let dot = r[0][i] * r[0][j] + r[1][i] * r[1][j] + r[2][i] * r[2][j];
                        let expected = if i == j { 1.0 } else { 0.0 };
                        if (dot - expected).abs() > epsilon {
                            return false;
                        }
                    }
                }
                let det = r[0][0] * (r[1][1] * r[2][2] - r[1][2] * r[2][1])
                    - r[0][1] * (r[1][0] * r[2][2] - r[1][2] * r[2][0])
                    + r[0][2] * (r[1][0] * r[2][1] - r[1][1] * r[2][0]);
                let bottom = self.mat[3];
                (det - 1.0).abs() <= epsilon
                    && bottom[0].abs() <= epsilon
                    && bottom[1].abs() <= epsilon
                    && bottom[2].abs() <= epsilon
                    && (bottom[3] - 1.0).abs() <= epsilon
            }

            pub fn is_finite(&self) -> bool {
                self.mat.iter().flatten().all(|v| v.is_finite())
            }

            /// Element-wise comparison within `epsilon`.
            pub fn approx_eq(&self, other: &Self, epsilon: $t) -> bool {
                self.mat
                    .iter()
                    .flatten()
                    .zip(other.mat.iter().flatten())
                    .all(|(a, b)| (a - b).abs() <= epsilon)
            }
        }

        impl Mul for Transform3D<$t> {
            type Output = Self;

            fn mul(self, rhs: Self) -> Self::Output {
                let mut result = [[0.0 as $t; 4]; 4];
                for (i, row) in result.iter_mut().enumerate() {
                    for (j, cell) in row.iter_mut().enumerate() {
                        let mut sum = 0.0;
                        for k in 0..4 {
                            sum += self.mat[i][k] * rhs.mat[k][j];
                        }
                        *cell = sum;
                    }
                }
                Self { mat: result }
            }
        }

        impl Mul for &Transform3D<$t> {
            type Output = Transform3D<$t>;

            fn mul(self, rhs: Self) -> Self::Output {
                *self * *rhs
            }
        }

        impl Mul<&Transform3D<$t>> for Transform3D<$t> {
            type Output = Transform3D<$t>;

            fn mul(self, rhs: &Transform3D<$t>) -> Self::Output {
                self * *rhs
            }
        }

        impl Default for Quaternion<$t> {
            fn default() -> Self {
                Self::identity()
            }
        }

        impl Quaternion<$t> {
            pub fn identity() -> Self {
                Self {
                    x: 0.0,
                    y: 0.0,
                    z: 0.0,
                    w: 1.0,
                }
            }

            pub fn norm(&self) -> $t {
                (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
            }

            pub fn is_finite(&self) -> bool {
                self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
            }

            /// Scale to unit norm. A zero quaternion maps to identity, a
            /// non-finite one to all NaN.
            pub fn normalize(&self) -> Self {
                let n = self.norm();
                if !n.is_finite() {
                    return Self {
                        x: <$t>::NAN,
                        y: <$t>::NAN,
                        z: <$t>::NAN,
                        w: <$t>::NAN,
                    };
                }
                if n <= <$t>::EPSILON {
                    return Self::identity();
                }
                Self {
                    x: self.x / n,
                    y: self.y / n,
                    z: self.z / n,
                    w: self.w / n,
                }
            }

            /// Angle between two orientations in radians, ignoring the sign ambiguity.
            pub fn angle_to(&self, other: &Self) -> $t {
                let a = self.normalize();
                let b = other.normalize();
                let dot = (a.x * b.x + a.y * b.y + a.z * b.z + a.w * b.w).abs();
                2.0 * dot.min(1.0).acos()
            }
        }
    };
}

impl_float_transform!(f32, uom::si::f32::Length);
impl_float_transform!(f64, uom::si::f64::Length);
