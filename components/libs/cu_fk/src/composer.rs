//! Transform composition along a [`KinematicChain`].
//!
//! Starting from identity, every entry contributes `D · R` where `D` is the
//! pure translation of the joint origin and `R` the joint motion (rotation
//! about the normalized axis for revolute joints, identity for fixed ones).
//! The running product is the world pose of the entry's child link.
//!
//! Only the translation of a joint origin is applied. A static roll/pitch/yaw
//! offset declared on the origin is ignored for both joint types.

use crate::chain::{ChainEntry, KinematicChain};
use crate::description::JointType;
use crate::error::FkError;
use crate::joint_state::{JointConfiguration, JointValueResolver};
use cu_spatial_payloads::Transform3D;

/// World pose of one link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkPose {
    pub link: String,
    pub transform: Transform3D<f64>,
}

/// World poses of the chain links, in chain order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainPose {
    poses: Vec<LinkPose>,
}

impl ChainPose {
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkPose> {
        self.poses.iter()
    }

    pub fn poses(&self) -> &[LinkPose] {
        &self.poses
    }

    /// Pose of `link`, if it is part of the chain.
    pub fn get(&self, link: &str) -> Option<&Transform3D<f64>> {
        self.poses
            .iter()
            .find(|pose| pose.link == link)
            .map(|pose| &pose.transform)
    }

    pub fn last(&self) -> Option<&LinkPose> {
        self.poses.last()
    }

    /// Pose of `to` expressed in the frame of `from`, `from⁻¹ · to`.
    pub fn relative(&self, from: &str, to: &str) -> Option<Transform3D<f64>> {
        let from = self.get(from)?;
        let to = self.get(to)?;
        Some(from.inverse() * to)
    }
}

impl<'a> IntoIterator for &'a ChainPose {
    type Item = &'a LinkPose;
    type IntoIter = std::slice::Iter<'a, LinkPose>;

    fn into_iter(self) -> Self::IntoIter {
        self.poses.iter()
    }
}

/// Output of one composition: the poses and what went wrong on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition {
    pub pose: ChainPose,
    pub diagnostics: Vec<FkError>,
}

impl Composition {
    /// The diagnostic that stopped the composition early, if any.
    pub fn truncation(&self) -> Option<&FkError> {
        self.diagnostics.iter().find(|d| d.is_truncating())
    }
}

/// Folds a chain and a joint configuration into world poses.
///
/// Stateless: the same chain and configuration always give the same output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformComposer {
    resolver: JointValueResolver,
}

impl TransformComposer {
    pub fn new(resolver: JointValueResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &JointValueResolver {
        &self.resolver
    }

    /// Local transform `D · R` of one chain entry.
    ///
    /// Every joint value is resolved, so a joint missing from `config` always
    /// pushes a diagnostic into `diagnostics`. Fixed joints then ignore the
    /// value. A revolute joint with a non-finite value or a degenerate axis
    /// is an error.
    pub fn local_transform(
        &self,
        entry: &ChainEntry,
        config: &JointConfiguration,
        diagnostics: &mut Vec<FkError>,
    ) -> Result<Transform3D<f64>, FkError> {
        let joint = &entry.joint;
        let resolution = self.resolver.resolve(config, &joint.name);
        diagnostics.extend(resolution.diagnostic);

        let offset = Transform3D::<f64>::from_translation(joint.origin_xyz);
        let motion = match joint.joint_type {
            JointType::Fixed => Transform3D::<f64>::identity(),
            JointType::Revolute => {
                if !resolution.value.is_finite() {
                    return Err(FkError::InvalidJointValue {
                        joint: joint.name.clone(),
                        value: resolution.value,
                    });
                }
                Transform3D::<f64>::from_axis_angle(joint.axis, resolution.value).ok_or_else(
                    || FkError::InvalidAxis {
                        joint: joint.name.clone(),
                        axis: joint.axis,
                    },
                )?
            }
        };
        Ok(offset * motion)
    }

    pub fn compose(&self, chain: &KinematicChain, config: &JointConfiguration) -> Composition {
        let mut world = Transform3D::<f64>::identity();
        let mut poses = Vec::with_capacity(chain.len());
        let mut diagnostics = Vec::new();

        for entry in chain.iter() {
            match self.local_transform(entry, config, &mut diagnostics) {
                Ok(local) => world = world * local,
                Err(e) => {
                    diagnostics.push(e);
                    break;
                }
            }
            poses.push(LinkPose {
                link: entry.child_link.clone(),
                transform: world,
            });
        }

        Composition {
            pose: ChainPose { poses },
            diagnostics,
        }
    }
}

/// Compose with the default resolver (missing values resolve to 0.0).
pub fn compose(chain: &KinematicChain, config: &JointConfiguration) -> Composition {
    TransformComposer::default().compose(chain, config)
}
