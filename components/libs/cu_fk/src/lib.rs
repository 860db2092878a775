//! Forward kinematics over a serial mechanism description.
//!
//! A [`MechanismDescription`] is walked from its root into a
//! [`KinematicChain`], the chain is composed against a sparse
//! [`JointConfiguration`] and every link pose is handed to a
//! [`PosePublisher`] relative to the world frame.

pub mod chain;
pub mod composer;
pub mod config;
pub mod description;
pub mod error;
pub mod joint_state;
pub mod publisher;
pub mod runner;

#[cfg(test)]
mod test_utils;

pub use chain::{extract_chain, ChainEntry, ChainExtraction, KinematicChain};
pub use composer::{compose, ChainPose, Composition, LinkPose, TransformComposer};
pub use config::{joint_states_from_ron_str, load_joint_states, FkConfig, JointStateSample};
pub use description::{ChildEdge, Joint, JointType, MechanismDescription};
pub use error::{FkError, FkResult};
pub use joint_state::{JointConfiguration, JointValueResolver, Resolution, DEFAULT_JOINT_VALUE};
pub use publisher::{
    decode_bincode_frames, BincodePublisher, CollectingPublisher, LogPublisher, PoseBatch,
    PosePublisher, PoseRecord, Stamp, DEFAULT_WORLD_FRAME,
};
pub use runner::{Computation, ForwardKinematics, LatestJointState, PendingUpdate, RunReport};

pub use cu_spatial_payloads::{Quaternion, Transform3D};
