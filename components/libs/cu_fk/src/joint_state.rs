//! Joint configuration (name -> position) and the per-joint value resolution.

use crate::error::FkError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value used for a chain joint that is absent from the configuration.
pub const DEFAULT_JOINT_VALUE: f64 = 0.0;

/// Sparse set of named joint positions (radians for revolute joints).
///
/// May omit chain joints and may contain joints outside the chain. When a
/// name is set twice the last value wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointConfiguration {
    positions: HashMap<String, f64>,
    #[serde(skip)]
    mismatch: usize,
}

impl JointConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair a joint state's parallel `names` / `positions` arrays by index.
    ///
    /// Surplus entries on either side are dropped and counted in
    /// [`JointConfiguration::mismatch`].
    pub fn from_parallel<S: AsRef<str>>(names: &[S], positions: &[f64]) -> Self {
        let mut config: Self = names
            .iter()
            .zip(positions.iter())
            .map(|(name, &position)| (name.as_ref().to_string(), position))
            .collect();
        config.mismatch = names.len().abs_diff(positions.len());
        config
    }

    pub fn set(&mut self, name: impl Into<String>, position: f64) {
        self.positions.insert(name.into(), position);
    }

    pub fn with(mut self, name: impl Into<String>, position: f64) -> Self {
        self.set(name, position);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.positions.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of unpaired entries dropped by [`JointConfiguration::from_parallel`].
    pub fn mismatch(&self) -> usize {
        self.mismatch
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for JointConfiguration {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut config = Self::new();
        config.extend(iter);
        config
    }
}

impl<S: Into<String>> Extend<(S, f64)> for JointConfiguration {
    fn extend<I: IntoIterator<Item = (S, f64)>>(&mut self, iter: I) {
        for (name, position) in iter {
            self.set(name, position);
        }
    }
}

/// The value used for one joint in one run, plus a diagnostic when defaulted.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub value: f64,
    pub diagnostic: Option<FkError>,
}

/// Resolves joint values, falling back to a default on a miss.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointValueResolver {
    default_value: f64,
}

impl Default for JointValueResolver {
    fn default() -> Self {
        Self::new(DEFAULT_JOINT_VALUE)
    }
}

impl JointValueResolver {
    pub fn new(default_value: f64) -> Self {
        Self { default_value }
    }

    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    pub fn resolve(&self, config: &JointConfiguration, joint: &str) -> Resolution {
        match config.get(joint) {
            Some(value) => Resolution {
                value,
                diagnostic: None,
            },
            None => Resolution {
                value: self.default_value,
                diagnostic: Some(FkError::MissingJointValue {
                    joint: joint.to_string(),
                    default: self.default_value,
                }),
            },
        }
    }
}
