//! RON configuration of a forward kinematics node and joint-state replay files.

use crate::description::MechanismDescription;
use crate::error::{FkError, FkResult};
use crate::joint_state::{JointConfiguration, DEFAULT_JOINT_VALUE};
use crate::publisher::{Stamp, DEFAULT_WORLD_FRAME};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

fn default_world_frame() -> String {
    DEFAULT_WORLD_FRAME.to_string()
}

fn default_joint_value() -> f64 {
    DEFAULT_JOINT_VALUE
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Node configuration.
///
/// ```ron
/// (
///     description: "arm.ron",
///     world_frame: "world_link",
///     default_joint_value: 0.0,
///     log_level: "debug",
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FkConfig {
    /// Mechanism description file; relative paths are resolved against the
    /// directory of the config file.
    pub description: PathBuf,
    #[serde(default = "default_world_frame")]
    pub world_frame: String,
    #[serde(default = "default_joint_value")]
    pub default_joint_value: f64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl FkConfig {
    pub fn from_ron_str(text: &str) -> FkResult<Self> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_ron_file(path: impl AsRef<Path>) -> FkResult<Self> {
        let path = path.as_ref();
        let mut config = Self::from_ron_str(&std::fs::read_to_string(path)?)?;
        if config.description.is_relative() {
            if let Some(dir) = path.parent() {
                config.description = dir.join(&config.description);
            }
        }
        Ok(config)
    }

    fn validate(&self) -> FkResult<()> {
        if self.world_frame.is_empty() {
            return Err(FkError::Config("world_frame must not be empty".to_string()));
        }
        if !self.default_joint_value.is_finite() {
            return Err(FkError::Config(format!(
                "default_joint_value must be finite, got {}",
                self.default_joint_value
            )));
        }
        self.log_level_filter()?;
        Ok(())
    }

    pub fn log_level_filter(&self) -> FkResult<LevelFilter> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| FkError::Config(format!("unknown log level '{}'", self.log_level)))
    }

    pub fn load_description(&self) -> FkResult<MechanismDescription> {
        MechanismDescription::from_ron_file(&self.description)
    }
}

/// One recorded joint state, with parallel name/position arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointStateSample {
    /// Nanoseconds.
    pub stamp: u64,
    pub name: Vec<String>,
    pub position: Vec<f64>,
}

impl JointStateSample {
    pub fn stamp(&self) -> Stamp {
        Stamp(self.stamp)
    }

    pub fn configuration(&self) -> JointConfiguration {
        JointConfiguration::from_parallel(&self.name, &self.position)
    }
}

pub fn joint_states_from_ron_str(text: &str) -> FkResult<Vec<JointStateSample>> {
    Ok(ron::from_str(text)?)
}

pub fn load_joint_states(path: impl AsRef<Path>) -> FkResult<Vec<JointStateSample>> {
    joint_states_from_ron_str(&std::fs::read_to_string(path.as_ref())?)
}
