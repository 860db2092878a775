use thiserror::Error;

/// Errors and diagnostics of the forward kinematics pipeline.
///
/// Loading failures are returned as `Err`. The kinematic variants are also
/// carried as values next to partial results: a run never fails because of
/// them, it only produces fewer poses.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FkError {
    #[error("Forked kinematic chain at link '{link}' ({branches} outgoing joints)")]
    ForkedChain { link: String, branches: usize },

    #[error("Joint '{joint}' below link '{link}' not found in the joint table")]
    MissingJoint { joint: String, link: String },

    #[error("No value for joint '{joint}' in the joint configuration, using {default}")]
    MissingJointValue { joint: String, default: f64 },

    #[error("Joint '{joint}' has a degenerate rotation axis {axis:?}")]
    InvalidAxis { joint: String, axis: [f64; 3] },

    #[error("Joint '{joint}' has a non-finite value {value}")]
    InvalidJointValue { joint: String, value: f64 },

    #[error("Link '{0}' is visited twice, the description contains a cycle")]
    CyclicChain(String),

    #[error("Invalid mechanism description: {0}")]
    InvalidDescription(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Publish error: {0}")]
    Publish(String),
}

impl FkError {
    /// True for the diagnostics that cut the chain or the pose short.
    pub fn is_truncating(&self) -> bool {
        matches!(
            self,
            FkError::ForkedChain { .. }
                | FkError::MissingJoint { .. }
                | FkError::InvalidAxis { .. }
                | FkError::InvalidJointValue { .. }
                | FkError::CyclicChain(_)
        )
    }
}

impl From<std::io::Error> for FkError {
    fn from(e: std::io::Error) -> Self {
        FkError::Io(e.to_string())
    }
}

impl From<ron::error::SpannedError> for FkError {
    fn from(e: ron::error::SpannedError) -> Self {
        FkError::Config(e.to_string())
    }
}

pub type FkResult<T> = Result<T, FkError>;
