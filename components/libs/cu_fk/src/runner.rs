//! One forward kinematics run per joint configuration update.
//!
//! extract chain -> compose -> publish. Diagnostics come back in a
//! [`RunReport`] and are logged here; a run never fails as a whole.

use crate::chain::extract_chain;
use crate::composer::{ChainPose, TransformComposer};
use crate::config::FkConfig;
use crate::description::MechanismDescription;
use crate::error::FkError;
use crate::joint_state::{JointConfiguration, JointValueResolver};
use crate::publisher::{PoseBatch, PosePublisher, Stamp, DEFAULT_WORLD_FRAME};
use log::{debug, error, warn};
use std::sync::{Arc, Mutex};

/// Poses and diagnostics of one computation, before publishing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Computation {
    pub chain_length: usize,
    pub pose: ChainPose,
    pub diagnostics: Vec<FkError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub stamp: Stamp,
    pub chain_length: usize,
    pub published: usize,
    pub diagnostics: Vec<FkError>,
    pub publish_error: Option<FkError>,
}

impl RunReport {
    /// No diagnostic and the batch went out.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && self.publish_error.is_none()
    }

    pub fn truncation(&self) -> Option<&FkError> {
        self.diagnostics.iter().find(|d| d.is_truncating())
    }
}

pub struct ForwardKinematics<P: PosePublisher> {
    description: Arc<MechanismDescription>,
    composer: TransformComposer,
    world_frame: String,
    publisher: P,
}

impl<P: PosePublisher> ForwardKinematics<P> {
    pub fn new(description: Arc<MechanismDescription>, publisher: P) -> Self {
        Self {
            description,
            composer: TransformComposer::default(),
            world_frame: DEFAULT_WORLD_FRAME.to_string(),
            publisher,
        }
    }

    pub fn from_config(
        config: &FkConfig,
        description: Arc<MechanismDescription>,
        publisher: P,
    ) -> Self {
        Self::new(description, publisher)
            .with_world_frame(config.world_frame.clone())
            .with_resolver(JointValueResolver::new(config.default_joint_value))
    }

    pub fn with_world_frame(mut self, world_frame: impl Into<String>) -> Self {
        self.world_frame = world_frame.into();
        self
    }

    pub fn with_resolver(mut self, resolver: JointValueResolver) -> Self {
        self.composer = TransformComposer::new(resolver);
        self
    }

    pub fn world_frame(&self) -> &str {
        &self.world_frame
    }

    pub fn description(&self) -> &MechanismDescription {
        &self.description
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }

    pub fn into_publisher(self) -> P {
        self.publisher
    }

    /// Extract the chain and compose it; no logging, no publishing.
    pub fn compute(&self, config: &JointConfiguration) -> Computation {
        let extraction = extract_chain(&self.description);
        let composition = self.composer.compose(&extraction.chain, config);

        let mut diagnostics = Vec::with_capacity(composition.diagnostics.len() + 1);
        diagnostics.extend(extraction.truncation);
        diagnostics.extend(composition.diagnostics);
        Computation {
            chain_length: extraction.chain.len(),
            pose: composition.pose,
            diagnostics,
        }
    }

    /// Run the whole pipeline for one update and publish the resulting batch.
    pub fn process(&mut self, config: &JointConfiguration, stamp: Stamp) -> RunReport {
        if config.mismatch() > 0 {
            warn!(
                "Joint state at {stamp} has {} unpaired name/position entries",
                config.mismatch()
            );
        }

        let computation = self.compute(config);
        for diagnostic in &computation.diagnostics {
            if diagnostic.is_truncating() {
                warn!("{diagnostic}");
            } else {
                debug!("{diagnostic}");
            }
        }

        let batch = PoseBatch::from_chain_pose(&computation.pose, &self.world_frame, stamp);
        let publish_error = match self.publisher.publish(&batch) {
            Ok(()) => None,
            Err(e) => {
                error!("Failed to publish {} poses at {stamp}: {e}", batch.len());
                Some(e)
            }
        };
        let published = if publish_error.is_none() { batch.len() } else { 0 };
        debug!(
            "Run at {stamp}: {published}/{} poses published",
            computation.chain_length
        );

        RunReport {
            stamp,
            chain_length: computation.chain_length,
            published,
            diagnostics: computation.diagnostics,
            publish_error,
        }
    }

    /// Process the update pending in `slot`, if any.
    pub fn drain(&mut self, slot: &LatestJointState) -> Option<RunReport> {
        let pending = slot.take()?;
        Some(self.process(&pending.configuration, pending.stamp))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpdate {
    pub configuration: JointConfiguration,
    pub stamp: Stamp,
}

#[derive(Debug, Default)]
struct Slot {
    pending: Option<PendingUpdate>,
    dropped: u64,
}

/// Depth-1 drop-oldest buffer between the joint state source and the runner.
///
/// A new update replaces the pending one, so a slow consumer always
/// processes the most recent configuration.
#[derive(Debug, Default)]
pub struct LatestJointState {
    slot: Mutex<Slot>,
}

impl LatestJointState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store an update. Returns true when it displaced a stale one.
    pub fn offer(&self, configuration: JointConfiguration, stamp: Stamp) -> bool {
        let mut slot = self.lock();
        let displaced = slot
            .pending
            .replace(PendingUpdate {
                configuration,
                stamp,
            })
            .is_some();
        if displaced {
            slot.dropped += 1;
        }
        displaced
    }

    pub fn take(&self) -> Option<PendingUpdate> {
        self.lock().pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Updates discarded since creation.
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::Joint;
    use crate::error::FkResult;
    use crate::publisher::CollectingPublisher;
    use crate::test_utils::{forked_arm, serial_arm};

    struct FailingPublisher;

    impl PosePublisher for FailingPublisher {
        fn publish(&mut self, _batch: &PoseBatch) -> FkResult<()> {
            Err(FkError::Publish("transport down".to_string()))
        }
    }

    fn full_config() -> JointConfiguration {
        JointConfiguration::new()
            .with("base_joint", 0.0)
            .with("tool_joint", 0.0)
            .with("shoulder", 0.1)
            .with("elbow", 0.2)
            .with("wrist", 0.3)
    }

    #[test]
    fn test_clean_run_publishes_every_link() {
        let mut fk = ForwardKinematics::new(Arc::new(serial_arm()), CollectingPublisher::new());
        let report = fk.process(&full_config(), Stamp(100));
        assert!(report.is_clean());
        assert_eq!(report.chain_length, 5);
        assert_eq!(report.published, 5);

        let batch = fk.publisher().latest().unwrap();
        assert_eq!(batch.len(), 5);
        assert!(batch.records.iter().all(|r| r.parent_frame == "world_link"));
        assert!(batch.records.iter().all(|r| r.stamp == Stamp(100)));
    }

    #[test]
    fn test_fork_publishes_prefix() {
        let mut fk = ForwardKinematics::new(Arc::new(forked_arm()), CollectingPublisher::new());
        let report = fk.process(&full_config(), Stamp(1));
        assert_eq!(report.published, 3);
        assert!(matches!(
            report.truncation(),
            Some(FkError::ForkedChain { link, branches: 2 }) if link == "forearm"
        ));
        // wrist value is not used: the chain stops before it
        assert_eq!(report.diagnostics.len(), 1);
    }

    #[test]
    fn test_missing_values_reported_but_published() {
        let mut fk = ForwardKinematics::new(Arc::new(serial_arm()), CollectingPublisher::new());
        let report = fk.process(&JointConfiguration::new(), Stamp(5));
        assert_eq!(report.published, 5);
        // fixed joints are resolved too
        assert_eq!(report.diagnostics.len(), 5);
        assert!(report
            .diagnostics
            .iter()
            .all(|d| matches!(d, FkError::MissingJointValue { .. })));
        assert!(report.truncation().is_none());
        assert!(!report.is_clean());
    }

    #[test]
    fn test_empty_description_publishes_empty_batch() {
        let description =
            MechanismDescription::new("lone", "world_link", Vec::new(), Vec::new()).unwrap();
        let mut fk = ForwardKinematics::new(Arc::new(description), CollectingPublisher::new());
        let report = fk.process(&full_config(), Stamp(0));
        assert!(report.is_clean());
        assert_eq!(report.published, 0);
        assert!(fk.publisher().latest().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_axis_in_pipeline() {
        let joints = vec![
            Joint::fixed("j0", "world_link", "a", [0.0, 0.0, 1.0]),
            Joint::revolute("j1", "a", "b", [0.0; 3], [0.0; 3]),
            Joint::fixed("j2", "b", "c", [0.0, 0.0, 1.0]),
        ];
        let description =
            MechanismDescription::new("bad", "world_link", Vec::new(), joints).unwrap();
        let mut fk = ForwardKinematics::new(Arc::new(description), CollectingPublisher::new());
        let report = fk.process(&JointConfiguration::new().with("j1", 1.0), Stamp(9));
        assert_eq!(report.chain_length, 3);
        assert_eq!(report.published, 1);
        assert!(matches!(report.truncation(), Some(FkError::InvalidAxis { .. })));
    }

    #[test]
    fn test_non_finite_value_in_pipeline() {
        let mut fk = ForwardKinematics::new(Arc::new(serial_arm()), CollectingPublisher::new());
        let config = full_config().with("elbow", f64::NAN);
        let report = fk.process(&config, Stamp(4));
        // base, upper_arm: elbow is the third joint
        assert_eq!(report.published, 2);
        assert!(matches!(
            report.truncation(),
            Some(FkError::InvalidJointValue { joint, .. }) if joint == "elbow"
        ));
        let batch = fk.publisher().latest().unwrap();
        assert!(batch.records.iter().all(|r| r.rotation.is_finite()));
        assert!(batch
            .records
            .iter()
            .all(|r| r.translation.iter().all(|v| v.is_finite())));
    }

    #[test]
    fn test_publish_failure_is_reported() {
        let mut fk = ForwardKinematics::new(Arc::new(serial_arm()), FailingPublisher);
        let report = fk.process(&full_config(), Stamp(3));
        assert_eq!(report.published, 0);
        assert_eq!(
            report.publish_error,
            Some(FkError::Publish("transport down".to_string()))
        );
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_from_config_applies_settings() {
        let config = FkConfig::from_ron_str(
            r#"(description: "unused.ron", world_frame: "map", default_joint_value: 0.25)"#,
        )
        .unwrap();
        let mut fk = ForwardKinematics::from_config(
            &config,
            Arc::new(serial_arm()),
            CollectingPublisher::new(),
        );
        assert_eq!(fk.world_frame(), "map");
        fk.process(&JointConfiguration::new(), Stamp(1));
        let defaulted = fk.into_publisher().take();

        let mut reference =
            ForwardKinematics::new(Arc::new(serial_arm()), CollectingPublisher::new())
                .with_world_frame("map");
        let explicit = JointConfiguration::new()
            .with("shoulder", 0.25)
            .with("elbow", 0.25)
            .with("wrist", 0.25);
        reference.process(&explicit, Stamp(1));
        assert_eq!(defaulted, reference.into_publisher().take());
    }

    #[test]
    fn test_compute_is_pure() {
        let fk = ForwardKinematics::new(Arc::new(serial_arm()), CollectingPublisher::new());
        let config = full_config();
        assert_eq!(fk.compute(&config), fk.compute(&config));
        assert!(fk.publisher().batches().is_empty());
        assert_eq!(fk.description().name(), "serial_arm");
    }

    #[test]
    fn test_latest_slot_drops_oldest() {
        let slot = LatestJointState::new();
        assert!(slot.take().is_none());
        assert!(!slot.offer(JointConfiguration::new().with("shoulder", 1.0), Stamp(1)));
        assert!(slot.offer(JointConfiguration::new().with("shoulder", 2.0), Stamp(2)));
        assert!(slot.offer(JointConfiguration::new().with("shoulder", 3.0), Stamp(3)));
        assert_eq!(slot.dropped(), 2);
        assert!(slot.is_pending());

        let mut fk = ForwardKinematics::new(Arc::new(serial_arm()), CollectingPublisher::new());
        let report = fk.drain(&slot).unwrap();
        assert_eq!(report.stamp, Stamp(3));
        assert!(fk.drain(&slot).is_none());
        assert_eq!(fk.publisher().batches().len(), 1);
    }
}
