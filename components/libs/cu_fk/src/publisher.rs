//! Pose records and the publisher seam.
//!
//! A run hands one [`PoseBatch`] to an injected [`PosePublisher`]. Each record
//! carries the world frame as parent, the link as child, a stamp, the
//! translation and a unit quaternion decomposed from the rotation block.

use crate::composer::ChainPose;
use crate::error::{FkError, FkResult};
use bincode::{Decode, Encode};
use cu_spatial_payloads::{Quaternion, Transform3D};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::io::Write;

/// Frame every published pose is expressed in, unless configured otherwise.
pub const DEFAULT_WORLD_FRAME: &str = "world_link";

/// Timestamp of a pose batch, in nanoseconds from an arbitrary reference.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
pub struct Stamp(pub u64);

impl Stamp {
    pub fn as_nanos(&self) -> u64 {
        self.0
    }
}

impl From<std::time::Duration> for Stamp {
    /// Saturates at `u64::MAX` nanoseconds (about 584 years).
    fn from(duration: std::time::Duration) -> Self {
        Stamp(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
    }
}

impl Display for Stamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let nanos = self.0;
        if nanos >= 1_000_000_000 {
            write!(f, "{:.3} s", nanos as f64 / 1_000_000_000.0)
        } else if nanos >= 1_000_000 {
            write!(f, "{:.3} ms", nanos as f64 / 1_000_000.0)
        } else {
            write!(f, "{nanos} ns")
        }
    }
}

/// Serializable pose of one link relative to the world frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct PoseRecord {
    pub parent_frame: String,
    pub child_frame: String,
    pub stamp: Stamp,
    pub translation: [f64; 3],
    pub rotation: Quaternion<f64>,
}

impl PoseRecord {
    pub fn from_transform(
        transform: &Transform3D<f64>,
        child_frame: impl Into<String>,
        parent_frame: impl Into<String>,
        stamp: Stamp,
    ) -> Self {
        Self {
            parent_frame: parent_frame.into(),
            child_frame: child_frame.into(),
            stamp,
            translation: transform.translation_vector(),
            rotation: transform.to_quaternion(),
        }
    }

    /// Rebuild the homogeneous transform this record was made from.
    pub fn to_transform(&self) -> Transform3D<f64> {
        let mut transform = Transform3D::<f64>::from_quaternion(&self.rotation);
        transform.mat[0][3] = self.translation[0];
        transform.mat[1][3] = self.translation[1];
        transform.mat[2][3] = self.translation[2];
        transform
    }
}

/// All records of one run, in chain order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct PoseBatch {
    pub records: Vec<PoseRecord>,
}

impl PoseBatch {
    pub fn from_chain_pose(pose: &ChainPose, world_frame: &str, stamp: Stamp) -> Self {
        Self {
            records: pose
                .iter()
                .map(|p| {
                    PoseRecord::from_transform(&p.transform, p.link.as_str(), world_frame, stamp)
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, child_frame: &str) -> Option<&PoseRecord> {
        self.records.iter().find(|r| r.child_frame == child_frame)
    }
}

/// Destination of pose batches (transport, log, file...).
pub trait PosePublisher {
    fn publish(&mut self, batch: &PoseBatch) -> FkResult<()>;
}

impl<P: PosePublisher + ?Sized> PosePublisher for &mut P {
    fn publish(&mut self, batch: &PoseBatch) -> FkResult<()> {
        (**self).publish(batch)
    }
}

impl<P: PosePublisher + ?Sized> PosePublisher for Box<P> {
    fn publish(&mut self, batch: &PoseBatch) -> FkResult<()> {
        (**self).publish(batch)
    }
}

/// Keeps every published batch in memory.
#[derive(Debug, Default)]
pub struct CollectingPublisher {
    batches: Vec<PoseBatch>,
}

impl CollectingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> &[PoseBatch] {
        &self.batches
    }

    pub fn latest(&self) -> Option<&PoseBatch> {
        self.batches.last()
    }

    pub fn take(&mut self) -> Vec<PoseBatch> {
        std::mem::take(&mut self.batches)
    }
}

impl PosePublisher for CollectingPublisher {
    fn publish(&mut self, batch: &PoseBatch) -> FkResult<()> {
        self.batches.push(batch.clone());
        Ok(())
    }
}

/// Writes each batch as a little-endian u32 length followed by its bincode
/// encoding.
pub struct BincodePublisher<W: Write> {
    writer: W,
    frames_written: usize,
}

impl<W: Write> BincodePublisher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames_written: 0,
        }
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> PosePublisher for BincodePublisher<W> {
    fn publish(&mut self, batch: &PoseBatch) -> FkResult<()> {
        let bytes = bincode::encode_to_vec(batch, bincode::config::standard())
            .map_err(|e| FkError::Publish(e.to_string()))?;
        let len = u32::try_from(bytes.len())
            .map_err(|_| FkError::Publish(format!("batch too large: {} bytes", bytes.len())))?;
        self.writer.write_all(&len.to_le_bytes())?;
        self.writer.write_all(&bytes)?;
        self.writer.flush()?;
        self.frames_written += 1;
        Ok(())
    }
}

/// Decode a stream produced by [`BincodePublisher`].
pub fn decode_bincode_frames(mut bytes: &[u8]) -> FkResult<Vec<PoseBatch>> {
    let mut batches = Vec::new();
    while !bytes.is_empty() {
        if bytes.len() < 4 {
            return Err(FkError::Publish("truncated frame header".to_string()));
        }
        let (header, rest) = bytes.split_at(4);
        let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        if rest.len() < len {
            return Err(FkError::Publish(format!(
                "truncated frame: expected {len} bytes, got {}",
                rest.len()
            )));
        }
        let (frame, rest) = rest.split_at(len);
        let (batch, _): (PoseBatch, usize) =
            bincode::decode_from_slice(frame, bincode::config::standard())
                .map_err(|e| FkError::Publish(e.to_string()))?;
        batches.push(batch);
        bytes = rest;
    }
    Ok(batches)
}

/// Emits every record through the `log` facade at info level.
#[derive(Debug, Default)]
pub struct LogPublisher;

impl PosePublisher for LogPublisher {
    fn publish(&mut self, batch: &PoseBatch) -> FkResult<()> {
        for record in &batch.records {
            let [x, y, z] = record.translation;
            let q = &record.rotation;
            info!(
                "[{}] {} -> {}: t=({x:.4}, {y:.4}, {z:.4}) q=({:.4}, {:.4}, {:.4}, {:.4})",
                record.stamp, record.parent_frame, record.child_frame, q.x, q.y, q.z, q.w
            );
        }
        Ok(())
    }
}
