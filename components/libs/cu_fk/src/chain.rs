//! Serial chain extraction from a [`MechanismDescription`].
//!
//! The walk starts at the root and follows the unique child edge of each link.
//! It stops at a leaf, or truncates at the first fork, dangling joint
//! reference or revisited link, keeping everything collected before it.

use crate::description::{Joint, MechanismDescription};
use crate::error::FkError;
use std::collections::HashSet;

/// A joint of the chain together with the link it moves.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainEntry {
    pub joint: Joint,
    pub child_link: String,
}

/// Ordered path from the root; each joint's parent is the previous child.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KinematicChain {
    entries: Vec<ChainEntry>,
}

impl KinematicChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, joint: Joint, child_link: impl Into<String>) {
        self.entries.push(ChainEntry {
            joint,
            child_link: child_link.into(),
        });
    }

    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn joint_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.joint.name.as_str()).collect()
    }

    pub fn link_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.child_link.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainEntry> {
        self.entries.iter()
    }
}

impl FromIterator<ChainEntry> for KinematicChain {
    fn from_iter<I: IntoIterator<Item = ChainEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Result of one extraction: the chain and, if it was cut short, why.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainExtraction {
    pub chain: KinematicChain,
    pub truncation: Option<FkError>,
}

impl ChainExtraction {
    pub fn is_complete(&self) -> bool {
        self.truncation.is_none()
    }
}

/// Walk `description` from its root and collect the longest simple chain.
pub fn extract_chain(description: &MechanismDescription) -> ChainExtraction {
    let mut chain = KinematicChain::new();
    let mut visited = HashSet::new();
    let mut link = description.root().to_string();
    visited.insert(link.clone());

    let truncation = loop {
        let edges = description.children(&link);
        let edge = match edges {
            [] => break None,
            [edge] => edge,
            _ => {
                break Some(FkError::ForkedChain {
                    link,
                    branches: edges.len(),
                })
            }
        };

        let Some(joint) = description.joint(&edge.joint) else {
            break Some(FkError::MissingJoint {
                joint: edge.joint.clone(),
                link,
            });
        };

        if !visited.insert(edge.child.clone()) {
            break Some(FkError::CyclicChain(edge.child.clone()));
        }

        chain.push(joint.clone(), edge.child.clone());
        link = edge.child.clone();
    };

    ChainExtraction { chain, truncation }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{ChildEdge, Joint};
    use crate::test_utils::{forked_arm, serial_arm};
    use std::collections::HashMap;

    #[test]
    fn test_root_without_children() {
        let description =
            MechanismDescription::new("lone", "base", Vec::new(), Vec::new()).unwrap();
        let extraction = extract_chain(&description);
        assert!(extraction.is_complete());
        assert!(extraction.chain.is_empty());
    }

    #[test]
    fn test_serial_chain_in_order() {
        let extraction = extract_chain(&serial_arm());
        assert!(extraction.is_complete());
        assert_eq!(
            extraction.chain.joint_names(),
            vec!["base_joint", "shoulder", "elbow", "wrist", "tool_joint"]
        );
        assert_eq!(
            extraction.chain.link_names(),
            vec!["base", "upper_arm", "forearm", "hand", "tool"]
        );
        // consecutive entries are connected
        let entries = extraction.chain.entries();
        for pair in entries.windows(2) {
            assert_eq!(pair[1].joint.parent, pair[0].child_link);
        }
    }

    #[test]
    fn test_fork_truncates() {
        let extraction = extract_chain(&forked_arm());
        assert_eq!(
            extraction.truncation,
            Some(FkError::ForkedChain {
                link: "forearm".to_string(),
                branches: 2,
            })
        );
        assert_eq!(extraction.chain.link_names(), vec!["base", "upper_arm", "forearm"]);
    }

    #[test]
    fn test_fork_at_root() {
        let joints = vec![
            Joint::fixed("left", "root", "l", [0.0, 1.0, 0.0]),
            Joint::fixed("right", "root", "r", [0.0, -1.0, 0.0]),
        ];
        let description = MechanismDescription::new("y", "root", Vec::new(), joints).unwrap();
        let extraction = extract_chain(&description);
        assert!(extraction.chain.is_empty());
        assert!(matches!(
            extraction.truncation,
            Some(FkError::ForkedChain { ref link, branches: 2 }) if link == "root"
        ));
    }

    #[test]
    fn test_missing_joint_truncates() {
        let mut joints = HashMap::new();
        joints.insert(
            "j1".to_string(),
            Joint::fixed("j1", "a", "b", [1.0, 0.0, 0.0]),
        );
        let mut child_map = HashMap::new();
        child_map.insert(
            "a".to_string(),
            vec![ChildEdge {
                joint: "j1".to_string(),
                child: "b".to_string(),
            }],
        );
        child_map.insert(
            "b".to_string(),
            vec![ChildEdge {
                joint: "j2".to_string(),
                child: "c".to_string(),
            }],
        );
        let description = MechanismDescription::from_tables("dangling", "a", child_map, joints);

        let extraction = extract_chain(&description);
        assert_eq!(extraction.chain.link_names(), vec!["b"]);
        assert_eq!(
            extraction.truncation,
            Some(FkError::MissingJoint {
                joint: "j2".to_string(),
                link: "b".to_string(),
            })
        );
    }

    #[test]
    fn test_cycle_terminates() {
        let joints = vec![
            Joint::fixed("ab", "a", "b", [1.0, 0.0, 0.0]),
            Joint::fixed("ba", "b", "a", [-1.0, 0.0, 0.0]),
        ];
        let description = MechanismDescription::new("loop", "a", Vec::new(), joints).unwrap();
        let extraction = extract_chain(&description);
        assert_eq!(extraction.chain.link_names(), vec!["b"]);
        assert_eq!(extraction.truncation, Some(FkError::CyclicChain("a".to_string())));
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let description = forked_arm();
        assert_eq!(extract_chain(&description), extract_chain(&description));
    }
}
