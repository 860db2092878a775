//! Static mechanism description: links, joints and the link to child-joint table.
//!
//! A description is loaded once and shared read-only (usually behind an `Arc`)
//! by every forward kinematics run.

use crate::error::{FkError, FkResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JointType {
    Fixed,
    Revolute,
}

fn default_axis() -> [f64; 3] {
    [1.0, 0.0, 0.0]
}

/// A joint relates exactly one parent link to one child link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub name: String,
    pub joint_type: JointType,
    pub parent: String,
    pub child: String,
    /// Offset of the joint frame in the parent link frame.
    #[serde(default)]
    pub origin_xyz: [f64; 3],
    /// Static roll/pitch/yaw offset of the origin. Kept from the description
    /// but never applied by the composer, only the translation is.
    #[serde(default)]
    pub origin_rpy: [f64; 3],
    /// Rotation axis in the joint frame, only used by revolute joints.
    #[serde(default = "default_axis")]
    pub axis: [f64; 3],
}

impl Joint {
    pub fn fixed(name: &str, parent: &str, child: &str, origin_xyz: [f64; 3]) -> Self {
        Self {
            name: name.to_string(),
            joint_type: JointType::Fixed,
            parent: parent.to_string(),
            child: child.to_string(),
            origin_xyz,
            origin_rpy: [0.0; 3],
            axis: default_axis(),
        }
    }

    pub fn revolute(
        name: &str,
        parent: &str,
        child: &str,
        origin_xyz: [f64; 3],
        axis: [f64; 3],
    ) -> Self {
        Self {
            joint_type: JointType::Revolute,
            axis,
            ..Self::fixed(name, parent, child, origin_xyz)
        }
    }

    pub fn with_origin_rpy(mut self, rpy: [f64; 3]) -> Self {
        self.origin_rpy = rpy;
        self
    }
}

/// One outgoing edge of a link: the joint name and the link it leads to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildEdge {
    pub joint: String,
    pub child: String,
}

/// On-disk shape of a description.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DescriptionFile {
    name: String,
    root: String,
    #[serde(default)]
    links: Vec<String>,
    joints: Vec<Joint>,
}

#[derive(Debug, Clone)]
pub struct MechanismDescription {
    name: String,
    root: String,
    links: Vec<String>,
    joints: HashMap<String, Joint>,
    child_map: HashMap<String, Vec<ChildEdge>>,
}

impl MechanismDescription {
    /// Build a description from its declared joints.
    ///
    /// When `links` is empty the link set is derived from the joints. Otherwise
    /// every joint must reference declared links. Joint names must be unique
    /// and the root must be one of the links.
    pub fn new(
        name: impl Into<String>,
        root: impl Into<String>,
        links: Vec<String>,
        joints: Vec<Joint>,
    ) -> FkResult<Self> {
        let root = root.into();
        let explicit_links = !links.is_empty();
        let mut links = links;
        let mut known: HashSet<String> = links.iter().cloned().collect();
        if known.len() != links.len() {
            return Err(FkError::InvalidDescription(
                "duplicate link names".to_string(),
            ));
        }

        let mut joint_table = HashMap::with_capacity(joints.len());
        let mut child_map: HashMap<String, Vec<ChildEdge>> = HashMap::new();
        for joint in joints {
            for link in [&joint.parent, &joint.child] {
                if !known.contains(link) {
                    if explicit_links {
                        return Err(FkError::InvalidDescription(format!(
                            "joint '{}' references undeclared link '{}'",
                            joint.name, link
                        )));
                    }
                    known.insert(link.clone());
                    links.push(link.clone());
                }
            }
            child_map
                .entry(joint.parent.clone())
                .or_default()
                .push(ChildEdge {
                    joint: joint.name.clone(),
                    child: joint.child.clone(),
                });
            let name = joint.name.clone();
            if joint_table.insert(name.clone(), joint).is_some() {
                return Err(FkError::InvalidDescription(format!(
                    "duplicate joint name '{name}'"
                )));
            }
        }

        if !known.contains(&root) {
            if explicit_links || !joint_table.is_empty() {
                return Err(FkError::InvalidDescription(format!(
                    "root link '{root}' is not part of the description"
                )));
            }
            links.push(root.clone());
        }

        Ok(Self {
            name: name.into(),
            root,
            links,
            joints: joint_table,
            child_map,
        })
    }

    /// Assemble a description from already materialized tables.
    ///
    /// No cross validation is done: edges may name joints missing from the
    /// joint table, which chain extraction reports when it reaches them.
    pub fn from_tables(
        name: impl Into<String>,
        root: impl Into<String>,
        child_map: HashMap<String, Vec<ChildEdge>>,
        joints: HashMap<String, Joint>,
    ) -> Self {
        let root = root.into();
        let mut links = vec![root.clone()];
        let mut seen: HashSet<String> = links.iter().cloned().collect();
        let mut parents: Vec<&String> = child_map.keys().collect();
        parents.sort();
        for parent in parents {
            let mut candidates = vec![parent.clone()];
            candidates.extend(child_map[parent].iter().map(|edge| edge.child.clone()));
            for link in candidates {
                if seen.insert(link.clone()) {
                    links.push(link);
                }
            }
        }
        Self {
            name: name.into(),
            root,
            links,
            joints,
            child_map,
        }
    }

    pub fn from_ron_str(text: &str) -> FkResult<Self> {
        let file: DescriptionFile = ron::from_str(text)?;
        Self::new(file.name, file.root, file.links, file.joints)
    }

    pub fn from_ron_file(path: impl AsRef<Path>) -> FkResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_ron_str(&text)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn links(&self) -> &[String] {
        &self.links
    }

    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.joints.get(name)
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Outgoing edges of `link`, empty for a leaf or an unknown link.
    pub fn children(&self, link: &str) -> &[ChildEdge] {
        self.child_map
            .get(link)
            .map(|edges| edges.as_slice())
            .unwrap_or(&[])
    }
}
