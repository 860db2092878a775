/// Test fixtures shared by the unit tests of this crate
use crate::description::{Joint, MechanismDescription};

fn arm_prefix() -> Vec<Joint> {
    vec![
        Joint::fixed("base_joint", "world_link", "base", [0.0, 0.0, 0.1]),
        Joint::revolute(
            "shoulder",
            "base",
            "upper_arm",
            [0.0, 0.0, 0.2],
            [0.0, 0.0, 1.0],
        ),
        Joint::revolute(
            "elbow",
            "upper_arm",
            "forearm",
            [0.5, 0.0, 0.0],
            [0.0, 2.0, 0.0],
        ),
    ]
}

/// world_link -> base -> upper_arm -> forearm -> hand -> tool
pub fn serial_arm() -> MechanismDescription {
    let mut joints = arm_prefix();
    joints.push(Joint::revolute(
        "wrist",
        "forearm",
        "hand",
        [0.4, 0.0, 0.0],
        [1.0, 0.0, 0.0],
    ));
    joints.push(Joint::fixed("tool_joint", "hand", "tool", [0.1, 0.0, 0.0]));
    MechanismDescription::new("serial_arm", "world_link", Vec::new(), joints).unwrap()
}

/// Same first three joints as [`serial_arm`], then forearm carries both a hand
/// and a camera.
pub fn forked_arm() -> MechanismDescription {
    let mut joints = arm_prefix();
    joints.push(Joint::revolute(
        "wrist",
        "forearm",
        "hand",
        [0.4, 0.0, 0.0],
        [1.0, 0.0, 0.0],
    ));
    joints.push(Joint::fixed(
        "camera_joint",
        "forearm",
        "camera",
        [0.2, 0.0, 0.05],
    ));
    MechanismDescription::new("forked_arm", "world_link", Vec::new(), joints).unwrap()
}
