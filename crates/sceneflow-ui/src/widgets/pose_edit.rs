//! Compact pose editor: XYZ position plus roll/pitch/yaw in radians.

use egui::{DragValue, Ui};
use glam::{EulerRot, Quat, Vec3};
use sceneflow_core::Pose;

/// Edit a pose in place. Returns true when any component changed.
pub fn pose_edit(ui: &mut Ui, pose: &mut Pose) -> bool {
    let mut changed = false;

    ui.horizontal(|ui| {
        ui.label("Position");
        for (label, value) in [
            ("x", &mut pose.position.x),
            ("y", &mut pose.position.y),
            ("z", &mut pose.position.z),
        ] {
            changed |= ui
                .add(DragValue::new(value).speed(0.05).prefix(format!("{label}: ")))
                .changed();
        }
    });

    let (yaw, pitch, roll) = pose.rotation.to_euler(EulerRot::ZYX);
    let mut rpy = [roll, pitch, yaw];
    let mut rotation_changed = false;
    ui.horizontal(|ui| {
        ui.label("Rotation");
        for (label, value) in ["r", "p", "y"].iter().zip(rpy.iter_mut()) {
            rotation_changed |= ui
                .add(DragValue::new(value).speed(0.02).prefix(format!("{label}: ")))
                .changed();
        }
    });
    if rotation_changed {
        pose.rotation = Quat::from_euler(EulerRot::ZYX, rpy[2], rpy[1], rpy[0]);
        changed = true;
    }

    changed
}

/// Roll/pitch/yaw of a pose, for display.
pub fn pose_rpy(pose: &Pose) -> Vec3 {
    let (yaw, pitch, roll) = pose.rotation.to_euler(EulerRot::ZYX);
    Vec3::new(roll, pitch, yaw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpy_roundtrip() {
        let pose = Pose::from_position_rpy(Vec3::ZERO, 0.3, -0.4, 1.2);
        let rpy = pose_rpy(&pose);
        let back = Pose::from_position_rpy(Vec3::ZERO, rpy.x, rpy.y, rpy.z);
        assert!(
            back.rotation.abs_diff_eq(pose.rotation, 1e-5)
                || back.rotation.abs_diff_eq(-pose.rotation, 1e-5)
        );
    }
}
