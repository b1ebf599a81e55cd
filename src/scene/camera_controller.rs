//! Keyboard and drag camera control
//!
//! - W/Z/Up, S/Down: step along the camera's forward axis
//! - D/Right, A/Q/Left: step along the camera's right axis
//! - Pointer drag: pitch about local X by `dy`, then yaw about local Y by `dx`
//!
//! Every key press (including auto-repeat) is one discrete step.

use glam::{Vec2, Vec3};
use winit::keyboard::KeyCode;

use super::Camera;

/// One discrete keyboard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMove {
    Forward,
    Backward,
    Left,
    Right,
}

impl CameraMove {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::KeyW | KeyCode::KeyZ | KeyCode::ArrowUp => Some(CameraMove::Forward),
            KeyCode::KeyS | KeyCode::ArrowDown => Some(CameraMove::Backward),
            KeyCode::KeyD | KeyCode::ArrowRight => Some(CameraMove::Right),
            KeyCode::KeyA | KeyCode::KeyQ | KeyCode::ArrowLeft => Some(CameraMove::Left),
            _ => None,
        }
    }

    /// Unit direction in the camera's local frame.
    fn local_direction(self) -> Vec3 {
        match self {
            CameraMove::Forward => Vec3::NEG_Z,
            CameraMove::Backward => Vec3::Z,
            CameraMove::Right => Vec3::X,
            CameraMove::Left => Vec3::NEG_X,
        }
    }
}

/// Input gathered between two frames
#[derive(Debug, Clone, Default)]
pub struct CameraInput {
    /// Key steps in arrival order
    pub moves: Vec<CameraMove>,
    /// Pointer movement while dragging (in pixels)
    pub drag_delta: Vec2,
    /// Whether the primary button is held
    pub dragging: bool,
}

impl CameraInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_move(&mut self, step: CameraMove) {
        self.moves.push(step);
    }

    /// Accumulate pointer motion; ignored unless a drag is in progress.
    pub fn add_pointer_motion(&mut self, delta: Vec2) {
        if self.dragging {
            self.drag_delta += delta;
        }
    }

    /// Reset per-frame deltas (call after update)
    pub fn reset_deltas(&mut self) {
        self.moves.clear();
        self.drag_delta = Vec2::ZERO;
    }
}

/// Abstract camera controller trait
pub trait CameraController {
    /// Apply the gathered input to the camera
    fn update(&mut self, camera: &mut Camera, input: &CameraInput);

    /// Get the controller name for debugging
    fn name(&self) -> &'static str;

    /// Restore default tuning
    fn reset(&mut self);
}

/// Step-and-drag controller
#[derive(Debug, Clone, PartialEq)]
pub struct DragController {
    /// Distance covered by one key step
    pub step: f32,
    /// Radians per pixel of drag
    pub drag_sensitivity: f32,
}

impl Default for DragController {
    fn default() -> Self {
        Self {
            step: 0.2,
            drag_sensitivity: 0.002,
        }
    }
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.drag_sensitivity = sensitivity;
        self
    }
}

impl CameraController for DragController {
    fn update(&mut self, camera: &mut Camera, input: &CameraInput) {
        for step in &input.moves {
            camera.translate_local(step.local_direction() * self.step);
        }

        if input.drag_delta != Vec2::ZERO {
            let pitch = input.drag_delta.y * self.drag_sensitivity;
            let yaw = input.drag_delta.x * self.drag_sensitivity;
            camera.rotate_local(pitch, yaw);
        }
    }

    fn name(&self) -> &'static str {
        "Drag"
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[rstest]
    #[case::w(KeyCode::KeyW, Some(CameraMove::Forward))]
    #[case::z(KeyCode::KeyZ, Some(CameraMove::Forward))]
    #[case::down(KeyCode::ArrowDown, Some(CameraMove::Backward))]
    #[case::q(KeyCode::KeyQ, Some(CameraMove::Left))]
    #[case::right(KeyCode::ArrowRight, Some(CameraMove::Right))]
    #[case::space(KeyCode::Space, None)]
    fn maps_keys(#[case] key: KeyCode, #[case] expected: Option<CameraMove>) {
        assert_eq!(CameraMove::from_key(key), expected);
    }

    #[test]
    fn each_press_is_one_step() {
        let mut camera = Camera::default();
        let mut controller = DragController::new();
        let mut input = CameraInput::new();
        input.push_move(CameraMove::Forward);
        input.push_move(CameraMove::Forward);
        input.push_move(CameraMove::Right);
        controller.update(&mut camera, &input);

        assert_abs_diff_eq!(camera.position.z, 1.6, epsilon = 1e-6);
        assert_abs_diff_eq!(camera.position.x, 0.2, epsilon = 1e-6);
    }

    #[test]
    fn motion_without_drag_is_ignored() {
        let mut input = CameraInput::new();
        input.add_pointer_motion(Vec2::new(10.0, 0.0));
        assert_eq!(input.drag_delta, Vec2::ZERO);

        input.dragging = true;
        input.add_pointer_motion(Vec2::new(10.0, 5.0));
        input.add_pointer_motion(Vec2::new(2.0, 0.0));
        assert_eq!(input.drag_delta, Vec2::new(12.0, 5.0));

        input.reset_deltas();
        assert_eq!(input.drag_delta, Vec2::ZERO);
        assert!(input.dragging);
    }

    #[test]
    fn drag_rotates_by_sensitivity() {
        let mut camera = Camera::default();
        let mut controller = DragController::new();
        let input = CameraInput {
            moves: Vec::new(),
            drag_delta: Vec2::new(0.0, 100.0),
            dragging: true,
        };
        controller.update(&mut camera, &input);

        let (axis, angle) = camera.rotation.to_axis_angle();
        assert_abs_diff_eq!(angle, 0.2, epsilon = 1e-5);
        assert_abs_diff_eq!(axis.x, 1.0, epsilon = 1e-5);
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 2.0));
    }
}
