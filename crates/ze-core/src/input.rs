//! Viewport input events

use glam::Vec2;

use crate::camera::Camera;
use crate::math::Ray;

/// Modifier keys held during an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    /// No modifiers held
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };

    /// Only Shift held
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
    };

    /// Only Ctrl held
    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Shift,
    Ctrl,
    Other(u32),
}

/// Mouse state in a viewport, with the camera that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMouseEvent {
    /// Pixel position in the viewport
    pub position: Vec2,
    /// World ray under the cursor
    pub ray: Ray,
    pub camera: Camera,
    pub modifiers: Modifiers,
    /// Scroll delta in notches, zero for non-scroll events
    pub scroll: f32,
}

impl ViewportMouseEvent {
    /// Build an event at a pixel position, deriving the ray from the camera
    pub fn at(camera: Camera, position: Vec2) -> Self {
        Self {
            position,
            ray: camera.screen_to_ray(position),
            camera,
            modifiers: Modifiers::NONE,
            scroll: 0.0,
        }
    }

    /// Same event with different modifiers
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Input routed to editing tools
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    MouseMove(ViewportMouseEvent),
    MouseDown(MouseButton, ViewportMouseEvent),
    MouseUp(MouseButton, ViewportMouseEvent),
    MouseScroll(ViewportMouseEvent),
    KeyDown(Key, Modifiers),
    KeyUp(Key, Modifiers),
}

impl InputEvent {
    /// Mouse state carried by the event, if any
    pub fn mouse(&self) -> Option<&ViewportMouseEvent> {
        match self {
            InputEvent::MouseMove(e)
            | InputEvent::MouseDown(_, e)
            | InputEvent::MouseUp(_, e)
            | InputEvent::MouseScroll(e) => Some(e),
            InputEvent::KeyDown(..) | InputEvent::KeyUp(..) => None,
        }
    }
}
