//! Input events for canvas interaction.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Phase of a touch sequence or recognized gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    /// Touch started (finger down).
    Start,
    /// Touch moved (finger dragging).
    Move,
    /// Touch ended (finger up).
    End,
    /// Touch sequence reclaimed by the platform.
    Cancel,
}

impl TouchPhase {
    /// Whether this phase finishes the sequence.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::End | Self::Cancel)
    }
}

/// A single touch point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Touch identifier (for multi-touch).
    pub id: u32,
    /// X position in screen coordinates.
    pub x: f32,
    /// Y position in screen coordinates.
    pub y: f32,
}

impl TouchPoint {
    /// Create a touch point.
    #[must_use]
    pub const fn new(id: u32, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }

    /// Screen position.
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A touch event with one or more touch points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    /// Phase of this touch event.
    pub phase: TouchPhase,
    /// All current touch points.
    pub touches: Vec<TouchPoint>,
    /// Timestamp in milliseconds since the editor opened.
    pub timestamp_ms: u64,
}

impl TouchEvent {
    /// Create a new touch event.
    #[must_use]
    pub fn new(phase: TouchPhase, touches: Vec<TouchPoint>, timestamp_ms: u64) -> Self {
        Self {
            phase,
            touches,
            timestamp_ms,
        }
    }

    /// Get the primary (first) touch point.
    #[must_use]
    pub fn primary_touch(&self) -> Option<&TouchPoint> {
        self.touches.first()
    }

    /// Check if this is a multi-touch event.
    #[must_use]
    pub fn is_multi_touch(&self) -> bool {
        self.touches.len() > 1
    }

    /// Screen positions of all touches.
    #[must_use]
    pub fn positions(&self) -> Vec<Point> {
        self.touches.iter().map(TouchPoint::position).collect()
    }
}

/// Gestures already recognized by the platform.
///
/// Values are cumulative since the gesture began, the way platform
/// recognizers report them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gesture", content = "data")]
pub enum Gesture {
    /// Drag by a screen translation.
    Drag {
        /// Translation along X in screen points.
        translation_x: f32,
        /// Translation along Y in screen points.
        translation_y: f32,
        /// Current pointer X in screen coordinates.
        location_x: f32,
        /// Current pointer Y in screen coordinates.
        location_y: f32,
    },

    /// Pinch with a magnification ratio (1.0 = no change).
    Pinch {
        /// Magnification ratio.
        scale: f32,
    },

    /// Two-finger rotation.
    Rotate {
        /// Rotation angle in radians.
        angle_radians: f32,
    },
}

/// A recognized gesture together with its phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureEvent {
    /// Phase of the recognizer.
    pub phase: TouchPhase,
    /// Current cumulative gesture value.
    pub gesture: Gesture,
}

impl GestureEvent {
    /// Create a gesture event.
    #[must_use]
    pub const fn new(phase: TouchPhase, gesture: Gesture) -> Self {
        Self { phase, gesture }
    }
}

/// All input the composition engine accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InputEvent {
    /// Raw touch event.
    Touch(TouchEvent),

    /// Recognized gesture.
    Gesture(GestureEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_touch_and_multi_touch() {
        let event = TouchEvent::new(
            TouchPhase::Move,
            vec![TouchPoint::new(0, 1.0, 2.0), TouchPoint::new(1, 3.0, 4.0)],
            10,
        );
        assert!(event.is_multi_touch());
        assert_eq!(event.primary_touch().map(TouchPoint::position), Some(Point::new(1.0, 2.0)));
        assert_eq!(event.positions().len(), 2);
    }

    #[test]
    fn terminal_phases() {
        assert!(TouchPhase::End.is_terminal());
        assert!(TouchPhase::Cancel.is_terminal());
        assert!(!TouchPhase::Move.is_terminal());
    }

    #[test]
    fn input_event_serializes_tagged() {
        let event = InputEvent::Gesture(GestureEvent::new(
            TouchPhase::Start,
            Gesture::Pinch { scale: 1.5 },
        ));
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("\"type\":\"Gesture\""));
        let back: InputEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, event);
    }
}
