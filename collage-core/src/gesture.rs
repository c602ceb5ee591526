//! Transform gestures: drag, pinch and rotate applied to one slot or item.
//!
//! Each target under a finger gets its own [`GestureSession`]. While the
//! session runs, values live only in the session and are readable through
//! [`GestureController::preview`]; the canvas is written once, when the
//! gesture ends or is cancelled.
//!
//! A session accepts either raw touches (finger count decides drag versus
//! pinch/rotate) or gestures the platform already recognized.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::canvas::{Canvas, Selection};
use crate::element::{
    clamp_grid_offset, ItemId, FREEFORM_MIN_SIZE, GRID_MAX_SCALE, GRID_MIN_SCALE, TEXT_MAX_SCALE,
    TEXT_MIN_SCALE,
};
use crate::event::{Gesture, GestureEvent, InputEvent, TouchEvent, TouchPhase};
use crate::geometry::{clamp, touch_angle, touch_distance, Point, Size};
use crate::swap::{swap_on_release, SwapOutcome};
use crate::viewport::Viewport;
use crate::{CanvasError, CanvasResult};

/// What a gesture manipulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "lowercase")]
pub enum GestureTarget {
    /// The photo in a grid slot.
    Grid(usize),
    /// A freeform photo.
    Freeform(ItemId),
    /// A text item.
    Text(ItemId),
}

impl GestureTarget {
    /// The selection that corresponds to this target.
    #[must_use]
    pub fn selection(self) -> Selection {
        match self {
            Self::Grid(index) => Selection::Grid(index),
            Self::Freeform(id) => Selection::Freeform(id),
            Self::Text(id) => Selection::Text(id),
        }
    }
}

/// Which tracks of a session are running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GesturePhase {
    /// No gesture.
    #[default]
    Idle,
    /// One finger moving the target.
    Dragging,
    /// Pinch in progress.
    Resizing,
    /// Rotation in progress.
    Rotating,
    /// Pinch and rotation together.
    ResizingAndRotating,
}

/// In-progress or committed transform values of one target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransformValues {
    /// Zoom and pan of a grid slot's photo.
    Grid {
        /// Zoom.
        scale: f32,
        /// Pan in canvas pixels.
        offset: Point,
    },
    /// Placement of a freeform photo.
    Freeform {
        /// Normalized center.
        position: Point,
        /// Box in canvas pixels.
        size: Size,
        /// Radians.
        rotation: f32,
    },
    /// Placement of a text item.
    Text {
        /// Normalized center.
        position: Point,
        /// Scale of the base font size.
        scale: f32,
        /// Radians.
        rotation: f32,
    },
}

/// Result of feeding one event to the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    /// The event did not start or touch any session.
    Ignored,
    /// A session is running; `values` is the current preview.
    Active {
        /// Tracks running after this event.
        phase: GesturePhase,
        /// Preview values.
        values: TransformValues,
    },
    /// The session ended and its values were written to the canvas.
    Committed(TransformValues),
    /// A grid drag ended over another slot: values were committed, then the
    /// two slots were swapped.
    Swapped {
        /// Committed values, now on the photo in `swap.to`.
        values: TransformValues,
        /// The slots exchanged.
        swap: SwapOutcome,
    },
}

/// Fixed facts about a target captured when its session begins.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Extent {
    Grid { image: Size, slot: Size },
    Freeform { canvas: Size },
    Text { canvas: Size },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragTrack {
    anchor: Point,
    origin: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ResizeAnchor {
    Scale(f32),
    Size(Size),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ResizeTrack {
    anchor: ResizeAnchor,
    start_distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RotateTrack {
    anchor: f32,
    start_angle: f32,
}

/// Gesture state for one target.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureSession {
    target: GestureTarget,
    /// Photo in the grid slot when the session began.
    photo: Option<ItemId>,
    extent: Extent,
    values: TransformValues,
    drag: Option<DragTrack>,
    resize: Option<ResizeTrack>,
    rotate: Option<RotateTrack>,
    touch_count: usize,
    last_location: Option<Point>,
}

impl GestureSession {
    /// Start a session from the target's committed values.
    ///
    /// Returns `Ok(None)` for an empty grid slot, which has nothing to move.
    ///
    /// # Errors
    ///
    /// Returns an error if the target does not exist.
    pub fn begin(canvas: &Canvas, target: GestureTarget) -> CanvasResult<Option<Self>> {
        let canvas_size = canvas.config().size();
        let mut slot_photo = None;
        let (extent, values) = match target {
            GestureTarget::Grid(index) => {
                let slot = canvas.slot(index).ok_or(CanvasError::SlotOutOfRange {
                    index,
                    count: canvas.slot_count(),
                })?;
                let Some(photo) = slot.photo.as_ref() else {
                    return Ok(None);
                };
                slot_photo = Some(photo.id);
                (
                    Extent::Grid {
                        image: photo.image.size(),
                        slot: canvas.slot_size(),
                    },
                    TransformValues::Grid {
                        scale: photo.scale,
                        offset: photo.offset,
                    },
                )
            }
            GestureTarget::Freeform(id) => {
                let photo = canvas
                    .freeform_item(id)
                    .ok_or_else(|| CanvasError::ItemNotFound(id.to_string()))?;
                (
                    Extent::Freeform {
                        canvas: canvas_size,
                    },
                    TransformValues::Freeform {
                        position: photo.position,
                        size: photo.size,
                        rotation: photo.rotation,
                    },
                )
            }
            GestureTarget::Text(id) => {
                let text = canvas
                    .text_item(id)
                    .ok_or_else(|| CanvasError::ItemNotFound(id.to_string()))?;
                (
                    Extent::Text {
                        canvas: canvas_size,
                    },
                    TransformValues::Text {
                        position: text.position,
                        scale: text.scale,
                        rotation: text.rotation,
                    },
                )
            }
        };

        Ok(Some(Self {
            target,
            photo: slot_photo,
            extent,
            values,
            drag: None,
            resize: None,
            rotate: None,
            touch_count: 0,
            last_location: None,
        }))
    }

    /// The target this session manipulates.
    #[must_use]
    pub fn target(&self) -> GestureTarget {
        self.target
    }

    /// Current preview values.
    #[must_use]
    pub fn values(&self) -> TransformValues {
        self.values
    }

    /// Last pointer location in screen coordinates, if known.
    #[must_use]
    pub fn last_location(&self) -> Option<Point> {
        self.last_location
    }

    /// Which tracks are running.
    #[must_use]
    pub fn phase(&self) -> GesturePhase {
        match (self.drag, self.resize, self.rotate) {
            (Some(_), _, _) => GesturePhase::Dragging,
            (None, Some(_), Some(_)) => GesturePhase::ResizingAndRotating,
            (None, Some(_), None) => GesturePhase::Resizing,
            (None, None, Some(_)) => GesturePhase::Rotating,
            (None, None, None) => GesturePhase::Idle,
        }
    }

    fn supports_rotation(&self) -> bool {
        !matches!(self.target, GestureTarget::Grid(_))
    }

    fn has_tracks(&self) -> bool {
        self.drag.is_some() || self.resize.is_some() || self.rotate.is_some()
    }

    // ------------------------------------------------------------------
    // Track setup
    // ------------------------------------------------------------------

    fn arm_drag(&mut self, origin: Point) {
        self.resize = None;
        if !self.supports_rotation() {
            self.rotate = None;
        }
        self.drag = Some(DragTrack {
            anchor: self.position(),
            origin,
        });
    }

    fn arm_resize(&mut self, start_distance: f32) {
        // A grid slot either pans or zooms, never both.
        if !self.supports_rotation() {
            self.drag = None;
        }
        let anchor = match self.values {
            TransformValues::Grid { scale, .. } | TransformValues::Text { scale, .. } => {
                ResizeAnchor::Scale(scale)
            }
            TransformValues::Freeform { size, .. } => ResizeAnchor::Size(size),
        };
        let start_distance = if start_distance.is_finite() && start_distance > 0.0 {
            start_distance
        } else {
            1.0
        };
        self.resize = Some(ResizeTrack {
            anchor,
            start_distance,
        });
    }

    fn arm_rotate(&mut self, start_angle: f32) {
        if !self.supports_rotation() {
            return;
        }
        self.rotate = Some(RotateTrack {
            anchor: self.rotation(),
            start_angle,
        });
    }

    /// Re-anchor every track for a new set of fingers.
    fn arm_for_touches(&mut self, points: &[Point]) {
        self.touch_count = points.len();
        self.drag = None;
        self.resize = None;
        self.rotate = None;
        match points {
            [] => {}
            [only] => {
                self.arm_drag(*only);
                self.last_location = Some(*only);
            }
            _ => {
                self.arm_resize(touch_distance(points));
                self.arm_rotate(touch_angle(points));
            }
        }
    }

    // ------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------

    fn apply_touches(&mut self, points: &[Point], viewport: &Viewport) {
        if points.len() != self.touch_count {
            tracing::debug!(
                "Touch count {} -> {} on {:?}, re-anchoring",
                self.touch_count,
                points.len(),
                self.target
            );
            self.arm_for_touches(points);
            return;
        }

        match points {
            [] => {}
            [only] => {
                if let Some(track) = self.drag {
                    self.last_location = Some(*only);
                    self.apply_translation(only.delta_from(track.origin), viewport);
                }
            }
            _ => {
                if let Some(track) = self.resize {
                    let current = touch_distance(points);
                    if current > 0.0 {
                        self.apply_ratio(current / track.start_distance);
                    }
                }
                if let Some(track) = self.rotate {
                    self.apply_rotation(touch_angle(points) - track.start_angle);
                }
            }
        }
    }

    fn apply_translation(&mut self, translation: Point, viewport: &Viewport) {
        let Some(track) = self.drag else {
            return;
        };
        let delta = viewport.delta_to_canvas(translation);

        match (&mut self.values, self.extent) {
            (TransformValues::Grid { scale, offset }, Extent::Grid { image, slot }) => {
                *offset = clamp_grid_offset(image, slot, *scale, track.anchor.offset_by(delta));
            }
            (TransformValues::Freeform { position, size, .. }, Extent::Freeform { canvas }) => {
                let moved = track.anchor.offset_by(normalize(delta, canvas));
                *position = clamp_to_canvas(moved, *size, canvas);
            }
            (TransformValues::Text { position, .. }, Extent::Text { canvas }) => {
                let moved = track.anchor.offset_by(normalize(delta, canvas));
                *position = Point::new(clamp(moved.x, 0.0, 1.0), clamp(moved.y, 0.0, 1.0));
            }
            _ => {}
        }
    }

    fn apply_ratio(&mut self, ratio: f32) {
        let Some(track) = self.resize else {
            return;
        };
        if ratio.is_nan() {
            return;
        }

        match (&mut self.values, self.extent, track.anchor) {
            (
                TransformValues::Grid { scale, offset },
                Extent::Grid { image, slot },
                ResizeAnchor::Scale(anchor),
            ) => {
                *scale = clamp(anchor * ratio, GRID_MIN_SCALE, GRID_MAX_SCALE);
                *offset = clamp_grid_offset(image, slot, *scale, *offset);
            }
            (
                TransformValues::Freeform { size, .. },
                Extent::Freeform { canvas },
                ResizeAnchor::Size(anchor),
            ) => {
                *size = Size::new(
                    clamp(anchor.width * ratio, FREEFORM_MIN_SIZE, canvas.width),
                    clamp(anchor.height * ratio, FREEFORM_MIN_SIZE, canvas.height),
                );
            }
            (TransformValues::Text { scale, .. }, Extent::Text { .. }, ResizeAnchor::Scale(anchor)) => {
                *scale = clamp(anchor * ratio, TEXT_MIN_SCALE, TEXT_MAX_SCALE);
            }
            _ => {}
        }
    }

    fn apply_rotation(&mut self, delta: f32) {
        let Some(track) = self.rotate else {
            return;
        };
        if !delta.is_finite() {
            return;
        }
        match &mut self.values {
            TransformValues::Freeform { rotation, .. } | TransformValues::Text { rotation, .. } => {
                *rotation = track.anchor + delta;
            }
            TransformValues::Grid { .. } => {}
        }
    }

    fn position(&self) -> Point {
        match self.values {
            TransformValues::Grid { offset, .. } => offset,
            TransformValues::Freeform { position, .. } | TransformValues::Text { position, .. } => {
                position
            }
        }
    }

    fn rotation(&self) -> f32 {
        match self.values {
            TransformValues::Grid { .. } => 0.0,
            TransformValues::Freeform { rotation, .. } | TransformValues::Text { rotation, .. } => {
                rotation
            }
        }
    }

    /// Write the session's values to the canvas.
    ///
    /// # Errors
    ///
    /// Returns an error if the target disappeared during the gesture, or
    /// if a grid slot now holds a different photo than when it began.
    pub fn commit(&self, canvas: &mut Canvas) -> CanvasResult<()> {
        match (self.target, self.values) {
            (GestureTarget::Grid(index), TransformValues::Grid { scale, offset }) => {
                let current = canvas.slot(index).and_then(|s| s.photo.as_ref()).map(|p| p.id);
                match (self.photo, current) {
                    (Some(started), Some(now)) if started == now => {
                        canvas.set_grid_photo_transform(index, scale, offset)
                    }
                    (Some(started), _) => Err(CanvasError::ItemNotFound(format!(
                        "photo {started} left slot {index} during the gesture"
                    ))),
                    (None, _) => Err(CanvasError::InvariantViolation(format!(
                        "grid session on slot {index} has no photo"
                    ))),
                }
            }
            (
                GestureTarget::Freeform(id),
                TransformValues::Freeform {
                    position,
                    size,
                    rotation,
                },
            ) => canvas.set_freeform_placement(id, position, size, rotation),
            (
                GestureTarget::Text(id),
                TransformValues::Text {
                    position,
                    scale,
                    rotation,
                },
            ) => canvas.set_text_transform(id, position, scale, rotation),
            (target, values) => Err(CanvasError::InvariantViolation(format!(
                "{values:?} cannot be committed to {target:?}"
            ))),
        }
    }

    fn preview_outcome(&self) -> GestureOutcome {
        GestureOutcome::Active {
            phase: self.phase(),
            values: self.values,
        }
    }
}

fn normalize(delta: Point, canvas: Size) -> Point {
    Point::new(
        delta.x / canvas.width.max(1.0),
        delta.y / canvas.height.max(1.0),
    )
}

/// Clamp a freeform photo's normalized center so its box stays on the
/// canvas. An axis where the box is wider than the canvas pins the center
/// to 0.5.
#[must_use]
pub fn clamp_to_canvas(position: Point, item: Size, canvas: Size) -> Point {
    let axis = |value: f32, extent: f32, total: f32| {
        let half = extent / total.max(1.0) / 2.0;
        let lo = half.min(0.5);
        let hi = (1.0 - half).max(0.5);
        clamp(value, lo, hi)
    };
    Point::new(
        axis(position.x, item.width, canvas.width),
        axis(position.y, item.height, canvas.height),
    )
}

/// Runs one [`GestureSession`] per target.
///
/// Sessions on different targets are independent; events for a target
/// without a session are ignored unless they start one.
#[derive(Debug, Clone, Default)]
pub struct GestureController {
    sessions: HashMap<GestureTarget, GestureSession>,
}

impl GestureController {
    /// Create a controller with no running sessions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed any input event.
    ///
    /// # Errors
    ///
    /// See [`Self::handle_touch`] and [`Self::handle_gesture`].
    pub fn handle(
        &mut self,
        canvas: &mut Canvas,
        viewport: &Viewport,
        target: GestureTarget,
        event: &InputEvent,
    ) -> CanvasResult<GestureOutcome> {
        match event {
            InputEvent::Touch(touch) => self.handle_touch(canvas, viewport, target, touch),
            InputEvent::Gesture(gesture) => self.handle_gesture(canvas, viewport, target, gesture),
        }
    }

    /// Feed a raw touch event for `target`.
    ///
    /// One finger drags; two or more pinch and, except in a grid slot,
    /// rotate. A change in finger count re-anchors from the current values.
    /// `End` commits and resolves a grid drag swap; `Cancel` commits the last
    /// values without swapping.
    ///
    /// # Errors
    ///
    /// Returns an error if the target does not exist when the gesture
    /// starts or disappears before it is committed.
    pub fn handle_touch(
        &mut self,
        canvas: &mut Canvas,
        viewport: &Viewport,
        target: GestureTarget,
        event: &TouchEvent,
    ) -> CanvasResult<GestureOutcome> {
        let points = event.positions();

        match event.phase {
            TouchPhase::Start => {
                if points.is_empty() {
                    return Ok(GestureOutcome::Ignored);
                }
                if let Some(session) = self.sessions.get_mut(&target) {
                    session.arm_for_touches(&points);
                    return Ok(session.preview_outcome());
                }
                let Some(mut session) = Self::start(canvas, target)? else {
                    return Ok(GestureOutcome::Ignored);
                };
                session.arm_for_touches(&points);
                let outcome = session.preview_outcome();
                self.sessions.insert(target, session);
                Ok(outcome)
            }
            TouchPhase::Move => {
                let Some(session) = self.sessions.get_mut(&target) else {
                    return Ok(GestureOutcome::Ignored);
                };
                session.apply_touches(&points, viewport);
                Ok(session.preview_outcome())
            }
            TouchPhase::End => {
                let Some(session) = self.sessions.get_mut(&target) else {
                    return Ok(GestureOutcome::Ignored);
                };
                if !points.is_empty() && points.len() == session.touch_count {
                    session.apply_touches(&points, viewport);
                }
                let allow_swap = session.drag.is_some();
                self.finish(canvas, viewport, target, allow_swap)
            }
            TouchPhase::Cancel => self.finish(canvas, viewport, target, false),
        }
    }

    /// Feed a platform-recognized gesture for `target`.
    ///
    /// Recognizers for one target may overlap; the session commits when the
    /// last one ends. Rotation of a grid slot is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the target does not exist when the gesture
    /// starts or disappears before it is committed.
    pub fn handle_gesture(
        &mut self,
        canvas: &mut Canvas,
        viewport: &Viewport,
        target: GestureTarget,
        event: &GestureEvent,
    ) -> CanvasResult<GestureOutcome> {
        if matches!(target, GestureTarget::Grid(_))
            && matches!(event.gesture, Gesture::Rotate { .. })
        {
            return Ok(GestureOutcome::Ignored);
        }

        match event.phase {
            TouchPhase::Start | TouchPhase::Move => {
                if !self.sessions.contains_key(&target) {
                    let Some(session) = Self::start(canvas, target)? else {
                        return Ok(GestureOutcome::Ignored);
                    };
                    self.sessions.insert(target, session);
                }
                let Some(session) = self.sessions.get_mut(&target) else {
                    return Ok(GestureOutcome::Ignored);
                };
                if event.phase == TouchPhase::Start {
                    arm_gesture(session, event.gesture, false);
                } else if !tracks(session, event.gesture) {
                    arm_gesture(session, event.gesture, true);
                }
                apply_gesture(session, event.gesture, viewport);
                Ok(session.preview_outcome())
            }
            TouchPhase::End => {
                let Some(session) = self.sessions.get_mut(&target) else {
                    return Ok(GestureOutcome::Ignored);
                };
                let was_drag = matches!(event.gesture, Gesture::Drag { .. })
                    && session.drag.is_some();
                apply_gesture(session, event.gesture, viewport);
                disarm_gesture(session, event.gesture);
                if session.has_tracks() {
                    return Ok(session.preview_outcome());
                }
                self.finish(canvas, viewport, target, was_drag)
            }
            TouchPhase::Cancel => self.finish(canvas, viewport, target, false),
        }
    }

    /// The running session for `target`.
    #[must_use]
    pub fn session(&self, target: GestureTarget) -> Option<&GestureSession> {
        self.sessions.get(&target)
    }

    /// In-progress values for `target`, if a gesture is running on it.
    #[must_use]
    pub fn preview(&self, target: GestureTarget) -> Option<TransformValues> {
        self.sessions.get(&target).map(GestureSession::values)
    }

    /// Phase of the gesture on `target`.
    #[must_use]
    pub fn phase(&self, target: GestureTarget) -> GesturePhase {
        self.sessions
            .get(&target)
            .map_or(GesturePhase::Idle, GestureSession::phase)
    }

    /// Number of running sessions.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    /// Cancel every running session, committing their last values. Sessions
    /// whose target vanished are dropped.
    ///
    /// Returns how many sessions were committed.
    pub fn cancel_all(&mut self, canvas: &mut Canvas) -> usize {
        let mut committed = 0;
        for (target, session) in self.sessions.drain() {
            match session.commit(canvas) {
                Ok(()) => committed += 1,
                Err(e) => tracing::warn!("Dropping gesture on {target:?}: {e}"),
            }
        }
        committed
    }

    fn start(
        canvas: &mut Canvas,
        target: GestureTarget,
    ) -> CanvasResult<Option<GestureSession>> {
        let Some(session) = GestureSession::begin(canvas, target)? else {
            tracing::debug!("Ignoring gesture on empty {target:?}");
            return Ok(None);
        };
        canvas.select(target.selection())?;
        tracing::debug!("Gesture started on {target:?}");
        Ok(Some(session))
    }

    fn finish(
        &mut self,
        canvas: &mut Canvas,
        viewport: &Viewport,
        target: GestureTarget,
        allow_swap: bool,
    ) -> CanvasResult<GestureOutcome> {
        let Some(session) = self.sessions.remove(&target) else {
            return Ok(GestureOutcome::Ignored);
        };
        let values = session.values();
        session.commit(canvas)?;
        tracing::debug!("Gesture committed on {target:?}");

        if let (true, GestureTarget::Grid(source), Some(release)) =
            (allow_swap, target, session.last_location())
        {
            if let Some(swap) = swap_on_release(canvas, viewport.frame(), release, source)? {
                return Ok(GestureOutcome::Swapped { values, swap });
            }
        }
        Ok(GestureOutcome::Committed(values))
    }
}

fn tracks(session: &GestureSession, gesture: Gesture) -> bool {
    match gesture {
        Gesture::Drag { .. } => session.drag.is_some(),
        Gesture::Pinch { .. } => session.resize.is_some(),
        Gesture::Rotate { .. } => session.rotate.is_some(),
    }
}

/// Arm the track for a recognized gesture.
///
/// Recognizer values are cumulative from the gesture's own start, which is
/// identity. A track armed mid-gesture (`resume`) takes the value reported
/// now as its base instead, so only later change is applied.
fn arm_gesture(session: &mut GestureSession, gesture: Gesture, resume: bool) {
    match gesture {
        Gesture::Drag {
            translation_x,
            translation_y,
            ..
        } => {
            let origin = if resume && translation_x.is_finite() && translation_y.is_finite() {
                Point::new(translation_x, translation_y)
            } else {
                Point::ZERO
            };
            // Pinch/rotate on a freeform item keep running under a drag.
            let resize = session.resize;
            session.arm_drag(origin);
            if session.supports_rotation() {
                session.resize = resize;
            }
        }
        Gesture::Pinch { scale } => session.arm_resize(if resume { scale } else { 1.0 }),
        Gesture::Rotate { angle_radians } => {
            let start = if resume && angle_radians.is_finite() {
                angle_radians
            } else {
                0.0
            };
            session.arm_rotate(start);
        }
    }
}

fn apply_gesture(session: &mut GestureSession, gesture: Gesture, viewport: &Viewport) {
    match gesture {
        Gesture::Drag {
            translation_x,
            translation_y,
            location_x,
            location_y,
        } => {
            if let Some(track) = session.drag {
                session.last_location = Some(Point::new(location_x, location_y));
                let translation = Point::new(translation_x, translation_y);
                session.apply_translation(translation.delta_from(track.origin), viewport);
            }
        }
        Gesture::Pinch { scale } => {
            if let Some(track) = session.resize {
                session.apply_ratio(scale / track.start_distance);
            }
        }
        Gesture::Rotate { angle_radians } => {
            if let Some(track) = session.rotate {
                session.apply_rotation(angle_radians - track.start_angle);
            }
        }
    }
}

fn disarm_gesture(session: &mut GestureSession, gesture: Gesture) {
    match gesture {
        Gesture::Drag { .. } => session.drag = None,
        Gesture::Pinch { .. } => session.resize = None,
        Gesture::Rotate { .. } => session.rotate = None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{GridTap, LayoutMode};
    use crate::config::CanvasConfig;
    use crate::element::ImageRef;
    use crate::event::TouchPoint;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn touch(phase: TouchPhase, points: &[(f32, f32)]) -> TouchEvent {
        let touches = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| TouchPoint::new(u32::try_from(i).unwrap_or(0), x, y))
            .collect();
        TouchEvent::new(phase, touches, 0)
    }

    fn freeform_canvas() -> (Canvas, ItemId) {
        let mut canvas = Canvas::new(CanvasConfig::new(1000, 1000));
        canvas.set_layout_mode(LayoutMode::Freeform);
        let id = canvas.add_freeform_photo(ImageRef::new("a", 400, 400));
        (canvas, id)
    }

    #[test]
    fn freeform_drag_previews_then_commits_once() {
        let (mut canvas, id) = freeform_canvas();
        let viewport = Viewport::identity(&canvas.config());
        let target = GestureTarget::Freeform(id);
        let mut controller = GestureController::new();

        controller
            .handle_touch(&mut canvas, &viewport, target, &touch(TouchPhase::Start, &[(500.0, 500.0)]))
            .expect("start");
        let revision = canvas.revision();
        let outcome = controller
            .handle_touch(&mut canvas, &viewport, target, &touch(TouchPhase::Move, &[(600.0, 500.0)]))
            .expect("move");
        assert!(matches!(outcome, GestureOutcome::Active { phase: GesturePhase::Dragging, .. }));
        assert_eq!(canvas.revision(), revision);
        assert_eq!(canvas.freeform_item(id).map(|p| p.position), Some(Point::CENTER));

        let outcome = controller
            .handle_touch(&mut canvas, &viewport, target, &touch(TouchPhase::End, &[(600.0, 500.0)]))
            .expect("end");
        assert!(matches!(outcome, GestureOutcome::Committed(_)));
        assert_eq!(canvas.revision(), revision + 1);
        let position = canvas.freeform_item(id).map(|p| p.position).expect("photo");
        assert!(approx(position.x, 0.6));
        assert_eq!(controller.active_count(), 0);
    }

    #[test]
    fn freeform_drag_stays_on_canvas() {
        let (mut canvas, id) = freeform_canvas();
        let viewport = Viewport::identity(&canvas.config());
        let target = GestureTarget::Freeform(id);
        let mut controller = GestureController::new();
        let size = canvas.freeform_item(id).map(|p| p.size).expect("photo");

        controller
            .handle_touch(&mut canvas, &viewport, target, &touch(TouchPhase::Start, &[(0.0, 0.0)]))
            .expect("start");
        controller
            .handle_touch(&mut canvas, &viewport, target, &touch(TouchPhase::Move, &[(-5000.0, 9000.0)]))
            .expect("move");
        let Some(TransformValues::Freeform { position, .. }) = controller.preview(target) else {
            panic!("expected freeform preview");
        };
        assert!(approx(position.x, size.width / 1000.0 / 2.0));
        assert!(approx(position.y, 1.0 - size.height / 1000.0 / 2.0));
    }

    #[test]
    fn wide_item_is_pinned_to_center() {
        let clamped = clamp_to_canvas(
            Point::new(0.9, 0.1),
            Size::new(1500.0, 100.0),
            Size::new(1000.0, 1000.0),
        );
        assert!(approx(clamped.x, 0.5));
        assert!(approx(clamped.y, 0.05));
    }

    #[test]
    fn pinch_and_rotate_freeform() {
        let (mut canvas, id) = freeform_canvas();
        let viewport = Viewport::identity(&canvas.config());
        let target = GestureTarget::Freeform(id);
        let mut controller = GestureController::new();
        let before = canvas.freeform_item(id).map(|p| p.size).expect("photo");

        controller
            .handle_touch(
                &mut canvas,
                &viewport,
                target,
                &touch(TouchPhase::Start, &[(400.0, 500.0), (600.0, 500.0)]),
            )
            .expect("start");
        assert_eq!(controller.phase(target), GesturePhase::ResizingAndRotating);
        // Twice as far apart and turned a quarter turn.
        controller
            .handle_touch(
                &mut canvas,
                &viewport,
                target,
                &touch(TouchPhase::Move, &[(500.0, 300.0), (500.0, 700.0)]),
            )
            .expect("move");
        controller
            .handle_touch(&mut canvas, &viewport, target, &touch(TouchPhase::End, &[]))
            .expect("end");

        let photo = canvas.freeform_item(id).expect("photo");
        assert!(approx(photo.size.width, before.width * 2.0));
        assert!(approx(photo.rotation, std::f32::consts::FRAC_PI_2));
    }

    #[test]
    fn adversarial_pinch_stays_in_bounds() {
        let (mut canvas, id) = freeform_canvas();
        let viewport = Viewport::identity(&canvas.config());
        let target = GestureTarget::Freeform(id);
        let mut controller = GestureController::new();

        for (scale, expected) in [(1e9_f32, 1000.0_f32), (1e-9, FREEFORM_MIN_SIZE)] {
            let pinch = |phase| GestureEvent::new(phase, Gesture::Pinch { scale });
            controller
                .handle_gesture(&mut canvas, &viewport, target, &pinch(TouchPhase::Start))
                .expect("start");
            controller
                .handle_gesture(&mut canvas, &viewport, target, &pinch(TouchPhase::End))
                .expect("end");
            let photo = canvas.freeform_item(id).expect("photo");
            assert!(approx(photo.size.width, expected));
            assert!(approx(photo.size.height, expected));
        }
    }

    #[test]
    fn coincident_start_touches_do_not_divide_by_zero() {
        let mut canvas = Canvas::new(CanvasConfig::new(1000, 1000));
        let text = canvas.add_text_overlay();
        let viewport = Viewport::identity(&canvas.config());
        let target = GestureTarget::Text(text);
        let mut controller = GestureController::new();

        controller
            .handle_touch(
                &mut canvas,
                &viewport,
                target,
                &touch(TouchPhase::Start, &[(10.0, 10.0), (10.0, 10.0)]),
            )
            .expect("start");
        controller
            .handle_touch(
                &mut canvas,
                &viewport,
                target,
                &touch(TouchPhase::Move, &[(0.0, 10.0), (2.0, 10.0)]),
            )
            .expect("move");
        let Some(TransformValues::Text { scale, .. }) = controller.preview(target) else {
            panic!("expected text preview");
        };
        assert!(approx(scale, 2.0));
    }

    #[test]
    fn finger_count_change_reanchors() {
        let (mut canvas, id) = freeform_canvas();
        let viewport = Viewport::identity(&canvas.config());
        let target = GestureTarget::Freeform(id);
        let mut controller = GestureController::new();

        controller
            .handle_touch(&mut canvas, &viewport, target, &touch(TouchPhase::Start, &[(500.0, 500.0)]))
            .expect("start");
        controller
            .handle_touch(&mut canvas, &viewport, target, &touch(TouchPhase::Move, &[(550.0, 500.0)]))
            .expect("move");
        // Second finger lands: no jump, now pinching.
        controller
            .handle_touch(
                &mut canvas,
                &viewport,
                target,
                &touch(TouchPhase::Move, &[(550.0, 500.0), (650.0, 500.0)]),
            )
            .expect("second finger");
        assert_eq!(controller.phase(target), GesturePhase::ResizingAndRotating);
        let Some(TransformValues::Freeform { position, .. }) = controller.preview(target) else {
            panic!("expected freeform preview");
        };
        assert!(approx(position.x, 0.55));
    }

    #[test]
    fn grid_pinch_clamps_scale_and_never_rotates() {
        let mut canvas = Canvas::new(CanvasConfig::new(1000, 1000));
        canvas.place_photo_in_grid(ImageRef::new("a", 800, 600));
        let viewport = Viewport::identity(&canvas.config());
        let target = GestureTarget::Grid(0);
        let mut controller = GestureController::new();

        controller
            .handle_touch(
                &mut canvas,
                &viewport,
                target,
                &touch(TouchPhase::Start, &[(100.0, 100.0), (200.0, 100.0)]),
            )
            .expect("start");
        assert_eq!(controller.phase(target), GesturePhase::Resizing);
        controller
            .handle_touch(
                &mut canvas,
                &viewport,
                target,
                &touch(TouchPhase::Move, &[(100.0, 100.0), (100.0, 10_000.0)]),
            )
            .expect("move");
        controller
            .handle_touch(&mut canvas, &viewport, target, &touch(TouchPhase::Cancel, &[]))
            .expect("cancel");

        let photo = canvas.slot(0).and_then(|s| s.photo.as_ref()).expect("photo");
        assert!(approx(photo.scale, GRID_MAX_SCALE));
        let limit = photo.grid_pan_limit(canvas.slot_size(), photo.scale);
        assert!(photo.offset.x.abs() <= limit.x);
        assert!(photo.offset.y.abs() <= limit.y);
    }

    #[test]
    fn grid_drag_release_swaps_slots() {
        let mut canvas = Canvas::new(CanvasConfig::new(1000, 1000));
        canvas.place_photo_in_grid(ImageRef::new("a", 800, 600));
        let photo = canvas.photo_ids()[0];
        let viewport = Viewport::identity(&canvas.config());
        let target = GestureTarget::Grid(0);
        let mut controller = GestureController::new();

        controller
            .handle_touch(&mut canvas, &viewport, target, &touch(TouchPhase::Start, &[(250.0, 250.0)]))
            .expect("start");
        assert_eq!(canvas.selection(), Selection::Grid(0));
        controller
            .handle_touch(&mut canvas, &viewport, target, &touch(TouchPhase::Move, &[(750.0, 750.0)]))
            .expect("move");
        let outcome = controller
            .handle_touch(&mut canvas, &viewport, target, &touch(TouchPhase::End, &[(750.0, 750.0)]))
            .expect("end");

        assert!(matches!(
            outcome,
            GestureOutcome::Swapped {
                swap: SwapOutcome { from: 0, to: 3 },
                ..
            }
        ));
        assert_eq!(canvas.slot(3).and_then(|s| s.photo.as_ref()).map(|p| p.id), Some(photo));
        assert_eq!(canvas.selection(), Selection::Grid(3));
    }

    #[test]
    fn cancelled_grid_drag_never_swaps() {
        let mut canvas = Canvas::new(CanvasConfig::new(1000, 1000));
        canvas.place_photo_in_grid(ImageRef::new("a", 800, 600));
        let viewport = Viewport::identity(&canvas.config());
        let target = GestureTarget::Grid(0);
        let mut controller = GestureController::new();

        controller
            .handle_touch(&mut canvas, &viewport, target, &touch(TouchPhase::Start, &[(250.0, 250.0)]))
            .expect("start");
        controller
            .handle_touch(&mut canvas, &viewport, target, &touch(TouchPhase::Move, &[(750.0, 750.0)]))
            .expect("move");
        let outcome = controller
            .handle_touch(&mut canvas, &viewport, target, &touch(TouchPhase::Cancel, &[]))
            .expect("cancel");
        assert!(matches!(outcome, GestureOutcome::Committed(_)));
        assert!(canvas.slot(0).is_some_and(|s| !s.is_empty()));
    }

    #[test]
    fn empty_grid_slot_is_ignored() {
        let mut canvas = Canvas::default();
        let viewport = Viewport::identity(&canvas.config());
        let mut controller = GestureController::new();
        let outcome = controller
            .handle_touch(
                &mut canvas,
                &viewport,
                GestureTarget::Grid(1),
                &touch(TouchPhase::Start, &[(1.0, 1.0)]),
            )
            .expect("start");
        assert_eq!(outcome, GestureOutcome::Ignored);
        assert!(canvas.selection().is_none());
    }

    #[test]
    fn recognized_gestures_overlap_until_last_ends() {
        let (mut canvas, id) = freeform_canvas();
        let viewport = Viewport::identity(&canvas.config());
        let target = GestureTarget::Freeform(id);
        let mut controller = GestureController::new();

        let pinch = |phase, scale| GestureEvent::new(phase, Gesture::Pinch { scale });
        let rotate = |phase, angle_radians| GestureEvent::new(phase, Gesture::Rotate { angle_radians });

        controller
            .handle_gesture(&mut canvas, &viewport, target, &pinch(TouchPhase::Start, 1.0))
            .expect("pinch start");
        controller
            .handle_gesture(&mut canvas, &viewport, target, &rotate(TouchPhase::Start, 0.0))
            .expect("rotate start");
        controller
            .handle_gesture(&mut canvas, &viewport, target, &rotate(TouchPhase::Move, 0.5))
            .expect("rotate move");
        let outcome = controller
            .handle_gesture(&mut canvas, &viewport, target, &pinch(TouchPhase::End, 1.5))
            .expect("pinch end");
        assert!(matches!(outcome, GestureOutcome::Active { phase: GesturePhase::Rotating, .. }));

        let outcome = controller
            .handle_gesture(&mut canvas, &viewport, target, &rotate(TouchPhase::End, 0.5))
            .expect("rotate end");
        assert!(matches!(outcome, GestureOutcome::Committed(_)));
        let photo = canvas.freeform_item(id).expect("photo");
        assert!(approx(photo.rotation, 0.5));
    }

    #[test]
    fn grid_pinch_resumed_after_drag_continues_from_current_scale() {
        let mut canvas = Canvas::new(CanvasConfig::new(1000, 1000));
        canvas.place_photo_in_grid(ImageRef::new("a", 800, 600));
        let viewport = Viewport::identity(&canvas.config());
        let target = GestureTarget::Grid(0);
        let mut controller = GestureController::new();

        let pinch = |phase, scale| GestureEvent::new(phase, Gesture::Pinch { scale });
        let drag = |phase| {
            GestureEvent::new(
                phase,
                Gesture::Drag {
                    translation_x: 0.0,
                    translation_y: 0.0,
                    location_x: 10.0,
                    location_y: 10.0,
                },
            )
        };

        for event in [
            pinch(TouchPhase::Start, 1.0),
            pinch(TouchPhase::Move, 1.5),
            drag(TouchPhase::Start),
            pinch(TouchPhase::Move, 1.6),
            pinch(TouchPhase::Move, 2.0),
        ] {
            controller
                .handle_gesture(&mut canvas, &viewport, target, &event)
                .expect("gesture");
        }
        let outcome = controller
            .handle_gesture(&mut canvas, &viewport, target, &pinch(TouchPhase::End, 2.0))
            .expect("pinch end");
        assert!(matches!(outcome, GestureOutcome::Committed(_)));

        // 1.5 before the drag, then 2.0 / 1.6 after it.
        let photo = canvas.slot(0).and_then(|s| s.photo.as_ref()).expect("photo");
        assert!(approx(photo.scale, 1.875), "scale {}", photo.scale);
    }

    #[test]
    fn rotation_rearmed_mid_gesture_applies_only_later_change() {
        let mut canvas = Canvas::new(CanvasConfig::new(1000, 1000));
        let id = canvas.add_text_overlay();
        let viewport = Viewport::identity(&canvas.config());
        let target = GestureTarget::Text(id);
        let mut controller = GestureController::new();

        let pinch = |phase, scale| GestureEvent::new(phase, Gesture::Pinch { scale });
        let rotate = |phase, angle_radians| GestureEvent::new(phase, Gesture::Rotate { angle_radians });

        for event in [
            pinch(TouchPhase::Start, 1.0),
            rotate(TouchPhase::Start, 0.0),
            rotate(TouchPhase::Move, 0.4),
            rotate(TouchPhase::End, 0.4),
            rotate(TouchPhase::Move, 0.6),
            rotate(TouchPhase::Move, 0.7),
        ] {
            controller
                .handle_gesture(&mut canvas, &viewport, target, &event)
                .expect("gesture");
        }
        controller
            .handle_gesture(&mut canvas, &viewport, target, &pinch(TouchPhase::End, 1.0))
            .expect("pinch end");

        let text = canvas.text_item(id).expect("text");
        assert!(approx(text.rotation, 0.5), "rotation {}", text.rotation);
    }

    #[test]
    fn grid_session_never_commits_onto_a_swapped_in_photo() {
        let mut canvas = Canvas::new(CanvasConfig::new(1000, 1000));
        canvas.place_photo_in_grid(ImageRef::new("a", 800, 600));
        canvas.place_photo_in_grid(ImageRef::new("b", 800, 600));
        let [a, b] = [canvas.photo_ids()[0], canvas.photo_ids()[1]];
        let viewport = Viewport::identity(&canvas.config());
        let target = GestureTarget::Grid(0);
        let mut controller = GestureController::new();

        let pinch = |phase, scale| GestureEvent::new(phase, Gesture::Pinch { scale });
        controller
            .handle_gesture(&mut canvas, &viewport, target, &pinch(TouchPhase::Start, 1.0))
            .expect("pinch start");
        controller
            .handle_gesture(&mut canvas, &viewport, target, &pinch(TouchPhase::Move, 2.0))
            .expect("pinch move");

        // The gesture selected slot 0, so tapping slot 1 swaps them.
        assert!(matches!(
            canvas.toggle_grid_selection(1).expect("tap"),
            GridTap::Swapped { from: 0, to: 1 }
        ));
        assert_eq!(canvas.slot(0).and_then(|s| s.photo.as_ref()).map(|p| p.id), Some(b));

        let result =
            controller.handle_gesture(&mut canvas, &viewport, target, &pinch(TouchPhase::End, 2.0));
        assert!(matches!(result, Err(CanvasError::ItemNotFound(_))));
        assert_eq!(controller.active_count(), 0);
        for id in [a, b] {
            let photo = canvas
                .grid_slots()
                .iter()
                .filter_map(|s| s.photo.as_ref())
                .find(|p| p.id == id)
                .expect("photo");
            assert!(approx(photo.scale, 1.0));
        }
    }

    #[test]
    fn cancel_all_commits_running_sessions() {
        let (mut canvas, id) = freeform_canvas();
        let viewport = Viewport::identity(&canvas.config());
        let mut controller = GestureController::new();
        controller
            .handle_touch(
                &mut canvas,
                &viewport,
                GestureTarget::Freeform(id),
                &touch(TouchPhase::Start, &[(1.0, 1.0)]),
            )
            .expect("start");
        assert_eq!(controller.cancel_all(&mut canvas), 1);
        assert_eq!(controller.active_count(), 0);
    }
}
