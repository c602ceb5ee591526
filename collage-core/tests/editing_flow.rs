//! Editing Flow Integration Tests
//!
//! Drives the canvas the way an editor screen does:
//! - Placing photos and overflowing a full grid
//! - Dragging a photo onto another slot
//! - Switching layout modes with selection handling
//! - Text overlays and the delete action

use collage_core::{
    Canvas, CanvasConfig, CanvasError, GestureController, GestureOutcome, GestureTarget, GridSpec,
    GridTap, ImageRef, LayoutMode, Placement, Point, Rect, Selection, TouchEvent, TouchPhase,
    TouchPoint, Viewport,
};

fn photo(name: &str) -> ImageRef {
    ImageRef::new(name, 1200, 900)
}

fn single_touch(phase: TouchPhase, x: f32, y: f32) -> TouchEvent {
    TouchEvent::new(phase, vec![TouchPoint::new(0, x, y)], 0)
}

fn slot_photo(canvas: &Canvas, index: usize) -> Option<collage_core::ItemId> {
    canvas.slot(index).and_then(|s| s.photo.as_ref()).map(|p| p.id)
}

// ============================================================================
// Grid placement
// ============================================================================

#[test]
fn test_full_grid_overflows_to_freeform() {
    let mut canvas = Canvas::default();
    canvas.set_grid_slot_count(2);

    assert_eq!(canvas.add_photo(photo("a")), Placement::Slot(0));
    assert_eq!(canvas.add_photo(photo("b")), Placement::Slot(1));
    let Placement::Freeform(extra) = canvas.add_photo(photo("c")) else {
        panic!("third photo should land on the freeform canvas");
    };

    assert_eq!(canvas.layout_mode(), LayoutMode::Grid);
    assert_eq!(canvas.freeform_items().len(), 1);
    assert_eq!(canvas.selection(), Selection::Freeform(extra));
    assert_eq!(canvas.freeform_item(extra).map(|p| p.position), Some(Point::CENTER));
    canvas.check_invariants().expect("invariants");
}

#[test]
fn test_shrinking_grid_moves_tail_photos() {
    let mut canvas = Canvas::default();
    canvas.set_grid_slot_count(6);
    for name in ["a", "b", "c", "d", "e", "f"] {
        canvas.add_photo(photo(name));
    }
    let tail: Vec<_> = (4..6).filter_map(|i| slot_photo(&canvas, i)).collect();
    canvas.select(Selection::Grid(5)).expect("select");

    let overflowed = canvas.set_grid_slot_count(4);
    assert_eq!(overflowed, tail);
    assert_eq!(canvas.grid(), GridSpec::new(2, 2));
    assert!(canvas.selection().is_none());
    assert_eq!(canvas.photo_count(), 6);
}

#[test]
fn test_explicit_layout_sets_slot_count() {
    let mut canvas = Canvas::default();
    canvas.apply_grid_layout("2x5".parse().expect("layout"));
    assert_eq!(canvas.slot_count(), 10);
    assert_eq!(canvas.grid(), GridSpec::new(2, 5));

    // Going back to a count restores the derived layout.
    canvas.set_grid_slot_count(10);
    assert_eq!(canvas.grid(), GridSpec::for_slot_count(10));
}

// ============================================================================
// Drag to swap
// ============================================================================

#[test]
fn test_drag_onto_empty_slot_swaps_and_selects_target() {
    let mut canvas = Canvas::new(CanvasConfig::new(1080, 1080));
    canvas.add_photo(photo("a"));
    let a = slot_photo(&canvas, 0).expect("photo a");

    // Canvas shown at half size with a 20pt margin.
    let viewport = Viewport::fit(&canvas.config(), Rect::new(0.0, 0.0, 580.0, 580.0), 20.0);
    let frame = viewport.frame();
    let mut controller = GestureController::new();
    let target = GestureTarget::Grid(0);

    let start = frame.origin().offset_by(Point::new(100.0, 100.0));
    let release = frame.origin().offset_by(Point::new(400.0, 400.0));

    controller
        .handle_touch(&mut canvas, &viewport, target, &single_touch(TouchPhase::Start, start.x, start.y))
        .expect("start");
    controller
        .handle_touch(&mut canvas, &viewport, target, &single_touch(TouchPhase::Move, release.x, release.y))
        .expect("move");
    let outcome = controller
        .handle_touch(&mut canvas, &viewport, target, &single_touch(TouchPhase::End, release.x, release.y))
        .expect("end");

    assert!(matches!(outcome, GestureOutcome::Swapped { .. }));
    assert_eq!(slot_photo(&canvas, 0), None);
    assert_eq!(slot_photo(&canvas, 3), Some(a));
    assert_eq!(canvas.selection(), Selection::Grid(3));
}

#[test]
fn test_tap_select_then_tap_other_swaps() {
    let mut canvas = Canvas::default();
    canvas.add_photo(photo("a"));
    canvas.add_photo(photo("b"));
    let (a, b) = (slot_photo(&canvas, 0), slot_photo(&canvas, 1));

    assert_eq!(canvas.toggle_grid_selection(0).expect("tap"), GridTap::Selected(0));
    assert_eq!(
        canvas.toggle_grid_selection(1).expect("tap"),
        GridTap::Swapped { from: 0, to: 1 }
    );
    assert_eq!(slot_photo(&canvas, 0), b);
    assert_eq!(slot_photo(&canvas, 1), a);
    assert!(canvas.selection().is_none());
}

#[test]
fn test_swap_out_of_range_is_rejected() {
    let mut canvas = Canvas::default();
    let err = canvas.swap_slots(0, 9).expect_err("out of range");
    assert!(matches!(err, CanvasError::SlotOutOfRange { index: 9, count: 4 }));
}

// ============================================================================
// Layout modes
// ============================================================================

#[test]
fn test_mode_round_trip_with_text() {
    let mut canvas = Canvas::default();
    canvas.add_photo(photo("a"));
    canvas.add_photo(photo("b"));
    let text = canvas.add_text_overlay();
    let ids = canvas.photo_ids();

    canvas.set_layout_mode(LayoutMode::Freeform).expect("changed");
    assert_eq!(canvas.text_items().len(), 1);
    assert_eq!(canvas.selection(), Selection::Freeform(ids[1]));

    canvas.set_layout_mode(LayoutMode::Grid).expect("changed");
    assert_eq!(canvas.photo_ids(), ids);
    assert!(canvas.text_item(text).is_some());
    canvas.check_invariants().expect("invariants");
}

// ============================================================================
// Text and deletion
// ============================================================================

#[test]
fn test_text_editing_and_delete() {
    let mut canvas = Canvas::default();
    let text = canvas.add_text_overlay();
    assert_eq!(canvas.selection(), Selection::Text(text));

    canvas.set_text_content(text, "Summer '24").expect("content");
    canvas.set_text_color(text, "#FF0000").expect("color");
    assert!(canvas.set_text_font(text, "Comic Sans").is_err());

    assert_eq!(canvas.remove_selected(), Some(text));
    assert!(canvas.text_items().is_empty());
    assert!(canvas.selection().is_none());
}

#[test]
fn test_json_round_trip_validates() {
    let mut canvas = Canvas::default();
    canvas.add_photo(photo("a"));
    canvas.add_text_overlay();
    let json = canvas.to_json().expect("serialize");
    let restored = Canvas::from_json(&json).expect("deserialize");
    assert_eq!(restored.photo_ids(), canvas.photo_ids());
    assert_eq!(restored.selection(), canvas.selection());
}
