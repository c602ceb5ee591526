//! Migration of photos between grid slots and the freeform canvas.
//!
//! Both directions keep every photo's ID and never drop or duplicate a
//! photo. Freeform → grid stops when the slots run out; whatever is left
//! stays on the freeform canvas even though grid mode is now active.

use crate::canvas::{Canvas, LayoutMode, Selection};
use crate::element::{ItemId, PhotoItem};

/// What a layout mode switch did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    /// Photos that changed collection, in the order they were moved.
    pub moved: Vec<ItemId>,
    /// Freeform photos left in place because no slot was free.
    pub residual: Vec<ItemId>,
}

/// Migrate the canvas's photos toward `target`. The caller records the new
/// mode.
pub(crate) fn convert(canvas: &mut Canvas, target: LayoutMode) -> ConversionReport {
    match target {
        LayoutMode::Freeform => grid_to_freeform(canvas),
        LayoutMode::Grid => freeform_to_grid(canvas),
    }
}

/// Every occupied slot's photo moves to the end of the freeform list in slot
/// order; the slots empty out and the last moved photo becomes selected.
fn grid_to_freeform(canvas: &mut Canvas) -> ConversionReport {
    let photos: Vec<PhotoItem> = canvas
        .grid_slots
        .iter_mut()
        .filter_map(|slot| slot.photo.take())
        .collect();

    if matches!(canvas.selection, Selection::Grid(_)) {
        canvas.selection = Selection::None;
    }

    let moved = overflow_to_freeform(canvas, photos);
    if let Some(last) = moved.last() {
        canvas.selection = Selection::Freeform(*last);
    }

    ConversionReport {
        moved,
        residual: Vec::new(),
    }
}

/// Freeform photos fill the empty slots in index order, consumed from the
/// front of the freeform list. Photos already sitting in a slot stay put.
fn freeform_to_grid(canvas: &mut Canvas) -> ConversionReport {
    let mut pending = std::mem::take(&mut canvas.freeform_items).into_iter();
    let mut moved = Vec::new();

    for slot in canvas.grid_slots.iter_mut().filter(|slot| slot.is_empty()) {
        let Some(photo) = pending.next() else {
            break;
        };
        moved.push(photo.id);
        slot.photo = Some(photo.with_default_placement());
    }

    canvas.freeform_items = pending.collect();
    let residual: Vec<ItemId> = canvas.freeform_items.iter().map(|p| p.id).collect();

    match canvas.selection {
        Selection::Grid(_) => canvas.selection = Selection::None,
        Selection::Freeform(id) if moved.contains(&id) => canvas.selection = Selection::None,
        _ => {}
    }

    ConversionReport { moved, residual }
}

/// Append grid photos to the freeform list with freeform placement. Returns
/// their IDs in order.
pub(crate) fn overflow_to_freeform(canvas: &mut Canvas, photos: Vec<PhotoItem>) -> Vec<ItemId> {
    let mut ids = Vec::with_capacity(photos.len());
    for photo in photos {
        ids.push(photo.id);
        canvas.freeform_items.push(photo.with_default_placement());
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ImageRef;
    use crate::geometry::Point;

    fn image(name: &str) -> ImageRef {
        ImageRef::new(name, 800, 600)
    }

    #[test]
    fn grid_to_freeform_moves_in_slot_order() {
        let mut canvas = Canvas::default();
        canvas.place_photo_in_grid(image("a"));
        canvas.place_photo_in_grid(image("b"));
        canvas.swap_slots(1, 3).expect("swap");
        let ids = canvas.photo_ids();

        let report = canvas.set_layout_mode(LayoutMode::Freeform).expect("changed");
        assert_eq!(report.moved, ids);
        assert!(canvas.grid_slots().iter().all(|s| s.is_empty()));
        assert_eq!(canvas.slot_count(), 4);
        assert_eq!(canvas.selection(), Selection::Freeform(ids[1]));
        for photo in canvas.freeform_items() {
            assert_eq!(photo.position, Point::CENTER);
            assert!(photo.rotation.abs() < f32::EPSILON);
        }
    }

    #[test]
    fn freeform_to_grid_leaves_residual_items() {
        let mut canvas = Canvas::default();
        canvas.set_grid_slot_count(2);
        canvas.set_layout_mode(LayoutMode::Freeform);
        let ids: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|name| canvas.add_freeform_photo(image(name)))
            .collect();

        let report = canvas.set_layout_mode(LayoutMode::Grid).expect("changed");
        assert_eq!(report.moved, ids[..2].to_vec());
        assert_eq!(report.residual, vec![ids[2]]);
        assert_eq!(canvas.freeform_items().len(), 1);
        assert_eq!(canvas.photo_count(), 3);
        // The residual photo was the selected one and is still live.
        assert_eq!(canvas.selection(), Selection::Freeform(ids[2]));
        canvas.check_invariants().expect("invariants");
    }

    #[test]
    fn freeform_to_grid_keeps_existing_occupants() {
        let mut canvas = Canvas::default();
        canvas.set_layout_mode(LayoutMode::Freeform);
        canvas.place_photo_in_grid(image("pinned"));
        let pinned = canvas.photo_ids()[0];
        let loose = canvas.add_freeform_photo(image("loose"));

        canvas.set_layout_mode(LayoutMode::Grid);
        assert_eq!(canvas.slot(0).and_then(|s| s.photo.as_ref()).map(|p| p.id), Some(pinned));
        assert_eq!(canvas.slot(1).and_then(|s| s.photo.as_ref()).map(|p| p.id), Some(loose));
        assert!(canvas.selection().is_none());
    }

    #[test]
    fn same_mode_is_a_no_op() {
        let mut canvas = Canvas::default();
        canvas.place_photo_in_grid(image("a"));
        canvas.select(Selection::Grid(0)).expect("select");
        let revision = canvas.revision();
        assert!(canvas.set_layout_mode(LayoutMode::Grid).is_none());
        assert_eq!(canvas.revision(), revision);
        assert_eq!(canvas.selection(), Selection::Grid(0));
    }
}
