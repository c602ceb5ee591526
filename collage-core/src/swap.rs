//! Drop-point hit testing for dragging a photo onto another grid slot.

use crate::canvas::{Canvas, Selection};
use crate::config::GridSpec;
use crate::geometry::{Point, Rect};
use crate::CanvasResult;

/// A completed drag swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOutcome {
    /// Slot the drag started in.
    pub from: usize,
    /// Slot the drag was released over.
    pub to: usize,
}

/// Map a release point to the slot under it.
///
/// `bounds` is the grid's bounding box in the same space as `release`.
/// Returns `None` when the point is outside the box, lands on a cell past
/// `slot_count`, or lands back on `source`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn resolve_drop_target(
    grid: GridSpec,
    slot_count: usize,
    bounds: Rect,
    release: Point,
    source: usize,
) -> Option<usize> {
    if !bounds.contains(release) {
        return None;
    }

    let cell = grid.cell_size(bounds.size());
    let relative = release.delta_from(bounds.origin());
    // Both ratios are non-negative because the point is inside the box.
    let col = ((relative.x / cell.width).floor() as usize).min(grid.cols - 1);
    let row = ((relative.y / cell.height).floor() as usize).min(grid.rows - 1);
    let target = grid.index_of(row, col);

    if target >= grid.capacity() || target >= slot_count || target == source {
        return None;
    }
    Some(target)
}

/// Finish a grid drag released at `release`: if it lands on another slot,
/// swap the two slots and move the selection to the target.
///
/// # Errors
///
/// Returns an error if `source` is not a slot of the canvas.
pub fn swap_on_release(
    canvas: &mut Canvas,
    grid_bounds: Rect,
    release: Point,
    source: usize,
) -> CanvasResult<Option<SwapOutcome>> {
    let Some(target) =
        resolve_drop_target(canvas.grid(), canvas.slot_count(), grid_bounds, release, source)
    else {
        return Ok(None);
    };

    canvas.swap_slots(source, target)?;
    canvas.select(Selection::Grid(target))?;
    tracing::debug!("Drag swap {source} -> {target}");
    Ok(Some(SwapOutcome {
        from: source,
        to: target,
    }))
}
