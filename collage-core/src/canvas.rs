//! The canvas aggregate: every slot, photo, and text item of one editing
//! session, plus the current selection.
//!
//! All mutation goes through methods on [`Canvas`], which keep these
//! invariants after every call:
//!
//! - a photo ID lives in exactly one of the grid slots or the freeform list;
//! - slot `i` sits at row-major position `(i / cols, i % cols)` and the grid
//!   has at least as many cells as slots;
//! - the selection references a live slot or item, or is empty.
//!
//! Every effective mutation bumps [`Canvas::revision`] exactly once, so a
//! presentation layer can re-render per user action.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::{CanvasConfig, GridSpec, MAX_SLOT_COUNT};
use crate::element::{
    GridSlot, ImageRef, ItemId, PhotoItem, TextItem, AVAILABLE_FONTS, GRID_MAX_SCALE,
    GRID_MIN_SCALE, TEXT_MAX_SCALE, TEXT_MIN_SCALE,
};
use crate::geometry::{clamp, Point, Rect, Size};
use crate::layout::{self, ConversionReport};
use crate::{CanvasError, CanvasResult};

/// Slot count of a new session.
pub const DEFAULT_SLOT_COUNT: usize = 4;

/// Background color of a new session.
pub const DEFAULT_BACKGROUND: &str = "#FFFFFF";

/// How photos are arranged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Photos fill the cells of a row/column partition.
    #[default]
    Grid,
    /// Photos float freely over the canvas.
    Freeform,
}

/// What the user currently has selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "lowercase")]
pub enum Selection {
    /// Nothing selected.
    #[default]
    None,
    /// A grid slot, occupied or not.
    Grid(usize),
    /// A freeform photo.
    Freeform(ItemId),
    /// A text item.
    Text(ItemId),
}

impl Selection {
    /// Whether nothing is selected.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Where [`Canvas::place_photo_in_grid`] put a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Into the grid slot at this index.
    Slot(usize),
    /// Onto the freeform canvas because the grid was full.
    Freeform(ItemId),
}

/// Result of tapping a grid slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridTap {
    /// The slot became selected.
    Selected(usize),
    /// The already-selected slot was tapped again.
    Deselected(usize),
    /// A second slot was tapped; the two slots traded contents.
    Swapped {
        /// The previously selected slot.
        from: usize,
        /// The tapped slot.
        to: usize,
    },
}

/// The composition aggregate for one editing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Canvas {
    pub(crate) config: CanvasConfig,
    pub(crate) layout_mode: LayoutMode,
    pub(crate) grid: GridSpec,
    pub(crate) grid_slots: Vec<GridSlot>,
    pub(crate) freeform_items: Vec<PhotoItem>,
    pub(crate) text_items: Vec<TextItem>,
    pub(crate) selection: Selection,
    pub(crate) background_color: String,
    #[serde(skip)]
    revision: u64,
}

impl Canvas {
    /// Create an empty canvas in grid mode with [`DEFAULT_SLOT_COUNT`] slots.
    #[must_use]
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            config,
            layout_mode: LayoutMode::Grid,
            grid: GridSpec::for_slot_count(DEFAULT_SLOT_COUNT),
            grid_slots: (0..DEFAULT_SLOT_COUNT).map(GridSlot::empty).collect(),
            freeform_items: Vec::new(),
            text_items: Vec::new(),
            selection: Selection::None,
            background_color: DEFAULT_BACKGROUND.to_string(),
            revision: 0,
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    /// Canvas pixel dimensions.
    #[must_use]
    pub fn config(&self) -> CanvasConfig {
        self.config
    }

    /// Active layout mode.
    #[must_use]
    pub fn layout_mode(&self) -> LayoutMode {
        self.layout_mode
    }

    /// Row/column partition of the grid.
    #[must_use]
    pub fn grid(&self) -> GridSpec {
        self.grid
    }

    /// Number of grid slots.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.grid_slots.len()
    }

    /// All grid slots in index order.
    #[must_use]
    pub fn grid_slots(&self) -> &[GridSlot] {
        &self.grid_slots
    }

    /// One grid slot.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&GridSlot> {
        self.grid_slots.get(index)
    }

    /// Freeform photos in draw order.
    #[must_use]
    pub fn freeform_items(&self) -> &[PhotoItem] {
        &self.freeform_items
    }

    /// Text items in draw order.
    #[must_use]
    pub fn text_items(&self) -> &[TextItem] {
        &self.text_items
    }

    /// Current selection.
    #[must_use]
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Background color as hex.
    #[must_use]
    pub fn background_color(&self) -> &str {
        &self.background_color
    }

    /// Counter bumped once per effective mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Find a freeform photo.
    #[must_use]
    pub fn freeform_item(&self, id: ItemId) -> Option<&PhotoItem> {
        self.freeform_items.iter().find(|p| p.id == id)
    }

    /// Find a text item.
    #[must_use]
    pub fn text_item(&self, id: ItemId) -> Option<&TextItem> {
        self.text_items.iter().find(|t| t.id == id)
    }

    /// Total photos across grid slots and the freeform list.
    #[must_use]
    pub fn photo_count(&self) -> usize {
        self.grid_slots.iter().filter(|s| s.photo.is_some()).count() + self.freeform_items.len()
    }

    /// IDs of every photo, grid slots first in index order.
    #[must_use]
    pub fn photo_ids(&self) -> Vec<ItemId> {
        self.grid_slots
            .iter()
            .filter_map(|s| s.photo.as_ref().map(|p| p.id))
            .chain(self.freeform_items.iter().map(|p| p.id))
            .collect()
    }

    /// The whole canvas in canvas pixels; the grid covers exactly this.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        let size = self.config.size();
        Rect::new(0.0, 0.0, size.width, size.height)
    }

    /// Size of one grid cell in canvas pixels.
    #[must_use]
    pub fn slot_size(&self) -> Size {
        self.grid.cell_size(self.config.size())
    }

    // ------------------------------------------------------------------
    // Canvas-level settings
    // ------------------------------------------------------------------

    /// Change the canvas pixel size. Grid pans are re-clamped to the new
    /// cell size.
    pub fn set_config(&mut self, config: CanvasConfig) {
        if self.config == config {
            return;
        }
        self.config = config;
        self.reclamp_grid_offsets();
        self.touch();
    }

    /// Set the background color.
    pub fn set_background_color(&mut self, color: impl Into<String>) {
        let color = color.into();
        if self.background_color != color {
            self.background_color = color;
            self.touch();
        }
    }

    // ------------------------------------------------------------------
    // Grid structure
    // ------------------------------------------------------------------

    /// Resize the grid to `count` slots, clamped to
    /// `1..=`[`MAX_SLOT_COUNT`], using the derived row/column partition.
    ///
    /// Photos in slots past the new count move to the freeform list with
    /// freeform placement; their IDs are returned.
    pub fn set_grid_slot_count(&mut self, count: usize) -> Vec<ItemId> {
        let count = count.clamp(1, MAX_SLOT_COUNT);
        self.restructure_grid(GridSpec::for_slot_count(count), count)
    }

    /// Switch to an explicit `(rows, cols)` layout; the slot count becomes
    /// `rows * cols`. Both axes are clamped to [`crate::MAX_GRID_DIMENSION`].
    /// Overflow behaves as in [`Self::set_grid_slot_count`].
    pub fn apply_grid_layout(&mut self, grid: GridSpec) -> Vec<ItemId> {
        let grid = GridSpec::new(grid.rows, grid.cols);
        self.restructure_grid(grid, grid.capacity())
    }

    fn restructure_grid(&mut self, grid: GridSpec, count: usize) -> Vec<ItemId> {
        let current = self.grid_slots.len();
        if grid == self.grid && count == current {
            return Vec::new();
        }

        self.grid = grid;
        let mut overflowed = Vec::new();

        if count > current {
            self.grid_slots.extend((current..count).map(GridSlot::empty));
        } else {
            let removed = self.grid_slots.split_off(count);
            let photos: Vec<PhotoItem> = removed.into_iter().filter_map(|s| s.photo).collect();
            overflowed = layout::overflow_to_freeform(self, photos);
        }

        if let Selection::Grid(index) = self.selection {
            if index >= count {
                self.selection = Selection::None;
            }
        }

        self.reclamp_grid_offsets();
        tracing::debug!(
            "Grid resized to {count} slots ({grid}), {} photos overflowed",
            overflowed.len()
        );
        self.touch();
        overflowed
    }

    fn reclamp_grid_offsets(&mut self) {
        let slot = self.slot_size();
        for photo in self.grid_slots.iter_mut().filter_map(|s| s.photo.as_mut()) {
            photo.offset = photo.clamp_grid_offset(slot, photo.scale, photo.offset);
        }
    }

    // ------------------------------------------------------------------
    // Layout mode
    // ------------------------------------------------------------------

    /// Switch the photo layout mode, migrating photos between the grid and
    /// the freeform list.
    ///
    /// Returns `None` without touching anything when `mode` is already active.
    pub fn set_layout_mode(&mut self, mode: LayoutMode) -> Option<ConversionReport> {
        if self.layout_mode == mode {
            return None;
        }
        let report = layout::convert(self, mode);
        self.layout_mode = mode;
        tracing::debug!(
            "Layout mode -> {mode:?}: {} moved, {} residual",
            report.moved.len(),
            report.residual.len()
        );
        self.touch();
        Some(report)
    }

    // ------------------------------------------------------------------
    // Photos
    // ------------------------------------------------------------------

    /// Add a picked photo according to the active layout mode.
    pub fn add_photo(&mut self, image: ImageRef) -> Placement {
        match self.layout_mode {
            LayoutMode::Grid => self.place_photo_in_grid(image),
            LayoutMode::Freeform => Placement::Freeform(self.add_freeform_photo(image)),
        }
    }

    /// Put a photo into the selected slot (replacing its occupant), else the
    /// first empty slot. A full grid sends the photo to the freeform canvas.
    pub fn place_photo_in_grid(&mut self, image: ImageRef) -> Placement {
        let photo = PhotoItem::new(image);

        let target = match self.selection {
            Selection::Grid(index) if index < self.grid_slots.len() => Some(index),
            _ => self.grid_slots.iter().position(GridSlot::is_empty),
        };

        let Some(index) = target else {
            tracing::debug!("Grid full, placing photo on the freeform canvas");
            return Placement::Freeform(self.add_freeform_photo(photo.image));
        };

        if let Some(replaced) = self.grid_slots[index].photo.replace(photo) {
            tracing::debug!("Replaced photo {} in slot {index}", replaced.id);
        }
        if matches!(self.selection, Selection::Grid(_)) {
            self.selection = Selection::None;
        }
        self.touch();
        Placement::Slot(index)
    }

    /// Append a photo to the freeform canvas at the center with the default
    /// size, and select it.
    pub fn add_freeform_photo(&mut self, image: ImageRef) -> ItemId {
        let photo = PhotoItem::new(image);
        let id = photo.id;
        self.freeform_items.push(photo);
        self.selection = Selection::Freeform(id);
        self.touch();
        id
    }

    /// Commit a grid photo's zoom and pan. Scale is clamped to
    /// [`GRID_MIN_SCALE`]..=[`GRID_MAX_SCALE`] and the pan to what the zoomed
    /// photo can cover.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot does not exist or is empty.
    pub fn set_grid_photo_transform(
        &mut self,
        index: usize,
        scale: f32,
        offset: Point,
    ) -> CanvasResult<()> {
        let slot = self.slot_size();
        let count = self.grid_slots.len();
        let photo = self
            .grid_slots
            .get_mut(index)
            .ok_or(CanvasError::SlotOutOfRange { index, count })?
            .photo
            .as_mut()
            .ok_or_else(|| CanvasError::InvalidOperation(format!("slot {index} is empty")))?;

        let scale = clamp(scale, GRID_MIN_SCALE, GRID_MAX_SCALE);
        photo.offset = photo.clamp_grid_offset(slot, scale, offset);
        photo.scale = scale;
        self.touch();
        Ok(())
    }

    /// Commit a freeform photo's placement.
    ///
    /// # Errors
    ///
    /// Returns an error if no freeform photo has this ID.
    pub fn set_freeform_placement(
        &mut self,
        id: ItemId,
        position: Point,
        size: Size,
        rotation: f32,
    ) -> CanvasResult<()> {
        let photo = self
            .freeform_items
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CanvasError::ItemNotFound(id.to_string()))?;
        photo.position = position;
        photo.size = size;
        photo.rotation = rotation;
        self.touch();
        Ok(())
    }

    /// Swap the contents of two grid slots. Empty slots swap too.
    /// Selection is left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if either index is out of range.
    pub fn swap_slots(&mut self, a: usize, b: usize) -> CanvasResult<()> {
        let count = self.grid_slots.len();
        for index in [a, b] {
            if index >= count {
                return Err(CanvasError::SlotOutOfRange { index, count });
            }
        }
        if a != b {
            self.exchange(a, b);
            self.touch();
        }
        Ok(())
    }

    fn exchange(&mut self, a: usize, b: usize) {
        let taken = self.grid_slots[a].photo.take();
        let displaced = std::mem::replace(&mut self.grid_slots[b].photo, taken);
        self.grid_slots[a].photo = displaced;
        tracing::debug!("Swapped slots {a} and {b}");
    }

    /// Tap a grid slot: select it, deselect it, or swap it with the slot
    /// already selected.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    pub fn toggle_grid_selection(&mut self, index: usize) -> CanvasResult<GridTap> {
        let count = self.grid_slots.len();
        if index >= count {
            return Err(CanvasError::SlotOutOfRange { index, count });
        }

        let tap = match self.selection {
            Selection::Grid(selected) if selected == index => {
                self.selection = Selection::None;
                GridTap::Deselected(index)
            }
            Selection::Grid(selected) => {
                // A stale selection cannot survive a shrink, so `selected` is in range.
                self.exchange(selected, index);
                self.selection = Selection::None;
                GridTap::Swapped {
                    from: selected,
                    to: index,
                }
            }
            _ => {
                self.selection = Selection::Grid(index);
                GridTap::Selected(index)
            }
        };
        self.touch();
        Ok(tap)
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// Add a text overlay at the center with the default style, and select it.
    pub fn add_text_overlay(&mut self) -> ItemId {
        let text = TextItem::default();
        let id = text.id;
        self.text_items.push(text);
        self.selection = Selection::Text(id);
        self.touch();
        id
    }

    /// Remove a text overlay.
    ///
    /// # Errors
    ///
    /// Returns an error if no text item has this ID.
    pub fn remove_text_overlay(&mut self, id: ItemId) -> CanvasResult<TextItem> {
        let index = self
            .text_items
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CanvasError::ItemNotFound(id.to_string()))?;
        let removed = self.text_items.remove(index);
        if self.selection == Selection::Text(id) {
            self.selection = Selection::None;
        }
        self.touch();
        Ok(removed)
    }

    fn text_mut(&mut self, id: ItemId) -> CanvasResult<&mut TextItem> {
        self.text_items
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| CanvasError::ItemNotFound(id.to_string()))
    }

    /// Replace a text item's content.
    ///
    /// # Errors
    ///
    /// Returns an error if no text item has this ID.
    pub fn set_text_content(&mut self, id: ItemId, content: impl Into<String>) -> CanvasResult<()> {
        self.text_mut(id)?.content = content.into();
        self.touch();
        Ok(())
    }

    /// Set a text item's color.
    ///
    /// # Errors
    ///
    /// Returns an error if no text item has this ID.
    pub fn set_text_color(&mut self, id: ItemId, color: impl Into<String>) -> CanvasResult<()> {
        self.text_mut(id)?.color = color.into();
        self.touch();
        Ok(())
    }

    /// Set a text item's font, which must be one of [`AVAILABLE_FONTS`].
    ///
    /// # Errors
    ///
    /// Returns an error if the font is unknown or no text item has this ID.
    pub fn set_text_font(&mut self, id: ItemId, font_family: &str) -> CanvasResult<()> {
        if !AVAILABLE_FONTS.contains(&font_family) {
            return Err(CanvasError::InvalidOperation(format!(
                "unknown font: {font_family}"
            )));
        }
        self.text_mut(id)?.font_family = font_family.to_string();
        self.touch();
        Ok(())
    }

    /// Commit a text item's placement. Scale is clamped to
    /// [`TEXT_MIN_SCALE`]..=[`TEXT_MAX_SCALE`].
    ///
    /// # Errors
    ///
    /// Returns an error if no text item has this ID.
    pub fn set_text_transform(
        &mut self,
        id: ItemId,
        position: Point,
        scale: f32,
        rotation: f32,
    ) -> CanvasResult<()> {
        let text = self.text_mut(id)?;
        text.position = position;
        text.scale = clamp(scale, TEXT_MIN_SCALE, TEXT_MAX_SCALE);
        text.rotation = rotation;
        self.touch();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Whether `selection` references a live slot or item.
    #[must_use]
    pub fn is_live(&self, selection: Selection) -> bool {
        match selection {
            Selection::None => true,
            Selection::Grid(index) => index < self.grid_slots.len(),
            Selection::Freeform(id) => self.freeform_item(id).is_some(),
            Selection::Text(id) => self.text_item(id).is_some(),
        }
    }

    /// Select a slot or item.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection does not reference anything live.
    pub fn select(&mut self, selection: Selection) -> CanvasResult<()> {
        if !self.is_live(selection) {
            return Err(CanvasError::InvalidSelection(format!("{selection:?}")));
        }
        if self.selection != selection {
            self.selection = selection;
            self.touch();
        }
        Ok(())
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        if !self.selection.is_none() {
            self.selection = Selection::None;
            self.touch();
        }
    }

    /// Re-apply a previously captured selection. A selection whose target
    /// has since been removed is dropped. Returns what ended up selected.
    pub fn restore_selection(&mut self, previous: Selection) -> Selection {
        let restored = if self.is_live(previous) {
            previous
        } else {
            tracing::debug!("Dropping stale selection {previous:?}");
            Selection::None
        };
        if self.selection != restored {
            self.selection = restored;
            self.touch();
        }
        restored
    }

    /// Delete whatever is selected: a grid photo (the slot stays), a freeform
    /// photo, or a text item. Returns the removed item's ID.
    pub fn remove_selected(&mut self) -> Option<ItemId> {
        let removed = match self.selection {
            Selection::None => None,
            Selection::Grid(index) => self
                .grid_slots
                .get_mut(index)
                .and_then(|slot| slot.photo.take())
                .map(|p| p.id),
            Selection::Freeform(id) => {
                let before = self.freeform_items.len();
                self.freeform_items.retain(|p| p.id != id);
                (self.freeform_items.len() != before).then_some(id)
            }
            Selection::Text(id) => {
                let before = self.text_items.len();
                self.text_items.retain(|t| t.id != id);
                (self.text_items.len() != before).then_some(id)
            }
        };
        if !self.selection.is_none() {
            self.selection = Selection::None;
            self.touch();
        }
        removed
    }

    // ------------------------------------------------------------------
    // Integrity and serialization
    // ------------------------------------------------------------------

    /// Check every aggregate invariant.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvariantViolation`] describing the first
    /// broken invariant.
    pub fn check_invariants(&self) -> CanvasResult<()> {
        let violation = |msg: String| Err(CanvasError::InvariantViolation(msg));

        if !self.config.is_valid() {
            return violation(format!("canvas size {} out of range", self.config));
        }
        if self.grid_slots.is_empty() {
            return violation("grid has no slots".to_string());
        }
        if !self.grid.is_valid() || self.grid_slots.len() > MAX_SLOT_COUNT {
            return violation(format!("grid {} out of range", self.grid));
        }
        if self.grid.capacity() < self.grid_slots.len() {
            return violation(format!(
                "grid {} cannot hold {} slots",
                self.grid,
                self.grid_slots.len()
            ));
        }
        if let Some(slot) = self
            .grid_slots
            .iter()
            .enumerate()
            .find(|(i, s)| s.index != *i)
        {
            return violation(format!("slot at position {} has index {}", slot.0, slot.1.index));
        }

        let mut seen = HashSet::new();
        for id in self.photo_ids() {
            if !seen.insert(id) {
                return violation(format!("photo {id} appears more than once"));
            }
        }
        let mut seen_text = HashSet::new();
        for text in &self.text_items {
            if !seen_text.insert(text.id) {
                return violation(format!("text {} appears more than once", text.id));
            }
        }

        if !self.is_live(self.selection) {
            return violation(format!("stale selection {:?}", self.selection));
        }
        Ok(())
    }

    /// Serialize the canvas to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CanvasResult<String> {
        serde_json::to_string(self).map_err(CanvasError::Serialization)
    }

    /// Deserialize and validate a canvas from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the canvas breaks an
    /// invariant.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let canvas: Self = serde_json::from_str(json)?;
        canvas.check_invariants()?;
        Ok(canvas)
    }

    pub(crate) fn touch(&mut self) {
        self.revision += 1;
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}
