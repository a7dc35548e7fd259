//! Region store: committed regions plus at most one draft.
//!
//! Only the editor mutates the store; everything else reads it.

use datatrack_canvas::Color;

use crate::constants::editor::DEFAULT_PALETTE;
use crate::model::{BoundingBox, Point, Region, RegionId, RegionKind, RegionPayload};

/// The region under construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    /// Polygon vertices so far; `cursor` is the last pointer position.
    Polygon {
        vertices: Vec<Point>,
        cursor: Option<Point>,
    },
    /// Rectangle drag. `anchor` is unset until the primary button goes down.
    Rectangle {
        anchor: Option<Point>,
        current: Option<Point>,
    },
    /// A rectangle that passed the size check and is waiting for a name.
    PendingLabel { bounds: BoundingBox },
}

impl Draft {
    pub fn empty_polygon() -> Self {
        Draft::Polygon {
            vertices: Vec::new(),
            cursor: None,
        }
    }

    pub fn empty_rectangle() -> Self {
        Draft::Rectangle {
            anchor: None,
            current: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegionStore {
    committed: Vec<Region>,
    draft: Option<Draft>,
    next_id: RegionId,
    /// Round-robin palette cursor. Only ever advances.
    color_cursor: usize,
    palette: Vec<Color>,
    /// Bumped whenever the committed list changes.
    revision: u64,
    /// Set when anything visible changed since the last render.
    dirty: bool,
}

impl Default for RegionStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl RegionStore {
    /// Create an empty store. An empty palette falls back to the default one.
    pub fn new(palette: Vec<Color>) -> Self {
        let palette = if palette.is_empty() {
            default_palette()
        } else {
            palette
        };
        Self {
            committed: Vec::new(),
            draft: None,
            next_id: 1,
            color_cursor: 0,
            palette,
            revision: 0,
            dirty: true, // Start dirty so the first frame is drawn
        }
    }

    /// Committed regions in insertion order.
    pub fn committed(&self) -> &[Region] {
        &self.committed
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.committed.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    /// Changes on every commit, removal and clear.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag. Call after redrawing the overlay.
    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Region labels in insertion order, for correlating backend region keys.
    pub fn labels(&self) -> Vec<String> {
        self.committed.iter().map(|r| r.label.clone()).collect()
    }

    pub fn payload(&self) -> Vec<RegionPayload> {
        self.committed.iter().map(Region::to_payload).collect()
    }

    pub(crate) fn set_draft(&mut self, draft: Draft) {
        self.draft = Some(draft);
        self.mark_dirty();
    }

    pub(crate) fn draft_mut(&mut self) -> Option<&mut Draft> {
        self.dirty = true;
        self.draft.as_mut()
    }

    pub(crate) fn take_draft(&mut self) -> Option<Draft> {
        let draft = self.draft.take();
        if draft.is_some() {
            self.mark_dirty();
        }
        draft
    }

    /// Commit a finished shape. Blank labels become "Region N".
    pub(crate) fn commit(
        &mut self,
        vertices: Vec<Point>,
        label: Option<String>,
        kind: RegionKind,
    ) -> RegionId {
        let id = self.next_id;
        self.next_id += 1;

        let color = self.palette[self.color_cursor % self.palette.len()];
        self.color_cursor += 1;

        let label = label
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| Region::default_label(id));

        self.committed.push(Region {
            id,
            vertices,
            color,
            label,
            kind,
        });
        self.revision += 1;
        self.mark_dirty();
        id
    }

    /// Remove a region. Unknown ids are a no-op.
    pub(crate) fn remove(&mut self, id: RegionId) -> Option<Region> {
        let index = self.committed.iter().position(|r| r.id == id)?;
        let removed = self.committed.remove(index);
        self.revision += 1;
        self.mark_dirty();
        Some(removed)
    }

    /// Drop every committed region and the draft. Returns how many regions went.
    pub(crate) fn clear_all(&mut self) -> usize {
        let count = self.committed.len();
        self.committed.clear();
        self.draft = None;
        self.revision += 1;
        self.mark_dirty();
        count
    }
}

/// The built-in region palette.
pub fn default_palette() -> Vec<Color> {
    DEFAULT_PALETTE
        .iter()
        .filter_map(|hex| Color::from_hex(hex).ok())
        .collect()
}
