// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Region editor — owns the regions of every page, the current selection,
// the active pointer gesture, and the undo history.

use blackbar_core::error::BlackbarError;
use blackbar_core::{RedactConfig, Region, RegionColor, RegionId};
use tracing::{debug, info};

use crate::annotate::geometry::{Frame, PixelRect, Point, region_frame, region_from_rect, to_pixel_space};
use crate::annotate::gesture::{Gesture, GestureOutcome};
use crate::annotate::hit::{Hit, hit_test};
use crate::annotate::history::EditHistory;

/// Regions of every page, indexed by `page - 1`, each in z-order.
pub type RegionSet = Vec<Vec<Region>>;

/// Interactive region state for one loaded document.
#[derive(Debug)]
pub struct RegionEditor {
    pages: RegionSet,
    history: EditHistory<RegionSet>,
    selected: Option<RegionId>,
    gesture: Gesture,
    min_region_px: f64,
    handle_radius_px: f64,
    colors_used: usize,
}

impl RegionEditor {
    pub fn new(config: &RedactConfig) -> Self {
        let mut history = EditHistory::new(config.history_limit);
        history.reset(Vec::new());
        Self {
            pages: Vec::new(),
            history,
            selected: None,
            gesture: Gesture::Idle,
            min_region_px: config.min_region_px,
            handle_radius_px: config.handle_hit_radius_px,
            colors_used: 0,
        }
    }

    /// Start over for a newly loaded document.
    pub fn reset(&mut self, page_count: u32) {
        self.pages = vec![Vec::new(); page_count as usize];
        self.history.reset(self.pages.clone());
        self.selected = None;
        self.gesture = Gesture::Idle;
        self.colors_used = 0;
        debug!(page_count, "Region editor reset");
    }

    // -- Queries --------------------------------------------------------------

    pub fn pages(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn regions_for_page(&self, page: u32) -> &[Region] {
        page.checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every page's regions, in page order. What export consumes.
    pub fn all_regions(&self) -> &[Vec<Region>] {
        &self.pages
    }

    pub fn total_regions(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.pages.iter().flatten().find(|r| r.id == id)
    }

    /// 1-based position of a region within its page.
    pub fn region_number(&self, id: RegionId) -> Option<usize> {
        self.pages
            .iter()
            .find_map(|page| page.iter().position(|r| r.id == id))
            .map(|i| i + 1)
    }

    pub fn selected(&self) -> Option<RegionId> {
        self.selected
    }

    pub fn select(&mut self, id: Option<RegionId>) {
        self.selected = id.filter(|id| self.region(*id).is_some());
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // -- Committed mutations --------------------------------------------------

    /// Add a region. Assigns the next palette colour if it has none.
    pub fn add_region(&mut self, mut region: Region) -> Result<RegionId, BlackbarError> {
        let index = self.page_index(region.page)?;
        if !(region.page_width > 0.0 && region.page_height > 0.0) {
            return Err(BlackbarError::InvalidRegion(format!(
                "region on page {} has no reference frame",
                region.page
            )));
        }
        region.clamp_to_frame();
        if !has_area(&region) {
            return Err(BlackbarError::InvalidRegion(format!(
                "region on page {} has no area inside the page",
                region.page
            )));
        }
        if region.color.is_none() {
            region.color = Some(RegionColor::for_index(self.colors_used));
            self.colors_used += 1;
        }

        let id = region.id;
        debug!(%id, page = region.page, "Region added");
        self.pages[index].push(region);
        self.commit();
        Ok(id)
    }

    pub fn remove_region(&mut self, id: RegionId) -> bool {
        let before = self.total_regions();
        for page in &mut self.pages {
            page.retain(|r| r.id != id);
        }
        if self.total_regions() == before {
            return false;
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.commit();
        true
    }

    /// Remove every region on one page, returning how many went.
    pub fn clear_page(&mut self, page: u32) -> usize {
        let Ok(index) = self.page_index(page) else {
            return 0;
        };
        let removed = std::mem::take(&mut self.pages[index]).len();
        if removed > 0 {
            self.drop_stale_selection();
            self.commit();
        }
        removed
    }

    pub fn clear_all(&mut self) {
        if self.total_regions() == 0 {
            return;
        }
        self.pages.iter_mut().for_each(Vec::clear);
        self.selected = None;
        self.commit();
        info!("All regions cleared");
    }

    /// Replace a region's geometry with `rect`, given in the pixel space of
    /// `frame`. The region keeps its own reference frame.
    pub fn update_region(&mut self, id: RegionId, rect: PixelRect, frame: Frame) -> bool {
        let Some(region) = self.pages.iter_mut().flatten().find(|r| r.id == id) else {
            return false;
        };
        let mapped = rect.rescale(frame, region_frame(region));
        let mut candidate = region.clone();
        candidate.x = mapped.x;
        candidate.y = mapped.y;
        candidate.width = mapped.width;
        candidate.height = mapped.height;
        candidate.clamp_to_frame();
        if !has_area(&candidate) {
            debug!(%id, "Update would leave region without area; ignored");
            return false;
        }
        *region = candidate;
        self.commit();
        true
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.pages = snapshot.clone();
                self.drop_stale_selection();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.pages = snapshot.clone();
                self.drop_stale_selection();
                true
            }
            None => false,
        }
    }

    // -- Pointer gestures -----------------------------------------------------

    /// Begin a gesture at `point` on `page`, whose raster is `frame` pixels.
    pub fn pointer_down(&mut self, page: u32, point: Point, frame: Frame) -> Hit {
        if self.page_index(page).is_err() {
            return Hit::Empty;
        }
        let hit = hit_test(
            point,
            self.regions_for_page(page),
            self.selected,
            frame,
            self.handle_radius_px,
        );

        self.gesture = match hit {
            Hit::Handle { id, corner } => match self.region(id) {
                Some(region) => Gesture::resize(
                    id,
                    frame,
                    corner,
                    to_pixel_space(region, frame.width, frame.height),
                ),
                None => Gesture::Idle,
            },
            Hit::Body { id } => {
                self.selected = Some(id);
                match self.region(id) {
                    Some(region) => Gesture::move_region(
                        id,
                        frame,
                        point,
                        to_pixel_space(region, frame.width, frame.height),
                    ),
                    None => Gesture::Idle,
                }
            }
            Hit::Empty => {
                self.selected = None;
                Gesture::draw(page, frame, point)
            }
        };
        hit
    }

    pub fn pointer_move(&mut self, point: Point) {
        self.gesture.update(point);
    }

    /// Finish the gesture and commit its result. Returns the region that was
    /// created, moved or resized.
    pub fn pointer_up(&mut self, point: Point) -> Option<RegionId> {
        match std::mem::take(&mut self.gesture).finish(point) {
            GestureOutcome::None => None,
            GestureOutcome::Draw { page, rect, frame } => {
                if rect.width < self.min_region_px || rect.height < self.min_region_px {
                    debug!(
                        width = rect.width,
                        height = rect.height,
                        "Discarding region below minimum size"
                    );
                    return None;
                }
                let id = self.add_region(region_from_rect(page, rect, frame)).ok()?;
                self.selected = Some(id);
                Some(id)
            }
            GestureOutcome::Move { id, rect, frame } | GestureOutcome::Resize { id, rect, frame } => {
                if rect.width < self.min_region_px || rect.height < self.min_region_px {
                    debug!(%id, "Ignoring resize below minimum size");
                    return None;
                }
                self.update_region(id, rect, frame).then_some(id)
            }
        }
    }

    /// Live feedback rectangle for the active gesture.
    pub fn preview_rect(&self) -> Option<PixelRect> {
        self.gesture.preview_rect()
    }

    /// The id the active move/resize gesture is editing.
    pub fn gesture_target(&self) -> Option<RegionId> {
        match &self.gesture {
            Gesture::Moving { id, .. } | Gesture::Resizing { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn cancel_gesture(&mut self) {
        self.gesture = Gesture::Idle;
    }

    // -- Internals ------------------------------------------------------------

    fn page_index(&self, page: u32) -> Result<usize, BlackbarError> {
        page.checked_sub(1)
            .map(|i| i as usize)
            .filter(|i| *i < self.pages.len())
            .ok_or_else(|| {
                BlackbarError::InvalidRegion(format!(
                    "page {page} is outside 1..={}",
                    self.pages.len()
                ))
            })
    }

    fn commit(&mut self) {
        self.history.commit(self.pages.clone());
    }

    fn drop_stale_selection(&mut self) {
        if let Some(id) = self.selected {
            if self.region(id).is_none() {
                self.selected = None;
            }
        }
    }
}

/// Committed regions always cover some of their page.
fn has_area(region: &Region) -> bool {
    region.width > 0.0 && region.height > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Frame = Frame::new(100.0, 100.0);

    fn editor(pages: u32) -> RegionEditor {
        let mut editor = RegionEditor::new(&RedactConfig::default());
        editor.reset(pages);
        editor
    }

    fn region(page: u32, x: f64) -> Region {
        Region::new(page, x, 10.0, 20.0, 20.0, 100.0, 100.0)
    }

    fn draw(editor: &mut RegionEditor, page: u32, from: (f64, f64), to: (f64, f64)) -> Option<RegionId> {
        editor.pointer_down(page, Point::new(from.0, from.1), FRAME);
        editor.pointer_move(Point::new(to.0, to.1));
        editor.pointer_up(Point::new(to.0, to.1))
    }

    #[test]
    fn small_drawings_are_discarded_without_history() {
        let mut editor = editor(1);
        assert!(draw(&mut editor, 1, (10.0, 10.0), (14.0, 50.0)).is_none());
        assert!(draw(&mut editor, 1, (10.0, 10.0), (50.0, 14.9)).is_none());
        assert_eq!(editor.total_regions(), 0);
        assert!(!editor.can_undo());

        assert!(draw(&mut editor, 1, (10.0, 10.0), (15.0, 15.0)).is_some());
        assert_eq!(editor.total_regions(), 1);
    }

    #[test]
    fn intermediate_moves_are_not_history_entries() {
        let mut editor = editor(1);
        let id = editor.add_region(region(1, 10.0)).unwrap();

        editor.pointer_down(1, Point::new(15.0, 15.0), FRAME);
        for step in 0..20 {
            editor.pointer_move(Point::new(15.0 + f64::from(step), 15.0));
        }
        assert_eq!(editor.pointer_up(Point::new(35.0, 15.0)), Some(id));
        assert_eq!(editor.region(id).unwrap().x, 30.0);

        assert!(editor.undo());
        assert_eq!(editor.region(id).unwrap().x, 10.0);
        assert!(editor.undo());
        assert_eq!(editor.total_regions(), 0);
        assert!(!editor.undo());
    }

    #[test]
    fn undo_twice_then_add_discards_redo() {
        let mut editor = editor(1);
        for x in [0.0, 25.0, 50.0] {
            editor.add_region(region(1, x)).unwrap();
        }
        assert!(editor.undo());
        assert!(editor.undo());
        editor.add_region(region(1, 70.0)).unwrap();
        assert!(!editor.redo());
        assert_eq!(editor.total_regions(), 2);
    }

    #[test]
    fn sixty_adds_leave_49_undos() {
        let mut editor = editor(1);
        for i in 0..60 {
            editor.add_region(region(1, f64::from(i))).unwrap();
        }
        let mut undone = 0;
        while editor.undo() {
            undone += 1;
        }
        assert_eq!(undone, 49);
        assert_eq!(editor.total_regions(), 11);
    }

    #[test]
    fn numbering_and_colours_per_page() {
        let mut editor = editor(2);
        let a = editor.add_region(region(1, 0.0)).unwrap();
        let b = editor.add_region(region(1, 40.0)).unwrap();
        let c = editor.add_region(region(2, 0.0)).unwrap();
        assert_eq!(editor.region_number(a), Some(1));
        assert_eq!(editor.region_number(b), Some(2));
        assert_eq!(editor.region_number(c), Some(1));
        assert_ne!(editor.region(a).unwrap().color, editor.region(b).unwrap().color);
    }

    #[test]
    fn out_of_range_page_is_rejected() {
        let mut editor = editor(1);
        assert!(matches!(
            editor.add_region(region(2, 0.0)),
            Err(BlackbarError::InvalidRegion(_))
        ));
        assert!(matches!(
            editor.add_region(region(0, 0.0)),
            Err(BlackbarError::InvalidRegion(_))
        ));
    }

    #[test]
    fn region_outside_the_page_is_rejected() {
        let mut editor = editor(1);
        let err = editor
            .add_region(Region::new(1, 150.0, 10.0, 20.0, 20.0, 100.0, 100.0))
            .unwrap_err();
        assert!(matches!(err, BlackbarError::InvalidRegion(_)));
        assert!(editor
            .add_region(Region::new(1, 10.0, 10.0, 0.0, 20.0, 100.0, 100.0))
            .is_err());
        assert_eq!(editor.total_regions(), 0);
        assert!(!editor.can_undo());
    }

    #[test]
    fn update_off_the_page_keeps_old_geometry() {
        let mut editor = editor(1);
        let id = editor.add_region(region(1, 10.0)).unwrap();
        assert!(!editor.update_region(id, PixelRect::new(120.0, 10.0, 20.0, 20.0), FRAME));

        let r = editor.region(id).unwrap();
        assert_eq!((r.x, r.width), (10.0, 20.0));
        assert!(editor.undo());
        assert!(!editor.can_undo());
    }

    #[test]
    fn clear_page_and_clear_all_are_single_entries() {
        let mut editor = editor(2);
        editor.add_region(region(1, 0.0)).unwrap();
        editor.add_region(region(2, 0.0)).unwrap();
        editor.add_region(region(2, 40.0)).unwrap();

        assert_eq!(editor.clear_page(2), 2);
        assert_eq!(editor.total_regions(), 1);
        editor.clear_all();
        assert_eq!(editor.total_regions(), 0);

        assert!(editor.undo());
        assert_eq!(editor.total_regions(), 1);
        assert!(editor.undo());
        assert_eq!(editor.total_regions(), 3);
    }

    #[test]
    fn resize_through_selected_handle() {
        let mut editor = editor(1);
        let id = editor.add_region(region(1, 10.0)).unwrap();
        editor.select(Some(id));

        assert!(matches!(
            editor.pointer_down(1, Point::new(30.0, 30.0), FRAME),
            Hit::Handle { .. }
        ));
        editor.pointer_move(Point::new(60.0, 50.0));
        assert_eq!(editor.preview_rect(), Some(PixelRect::new(10.0, 10.0, 50.0, 40.0)));
        editor.pointer_up(Point::new(60.0, 50.0));

        let r = editor.region(id).unwrap();
        assert_eq!((r.width, r.height), (50.0, 40.0));
    }

    #[test]
    fn updates_map_back_into_region_frame() {
        let mut editor = editor(1);
        let id = editor.add_region(region(1, 10.0)).unwrap();
        // Edited on a raster twice the size it was drawn on.
        assert!(editor.update_region(id, PixelRect::new(40.0, 40.0, 20.0, 20.0), Frame::new(200.0, 200.0)));
        let r = editor.region(id).unwrap();
        assert_eq!((r.x, r.y, r.width, r.height), (20.0, 20.0, 10.0, 10.0));
        assert_eq!((r.page_width, r.page_height), (100.0, 100.0));
    }

    #[test]
    fn undo_clears_selection_of_vanished_region() {
        let mut editor = editor(1);
        let id = draw(&mut editor, 1, (10.0, 10.0), (40.0, 40.0)).unwrap();
        assert_eq!(editor.selected(), Some(id));
        editor.undo();
        assert_eq!(editor.selected(), None);
    }

    #[test]
    fn reset_clears_regions_and_history() {
        let mut editor = editor(1);
        editor.add_region(region(1, 0.0)).unwrap();
        editor.reset(3);
        assert_eq!(editor.pages(), 3);
        assert_eq!(editor.total_regions(), 0);
        assert!(!editor.can_undo());
    }
}
