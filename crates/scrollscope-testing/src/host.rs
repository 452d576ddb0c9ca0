//! Scripted viewport host.
//!
//! Targets are placed in document space; `target_rect` answers in viewport
//! space by subtracting the current scroll offsets, so scrolling the script
//! moves every target the way a real viewport does.

use std::cell::{Cell, RefCell};

use rustc_hash::FxHashMap;
use scrollscope_core::{Point, Rect, Size, TargetId, ViewportHost};

pub struct TestViewportHost {
    scroll: Cell<Point>,
    viewport: Cell<Size>,
    document_rects: RefCell<FxHashMap<TargetId, Rect>>,
}

impl TestViewportHost {
    pub fn new(viewport: Size) -> Self {
        Self {
            scroll: Cell::new(Point::ZERO),
            viewport: Cell::new(viewport),
            document_rects: RefCell::new(FxHashMap::default()),
        }
    }

    /// Places a target at a fixed document-space rectangle.
    pub fn place_target(&self, target: TargetId, rect: Rect) {
        self.document_rects.borrow_mut().insert(target, rect);
    }

    /// Simulates the target being torn down by the host.
    pub fn remove_target(&self, target: TargetId) {
        self.document_rects.borrow_mut().remove(&target);
    }

    pub fn set_scroll(&self, x: f32, y: f32) {
        self.scroll.set(Point::new(x, y));
    }

    pub fn scroll_by(&self, dx: f32, dy: f32) {
        let current = self.scroll.get();
        self.scroll.set(Point::new(current.x + dx, current.y + dy));
    }

    pub fn set_viewport(&self, size: Size) {
        self.viewport.set(size);
    }
}

impl ViewportHost for TestViewportHost {
    fn scroll_offset(&self) -> Point {
        self.scroll.get()
    }

    fn viewport_size(&self) -> Size {
        self.viewport.get()
    }

    fn target_rect(&self, target: TargetId) -> Option<Rect> {
        let scroll = self.scroll.get();
        self.document_rects
            .borrow()
            .get(&target)
            .map(|rect| rect.translate(-scroll.x, -scroll.y))
    }
}
