//! Viewport Controller
//!
//! Pan/zoom state of the timeline and the virtualization window. Time is
//! passed in by the caller so the controller stays deterministic under test.

use std::time::{Duration, Instant};

use serde::Serialize;

use super::position::{PositionMap, Rect};
use crate::config::ViewportParams;

/// Cells of context kept left of the first item by `scroll_to_first`
const LEAD_CELLS: f64 = 2.0;

/// Snapshot handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportState {
    pub visible_start: f64,
    pub visible_end: f64,
    pub container_width: f64,
    pub scroll_position: f64,
    pub is_scrolling: bool,
    pub cell_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    /// Pressed but not moved past the threshold yet
    Pending { origin: f64 },
    Dragging { anchor: f64 },
}

#[derive(Debug, Clone)]
pub struct ViewportController {
    params: ViewportParams,
    cell_width: f64,
    scroll: f64,
    container_width: f64,
    content_width: f64,
    is_scrolling: bool,
    last_scroll_event: Option<Instant>,
    last_activity: Option<Instant>,
    drag: DragState,
}

impl ViewportController {
    pub fn new(params: ViewportParams, cell_width: f64) -> Self {
        Self {
            cell_width: cell_width.clamp(params.min_cell_width, params.max_cell_width),
            params,
            scroll: 0.0,
            container_width: 0.0,
            content_width: 0.0,
            is_scrolling: false,
            last_scroll_event: None,
            last_activity: None,
            drag: DragState::Idle,
        }
    }

    pub fn cell_width(&self) -> f64 {
        self.cell_width
    }

    pub fn scroll_position(&self) -> f64 {
        self.scroll
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Largest valid scroll offset
    pub fn max_scroll(&self) -> f64 {
        (self.content_width - self.container_width).max(0.0)
    }

    fn clamp_scroll(&self, value: f64) -> f64 {
        value.clamp(0.0, self.max_scroll())
    }

    fn touch(&mut self, now: Instant) {
        self.is_scrolling = true;
        self.last_activity = Some(now);
    }

    pub fn resize(&mut self, container_width: f64) {
        self.container_width = container_width.max(0.0);
        self.scroll = self.clamp_scroll(self.scroll);
    }

    /// Total width of the laid-out timeline; re-clamps the scroll offset
    pub fn set_content_width(&mut self, content_width: f64) {
        self.content_width = content_width.max(0.0);
        self.scroll = self.clamp_scroll(self.scroll);
    }

    /// Native scroll event. Returns `false` when the event was throttled away.
    pub fn on_scroll(&mut self, scroll_left: f64, now: Instant) -> bool {
        let throttle = Duration::from_millis(self.params.throttle_ms);
        if let Some(last) = self.last_scroll_event {
            if now.saturating_duration_since(last) < throttle {
                return false;
            }
        }
        self.last_scroll_event = Some(now);
        self.scroll = self.clamp_scroll(scroll_left);
        self.touch(now);
        true
    }

    /// Clear `is_scrolling` once the interaction has been quiet long enough.
    /// Returns `true` when the flag changed.
    pub fn settle(&mut self, now: Instant) -> bool {
        let quiet = Duration::from_millis(self.params.scroll_settle_ms);
        match self.last_activity {
            Some(last) if self.is_scrolling && now.saturating_duration_since(last) >= quiet => {
                self.is_scrolling = false;
                true
            }
            _ => false,
        }
    }

    pub fn pointer_down(&mut self, x: f64) {
        self.drag = DragState::Pending { origin: x };
    }

    /// Pointer moved. Returns `true` when the scroll offset changed.
    pub fn pointer_move(&mut self, x: f64, now: Instant) -> bool {
        let anchor = match self.drag {
            DragState::Idle => return false,
            DragState::Pending { origin } => {
                if (x - origin).abs() <= self.params.drag_threshold_px {
                    return false;
                }
                origin
            }
            DragState::Dragging { anchor } => anchor,
        };
        self.drag = DragState::Dragging { anchor: x };

        let before = self.scroll;
        self.scroll = self.clamp_scroll(self.scroll - (x - anchor));
        self.touch(now);
        self.scroll != before
    }

    pub fn pointer_up(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Returns `true` when the cell width changed and a relayout is needed
    pub fn zoom_in(&mut self) -> bool {
        self.set_cell_width(self.cell_width + self.params.zoom_step)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_cell_width(self.cell_width - self.params.zoom_step)
    }

    pub fn set_cell_width(&mut self, cell_width: f64) -> bool {
        let next = cell_width.clamp(self.params.min_cell_width, self.params.max_cell_width);
        let changed = next != self.cell_width;
        self.cell_width = next;
        changed
    }

    pub fn scroll_to(&mut self, offset: f64) {
        self.scroll = self.clamp_scroll(offset);
    }

    /// Move by `pan_cells` cells; negative `steps` pans left
    pub fn pan(&mut self, steps: i32) {
        let delta = f64::from(steps) * f64::from(self.params.pan_cells) * self.cell_width;
        self.scroll_to(self.scroll + delta);
    }

    /// Put `offset` in the middle of the container
    pub fn center_on(&mut self, offset: f64) {
        self.scroll_to(offset - self.container_width / 2.0);
    }

    /// Scroll so the leftmost placed item is visible with a little context.
    /// Returns the new offset, or `None` when nothing is placed.
    pub fn scroll_to_first(&mut self, positions: &PositionMap) -> Option<f64> {
        let leftmost = positions
            .values()
            .map(|rect| rect.left)
            .fold(None, |acc: Option<f64>, left| Some(acc.map_or(left, |a| a.min(left))))?;
        self.scroll_to(leftmost - self.cell_width * LEAD_CELLS);
        Some(self.scroll)
    }

    /// Render window `[start, end]` including the buffer on both sides
    pub fn window(&self) -> (f64, f64) {
        let buffer = self.container_width * self.params.buffer_percent / 100.0;
        (
            (self.scroll - buffer).max(0.0),
            self.scroll + self.container_width + buffer,
        )
    }

    /// Inclusive horizontal overlap with the render window
    pub fn is_visible(&self, rect: &Rect) -> bool {
        let (start, end) = self.window();
        rect.left <= end && rect.right() >= start
    }

    pub fn state(&self) -> ViewportState {
        let (visible_start, visible_end) = self.window();
        ViewportState {
            visible_start,
            visible_end,
            container_width: self.container_width,
            scroll_position: self.scroll,
            is_scrolling: self.is_scrolling,
            cell_width: self.cell_width,
        }
    }
}
