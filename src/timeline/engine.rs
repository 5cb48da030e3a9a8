//! Timeline Engine
//!
//! Wires the five layout components together:
//! range -> grid -> positions -> connectors -> viewport.
//! Every change to the inputs triggers a full relayout.

use std::time::Instant;

use chrono::NaiveDate;

use super::connector::{route_all, Connector};
use super::dates::days_between;
use super::position::{ItemKey, PositionCalculator, PositionMap, Rect};
use super::range::{calculate_range, DateRange};
use super::scale::{generate_grid, Grid, TimeScale};
use super::viewport::{ViewportController, ViewportState};
use crate::config::TimelineConfig;
use crate::domain::{DomainError, DomainResult, Milestone, Post, TimelineSnapshot};

/// Which layers are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub posts: bool,
    pub milestones: bool,
    pub dependencies: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            posts: true,
            milestones: true,
            dependencies: true,
        }
    }
}

pub struct TimelineEngine {
    config: TimelineConfig,
    scale: TimeScale,
    today: NaiveDate,
    snapshot: TimelineSnapshot,
    range: DateRange,
    /// Set when the user picked the window explicitly
    manual_range: bool,
    grid: Grid,
    positions: PositionMap,
    connectors: Vec<Connector>,
    viewport: ViewportController,
    visibility: Visibility,
}

impl TimelineEngine {
    pub fn new(config: TimelineConfig, today: NaiveDate) -> DomainResult<Self> {
        config.validate()?;
        let range = DateRange::new(today, today);
        let grid = generate_grid(&range, config.scale, config.layout.cell_width).map_err(range_error)?;
        let mut engine = Self {
            scale: config.scale,
            viewport: ViewportController::new(config.viewport, config.layout.cell_width),
            config,
            today,
            snapshot: TimelineSnapshot::default(),
            range,
            manual_range: false,
            grid,
            positions: PositionMap::new(),
            connectors: Vec::new(),
            visibility: Visibility::default(),
        };
        engine.relayout()?;
        Ok(engine)
    }

    /// Engine anchored at the local calendar date
    pub fn for_today(config: TimelineConfig) -> DomainResult<Self> {
        Self::new(config, chrono::Local::now().date_naive())
    }

    fn calculator(&self) -> PositionCalculator {
        let mut params = self.config.layout;
        params.cell_width = self.viewport.cell_width();
        PositionCalculator::new(self.range.start, params, self.today)
    }

    /// Recompute range, grid, positions and connectors from scratch
    pub fn relayout(&mut self) -> DomainResult<()> {
        if !self.manual_range {
            let report = calculate_range(
                &self.snapshot.posts,
                &self.snapshot.milestones,
                &self.config.range,
                self.today,
            );
            for skipped in &report.skipped {
                log::warn!(
                    "Skipping unparseable date {:?} ({:?} of #{}) in range calculation",
                    skipped.raw,
                    skipped.field,
                    skipped.id
                );
            }
            self.range = report.range;
        }

        let cell_width = self.viewport.cell_width();
        self.grid = generate_grid(&self.range, self.scale, cell_width).map_err(range_error)?;
        self.positions = self.calculator().layout(&self.snapshot);
        self.connectors = route_all(&self.snapshot.dependencies, &self.positions);
        self.viewport
            .set_content_width(self.range.day_count() as f64 * cell_width);

        log::debug!(
            "Timeline relayout: {} posts, {} milestones, {} connectors, {}..{} at {}px/day",
            self.snapshot.posts.len(),
            self.snapshot.milestones.len(),
            self.connectors.len(),
            self.range.start,
            self.range.end,
            cell_width
        );
        Ok(())
    }

    // ========================
    // Inputs
    // ========================

    pub fn set_snapshot(&mut self, snapshot: TimelineSnapshot) -> DomainResult<()> {
        self.snapshot = snapshot;
        self.relayout()
    }

    /// Mutate the snapshot in place, then relayout
    pub fn update_snapshot<F>(&mut self, f: F) -> DomainResult<()>
    where
        F: FnOnce(&mut TimelineSnapshot),
    {
        f(&mut self.snapshot);
        self.relayout()
    }

    pub fn set_scale(&mut self, scale: TimeScale) -> DomainResult<()> {
        if self.scale == scale {
            return Ok(());
        }
        self.scale = scale;
        self.relayout()
    }

    /// Pin the visible window; scroll resets to the start
    pub fn set_range(&mut self, range: DateRange) -> DomainResult<()> {
        range.check().map_err(range_error)?;
        self.range = range;
        self.manual_range = true;
        self.viewport.scroll_to(0.0);
        self.relayout()
    }

    /// Go back to deriving the window from the data
    pub fn auto_range(&mut self) -> DomainResult<()> {
        self.manual_range = false;
        self.relayout()
    }

    pub fn set_today(&mut self, today: NaiveDate) -> DomainResult<()> {
        self.today = today;
        self.relayout()
    }

    // ========================
    // Interaction
    // ========================

    pub fn zoom_in(&mut self) -> DomainResult<bool> {
        let changed = self.viewport.zoom_in();
        if changed {
            self.relayout()?;
        }
        Ok(changed)
    }

    pub fn zoom_out(&mut self) -> DomainResult<bool> {
        let changed = self.viewport.zoom_out();
        if changed {
            self.relayout()?;
        }
        Ok(changed)
    }

    pub fn resize(&mut self, container_width: f64) {
        self.viewport.resize(container_width);
    }

    pub fn on_scroll(&mut self, scroll_left: f64, now: Instant) -> bool {
        self.viewport.on_scroll(scroll_left, now)
    }

    pub fn settle(&mut self, now: Instant) -> bool {
        self.viewport.settle(now)
    }

    pub fn pointer_down(&mut self, x: f64) {
        self.viewport.pointer_down(x);
    }

    pub fn pointer_move(&mut self, x: f64, now: Instant) -> bool {
        self.viewport.pointer_move(x, now)
    }

    pub fn pointer_up(&mut self) {
        self.viewport.pointer_up();
    }

    pub fn pan(&mut self, steps: i32) {
        self.viewport.pan(steps);
    }

    /// Centre today in the container
    pub fn jump_to_today(&mut self) {
        let offset = days_between(self.range.start, self.today) as f64 * self.viewport.cell_width();
        self.viewport.center_on(offset);
    }

    /// Scroll to the earliest placed element
    pub fn focus_first_item(&mut self) -> Option<f64> {
        self.viewport.scroll_to_first(&self.positions)
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
    }

    pub fn toggle_posts(&mut self) {
        self.visibility.posts = !self.visibility.posts;
    }

    pub fn toggle_milestones(&mut self) {
        self.visibility.milestones = !self.visibility.milestones;
    }

    pub fn toggle_dependencies(&mut self) {
        self.visibility.dependencies = !self.visibility.dependencies;
    }

    // ========================
    // Outputs
    // ========================

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &TimelineSnapshot {
        &self.snapshot
    }

    pub fn scale(&self) -> TimeScale {
        self.scale
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    pub fn position(&self, key: ItemKey) -> Option<Rect> {
        self.positions.get(&key).copied()
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport.state()
    }

    /// Width of the scrollable content
    pub fn content_width(&self) -> f64 {
        self.range.day_count() as f64 * self.viewport.cell_width()
    }

    /// Posts to mount for the current viewport
    pub fn visible_posts(&self) -> Vec<(&Post, Rect)> {
        if !self.visibility.posts {
            return Vec::new();
        }
        self.snapshot
            .posts
            .iter()
            .filter_map(|post| {
                let rect = self.positions.get(&ItemKey::Post(post.id))?;
                self.viewport.is_visible(rect).then_some((post, *rect))
            })
            .collect()
    }

    pub fn visible_milestones(&self) -> Vec<(&Milestone, Rect)> {
        if !self.visibility.milestones {
            return Vec::new();
        }
        self.snapshot
            .milestones
            .iter()
            .filter_map(|m| {
                let rect = self.positions.get(&ItemKey::Milestone(m.id))?;
                self.viewport.is_visible(rect).then_some((m, *rect))
            })
            .collect()
    }

    /// Connectors whose horizontal extent touches the viewport
    pub fn visible_connectors(&self) -> Vec<&Connector> {
        if !self.visibility.dependencies || !self.visibility.posts {
            return Vec::new();
        }
        self.connectors
            .iter()
            .filter(|c| {
                let left = c.source_anchor.x.min(c.target_anchor.x);
                let right = c.source_anchor.x.max(c.target_anchor.x);
                self.viewport.is_visible(&Rect::new(left, 0.0, right - left, 0.0))
            })
            .collect()
    }
}

fn range_error(err: super::range::InvalidRangeError) -> DomainError {
    DomainError::InvalidInput(err.to_string())
}
