//! Timeline Layout Engine
//!
//! - dates: the single date-difference helper and date parsing
//! - range: visible date window
//! - scale: calendar grid and header labels
//! - position: item rectangles
//! - connector: dependency curves
//! - viewport: pan/zoom and virtualization
//! - engine: composition of the above

pub mod dates;
pub mod range;
pub mod scale;
pub mod position;
pub mod connector;
pub mod viewport;
mod engine;

pub use range::{calculate_range, DateRange, InvalidRangeError, RangeReport};
pub use scale::{generate_grid, Grid, GridColumn, SecondarySpan, TimeScale};
pub use position::{effective_span, EffectiveSpan, ItemKey, PositionCalculator, PositionMap, Rect};
pub use connector::{route, route_all, style, Attachment, Connector, ConnectorStyle, Point};
pub use viewport::{ViewportController, ViewportState};
pub use engine::{TimelineEngine, Visibility};
