//! Connector Router
//!
//! Routes a cubic curve between two placed posts. The attachment sides
//! depend only on the relative position of the two rectangles; the stroke
//! style depends only on the dependency type.

use serde::{Deserialize, Serialize};

use super::position::{ItemKey, PositionMap, Rect};
use crate::domain::{Dependency, DependencyType};

/// Largest horizontal distance that still widens the curve
const MAX_CURVE_SPAN: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Which edges the connector leaves and enters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attachment {
    /// Source above target
    BottomToTop,
    /// Source below target
    TopToBottom,
    /// Source left of target
    RightToLeft,
    /// Source right of target
    LeftToRight,
    /// Rectangles overlap on both axes
    CenterToCenter,
}

/// Stroke of a connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectorStyle {
    pub color: &'static str,
    pub color_name: &'static str,
    /// SVG dash array, `None` for a solid line
    pub dash: Option<&'static str>,
}

/// Stroke lookup table
///
/// | type             | colour | dash   |
/// |------------------|--------|--------|
/// | finish-to-start  | red    | solid  |
/// | start-to-start   | orange | dashed |
/// | finish-to-finish | blue   | solid  |
/// | start-to-finish  | purple | solid  |
pub fn style(dependency_type: DependencyType) -> ConnectorStyle {
    match dependency_type {
        DependencyType::FinishToStart => ConnectorStyle {
            color: "#ef4444",
            color_name: "red",
            dash: None,
        },
        DependencyType::StartToStart => ConnectorStyle {
            color: "#f97316",
            color_name: "orange",
            dash: Some("5,5"),
        },
        DependencyType::FinishToFinish => ConnectorStyle {
            color: "#3b82f6",
            color_name: "blue",
            dash: None,
        },
        DependencyType::StartToFinish => ConnectorStyle {
            color: "#8b5cf6",
            color_name: "purple",
            dash: None,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connector {
    pub dependency_id: u32,
    pub source_id: u32,
    pub target_id: u32,
    pub dependency_type: DependencyType,
    /// SVG path data
    pub path: String,
    pub attachment: Attachment,
    pub source_anchor: Point,
    pub target_anchor: Point,
    /// Halfway between the two rectangle centres, where the delete handle sits
    pub midpoint: Point,
    pub style: ConnectorStyle,
}

/// Geometry of a routed curve
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub attachment: Attachment,
    pub source_anchor: Point,
    pub target_anchor: Point,
    pub source_control: Point,
    pub target_control: Point,
}

impl Route {
    pub fn path(&self) -> String {
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            num(self.source_anchor.x),
            num(self.source_anchor.y),
            num(self.source_control.x),
            num(self.source_control.y),
            num(self.target_control.x),
            num(self.target_control.y),
            num(self.target_anchor.x),
            num(self.target_anchor.y),
        )
    }
}

/// Pick attachment edges and control points for a curve from `source` to `target`.
pub fn route(source: &Rect, target: &Rect) -> Route {
    let (attachment, s, t) = if source.bottom() < target.top {
        (
            Attachment::BottomToTop,
            Point::new(source.center_x(), source.bottom()),
            Point::new(target.center_x(), target.top),
        )
    } else if target.bottom() < source.top {
        (
            Attachment::TopToBottom,
            Point::new(source.center_x(), source.top),
            Point::new(target.center_x(), target.bottom()),
        )
    } else if source.right() < target.left {
        (
            Attachment::RightToLeft,
            Point::new(source.right(), source.center_y()),
            Point::new(target.left, target.center_y()),
        )
    } else if target.right() < source.left {
        (
            Attachment::LeftToRight,
            Point::new(source.left, source.center_y()),
            Point::new(target.right(), target.center_y()),
        )
    } else {
        (
            Attachment::CenterToCenter,
            Point::new(source.center_x(), source.center_y()),
            Point::new(target.center_x(), target.center_y()),
        )
    };

    let dx = t.x - s.x;
    let dy = t.y - s.y;
    let bend = dx.abs().min(MAX_CURVE_SPAN) / 2.0;

    let vertical = match attachment {
        Attachment::BottomToTop | Attachment::TopToBottom => true,
        Attachment::RightToLeft | Attachment::LeftToRight => false,
        Attachment::CenterToCenter => dy.abs() > dx.abs(),
    };

    let (source_control, target_control) = if vertical {
        let dir = sign(dy);
        (
            Point::new(s.x, s.y + dir * bend),
            Point::new(t.x, t.y - dir * bend),
        )
    } else {
        let dir = sign(dx);
        (
            Point::new(s.x + dir * bend, s.y),
            Point::new(t.x - dir * bend, t.y),
        )
    };

    Route {
        attachment,
        source_anchor: s,
        target_anchor: t,
        source_control,
        target_control,
    }
}

/// Route one dependency between its two placed posts
pub fn connect(dependency: &Dependency, source: &Rect, target: &Rect) -> Connector {
    let route = route(source, target);
    Connector {
        dependency_id: dependency.id,
        source_id: dependency.source_id,
        target_id: dependency.target_id,
        dependency_type: dependency.dependency_type,
        path: route.path(),
        attachment: route.attachment,
        source_anchor: route.source_anchor,
        target_anchor: route.target_anchor,
        midpoint: Point::new(
            (source.center_x() + target.center_x()) / 2.0,
            (source.center_y() + target.center_y()) / 2.0,
        ),
        style: style(dependency.dependency_type),
    }
}

/// Route every dependency whose endpoints are both placed
pub fn route_all(dependencies: &[Dependency], positions: &PositionMap) -> Vec<Connector> {
    dependencies
        .iter()
        .filter(|dep| dep.source_id != dep.target_id)
        .filter_map(|dep| {
            let source = positions.get(&ItemKey::Post(dep.source_id))?;
            let target = positions.get(&ItemKey::Post(dep.target_id))?;
            Some(connect(dep, source, target))
        })
        .collect()
}

/// Like `Math.sign`: zero stays zero
fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Avoid printing negative zero
fn num(v: f64) -> f64 {
    v + 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(id: u32, source: u32, target: u32, t: DependencyType) -> Dependency {
        Dependency {
            id,
            roadmap_id: 1,
            source_id: source,
            target_id: target,
            dependency_type: t,
        }
    }

    #[test]
    fn test_stacked_rows_attach_bottom_to_top() {
        // Source ends on the day the target starts, one row below
        let source = Rect::new(0.0, 60.0, 80.0, 60.0);
        let target = Rect::new(70.0, 130.0, 40.0, 60.0);
        let r = route(&source, &target);

        assert_eq!(r.attachment, Attachment::BottomToTop);
        assert_eq!(r.source_anchor, Point::new(40.0, 120.0));
        assert_eq!(r.target_anchor, Point::new(90.0, 130.0));
        // bend = min(50, 100) / 2 along y
        assert_eq!(r.source_control, Point::new(40.0, 145.0));
        assert_eq!(r.target_control, Point::new(90.0, 105.0));
        assert_eq!(r.path(), "M 40 120 C 40 145, 90 105, 90 130");
    }

    #[test]
    fn test_source_below_target() {
        let source = Rect::new(0.0, 200.0, 50.0, 40.0);
        let target = Rect::new(0.0, 100.0, 50.0, 40.0);
        let r = route(&source, &target);
        assert_eq!(r.attachment, Attachment::TopToBottom);
        assert_eq!(r.source_anchor, Point::new(25.0, 200.0));
        assert_eq!(r.target_anchor, Point::new(25.0, 140.0));
    }

    #[test]
    fn test_same_row_attaches_sideways() {
        let source = Rect::new(0.0, 60.0, 100.0, 60.0);
        let target = Rect::new(400.0, 60.0, 100.0, 60.0);
        let r = route(&source, &target);
        assert_eq!(r.attachment, Attachment::RightToLeft);
        assert_eq!(r.source_anchor, Point::new(100.0, 90.0));
        assert_eq!(r.target_anchor, Point::new(400.0, 90.0));
        assert_eq!(r.source_control, Point::new(150.0, 90.0));
        assert_eq!(r.target_control, Point::new(350.0, 90.0));

        let back = route(&target, &source);
        assert_eq!(back.attachment, Attachment::LeftToRight);
        assert_eq!(back.source_anchor, Point::new(400.0, 90.0));
        assert_eq!(back.source_control, Point::new(350.0, 90.0));
    }

    #[test]
    fn test_overlap_falls_back_to_centers() {
        let source = Rect::new(0.0, 60.0, 100.0, 60.0);
        let target = Rect::new(50.0, 80.0, 100.0, 60.0);
        let r = route(&source, &target);
        assert_eq!(r.attachment, Attachment::CenterToCenter);
        assert_eq!(r.source_anchor, Point::new(50.0, 90.0));
        assert_eq!(r.target_anchor, Point::new(100.0, 110.0));
        assert_eq!(r.source_control, Point::new(75.0, 90.0));
    }

    #[test]
    fn test_route_is_deterministic() {
        let source = Rect::new(12.5, 60.0, 80.0, 60.0);
        let target = Rect::new(300.0, 340.0, 45.0, 60.0);
        let d = dep(1, 1, 2, DependencyType::FinishToFinish);
        let a = connect(&d, &source, &target);
        let b = connect(&d, &source, &target);
        assert_eq!(a.path, b.path);
        assert_eq!(a, b);
    }

    #[test]
    fn test_style_table() {
        assert_eq!(style(DependencyType::FinishToStart).color_name, "red");
        assert_eq!(style(DependencyType::StartToStart).color_name, "orange");
        assert_eq!(style(DependencyType::StartToStart).dash, Some("5,5"));
        assert_eq!(style(DependencyType::FinishToFinish).color, "#3b82f6");
        assert_eq!(style(DependencyType::StartToFinish).color_name, "purple");
        for t in [
            DependencyType::FinishToStart,
            DependencyType::FinishToFinish,
            DependencyType::StartToFinish,
        ] {
            assert!(style(t).dash.is_none());
        }
    }

    #[test]
    fn test_route_all_skips_unplaced() {
        let mut positions = PositionMap::new();
        positions.insert(ItemKey::Post(1), Rect::new(0.0, 60.0, 80.0, 60.0));
        positions.insert(ItemKey::Post(2), Rect::new(0.0, 130.0, 80.0, 60.0));
        let deps = vec![
            dep(1, 1, 2, DependencyType::FinishToStart),
            dep(2, 1, 99, DependencyType::FinishToStart),
            dep(3, 2, 2, DependencyType::StartToStart),
        ];
        let connectors = route_all(&deps, &positions);
        assert_eq!(connectors.len(), 1);
        assert_eq!(connectors[0].dependency_id, 1);
        assert_eq!(connectors[0].midpoint, Point::new(40.0, 125.0));
    }
}
