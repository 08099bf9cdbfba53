//! Domain boundary and its recursive subdivision.
//!
//! The four edges of the domain rectangle are split at every point where a
//! clipped univariant line piece meets them, so that the boundary and the lines
//! share nodes in the planar arrangement.

use crate::geometry::clip::lerp;
use crate::geometry::polyline::distance;
use geo::{Coord, Line, Rect};
use geo::algorithm::line_intersection::{LineIntersection, line_intersection};

/// The four edges of `rect`, counter-clockwise from the lower left corner.
#[must_use]
pub fn rectangle_edges(rect: &Rect<f64>) -> [Line<f64>; 4] {
    let (min, max) = (rect.min(), rect.max());
    let ll = min;
    let lr = Coord { x: max.x, y: min.y };
    let ur = max;
    let ul = Coord { x: min.x, y: max.y };
    [
        Line::new(ll, lr),
        Line::new(lr, ur),
        Line::new(ur, ul),
        Line::new(ul, ll),
    ]
}

/// Moves coordinates lying within `tol` of a side of `rect` exactly onto it.
#[must_use]
pub fn snap_to_rect(c: Coord<f64>, rect: &Rect<f64>, tol: f64) -> Coord<f64> {
    let snap = |v: f64, lo: f64, hi: f64| {
        if (v - lo).abs() <= tol {
            lo
        } else if (v - hi).abs() <= tol {
            hi
        } else {
            v
        }
    };
    Coord {
        x: snap(c.x, rect.min().x, rect.max().x),
        y: snap(c.y, rect.min().y, rect.max().y),
    }
}

/// Parameter of the point of `segment` closest to `p`.
#[must_use]
pub fn segment_parameter(segment: &Line<f64>, p: Coord<f64>) -> f64 {
    let d = segment.delta();
    let len2 = d.x.mul_add(d.x, d.y * d.y);
    if len2 <= 0.0 {
        return 0.0;
    }
    ((p.x - segment.start.x).mul_add(d.x, (p.y - segment.start.y) * d.y) / len2).clamp(0.0, 1.0)
}

/// Splits `edge` at its intersections with `segments`.
///
/// Each intersection is snapped onto the intersecting segment and the two halves
/// are split again, so the recursion depth is bounded by the number of distinct
/// intersection points on the edge. Points within `tol` of an edge end do not
/// split it. Leaf edges are appended to `leaves` in order along `edge`.
///
/// # Examples
///
/// ```rust
/// use pseudosection::geometry::boundary::split_edge;
/// use geo::{Line, coord};
///
/// let edge = Line::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 });
/// let crossing = [
///     Line::new(coord! { x: 3.0, y: -1.0 }, coord! { x: 3.0, y: 1.0 }),
///     Line::new(coord! { x: 7.0, y: 0.0 }, coord! { x: 7.0, y: 5.0 }),
///     Line::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 }),
/// ];
/// let mut leaves = Vec::new();
/// split_edge(edge, &crossing, 1e-9, &mut leaves);
/// assert_eq!(leaves.len(), 3);
/// assert_eq!(leaves[1], Line::new(coord! { x: 3.0, y: 0.0 }, coord! { x: 7.0, y: 0.0 }));
/// ```
pub fn split_edge(edge: Line<f64>, segments: &[Line<f64>], tol: f64, leaves: &mut Vec<Line<f64>>) {
    for segment in segments {
        let Some(LineIntersection::SinglePoint { intersection, .. }) =
            line_intersection(edge, *segment)
        else {
            continue;
        };
        let p = lerp(
            segment.start,
            segment.end,
            segment_parameter(segment, intersection),
        );
        if distance(p, edge.start) <= tol || distance(p, edge.end) <= tol {
            continue;
        }
        split_edge(Line::new(edge.start, p), segments, tol, leaves);
        split_edge(Line::new(p, edge.end), segments, tol, leaves);
        return;
    }
    leaves.push(edge);
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    #[test]
    fn rectangle_edges_form_a_closed_ring() {
        let rect = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 2.0, y: 1.0 });
        let edges = rectangle_edges(&rect);
        for (i, e) in edges.iter().enumerate() {
            assert_eq!(e.end, edges[(i + 1) % 4].start);
        }
    }

    #[test]
    fn edge_without_intersections_is_a_leaf() {
        let edge = Line::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 0.0 });
        let far = [Line::new(coord! { x: 0.0, y: 1.0 }, coord! { x: 1.0, y: 1.0 })];
        let mut leaves = Vec::new();
        split_edge(edge, &far, 1e-9, &mut leaves);
        assert_eq!(leaves, vec![edge]);
    }

    #[test]
    fn snapping_only_moves_near_sides() {
        let rect = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
        assert_eq!(
            snap_to_rect(coord! { x: 1e-12, y: 0.5 }, &rect, 1e-9),
            coord! { x: 0.0, y: 0.5 }
        );
        assert_eq!(
            snap_to_rect(coord! { x: 0.3, y: 0.5 }, &rect, 1e-9),
            coord! { x: 0.3, y: 0.5 }
        );
    }
}
