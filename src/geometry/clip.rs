//! Clipping polylines to the diagram domain.

use geo::{Coord, Rect};

/// Clips segment `a`-`b` to `rect` (Liang–Barsky).
///
/// Returns the parameters `(t0, t1)` of the visible part, `0 <= t0 <= t1 <= 1`,
/// or `None` when the segment misses the rectangle.
#[must_use]
pub fn clip_segment(a: Coord<f64>, b: Coord<f64>, rect: &Rect<f64>) -> Option<(f64, f64)> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let (min, max) = (rect.min(), rect.max());
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    for (p, q) in [
        (-dx, a.x - min.x),
        (dx, max.x - a.x),
        (-dy, a.y - min.y),
        (dy, max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

/// Point at parameter `t` of segment `a`-`b`; exact at both ends.
#[must_use]
pub fn lerp(a: Coord<f64>, b: Coord<f64>, t: f64) -> Coord<f64> {
    if t <= 0.0 {
        return a;
    }
    if t >= 1.0 {
        return b;
    }
    Coord {
        x: (b.x - a.x).mul_add(t, a.x),
        y: (b.y - a.y).mul_add(t, a.y),
    }
}

/// Parts of a polyline inside `rect`, each with at least two vertices.
///
/// A polyline leaving and re-entering the rectangle yields several pieces.
///
/// # Examples
///
/// ```rust
/// use pseudosection::geometry::clip::clip_polyline;
/// use geo::{Rect, coord};
///
/// let rect = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 });
/// let wave = [
///     coord! { x: -5.0, y: 5.0 },
///     coord! { x: 5.0, y: 5.0 },
///     coord! { x: 5.0, y: 15.0 },
///     coord! { x: 8.0, y: 15.0 },
///     coord! { x: 8.0, y: 5.0 },
/// ];
/// let pieces = clip_polyline(&wave, &rect);
/// assert_eq!(pieces.len(), 2);
/// assert_eq!(pieces[0].first(), Some(&coord! { x: 0.0, y: 5.0 }));
/// assert_eq!(pieces[1].last(), Some(&coord! { x: 8.0, y: 5.0 }));
/// ```
#[must_use]
pub fn clip_polyline(coords: &[Coord<f64>], rect: &Rect<f64>) -> Vec<Vec<Coord<f64>>> {
    let mut pieces = Vec::new();
    let mut current: Vec<Coord<f64>> = Vec::new();
    for w in coords.windows(2) {
        let (a, b) = (w[0], w[1]);
        let Some((t0, t1)) = clip_segment(a, b, rect) else {
            if current.len() > 1 {
                pieces.push(std::mem::take(&mut current));
            }
            current.clear();
            continue;
        };
        let (start, stop) = (lerp(a, b, t0), lerp(a, b, t1));
        if t0 > 0.0 && current.len() > 1 {
            pieces.push(std::mem::take(&mut current));
        }
        if current.last() != Some(&start) {
            current.clear();
            current.push(start);
        }
        if stop != start {
            current.push(stop);
        }
        if t1 < 1.0 {
            if current.len() > 1 {
                pieces.push(std::mem::take(&mut current));
            }
            current.clear();
        }
    }
    if current.len() > 1 {
        pieces.push(current);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    fn unit() -> Rect<f64> {
        Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 })
    }

    #[test]
    fn segment_outside_is_rejected() {
        assert_eq!(
            clip_segment(coord! { x: 2.0, y: 0.0 }, coord! { x: 3.0, y: 1.0 }, &unit()),
            None
        );
    }

    #[test]
    fn crossing_segment_is_cut_at_both_sides() {
        let (t0, t1) =
            clip_segment(coord! { x: -1.0, y: 0.5 }, coord! { x: 3.0, y: 0.5 }, &unit()).unwrap();
        assert_eq!((t0, t1), (0.25, 0.5));
    }

    #[test]
    fn polyline_inside_is_kept_whole() {
        let coords = [
            coord! { x: 0.1, y: 0.1 },
            coord! { x: 0.5, y: 0.2 },
            coord! { x: 0.9, y: 0.9 },
        ];
        assert_eq!(clip_polyline(&coords, &unit()), vec![coords.to_vec()]);
    }

    #[test]
    fn repeated_vertices_do_not_split_pieces() {
        let coords = [
            coord! { x: 0.5, y: 0.5 },
            coord! { x: 0.5, y: 0.5 },
            coord! { x: 2.0, y: 0.5 },
        ];
        let pieces = clip_polyline(&coords, &unit());
        assert_eq!(pieces, vec![vec![coord! { x: 0.5, y: 0.5 }, coord! { x: 1.0, y: 0.5 }]]);
    }
}
