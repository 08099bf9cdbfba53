//! Arclength parametrised polylines.
//!
//! Trimming measures where bounding points fall along a calculated curve by
//! projecting them onto it (distance along the curve of the closest point).
//! Line labels are placed by the inverse, interpolation at a distance.

use geo::Coord;

/// Coordinates with y multiplied by `ratio`.
///
/// # Examples
///
/// ```rust
/// use pseudosection::geometry::polyline::scale_y;
/// use geo::coord;
///
/// let scaled = scale_y(&[coord! { x: 500.0, y: 2.0 }], 40.0);
/// assert_eq!(scaled, vec![coord! { x: 500.0, y: 80.0 }]);
/// ```
#[must_use]
pub fn scale_y(coords: &[Coord<f64>], ratio: f64) -> Vec<Coord<f64>> {
    coords
        .iter()
        .map(|c| Coord {
            x: c.x,
            y: c.y * ratio,
        })
        .collect()
}

/// Euclidean distance of two coordinates.
#[inline]
#[must_use]
pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// A polyline with precomputed cumulative vertex distances.
#[derive(Clone, Debug, PartialEq)]
pub struct Polyline {
    coords: Vec<Coord<f64>>,
    cumulative: Vec<f64>,
}

impl Polyline {
    /// Builds a polyline through `coords`.
    #[must_use]
    pub fn new(coords: Vec<Coord<f64>>) -> Self {
        let mut cumulative = Vec::with_capacity(coords.len());
        let mut total = 0.0;
        for (i, c) in coords.iter().enumerate() {
            if i > 0 {
                total += distance(coords[i - 1], *c);
            }
            cumulative.push(total);
        }
        Self { coords, cumulative }
    }

    /// Vertices.
    #[must_use]
    pub fn coords(&self) -> &[Coord<f64>] {
        &self.coords
    }

    /// Distance along the polyline of every vertex.
    #[must_use]
    pub fn vertex_distances(&self) -> &[f64] {
        &self.cumulative
    }

    /// Total length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Distance along the polyline of the point closest to `p`.
    ///
    /// Ties are resolved toward the start of the polyline.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pseudosection::geometry::polyline::Polyline;
    /// use geo::coord;
    ///
    /// let line = Polyline::new(vec![
    ///     coord! { x: 0.0, y: 0.0 },
    ///     coord! { x: 2.0, y: 0.0 },
    ///     coord! { x: 2.0, y: 2.0 },
    /// ]);
    /// assert_eq!(line.project(coord! { x: 3.0, y: 1.0 }), 3.0);
    /// assert_eq!(line.project(coord! { x: -1.0, y: 0.0 }), 0.0);
    /// ```
    #[must_use]
    pub fn project(&self, p: Coord<f64>) -> f64 {
        let Some(first) = self.coords.first() else {
            return 0.0;
        };
        let mut best = (distance(*first, p), 0.0);
        for (i, w) in self.coords.windows(2).enumerate() {
            let (a, b) = (w[0], w[1]);
            let (dx, dy) = (b.x - a.x, b.y - a.y);
            let len2 = dx.mul_add(dx, dy * dy);
            if len2 <= 0.0 {
                continue;
            }
            let t = ((p.x - a.x).mul_add(dx, (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
            let closest = Coord {
                x: dx.mul_add(t, a.x),
                y: dy.mul_add(t, a.y),
            };
            let d = distance(closest, p);
            if d < best.0 {
                let along = if t >= 1.0 {
                    self.cumulative[i + 1]
                } else {
                    t.mul_add(len2.sqrt(), self.cumulative[i])
                };
                best = (d, along);
            }
        }
        best.1
    }

    /// Point at distance `d` along the polyline, clamped to its ends.
    #[must_use]
    pub fn interpolate(&self, d: f64) -> Option<Coord<f64>> {
        let first = *self.coords.first()?;
        if d <= 0.0 {
            return Some(first);
        }
        for (i, w) in self.coords.windows(2).enumerate() {
            let (start, stop) = (self.cumulative[i], self.cumulative[i + 1]);
            if d <= stop && stop > start {
                let t = (d - start) / (stop - start);
                return Some(Coord {
                    x: (w[1].x - w[0].x).mul_add(t, w[0].x),
                    y: (w[1].y - w[0].y).mul_add(t, w[0].y),
                });
            }
        }
        self.coords.last().copied()
    }
}
