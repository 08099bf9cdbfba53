//! Planar arrangement of boundary edges and univariant line pieces.
//!
//! Segments are fully noded (split at every pairwise intersection and collinear
//! overlap), merged into an undirected graph with snapped nodes, and the bounded
//! faces are traced with a half-edge walk. Dangling edges and bridges bound no
//! face and are pruned before tracing; components lying inside a face become its
//! holes.
//!
//! Half-edge `2e` runs from `edges[e].a` to `edges[e].b`, half-edge `2e + 1` back.

use crate::core::collections::{
    FastHashMap, SmallBuffer, fast_hash_map_with_capacity, spatial_hash_grid::NodeSnapper,
};
use crate::core::feature::FeatureId;
use crate::geometry::boundary::segment_parameter;
use crate::geometry::clip::lerp;
use crate::geometry::polyline::distance;
use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::{Area, BoundingRect, Contains, Coord, Line, LineString, Point, Polygon};
use ordered_float::OrderedFloat;
use std::collections::{BTreeSet, VecDeque};

/// What an arrangement edge came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeSource {
    /// A piece of the domain rectangle.
    Boundary,
    /// A piece of a univariant line.
    Line(FeatureId),
}

/// Sources of one edge; more than one when segments overlap.
pub type EdgeSources = SmallBuffer<EdgeSource, 2>;

/// An input segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Geometry, in scaled coordinates.
    pub line: Line<f64>,
    /// Origin of the segment.
    pub source: EdgeSource,
}

#[derive(Clone, Debug)]
struct Edge {
    a: usize,
    b: usize,
    sources: EdgeSources,
    alive: bool,
}

/// A bounded face of the arrangement.
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    /// Face polygon, counter-clockwise exterior, in scaled coordinates.
    pub polygon: Polygon<f64>,
    /// Univariant lines with an edge on the face boundary (holes included).
    pub lines: BTreeSet<FeatureId>,
}

/// Noded planar graph.
#[derive(Clone, Debug)]
pub struct Arrangement {
    nodes: Vec<Coord<f64>>,
    edges: Vec<Edge>,
}

/// A traced cycle of half-edges with its signed area.
struct Cycle {
    half_edges: Vec<usize>,
    area: f64,
}

impl Arrangement {
    /// Nodes `segments`, merging endpoints closer than `tol`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pseudosection::geometry::arrangement::{Arrangement, EdgeSource, Segment};
    /// use geo::{Line, coord};
    ///
    /// let cross = [
    ///     Segment {
    ///         line: Line::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 2.0, y: 2.0 }),
    ///         source: EdgeSource::Boundary,
    ///     },
    ///     Segment {
    ///         line: Line::new(coord! { x: 0.0, y: 2.0 }, coord! { x: 2.0, y: 0.0 }),
    ///         source: EdgeSource::Boundary,
    ///     },
    /// ];
    /// let arrangement = Arrangement::build(&cross, 1e-9);
    /// assert_eq!(arrangement.number_of_nodes(), 5);
    /// assert_eq!(arrangement.number_of_edges(), 4);
    /// ```
    #[must_use]
    pub fn build(segments: &[Segment], tol: f64) -> Self {
        let segments: Vec<&Segment> = segments
            .iter()
            .filter(|s| distance(s.line.start, s.line.end) > 0.0)
            .collect();
        let mut splits: Vec<Vec<(f64, Coord<f64>)>> = segments
            .iter()
            .map(|s| vec![(0.0, s.line.start), (1.0, s.line.end)])
            .collect();

        // Sweep over x extents; pairs whose boxes cannot meet are skipped.
        let bounds: Vec<_> = segments.iter().map(|s| s.line.bounding_rect()).collect();
        let mut order: Vec<usize> = (0..segments.len()).collect();
        order.sort_by_key(|i| OrderedFloat(bounds[*i].min().x));
        for (k, &i) in order.iter().enumerate() {
            for &j in &order[k + 1..] {
                if bounds[j].min().x > bounds[i].max().x + tol {
                    break;
                }
                if bounds[j].min().y > bounds[i].max().y + tol
                    || bounds[j].max().y < bounds[i].min().y - tol
                {
                    continue;
                }
                let (si, sj) = (segments[i].line, segments[j].line);
                match line_intersection(si, sj) {
                    Some(LineIntersection::SinglePoint { intersection, .. }) => {
                        splits[i].push((segment_parameter(&si, intersection), intersection));
                        splits[j].push((segment_parameter(&sj, intersection), intersection));
                    }
                    Some(LineIntersection::Collinear { intersection }) => {
                        for p in [intersection.start, intersection.end] {
                            splits[i].push((segment_parameter(&si, p), p));
                            splits[j].push((segment_parameter(&sj, p), p));
                        }
                    }
                    None => {
                        // Endpoints falling just short of the other segment.
                        for (target, other) in [(i, sj), (j, si)] {
                            let line = segments[target].line;
                            for p in [other.start, other.end] {
                                let t = segment_parameter(&line, p);
                                if distance(lerp(line.start, line.end, t), p) <= tol {
                                    splits[target].push((t, p));
                                }
                            }
                        }
                    }
                }
            }
        }

        let mut snapper = NodeSnapper::new(tol);
        let mut edges: Vec<Edge> = Vec::new();
        let mut index: FastHashMap<(usize, usize), usize> =
            fast_hash_map_with_capacity(segments.len());
        for (segment, mut points) in segments.iter().zip(splits) {
            points.sort_by_key(|(t, _)| OrderedFloat(*t));
            let ids: Vec<usize> = points.iter().map(|(_, p)| snapper.snap(*p)).collect();
            for w in ids.windows(2) {
                let (a, b) = (w[0], w[1]);
                if a == b {
                    continue;
                }
                let key = (a.min(b), a.max(b));
                let e = *index.entry(key).or_insert_with(|| {
                    edges.push(Edge {
                        a,
                        b,
                        sources: EdgeSources::new(),
                        alive: true,
                    });
                    edges.len() - 1
                });
                if !edges[e].sources.contains(&segment.source) {
                    edges[e].sources.push(segment.source);
                }
            }
        }

        Self {
            nodes: snapper.into_nodes(),
            edges,
        }
    }

    /// Number of distinct nodes.
    #[must_use]
    pub fn number_of_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges not pruned.
    #[must_use]
    pub fn number_of_edges(&self) -> usize {
        self.edges.iter().filter(|e| e.alive).count()
    }

    fn origin(&self, h: usize) -> usize {
        let e = &self.edges[h / 2];
        if h % 2 == 0 { e.a } else { e.b }
    }

    fn dest(&self, h: usize) -> usize {
        self.origin(h ^ 1)
    }

    /// Removes edges with a free end until none is left.
    fn prune_dangles(&mut self) -> usize {
        let mut incident: Vec<SmallBuffer<usize, 4>> = vec![SmallBuffer::new(); self.nodes.len()];
        for (e, edge) in self.edges.iter().enumerate().filter(|(_, e)| e.alive) {
            incident[edge.a].push(e);
            incident[edge.b].push(e);
        }
        let mut degree: Vec<usize> = incident.iter().map(SmallBuffer::len).collect();
        let mut queue: VecDeque<usize> = (0..self.nodes.len()).filter(|n| degree[*n] == 1).collect();
        let mut removed = 0;
        while let Some(n) = queue.pop_front() {
            let Some(&e) = incident[n].iter().find(|e| self.edges[**e].alive) else {
                continue;
            };
            self.edges[e].alive = false;
            removed += 1;
            for end in [self.edges[e].a, self.edges[e].b] {
                degree[end] -= 1;
                if degree[end] == 1 {
                    queue.push_back(end);
                }
            }
        }
        removed
    }

    /// Traces all half-edge cycles of the live edges.
    fn trace(&self) -> Vec<Cycle> {
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for (e, _) in self.edges.iter().enumerate().filter(|(_, e)| e.alive) {
            outgoing[self.origin(2 * e)].push(2 * e);
            outgoing[self.origin(2 * e + 1)].push(2 * e + 1);
        }
        let mut position = vec![0; self.edges.len() * 2];
        for list in &mut outgoing {
            list.sort_by_key(|h| {
                let (o, d) = (self.nodes[self.origin(*h)], self.nodes[self.dest(*h)]);
                OrderedFloat((d.y - o.y).atan2(d.x - o.x))
            });
            for (i, h) in list.iter().enumerate() {
                position[*h] = i;
            }
        }

        let next = |h: usize| -> usize {
            let twin = h ^ 1;
            let list = &outgoing[self.dest(h)];
            list[(position[twin] + list.len() - 1) % list.len()]
        };

        let mut visited = vec![false; self.edges.len() * 2];
        let mut cycles = Vec::new();
        for start in (0..self.edges.len() * 2).filter(|h| self.edges[h / 2].alive) {
            if visited[start] {
                continue;
            }
            let mut half_edges = Vec::new();
            let mut twice_area = 0.0;
            let mut h = start;
            while !visited[h] {
                visited[h] = true;
                half_edges.push(h);
                let (o, d) = (self.nodes[self.origin(h)], self.nodes[self.dest(h)]);
                twice_area += o.x.mul_add(d.y, -(d.x * o.y));
                h = next(h);
            }
            cycles.push(Cycle {
                half_edges,
                area: twice_area / 2.0,
            });
        }
        cycles
    }

    fn ring(&self, cycle: &Cycle) -> LineString<f64> {
        let mut coords: Vec<Coord<f64>> = cycle
            .half_edges
            .iter()
            .map(|h| self.nodes[self.origin(*h)])
            .collect();
        if let Some(first) = coords.first().copied() {
            coords.push(first);
        }
        LineString::new(coords)
    }

    fn lines_of(&self, cycle: &Cycle, lines: &mut BTreeSet<FeatureId>) {
        for h in &cycle.half_edges {
            lines.extend(self.edges[h / 2].sources.iter().filter_map(|s| match s {
                EdgeSource::Line(id) => Some(*id),
                EdgeSource::Boundary => None,
            }));
        }
    }

    /// Extracts the bounded faces with area of at least `min_area`.
    ///
    /// Dangling edges and bridges are pruned from the arrangement first.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pseudosection::geometry::arrangement::{Arrangement, EdgeSource, Segment};
    /// use pseudosection::geometry::boundary::rectangle_edges;
    /// use geo::{Line, Rect, coord};
    ///
    /// let rect = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 4.0, y: 4.0 });
    /// let mut segments: Vec<Segment> = rectangle_edges(&rect)
    ///     .into_iter()
    ///     .map(|line| Segment { line, source: EdgeSource::Boundary })
    ///     .collect();
    /// // A spur ending inside the square bounds no face.
    /// segments.push(Segment {
    ///     line: Line::new(coord! { x: 0.0, y: 2.0 }, coord! { x: 1.0, y: 2.0 }),
    ///     source: EdgeSource::Boundary,
    /// });
    /// let mut arrangement = Arrangement::build(&segments, 1e-9);
    /// let faces = arrangement.faces(0.0);
    /// assert_eq!(faces.len(), 1);
    /// ```
    pub fn faces(&mut self, min_area: f64) -> Vec<Face> {
        let cycles = loop {
            self.prune_dangles();
            let cycles = self.trace();
            let mut cycle_of = vec![usize::MAX; self.edges.len() * 2];
            for (c, cycle) in cycles.iter().enumerate() {
                for h in &cycle.half_edges {
                    cycle_of[*h] = c;
                }
            }
            let mut bridges = 0;
            for (e, edge) in self.edges.iter_mut().enumerate() {
                if edge.alive && cycle_of[2 * e] == cycle_of[2 * e + 1] {
                    edge.alive = false;
                    bridges += 1;
                }
            }
            if bridges == 0 {
                break cycles;
            }
            tracing::debug!("Removed {bridges} bridge edge(s) from the arrangement");
        };

        let outer = cycles
            .iter()
            .enumerate()
            .filter(|(_, c)| c.area < 0.0)
            .min_by_key(|(_, c)| OrderedFloat(c.area))
            .map(|(i, _)| i);

        let mut faces: Vec<(Face, f64, LineString<f64>)> = Vec::new();
        let mut holes: Vec<&Cycle> = Vec::new();
        for (i, cycle) in cycles.iter().enumerate() {
            if cycle.area > 0.0 {
                let ring = self.ring(cycle);
                let mut lines = BTreeSet::new();
                self.lines_of(cycle, &mut lines);
                let face = Face {
                    polygon: Polygon::new(ring.clone(), Vec::new()),
                    lines,
                };
                faces.push((face, cycle.area, ring));
            } else if cycle.area < 0.0 && Some(i) != outer {
                holes.push(cycle);
            }
        }

        for hole in holes {
            let Some(probe) = hole
                .half_edges
                .first()
                .map(|h| Point::from(self.nodes[self.origin(*h)]))
            else {
                continue;
            };
            let host = faces
                .iter_mut()
                .filter(|(_, _, ring)| Polygon::new(ring.clone(), Vec::new()).contains(&probe))
                .min_by_key(|(_, area, _)| OrderedFloat(*area));
            if let Some((face, _, _)) = host {
                face.polygon.interiors_push(self.ring(hole));
                self.lines_of(hole, &mut face.lines);
            }
        }

        faces
            .into_iter()
            .map(|(face, _, _)| face)
            .filter(|face| face.polygon.unsigned_area() >= min_area)
            .collect()
    }
}
