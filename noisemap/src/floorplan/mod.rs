//! Floorplan regions and the affine mapping onto netlist coordinates.
//!
//! A floorplan describes component rectangles in its own units and origin.
//! Before any lookups, the whole floorplan is rescaled per axis so that its
//! bounding box coincides with the bounding box of the coordinates found in
//! the netlist.

pub mod spatial;

use serde::{Deserialize, Serialize};

use crate::core::NoiseMapError;
use crate::netlist::element::Point;

pub use spatial::{locate, update_nearest, NearestEntry, NearestIndex, NearestSet};

/// A closed interval on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }

    /// Smallest span covering all values, `None` for an empty input.
    pub fn covering(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(Span::new(v, v)),
            Some(s) => Some(Span::new(s.min.min(v), s.max.max(v))),
        })
    }

    fn extend(&self, other: &Span) -> Span {
        Span::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Map `v` from `source` onto `self`. `source` must have non-zero width.
    ///
    /// Interpolates between the endpoints so `source.min` and `source.max`
    /// land exactly on `self.min` and `self.max`.
    fn remap(&self, v: f64, source: &Span) -> f64 {
        let t = (v - source.min) / source.width();
        self.min * (1.0 - t) + self.max * t
    }
}

/// Axis-aligned bounding box, `[[x_min, x_max], [y_min, y_max]]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: Span,
    pub y: Span,
}

impl BoundingBox {
    pub fn new(x: Span, y: Span) -> Self {
        Self { x, y }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            let point_box = BoundingBox::new(Span::new(p.x, p.x), Span::new(p.y, p.y));
            Some(match acc {
                None => point_box,
                Some(b) => b.union(&point_box),
            })
        })
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(self.x.extend(&other.x), self.y.extend(&other.y))
    }

    pub fn as_array(&self) -> [[f64; 2]; 2] {
        [[self.x.min, self.x.max], [self.y.min, self.y.max]]
    }
}

/// A named floorplan rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Floorplan label, unique within a floorplan.
    pub name: String,
    /// Power-trace column the region draws its waveform from.
    pub column: String,
    pub x: Span,
    pub y: Span,
}

impl Region {
    pub fn new(name: impl Into<String>, column: impl Into<String>, x: Span, y: Span) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            x,
            y,
        }
    }

    /// Region from a floorplan row: size plus lower-left offset.
    pub fn from_placement(
        name: impl Into<String>,
        column: impl Into<String>,
        width: f64,
        height: f64,
        x_offset: f64,
        y_offset: f64,
    ) -> Self {
        Self::new(
            name,
            column,
            Span::new(x_offset, x_offset + width),
            Span::new(y_offset, y_offset + height),
        )
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, p: &Point) -> bool {
        self.x.contains(p.x) && self.y.contains(p.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x.center(), self.y.center())
    }

    /// Zero inside the region, otherwise Manhattan distance to its center.
    pub fn distance_to(&self, p: &Point) -> f64 {
        if self.contains(p) {
            0.0
        } else {
            p.manhattan(&self.center())
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.x, self.y)
    }
}

/// Bounding box over every region's extents.
pub fn bounding_box(regions: &[Region]) -> Option<BoundingBox> {
    regions
        .iter()
        .map(Region::bounds)
        .reduce(|a, b| a.union(&b))
}

/// Rescale `regions` in place so their joint bounding box becomes `target`.
///
/// The source box is computed once up front; every edge of every region is
/// mapped against that same box.
pub fn scale(regions: &mut [Region], target: &BoundingBox) -> Result<(), NoiseMapError> {
    let source = bounding_box(regions).ok_or(NoiseMapError::EmptyFloorplan)?;
    if source.x.width() == 0.0 {
        return Err(NoiseMapError::DegenerateBoundingBox { axis: 'x' });
    }
    if source.y.width() == 0.0 {
        return Err(NoiseMapError::DegenerateBoundingBox { axis: 'y' });
    }
    for region in regions.iter_mut() {
        region.x = Span::new(
            target.x.remap(region.x.min, &source.x),
            target.x.remap(region.x.max, &source.x),
        );
        region.y = Span::new(
            target.y.remap(region.y.min, &source.y),
            target.y.remap(region.y.max, &source.y),
        );
    }
    Ok(())
}

/// Regions in insertion order. Lookups resolve ties to the earliest region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Floorplan {
    regions: Vec<Region>,
}

impl Floorplan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region. A region with an existing name replaces the old one in place.
    pub fn insert(&mut self, region: Region) {
        match self.regions.iter_mut().find(|r| r.name == region.name) {
            Some(existing) => {
                tracing::debug!("Floorplan region {} redefined", region.name);
                *existing = region;
            }
            None => self.regions.push(region),
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        bounding_box(&self.regions)
    }

    /// See [`scale`].
    pub fn scale_to(&mut self, target: &BoundingBox) -> Result<(), NoiseMapError> {
        scale(&mut self.regions, target)
    }

    /// First region containing `point`.
    pub fn locate(&self, point: &Point) -> Option<&Region> {
        locate(&self.regions, point)
    }
}

impl FromIterator<Region> for Floorplan {
    fn from_iter<I: IntoIterator<Item = Region>>(iter: I) -> Self {
        let mut floorplan = Floorplan::new();
        for region in iter {
            floorplan.insert(region);
        }
        floorplan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn sample_regions() -> Vec<Region> {
        vec![
            Region::from_placement("core", "Core", 4.0, 2.0, 0.0, 0.0),
            Region::from_placement("l2", "L2", 4.0, 3.0, 0.0, 2.0),
            Region::from_placement("io", "IO", 2.0, 5.0, 4.0, 0.0),
        ]
    }

    #[test]
    fn test_bounding_box() {
        let b = bounding_box(&sample_regions()).unwrap();
        assert_eq!(b.as_array(), [[0.0, 6.0], [0.0, 5.0]]);
        assert!(bounding_box(&[]).is_none());
    }

    #[test]
    fn test_scale_maps_box_onto_target() {
        let mut regions = sample_regions();
        let target = BoundingBox::new(Span::new(100.0, 400.0), Span::new(-50.0, 50.0));
        scale(&mut regions, &target).unwrap();

        let scaled = bounding_box(&regions).unwrap();
        assert_eq!(scaled.as_array(), [[100.0, 400.0], [-50.0, 50.0]]);

        // core spans x in [0, 4] of [0, 6] -> [100, 300]
        assert!(approx(regions[0].x.max, 300.0));
        // io starts at x = 4 -> 300, even after earlier regions moved
        assert!(approx(regions[2].x.min, 300.0));
        assert!(approx(regions[1].y.min, -10.0));
    }

    #[test]
    fn test_scale_hits_target_edges_exactly() {
        let mut regions = vec![Region::from_placement("a", "A", 10.0, 10.0, 0.0, 0.0)];
        let target = BoundingBox::new(Span::new(0.3, 2.3), Span::new(0.3, 2.3));
        scale(&mut regions, &target).unwrap();

        assert_eq!(regions[0].x, Span::new(0.3, 2.3));
        assert_eq!(regions[0].y, Span::new(0.3, 2.3));
        assert!(regions[0].contains(&Point::new(2.3, 2.3)));
        assert!(regions[0].contains(&Point::new(0.3, 0.3)));
    }

    #[test]
    fn test_scale_rejects_degenerate_source() {
        let mut regions = vec![Region::from_placement("a", "A", 0.0, 3.0, 1.0, 1.0)];
        let target = BoundingBox::new(Span::new(0.0, 1.0), Span::new(0.0, 1.0));
        assert!(matches!(
            scale(&mut regions, &target),
            Err(NoiseMapError::DegenerateBoundingBox { axis: 'x' })
        ));
        assert!(matches!(
            scale(&mut [], &target),
            Err(NoiseMapError::EmptyFloorplan)
        ));
    }

    #[test]
    fn test_distance_to() {
        let r = Region::new("a", "A", Span::new(0.0, 10.0), Span::new(0.0, 10.0));
        assert_eq!(r.distance_to(&Point::new(10.0, 0.0)), 0.0);
        assert!(approx(r.distance_to(&Point::new(12.0, 5.0)), 7.0));
        assert!(approx(r.distance_to(&Point::new(-1.0, -2.0)), 13.0));
    }

    #[test]
    fn test_insert_replaces_same_name() {
        let mut fp: Floorplan = sample_regions().into_iter().collect();
        fp.insert(Region::from_placement("core", "Core2", 1.0, 1.0, 0.0, 0.0));
        assert_eq!(fp.len(), 3);
        assert_eq!(fp.regions()[0].column, "Core2");
    }
}
