//! Point-in-region lookup and per-region nearest inductor ranking.

use indexmap::IndexMap;
use serde::Serialize;

use super::Region;
use crate::netlist::element::Point;

/// First region (in floorplan order) containing `point`, edges inclusive.
pub fn locate<'a>(regions: &'a [Region], point: &Point) -> Option<&'a Region> {
    regions.iter().find(|r| r.contains(point))
}

/// One inductor recorded against a region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestEntry {
    #[serde(skip)]
    pub inductor: String,
    pub left: String,
    pub right: String,
    pub distance: f64,
}

impl NearestEntry {
    pub fn new(
        inductor: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
        distance: f64,
    ) -> Self {
        Self {
            inductor: inductor.into(),
            left: left.into(),
            right: right.into(),
            distance,
        }
    }
}

/// The `k` closest inductors seen so far for one region, keyed by name.
///
/// Entries stay in insertion order. When full, the entry evicted is the one
/// with the greatest distance, the most recently inserted among equals. A
/// candidate replaces it only if strictly closer, except that a contained
/// (zero-distance) candidate always takes a slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NearestSet {
    #[serde(skip)]
    capacity: usize,
    entries: IndexMap<String, NearestEntry>,
}

impl NearestSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: IndexMap::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &NearestEntry> {
        self.entries.values()
    }

    pub fn get(&self, inductor: &str) -> Option<&NearestEntry> {
        self.entries.get(inductor)
    }

    /// Offer a candidate. Returns whether the set changed.
    pub fn offer(&mut self, candidate: NearestEntry) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if let Some(existing) = self.entries.get_mut(&candidate.inductor) {
            if candidate.distance < existing.distance {
                *existing = candidate;
                return true;
            }
            return false;
        }
        if self.entries.len() < self.capacity {
            self.entries.insert(candidate.inductor.clone(), candidate);
            return true;
        }
        let Some(worst) = self.worst() else {
            return false;
        };
        if candidate.distance == 0.0 || candidate.distance < self.entries[worst].distance {
            self.entries.shift_remove_index(worst);
            self.entries.insert(candidate.inductor.clone(), candidate);
            true
        } else {
            false
        }
    }

    fn worst(&self) -> Option<usize> {
        let mut worst: Option<(usize, f64)> = None;
        for (i, entry) in self.entries.values().enumerate() {
            match worst {
                Some((_, d)) if entry.distance < d => {}
                _ => worst = Some((i, entry.distance)),
            }
        }
        worst.map(|(i, _)| i)
    }
}

/// Offer an inductor, located by its left terminal `point`, to every region's set.
///
/// `best_sets` is parallel to `regions`.
pub fn update_nearest(
    regions: &[Region],
    point: &Point,
    inductor: &str,
    left: &str,
    right: &str,
    best_sets: &mut [NearestSet],
) {
    debug_assert_eq!(regions.len(), best_sets.len());
    for (region, set) in regions.iter().zip(best_sets.iter_mut()) {
        let distance = region.distance_to(point);
        set.offer(NearestEntry::new(inductor, left, right, distance));
    }
}

/// One [`NearestSet`] per floorplan region.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestIndex {
    sets: Vec<NearestSet>,
}

impl NearestIndex {
    pub fn new(region_count: usize, k: usize) -> Self {
        Self {
            sets: (0..region_count).map(|_| NearestSet::new(k)).collect(),
        }
    }

    pub fn observe(
        &mut self,
        regions: &[Region],
        point: &Point,
        inductor: &str,
        left: &str,
        right: &str,
    ) {
        update_nearest(regions, point, inductor, left, right, &mut self.sets);
    }

    pub fn sets(&self) -> &[NearestSet] {
        &self.sets
    }

    pub fn into_sets(self) -> Vec<NearestSet> {
        self.sets
    }
}
