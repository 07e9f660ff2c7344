//! Inductor proximity report.
//!
//! Serialized as
//! `{"list": [inductor, ...], "nearest": {region: {inductor: {left, right, distance}}}}`
//! with regions in floorplan order and inductors in ranking-set order.

use indexmap::IndexMap;
use serde::Serialize;

use crate::core::NoiseMapError;
use crate::floorplan::{Floorplan, NearestIndex, NearestSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProximityReport {
    /// Every inductor encountered, in netlist order.
    pub list: Vec<String>,
    nearest: IndexMap<String, NearestSet>,
}

impl ProximityReport {
    /// Pair each region with its ranking set.
    pub fn new(list: Vec<String>, floorplan: &Floorplan, index: NearestIndex) -> Self {
        let nearest = floorplan
            .regions()
            .iter()
            .map(|r| r.name.clone())
            .zip(index.into_sets())
            .collect();
        Self { list, nearest }
    }

    pub fn nearest(&self, region: &str) -> Option<&NearestSet> {
        self.nearest.get(region)
    }

    pub fn regions(&self) -> impl Iterator<Item = (&str, &NearestSet)> {
        self.nearest.iter().map(|(name, set)| (name.as_str(), set))
    }

    pub fn to_json_pretty(&self) -> Result<String, NoiseMapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
