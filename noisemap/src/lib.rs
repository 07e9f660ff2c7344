//! NoiseMap - floorplan-driven power sources for SPICE netlists
//!
//! This library converts the idealized current sources of a power-grid
//! netlist into piecewise-linear (PWL) waveforms taken from a per-component
//! power trace, and ranks the inductors nearest to every floorplan unit.
//!
//! # Quick Start
//!
//! ```no_run
//! use noisemap::{InputPaths, MapOptions, NoiseMapCore};
//! use std::path::{Path, PathBuf};
//!
//! let paths = InputPaths {
//!     name_mappings: PathBuf::from("names.json"),
//!     floorplan: PathBuf::from("chip.flp"),
//!     power_trace: PathBuf::from("power.csv"),
//!     netlist: PathBuf::from("grid.sp"),
//! };
//! let result = NoiseMapCore::run_files(
//!     &paths,
//!     Path::new("grid_pwl.sp"),
//!     Some(Path::new("inductors.json")),
//!     &MapOptions::default(),
//! ).unwrap();
//!
//! println!("hit: {} miss: {}", result.stats.hit, result.stats.miss);
//! ```
//!
//! # Pipeline
//!
//! - **Element classification**: current sources, inductors and pulse
//!   specifications, plus the layout coordinates embedded in node names
//! - **PWL synthesis**: one triangular pulse per power-trace cycle
//! - **Floorplan scaling**: the floorplan's bounding box is mapped onto the
//!   netlist's coordinate bounding box
//! - **Spatial resolution**: point-in-region lookup for current sources,
//!   bounded nearest-k ranking for inductors
//! - **Rewriting**: source specifications replaced in place, misses tagged

pub mod core;
pub mod floorplan;
pub mod inputs;
pub mod netlist;
pub mod pwl;
pub mod report;

// Re-export main types
pub use crate::core::{
    InputPaths, MapOptions, Mode, NoiseMapCore, NoiseMapError, RunInputs, RunOutput,
};
pub use floorplan::{BoundingBox, Floorplan, NearestEntry, NearestSet, Region, Span};
pub use inputs::{NameMappings, PowerTrace};
pub use netlist::{Element, ElementKind, Netlist, Point, RewriteStats};
pub use pwl::PwlConfig;
pub use report::ProximityReport;

/// Parse netlist text (convenience wrapper).
pub fn parse_netlist(text: &str) -> Netlist {
    Netlist::parse(text)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        ElementKind, InputPaths, MapOptions, Mode, Netlist, NoiseMapCore, NoiseMapError,
        ProximityReport, RewriteStats, RunInputs, RunOutput,
    };
}
