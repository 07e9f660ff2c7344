//! Core mapping pipeline shared by the CLI and library users.
//! Single pass, fully in memory, no I/O outside the explicit load/write steps.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::floorplan::{BoundingBox, Floorplan, NearestIndex};
use crate::inputs::{self, NameMappings, PowerTrace};
use crate::netlist::{ElementKind, Netlist, NetlistRewriter, RewriteStats};
use crate::pwl::{self, PwlConfig};
use crate::report::ProximityReport;

#[derive(Debug, thiserror::Error)]
pub enum NoiseMapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error in {source_name} at line {line}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        message: String,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Floorplan has zero extent along the {axis} axis and cannot be scaled")]
    DegenerateBoundingBox { axis: char },
    #[error("Floorplan has no regions")]
    EmptyFloorplan,
    #[error("Netlist contains no coordinate-bearing tokens")]
    NoCoordinates,
    #[error("No name mapping for floorplan unit {0}")]
    MissingMapping(String),
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

/// Which generation of the mapping rules to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Every cycle in the waveform, target box from all netlist
    /// coordinates, unmapped floorplan units skipped, inductor report.
    #[default]
    Complete,
    /// Non-zero cycles only, target box from current sources, every
    /// floorplan unit must be mapped, no inductor report.
    Legacy,
}

/// Options for a mapping run (CLI or config file).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub mode: Mode,
    pub cycle_time: f64,
    pub rise_time: f64,
    pub fall_time: f64,
    pub current_scale: f64,
    pub time_prefix: String,
    pub time_precision: usize,
    pub amplitude_precision: usize,
    /// Nearest inductors kept per floorplan region.
    pub inductor_count: usize,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Complete,
            cycle_time: 1.0,
            rise_time: 0.1,
            fall_time: 0.1,
            current_scale: 1.0,
            time_prefix: "N".to_string(),
            time_precision: 6,
            amplitude_precision: 6,
            inductor_count: 4,
        }
    }
}

impl MapOptions {
    /// Timing from a clock frequency in GHz: the cycle is `1 / f` ns and
    /// the pulse rises and falls over 10% of it each.
    pub fn from_clock_ghz(frequency: f64) -> Result<Self, NoiseMapError> {
        let mut options = Self::default();
        options.set_clock_ghz(frequency)?;
        Ok(options)
    }

    pub fn set_clock_ghz(&mut self, frequency: f64) -> Result<(), NoiseMapError> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(NoiseMapError::InvalidOption(format!(
                "clock frequency must be positive, got {}",
                frequency
            )));
        }
        self.cycle_time = 1.0 / frequency;
        self.rise_time = 0.1 * self.cycle_time;
        self.fall_time = 0.1 * self.cycle_time;
        Ok(())
    }

    pub fn from_json_file(path: &Path) -> Result<Self, NoiseMapError> {
        let content = std::fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&content)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), NoiseMapError> {
        if !(self.cycle_time.is_finite() && self.cycle_time > 0.0) {
            return Err(NoiseMapError::InvalidOption(format!(
                "cycle time must be positive, got {}",
                self.cycle_time
            )));
        }
        for (name, value) in [("rise time", self.rise_time), ("fall time", self.fall_time)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(NoiseMapError::InvalidOption(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn pwl_config(&self) -> PwlConfig {
        PwlConfig::from(self)
    }
}

/// Paths of the four run inputs.
#[derive(Clone, Debug)]
pub struct InputPaths {
    pub name_mappings: PathBuf,
    pub floorplan: PathBuf,
    pub power_trace: PathBuf,
    pub netlist: PathBuf,
}

/// Everything a run needs, already loaded.
#[derive(Clone, Debug)]
pub struct RunInputs {
    /// Unscaled floorplan, regions keyed to power-trace columns.
    pub floorplan: Floorplan,
    pub power_trace: PowerTrace,
    pub netlist: Netlist,
}

/// Result of a run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub netlist: Netlist,
    /// Floorplan after scaling into netlist coordinates.
    pub floorplan: Floorplan,
    pub target_box: BoundingBox,
    pub stats: RewriteStats,
    /// Present in complete mode only.
    pub report: Option<ProximityReport>,
}

impl RunOutput {
    pub fn has_misses(&self) -> bool {
        self.stats.miss > 0
    }
}

/// Pipeline entry points.
pub struct NoiseMapCore;

impl NoiseMapCore {
    /// Load every input from disk.
    pub fn load(paths: &InputPaths, options: &MapOptions) -> Result<RunInputs, NoiseMapError> {
        let mappings: NameMappings = inputs::load_name_mappings(&paths.name_mappings)?;
        let floorplan = inputs::load_floorplan(&paths.floorplan, &mappings, options.mode)?;
        let power_trace = inputs::load_power_trace(&paths.power_trace)?;
        let netlist = inputs::load_netlist(&paths.netlist)?;
        Ok(RunInputs {
            floorplan,
            power_trace,
            netlist,
        })
    }

    /// Waveform text per power-trace column.
    pub fn waveforms(trace: &PowerTrace, options: &MapOptions) -> HashMap<String, String> {
        pwl::synthesize_all(trace, &options.pwl_config())
            .into_iter()
            .collect()
    }

    /// Run the mapping on loaded inputs.
    pub fn run(inputs: RunInputs, options: &MapOptions) -> Result<RunOutput, NoiseMapError> {
        options.validate()?;
        let RunInputs {
            mut floorplan,
            power_trace,
            mut netlist,
        } = inputs;

        let waveforms = Self::waveforms(&power_trace, options);
        for region in floorplan.regions() {
            if !waveforms.contains_key(&region.column) {
                tracing::warn!(
                    "Power trace has no column {} for floorplan unit {}; using a zero waveform",
                    region.column,
                    region.name
                );
            }
        }

        tracing::info!("Computing bounding box of netlist coordinates");
        let target_box = netlist
            .coordinate_bounding_box(options.mode)
            .ok_or(NoiseMapError::NoCoordinates)?;
        tracing::debug!("Target box {:?}", target_box.as_array());

        tracing::info!("Scaling floorplan");
        floorplan.scale_to(&target_box)?;

        tracing::info!("Converting current sources to PWL");
        let (stats, report) = Self::resolve(&floorplan, &waveforms, &mut netlist, options);
        tracing::info!(
            "hit: {}, miss: {}, unpositioned: {}",
            stats.hit,
            stats.miss,
            stats.unpositioned
        );

        Ok(RunOutput {
            netlist,
            floorplan,
            target_box,
            stats,
            report,
        })
    }

    /// One pass over the netlist: current sources are rewritten, inductors
    /// are ranked against every region.
    fn resolve(
        floorplan: &Floorplan,
        waveforms: &HashMap<String, String>,
        netlist: &mut Netlist,
        options: &MapOptions,
    ) -> (RewriteStats, Option<ProximityReport>) {
        let rewriter = NetlistRewriter::new(floorplan, waveforms);
        let track_inductors = options.mode == Mode::Complete;
        let mut index = NearestIndex::new(floorplan.len(), options.inductor_count);
        let mut inductors = Vec::new();
        let mut stats = RewriteStats::default();

        for element in netlist.elements.iter_mut() {
            match element.kind() {
                ElementKind::CurrentSource => stats.record(&rewriter.rewrite_element(element)),
                ElementKind::Inductor if track_inductors => {
                    let name = element.name().unwrap_or_default().to_string();
                    match element.terminals() {
                        Some((point, left, right)) => {
                            index.observe(floorplan.regions(), &point, &name, left, right)
                        }
                        None => tracing::debug!("No terminal position on inductor {}", name),
                    }
                    inductors.push(name);
                }
                _ => {}
            }
        }

        let report = track_inductors.then(|| ProximityReport::new(inductors, floorplan, index));
        (stats, report)
    }

    /// Load, run, and write the rewritten netlist (and the inductor report
    /// when a path is given). Nothing is written if any step fails.
    pub fn run_files(
        paths: &InputPaths,
        output: &Path,
        report_path: Option<&Path>,
        options: &MapOptions,
    ) -> Result<RunOutput, NoiseMapError> {
        options.validate()?;
        let inputs = Self::load(paths, options)?;
        let result = Self::run(inputs, options)?;

        inputs::write_netlist(output, &result.netlist)?;
        if let (Some(path), Some(report)) = (report_path, result.report.as_ref()) {
            inputs::write_report(path, report)?;
        }
        Ok(result)
    }
}
