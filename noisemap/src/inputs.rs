//! Input loaders and output writers.
//!
//! Reads the four run inputs:
//! 1. Name mappings: JSON object `{"floorplan_label": "powertrace_column"}`
//! 2. Floorplan: tab-separated `label width height x_offset y_offset` rows
//! 3. Power trace: CSV with a header of component names, one row per cycle
//! 4. Netlist: SPICE text
//!
//! Lines starting with `#` are comments in the floorplan and netlist.

use std::collections::HashMap;
use std::path::Path;

use crate::core::{Mode, NoiseMapError};
use crate::floorplan::{Floorplan, Region};
use crate::netlist::Netlist;
use crate::report::ProximityReport;

/// Floorplan label -> power-trace column.
pub type NameMappings = HashMap<String, String>;

fn source_name(path: &Path) -> String {
    path.display().to_string()
}

fn read(path: &Path) -> Result<String, NoiseMapError> {
    std::fs::read_to_string(path).map_err(|e| {
        NoiseMapError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })
}

pub fn parse_name_mappings(text: &str) -> Result<NameMappings, NoiseMapError> {
    Ok(serde_json::from_str(text)?)
}

pub fn load_name_mappings(path: &Path) -> Result<NameMappings, NoiseMapError> {
    tracing::info!("Loading name mappings from {}", path.display());
    parse_name_mappings(&read(path)?)
}

/// Parse floorplan rows into regions named by label and keyed to their
/// mapped power-trace column.
///
/// Rows whose label has no mapping are skipped in complete mode and are a
/// configuration error in legacy mode.
pub fn parse_floorplan(
    text: &str,
    mappings: &NameMappings,
    mode: Mode,
    source: &str,
) -> Result<Floorplan, NoiseMapError> {
    let mut floorplan = Floorplan::new();
    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let mut fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        if fields.len() < 5 {
            fields = line.split_whitespace().collect();
        }
        if fields.len() < 5 {
            return Err(NoiseMapError::Parse {
                source_name: source.to_string(),
                line: line_no,
                message: format!("expected 5 fields, found {}", fields.len()),
            });
        }
        let label = fields[0];
        let mut values = [0.0f64; 4];
        for (slot, field) in values.iter_mut().zip(&fields[1..5]) {
            *slot = field.parse().map_err(|_| NoiseMapError::Parse {
                source_name: source.to_string(),
                line: line_no,
                message: format!("invalid number '{}' for {}", field, label),
            })?;
        }
        let [width, height, x_offset, y_offset] = values;

        let Some(column) = mappings.get(label) else {
            if mode == Mode::Legacy {
                return Err(NoiseMapError::MissingMapping(label.to_string()));
            }
            tracing::debug!("Skipping floorplan unit {} with no name mapping", label);
            continue;
        };
        floorplan.insert(Region::from_placement(
            label, column, width, height, x_offset, y_offset,
        ));
    }
    Ok(floorplan)
}

pub fn load_floorplan(
    path: &Path,
    mappings: &NameMappings,
    mode: Mode,
) -> Result<Floorplan, NoiseMapError> {
    tracing::info!("Loading floorplan from {}", path.display());
    let floorplan = parse_floorplan(&read(path)?, mappings, mode, &source_name(path))?;
    tracing::info!("Loaded {} floorplan regions", floorplan.len());
    Ok(floorplan)
}

/// Per-component power samples, one value per cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerTrace {
    names: Vec<String>,
    samples: Vec<Vec<f64>>,
}

impl PowerTrace {
    /// Build from `(component, samples)` columns.
    pub fn from_columns(columns: impl IntoIterator<Item = (String, Vec<f64>)>) -> Self {
        let (names, samples) = columns.into_iter().unzip();
        Self { names, samples }
    }

    /// Columns in header order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.samples.iter().map(Vec::as_slice))
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.samples[i].as_slice())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of cycles (rows).
    pub fn cycles(&self) -> usize {
        self.samples.first().map(Vec::len).unwrap_or(0)
    }
}

/// Split one CSV record. Double-quoted fields may contain commas, and `""`
/// inside quotes is a literal quote. Unquoted fields are trimmed.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() && !quoted => {
                field.clear();
                quoted = true;
                in_quotes = true;
            }
            ',' if !in_quotes => {
                fields.push(finish_field(&mut field, quoted));
                quoted = false;
            }
            _ => field.push(c),
        }
    }
    fields.push(finish_field(&mut field, quoted));
    fields
}

fn finish_field(field: &mut String, quoted: bool) -> String {
    let text = std::mem::take(field);
    if quoted {
        // whitespace between the closing quote and the delimiter
        text.trim_end().to_string()
    } else {
        text.trim().to_string()
    }
}

/// Parse a comma-separated power trace.
pub fn parse_power_trace(text: &str, source: &str) -> Result<PowerTrace, NoiseMapError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());
    let Some((_, header)) = lines.next() else {
        return Ok(PowerTrace::default());
    };
    let names = split_record(header);
    let mut samples: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

    for (index, line) in lines {
        let fields = split_record(line);
        if fields.len() != names.len() {
            return Err(NoiseMapError::Parse {
                source_name: source.to_string(),
                line: index + 1,
                message: format!("expected {} columns, found {}", names.len(), fields.len()),
            });
        }
        for (column, field) in samples.iter_mut().zip(fields) {
            let value = field.parse::<f64>().map_err(|_| NoiseMapError::Parse {
                source_name: source.to_string(),
                line: index + 1,
                message: format!("invalid power value '{}'", field),
            })?;
            column.push(value);
        }
    }
    Ok(PowerTrace::from_columns(names.into_iter().zip(samples)))
}

pub fn load_power_trace(path: &Path) -> Result<PowerTrace, NoiseMapError> {
    tracing::info!("Loading power trace from {}", path.display());
    let trace = parse_power_trace(&read(path)?, &source_name(path))?;
    tracing::info!(
        "Loaded {} components over {} cycles",
        trace.names().len(),
        trace.cycles()
    );
    Ok(trace)
}

pub fn load_netlist(path: &Path) -> Result<Netlist, NoiseMapError> {
    tracing::info!("Loading SPICE netlist from {}", path.display());
    Ok(Netlist::parse(&read(path)?))
}

pub fn write_netlist(path: &Path, netlist: &Netlist) -> Result<(), NoiseMapError> {
    tracing::info!("Writing SPICE netlist to {}", path.display());
    std::fs::write(path, netlist.render())?;
    Ok(())
}

pub fn write_report(path: &Path, report: &ProximityReport) -> Result<(), NoiseMapError> {
    tracing::info!("Writing inductor report to {}", path.display());
    std::fs::write(path, report.to_json_pretty()?)?;
    Ok(())
}
