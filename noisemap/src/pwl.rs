//! PWL waveform synthesis.
//!
//! Every cycle `i` of a component's power trace becomes one triangular
//! pulse: zero at `i * T`, the sample value at `i * T + rise`, back to zero
//! at `i * T + rise + fall`. The pulses are concatenated into a single
//! `PWL(t1 v1 t2 v2 ...)` expression.

use crate::core::{MapOptions, Mode};
use crate::inputs::PowerTrace;

/// Placeholder body for a component with no samples at all.
pub const EMPTY_WAVEFORM_BODY: &str = "0 0";

/// Timing and number formatting for waveform text.
#[derive(Debug, Clone, PartialEq)]
pub struct PwlConfig {
    pub cycle_time: f64,
    pub rise_time: f64,
    pub fall_time: f64,
    /// Divisor applied to every raw sample.
    pub current_scale: f64,
    /// Unit suffix appended to every time value, e.g. `N` for nanoseconds.
    pub time_prefix: String,
    pub time_precision: usize,
    pub amplitude_precision: usize,
    pub mode: Mode,
}

impl Default for PwlConfig {
    fn default() -> Self {
        Self::from(&MapOptions::default())
    }
}

impl From<&MapOptions> for PwlConfig {
    fn from(options: &MapOptions) -> Self {
        Self {
            cycle_time: options.cycle_time,
            rise_time: options.rise_time,
            fall_time: options.fall_time,
            current_scale: options.current_scale,
            time_prefix: options.time_prefix.clone(),
            time_precision: options.time_precision,
            amplitude_precision: options.amplitude_precision,
            mode: options.mode,
        }
    }
}

/// One cycle's pulse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: f64,
    pub peak: f64,
    pub amplitude: f64,
    pub end: f64,
}

impl PwlConfig {
    /// Scaled amplitude for a raw sample; non-finite results become zero.
    pub fn amplitude(&self, sample: f64) -> f64 {
        let amplitude = sample / self.current_scale;
        if amplitude.is_finite() {
            amplitude
        } else {
            0.0
        }
    }

    /// Pulses for a sample sequence. Legacy mode drops zero-amplitude cycles.
    pub fn segments(&self, samples: &[f64]) -> Vec<Segment> {
        samples
            .iter()
            .enumerate()
            .map(|(i, &sample)| {
                let start = i as f64 * self.cycle_time;
                let peak = start + self.rise_time;
                Segment {
                    start,
                    peak,
                    amplitude: self.amplitude(sample),
                    end: peak + self.fall_time,
                }
            })
            .filter(|s| self.mode == Mode::Complete || s.amplitude != 0.0)
            .collect()
    }

    fn time(&self, t: f64) -> String {
        format!("{:.*}{}", self.time_precision, t, self.time_prefix)
    }

    fn format_segment(&self, segment: &Segment) -> String {
        format!(
            "{} 0 {} {:.*} {} 0",
            self.time(segment.start),
            self.time(segment.peak),
            self.amplitude_precision,
            segment.amplitude,
            self.time(segment.end),
        )
    }
}

/// Waveform text for one component.
pub fn synthesize(samples: &[f64], config: &PwlConfig) -> String {
    if samples.is_empty() && config.mode == Mode::Complete {
        return format!("PWL({})", EMPTY_WAVEFORM_BODY);
    }
    let body = config
        .segments(samples)
        .iter()
        .map(|s| config.format_segment(s))
        .collect::<Vec<_>>()
        .join(" ");
    format!("PWL({})", body)
}

/// Waveform text for every column of a power trace, in column order.
pub fn synthesize_all(trace: &PowerTrace, config: &PwlConfig) -> Vec<(String, String)> {
    trace
        .columns()
        .map(|(name, samples)| (name.to_string(), synthesize(samples, config)))
        .collect()
}

/// The waveform used when a component has no power data.
pub fn zero_waveform() -> String {
    format!("PWL({})", EMPTY_WAVEFORM_BODY)
}
