//! In-place rewriting of current-source lines.

use std::collections::HashMap;

use serde::Serialize;

use super::element::{is_source_spec, Element, ElementKind};
use crate::floorplan::{Floorplan, Region};
use crate::pwl;

/// Prepended to the first token of a current source that lies outside
/// every region. SPICE treats the line as a comment from then on.
pub const MISS_MARKER: &str = "*";

/// Index of the first token the waveform replaces: the leading
/// element name and two nodes are always kept.
const FIRST_SPEC_TOKEN: usize = 3;

/// Hit/miss accounting over current sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    pub hit: usize,
    pub miss: usize,
    /// Current sources with no parseable position; left untouched.
    pub unpositioned: usize,
}

impl RewriteStats {
    pub fn current_sources(&self) -> usize {
        self.hit + self.miss + self.unpositioned
    }

    pub fn record(&mut self, outcome: &ResolveOutcome) {
        match outcome {
            ResolveOutcome::Hit(_) => self.hit += 1,
            ResolveOutcome::Miss => self.miss += 1,
            ResolveOutcome::Unpositioned => self.unpositioned += 1,
            ResolveOutcome::NotApplicable => {}
        }
    }
}

/// What happened to one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Rewritten from the named region's waveform.
    Hit(String),
    Miss,
    Unpositioned,
    /// Not a current source.
    NotApplicable,
}

/// Replace an element's source specification with `waveform`.
///
/// Everything from the first `PULSE`/`PWL` token at or after the fourth
/// token is dropped; without one, everything after the third token is.
/// Lines shorter than three tokens are left alone.
pub fn replace_source_spec(element: &mut Element, waveform: &str) -> bool {
    if element.tokens.len() < FIRST_SPEC_TOKEN {
        return false;
    }
    let cut = element
        .tokens
        .iter()
        .enumerate()
        .skip(FIRST_SPEC_TOKEN)
        .find(|(_, t)| is_source_spec(t))
        .map(|(i, _)| i)
        .unwrap_or(FIRST_SPEC_TOKEN);
    element.tokens.truncate(cut);
    element.tokens.push(waveform.to_string());
    true
}

/// Tag an element as unmatched.
pub fn mark_miss(element: &mut Element) {
    if let Some(first) = element.tokens.first_mut() {
        first.insert_str(0, MISS_MARKER);
    }
}

/// Rewrites current sources from a scaled floorplan and per-column waveforms.
pub struct NetlistRewriter<'a> {
    floorplan: &'a Floorplan,
    waveforms: &'a HashMap<String, String>,
    fallback: String,
}

impl<'a> NetlistRewriter<'a> {
    pub fn new(floorplan: &'a Floorplan, waveforms: &'a HashMap<String, String>) -> Self {
        Self {
            floorplan,
            waveforms,
            fallback: pwl::zero_waveform(),
        }
    }

    /// Waveform for a region's power-trace column.
    pub fn waveform_for(&self, region: &Region) -> &str {
        self.waveforms
            .get(&region.column)
            .map(String::as_str)
            .unwrap_or(self.fallback.as_str())
    }

    /// Resolve and rewrite a single element. Only current sources change.
    pub fn rewrite_element(&self, element: &mut Element) -> ResolveOutcome {
        if element.kind() != ElementKind::CurrentSource {
            return ResolveOutcome::NotApplicable;
        }
        let Some(position) = element.position() else {
            tracing::debug!(
                "No position on current source {}",
                element.name().unwrap_or_default()
            );
            return ResolveOutcome::Unpositioned;
        };
        match self.floorplan.locate(&position) {
            Some(region) => {
                replace_source_spec(element, self.waveform_for(region));
                ResolveOutcome::Hit(region.name.clone())
            }
            None => {
                mark_miss(element);
                ResolveOutcome::Miss
            }
        }
    }

    /// Rewrite every current source in `elements`.
    pub fn rewrite_all(&self, elements: &mut [Element]) -> RewriteStats {
        let mut stats = RewriteStats::default();
        for element in elements.iter_mut() {
            stats.record(&self.rewrite_element(element));
        }
        stats
    }
}
