//! Netlist element classification and coordinate extraction.
//!
//! Element names and node names in the netlists this crate consumes carry
//! absolute layout coordinates as an underscore-delimited suffix, e.g.
//! `n12_1030.5_220` for a node at (1030.5, 220). This module recognises
//! the element kinds the pipeline cares about and pulls those points out
//! of the tokens.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static CURRENT_SOURCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^i").unwrap());
static INDUCTOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^l").unwrap());
static PULSE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^pulse").unwrap());
/// Any token with an `n` at the start or right after an underscore.
static COORDINATE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^n|_n)").unwrap());
/// Node token carrying a position suffix: `n<anything>_x_y`.
static POSITION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^n[^_]*_").unwrap());
/// Start of an existing source specification (`PULSE(...)` or `PWL(...)`).
static SOURCE_SPEC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(pulse|pwl)").unwrap());

/// The element kinds the pipeline distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    CurrentSource,
    Inductor,
    PulseDefinition,
    Other,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::CurrentSource => "current-source",
            ElementKind::Inductor => "inductor",
            ElementKind::PulseDefinition => "pulse",
            ElementKind::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// Classify a line by its first token.
pub fn classify(tokens: &[String]) -> ElementKind {
    let Some(first) = tokens.first() else {
        return ElementKind::Other;
    };
    if CURRENT_SOURCE_PATTERN.is_match(first) {
        ElementKind::CurrentSource
    } else if INDUCTOR_PATTERN.is_match(first) {
        ElementKind::Inductor
    } else if is_pulse(first) {
        ElementKind::PulseDefinition
    } else {
        ElementKind::Other
    }
}

/// True if the token opens a `PULSE(...)` specification.
pub fn is_pulse(token: &str) -> bool {
    PULSE_PATTERN.is_match(token)
}

pub(crate) fn is_source_spec(token: &str) -> bool {
    SOURCE_SPEC_PATTERN.is_match(token)
}

/// A point in netlist (layout) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Sum of absolute per-axis differences.
    pub fn manhattan(&self, other: &Point) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// How coordinates are pulled out of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateStrategy {
    /// Every marker-bearing token whose last two `_` segments parse as numbers.
    Liberal,
    /// The first position-marked token after the element name; all of its
    /// trailing segments must parse.
    Strict,
    /// Tokens 1 and 2 taken positionally, as the two terminals of a two-pin element.
    Terminal,
}

impl CoordinateStrategy {
    /// The strategy used to resolve an element of the given kind.
    pub fn for_kind(kind: ElementKind) -> Self {
        match kind {
            ElementKind::CurrentSource => CoordinateStrategy::Strict,
            ElementKind::Inductor => CoordinateStrategy::Terminal,
            ElementKind::PulseDefinition | ElementKind::Other => CoordinateStrategy::Liberal,
        }
    }
}

/// Extract every point the strategy finds. Malformed tokens are skipped.
pub fn extract_coordinates(tokens: &[String], strategy: CoordinateStrategy) -> Vec<Point> {
    match strategy {
        CoordinateStrategy::Liberal => tokens
            .iter()
            .filter(|t| COORDINATE_MARKER.is_match(t))
            .filter_map(|t| trailing_pair(t))
            .collect(),
        CoordinateStrategy::Strict => strict_position(tokens).into_iter().collect(),
        CoordinateStrategy::Terminal => tokens
            .iter()
            .skip(1)
            .take(2)
            .filter_map(|t| trailing_pair(t))
            .collect(),
    }
}

fn strict_position(tokens: &[String]) -> Option<Point> {
    let token = tokens.iter().skip(1).find(|t| POSITION_MARKER.is_match(t))?;
    let values = token
        .split('_')
        .skip(1)
        .map(|s| s.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    match values.as_slice() {
        [x, y, ..] if x.is_finite() && y.is_finite() => Some(Point::new(*x, *y)),
        _ => None,
    }
}

/// Parse the last two underscore-delimited segments of a token as (x, y).
pub fn trailing_pair(token: &str) -> Option<Point> {
    let mut segments = token.rsplit('_');
    let y = segments.next()?;
    let x = segments.next()?;
    // the name part in front of the coordinates must exist
    segments.next()?;
    let (x, y) = (x.parse::<f64>().ok()?, y.parse::<f64>().ok()?);
    (x.is_finite() && y.is_finite()).then(|| Point::new(x, y))
}

/// One netlist line as an owned token list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tokens: Vec<String>,
}

impl Element {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Split a raw line on whitespace.
    pub fn from_line(line: &str) -> Self {
        Self::new(line.split_whitespace().map(str::to_string).collect())
    }

    pub fn kind(&self) -> ElementKind {
        classify(&self.tokens)
    }

    pub fn name(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Resolved position of the element, using the strategy for its kind.
    /// `None` means "no position"; callers skip the element.
    pub fn position(&self) -> Option<Point> {
        extract_coordinates(&self.tokens, CoordinateStrategy::for_kind(self.kind()))
            .into_iter()
            .next()
    }

    /// Left/right terminal node names of a two-terminal element, with the
    /// left terminal's point. `None` if the left terminal carries no position.
    pub fn terminals(&self) -> Option<(Point, &str, &str)> {
        let left = self.tokens.get(1)?;
        let right = self.tokens.get(2)?;
        let point = trailing_pair(left)?;
        Some((point, left.as_str(), right.as_str()))
    }

    pub fn to_line(&self) -> String {
        self.tokens.join(" ")
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_line())
    }
}
