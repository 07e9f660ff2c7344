//! SPICE netlist lines as token lists.
//!
//! Only the minimal structure the mapper needs is recognised: each line is
//! split on whitespace and classified by its first token. Lines are written
//! back out token for token, single-space separated.

pub mod element;
pub mod rewrite;

use std::fmt;

pub use element::{
    classify, extract_coordinates, CoordinateStrategy, Element, ElementKind, Point,
};
pub use rewrite::{NetlistRewriter, ResolveOutcome, RewriteStats, MISS_MARKER};

use crate::core::Mode;
use crate::floorplan::BoundingBox;

/// An ordered netlist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Netlist {
    pub elements: Vec<Element>,
}

impl Netlist {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    /// Tokenize netlist text. Lines starting with `#` are dropped; blank
    /// lines are kept as empty elements so the line structure survives.
    pub fn parse(text: &str) -> Self {
        let elements = text
            .lines()
            .filter(|line| !line.starts_with('#'))
            .map(Element::from_line)
            .collect();
        Self { elements }
    }

    /// One line per element, tokens joined by single spaces, newline-terminated.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for element in &self.elements {
            out.push_str(&element.to_line());
            out.push('\n');
        }
        out
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn count_kind(&self, kind: ElementKind) -> usize {
        self.elements.iter().filter(|e| e.kind() == kind).count()
    }

    /// Bounding box of the netlist's own coordinate space.
    ///
    /// Complete mode looks at every coordinate-bearing token on every line;
    /// legacy mode only at current-source positions.
    pub fn coordinate_bounding_box(&self, mode: Mode) -> Option<BoundingBox> {
        let points: Vec<Point> = match mode {
            Mode::Complete => self
                .elements
                .iter()
                .flat_map(|e| extract_coordinates(&e.tokens, CoordinateStrategy::Liberal))
                .collect(),
            Mode::Legacy => self
                .elements
                .iter()
                .filter(|e| e.kind() == ElementKind::CurrentSource)
                .flat_map(|e| extract_coordinates(&e.tokens, CoordinateStrategy::Strict))
                .collect(),
        };
        BoundingBox::from_points(&points)
    }
}

impl fmt::Display for Netlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
