// Copyright (c) the Coral project contributors.

use serde::Serialize;
use std::cmp::{max, min, Ordering};

/// Stores the row and column numbers of a location in a Coral source file.
/// These values are indexed starting at 1 instead of 0 for human readability.
/// Ex: (1,1) is the start of a file: the first column in the first row.
#[derive(Serialize, Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Location {
    pub row: usize,
    pub col: usize,
}

impl Location {
    /// Returns true if this [`Location`] is within the specified [`Span`] (including the span's boundary).
    pub fn is_within(&self, span: &Span) -> bool {
        self.cmp(&span.start) != Ordering::Less && self.cmp(&span.end) != Ordering::Greater
    }
}

impl From<(usize, usize)> for Location {
    /// Creates a [Location] from a pair of indices, where the first element represents the line number,
    /// and the second element represents the column number.
    fn from(x: (usize, usize)) -> Self {
        Location { row: x.0, col: x.1 }
    }
}

impl Default for Location {
    /// Returns a [Location] representing the start of a file: (1,1).
    fn default() -> Self {
        Location { row: 1, col: 1 }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: Location,
    pub end: Location,
    pub file: String,
}

impl Span {
    pub fn new(start: Location, end: Location, file: &str) -> Self {
        let file = file.to_owned();
        Span { start, end, file }
    }
}

impl std::ops::Add for &Span {
    type Output = Span;

    fn add(self, rhs: Self) -> Self::Output {
        Span {
            start: min(self.start, rhs.start),
            end: max(self.end, rhs.end),
            file: self.file.clone(),
        }
    }
}
