//! Hyper-rectangular coordinate ranges.

use std::fmt;

use anyhow::{self, ensure};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "range_tests.rs"]
mod range_tests;

// ==================
// Struct definitions
// ==================

/// A half-open hyper-rectangle $`[\mathrm{lo}, \mathrm{hi})`$ of coordinates.
///
/// The default range has rank zero and contains nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    /// Inclusive lower bounds, one per mode.
    lo: Vec<usize>,

    /// Exclusive upper bounds, one per mode.
    hi: Vec<usize>,
}

impl Range {
    /// Constructs a range from its lower and upper bounds.
    ///
    /// # Errors
    ///
    /// Errors if the bounds have different lengths or if any lower bound exceeds its upper
    /// bound.
    pub fn new(lo: Vec<usize>, hi: Vec<usize>) -> Result<Self, anyhow::Error> {
        ensure!(
            lo.len() == hi.len(),
            "Lower bounds {lo:?} and upper bounds {hi:?} have different ranks."
        );
        ensure!(
            lo.iter().zip(hi.iter()).all(|(l, h)| l <= h),
            "Lower bounds {lo:?} exceed upper bounds {hi:?}."
        );
        Ok(Self { lo, hi })
    }

    /// Constructs a zero-based range with the given extents.
    pub fn from_extents(extents: &[usize]) -> Self {
        Self {
            lo: vec![0; extents.len()],
            hi: extents.to_vec(),
        }
    }

    pub fn rank(&self) -> usize {
        self.lo.len()
    }

    pub fn lo(&self) -> &[usize] {
        &self.lo
    }

    pub fn hi(&self) -> &[usize] {
        &self.hi
    }

    /// Returns the number of coordinates along each mode.
    pub fn extents(&self) -> Vec<usize> {
        self.lo
            .iter()
            .zip(self.hi.iter())
            .map(|(l, h)| h - l)
            .collect_vec()
    }

    /// Returns the number of coordinates in the range. A rank-zero range is empty.
    pub fn volume(&self) -> usize {
        if self.rank() == 0 {
            0
        } else {
            self.extents().iter().product()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    /// Returns `true` if `idx` has the rank of this range and lies inside it.
    pub fn includes(&self, idx: &[usize]) -> bool {
        idx.len() == self.rank()
            && self.rank() > 0
            && idx
                .iter()
                .zip(self.lo.iter().zip(self.hi.iter()))
                .all(|(i, (l, h))| l <= i && i < h)
    }

    /// Returns the row-major position of `idx` inside this range, or `None` if `idx` is not in
    /// the range.
    pub fn ordinal(&self, idx: &[usize]) -> Option<usize> {
        if !self.includes(idx) {
            return None;
        }
        let extents = self.extents();
        Some(
            idx.iter()
                .zip(self.lo.iter())
                .zip(extents.iter())
                .fold(0, |acc, ((i, l), e)| acc * e + (i - l)),
        )
    }

    /// Returns the coordinate sitting at row-major position `ordinal`.
    pub fn index_of(&self, ordinal: usize) -> Option<Vec<usize>> {
        if ordinal >= self.volume() {
            return None;
        }
        let extents = self.extents();
        let mut rem = ordinal;
        let mut idx = vec![0; self.rank()];
        for mode in (0..self.rank()).rev() {
            idx[mode] = self.lo[mode] + rem % extents[mode];
            rem /= extents[mode];
        }
        Some(idx)
    }

    /// Iterates over the coordinates of this range in row-major order.
    pub fn iter(&self) -> RangeIter<'_> {
        RangeIter {
            range: self,
            next: if self.is_empty() {
                None
            } else {
                Some(self.lo.clone())
            },
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{{{}}}, {{{}}})",
            self.lo.iter().join(", "),
            self.hi.iter().join(", ")
        )
    }
}

// ---------
// Iteration
// ---------

/// Row-major iterator over the coordinates of a [`Range`].
#[derive(Clone, Debug)]
pub struct RangeIter<'a> {
    range: &'a Range,
    next: Option<Vec<usize>>,
}

impl Iterator for RangeIter<'_> {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let mut succ = current.clone();
        let mut carried = true;
        for mode in (0..succ.len()).rev() {
            succ[mode] += 1;
            if succ[mode] < self.range.hi[mode] {
                carried = false;
                break;
            }
            succ[mode] = self.range.lo[mode];
        }
        if !carried {
            self.next = Some(succ);
        }
        Some(current)
    }
}

impl<'a> IntoIterator for &'a Range {
    type Item = Vec<usize>;
    type IntoIter = RangeIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
