//! Dense tiles addressed by global coordinates.

use std::fmt;

use anyhow::{self, ensure};
use itertools::Itertools;
use ndarray::{Array1, ArrayD, Dimension, IxDyn};
use num_traits::{Float, Zero};
use serde::{Deserialize, Serialize};

use crate::tiled_array::range::Range;

#[cfg(test)]
#[path = "tensor_tests.rs"]
mod tensor_tests;

/// A dense block of data covering a [`Range`].
///
/// Elements are addressed by their global coordinates, i.e. coordinates inside
/// [`Self::range`], not by their offsets within the block. A tensor with the default range is
/// the empty tensor; it is used for the inner tensors of tensor-of-tensors elements that have
/// no data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tensor<T> {
    range: Range,
    data: ArrayD<T>,
}

impl<T> Tensor<T> {
    /// Constructs a tensor from its range and its row-major data block.
    ///
    /// # Errors
    ///
    /// Errors if the shape of `data` differs from the extents of `range`.
    pub fn new(range: Range, data: ArrayD<T>) -> Result<Self, anyhow::Error> {
        ensure!(
            data.shape() == range.extents().as_slice(),
            "Data of shape {:?} cannot cover the range {range}.",
            data.shape()
        );
        Ok(Self { range, data })
    }

    /// Constructs the empty tensor.
    pub fn empty() -> Self {
        Self {
            range: Range::default(),
            data: Array1::from_vec(Vec::new()).into_dyn(),
        }
    }

    /// Constructs a tensor by evaluating `f` at every global coordinate of `range`.
    pub fn from_fn<F: FnMut(&[usize]) -> T>(range: Range, mut f: F) -> Self {
        if range.rank() == 0 {
            return Self::empty();
        }
        let lo = range.lo().to_vec();
        let data = ArrayD::from_shape_fn(IxDyn(&range.extents()), |local| {
            let global = local
                .slice()
                .iter()
                .zip(lo.iter())
                .map(|(i, l)| i + l)
                .collect_vec();
            f(&global)
        });
        Self { range, data }
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    pub fn rank(&self) -> usize {
        self.range.rank()
    }

    /// Returns the number of elements.
    pub fn size(&self) -> usize {
        self.range.volume()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    fn local_index(&self, idx: &[usize]) -> Option<IxDyn> {
        if !self.range.includes(idx) {
            return None;
        }
        Some(IxDyn(
            &idx.iter()
                .zip(self.range.lo().iter())
                .map(|(i, l)| i - l)
                .collect_vec(),
        ))
    }

    /// Returns the element at global coordinate `idx`, or `None` if `idx` lies outside the
    /// range of this tensor.
    pub fn get(&self, idx: &[usize]) -> Option<&T> {
        let local = self.local_index(idx)?;
        self.data.get(local)
    }

    pub fn get_mut(&mut self, idx: &[usize]) -> Option<&mut T> {
        let local = self.local_index(idx)?;
        self.data.get_mut(local)
    }

    /// Iterates over the elements in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    /// Iterates over the global coordinates and the elements in row-major order.
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Vec<usize>, &T)> {
        self.range.iter().zip(self.data.iter())
    }

    /// Moves this tensor onto another range of identical extents.
    ///
    /// # Errors
    ///
    /// Errors if the extents of `range` differ from those of the current range.
    pub fn with_range(self, range: Range) -> Result<Self, anyhow::Error> {
        Self::new(range, self.data)
    }
}

impl<T: Clone + Zero> Tensor<T> {
    /// Constructs a tensor of zeros covering `range`.
    pub fn zeros(range: Range) -> Self {
        Self::from_fn(range, |_| T::zero())
    }

    /// Returns `true` if every element is zero.
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(Zero::is_zero)
    }
}

impl<T: Float> Tensor<T> {
    /// Returns the Frobenius norm.
    pub fn norm(&self) -> T {
        self.data
            .iter()
            .fold(T::zero(), |acc, &x| acc + x * x)
            .sqrt()
    }
}

impl<T: fmt::Display> fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}]", self.range, self.data.iter().join(", "))
    }
}
