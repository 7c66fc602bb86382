use std::convert::From;
use std::ops::Index;

use crate::error::{check_len, GcoError, Result};

/// A 2-dimensional table stored contiguously in memory and indexed manually.
/// Serves to replace Vec<Vec<T>> in cases when inner Vec's might have different lengths,
/// e.g. per-site neighbor lists handed over as one flattened array.
#[derive(Debug, Clone, PartialEq)]
pub struct JaggedArray2<T> {
    index_shift: Vec<usize>,
    data: Vec<T>,
}

impl<T> JaggedArray2<T> {
    // Wraps flattened data, where the i-th row holds the next `lengths[i]` entries
    pub fn from_lengths(lengths: &[usize], data: Vec<T>) -> Result<Self> {
        let mut index_shift: Vec<usize> = Vec::with_capacity(lengths.len() + 1);
        index_shift.push(0);
        for (i, &length) in lengths.iter().enumerate() {
            let shift = index_shift[i].checked_add(length).ok_or_else(|| {
                GcoError::Configuration(format!("row lengths overflow at row {}", i))
            })?;
            index_shift.push(shift);
        }
        check_len("flattened jagged data", index_shift[lengths.len()], data.len())?;

        Ok(JaggedArray2 { index_shift, data })
    }

    pub fn len(&self) -> usize {
        self.index_shift.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Total number of entries over all rows
    pub fn total_len(&self) -> usize {
        self.data.len()
    }

    pub fn inner_len(&self, index: usize) -> usize {
        assert!(index < self.len());
        self.index_shift[index + 1] - self.index_shift[index]
    }

    fn internal_index(&self, index: [usize; 2]) -> usize {
        assert!(index[0] < self.len());
        assert!(index[1] < self.index_shift[index[0] + 1] - self.index_shift[index[0]]);
        self.index_shift[index[0]] + index[1]
    }

    pub fn get(&self, index: [usize; 2]) -> &T {
        &self.data[self.internal_index(index)]
    }

    pub fn row(&self, index: usize) -> &[T] {
        assert!(index < self.len());
        &self.data[self.index_shift[index]..self.index_shift[index + 1]]
    }

    // Returns an iterator over rows
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        (0..self.len()).map(move |index| self.row(index))
    }
}

impl<T> Index<[usize; 2]> for JaggedArray2<T> {
    type Output = T;

    fn index(&self, index: [usize; 2]) -> &Self::Output {
        self.get(index)
    }
}

impl<T> From<Vec<Vec<T>>> for JaggedArray2<T> {
    fn from(value: Vec<Vec<T>>) -> Self {
        // precompute index shifts
        let mut index_shift = Vec::with_capacity(value.len() + 1);
        index_shift.push(0);
        for i in 0..value.len() {
            index_shift.push(index_shift[i] + value[i].len());
        }

        // flatten data
        let data = value.into_iter().flatten().collect();

        JaggedArray2 { index_shift, data }
    }
}
