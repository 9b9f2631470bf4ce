//! Row-major index geometry for flat sample buffers.

/// Shape and row-major strides of a dense N-dimensional buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lattice {
    shape: Vec<usize>,
    strides: Vec<usize>,
}

impl Lattice {
    /// Create the lattice of a C-contiguous buffer with the given shape.
    pub fn new(shape: &[usize]) -> Self {
        let mut strides = vec![1; shape.len()];
        for axis in (0..shape.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * shape[axis + 1];
        }
        Self {
            shape: shape.to_vec(),
            strides,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the multi-index of flat position `flat` into `index`.
    #[inline]
    pub fn unravel(&self, mut flat: usize, index: &mut [usize]) {
        for axis in (0..self.shape.len()).rev() {
            let extent = self.shape[axis];
            index[axis] = flat % extent;
            flat /= extent;
        }
    }

    /// Flat position of a multi-index.
    #[inline]
    pub fn ravel(&self, index: &[usize]) -> usize {
        index
            .iter()
            .zip(&self.strides)
            .map(|(i, stride)| i * stride)
            .sum()
    }
}
