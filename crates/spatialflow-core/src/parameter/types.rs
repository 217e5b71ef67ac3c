//! Built-in parameter value types.

use core::ops::{Index, IndexMut};

use super::{ParameterConfig, ParameterKind, ParameterValue, invalid_config};
use crate::error::ConfigurationError;

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
    impl Sealed for i32 {}
    impl Sealed for bool {}
}

/// Element types accepted by [`ScalarParameter`].
pub trait ScalarValue:
    sealed::Sealed + Copy + Default + PartialEq + core::fmt::Debug + Send + Sync + 'static
{
    /// Kind of `ScalarParameter<Self>`.
    const SCALAR_KIND: ParameterKind;
}

impl ScalarValue for f32 {
    const SCALAR_KIND: ParameterKind = ParameterKind::new("ScalarFloat");
}

impl ScalarValue for f64 {
    const SCALAR_KIND: ParameterKind = ParameterKind::new("ScalarDouble");
}

impl ScalarValue for i32 {
    const SCALAR_KIND: ParameterKind = ParameterKind::new("ScalarInt");
}

impl ScalarValue for bool {
    const SCALAR_KIND: ParameterKind = ParameterKind::new("ScalarBool");
}

/// Element types accepted by [`VectorParameter`] and [`MatrixParameter`].
pub trait ArrayElement:
    sealed::Sealed + Copy + Default + PartialEq + core::fmt::Debug + Send + Sync + 'static
{
    /// Kind of `VectorParameter<Self>`.
    const VECTOR_KIND: ParameterKind;
    /// Kind of `MatrixParameter<Self>`.
    const MATRIX_KIND: ParameterKind;
}

impl ArrayElement for f32 {
    const VECTOR_KIND: ParameterKind = ParameterKind::new("VectorFloat");
    const MATRIX_KIND: ParameterKind = ParameterKind::new("MatrixFloat");
}

impl ArrayElement for f64 {
    const VECTOR_KIND: ParameterKind = ParameterKind::new("VectorDouble");
    const MATRIX_KIND: ParameterKind = ParameterKind::new("MatrixDouble");
}

/// Single scalar value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScalarParameter<T>(T);

impl<T: ScalarValue> ScalarParameter<T> {
    /// Wraps `value`.
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Current value.
    #[inline]
    pub fn value(&self) -> T {
        self.0
    }

    /// Replaces the value.
    #[inline]
    pub fn set(&mut self, value: T) {
        self.0 = value;
    }
}

impl<T: ScalarValue> ParameterValue for ScalarParameter<T> {
    const KIND: ParameterKind = T::SCALAR_KIND;
    const DESCRIPTION: &'static str = "single scalar value";

    fn from_config(config: &ParameterConfig) -> Result<Self, ConfigurationError> {
        match config {
            ParameterConfig::Empty => Ok(Self::default()),
            _ => Err(invalid_config(
                Self::KIND,
                config,
                "scalar parameters take no configuration",
            )),
        }
    }
}

/// Fixed-length vector of values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorParameter<T> {
    values: Vec<T>,
}

impl<T: ArrayElement> VectorParameter<T> {
    /// Vector of `len` default elements.
    pub fn new(len: usize) -> Self {
        Self {
            values: vec![T::default(); len],
        }
    }

    /// Wraps existing values.
    pub fn from_vec(values: Vec<T>) -> Self {
        Self { values }
    }

    /// Element count.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector has no elements.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// Elements as a mutable slice. The length is fixed.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }
}

impl<T> Index<usize> for VectorParameter<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.values[index]
    }
}

impl<T> IndexMut<usize> for VectorParameter<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.values[index]
    }
}

impl<T: ArrayElement> ParameterValue for VectorParameter<T> {
    const KIND: ParameterKind = T::VECTOR_KIND;
    const DESCRIPTION: &'static str = "fixed-length vector";

    fn from_config(config: &ParameterConfig) -> Result<Self, ConfigurationError> {
        match *config {
            ParameterConfig::Vector { len } => Ok(Self::new(len)),
            _ => Err(invalid_config(
                Self::KIND,
                config,
                "vector parameters need a vector configuration",
            )),
        }
    }
}

/// Row-major matrix of values, e.g. a gain matrix from inputs to outputs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatrixParameter<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: ArrayElement> MatrixParameter<T> {
    /// `rows x cols` matrix of default elements.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::default(); rows * cols],
        }
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the position is outside the matrix.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> T {
        assert!(row < self.rows && col < self.cols, "matrix index out of range");
        self.data[row * self.cols + col]
    }

    /// Sets the element at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the position is outside the matrix.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        assert!(row < self.rows && col < self.cols, "matrix index out of range");
        self.data[row * self.cols + col] = value;
    }

    /// One row as a slice.
    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// All elements, row-major.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Sets every element to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Configuration describing this matrix' shape.
    pub fn config(&self) -> ParameterConfig {
        ParameterConfig::Matrix {
            rows: self.rows,
            cols: self.cols,
        }
    }
}

impl<T: ArrayElement> ParameterValue for MatrixParameter<T> {
    const KIND: ParameterKind = T::MATRIX_KIND;
    const DESCRIPTION: &'static str = "row-major matrix";

    fn from_config(config: &ParameterConfig) -> Result<Self, ConfigurationError> {
        match *config {
            ParameterConfig::Matrix { rows, cols } => Ok(Self::new(rows, cols)),
            _ => Err(invalid_config(
                Self::KIND,
                config,
                "matrix parameters need a matrix configuration",
            )),
        }
    }
}

/// Text value, typically used for commands over message queues.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringParameter(String);

impl StringParameter {
    /// Wraps `value`.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Text content.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Replaces the text.
    pub fn set(&mut self, value: impl Into<String>) {
        self.0 = value.into();
    }
}

impl ParameterValue for StringParameter {
    const KIND: ParameterKind = ParameterKind::new("String");
    const DESCRIPTION: &'static str = "text value";

    fn from_config(config: &ParameterConfig) -> Result<Self, ConfigurationError> {
        match config {
            ParameterConfig::Empty => Ok(Self::default()),
            _ => Err(invalid_config(
                Self::KIND,
                config,
                "string parameters take no configuration",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_kinds_are_distinct() {
        assert_eq!(ScalarParameter::<f32>::KIND.name(), "ScalarFloat");
        assert_ne!(ScalarParameter::<f32>::KIND, ScalarParameter::<f64>::KIND);
        assert_ne!(ScalarParameter::<i32>::KIND, ScalarParameter::<bool>::KIND);
    }

    #[test]
    fn test_scalar_rejects_shape() {
        assert!(ScalarParameter::<f32>::from_config(&ParameterConfig::Empty).is_ok());
        let err = ScalarParameter::<f32>::from_config(&ParameterConfig::Vector { len: 2 });
        assert!(matches!(
            err,
            Err(ConfigurationError::InvalidParameterConfig { .. })
        ));
    }

    #[test]
    fn test_matrix_from_config() {
        let m = MatrixParameter::<f32>::from_config(&ParameterConfig::Matrix { rows: 2, cols: 3 })
            .unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 3);
        assert_eq!(m.as_slice().len(), 6);
        assert!(m.as_slice().iter().all(|&v| v == 0.0));
        assert!(MatrixParameter::<f32>::from_config(&ParameterConfig::Empty).is_err());
    }

    #[test]
    fn test_matrix_access() {
        let mut m = MatrixParameter::<f64>::new(2, 2);
        m.set(1, 0, 0.5);
        assert_eq!(m.at(1, 0), 0.5);
        assert_eq!(m.row(1), &[0.5, 0.0]);
        m.fill(1.0);
        assert_eq!(m.as_slice(), &[1.0; 4]);
    }

    #[test]
    #[should_panic]
    fn test_matrix_out_of_range_panics() {
        let m = MatrixParameter::<f32>::new(2, 2);
        let _ = m.at(2, 0);
    }

    #[test]
    fn test_vector_from_config() {
        let mut v = VectorParameter::<f32>::from_config(&ParameterConfig::Vector { len: 3 }).unwrap();
        assert_eq!(v.len(), 3);
        v[2] = 4.0;
        assert_eq!(v.as_slice(), &[0.0, 0.0, 4.0]);
    }

    #[test]
    fn test_string_parameter() {
        let mut s = StringParameter::new("play");
        assert_eq!(s.as_str(), "play");
        s.set("stop");
        assert_eq!(s.as_str(), "stop");
    }
}
