//! Aligned sample storage shared by all audio signals.

use core::fmt;

use crate::sample::Sample;

/// One contiguous buffer holding every resolved audio signal of one sample
/// type.
///
/// Each signal occupies a row of `stride` samples, of which the first
/// `period` are used. The stride is the period rounded up so that every row
/// starts on an `alignment_bytes` boundary. Storage is zeroed on creation and
/// never reallocated.
pub struct CommunicationArea<T> {
    storage: Vec<T>,
    offset: usize,
    stride: usize,
    period: usize,
    rows: usize,
}

impl<T: Sample> CommunicationArea<T> {
    pub(crate) fn new(rows: usize, period: usize, alignment_bytes: usize) -> Self {
        let size = core::mem::size_of::<T>();
        let lanes = (alignment_bytes / size).max(1);
        let stride = period.div_ceil(lanes) * lanes;
        let len = rows * stride;

        // Over-allocate by one alignment unit and start at the first aligned
        // element.
        let storage = vec![T::ZERO; if len == 0 { 0 } else { len + lanes - 1 }];
        let offset = match storage.as_ptr().align_offset(alignment_bytes.max(size)) {
            offset if offset < lanes => offset,
            _ => 0,
        };

        Self {
            storage,
            offset,
            stride,
            period,
            rows,
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Distance between row starts, in samples.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Used samples per row.
    pub fn period(&self) -> usize {
        self.period
    }

    /// One block of row `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.rows()`.
    #[inline]
    pub fn row(&self, index: usize) -> &[T] {
        assert!(index < self.rows, "row {index} out of range");
        let start = self.offset + index * self.stride;
        &self.storage[start..start + self.period]
    }

    /// Mutable block of row `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.rows()`.
    #[inline]
    pub fn row_mut(&mut self, index: usize) -> &mut [T] {
        assert!(index < self.rows, "row {index} out of range");
        let start = self.offset + index * self.stride;
        &mut self.storage[start..start + self.period]
    }

    /// Borrows one row for reading and a different row for writing.
    #[inline]
    pub(crate) fn row_pair(&mut self, read: usize, write: usize) -> (&[T], &mut [T]) {
        assert!(read != write, "row {read} read and written at once");
        assert!(read < self.rows && write < self.rows);
        let period = self.period;
        let read_start = self.offset + read * self.stride;
        let write_start = self.offset + write * self.stride;
        if read < write {
            let (head, tail) = self.storage.split_at_mut(write_start);
            (&head[read_start..read_start + period], &mut tail[..period])
        } else {
            let (head, tail) = self.storage.split_at_mut(read_start);
            (&tail[..period], &mut head[write_start..write_start + period])
        }
    }

    /// Whether every row starts on an `alignment_bytes` boundary.
    pub fn is_aligned(&self, alignment_bytes: usize) -> bool {
        (0..self.rows).all(|i| {
            let start = self.offset + i * self.stride;
            self.storage[start..].as_ptr().align_offset(alignment_bytes) == 0
        })
    }

    /// Zeroes every row.
    pub fn clear(&mut self) {
        self.storage.fill(T::ZERO);
    }
}

impl<T> fmt::Debug for CommunicationArea<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommunicationArea")
            .field("rows", &self.rows)
            .field("stride", &self.stride)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

/// The per-sample-type areas of one engine.
#[derive(Debug)]
pub struct CommunicationAreas {
    pub(crate) f32: CommunicationArea<f32>,
    pub(crate) f64: CommunicationArea<f64>,
}

impl CommunicationAreas {
    pub(crate) fn new(f32_rows: usize, f64_rows: usize, period: usize, alignment: usize) -> Self {
        Self {
            f32: CommunicationArea::new(f32_rows, period, alignment),
            f64: CommunicationArea::new(f64_rows, period, alignment),
        }
    }

    /// Area holding signals of type `T`.
    pub fn get<T: Sample>(&self) -> &CommunicationArea<T> {
        T::area(self)
    }

    /// Mutable area holding signals of type `T`.
    pub fn get_mut<T: Sample>(&mut self) -> &mut CommunicationArea<T> {
        T::area_mut(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_rounds_to_alignment() {
        let area = CommunicationArea::<f32>::new(3, 10, 32);
        assert_eq!(area.stride(), 16);
        assert_eq!(area.period(), 10);
        assert_eq!(area.row(2).len(), 10);

        let area = CommunicationArea::<f64>::new(1, 10, 32);
        assert_eq!(area.stride(), 12);

        // Alignment below the sample size leaves the period untouched.
        let area = CommunicationArea::<f64>::new(1, 10, 4);
        assert_eq!(area.stride(), 10);
    }

    #[test]
    fn test_rows_aligned_and_zeroed() {
        for alignment in [4, 16, 32, 64] {
            let area = CommunicationArea::<f32>::new(5, 64, alignment);
            assert!(area.is_aligned(alignment), "alignment {alignment}");
            assert!((0..5).all(|i| area.row(i).iter().all(|&s| s == 0.0)));
        }
    }

    #[test]
    fn test_rows_do_not_overlap() {
        let mut area = CommunicationArea::<f32>::new(3, 7, 16);
        for i in 0..3 {
            area.row_mut(i).fill(i as f32 + 1.0);
        }
        for i in 0..3 {
            assert!(area.row(i).iter().all(|&s| s == i as f32 + 1.0));
        }
    }

    #[test]
    fn test_row_pair_both_orders() {
        let mut area = CommunicationArea::<f64>::new(2, 4, 32);
        area.row_mut(0).fill(1.0);
        area.row_mut(1).fill(2.0);

        let (src, dst) = area.row_pair(0, 1);
        assert_eq!(src, &[1.0; 4]);
        dst.copy_from_slice(&[3.0; 4]);

        let (src, dst) = area.row_pair(1, 0);
        assert_eq!(src, &[3.0; 4]);
        assert_eq!(dst, &mut [1.0; 4]);
    }

    #[test]
    #[should_panic(expected = "read and written at once")]
    fn test_row_pair_same_row_panics() {
        let mut area = CommunicationArea::<f32>::new(2, 4, 16);
        let _ = area.row_pair(1, 1);
    }

    #[test]
    fn test_empty_area() {
        let area = CommunicationArea::<f32>::new(0, 64, 32);
        assert_eq!(area.rows(), 0);
        assert!(area.is_aligned(32));
    }

    #[test]
    fn test_areas_select_by_type() {
        let mut areas = CommunicationAreas::new(2, 1, 8, 32);
        assert_eq!(areas.get::<f32>().rows(), 2);
        assert_eq!(areas.get::<f64>().rows(), 1);
        areas.get_mut::<f64>().row_mut(0)[3] = 0.5;
        assert_eq!(areas.get::<f64>().row(0)[3], 0.5);
    }
}
