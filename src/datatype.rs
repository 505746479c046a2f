//! Element datatypes and strided buffer layouts.
//!
//! This module provides the [`MpiDatatype`] trait, a sealed trait naming the
//! primitive types that can travel between workers, and [`VectorLayout`], the
//! strided view used to describe which elements of a buffer a transfer reads
//! or writes.
//!
//! # Supported Types
//!
//! | Rust Type | Tag Value |
//! |-----------|-----------|
//! | `f32`     | 0         |
//! | `f64`     | 1         |
//! | `i32`     | 2         |
//! | `i64`     | 3         |
//! | `u8`      | 4         |
//! | `u32`     | 5         |
//! | `u64`     | 6         |

use crate::ReduceOp;

/// Internal module to seal the trait — prevents external implementations.
mod sealed {
    pub trait Sealed {}
}

/// Tag values identifying each element type on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DatatypeTag {
    /// 32-bit floating point
    F32 = 0,
    /// 64-bit floating point
    F64 = 1,
    /// 32-bit signed integer
    I32 = 2,
    /// 64-bit signed integer
    I64 = 3,
    /// 8-bit unsigned integer
    U8 = 4,
    /// 32-bit unsigned integer
    U32 = 5,
    /// 64-bit unsigned integer
    U64 = 6,
}

/// Trait for types that can be used in communication operations.
///
/// This is a **sealed trait** — it cannot be implemented outside this crate.
/// Supported types: [`f32`], [`f64`], [`i32`], [`i64`], [`u8`], [`u32`], [`u64`].
pub trait MpiDatatype: sealed::Sealed + Copy + Send + Default + PartialEq + 'static {
    /// The datatype tag carried alongside every payload.
    const TAG: DatatypeTag;

    /// Combine two values under a reduction operation.
    ///
    /// Integer sums and products wrap on overflow.
    fn combine(self, other: Self, op: ReduceOp) -> Self;
}

macro_rules! impl_mpi_int {
    ($ty:ty, $tag:expr) => {
        impl sealed::Sealed for $ty {}
        impl MpiDatatype for $ty {
            const TAG: DatatypeTag = $tag;

            fn combine(self, other: Self, op: ReduceOp) -> Self {
                match op {
                    ReduceOp::Sum => self.wrapping_add(other),
                    ReduceOp::Max => self.max(other),
                    ReduceOp::Min => self.min(other),
                    ReduceOp::Prod => self.wrapping_mul(other),
                }
            }
        }
    };
}

macro_rules! impl_mpi_float {
    ($ty:ty, $tag:expr) => {
        impl sealed::Sealed for $ty {}
        impl MpiDatatype for $ty {
            const TAG: DatatypeTag = $tag;

            fn combine(self, other: Self, op: ReduceOp) -> Self {
                match op {
                    ReduceOp::Sum => self + other,
                    ReduceOp::Max => self.max(other),
                    ReduceOp::Min => self.min(other),
                    ReduceOp::Prod => self * other,
                }
            }
        }
    };
}

impl_mpi_float!(f32, DatatypeTag::F32);
impl_mpi_float!(f64, DatatypeTag::F64);
impl_mpi_int!(i32, DatatypeTag::I32);
impl_mpi_int!(i64, DatatypeTag::I64);
impl_mpi_int!(u8, DatatypeTag::U8);
impl_mpi_int!(u32, DatatypeTag::U32);
impl_mpi_int!(u64, DatatypeTag::U64);

/// A strided selection of `count` single elements from a flat buffer.
///
/// Element `k` of the selection lives at `offset + k * stride`. A contiguous
/// run is a layout with `stride == 1`; a column of a row-major matrix with
/// padded row length `w` is a layout with `stride == w`.
///
/// The same layout drives both packing for a send and unpacking on receipt,
/// so a local copy and a wire transfer always touch the same cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VectorLayout {
    /// Index of the first selected element
    pub offset: usize,
    /// Number of selected elements
    pub count: usize,
    /// Distance between consecutive selected elements
    pub stride: usize,
}

impl VectorLayout {
    /// A contiguous run of `count` elements starting at `offset`.
    pub fn contiguous(offset: usize, count: usize) -> Self {
        VectorLayout {
            offset,
            count,
            stride: 1,
        }
    }

    /// `count` elements starting at `offset`, `stride` apart.
    pub fn strided(offset: usize, count: usize, stride: usize) -> Self {
        VectorLayout {
            offset,
            count,
            stride,
        }
    }

    /// One past the highest index touched, or `offset` for an empty layout.
    pub fn extent(&self) -> usize {
        if self.count == 0 {
            self.offset
        } else {
            self.offset + (self.count - 1) * self.stride + 1
        }
    }

    /// Whether every selected index lies inside a buffer of length `len`.
    pub fn fits(&self, len: usize) -> bool {
        self.extent() <= len
    }

    /// Iterator over the selected buffer indices.
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        let VectorLayout {
            offset,
            count,
            stride,
        } = *self;
        (0..count).map(move |k| offset + k * stride)
    }

    /// Copy the selected elements out of `buf`.
    ///
    /// # Panics
    ///
    /// Panics if the layout does not fit in `buf`.
    pub fn pack<T: Copy>(&self, buf: &[T]) -> Vec<T> {
        self.indices().map(|i| buf[i]).collect()
    }

    /// Write `data` into the selected elements of `buf`.
    ///
    /// # Panics
    ///
    /// Panics if the layout does not fit in `buf` or `data.len() != count`.
    pub fn unpack<T: Copy>(&self, buf: &mut [T], data: &[T]) {
        assert_eq!(data.len(), self.count, "layout count mismatch");
        for (i, &value) in self.indices().zip(data) {
            buf[i] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_values_are_sequential() {
        let tags = [
            DatatypeTag::F32,
            DatatypeTag::F64,
            DatatypeTag::I32,
            DatatypeTag::I64,
            DatatypeTag::U8,
            DatatypeTag::U32,
            DatatypeTag::U64,
        ];
        for (i, tag) in tags.iter().enumerate() {
            assert_eq!(*tag as i32, i as i32, "Tag {tag:?} should have value {i}");
        }
    }

    #[test]
    fn trait_is_implemented() {
        fn assert_mpi_datatype<T: MpiDatatype>() {}
        assert_mpi_datatype::<f32>();
        assert_mpi_datatype::<f64>();
        assert_mpi_datatype::<i32>();
        assert_mpi_datatype::<i64>();
        assert_mpi_datatype::<u8>();
        assert_mpi_datatype::<u32>();
        assert_mpi_datatype::<u64>();
    }

    #[test]
    fn combine_ops() {
        assert_eq!(3u64.combine(4, ReduceOp::Sum), 7);
        assert_eq!(3i32.combine(-4, ReduceOp::Min), -4);
        assert_eq!(3i64.combine(-4, ReduceOp::Max), 3);
        assert_eq!(3u32.combine(4, ReduceOp::Prod), 12);
        assert_eq!(255u8.combine(1, ReduceOp::Sum), 0);
        assert!((1.5f64.combine(2.0, ReduceOp::Prod) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn column_layout_packs_one_element_per_row() {
        // 3 rows of padded length 4
        let buf: Vec<u8> = (0..12).collect();
        let column = VectorLayout::strided(1, 3, 4);
        assert_eq!(column.pack(&buf), vec![1, 5, 9]);
        assert_eq!(column.extent(), 10);
        assert!(column.fits(buf.len()));
        assert!(!VectorLayout::strided(3, 3, 5).fits(12));
    }

    #[test]
    fn unpack_touches_only_selected_cells() {
        let mut buf = vec![0u8; 12];
        VectorLayout::strided(2, 3, 4).unpack(&mut buf, &[7, 8, 9]);
        assert_eq!(buf, vec![0, 0, 7, 0, 0, 0, 8, 0, 0, 0, 9, 0]);

        VectorLayout::contiguous(4, 2).unpack(&mut buf, &[1, 1]);
        assert_eq!(&buf[4..6], &[1, 1]);
    }

    #[test]
    fn empty_layout() {
        let empty = VectorLayout::contiguous(5, 0);
        assert_eq!(empty.extent(), 5);
        assert!(empty.pack::<u8>(&[]).is_empty());
    }
}
