//! Audio sample element types.

use core::fmt;
use core::ops::{Add, AddAssign, Mul};

use crate::flow::{CommunicationArea, CommunicationAreas};

/// Runtime tag for the element type of an audio port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SampleType {
    /// 32-bit IEEE float.
    F32,
    /// 64-bit IEEE float.
    F64,
}

impl SampleType {
    /// Size of one sample in bytes.
    pub const fn size(self) -> usize {
        match self {
            SampleType::F32 => 4,
            SampleType::F64 => 8,
        }
    }

    /// Short name, e.g. `"f32"`.
    pub const fn name(self) -> &'static str {
        match self {
            SampleType::F32 => "f32",
            SampleType::F64 => "f64",
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Sample element type usable on audio ports.
///
/// Implemented for `f32` and `f64`. Each type selects its own
/// [`CommunicationArea`] inside the engine.
pub trait Sample:
    sealed::Sealed
    + Copy
    + Default
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + Send
    + Sync
    + Add<Output = Self>
    + AddAssign
    + Mul<Output = Self>
    + 'static
{
    /// Runtime tag of this type.
    const TYPE: SampleType;
    /// Additive identity.
    const ZERO: Self;
    /// Multiplicative identity.
    const ONE: Self;

    /// Converts from `f32`, widening if needed.
    fn from_f32(value: f32) -> Self;

    #[doc(hidden)]
    fn area(areas: &CommunicationAreas) -> &CommunicationArea<Self>;

    #[doc(hidden)]
    fn area_mut(areas: &mut CommunicationAreas) -> &mut CommunicationArea<Self>;
}

impl Sample for f32 {
    const TYPE: SampleType = SampleType::F32;
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    #[inline]
    fn from_f32(value: f32) -> Self {
        value
    }

    #[inline]
    fn area(areas: &CommunicationAreas) -> &CommunicationArea<Self> {
        &areas.f32
    }

    #[inline]
    fn area_mut(areas: &mut CommunicationAreas) -> &mut CommunicationArea<Self> {
        &mut areas.f32
    }
}

impl Sample for f64 {
    const TYPE: SampleType = SampleType::F64;
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    #[inline]
    fn from_f32(value: f32) -> Self {
        f64::from(value)
    }

    #[inline]
    fn area(areas: &CommunicationAreas) -> &CommunicationArea<Self> {
        &areas.f64
    }

    #[inline]
    fn area_mut(areas: &mut CommunicationAreas) -> &mut CommunicationArea<Self> {
        &mut areas.f64
    }
}
