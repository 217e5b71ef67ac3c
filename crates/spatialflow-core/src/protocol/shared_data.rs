//! Shared-data protocol.
//!
//! Output and inputs resolve to one value. The protocol carries no ordering
//! guarantee between producer and consumer, so it is restricted to a single
//! thread: the first access pins the owning thread and any later access from
//! another thread fails with [`ProtocolError::CrossThreadAccess`]. Overlapping
//! borrows through two endpoints fail with [`ProtocolError::Busy`] instead of
//! blocking.

use core::fmt;
use core::ops::{Deref, DerefMut};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use parking_lot::{Mutex, MutexGuard};

use super::{Protocol, ProtocolKind};
use crate::error::ProtocolError;
use crate::parameter::ParameterValue;

/// Marker type for the shared-data protocol.
#[derive(Clone, Copy, Debug, Default)]
pub struct SharedData;

struct SharedCell<T> {
    value: Mutex<T>,
    owner: OnceLock<ThreadId>,
}

impl<T> SharedCell<T> {
    fn borrow(&self) -> Result<MutexGuard<'_, T>, ProtocolError> {
        let current = thread::current().id();
        if *self.owner.get_or_init(|| current) != current {
            return Err(ProtocolError::CrossThreadAccess);
        }
        self.value.try_lock().ok_or(ProtocolError::Busy)
    }
}

/// Read-only borrow of a shared value.
pub struct SharedRef<'a, T>(MutexGuard<'a, T>);

impl<T> Deref for SharedRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// Producer endpoint of a shared-data channel.
pub struct SharedDataOutput<T> {
    cell: Arc<SharedCell<T>>,
}

impl<T: ParameterValue> SharedDataOutput<T> {
    /// Mutable borrow of the shared value.
    pub fn data(&mut self) -> Result<SharedMut<'_, T>, ProtocolError> {
        self.cell.borrow().map(SharedMut)
    }
}

/// Mutable borrow of a shared value.
pub struct SharedMut<'a, T>(MutexGuard<'a, T>);

impl<T> Deref for SharedMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for SharedMut<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> fmt::Debug for SharedDataOutput<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedDataOutput")
            .field("owner", &self.cell.owner.get())
            .finish_non_exhaustive()
    }
}

/// Consumer endpoint of a shared-data channel.
pub struct SharedDataInput<T> {
    cell: Arc<SharedCell<T>>,
}

impl<T: ParameterValue> SharedDataInput<T> {
    /// Read-only borrow of the shared value.
    pub fn data(&self) -> Result<SharedRef<'_, T>, ProtocolError> {
        self.cell.borrow().map(SharedRef)
    }
}

impl<T> fmt::Debug for SharedDataInput<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedDataInput")
            .field("owner", &self.cell.owner.get())
            .finish_non_exhaustive()
    }
}

impl Protocol for SharedData {
    const KIND: ProtocolKind = ProtocolKind::SharedData;

    type Output<T: ParameterValue> = SharedDataOutput<T>;
    type Input<T: ParameterValue> = SharedDataInput<T>;

    fn create<T: ParameterValue>(initial: T) -> SharedDataOutput<T> {
        SharedDataOutput {
            cell: Arc::new(SharedCell {
                value: Mutex::new(initial),
                owner: OnceLock::new(),
            }),
        }
    }

    fn connect<T: ParameterValue>(
        output: &mut SharedDataOutput<T>,
    ) -> Result<SharedDataInput<T>, ProtocolError> {
        Ok(SharedDataInput {
            cell: Arc::clone(&output.cell),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ScalarParameter;

    #[test]
    fn test_same_thread_visibility() {
        let mut output = SharedData::create(ScalarParameter::new(1.0f32));
        let a = SharedData::connect(&mut output).unwrap();
        let b = SharedData::connect(&mut output).unwrap();

        output.data().unwrap().set(4.0);
        assert_eq!(a.data().unwrap().value(), 4.0);
        assert_eq!(b.data().unwrap().value(), 4.0);
    }

    #[test]
    fn test_overlapping_borrow_is_busy() {
        let mut output = SharedData::create(ScalarParameter::new(0i32));
        let input = SharedData::connect(&mut output).unwrap();
        let held = input.data().unwrap();
        assert!(matches!(output.data(), Err(ProtocolError::Busy)));
        drop(held);
        assert!(output.data().is_ok());
    }

    #[test]
    fn test_cross_thread_access_rejected() {
        let mut output = SharedData::create(ScalarParameter::new(0i32));
        let input = SharedData::connect(&mut output).unwrap();
        output.data().unwrap().set(7);

        let result = thread::spawn(move || input.data().map(|v| v.value()))
            .join()
            .unwrap();
        assert_eq!(result, Err(ProtocolError::CrossThreadAccess));
    }
}
