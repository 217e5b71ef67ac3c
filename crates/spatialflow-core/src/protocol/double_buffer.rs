//! Double-buffering protocol.
//!
//! The output owns a private back buffer; readers see the front buffer
//! published through an [`ArcSwap`]. [`DoubleBufferOutput::swap_buffers`]
//! publishes the back buffer and takes the old front as the new back. A
//! reader holding a guard keeps its buffer alive, and the writer clones
//! instead of mutating whenever such a guard is outstanding, so a reader
//! never sees a partially written value.

use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::{ArcSwap, Guard};

use super::{Protocol, ProtocolKind};
use crate::error::ProtocolError;
use crate::parameter::ParameterValue;

/// Marker type for the double-buffering protocol.
#[derive(Clone, Copy, Debug, Default)]
pub struct DoubleBuffering;

struct FrontBuffer<T> {
    front: ArcSwap<T>,
    /// Incremented once per swap.
    generation: AtomicU64,
}

/// Producer endpoint of a double-buffered channel.
pub struct DoubleBufferOutput<T> {
    back: Arc<T>,
    shared: Arc<FrontBuffer<T>>,
}

impl<T: ParameterValue> DoubleBufferOutput<T> {
    /// Mutable access to the back buffer.
    ///
    /// Clones the buffer first if a reader still holds it from before the
    /// last swap.
    pub fn data(&mut self) -> &mut T {
        Arc::make_mut(&mut self.back)
    }

    /// Replaces the back buffer content.
    pub fn set(&mut self, value: T) {
        *self.data() = value;
    }

    /// Publishes the back buffer to all readers.
    ///
    /// With `copy_value`, the new back buffer starts as a copy of the value
    /// just published, so partial updates build on it. Without it, the new
    /// back buffer holds the previously published value.
    pub fn swap_buffers(&mut self, copy_value: bool) {
        let previous = self.shared.front.swap(Arc::clone(&self.back));
        self.back = previous;
        if copy_value {
            let front = self.shared.front.load();
            Arc::make_mut(&mut self.back).clone_from(&front);
        }
        self.shared.generation.fetch_add(1, Ordering::Release);
    }

    /// Convenience for `set` followed by `swap_buffers(false)`.
    pub fn publish(&mut self, value: T) {
        self.set(value);
        self.swap_buffers(false);
    }
}

impl<T> fmt::Debug for DoubleBufferOutput<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoubleBufferOutput")
            .field("generation", &self.shared.generation.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Consumer endpoint of a double-buffered channel.
pub struct DoubleBufferInput<T> {
    shared: Arc<FrontBuffer<T>>,
    seen: u64,
}

impl<T: ParameterValue> DoubleBufferInput<T> {
    /// Current front buffer. Wait-free.
    pub fn data(&self) -> Guard<Arc<T>> {
        self.shared.front.load()
    }

    /// Whether a swap happened since the last [`reset_changed`](Self::reset_changed).
    pub fn changed(&self) -> bool {
        self.shared.generation.load(Ordering::Acquire) != self.seen
    }

    /// Acknowledges all swaps so far.
    pub fn reset_changed(&mut self) {
        self.seen = self.shared.generation.load(Ordering::Acquire);
    }
}

impl<T> fmt::Debug for DoubleBufferInput<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoubleBufferInput")
            .field("seen", &self.seen)
            .finish_non_exhaustive()
    }
}

impl Protocol for DoubleBuffering {
    const KIND: ProtocolKind = ProtocolKind::DoubleBuffering;

    type Output<T: ParameterValue> = DoubleBufferOutput<T>;
    type Input<T: ParameterValue> = DoubleBufferInput<T>;

    fn create<T: ParameterValue>(initial: T) -> DoubleBufferOutput<T> {
        DoubleBufferOutput {
            back: Arc::new(initial.clone()),
            shared: Arc::new(FrontBuffer {
                front: ArcSwap::from_pointee(initial),
                generation: AtomicU64::new(0),
            }),
        }
    }

    fn connect<T: ParameterValue>(
        output: &mut DoubleBufferOutput<T>,
    ) -> Result<DoubleBufferInput<T>, ProtocolError> {
        Ok(DoubleBufferInput {
            shared: Arc::clone(&output.shared),
            seen: output.shared.generation.load(Ordering::Acquire),
        })
    }
}
