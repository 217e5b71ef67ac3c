//! Utility atomic components.
//!
//! Small building blocks for routing and level control. Rendering
//! algorithms (panning, convolution, filtering) live outside this crate and
//! plug in through [`AtomicComponent`](crate::AtomicComponent).

mod add;
mod gain;
mod gain_matrix;

pub use add::Add;
pub use gain::Gain;
pub use gain_matrix::GainMatrix;
