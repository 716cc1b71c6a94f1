//! Rate shapers for bursty inputs.
//!
//! - [`Debouncer`] - collapses a burst into its last value, emitted once the
//!   input has been quiet for the delay
//! - [`ThrottledBuffer`] - delivers a stream as batches at most once per
//!   period, keeping only the newest items when a window overflows
//! - [`BufferWindow`] - the bounded window behind `ThrottledBuffer`

mod debouncer;
mod throttled_buffer;
mod window;

pub use debouncer::Debouncer;
pub use throttled_buffer::ThrottledBuffer;
pub use window::BufferWindow;
