//! Event model and line codec shared by the threadscope tracer and anything
//! that reads its output.
//!
//! One [`Event`] is one line of compact JSON:
//!
//! ```text
//! {"type":"lock_acquired","time":12,"tid":"3","lock":"M"}
//! ```

mod event;
mod primitives;
mod wire;

pub use self::event::*;
pub use self::primitives::*;
pub use self::wire::*;
