//! Lock-event tracing for multi-threaded programs.
//!
//! Wrap each lock acquisition in a [`ScopedLock`] instead of locking the
//! primitive directly. Every acquisition then shows up on the trace sink as
//! three JSON lines (attempt, acquired, released), tagged with the thread and
//! the lock's logical name:
//!
//! ```text
//! {"type":"lock_acquire_attempt","time":3,"tid":"2","lock":"A"}
//! {"type":"lock_acquired","time":3,"tid":"2","lock":"A"}
//! {"type":"lock_released","time":4,"tid":"2","lock":"A"}
//! ```
//!
//! An external runner reads that stream live to rebuild per-lock timelines and
//! spot cycles. This crate never detects deadlocks itself: a thread that can
//! never get its lock simply stops emitting, and the trace up to that point is
//! the evidence.
//!
//! # Sink
//!
//! Records go to stdout unless `THREADSCOPE_SINK` says otherwise
//! (`stdout`, `stderr` or `off`). Embedders can redirect the live stream with
//! [`Emitter::replace_sink`] on [`emitter()`], or build their own [`Emitter`]
//! and pass it to [`ScopedLock::new_in`].
//!
//! # Time
//!
//! `time` is milliseconds since process start. The origin is fixed by a
//! load-time constructor, so every emitter in the process shares it.

use ctor::ctor;

pub mod config;
pub(crate) mod condvar;
pub(crate) mod emitter;
pub(crate) mod error;
pub(crate) mod guard;
pub(crate) mod lock;

pub use self::condvar::*;
pub use self::config::{SINK_ENV, SinkTarget, TraceConfig};
pub use self::emitter::*;
pub use self::error::*;
pub use self::guard::*;
pub use self::lock::*;
pub use threadscope_types::{Event, EventKind, LockName, PTime, ThreadTag};

#[ctor]
fn init_trace_origin() {
    threadscope_types::anchor_process_start();
}
