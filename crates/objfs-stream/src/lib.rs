//! Byte streams over objects in a pool.
//!
//! Objects have no stream cursor of their own, so every stream here keeps a
//! virtual position and maps sequential calls onto the store's byte-range
//! operations:
//!
//! - [`ReadWriter`] -- read, overwrite, and seek within `[0, size]`
//! - [`Appender`] -- append-only writes; seeking is a position query only
//!
//! Both implement the [`Stream`] family of traits and can be used through
//! `std::io` via [`IoCompat`]. Store round trips are reported to an
//! [`IoObserver`] for instrumentation.
//!
//! Streams are single-owner and unsynchronized. All calls block until the
//! store answers; there is no cancellation or timeout at this layer.

pub mod appender;
pub mod cursor;
pub mod error;
pub mod observer;
pub mod traits;

pub use appender::Appender;
pub use cursor::ReadWriter;
pub use error::{StreamError, StreamResult};
pub use observer::{IoEvent, IoObserver, IoOp, NoOpObserver, OpStats, PoolCounters, SharedObserver};
pub use traits::{IoCompat, ReadStream, Stream, Whence, WriteStream};
