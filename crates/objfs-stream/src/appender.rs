//! Append-only stream.

use objfs_store::ContextHandle;
use tracing::debug;

use crate::error::{StreamError, StreamResult};
use crate::observer::{self, IoOp, SharedObserver};
use crate::traits::{Stream, Whence, WriteStream};

/// Appends every write to the end of one object.
///
/// The position starts at the object's size when the appender is created and
/// then only counts bytes appended through this instance. Other writers
/// appending to the same object are not seen, so the position can fall
/// behind the real size. Each write lands as one contiguous unit; the order
/// between concurrent appenders is up to the store.
pub struct Appender {
    ctx: ContextHandle,
    oid: String,
    pos: i64,
    observer: SharedObserver,
}

impl Appender {
    /// Bind an appender to `oid`. Never fails: if the size query fails the
    /// object is assumed not to exist yet and the position starts at 0.
    pub fn new(ctx: ContextHandle, oid: impl Into<String>) -> Self {
        let oid = oid.into();
        let pos = match ctx.stat(&oid) {
            Ok(stat) => i64::try_from(stat.size).unwrap_or(i64::MAX),
            Err(e) => {
                debug!(pool = %ctx.pool_name(), oid = %oid, error = %e, "stat failed; appending from offset 0");
                0
            }
        };
        Self {
            ctx,
            oid,
            pos,
            observer: observer::no_op(),
        }
    }

    /// Report every append to `observer`.
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn oid(&self) -> &str {
        &self.oid
    }

    pub fn pool(&self) -> &str {
        self.ctx.pool_name()
    }
}

impl std::fmt::Debug for Appender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Appender")
            .field("pool", &self.ctx.pool_name())
            .field("oid", &self.oid)
            .field("pos", &self.pos)
            .finish()
    }
}

impl Stream for Appender {
    /// Only `seek(0, Whence::Current)` is accepted, as a position query.
    fn seek(&mut self, offset: i64, whence: Whence) -> StreamResult<i64> {
        if offset == 0 && whence == Whence::Current {
            return Ok(self.pos);
        }
        Err(StreamError::Unsupported {
            operation: "seek on append-only stream",
        })
    }

    fn tell(&self) -> i64 {
        self.pos
    }

    fn close(&mut self) -> StreamResult<()> {
        Ok(())
    }
}

impl WriteStream for Appender {
    fn write(&mut self, buf: &[u8]) -> StreamResult<usize> {
        let started = observer::start();
        let result = self.ctx.append(&self.oid, buf);
        let ok = result.is_ok();
        observer::finish(
            self.observer.as_ref(),
            self.ctx.pool_name(),
            IoOp::Append,
            started,
            if ok { buf.len() } else { 0 },
            ok,
        );
        result?;
        self.pos += buf.len() as i64;
        Ok(buf.len())
    }
}
