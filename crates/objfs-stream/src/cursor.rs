//! Random-access stream with a virtual cursor.
//!
//! Objects in a pool have no stream position of their own. [`ReadWriter`]
//! keeps one locally and turns sequential `read`/`write` calls into
//! byte-range operations at that offset.

use objfs_store::ContextHandle;
use tracing::debug;

use crate::error::{StreamError, StreamResult};
use crate::observer::{self, IoOp, SharedObserver};
use crate::traits::{ReadStream, Stream, Whence, WriteStream};

/// Reader and writer for one object, positioned by a local cursor.
///
/// Construction never touches the store; whether the object exists is only
/// discovered by the first I/O call.
pub struct ReadWriter {
    ctx: ContextHandle,
    oid: String,
    pos: i64,
    observer: SharedObserver,
    strict_eof: bool,
}

impl ReadWriter {
    /// Bind a stream to `oid` in the pool of `ctx`, positioned at 0.
    pub fn new(ctx: ContextHandle, oid: impl Into<String>) -> Self {
        Self {
            ctx,
            oid: oid.into(),
            pos: 0,
            observer: observer::no_op(),
            strict_eof: false,
        }
    }

    /// Report every store round trip to `observer`.
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Confirm end-of-stream with a size query before reporting it.
    ///
    /// Off by default. When enabled, an empty read short of the object's end
    /// is reported as [`StreamError::ShortRead`] instead of [`StreamError::EndOfStream`].
    pub fn with_strict_eof(mut self, strict: bool) -> Self {
        self.strict_eof = strict;
        self
    }

    /// Object id this stream is bound to.
    pub fn oid(&self) -> &str {
        &self.oid
    }

    /// Pool the object lives in.
    pub fn pool(&self) -> &str {
        self.ctx.pool_name()
    }

    fn empty_read(&self) -> StreamError {
        if !self.strict_eof {
            return StreamError::EndOfStream;
        }
        match self.ctx.stat(&self.oid) {
            Ok(stat) if self.pos as u64 >= stat.size => StreamError::EndOfStream,
            Ok(stat) => StreamError::ShortRead {
                oid: self.oid.clone(),
                pos: self.pos,
                size: stat.size,
            },
            Err(e) => StreamError::Store(e),
        }
    }
}

impl std::fmt::Debug for ReadWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadWriter")
            .field("pool", &self.ctx.pool_name())
            .field("oid", &self.oid)
            .field("pos", &self.pos)
            .finish()
    }
}

impl Stream for ReadWriter {
    /// Seeks are checked against the object's current size, fetched with one
    /// stat call. Targets outside `[0, size]` are rejected; a stream cannot
    /// be moved past the end even to extend the object.
    fn seek(&mut self, offset: i64, whence: Whence) -> StreamResult<i64> {
        let size = self.ctx.stat(&self.oid)?.size;
        let base: i128 = match whence {
            Whence::Start => 0,
            Whence::Current => self.pos.into(),
            Whence::End => size.into(),
        };
        let target = base + i128::from(offset);
        if target < 0 || target > i128::from(size) {
            debug!(pool = %self.ctx.pool_name(), oid = %self.oid, target = %target, size, "seek out of range");
            return Err(StreamError::InvalidArgument {
                oid: self.oid.clone(),
                target,
                size,
            });
        }
        self.pos = i64::try_from(target).map_err(|_| StreamError::InvalidArgument {
            oid: self.oid.clone(),
            target,
            size,
        })?;
        Ok(self.pos)
    }

    fn tell(&self) -> i64 {
        self.pos
    }

    fn close(&mut self) -> StreamResult<()> {
        Ok(())
    }
}

impl ReadStream for ReadWriter {
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<usize> {
        let started = observer::start();
        let result = self.ctx.read(&self.oid, buf, self.pos as u64);
        let outcome = match result {
            Ok(0) => Err(self.empty_read()),
            Ok(n) => {
                self.pos += n as i64;
                Ok(n)
            }
            Err(e) => Err(StreamError::Store(e)),
        };
        let bytes = *outcome.as_ref().unwrap_or(&0);
        observer::finish(
            self.observer.as_ref(),
            self.ctx.pool_name(),
            IoOp::Read,
            started,
            bytes,
            outcome.is_ok(),
        );
        outcome
    }
}

impl WriteStream for ReadWriter {
    fn write(&mut self, buf: &[u8]) -> StreamResult<usize> {
        let started = observer::start();
        let result = self.ctx.write(&self.oid, buf, self.pos as u64);
        let ok = result.is_ok();
        observer::finish(
            self.observer.as_ref(),
            self.ctx.pool_name(),
            IoOp::Write,
            started,
            if ok { buf.len() } else { 0 },
            ok,
        );
        result?;
        self.pos += buf.len() as i64;
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Seek, SeekFrom, Write};
    use std::sync::Arc;

    use objfs_store::{InMemoryCluster, InMemoryPool, ObjectClient};
    use proptest::prelude::*;

    use super::*;
    use crate::observer::PoolCounters;
    use crate::traits::IoCompat;

    fn setup() -> (Arc<InMemoryPool>, ContextHandle) {
        let cluster = InMemoryCluster::new();
        let pool = cluster.create_pool("data").unwrap();
        let ctx = cluster
            .connected_client()
            .unwrap()
            .open_context("data")
            .unwrap();
        (pool, ctx)
    }

    // -----------------------------------------------------------------------
    // Read / write
    // -----------------------------------------------------------------------

    #[test]
    fn write_seek_read_scenario() {
        let (_pool, ctx) = setup();
        let mut rw = ReadWriter::new(ctx, "greeting");

        assert_eq!(rw.write(b"hello").unwrap(), 5);
        assert_eq!(rw.tell(), 5);
        assert_eq!(rw.seek(0, Whence::Start).unwrap(), 0);

        let mut buf = [0u8; 5];
        assert_eq!(rw.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b"hello");
        assert_eq!(rw.tell(), 5);

        assert!(rw.read(&mut buf).unwrap_err().is_end_of_stream());
        assert_eq!(rw.tell(), 5);
    }

    #[test]
    fn short_read_advances_by_bytes_read() {
        let (pool, ctx) = setup();
        pool.put("obj", b"abc").unwrap();
        let mut rw = ReadWriter::new(ctx, "obj");
        let mut buf = [0u8; 8];
        assert_eq!(rw.read(&mut buf).unwrap(), 3);
        assert_eq!(rw.tell(), 3);
    }

    #[test]
    fn write_overwrites_at_cursor() {
        let (pool, ctx) = setup();
        pool.put("obj", b"abcdef").unwrap();
        let mut rw = ReadWriter::new(ctx, "obj");
        rw.seek(2, Whence::Start).unwrap();
        rw.write(b"XY").unwrap();
        assert_eq!(pool.get("obj").unwrap().unwrap(), b"abXYef");
        assert_eq!(rw.tell(), 4);
    }

    #[test]
    fn construction_does_not_touch_store() {
        let (pool, ctx) = setup();
        let rw = ReadWriter::new(ctx, "never-created");
        assert_eq!(rw.tell(), 0);
        assert!(pool.get("never-created").unwrap().is_none());
    }

    #[test]
    fn read_of_missing_object_surfaces_store_error() {
        let (_pool, ctx) = setup();
        let mut rw = ReadWriter::new(ctx, "missing");
        let mut buf = [0u8; 4];
        match rw.read(&mut buf) {
            Err(StreamError::Store(e)) => assert!(e.is_not_found()),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(rw.tell(), 0);
    }

    #[test]
    fn failed_write_leaves_position() {
        let (pool, ctx) = setup();
        let mut rw = ReadWriter::new(ctx, "obj");
        rw.write(b"12").unwrap();
        pool.set_fail_writes(true);
        assert!(matches!(rw.write(b"345"), Err(StreamError::Store(_))));
        assert_eq!(rw.tell(), 2);
    }

    // -----------------------------------------------------------------------
    // Seek
    // -----------------------------------------------------------------------

    #[test]
    fn seek_relative_to_each_origin() {
        let (pool, ctx) = setup();
        pool.put("obj", b"0123456789").unwrap();
        let mut rw = ReadWriter::new(ctx, "obj");

        assert_eq!(rw.seek(4, Whence::Start).unwrap(), 4);
        assert_eq!(rw.seek(3, Whence::Current).unwrap(), 7);
        assert_eq!(rw.seek(-2, Whence::Current).unwrap(), 5);
        assert_eq!(rw.seek(-1, Whence::End).unwrap(), 9);
        assert_eq!(rw.seek(0, Whence::End).unwrap(), 10);
    }

    #[test]
    fn seek_out_of_range_is_rejected() {
        let (pool, ctx) = setup();
        pool.put("obj", b"abc").unwrap();
        let mut rw = ReadWriter::new(ctx, "obj");
        rw.seek(1, Whence::Start).unwrap();

        for (offset, whence) in [(4, Whence::Start), (-1, Whence::Start), (1, Whence::End), (-5, Whence::Current)] {
            assert!(matches!(
                rw.seek(offset, whence),
                Err(StreamError::InvalidArgument { .. })
            ));
            assert_eq!(rw.tell(), 1);
        }
    }

    #[test]
    fn seek_extreme_offsets_do_not_overflow() {
        let (pool, ctx) = setup();
        pool.put("obj", b"abc").unwrap();
        let mut rw = ReadWriter::new(ctx, "obj");
        rw.seek(3, Whence::Start).unwrap();
        assert!(rw.seek(i64::MAX, Whence::Current).is_err());
        assert!(rw.seek(i64::MIN, Whence::End).is_err());
        assert_eq!(rw.tell(), 3);
    }

    #[test]
    fn seek_on_missing_object_fails_with_stat_error() {
        let (_pool, ctx) = setup();
        let mut rw = ReadWriter::new(ctx, "missing");
        assert!(matches!(rw.seek(0, Whence::Start), Err(StreamError::Store(_))));
    }

    // -----------------------------------------------------------------------
    // End-of-stream detection
    // -----------------------------------------------------------------------

    #[test]
    fn strict_eof_confirms_with_stat() {
        let (pool, ctx) = setup();
        pool.put("obj", b"ab").unwrap();
        let mut rw = ReadWriter::new(ctx, "obj").with_strict_eof(true);
        let mut buf = [0u8; 2];
        rw.read(&mut buf).unwrap();
        assert!(rw.read(&mut buf).unwrap_err().is_end_of_stream());
    }

    #[test]
    fn empty_buffer_reads_as_end_of_stream_by_default() {
        let (pool, ctx) = setup();
        pool.put("obj", b"ab").unwrap();
        let mut rw = ReadWriter::new(ctx, "obj");
        assert!(rw.read(&mut []).unwrap_err().is_end_of_stream());
    }

    #[test]
    fn strict_eof_flags_empty_read_before_end() {
        let (pool, ctx) = setup();
        pool.put("obj", b"ab").unwrap();
        let mut rw = ReadWriter::new(ctx, "obj").with_strict_eof(true);
        assert!(matches!(
            rw.read(&mut []),
            Err(StreamError::ShortRead { pos: 0, size: 2, .. })
        ));
        assert_eq!(rw.tell(), 0);
    }

    // -----------------------------------------------------------------------
    // Instrumentation and std::io
    // -----------------------------------------------------------------------

    #[test]
    fn observer_sees_reads_and_writes() {
        let (_pool, ctx) = setup();
        let counters = Arc::new(PoolCounters::new());
        let mut rw = ReadWriter::new(ctx, "obj").with_observer(counters.clone());
        rw.write(b"abcd").unwrap();
        rw.seek(0, Whence::Start).unwrap();
        let mut buf = [0u8; 8];
        rw.read(&mut buf).unwrap();
        let _ = rw.read(&mut buf);

        let writes = counters.get("data", IoOp::Write);
        assert_eq!((writes.calls, writes.bytes), (1, 4));
        let reads = counters.get("data", IoOp::Read);
        assert_eq!((reads.calls, reads.bytes, reads.errors), (1, 4, 1));
    }

    #[test]
    fn std_io_round_trip() {
        let (_pool, ctx) = setup();
        let mut io = IoCompat(ReadWriter::new(ctx, "obj"));
        io.write_all(b"line one\nline two\n").unwrap();
        io.seek(SeekFrom::Start(5)).unwrap();
        let mut out = String::new();
        io.read_to_string(&mut out).unwrap();
        assert_eq!(out, "one\nline two\n");
        assert!(io.seek(SeekFrom::End(1)).is_err());
    }

    #[test]
    fn debug_format() {
        let (_pool, ctx) = setup();
        let rw = ReadWriter::new(ctx, "obj");
        let debug = format!("{rw:?}");
        assert!(debug.contains("ReadWriter"));
        assert!(debug.contains("obj"));
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    proptest! {
        #[test]
        fn position_is_sum_of_transfers(chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..32), 1..16)) {
            let (_pool, ctx) = setup();
            let mut rw = ReadWriter::new(ctx, "obj");
            let mut expected = 0i64;
            for chunk in &chunks {
                prop_assert_eq!(rw.write(chunk).unwrap(), chunk.len());
                expected += chunk.len() as i64;
                prop_assert_eq!(rw.tell(), expected);
            }

            rw.seek(0, Whence::Start).unwrap();
            let mut total = 0i64;
            let mut buf = [0u8; 7];
            loop {
                match rw.read(&mut buf) {
                    Ok(n) => {
                        total += n as i64;
                        prop_assert_eq!(rw.tell(), total);
                    }
                    Err(e) => {
                        prop_assert!(e.is_end_of_stream());
                        break;
                    }
                }
            }
            prop_assert_eq!(total, expected);
        }

        #[test]
        fn seek_succeeds_iff_target_in_bounds(size in 0usize..64, offset in -100i64..100, origin in 0u8..3) {
            let (pool, ctx) = setup();
            pool.put("obj", &vec![7u8; size]).unwrap();
            let mut rw = ReadWriter::new(ctx, "obj");
            let start = (size / 2) as i64;
            rw.seek(start, Whence::Start).unwrap();

            let (whence, base) = match origin {
                0 => (Whence::Start, 0),
                1 => (Whence::Current, start),
                _ => (Whence::End, size as i64),
            };
            let target = base + offset;
            match rw.seek(offset, whence) {
                Ok(pos) => {
                    prop_assert!(target >= 0 && target <= size as i64);
                    prop_assert_eq!(pos, target);
                    prop_assert_eq!(rw.tell(), target);
                }
                Err(e) => {
                    let out_of_range = matches!(e, StreamError::InvalidArgument { .. });
                    prop_assert!(out_of_range);
                    prop_assert!(target < 0 || target > size as i64);
                    prop_assert_eq!(rw.tell(), start);
                }
            }
        }
    }
}
