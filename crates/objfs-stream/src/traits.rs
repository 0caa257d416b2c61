use std::io;

use crate::error::{StreamError, StreamResult};

/// Reference point for [`Stream::seek`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Whence {
    /// Relative to the beginning of the object.
    Start,
    /// Relative to the current position.
    Current,
    /// Relative to the current end of the object.
    End,
}

/// Positioning shared by every stream.
///
/// Streams are single-owner: none of these methods synchronize, and a stream
/// must not be driven from several callers at once. Wrap it in a `Mutex` if
/// that is needed.
pub trait Stream: Send {
    /// Move the cursor and return the new position.
    ///
    /// On error the position is left unchanged.
    fn seek(&mut self, offset: i64, whence: Whence) -> StreamResult<i64>;

    /// Current position. Never performs I/O.
    fn tell(&self) -> i64;

    /// Release the stream. The underlying pool context stays open.
    fn close(&mut self) -> StreamResult<()>;
}

/// A stream that can be read from.
pub trait ReadStream: Stream {
    /// Read up to `buf.len()` bytes at the cursor and advance past them.
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<usize>;
}

/// A stream that can be written to.
pub trait WriteStream: Stream {
    /// Write all of `buf`. Either the whole buffer is accepted and the
    /// cursor advances by its length, or an error is returned and nothing
    /// moves.
    fn write(&mut self, buf: &[u8]) -> StreamResult<usize>;
}

impl<S: Stream + ?Sized> Stream for Box<S> {
    fn seek(&mut self, offset: i64, whence: Whence) -> StreamResult<i64> {
        (**self).seek(offset, whence)
    }

    fn tell(&self) -> i64 {
        (**self).tell()
    }

    fn close(&mut self) -> StreamResult<()> {
        (**self).close()
    }
}

impl<S: ReadStream + ?Sized> ReadStream for Box<S> {
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<usize> {
        (**self).read(buf)
    }
}

impl<S: WriteStream + ?Sized> WriteStream for Box<S> {
    fn write(&mut self, buf: &[u8]) -> StreamResult<usize> {
        (**self).write(buf)
    }
}

/// Adapts a [`Stream`] to the `std::io` traits.
///
/// [`StreamError::EndOfStream`] becomes `Ok(0)`, so `read_to_end` and
/// `io::copy` work as expected.
#[derive(Debug)]
pub struct IoCompat<S>(pub S);

impl<S> IoCompat<S> {
    pub fn into_inner(self) -> S {
        self.0
    }
}

impl<S: ReadStream> io::Read for IoCompat<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.0.read(buf) {
            Ok(n) => Ok(n),
            Err(StreamError::EndOfStream) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl<S: WriteStream> io::Write for IoCompat<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.0.write(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: Stream> io::Seek for IoCompat<S> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let (offset, whence) = match pos {
            io::SeekFrom::Start(n) => {
                let n = i64::try_from(n).map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidInput, "seek offset overflows i64")
                })?;
                (n, Whence::Start)
            }
            io::SeekFrom::Current(n) => (n, Whence::Current),
            io::SeekFrom::End(n) => (n, Whence::End),
        };
        let new_pos = self.0.seek(offset, whence)?;
        Ok(new_pos as u64)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.0.tell() as u64)
    }
}
