use std::io::{self, Read};

use bytes::BytesMut;
#[cfg(feature = "tokio-io")]
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::constants;

/// Holds the bytes read from the underlying stream that have not been decoded
/// yet: the carried-over tail of earlier reads followed by the latest read.
#[derive(Debug)]
pub(crate) struct StreamBuffer {
    pub(crate) eof: bool,
    pub(crate) buf: BytesMut,
    read_size: usize,
}

impl StreamBuffer {
    pub fn new(read_size: usize) -> Self {
        let mut buf = BytesMut::with_capacity(read_size + constants::CRLF.len());

        // A boundary on the very first line has no CRLF in front of it, seed one
        // so it matches the same delimiter as every later boundary.
        buf.extend_from_slice(constants::CRLF);

        StreamBuffer {
            eof: false,
            buf,
            read_size,
        }
    }

    /// Reads up to `read_size` new bytes behind the carried-over ones, returns
    /// how many were read. Zero means the stream is exhausted.
    pub fn fill<R: Read>(&mut self, reader: &mut R) -> crate::Result<usize> {
        if self.eof {
            return Ok(0);
        }

        let start = self.buf.len();
        self.buf.resize(start + self.read_size, 0);

        let result = loop {
            match reader.read(&mut self.buf[start..]) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                result => break result,
            }
        };

        self.commit(start, result)
    }

    /// Same as [`fill`](Self::fill), suspending at the read instead of blocking.
    #[cfg(feature = "tokio-io")]
    pub async fn fill_async<R: AsyncRead + Unpin>(&mut self, reader: &mut R) -> crate::Result<usize> {
        if self.eof {
            return Ok(0);
        }

        let start = self.buf.len();
        self.buf.resize(start + self.read_size, 0);

        let result = loop {
            match reader.read(&mut self.buf[start..]).await {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                result => break result,
            }
        };

        self.commit(start, result)
    }

    fn commit(&mut self, start: usize, result: io::Result<usize>) -> crate::Result<usize> {
        match result {
            Ok(n) => {
                self.buf.truncate(start + n);
                if n == 0 {
                    self.eof = true;
                }
                Ok(n)
            }
            Err(err) => {
                self.buf.truncate(start);
                Err(crate::Error::StreamReadFailed(err))
            }
        }
    }

    #[cfg(test)]
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }
}
