//! Line-oriented transport
//!
//! The robot talks in newline-terminated ASCII lines while commands go out as raw frames.
//! [`Transport`] is the seam between the protocol logic and the byte channel so the dispatch
//! loop can run against a real serial port or a scripted stand-in.

use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::Duration;

use super::{open_port, ProtocolError, MAX_LINE_LENGTH};

/// Byte channel to the device
pub trait Transport {
    /// Write a complete frame. Partial writes are not recovered.
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), ProtocolError>;

    /// Read one line, waiting at most the channel's read timeout.
    ///
    /// Returns `Ok(None)` when no complete line arrived in time. The line terminator and any
    /// trailing carriage return are stripped.
    fn read_line(&mut self) -> Result<Option<String>, ProtocolError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), ProtocolError> {
        (**self).write_frame(frame)
    }

    fn read_line(&mut self) -> Result<Option<String>, ProtocolError> {
        (**self).read_line()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), ProtocolError> {
        (**self).write_frame(frame)
    }

    fn read_line(&mut self) -> Result<Option<String>, ProtocolError> {
        (**self).read_line()
    }
}

/// [`Transport`] over any blocking `Read + Write` channel whose reads time out
pub struct LineTransport<C> {
    channel: C,
    /// Bytes of a line that has not been terminated yet
    pending: Vec<u8>,
}

/// Transport over a serial port
pub type SerialTransport = LineTransport<Box<dyn SerialPort>>;

impl SerialTransport {
    /// Open and configure a serial port.
    ///
    /// Most boards reset when the port opens; callers should wait for the settle delay
    /// before writing the first frame.
    pub fn open(name: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self, ProtocolError> {
        let port = open_port(name, baud_rate, read_timeout)?;
        tracing::info!(port = name, baud_rate, "serial port opened");
        Ok(Self::new(port))
    }
}

impl<C: Read + Write> LineTransport<C> {
    /// Wrap a channel
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            pending: Vec::with_capacity(64),
        }
    }

    /// Borrow the underlying channel
    pub fn get_ref(&self) -> &C {
        &self.channel
    }

    /// Give back the underlying channel, dropping any partial line
    pub fn into_inner(self) -> C {
        self.channel
    }

    /// Split off the first complete line in the pending buffer, if any
    fn take_line(&mut self) -> Result<Option<String>, ProtocolError> {
        let Some(pos) = self.pending.iter().position(|&b| b == b'\n') else {
            return Ok(None);
        };

        let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        if !line.is_ascii() {
            return Err(ProtocolError::Decode { bytes: line });
        }
        Ok(Some(line.into_iter().map(char::from).collect()))
    }
}

impl<C: Read + Write> Transport for LineTransport<C> {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), ProtocolError> {
        tracing::debug!("tx {} bytes: {:?}", frame.len(), String::from_utf8_lossy(frame));
        self.channel
            .write_all(frame)
            .and_then(|_| self.channel.flush())
            .map_err(|e| ProtocolError::SerialError(e.to_string()))
    }

    fn read_line(&mut self) -> Result<Option<String>, ProtocolError> {
        let mut buf = [0u8; 256];
        loop {
            if let Some(line) = self.take_line()? {
                tracing::trace!("rx line: {line:?}");
                return Ok(Some(line));
            }

            if self.pending.len() > MAX_LINE_LENGTH {
                tracing::warn!(
                    "discarding {} bytes received without a line terminator",
                    self.pending.len()
                );
                self.pending.clear();
            }

            match self.channel.read(&mut buf) {
                Ok(0) => return Err(ProtocolError::Disconnected),
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(ref e)
                    if e.kind() == io::ErrorKind::TimedOut
                        || e.kind() == io::ErrorKind::WouldBlock =>
                {
                    return Ok(None);
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(ProtocolError::SerialError(e.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Channel handing out one scripted chunk per read, then timing out
    struct ChunkedChannel {
        chunks: VecDeque<Vec<u8>>,
        written: Vec<u8>,
        fail_writes: bool,
    }

    impl ChunkedChannel {
        fn new(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
                written: Vec::new(),
                fail_writes: false,
            }
        }
    }

    impl Read for ChunkedChannel {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(chunk) if chunk.is_empty() => Ok(0),
                Some(chunk) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.chunks.push_front(chunk[n..].to_vec());
                    }
                    Ok(n)
                }
                None => Err(io::Error::new(io::ErrorKind::TimedOut, "timed out")),
            }
        }
    }

    impl Write for ChunkedChannel {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_reads_lines_split_across_chunks() {
        let mut t = LineTransport::new(ChunkedChannel::new(&[b"ECH", b"O ok\r\nmov", b"ing\n"]));
        assert_eq!(t.read_line().unwrap().as_deref(), Some("ECHO ok"));
        assert_eq!(t.read_line().unwrap().as_deref(), Some("moving"));
        assert_eq!(t.read_line().unwrap(), None);
    }

    #[test]
    fn test_partial_line_survives_timeout() {
        let mut t = LineTransport::new(ChunkedChannel::new(&[b"DO"]));
        assert_eq!(t.read_line().unwrap(), None);

        t.channel.chunks.push_back(b"NE\n".to_vec());
        assert_eq!(t.read_line().unwrap().as_deref(), Some("DONE"));
    }

    #[test]
    fn test_non_ascii_line_is_decode_error() {
        let mut t = LineTransport::new(ChunkedChannel::new(&[b"\xffbad\nDONE\n"]));
        match t.read_line() {
            Err(ProtocolError::Decode { bytes }) => assert_eq!(bytes, b"\xffbad".to_vec()),
            other => panic!("expected decode error, got {other:?}"),
        }
        // The bad line is consumed and reading continues
        assert_eq!(t.read_line().unwrap().as_deref(), Some("DONE"));
    }

    #[test]
    fn test_eof_is_disconnect() {
        let mut t = LineTransport::new(ChunkedChannel::new(&[b""]));
        assert!(matches!(t.read_line(), Err(ProtocolError::Disconnected)));
    }

    #[test]
    fn test_write_frame() {
        let mut t = LineTransport::new(ChunkedChannel::new(&[]));
        t.write_frame(b"<MOVE, 1, 2>\0").unwrap();
        assert_eq!(t.get_ref().written, b"<MOVE, 1, 2>\0".to_vec());
    }

    #[test]
    fn test_write_failure_is_serial_error() {
        let mut channel = ChunkedChannel::new(&[]);
        channel.fail_writes = true;
        let mut t = LineTransport::new(channel);
        assert!(matches!(
            t.write_frame(b"x"),
            Err(ProtocolError::SerialError(_))
        ));
    }

    #[test]
    fn test_runaway_line_is_discarded() {
        let long = vec![b'a'; MAX_LINE_LENGTH + 10];
        let mut t = LineTransport::new(ChunkedChannel::new(&[long.as_slice(), b"b", b"\nok\n"]));
        assert_eq!(t.read_line().unwrap().as_deref(), Some("b"));
        assert_eq!(t.read_line().unwrap().as_deref(), Some("ok"));
    }
}
