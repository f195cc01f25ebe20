//! Shared test doubles

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use wallbot_core::protocol::LineTransport;

/// Mock serial port.
///
/// Bytes queued in `recv_buffer` are handed out on read; once it is drained reads time out
/// like a real port would. Every frame written (terminated by NUL) is recorded and queues
/// `reply_per_frame` for the next reads.
pub struct MockSerial {
    pub recv_buffer: VecDeque<u8>,
    pub frames: Vec<Vec<u8>>,
    pub reply_per_frame: Vec<u8>,
    pub fail_on_send: bool,
    current: Vec<u8>,
}

impl MockSerial {
    pub fn new() -> Self {
        Self {
            recv_buffer: VecDeque::new(),
            frames: Vec::new(),
            reply_per_frame: Vec::new(),
            fail_on_send: false,
            current: Vec::new(),
        }
    }

    /// Device that answers every frame with `reply`
    pub fn acking(reply: &str) -> Self {
        let mut mock = Self::new();
        mock.reply_per_frame = reply.as_bytes().to_vec();
        mock
    }

    /// Queue bytes as if the device had sent them
    pub fn push_incoming(&mut self, data: &str) {
        self.recv_buffer.extend(data.as_bytes());
    }

    /// Recorded frames as text, without their terminator
    pub fn frame_texts(&self) -> Vec<String> {
        self.frames
            .iter()
            .map(|f| String::from_utf8_lossy(&f[..f.len() - 1]).into_owned())
            .collect()
    }
}

impl Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.recv_buffer.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "Operation timed out"));
        }
        let mut n = 0;
        while n < buf.len() {
            match self.recv_buffer.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_on_send {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "Serial write failed"));
        }
        for &b in buf {
            self.current.push(b);
            if b == 0 {
                self.frames.push(std::mem::take(&mut self.current));
                let reply = self.reply_per_frame.clone();
                self.recv_buffer.extend(reply);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn transport(mock: MockSerial) -> LineTransport<MockSerial> {
    LineTransport::new(mock)
}

/// Route `tracing` output to the test harness
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("wallbot_core=debug")
        .with_test_writer()
        .try_init();
}
