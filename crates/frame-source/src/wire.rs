//! Wire Frame Reader
//!
//! Reads frames in the 24-byte binary layout from any byte stream. Over TCP
//! this talks to a frame server that pushes frames as they occur on the bus.

use crate::error::SourceError;
use crate::FrameSource;
use can_frame::{CanFrame, WIRE_FRAME_SIZE};
use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, info};

/// Frame source reading fixed-width wire frames from a stream
pub struct WireSource<R> {
    reader: R,
    frames_read: u64,
}

/// Wire source connected to a TCP frame server
pub type TcpFrameSource = WireSource<TcpStream>;

impl<R: Read> WireSource<R> {
    /// Wrap an existing byte stream
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            frames_read: 0,
        }
    }

    /// Number of frames decoded so far
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

impl WireSource<TcpStream> {
    /// Connect to a frame server
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, SourceError> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        info!("Connected to frame server at {}", stream.peer_addr()?);
        Ok(Self::new(stream))
    }

    /// Bound how long a single read may block; `None` blocks indefinitely
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), SourceError> {
        self.reader.set_read_timeout(timeout)?;
        Ok(())
    }
}

impl<R: Read + Send> FrameSource for WireSource<R> {
    fn next_frame(&mut self) -> Result<CanFrame, SourceError> {
        let mut buf = [0u8; WIRE_FRAME_SIZE];
        self.reader.read_exact(&mut buf)?;

        let frame = CanFrame::from_wire(&buf)?;
        self.frames_read += 1;
        debug!("Received frame {}", frame);
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use std::net::TcpListener;

    fn encoded(frames: &[CanFrame]) -> Vec<u8> {
        frames.iter().flat_map(|f| f.to_wire()).collect()
    }

    #[test]
    fn test_reads_frames_then_disconnects() {
        let sent = vec![
            CanFrame::new(0x100, &[0x01, 0x90], 10).unwrap(),
            CanFrame::new(0x101, &[0, 0, 0x40, 0x1F], 20).unwrap(),
        ];
        let mut source = WireSource::new(Cursor::new(encoded(&sent)));

        assert_eq!(source.next_frame().unwrap(), sent[0]);
        assert_eq!(source.next_frame().unwrap(), sent[1]);
        assert!(matches!(source.next_frame(), Err(SourceError::Disconnected)));
        assert_eq!(source.frames_read(), 2);
    }

    #[test]
    fn test_partial_frame_is_disconnect() {
        let mut bytes = encoded(&[CanFrame::new(0x100, &[1], 1).unwrap()]);
        bytes.truncate(WIRE_FRAME_SIZE - 4);
        let mut source = WireSource::new(Cursor::new(bytes));
        assert!(matches!(source.next_frame(), Err(SourceError::Disconnected)));
    }

    #[test]
    fn test_malformed_frame() {
        let mut bytes = encoded(&[CanFrame::new(0x100, &[1], 1).unwrap()]);
        bytes[4] = 9;
        let mut source = WireSource::new(Cursor::new(bytes));
        assert!(matches!(source.next_frame(), Err(SourceError::Frame(_))));
    }

    #[test]
    fn test_tcp_source() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let frame = CanFrame::new(0x101, &[1, 2, 3, 4], 99).unwrap();

        let server = std::thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            conn.write_all(&frame.to_wire()).unwrap();
        });

        let mut source = TcpFrameSource::connect(addr).unwrap();
        source.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        assert_eq!(source.next_frame().unwrap(), frame);

        server.join().unwrap();
        assert!(matches!(source.next_frame(), Err(SourceError::Disconnected)));
    }
}
