//! Newline-delimited frame extraction.
//!
//! # Design Decisions
//! - `next_frame` only awaits inside `fill_buf`, and all partial state lives
//!   in the reader, so it is safe to use as a `select!` branch
//! - Blank lines are skipped here and never reach the dispatcher
//! - Oversized frames are discarded up to their newline and reported once

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// One unit read from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Frame bytes, newline and trailing `\r` removed.
    Data(Vec<u8>),
    /// Frame exceeded the limit; its bytes were dropped.
    Oversized { len: usize },
}

/// Reads newline-terminated frames with a size limit.
pub struct FrameReader<R> {
    reader: R,
    max_frame_bytes: usize,
    buf: Vec<u8>,
    discarding: bool,
    discarded: usize,
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    pub fn new(reader: R, max_frame_bytes: usize) -> Self {
        Self {
            reader,
            max_frame_bytes,
            buf: Vec::new(),
            discarding: false,
            discarded: 0,
        }
    }

    /// Next non-blank frame, or `None` at end of input.
    ///
    /// A final frame without a trailing newline is still returned.
    pub async fn next_frame(&mut self) -> io::Result<Option<Frame>> {
        loop {
            let available = self.reader.fill_buf().await?;

            if available.is_empty() {
                if let Some(frame) = self.finish_frame() {
                    return Ok(Some(frame));
                }
                return Ok(None);
            }

            match available.iter().position(|b| *b == b'\n') {
                Some(pos) => {
                    if self.discarding {
                        self.discarded += pos;
                    } else {
                        self.buf.extend_from_slice(&available[..pos]);
                    }
                    self.reader.consume(pos + 1);

                    if let Some(frame) = self.finish_frame() {
                        return Ok(Some(frame));
                    }
                }
                None => {
                    let len = available.len();
                    if self.discarding {
                        self.discarded += len;
                    } else {
                        self.buf.extend_from_slice(available);
                        if self.buf.len() > self.max_frame_bytes {
                            self.discarding = true;
                            self.discarded = self.buf.len();
                            self.buf.clear();
                        }
                    }
                    self.reader.consume(len);
                }
            }
        }
    }

    /// Close the current frame; `None` when it was blank.
    fn finish_frame(&mut self) -> Option<Frame> {
        if self.discarding {
            self.discarding = false;
            let len = std::mem::take(&mut self.discarded);
            return Some(Frame::Oversized { len });
        }

        let mut frame = std::mem::take(&mut self.buf);
        if frame.last() == Some(&b'\r') {
            frame.pop();
        }

        if frame.iter().all(|b| b.is_ascii_whitespace()) {
            return None;
        }

        if frame.len() > self.max_frame_bytes {
            return Some(Frame::Oversized { len: frame.len() });
        }

        Some(Frame::Data(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    async fn collect(input: &[u8], max: usize, capacity: usize) -> Vec<Frame> {
        let reader = BufReader::with_capacity(capacity, input);
        let mut frames = FrameReader::new(reader, max);
        let mut out = Vec::new();
        while let Some(frame) = frames.next_frame().await.unwrap() {
            out.push(frame);
        }
        out
    }

    #[tokio::test]
    async fn test_splits_lines_and_strips_cr() {
        let frames = collect(b"{\"a\":1}\r\n{\"b\":2}\n", 1024, 64).await;
        assert_eq!(
            frames,
            vec![
                Frame::Data(b"{\"a\":1}".to_vec()),
                Frame::Data(b"{\"b\":2}".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn test_blank_lines_are_skipped() {
        let frames = collect(b"\n  \n\r\n{}\n\n", 1024, 64).await;
        assert_eq!(frames, vec![Frame::Data(b"{}".to_vec())]);
    }

    #[tokio::test]
    async fn test_final_frame_without_newline() {
        let frames = collect(b"{}\n[1]", 1024, 64).await;
        assert_eq!(frames, vec![Frame::Data(b"{}".to_vec()), Frame::Data(b"[1]".to_vec())]);
    }

    #[tokio::test]
    async fn test_frames_spanning_buffer_boundaries() {
        let line = format!("{{\"method\":\"{}\"}}\n", "x".repeat(100));
        let input = line.repeat(3);
        // Tiny buffer forces every frame across many fill_buf calls.
        let frames = collect(input.as_bytes(), 1024, 7).await;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], Frame::Data(line.trim_end().as_bytes().to_vec()));
    }

    #[tokio::test]
    async fn test_oversized_frame_is_discarded() {
        let big = "y".repeat(200);
        let input = format!("{}\n{{}}\n", big);
        let frames = collect(input.as_bytes(), 50, 16).await;
        assert_eq!(frames, vec![Frame::Oversized { len: 200 }, Frame::Data(b"{}".to_vec())]);
    }

    #[tokio::test]
    async fn test_oversized_within_one_buffer() {
        let input = format!("{}\n{{}}\n", "z".repeat(60));
        let frames = collect(input.as_bytes(), 50, 4096).await;
        assert_eq!(frames, vec![Frame::Oversized { len: 60 }, Frame::Data(b"{}".to_vec())]);
    }
}
