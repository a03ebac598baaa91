// Request framing: newline-delimited lines with a length cap

use bytes::BytesMut;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};

/// One decoded unit of the request stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestFrame {
    Line(String),
    /// A line longer than the cap; its bytes are discarded up to the next newline
    Oversized,
}

/// [`LinesCodec`] that reports oversized lines as a frame instead of an
/// error, so the stream keeps going after one.
#[derive(Debug)]
pub struct RequestCodec {
    lines: LinesCodec,
}

impl RequestCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_length),
        }
    }

    fn map(result: Result<Option<String>, LinesCodecError>) -> Result<Option<RequestFrame>, LinesCodecError> {
        match result {
            Ok(line) => Ok(line.map(RequestFrame::Line)),
            Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(RequestFrame::Oversized)),
            Err(e) => Err(e),
        }
    }
}

impl Decoder for RequestCodec {
    type Item = RequestFrame;
    type Error = LinesCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Self::map(self.lines.decode(src))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Self::map(self.lines.decode_eof(src))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversized_line_then_normal_line() {
        let mut codec = RequestCodec::new(8);
        let mut buf = BytesMut::from(&b"0123456789abcdef\nping\n"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), Some(RequestFrame::Oversized));

        let mut frames = Vec::new();
        while let Some(frame) = codec.decode(&mut buf).unwrap() {
            frames.push(frame);
        }
        assert_eq!(frames, vec![RequestFrame::Line("ping".to_string())]);
    }

    #[test]
    fn test_trailing_line_without_newline() {
        let mut codec = RequestCodec::new(64);
        let mut buf = BytesMut::from(&b"last"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(
            codec.decode_eof(&mut buf).unwrap(),
            Some(RequestFrame::Line("last".to_string()))
        );
    }
}
