use bytes::{BufMut, BytesMut};
use tracing::{debug, trace};

use crate::error::{FrameError, Result};
use crate::status::{StatusRegistry, MAX_WIRE_VALUES};

/// Every frame starts with this marker.
pub const START_MARKER: u8 = b'^';

/// Second byte of an error-notification frame.
pub const ESCAPE_MARKER: u8 = b'E';

/// Ends the text of an error-notification frame.
pub const TERMINATOR: u8 = b'\n';

/// A status frame is marker + channel digit + status digit.
pub const FRAME_SIZE: usize = 3;

/// Longest device error text kept before the bypass gives up on a terminator.
pub const MAX_DEVICE_ERROR_LEN: usize = 64;

/// A channel/status pair, as carried by a status frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusUpdate {
    /// Zero-based channel index.
    pub channel: u8,
    /// Status code.
    pub status: u8,
}

impl StatusUpdate {
    pub fn new(channel: u8, status: u8) -> Self {
        Self { channel, status }
    }
}

/// Valid value ranges for inbound frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    num_channels: u8,
    num_statuses: u8,
}

impl Limits {
    /// Both counts must be in `1..=10`.
    pub fn new(num_channels: usize, num_statuses: usize) -> Result<Self> {
        for (what, count) in [("channel", num_channels), ("status", num_statuses)] {
            if count == 0 || count > MAX_WIRE_VALUES {
                return Err(FrameError::InvalidRegistry(format!(
                    "{what} count {count} out of range 1..={MAX_WIRE_VALUES}"
                )));
            }
        }
        Ok(Self {
            num_channels: num_channels as u8,
            num_statuses: num_statuses as u8,
        })
    }

    /// Limits for `num_channels` channels over the statuses in `registry`.
    pub fn for_registry(num_channels: usize, registry: &StatusRegistry) -> Result<Self> {
        Self::new(num_channels, registry.num_statuses())
    }

    pub fn num_channels(&self) -> u8 {
        self.num_channels
    }

    pub fn num_statuses(&self) -> u8 {
        self.num_statuses
    }

    /// Check a pair against both ranges, channel first.
    pub fn check(&self, update: StatusUpdate) -> std::result::Result<(), Rejection> {
        if update.channel >= self.num_channels {
            return Err(Rejection::Channel(update.channel));
        }
        if update.status >= self.num_statuses {
            return Err(Rejection::Status(update.status));
        }
        Ok(())
    }
}

/// Why a well-formed status frame was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Channel(u8),
    Status(u8),
}

impl Rejection {
    /// Text sent back to the device in the error-notification frame.
    pub fn reply_text(&self) -> &'static str {
        match self {
            Rejection::Channel(_) => "channel not understood",
            Rejection::Status(_) => "status not understood",
        }
    }
}

/// One result of feeding bytes to the [`Decoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A valid status report.
    Update(StatusUpdate),
    /// A status frame with an out-of-range channel or status digit.
    Rejected(Rejection),
    /// An error notification sent by the device.
    DeviceError(String),
}

/// Where the decoder is within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Skipping bytes until a start marker.
    Seeking,
    /// Start marker seen; next byte is a channel digit or the escape marker.
    ExpectSecond,
    /// Draining device error text up to the terminator.
    ErrorBypass,
    /// Channel digit seen; next byte is the status digit.
    ExpectThird { channel: u8 },
}

/// Streaming decoder for inbound frames.
///
/// Bytes are pushed one at a time; the decoder never needs more input than
/// it has and always falls back to [`DecoderState::Seeking`] on anything
/// unexpected.
#[derive(Debug, Clone)]
pub struct Decoder {
    limits: Limits,
    state: DecoderState,
    error_text: Vec<u8>,
}

impl Decoder {
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            state: DecoderState::Seeking,
            error_text: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.state = DecoderState::Seeking;
        self.error_text.clear();
    }

    /// Advance by one byte, returning a result when a frame completes.
    pub fn push(&mut self, byte: u8) -> Option<Decoded> {
        match self.state {
            DecoderState::Seeking => {
                if byte == START_MARKER {
                    self.state = DecoderState::ExpectSecond;
                } else {
                    trace!(byte, "skipping byte outside frame");
                }
                None
            }
            DecoderState::ExpectSecond => {
                if byte == ESCAPE_MARKER {
                    self.error_text.clear();
                    self.state = DecoderState::ErrorBypass;
                } else if let Some(channel) = digit(byte) {
                    self.state = DecoderState::ExpectThird { channel };
                } else {
                    self.malformed(byte);
                }
                None
            }
            DecoderState::ErrorBypass => {
                if byte != TERMINATOR {
                    self.error_text.push(byte);
                    if self.error_text.len() < MAX_DEVICE_ERROR_LEN {
                        return None;
                    }
                    debug!("device error text exceeded limit, truncating");
                }
                self.state = DecoderState::Seeking;
                let text = String::from_utf8_lossy(&self.error_text)
                    .trim_end_matches('\r')
                    .to_string();
                self.error_text.clear();
                Some(Decoded::DeviceError(text))
            }
            DecoderState::ExpectThird { channel } => {
                let Some(status) = digit(byte) else {
                    self.malformed(byte);
                    return None;
                };
                self.state = DecoderState::Seeking;
                let update = StatusUpdate { channel, status };
                match self.limits.check(update) {
                    Ok(()) => Some(Decoded::Update(update)),
                    Err(rejection) => Some(Decoded::Rejected(rejection)),
                }
            }
        }
    }

    /// Push a slice, collecting every completed result in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Decoded> {
        bytes.iter().filter_map(|&byte| self.push(byte)).collect()
    }

    fn malformed(&mut self, byte: u8) {
        if byte == START_MARKER {
            // A fresh marker abandons the partial frame and starts the next one.
            debug!("start marker inside frame, restarting");
            self.state = DecoderState::ExpectSecond;
        } else {
            debug!(byte, "malformed frame, resynchronizing");
            self.state = DecoderState::Seeking;
        }
    }
}

fn digit(byte: u8) -> Option<u8> {
    byte.is_ascii_digit().then(|| byte - b'0')
}

/// Encode a status command.
///
/// Wire format:
/// ```text
/// ┌────────────┬───────────────┬──────────────┐
/// │ Start (1B) │ Channel (1B)  │ Status (1B)  │
/// │ '^'        │ ASCII '0'-'9' │ ASCII '0'-'9'│
/// └────────────┴───────────────┴──────────────┘
/// ```
///
/// Callers validate both values first; a value above 9 is a programming error.
pub fn encode_command(update: StatusUpdate, dst: &mut BytesMut) {
    debug_assert!(usize::from(update.channel) < MAX_WIRE_VALUES);
    debug_assert!(usize::from(update.status) < MAX_WIRE_VALUES);
    dst.reserve(FRAME_SIZE);
    dst.put_u8(START_MARKER);
    dst.put_u8(b'0' + update.channel);
    dst.put_u8(b'0' + update.status);
}

/// Encode an error notification: `^E<text>\n`.
///
/// Line breaks inside `text` are dropped so the frame stays terminated once.
pub fn encode_error(text: &str, dst: &mut BytesMut) {
    dst.reserve(text.len() + 3);
    dst.put_u8(START_MARKER);
    dst.put_u8(ESCAPE_MARKER);
    for byte in text.bytes().filter(|b| *b != b'\n' && *b != b'\r') {
        dst.put_u8(byte);
    }
    dst.put_u8(TERMINATOR);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> Decoder {
        Decoder::new(Limits::new(6, 4).unwrap())
    }

    fn update(channel: u8, status: u8) -> Decoded {
        Decoded::Update(StatusUpdate::new(channel, status))
    }

    #[test]
    fn encode_command_is_three_ascii_bytes() {
        let mut buf = BytesMut::new();
        encode_command(StatusUpdate::new(2, 3), &mut buf);
        assert_eq!(buf.as_ref(), b"^23");
    }

    #[test]
    fn encode_error_frames_text() {
        let mut buf = BytesMut::new();
        encode_error("channel not understood", &mut buf);
        assert_eq!(buf.as_ref(), b"^Echannel not understood\n");
    }

    #[test]
    fn encode_error_strips_embedded_newlines() {
        let mut buf = BytesMut::new();
        encode_error("two\nlines\r", &mut buf);
        assert_eq!(buf.as_ref(), b"^Etwolines\n");
    }

    #[test]
    fn every_valid_command_decodes_to_itself() {
        let mut dec = decoder();
        for channel in 0..6 {
            for status in 0..4 {
                let mut buf = BytesMut::new();
                encode_command(StatusUpdate::new(channel, status), &mut buf);
                assert_eq!(dec.feed(&buf), vec![update(channel, status)]);
            }
        }
    }

    #[test]
    fn decoder_walks_states() {
        let mut dec = decoder();
        assert_eq!(dec.state(), DecoderState::Seeking);
        assert_eq!(dec.push(b'^'), None);
        assert_eq!(dec.state(), DecoderState::ExpectSecond);
        assert_eq!(dec.push(b'1'), None);
        assert_eq!(dec.state(), DecoderState::ExpectThird { channel: 1 });
        assert_eq!(dec.push(b'2'), Some(update(1, 2)));
        assert_eq!(dec.state(), DecoderState::Seeking);
    }

    #[test]
    fn channel_out_of_range_is_rejected() {
        let mut dec = decoder();
        for channel in 6..=9u8 {
            let frame = [b'^', b'0' + channel, b'1'];
            let out = dec.feed(&frame);
            assert_eq!(out, vec![Decoded::Rejected(Rejection::Channel(channel))]);
        }
        assert_eq!(Rejection::Channel(7).reply_text(), "channel not understood");
    }

    #[test]
    fn status_out_of_range_is_rejected() {
        let mut dec = decoder();
        for status in 4..=9u8 {
            let frame = [b'^', b'0', b'0' + status];
            let out = dec.feed(&frame);
            assert_eq!(out, vec![Decoded::Rejected(Rejection::Status(status))]);
        }
        assert_eq!(Rejection::Status(5).reply_text(), "status not understood");
    }

    #[test]
    fn bad_channel_wins_over_bad_status() {
        let mut dec = decoder();
        assert_eq!(
            dec.feed(b"^99"),
            vec![Decoded::Rejected(Rejection::Channel(9))]
        );
    }

    #[test]
    fn garbage_before_frame_is_skipped() {
        let mut dec = decoder();
        assert_eq!(dec.feed(b"x\r\n7^23"), vec![update(2, 3)]);
    }

    #[test]
    fn truncated_frame_does_not_leak_into_next_frame() {
        let mut dec = decoder();
        assert!(dec.feed(b"^3").is_empty());
        assert_eq!(dec.state(), DecoderState::ExpectThird { channel: 3 });

        assert!(dec.feed(b"^").is_empty());
        assert_eq!(dec.state(), DecoderState::ExpectSecond);
        assert_eq!(dec.feed(b"14"), vec![Decoded::Rejected(Rejection::Status(4))]);
        assert_eq!(dec.feed(b"^12"), vec![update(1, 2)]);
    }

    #[test]
    fn truncated_frame_completes_when_rest_arrives() {
        let mut dec = decoder();
        assert!(dec.feed(b"^3").is_empty());
        assert_eq!(dec.feed(b"1"), vec![update(3, 1)]);
    }

    #[test]
    fn non_digit_in_frame_resynchronizes_silently() {
        let mut dec = decoder();
        assert!(dec.feed(b"^x").is_empty());
        assert_eq!(dec.state(), DecoderState::Seeking);
        assert!(dec.feed(b"^2?").is_empty());
        assert_eq!(dec.state(), DecoderState::Seeking);
        assert_eq!(dec.feed(b"^50"), vec![update(5, 0)]);
    }

    #[test]
    fn device_error_text_is_drained() {
        let mut dec = decoder();
        let out = dec.feed(b"^Ebad packet\r\n^01");
        assert_eq!(
            out,
            vec![Decoded::DeviceError("bad packet".to_string()), update(0, 1)]
        );
    }

    #[test]
    fn unterminated_device_error_is_bounded() {
        let mut dec = decoder();
        let mut wire = b"^E".to_vec();
        wire.extend(std::iter::repeat(b'a').take(MAX_DEVICE_ERROR_LEN));
        wire.extend_from_slice(b"^21");

        let out = dec.feed(&wire);
        assert_eq!(out.len(), 2);
        assert!(matches!(&out[0], Decoded::DeviceError(t) if t.len() == MAX_DEVICE_ERROR_LEN));
        assert_eq!(out[1], update(2, 1));
    }

    #[test]
    fn reset_drops_partial_frame() {
        let mut dec = decoder();
        dec.feed(b"^4");
        dec.reset();
        assert_eq!(dec.state(), DecoderState::Seeking);
        assert!(dec.feed(b"2").is_empty());
    }

    #[test]
    fn limits_reject_counts_beyond_one_digit() {
        assert!(Limits::new(0, 4).is_err());
        assert!(Limits::new(11, 4).is_err());
        assert!(Limits::new(6, 0).is_err());
        assert!(Limits::new(10, 10).is_ok());
    }

    #[test]
    fn limits_from_registry() {
        let limits = Limits::for_registry(6, &StatusRegistry::default()).unwrap();
        assert_eq!(limits.num_channels(), 6);
        assert_eq!(limits.num_statuses(), 4);
        assert_eq!(
            limits.check(StatusUpdate::new(6, 0)),
            Err(Rejection::Channel(6))
        );
        assert_eq!(limits.check(StatusUpdate::new(5, 3)), Ok(()));
    }
}
