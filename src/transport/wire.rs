//! Wire format understood by the LED controller firmware.
//!
//! One sync byte `0xFF`, then `R, G, B` for every LED in ascending index
//! order. There is no length prefix and no checksum; the firmware already
//! knows the strip length.

use crate::frame::LedFrame;

/// Leading synchronization byte.
pub const SYNC_BYTE: u8 = 0xFF;

/// Encoded size of a frame with `led_count` LEDs.
pub fn encoded_len(led_count: usize) -> usize {
    1 + 3 * led_count
}

/// Encode `frame` into `buf`, replacing its contents.
pub fn encode_into(frame: &LedFrame, buf: &mut Vec<u8>) {
    buf.clear();
    buf.reserve(encoded_len(frame.len()));
    buf.push(SYNC_BYTE);
    for color in frame.colors() {
        buf.extend_from_slice(&[color.r, color.g, color.b]);
    }
}

/// Encode `frame` into a fresh buffer.
pub fn encode(frame: &LedFrame) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len(frame.len()));
    encode_into(frame, &mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ColorSample;

    #[test]
    fn test_three_led_strip_bytes() {
        let frame = LedFrame::new(vec![
            ColorSample::new(255, 0, 0),
            ColorSample::new(0, 255, 0),
            ColorSample::new(0, 0, 255),
        ]);
        assert_eq!(
            encode(&frame),
            vec![0xFF, 255, 0, 0, 0, 255, 0, 0, 0, 255]
        );
    }

    #[test]
    fn test_encode_into_reuses_buffer() {
        let mut buf = vec![9; 32];
        encode_into(&LedFrame::new(vec![ColorSample::new(1, 2, 3)]), &mut buf);
        assert_eq!(buf, vec![SYNC_BYTE, 1, 2, 3]);
        assert_eq!(buf.len(), encoded_len(1));
    }
}
