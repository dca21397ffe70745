//! Message codec for the PIC calibration wire protocol.
//!
//! Frames are short sequences of ASCII characters drawn from a fixed
//! whitelist; everything else on the line is noise. Two frame shapes exist:
//!
//! ```text
//! inbound  (6 chars):  'G' d0 d1 d2 d3 csum          — temperature reading
//! outbound (N+7):      'A'×N 'H' '0' h0 h1 h2 h3 csum — set-point, N = prefix
//! ```
//!
//! The checksum is the low hex digit of the sum of the four data digits,
//! rendered uppercase. It catches single-digit corruption but not every
//! multi-digit error (two edits can collide back onto the same low digit).

use crate::error::CalibrationFault;

/// Leading character identifying a valid inbound reading frame.
pub const SENTINEL: char = 'G';
/// Single-character acknowledgement the device echoes after a good store.
pub const ACK: char = 'Y';
/// Expected inbound frame length in accepted characters.
pub const INBOUND_LEN: usize = 6;
/// Address byte used to preface outbound frames.
pub const ADDRESS_BYTE: char = 'A';

/// Map a received byte to a protocol character, or `None` for line noise.
///
/// The accepted set is digits `0-9`, `A-H`, and `Y`. Bytes outside it
/// (including non-ASCII garbage from a floating line) are dropped by the
/// channel, not surfaced as errors.
pub fn accepted_char(byte: u8) -> Option<char> {
    match byte {
        b'0'..=b'9' | b'A'..=b'H' | b'Y' => Some(byte as char),
        _ => None,
    }
}

/// Value of a single uppercase hex digit.
///
/// Pure lookup over `0-9` / `A-F`; returns `None` for the whitelist
/// characters that are not hex digits (`G`, `H`, `Y`) instead of panicking.
pub fn hex_value(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some(c as u8 - b'0'),
        'A'..='F' => Some(c as u8 - b'A' + 10),
        _ => None,
    }
}

/// Render a 0–15 value as an uppercase hex digit.
fn hex_digit(value: u8) -> char {
    debug_assert!(value < 16);
    char::from_digit(u32::from(value & 0x0F), 16)
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('0')
}

/// Checksum over a run of hex digits: low hex digit of the digit-value sum.
///
/// Returns `None` if any character is not a hex digit, so callers can
/// treat a malformed data field as a verification failure rather than a
/// panic.
pub fn checksum_char(digits: &[char]) -> Option<char> {
    let mut sum: u32 = 0;
    for &c in digits {
        sum += u32::from(hex_value(c)?);
    }
    Some(hex_digit((sum & 0x0F) as u8))
}

// ---------------------------------------------------------------------------
// Inbound reading
// ---------------------------------------------------------------------------

/// A structurally valid inbound frame: sentinel, four data digits, checksum.
///
/// "Structurally valid" means length and sentinel only — checksum and
/// digit validity are checked separately by [`verify_checksum`], matching
/// the sequencer's `AwaitInbound → Validate` split.
///
/// [`verify_checksum`]: InboundReading::verify_checksum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundReading {
    chars: [char; INBOUND_LEN],
}

impl InboundReading {
    /// The raw frame characters, in reception order.
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// The four data digits `d0..d3`.
    pub fn data_digits(&self) -> &[char] {
        &self.chars[1..5]
    }

    /// The trailing checksum character as received.
    pub fn received_checksum(&self) -> char {
        self.chars[INBOUND_LEN - 1]
    }

    /// Recompute the checksum over the data digits and compare.
    ///
    /// Pure; a data field containing a non-hex whitelist character
    /// (`G`/`H`/`Y` in a digit position) fails verification rather than
    /// erroring.
    pub fn verify_checksum(&self) -> bool {
        match checksum_char(self.data_digits()) {
            Some(expected) => expected == self.received_checksum(),
            None => false,
        }
    }

    /// Parse `d0..d3` as a big-endian 4-digit hex integer (0–65535).
    ///
    /// `None` if a data position holds a non-hex character; callers that
    /// verify the checksum first will never see that case.
    pub fn reading(&self) -> Option<u16> {
        let mut value: u16 = 0;
        for &c in self.data_digits() {
            value = (value << 4) | u16::from(hex_value(c)?);
        }
        Some(value)
    }
}

/// Decode a run of accepted characters into an [`InboundReading`].
///
/// The caller (the bounded channel) has already filtered noise; this only
/// checks shape. Fewer than six characters → [`CalibrationFault::Incomplete`];
/// wrong lead character → [`CalibrationFault::BadSentinel`].
pub fn decode_inbound(chars: &[char]) -> Result<InboundReading, CalibrationFault> {
    if chars.len() < INBOUND_LEN {
        return Err(CalibrationFault::Incomplete);
    }
    if chars[0] != SENTINEL {
        return Err(CalibrationFault::BadSentinel);
    }
    let mut frame = ['0'; INBOUND_LEN];
    frame.copy_from_slice(&chars[..INBOUND_LEN]);
    Ok(InboundReading { chars: frame })
}

// ---------------------------------------------------------------------------
// Outbound set-point
// ---------------------------------------------------------------------------

/// An encoded outbound set-point frame, ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFrame {
    chars: Vec<char>,
    prefix_len: usize,
}

impl OutboundFrame {
    /// The full frame characters, in transmission order.
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// The encoded set-point value (for the attempt log).
    pub fn set_point(&self) -> u16 {
        let digits = &self.chars[self.prefix_len + 2..self.prefix_len + 6];
        let mut value: u16 = 0;
        for &c in digits {
            value = (value << 4) | u16::from(hex_value(c).unwrap_or(0));
        }
        value
    }
}

/// Encode a set-point into an outbound frame.
///
/// The hex form is zero-padded to four digits and the checksum is computed
/// over the padded digits, so the frame length is always
/// `address_prefix_len + 7`. (Historical fixture revisions left the value
/// unpadded, which made the frame length value-dependent; the padded form
/// is the documented convention here.)
///
/// Values outside `0..=0xFFFF` — including negative model output — fail
/// with [`CalibrationFault::ValueOutOfRange`].
pub fn encode_outbound(
    set_point: i64,
    address_prefix_len: usize,
) -> Result<OutboundFrame, CalibrationFault> {
    let value = u16::try_from(set_point).map_err(|_| CalibrationFault::ValueOutOfRange)?;

    let mut chars = Vec::with_capacity(address_prefix_len + 7);
    chars.extend(std::iter::repeat(ADDRESS_BYTE).take(address_prefix_len));
    chars.push('H');
    chars.push('0');

    let digits: Vec<char> = format!("{value:04X}").chars().collect();
    chars.extend_from_slice(&digits);

    // Total over four hex digits; cannot be None.
    let csum = checksum_char(&digits).ok_or(CalibrationFault::ValueOutOfRange)?;
    chars.push(csum);

    Ok(OutboundFrame {
        chars,
        prefix_len: address_prefix_len,
    })
}
