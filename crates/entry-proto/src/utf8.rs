//! UTF-8 boundaries in terminal output.
//!
//! The gateway cuts STDOUT/STDERR chunks so that no multi-byte character is
//! split across two messages. [`valid_utf8_prefix_len`] is that cut rule.

/// Maximum length of an incomplete UTF-8 sequence at the end of a chunk.
pub const MAX_INCOMPLETE_TAIL: usize = 3;

/// Length of the prefix of `data` that ends on a character boundary.
///
/// Finds the last byte that can start a character. If everything from there
/// on is valid UTF-8 the whole slice is returned, otherwise the prefix up to
/// that byte. Returns 0 when no byte can start a character.
#[must_use]
pub fn valid_utf8_prefix_len(data: &[u8]) -> usize {
    let Some(start) = data.iter().rposition(|&b| is_char_start(b)) else {
        return 0;
    };
    if std::str::from_utf8(&data[start..]).is_ok() {
        data.len()
    } else {
        start
    }
}

/// Any byte except a continuation byte (`10xxxxxx`).
const fn is_char_start(byte: u8) -> bool {
    byte & 0xC0 != 0x80
}
