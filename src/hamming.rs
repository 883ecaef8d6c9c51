//! Hamming 8/4 protected nibbles.
//!
//! Teletext protects packet addresses and page headers with a Hamming 8/4 code
//! where the data bits sit at bit positions 1, 3, 5 and 7. Decoding here only
//! extracts those data bits. Parity is not checked and single bit errors are not
//! corrected, so a damaged byte quietly decodes to the wrong nibble. Use
//! [is_codeword] as a separate pass if damaged packets must be detected.

/// Hamming 8/4 code words, indexed by the nibble they carry.
pub const ENCODE: [u8; 16] = [
    0x15, 0x02, 0x49, 0x5e, 0x64, 0x73, 0x38, 0x2f, 0xd0, 0xc7, 0x8c, 0x9b, 0xa1, 0xb6, 0xfd,
    0xea,
];

#[inline]
fn bit(x: u8, which: u8) -> u8 {
    (x >> which) & 1
}

/// Extract the 4 data bits of `byte`, low to high: `b1 | b3 << 1 | b5 << 2 | b7 << 3`.
#[must_use]
pub fn decode_nibble(byte: u8) -> u8 {
    bit(byte, 1) | (bit(byte, 3) << 1) | (bit(byte, 5) << 2) | (bit(byte, 7) << 3)
}

/// Decode two protected bytes into one byte, `lo` carrying the low nibble.
#[must_use]
pub fn decode_byte(lo: u8, hi: u8) -> u8 {
    decode_nibble(hi) << 4 | decode_nibble(lo)
}

/// Encode the low 4 bits of `nibble` as a Hamming 8/4 code word.
#[must_use]
pub fn encode_nibble(nibble: u8) -> u8 {
    ENCODE[(nibble & 0xf) as usize]
}

/// True if `byte` is an undamaged code word.
///
/// This is never consulted by the packet parser.
#[must_use]
pub fn is_codeword(byte: u8) -> bool {
    ENCODE.contains(&byte)
}
