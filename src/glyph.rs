//! Teletext glyph table.
//!
//! Glyph indexes 0x00-0x5F hold the G0 Latin set (code minus 0x20), 0x60-0x9F the
//! contiguous block mosaic set as Unicode sextants, and 0xA0-0xFF six national
//! option subsets of 16 glyphs each, one per language.

/// Character codes replaced by the national option subset in alphanumeric mode.
///
/// The position in this list is the offset into the language's 16 glyph row.
pub const NATIONAL_CODES: [u8; 13] = [
    0x23, 0x24, 0x40, 0x5b, 0x5c, 0x5d, 0x5e, 0x5f, 0x60, 0x7b, 0x7c, 0x7d, 0x7e,
];

/// First glyph index of the national option rows.
pub const NATIONAL_BASE: usize = 0xa0;

#[rustfmt::skip]
pub const GLYPHS: [char; 256] = [
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/',  // 0x
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?',  // 1x
    '@', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O',  // 2x
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '[', '\\', ']', '^', '_',  // 3x
    '`', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',  // 4x
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '{', '|', '}', '~', '■',  // 5x
    ' ', '🬀', '🬁', '🬂', '🬃', '🬄', '🬅', '🬆', '🬇', '🬈', '🬉', '🬊', '🬋', '🬌', '🬍', '🬎',  // 6x
    '🬏', '🬐', '🬑', '🬒', '🬓', '▌', '🬔', '🬕', '🬖', '🬗', '🬘', '🬙', '🬚', '🬛', '🬜', '🬝',  // 7x
    '🬞', '🬟', '🬠', '🬡', '🬢', '🬣', '🬤', '🬥', '🬦', '🬧', '▐', '🬨', '🬩', '🬪', '🬫', '🬬',  // 8x
    '🬭', '🬮', '🬯', '🬰', '🬱', '🬲', '🬳', '🬴', '🬵', '🬶', '🬷', '🬸', '🬹', '🬺', '🬻', '█',  // 9x
    '#', '¤', '@', '[', '\\', ']', '^', '_', '{', '|', '}', '~', ' ', ' ', ' ', ' ',  // Ax English
    '#', '$', '§', 'Ä', 'Ö', 'Ü', '^', '_', '°', 'ä', 'ö', 'ü', 'ß', ' ', ' ', ' ',  // Bx German
    '#', '¤', 'É', 'Ä', 'Ö', 'Å', 'Ü', '_', 'é', 'ä', 'ö', 'å', 'ü', ' ', ' ', ' ',  // Cx Swedish/Finnish/Hungarian
    '£', '$', 'é', '°', 'ç', '→', '↑', '#', 'ù', 'à', 'ò', 'è', 'ì', ' ', ' ', ' ',  // Dx Italian
    'é', 'ï', 'à', 'ë', 'ê', 'ù', 'î', '#', 'è', 'â', 'ô', 'û', 'ç', ' ', ' ', ' ',  // Ex French
    'ç', '$', '¡', 'á', 'é', 'í', 'ó', 'ú', '¿', 'ü', 'ñ', 'è', 'à', ' ', ' ', ' ',  // Fx Portuguese/Spanish
];

/// Look up the display character for glyph index `glyph`.
///
/// Returns `None` for indexes outside the table. Callers decide what to show
/// instead; this is not the same as a space.
#[must_use]
pub fn glyph_to_char(glyph: usize) -> Option<char> {
    GLYPHS.get(glyph).copied()
}

/// Map a 7-bit character code (0x20-0x7F) to a glyph index.
///
/// In alphanumeric mode the [NATIONAL_CODES] are redirected into the national option
/// row for `language`. Languages without a row (6 and 7) produce indexes past the end
/// of the table. In mosaic mode 0x20-0x3F and 0x60-0x7F select sextants while
/// 0x40-0x5F stay alphanumeric.
#[must_use]
pub fn select_glyph(code: u8, mosaic: bool, language: u8) -> usize {
    let code = code & 0x7f;
    let mut glyph = usize::from(code).saturating_sub(0x20);

    if mosaic {
        match code {
            0x20..=0x3f => glyph = usize::from(code) - 0x20 + 0x60,
            0x40..=0x5f => glyph = usize::from(code) - 0x20,
            0x60..=0x7f => glyph = usize::from(code) - 0x60 + 0x80,
            _ => {}
        }
    } else if let Some(pos) = NATIONAL_CODES.iter().position(|c| *c == code) {
        glyph = NATIONAL_BASE + pos + usize::from(language) * 0x10;
    }

    glyph
}
