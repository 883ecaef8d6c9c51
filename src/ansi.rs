//! ANSI SGR escapes for the 8 teletext colors.
//!
//! Teletext color indexes line up with the classic ANSI palette (0 black .. 7 white),
//! so an index maps directly onto the 30-37 / 40-47 SGR parameters.

use std::fmt::{Display, Formatter, Result};

const CSI: &str = "\x1b[";
const SGR: &str = "m";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Sgr {
    Reset,
    Foreground(u8),
    Colors { fg: u8, bg: u8 },
}

impl Display for Sgr {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match *self {
            Sgr::Reset              => write!(f, "{CSI}0{SGR}"),
            Sgr::Foreground(fg)     => write!(f, "{CSI}{}{SGR}", 30 + (fg & 7)),
            Sgr::Colors { fg, bg }  => write!(f, "{CSI}{};{}{SGR}", 30 + (fg & 7), 40 + (bg & 7)),
        }
    }
}
