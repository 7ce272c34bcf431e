// https://www.cgsecurity.org/wiki/File_Formats_Recovered_By_PhotoRec
// https://en.wikipedia.org/wiki/List_of_file_signatures

//! Text-format recognition for a file carver.
//!
//! Two classifiers cover the text world: one driven by a catalog of
//! registered magics, and a heuristic one subscribed to every byte a text
//! file could start with. Both produce candidate records whose data and
//! file checks then track the stream until the file ends.

use carve_core::{RegistryBuilder, Result};

mod charset;
mod check;
mod heuristic;
mod magic;
#[cfg(feature = "utf16")]
mod utf16;

pub use charset::{is_text_byte, utf8_to_latin1};
pub use check::{
    data_check_size, data_check_text, data_check_ttd, file_check_emlx, file_check_ers,
    file_check_size, file_check_smil, file_check_svg, file_check_xml,
};
pub use heuristic::recognize_plain_text;
pub use magic::recognize_fast_text;
#[cfg(feature = "utf16")]
pub use utf16::recognize_utf16_le;

/// Case-sensitive substring probe; callers wanting case-insensitivity
/// search folded buffers.
pub(crate) fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    memchr::memmem::find(haystack, needle).is_some()
}

/// Subscribe the magic-driven classifier to every entry of its catalog.
pub fn register_fast_text(builder: &mut RegistryBuilder) -> Result<()> {
    for &(offset, magic) in magic::CATALOG {
        builder.register(offset, magic, recognize_fast_text)?;
    }

    Ok(())
}

/// Subscribe the heuristic classifier to every byte a text file could
/// start with, plus the UTF-8 lead bytes the fold knows how to collapse.
pub fn register_plain_text(builder: &mut RegistryBuilder) -> Result<()> {
    for byte in 0..=255u8 {
        if is_text_byte(byte) || matches!(byte, 0xc2 | 0xc3 | 0xc5 | 0xc6 | 0xcb | 0xe2) {
            builder.register(0, &[byte], recognize_plain_text)?;
        }
    }

    // UTF-16 LE text keys on the NUL high byte of its first character
    #[cfg(feature = "utf16")]
    builder.register(1, &[0x00], recognize_utf16_le)?;

    Ok(())
}
