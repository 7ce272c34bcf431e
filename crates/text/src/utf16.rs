//! UTF-16 LE plain text. No fold here: the stream is pairs of a printable
//! low byte and a NUL high byte, so the scan is its own validator and the
//! accepted length is known the moment it stops.

use carve_core::{Candidate, Family, RecognizerCtx};

use crate::check::{data_check_size, file_check_size};

/// Dispatched on a NUL at offset 1. Accepts pairs whose low byte is
/// printable ASCII, CR, LF, or 0xBB; the first bad pair fixes the size,
/// provided at least 40 clean bytes came first.
pub fn recognize_utf16_le(ctx: &mut RecognizerCtx<'_>) -> Option<Candidate> {
    let window = ctx.window;

    let mut i = 0;
    while i + 1 < window.len() {
        let low = window[i];
        let ok = window[i + 1] == 0
            && (matches!(low, 0x20..=0x7e) || low == b'\n' || low == b'\r' || low == 0xbb);

        if !ok {
            if i < 40 {
                return None;
            }
            return Some(utf16_candidate(i as u64));
        }

        i += 2;
    }

    Some(utf16_candidate(i as u64))
}

fn utf16_candidate(calculated_size: u64) -> Candidate {
    let mut candidate = Candidate::new(Family::PlainText, "utf16");
    candidate.calculated_size = calculated_size;
    candidate.data_check = Some(data_check_size);
    candidate.file_check = Some(file_check_size);
    candidate
}
