//! Incremental validators and finalizers shared by every text candidate.
//!
//! Data checks see windows whose second half is new data; they either
//! extend `calculated_size` and ask for more, or pin the end of the file.
//! File checks run once, against the committed bytes.

use carve_core::{search_footer, Candidate, DataCheckOutcome, NewlineStyle};
use memchr::memmem;

use crate::charset::utf8_to_latin1;

const HTML_FOOTER: &[u8] = b"</html>";

/// Accept the new half of the window as long as it folds cleanly. A fold
/// that stops early pins the end of the file; for a file already named
/// `.html`, a closing tag just before the stop truncates to the tag.
pub fn data_check_text(window: &[u8], candidate: &mut Candidate) -> DataCheckOutcome {
    let half = window.len() / 2;
    let mut lower = Vec::with_capacity(half + 16);
    let consumed = utf8_to_latin1(&mut lower, &window[half..2 * half]);

    if consumed < half {
        let html_cut = if candidate.filename.contains(".html") {
            memmem::find(&lower, HTML_FOOTER)
                .filter(|&pos| consumed < pos + HTML_FOOTER.len() + 10)
        } else {
            None
        };

        if let Some(pos) = html_cut {
            candidate.calculated_size += (pos + HTML_FOOTER.len()) as u64;
        } else if consumed >= 10 {
            candidate.calculated_size = candidate.file_size + consumed as u64;
        }

        return DataCheckOutcome::Stop;
    }

    candidate.calculated_size = candidate.file_size + half as u64;

    DataCheckOutcome::Continue
}

/// TTD dumps are hex digit pairs; the first byte outside `[0-9A-F \n]`
/// ends the file.
pub fn data_check_ttd(window: &[u8], candidate: &mut Candidate) -> DataCheckOutcome {
    let half = window.len() / 2;

    for (i, &byte) in window.iter().enumerate().skip(half) {
        match byte {
            b'0'..=b'9' | b'A'..=b'F' | b' ' | b'\n' => {}
            _ => {
                candidate.calculated_size = candidate.file_size + (i - half) as u64;
                return DataCheckOutcome::Stop;
            }
        }
    }

    candidate.calculated_size = candidate.file_size + half as u64;

    DataCheckOutcome::Continue
}

/// For candidates whose size was fixed at recognition; stops once the
/// driver has committed enough bytes.
pub fn data_check_size(window: &[u8], candidate: &mut Candidate) -> DataCheckOutcome {
    if candidate.file_size + (window.len() / 2) as u64 >= candidate.calculated_size {
        DataCheckOutcome::Stop
    } else {
        DataCheckOutcome::Continue
    }
}

/// Default finalization: the file is exactly the accepted bytes, or nothing
/// if fewer than that were committed.
pub fn file_check_size(_data: &[u8], candidate: &mut Candidate) {
    if candidate.file_size < candidate.calculated_size {
        candidate.file_size = 0;
    } else {
        candidate.file_size = candidate.calculated_size;
    }
}

pub fn file_check_xml(data: &[u8], candidate: &mut Candidate) {
    search_footer(candidate, data, b">", 0);
    allow_all_newlines(candidate);
}

pub fn file_check_svg(data: &[u8], candidate: &mut Candidate) {
    search_footer(candidate, data, b"</svg>", 0);
    allow_all_newlines(candidate);
}

pub fn file_check_smil(data: &[u8], candidate: &mut Candidate) {
    search_footer(candidate, data, b"</smil>", 0);
    allow_all_newlines(candidate);
}

pub fn file_check_ers(data: &[u8], candidate: &mut Candidate) {
    search_footer(candidate, data, b"DatasetHeader End", 0);
    allow_all_newlines(candidate);
}

/// EMLX finalization: the message body length was declared up front, the
/// plist footer follows within 2 KiB of it.
pub fn file_check_emlx(data: &[u8], candidate: &mut Candidate) {
    if candidate.file_size < candidate.calculated_size {
        candidate.file_size = 0;
        return;
    }

    if candidate.file_size > candidate.calculated_size + 2048 {
        candidate.file_size = candidate.calculated_size + 2048;
    }

    search_footer(candidate, data, b"</plist>\n", 0);
}

fn allow_all_newlines(candidate: &mut Candidate) {
    candidate
        .allow_newline_styles(NewlineStyle::BARE_NL | NewlineStyle::CRLF | NewlineStyle::BARE_CR);
}
