use memchr::memmem;

use crate::Candidate;

/// Scan backward over the committed bytes for the last occurrence of
/// `footer` and pin the file size just past it. `extra` tolerates trailing
/// bytes after the footer. No footer at all discards the file.
pub fn search_footer(candidate: &mut Candidate, data: &[u8], footer: &[u8], extra: u64) {
    let end = (candidate.file_size as usize).min(data.len());

    match memmem::rfind(&data[..end], footer) {
        Some(pos) => candidate.file_size = (pos + footer.len()) as u64 + extra,
        None => candidate.file_size = 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Family;

    fn committed(data: &[u8]) -> Candidate {
        let mut candidate = Candidate::new(Family::FastText, "xml");
        candidate.file_size = data.len() as u64;
        candidate
    }

    #[test]
    fn test_last_occurrence_wins() {
        let data = b"<a>one</a>\n<a>two</a>\ntrailing garbage";
        let mut candidate = committed(data);
        search_footer(&mut candidate, data, b"</a>", 0);
        assert_eq!(candidate.file_size, 21);
    }

    #[test]
    fn test_missing_footer_discards() {
        let data = b"no closing tag here";
        let mut candidate = committed(data);
        search_footer(&mut candidate, data, b"</svg>", 0);
        assert_eq!(candidate.file_size, 0);
    }

    #[test]
    fn test_search_is_bounded_by_file_size() {
        let data = b"<x>body</x> <x>past the end</x>";
        let mut candidate = committed(data);
        // Only the first 12 bytes were committed.
        candidate.file_size = 12;
        search_footer(&mut candidate, data, b"</x>", 0);
        assert_eq!(candidate.file_size, 11);
    }

    #[test]
    fn test_extra_trailing_bytes() {
        let data = b"</plist>\nxx";
        let mut candidate = committed(data);
        search_footer(&mut candidate, data, b"</plist>\n", 2);
        assert_eq!(candidate.file_size, 11);
    }
}
