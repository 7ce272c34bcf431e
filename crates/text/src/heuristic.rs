//! Last-resort classification for windows with no magic at all: anything
//! starting with a text-plausible byte might be plain text, source code, a
//! mail, a csv dump... The window is folded once, then a pile of cheap
//! probes and an index-of-coincidence gate decide, and finally the carvers
//! already mid-file get a chance to veto the result.

use carve_core::{Candidate, Family, RecognizerCtx};

use crate::charset::utf8_to_latin1;
use crate::check::{data_check_text, file_check_emlx, file_check_size};
use crate::contains;
use crate::magic::{
    looks_like_java, mid_mbox, EXT_HTML, EXT_JAVA, MAGIC_RECEIVED_FROM, MAGIC_RETURN_PATH,
};

fn plain_candidate(extension: &'static str) -> Candidate {
    let mut candidate = Candidate::new(Family::PlainText, extension);
    candidate.data_check = Some(data_check_text);
    candidate.file_check = Some(file_check_size);
    candidate
}

pub fn recognize_plain_text(ctx: &mut RecognizerCtx<'_>) -> Option<Candidate> {
    let window = ctx.window;

    // Apple Mail emlx: a decimal byte count on its own line, then the
    // message headers. Must run before anything else eats the digits.
    {
        let mut declared: u64 = 0;
        let mut digits = 0;
        while digits < 10 && digits < window.len() && window[digits].is_ascii_digit() {
            declared = declared * 10 + u64::from(window[digits] - b'0');
            digits += 1;
        }
        if window.get(digits) == Some(&b'\n')
            && (window[digits + 1..].starts_with(MAGIC_RETURN_PATH)
                || window[digits + 1..].starts_with(MAGIC_RECEIVED_FROM))
            && !mid_mbox(ctx.prior)
        {
            let mut candidate = Candidate::new(Family::PlainText, "emlx");
            candidate.calculated_size = declared + digits as u64 + 1;
            candidate.file_check = Some(file_check_emlx);
            return Some(candidate);
        }
    }

    let take = window.len().min(2048);
    let lower = ctx.scratch.lower();
    let consumed = utf8_to_latin1(lower, &window[..take]);
    if consumed < 10 {
        return None;
    }
    let len = lower.len();

    // prefix refinements; the fold already lowercased everything
    if lower.starts_with(b"@echo off") || lower.starts_with(b"rem ") {
        return Some(plain_candidate("bat"));
    }
    if lower.starts_with(b"<%@ language=\"vbscript") {
        return Some(plain_candidate("asp"));
    }
    if lower.starts_with(b"version 4.00\r\nbegin") {
        return Some(plain_candidate("vb"));
    }
    if lower.starts_with(b"begin:vcard") {
        return Some(plain_candidate("vcf"));
    }

    if window.starts_with(b"#!") && len > 2 {
        // interpreter name, first line only
        let line = &lower[2..];
        let line = match memchr::memchr(b'\n', line) {
            Some(end) => &line[..end],
            None => line,
        };
        if contains(line, b"perl") {
            return Some(plain_candidate("pl"));
        }
        if contains(line, b"python") {
            return Some(plain_candidate("py"));
        }
        if contains(line, b"ruby") {
            return Some(plain_candidate("rb"));
        }
    }

    if ctx.safe_header_only {
        return None;
    }

    // never split the head of a jpeg or the body of a pdf
    if let Some(prior) = ctx.prior {
        if (prior.family == Family::Jpeg && prior.file_size < prior.min_filesize)
            || prior.family == Family::Pdf
        {
            return None;
        }
    }

    let nbrf = fortran_continuations(lower);
    let csv = is_csv(lower);
    let ind = index_of_coincidence(lower);

    let mut extension = if window[0] == b'[' && is_ini(lower) && len > 50 {
        "ini"
    } else if contains(lower, b"<?php") {
        "php"
    } else if looks_like_java(lower) {
        EXT_JAVA
    } else if nbrf > 10 && ind < 0.9 && contains(lower, b"integer") {
        "f"
    } else if csv {
        "csv"
    } else if contains(lower, b"\\begin{") {
        "tex"
    } else if contains(lower, b"#include") {
        "c"
    } else if contains(lower, b"[autorun]") {
        "inf"
    } else if contains(lower, b"<%@") || contains(lower, b"<%=") {
        "jsp"
    } else if contains(lower, b"<% ") {
        "asp"
    } else if contains(lower, b"<html") {
        EXT_HTML
    } else if contains(lower, b"\\score {") {
        "ly"
    } else if contains(lower, b"/*") && len > 50 {
        "h"
    } else if len < 100 || ind < 0.03 || ind > 0.90 {
        // entropy extremes are not text
        return None;
    } else if lower.starts_with(b"{\"") {
        "json"
    } else {
        "txt"
    };

    if extension == "txt" && (contains(lower, b"<br>") || contains(lower, b"<p>")) {
        extension = EXT_HTML;
    }

    if let Some(prior) = ctx.prior {
        // a second html head right after a plain-text one is the same file
        if extension == EXT_HTML && prior.family == Family::PlainText {
            return None;
        }

        if prior.family == Family::Doc && prior.filename.contains(".doc") {
            // Word stores text with bare \r; real text next to it must look
            // flat and line-broken
            if ind > 0.20 {
                return None;
            }
            for pair in lower.windows(2) {
                if pair[0] == b'\r' && pair[1] != b'\n' {
                    return None;
                }
            }
            if !lower[..len.min(512)].contains(&b'\n') {
                return None;
            }
            return Some(plain_candidate(extension));
        }

        let head = &lower[..len.min(511)];
        let raw = &window[..take];
        let accept = (extension == EXT_HTML
            && contains(head, b"<html")
            && prior.filename.contains(".html"))
            || (prior.family == Family::Jpeg
                && !contains(raw, b"8BIM")
                && !contains(raw, b"adobe")
                && !contains(raw, b"exif:")
                && !contains(raw, b"<rdf:")
                && !contains(raw, b"<?xpacket")
                && !contains(raw, b"<dict>"))
            || (prior.family == Family::Zip
                && !contains(raw, b"PK\x03\x04")
                && !prior.filename.contains(".sh3d"));

        if accept {
            return Some(plain_candidate(extension));
        }
        return None;
    }

    Some(plain_candidate(extension))
}

/// `[section]` with only alphanumerics or spaces inside, and a reasonably
/// long name.
fn is_ini(lower: &[u8]) -> bool {
    if lower.first() != Some(&b'[') {
        return false;
    }
    for (i, &byte) in lower.iter().enumerate().skip(1) {
        if byte == b']' {
            return i > 3;
        }
        if !byte.is_ascii_alphanumeric() && byte != b' ' {
            return false;
        }
    }
    false
}

/// Count of newline-plus-six-spaces runs, the fixed-form Fortran
/// continuation column.
fn fortran_continuations(lower: &[u8]) -> u32 {
    let finder = memchr::memmem::Finder::new(b"\n      ");
    let mut count = 0;
    let mut at = 0;
    while let Some(pos) = finder.find(&lower[at..]) {
        count += 1;
        at += pos + 1;
    }
    count
}

/// Every newline-terminated line carries the same positive number of
/// semicolons, and there are enough lines to trust the pattern.
fn is_csv(lower: &[u8]) -> bool {
    let mut per_line = 0u32;
    let mut first_line = 0u32;
    let mut lines = 0u32;

    for &byte in lower {
        if byte == b';' {
            per_line += 1;
        } else if byte == b'\n' {
            if lines == 0 {
                first_line = per_line;
            }
            if per_line != first_line {
                return false;
            }
            lines += 1;
            per_line = 0;
        }
    }

    first_line >= 1 && lines >= 10
}

/// Sum of n(n-1) over the byte histogram, normalized; near 0 means random
/// bytes, near 1 a constant run.
fn index_of_coincidence(lower: &[u8]) -> f64 {
    let mut stats = [0u32; 256];
    for &byte in lower {
        stats[byte as usize] += 1;
    }

    let len = lower.len() as f64;
    let sum: f64 = stats
        .iter()
        .map(|&n| f64::from(n) * (f64::from(n) - 1.0))
        .sum();

    sum / len / (len - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use carve_core::Scratch;

    fn recognize(window: &[u8], prior: Option<&Candidate>) -> Option<Candidate> {
        recognize_with(window, false, prior)
    }

    fn recognize_with(
        window: &[u8],
        safe_header_only: bool,
        prior: Option<&Candidate>,
    ) -> Option<Candidate> {
        let mut scratch = Scratch::new();
        let mut ctx = RecognizerCtx {
            window,
            safe_header_only,
            prior,
            scratch: &mut scratch,
        };
        recognize_plain_text(&mut ctx)
    }

    fn prose(len: usize) -> Vec<u8> {
        b"the quick brown fox jumps over the lazy dog.\n"
            .iter()
            .copied()
            .cycle()
            .take(len)
            .collect()
    }

    #[test]
    fn test_emlx_declared_length() {
        let found = recognize(b"123\nReturn-Path: <x@y>\nSubject: hi\n", None).unwrap();
        assert_eq!(found.extension, "emlx");
        assert_eq!(found.calculated_size, 127);
        assert!(found.data_check.is_none());

        let found = recognize(b"8842\nReceived: from mail.example.com\n", None).unwrap();
        assert_eq!(found.extension, "emlx");
        assert_eq!(found.calculated_size, 8842 + 4 + 1);

        // suppressed while an mbox is being recovered
        let mut mbox = Candidate::new(Family::FastText, "mbox");
        mbox.filename = "f001.mbox".into();
        assert!(recognize(b"123\nReturn-Path: <x@y>\n", Some(&mbox)).is_none());
    }

    #[test]
    fn test_short_fold_rejected() {
        // nine clean bytes, then binary
        assert!(recognize(b"ninechars\x00\x01\x02", None).is_none());
    }

    #[test]
    fn test_batch_and_vcard_prefixes() {
        let mut window = b"@echo off\r\nset PATH=C:\\bin\r\n".to_vec();
        window.extend_from_slice(&prose(100));
        assert_eq!(recognize(&window, None).unwrap().extension, "bat");

        assert_eq!(
            recognize(b"REM first comment line here\r\n", None).unwrap().extension,
            "bat"
        );
        assert_eq!(
            recognize(b"BEGIN:VCARD\r\nFN:Alice\r\nEND:VCARD\r\n", None)
                .unwrap()
                .extension,
            "vcf"
        );
        assert_eq!(
            recognize(b"<%@ LANGUAGE=\"VBSCRIPT\" %>\r\n<html>", None)
                .unwrap()
                .extension,
            "asp"
        );
        assert_eq!(
            recognize(b"VERSION 4.00\r\nBegin VB.Form frmMain\r\n", None)
                .unwrap()
                .extension,
            "vb"
        );
    }

    #[test]
    fn test_shebang_interpreters() {
        let found = recognize(b"#!/usr/bin/env python3\nimport os\n", None).unwrap();
        assert_eq!(found.extension, "py");

        let found = recognize(b"#!/usr/bin/perl -w\nuse strict;\n", None).unwrap();
        assert_eq!(found.extension, "pl");

        let found = recognize(b"#!/usr/bin/ruby\nputs 'hi'\n", None).unwrap();
        assert_eq!(found.extension, "rb");

        // the token has to sit on the shebang line itself
        let mut window = b"#!/bin/foo\n".to_vec();
        window.extend_from_slice(&prose(200));
        window.extend_from_slice(b"python\n");
        let found = recognize(&window, None).unwrap();
        assert_eq!(found.extension, "txt");
    }

    #[test]
    fn test_safe_header_mode_skips_statistics() {
        let window = prose(400);
        assert!(recognize_with(&window, true, None).is_none());
        // shebangs are still cheap enough
        let found = recognize_with(b"#!/usr/bin/env python3\nimport os\n", true, None);
        assert_eq!(found.unwrap().extension, "py");
    }

    #[test]
    fn test_ini_detection() {
        let mut window = b"[settings]\nkey=value\nanother=1\n".to_vec();
        window.extend_from_slice(&prose(60));
        let found = recognize(&window, None).unwrap();
        assert_eq!(found.extension, "ini");

        // section chars must stay alphanumeric
        let mut window = b"[se{tt}ings]\nkey=value\n".to_vec();
        window.extend_from_slice(&prose(200));
        let found = recognize(&window, None).unwrap();
        assert_ne!(found.extension, "ini");
    }

    #[test]
    fn test_is_ini_needs_long_section() {
        assert!(is_ini(b"[settings]"));
        assert!(is_ini(b"[set 1]"));
        assert!(!is_ini(b"[ab]"));
        assert!(!is_ini(b"settings]"));
        assert!(!is_ini(b"[set-tings]"));
        assert!(!is_ini(b"[no closing bracket"));
    }

    #[test]
    fn test_source_code_probes() {
        let mut window = b"<?php\necho 'hi';\n".to_vec();
        window.extend_from_slice(&prose(100));
        assert_eq!(recognize(&window, None).unwrap().extension, "php");

        let window = b"#include <stdio.h>\nint main(void) { return 0; }\n";
        assert_eq!(recognize(window, None).unwrap().extension, "c");

        let window = b"\\documentclass{article}\n\\begin{document}\nhello\n";
        // `class` wins before the TeX probe, exactly as the arm order says
        assert_eq!(recognize(window, None).unwrap().extension, "java");

        let window = b"\\begin{document}\nplain latex without the keyword\n";
        assert_eq!(recognize(window, None).unwrap().extension, "tex");

        let window = b"[autorun]\nopen=setup.exe\nicon=setup.exe,0\n";
        assert_eq!(recognize(window, None).unwrap().extension, "inf");

        let window = b"<%@ page import=\"java.util.*\" %>\n<html>\n";
        assert_eq!(recognize(window, None).unwrap().extension, "jsp");

        let mut window = b"/* host interface */\n#define MAX 4\n".to_vec();
        window.extend_from_slice(&prose(60));
        assert_eq!(recognize(&window, None).unwrap().extension, "h");
    }

    #[test]
    fn test_fortran_needs_continuations_and_keyword() {
        let mut window = Vec::new();
        window.extend_from_slice(b"      program demo\n");
        window.extend_from_slice(b"      integer :: i\n");
        for _ in 0..12 {
            window.extend_from_slice(b"      i = i + 1\n");
        }
        let found = recognize(&window, None).unwrap();
        assert_eq!(found.extension, "f");
    }

    #[test]
    fn test_csv_same_separator_count() {
        let mut window = Vec::new();
        for i in 0..12 {
            window.extend_from_slice(format!("row{i};alpha;beta\n").as_bytes());
        }
        assert_eq!(recognize(&window, None).unwrap().extension, "csv");

        assert!(is_csv(b"a;b\nc;d\ne;f\ng;h\ni;j\nk;l\nm;n\no;p\nq;r\ns;t\n"));
        // ragged separator counts
        assert!(!is_csv(b"a;b\nc;;d\ne;f\ng;h\ni;j\nk;l\nm;n\no;p\nq;r\ns;t\n"));
        // too few lines
        assert!(!is_csv(b"a;b\nc;d\n"));
        // no separators at all
        assert!(!is_csv(b"a\nb\nc\nd\ne\nf\ng\nh\ni\nj\nk\n"));
    }

    #[test]
    fn test_entropy_gates() {
        // short and featureless
        assert!(recognize(&prose(60), None).is_none());
        // constant run: index of coincidence ~ 1
        assert!(recognize(&[b'a'; 400], None).is_none());
        // ordinary prose passes
        let found = recognize(&prose(400), None).unwrap();
        assert_eq!(found.extension, "txt");
    }

    #[test]
    fn test_json_and_html_promotion() {
        let mut window = b"{\"key\": \"value\", \"items\": [1, 2, 3], ".to_vec();
        window.extend_from_slice(&prose(150));
        assert_eq!(recognize(&window, None).unwrap().extension, "json");

        let mut window = prose(200);
        window.extend_from_slice(b"line<br>break<p>paragraph\n");
        assert_eq!(recognize(&window, None).unwrap().extension, "html");
    }

    #[test]
    fn test_prior_doc_requires_flat_text() {
        let mut doc = Candidate::new(Family::Doc, "doc");
        doc.filename = "f0001.doc".into();

        let window = prose(400);
        let found = recognize(&window, Some(&doc)).unwrap();
        assert_eq!(found.extension, "txt");

        // a bare \r betrays Word's own text storage
        let mut window = prose(400);
        window[100] = b'\r';
        assert!(recognize(&window, Some(&doc)).is_none());

        // no newline in the head at all
        let window: Vec<u8> = b"the quick brown fox jumps over the lazy dog "
            .iter()
            .copied()
            .cycle()
            .take(400)
            .collect();
        assert!(recognize(&window, Some(&doc)).is_none());
    }

    #[test]
    fn test_prior_jpeg_and_pdf_gates() {
        let mut jpg = Candidate::new(Family::Jpeg, "jpg");
        jpg.min_filesize = 4096;
        jpg.file_size = 512;
        // a jpeg below its minimum size keeps its bytes
        assert!(recognize(&prose(400), Some(&jpg)).is_none());

        jpg.file_size = 8192;
        // past the minimum, unrelated text cuts the jpeg
        assert!(recognize(&prose(400), Some(&jpg)).is_some());

        // photoshop metadata stays inside the jpeg
        let mut tagged = prose(400);
        tagged[0..4].copy_from_slice(b"8BIM");
        assert!(recognize(&tagged, Some(&jpg)).is_none());

        let pdf = Candidate::new(Family::Pdf, "pdf");
        assert!(recognize(&prose(400), Some(&pdf)).is_none());
    }

    #[test]
    fn test_prior_zip_gates() {
        let mut zip = Candidate::new(Family::Zip, "zip");
        zip.filename = "f0002.zip".into();

        // compressed data cannot fold into text, so reaching here means
        // the zip ended; accept
        assert!(recognize(&prose(400), Some(&zip)).is_some());

        // a local-file header in the window means the zip continues
        let mut window = prose(400);
        window[150..154].copy_from_slice(b"PK\x03\x04");
        assert!(recognize(&window, Some(&zip)).is_none());

        // SweetHome3D archives legitimately contain text members
        zip.filename = "f0002.sh3d".into();
        assert!(recognize(&prose(400), Some(&zip)).is_none());
    }

    #[test]
    fn test_prior_html_rules() {
        let mut window = prose(300);
        window.extend_from_slice(b"<html><body>hello</body>\n");

        // over a plain-text recovery a new html head is the same file
        let txt = plain_candidate("txt");
        assert!(recognize(&window, Some(&txt)).is_none());

        // over a fast-text html recovery, a fresh <html marks a new file
        let mut html = Candidate::new(Family::FastText, "html");
        html.filename = "f0003.html".into();
        let mut window = b"<html><head><title>t</title>\n".to_vec();
        window.extend_from_slice(&prose(300));
        assert_eq!(recognize(&window, Some(&html)).unwrap().extension, "html");

        // but not when the running file is named something else
        html.filename = "f0003.xml".into();
        assert!(recognize(&window, Some(&html)).is_none());
    }
}
