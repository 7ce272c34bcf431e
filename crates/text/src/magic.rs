//! Magic catalog and the header classifier for text formats that carry one.
//!
//! One recognizer serves every registered magic: whichever magic woke it
//! up, the window is walked through the full arm chain, so magics that are
//! prefixes of one another resolve by arm order, and a couple of arms get
//! to probe the whole window rather than just its start.

use carve_core::{Candidate, Family, RecognizerCtx};
use memchr::{memchr, memmem};
use time::{Date, Month, PrimitiveDateTime, Time};

use crate::charset::utf8_to_latin1;
use crate::check::{
    data_check_text, data_check_ttd, file_check_ers, file_check_size, file_check_smil,
    file_check_svg, file_check_xml,
};
use crate::contains;

pub(crate) const MAGIC_ADR: &[u8] = b"Opera Hotlist version 2.0";
pub(crate) const MAGIC_BASH: &[u8] = b"#!/bin/bash";
pub(crate) const MAGIC_CLS: &[u8] = b"VERSION 1.0 CLASS\r\nBEGIN";
pub(crate) const MAGIC_CUE1: &[u8] = b"REM GENRE ";
pub(crate) const MAGIC_CUE2: &[u8] = b"FILE \"";
pub(crate) const MAGIC_DC: &[u8] = b"SC V10";
pub(crate) const MAGIC_DIF: &[u8] = b"TABLE\r\n0,1\r\n";
pub(crate) const MAGIC_EMKA: &[u8] = b"1\t\t\t\t\tthis file\t";
pub(crate) const MAGIC_ERS: &[u8] = b"DatasetHeader Begin";
pub(crate) const MAGIC_HDR: &[u8] = b"ENVI\r\ndescription";
pub(crate) const MAGIC_HTML: &[u8] = b"<!DOCTYPE HTML";
pub(crate) const MAGIC_ICS: &[u8] = b"BEGIN:VCALENDAR";
pub(crate) const MAGIC_IMM: &[u8] = b"MIME-Version:";
pub(crate) const MAGIC_JAD: &[u8] = b"MIDlet-1:";
pub(crate) const MAGIC_JSON: &[u8] = b"{\"title\":\"\",\"id\":1,\"dateAdded\":";
pub(crate) const MAGIC_KSH: &[u8] = b"#!/bin/ksh";
pub(crate) const MAGIC_LY: &[u8] = b"\n\\version \"";
pub(crate) const MAGIC_LYX: &[u8] = b"#LyX 1.";
pub(crate) const MAGIC_M3U: &[u8] = b"#EXTM3U";
pub(crate) const MAGIC_MAIL: &[u8] = b"From MAILER-DAEMON ";
pub(crate) const MAGIC_MAIL2: &[u8] = b"From ";
pub(crate) const MAGIC_MDL: &[u8] = b"Model {";
pub(crate) const MAGIC_MNEMOSYNE: &[u8] = b"--- Mnemosyne Data Base --- Format Version 2 ---";
pub(crate) const MAGIC_MSF: &[u8] = b"// <!-- <mdb:mork:z";
pub(crate) const MAGIC_MYSQL: &[u8] = b"-- MySQL dump ";
pub(crate) const MAGIC_PERLM: &[u8] = b"package";
pub(crate) const MAGIC_PHPMYADMIN: &[u8] = b"-- phpMyAdmin SQL Dump";
pub(crate) const MAGIC_POSTGRESQL: &[u8] = b"--\n-- PostgreSQL database cluster dump";
pub(crate) const MAGIC_POSTGRESQL_WIN: &[u8] = b"--\r\n-- PostgreSQL database cluster dump";
pub(crate) const MAGIC_QGIS: &[u8] = b"<!DOCTYPE qgis ";
pub(crate) const MAGIC_RAM: &[u8] = b"rtsp://";
pub(crate) const MAGIC_RECEIVED_FROM: &[u8] = b"Received: from";
pub(crate) const MAGIC_REG: &[u8] = b"REGEDIT4";
pub(crate) const MAGIC_RETURN_PATH: &[u8] = b"Return-Path: ";
pub(crate) const MAGIC_RPP: &[u8] = b"<REAPER_PROJECT ";
pub(crate) const MAGIC_RTF: &[u8] = b"{\\rtf";
pub(crate) const MAGIC_SEENEZ: &[u8] = b"#SeeNez ";
pub(crate) const MAGIC_SESSIONSTORE: &[u8] = b"({\"windows\":[{\"tabs\":[{\"entries\":[{\"url\":\"";
pub(crate) const MAGIC_SH: &[u8] = b"#!/bin/sh";
pub(crate) const MAGIC_SLK: &[u8] = b"ID;PSCALC3";
pub(crate) const MAGIC_SMIL: &[u8] = b"<smil>";
pub(crate) const MAGIC_SNZ_UNIX: &[u8] = b"DEFAULT\n";
pub(crate) const MAGIC_SNZ_WIN: &[u8] = b"DEFAULT\r\n";
pub(crate) const MAGIC_STL: &[u8] = b"solid ";
pub(crate) const MAGIC_STP: &[u8] = b"ISO-10303-21;";
pub(crate) const MAGIC_TTD: &[u8] = b"FF 09 FF FF FF FF FF FF FF FF FF FF FF FF FF FF FFFF 00";
pub(crate) const MAGIC_URL: &[u8] = b"[InternetShortcut]";
pub(crate) const MAGIC_WPL: &[u8] = b"<?wpl version=\"1.0\"?>";
pub(crate) const MAGIC_XML: &[u8] = b"<?xml version=";
pub(crate) const MAGIC_XML_UTF8: &[u8] = b"\xEF\xBB\xBF<?xml version=";
pub(crate) const MAGIC_XMP: &[u8] = b"<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"";
pub(crate) const MAGIC_VBOOKMARK: &[u8] = b"BEGIN:VBKM";

/// Every subscription the fast-text recognizer wants, in catalog order.
/// The TSCe Survey Controller magic sits at offset 4.
pub(crate) const CATALOG: &[(usize, &[u8])] = &[
    (0, MAGIC_ADR),
    (0, MAGIC_BASH),
    (0, MAGIC_CLS),
    (0, MAGIC_CUE1),
    (0, MAGIC_CUE2),
    (4, MAGIC_DC),
    (0, MAGIC_DIF),
    (0, MAGIC_EMKA),
    (0, MAGIC_ERS),
    (0, MAGIC_HDR),
    (0, MAGIC_HTML),
    (0, MAGIC_ICS),
    (0, MAGIC_IMM),
    (0, MAGIC_JAD),
    (0, MAGIC_JSON),
    (0, MAGIC_KSH),
    (0, MAGIC_LY),
    (0, MAGIC_LYX),
    (0, MAGIC_M3U),
    (0, MAGIC_MAIL),
    (0, MAGIC_MAIL2),
    (0, MAGIC_MDL),
    (0, MAGIC_MNEMOSYNE),
    (0, MAGIC_MSF),
    (0, MAGIC_MYSQL),
    (0, MAGIC_PERLM),
    (0, MAGIC_PHPMYADMIN),
    (0, MAGIC_POSTGRESQL),
    (0, MAGIC_POSTGRESQL_WIN),
    (0, MAGIC_QGIS),
    (0, MAGIC_RAM),
    (0, MAGIC_REG),
    (0, MAGIC_RETURN_PATH),
    (0, MAGIC_RPP),
    (0, MAGIC_RTF),
    (0, MAGIC_SEENEZ),
    (0, MAGIC_SESSIONSTORE),
    (0, MAGIC_SH),
    (0, MAGIC_SLK),
    (0, MAGIC_SMIL),
    (0, MAGIC_SNZ_UNIX),
    (0, MAGIC_SNZ_WIN),
    (0, MAGIC_STL),
    (0, MAGIC_STP),
    (0, MAGIC_TTD),
    (0, MAGIC_URL),
    (0, MAGIC_WPL),
    (0, MAGIC_XML),
    (0, MAGIC_XML_UTF8),
    (0, MAGIC_XMP),
    (0, MAGIC_VBOOKMARK),
];

pub(crate) const SIGN_JAVA: [&[u8]; 3] = [b"class", b"private static", b"public interface"];

pub(crate) const EXT_HTML: &str = if cfg!(feature = "short-ext") { "htm" } else { "html" };
pub(crate) const EXT_JAVA: &str = if cfg!(feature = "short-ext") { "jav" } else { "java" };
const EXT_PLIST: &str = if cfg!(feature = "short-ext") { "pli" } else { "plist" };
const EXT_EMKA: &str = if cfg!(feature = "short-ext") { "emk" } else { "emka" };
const EXT_SESSIONSTORE: &str = if cfg!(feature = "short-ext") {
    "js"
} else {
    "sessionstore.js"
};

/// Candidate with the plain text data check and size finalizer, the shape
/// nearly every arm below wants.
fn text_candidate(extension: &'static str) -> Candidate {
    let mut candidate = Candidate::new(Family::FastText, extension);
    candidate.data_check = Some(data_check_text);
    candidate.file_check = Some(file_check_size);
    candidate
}

/// Mailboxes grow until another carver claims the stream; no data check.
fn mbox_candidate() -> Candidate {
    Candidate::new(Family::FastText, "mbox")
}

/// True while the recovery in progress is already an mbox; matching mail
/// headers mid-mailbox would endlessly reseed it.
pub(crate) fn mid_mbox(prior: Option<&Candidate>) -> bool {
    prior.map_or(false, |p| p.family == Family::FastText && p.extension == "mbox")
}

pub(crate) fn looks_like_java(lower: &[u8]) -> bool {
    SIGN_JAVA.iter().any(|sign| contains(lower, sign))
}

pub fn recognize_fast_text(ctx: &mut RecognizerCtx<'_>) -> Option<Candidate> {
    const SPACES: &[u8] = &[b' '; 16];
    let window = ctx.window;

    if window.starts_with(MAGIC_CLS) {
        return Some(text_candidate("cls"));
    }
    if window.starts_with(MAGIC_HTML) {
        return Some(text_candidate(EXT_HTML));
    }
    if window.starts_with(MAGIC_JSON) {
        return Some(text_candidate("json"));
    }
    if window.starts_with(MAGIC_IMM)
        || window.starts_with(MAGIC_MAIL)
        || window.starts_with(MAGIC_RETURN_PATH)
    {
        if mid_mbox(ctx.prior) {
            return None;
        }
        return Some(mbox_candidate());
    }
    if window.starts_with(MAGIC_MAIL2) {
        // From someone@somewhere
        let mut i = MAGIC_MAIL2.len();
        while i < 200 && i < window.len() && window[i] != b' ' && window[i] != b'@' {
            i += 1;
        }
        if window.get(i) != Some(&b'@') {
            return None;
        }
        if mid_mbox(ctx.prior) {
            return None;
        }
        return Some(mbox_candidate());
    }
    if window.starts_with(MAGIC_MDL) {
        // Matlab model
        let mut candidate = Candidate::new(Family::FastText, "mdl");
        candidate.data_check = Some(data_check_text);
        return Some(candidate);
    }
    if window.starts_with(MAGIC_PERLM)
        && matches!(window.get(MAGIC_PERLM.len()), Some(&b' ') | Some(&b'\t'))
    {
        // `package` opens both Perl modules and Java sources
        let take = window.len().min(2048 - 16);
        let lower = ctx.scratch.lower();
        utf8_to_latin1(lower, &window[..take]);
        let extension = if looks_like_java(lower) { EXT_JAVA } else { "pm" };
        return Some(text_candidate(extension));
    }
    if window.starts_with(MAGIC_RPP) {
        return Some(text_candidate("rpp"));
    }
    if window.starts_with(MAGIC_RTF)
        && ctx
            .prior
            .map_or(false, |p| p.family != Family::Doc && p.filename.contains(".snt"))
    {
        // Sticky-note containers hold bare rtf; anywhere else the rtf
        // belongs to the carver already running
        return Some(text_candidate("rtf"));
    }
    if window.starts_with(MAGIC_REG) {
        return Some(text_candidate("reg"));
    }
    if window.starts_with(MAGIC_SESSIONSTORE) {
        return Some(text_candidate(EXT_SESSIONSTORE));
    }
    if window.starts_with(MAGIC_SH)
        || window.starts_with(MAGIC_BASH)
        || window.starts_with(MAGIC_KSH)
    {
        return Some(text_candidate("sh"));
    }
    if window.starts_with(MAGIC_SLK) {
        return Some(text_candidate("slk"));
    }
    if window.starts_with(MAGIC_SEENEZ) {
        return Some(text_candidate("SeeNezSST"));
    }
    if window.starts_with(MAGIC_SNZ_UNIX) || window.starts_with(MAGIC_SNZ_WIN) {
        return Some(text_candidate("snz"));
    }
    if window.starts_with(MAGIC_MYSQL)
        || window.starts_with(MAGIC_PHPMYADMIN)
        || window.starts_with(MAGIC_POSTGRESQL)
        || window.starts_with(MAGIC_POSTGRESQL_WIN)
    {
        return Some(text_candidate("sql"));
    }
    if window.starts_with(MAGIC_STL)
        && window.get(0x40..0x50).map_or(true, |bytes| bytes != SPACES)
    {
        // All-space padding at 0x40 means a binary STL wearing the ascii
        // prologue
        return Some(text_candidate("stl"));
    }
    if window.starts_with(MAGIC_ERS) {
        // ER Mapper raster header
        let mut candidate = text_candidate("ers");
        candidate.file_check = Some(file_check_ers);
        return Some(candidate);
    }
    if window.starts_with(MAGIC_HDR) {
        return Some(text_candidate("hdr"));
    }
    if window.starts_with(MAGIC_EMKA) {
        return Some(text_candidate(EXT_EMKA));
    }
    if contains(window, MAGIC_QGIS) {
        // QGIS project files hide the doctype after the xml declaration
        return Some(text_candidate("qgs"));
    }
    if window.starts_with(MAGIC_STP) {
        // ISO-10303 product data exchange
        return Some(text_candidate("stp"));
    }
    if window.starts_with(MAGIC_TTD) {
        let mut candidate = text_candidate("ttd");
        candidate.data_check = Some(data_check_ttd);
        return Some(candidate);
    }
    if window.starts_with(MAGIC_URL) {
        return Some(text_candidate("url"));
    }
    if window.starts_with(MAGIC_WPL) {
        return Some(text_candidate("wpl"));
    }
    if window.starts_with(MAGIC_RAM) {
        return Some(text_candidate("ram"));
    }
    if window.starts_with(MAGIC_XML) || window.starts_with(MAGIC_XML_UTF8) {
        let mut candidate = Candidate::new(Family::FastText, "xml");
        candidate.data_check = Some(data_check_text);
        if contains(window, b"Version_grisbi") {
            // Grisbi personal finance data
            candidate.extension = "gsb";
        } else if contains(window, b"QBFSD") {
            candidate.extension = "fst";
        } else if contains(window, b"<collection type=\"GC") {
            // GCstar collection manager
            candidate.extension = "gcs";
        } else if contains(window, b"<html") {
            candidate.extension = EXT_HTML;
        } else if contains(window, b"<svg") {
            candidate.extension = "svg";
            candidate.file_check = Some(file_check_svg);
            return Some(candidate);
        } else if contains(window, b"<!DOCTYPE plist ") {
            candidate.extension = EXT_PLIST;
        } else if contains(window, b"<PremiereData Version=") {
            candidate.extension = "prproj";
        }
        candidate.file_check = Some(file_check_xml);
        return Some(candidate);
    }
    if window.len() >= 10 && window[0] == b'0' && window[1] == b'0' && &window[4..10] == MAGIC_DC {
        // TSCe Survey Controller
        return Some(text_candidate("dc"));
    }
    if window.starts_with(MAGIC_DIF) {
        // Lotus Data Interchange Format
        return Some(text_candidate("dif"));
    }
    if window.starts_with(MAGIC_ICS) {
        let mut candidate = text_candidate("ics");
        candidate.time = ics_start_time(window);
        return Some(candidate);
    }
    if window.starts_with(MAGIC_JAD) {
        // Java Application Descriptor
        return Some(text_candidate("jad"));
    }
    if window.starts_with(MAGIC_LY) {
        return Some(text_candidate("ly"));
    }
    if window.starts_with(MAGIC_LYX) {
        return Some(text_candidate("lyx"));
    }
    if window.starts_with(MAGIC_M3U) {
        return Some(text_candidate("m3u"));
    }
    if window.starts_with(MAGIC_MNEMOSYNE) {
        return Some(text_candidate("mem"));
    }
    if window.starts_with(MAGIC_MSF) {
        // Mozilla mail summary
        return Some(text_candidate("msf"));
    }
    if window.starts_with(MAGIC_ADR) {
        return Some(text_candidate("adr"));
    }
    if window.starts_with(MAGIC_CUE1) || window.starts_with(MAGIC_CUE2) {
        // Cue sheets open with the genre or the media filename
        return Some(text_candidate("cue"));
    }
    if window.starts_with(MAGIC_SMIL) {
        let mut candidate = text_candidate("smil");
        candidate.file_check = Some(file_check_smil);
        return Some(candidate);
    }
    if window.starts_with(MAGIC_XMP)
        && !ctx
            .prior
            .map_or(false, |p| matches!(p.family, Family::Pdf | Family::Tiff))
    {
        // XMP embedded in PDF/TIFF stays with its host
        return Some(text_candidate("xmp"));
    }
    if window.starts_with(MAGIC_VBOOKMARK) {
        return Some(text_candidate("url"));
    }

    None
}

/// Pull the first `DTSTART` stamp out of a calendar header.
///
/// `DTSTART:19970714T133000` or `DTSTART;TZID=US-Eastern:19970714T133000`;
/// anything unparsable just leaves the candidate without a timestamp.
fn ics_start_time(window: &[u8]) -> Option<PrimitiveDateTime> {
    let at = memmem::find(window, b"DTSTART")?;
    let colon = at + memchr(b':', &window[at..])?;
    let stamp = window.get(colon + 1..colon + 16)?;

    let year = ascii_number(&stamp[0..4])?;
    let month = ascii_number(&stamp[4..6])?;
    let day = ascii_number(&stamp[6..8])?;
    // stamp[8] is the date/time separator
    let hour = ascii_number(&stamp[9..11])?;
    let minute = ascii_number(&stamp[11..13])?;
    let second = ascii_number(&stamp[13..15])?;

    let date = Date::from_calendar_date(year, Month::try_from(month as u8).ok()?, day as u8).ok()?;
    let time = Time::from_hms(hour as u8, minute as u8, second as u8).ok()?;

    Some(PrimitiveDateTime::new(date, time))
}

fn ascii_number(bytes: &[u8]) -> Option<i32> {
    bytes.iter().try_fold(0i32, |acc, &b| {
        if b.is_ascii_digit() {
            Some(acc * 10 + (b - b'0') as i32)
        } else {
            None
        }
    })
}
