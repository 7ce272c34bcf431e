use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use time::PrimitiveDateTime;

/// Format family that owns an in-progress recovery.
///
/// Identities of the non-text families exist only so text recognizers can
/// defer to a carver that is still mid-file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Text formats recognized by a registered magic.
    FastText,
    /// Text recognized heuristically from a single plausible lead byte.
    PlainText,
    Doc,
    Jpeg,
    Pdf,
    Tiff,
    Zip,
}

/// Verdict of a data check over one window. The raw values are the codes
/// exchanged with the driver. Possible values are:
///
///   1   Keep streaming; the window was all accepted.
///
///   2   The file ends inside this window; `calculated_size` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum DataCheckOutcome {
    Continue = 1,
    Stop = 2,
}

bitflags! {
    /// Newline conventions a finalized file is allowed to mix. The driver
    /// consumes these when it post-processes line endings.
    pub struct NewlineStyle: u8 {
        /// Unix `\n`
        const BARE_NL = 0b0000_0001;
        /// DOS `\r\n`
        const CRLF = 0b0000_0010;
        /// Legacy `\r`
        const BARE_CR = 0b0000_0100;
    }
}

/// Incremental validator: the second half of `window` is new data.
pub type DataCheckFn = fn(window: &[u8], candidate: &mut Candidate) -> DataCheckOutcome;

/// Finalizer: `data` is every byte the driver committed for this candidate.
pub type FileCheckFn = fn(data: &[u8], candidate: &mut Candidate);

/// An in-progress recovery hypothesis.
///
/// Recognizers return a fully initialized record; the driver owns it from
/// then on and mutates only the size fields and `filename`.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Extension the file will be recovered under.
    pub extension: &'static str,
    /// Bytes accepted so far. Grows monotonically.
    pub calculated_size: u64,
    /// Bytes the driver has committed to disk.
    pub file_size: u64,
    /// Below this size a competing carver is preferred.
    pub min_filesize: u64,
    pub data_check: Option<DataCheckFn>,
    pub file_check: Option<FileCheckFn>,
    /// Driver-assigned provisional name.
    pub filename: String,
    /// Timestamp extracted from the header, when the format carries one.
    pub time: Option<PrimitiveDateTime>,
    pub family: Family,
    pub newline_styles: NewlineStyle,
}

impl Candidate {
    pub fn new(family: Family, extension: &'static str) -> Self {
        Self {
            extension,
            calculated_size: 0,
            file_size: 0,
            min_filesize: 0,
            data_check: None,
            file_check: None,
            filename: String::new(),
            time: None,
            family,
            newline_styles: NewlineStyle::empty(),
        }
    }

    pub fn allow_newline_styles(&mut self, styles: NewlineStyle) {
        self.newline_styles = styles;
    }
}
