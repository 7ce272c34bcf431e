use tracing::trace;

use crate::{Candidate, Error, Result};

/// Recognizer callback. Pure function of the window and the carving
/// context; returns a fully initialized candidate or nothing.
pub type Recognizer = fn(ctx: &mut RecognizerCtx<'_>) -> Option<Candidate>;

/// Everything a recognizer may look at for one window.
pub struct RecognizerCtx<'a> {
    /// Leading bytes of the sector under inspection.
    pub window: &'a [u8],
    /// Caller only wants cheap prefix checks, no statistical work.
    pub safe_header_only: bool,
    /// Recovery already in progress at this point of the stream, if any.
    pub prior: Option<&'a Candidate>,
    pub scratch: &'a mut Scratch,
}

/// Reusable fold buffer, one per carving session. Allocated lazily on the
/// first fold; folds never take more than 2 KiB of input, so the buffer
/// stays small for the life of the session.
#[derive(Default)]
pub struct Scratch {
    lower: Vec<u8>,
}

impl Scratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cleared buffer for the next fold.
    pub fn lower(&mut self) -> &mut Vec<u8> {
        self.lower.clear();
        &mut self.lower
    }
}

struct Entry {
    offset: usize,
    magic: Vec<u8>,
    recognizer: Recognizer,
}

/// Collects (offset, magic, recognizer) subscriptions, then seals them into
/// an immutable [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<Entry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `recognizer` to windows carrying `magic` at `offset`.
    /// Many magics may share a recognizer, and a magic may be a single byte.
    pub fn register(&mut self, offset: usize, magic: &[u8], recognizer: Recognizer) -> Result<()> {
        if magic.is_empty() {
            return Err(Error::EmptyMagic);
        }

        self.entries.push(Entry {
            offset,
            magic: magic.to_vec(),
            recognizer,
        });

        Ok(())
    }

    /// Freeze the table. Longer magics sort first so the most specific
    /// subscription is consulted before any one-byte fallback; registration
    /// order breaks ties.
    pub fn seal(mut self) -> Registry {
        self.entries
            .sort_by(|a, b| b.magic.len().cmp(&a.magic.len()));

        Registry {
            entries: self.entries,
        }
    }
}

/// Sealed magic table. Immutable, shareable read-only across sessions.
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run the recognizers subscribed to this window. The first one to
    /// produce a candidate wins.
    pub fn recognize(
        &self,
        window: &[u8],
        safe_header_only: bool,
        prior: Option<&Candidate>,
        scratch: &mut Scratch,
    ) -> Option<Candidate> {
        for entry in &self.entries {
            let end = entry.offset + entry.magic.len();

            if window.len() < end || window[entry.offset..end] != entry.magic[..] {
                continue;
            }

            let mut ctx = RecognizerCtx {
                window,
                safe_header_only,
                prior,
                scratch: &mut *scratch,
            };

            if let Some(candidate) = (entry.recognizer)(&mut ctx) {
                trace!("recognized {} candidate", candidate.extension);
                return Some(candidate);
            }
        }

        None
    }
}
