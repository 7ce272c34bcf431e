//! Demo carving driver: walk a raw image sector by sector, ask the text
//! recognizers for candidates, stream data checks, finalize, and write the
//! recovered files out.

use std::path::PathBuf;

use carve_core::{Candidate, DataCheckOutcome, Registry, RegistryBuilder, Result, Scratch};
use text_carver::{register_fast_text, register_plain_text};
use tokio::fs;
use tracing::{debug, info, subscriber::set_global_default, Level};
use tracing_subscriber::FmtSubscriber;

/// Sector granularity of the scan.
const SECTOR: usize = 512;
/// Leading bytes handed to the recognizers.
const WINDOW: usize = 2048;
/// Cap for candidates that carry no data check (mailboxes grow until the
/// next header; an image tail shouldn't become one giant mbox).
const UNCHECKED_CAP: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_file(false)
        .with_line_number(true)
        .finish();

    #[allow(clippy::expect_used)]
    set_global_default(subscriber).expect("setting default subscriber failed");

    let mut args = std::env::args().skip(1);
    let image = PathBuf::from(args.next().unwrap_or_else(|| "./resources/image.dd".into()));
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| "./recovered".into()));

    let registry = build_registry()?;
    let bytes = fs::read(&image).await?;
    fs::create_dir_all(&out_dir).await?;

    info!(
        "scanning {} ({} bytes, {} registered magics)",
        image.display(),
        bytes.len(),
        registry.len()
    );

    let mut scratch = Scratch::new();
    let mut prior: Option<Candidate> = None;
    let mut recovered = 0usize;
    let mut offset = 0usize;

    while offset < bytes.len() {
        let window = &bytes[offset..bytes.len().min(offset + WINDOW)];

        let Some(mut candidate) = registry.recognize(window, false, prior.as_ref(), &mut scratch)
        else {
            offset += SECTOR;
            continue;
        };

        candidate.filename = format!("f{offset:08}.{}", candidate.extension);
        debug!("{}: {} candidate", offset, candidate.extension);

        let end = stream_candidate(&bytes, offset, &mut candidate);
        let data = &bytes[offset..end];
        candidate.file_size = data.len() as u64;

        if let Some(file_check) = candidate.file_check {
            file_check(data, &mut candidate);
        }

        if candidate.file_size == 0 {
            debug!("{}: {} discarded at finalization", offset, candidate.extension);
            offset += SECTOR;
            prior = Some(candidate);
            continue;
        }

        let kept = &data[..candidate.file_size as usize];
        fs::write(out_dir.join(&candidate.filename), kept).await?;
        info!("recovered {} ({} bytes)", candidate.filename, kept.len());
        recovered += 1;

        // next unclaimed sector
        offset += (candidate.file_size as usize).max(1).div_ceil(SECTOR) * SECTOR;
        prior = Some(candidate);
    }

    info!("done, {recovered} files recovered");

    Ok(())
}

fn build_registry() -> Result<Registry> {
    let mut builder = RegistryBuilder::new();
    register_fast_text(&mut builder)?;
    register_plain_text(&mut builder)?;
    Ok(builder.seal())
}

/// Feed sector pairs through the candidate's data check and return the end
/// of the accepted region (exclusive, in image coordinates).
fn stream_candidate(bytes: &[u8], start: usize, candidate: &mut Candidate) -> usize {
    let Some(data_check) = candidate.data_check else {
        return bytes.len().min(start + UNCHECKED_CAP);
    };

    candidate.file_size = (bytes.len() - start).min(SECTOR) as u64;
    let mut cursor = start + SECTOR;

    while cursor < bytes.len() {
        let next = bytes.len().min(cursor + SECTOR);
        // previous sector in front, new bytes behind
        let window = &bytes[cursor - SECTOR..next];
        let outcome = data_check(window, candidate);
        candidate.file_size += (next - cursor) as u64;
        cursor = next;

        if outcome == DataCheckOutcome::Stop {
            break;
        }
    }

    let accepted = if candidate.calculated_size > 0 {
        candidate.calculated_size as usize
    } else {
        cursor - start
    };

    bytes.len().min(start + accepted.max(SECTOR))
}
