use carve_core::{RegistryBuilder, Result, Scratch};
use text_carver::{register_fast_text, register_plain_text};
use tokio::fs;
use tracing::debug;
use tracing::{subscriber::set_global_default, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_file(false)
        .with_line_number(true)
        .finish();

    #[allow(clippy::expect_used)]
    set_global_default(subscriber).expect("setting default subscriber failed");

    let mut builder = RegistryBuilder::new();
    register_fast_text(&mut builder)?;
    register_plain_text(&mut builder)?;
    let registry = builder.seal();

    let mut scratch = Scratch::new();

    for path in std::env::args().skip(1) {
        let bytes = fs::read(&path).await?;
        let window = &bytes[..bytes.len().min(2048)];

        match registry.recognize(window, false, None, &mut scratch) {
            Some(candidate) => {
                debug!("{path}: {}", candidate.extension);
                debug!("   calculated_size: {}", candidate.calculated_size);
                debug!("   data_check: {}", candidate.data_check.is_some());
                debug!("   file_check: {}", candidate.file_check.is_some());

                if let Some(time) = candidate.time {
                    debug!("   time: {time:?}");
                }
            }
            None => debug!("{path}: not a recognized text format"),
        }
    }

    Ok(())
}
