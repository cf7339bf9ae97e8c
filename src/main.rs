use fourop::runtime::native;
use std::error::Error;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // an optional Standard MIDI File to play instead of live input
    let file = std::env::args_os().nth(1).map(PathBuf::from);
    native::start(file.as_deref())
}
