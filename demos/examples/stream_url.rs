//! Stream a URL to stdout with blocking reads.
//!
//! ```sh
//! cargo run -p stream-source-demos --example stream_url -- <url>
//! ```
//!
//! Status transitions (disconnects, reconnect attempts, stalls) are printed
//! to stderr while the payload goes to stdout.

use std::io::Write;

use stream_source::{Settings, StreamSource, StreamStatus};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let url = std::env::args()
        .nth(1)
        .expect("usage: stream_url <url>");

    let mut source = StreamSource::new(Settings::default())
        .with_status_sink(|status: StreamStatus, message: &str| {
            eprintln!("[{status}] {message}");
        });
    source.open(&url).await?;
    eprintln!(
        "opened {url}: {:?} bytes",
        Option::<u64>::from(source.content_length())
    );

    let mut stdout = std::io::stdout().lock();
    let mut buf = vec![0u8; 16 * 1024];
    loop {
        let n = source.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        stdout.write_all(&buf[..n])?;
    }
    eprintln!("done: {} bytes", source.position());
    source.close().await;
    Ok(())
}
