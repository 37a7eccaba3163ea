use std::path::PathBuf;
use std::process::exit;
use std::time::Duration;
use clap::Parser;
use ppfuzz::{
    backends::wire::parse_text_format,
    error::FuzzError,
    schema::DescriptorPool,
    transport::{HttpRunner, Runner},
};

/// Send a single hand-written text-format message to an endpoint.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target URL
    url: String,

    /// Name of the request message type
    endpoint: String,

    /// Compiled descriptor set
    descriptor: PathBuf,

    /// File with the message in text format
    msg_file: PathBuf,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

fn probe(args: Args) -> Result<(), FuzzError> {
    let pool = DescriptorPool::load(&args.descriptor)?;
    let text = std::fs::read_to_string(&args.msg_file).map_err(|source| FuzzError::Io {
        path: args.msg_file.clone(),
        source,
    })?;

    let payload = parse_text_format(&pool, &args.endpoint, &text)?.encode_to_vec();

    match HttpRunner::new(args.timeout.map(Duration::from_secs))?.run(&args.url, &payload)? {
        Some(response) if !response.is_success() => log::warn!("{} answered with status {}", args.url, response.status),
        Some(_) => {},
        None => log::warn!("Nothing was sent"),
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = probe(Args::parse()) {
        log::error!("{}", e);
        exit(1);
    }
}
