use std::path::PathBuf;
use std::process::exit;
use clap::Parser;
use ppfuzz::{
    backends::json::JsonGenerator,
    error::FuzzError,
    grammar::Grammar,
    schema::DescriptorPool,
};

/// Write the grammar of a message type as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, value_name = "DESCRIPTOR")]
    descriptor: PathBuf,

    #[arg(long)]
    message: String,

    #[arg(long)]
    output: PathBuf,
}

fn dump(args: Args) -> Result<(), FuzzError> {
    let pool = DescriptorPool::load(&args.descriptor)?;
    let grammar = Grammar::builder()
        .schema(&pool, &args.message)?
        .build()?;

    JsonGenerator::new().generate(&args.output, &grammar).map_err(|source| FuzzError::Io {
        path: args.output.clone(),
        source,
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = dump(Args::parse()) {
        log::error!("{}", e);
        exit(1);
    }
}
