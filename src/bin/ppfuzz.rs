use std::path::PathBuf;
use std::process::exit;
use std::time::Duration;
use clap::Parser;
use ppfuzz::{
    config::Config,
    error::FuzzError,
    fuzzer::ProtoFuzzer,
    schema::compile_protos,
    transport::HttpRunner,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON configuration
    #[arg(long, value_name = "CONFIG")]
    config: PathBuf,

    /// Only compile the .proto files of the configuration and exit
    #[arg(short = 'C', long)]
    compile: bool,

    /// Number of messages to send. Runs forever if not set.
    #[arg(long)]
    count: Option<u64>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    min_nonterminals: Option<usize>,

    #[arg(long)]
    max_nonterminals: Option<usize>,

    /// Request timeout in seconds. Requests never time out if not set.
    #[arg(long)]
    timeout: Option<u64>,
}

fn fuzz(args: Args) -> Result<(), FuzzError> {
    let mut config = Config::load(&args.config)?;

    if args.compile {
        let outputs = compile_protos(&config.proto_files(), &config.proto_out)?;
        log::info!("Compiled {} descriptor sets into {}", outputs.len(), config.proto_out.display());
        return Ok(());
    }

    if let Some(min) = args.min_nonterminals {
        config.min_nonterminals = min;
    }

    if let Some(max) = args.max_nonterminals {
        config.max_nonterminals = max;
    }

    let mut fuzzer = ProtoFuzzer::from_config(config)?;

    if let Some(seed) = args.seed {
        fuzzer = fuzzer.seed(seed);
    }

    let runner = HttpRunner::new(args.timeout.map(Duration::from_secs))?;
    let mut sent = 0u64;

    while args.count.map_or(true, |count| sent < count) {
        fuzzer.run(&runner)?;
        sent += 1;
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = fuzz(Args::parse()) {
        log::error!("{}", e);
        exit(1);
    }
}
