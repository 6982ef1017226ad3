//! `pairwise-ec` — command-line driver for the striped erasure-coding
//! codec.
//!
//! Drives a [`pairwise_ec::Session`] over the on-disk stripe layout: a
//! sibling `Coding/` directory holding `<name>_k<II>.<ext>` data nodes,
//! `<name>_m<JJ>.<ext>` parity nodes, and `<name>_meta.txt`. A missing node
//! file marks that node as erased for the session rather than aborting.

use clap::{Parser, Subcommand};
use pairwise_ec::metadata::Metadata;
use pairwise_ec::session::Session;
use pairwise_ec::{Error, Result, K, M_PARITY};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Pairwise-regenerating erasure-coded striped storage codec", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true, env = "LOG_JSON")]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a file into K data nodes + M_PARITY parity nodes plus a metadata file.
    Encode {
        /// Path to the input file.
        input: PathBuf,
        /// Sub-stripe blocksize in bytes; defaults to the smallest size that
        /// fits the whole file into one stripe.
        #[arg(long)]
        blocksize: Option<usize>,
    },
    /// Decode a previously encoded file, tolerating up to M_PARITY missing nodes.
    Decode {
        /// Base name used when encoding (matches `<name>_meta.txt`).
        name: String,
        /// Directory containing `Coding/`; defaults to the current directory.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Heal one missing or corrupt node file in place, without reassembling the original file.
    Repair {
        /// Base name used when encoding.
        name: String,
        /// Node to heal, e.g. `k03` or `m01`.
        node: String,
        /// Directory containing `Coding/`; defaults to the current directory.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.log_json);

    match args.command {
        Command::Encode { input, blocksize } => encode(&input, blocksize),
        Command::Decode { name, dir } => decode(&dir, &name),
        Command::Repair { name, node, dir } => repair(&dir, &name, &node),
    }
}

fn init_logging(log_level: &str, log_json: bool) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if log_json {
        tracing_subscriber::registry().with(filter).with(fmt::layer().json()).init();
    } else {
        tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(false)).init();
    }
}

fn node_filename(name: &str, ext: &str, kind: char, idx: usize) -> String {
    format!("{name}_{kind}{idx:02}.{ext}")
}

fn split_ext(path: &Path) -> (String, String) {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("output").to_string();
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("bin").to_string();
    (stem, ext)
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "node file missing, marking erased");
            Ok(None)
        }
        Err(e) => Err(Error::Io(e)),
    }
}

fn encode(input: &Path, blocksize: Option<usize>) -> Result<()> {
    let data = fs::read(input)?;
    let origsize = data.len();
    let (stem, ext) = split_ext(input);

    let blocksize = blocksize.unwrap_or_else(|| Session::blocksize_for(origsize));
    let session = Session::new(blocksize)?;
    let encoded = session.encode(&data)?;
    info!(origsize, blocksize, "encoded stripe");

    let coding_dir = input.parent().unwrap_or_else(|| Path::new(".")).join("Coding");
    fs::create_dir_all(&coding_dir)?;

    for (i, block) in encoded.data_streams.iter().enumerate() {
        fs::write(coding_dir.join(node_filename(&stem, &ext, 'k', i)), block)?;
    }
    for (j, block) in encoded.coding_streams.iter().enumerate() {
        fs::write(coding_dir.join(node_filename(&stem, &ext, 'm', j)), block)?;
    }

    let meta = Metadata::new(
        input.file_name().and_then(|s| s.to_str()).unwrap_or(&stem).to_string(),
        origsize,
        blocksize,
    );
    meta.write(coding_dir.join(format!("{stem}_meta.txt")))?;

    info!(k = K, m = M_PARITY, "wrote {} node files to {}", K + M_PARITY, coding_dir.display());
    Ok(())
}

fn load_session_and_streams(dir: &Path, name: &str) -> Result<(Session, Metadata, String, [Option<Vec<u8>>; K + M_PARITY])> {
    let coding_dir = dir.join("Coding");
    let meta = Metadata::read(coding_dir.join(format!("{name}_meta.txt")))?;
    let ext = Path::new(&meta.original_filename)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("bin")
        .to_string();

    let session = Session::new(meta.blocksize())?;

    let mut erasures = 0usize;
    let mut streams: [Option<Vec<u8>>; K + M_PARITY] = std::array::from_fn(|_| None);
    for i in 0..K {
        let path = coding_dir.join(node_filename(name, &ext, 'k', i));
        streams[i] = read_optional(&path)?;
        if streams[i].is_none() {
            erasures += 1;
        }
    }
    for j in 0..M_PARITY {
        let path = coding_dir.join(node_filename(name, &ext, 'm', j));
        streams[K + j] = read_optional(&path)?;
        if streams[K + j].is_none() {
            erasures += 1;
        }
    }
    info!(erasures, "loaded stripe nodes");

    Ok((session, meta, ext, streams))
}

fn decode(dir: &Path, name: &str) -> Result<()> {
    let (session, meta, ext, streams) = load_session_and_streams(dir, name)?;
    let decoded = session.decode(streams, meta.origsize)?;

    let out_path = dir.join(format!("{name}_decoded.{ext}"));
    fs::write(&out_path, &decoded)?;
    info!(output = %out_path.display(), bytes = decoded.len(), "decoded stripe");
    Ok(())
}

fn repair(dir: &Path, name: &str, node: &str) -> Result<()> {
    let (session, _meta, ext, streams) = load_session_and_streams(dir, name)?;
    let reconstructed = session.reconstruct(streams)?;

    let mut chars = node.chars();
    let kind = chars.next().ok_or_else(|| Error::InvalidConfig("empty node name".to_string()))?;
    let idx: usize = chars
        .as_str()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("invalid node index in {node:?}")))?;

    let block = match kind {
        'k' if idx < K => &reconstructed.data_streams[idx],
        'm' if idx < M_PARITY => &reconstructed.coding_streams[idx],
        _ => return Err(Error::InvalidConfig(format!("unknown node {node:?}"))),
    };

    let coding_dir = dir.join("Coding");
    let out_path = coding_dir.join(node_filename(name, &ext, kind, idx));
    fs::write(&out_path, block)?;
    info!(node, path = %out_path.display(), "repaired node");
    Ok(())
}
