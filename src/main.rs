use clap::{Parser, ValueEnum};
use perfect_phylogeny::io::{normalize, read_matrix, write_tree};
use perfect_phylogeny::matrix::LabelScheme;
use perfect_phylogeny::tree::{build_with, BuildOptions};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Reconstruct the character tree of a binary species × character matrix
/// and print it as a single Newick-like line.
#[derive(Parser, Debug)]
#[command(name = "perfect-phylogeny", version, about = "Perfect phylogeny tree from a binary character matrix")]
struct Args {
    /// Path to the matrix file (`-` for stdin, `.gz` is decompressed)
    #[arg(short = 'm', long = "matrix")]
    matrix: PathBuf,

    /// Label characters as gain/loss pairs (C0001+, C0001-, ...)
    #[arg(short = 'p', long = "persistent", default_value_t = false)]
    persistent: bool,

    /// Character labelling scheme; overrides --persistent
    #[arg(long = "label-scheme", value_enum)]
    label_scheme: Option<SchemeArg>,

    /// Output path for the tree (`-` for stdout, `.gz` is compressed)
    #[arg(short = 'o', long = "output", default_value = "-")]
    output: PathBuf,

    /// Fail instead of printing a tree when the matrix has no perfect phylogeny
    #[arg(long = "validate", default_value_t = false)]
    validate: bool,

    /// Build sibling subtrees in parallel
    #[arg(long = "parallel", default_value_t = false)]
    parallel: bool,

    /// Quiet mode: only warnings and errors on stderr
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,

    /// Verbose mode: per-level partition details on stderr
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SchemeArg { Plain, Persistent, PersistentLiteral }

impl From<SchemeArg> for LabelScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Plain => LabelScheme::Plain,
            SchemeArg::Persistent => LabelScheme::Persistent,
            SchemeArg::PersistentLiteral => LabelScheme::PersistentLiteral,
        }
    }
}

fn main() {
    let args = Args::parse();

    let level = if args.quiet {
        Level::WARN
    } else if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install logger: {e}");
    }

    let scheme = args
        .label_scheme
        .map(LabelScheme::from)
        .unwrap_or_else(|| LabelScheme::from_persistent(args.persistent));
    if scheme == LabelScheme::PersistentLiteral {
        warn!("persistent-literal labels collide for every pair of columns");
    }

    // Read the matrix
    let t0 = Instant::now();
    let mut matrix = match read_matrix(&args.matrix, scheme) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Failed to read matrix {:?}: {e}", args.matrix);
            std::process::exit(2);
        }
    };
    let read_s = t0.elapsed().as_secs_f64();
    info!("Reading matrix {read_s:.3}s");
    info!(
        "Read in {} species for {} characters",
        matrix.species_count(),
        matrix.character_count()
    );

    let t1 = Instant::now();
    normalize(&mut matrix);
    let norm_s = t1.elapsed().as_secs_f64();
    info!("Normalizing columns {norm_s:.3}s, {} characters kept", matrix.character_count());
    debug!("Column order: {:?}", matrix.character_labels());

    let t2 = Instant::now();
    let options = BuildOptions { parallel: args.parallel, validate: args.validate };
    let tree = match build_with(&matrix, matrix.character_labels(), &options) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to build tree: {e}");
            std::process::exit(3);
        }
    };
    let build_s = t2.elapsed().as_secs_f64();
    info!("Building tree {build_s:.3}s, depth {}", tree.depth());

    let t3 = Instant::now();
    if let Err(e) = write_tree(&args.output, &tree.to_newick()) {
        eprintln!("Failed to write output {:?}: {e}", args.output);
        std::process::exit(4);
    }
    let write_s = t3.elapsed().as_secs_f64();
    if args.output.as_os_str() == "-" {
        info!("Writing to stdout {write_s:.3}s");
    } else {
        info!("Writing to output {write_s:.3}s");
    }
}
