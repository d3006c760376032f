//! MCF Crosswalk CLI
//!
//! Command-line tool for resolving MCF documents and converting metadata
//! between dialects.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::Level;

use mcf_crosswalk::{
    available_schemas, load_schema, read_mcf, CrosswalkError, DocumentSource, ImportOptions,
    Output, ResolveOptions,
};

#[derive(Parser)]
#[command(name = "mcf-crosswalk")]
#[command(about = "Resolve MCF documents and crosswalk metadata between dialects")]
#[command(version)]
struct Cli {
    /// Logging verbosity
    #[arg(long, short = 'v', value_enum, global = true, default_value = "warn")]
    verbosity: Verbosity,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Verbosity {
    Error,
    Warn,
    Info,
    Debug,
}

impl From<Verbosity> for Level {
    fn from(v: Verbosity) -> Self {
        match v {
            Verbosity::Error => Level::ERROR,
            Verbosity::Warn => Level::WARN,
            Verbosity::Info => Level::INFO,
            Verbosity::Debug => Level::DEBUG,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an MCF document and print it
    Read(ReadArgs),
    /// Import foreign metadata into MCF
    Import(ImportArgs),
    /// Export an MCF document to another dialect
    Export(ExportArgs),
    /// List available schemas
    Schemas,
}

#[derive(Args)]
struct OutputArgs {
    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct ReadArgs {
    /// Path to MCF file
    mcf: PathBuf,

    #[command(flatten)]
    out: OutputArgs,
}

#[derive(Args)]
struct ImportArgs {
    /// Path to metadata file
    file: PathBuf,

    /// Schema of the input (see `schemas`)
    #[arg(short, long)]
    schema: String,

    /// Language assumed when the input declares none
    #[arg(long, default_value = "en")]
    language: String,

    #[command(flatten)]
    out: OutputArgs,
}

#[derive(Args)]
struct ExportArgs {
    /// Path to MCF file
    mcf: PathBuf,

    /// Target schema (see `schemas`)
    #[arg(short, long)]
    schema: String,

    #[command(flatten)]
    out: OutputArgs,
}

/// Write output to file or stdout
fn write_output(content: &str, output: Option<&PathBuf>) -> Result<(), CrosswalkError> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!("Wrote {}", path.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

fn parent_dir(path: &Path) -> Option<PathBuf> {
    path.canonicalize()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
}

fn run_read(args: ReadArgs) -> Result<(), CrosswalkError> {
    let doc = read_mcf(DocumentSource::Path(args.mcf), &ResolveOptions::default())?;
    let output = Output::Native(doc.to_value()).into_text(args.out.pretty)?;
    write_output(&output, args.out.output.as_ref())
}

fn run_import(args: ImportArgs) -> Result<(), CrosswalkError> {
    let schema = load_schema(&args.schema)?;
    let content = fs::read_to_string(&args.file)?;

    let options = ImportOptions {
        default_language: args.language,
        base_dir: parent_dir(&args.file),
    };
    let doc = schema.import(&content, &options)?;

    let output = Output::Native(doc.to_value()).into_text(args.out.pretty)?;
    write_output(&output, args.out.output.as_ref())
}

fn run_export(args: ExportArgs) -> Result<(), CrosswalkError> {
    let schema = load_schema(&args.schema)?;
    let doc = read_mcf(DocumentSource::Path(args.mcf), &ResolveOptions::default())?;

    let output = schema.write(&doc, false)?.into_text(args.out.pretty)?;
    write_output(&output, args.out.output.as_ref())
}

fn run_schemas() -> Result<(), CrosswalkError> {
    for schema in available_schemas() {
        let mut modes = Vec::new();
        if schema.can_import() {
            modes.push("import");
        }
        if schema.can_write() {
            modes.push("write");
        }
        println!(
            "{:<12} {:<28} {}",
            schema.name(),
            schema.description(),
            modes.join(", ")
        );
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::from(cli.verbosity))
        .init();

    let result = match cli.command {
        Commands::Read(args) => run_read(args),
        Commands::Import(args) => run_import(args),
        Commands::Export(args) => run_export(args),
        Commands::Schemas => run_schemas(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
