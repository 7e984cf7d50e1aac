use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use puml_gen::{Config, Diagnostics, EncodingMethod, ImageFormat};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Conventional diagram source path, shared by both subcommands.
const DEFAULT_INPUT: &str = "storage/uml/domain-models.puml";

/// Exit code reported when the user interrupts the run.
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(
    name = "puml-gen",
    version,
    author,
    about = "Render PlantUML diagrams through the public web service",
    long_about = "Render PlantUML diagrams through the public PlantUML web service.\n\n\
    The diagram source is compressed and embedded into the request URL using \
    PlantUML's text encoding. When a mirror or encoding scheme fails, the next \
    one is tried until the strategy list is exhausted.\n\n\
    USAGE EXAMPLES:\n  \
      # Render the conventional source path to PNG\n  \
      puml-gen render\n\n  \
      # Render a specific diagram to SVG\n  \
      puml-gen render ./docs/flow.puml --format svg\n\n  \
      # Generate every supported format\n  \
      puml-gen render ./docs/flow.puml --all\n\n  \
      # Check project files and mirror connectivity\n  \
      puml-gen check"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a diagram source file to one or more image formats
    Render(RenderArgs),

    /// Diagnose diagram project files and server connectivity
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Path to the PlantUML source file
    #[arg(value_name = "FILE", default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "png")]
    format: CliFormat,

    /// Generate every supported format
    #[arg(long, conflicts_with = "format")]
    all: bool,

    /// List supported formats and exit
    #[arg(long)]
    list_formats: bool,

    /// Output directory (defaults to the input file's directory)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Rendering server base URL (repeatable, tried in order)
    #[arg(long, value_name = "URL")]
    server: Vec<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Encoding method; auto tries deflate, then base64, then hex
    #[arg(long, value_enum, default_value = "auto")]
    method: CliMethod,

    /// Skip writing render-summary.json
    #[arg(long)]
    no_summary: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Path to the PlantUML source file
    #[arg(value_name = "FILE", default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Project root scanned for .puml files and package.json
    #[arg(long, value_name = "DIR", default_value = ".")]
    root: PathBuf,

    /// Skip the server connectivity probe
    #[arg(long)]
    offline: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliFormat {
    Png,
    Svg,
    Eps,
    Pdf,
    Txt,
    Utxt,
}

impl From<CliFormat> for ImageFormat {
    fn from(f: CliFormat) -> Self {
        match f {
            CliFormat::Png => Self::Png,
            CliFormat::Svg => Self::Svg,
            CliFormat::Eps => Self::Eps,
            CliFormat::Pdf => Self::Pdf,
            CliFormat::Txt => Self::Txt,
            CliFormat::Utxt => Self::Utxt,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliMethod {
    /// Try every scheme in fallback order
    Auto,
    /// Deflate + the service's 6-bit alphabet (canonical)
    Deflate,
    /// Deflate + URL-safe base64 (`~1` prefix)
    Base64,
    /// Hex of the uncompressed source (`~h` prefix)
    Hex,
}

impl CliMethod {
    fn methods(self) -> Vec<EncodingMethod> {
        match self {
            Self::Auto => EncodingMethod::ALL.to_vec(),
            Self::Deflate => vec![EncodingMethod::Deflate],
            Self::Base64 => vec![EncodingMethod::Base64],
            Self::Hex => vec![EncodingMethod::Hex],
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = setup_tracing(cli.verbose) {
        eprintln!("Failed to initialize logging: {err:#}");
        return ExitCode::FAILURE;
    }

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if matches!(
                err.downcast_ref::<puml_gen::Error>(),
                Some(puml_gen::Error::Interrupted)
            ) {
                eprintln!("Interrupted");
                return ExitCode::from(EXIT_INTERRUPTED);
            }
            eprintln!("Error: {err:#}");
            if let Some(puml_gen::Error::AllAttemptsFailed { attempts, .. }) =
                err.downcast_ref::<puml_gen::Error>()
            {
                for attempt in attempts {
                    eprintln!("  - {attempt}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Render(args) => render(args),
        Command::Check(args) => check(args),
    }
}

fn render(args: RenderArgs) -> anyhow::Result<()> {
    if args.list_formats {
        for format in ImageFormat::ALL {
            println!("{format}");
        }
        return Ok(());
    }

    let mut builder = Config::builder()
        .input_path(args.input)
        .timeout(Duration::from_secs(args.timeout))
        .methods(args.method.methods())
        .write_summary(!args.no_summary);

    builder = if args.all {
        builder.all_formats()
    } else {
        builder.format(args.format.into())
    };

    if let Some(output) = args.output {
        builder = builder.output_dir(output);
    }

    if !args.server.is_empty() {
        builder = builder.servers(args.server);
    }

    let config = builder.build().context("Failed to build configuration")?;

    let stats = puml_gen::run(config).context("Render failed")?;
    stats.print_summary();

    Ok(())
}

fn check(args: CheckArgs) -> anyhow::Result<()> {
    let config = Config::builder()
        .input_path(args.input)
        .build()
        .context("Failed to build configuration")?;

    let report = Diagnostics::new(config)
        .context("Failed to create diagnostics")?
        .with_root(args.root)
        .with_probes(!args.offline)
        .run();

    report.print();

    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("puml_gen=info"),
        1 => EnvFilter::new("puml_gen=debug"),
        _ => EnvFilter::new("puml_gen=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .init();

    Ok(())
}
