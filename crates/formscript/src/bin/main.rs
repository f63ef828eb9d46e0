//! formscript command-line interface

use clap::{Parser, Subcommand};
use formscript::cli::output::{self, OutputFormat};
use formscript::cli::{convert, expr, load_options};
use formscript::QuotePolicy;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Form logic conversion tool
#[derive(Parser)]
#[command(name = "formscript")]
#[command(author, version, about = "Convert XPath form logic to Expression Script", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json, pretty, tsv)
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: String,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    /// Options file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// String literal quoting (selected-only, preserve, double)
    #[arg(short, long, global = true)]
    quote_policy: Option<QuotePolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single expression
    Expr {
        /// Expression to convert
        expression: String,

        /// Field declaration (PATH or PATH=IDENTIFIER)
        #[arg(long = "field")]
        fields: Vec<String>,

        /// Form description file (JSON) supplying the fields
        #[arg(long)]
        form: Option<PathBuf>,

        /// Field owning the expression
        #[arg(long)]
        current: Option<String>,
    },

    /// Convert every expression of a form description
    Convert {
        /// Form description file (JSON)
        form: PathBuf,

        /// Fail if any expression produced a warning
        #[arg(short, long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    output::setup_colors(&cli.color);

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let format: OutputFormat = cli.format.parse()?;

    match cli.command {
        Commands::Expr {
            expression,
            fields,
            form,
            current,
        } => {
            let config = expr::ExprConfig {
                expression,
                fields,
                form,
                options: load_options(cli.config.as_deref(), cli.quote_policy, current)?,
                format,
                output_file: cli.output,
            };
            expr::expr(config).await
        }

        Commands::Convert { form, strict } => {
            let config = convert::ConvertConfig {
                form,
                options: load_options(cli.config.as_deref(), cli.quote_policy, None)?,
                format,
                output_file: cli.output,
                strict,
                verbose: cli.verbose,
            };
            convert::convert(config).await
        }
    }
}
