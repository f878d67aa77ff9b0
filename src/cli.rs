use std::fs;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use crate::limits::CompilerLimits;
use crate::parser;

#[derive(Parser)]
#[command(name = "minic")]
#[command(about = "Mini-C front end")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a C source file and print the AST
    Parse(ParseArgs),
}

#[derive(clap::Args)]
pub struct ParseArgs {
    /// Input file path
    pub file: String,

    /// Limits configuration file
    #[arg(long, default_value = "minic.toml")]
    pub config: String,
}

pub fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Parse(args) => run_parse(args),
    }
}

fn run_parse(args: ParseArgs) -> Result<(), Box<dyn std::error::Error>> {
    let limits = CompilerLimits::from_project_toml(&args.config)?;
    limits.validate()?;

    let source = fs::read_to_string(&args.file)?;
    tracing::debug!(file = %args.file, bytes = source.len(), "parsing");

    let ast = parser::parse(&source, &limits)?;
    let errors = ast.errors();

    if errors.is_empty() {
        print!("{}", ast);
        return Ok(());
    }

    // Render every diagnostic collected from the tree against the source.
    let file = SimpleFile::new(args.file.as_str(), source.as_str());
    let writer = StandardStream::stderr(ColorChoice::Auto);
    let config = term::Config::default();
    for error in &errors {
        term::emit(&mut writer.lock(), &config, &file, &error.diagnostic())?;
    }

    Err(format!("{} parse error(s)", errors.len()).into())
}
