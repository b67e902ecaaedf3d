//! CLI tool to compile and render ecogen templates.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use ecogen::script::DEFAULT_MAX_CALL_DEPTH;
use ecogen::{Engine, Environment, Runner, Syntax, Template};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ecogen", version, about = "Render a template with embedded script")]
struct Cli {
    /// Template file to render
    template: PathBuf,

    /// JSON object whose members become template variables
    #[arg(short, long, value_name = "FILE")]
    env: Option<PathBuf>,

    /// What to print instead of rendering
    #[arg(long, value_enum, default_value_t = Emit::Output)]
    emit: Emit,

    /// Character that starts a directive line
    #[arg(long, value_name = "CHAR", default_value_t = '~')]
    line_sentinel: char,

    /// Character that follows the line sentinel to open or close a block
    #[arg(long, value_name = "CHAR", default_value_t = '-')]
    block_marker: char,

    /// Two characters that open an expression
    #[arg(long, value_name = "MARKER", default_value = "#|", value_parser = parse_marker)]
    expr_open: [char; 2],

    /// Two characters that close an expression
    #[arg(long, value_name = "MARKER", default_value = "|#", value_parser = parse_marker)]
    expr_close: [char; 2],

    /// Honour the line sentinel anywhere on a line, not only in column 1
    #[arg(long)]
    sentinel_anywhere: bool,

    /// Maximum nesting of script function calls
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// The rendered text
    Output,
    /// The token sequence as JSON
    Tokens,
    /// The generated script
    Code,
}

impl Cli {
    fn syntax(&self) -> Syntax {
        let syntax = Syntax::new()
            .line_sentinel(self.line_sentinel)
            .block_marker(self.block_marker)
            .expression_markers(self.expr_open, self.expr_close);
        if self.sentinel_anywhere {
            syntax.sentinel_anywhere()
        } else {
            syntax
        }
    }

    fn environment(&self) -> Result<Environment> {
        let Some(path) = &self.env else {
            return Ok(Environment::new());
        };
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Environment::from_json(&json)
            .with_context(|| format!("{}: invalid environment", path.display()))
    }
}

fn parse_marker(text: &str) -> Result<[char; 2], String> {
    Syntax::marker(text).ok_or_else(|| format!("expected exactly two characters, got {text:?}"))
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("ecogen=debug"),
        _ => EnvFilter::new("ecogen=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let path = cli.template.display();
    let source =
        fs::read_to_string(&cli.template).with_context(|| format!("failed to read {path}"))?;
    let template = Template::compile_with(&source, &cli.syntax());

    match cli.emit {
        Emit::Tokens => {
            let json = serde_json::to_string_pretty(template.tokens())?;
            println!("{json}");
            return Ok(());
        }
        Emit::Code => {
            print!("{}", template.code());
            return Ok(());
        }
        Emit::Output => {}
    }

    let mut env = cli.environment()?;
    let runner = Runner::with_evaluator(Engine::new().max_call_depth(cli.max_call_depth));

    match template.render_with(&runner, &mut env) {
        Ok(output) => {
            print!("{output}");
            Ok(())
        }
        Err(err) => {
            let context = match template.locate(&err) {
                Some(span) => format!("{path}: error in template {span}"),
                None => format!("{path}: error"),
            };
            Err(anyhow::Error::new(err).context(context))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
