use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use clap_stdin::FileOrStdin;
use thiserror::Error;

use cminus::config::{CompileOptions, DEFAULT_ENTRY_POINT};
use cminus::lexer::LexOptions;
use cminus::parser::Verdict;

/// Compile a C-minus program into quadruples.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Source file, or `-` to read stdin
    #[arg(default_value = "-")]
    input: FileOrStdin,

    /// Print the token listing before the quadruples
    #[arg(long)]
    tokens: bool,

    /// Do not print lexical errors
    #[arg(long)]
    silent: bool,

    /// Name of the entry-point function
    #[arg(long, default_value = DEFAULT_ENTRY_POINT)]
    entry: String,

    /// Write the quadruple listing here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("cannot read input: {0}")]
    Input(#[from] clap_stdin::StdinError),
    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),
}

fn verdict(v: Verdict) -> &'static str {
    match v {
        Verdict::Accept => "ACCEPT",
        Verdict::Reject => "REJECT",
        Verdict::Empty => "EMPTY",
    }
}

fn run(args: Args) -> Result<bool, CliError> {
    let source = args.input.contents()?;
    let options = CompileOptions {
        // lexical errors are printed below in diagnostic form
        lex: LexOptions {
            silent: true,
            ..LexOptions::default()
        },
        entry_point: args.entry,
    };

    let compilation = cminus::compile_with(&source, &options);

    if args.tokens {
        for token in &compilation.tokens {
            println!("{}", token);
        }
    }
    if !args.silent {
        for d in &compilation.lexical_errors {
            eprintln!("{}", d);
        }
    }
    if let Some(e) = &compilation.syntax_error {
        eprintln!("{}", e.to_diagnostic());
    }
    for d in &compilation.diagnostics {
        eprintln!("{}", d);
    }
    eprintln!("syntax: {}", verdict(compilation.syntax));
    eprintln!("semantics: {}", verdict(compilation.semantics));

    let listing = compilation.listing();
    match args.output {
        Some(path) => fs::write(path, listing)?,
        None => print!("{}", listing),
    }

    Ok(compilation.is_success())
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    let args = Args::parse();
    match run(args) {
        Ok(true) => (),
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    }
}
