use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast::Ast;
use rox::error::LoxError;
use rox::interpreter::Interpreter;
use rox::scanner::Scanner;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to a file (see --log-file)
    #[arg(long, global = true)]
    log: bool,

    /// Where --log writes to
    #[arg(long, global = true, default_value = "app.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Emit tokens as JSON, one per line
        #[arg(long)]
        json: bool,
    },

    /// Parses a Lox program and prints its AST
    Parse { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Interactive session; globals persist between lines
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    // `[module:line] - message`, default Debug, RUST_LOG may override
    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

fn report(errors: &[LoxError]) -> i32 {
    for e in errors {
        debug!("Reporting: {}", e);
        eprintln!("{}", e);
    }
    errors.iter().map(LoxError::exit_code).max().unwrap_or(0)
}

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    let source = read_file(filename)?;
    let mut tokenized = true;

    for token in Scanner::new(source.as_bytes()) {
        match token {
            Ok(token) if json => println!("{}", serde_json::to_string(&token)?),
            Ok(token) => println!("{}", token),
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code 65");
        std::process::exit(65);
    }

    Ok(())
}

fn parse(filename: &Path) -> Result<()> {
    let source = read_file(filename)?;

    match rox::parse_source(&source) {
        Ok(statements) => {
            let printer = Ast;
            for stmt in &statements {
                println!("{}", printer.print_stmt(stmt));
            }
            Ok(())
        }
        Err(errors) => std::process::exit(report(&errors)),
    }
}

fn run(filename: &Path) -> Result<()> {
    let source = read_file(filename)?;
    let mut interpreter = Interpreter::new(io::stdout());

    match rox::run(&mut interpreter, &source) {
        Ok(()) => {
            info!("Program executed successfully");
            Ok(())
        }
        Err(errors) => std::process::exit(report(&errors)),
    }
}

fn repl() -> Result<()> {
    let mut interpreter = Interpreter::new(io::stdout());
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        if let Err(errors) = rox::run(&mut interpreter, &line) {
            report(&errors);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger(&args.log_file)?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    match &args.commands {
        Commands::Tokenize { filename, json } => tokenize(filename, *json),
        Commands::Parse { filename } => parse(filename),
        Commands::Run { filename } => run(filename),
        Commands::Repl => repl(),
    }
}
