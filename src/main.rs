use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use loxwalk::ast_printer::AstPrinter;
use loxwalk::error::{LoxError, StderrReporter};
use loxwalk::parser::Parser;
use loxwalk::scanner::Scanner;
use loxwalk::session::{normalize_input, Session, SessionOptions};
use loxwalk::value::Value;

/// Exit code for lexical or syntax errors.
const EXIT_DATA_ERR: i32 = 65;

/// Exit code for runtime errors.
const EXIT_SOFTWARE: i32 = 70;

/// Exit code for a source file that cannot be read.
const EXIT_IOERR: i32 = 74;

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter for a small scripting language", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,

    /// Print the token list before running each input
    #[arg(long, global = true)]
    show_tokens: bool,

    /// Print the syntax tree before running each input
    #[arg(long, global = true)]
    show_ast: bool,

    /// Echo each input before running it
    #[arg(long, global = true)]
    show_source: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs a source file as a program
    Run { filename: PathBuf },

    /// Starts an interactive session (the default)
    Repl,

    /// Tokenizes a source file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print tokens as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Parses a source file and prints its syntax tree
    Parse {
        filename: PathBuf,

        /// Print the statement list as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Reads a UTF‑8 source file through a memory map.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    // SAFETY: the map is read once and copied out before the function
    // returns; nothing else in this process writes the file.
    let mmap = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    let source = std::str::from_utf8(&mmap)
        .map_err(LoxError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?
        .to_owned();

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

/// Like [`read_file`], but an unreadable file ends the process with
/// [`EXIT_IOERR`].
fn load_source(filename: &Path) -> String {
    match read_file(filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(EXIT_IOERR);
        }
    }
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("loxwalk::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "{} [{}:{}] - {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // overridden by RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn run_file(filename: &Path, options: SessionOptions) -> Result<()> {
    let source = load_source(filename);

    let mut session = Session::new(io::stdout(), options);
    let mut reporter = StderrReporter::new();

    match session.run(&source, &mut reporter) {
        Ok(value) => {
            info!("Program finished with {}", value);
            Ok(())
        }

        Err(LoxError::Aborted { phase, .. }) => {
            debug!(
                "{} {} error(s) reported, exiting",
                reporter.reported(),
                phase
            );
            std::process::exit(EXIT_DATA_ERR);
        }

        Err(e @ LoxError::Runtime { .. }) => {
            eprintln!("{}", e);
            std::process::exit(EXIT_SOFTWARE);
        }

        Err(e) => Err(e.into()),
    }
}

fn run_prompt(options: SessionOptions) -> Result<()> {
    let mut session = Session::new(io::stdout(), options);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Error reading input")?;
        let trimmed = line.trim();

        if trimmed == "exit" {
            break;
        }

        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with("\\set") {
            if let Err(msg) = session.options.apply_set_command(trimmed) {
                println!("{}", msg);
            }
            continue;
        }

        if trimmed == "\\env" {
            for (name, value) in session.interpreter().environment().globals() {
                println!("{} = {}", name, value.repr());
            }
            continue;
        }

        let mut reporter = StderrReporter::new();

        match session.run(&normalize_input(trimmed), &mut reporter) {
            Ok(Value::Nil) => {}
            Ok(value) => println!("{}", value.repr()),
            Err(LoxError::Aborted { .. }) => {}
            Err(e) => eprintln!("{}", e),
        }
    }

    info!("Interactive session ended");
    Ok(())
}

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    let source = load_source(filename);
    let mut tokenized = true;

    for item in Scanner::new(&source) {
        match item {
            Ok(token) if json => println!("{}", serde_json::to_string(&token)?),
            Ok(token) => println!("{}", token),
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_DATA_ERR);
        std::process::exit(EXIT_DATA_ERR);
    }

    Ok(())
}

fn parse(filename: &Path, json: bool) -> Result<()> {
    let source = load_source(filename);
    let mut reporter = StderrReporter::new();

    let parsed = Scanner::new(&source)
        .scan_tokens(&mut reporter)
        .and_then(|tokens| Parser::new(tokens, &mut reporter).parse());

    let statements = match parsed {
        Ok(statements) => statements,
        Err(LoxError::Aborted { .. }) => std::process::exit(EXIT_DATA_ERR),
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&statements)?);
    } else {
        for tree in AstPrinter::new().print(&statements) {
            println!("{}", tree);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let options = SessionOptions {
        show_tokens: args.show_tokens,
        show_ast: args.show_ast,
        show_source: args.show_source,
    };

    match args.commands {
        Some(Commands::Run { filename }) => run_file(&filename, options),
        Some(Commands::Repl) | None => run_prompt(options),
        Some(Commands::Tokenize { filename, json }) => tokenize(&filename, json),
        Some(Commands::Parse { filename, json }) => parse(&filename, json),
    }
}
