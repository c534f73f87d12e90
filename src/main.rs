use std::io::Write;

use clap::{Args, Parser, Subcommand};

use rill::{
    interpreter::{Interpreter, ScopeMode, Value},
    parser, position, tokenizer,
};

#[derive(Debug, Parser)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Repl)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    Run(RunArgs),
    Repl,
}

#[derive(Debug, Args)]
struct RunArgs {
    file: String,
    /// Give every block its own scope instead of the default flat environment
    #[arg(long)]
    lexical_scope: bool,
    /// Print the final variable bindings after the program finishes
    #[arg(long)]
    show_env: bool,
}

fn main() {
    let args = Cli::parse();

    match args.command() {
        Command::Repl => {
            repl_command();
        }
        Command::Run(args) => {
            run_command(args);
        }
    }
}

fn repl_command() {
    println!("Welcome to the rill REPL!");
    println!("EOF to exit. (Ctrl+D on *nix, Ctrl+Z on Windows)");

    let mut interpreter = Interpreter::new();

    loop {
        let mut input = String::new();

        print!("> ");
        std::io::stdout()
            .flush()
            .expect("should be able to flush stdout");

        let read = std::io::stdin()
            .read_line(&mut input)
            .expect("should be able to read line from stdin");

        if read == 0 {
            break;
        }

        let source = input.trim();
        match run_source(&mut interpreter, source) {
            Ok(values) => {
                for value in values {
                    println!("{}", value);
                }
            }
            Err(e) => {
                println!("Error: {}", report(source, &e));
            }
        }

        input.clear()
    }
}

fn run_command(args: &RunArgs) {
    let source = std::fs::read_to_string(&args.file).expect("should be able to read source file");

    let mode = if args.lexical_scope {
        ScopeMode::Lexical
    } else {
        ScopeMode::Flat
    };
    let mut interpreter = Interpreter::with_scope_mode(mode);

    match run_source(&mut interpreter, &source) {
        Ok(values) => {
            for value in values {
                println!("{}", value);
            }
        }
        Err(e) => {
            println!("Error: {}", report(&source, &e));
            std::process::exit(1);
        }
    }

    if args.show_env {
        let mut bindings: Vec<_> = interpreter.environment().iter().collect();
        bindings.sort_by_key(|(name, _)| name.to_string());
        for (name, value) in bindings {
            println!("{} = {}", name, value);
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum InterpretError {
    #[error(transparent)]
    Tokenize(#[from] tokenizer::LexError),
    #[error(transparent)]
    Parse(#[from] parser::ParseError),
    #[error(transparent)]
    Runtime(#[from] rill::interpreter::RuntimeError),
}

fn run_source(interpreter: &mut Interpreter, source: &str) -> Result<Vec<Value>, InterpretError> {
    let tokens = tokenizer::tokenize(source)?;
    let program = parser::program(&tokens)?;
    Ok(interpreter.run(&program)?)
}

fn report(source: &str, error: &InterpretError) -> String {
    let offset = match error {
        InterpretError::Tokenize(e) => Some(e.offset()),
        InterpretError::Parse(e) => e.offset(),
        InterpretError::Runtime(_) => None,
    };

    match offset {
        Some(offset) => {
            let (line, column) = position::line_col(source, offset);
            format!("line {}, column {}: {}", line, column, error)
        }
        None => error.to_string(),
    }
}
