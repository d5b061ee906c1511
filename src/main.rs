use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use treelox::ast::Stmt;
use treelox::{compile, echo_lone_expression, Lox, Outcome};

const EXIT_USAGE: i32 = 64;
const EXIT_SYNTAX: i32 = 65;
const EXIT_RUNTIME: i32 = 70;
const EXIT_IO: i32 = 74;

/// Tree-walking interpreter for Lox scripts. Starts a prompt when no script
/// is given.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Print each parsed statement before running it.
    #[arg(long)]
    print_ast: bool,

    /// With --print-ast, print expression statements in reverse Polish
    /// notation.
    #[arg(long, requires = "print_ast")]
    rpn: bool,

    script: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    let args = Args::try_parse().unwrap_or_else(|err| {
        let code = if err.use_stderr() { EXIT_USAGE } else { 0 };
        // Nothing sensible is left to do if stderr itself is gone.
        let _ = err.print();
        process::exit(code);
    });

    let code = match &args.script {
        Some(path) => run_file(path, &args),
        None => run_prompt(&args),
    };
    process::exit(code);
}

fn run_file(path: &Path, args: &Args) -> i32 {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Failed to read '{}': {}", path.display(), err);
            return EXIT_IO;
        }
    };

    let mut lox = Lox::new();
    let outcome = run(&mut lox, &source, args, false);
    report(&outcome);

    if !outcome.syntax_errors.is_empty() {
        EXIT_SYNTAX
    } else if outcome.runtime_error.is_some() {
        EXIT_RUNTIME
    } else {
        0
    }
}

fn run_prompt(args: &Args) -> i32 {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("Could not start the prompt: {}", err);
            return EXIT_IO;
        }
    };

    let mut lox = Lox::new();
    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let outcome = run(&mut lox, &line, args, true);
                report(&outcome);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return 0,
            Err(err) => {
                eprintln!("{}", err);
                return EXIT_IO;
            }
        }
    }
}

/// At the prompt (`echo`), a line holding a single expression statement
/// prints its value.
fn run<W: Write>(lox: &mut Lox<W>, source: &str, args: &Args, echo: bool) -> Outcome {
    let (mut stmts, syntax_errors) = compile(source);
    if echo && syntax_errors.is_empty() {
        stmts = echo_lone_expression(stmts);
    }
    if args.print_ast {
        stmts.iter().for_each(|stmt| print_ast(stmt, args.rpn));
    }
    lox.execute(&stmts, syntax_errors)
}

fn print_ast(stmt: &Stmt, rpn: bool) {
    match stmt {
        Stmt::Expression(expr) if rpn => println!("{}", expr.rpn()),
        Stmt::Expression(expr) => println!("{}", expr),
        stmt => print!("{}", stmt.format()),
    }
}

fn report(outcome: &Outcome) {
    outcome.errors().for_each(|err| eprintln!("{}", err));
}
