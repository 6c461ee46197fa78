mod repl;

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;

use tern_lang::elab::{CodeDesc, Elaborator};
use tern_lang::errors::codes::ErrorCode;
use tern_lang::errors::report_diagnostic;
use tern_lang::parser;

#[derive(Parser)]
#[command(name = "tern", about = "The Tern typed sublanguage front-end", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Type-check a file and print the type of every definition
    Check { file: PathBuf },
    /// Start an interactive type-checking session
    Repl,
    /// Explain an error code
    Explain { code: String },
}

fn main() -> ExitCode {
    match Cli::parse().command {
        Command::Check { file } => check_file(&file),
        Command::Repl => repl::run_repl(),
        Command::Explain { code } => explain(&code),
    }
}

fn check_file(path: &PathBuf) -> ExitCode {
    let filename = path.display().to_string();
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: cannot read {filename}: {e}", "error".red().bold());
            return ExitCode::FAILURE;
        }
    };

    let forms = match parser::parse(&source) {
        Ok(forms) => forms,
        Err(e) => {
            report_diagnostic(&filename, &source, &e.into());
            return ExitCode::FAILURE;
        }
    };

    let mut elab = Elaborator::new();
    for form in &forms {
        match elab.elaborate(form) {
            Ok(results) => {
                for result in results {
                    for warning in &result.warnings {
                        report_diagnostic(&filename, &source, &warning.to_diagnostic());
                    }
                    print_descriptor(&mut elab, &result.code);
                }
            }
            Err(e) => {
                report_diagnostic(&filename, &source, &e.into());
                return ExitCode::FAILURE;
            }
        }
    }

    println!("{}", "ok".green().bold());
    ExitCode::SUCCESS
}

fn print_descriptor(elab: &mut Elaborator, code: &CodeDesc) {
    match code {
        CodeDesc::Nothing => {}
        CodeDesc::Define { name, ty, .. } | CodeDesc::Assign { name, ty, .. } => {
            println!("{} : {}", name.green(), elab.show_type(ty));
        }
        CodeDesc::DefineType { tycon, ctors } => {
            println!("{} {}", "type".blue(), tycon.green());
            for ctor in ctors {
                println!("  {} : {}", ctor.name.green(), elab.show_type(&ctor.ty));
            }
        }
        CodeDesc::Eval { ty, .. } => {
            println!("- : {}", elab.show_type(ty));
        }
    }
}

fn explain(code: &str) -> ExitCode {
    match ErrorCode::parse(code) {
        Some(c) => {
            let severity = if c.is_warning() { "warning" } else { "error" };
            println!(
                "{}: {} ({} {})",
                c.as_str().bold(),
                c.title(),
                c.category(),
                severity
            );
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("unknown error code: {code}");
            ExitCode::FAILURE
        }
    }
}
