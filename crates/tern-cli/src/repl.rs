use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::process::ExitCode;

use tern_lang::elab::{CodeDesc, Elaborator};
use tern_lang::errors::report_diagnostic;
use tern_lang::parser::parse;

pub fn run_repl() -> ExitCode {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("failed to start line editor: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut elab = Elaborator::new();

    let history_path = state_dir().join("history");
    let _ = rl.load_history(&history_path);

    println!("Tern v0.1.0 — type a form, or :help");

    loop {
        match rl.readline("tern> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                match trimmed {
                    ":help" | ":h" => {
                        println!("  :help — show this help");
                        println!("  :quit — exit the session");
                        println!("  anything else is read as top-level forms and type-checked");
                        continue;
                    }
                    ":quit" | ":q" => break,
                    _ => {}
                }

                let forms = match parse(trimmed) {
                    Ok(forms) => forms,
                    Err(e) => {
                        report_diagnostic("<repl>", trimmed, &e.into());
                        continue;
                    }
                };
                for form in &forms {
                    match elab.elaborate(form) {
                        Ok(results) => {
                            for result in results {
                                for warning in &result.warnings {
                                    report_diagnostic("<repl>", trimmed, &warning.to_diagnostic());
                                }
                                match &result.code {
                                    CodeDesc::Nothing => {}
                                    CodeDesc::Define { name, ty, .. }
                                    | CodeDesc::Assign { name, ty, .. } => {
                                        println!("{name} : {}", elab.show_type(ty));
                                    }
                                    CodeDesc::DefineType { tycon, .. } => {
                                        println!("type {tycon}");
                                    }
                                    CodeDesc::Eval { ty, .. } => {
                                        println!("- : {}", elab.show_type(ty));
                                    }
                                }
                            }
                        }
                        Err(e) => {
                            // the session survives a failed form
                            report_diagnostic("<repl>", trimmed, &e.into());
                            break;
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("error: {e}");
                break;
            }
        }
    }

    let _ = std::fs::create_dir_all(state_dir());
    let _ = rl.save_history(&history_path);
    println!("goodbye!");
    ExitCode::SUCCESS
}

fn state_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tern")
}
