use grebe_lang::check::Checker;
use grebe_lang::parser::parse;
use grebe_lang::types::TypeEnv;
use owo_colors::OwoColorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

/// Type-checking REPL: each entry is checked under the running
/// environment, defines extend it for later entries, and the type of every
/// other form is printed. Nothing is evaluated.
pub fn run_repl() {
    let mut rl = DefaultEditor::new().expect("failed to create editor");
    let mut checker = Checker::new();
    let mut env = TypeEnv::empty();

    // Load history file
    let history_path = state_dir().join("repl-history");
    let _ = rl.load_history(&history_path);

    println!("Grebe v0.1.0 REPL — type an expression or :help");

    loop {
        match rl.readline("grebe> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                match trimmed {
                    ":help" | ":h" => {
                        println!("  :help — show this help");
                        println!("  :quit — exit the REPL");
                        println!("  a define extends the environment; anything else prints its type");
                        continue;
                    }
                    ":quit" | ":q" => break,
                    _ => {}
                }

                match parse(trimmed) {
                    Ok(forms) => {
                        for form in &forms {
                            match checker.infer_form(form, &env) {
                                Ok((next, result)) => {
                                    env = next;
                                    if let Some(ty) = result {
                                        println!("{}", checker.resolve(&ty).to_string().green());
                                    }
                                }
                                Err(e) => {
                                    eprintln!(
                                        "  {} {}",
                                        format!("[{}]", e.code).red(),
                                        e.message
                                    );
                                    break;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        eprintln!("  {} {}", "parse error:".red(), e.message);
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

    // Save history
    let _ = std::fs::create_dir_all(state_dir());
    let _ = rl.save_history(&history_path);
    println!("goodbye!");
}

fn state_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".grebe")
}
