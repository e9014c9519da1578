mod repl;

use clap::{Parser, Subcommand};
use grebe_lang::check::Checker;
use grebe_lang::types::TypeEnv;
use owo_colors::OwoColorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "grebe", about = "The Grebe programming language", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Type-check a Grebe file and print the program's type
    Check { file: PathBuf },
    /// Format Grebe source files
    Fmt {
        /// Files to format (recursively finds .grebe files in directories)
        files: Vec<PathBuf>,
        /// Check formatting without modifying files (exit 1 if unformatted)
        #[arg(long)]
        check: bool,
    },
    /// Start the REPL
    Repl,
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Check { ref file } => check_file(file),
        Command::Fmt { ref files, check } => fmt_files(files, check),
        Command::Repl => repl::run_repl(),
    }
}

fn read_source(path: &PathBuf) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{} reading {}: {e}", "error".red().bold(), path.display());
            std::process::exit(1);
        }
    }
}

fn check_file(path: &PathBuf) {
    let source = read_source(path);
    let filename = path.to_string_lossy().to_string();

    let forms = match grebe_lang::parser::parse(&source) {
        Ok(forms) => forms,
        Err(e) => {
            grebe_lang::errors::report_parse_error(&filename, &source, &e);
            std::process::exit(1);
        }
    };

    let mut checker = Checker::new();
    match checker.infer_program(&forms, &TypeEnv::empty()) {
        Ok(ty) => {
            println!("{} {}", "OK".green().bold(), checker.resolve(&ty));
        }
        Err(e) => {
            grebe_lang::errors::report_type_error(&filename, &source, &e);
            std::process::exit(1);
        }
    }
}

fn fmt_files(files: &[PathBuf], check: bool) {
    let paths = if files.is_empty() {
        collect_grebe_files(&PathBuf::from("."))
    } else {
        let mut all = Vec::new();
        for f in files {
            if f.is_dir() {
                all.extend(collect_grebe_files(f));
            } else {
                all.push(f.clone());
            }
        }
        all
    };

    if paths.is_empty() {
        println!("No .grebe files found");
        return;
    }

    let mut changed_count = 0;
    let mut error_count = 0;

    for path in &paths {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{} reading {}: {e}", "error".red().bold(), path.display());
                error_count += 1;
                continue;
            }
        };

        let data = match grebe_lang::parser::read_program(&source) {
            Ok(data) => data,
            Err(e) => {
                eprintln!(
                    "{} parsing {}: {}",
                    "error".red().bold(),
                    path.display(),
                    e.message
                );
                error_count += 1;
                continue;
            }
        };

        let formatted = grebe_lang::fmt::format_program(&data);

        if formatted != source {
            changed_count += 1;
            if check {
                println!("  {} {}", "would format".yellow().bold(), path.display());
            } else {
                if let Err(e) = std::fs::write(path, &formatted) {
                    eprintln!("{} writing {}: {e}", "error".red().bold(), path.display());
                    error_count += 1;
                    continue;
                }
                println!("  {} {}", "formatted".green().bold(), path.display());
            }
        }
    }

    if check {
        if changed_count > 0 {
            println!(
                "\n{} file(s) would be reformatted",
                changed_count.to_string().yellow().bold()
            );
            std::process::exit(1);
        } else if error_count == 0 {
            println!("{}", "All files already formatted".green().bold());
        }
    } else if changed_count == 0 && error_count == 0 {
        println!("{}", "All files already formatted".green().bold());
    } else if changed_count > 0 {
        println!("\n{} file(s) formatted", changed_count);
    }

    if error_count > 0 {
        std::process::exit(1);
    }
}

fn collect_grebe_files(dir: &PathBuf) -> Vec<PathBuf> {
    let mut result = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return result,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            // Skip hidden directories and target/
            let name = path.file_name().unwrap_or_default().to_string_lossy();
            if !name.starts_with('.') && name != "target" {
                result.extend(collect_grebe_files(&path));
            }
        } else if path.extension().is_some_and(|e| e == "grebe") {
            result.push(path);
        }
    }
    result.sort();
    result
}
