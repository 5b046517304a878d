use std::env;
use std::fs;
use std::process::ExitCode;

use cilktint::{annotate, render_anomalies, Theme, ThemedToken};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid theme: {0}")]
    Theme(#[from] cilktint::ThemeError),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), CliError> {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_help();
        return Ok(());
    };
    let rest: Vec<String> = args.collect();

    match command.as_str() {
        "-h" | "--help" => {
            print_help();
            Ok(())
        }
        "annotate" => cmd_annotate(&rest, true),
        "anomalies" => cmd_annotate(&rest, false),
        other => Err(CliError::UnknownCommand(other.to_string())),
    }
}

fn cmd_annotate(args: &[String], print_tokens: bool) -> Result<(), CliError> {
    let Some(tokens_path) = args.first() else {
        return Err(CliError::MissingArgument("<tokens.json>"));
    };
    let theme = match theme_argument(args) {
        Some(path) => Theme::from_json(&fs::read_to_string(path)?)?,
        None => Theme::empty(),
    };

    let lines: Vec<Vec<ThemedToken>> = serde_json::from_str(&fs::read_to_string(tokens_path)?)?;
    let annotated = annotate(&lines, &theme);

    if print_tokens {
        println!("{}", serde_json::to_string_pretty(&annotated)?);
        if !annotated.anomalies.is_empty() {
            eprintln!("{}", render_anomalies(&annotated.anomalies));
        }
    } else if annotated.anomalies.is_empty() {
        println!("no anomalies");
    } else {
        println!("{}", render_anomalies(&annotated.anomalies));
    }
    Ok(())
}

fn theme_argument(args: &[String]) -> Option<&String> {
    args.iter()
        .position(|arg| arg == "--theme")
        .and_then(|position| args.get(position + 1))
}

fn print_help() {
    println!("cilktint - semantic post-pass highlighter for tokenized Cilk/C/C++");
    println!();
    println!("Usage:");
    println!("  cilktint annotate <tokens.json> [--theme <theme.json>]");
    println!("  cilktint anomalies <tokens.json> [--theme <theme.json>]");
    println!();
    println!("The tokens file holds the tokenizer output: an array of lines, each an");
    println!("array of themed tokens with explanations enabled. The annotated stream");
    println!("is printed to stdout; anomalies are rendered to stderr.");
}
