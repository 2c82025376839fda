use super::commands::{AppContext, dispatch};
use super::print::print_error;
use super::setup::{Cli, Commands};
use clap::Parser;
use colored::Colorize;
use iconsmith::error::{IconError, Result};
use std::io::{self, BufRead, Write};

const PROMPT: &str = "icon> ";
const USAGE: &str = "Commands: generate <desc>, edit <change>, list, set-key <key>, quit";

#[derive(Debug, PartialEq, Eq)]
enum Line {
    Empty,
    Quit,
    Command(Commands),
}

/// Each line goes through the same parser as the command line, so flags
/// like `--variants` and `--on` work here too. Wrap a phrase in double quotes
/// to keep it one word, or put `--` before a description that contains
/// dashes.
fn parse_line(line: &str) -> std::result::Result<Line, clap::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Line::Empty);
    }
    if matches!(line, "quit" | "exit" | "q") {
        return Ok(Line::Quit);
    }

    let words = split_words(line).ok_or_else(|| {
        clap::Error::raw(
            clap::error::ErrorKind::InvalidValue,
            "unterminated quote in input\n",
        )
    })?;
    let cli = Cli::try_parse_from(std::iter::once("iconsmith".to_string()).chain(words))?;
    Ok(cli.command.map_or(Line::Empty, Line::Command))
}

/// Whitespace-separated words. Double quotes group a phrase; apostrophes are
/// ordinary characters. `None` when a quote is left open.
fn split_words(line: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quoted {
        return None;
    }
    if in_word {
        words.push(current);
    }
    Some(words)
}

/// Failures inside the session are reported and the session goes on.
pub(super) async fn run(ctx: &AppContext) -> Result<bool> {
    println!("{}", "iconsmith interactive mode".bold());
    println!("{}", USAGE.dimmed());
    println!();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        print!("{PROMPT}");
        io::stdout().flush().map_err(IconError::Io)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(IconError::Io)? == 0 {
            println!();
            break;
        }

        match parse_line(&line) {
            Ok(Line::Empty) => {}
            Ok(Line::Quit) => break,
            Ok(Line::Command(command)) => {
                if let Err(e) = dispatch(ctx, command).await {
                    print_error(&e);
                }
            }
            Err(e) => {
                let _ = e.print();
                if !matches!(
                    e.kind(),
                    clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
                ) {
                    println!("{}", USAGE.dimmed());
                }
            }
        }
    }
    Ok(true)
}
