//! Interactive REPL.
//!
//! Each line is parsed with the same subcommands as the one-shot CLI, so
//! `union <id> <id>` or `save '{"alphabet": ...}' -d note` work as typed.

use crate::commands;
use crate::Commands;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use rgxr_client::Client;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};

/// One REPL line.
#[derive(Parser, Debug)]
#[command(name = "rgxr>", no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: Commands,
}

pub async fn run(client: Client) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "rgxr CLI".bold().cyan());
    println!("Service: {}", client.base_url());
    if client.is_authenticated() {
        println!("{}", "Using stored token".dimmed());
    } else {
        println!(
            "{}",
            "Not logged in. Use 'login -e <email> -p <password>'.".dimmed()
        );
    }

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    let history_path = home::home_dir()
        .map(|h| h.join(".rgxr_history"))
        .unwrap_or_else(|| ".rgxr_history".into());
    let _ = rl.load_history(&history_path);

    println!("Type 'help' for available commands.\n");

    loop {
        let prompt = format!("{} ", "rgxr>".cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match execute_repl_line(&client, line).await {
                    Ok(Some(output)) => println!("{}\n", output),
                    Ok(None) => break,
                    Err(e) => println!("{}: {}\n", "Error".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);

    Ok(())
}

/// Runs one line. `Ok(None)` ends the session.
async fn execute_repl_line(
    client: &Client,
    line: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let words = split_words(line)?;
    let Some(first) = words.first() else {
        return Ok(Some(String::new()));
    };

    match first.to_lowercase().as_str() {
        "help" | "?" => return Ok(Some(Line::command().render_help().to_string())),
        "quit" | "exit" | "q" => return Ok(None),
        _ => {}
    }

    match parse_line(&words) {
        Ok(Commands::Repl) => Ok(Some("Already in the REPL".yellow().to_string())),
        Ok(cmd) => commands::execute(client, cmd).await.map(Some),
        Err(e) => Ok(Some(e.render().to_string())),
    }
}

fn parse_line(words: &[String]) -> Result<Commands, clap::Error> {
    Line::try_parse_from(words).map(|line| line.command)
}

/// Splits a line into words.
///
/// Quotes group words; inside single quotes a double quote is literal and
/// the other way round. There are no escapes.
fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated {} quote", q));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        split_words(line).unwrap()
    }

    #[test]
    fn test_split_plain_words() {
        assert_eq!(words("union  a   b"), vec!["union", "a", "b"]);
        assert!(words("   ").is_empty());
    }

    #[test]
    fn test_split_quoted_json() {
        let parts = words(r#"save '{"alphabet": ["a"]}' -d "ends in a""#);
        assert_eq!(
            parts,
            vec!["save", r#"{"alphabet": ["a"]}"#, "-d", "ends in a"]
        );
    }

    #[test]
    fn test_split_empty_quotes_keep_a_word() {
        assert_eq!(words("run fa-1 ''"), vec!["run", "fa-1", ""]);
    }

    #[test]
    fn test_split_unterminated_quote() {
        assert!(split_words("save '{").is_err());
    }

    #[test]
    fn test_parse_line_uses_cli_subcommands() {
        match parse_line(&words("concat second first")).unwrap() {
            Commands::Concat { ids } => assert_eq!(ids, vec!["second", "first"]),
            other => panic!("unexpected command: {:?}", other),
        }

        match parse_line(&words("run fa-1")).unwrap() {
            Commands::Run { id, input } => {
                assert_eq!(id, "fa-1");
                assert_eq!(input, "");
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(parse_line(&words("union")).is_err());
        assert!(parse_line(&words("frobnicate")).is_err());
    }
}
