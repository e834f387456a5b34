//! Command execution.

use crate::{Commands, SourceArgs};
use colored::Colorize;
use rgxr_client::{Client, Fa, FaRecord, RenderResult, RunResult, Transition};
use rgxr_protocol::FaSource;
use serde_json::Value;
use std::path::Path;

/// Executes a command and returns the formatted output.
pub async fn execute(client: &Client, cmd: Commands) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        // The REPL is started from main.rs
        Commands::Repl => unreachable!(),

        Commands::Live => {
            client.live().await?;
            Ok("LIVE".green().to_string())
        }

        Commands::Login { email, password } => {
            client.login(&email, &password).await?;
            Ok(format!("{} as {}", "Logged in".green(), email.cyan()))
        }

        Commands::Convert { source } => {
            let result = match source_arg(source)? {
                FaSource::Fa(fa) => client.convert_fa(&fa).await?,
                FaSource::Uuid(id) => client.convert_by_uuid(&id).await?,
            };
            Ok(format_render("Converted", &result))
        }

        Commands::Render { source } => {
            let result = match source_arg(source)? {
                FaSource::Fa(fa) => client.render_fa(&fa).await?,
                FaSource::Uuid(id) => client.render_by_uuid(&id).await?,
            };
            Ok(format_render("Rendered", &result))
        }

        Commands::Union { ids } => Ok(format_fa(&client.union(ids).await?)),

        Commands::Concat { ids } => Ok(format_fa(&client.concatenation(ids).await?)),

        Commands::Intersection { ids } => Ok(format_fa(&client.intersection(ids).await?)),

        Commands::Complement { id } => Ok(format_fa(&client.complement(&id).await?)),

        Commands::Minimize { id } => Ok(format_fa(&client.minimize_dfa(&id).await?)),

        Commands::RegexToNfa { regex } => Ok(format_fa(&client.regex_to_nfa(&regex).await?)),

        Commands::NfaToDfa { id } => Ok(format_fa(&client.nfa_to_dfa(&id).await?)),

        Commands::FaToRegex { id } => {
            let regex = client.fa_to_regex(&id).await?;
            Ok(regex)
        }

        Commands::Run { id, input } => {
            let result = client.run_string(&id, &input).await?;
            Ok(format_run(&result, &input))
        }

        Commands::Tex { render_id, output } => {
            let tex = client.get_tex(&render_id).await?;
            write_or_return(tex, output.as_deref())
        }

        Commands::Svg { render_id, output } => {
            let svg = client.get_svg(&render_id).await?;
            write_or_return(svg, output.as_deref())
        }

        Commands::List => {
            let records = client.list_fas().await?;
            if records.is_empty() {
                return Ok("No automata stored".yellow().to_string());
            }

            let mut output = String::new();
            for record in &records {
                output.push_str(&format!(
                    "  {}  {}  {}\n",
                    record.id.cyan(),
                    format_created(record).dimmed(),
                    record.description.as_deref().unwrap_or("-")
                ));
            }
            Ok(output)
        }

        Commands::Get { id } => {
            let record = client.get_fa(&id).await?;
            Ok(format_record(&record))
        }

        Commands::Save { fa, description } => {
            let fa = parse_fa_arg(&fa)?;
            let record = client.save_fa(&fa, description.as_deref()).await?;
            Ok(format!(
                "{} automaton {}\n  Render: {}",
                "Saved".green(),
                record.id.cyan(),
                record.render
            ))
        }

        Commands::Update {
            id,
            fa,
            description,
        } => {
            let fa = parse_fa_arg(&fa)?;
            match client.update_fa(&id, &fa, description.as_deref()).await? {
                Some(record) => Ok(format!(
                    "{} automaton {}\n  Render: {}",
                    "Updated".green(),
                    record.id.cyan(),
                    record.render
                )),
                None => Ok(format!(
                    "{}: automaton {} not found",
                    "Warning".yellow(),
                    id
                )),
            }
        }

        Commands::Delete { id } => {
            client.delete_fa(&id).await?;
            Ok(format!("{} automaton {}", "Deleted".green(), id.cyan()))
        }
    }
}

/// Resolves the automaton named on the command line.
fn source_arg(source: SourceArgs) -> Result<FaSource, Box<dyn std::error::Error>> {
    match (source.fa, source.id) {
        (Some(fa), _) => Ok(FaSource::Fa(parse_fa_arg(&fa)?)),
        (None, Some(id)) => Ok(FaSource::Uuid(id)),
        (None, None) => Err("an automaton or --id is required".into()),
    }
}

/// Parses a JSON argument (either inline JSON or @file.json).
fn parse_json_arg(arg: &str) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = arg.strip_prefix('@') {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(arg)?)
    }
}

fn parse_fa_arg(arg: &str) -> Result<Fa, Box<dyn std::error::Error>> {
    Ok(serde_json::from_value(parse_json_arg(arg)?)?)
}

fn write_or_return(
    content: String,
    output: Option<&Path>,
) -> Result<String, Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            std::fs::write(path, &content)?;
            Ok(format!(
                "{} {} bytes to {}",
                "Wrote".green(),
                content.len(),
                path.display()
            ))
        }
        None => Ok(content),
    }
}

fn format_render(verb: &str, result: &RenderResult) -> String {
    format!(
        "{} {}\n  SVG: {} bytes\n  TeX: {} bytes\n\n{}",
        verb.green(),
        result.id.cyan(),
        result.svg.len(),
        result.tex.len(),
        result.dot
    )
}

fn format_created(record: &FaRecord) -> String {
    match record.created_at_utc() {
        Some(ts) => ts.format("%Y-%m-%d %H:%M").to_string(),
        None => record.created_at.clone(),
    }
}

fn format_record(record: &FaRecord) -> String {
    format!(
        "{}\n  Description: {}\n  Created: {}\n  Render: {}\n\n{}",
        format!("Automaton {}", record.id.cyan()).bold(),
        record.description.as_deref().unwrap_or("-"),
        format_created(record),
        record.render,
        format_fa(&record.tuple)
    )
}

fn format_cell(cell: &Transition) -> String {
    match cell.targets().as_slice() {
        [] => "-".to_string(),
        [single] => single.to_string(),
        many => format!("{{{}}}", many.join(",")),
    }
}

/// Formats an automaton as a header plus a transition table.
///
/// Rows are states, marked `->` when initial and `*` when accepting.
fn format_fa(fa: &Fa) -> String {
    let mut output = format!(
        "{}: {}\n{}: {}\n{}: {}\n{}: {}\n\n",
        "Alphabet".dimmed(),
        fa.alphabet.join(", "),
        "States".dimmed(),
        fa.states.join(", "),
        "Initial".dimmed(),
        fa.initial,
        "Accepting".dimmed(),
        fa.acceptance.join(", ")
    );

    let cells: Vec<Vec<String>> = (0..fa.states.len())
        .map(|row| {
            (0..fa.alphabet.len())
                .map(|col| {
                    fa.transitions
                        .get(row)
                        .and_then(|cells| cells.get(col))
                        .map(format_cell)
                        .unwrap_or_else(|| "-".to_string())
                })
                .collect()
        })
        .collect();

    let state_width = fa
        .states
        .iter()
        .map(|s| s.chars().count())
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = fa
        .alphabet
        .iter()
        .enumerate()
        .map(|(col, symbol)| {
            cells
                .iter()
                .map(|row| row[col].chars().count())
                .chain(std::iter::once(symbol.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    output.push_str(&format!("     {:state_width$}", ""));
    for (symbol, width) in fa.alphabet.iter().zip(&widths) {
        output.push_str(&format!("  {:width$}", symbol));
    }
    output.push('\n');

    for (state, row) in fa.states.iter().zip(&cells) {
        let initial = if *state == fa.initial { "->" } else { "  " };
        let accepting = if fa.acceptance.contains(state) { "*" } else { " " };
        output.push_str(&format!("{}{}  {:state_width$}", initial, accepting, state));
        for (cell, width) in row.iter().zip(&widths) {
            output.push_str(&format!("  {:width$}", cell));
        }
        output.push('\n');
    }

    output.trim_end().to_string()
}

/// Formats a run trace as `s0 -a-> s1 -b-> s2`.
fn format_run(result: &RunResult, input: &str) -> String {
    let verdict = if result.accepted {
        "Accepted".green()
    } else {
        "Rejected".red()
    };

    let symbols: Vec<char> = input.chars().collect();
    let mut trace = String::new();
    for (i, step) in result.steps().iter().enumerate() {
        if i > 0 {
            match symbols.get(i - 1) {
                Some(symbol) => trace.push_str(&format!(" -{}-> ", symbol)),
                None => trace.push_str(" --> "),
            }
        }
        match step.as_slice() {
            [] => trace.push_str(rgxr_protocol::DEAD_STATE),
            [single] => trace.push_str(single),
            many => trace.push_str(&format!("{{{}}}", many.join(","))),
        }
    }

    if result.died() {
        format!("{}\n  {}\n  {}", verdict, trace, "No state left active".dimmed())
    } else {
        format!("{}\n  {}", verdict, trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgxr_client::ClientConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fa_json() -> Value {
        json!({
            "alphabet": ["a", "b"],
            "states": ["s0", "s1"],
            "initial": "s0",
            "acceptance": ["s1"],
            "transitions": [["s0", "s1"], [["s0", "s1"], "@v"]]
        })
    }

    #[test]
    fn test_parse_fa_arg_inline_and_file() {
        let inline = parse_fa_arg(&fa_json().to_string()).unwrap();
        assert_eq!(inline.states, vec!["s0", "s1"]);

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("fa.json");
        std::fs::write(&file, fa_json().to_string()).unwrap();
        let from_file = parse_fa_arg(&format!("@{}", file.display())).unwrap();
        assert_eq!(from_file, inline);
    }

    #[test]
    fn test_parse_fa_arg_rejects_non_automaton() {
        assert!(parse_fa_arg(r#"{"states": []}"#).is_err());
        assert!(parse_fa_arg("@/nonexistent/fa.json").is_err());
    }

    #[test]
    fn test_source_arg_resolves_fa_or_id() {
        let source = SourceArgs {
            fa: None,
            id: Some("fa-1".into()),
        };
        assert_eq!(source_arg(source).unwrap(), FaSource::Uuid("fa-1".into()));

        let source = SourceArgs {
            fa: Some(fa_json().to_string()),
            id: None,
        };
        assert!(matches!(source_arg(source).unwrap(), FaSource::Fa(_)));
    }

    #[test]
    fn test_format_fa_table() {
        let fa: Fa = serde_json::from_value(fa_json()).unwrap();
        let table = format_fa(&fa);

        assert!(table.contains("->   s0  s0       s1"));
        assert!(table.contains("  *  s1  {s0,s1}  -"));
    }

    #[test]
    fn test_format_run_trace() {
        let run = RunResult {
            accepted: true,
            path: vec!["s0".into(), "s0".into(), "s1".into()],
        };
        assert!(format_run(&run, "ab").contains("s0 -a-> s0 -b-> s1"));

        let run = RunResult {
            accepted: false,
            path: vec!["q0".into(), "q0,q1".into(), "∅".into()],
        };
        let out = format_run(&run, "ab");
        assert!(out.contains("q0 -a-> {q0,q1} -b-> ∅"));
        assert!(out.contains("No state left active"));
    }

    #[tokio::test]
    async fn test_execute_live() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/live"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = Client::new(ClientConfig::new(server.uri())).unwrap();
        let out = execute(&client, Commands::Live).await.unwrap();
        assert!(out.contains("LIVE"));
    }

    #[tokio::test]
    async fn test_execute_list_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pgapi/finite_automatas"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = Client::new(ClientConfig::new(server.uri())).unwrap();
        let out = execute(&client, Commands::List).await.unwrap();
        assert!(out.contains("No automata stored"));
    }

    #[tokio::test]
    async fn test_execute_save_reports_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/render"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "r-1", "svg": "<svg/>", "tex": "", "dot": ""
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/pgapi/finite_automatas"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
                "id": "fa-new",
                "tuple": fa_json(),
                "render": "r-1",
                "created_at": "2025-03-01T10:20:30Z"
            }])))
            .mount(&server)
            .await;

        let client = Client::new(ClientConfig::new(server.uri())).unwrap();
        let out = execute(
            &client,
            Commands::Save {
                fa: fa_json().to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
        assert!(out.contains("fa-new"));
        assert!(out.contains("Render: r-1"));
    }

    #[tokio::test]
    async fn test_execute_tex_to_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tex/r-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("\\node{};"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.tex");
        let client = Client::new(ClientConfig::new(server.uri())).unwrap();
        execute(
            &client,
            Commands::Tex {
                render_id: "r-1".into(),
                output: Some(file.clone()),
            },
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read_to_string(file).unwrap(), "\\node{};");
    }
}
