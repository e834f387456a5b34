//! rgxr - Command-line interface for rgxr
//!
//! Provides both a REPL and one-shot command execution.

mod commands;
mod repl;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rgxr_client::{Client, ClientConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Token file used when none is configured, relative to the home directory.
const DEFAULT_TOKEN_FILE: &str = ".rgxr/credentials.json";

#[derive(Parser)]
#[command(name = "rgxr")]
#[command(about = "Command-line interface for the rgxr automaton services")]
#[command(version)]
struct Cli {
    /// Service base URL
    #[arg(short = 'u', long, env = "RGXR_BASE_URL")]
    base_url: Option<String>,

    /// YAML configuration file
    #[arg(short, long, env = "RGXR_CONFIG")]
    config: Option<PathBuf>,

    /// Authentication token
    #[arg(short = 't', long, env = "RGXR_TOKEN")]
    token: Option<String>,

    /// File the login token is persisted to
    #[arg(long, env = "RGXR_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    /// Keep the login token in memory only
    #[arg(long, conflicts_with = "token_file")]
    no_token_file: bool,

    // ===== TLS Options =====
    /// Path to CA certificate for server verification
    #[arg(long, env = "RGXR_TLS_CA_CERT")]
    ca_cert: Option<PathBuf>,

    /// Path to client certificate (for mTLS)
    #[arg(long, env = "RGXR_TLS_CLIENT_CERT")]
    client_cert: Option<PathBuf>,

    /// Path to client private key (for mTLS)
    #[arg(long, env = "RGXR_TLS_CLIENT_KEY")]
    client_key: Option<PathBuf>,

    /// Skip server certificate verification (INSECURE)
    #[arg(long, short = 'k', env = "RGXR_TLS_INSECURE")]
    insecure: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// An automaton given inline, from a file, or by the id of a stored one.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Automaton JSON (or @file.json to read from file)
    fa: Option<String>,

    /// Id of a stored automaton
    #[arg(long)]
    id: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start interactive REPL
    Repl,

    /// Check that the conversion service is up
    Live,

    /// Log in and keep the issued token
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "RGXR_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Convert an automaton to SVG, TeX and DOT
    Convert {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Render an automaton and keep the artifact on the server
    Render {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Union of stored automata
    Union {
        /// Ids of the stored automata
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Concatenation of stored automata, in the order given
    Concat {
        /// Ids of the stored automata
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Intersection of stored automata
    Intersection {
        /// Ids of the stored automata
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Complement of a stored automaton
    Complement {
        /// Stored automaton id
        id: String,
    },

    /// Minimize a stored DFA
    Minimize {
        /// Stored automaton id
        id: String,
    },

    /// Build an NFA from a regular expression
    RegexToNfa {
        /// Regular expression
        regex: String,
    },

    /// Determinize a stored NFA
    NfaToDfa {
        /// Stored automaton id
        id: String,
    },

    /// Derive a regular expression from a stored automaton
    FaToRegex {
        /// Stored automaton id
        id: String,
    },

    /// Run a string through a stored automaton
    Run {
        /// Stored automaton id
        id: String,

        /// Input string (empty when omitted)
        #[arg(default_value = "")]
        input: String,
    },

    /// Fetch the TeX source of a render artifact
    Tex {
        /// Render artifact id
        render_id: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch the SVG markup of a render artifact
    Svg {
        /// Render artifact id
        render_id: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List stored automata
    List,

    /// Show a stored automaton
    Get {
        /// Stored automaton id
        id: String,
    },

    /// Render and store a new automaton
    Save {
        /// Automaton JSON (or @file.json to read from file)
        fa: String,

        /// Description stored with the automaton
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Render and replace a stored automaton
    Update {
        /// Stored automaton id
        id: String,

        /// Automaton JSON (or @file.json to read from file)
        fa: String,

        /// New description (kept as is when omitted)
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a stored automaton
    Delete {
        /// Stored automaton id
        id: String,
    },
}

/// Builds the client configuration from the config file and flags.
fn build_config(cli: &Cli) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = match cli.config {
        Some(ref path) => ClientConfig::from_file(path)?,
        None => ClientConfig::load()?,
    };

    if let Some(ref url) = cli.base_url {
        config = config.with_base_url(url);
    }
    if let Some(ref token) = cli.token {
        config = config.with_auth_token(token);
    }

    if cli.no_token_file {
        config.token_file = None;
    } else if let Some(ref path) = cli.token_file {
        config = config.with_token_file(path);
    } else if config.token_file.is_none() {
        config.token_file = home::home_dir().map(|home| home.join(DEFAULT_TOKEN_FILE));
    }

    if cli.ca_cert.is_some() || cli.client_cert.is_some() || cli.insecure {
        let mut tls = config.tls.clone();

        if let Some(ref path) = cli.ca_cert {
            tls = tls.with_ca_cert(path);
        }
        match (&cli.client_cert, &cli.client_key) {
            (Some(cert), Some(key)) => tls = tls.with_client_cert(cert, key),
            (None, None) => {}
            _ => return Err("--client-cert and --client-key must be used together".into()),
        }
        if cli.insecure {
            tls = tls.with_insecure();
        }

        config = config.with_tls(tls);
    } else if cli.client_key.is_some() {
        return Err("--client-cert and --client-key must be used together".into());
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    };
    if config.tls.insecure {
        eprintln!(
            "{}: server certificates are not verified",
            "Warning".yellow()
        );
    }

    let client = Client::new(config).map_err(|e| {
        eprintln!("{}: {}", "Error".red(), e);
        e
    })?;
    tracing::debug!("Using service at {}", client.base_url());

    match cli.command {
        Some(Commands::Repl) | None => {
            repl::run(client).await?;
        }
        Some(cmd) => match commands::execute(&client, cmd).await {
            Ok(output) => {
                println!("{}", output);
            }
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
