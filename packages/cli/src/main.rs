use std::time::Duration;

use clap::Parser;
use remirror_cli::commands::{self, CommandResult};
use remirror_cli::{shell, Error};
use remirror_core::{ClientConfig, Session};
use remirror_http::{HttpTransport, HttpTransportConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// remirror - inspect and drive objects owned by a remote runtime
#[derive(Parser, Debug)]
#[command(name = "remirror")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the remote server
    #[arg(long, default_value = "http://localhost:8888")]
    url: String,

    /// Request endpoint under the base URL
    #[arg(long, default_value = "_jigna")]
    endpoint: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Run one command and exit instead of starting the shell
    command: Vec<String>,
}

fn main() {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Error> {
    let config = HttpTransportConfig::new(&args.url)
        .with_endpoint(&args.endpoint)
        .with_timeout(Duration::from_secs(args.timeout));
    let transport = HttpTransport::new(&config)?;
    debug!(url = %transport.url(), "connecting");

    let session = Session::blocking(transport, ClientConfig::default());
    session.get_context()?.into_ready()?;

    if args.command.is_empty() {
        return shell::run(&session, &args.url);
    }

    match commands::execute(&args.command.join(" "), &session) {
        CommandResult::Ok { display } => {
            if let Some(output) = display {
                println!("{}", output);
            }
        }
        CommandResult::Error(message) => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        CommandResult::Help => println!("{}", commands::format_help()),
        CommandResult::Exit => {}
    }
    Ok(())
}
