//! clienttrack interactive host entrypoint.

use anyhow::Result;
use clap::Parser;
use clienttrack::shell::{parse_line, ShellLine};
use clienttrack::{Flow, Host};
use clienttrack_core::app::AppCommand;
use clienttrack_core::Config;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clienttrack", about = "Customer records and photos on Google Sheets and Drive", version)]
struct Cli {
    /// Use simulated in-memory services instead of Google
    #[arg(long)]
    offline: bool,

    /// Path of the local state file (overrides CLIENTTRACK_STATE_PATH)
    #[arg(long)]
    state_path: Option<String>,

    /// OAuth access token with Sheets and Drive scopes
    #[arg(long, env = "CLIENTTRACK_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("clienttrack=info,clienttrack_core=info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::from_env();
    config.offline |= cli.offline;
    if let Some(path) = cli.state_path {
        config.state_path = path;
    }

    let mut host = Host::build(&config, cli.token)?;
    let (output, _) = host
        .execute(ShellLine::Command(AppCommand::Start))
        .await?;
    print_lines(&output);
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let pending = host.app().pending_prompt();
        let parsed = match parse_line(&line, pending.as_ref()) {
            Ok(parsed) => parsed,
            Err(err) => {
                println!("{}", err);
                continue;
            }
        };
        match host.execute(parsed).await {
            Ok((output, flow)) => {
                print_lines(&output);
                if flow == Flow::Quit {
                    break;
                }
            }
            Err(err) => {
                warn!("{:#}", err);
                println!("error: {:#}", err);
            }
        }
    }
    Ok(())
}
