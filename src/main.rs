use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use llm_chat::{app, logging, ChatApi, ChatController, Config, Dispatch, Message};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "llm-chat")]
#[command(version)]
#[command(about = "Chat with a local LLM server from the terminal", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.llm-chat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Origin serving the /api endpoints
    #[arg(long, global = true, env = "LLM_CHAT_BASE_URL")]
    base_url: Option<String>,

    /// Give up on a request after this many seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the reply
    Ask { text: String },
    /// Ask the server to ingest a web page
    Fetch { url: String },
    /// Upload a file (only the first path is sent)
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(timeout) = cli.timeout {
        config.request_timeout_secs = Some(timeout);
    }

    match cli.command {
        None => {
            logging::init_file(&config.log_dir())?;
            app::run(config).await
        }
        Some(Commands::Config) => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Some(command) => {
            logging::init_stderr()?;
            run_headless(config, command).await
        }
    }
}

/// Run one action through the controller and print what it appended
async fn run_headless(config: Config, command: Commands) -> Result<()> {
    let api = ChatApi::new(&config).context("Failed to create HTTP client")?;
    let mut controller = ChatController::new(api);

    let dispatch = match command {
        Commands::Ask { text } => {
            controller.set_draft(text);
            controller.submit_chat()
        }
        Commands::Fetch { url } => {
            controller.set_url_draft(url);
            controller.submit_url()
        }
        Commands::Upload { paths } => controller.upload_file(&paths),
        Commands::Config => Dispatch::Ignored,
    };

    if dispatch == Dispatch::Ignored {
        anyhow::bail!("Nothing to send");
    }

    while controller.settle().await {}

    if let Some(Message { text, .. }) = controller.transcript().last() {
        println!("{text}");
    }
    Ok(())
}
