use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::info;

use cabchat::api;
use cabchat::config::Config;
use cabchat::ConversationPipeline;

/// RideOnCabio chat backend: routes questions to a chat reply or a web-searching agent.
#[derive(Parser, Debug)]
#[command(name = "cabchat", version, about)]
pub struct Cli {
    /// JSON config file path.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (debug level).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP API.
    Serve {
        /// Address to bind (overrides server.host).
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides server.port).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Chat interactively in the terminal.
    Chat {
        #[arg(long, default_value = "cli")]
        session: String,
    },
    /// Answer one question and exit.
    Ask {
        question: String,
        #[arg(long, default_value = "cli")]
        session: String,
    },
}

impl Cli {
    /// The subcommand to run; `serve` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            host: None,
            port: None,
        })
    }
}

pub async fn run(command: Command, mut config: Config) -> Result<()> {
    match command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let pipeline = build_pipeline(&config)?;
            api::serve(&config.server, pipeline)
                .await
                .context("chat API failed")
        }
        Command::Chat { session } => repl(build_pipeline(&config)?, &session).await,
        Command::Ask { question, session } => {
            let pipeline = build_pipeline(&config)?;
            println!("{}", pipeline.respond(&question, &session).await);
            Ok(())
        }
    }
}

fn build_pipeline(config: &Config) -> Result<Arc<ConversationPipeline>> {
    let pipeline =
        ConversationPipeline::from_config(config).context("failed to build conversation pipeline")?;
    info!(model = %config.provider.model, "pipeline ready");
    Ok(Arc::new(pipeline))
}

async fn repl(pipeline: Arc<ConversationPipeline>, session: &str) -> Result<()> {
    let mut editor = DefaultEditor::new().context("failed to start line editor")?;
    println!("Ask me anything about your ride. Type 'exit' to quit.");

    loop {
        let line = match editor.readline("You: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read input"),
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }
        let _ = editor.add_history_entry(question);

        let answer = pipeline.respond(question, session).await;
        println!("Bot: {}", answer);
    }
    Ok(())
}
