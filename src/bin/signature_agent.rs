use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use tensorlake_tools::agent::{
    Agent, ChatClient, DEFAULT_SIGNATURE_QUESTIONS, REACT_SYSTEM_PROMPT, analyze_signatures,
};
use tensorlake_tools::{AgentConfig, DocumentMarkdownTool, TensorlakeConfig};

#[derive(Parser, Debug)]
#[command(version, about = "Ask an LLM agent about the signatures in a document", long_about = None)]
struct Args {
    /// Document path or URL
    path: String,

    /// Question to ask; repeat for several. Defaults to a signature review.
    #[clap(short, long = "question")]
    questions: Vec<String>,

    /// Let the agent call the document tool itself instead of parsing first
    #[clap(long)]
    react: bool,

    /// Path to the Tensorlake config file
    #[clap(long)]
    parse_config: Option<String>,

    /// Path to the agent config file
    #[clap(long)]
    agent_config: Option<String>,

    /// Chat model to use
    #[clap(short, long)]
    model: Option<String>,

    #[clap(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let tensorlake_config = match args.parse_config {
        Some(ref path) => TensorlakeConfig::from_config_file(path)?,
        None => TensorlakeConfig::default(),
    };
    let mut agent_config = match args.agent_config {
        Some(ref path) => AgentConfig::from_config_file(path)?,
        None => AgentConfig::default(),
    };
    if let Some(ref model) = args.model {
        agent_config.model = model.clone();
    }

    let tool = Arc::new(DocumentMarkdownTool::new(tensorlake_config)?);
    let chat = ChatClient::new(&agent_config)?;
    let agent = Agent::new(chat)
        .with_tool(tool.clone())
        .with_max_iterations(agent_config.max_iterations);

    let questions: Vec<String> = if args.questions.is_empty() {
        DEFAULT_SIGNATURE_QUESTIONS.iter().map(|q| q.to_string()).collect()
    } else {
        args.questions.clone()
    };

    let answer = if args.react {
        let agent = agent.with_system_prompt(REACT_SYSTEM_PROMPT);
        let question = format!(
            "Using signature detection, parse the document found at {} and answer:\n{}",
            args.path,
            questions.join("\n")
        );
        agent.run(&question).await?
    } else {
        eprintln!("Processing document with signature detection...");
        analyze_signatures(&tool, &agent, &args.path, &questions).await?
    };

    println!("Analysis Result:\n\n{answer}");
    Ok(())
}
