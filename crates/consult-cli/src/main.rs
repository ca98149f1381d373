use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use consult_client::ConsultClient;
use consult_core::{
    ClientConfig, CreateConversationRequest, RegisterRequest, SendMessageRequest,
    UpdateExpertProfileRequest, UserRole,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "consult")]
#[command(about = "Command-line client for the consult API")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.consult/config.toml, then ./config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session credential
    Login {
        username: String,
        #[arg(long, env = "CONSULT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in
    Register {
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "CONSULT_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        display_name: Option<String>,
        /// Register as an expert
        #[arg(long)]
        expert: bool,
    },
    /// End the session
    Logout,
    /// Exchange the session for a fresh credential
    Refresh,
    /// Show the signed-in user
    Whoami,
    /// List conversations
    Conversations,
    /// Show one conversation
    Conversation { id: String },
    /// Start a conversation
    NewConversation {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        message: Option<String>,
    },
    /// List the messages of a conversation
    Messages { conversation_id: String },
    /// Send a message
    Send {
        conversation_id: String,
        content: String,
    },
    /// Show the expert queue
    Queue,
    /// Claim a conversation from the queue
    Claim { conversation_id: String },
    /// Return a claimed conversation to the queue
    Unclaim { conversation_id: String },
    /// Show the expert profile
    Profile,
    /// Update the expert profile
    UpdateProfile {
        #[arg(long)]
        bio: Option<String>,
        /// Comma separated list of topics
        #[arg(long, value_delimiter = ',')]
        expertise: Option<Vec<String>>,
        #[arg(long)]
        available: Option<bool>,
    },
    /// Show past expert assignments
    History,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = ClientConfig::load(cli.config.as_deref());
    log::debug!(
        "Using auth service at {} and chat service at {}",
        config.auth.base_url,
        config.chat.base_url
    );

    let client = ConsultClient::persistent(&config)?;

    run(&client, cli.command).await
}

fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

async fn run(client: &ConsultClient, command: Commands) -> anyhow::Result<()> {
    let auth = client.auth();
    let chat = client.chat();

    match command {
        Commands::Login { username, password } => {
            let user = auth.login(&username, &password).await?;
            println!("{}", format!("✅ Logged in as {}", user.id).green());
        }
        Commands::Register {
            username,
            email,
            password,
            display_name,
            expert,
        } => {
            let request = RegisterRequest {
                username,
                email,
                password,
                display_name,
                role: expert.then_some(UserRole::Expert),
            };
            let user = auth.register(&request).await?;
            println!("{}", format!("✅ Registered as {}", user.id).green());
        }
        Commands::Logout => {
            auth.logout().await;
            println!("{}", "👋 Logged out".green());
        }
        Commands::Refresh => {
            let user = auth.refresh_token().await?;
            println!("{}", format!("🔄 Session refreshed for {}", user.id).green());
        }
        Commands::Whoami => match auth.current_user().await {
            Some(user) => print_json(&user)?,
            None => println!("{}", "Not logged in".dimmed()),
        },
        Commands::Conversations => print_json(&chat.get_conversations().await?)?,
        Commands::Conversation { id } => print_json(&chat.get_conversation(&id).await?)?,
        Commands::NewConversation { title, message } => {
            let request = CreateConversationRequest {
                title,
                initial_message: message,
            };
            print_json(&chat.create_conversation(&request).await?)?;
        }
        Commands::Messages { conversation_id } => {
            print_json(&chat.get_messages(&conversation_id).await?)?
        }
        Commands::Send {
            conversation_id,
            content,
        } => {
            let request = SendMessageRequest::new(conversation_id, content);
            print_json(&chat.send_message(&request).await?)?;
        }
        Commands::Queue => print_json(&chat.get_expert_queue().await?)?,
        Commands::Claim { conversation_id } => {
            chat.claim_conversation(&conversation_id).await?;
            println!("{}", format!("📌 Claimed {}", conversation_id).green());
        }
        Commands::Unclaim { conversation_id } => {
            chat.unclaim_conversation(&conversation_id).await?;
            println!("{}", format!("↩️  Released {}", conversation_id).green());
        }
        Commands::Profile => print_json(&chat.get_expert_profile().await?)?,
        Commands::UpdateProfile {
            bio,
            expertise,
            available,
        } => {
            let request = UpdateExpertProfileRequest {
                bio,
                expertise,
                available,
            };
            print_json(&chat.update_expert_profile(&request).await?)?;
        }
        Commands::History => print_json(&chat.get_expert_assignment_history().await?)?,
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
