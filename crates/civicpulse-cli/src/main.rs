use clap::{Parser, Subcommand};
use civicpulse_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "civicpulse", version, about = "CivicPulse CLI")]
struct Cli {
    /// Identity to act as
    #[arg(long, global = true, env = "CIVICPULSE_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Profile management
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Answer quizzes
    Quiz {
        #[command(subcommand)]
        action: commands::quiz::QuizAction,
    },
    /// Vote in polls
    Poll {
        #[command(subcommand)]
        action: commands::poll::PollAction,
    },
    /// Today's civic pulse
    Pulse,
    /// Unlocked features and the next one to earn
    Unlocks,
    /// Community discussions
    Discussion {
        #[command(subcommand)]
        action: commands::discussion::DiscussionAction,
    },
    /// Comments on discussions
    Comment {
        #[command(subcommand)]
        action: commands::comment::CommentAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_env("CIVICPULSE_LOG")
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_tracing(&config);
    tracing::debug!(user = cli.user.as_deref().unwrap_or("-"), "starting");

    let ctx = Context::new(cli.user, config);
    let result = match cli.command {
        Commands::Profile { action } => commands::profile::run(&ctx, action),
        Commands::Quiz { action } => commands::quiz::run(&ctx, action),
        Commands::Poll { action } => commands::poll::run(&ctx, action),
        Commands::Pulse => commands::pulse::run(&ctx),
        Commands::Unlocks => commands::unlocks::run(&ctx),
        Commands::Discussion { action } => commands::discussion::run(&ctx, action),
        Commands::Comment { action } => commands::comment::run(&ctx, action),
        Commands::Config { action } => commands::config::run(ctx, action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
