use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use npsync_db::UserSelector;

mod commands;

#[derive(Parser)]
#[command(name = "npsync")]
#[command(about = "Bulk user-state reconciliation for the game server", long_about = None)]
struct Cli {
    /// Config layers merged over the built-in defaults, in order
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mark every side story read (or unread) for one user
    Subscenarios {
        #[command(flatten)]
        user: UserArgs,

        /// Grant the completion reward for each newly read side story
        #[arg(long, default_value_t = false)]
        with_rewards: bool,

        /// Mark everything unread instead. Never reclaims rewards.
        #[arg(long, default_value_t = false)]
        unread: bool,
    },

    /// Unlock every non-support card in the album at max level and bond
    Album {
        #[command(flatten)]
        user: UserArgs,
    },

    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute the effective config hash + print canonical JSON
    ConfigHash,
}

#[derive(Subcommand)]
enum DbCmd {
    Status,

    /// Apply SQL migrations
    Migrate,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct UserArgs {
    /// Target user by id
    #[arg(long)]
    user_id: Option<i64>,

    /// Target user by invite code
    #[arg(long)]
    invite_code: Option<String>,
}

impl UserArgs {
    fn selector(self) -> Result<UserSelector> {
        match (self.user_id, self.invite_code) {
            (Some(id), None) => Ok(UserSelector::Id(id)),
            (None, Some(code)) => Ok(UserSelector::InviteCode(code)),
            _ => bail!("exactly one of --user-id or --invite-code is required"),
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Dev-time convenience; a missing file is fine.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    match cli.cmd {
        Commands::Subscenarios {
            user,
            with_rewards,
            unread,
        } => {
            commands::subscenarios::run(&cli.config_paths, user.selector()?, with_rewards, unread)
                .await?
        }

        Commands::Album { user } => {
            commands::album::run(&cli.config_paths, user.selector()?).await?
        }

        Commands::Db { cmd } => match cmd {
            DbCmd::Status => commands::db::status(&cli.config_paths).await?,
            DbCmd::Migrate => commands::db::migrate(&cli.config_paths).await?,
        },

        Commands::ConfigHash => {
            let loaded = commands::load_config(&cli.config_paths)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}
