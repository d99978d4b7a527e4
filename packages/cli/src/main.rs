use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod app;
mod commands;
mod settings;

use app::App;

#[derive(Parser)]
#[command(name = "recipe-keeper", about = "Offline-first recipe book")]
struct Cli {
    /// Directory holding the stored collections
    #[arg(long, value_name = "PATH", global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Behave as if the platform reported no connectivity
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List recipes, newest first
    List {
        /// Only recipes whose title, description, category or ingredients match
        #[arg(long, value_name = "QUERY")]
        search: Option<String>,
    },
    /// Show one recipe with its "made it" log
    Show { id: String },
    /// Add a recipe
    Add(commands::RecipeArgs),
    /// Replace the fields of a recipe
    Edit {
        id: String,
        #[command(flatten)]
        recipe: commands::RecipeArgs,
    },
    /// Delete a recipe
    Delete { id: String },
    /// Log that a recipe was made
    Made(commands::MadeArgs),
    /// Delete a "made it" entry
    Unmake { id: String },
    /// Run one sync pass
    Sync,
    /// Keep syncing and print the recipe list whenever it changes, until Ctrl-C
    Watch,
    /// Show connectivity and pending changes
    Status,
    /// Create an account and sign in
    Signup(commands::SignUpArgs),
    /// Sign in
    Signin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out
    Signout,
    /// Show the signed-in user
    Whoami,
    /// Print the effective configuration as TOML
    Config,
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RECIPE_KEEPER_LOG").unwrap_or_else(|_| {
            "recipe_keeper=info,store=info,sync=info,auth=info".into()
        }))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let config_file = cli
        .config
        .unwrap_or_else(|| PathBuf::from(store::RecipeKeeperConfig::filename()));
    let mut config = settings::load(&config_file)
        .with_context(|| format!("read configuration {}", config_file.display()))?;
    if let Some(dir) = cli.data_dir {
        config.storage.dir = Some(dir);
    }

    let app = App::open(config, !cli.offline);

    match cli.cmd {
        Cmd::List { search } => commands::list(&app, search.as_deref()),
        Cmd::Show { id } => commands::show(&app, &id),
        Cmd::Add(args) => commands::add(&app, args),
        Cmd::Edit { id, recipe } => commands::edit(&app, &id, recipe),
        Cmd::Delete { id } => commands::delete(&app, &id),
        Cmd::Made(args) => commands::made(&app, args),
        Cmd::Unmake { id } => commands::unmake(&app, &id),
        Cmd::Sync => commands::sync(&app).await,
        Cmd::Watch => commands::watch(&app).await,
        Cmd::Status => commands::status(&app),
        Cmd::Signup(args) => commands::sign_up(&app, args),
        Cmd::Signin { email, password } => commands::sign_in(&app, email, password),
        Cmd::Signout => commands::sign_out(&app),
        Cmd::Whoami => commands::whoami(&app),
        Cmd::Config => commands::show_config(&app),
    }
}
