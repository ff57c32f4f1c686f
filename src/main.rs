mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod intake;
mod models;
mod settings;
mod store;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{AccountsCommands, Cli, Commands, UsersCommands};

/// `RUST_LOG` wins over the configured level. Logs go to stderr so
/// `upload --json` output stays machine-readable.
fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    setup_logging(&settings::load_settings().log_level);

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Users { command } => match command {
            UsersCommands::Add { email } => cli::users::add(&email),
            UsersCommands::List => cli::users::list(),
            UsersCommands::Update { id, email } => cli::users::update(id, &email),
            UsersCommands::Delete { id } => cli::users::delete(id),
        },
        Commands::Accounts { command } => match command {
            AccountsCommands::Add {
                name,
                user,
                category,
                currency,
            } => cli::accounts::add(&name, &user, &category, &currency),
            AccountsCommands::List { user } => cli::accounts::list(&user),
            AccountsCommands::Update {
                id,
                name,
                category,
                currency,
            } => cli::accounts::update(id, name.as_deref(), category.as_deref(), currency.as_deref()),
            AccountsCommands::Delete { id } => cli::accounts::delete(id),
        },
        Commands::Banks => cli::banks::run(),
        Commands::Upload { target, json } => cli::upload::run(&target, json),
        Commands::Import { target } => cli::import::run(&target),
        Commands::Commit {
            file,
            account,
            user,
        } => cli::commit::run(&file, &account, &user),
        Commands::Transactions { account, user } => cli::transactions::run(&account, &user),
        Commands::Dashboard { user, limit } => cli::dashboard::run(&user, limit),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
