use std::path::PathBuf;

use anyhow::Result;
use clap::ArgMatches;
use dotenvy::dotenv;
use sqlx::SqlitePool;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use techtest::{
    backup::State,
    config::Config,
    db::{
        connect_to_db,
        migrations::{self, MIGRATIONS},
    },
    server,
};

mod command_parser;

fn init_tracing(log_filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_filter)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn show_migrations(conn: &SqlitePool) -> Result<()> {
    let mut current_app = None;
    for (migration, applied_at) in migrations::status(conn, MIGRATIONS).await? {
        if current_app != Some(migration.app) {
            println!("{}", migration.app);
            current_app = Some(migration.app);
        }
        match applied_at {
            Some(ts) => println!(" [X] {} ({})", migration.name, ts),
            None => println!(" [ ] {}", migration.name),
        }
    }
    Ok(())
}

async fn handle_command(matches: &ArgMatches, config: &Config) -> Result<()> {
    let conn = connect_to_db(&config.database_path()).await?;
    match matches.subcommand() {
        Some(("serve", matches)) => {
            if !matches.get_flag("no-migrate") {
                migrations::migrate(&conn, MIGRATIONS).await?;
            }
            server::start(config.socket_addr(), &conn).await?;
        }
        Some(("migrate", _)) => {
            for migration in migrations::migrate(&conn, MIGRATIONS).await? {
                println!("Applied {migration}");
            }
        }
        Some(("showmigrations", _)) => show_migrations(&conn).await?,
        Some(("dump", _)) => {
            let mut state = State::load(&conn).await?;
            state.sort();
            println!("{}", state.serialize()?);
        }
        Some(("load", matches)) => {
            let path = matches
                .get_one::<PathBuf>("file")
                .ok_or_else(|| anyhow::anyhow!("No dump file given"))?;
            let state = State::deserialize(&tokio::fs::read_to_string(path).await?)?;
            migrations::migrate(&conn, MIGRATIONS).await?;
            state.rebuild(&conn).await?;
        }
        Some((name, _)) => anyhow::bail!("Unknown command {name}"),
        None => unreachable!("subcommand required"),
    }
    conn.close().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_path = dotenv().ok();
    let matches = command_parser::arg_parser().get_matches();

    if let Some(("config", _)) = matches.subcommand() {
        print!("{}", Config::default_as_string()?);
        return Ok(());
    }

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => Config::read_config_from(path)?,
        None => Config::read_config()?,
    };
    init_tracing(&config.log_filter)?;
    if let Some(path) = dotenv_path {
        debug!("Loaded environment from {}.", path.display());
    }
    info!(
        "Starting techtest v{} with database {}.",
        env!("CARGO_PKG_VERSION"),
        config.database_location.display()
    );

    handle_command(&matches, &config).await
}
