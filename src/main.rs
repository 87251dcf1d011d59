use std::net::IpAddr;
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

use clap::parser::MatchesError;
use clap::{value_parser, Arg, ArgMatches, Command};
use qr_playlists::actions::{seed_users, PlaylistSync};
use qr_playlists::caller::{Authenticator, StaticTokens};
use qr_playlists::config::{ConfigError, ServerConfig, ServerConfigFile, StoreKind};
use qr_playlists::routes;
use qr_playlists::spotify::SpotifyCatalogSource;
use qr_playlists::store::{DocumentStore, FirestoreStore, MemoryStore};

enum Action {
    Serve,
    SeedUsers(Vec<String>),
}

struct Args {
    config_path: PathBuf,
    overrides: ServerConfigFile,
    action: Action,
}

fn cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .required(false)
                .default_value("qr-playlists.config"),
        )
        .arg(
            Arg::new("address")
                .long("address")
                .value_parser(value_parser!(IpAddr)),
        )
        .arg(Arg::new("port").long("port").value_parser(value_parser!(u16)))
        .arg(
            Arg::new("store")
                .long("store")
                .value_parser(value_parser!(StoreKind)),
        )
        .arg(Arg::new("project").long("project"))
        .subcommand(Command::new("serve").about("Serve the callable functions (default)"))
        .subcommand(
            Command::new("seed-users")
                .about("Grant dashboard access to the given email addresses")
                .arg(Arg::new("emails").required(true).num_args(1..)),
        )
}

fn parse_cli_args(matches: &ArgMatches) -> Result<Args, MatchesError> {
    let overrides = ServerConfigFile {
        address: matches.try_get_one::<IpAddr>("address")?.copied(),
        port: matches.try_get_one::<u16>("port")?.copied(),
        store: matches.try_get_one::<StoreKind>("store")?.copied(),
        project: matches.try_get_one::<String>("project")?.cloned(),
    };
    let action = match matches.subcommand() {
        Some(("seed-users", sub)) => Action::SeedUsers(
            sub.try_get_many::<String>("emails")?
                .map(|emails| emails.cloned().collect())
                .unwrap_or_default(),
        ),
        _ => Action::Serve,
    };
    Ok(Args {
        config_path: matches
            .try_get_one::<String>("config")?
            .map(PathBuf::from)
            .unwrap_or_default(),
        overrides,
        action,
    })
}

fn open_store(config: &ServerConfig) -> Result<Arc<dyn DocumentStore>, ConfigError> {
    Ok(match config.store {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::Firestore => {
            let project = config.project.as_deref().ok_or(ConfigError::MissingProject)?;
            Arc::new(FirestoreStore::from_env(project)?)
        }
    })
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let file_config = ServerConfigFile::load(&args.config_path)?;
    let config = ServerConfig::from(file_config.overridden_by(args.overrides));
    let store = open_store(&config)?;

    match args.action {
        Action::SeedUsers(emails) => {
            seed_users(store.as_ref(), &emails).await?;
            println!("Seeded {} dashboard users.", emails.len());
        }
        Action::Serve => {
            if config.store == StoreKind::Memory {
                log::warn!("Using the in-memory store, data is lost on shutdown");
            }
            let sync = PlaylistSync::new(Arc::new(SpotifyCatalogSource::new()), store);
            let authenticator: Arc<dyn Authenticator> = Arc::new(StaticTokens::from_env());
            let figment = rocket::Config::figment()
                .merge(("address", config.address))
                .merge(("port", config.port));
            let _rocket = routes::build_with(rocket::custom(figment), sync, authenticator)
                .launch()
                .await?;
        }
    }
    Ok(())
}

#[rocket::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = cli().get_matches();
    let args = match parse_cli_args(&matches) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("Error parsing arguments: {}", err);
            exit(1);
        }
    };
    if let Err(err) = run(args).await {
        eprintln!("Error: {}", err);
        exit(1);
    }
}
