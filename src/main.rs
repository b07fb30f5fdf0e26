use anyhow::Context as _;
use clap::{Parser, Subcommand};
use devldap::core::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "devldap",
    version,
    about = "Development LDAP server backed by a JSON document",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Config file (TOML, YAML or JSON). Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(clap::Args, Default)]
struct ServeArgs {
    /// Listen address.
    #[arg(short = 'l', long)]
    listen: Option<String>,

    /// JSON data file.
    #[arg(short = 'd', long)]
    data: Option<PathBuf>,

    /// Do not reload the data file when it changes.
    #[arg(long)]
    no_watch: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Serve LDAP (the default).
    Serve(ServeArgs),
    /// Run one search against a data file and print the results.
    Query {
        #[arg(short = 'd', long)]
        data: PathBuf,
        /// Search base DN.
        #[arg(short = 'b', long, default_value = "")]
        base: String,
        /// RFC 4515 filter.
        #[arg(short = 'f', long, default_value = "(objectClass=*)")]
        filter: String,
        /// Attributes to return; all when omitted.
        attributes: Vec<String>,
    },
    /// Parse a data file and report what it contains.
    Check {
        #[arg(short = 'd', long)]
        data: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    init_logging(&config, cli.debug);

    match cli.command {
        None => serve(config, cli.serve),
        Some(Command::Serve(args)) => serve(config, args),
        Some(Command::Query {
            data,
            base,
            filter,
            attributes,
        }) => {
            let directory = devldap::data::load_file(&data)?;
            let responses = devldap::query::search(&directory, &base, &filter, &attributes)?;
            print!("{}", devldap::query::render(&responses));
            Ok(())
        }
        Some(Command::Check { data }) => {
            let directory = devldap::data::load_file(&data)?;
            println!("{}: {} entries", data.display(), directory.len());
            Ok(())
        }
    }
}

fn serve(mut config: Config, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    if let Some(data) = args.data {
        config.data.path = data;
    }
    if args.no_watch {
        config.data.watch = false;
    }
    devldap::server::run(config).context("devldap server failed")
}

fn init_logging(config: &Config, debug: bool) {
    let fallback = if debug { "debug" } else { config.log.filter.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .init();
}
