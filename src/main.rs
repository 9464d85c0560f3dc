use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use octonag::config::{default_config_path, expand_path};
use octonag::{Context, Lookup, ProcessEnv, Service, Settings};

#[derive(Parser)]
#[command(name = "octonag")]
#[command(about = "Pull request nagging bot configuration and access control")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to conf/config.yaml, then XDG config location)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate configuration and print a summary
    Check,

    /// List configured repositories
    Repos {
        /// Only list repositories of one organization
        #[arg(long)]
        org: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run user names through the blacklist, whitelist and manual mapping
    Resolve {
        /// Names to look up
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Show the Authorization header used for a service
    Header {
        /// Service name (github or slack)
        service: String,
    },
}

#[derive(Serialize)]
struct RepoEntry {
    owner: String,
    repository: String,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let path = match cli.config.as_deref().map(expand_path).unwrap_or_else(default_config_path) {
        Ok(path) => path,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    let settings = Settings::load_or_exit(&path, &ProcessEnv);
    info!("Loaded configuration from {:?}", path);
    let ctx = Context::new(settings);

    let result = match cli.command {
        Commands::Check => cmd_check(&ctx),
        Commands::Repos { org, json } => cmd_repos(&ctx, org, json),
        Commands::Resolve { names } => cmd_resolve(&ctx, &names),
        Commands::Header { service } => cmd_header(&ctx, &service),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn cmd_check(ctx: &Context) -> Result<()> {
    let settings = ctx.settings();

    println!("✅ Configuration is valid");
    println!(
        "   Organizations: {}",
        settings.organizations().collect::<Vec<_>>().join(", ")
    );
    println!("   Repositories: {}", ctx.repository_generator(None).count());
    println!("   JIRA: {}", if settings.use_jira { "enabled" } else { "disabled" });
    println!(
        "   Whitelist: {}",
        settings.whitelist.as_ref().map_or(0, |names| names.len())
    );
    println!(
        "   Blacklist: {}",
        settings.blacklist.as_ref().map_or(0, |names| names.len())
    );
    println!("   Manual mappings: {}", settings.manual_user_map.len());
    println!("   Default email domain: {}", settings.default_email_domain);
    if let Some(graphql) = settings.github_graphql() {
        println!("   GitHub GraphQL: {}", graphql);
    }
    if let Some(uid) = &settings.debug_uid {
        println!("   Debug uid: {}", uid);
    }

    Ok(())
}

fn cmd_repos(ctx: &Context, org: Option<String>, json: bool) -> Result<()> {
    let entries: Vec<RepoEntry> = match org.as_deref() {
        Some(org) => ctx.repositories().call(org, |owner, repos| {
            repos
                .iter()
                .map(|repository| RepoEntry {
                    owner: owner.to_string(),
                    repository: repository.clone(),
                })
                .collect::<Vec<_>>()
        })?,
        None => ctx
            .repository_generator(None)
            .map(|(owner, repository)| RepoEntry {
                owner: owner.to_string(),
                repository: repository.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            println!("{}/{}", entry.owner, entry.repository);
        }
    }

    Ok(())
}

fn cmd_resolve(ctx: &Context, names: &[String]) -> Result<()> {
    for name in names {
        match ctx.lookup(name, |_| ()) {
            Lookup::Blocked => println!("{}: blocked", name),
            Lookup::Resolved { name: resolved, .. } => println!("{} -> {}", name, resolved),
        }
    }
    Ok(())
}

fn cmd_header(ctx: &Context, service: &str) -> Result<()> {
    let service =
        Service::parse(service).ok_or_else(|| anyhow!("Unknown service: {}", service))?;
    let headers = ctx.get_header(service)?;

    if headers.contains_key(AUTHORIZATION) {
        println!("{}: Bearer <redacted>", AUTHORIZATION);
    }
    Ok(())
}
