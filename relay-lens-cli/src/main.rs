use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use relay_lens_core::{
    ConnectionPool, EngineConfig, Identity, MemoryTransport, RelayLens, RelayTransport,
};
use relay_lens_cli::{
    comparison::ComparisonData,
    input::load_events,
    output::OutputFormat,
    signer::{KeysSigner, SECRET_KEY_ENV},
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "relay-lens")]
#[command(about = "Inspect Nostr profiles, contacts and interaction scores across relays", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Default relay to query (repeatable, replaces the configured defaults)
    #[arg(long = "relay", global = true, value_name = "URL")]
    relays: Vec<String>,

    /// Per-relay query timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Answer queries from a JSONL event dump instead of the network
    #[arg(long, global = true, value_name = "FILE")]
    events_file: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Show detailed progress information
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable progress spinner
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Show an identity's profile and contact count
    Profile {
        /// Public key (hex or npub)
        identity: String,
    },

    /// Show the relays used to reach an identity
    Relays {
        /// Public key (hex or npub)
        identity: String,
    },

    /// List the accounts an identity follows
    Contacts {
        /// Public key (hex or npub)
        identity: String,

        /// Look up each contact's profile
        #[arg(long)]
        profiles: bool,
    },

    /// Rank an identity's contacts by recent interactions
    Score {
        /// Public key (hex or npub) of the viewer
        identity: String,

        /// Trailing window in days
        #[arg(long)]
        window_days: Option<u32>,

        /// Only show the highest ranked contacts
        #[arg(long)]
        top: Option<usize>,
    },

    /// Compare two identities and their contacts
    Compare {
        /// Public key (hex or npub) of the current user
        viewer: String,

        /// Public key (hex or npub) of the other user
        target: String,
    },

    /// Add identities to your contact list and publish it
    Follow {
        /// Public keys (hex or npub) to follow
        #[arg(required = true)]
        identities: Vec<String>,

        /// File holding your secret key (hex or nsec)
        #[arg(long, value_name = "FILE")]
        secret_key_file: Option<PathBuf>,

        /// Publish even if no existing contact list was found
        #[arg(long)]
        allow_new_list: bool,
    },

    /// Remove identities from your contact list and publish it
    Unfollow {
        /// Public keys (hex or npub) to unfollow
        #[arg(required = true)]
        identities: Vec<String>,

        /// File holding your secret key (hex or nsec)
        #[arg(long, value_name = "FILE")]
        secret_key_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    info!("Default relays: {}", config.default_relays.join(", "));

    let mut pool = None;
    let transport: Arc<dyn RelayTransport> = match &cli.events_file {
        Some(path) => {
            let loaded = load_events(path)?;
            if loaded.skipped_lines > 0 {
                warn!("Skipped {} unusable lines in {}", loaded.skipped_lines, path.display());
            }
            Arc::new(MemoryTransport::replay(loaded.events))
        }
        None => {
            let connections = Arc::new(ConnectionPool::new(config.connect_timeout()));
            pool = Some(connections.clone());
            connections
        }
    };

    let lens = RelayLens::new(&config, transport).context("Invalid configuration")?;
    let result = run(&cli, lens).await;

    if let Some(pool) = pool {
        pool.shutdown().await;
    }
    result
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::filter::LevelFilter;

    let filter = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if !cli.relays.is_empty() {
        config.default_relays = cli.relays.clone();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.query_timeout_ms = timeout_ms;
    }
    Ok(config)
}

fn parse_identity(input: &str) -> Result<Identity> {
    Identity::parse(input).with_context(|| format!("Invalid identity: {}", input))
}

fn parse_identities(inputs: &[String]) -> Result<Vec<Identity>> {
    inputs.iter().map(|input| parse_identity(input)).collect()
}

fn spinner(enabled: bool, message: String) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

async fn run(cli: &Cli, lens: RelayLens) -> Result<()> {
    let format = OutputFormat::from_flag(cli.json);
    let progress = |message: String| spinner(!cli.no_progress, message);

    let output = match &cli.command {
        Commands::Profile { identity } => {
            let identity = parse_identity(identity)?;
            let pb = progress(format!("Fetching profile of {}", identity.short()));
            let profile = lens.fetch_user_profile(&identity).await;
            finish(pb);
            format.profile(&profile)?
        }

        Commands::Relays { identity } => {
            let identity = parse_identity(identity)?;
            let pb = progress(format!("Resolving relays of {}", identity.short()));
            let relays = lens.relays_for(&identity).await;
            finish(pb);
            format.relays(&identity, &relays)?
        }

        Commands::Contacts { identity, profiles } => {
            let identity = parse_identity(identity)?;
            let pb = progress(format!("Fetching contacts of {}", identity.short()));
            let contacts = lens.fetch_contacts(&identity).await;
            let output = if *profiles {
                if let Some(pb) = &pb {
                    pb.set_message(format!("Fetching {} contact profiles", contacts.len()));
                }
                format.contact_profiles(&lens.fetch_contact_profiles(&contacts).await)?
            } else {
                format.contacts(&contacts)?
            };
            finish(pb);
            output
        }

        Commands::Score {
            identity,
            window_days,
            top,
        } => {
            let viewer = parse_identity(identity)?;
            let window_days = window_days.unwrap_or(lens.window_days());
            let pb = progress(format!("Scoring contacts of {}", viewer.short()));

            let contacts = lens.fetch_contacts(&viewer).await;
            let (scores, profiles) = tokio::join!(
                lens.score_interactions(&viewer, &contacts, Some(window_days)),
                lens.fetch_contact_profiles(&contacts),
            );
            finish(pb);

            let names: HashMap<Identity, String> = profiles
                .into_iter()
                .filter_map(|p| p.name.map(|name| (p.pubkey, name)))
                .collect();
            format.scores(&scores?, &names, window_days, *top)?
        }

        Commands::Compare { viewer, target } => {
            let (viewer, target) = (parse_identity(viewer)?, parse_identity(target)?);
            let pb = progress(format!("Comparing {} and {}", viewer.short(), target.short()));

            let (viewer_profile, viewer_contacts, target_profile, target_contacts) = tokio::join!(
                lens.fetch_user_profile(&viewer),
                lens.fetch_contacts(&viewer),
                lens.fetch_user_profile(&target),
                lens.fetch_contacts(&target),
            );
            finish(pb);

            let data = ComparisonData::new(
                viewer_profile,
                viewer_contacts,
                target_profile,
                target_contacts,
            );
            format.comparison(&data)?
        }

        Commands::Follow {
            identities,
            secret_key_file,
            allow_new_list,
        } => {
            let additions = parse_identities(identities)?;
            let signer = load_signer(secret_key_file.as_deref())?;
            let viewer = signer.identity();

            let current = lens.fetch_contacts(&viewer).await;
            if current.is_empty() && !allow_new_list {
                anyhow::bail!(
                    "No contact list found for {}; pass --allow-new-list to publish a new one",
                    viewer.short()
                );
            }

            let mut contacts = current.clone();
            for identity in additions {
                if !contacts.contains(&identity) {
                    contacts.push(identity);
                }
            }
            if contacts == current {
                println!("Already following every given identity; nothing to publish");
                return Ok(());
            }

            publish(lens, signer, &viewer, &contacts, format, &progress).await?
        }

        Commands::Unfollow {
            identities,
            secret_key_file,
        } => {
            let removals = parse_identities(identities)?;
            let signer = load_signer(secret_key_file.as_deref())?;
            let viewer = signer.identity();

            let current = lens.fetch_contacts(&viewer).await;
            if current.is_empty() {
                anyhow::bail!("No contact list found for {}", viewer.short());
            }

            let contacts: Vec<Identity> = current
                .iter()
                .filter(|c| !removals.contains(*c))
                .cloned()
                .collect();
            if contacts.len() == current.len() {
                println!("Not following any given identity; nothing to publish");
                return Ok(());
            }

            publish(lens, signer, &viewer, &contacts, format, &progress).await?
        }
    };

    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn load_signer(key_file: Option<&std::path::Path>) -> Result<KeysSigner> {
    KeysSigner::load(key_file)?.with_context(|| {
        format!(
            "No secret key available: pass --secret-key-file or set {}",
            SECRET_KEY_ENV
        )
    })
}

async fn publish(
    lens: RelayLens,
    signer: KeysSigner,
    viewer: &Identity,
    contacts: &[Identity],
    format: OutputFormat,
    progress: &impl Fn(String) -> Option<ProgressBar>,
) -> Result<String> {
    let lens = lens.with_signer(Arc::new(signer));
    let pb = progress(format!("Publishing contact list ({} contacts)", contacts.len()));
    let receipt = lens.publish_contact_list(viewer, contacts).await;
    finish(pb);

    let receipt = receipt.context("Failed to publish contact list")?;
    info!("Contact list {} accepted by {}", receipt.event_id, receipt.relay);
    format.receipt(&receipt, contacts.len())
}

fn finish(pb: Option<ProgressBar>) {
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
}
