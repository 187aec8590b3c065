use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use erc8004::{
    config::{keystore_password, EnvConfig, SignerSource},
    models::{AgentService, ServiceInput, RegisterOptions},
    services::keystore::keystore_address,
    supported_chains, Erc8004Client,
};
use ethers::types::U256;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "erc8004", version, about = "ERC-8004 agent registry client")]
struct Cli {
    /// Chain name, alias or numeric chain ID
    #[arg(long, global = true)]
    chain: Option<String>,

    /// Override the chain's default RPC endpoint
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Hex private key (prefer --keystore)
    #[arg(long, global = true)]
    key: Option<String>,

    #[arg(long, global = true)]
    keystore: Option<PathBuf>,

    #[arg(long, global = true)]
    keystore_password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List supported chains
    Chains,
    /// Show configuration and RPC connectivity
    Status,
    /// Print the identity registry version
    Version,
    /// Show an agent's owner and registration
    View { agent_id: String },
    /// Register a new agent
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        desc: String,
        #[arg(long)]
        image: Option<String>,
        /// Service as NAME=URL, repeatable
        #[arg(long = "service", value_parser = parse_service)]
        services: Vec<AgentService>,
        /// Register an externally hosted registration file instead
        #[arg(long)]
        uri: Option<String>,
    },
    /// Point an agent at a new registration URI
    Update {
        agent_id: String,
        #[arg(long)]
        uri: String,
    },
    /// Show an agent's feedback summary
    Reputation { agent_id: String },
    #[command(subcommand)]
    Wallet(WalletCommand),
}

#[derive(Subcommand)]
enum WalletCommand {
    /// Generate a new account into an encrypted keystore
    Create { path: PathBuf },
    /// Export the configured signing key as an encrypted keystore
    Export { path: PathBuf },
    /// Show the configured signing address
    Show,
}

fn parse_service(raw: &str) -> std::result::Result<AgentService, String> {
    match raw.split_once('=') {
        Some((name, endpoint)) if !name.is_empty() && !endpoint.is_empty() => {
            Ok(AgentService::new(name, endpoint))
        }
        _ => Err(format!("expected NAME=URL, got '{}'", raw)),
    }
}

fn parse_agent_id(raw: &str) -> Result<U256> {
    U256::from_dec_str(raw).with_context(|| format!("Invalid agent ID '{}'", raw))
}

impl Cli {
    /// Env config with command-line flags layered on top.
    fn config(&self) -> Result<EnvConfig> {
        let mut config = EnvConfig::from_env()?;

        if let Some(chain) = &self.chain {
            config.chain = chain.clone();
        }
        if let Some(url) = &self.rpc_url {
            config.rpc_url = Some(url.clone());
        }
        if let Some(key) = &self.key {
            config.signer = SignerSource::PrivateKey(key.clone());
        } else if let Some(path) = &self.keystore {
            config.signer = match (&self.keystore_password, &config.signer) {
                (Some(password), _) => SignerSource::Keystore {
                    path: path.clone(),
                    password: password.clone(),
                },
                (None, SignerSource::Keystore { password, .. }) => SignerSource::Keystore {
                    path: path.clone(),
                    password: password.clone(),
                },
                (None, _) => SignerSource::KeystoreWithoutPassword(path.clone()),
            };
        }

        Ok(config)
    }

    fn password(&self) -> Result<String> {
        keystore_password(self.keystore_password.as_deref())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Chains => {
            for chain in supported_chains()? {
                println!(
                    "{:<14} {:>9}  {:<16} validation: {}",
                    chain.key,
                    chain.chain_id,
                    chain.name,
                    if chain.validation_registry.is_some() { "yes" } else { "no" }
                );
            }
        }
        Command::Status => {
            let config = cli.config()?;
            let client = config.connect()?;
            let chain = client.chain();

            println!("Chain:      {} ({})", chain.name, chain.chain_id);
            println!("RPC:        {}", chain.rpc_url);
            println!("Identity:   {:?}", chain.identity_registry);
            println!("Reputation: {:?}", chain.reputation_registry);
            match chain.validation_registry {
                Some(address) => println!("Validation: {:?}", address),
                None => println!("Validation: not deployed"),
            }
            println!("Auth:       {}", config.auth_status());
            if let Some(address) = client.address() {
                println!("Address:    {:?}", address);
            }
            let connected = client.is_connected().await;
            println!("Connected:  {}", if connected { "yes" } else { "no" });
        }
        Command::Version => {
            let client = cli.config()?.connect()?;
            println!("{}", client.get_version().await?);
        }
        Command::View { agent_id } => {
            let client = cli.config()?.connect()?;
            let agent = client.get_agent(parse_agent_id(agent_id)?).await?;

            println!("Agent {} on {}", agent.agent_id, client.chain().name);
            println!("Owner: {:?}", agent.owner);
            match &agent.metadata {
                Some(metadata) => println!("{}", serde_json::to_string_pretty(metadata)?),
                None => println!("URI:   {}", agent.agent_uri),
            }
        }
        Command::Register {
            name,
            desc,
            image,
            services,
            uri,
        } => {
            let client = cli.config()?.connect()?;

            let agent_id = match uri {
                Some(uri) => client.identity().register_uri(uri, &[]).await?.agent_id,
                None => {
                    let options = RegisterOptions {
                        services: services.iter().cloned().map(ServiceInput::from).collect(),
                        image: image.clone(),
                        ..Default::default()
                    };
                    client.register(name, desc, options).await?
                }
            };
            println!("Registered agent {} on {}", agent_id, client.chain().name);
        }
        Command::Update { agent_id, uri } => {
            let client = cli.config()?.connect()?;
            let tx_hash = client
                .identity()
                .set_agent_uri(parse_agent_id(agent_id)?, uri)
                .await?;
            println!("Updated: {}", client.chain().tx_url(&format!("{:?}", tx_hash)));
        }
        Command::Reputation { agent_id } => {
            let client = cli.config()?.connect()?;
            let summary = client
                .reputation()
                .get_summary(parse_agent_id(agent_id)?, &[], "", "")
                .await?;
            println!("Feedback count: {}", summary.count);
            println!("Average score:  {}/100", summary.average_score);
        }
        Command::Wallet(WalletCommand::Create { path }) => {
            let written = Erc8004Client::create_wallet(&cli.password()?, path)?;
            match keystore_address(&written)? {
                Some(address) => println!("Created {} for {:?}", written.display(), address),
                None => println!("Created {}", written.display()),
            }
        }
        Command::Wallet(WalletCommand::Export { path }) => {
            let client = cli.config()?.connect()?;
            let written = client.export_keystore(&cli.password()?, path)?;
            println!("Exported keystore to {}", written.display());
        }
        Command::Wallet(WalletCommand::Show) => {
            let config = cli.config()?;
            let client = config.connect()?;
            match client.address() {
                Some(address) => println!("{:?}", address),
                None => bail!("No signing account configured ({})", config.auth_status()),
            }
        }
    }

    Ok(())
}
