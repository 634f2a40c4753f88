use std::{
    collections::HashMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use clap::{Parser, Subcommand};
use dirs::home_dir;
use ethers::providers::{Http, Provider};
use ethers::types::{Address, H256};
use eyre::{Result, WrapErr};
use figment::{providers::Serialized, value::Value};

use snapsafe::{
    config::Config,
    hub::SnapshotHub,
    multisend, normalize,
    oracle::{self, ModuleHasher},
    telemetry,
    types::{ExtendedProposal, Proposal},
    verifier::Verifier,
    version::Version,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose)?;
    telemetry::register_shutdown();
    tracing::info!(target: "snapsafe", "{}", Version::build());

    let config = cli.to_config()?;

    match cli.command {
        Command::Show {
            module,
            proposal_file,
        } => {
            let module = parse_address(&module)?;
            let extended = derive(&config, module, &proposal_file).await?;
            print_proposal(&extended);
        }
        Command::Verify {
            module,
            space,
            proposal_file,
            expected,
        } => {
            let module = match (module, space) {
                (Some(module), _) => parse_address(&module)?,
                (None, Some(space)) => {
                    let hub = SnapshotHub::new(config.hub_url.clone());
                    let module = hub.resolve_module_address(&space).await?;
                    tracing::info!(target: "snapsafe", "space `{}` is governed by module {:?}", space, module);
                    module
                }
                (None, None) => eyre::bail!("either --module or --space is required"),
            };

            let extended = derive(&config, module, &proposal_file).await?;
            print_proposal(&extended);

            if let Some(expected) = expected {
                let expected = H256::from_str(expected.trim_start_matches("0x"))
                    .wrap_err("invalid --expected digest")?;
                if expected != extended.digest {
                    tracing::error!(
                        target: "snapsafe",
                        "digest mismatch: derived {:?}, expected {:?}",
                        extended.digest,
                        expected,
                    );
                    std::process::exit(1);
                }
                tracing::info!(target: "snapsafe", "digest matches the expected value");
            }
        }
    }

    Ok(())
}

/// Runs the full pipeline for one proposal file against one module contract.
async fn derive(config: &Config, module: Address, path: &Path) -> Result<ExtendedProposal> {
    let proposal = read_proposal(path)?;

    let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
        .wrap_err("invalid rpc url")?;
    let provider = Arc::new(provider);

    let hasher = ModuleHasher::new(module, provider.clone());
    let mut verifier = Verifier::new(hasher);

    // The MultiSend address only matters for batch groups, and resolving it
    // requires two extra chain reads, so look it up on demand.
    if proposal.groups.iter().any(|group| group.is_batch()) {
        let safe = oracle::module_avatar(module, provider.clone()).await?;
        let version = oracle::suite_version(safe, provider.clone()).await?;
        let multi_send = multisend::resolve(config.chain_id, &version)?;
        tracing::debug!(
            target: "snapsafe",
            "suite version {} resolves MultiSend to {:?}",
            version,
            multi_send,
        );
        verifier = verifier.with_multi_send(multi_send);
    }

    Ok(verifier.derive(proposal).await?)
}

fn read_proposal(path: &Path) -> Result<Proposal> {
    let file = File::open(path)
        .wrap_err_with(|| format!("failed to open proposal file {}", path.display()))?;
    let raw: serde_json::Value = serde_json::from_reader(BufReader::new(file))
        .wrap_err("proposal file is not valid JSON")?;
    Ok(normalize::normalize(&raw)?)
}

fn print_proposal(extended: &ExtendedProposal) {
    println!("### Proposal ###");
    println!("ID: {}", extended.proposal.id);
    println!("Digest: {:?}", extended.digest);
    println!("Group hashes:");
    for (index, hash) in extended.group_hashes.iter().enumerate() {
        println!("  [{index}] {hash:?}");
    }
    println!("Groups:");
    for group in &extended.proposal.groups {
        println!(
            "{}",
            serde_json::to_string_pretty(group.transactions()).unwrap_or_default()
        );
    }
}

fn parse_address(s: &str) -> Result<Address> {
    Address::from_str(s).wrap_err_with(|| format!("invalid address `{s}`"))
}

#[derive(Parser)]
#[clap(version, about = "Re-derives the digest a DAO module computes for a proposal")]
struct Cli {
    #[clap(short, long)]
    verbose: bool,
    #[clap(long)]
    rpc_url: Option<String>,
    #[clap(long)]
    hub_url: Option<String>,
    #[clap(long)]
    chain_id: Option<u64>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a proposal's per-group hashes and digest
    Show {
        /// Address of the module contract
        #[clap(short, long)]
        module: String,
        /// File with proposal information json
        #[clap(short, long, default_value = "sample_proposal.json")]
        proposal_file: PathBuf,
    },
    /// Derive the digest and optionally compare it against an expected value
    Verify {
        /// Address of the module contract; resolved via --space when omitted
        #[clap(short, long)]
        module: Option<String>,
        /// Governance space whose module should be looked up
        #[clap(short, long)]
        space: Option<String>,
        /// File with proposal information json
        #[clap(short, long, default_value = "sample_proposal.json")]
        proposal_file: PathBuf,
        /// Digest reported by the execution environment
        #[clap(short, long)]
        expected: Option<String>,
    },
}

impl Cli {
    fn to_config(&self) -> Result<Config> {
        let config_path = home_dir()
            .unwrap_or_default()
            .join(".snapsafe/snapsafe.toml");
        Config::new(&config_path, self.as_provider())
    }

    fn as_provider(&self) -> Serialized<HashMap<&'static str, Value>> {
        let mut user_dict = HashMap::new();

        if let Some(rpc_url) = &self.rpc_url {
            user_dict.insert("rpc_url", Value::from(rpc_url.clone()));
        }

        if let Some(hub_url) = &self.hub_url {
            user_dict.insert("hub_url", Value::from(hub_url.clone()));
        }

        if let Some(chain_id) = self.chain_id {
            user_dict.insert("chain_id", Value::from(chain_id));
        }

        Serialized::from(user_dict, "default".to_string())
    }
}
