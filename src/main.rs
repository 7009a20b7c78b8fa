use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use abiwire::config::{self, Config};
use abiwire::infrastructure::{HttpProvider, ProviderConfig};
use abiwire::modules::toolkit::{self, call::CallRequest, ToolContext};

#[derive(Debug, Parser)]
#[command(
    name = "abiwire",
    version,
    about = "abiwire: contract ABI encoding, decoding and read-only calls"
)]
struct Args {
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to $ABIWIRE_CONFIG or ~/.config/abiwire/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, ClapArgs)]
struct EndpointArgs {
    /// HTTP JSON-RPC endpoint (e.g. http://localhost:8545)
    #[arg(long)]
    rpc: Option<String>,

    /// Named endpoint from the config file
    #[arg(long, conflicts_with = "rpc")]
    endpoint: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Function selector of a signature
    Selector { signature: String },

    /// Encode call data for a signature and arguments
    Encode {
        signature: String,
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
        /// Also print the selector and each 32-byte word
        #[arg(long)]
        dump: bool,
    },

    /// Decode return data against a type list, e.g. "(uint256,address[])"
    Decode { types: String, data: String },

    /// Decode function call data; known selectors need no signature
    DecodeCalldata {
        calldata: String,
        signature: Option<String>,
    },

    /// EIP-55 checksum of an address
    Checksum { address: String },

    /// Convert between wei, gwei and ether
    Convert { value: String, unit: Option<String> },

    /// Read-only contract call (eth_call)
    Call {
        #[command(flatten)]
        endpoint: EndpointArgs,

        /// Block tag or number (defaults to the configured tag)
        #[arg(long)]
        block: Option<String>,

        /// Return types, e.g. "(uint256)"
        #[arg(long)]
        returns: Option<String>,

        to: String,
        signature: String,
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// ERC-165 interface support of a contract
    Supports {
        #[command(flatten)]
        endpoint: EndpointArgs,

        address: String,
        /// Interface signatures or 0x selectors
        #[arg(required = true)]
        interfaces: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match &args.config {
        Some(path) => config::load_from(path),
        None => config::load(),
    };
    let ctx = ToolContext::new(&config)?;

    let result = match args.command {
        Command::Selector { signature } => toolkit::selector::selector(&ctx, &signature)?,
        Command::Encode {
            signature,
            args,
            dump,
        } => toolkit::encode::encode(&ctx, &signature, &args, dump)?,
        Command::Decode { types, data } => toolkit::decode::decode(&ctx, &types, &data)?,
        Command::DecodeCalldata {
            calldata,
            signature,
        } => toolkit::decode::decode_calldata(&ctx, &calldata, signature.as_deref())?,
        Command::Checksum { address } => toolkit::checksum::checksum(&address)?,
        Command::Convert { value, unit } => toolkit::convert::convert(&value, unit.as_deref())?,
        Command::Call {
            endpoint,
            block,
            returns,
            to,
            signature,
            args,
        } => {
            let provider = provider_from(&endpoint, &config)?;
            let request = CallRequest {
                to,
                signature,
                args,
                returns,
                block,
            };
            toolkit::call::call(&ctx, provider.as_ref(), &request).await?
        }
        Command::Supports {
            endpoint,
            address,
            interfaces,
        } => {
            let provider = provider_from(&endpoint, &config)?;
            toolkit::call::supports(&ctx, provider, &address, &interfaces).await?
        }
    };

    print!("{}", result);
    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// `--rpc` wins over `--endpoint`, which wins over the first configured endpoint
fn provider_from(args: &EndpointArgs, config: &Config) -> Result<Arc<HttpProvider>> {
    let provider_config = match &args.rpc {
        Some(url) => ProviderConfig::http(url.trim()),
        None => config.endpoint(args.endpoint.as_deref()).with_context(|| {
            match &args.endpoint {
                Some(name) => format!("no endpoint named {:?} with an rpc url in config", name),
                None => {
                    "no RPC endpoint: pass --rpc or add [[endpoints]] to the config".to_string()
                }
            }
        })?,
    };
    tracing::info!(endpoint = %provider_config.display(), "using endpoint");
    let provider = HttpProvider::new(provider_config).context("failed to build HTTP client")?;
    Ok(Arc::new(provider))
}
