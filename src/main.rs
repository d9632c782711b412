//! tonkey-cosign CLI
//!
//! Non-interactive front end over a JSON session file:
//! - `sign`: run a co-signing round and print the authorization
//! - `inspect`: decode an authorization BOC
//! - `derive`: show the key and wallet address a phrase resolves to
//! - `check-config`: validate a settings file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tonkey_cosign::multisig::{parse_authorization, CosignSession, Signer};
use tonkey_cosign::ton::TonAddress;
use tonkey_cosign::utils::decode_bytes;
use tonkey_cosign::wallet::{DerivationScheme, KeyResolver, RecoveryPhrase};
use tonkey_cosign::{CosignSettings, SessionRequest};

/// Co-signer for TON multisig wallets
#[derive(Parser)]
#[command(name = "tonkey-cosign")]
#[command(about = "Assemble M-of-N multisig authorizations for TON wallets")]
#[command(version)]
struct Cli {
    /// Settings file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a co-signing round from a session file
    Sign {
        /// Session file (JSON)
        #[arg(short, long)]
        session: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Decode an authorization BOC (hex or base64)
    Inspect {
        /// Encoded BOC
        boc: String,
    },

    /// Resolve a recovery phrase read from stdin
    Derive {
        #[arg(short, long, default_value = "standard")]
        scheme: DerivationScheme,

        /// Account index to derive
        #[arg(short, long)]
        index: Option<u32>,

        /// Search for the key controlling this address
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Validate the settings file and print warnings
    CheckConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tonkey_cosign=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Sign {
            session,
            output,
            format,
        } => run_sign(&session, output.as_deref(), format, settings),
        Commands::Inspect { boc } => run_inspect(&boc),
        Commands::Derive {
            scheme,
            index,
            address,
        } => run_derive(scheme, index, address.as_deref(), settings),
        Commands::CheckConfig => run_check_config(&settings),
    }
}

fn load_settings(path: Option<&Path>) -> Result<CosignSettings> {
    match path {
        Some(path) => {
            tracing::info!("Loading settings from: {}", path.display());
            Ok(CosignSettings::from_file(path)?)
        }
        None => Ok(CosignSettings::default()),
    }
}

fn run_sign(
    session_path: &Path,
    output: Option<&Path>,
    format: OutputFormat,
    settings: CosignSettings,
) -> Result<()> {
    let contents = std::fs::read_to_string(session_path)
        .with_context(|| format!("reading session file {}", session_path.display()))?;
    let request: SessionRequest =
        serde_json::from_str(&contents).context("parsing session file")?;

    let mut session = CosignSession::from_request(&request, settings)?;
    let message = session.run(&request.participants)?;
    let result = session.output(&message)?;

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&result)?,
        OutputFormat::Text => format!(
            "wallet: {}\nfinal signer: {}\nchain length: {}\nbody hash: {}\nauthorization (base64): {}\nauthorization (hex): {}\nexternal message (base64): {}",
            result.wallet_address,
            result.final_signer_index,
            result.chain_length,
            hex::encode(result.body_hash),
            result.authorization_boc,
            result.authorization_boc_hex,
            result.external_message_boc,
        ),
    };

    match output {
        Some(path) => std::fs::write(path, rendered + "\n")
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", rendered),
    }
    Ok(())
}

fn run_inspect(encoded: &str) -> Result<()> {
    let bytes = decode_bytes(encoded)?;
    let parsed = parse_authorization(&bytes)?;

    let chain: Vec<_> = parsed
        .chain
        .iter()
        .map(|entry| {
            serde_json::json!({
                "participant_index": entry.participant_index,
                "signature": hex::encode(entry.signature),
            })
        })
        .collect();

    let report = serde_json::json!({
        "final_signer_index": parsed.final_signer_index,
        "signature": hex::encode(parsed.signature),
        "body_hash": hex::encode(parsed.body_hash),
        "chain_length": parsed.chain.len(),
        "chain": chain,
        "order_hash": parsed.order.hash_hex(),
        "order_bits": parsed.order.bit_len(),
        "order_refs": parsed.order.refs().len(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_derive(
    scheme: DerivationScheme,
    index: Option<u32>,
    address: Option<&str>,
    settings: CosignSettings,
) -> Result<()> {
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("reading recovery phrase from stdin")?;
    let phrase = RecoveryPhrase::new(&raw);
    zeroize::Zeroize::zeroize(&mut raw);
    let phrase = phrase?;

    let target = address.map(TonAddress::from_string).transpose()?;
    let resolver = KeyResolver::new(&settings)?;
    let resolved = resolver.resolve(&phrase, scheme, index, target.as_ref())?;

    let report = serde_json::json!({
        "scheme": scheme,
        "account_index": resolved.account_index,
        "path": resolved.account_index.and_then(|i| scheme.path(i)).map(|p| p.to_string()),
        "public_key": hex::encode(resolved.keypair.public_key()),
        "wallet_version": scheme.profile().version,
        "address": resolved.address.to_string(),
        "raw_address": resolved.address.to_raw(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_check_config(settings: &CosignSettings) -> Result<()> {
    let warnings = settings.validate()?;
    if warnings.is_empty() {
        println!("settings ok");
        return Ok(());
    }
    for warning in &warnings {
        println!("{}", warning);
    }
    Ok(())
}
