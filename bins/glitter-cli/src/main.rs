//! glitter-cli — offline driver for the Glitter SQL chain.
//!
//! Derives account addresses, generates mnemonics and signs SQL
//! transactions without touching the network. The mnemonic is read from
//! the `GLITTER_MNEMONIC` environment variable, never from the command line.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use glitter_core::address::Address;
use glitter_core::argument::Arguments;
use glitter_core::error::TransportError;
use glitter_core::statement::Statement;
use glitter_core::traits::AccountInfoSource;
use glitter_core::types::AccountInfo;
use glitter_core::value::Value;
use glitter_wallet::keys::GLITTER_COIN_TYPE;
use glitter_wallet::{assemble_and_sign, derive_with, ChainConfig, Mnemonic, PathPolicy};
use tracing::{debug, info};

const MNEMONIC_ENV: &str = "GLITTER_MNEMONIC";

/// Account source for offline signing: every lookup fails, so metadata must
/// be supplied on the command line.
struct Offline;

#[async_trait]
impl AccountInfoSource for Offline {
    async fn account_info(&self, address: &Address) -> Result<AccountInfo, TransportError> {
        Err(TransportError::new(
            None,
            format!("offline: no account metadata for {address}"),
        ))
    }
}

/// Glitter command-line driver.
#[derive(Parser)]
#[command(name = "glitter-cli")]
#[command(version, about = "Offline key and transaction tool for Glitter")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    /// Bech32 prefix for addresses.
    #[arg(long, global = true, default_value = "glitter")]
    prefix: String,

    /// Derive along m/44'/coin'/account'/0/index instead of the fixed
    /// account tree.
    #[arg(long, global = true)]
    follow_path: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive and print an account address.
    Address(AddressArgs),
    /// Generate a fresh 24-word mnemonic.
    NewMnemonic,
    /// Sign a SQL statement with pre-supplied account metadata.
    SignExec(SignExecArgs),
}

#[derive(Args)]
struct AddressArgs {
    /// Address index.
    #[arg(long, default_value_t = 0)]
    index: u32,

    /// Account segment (ignored under the fixed account tree).
    #[arg(long, default_value_t = 0)]
    account: u32,

    /// SLIP-44 coin type (ignored under the fixed account tree).
    #[arg(long, default_value_t = GLITTER_COIN_TYPE)]
    coin_type: u32,
}

#[derive(Args)]
struct SignExecArgs {
    /// SQL text with `?` placeholders.
    #[arg(long)]
    sql: String,

    /// Positional argument as `kind:value`, where kind is one of
    /// int, uint, float, bool, string or bytes (hex). Repeatable.
    #[arg(long = "arg")]
    args: Vec<String>,

    #[arg(long)]
    account_number: u64,

    #[arg(long)]
    sequence: u64,

    #[arg(long)]
    chain_id: String,

    /// Address index of the signing key.
    #[arg(long, default_value_t = 0)]
    index: u32,

    /// Memo override.
    #[arg(long)]
    memo: Option<String>,

    /// Gas limit; 0 lets the service estimate.
    #[arg(long, default_value_t = 0)]
    gas_limit: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    let policy = if cli.follow_path {
        PathPolicy::FollowPath
    } else {
        PathPolicy::FixedAccountTree
    };

    match cli.command {
        Commands::Address(args) => show_address(args, policy, &cli.prefix),
        Commands::NewMnemonic => new_mnemonic(),
        Commands::SignExec(args) => sign_exec(args, policy, &cli.prefix).await,
    }
}

fn show_address(args: AddressArgs, policy: PathPolicy, prefix: &str) -> Result<()> {
    let mnemonic = read_mnemonic()?;
    let hrp = glitter_core::address::parse_hrp(prefix).context("Invalid address prefix")?;
    let (signer, address) = derive_with(&mnemonic, args.account, args.index, args.coin_type, policy, hrp)
        .context("Key derivation failed")?;

    let path = signer.hd_path().map(|p| p.to_string()).unwrap_or_default();
    let output = serde_json::json!({
        "path": path,
        "address": address.encode().context("Failed to encode address")?,
        "hex": address.to_hex(),
        "public_key": signer.public_key().to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn new_mnemonic() -> Result<()> {
    let mnemonic = Mnemonic::generate().context("Failed to generate mnemonic")?;
    println!("{}", mnemonic.phrase());
    Ok(())
}

async fn sign_exec(args: SignExecArgs, policy: PathPolicy, prefix: &str) -> Result<()> {
    let mnemonic = read_mnemonic()?;

    let mut config = ChainConfig::new(args.chain_id);
    config.address_prefix = prefix.to_string();
    config.gas_limit = args.gas_limit;
    config.path_policy = policy;
    if let Some(memo) = args.memo {
        config.memo = memo;
    }
    config.validate().context("Invalid chain configuration")?;

    let (signer, _) = derive_with(&mnemonic, 0, args.index, GLITTER_COIN_TYPE, policy, config.hrp()?)
        .context("Key derivation failed")?;

    let mut arguments = Arguments::new();
    for raw in &args.args {
        let value = parse_arg(raw).with_context(|| format!("Invalid --arg {raw:?}"))?;
        arguments = arguments
            .with_value(&value)
            .with_context(|| format!("Unsupported --arg {raw:?}"))?;
    }
    let statement = Statement::new(args.sql, arguments).context("Invalid statement")?;
    debug!(statement_len = statement.sql().len(), arguments = statement.arguments().len(), "built statement");

    let tx = assemble_and_sign(
        &config,
        &Offline,
        &signer,
        statement,
        Some(args.account_number),
        Some(args.sequence),
    )
    .await
    .context("Failed to sign transaction")?;

    let tx_hash = tx.tx_hash()?;
    info!(address = %signer.address(), sequence = tx.sequence, tx_hash = %tx_hash, "signed transaction");

    let output = serde_json::json!({
        "chain_id": tx.chain_id,
        "account_number": tx.account_number,
        "sequence": tx.sequence,
        "body": tx.body,
        "fee": tx.fee,
        "public_key": hex::encode(&tx.public_key),
        "signature": hex::encode(&tx.signature),
        "tx_hash": tx_hash,
        "wire": tx.to_wire()?,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn read_mnemonic() -> Result<Mnemonic> {
    let phrase = std::env::var(MNEMONIC_ENV).with_context(|| format!("{MNEMONIC_ENV} is not set"))?;
    Mnemonic::parse(&phrase).context("Invalid mnemonic")
}

/// Parse `kind:value` into a native value.
fn parse_arg(raw: &str) -> Result<Value> {
    let Some((kind, value)) = raw.split_once(':') else {
        bail!("expected kind:value");
    };
    let parsed = match kind.to_ascii_lowercase().as_str() {
        "int" => Value::Int(value.parse().context("not an integer")?),
        "uint" => Value::Uint(value.parse().context("not an unsigned integer")?),
        "float" => Value::Float(value.parse().context("not a float")?),
        "bool" => match value.to_ascii_lowercase().as_str() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => bail!("not a boolean"),
        },
        "string" | "str" => Value::String(value.to_string()),
        "bytes" => Value::Bytes(hex::decode(value.trim_start_matches("0x")).context("bytes must be hex")?),
        other => bail!("unknown kind {other:?}"),
    };
    Ok(parsed)
}

/// Initialise the tracing subscriber.
///
/// `RUST_LOG` overrides `--log-level`. Logs go to stderr so stdout stays
/// machine-readable.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_arg_kinds() {
        assert_eq!(parse_arg("int:-4").unwrap(), Value::Int(-4));
        assert_eq!(parse_arg("UINT:4").unwrap(), Value::Uint(4));
        assert_eq!(parse_arg("float:1.5").unwrap(), Value::Float(1.5));
        assert_eq!(parse_arg("bool:True").unwrap(), Value::Bool(true));
        assert_eq!(parse_arg("string:a:b").unwrap(), Value::from("a:b"));
        assert_eq!(parse_arg("bytes:0x00ff").unwrap(), Value::Bytes(vec![0, 255]));
    }

    #[test]
    fn parse_arg_rejects_malformed() {
        assert!(parse_arg("novalue").is_err());
        assert!(parse_arg("int:abc").is_err());
        assert!(parse_arg("bool:yes").is_err());
        assert!(parse_arg("date:2024-01-01").is_err());
    }

    #[tokio::test]
    async fn offline_source_always_fails() {
        let address: Address = "glitter17w0adeg64ky0daxwd2ugyuneellmjgnx359muv".parse().unwrap();
        let err = Offline.account_info(&address).await.unwrap_err();
        assert_eq!(err.status, None);
    }
}
