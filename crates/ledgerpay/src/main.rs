//! Ledgerpay: submit native-asset payments to a test ledger from the
//! command line, signing locally or through a wallet bridge.

use clap::{Parser, Subcommand};
use ed25519_dalek::SigningKey;
use eyre::{bail, eyre, WrapErr};
use rand::rngs::OsRng;

use ledgerpay_adapters::{
    AdapterConfig, FaucetClient, LedgerGatewayAdapter, LocalSigner, SystemClock, WalletBridgeSigner,
};
use ledgerpay_core::{
    AccountId, FeePolicy, LedgerGateway, NetworkConfig, PaymentRequest, PaymentWorkflow,
    SubmitError, TransferSigner,
};

const DEFAULT_PASSPHRASE: &str = "ledgerpay public test network ; 2026";
const DEFAULT_SECRET_ENV: &str = "LEDGERPAY_SECRET";

#[derive(Parser)]
#[command(name = "ledgerpay", about, version)]
struct Cli {
    /// Ledger-query gateway base URL; falls back to LEDGERPAY_GATEWAY_URL,
    /// then to the in-memory development ledger.
    #[arg(long, global = true)]
    gateway_url: Option<String>,

    /// Target network passphrase baked into every envelope.
    #[arg(long, global = true, default_value = DEFAULT_PASSPHRASE)]
    passphrase: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a fresh keypair and print both halves.
    Keygen,
    /// Ask the faucet to create and fund an account.
    Fund {
        account: String,
        /// Faucet base URL; falls back to LEDGERPAY_FAUCET_URL.
        #[arg(long)]
        faucet_url: Option<String>,
    },
    /// Show an account's sequence number and balances.
    Account { id: String },
    /// Build, sign, and submit a native-asset payment.
    Pay {
        #[arg(long)]
        dest: String,
        #[arg(long)]
        amount: String,
        /// Environment variable holding the signing secret.
        #[arg(long, default_value = DEFAULT_SECRET_ENV, conflicts_with = "bridge")]
        secret_env: String,
        /// Delegate signing to a wallet bridge at this URL instead.
        #[arg(long)]
        bridge: Option<String>,
        /// Fixed fee bid in fee units.
        #[arg(long, default_value_t = 100, conflicts_with = "network_fee")]
        fee: u32,
        /// Bid the network's current base fee instead of a fixed one.
        #[arg(long)]
        network_fee: bool,
        /// Seconds until the envelope expires.
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },
    /// Look up a previously submitted transaction.
    TxStatus { id: String },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AdapterConfig::from_env();
    if cli.gateway_url.is_some() {
        config.gateway_base_url = cli.gateway_url.clone();
    }
    let network = NetworkConfig::new(cli.passphrase.clone());

    match cli.command {
        Command::Keygen => keygen(),
        Command::Fund {
            account,
            faucet_url,
        } => fund(&config, faucet_url, &account).await,
        Command::Account { id } => show_account(&config, &id).await,
        Command::Pay {
            dest,
            amount,
            secret_env,
            bridge,
            fee,
            network_fee,
            timeout,
        } => {
            let request = PaymentRequest {
                destination: dest,
                amount,
                fee: if network_fee {
                    FeePolicy::NetworkBase
                } else {
                    FeePolicy::Fixed(fee)
                },
                timeout_secs: timeout,
            };
            pay(&mut config, network, request, &secret_env, bridge).await
        }
        Command::TxStatus { id } => tx_status(&config, &id).await,
    }
}

fn keygen() -> eyre::Result<()> {
    let key = SigningKey::generate(&mut OsRng);
    let account = AccountId::from_bytes(key.verifying_key().to_bytes());
    println!("account: {account}");
    println!("secret:  ed25519-priv-0x{}", hex::encode(key.to_bytes()));
    println!();
    println!("export {DEFAULT_SECRET_ENV} to sign locally; never share the secret line.");
    Ok(())
}

async fn fund(
    config: &AdapterConfig,
    faucet_url: Option<String>,
    account: &str,
) -> eyre::Result<()> {
    let account: AccountId = account.parse()?;
    let Some(url) = faucet_url.or_else(|| config.faucet_url.clone()) else {
        bail!("no faucet configured; pass --faucet-url or set LEDGERPAY_FAUCET_URL");
    };
    let faucet = FaucetClient::new(url, config.gateway_timeout_ms())?;
    let body = faucet
        .fund(&account)
        .await
        .wrap_err("faucet funding failed")?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

async fn show_account(config: &AdapterConfig, id: &str) -> eyre::Result<()> {
    let id: AccountId = id.parse()?;
    let gateway = LedgerGatewayAdapter::with_config(config)?;
    let snapshot = gateway
        .load_account(&id)
        .await
        .wrap_err("account fetch failed")?;
    println!("account:  {}", snapshot.id);
    println!("sequence: {}", snapshot.sequence);
    for balance in &snapshot.balances {
        println!("balance:  {} {}", balance.amount, balance.asset);
    }
    Ok(())
}

async fn pay(
    config: &mut AdapterConfig,
    network: NetworkConfig,
    request: PaymentRequest,
    secret_env: &str,
    bridge: Option<String>,
) -> eyre::Result<()> {
    let signer: Box<dyn TransferSigner> = match bridge {
        Some(url) => {
            config.wallet_bridge_url = Some(url);
            Box::new(WalletBridgeSigner::with_config(config)?)
        }
        None => {
            let secret = std::env::var(secret_env)
                .map_err(|_| eyre!("environment variable {secret_env} is not set"))?;
            Box::new(LocalSigner::from_secret(&secret)?)
        }
    };

    let gateway = LedgerGatewayAdapter::with_config(config)?;
    let workflow = PaymentWorkflow::new(gateway, signer, SystemClock, network);

    match workflow.submit_payment(request).await {
        Ok(confirmed) => {
            println!("confirmed: {}", confirmed.tx_id);
            println!("result:    {}", confirmed.result_code);
            Ok(())
        }
        Err(SubmitError::SubmissionRejected { code, raw }) => {
            eprintln!("{}", serde_json::to_string_pretty(&raw)?);
            Err(eyre!("ledger rejected the transaction: {code}"))
        }
        Err(err) => {
            if err.caller_retryable() {
                eprintln!(
                    "the transaction may still have landed; check `ledgerpay tx-status` before retrying"
                );
            }
            Err(eyre::Report::new(err))
        }
    }
}

async fn tx_status(config: &AdapterConfig, id: &str) -> eyre::Result<()> {
    let gateway = LedgerGatewayAdapter::with_config(config)?;
    let record = gateway
        .fetch_transaction(id)
        .await
        .wrap_err("transaction lookup failed")?;
    println!("transaction: {}", record.id);
    println!("successful:  {}", record.successful);
    println!("result:      {}", record.result_code);
    Ok(())
}
