pub mod clock;
pub mod config;
pub mod faucet;
pub mod gateway;
pub mod local_signer;
pub mod wallet_bridge;

pub use clock::SystemClock;
pub use config::{AdapterConfig, RuntimeProfile};
pub use faucet::FaucetClient;
pub use gateway::LedgerGatewayAdapter;
pub use local_signer::LocalSigner;
pub use wallet_bridge::{BridgeDecision, WalletBridgeSigner};
