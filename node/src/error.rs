use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("storage error: {0}")]
    Storage(#[from] mirror_store_lmdb::LmdbError),

    #[error("governance error: {0}")]
    Governance(#[from] mirror_governance::GovernanceError),

    #[error("RPC server error: {0}")]
    Rpc(#[from] mirror_rpc::RpcError),

    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("integrity client error: {0}")]
    Integrity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
