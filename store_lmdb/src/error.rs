use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("database schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: u32, supported: u32 },
}

impl From<LmdbError> for mirror_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::NotFound(key) => mirror_store::StoreError::NotFound(key),
            LmdbError::Corrupt(msg) => mirror_store::StoreError::Corruption(msg),
            other => mirror_store::StoreError::Backend(other.to_string()),
        }
    }
}
