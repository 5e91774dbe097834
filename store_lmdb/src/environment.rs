//! LMDB environment setup.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::governance::LmdbGovernanceStore;
use crate::migration::Migrator;
use crate::LmdbError;

/// Number of named databases the environment needs.
const MAX_DBS: u32 = 8;

/// Default map size (1 GiB); LMDB only reserves address space.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and all database handles.
#[derive(Clone)]
pub struct LmdbEnvironment {
    pub(crate) env: Env,
    pub(crate) proposals_db: Database<Bytes, Bytes>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
    pub(crate) amendments_db: Database<Bytes, Bytes>,
    pub(crate) amendment_index_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process for this path;
        // callers must not open the same directory from two environments.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let proposals_db = env.create_database(&mut wtxn, Some("proposals"))?;
        let votes_db = env.create_database(&mut wtxn, Some("votes"))?;
        let amendments_db = env.create_database(&mut wtxn, Some("amendments"))?;
        let amendment_index_db = env.create_database(&mut wtxn, Some("amendment_index"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let this = Self {
            env,
            proposals_db,
            votes_db,
            amendments_db,
            amendment_index_db,
            meta_db,
        };
        Migrator::run(&this)?;
        tracing::info!(path = %path.display(), "opened LMDB environment");
        Ok(this)
    }

    /// Store handle implementing both governance and amendment traits.
    pub fn governance_store(&self) -> LmdbGovernanceStore {
        LmdbGovernanceStore::new(self.clone())
    }

    /// Force dirty pages to disk.
    pub fn sync(&self) -> Result<(), LmdbError> {
        self.env.force_sync()?;
        Ok(())
    }
}
