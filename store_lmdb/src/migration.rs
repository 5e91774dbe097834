//! Database schema versioning.
//!
//! Tracks a monotonically increasing schema version in the meta database and
//! runs sequential migration steps to bring an older database up to date.

use crate::environment::LmdbEnvironment;
use crate::keys::META_SCHEMA_VERSION;
use crate::LmdbError;

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Runs database migrations to bring the schema up to date.
pub struct Migrator;

impl Migrator {
    /// Check the stored schema version and run any needed migrations.
    ///
    /// Version 0 means a fresh database. A stored version higher than
    /// [`CURRENT_SCHEMA_VERSION`] was written by newer code and is refused.
    pub fn run(env: &LmdbEnvironment) -> Result<(), LmdbError> {
        let current = Self::stored_version(env)?;

        if current == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = current, "database schema is up to date");
            return Ok(());
        }
        if current > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::UnsupportedSchema {
                found: current,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        for version in current..CURRENT_SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running migration");
            run_migration(version, version + 1)?;
        }

        let mut wtxn = env.env.write_txn()?;
        env.meta_db.put(
            &mut wtxn,
            META_SCHEMA_VERSION,
            &CURRENT_SCHEMA_VERSION.to_le_bytes(),
        )?;
        wtxn.commit()?;
        tracing::info!(version = CURRENT_SCHEMA_VERSION, "migration complete");
        Ok(())
    }

    pub fn stored_version(env: &LmdbEnvironment) -> Result<u32, LmdbError> {
        let rtxn = env.env.read_txn()?;
        match env.meta_db.get(&rtxn, META_SCHEMA_VERSION)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes
                    .try_into()
                    .map_err(|_| LmdbError::Corrupt("schema_version has unexpected length".into()))?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }
}

fn run_migration(from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        // Initial schema: nothing to migrate from a blank slate.
        (0, 1) => Ok(()),
        _ => Err(LmdbError::Corrupt(format!("unknown migration: {from} -> {to}"))),
    }
}
