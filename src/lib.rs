use {
    artifact::{Artifact, Cache, Dataset, seed_hash},
    byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt},
    derive_more::Display,
    engine::Inner,
    getwork::{Nonce, Work},
    hasher::keccak256,
    lru::LruCache,
    meter::RateMeter,
    parking_lot::Mutex,
    primitive_types::{H256, U256},
    sealer::Sealer,
    serde::{Deserialize, Serialize},
    sha3::{Digest, Keccak256, Keccak512},
    snafu::{ResultExt, Snafu, ensure},
    std::{
        collections::HashMap,
        fs::{self, File},
        io::{self, Read, Write},
        path::{Path, PathBuf},
        sync::{Arc, LazyLock},
        time::{Duration, Instant, SystemTime},
    },
    store::ArtifactStore,
    tokio::{
        sync::{OnceCell, mpsc, oneshot},
        task,
        time::{MissedTickBehavior, interval},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
    verifier::difficulty_target,
};

pub use {
    api::Api,
    config::{Config, Mode},
    engine::Cinder,
    error::{Error, Result},
    getwork,
    hasher::{FoldHasher, PowHasher},
    header::Header,
    verifier::VerifyMode,
};

mod api;
mod artifact;
mod config;
mod engine;
mod error;
mod hasher;
mod header;
mod meter;
mod sealer;
pub mod sizes;
mod store;
mod verifier;

/// Block heights sharing one generated artifact set.
pub const EPOCH_LENGTH: u64 = 30_000;

/// Remote hashrate reports older than this are excluded and purged.
pub const RATE_EXPIRY: Duration = Duration::from_secs(10);

pub(crate) const RATE_PURGE_INTERVAL: Duration = Duration::from_secs(5);
pub(crate) const LOCAL_RATE_WINDOW: Duration = Duration::from_secs(60);
pub(crate) const SEARCH_REPORT_CHUNK: u64 = 256;

pub(crate) fn epoch_of(block: u64) -> u64 {
    block / EPOCH_LENGTH
}
