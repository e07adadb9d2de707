use super::*;

const DUMP_MAGIC: [u8; 8] = *b"CNDRDUMP";

/// Bumped whenever generation or the dump layout changes; old dumps are
/// treated as corrupt and regenerated.
const DUMP_REVISION: u32 = 1;

/// Epoch seed: 32 zero bytes folded through keccak-256 once per epoch.
pub fn seed_hash(epoch: u64) -> H256 {
    let mut seed = [0u8; 32];
    for _ in 0..epoch {
        seed = keccak256(&[&seed]);
    }
    H256(seed)
}

/// An epoch-keyed generated artifact. Bytes are immutable once generated and
/// shared read-only between verifiers; the store owns all bookkeeping.
pub(crate) trait Artifact: Send + Sync + Sized + 'static {
    const KIND: &'static str;

    fn epoch(&self) -> u64;

    fn bytes(&self) -> &[u8];

    fn expected_bytes(config: &Config, epoch: u64) -> u64;

    fn generate(config: &Config, hasher: &dyn PowHasher, epoch: u64) -> Self;

    fn from_bytes(epoch: u64, bytes: Vec<u8>) -> Self;
}

pub(crate) struct Cache {
    epoch: u64,
    bytes: Vec<u8>,
}

impl Artifact for Cache {
    const KIND: &'static str = "cache";

    fn epoch(&self) -> u64 {
        self.epoch
    }

    fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn expected_bytes(config: &Config, epoch: u64) -> u64 {
        config.cache_bytes(epoch)
    }

    fn generate(config: &Config, hasher: &dyn PowHasher, epoch: u64) -> Self {
        let started = Instant::now();
        let bytes = hasher.make_cache(config.cache_bytes(epoch), seed_hash(epoch));
        info!(
            "generated verification cache for epoch {epoch} in {:?}",
            started.elapsed()
        );
        Self { epoch, bytes }
    }

    fn from_bytes(epoch: u64, bytes: Vec<u8>) -> Self {
        Self { epoch, bytes }
    }
}

pub(crate) struct Dataset {
    epoch: u64,
    bytes: Vec<u8>,
}

impl Artifact for Dataset {
    const KIND: &'static str = "dataset";

    fn epoch(&self) -> u64 {
        self.epoch
    }

    fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn expected_bytes(config: &Config, epoch: u64) -> u64 {
        config.dataset_bytes(epoch)
    }

    fn generate(config: &Config, hasher: &dyn PowHasher, epoch: u64) -> Self {
        let started = Instant::now();
        let cache = hasher.make_cache(config.cache_bytes(epoch), seed_hash(epoch));
        let bytes = hasher.make_dataset(config.dataset_bytes(epoch), &cache);
        info!(
            "generated mining dataset for epoch {epoch} in {:?}",
            started.elapsed()
        );
        Self { epoch, bytes }
    }

    fn from_bytes(epoch: u64, bytes: Vec<u8>) -> Self {
        Self { epoch, bytes }
    }
}

pub(crate) fn dump_path(dir: &Path, kind: &str, epoch: u64) -> PathBuf {
    let seed = seed_hash(epoch);
    dir.join(format!(
        "{kind}-r{DUMP_REVISION}-{epoch:05}-{}.bin",
        hex::encode(&seed.as_bytes()[..8])
    ))
}

pub(crate) fn dump<A: Artifact>(dir: &Path, artifact: &A) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let path = dump_path(dir, A::KIND, artifact.epoch());
    let mut file = File::create(&path)?;
    file.write_all(&DUMP_MAGIC)?;
    file.write_u32::<LittleEndian>(DUMP_REVISION)?;
    file.write_u64::<LittleEndian>(artifact.bytes().len() as u64)?;
    file.write_all(artifact.bytes())?;
    file.sync_all()?;

    Ok(path)
}

/// Reloads a previously spilled artifact. Any mismatch in magic, revision or
/// payload size marks the dump as corrupt and the caller regenerates.
pub(crate) fn load<A: Artifact>(dir: &Path, config: &Config, epoch: u64) -> Option<A> {
    let path = dump_path(dir, A::KIND, epoch);
    if !path.exists() {
        return None;
    }

    match read_dump(&path, A::expected_bytes(config, epoch)) {
        Ok(bytes) => Some(A::from_bytes(epoch, bytes)),
        Err(err) => {
            warn!(
                "treating {} dump for epoch {epoch} as corrupt ({err}), regenerating",
                A::KIND
            );
            None
        }
    }
}

fn read_dump(path: &Path, expected: u64) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;

    let mut magic = [0u8; 8];
    file.read_exact(&mut magic)?;
    if magic != DUMP_MAGIC {
        return Err(io::Error::other("bad magic"));
    }

    if file.read_u32::<LittleEndian>()? != DUMP_REVISION {
        return Err(io::Error::other("stale revision"));
    }

    let len = file.read_u64::<LittleEndian>()?;
    if len != expected {
        return Err(io::Error::other(format!(
            "payload length {len}, expected {expected}"
        )));
    }

    let mut bytes = vec![0u8; len as usize];
    file.read_exact(&mut bytes)?;

    if file.read(&mut [0u8; 1])? != 0 {
        return Err(io::Error::other("trailing bytes"));
    }

    Ok(bytes)
}

/// Drops the oldest dumps of `kind`, by modification time, until at most
/// `keep` remain.
pub(crate) fn prune_dumps(dir: &Path, kind: &str, keep: usize) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    let prefix = format!("{kind}-");
    let mut dumps = Vec::new();

    for entry in entries.flatten() {
        if !entry.file_name().to_string_lossy().starts_with(&prefix) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|metadata| metadata.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        dumps.push((modified, entry.path()));
    }

    dumps.sort();

    while dumps.len() > keep {
        let (_, path) = dumps.remove(0);
        match fs::remove_file(&path) {
            Ok(()) => debug!("pruned old {kind} dump {}", path.display()),
            Err(err) => warn!("failed to prune {}: {err}", path.display()),
        }
    }
}
