use super::*;

/// Seam for the memory-hard hash primitive. The engine only ever treats it as
/// a pure function from `(artifact, digest, nonce)` to `(mix digest, result)`;
/// consensus-grade implementations are supplied by the embedding client.
///
/// Light hashing recomputes dataset items from the cache on the fly, so it
/// needs the dataset size for index arithmetic even though it never touches
/// dataset bytes. Both paths must agree on the final digests.
pub trait PowHasher: Send + Sync + 'static {
    fn make_cache(&self, bytes: u64, seed: H256) -> Vec<u8>;

    fn make_dataset(&self, bytes: u64, cache: &[u8]) -> Vec<u8>;

    fn hash_light(
        &self,
        dataset_bytes: u64,
        cache: &[u8],
        digest: H256,
        nonce: u64,
    ) -> (H256, H256);

    fn hash_full(&self, dataset: &[u8], digest: H256, nonce: u64) -> (H256, H256);
}

pub(crate) const ITEM_BYTES: usize = 64;

const FOLD_ACCESSES: usize = 4;

/// Keccak-folding stand-in primitive for tests and degenerate mode. Cheap on
/// purpose; not memory-hard, not a consensus primitive.
pub struct FoldHasher;

impl FoldHasher {
    fn item(cache: &[u8], index: u64) -> [u8; ITEM_BYTES] {
        let offset = (index as usize * ITEM_BYTES) % (cache.len() - ITEM_BYTES + 1);
        keccak512(&[&cache[offset..offset + ITEM_BYTES], &index.to_le_bytes()])
    }

    fn fold(
        dataset_bytes: u64,
        digest: H256,
        nonce: u64,
        lookup: impl Fn(u64) -> [u8; ITEM_BYTES],
    ) -> (H256, H256) {
        let items = dataset_bytes / ITEM_BYTES as u64;
        let seed = keccak512(&[digest.as_bytes(), &nonce.to_le_bytes()]);

        let mut mix = seed;
        for _ in 0..FOLD_ACCESSES {
            let index = u64::from_le_bytes(mix[..8].try_into().expect("8 byte prefix")) % items;
            mix = keccak512(&[&mix, &lookup(index)]);
        }

        let mix_digest = keccak256(&[&mix]);
        let result = keccak256(&[&seed, &mix_digest]);

        (H256(mix_digest), H256(result))
    }
}

impl PowHasher for FoldHasher {
    fn make_cache(&self, bytes: u64, seed: H256) -> Vec<u8> {
        let mut cache = Vec::with_capacity(bytes as usize);
        let mut chunk = keccak512(&[seed.as_bytes()]);
        while (cache.len() as u64) < bytes {
            cache.extend_from_slice(&chunk);
            chunk = keccak512(&[&chunk]);
        }
        cache.truncate(bytes as usize);
        cache
    }

    fn make_dataset(&self, bytes: u64, cache: &[u8]) -> Vec<u8> {
        let items = bytes / ITEM_BYTES as u64;
        let mut dataset = Vec::with_capacity(bytes as usize);
        for index in 0..items {
            dataset.extend_from_slice(&Self::item(cache, index));
        }
        dataset
    }

    fn hash_light(
        &self,
        dataset_bytes: u64,
        cache: &[u8],
        digest: H256,
        nonce: u64,
    ) -> (H256, H256) {
        Self::fold(dataset_bytes, digest, nonce, |index| {
            Self::item(cache, index)
        })
    }

    fn hash_full(&self, dataset: &[u8], digest: H256, nonce: u64) -> (H256, H256) {
        Self::fold(dataset.len() as u64, digest, nonce, |index| {
            let offset = index as usize * ITEM_BYTES;
            dataset[offset..offset + ITEM_BYTES]
                .try_into()
                .expect("dataset items are 64 bytes")
        })
    }
}

pub(crate) fn keccak256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

pub(crate) fn keccak512(parts: &[&[u8]]) -> [u8; 64] {
    let mut hasher = Keccak512::new();
    for part in parts {
        hasher.update(part);
    }
    let mut digest = [0u8; 64];
    digest.copy_from_slice(&hasher.finalize());
    digest
}
