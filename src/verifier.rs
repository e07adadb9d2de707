use super::*;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum VerifyMode {
    /// Verify with the small cache only, recomputing dataset items on the
    /// fly. The path taken by syncing nodes.
    #[display("light")]
    Light,
    /// Verify against the full mining dataset.
    #[display("full")]
    Full,
}

/// The share boundary: results at or below `2^256 / difficulty` satisfy the
/// proof of work. Difficulty must be non-zero.
pub(crate) fn difficulty_target(difficulty: U256) -> U256 {
    U256::MAX / difficulty
}

impl Inner {
    /// Checks that `header`'s nonce and mix digest satisfy its declared
    /// difficulty. Pulls the epoch's artifact from the store, blocking until
    /// generation completes on a cold epoch. Safe to call from many
    /// verification tasks at once; bookkeeping is synchronized inside the
    /// store and artifact bytes are immutable.
    pub(crate) async fn verify_seal(&self, header: &Header, mode: VerifyMode) -> Result {
        ensure!(!header.difficulty.is_zero(), error::InvalidDifficultySnafu);

        let epoch = header.epoch();
        let digest = header.seal_hash();
        let nonce = header.nonce.to_u64();

        let (mix_digest, result) = match mode {
            VerifyMode::Light => {
                let cache = self.cache(epoch).await?;
                self.hasher.hash_light(
                    self.config.dataset_bytes(epoch),
                    cache.bytes(),
                    digest,
                    nonce,
                )
            }
            VerifyMode::Full => {
                let dataset = self.dataset(epoch).await?;
                self.hasher.hash_full(dataset.bytes(), digest, nonce)
            }
        };

        ensure!(mix_digest == header.mix_digest, error::InvalidMixDigestSnafu);

        ensure!(
            U256::from_big_endian(result.as_bytes()) <= difficulty_target(header.difficulty),
            error::InvalidProofOfWorkSnafu
        );

        Ok(())
    }
}
