use super::*;

/// Minimal sealed-header representation. Chain clients carry richer headers;
/// the engine only needs the fields that feed the sealing digest plus the
/// seal itself (nonce and mix digest).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Header {
    pub parent_hash: H256,
    pub number: u64,
    pub difficulty: U256,
    pub timestamp: u64,
    /// Opaque digest material from the embedding client, e.g. a commitment
    /// to the header fields the engine does not model.
    pub extra: Vec<u8>,
    pub nonce: Nonce,
    pub mix_digest: H256,
}

impl Header {
    pub fn epoch(&self) -> u64 {
        epoch_of(self.number)
    }

    /// Digest of everything except the seal. Submitted solutions are matched
    /// and verified against this hash.
    pub fn seal_hash(&self) -> H256 {
        H256(keccak256(&[
            self.parent_hash.as_bytes(),
            &self.number.to_be_bytes(),
            &self.difficulty.to_big_endian(),
            &self.timestamp.to_be_bytes(),
            &(self.extra.len() as u64).to_be_bytes(),
            &self.extra,
        ]))
    }

    pub fn with_seal(&self, nonce: Nonce, mix_digest: H256) -> Self {
        Self {
            nonce,
            mix_digest,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Header {
        Header {
            parent_hash: H256::repeat_byte(0x42),
            number: 31_337,
            difficulty: U256::from(1000),
            timestamp: 1_700_000_000,
            extra: vec![1, 2, 3],
            ..Header::default()
        }
    }

    #[test]
    fn seal_hash_ignores_the_seal() {
        let header = sample();
        let sealed = header.with_seal(Nonce::from(99), H256::repeat_byte(0x77));
        assert_eq!(header.seal_hash(), sealed.seal_hash());
    }

    #[test]
    fn seal_hash_covers_every_other_field() {
        let base = sample();

        let mut other = base.clone();
        other.number += 1;
        assert_ne!(base.seal_hash(), other.seal_hash());

        let mut other = base.clone();
        other.difficulty += U256::one();
        assert_ne!(base.seal_hash(), other.seal_hash());

        let mut other = base.clone();
        other.parent_hash = H256::zero();
        assert_ne!(base.seal_hash(), other.seal_hash());

        let mut other = base.clone();
        other.timestamp += 1;
        assert_ne!(base.seal_hash(), other.seal_hash());

        let mut other = base.clone();
        other.extra.push(4);
        assert_ne!(base.seal_hash(), other.seal_hash());
    }

    #[test]
    fn epoch_boundaries() {
        let mut header = sample();
        header.number = 0;
        assert_eq!(header.epoch(), 0);
        header.number = EPOCH_LENGTH - 1;
        assert_eq!(header.epoch(), 0);
        header.number = EPOCH_LENGTH;
        assert_eq!(header.epoch(), 1);
    }
}
