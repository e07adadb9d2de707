use super::*;

/// Transport-agnostic face of the remote mining protocol. An RPC layer maps
/// these four calls 1:1 onto network methods; everything here is plain data
/// in and out.
#[derive(Clone)]
pub struct Api {
    engine: Cinder,
}

impl Api {
    pub fn new(engine: Cinder) -> Self {
        Self { engine }
    }

    /// The outstanding work tuple, or `NoMiningWork` before the first seal,
    /// or `Stopped` after close.
    pub async fn get_work(&self) -> Result<Work> {
        self.engine.get_work().await
    }

    /// `true` only if the solution matches the pending work and verifies in
    /// full mode. Stale, unknown and invalid solutions all return `false`.
    pub async fn submit_work(&self, nonce: Nonce, seal_hash: H256, mix_digest: H256) -> bool {
        self.engine.submit_work(nonce, seal_hash, mix_digest).await
    }

    /// Upserts the reporting worker's rate; `false` after close.
    pub async fn submit_hash_rate(&self, rate: u64, id: H256) -> bool {
        self.engine.submit_hash_rate(rate, id).await
    }

    pub async fn hashrate(&self) -> f64 {
        self.engine.hashrate().await
    }
}
