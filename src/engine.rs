use super::*;

/// The consensus engine: epoch-sized artifact stores, seal verification and
/// the remote sealer. Cheap to clone; all clones share one engine.
///
/// Must be created inside a tokio runtime, which hosts the sealer loop and
/// background generation tasks.
#[derive(Clone)]
pub struct Cinder {
    inner: Arc<Inner>,
    sealer: Sealer,
}

pub(crate) struct Inner {
    pub(crate) config: Arc<Config>,
    pub(crate) hasher: Arc<dyn PowHasher>,
    pub(crate) caches: Arc<ArtifactStore<Cache>>,
    pub(crate) datasets: Arc<ArtifactStore<Dataset>>,
    pub(crate) local_rate: RateMeter,
}

impl Inner {
    pub(crate) fn open(config: Config, hasher: Arc<dyn PowHasher>) -> Result<Arc<Self>> {
        config.validate()?;
        sizes::verify_tables()?;

        let config = Arc::new(config);

        let caches = Arc::new(ArtifactStore::new(
            config.clone(),
            hasher.clone(),
            config.caches_in_mem,
            config.caches_on_disk,
            config.cache_dir.clone(),
        ));

        let datasets = Arc::new(ArtifactStore::new(
            config.clone(),
            hasher.clone(),
            config.datasets_in_mem,
            config.datasets_on_disk,
            config.dataset_dir.clone(),
        ));

        Ok(Arc::new(Self {
            config,
            hasher,
            caches,
            datasets,
            local_rate: RateMeter::new(LOCAL_RATE_WINDOW),
        }))
    }

    /// Verification cache for `epoch`, with a warm-up hint for the next one.
    pub(crate) async fn cache(&self, epoch: u64) -> Result<Arc<Cache>> {
        let cache = self.caches.get(epoch).await?;
        self.caches.prefetch(epoch + 1);
        Ok(cache)
    }

    /// Mining dataset for `epoch`, with a warm-up hint for the next one.
    pub(crate) async fn dataset(&self, epoch: u64) -> Result<Arc<Dataset>> {
        let dataset = self.datasets.get(epoch).await?;
        self.datasets.prefetch(epoch + 1);
        Ok(dataset)
    }
}

impl Cinder {
    pub fn new(config: Config, hasher: Arc<dyn PowHasher>) -> Result<Self> {
        info!("starting consensus engine in {} mode", config.mode);

        let inner = Inner::open(config, hasher)?;
        let sealer = Sealer::spawn(inner.clone());

        Ok(Self { inner, sealer })
    }

    /// Degenerate engine for exercising the full machinery without the cost
    /// of real artifact generation.
    pub fn tester() -> Self {
        Self::new(Config::test(), Arc::new(FoldHasher)).expect("test config is valid")
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub async fn verify_seal(&self, header: &Header, mode: VerifyMode) -> Result {
        self.inner.verify_seal(header, mode).await
    }

    /// Installs `header` as the outstanding sealing job and returns
    /// immediately. The solved header arrives on `results`; superseding the
    /// job leaves earlier waiters unnotified, so producers own their
    /// timeouts.
    pub fn seal(&self, header: Header, results: mpsc::Sender<Header>) -> Result {
        self.sealer.seal(header, results)
    }

    pub async fn get_work(&self) -> Result<Work> {
        self.sealer.get_work().await
    }

    pub async fn submit_work(&self, nonce: Nonce, seal_hash: H256, mix_digest: H256) -> bool {
        self.sealer.submit_work(nonce, seal_hash, mix_digest).await
    }

    pub async fn submit_hash_rate(&self, rate: u64, id: H256) -> bool {
        self.sealer.submit_hash_rate(rate, id).await
    }

    /// Sum of non-expired remote reports plus the locally measured rate.
    pub async fn hashrate(&self) -> f64 {
        self.sealer.hashrate().await
    }

    /// Stops the sealer. Idempotent; all subsequent protocol operations fail
    /// fast with `Error::Stopped` or `false`.
    pub fn close(&self) {
        self.sealer.close();
    }

    pub fn api(&self) -> Api {
        Api::new(self.clone())
    }
}
