use super::*;

/// Epoch-keyed store for one artifact kind. In-memory entries form an LRU
/// ring with a hard bound; evicted artifacts spill to disk (bounded, oldest
/// dump first) and reload on demand. Generation is single-flight per epoch:
/// concurrent `get`s for an ungenerated epoch block on one generation and all
/// observe the same artifact.
pub(crate) struct ArtifactStore<A: Artifact> {
    config: Arc<Config>,
    hasher: Arc<dyn PowHasher>,
    in_mem: usize,
    on_disk: usize,
    dir: Option<PathBuf>,
    slots: Mutex<LruCache<u64, Arc<Slot<A>>>>,
}

struct Slot<A> {
    epoch: u64,
    cell: OnceCell<Arc<A>>,
}

impl<A: Artifact> ArtifactStore<A> {
    pub(crate) fn new(
        config: Arc<Config>,
        hasher: Arc<dyn PowHasher>,
        in_mem: usize,
        on_disk: usize,
        dir: Option<PathBuf>,
    ) -> Self {
        Self {
            config,
            hasher,
            in_mem,
            on_disk,
            dir,
            slots: Mutex::new(LruCache::unbounded()),
        }
    }

    /// Returns the artifact for `epoch`, generating or reloading it if it is
    /// not in memory. Suspends until the artifact is ready.
    pub(crate) async fn get(&self, epoch: u64) -> Result<Arc<A>> {
        let slot = {
            let mut slots = self.slots.lock();
            match slots.get(&epoch) {
                Some(slot) => slot.clone(),
                None => {
                    let slot = Arc::new(Slot {
                        epoch,
                        cell: OnceCell::new(),
                    });
                    slots.put(epoch, slot.clone());
                    slot
                }
            }
        };

        self.enforce_mem_bound().await;

        let artifact = slot
            .cell
            .get_or_try_init(|| self.generate(epoch))
            .await?
            .clone();

        Ok(artifact)
    }

    /// Fire-and-forget warm-up for an upcoming epoch.
    pub(crate) fn prefetch(self: &Arc<Self>, epoch: u64) {
        if self.slots.lock().contains(&epoch) {
            return;
        }

        let store = self.clone();
        task::spawn(async move {
            if let Err(err) = store.get(epoch).await {
                warn!("pre-generation of {} for epoch {epoch} failed: {err}", A::KIND);
            }
        });
    }

    async fn generate(&self, epoch: u64) -> Result<Arc<A>> {
        let config = self.config.clone();
        let hasher = self.hasher.clone();
        let dir = self.dir.clone();

        let artifact = task::spawn_blocking(move || {
            if let Some(dir) = &dir {
                if let Some(artifact) = artifact::load::<A>(dir, &config, epoch) {
                    debug!("reloaded {} for epoch {epoch} from disk", A::KIND);
                    return artifact;
                }
            }
            A::generate(&config, hasher.as_ref(), epoch)
        })
        .await
        .context(error::GenerationSnafu {
            kind: A::KIND,
            epoch,
        })?;

        Ok(Arc::new(artifact))
    }

    /// Evicts least-recently-used slots until the in-memory bound holds,
    /// spilling generated artifacts that have no dump yet. Slots pinned by an
    /// in-flight generation are skipped; if every slot is pinned, generated
    /// entries go first since readers hold their own `Arc`s.
    async fn enforce_mem_bound(&self) {
        loop {
            let victim = {
                let mut slots = self.slots.lock();
                if slots.len() <= self.in_mem {
                    return;
                }
                self.pick_victim(&mut slots)
            };

            match victim {
                Some(slot) => self.spill(slot).await,
                None => return,
            }
        }
    }

    fn pick_victim(&self, slots: &mut LruCache<u64, Arc<Slot<A>>>) -> Option<Arc<Slot<A>>> {
        // keys from least to most recently used
        let keys: Vec<u64> = slots.iter().map(|(epoch, _)| *epoch).collect();

        for epoch in keys.iter().rev() {
            let slot = slots.peek(epoch).expect("key just listed");
            if Arc::strong_count(slot) == 1 {
                return slots.pop(epoch);
            }
        }

        for epoch in keys.iter().rev() {
            let slot = slots.peek(epoch).expect("key just listed");
            if slot.cell.initialized() {
                return slots.pop(epoch);
            }
        }

        // everything is mid-generation; leave the bound to the next call
        None
    }

    async fn spill(&self, slot: Arc<Slot<A>>) {
        let Some(artifact) = slot.cell.get().cloned() else {
            return;
        };

        let (Some(dir), true) = (self.dir.clone(), self.on_disk > 0) else {
            return;
        };

        let on_disk = self.on_disk;
        let epoch = slot.epoch;

        let outcome = task::spawn_blocking(move || {
            let path = artifact::dump_path(&dir, A::KIND, epoch);
            if !path.exists() {
                artifact::dump(&dir, artifact.as_ref())?;
            }
            artifact::prune_dumps(&dir, A::KIND, on_disk);
            Ok::<_, io::Error>(())
        })
        .await;

        match outcome {
            Ok(Ok(())) => debug!("spilled {} for epoch {epoch} to disk", A::KIND),
            Ok(Err(err)) => warn!("failed to spill {} for epoch {epoch}: {err}", A::KIND),
            Err(err) => warn!("spill task for {} epoch {epoch} failed: {err}", A::KIND),
        }
    }

    #[cfg(test)]
    pub(crate) fn in_memory(&self) -> usize {
        self.slots.lock().len()
    }
}
