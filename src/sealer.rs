use super::*;

/// Handle to the remote sealer. All state transitions are processed one at a
/// time, in submission order, by a single control loop; handles only pass
/// messages, so there is nothing to race on.
#[derive(Clone)]
pub(crate) struct Sealer {
    tx: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
}

enum Command {
    Seal {
        header: Header,
        results: mpsc::Sender<Header>,
    },
    FetchWork {
        reply: oneshot::Sender<Option<Work>>,
    },
    SubmitWork {
        nonce: Nonce,
        seal_hash: H256,
        mix_digest: H256,
        reply: oneshot::Sender<bool>,
    },
    SubmitRate {
        id: H256,
        rate: u64,
        reply: oneshot::Sender<bool>,
    },
    FetchRate {
        reply: oneshot::Sender<f64>,
    },
}

/// The single outstanding sealing job. Depth one on purpose: a new job
/// replaces the old one and stale solutions are rejected by seal hash.
struct CurrentWork {
    work: Work,
    header: Header,
    results: mpsc::Sender<Header>,
}

struct RateReport {
    rate: u64,
    seen: Instant,
}

impl Sealer {
    pub(crate) fn spawn(inner: Arc<Inner>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        task::spawn(ControlLoop::new(inner, cancel.clone()).run(rx));

        Self { tx, cancel }
    }

    pub(crate) fn seal(&self, header: Header, results: mpsc::Sender<Header>) -> Result {
        ensure!(!header.difficulty.is_zero(), error::InvalidDifficultySnafu);
        self.send(Command::Seal { header, results })
    }

    pub(crate) async fn get_work(&self) -> Result<Work> {
        let (reply, response) = oneshot::channel();
        self.send(Command::FetchWork { reply })?;

        match response.await {
            Err(_) => error::StoppedSnafu.fail(),
            Ok(None) => error::NoMiningWorkSnafu.fail(),
            Ok(Some(work)) => Ok(work),
        }
    }

    pub(crate) async fn submit_work(
        &self,
        nonce: Nonce,
        seal_hash: H256,
        mix_digest: H256,
    ) -> bool {
        let (reply, response) = oneshot::channel();

        if self
            .send(Command::SubmitWork {
                nonce,
                seal_hash,
                mix_digest,
                reply,
            })
            .is_err()
        {
            return false;
        }

        response.await.unwrap_or(false)
    }

    pub(crate) async fn submit_hash_rate(&self, rate: u64, id: H256) -> bool {
        let (reply, response) = oneshot::channel();

        if self.send(Command::SubmitRate { id, rate, reply }).is_err() {
            return false;
        }

        response.await.unwrap_or(false)
    }

    pub(crate) async fn hashrate(&self) -> f64 {
        let (reply, response) = oneshot::channel();

        if self.send(Command::FetchRate { reply }).is_err() {
            return 0.0;
        }

        response.await.unwrap_or(0.0)
    }

    /// Idempotent: the token cancels once, later calls are no-ops.
    pub(crate) fn close(&self) {
        self.cancel.cancel();
    }

    fn send(&self, command: Command) -> Result {
        ensure!(!self.cancel.is_cancelled(), error::StoppedSnafu);
        self.tx
            .send(command)
            .map_err(|_| error::StoppedSnafu.build())
    }
}

struct ControlLoop {
    inner: Arc<Inner>,
    cancel: CancellationToken,
    current: Option<CurrentWork>,
    rates: HashMap<H256, RateReport>,
    search: Option<CancellationToken>,
}

impl ControlLoop {
    fn new(inner: Arc<Inner>, cancel: CancellationToken) -> Self {
        Self {
            inner,
            cancel,
            current: None,
            rates: HashMap::new(),
            search: None,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        let cancel = self.cancel.clone();
        let mut purge = interval(RATE_PURGE_INTERVAL);
        purge.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = purge.tick() => self.purge_rates(),
                command = rx.recv() => match command {
                    None => break,
                    Some(command) => self.handle(command).await,
                },
            }
        }

        // dropping rx releases blocked callers with the stopped error
        if let Some(search) = self.search.take() {
            search.cancel();
        }

        debug!("sealer control loop stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Seal { header, results } => self.install(header, results),
            Command::FetchWork { reply } => {
                let _ = reply.send(self.current.as_ref().map(|current| current.work));
            }
            Command::SubmitWork {
                nonce,
                seal_hash,
                mix_digest,
                reply,
            } => {
                let accepted = self.submit(nonce, seal_hash, mix_digest).await;
                let _ = reply.send(accepted);
            }
            Command::SubmitRate { id, rate, reply } => {
                self.rates.insert(
                    id,
                    RateReport {
                        rate,
                        seen: Instant::now(),
                    },
                );
                let _ = reply.send(true);
            }
            Command::FetchRate { reply } => {
                let _ = reply.send(self.total_rate());
            }
        }
    }

    fn install(&mut self, header: Header, results: mpsc::Sender<Header>) {
        let seal_hash = header.seal_hash();

        // idempotent re-push of the identical job
        if self
            .current
            .as_ref()
            .is_some_and(|current| current.work.seal_hash == seal_hash)
        {
            return;
        }

        if let Some(previous) = &self.current {
            // waiters on the superseded job are not notified; producers own
            // their timeouts
            debug!(
                "superseding work for block {} with block {}",
                previous.work.number, header.number
            );
        }

        let work = Work {
            seal_hash,
            seed_hash: seed_hash(header.epoch()),
            target: H256(difficulty_target(header.difficulty).to_big_endian()),
            number: header.number,
        };

        info!("commit new sealing work for block {}", header.number);

        if let Some(search) = self.search.take() {
            search.cancel();
        }

        if self.inner.config.miner_threads > 0 {
            let stop = self.cancel.child_token();
            self.search = Some(stop.clone());
            task::spawn(mine(
                self.inner.clone(),
                header.clone(),
                results.clone(),
                stop,
                self.inner.config.miner_threads,
            ));
        }

        self.current = Some(CurrentWork {
            work,
            header,
            results,
        });
    }

    async fn submit(&mut self, nonce: Nonce, seal_hash: H256, mix_digest: H256) -> bool {
        let Some(current) = &self.current else {
            warn!("work submitted but no pending work exists");
            return false;
        };

        if current.work.seal_hash != seal_hash {
            warn!("submitted work is stale or unknown: 0x{seal_hash:x}");
            return false;
        }

        let sealed = current.header.with_seal(nonce, mix_digest);

        match self.inner.verify_seal(&sealed, VerifyMode::Full).await {
            Err(err) => {
                warn!("invalid proof-of-work submitted: {err}");
                false
            }
            Ok(()) => {
                info!("successfully sealed new block {}", sealed.number);
                if current.results.try_send(sealed).is_err() {
                    warn!(
                        "sealing result is not read by miner for block {}",
                        current.work.number
                    );
                }
                true
            }
        }
    }

    fn purge_rates(&mut self) {
        let now = Instant::now();
        self.rates
            .retain(|_, report| now.duration_since(report.seen) <= RATE_EXPIRY);
    }

    fn total_rate(&self) -> f64 {
        let now = Instant::now();

        let remote: u64 = self
            .rates
            .values()
            .filter(|report| now.duration_since(report.seen) <= RATE_EXPIRY)
            .map(|report| report.rate)
            .sum();

        remote as f64 + self.inner.local_rate.value()
    }
}

/// Local CPU search over the full dataset. Sweeps nonces from random starting
/// points on `threads` blocking workers until a solution lands or the job is
/// superseded.
async fn mine(
    inner: Arc<Inner>,
    header: Header,
    results: mpsc::Sender<Header>,
    stop: CancellationToken,
    threads: usize,
) {
    let dataset = match inner.dataset(header.epoch()).await {
        Ok(dataset) => dataset,
        Err(err) => {
            warn!("local mining aborted, dataset unavailable: {err}");
            return;
        }
    };

    let target = difficulty_target(header.difficulty);

    for index in 0..threads {
        let inner = inner.clone();
        let dataset = dataset.clone();
        let header = header.clone();
        let results = results.clone();
        let stop = stop.clone();

        task::spawn_blocking(move || search(inner, dataset, header, target, results, stop, index));
    }
}

fn search(
    inner: Arc<Inner>,
    dataset: Arc<Dataset>,
    header: Header,
    target: U256,
    results: mpsc::Sender<Header>,
    stop: CancellationToken,
    index: usize,
) {
    let digest = header.seal_hash();
    let mut nonce = rand::random::<u64>();
    let mut attempts = 0u64;

    debug!("search thread {index} started for block {}", header.number);

    loop {
        if stop.is_cancelled() {
            break;
        }

        attempts += 1;
        if attempts % SEARCH_REPORT_CHUNK == 0 {
            inner.local_rate.record(SEARCH_REPORT_CHUNK as f64);
        }

        let (mix_digest, result) = inner.hasher.hash_full(dataset.bytes(), digest, nonce);

        if U256::from_big_endian(result.as_bytes()) <= target {
            stop.cancel();

            let sealed = header.with_seal(Nonce::from(nonce), mix_digest);
            if results.try_send(sealed).is_err() {
                warn!("sealing result is not read by miner");
            } else {
                debug!(
                    "search thread {index} sealed block {} after {attempts} attempts",
                    header.number
                );
            }
            break;
        }

        nonce = nonce.wrapping_add(1);
    }

    inner.local_rate.record((attempts % SEARCH_REPORT_CHUNK) as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control_loop() -> ControlLoop {
        let inner = Inner::open(Config::test(), Arc::new(FoldHasher)).unwrap();
        ControlLoop::new(inner, CancellationToken::new())
    }

    fn header(number: u64, difficulty: u64) -> Header {
        Header {
            number,
            difficulty: U256::from(difficulty),
            ..Header::default()
        }
    }

    #[test]
    fn install_publishes_the_work_tuple() {
        let mut control = control_loop();
        let (tx, _rx) = mpsc::channel(1);

        let header = header(1, 100);
        control.install(header.clone(), tx);

        let current = control.current.as_ref().unwrap();
        assert_eq!(current.work.seal_hash, header.seal_hash());
        assert_eq!(current.work.seed_hash, seed_hash(0));
        assert_eq!(current.work.number, 1);
        assert_eq!(
            current.work.target,
            H256((U256::MAX / U256::from(100)).to_big_endian())
        );
    }

    #[test]
    fn same_height_push_replaces_in_place() {
        let mut control = control_loop();
        let (tx, _rx) = mpsc::channel(1);

        control.install(header(1, 100), tx.clone());
        let first = control.current.as_ref().unwrap().work;

        control.install(header(1, 1000), tx);
        let second = control.current.as_ref().unwrap().work;

        assert_ne!(first.seal_hash, second.seal_hash);
        assert_eq!(second.number, 1);
    }

    #[test]
    fn identical_push_is_idempotent() {
        let mut control = control_loop();
        let (first_tx, _first_rx) = mpsc::channel(1);
        let (second_tx, _second_rx) = mpsc::channel(1);

        control.install(header(1, 100), first_tx);
        control.install(header(1, 100), second_tx);

        // the original result channel stays in place
        assert!(!control.current.as_ref().unwrap().results.is_closed());
        assert_eq!(
            control.current.as_ref().unwrap().work.seal_hash,
            header(1, 100).seal_hash()
        );
    }

    #[test]
    fn purge_drops_expired_reports_only() {
        let mut control = control_loop();

        control.rates.insert(
            H256::repeat_byte(1),
            RateReport {
                rate: 100,
                seen: Instant::now(),
            },
        );
        control.rates.insert(
            H256::repeat_byte(2),
            RateReport {
                rate: 200,
                seen: Instant::now() - (RATE_EXPIRY + Duration::from_secs(1)),
            },
        );

        control.purge_rates();

        assert_eq!(control.rates.len(), 1);
        assert_eq!(control.total_rate(), 100.0);
    }

    #[tokio::test]
    async fn stale_submission_is_rejected() {
        let mut control = control_loop();
        let (tx, _rx) = mpsc::channel(1);

        let old = header(1, 100);
        control.install(old.clone(), tx.clone());
        control.install(header(2, 100), tx);

        let accepted = control
            .submit(Nonce::from(0), old.seal_hash(), H256::zero())
            .await;
        assert!(!accepted);
    }
}
