use {super::*, anyhow::Context};

fn mining_tester() -> Cinder {
    Cinder::new(
        Config {
            miner_threads: 1,
            ..Config::test()
        },
        Arc::new(FoldHasher),
    )
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn seal_and_verify_roundtrip() -> anyhow::Result<()> {
    let engine = mining_tester();
    let (results, mut solutions) = mpsc::channel(1);

    let header = test_header(1, 100);
    engine.seal(header.clone(), results)?;

    let sealed = timeout(Duration::from_secs(10), solutions.recv())
        .await?
        .context("result channel closed")?;

    assert_eq!(sealed.seal_hash(), header.seal_hash());
    assert_eq!(sealed.number, 1);

    engine.verify_seal(&sealed, VerifyMode::Light).await?;
    engine.verify_seal(&sealed, VerifyMode::Full).await?;

    engine.close();

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn tampered_solution_fails_verification() {
    let engine = mining_tester();
    let (results, mut solutions) = mpsc::channel(1);

    engine.seal(test_header(1, 100), results).unwrap();

    let mut sealed = timeout(Duration::from_secs(10), solutions.recv())
        .await
        .expect("sealing result timeout")
        .expect("result channel closed");

    sealed.mix_digest = H256::repeat_byte(0x5a);

    assert!(matches!(
        engine.verify_seal(&sealed, VerifyMode::Light).await,
        Err(Error::InvalidMixDigest)
    ));

    engine.close();
}

#[tokio::test]
async fn zero_difficulty_work_is_refused() {
    let engine = Cinder::tester();
    let (results, _solutions) = mpsc::channel(1);

    assert!(matches!(
        engine.seal(test_header(1, 0), results),
        Err(Error::InvalidDifficulty)
    ));

    engine.close();
}

#[tokio::test(flavor = "multi_thread")]
async fn local_mining_feeds_the_hashrate_meter() {
    let engine = mining_tester();
    let (results, mut solutions) = mpsc::channel(1);

    // hard enough to guarantee a few hundred attempts
    engine.seal(test_header(1, 1 << 12), results).unwrap();

    let _sealed = timeout(Duration::from_secs(30), solutions.recv())
        .await
        .expect("sealing result timeout")
        .expect("result channel closed");

    assert!(engine.hashrate().await > 0.0);

    engine.close();
}
