use {
    cinder::{
        Cinder, Config, EPOCH_LENGTH, Error, FoldHasher, Header, VerifyMode,
        getwork::Nonce,
    },
    primitive_types::{H256, U256},
    rand::{Rng, SeedableRng, rngs::StdRng},
    std::{fs, sync::Arc, time::Duration},
    tokio::{sync::mpsc, time::timeout},
};

mod seal;

fn test_header(number: u64, difficulty: u64) -> Header {
    Header {
        number,
        difficulty: U256::from(difficulty),
        ..Header::default()
    }
}
