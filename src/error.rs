use super::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("invalid configuration: {reason}"))]
    Config { reason: String },
    #[snafu(display("no mining work available yet"))]
    NoMiningWork,
    #[snafu(display("sealer stopped"))]
    Stopped,
    #[snafu(display("non-positive difficulty"))]
    InvalidDifficulty,
    #[snafu(display("mix digest mismatch"))]
    InvalidMixDigest,
    #[snafu(display("proof-of-work result above target"))]
    InvalidProofOfWork,
    #[snafu(display("artifact generation for {kind} epoch {epoch} failed: {source}"))]
    Generation {
        kind: &'static str,
        epoch: u64,
        source: task::JoinError,
    },
}

pub type Result<T = (), E = Error> = std::result::Result<T, E>;
