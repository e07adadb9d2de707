use super::*;

/// A 64-bit sealing nonce, big-endian and 0x-prefixed on the wire.
#[derive(
    Debug,
    Default,
    Display,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    SerializeDisplay,
    DeserializeFromStr,
)]
#[display("0x{}", hex::encode(_0))]
pub struct Nonce(pub [u8; NONCE_SIZE]);

impl Nonce {
    pub fn to_u64(self) -> u64 {
        u64::from_be_bytes(self.0)
    }
}

impl From<u64> for Nonce {
    fn from(nonce: u64) -> Self {
        Self(nonce.to_be_bytes())
    }
}

impl FromStr for Nonce {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|_| ParseError::Hex { input: s.into() })?;

        ensure!(
            bytes.len() == NONCE_SIZE,
            error::LengthSnafu {
                expected: NONCE_SIZE,
                actual: bytes.len(),
            }
        );

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes);

        Ok(Self(nonce))
    }
}
