use {
    derive_more::Display,
    primitive_types::H256,
    serde::{
        Deserialize, Serialize, Serializer,
        de::{self, Deserializer},
        ser::SerializeSeq,
    },
    serde_with::{DeserializeFromStr, SerializeDisplay},
    snafu::{Snafu, ensure},
    std::str::FromStr,
};

pub use {
    error::ParseError,
    nonce::Nonce,
    work::Work,
};

mod error;
mod nonce;
mod work;

pub const NONCE_SIZE: usize = 8;

pub fn encode_quantity(quantity: u64) -> String {
    format!("0x{quantity:x}")
}

pub fn encode_hash(hash: H256) -> String {
    format!("0x{hash:x}")
}

pub fn parse_quantity(input: &str) -> Result<u64, ParseError> {
    let digits = input.strip_prefix("0x").unwrap_or(input);
    u64::from_str_radix(digits, 16).map_err(|_| ParseError::Quantity {
        input: input.into(),
    })
}

pub fn parse_hash(input: &str) -> Result<H256, ParseError> {
    let digits = input.strip_prefix("0x").unwrap_or(input);
    let bytes = hex::decode(digits).map_err(|_| ParseError::Hex {
        input: input.into(),
    })?;

    ensure!(
        bytes.len() == H256::len_bytes(),
        error::LengthSnafu {
            expected: H256::len_bytes(),
            actual: bytes.len(),
        }
    );

    Ok(H256::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_roundtrip() {
        for quantity in [0, 1, 0xdead, u64::MAX] {
            assert_eq!(parse_quantity(&encode_quantity(quantity)).unwrap(), quantity);
        }
    }

    #[test]
    fn hash_roundtrip() {
        let hash = H256::repeat_byte(0xab);
        assert_eq!(parse_hash(&encode_hash(hash)).unwrap(), hash);
    }

    #[test]
    fn hash_accepts_bare_hex() {
        let hash = H256::repeat_byte(0x07);
        assert_eq!(parse_hash(&format!("{hash:x}")).unwrap(), hash);
    }

    #[test]
    fn hash_rejects_wrong_length() {
        assert!(matches!(
            parse_hash("0xabcd"),
            Err(ParseError::Length { expected: 32, actual: 2 })
        ));
    }

    #[test]
    fn hash_rejects_bad_hex() {
        assert!(parse_hash("0xzz").is_err());
    }
}
