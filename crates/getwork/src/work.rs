use super::*;

/// The outstanding work tuple handed to external miners: the sealing hash of
/// the pending header, the epoch seed hash, the share boundary target and the
/// block number, encoded on the wire as a four-element array of 0x-prefixed
/// hex strings.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Work {
    pub seal_hash: H256,
    pub seed_hash: H256,
    pub target: H256,
    pub number: u64,
}

impl Serialize for Work {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(4))?;
        seq.serialize_element(&encode_hash(self.seal_hash))?;
        seq.serialize_element(&encode_hash(self.seed_hash))?;
        seq.serialize_element(&encode_hash(self.target))?;
        seq.serialize_element(&encode_quantity(self.number))?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Work {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (seal_hash, seed_hash, target, number) =
            <(String, String, String, String)>::deserialize(deserializer)?;

        Ok(Work {
            seal_hash: parse_hash(&seal_hash).map_err(de::Error::custom)?,
            seed_hash: parse_hash(&seed_hash).map_err(de::Error::custom)?,
            target: parse_hash(&target).map_err(de::Error::custom)?,
            number: parse_quantity(&number).map_err(de::Error::custom)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq, serde_json::Value};

    #[track_caller]
    fn case(json: &str, expected: Work) {
        let parsed: Work = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, expected, "deserialize equality");

        let ser = serde_json::to_string(&parsed).unwrap();
        let lhs: Value = serde_json::from_str(json).unwrap();
        let rhs: Value = serde_json::from_str(&ser).unwrap();
        assert_eq!(lhs, rhs, "semantic JSON equality");

        let back: Work = serde_json::from_str(&ser).unwrap();
        assert_eq!(back, expected, "roundtrip equality");
    }

    fn sample_work() -> Work {
        Work {
            seal_hash: H256::repeat_byte(0x11),
            seed_hash: H256::repeat_byte(0x22),
            target: H256::repeat_byte(0x33),
            number: 0x10d4f,
        }
    }

    #[test]
    fn wire_format_is_a_four_element_array() {
        case(
            "[\"0x1111111111111111111111111111111111111111111111111111111111111111\",\
              \"0x2222222222222222222222222222222222222222222222222222222222222222\",\
              \"0x3333333333333333333333333333333333333333333333333333333333333333\",\
              \"0x10d4f\"]",
            sample_work(),
        );
    }

    #[test]
    fn number_is_compact_hex() {
        let json = serde_json::to_string(&Work {
            number: 1,
            ..sample_work()
        })
        .unwrap();
        assert!(json.ends_with("\"0x1\"]"), "got: {json}");
    }

    #[test]
    fn rejects_short_arrays() {
        assert!(serde_json::from_str::<Work>("[\"0x00\", \"0x00\"]").is_err());
    }

    #[test]
    fn rejects_malformed_hashes() {
        assert!(
            serde_json::from_str::<Work>(
                "[\"0xbeef\", \"0xbeef\", \"0xbeef\", \"0x1\"]"
            )
            .is_err()
        );
    }
}
