use crate::*;
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// A cast ballot: one ciphertext per tally stream.
///
/// Under the exponential encoding there is one stream per candidate; under the product
/// encoding there is a single stream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Ballot {
    pub id: Uuid,
    pub ciphertexts: Vec<Ciphertext>,
}

impl Ballot {
    pub fn new(ciphertexts: Vec<Ciphertext>) -> Self {
        Ballot {
            id: Uuid::new_v4(),
            ciphertexts,
        }
    }

    /// Check the ballot has the expected number of streams, each a pair of group elements.
    pub fn validate(&self, params: &GroupParameters, num_streams: usize) -> Result<(), Error> {
        if self.ciphertexts.len() != num_streams {
            return Err(Error::MalformedBallot(self.id));
        }
        for ciphertext in &self.ciphertexts {
            ciphertext
                .validate(params)
                .map_err(|_| Error::MalformedBallot(self.id))?;
        }
        Ok(())
    }

    /// Fingerprint a voter can use to find their ballot in the published store.
    pub fn receipt(&self) -> Receipt {
        let mut hasher = Sha256::new();
        hasher.update(self.id.as_bytes());
        for ciphertext in &self.ciphertexts {
            hasher.update(ciphertext.c1.to_str_radix(10).as_bytes());
            hasher.update(b",");
            hasher.update(ciphertext.c2.to_str_radix(10).as_bytes());
            hasher.update(b";");
        }

        Receipt(hasher.finalize().to_vec())
    }
}

/// SHA-256 ballot fingerprint, shown as hex.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Receipt(#[serde(with = "hex_serde")] pub Vec<u8>);

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    fn ciphertext(c1: u64, c2: u64) -> Ciphertext {
        Ciphertext {
            c1: BigUint::from(c1),
            c2: BigUint::from(c2),
        }
    }

    #[test]
    fn receipt_tracks_contents() {
        let ballot = Ballot::new(vec![ciphertext(5, 7), ciphertext(11, 13)]);
        let receipt = ballot.receipt();
        assert_eq!(receipt, ballot.clone().receipt());
        assert_eq!(receipt.to_string().len(), 64);

        let mut altered = ballot.clone();
        altered.ciphertexts[1].c2 = BigUint::from(14u8);
        assert_ne!(altered.receipt(), receipt);

        // Same contents under a different id
        let other = Ballot::new(ballot.ciphertexts.clone());
        assert_ne!(other.receipt(), receipt);

        // Component boundaries matter: (5, 71) vs (57, 1)
        let a = Ballot {
            id: ballot.id,
            ciphertexts: vec![ciphertext(5, 71)],
        };
        let b = Ballot {
            id: ballot.id,
            ciphertexts: vec![ciphertext(57, 1)],
        };
        assert_ne!(a.receipt(), b.receipt());
    }

    #[test]
    fn validates_stream_count() {
        let params = GroupParameters::new(BigUint::from(37u8), BigUint::from(11u8)).unwrap();
        let ballot = Ballot::new(vec![ciphertext(5, 7), ciphertext(11, 13)]);
        ballot.validate(&params, 2).unwrap();
        assert!(matches!(
            ballot.validate(&params, 3),
            Err(Error::MalformedBallot(id)) if id == ballot.id
        ));

        let bad = Ballot::new(vec![ciphertext(5, 0)]);
        assert!(bad.validate(&params, 1).is_err());
    }

    #[test]
    fn receipt_serializes_as_hex() {
        let receipt = Receipt(vec![0xab; 32]);
        let json = serde_json::to_string(&receipt).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        assert_eq!(serde_json::from_str::<Receipt>(&json).unwrap(), receipt);
    }
}
