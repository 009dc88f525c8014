use crate::*;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use std::fmt;

/// Largest vote accepted by `encrypt_exponential`.
///
/// Exponentially encoded values are recovered by a bounded discrete-log search, so they
/// have to stay small.
pub const MAX_EXPONENTIAL_VOTE: u64 = 1_000_000;

/// An ElGamal ciphertext `(c1, c2) = (g^k, m * h^k)`.
///
/// Holds either a single encrypted vote or an aggregate of many.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ciphertext {
    #[serde(with = "decimal")]
    pub c1: BigUint,

    #[serde(with = "decimal")]
    pub c2: BigUint,
}

impl Ciphertext {
    /// The ciphertext of "nothing combined yet": `(1, 1)`
    pub fn identity() -> Self {
        Ciphertext {
            c1: BigUint::one(),
            c2: BigUint::one(),
        }
    }

    /// Check that both components are elements of the group.
    pub fn validate(&self, params: &GroupParameters) -> Result<(), Error> {
        if !params.contains(&self.c1) || !params.contains(&self.c2) {
            return Err(Error::InvalidArgument(
                "ciphertext component is not an element of the group".to_owned(),
            ));
        }
        Ok(())
    }

    /// Componentwise product. The result encrypts the product of both plaintexts.
    pub fn combine(&self, other: &Ciphertext, params: &GroupParameters) -> Ciphertext {
        let modulus = params.modulus();
        Ciphertext {
            c1: mod_mul(&self.c1, &other.c1, modulus),
            c2: mod_mul(&self.c2, &other.c2, modulus),
        }
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.c1, self.c2)
    }
}

/// Encrypt `vote` under `public_key` using the operating system's secure random source.
///
/// `vote` is the plaintext itself and must lie in `[1, modulus - 1]`.
pub fn encrypt(
    vote: &BigUint,
    params: &GroupParameters,
    public_key: &PublicKey,
) -> Result<Ciphertext, Error> {
    encrypt_with_rng(vote, params, public_key, &mut OsRng)
}

/// Encrypt `vote` with a blinding factor drawn from `rng`.
///
/// A fresh blinding factor is drawn on every call and dropped before returning.
pub fn encrypt_with_rng<R: RngCore + CryptoRng>(
    vote: &BigUint,
    params: &GroupParameters,
    public_key: &PublicKey,
    rng: &mut R,
) -> Result<Ciphertext, Error> {
    if vote.is_zero() || vote >= params.modulus() {
        return Err(Error::InvalidVote(
            "plaintext must lie in [1, modulus - 1]".to_owned(),
        ));
    }
    if !params.contains(public_key.value()) {
        return Err(Error::InvalidArgument(
            "public value is not an element of the group".to_owned(),
        ));
    }

    let modulus = params.modulus();
    let k = random_exponent(rng, params)?;

    let c1 = params.pow_generator(&k)?;
    let shared = mod_pow(public_key.value(), &k, modulus)?;
    let c2 = mod_mul(vote, &shared, modulus);

    Ok(Ciphertext { c1, c2 })
}

/// Encrypt `g^vote`, so that combining ciphertexts adds votes in the exponent.
pub fn encrypt_exponential(
    vote: u64,
    params: &GroupParameters,
    public_key: &PublicKey,
) -> Result<Ciphertext, Error> {
    encrypt_exponential_with_rng(vote, params, public_key, &mut OsRng)
}

pub fn encrypt_exponential_with_rng<R: RngCore + CryptoRng>(
    vote: u64,
    params: &GroupParameters,
    public_key: &PublicKey,
    rng: &mut R,
) -> Result<Ciphertext, Error> {
    if vote > MAX_EXPONENTIAL_VOTE {
        return Err(Error::InvalidVote(format!(
            "exponential vote {} exceeds {}",
            vote, MAX_EXPONENTIAL_VOTE
        )));
    }

    let encoded = params.pow_generator(&BigUint::from(vote))?;
    encrypt_with_rng(&encoded, params, public_key, rng)
}
