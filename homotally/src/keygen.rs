use crate::*;
use log::info;
use num_bigint::BigUint;
use num_traits::One;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use std::fmt;

/// The election's public value `h = g^x mod p`. Freely distributable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    #[serde(with = "decimal")]
    value: BigUint,
}

impl PublicKey {
    /// Wrap a public value received from elsewhere, checking it is a group element.
    pub fn new(params: &GroupParameters, value: BigUint) -> Result<Self, Error> {
        if !params.contains(&value) {
            return Err(Error::InvalidArgument(
                "public value is not an element of the group".to_owned(),
            ));
        }
        Ok(PublicKey { value })
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }
}

/// The private exponent `x`.
///
/// Deliberately not `Serialize` and redacted from `Debug`. Only the decryption authority
/// (and the trustee escrow in `secret_share`) ever holds one.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    exponent: BigUint,
}

impl PrivateKey {
    /// Wrap a known private exponent, checking it lies in `[1, modulus - 2]`.
    pub fn new(params: &GroupParameters, exponent: BigUint) -> Result<Self, Error> {
        let upper = params.modulus() - 2u32;
        if exponent < BigUint::one() || exponent > upper {
            return Err(Error::InvalidArgument(
                "private exponent is outside [1, modulus - 2]".to_owned(),
            ));
        }
        Ok(PrivateKey { exponent })
    }

    pub(crate) fn exponent(&self) -> &BigUint {
        &self.exponent
    }

    /// Derive the matching public value
    pub fn public_key(&self, params: &GroupParameters) -> Result<PublicKey, Error> {
        Ok(PublicKey {
            value: params.pow_generator(&self.exponent)?,
        })
    }

    /// Big-endian bytes of the exponent, for escrow
    pub fn to_bytes(&self) -> Vec<u8> {
        self.exponent.to_bytes_be()
    }

    /// Decimal rendering of the exponent, for writing to a secret-key file
    pub fn to_decimal(&self) -> String {
        self.exponent.to_str_radix(10)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PrivateKey(<redacted>)")
    }
}

/// An election key pair, created once at election setup.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl KeyPair {
    /// Build a key pair from a known private exponent.
    pub fn from_private_exponent(params: &GroupParameters, exponent: BigUint) -> Result<Self, Error> {
        let private = PrivateKey::new(params, exponent)?;
        let public = private.public_key(params)?;
        Ok(KeyPair { public, private })
    }
}

/// Generate a key pair from the operating system's secure random source.
pub fn generate_key_pair(params: &GroupParameters) -> Result<KeyPair, Error> {
    generate_key_pair_with_rng(params, &mut OsRng)
}

/// Generate a key pair with the private exponent drawn uniformly from `[1, modulus - 2]`.
///
/// Fails with `InsufficientEntropy` if the RNG cannot produce bytes.
pub fn generate_key_pair_with_rng<R: RngCore + CryptoRng>(
    params: &GroupParameters,
    rng: &mut R,
) -> Result<KeyPair, Error> {
    let exponent = random_exponent(rng, params)?;
    let keypair = KeyPair::from_private_exponent(params, exponent)?;

    info!("generated election key pair over a {}-bit group", params.bits());

    Ok(keypair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    /// An RNG whose source has gone away
    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            unreachable!()
        }
        fn next_u64(&mut self) -> u64 {
            unreachable!()
        }
        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            unreachable!()
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                "entropy source unavailable",
            )))
        }
    }

    impl CryptoRng for BrokenRng {}

    fn toy_params() -> GroupParameters {
        GroupParameters::new(BigUint::from(37u8), BigUint::from(11u8)).unwrap()
    }

    #[test]
    fn known_exponent() {
        let params = toy_params();
        let keypair = KeyPair::from_private_exponent(&params, BigUint::from(12u8)).unwrap();

        // 11^12 mod 37, computed by hand with u64 arithmetic
        let expected = 11u64.pow(12) % 37;
        assert_eq!(keypair.public.value(), &BigUint::from(expected));

        assert!(KeyPair::from_private_exponent(&params, BigUint::from(0u8)).is_err());
        assert!(KeyPair::from_private_exponent(&params, BigUint::from(36u8)).is_err());
        assert!(KeyPair::from_private_exponent(&params, BigUint::from(35u8)).is_ok());
    }

    #[test]
    fn generated_keys_match() {
        let params = GroupParameters::rfc3526_2048().unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let keypair = generate_key_pair_with_rng(&params, &mut rng).unwrap();

        assert_eq!(
            keypair.private.public_key(&params).unwrap(),
            keypair.public
        );
        assert!(params.contains(keypair.public.value()));

        let other = generate_key_pair(&params).unwrap();
        assert_ne!(other.public, keypair.public);
    }

    #[test]
    fn no_fallback_without_entropy() {
        let params = toy_params();
        assert!(matches!(
            generate_key_pair_with_rng(&params, &mut BrokenRng),
            Err(Error::InsufficientEntropy(_))
        ));
    }

    #[test]
    fn private_key_is_redacted() {
        let params = toy_params();
        let keypair = KeyPair::from_private_exponent(&params, BigUint::from(12u8)).unwrap();
        let debug = format!("{:?}", keypair);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("exponent"));
    }

    #[test]
    fn public_key_must_be_in_group() {
        let params = toy_params();
        assert!(PublicKey::new(&params, BigUint::from(0u8)).is_err());
        assert!(PublicKey::new(&params, BigUint::from(37u8)).is_err());
        assert!(PublicKey::new(&params, BigUint::from(36u8)).is_ok());
    }
}
