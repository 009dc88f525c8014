use crate::*;
use log::info;
use num_bigint::BigUint;
use num_traits::One;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use std::convert::TryFrom;

/// Smallest modulus size `generate_parameters` will produce.
pub const MIN_BIT_STRENGTH: usize = 256;

/// Default modulus size for new elections.
pub const DEFAULT_BIT_STRENGTH: usize = 2048;

// RFC 3526, section 3: 2048-bit MODP group 14
const RFC3526_2048_PRIME: &str = "ffffffffffffffffc90fdaa22168c234c4c6628b80dc1cd129024e088a67cc74020bbea63b139b22514a08798e3404ddef9519b3cd3a431b302b0a6df25f14374fe1356d6d51c245e485b576625e7ec6f44c42e9a637ed6b0bff5cb6f406b7edee386bfb5a899fa5ae9f24117c4b1fe649286651ece45b3dc2007cb8a163bf0598da48361c55d39a69163fa8fd24cf5f83655d23dca3ad961c62f356208552bb9ed529077096966d670c354e4abc9804f1746c08ca18217c32905e462e36ce3be39e772c180e86039b2783a2ec07a28fb5c55df06f4c52c9de2bcbf6955817183995497cea956ae515d2261898fa051015728e5a8aacaa68ffffffffffffffff";

/// The cyclic group every key, ciphertext and tally of an election lives in.
///
/// Immutable once an election starts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "UncheckedGroupParameters")]
pub struct GroupParameters {
    #[serde(with = "decimal")]
    modulus: BigUint,

    #[serde(with = "decimal")]
    generator: BigUint,
}

impl GroupParameters {
    /// Build group parameters from a known prime modulus and generator.
    ///
    /// The modulus must be a prime of at least 5 and the generator must lie in
    /// `[2, modulus - 1]`. Small moduli are accepted here so that worked examples can be
    /// reproduced; use `generate_parameters` or `rfc3526_2048` for real elections.
    ///
    /// Nothing here checks the order of the generator. A small group (or a generator of
    /// small order, such as 11 modulo 37, which has order 6) cannot carry an exponential
    /// tally of more votes than that order; `Election::new` refuses such a setup through
    /// `generator_order_exceeds`.
    pub fn new(modulus: BigUint, generator: BigUint) -> Result<Self, Error> {
        if modulus < BigUint::from(5u8) {
            return Err(Error::InvalidArgument(format!(
                "modulus {} is too small",
                modulus
            )));
        }
        if !glass_pumpkin::prime::check(&modulus) {
            return Err(Error::InvalidArgument(format!(
                "modulus {} is not prime",
                modulus
            )));
        }
        if generator < BigUint::from(2u8) || generator >= modulus {
            return Err(Error::InvalidArgument(format!(
                "generator {} is outside [2, modulus - 1]",
                generator
            )));
        }

        Ok(GroupParameters { modulus, generator })
    }

    /// The 2048-bit MODP group from RFC 3526 with generator 2.
    ///
    /// The modulus is a safe prime and 2 generates its subgroup of quadratic residues.
    pub fn rfc3526_2048() -> Result<Self, Error> {
        let bytes = hex::decode(RFC3526_2048_PRIME)
            .map_err(|e| Error::InvalidArgument(format!("bad built-in modulus: {}", e)))?;

        Ok(GroupParameters {
            modulus: BigUint::from_bytes_be(&bytes),
            generator: BigUint::from(2u8),
        })
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn generator(&self) -> &BigUint {
        &self.generator
    }

    /// Size of the modulus in bits
    pub fn bits(&self) -> u64 {
        self.modulus.bits()
    }

    /// True if `value` is a non-zero residue, i.e. in `[1, modulus - 1]`
    pub fn contains(&self, value: &BigUint) -> bool {
        value >= &BigUint::one() && value < &self.modulus
    }

    /// `generator^exponent mod modulus`
    pub fn pow_generator(&self, exponent: &BigUint) -> Result<BigUint, Error> {
        mod_pow(&self.generator, exponent, &self.modulus)
    }

    /// True if `generator^i != 1` for every `1 <= i <= bound`.
    ///
    /// Counts recovered from an exponential tally are only meaningful below the order of
    /// the generator. For a safe prime `p = 2q + 1` any generator other than `p - 1` has
    /// order at least `q`; other moduli are walked power by power.
    pub fn generator_order_exceeds(&self, bound: u64) -> bool {
        let p_minus_1 = &self.modulus - 1u32;
        if self.generator == p_minus_1 {
            return bound < 2;
        }

        let q = &p_minus_1 >> 1;
        if glass_pumpkin::prime::check(&q) {
            return q > BigUint::from(bound);
        }

        let mut power = self.generator.clone();
        for _ in 0..bound {
            if power.is_one() {
                return false;
            }
            power = mod_mul(&power, &self.generator, &self.modulus);
        }
        true
    }
}

// Deserialization target; everything read from outside goes through `GroupParameters::new`
#[derive(Deserialize)]
struct UncheckedGroupParameters {
    #[serde(with = "decimal")]
    modulus: BigUint,

    #[serde(with = "decimal")]
    generator: BigUint,
}

impl TryFrom<UncheckedGroupParameters> for GroupParameters {
    type Error = Error;

    fn try_from(raw: UncheckedGroupParameters) -> Result<Self, Error> {
        GroupParameters::new(raw.modulus, raw.generator)
    }
}

/// Generate a fresh safe-prime group of `bit_strength` bits.
pub fn generate_parameters(bit_strength: usize) -> Result<GroupParameters, Error> {
    generate_parameters_with_rng(bit_strength, &mut OsRng)
}

/// Generate a fresh safe-prime group `p = 2q + 1` using the given secure RNG.
///
/// The generator is the square of a random element, so it generates the subgroup of
/// quadratic residues of prime order `q`.
pub fn generate_parameters_with_rng<R: RngCore + CryptoRng>(
    bit_strength: usize,
    rng: &mut R,
) -> Result<GroupParameters, Error> {
    if bit_strength < MIN_BIT_STRENGTH {
        return Err(Error::InvalidArgument(format!(
            "bit strength {} is below the minimum of {}",
            bit_strength, MIN_BIT_STRENGTH
        )));
    }

    // Check the source first: prime generation panics rather than reporting a failed RNG.
    let mut sample = [0u8; 32];
    rng.try_fill_bytes(&mut sample)
        .map_err(Error::InsufficientEntropy)?;

    let modulus = glass_pumpkin::safe_prime::from_rng(bit_strength, rng)
        .map_err(|e| Error::InvalidArgument(format!("prime generation failed: {:?}", e)))?;

    // h is drawn from [2, p - 2]; h^2 is then never 1 for a safe prime
    let span = &modulus - 3u32;
    let generator = loop {
        let h = random_below(rng, &span)? + 2u32;
        let g = mod_pow(&h, &BigUint::from(2u8), &modulus)?;
        if !g.is_one() {
            break g;
        }
    };

    info!("generated {}-bit safe-prime group", modulus.bits());

    Ok(GroupParameters { modulus, generator })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_parameters() {
        let ok = GroupParameters::new(BigUint::from(37u8), BigUint::from(11u8)).unwrap();
        assert_eq!(ok.modulus(), &BigUint::from(37u8));
        assert_eq!(ok.generator(), &BigUint::from(11u8));

        // Not prime
        assert!(matches!(
            GroupParameters::new(BigUint::from(35u8), BigUint::from(2u8)),
            Err(Error::InvalidArgument(_))
        ));

        // Too small
        assert!(matches!(
            GroupParameters::new(BigUint::from(3u8), BigUint::from(2u8)),
            Err(Error::InvalidArgument(_))
        ));

        // Generator out of range
        assert!(GroupParameters::new(BigUint::from(37u8), BigUint::from(1u8)).is_err());
        assert!(GroupParameters::new(BigUint::from(37u8), BigUint::from(37u8)).is_err());
    }

    #[test]
    fn generator_order() {
        // 11 has order 6 modulo 37
        let small = GroupParameters::new(BigUint::from(37u8), BigUint::from(11u8)).unwrap();
        assert!(small.generator_order_exceeds(5));
        assert!(!small.generator_order_exceeds(6));
        assert!(!small.generator_order_exceeds(20));

        // 2 is a primitive root modulo 37
        let full = GroupParameters::new(BigUint::from(37u8), BigUint::from(2u8)).unwrap();
        assert!(full.generator_order_exceeds(35));
        assert!(!full.generator_order_exceeds(36));

        // 36 == -1 has order 2
        let minus_one = GroupParameters::new(BigUint::from(37u8), BigUint::from(36u8)).unwrap();
        assert!(minus_one.generator_order_exceeds(1));
        assert!(!minus_one.generator_order_exceeds(2));

        let rfc = GroupParameters::rfc3526_2048().unwrap();
        assert!(rfc.generator_order_exceeds(MAX_EXPONENTIAL_VOTE));
    }

    #[test]
    fn contains() {
        let params = GroupParameters::new(BigUint::from(37u8), BigUint::from(11u8)).unwrap();
        assert!(!params.contains(&BigUint::from(0u8)));
        assert!(params.contains(&BigUint::from(1u8)));
        assert!(params.contains(&BigUint::from(36u8)));
        assert!(!params.contains(&BigUint::from(37u8)));
    }

    #[test]
    fn rfc3526_group() {
        let params = GroupParameters::rfc3526_2048().unwrap();
        assert_eq!(params.bits(), 2048);
        assert_eq!(params.generator(), &BigUint::from(2u8));

        // 2 is a quadratic residue: g^q == 1 where q = (p - 1) / 2
        let q = (params.modulus() - 1u32) >> 1;
        assert!(params.pow_generator(&q).unwrap().is_one());
    }

    #[test]
    fn generates_safe_prime_group() {
        let params = generate_parameters(MIN_BIT_STRENGTH).unwrap();
        assert_eq!(params.bits(), MIN_BIT_STRENGTH as u64);
        assert!(glass_pumpkin::safe_prime::check(params.modulus()));

        // The generator has order q
        let q = (params.modulus() - 1u32) >> 1;
        assert!(params.pow_generator(&q).unwrap().is_one());
        assert!(!params.generator().is_one());

        assert!(matches!(
            generate_parameters(128),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn serializes_as_decimal() {
        let params = GroupParameters::new(BigUint::from(37u8), BigUint::from(11u8)).unwrap();
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"modulus":"37","generator":"11"}"#);
        let back: GroupParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);

        // Deserialization validates
        assert!(serde_json::from_str::<GroupParameters>(r#"{"modulus":"35","generator":"2"}"#).is_err());
    }
}
