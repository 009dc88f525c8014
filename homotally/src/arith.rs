use crate::*;
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use std::mem;

/// Compute `base^exponent mod modulus`.
///
/// `base` does not need to be reduced. An exponent of zero yields `1 mod modulus`.
pub fn mod_pow(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> Result<BigUint, Error> {
    if modulus.is_zero() {
        return Err(Error::InvalidArgument("modulus must be positive".to_owned()));
    }
    if modulus.is_one() {
        return Ok(BigUint::zero());
    }
    Ok(base.modpow(exponent, modulus))
}

/// Compute the inverse of `value` modulo `modulus` with the extended Euclidean algorithm.
///
/// The result is normalized into `[0, modulus)`. Fails with `NotInvertible` when
/// `gcd(value, modulus) != 1`.
pub fn mod_inverse(value: &BigUint, modulus: &BigUint) -> Result<BigUint, Error> {
    if modulus.is_zero() {
        return Err(Error::InvalidArgument("modulus must be positive".to_owned()));
    }

    let m = BigInt::from(modulus.clone());
    let (mut old_r, mut r) = (BigInt::from(value % modulus), m.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());

    while !r.is_zero() {
        let q = &old_r / &r;
        let next_r = &old_r - &q * &r;
        old_r = mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = mem::replace(&mut s, next_s);
    }

    // old_r is now gcd(value, modulus)
    if !old_r.is_one() {
        return Err(Error::NotInvertible);
    }

    old_s.mod_floor(&m).to_biguint().ok_or(Error::NotInvertible)
}

/// Multiply two residues modulo `modulus`.
pub(crate) fn mod_mul(a: &BigUint, b: &BigUint, modulus: &BigUint) -> BigUint {
    (a * b) % modulus
}

/// Draw a uniform integer in `[0, bound)` by rejection sampling.
pub fn random_below<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    bound: &BigUint,
) -> Result<BigUint, Error> {
    if bound.is_zero() {
        return Err(Error::InvalidArgument(
            "sampling bound must be positive".to_owned(),
        ));
    }

    let bits = bound.bits();
    let len = ((bits + 7) / 8) as usize;
    let excess = (len as u64) * 8 - bits;
    let mut buf = vec![0u8; len];

    loop {
        rng.try_fill_bytes(&mut buf)
            .map_err(Error::InsufficientEntropy)?;
        buf[0] &= 0xffu8 >> excess;

        let candidate = BigUint::from_bytes_be(&buf);
        if &candidate < bound {
            return Ok(candidate);
        }
    }
}

/// Draw a fresh exponent uniformly from `[1, modulus - 2]`.
///
/// Used for both private exponents and per-encryption blinding factors.
pub fn random_exponent<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    params: &GroupParameters,
) -> Result<BigUint, Error> {
    let upper = params.modulus() - 2u32;
    Ok(random_below(rng, &upper)? + 1u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_integer::Integer;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn big(v: u64) -> BigUint {
        BigUint::from(v)
    }

    #[test]
    fn mod_pow_basics() {
        assert_eq!(mod_pow(&big(11), &big(12), &big(37)).unwrap(), big(11u64.pow(12) % 37));
        assert_eq!(mod_pow(&big(5), &big(0), &big(37)).unwrap(), big(1));

        // Unreduced base
        assert_eq!(mod_pow(&big(48), &big(2), &big(37)).unwrap(), big(121 % 37));

        assert!(matches!(
            mod_pow(&big(5), &big(3), &big(0)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn mod_inverse_basics() {
        assert_eq!(mod_inverse(&big(3), &big(11)).unwrap(), big(4));
        assert_eq!(mod_inverse(&big(10), &big(17)).unwrap(), big(12));
        assert_eq!(mod_inverse(&big(1), &big(37)).unwrap(), big(1));

        // Value larger than the modulus is reduced first
        assert_eq!(mod_inverse(&big(14), &big(11)).unwrap(), big(4));

        assert!(matches!(
            mod_inverse(&big(6), &big(9)),
            Err(Error::NotInvertible)
        ));
        assert!(matches!(
            mod_inverse(&big(0), &big(37)),
            Err(Error::NotInvertible)
        ));
        assert!(matches!(
            mod_inverse(&big(3), &big(0)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn random_exponent_stays_in_range() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let params = GroupParameters::new(big(37), big(11)).unwrap();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2000 {
            let k = random_exponent(&mut rng, &params).unwrap();
            assert!(k >= big(1) && k <= big(35));
            seen.insert(k);
        }
        // Every value of [1, 35] turns up
        assert_eq!(seen.len(), 35);
    }

    proptest! {
        #[test]
        fn inverse_is_correct(a in 1u64..1_000_000, m in 2u64..1_000_000) {
            let (a, m) = (big(a), big(m));
            match mod_inverse(&a, &m) {
                Ok(inv) => {
                    prop_assert!(a.gcd(&m) == big(1));
                    prop_assert!(inv < m);
                    prop_assert_eq!((&a * &inv) % &m, big(1));
                }
                Err(Error::NotInvertible) => prop_assert!(a.gcd(&m) != big(1)),
                Err(e) => prop_assert!(false, "unexpected error {}", e),
            }
        }

        #[test]
        fn mod_pow_matches_repeated_multiplication(b in 0u64..1000, e in 0u32..40, m in 1u64..10_000) {
            let mut expected = 1u64 % m;
            for _ in 0..e {
                expected = expected * (b % m) % m;
            }
            prop_assert_eq!(mod_pow(&big(b), &BigUint::from(e), &big(m)).unwrap(), big(expected));
        }
    }
}
