use crate::*;
use log::debug;
use num_bigint::BigUint;
use num_integer::{Integer, Roots};
use num_traits::{One, Zero};
use std::collections::HashMap;

/// Open an aggregate (or single) ciphertext: `c2 * (c1^x)^-1 mod p`.
///
/// Under the multiplicative scheme the result is the product of all combined plaintexts.
/// A `NotInvertible` from the inverse step is returned as-is.
pub fn decrypt_aggregate(
    aggregate: &Ciphertext,
    params: &GroupParameters,
    private_key: &PrivateKey,
) -> Result<BigUint, Error> {
    aggregate.validate(params)?;

    let modulus = params.modulus();
    let shared = mod_pow(&aggregate.c1, private_key.exponent(), modulus)?;
    let shared_inv = mod_inverse(&shared, modulus)?;

    Ok(mod_mul(&aggregate.c2, &shared_inv, modulus))
}

/// Recover `n` from `g^n` for `0 <= n <= max_count` with a baby-step giant-step search.
///
/// Fails with `RangeOverflow` when no such `n` exists within the bound, or when the bound
/// itself is above `MAX_EXPONENTIAL_VOTE`.
pub fn recover_count(
    element: &BigUint,
    params: &GroupParameters,
    max_count: u64,
) -> Result<u64, Error> {
    if max_count > MAX_EXPONENTIAL_VOTE {
        return Err(Error::RangeOverflow(format!(
            "cannot search for counts above {} (asked for {})",
            MAX_EXPONENTIAL_VOTE, max_count
        )));
    }
    if !params.contains(element) {
        return Err(Error::InvalidArgument(
            "decrypted value is not an element of the group".to_owned(),
        ));
    }

    let modulus = params.modulus();
    let generator = params.generator();
    let steps = integer_sqrt_ceil(max_count.saturating_add(1));

    // Baby steps: g^j -> j. The first (smallest) j wins for repeated values.
    let mut baby = HashMap::with_capacity(steps as usize);
    let mut current = BigUint::one();
    for j in 0..steps {
        baby.entry(current.clone()).or_insert(j);
        current = mod_mul(&current, generator, modulus);
    }

    // Giant steps: element * g^(-steps*i)
    let giant = mod_inverse(&mod_pow(generator, &BigUint::from(steps), modulus)?, modulus)?;
    let mut gamma = element.clone();
    for i in 0..steps {
        if let Some(j) = baby.get(&gamma) {
            let count = i.saturating_mul(steps).saturating_add(*j);
            if count <= max_count {
                return Ok(count);
            }
        }
        gamma = mod_mul(&gamma, &giant, modulus);
    }

    Err(Error::RangeOverflow(format!(
        "no vote count in [0, {}] matches the decrypted tally",
        max_count
    )))
}

/// The first `n` primes, used as the plaintext tags of `n` candidates under the product
/// encoding.
pub fn product_tags(n: usize) -> Vec<BigUint> {
    let mut primes: Vec<u64> = Vec::with_capacity(n);
    let mut candidate = 2u64;
    while primes.len() < n {
        if primes
            .iter()
            .take_while(|p| *p * *p <= candidate)
            .all(|p| candidate % p != 0)
        {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes.into_iter().map(BigUint::from).collect()
}

/// Split a decrypted product of tags back into how many times each tag occurs.
///
/// The tags must be pairwise coprime. Anything left over after dividing out every tag
/// means the product wrapped around the modulus (or was never a product of tags), which
/// is a `RangeOverflow`.
pub fn factor_product(product: &BigUint, tags: &[BigUint]) -> Result<Vec<u64>, Error> {
    if product.is_zero() {
        return Err(Error::RangeOverflow(
            "decrypted product is zero".to_owned(),
        ));
    }

    let mut remaining = product.clone();
    let mut counts = Vec::with_capacity(tags.len());
    for tag in tags {
        if tag <= &BigUint::one() {
            return Err(Error::InvalidArgument(format!("invalid tag {}", tag)));
        }
        let mut count = 0u64;
        loop {
            let (quotient, remainder) = remaining.div_rem(tag);
            if !remainder.is_zero() {
                break;
            }
            remaining = quotient;
            count += 1;
        }
        counts.push(count);
    }

    if !remaining.is_one() {
        return Err(Error::RangeOverflow(
            "decrypted product is not a product of candidate tags".to_owned(),
        ));
    }

    Ok(counts)
}

fn integer_sqrt_ceil(n: u64) -> u64 {
    let root = Roots::sqrt(&n);
    if root * root < n {
        root + 1
    } else {
        root
    }
}

/// The single holder of an election's private exponent.
///
/// Encryption and aggregation never see one of these.
#[derive(Debug)]
pub struct DecryptionAuthority {
    params: GroupParameters,
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl DecryptionAuthority {
    pub fn new(params: GroupParameters, private_key: PrivateKey) -> Result<Self, Error> {
        let public_key = private_key.public_key(&params)?;
        Ok(DecryptionAuthority {
            params,
            private_key,
            public_key,
        })
    }

    pub fn from_key_pair(params: GroupParameters, keypair: KeyPair) -> Result<Self, Error> {
        let authority = DecryptionAuthority::new(params, keypair.private)?;
        if authority.public_key != keypair.public {
            return Err(Error::MismatchedKeys);
        }
        Ok(authority)
    }

    pub fn params(&self) -> &GroupParameters {
        &self.params
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Check that this authority can open ciphertexts made for `public_key` over `params`.
    pub fn check_matches(&self, params: &GroupParameters, public_key: &PublicKey) -> Result<(), Error> {
        if &self.params != params || &self.public_key != public_key {
            return Err(Error::MismatchedKeys);
        }
        Ok(())
    }

    /// Split the private exponent among trustees for safekeeping; see `deal_key_shares`.
    pub fn escrow(&self, threshold: u8, num_trustees: usize) -> Result<Vec<KeyShare>, Error> {
        deal_key_shares(threshold, num_trustees, &self.private_key)
    }

    /// Open an aggregate to its raw plaintext.
    pub fn decrypt(&self, aggregate: &Ciphertext) -> Result<BigUint, Error> {
        decrypt_aggregate(aggregate, &self.params, &self.private_key)
    }

    /// Open an aggregate of exponentially encoded votes and recover the count.
    ///
    /// Refuses with `RangeOverflow` when the generator's order is too small for counts up
    /// to `max_count` to be told apart.
    pub fn decrypt_count(&self, aggregate: &Ciphertext, max_count: u64) -> Result<u64, Error> {
        let element = self.decrypt(aggregate)?;
        let count = recover_count(&element, &self.params, max_count)?;
        if !self.params.generator_order_exceeds(max_count) {
            return Err(Error::RangeOverflow(format!(
                "the generator's order does not exceed {}",
                max_count
            )));
        }
        debug!("recovered count {} (bound {})", count, max_count);
        Ok(count)
    }
}
