use crate::*;
use log::info;
use num_bigint::BigUint;
use sharks::{Share, Sharks};
use std::convert::TryFrom;
use uuid::Uuid;

/// One trustee's share of the escrowed private exponent
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct KeyShare {
    pub trustee_id: Uuid,

    #[serde(with = "hex_serde")]
    pub share: Vec<u8>,
}

/// Split the private exponent among `num_trustees` trustees so that any `threshold` of
/// them can rebuild it.
///
/// This is escrow for the decryption authority's key, not threshold decryption: the
/// tally is still opened by whoever holds the recovered key.
pub fn deal_key_shares(
    threshold: u8,
    num_trustees: usize,
    private_key: &PrivateKey,
) -> Result<Vec<KeyShare>, Error> {
    if threshold == 0 || usize::from(threshold) > num_trustees || num_trustees > 255 {
        return Err(Error::InvalidArgument(format!(
            "cannot deal {} shares with threshold {}",
            num_trustees, threshold
        )));
    }

    let sharks = Sharks(threshold);
    let secret = private_key.to_bytes();
    let dealer = sharks.dealer(&secret);

    let shares: Vec<KeyShare> = dealer
        .take(num_trustees)
        .map(|share| KeyShare {
            trustee_id: Uuid::new_v4(),
            share: Vec::from(&share),
        })
        .collect();

    info!(
        "dealt {} key shares with threshold {}",
        shares.len(),
        threshold
    );

    Ok(shares)
}

/// Rebuild the private exponent from at least `threshold` shares.
///
/// The result is checked against the election's public value.
pub fn recover_private_key(
    threshold: u8,
    shares: &[KeyShare],
    params: &GroupParameters,
    public_key: &PublicKey,
) -> Result<PrivateKey, Error> {
    if threshold == 0 {
        return Err(Error::InvalidArgument("threshold must be positive".to_owned()));
    }

    let shares: Vec<Share> = shares
        .iter()
        .map(|s| Share::try_from(s.share.as_slice()))
        .collect::<Result<_, _>>()
        .map_err(|_| Error::SecretRecoveryFailed)?;

    let sharks = Sharks(threshold);
    let secret = sharks
        .recover(&shares)
        .map_err(|_| Error::SecretRecoveryFailed)?;

    let private_key = PrivateKey::new(params, BigUint::from_bytes_be(&secret))
        .map_err(|_| Error::SecretRecoveryFailed)?;

    if &private_key.public_key(params)? != public_key {
        return Err(Error::MismatchedKeys);
    }

    info!("recovered election private key from {} shares", shares.len());

    Ok(private_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn keypair() -> (GroupParameters, KeyPair) {
        let params = GroupParameters::rfc3526_2048().unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(99);
        let keypair = generate_key_pair_with_rng(&params, &mut rng).unwrap();
        (params, keypair)
    }

    #[test]
    fn two_of_three() {
        let (params, keypair) = keypair();
        let shares = deal_key_shares(2, 3, &keypair.private).unwrap();
        assert_eq!(shares.len(), 3);

        let recovered = recover_private_key(2, &shares[1..], &params, &keypair.public).unwrap();
        assert_eq!(recovered, keypair.private);

        let recovered = recover_private_key(2, &[shares[2].clone(), shares[0].clone()], &params, &keypair.public).unwrap();
        assert_eq!(recovered, keypair.private);
    }

    #[test]
    fn too_few_shares() {
        let (params, keypair) = keypair();
        let shares = deal_key_shares(3, 5, &keypair.private).unwrap();
        assert!(matches!(
            recover_private_key(3, &shares[..2], &params, &keypair.public),
            Err(Error::SecretRecoveryFailed)
        ));
    }

    #[test]
    fn shares_for_another_key() {
        let (params, keypair) = keypair();
        let other = KeyPair::from_private_exponent(&params, BigUint::from(424242u32)).unwrap();
        let shares = deal_key_shares(2, 2, &other.private).unwrap();
        assert!(matches!(
            recover_private_key(2, &shares, &params, &keypair.public),
            Err(Error::MismatchedKeys)
        ));
    }

    #[test]
    fn rejects_bad_thresholds() {
        let (_, keypair) = keypair();
        assert!(deal_key_shares(0, 3, &keypair.private).is_err());
        assert!(deal_key_shares(4, 3, &keypair.private).is_err());
        assert!(deal_key_shares(2, 256, &keypair.private).is_err());
    }

    #[test]
    fn share_serializes_as_hex() {
        let share = KeyShare {
            trustee_id: Uuid::nil(),
            share: vec![1, 2, 255],
        };
        let json = serde_json::to_string(&share).unwrap();
        assert!(json.contains("\"0102ff\""));
        assert_eq!(serde_json::from_str::<KeyShare>(&json).unwrap(), share);
    }
}
