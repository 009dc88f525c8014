use crate::*;
use indexmap::IndexMap;
use log::{debug, info, warn};
use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// How a choice is turned into plaintexts.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TallyEncoding {
    /// One stream per candidate carrying `g^0` or `g^1`; combining adds counts in the
    /// exponent.
    Exponential,

    /// A single stream carrying the candidate's prime tag; the decrypted tally is the
    /// product of all tags.
    Product,
}

impl TallyEncoding {
    /// Number of ciphertexts on each ballot
    pub fn num_streams(self, num_candidates: usize) -> usize {
        match self {
            TallyEncoding::Exponential => num_candidates,
            TallyEncoding::Product => 1,
        }
    }
}

impl Default for TallyEncoding {
    fn default() -> Self {
        TallyEncoding::Exponential
    }
}

impl FromStr for TallyEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exponential" => Ok(TallyEncoding::Exponential),
            "product" => Ok(TallyEncoding::Product),
            other => Err(Error::InvalidArgument(format!(
                "unknown tally encoding {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for TallyEncoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TallyEncoding::Exponential => write!(f, "exponential"),
            TallyEncoding::Product => write!(f, "product"),
        }
    }
}

/// The published outcome of a tally
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AggregateResult {
    pub election_id: Uuid,
    pub encoding: TallyEncoding,
    pub num_ballots: u64,

    /// Count per candidate, in ballot order
    pub totals: IndexMap<String, u64>,

    /// The raw decrypted group element of each stream
    #[serde(with = "decimal_vec")]
    pub decrypted: Vec<BigUint>,
}

/// A running election: public parameters, the candidate list and the ballot store.
///
/// Holds no secret material. Tallying needs the matching `DecryptionAuthority`.
pub struct Election<S: Store = MemStore> {
    id: Uuid,
    params: GroupParameters,
    public_key: PublicKey,
    candidates: Vec<String>,
    encoding: TallyEncoding,
    max_votes: u64,
    tags: Vec<BigUint>,
    store: S,

    // Ballots accepted or in flight; never exceeds max_votes
    reserved: AtomicU64,
    result: Mutex<Option<AggregateResult>>,
}

impl<S: Store> Election<S> {
    pub fn new(
        id: Uuid,
        params: GroupParameters,
        public_key: PublicKey,
        candidates: Vec<String>,
        encoding: TallyEncoding,
        max_votes: u64,
        store: S,
    ) -> Result<Self, Error> {
        if candidates.is_empty() {
            return Err(Error::InvalidArgument(
                "an election needs at least one candidate".to_owned(),
            ));
        }
        for (i, candidate) in candidates.iter().enumerate() {
            if candidates[..i].contains(candidate) {
                return Err(Error::InvalidArgument(format!(
                    "duplicate candidate {:?}",
                    candidate
                )));
            }
        }
        if max_votes == 0 {
            return Err(Error::InvalidArgument(
                "max_votes must be positive".to_owned(),
            ));
        }
        if !params.contains(public_key.value()) {
            return Err(Error::InvalidArgument(
                "public value is not an element of the group".to_owned(),
            ));
        }

        let tags = match encoding {
            TallyEncoding::Exponential => {
                if max_votes > MAX_EXPONENTIAL_VOTE
                    || BigUint::from(max_votes) >= params.modulus() - 1u32
                {
                    return Err(Error::RangeOverflow(format!(
                        "{} votes cannot be recovered from an exponential tally",
                        max_votes
                    )));
                }
                if !params.generator_order_exceeds(max_votes) {
                    return Err(Error::RangeOverflow(format!(
                        "the generator's order does not exceed {} votes",
                        max_votes
                    )));
                }
                vec![]
            }
            TallyEncoding::Product => {
                let tags = product_tags(candidates.len());
                check_product_bound(&tags, max_votes, &params)?;
                tags
            }
        };

        let stored = store.len()? as u64;

        Ok(Election {
            id,
            params,
            public_key,
            candidates,
            encoding,
            max_votes,
            tags,
            store,
            reserved: AtomicU64::new(stored),
            result: Mutex::new(None),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn params(&self) -> &GroupParameters {
        &self.params
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn encoding(&self) -> TallyEncoding {
        self.encoding
    }

    pub fn max_votes(&self) -> u64 {
        self.max_votes
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn num_streams(&self) -> usize {
        self.encoding.num_streams(self.candidates.len())
    }

    /// Encrypt a choice into a ballot, the way a voter's device would.
    pub fn encrypt_ballot_with_rng<R: RngCore + CryptoRng>(
        &self,
        choice: usize,
        rng: &mut R,
    ) -> Result<Ballot, Error> {
        if choice >= self.candidates.len() {
            return Err(Error::InvalidVote(format!(
                "choice {} is not one of the {} candidates",
                choice,
                self.candidates.len()
            )));
        }

        let ciphertexts = match self.encoding {
            TallyEncoding::Exponential => (0..self.candidates.len())
                .map(|i| {
                    let vote = if i == choice { 1 } else { 0 };
                    encrypt_exponential_with_rng(vote, &self.params, &self.public_key, rng)
                })
                .collect::<Result<Vec<_>, _>>()?,
            TallyEncoding::Product => vec![encrypt_with_rng(
                &self.tags[choice],
                &self.params,
                &self.public_key,
                rng,
            )?],
        };

        Ok(Ballot::new(ciphertexts))
    }

    /// Encrypt and cast `voter`'s choice. Returns the stored ballot.
    pub fn cast_vote(
        &self,
        registry: &EligibilityRegistry,
        voter: &str,
        choice: usize,
    ) -> Result<Ballot, Error> {
        self.cast_vote_with_rng(registry, voter, choice, &mut OsRng)
    }

    pub fn cast_vote_with_rng<R: RngCore + CryptoRng>(
        &self,
        registry: &EligibilityRegistry,
        voter: &str,
        choice: usize,
        rng: &mut R,
    ) -> Result<Ballot, Error> {
        if self.store.is_sealed()? {
            return Err(Error::ElectionClosed);
        }
        if choice >= self.candidates.len() {
            return Err(Error::InvalidVote(format!(
                "choice {} is not one of the {} candidates",
                choice,
                self.candidates.len()
            )));
        }

        // A failed encryption leaves the voter free to try again
        let ballot = self.encrypt_ballot_with_rng(choice, rng)?;
        self.submit_ballot(registry, voter, ballot)
    }

    /// Accept a ballot that was encrypted elsewhere.
    ///
    /// Checks its shape, claims the voter's single vote, then appends it to the store.
    pub fn submit_ballot(
        &self,
        registry: &EligibilityRegistry,
        voter: &str,
        ballot: Ballot,
    ) -> Result<Ballot, Error> {
        if self.store.is_sealed()? {
            return Err(Error::ElectionClosed);
        }
        ballot.validate(&self.params, self.num_streams())?;

        self.reserve_slot()?;

        if let Err(e) = registry.mark_voted(voter) {
            self.release_slot();
            warn!("refused ballot {}: {}", ballot.id, e);
            return Err(e);
        }

        if let Err(e) = self.store.append(ballot.clone()) {
            registry.release(voter);
            self.release_slot();
            warn!("refused ballot {}: {}", ballot.id, e);
            return Err(e);
        }

        debug!("accepted ballot {} with receipt {}", ballot.id, ballot.receipt());

        Ok(ballot)
    }

    fn reserve_slot(&self) -> Result<(), Error> {
        let max = self.max_votes;
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                if n < max {
                    Some(n + 1)
                } else {
                    None
                }
            })
            .map(|_| ())
            .map_err(|_| Error::RangeOverflow(format!("election is full ({} ballots)", max)))
    }

    fn release_slot(&self) {
        self.reserved.fetch_sub(1, Ordering::AcqRel);
    }

    /// Close the election and tally it.
    ///
    /// The first successful call seals the store and computes the result; every later
    /// call returns that same result.
    pub fn request_tally(
        &self,
        authority: &DecryptionAuthority,
    ) -> Result<AggregateResult, Error> {
        let mut cached = self.result.lock().map_err(|_| Error::StorePoisoned)?;
        if let Some(result) = cached.as_ref() {
            debug!("returning cached tally for election {}", self.id);
            return Ok(result.clone());
        }

        let result = self.compute_tally(authority)?;
        *cached = Some(result.clone());
        Ok(result)
    }

    /// Recompute the tally from the store, replacing any cached result.
    pub fn recount(&self, authority: &DecryptionAuthority) -> Result<AggregateResult, Error> {
        let mut cached = self.result.lock().map_err(|_| Error::StorePoisoned)?;
        let result = self.compute_tally(authority)?;
        *cached = Some(result.clone());
        Ok(result)
    }

    fn compute_tally(&self, authority: &DecryptionAuthority) -> Result<AggregateResult, Error> {
        authority.check_matches(&self.params, &self.public_key)?;

        self.store.seal()?;
        let ballots = self.store.snapshot()?;
        let num_ballots = ballots.len() as u64;
        let num_streams = self.num_streams();

        for ballot in &ballots {
            ballot.validate(&self.params, num_streams)?;
        }

        let mut decrypted = Vec::with_capacity(num_streams);
        for stream in 0..num_streams {
            let ciphertexts: Vec<Ciphertext> = ballots
                .iter()
                .map(|ballot| ballot.ciphertexts[stream].clone())
                .collect();
            let aggregate = combine_parallel(&ciphertexts, &self.params)?;
            decrypted.push(authority.decrypt(&aggregate)?);
        }

        let counts = match self.encoding {
            TallyEncoding::Exponential => decrypted
                .iter()
                .map(|element| recover_count(element, &self.params, num_ballots))
                .collect::<Result<Vec<_>, _>>()?,
            TallyEncoding::Product => {
                check_product_bound(&self.tags, num_ballots, &self.params)?;
                factor_product(&decrypted[0], &self.tags)?
            }
        };

        // Every ballot carries exactly one vote
        let counted: u64 = counts.iter().sum();
        if counted != num_ballots {
            warn!(
                "election {}: {} ballots decrypted to {} votes",
                self.id, num_ballots, counted
            );
            return Err(Error::RangeOverflow(format!(
                "{} ballots decrypted to {} votes",
                num_ballots, counted
            )));
        }

        let totals = self
            .candidates
            .iter()
            .cloned()
            .zip(counts.into_iter())
            .collect();

        info!(
            "tallied {} ballots for election {} ({} encoding)",
            num_ballots, self.id, self.encoding
        );

        Ok(AggregateResult {
            election_id: self.id,
            encoding: self.encoding,
            num_ballots,
            totals,
            decrypted,
        })
    }
}

impl<S: Store> fmt::Debug for Election<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Election")
            .field("id", &self.id)
            .field("candidates", &self.candidates)
            .field("encoding", &self.encoding)
            .field("max_votes", &self.max_votes)
            .finish()
    }
}

// The product of `count` tags must never wrap around the modulus
fn check_product_bound(
    tags: &[BigUint],
    count: u64,
    params: &GroupParameters,
) -> Result<(), Error> {
    let largest = match tags.last() {
        Some(tag) => tag,
        None => return Ok(()),
    };
    if count == 0 {
        return Ok(());
    }

    let modulus = params.modulus();
    // largest^count >= 2^((bits(largest) - 1) * count)
    let fits = match (largest.bits() - 1).checked_mul(count) {
        Some(lower_bits) if lower_bits >= modulus.bits() => false,
        None => false,
        Some(_) => &largest.pow(count as u32) < modulus,
    };

    if !fits {
        return Err(Error::RangeOverflow(format!(
            "{}^{} does not fit below the {}-bit modulus",
            largest,
            count,
            modulus.bits()
        )));
    }
    Ok(())
}

/// Create a new election from `config`: pick or generate the group, generate the key
/// pair, and hand back the public election along with the decryption authority that
/// alone holds the private exponent.
pub fn setup_election<S: Store>(
    config: &ElectionConfig,
    store: S,
) -> Result<(Election<S>, DecryptionAuthority), Error> {
    config.validate()?;

    let params = if config.fixed_group {
        GroupParameters::rfc3526_2048()?
    } else {
        generate_parameters(config.bit_strength)?
    };

    let keypair = generate_key_pair(&params)?;
    let public_key = keypair.public.clone();
    let authority = DecryptionAuthority::from_key_pair(params.clone(), keypair)?;

    let election = Election::new(
        Uuid::new_v4(),
        params,
        public_key,
        config.candidates.clone(),
        config.encoding,
        config.max_votes,
        store,
    )?;

    info!(
        "set up election {} with {} candidates",
        election.id(),
        election.candidates().len()
    );

    Ok((election, authority))
}
