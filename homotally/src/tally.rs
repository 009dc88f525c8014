use crate::*;
use rayon::prelude::*;

/// Fold ciphertexts into one aggregate by componentwise modular multiplication.
///
/// The fold starts at `(1, 1)`, so an empty input yields the identity ciphertext. Every
/// input is checked to be a pair of group elements; a malformed one aborts the fold.
pub fn combine<'a, I>(ciphertexts: I, params: &GroupParameters) -> Result<Ciphertext, Error>
where
    I: IntoIterator<Item = &'a Ciphertext>,
{
    let mut accumulator = TallyAccumulator::new(params.clone());
    for ciphertext in ciphertexts {
        accumulator.add(ciphertext)?;
    }
    Ok(accumulator.into_aggregate())
}

/// `combine` as a parallel map-reduce. Partial products are merged pairwise.
pub fn combine_parallel(
    ciphertexts: &[Ciphertext],
    params: &GroupParameters,
) -> Result<Ciphertext, Error> {
    ciphertexts
        .par_iter()
        .map(|ciphertext| ciphertext.validate(params).map(|_| ciphertext.clone()))
        .try_reduce(Ciphertext::identity, |a, b| Ok(a.combine(&b, params)))
}

/// Streaming aggregation: fold each ciphertext in as it arrives.
#[derive(Debug, Clone)]
pub struct TallyAccumulator {
    params: GroupParameters,
    aggregate: Ciphertext,
    count: usize,
}

impl TallyAccumulator {
    pub fn new(params: GroupParameters) -> Self {
        TallyAccumulator {
            params,
            aggregate: Ciphertext::identity(),
            count: 0,
        }
    }

    /// Fold one more ciphertext into the running aggregate.
    pub fn add(&mut self, ciphertext: &Ciphertext) -> Result<(), Error> {
        ciphertext.validate(&self.params)?;
        self.aggregate = self.aggregate.combine(ciphertext, &self.params);
        self.count += 1;
        Ok(())
    }

    /// Merge another accumulator over the same group into this one.
    pub fn merge(&mut self, other: &TallyAccumulator) -> Result<(), Error> {
        if other.params != self.params {
            return Err(Error::InvalidArgument(
                "cannot merge aggregates over different groups".to_owned(),
            ));
        }
        self.aggregate = self.aggregate.combine(&other.aggregate, &self.params);
        self.count += other.count;
        Ok(())
    }

    /// Number of ciphertexts folded in so far
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn aggregate(&self) -> &Ciphertext {
        &self.aggregate
    }

    pub fn into_aggregate(self) -> Ciphertext {
        self.aggregate
    }
}
