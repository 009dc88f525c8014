use crate::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Who may vote, and who already has.
///
/// The voter list is fixed before voting opens. The "has voted" flag for each voter is
/// claimed with a compare-and-set, so two concurrent casts by the same voter cannot both
/// succeed.
#[derive(Debug, Default)]
pub struct EligibilityRegistry {
    voters: HashMap<String, AtomicBool>,
}

impl EligibilityRegistry {
    pub fn new() -> Self {
        EligibilityRegistry::default()
    }

    /// Add a voter. Registering the same voter twice is a no-op.
    pub fn register(&mut self, voter: impl Into<String>) {
        self.voters
            .entry(voter.into())
            .or_insert_with(|| AtomicBool::new(false));
    }

    pub fn is_eligible(&self, voter: &str) -> bool {
        self.voters.contains_key(voter)
    }

    pub fn has_voted(&self, voter: &str) -> Result<bool, Error> {
        self.voters
            .get(voter)
            .map(|flag| flag.load(Ordering::Acquire))
            .ok_or_else(|| Error::NotEligible(voter.to_owned()))
    }

    /// Claim the voter's single vote.
    pub fn mark_voted(&self, voter: &str) -> Result<(), Error> {
        let flag = self
            .voters
            .get(voter)
            .ok_or_else(|| Error::NotEligible(voter.to_owned()))?;

        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| Error::AlreadyVoted(voter.to_owned()))
    }

    // Undo a claim whose ballot never made it into the store
    pub(crate) fn release(&self, voter: &str) {
        if let Some(flag) = self.voters.get(voter) {
            flag.store(false, Ordering::Release);
        }
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    /// Number of voters who have cast a ballot
    pub fn turnout(&self) -> usize {
        self.voters
            .values()
            .filter(|flag| flag.load(Ordering::Acquire))
            .count()
    }
}

impl<S: Into<String>> std::iter::FromIterator<S> for EligibilityRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(voters: I) -> Self {
        let mut registry = EligibilityRegistry::new();
        for voter in voters {
            registry.register(voter);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn one_vote_per_voter() {
        let registry: EligibilityRegistry = vec!["alice", "bob"].into_iter().collect();
        assert_eq!(registry.len(), 2);
        assert!(registry.is_eligible("alice"));
        assert!(!registry.is_eligible("mallory"));

        registry.mark_voted("alice").unwrap();
        assert!(registry.has_voted("alice").unwrap());
        assert!(!registry.has_voted("bob").unwrap());

        assert!(matches!(
            registry.mark_voted("alice"),
            Err(Error::AlreadyVoted(v)) if v == "alice"
        ));
        assert!(matches!(
            registry.mark_voted("mallory"),
            Err(Error::NotEligible(_))
        ));
        assert!(registry.has_voted("mallory").is_err());
        assert_eq!(registry.turnout(), 1);
    }

    #[test]
    fn racing_claims_have_one_winner() {
        let mut registry = EligibilityRegistry::new();
        registry.register("carol");
        registry.register("carol");
        assert_eq!(registry.len(), 1);

        let registry = Arc::new(registry);
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.mark_voted("carol").is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
