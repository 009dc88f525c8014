use crate::*;
use content_inspector::ContentType;
use log::debug;
use std::sync::RwLock;

/// An append-only ballot store
///
/// Implementations must be safe to share between threads: casting appends concurrently
/// while a tally may seal and snapshot at any moment.
pub trait Store: Send + Sync {
    /// Append a ballot. Fails with `ElectionClosed` once the store is sealed.
    fn append(&self, ballot: Ballot) -> Result<(), Error>;

    /// Refuse all further appends
    fn seal(&self) -> Result<(), Error>;

    fn is_sealed(&self) -> Result<bool, Error>;

    /// A consistent copy of every stored ballot, in append order
    fn snapshot(&self) -> Result<Vec<Ballot>, Error>;

    fn len(&self) -> Result<usize, Error>;

    fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len()? == 0)
    }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
struct MemStoreInner {
    ballots: Vec<Ballot>,
    sealed: bool,
}

/// A simple store that keeps ballots in memory
#[derive(Default, Debug)]
pub struct MemStore {
    inner: RwLock<MemStoreInner>,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore::default()
    }

    /// Pack the store (ballots and sealed flag) as CBOR
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let inner = self.inner.read().map_err(|_| Error::StorePoisoned)?;
        Ok(serde_cbor::to_vec(&*inner)?)
    }

    /// Unpack a store from either JSON or CBOR bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.is_empty() {
            return Err(Error::DeserializationUnknownFormat);
        }

        // JSON starts with `{`; anything else that reads as text is malformed JSON
        let inner: MemStoreInner = if bytes[0] == b'{' {
            serde_json::from_slice(bytes)?
        } else {
            match content_inspector::inspect(bytes) {
                ContentType::UTF_8 if std::str::from_utf8(bytes).is_ok() => {
                    serde_json::from_slice(bytes)?
                }
                ContentType::UTF_8 | ContentType::BINARY => serde_cbor::from_slice(bytes)?,
                _ => return Err(Error::DeserializationUnknownFormat),
            }
        };

        Ok(MemStore {
            inner: RwLock::new(inner),
        })
    }
}

impl Store for MemStore {
    fn append(&self, ballot: Ballot) -> Result<(), Error> {
        let mut inner = self.inner.write().map_err(|_| Error::StorePoisoned)?;
        if inner.sealed {
            return Err(Error::ElectionClosed);
        }
        inner.ballots.push(ballot);
        debug!("ballot store now holds {} ballots", inner.ballots.len());
        Ok(())
    }

    fn seal(&self) -> Result<(), Error> {
        let mut inner = self.inner.write().map_err(|_| Error::StorePoisoned)?;
        inner.sealed = true;
        Ok(())
    }

    fn is_sealed(&self) -> Result<bool, Error> {
        let inner = self.inner.read().map_err(|_| Error::StorePoisoned)?;
        Ok(inner.sealed)
    }

    fn snapshot(&self) -> Result<Vec<Ballot>, Error> {
        let inner = self.inner.read().map_err(|_| Error::StorePoisoned)?;
        Ok(inner.ballots.clone())
    }

    fn len(&self) -> Result<usize, Error> {
        let inner = self.inner.read().map_err(|_| Error::StorePoisoned)?;
        Ok(inner.ballots.len())
    }
}

impl From<Vec<Ballot>> for MemStore {
    fn from(ballots: Vec<Ballot>) -> Self {
        MemStore {
            inner: RwLock::new(MemStoreInner {
                ballots,
                sealed: false,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use std::sync::Arc;
    use std::thread;

    fn ballot(n: u64) -> Ballot {
        Ballot::new(vec![Ciphertext {
            c1: BigUint::from(n),
            c2: BigUint::from(n + 1),
        }])
    }

    #[test]
    fn append_until_sealed() {
        let store = MemStore::new();
        assert!(store.is_empty().unwrap());

        store.append(ballot(1)).unwrap();
        store.append(ballot(2)).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert!(!store.is_sealed().unwrap());

        store.seal().unwrap();
        assert!(store.is_sealed().unwrap());
        assert!(matches!(store.append(ballot(3)), Err(Error::ElectionClosed)));
        assert_eq!(store.snapshot().unwrap().len(), 2);
    }

    #[test]
    fn snapshot_keeps_append_order() {
        let ballots: Vec<Ballot> = (1..6).map(ballot).collect();
        let store = MemStore::from(ballots.clone());
        assert_eq!(store.snapshot().unwrap(), ballots);
    }

    #[test]
    fn packs_and_unpacks() {
        let store = MemStore::from(vec![ballot(3), ballot(4)]);
        store.seal().unwrap();

        let cbor = store.to_bytes().unwrap();
        let unpacked = MemStore::from_bytes(&cbor).unwrap();
        assert_eq!(unpacked.snapshot().unwrap(), store.snapshot().unwrap());
        assert!(unpacked.is_sealed().unwrap());

        let json = serde_json::to_vec(&*store.inner.read().unwrap()).unwrap();
        let unpacked = MemStore::from_bytes(&json).unwrap();
        assert_eq!(unpacked.snapshot().unwrap(), store.snapshot().unwrap());

        assert!(matches!(
            MemStore::from_bytes(b""),
            Err(Error::DeserializationUnknownFormat)
        ));
        assert!(matches!(
            MemStore::from_bytes(b"not a store"),
            Err(Error::JSONDeserialization(_))
        ));
        assert!(matches!(
            MemStore::from_bytes(&[0xa1, 0x00, 0xff]),
            Err(Error::CBORDeserialization(_))
        ));
    }

    #[test]
    fn concurrent_appends() {
        let store = Arc::new(MemStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..25 {
                        store.append(ballot(t * 100 + i + 1)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len().unwrap(), 200);
    }
}
