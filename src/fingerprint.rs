use crate::string_store::StringId;
use ahash::AHashSet as HashSet;
use xxhash_rust::xxh3::xxh3_128;

/// 128-bit digest of a rule/identity state.
///
/// Only used to notice that completion revisits a state; rewriting never
/// depends on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(u128);

impl Fingerprint {
    /// Digests two ordered sequences of id pairs.
    ///
    /// The length of the first section is hashed too, so moving a pair from
    /// one section to the other changes the digest.
    pub fn of_sections<R, I>(rules: R, identities: I) -> Self
    where
        R: ExactSizeIterator<Item = (StringId, StringId)>,
        I: Iterator<Item = (StringId, StringId)>,
    {
        let mut buffer = Vec::with_capacity(8 + rules.len() * 8);
        buffer.extend_from_slice(&(rules.len() as u64).to_le_bytes());
        for (a, b) in rules.chain(identities) {
            buffer.extend_from_slice(&a.to_le_bytes());
            buffer.extend_from_slice(&b.to_le_bytes());
        }
        Fingerprint(xxh3_128(&buffer))
    }
}

/// Fingerprints seen so far in a run.
#[derive(Debug, Default)]
pub(crate) struct StateHistory {
    seen: HashSet<Fingerprint>,
}

impl StateHistory {
    /// Records `fingerprint`; returns false if it was seen before.
    pub(crate) fn record(&mut self, fingerprint: Fingerprint) -> bool {
        self.seen.insert(fingerprint)
    }

    pub(crate) fn clear(&mut self) {
        self.seen.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.seen.len()
    }
}
