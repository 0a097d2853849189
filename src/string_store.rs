use std::fmt;

/// Handle to a string interned in a [`StringStore`].
///
/// Two strings share a `StringId` exactly when they are equal symbol by symbol.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StringId(u32);

impl StringId {
    /// Position of the string in the store's allocation order.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index).expect("string store exceeded u32::MAX entries");
        StringId(raw)
    }

    pub(crate) fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Append-only interning store for symbol strings.
///
/// Ids are handed out sequentially and stay valid for the lifetime of the
/// store. A second index keeps the ids sorted by the lexicographic order of
/// their strings so lookups are a binary search.
#[derive(Debug, Clone)]
pub struct StringStore<T> {
    /// Interned strings, indexed by `StringId`
    strings: Vec<Box<[T]>>,

    /// Ids ordered by their string content
    ordered: Vec<StringId>,
}

impl<T: Ord + Clone> StringStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            strings: Vec::new(),
            ordered: Vec::new(),
        }
    }

    /// Returns the id of `s`, interning it first if it has not been seen.
    pub fn get_or_create(&mut self, s: &[T]) -> StringId {
        let position = self.lower_bound(s);
        if let Some(&existing) = self.ordered.get(position) {
            if *self.strings[existing.index()] == *s {
                return existing;
            }
        }

        let id = StringId::from_index(self.strings.len());
        self.strings.push(s.into());
        self.ordered.insert(position, id);
        id
    }

    /// Looks up `s` without interning it.
    pub fn find(&self, s: &[T]) -> Option<StringId> {
        let &candidate = self.ordered.get(self.lower_bound(s))?;
        (*self.strings[candidate.index()] == *s).then_some(candidate)
    }

    /// First position in `ordered` whose string is not less than `s`.
    fn lower_bound(&self, s: &[T]) -> usize {
        self.ordered
            .partition_point(|&id| *self.strings[id.index()] < *s)
    }
}

impl<T> StringStore<T> {
    /// Returns the symbols of an interned string.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different store.
    #[inline]
    pub fn get(&self, id: StringId) -> &[T] {
        &self.strings[id.index()]
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns true if nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterates over all strings in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (StringId, &[T])> + '_ {
        self.strings
            .iter()
            .enumerate()
            .map(|(index, s)| (StringId::from_index(index), &**s))
    }

    /// Iterates over all strings in lexicographic order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (StringId, &[T])> + '_ {
        self.ordered
            .iter()
            .map(move |&id| (id, &*self.strings[id.index()]))
    }
}

impl<T: Ord + Clone> Default for StringStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
