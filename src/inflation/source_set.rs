use roaring::RoaringTreemap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Set of global source copies touched by a variant or a factor.
///
/// Copy `i` is `source_copy_offset(source) + copy`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<u64>", into = "Vec<u64>")]
pub struct SourceSet(RoaringTreemap);

impl SourceSet {
    pub fn new() -> Self {
        Self(RoaringTreemap::new())
    }

    pub fn insert(&mut self, copy: usize) {
        self.0.insert(copy as u64);
    }

    pub fn contains(&self, copy: usize) -> bool {
        self.0.contains(copy as u64)
    }

    /// Whether any copy is in both.
    pub fn intersects(&self, other: &Self) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    pub fn union_with(&mut self, other: &Self) {
        self.0 |= &other.0;
    }

    pub fn count(&self) -> usize {
        self.0.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copies, ascending.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().map(|copy| copy as usize)
    }
}

impl FromIterator<usize> for SourceSet {
    fn from_iter<I: IntoIterator<Item = usize>>(copies: I) -> Self {
        Self(copies.into_iter().map(|copy| copy as u64).collect())
    }
}

impl From<Vec<u64>> for SourceSet {
    fn from(copies: Vec<u64>) -> Self {
        Self(copies.into_iter().collect())
    }
}

impl From<SourceSet> for Vec<u64> {
    fn from(set: SourceSet) -> Self {
        set.0.iter().collect()
    }
}

impl PartialEq for SourceSet {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().eq(other.0.iter())
    }
}

impl Eq for SourceSet {}

impl Hash for SourceSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.len());
        for copy in self.0.iter() {
            state.write_u64(copy);
        }
    }
}

impl PartialOrd for SourceSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lexicographic over ascending copies.
impl Ord for SourceSet {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.iter().cmp(other.0.iter())
    }
}
