use std::collections::HashSet;

/// Offer keys that already produced a notification.
///
/// Keys are only ever added. There is no re-notification policy, so an offer
/// stays in the set for as long as the persisted state lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifiedSet {
    keys: HashSet<String>,
}

impl NotifiedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Returns `false` if the key was already present.
    pub fn insert(&mut self, key: String) -> bool {
        self.keys.insert(key)
    }

    pub fn keys(&self) -> &HashSet<String> {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in lexicographic order, for stable persistence and listings.
    pub fn sorted_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.keys.iter().cloned().collect();
        keys.sort_unstable();
        keys
    }
}

impl FromIterator<String> for NotifiedSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl From<NotifiedSet> for HashSet<String> {
    fn from(set: NotifiedSet) -> Self {
        set.keys
    }
}

impl From<HashSet<String>> for NotifiedSet {
    fn from(keys: HashSet<String>) -> Self {
        Self { keys }
    }
}
