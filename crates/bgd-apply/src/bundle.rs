//! Resource bundles.

use std::collections::BTreeMap;

/// Asset bytes keyed by their content-addressed filename token.
///
/// The reconstructor consults the bundle to verify that assets referenced
/// by added or edited costume/sound entries are actually available;
/// packaging the bytes into a container is an external concern.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceBundle {
    assets: BTreeMap<String, Vec<u8>>,
}

impl ResourceBundle {
    /// An empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert asset bytes under their filename token.
    pub fn insert(&mut self, token: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(token.into(), bytes);
    }

    /// Look up asset bytes by token.
    pub fn get(&self, token: &str) -> Option<&[u8]> {
        self.assets.get(token).map(Vec::as_slice)
    }

    /// Returns `true` if the bundle holds the token.
    pub fn contains(&self, token: &str) -> bool {
        self.assets.contains_key(token)
    }

    /// Number of assets in the bundle.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns `true` if the bundle holds nothing.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Iterate tokens in sorted order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }
}

impl FromIterator<(String, Vec<u8>)> for ResourceBundle {
    fn from_iter<I: IntoIterator<Item = (String, Vec<u8>)>>(iter: I) -> Self {
        Self {
            assets: iter.into_iter().collect(),
        }
    }
}
