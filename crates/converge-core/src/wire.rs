//! Flat key/value wire request model.

use std::fmt;

/// A flat wire request: ordered `key -> scalar` pairs as sent to the
/// remote control plane.
///
/// Keys are plain (`Name`) or positionally indexed (`Tag.3`). Insertion
/// order is preserved, which is what makes indexed-array expansion
/// deterministic. Setting an existing key overwrites in place
/// (last write wins), so one local field maps to at most one wire key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireRequest {
    entries: Vec<(String, String)>,
}

impl WireRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a key to a value, overwriting any previous value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Emits `Base.1 .. Base.k` for a k-element collection, in order.
    ///
    /// Existing `Base.*` keys are cleared first so re-expansion never
    /// leaves stale trailing indices behind. An empty collection emits
    /// no keys at all.
    pub fn expand(&mut self, base: &str, values: impl IntoIterator<Item = String>) {
        let prefix = format!("{base}.");
        self.entries.retain(|(k, _)| !k.starts_with(&prefix));
        for (i, value) in values.into_iter().enumerate() {
            self.entries.push((format!("{}{}", prefix, i + 1), value));
        }
    }

    /// Returns the value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if the key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Removes a key, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the request carries no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Consumes the request into its ordered pairs.
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.entries
    }
}

impl fmt::Display for WireRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, "&")?;
            }
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

impl FromIterator<(String, String)> for WireRequest {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut req = WireRequest::new();
        for (k, v) in iter {
            req.set(k, v);
        }
        req
    }
}
