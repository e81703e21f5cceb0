use std::collections::{HashMap, hash_map};

use crate::value::Value;

/// Open, string-keyed configuration handed to stage constructors.
///
/// The chain builder never interprets options, with one exception: the
/// group-by helpers set or override the `type` key before delegating.
///
/// # Examples
///
/// ```
/// use cost_query::Options;
///
/// let caller = Options::new().with("type", "row");
///
/// // `merge` lets the argument win...
/// let forced = caller.clone().merge(Options::new().with("type", "column"));
/// assert_eq!(forced.get_str("type"), Some("column"));
///
/// // ...`reverse_merge` only fills in what is missing.
/// let defaulted = caller.reverse_merge(Options::new().with("type", "column"));
/// assert_eq!(defaulted.get_str("type"), Some("row"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    entries: HashMap<String, Value>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// String value of `key`, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    /// Keys in sorted order, for stable rendering.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Merge `other` into `self`; keys present in `other` win.
    pub fn merge(mut self, other: Options) -> Self {
        self.entries.extend(other.entries);
        self
    }

    /// Merge `defaults` into `self`; keys already present in `self` win.
    pub fn reverse_merge(mut self, defaults: Options) -> Self {
        for (key, value) in defaults.entries {
            self.entries.entry(key).or_insert(value);
        }
        self
    }
}

impl<K, V> FromIterator<(K, V)> for Options
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Options {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Options {
    type Item = (&'a String, &'a Value);
    type IntoIter = hash_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
