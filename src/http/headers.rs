//! Ordered HTTP header map with overwrite semantics.
//!
//! Names are stored exactly as received or set. Setting a name that is
//! already present replaces its value in place, so the position of the first
//! occurrence is kept and distinct names stay in insertion order.

use std::collections::HashMap;
use std::fmt;

/// An insertion-ordered header map where the last write for a name wins.
///
/// The value type is generic: responses use `Headers<String>`, while parsed
/// requests use `Headers<Option<String>>` because a header line without a
/// `": "` separator has no value.
///
/// # Examples
///
/// ```
/// use h1wire::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.set("Content-Type", "application/json".to_owned());
/// headers.set("Accept-Ranges", "bytes".to_owned());
/// headers.set("Content-Type", "text/html".to_owned());
///
/// let names: Vec<_> = headers.names().collect();
/// assert_eq!(names, vec!["Content-Type", "Accept-Ranges"]);
/// assert_eq!(headers.get("Content-Type").map(String::as_str), Some("text/html"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headers<V = String> {
    entries: Vec<(String, V)>,
    // Name -> position in `entries`.
    index: HashMap<String, usize>,
}

impl<V> Default for Headers<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> Headers<V> {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `name`, replacing any previous value for that exact name.
    ///
    /// Returns the replaced value, if there was one.
    pub fn set(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        let name = name.into();
        if let Some(&pos) = self.index.get(&name) {
            return Some(std::mem::replace(&mut self.entries[pos].1, value));
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, value));
        None
    }

    /// Returns the value stored under exactly `name`.
    pub fn get(&self, name: &str) -> Option<&V> {
        self.index.get(name).map(|&pos| &self.entries[pos].1)
    }

    /// Returns the value of the first name matching `name` case-insensitively.
    pub fn get_ignore_case(&self, name: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Returns the number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the header names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Returns an iterator over all `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<N: Into<String>, V> FromIterator<(N, V)> for Headers<V> {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.set(name, value);
        }
        headers
    }
}

impl fmt::Display for Headers<String> {
    /// Writes every entry as a `Name: Value\r\n` line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites_in_place() {
        let mut h = Headers::new();
        assert_eq!(h.set("A", "1".to_owned()), None);
        h.set("B", "x".to_owned());
        assert_eq!(h.set("A", "2".to_owned()), Some("1".to_owned()));
        let pairs: Vec<_> = h.iter().map(|(k, v)| (k, v.as_str())).collect();
        assert_eq!(pairs, vec![("A", "2"), ("B", "x")]);
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut h = Headers::new();
        h.set("Content-Type", "text/plain".to_owned());
        h.set("content-type", "text/html".to_owned());
        assert_eq!(h.len(), 2);
        assert_eq!(h.get("content-type").map(String::as_str), Some("text/html"));
        assert_eq!(
            h.get_ignore_case("CONTENT-TYPE").map(String::as_str),
            Some("text/plain")
        );
    }

    #[test]
    fn optional_values() {
        let h: Headers<Option<String>> =
            [("Host", Some("localhost".to_owned())), ("Broken", None)]
                .into_iter()
                .collect();
        assert_eq!(h.get("Host"), Some(&Some("localhost".to_owned())));
        assert_eq!(h.get("Broken"), Some(&None));
        assert_eq!(h.get("Missing"), None);
    }

    #[test]
    fn many_distinct_names_keep_order() {
        let mut h = Headers::new();
        for i in 0..20_000 {
            h.set(format!("x-header-{i:08}"), i.to_string());
        }
        h.set("x-header-00000007", "again".to_owned());
        assert_eq!(h.len(), 20_000);
        assert_eq!(h.get("x-header-00019999").map(String::as_str), Some("19999"));
        assert_eq!(h.get("x-header-00000007").map(String::as_str), Some("again"));
        assert_eq!(h.names().nth(7), Some("x-header-00000007"));
    }

    #[test]
    fn display_writes_header_lines() {
        let mut h = Headers::new();
        h.set("A", "1".to_owned());
        h.set("B", "2".to_owned());
        assert_eq!(h.to_string(), "A: 1\r\nB: 2\r\n");
    }
}
