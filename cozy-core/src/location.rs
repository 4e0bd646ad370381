//! URL state: the current path and its query parameters, and the history
//! it is written to.

use std::fmt;
use std::str::FromStr;

use url::form_urlencoded;

use crate::error::CozyError;

/// A relative URL: path plus ordered query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    path: String,
    params: Vec<(String, String)>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Location {
            path: if path.is_empty() { "/".to_string() } else { path },
            params: Vec::new(),
        }
    }

    /// Parse `/tasks?projectId=1`. Anything after `#` is ignored.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let input = input.split_once('#').map_or(input, |(before, _)| before);
        let (path, query) = input.split_once('?').unwrap_or((input, ""));

        let params = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Location {
            params,
            ..Location::new(path)
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// First value of `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set `name`, keeping its position if present and dropping duplicates.
    pub fn set_param(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.params.iter().position(|(k, _)| k == name) {
            Some(index) => {
                self.params[index].1 = value;
                let mut seen = false;
                self.params.retain(|(k, _)| {
                    if k != name {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.params.push((name.to_string(), value)),
        }
    }

    pub fn remove_param(&mut self, name: &str) {
        self.params.retain(|(k, _)| k != name);
    }

    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_param(name, value);
        self
    }

    pub fn without_param(mut self, name: &str) -> Self {
        self.remove_param(name);
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if !self.params.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.params.iter())
                .finish();
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

impl FromStr for Location {
    type Err = CozyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.trim_start().starts_with('/') {
            return Err(CozyError::validation(
                "path",
                format!("'{s}' is not an app path (it must start with /)"),
            ));
        }
        Ok(Location::parse(s))
    }
}

/// Reads and writes the current location.
///
/// `push` adds a history entry (explicit user choices); `replace` rewrites
/// the current one (defaults and filter tweaks).
pub trait Navigator {
    fn location(&self) -> Location;
    fn push(&mut self, location: Location);
    fn replace(&mut self, location: Location);
}

/// In-memory back/forward stack.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<Location>,
    index: usize,
    pushes: usize,
    replaces: usize,
}

impl MemoryHistory {
    pub fn new(initial: Location) -> Self {
        MemoryHistory {
            entries: vec![initial],
            index: 0,
            pushes: 0,
            replaces: 0,
        }
    }

    pub fn at(path: &str) -> Self {
        MemoryHistory::new(Location::parse(path))
    }

    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pushes(&self) -> usize {
        self.pushes
    }

    pub fn replaces(&self) -> usize {
        self.replaces
    }
}

impl Navigator for MemoryHistory {
    fn location(&self) -> Location {
        self.entries[self.index].clone()
    }

    /// Drops any forward entries, like a browser does.
    fn push(&mut self, location: Location) {
        self.entries.truncate(self.index + 1);
        self.entries.push(location);
        self.index += 1;
        self.pushes += 1;
    }

    fn replace(&mut self, location: Location) {
        self.entries[self.index] = location;
        self.replaces += 1;
    }
}
