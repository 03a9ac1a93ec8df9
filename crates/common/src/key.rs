use std::fmt;

use serde::{Deserialize, Serialize};

pub const KEY_DELIM: char = '$';

/// Composite hierarchical key: a leading segment followed by `$`-separated
/// upper-case hex counters, e.g. `64$3$1A`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyError {
    MissingDelimiter(String),
    InvalidSegment(String),
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyError::MissingDelimiter(key) => write!(f, "key has no parent segment: {}", key),
            KeyError::InvalidSegment(key) => write!(f, "key has a non-hex segment: {}", key),
        }
    }
}

impl std::error::Error for KeyError {}

impl ObjectId {
    /// Wraps a hand-assigned key without validating it. Used for the
    /// well-known roots and the `-1` parent sentinel.
    pub fn root(value: &str) -> Self {
        ObjectId(value.to_string())
    }

    /// Parses a stored key, rejecting empty input and any non-hex segment
    /// after the first.
    pub fn parse(value: &str) -> Result<Self, KeyError> {
        let mut segments = value.split(KEY_DELIM);
        match segments.next() {
            Some(head) if !head.is_empty() => {}
            _ => return Err(KeyError::InvalidSegment(value.to_string())),
        }
        for segment in segments {
            if parse_counter(segment).is_none() {
                return Err(KeyError::InvalidSegment(value.to_string()));
            }
        }
        Ok(ObjectId(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn child(&self, counter: u64) -> ObjectId {
        ObjectId(format!("{}{}{:X}", self.0, KEY_DELIM, counter))
    }

    /// Splits off the trailing counter: `1$7$2` becomes (`1$7`, 2).
    pub fn split_last(&self) -> Result<(ObjectId, u64), KeyError> {
        let idx = self
            .0
            .rfind(KEY_DELIM)
            .ok_or_else(|| KeyError::MissingDelimiter(self.0.clone()))?;
        let head = &self.0[..idx];
        let tail = &self.0[idx + KEY_DELIM.len_utf8()..];
        if head.is_empty() {
            return Err(KeyError::InvalidSegment(self.0.clone()));
        }
        let counter = parse_counter(tail).ok_or_else(|| KeyError::InvalidSegment(self.0.clone()))?;
        Ok((ObjectId(head.to_string()), counter))
    }

    pub fn parent(&self) -> Result<ObjectId, KeyError> {
        self.split_last().map(|(parent, _)| parent)
    }

    /// Same parent, counter + 1.
    pub fn advance(&self) -> Result<ObjectId, KeyError> {
        let (parent, counter) = self.split_last()?;
        Ok(parent.child(counter.saturating_add(1)))
    }

    /// True when `other` lives strictly below `self`.
    pub fn is_ancestor_of(&self, other: &ObjectId) -> bool {
        other.0.len() > self.0.len()
            && other.0.starts_with(self.0.as_str())
            && other.0[self.0.len()..].starts_with(KEY_DELIM)
    }

    /// Counters below `root`, outermost first. `64$3$5` under `64` yields [3, 5].
    pub fn counters_below(&self, root: &ObjectId) -> Result<Vec<u64>, KeyError> {
        if self == root {
            return Ok(Vec::new());
        }
        if !root.is_ancestor_of(self) {
            return Err(KeyError::InvalidSegment(self.0.clone()));
        }
        let rest = &self.0[root.0.len() + KEY_DELIM.len_utf8()..];
        rest.split(KEY_DELIM)
            .map(|segment| parse_counter(segment).ok_or_else(|| KeyError::InvalidSegment(self.0.clone())))
            .collect()
    }

    /// Moves a key from one subtree to another, keeping its counters:
    /// `64$3$5` rebased from `64` onto `1$14` is `1$14$3$5`.
    pub fn rebase(&self, from: &ObjectId, onto: &ObjectId) -> Result<ObjectId, KeyError> {
        let counters = self.counters_below(from)?;
        Ok(counters
            .into_iter()
            .fold(onto.clone(), |key, counter| key.child(counter)))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn parse_counter(segment: &str) -> Option<u64> {
    if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(segment, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::{KeyError, ObjectId};

    #[test]
    fn child_then_split_returns_parent_and_counter() {
        let parent = ObjectId::root("64");
        for counter in [0u64, 1, 9, 10, 255, 0xDEAD_BEEF, u64::MAX] {
            let key = parent.child(counter);
            assert_eq!(key.split_last().unwrap(), (parent.clone(), counter));
        }
        let nested = parent.child(3).child(0x1A);
        assert_eq!(nested.as_str(), "64$3$1A");
        assert_eq!(nested.split_last().unwrap(), (parent.child(3), 0x1A));
    }

    #[test]
    fn parent_is_strict_prefix_of_child() {
        let parent = ObjectId::root("1$7");
        let key = parent.child(2);
        assert!(parent.is_ancestor_of(&key));
        assert!(!key.is_ancestor_of(&parent));
        assert!(!parent.is_ancestor_of(&parent));
        assert!(!ObjectId::root("1$7").is_ancestor_of(&ObjectId::root("1$70$1")));
    }

    #[test]
    fn advance_increments_last_counter() {
        let key = ObjectId::root("1$6$F");
        assert_eq!(key.advance().unwrap().as_str(), "1$6$10");
    }

    #[test]
    fn rejects_malformed_keys() {
        assert_eq!(
            ObjectId::root("64").split_last().unwrap_err(),
            KeyError::MissingDelimiter("64".to_string())
        );
        assert!(matches!(
            ObjectId::root("64$zz").split_last(),
            Err(KeyError::InvalidSegment(_))
        ));
        assert!(matches!(ObjectId::root("64$").split_last(), Err(KeyError::InvalidSegment(_))));
        assert!(ObjectId::parse("1$14$3").is_ok());
        assert!(ObjectId::parse("1$14$-3").is_err());
        assert!(ObjectId::parse("").is_err());
    }

    #[test]
    fn rebase_moves_counters_onto_new_root() {
        let browse = ObjectId::root("64");
        let music = ObjectId::root("1$14");
        let key = browse.child(3).child(5);
        assert_eq!(key.rebase(&browse, &music).unwrap().as_str(), "1$14$3$5");
        assert_eq!(browse.rebase(&browse, &music).unwrap(), music);
        assert!(ObjectId::root("2$8$1").rebase(&browse, &music).is_err());
    }
}
