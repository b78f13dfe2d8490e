//! Command access control

use std::collections::{BTreeMap, BTreeSet};

/// Users allowed to run privileged commands, keyed by user id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizedUsers {
    users: BTreeMap<String, String>,
}

impl AuthorizedUsers {
    /// Build from an id -> display label mapping
    #[must_use]
    pub fn new(users: BTreeMap<String, String>) -> Self {
        Self { users }
    }

    /// Whether `user_id` may run privileged commands
    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        self.users.contains_key(user_id)
    }

    /// Display label for an authorized user
    #[must_use]
    pub fn label(&self, user_id: &str) -> Option<&str> {
        self.users.get(user_id).map(String::as_str)
    }

    /// Number of authorized users
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether nobody is authorized
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AuthorizedUsers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            users: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Command words that are never treated as chat triggers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedCommands {
    words: BTreeSet<String>,
}

impl ProtectedCommands {
    /// Build from a list of command words
    #[must_use]
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the first whitespace-delimited token of `content` is protected
    #[must_use]
    pub fn guards(&self, content: &str) -> bool {
        content
            .split_whitespace()
            .next()
            .is_some_and(|first| self.words.contains(first))
    }
}

impl Default for ProtectedCommands {
    fn default() -> Self {
        Self::new(["!add_command", "!list_commands"])
    }
}
