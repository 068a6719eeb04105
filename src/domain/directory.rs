use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub i64);

impl FromStr for Address {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| AppError::ValidationError("user_id must be a number".to_string()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct DirectoryEntry {
    #[serde(rename = "user_id")]
    pub address: Address,
    /// Free text used for lookups and as the default full name.
    #[serde(default)]
    pub note: String,
}

impl DirectoryEntry {
    pub fn new(address: Address, note: impl Into<String>) -> Self {
        Self {
            address,
            note: note.into(),
        }
    }

    pub fn note(&self) -> Option<&str> {
        let note = self.note.trim();
        (!note.is_empty()).then_some(note)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedBy {
    Username,
    UserId,
    Note,
}

impl fmt::Display for MatchedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchedBy::Username => "username",
            MatchedBy::UserId => "user id",
            MatchedBy::Note => "note",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub key: String,
    pub matched_by: MatchedBy,
}

/// Iteration order is key order, which is also the tie-break for lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Directory {
    entries: BTreeMap<String, DirectoryEntry>,
}

pub fn normalize_key(key: &str) -> String {
    key.trim().trim_start_matches('@').to_lowercase()
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&DirectoryEntry> {
        self.entries.get(&normalize_key(key))
    }

    pub fn address_of(&self, key: &str) -> Option<Address> {
        self.get(key).map(|entry| entry.address)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DirectoryEntry)> {
        self.entries.iter()
    }

    pub fn upsert(&mut self, key: &str, entry: DirectoryEntry) {
        self.entries.insert(normalize_key(key), entry);
    }

    /// Keeps any existing note. `true` when the user is new.
    pub fn register(&mut self, key: &str, address: Address) -> bool {
        let key = normalize_key(key);
        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.address = address;
                false
            }
            None => {
                self.entries.insert(key, DirectoryEntry::new(address, ""));
                true
            }
        }
    }

    pub fn set_note(&mut self, key: &str, note: impl Into<String>) -> Result<(), AppError> {
        let key = normalize_key(key);
        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.note = note.into();
                Ok(())
            }
            None => Err(AppError::EntryNotFound(key)),
        }
    }

    /// Exact username, then exact user id, then a case-insensitive substring of
    /// the note.
    pub fn resolve(&self, input: &str) -> Option<Resolution> {
        let needle = normalize_key(input);
        if needle.is_empty() {
            return None;
        }

        let found = |key: &String, matched_by| Resolution {
            key: key.clone(),
            matched_by,
        };

        if let Some((key, _)) = self.entries.get_key_value(&needle) {
            return Some(found(key, MatchedBy::Username));
        }

        if let Some((key, _)) = self
            .entries
            .iter()
            .find(|(_, entry)| entry.address.to_string() == needle)
        {
            return Some(found(key, MatchedBy::UserId));
        }

        self.entries
            .iter()
            .find(|(_, entry)| entry.note.to_lowercase().contains(&needle))
            .map(|(key, _)| found(key, MatchedBy::Note))
    }
}
