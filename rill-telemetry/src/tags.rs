//! Span tag vocabulary and assembly.

use rill_core::{FlowError, RunInfo};
use serde::Serialize;
use std::sync::OnceLock;

/// Tag keys shared with the backend's span schema.
///
/// Keys are stable: renaming one is a breaking change for every query and
/// dashboard built on top of exported spans.
pub mod keys {
    pub const SPAN_TYPE: &str = "rill.span_type";
    pub const COMPONENT: &str = "rill.component";
    pub const NAME: &str = "rill.name";
    pub const RUN_MODE: &str = "rill.run_mode";
    pub const SPACE_ID: &str = "rill.space_id";
    pub const RUNTIME: &str = "rill.runtime";
    pub const INPUT: &str = "rill.input";
    pub const OUTPUT: &str = "rill.output";
    pub const ERROR_MESSAGE: &str = "rill.error.message";
    pub const ERROR_KIND: &str = "rill.error.kind";
}

/// An ordered, duplicate-free set of span tags.
///
/// Setting a key that is already present overwrites its value in place;
/// iteration order is insertion order of first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    entries: Vec<(String, String)>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a tag.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Chainable [`insert`](TagSet::insert).
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold another tag set into this one, overwriting shared keys.
    pub fn merge(&mut self, other: TagSet) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }
}

/// Tenant identity under which spans are reported.
#[derive(Debug, Clone)]
pub struct Identity {
    space_id: i64,
}

impl Identity {
    pub fn new(space_id: i64) -> Self {
        Self { space_id }
    }

    pub fn space_id(&self) -> i64 {
        self.space_id
    }
}

#[derive(Serialize)]
struct RuntimeDescriptor {
    language: &'static str,
    library_version: &'static str,
    os: &'static str,
    arch: &'static str,
}

/// Serialized once per process; every span carries the same value.
fn runtime_descriptor() -> &'static str {
    static RUNTIME: OnceLock<String> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        serde_json::to_string(&RuntimeDescriptor {
            language: "rust",
            library_version: env!("CARGO_PKG_VERSION"),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        })
        .unwrap_or_default()
    })
}

/// Identity and runtime tags, set on every span at start.
pub fn identity_tags(identity: &Identity) -> TagSet {
    TagSet::new()
        .set(keys::SPACE_ID, identity.space_id().to_string())
        .set(keys::RUNTIME, runtime_descriptor())
}

/// Run-descriptor tags, set on every span at start.
pub fn run_tags(run: &RunInfo) -> TagSet {
    TagSet::new()
        .set(keys::SPAN_TYPE, run.kind.as_str())
        .set(keys::COMPONENT, run.kind.as_str())
        .set(keys::NAME, run.name.clone())
        .set(keys::RUN_MODE, run.mode.as_str())
}

/// Tags describing a run failure. A `None` error yields an empty set.
pub fn error_tags(err: Option<&FlowError>) -> TagSet {
    match err {
        Some(err) => TagSet::new()
            .set(keys::ERROR_MESSAGE, err.to_string())
            .set(keys::ERROR_KIND, err.kind()),
        None => TagSet::new(),
    }
}
