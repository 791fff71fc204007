#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

use ministry_dashboard::db::repositories::LocalStore;
use ministry_dashboard::db::repository::Collection;
use ministry_dashboard::db::StoreConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the previous values on unwind and serializes access to the
/// process environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs: `Some(v)` sets, `None` removes.
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    saved: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let saved = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { saved }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.saved.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// The sample seed shipped with the crate.
pub fn seed_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/seed.json")
}

pub fn seeded_store() -> LocalStore {
    LocalStore::from_json_file(seed_path(), &StoreConfig::default()).expect("seed file loads")
}

/// Builder for small, hand-written store contents.
#[derive(Default)]
pub struct Fixture {
    store: LocalStore,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(self, id: &str, name: &str) -> Self {
        self.store
            .insert_json(Collection::Categories, id, json!({ "categoryName": name }));
        self
    }

    pub fn user(self, id: &str, display_name: &str, temple: Option<&str>) -> Self {
        self.store.insert_json(
            Collection::Users,
            id,
            json!({ "displayName": display_name, "temple": temple }),
        );
        self
    }

    /// A report by `author` created at `created_at` (RFC 3339). Fields in
    /// `extra` are merged into the document.
    pub fn report(self, id: &str, author: &str, created_at: &str, extra: Value) -> Self {
        let mut fields = json!({ "createdBy": author, "createdAt": created_at });
        if let (Some(target), Value::Object(extra)) = (fields.as_object_mut(), extra) {
            target.extend(extra);
        }
        self.store.insert_json(Collection::Reports, id, fields);
        self
    }

    pub fn build(self) -> LocalStore {
        self.store
    }
}
