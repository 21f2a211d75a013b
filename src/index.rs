//! # Prefix Index
//! Shared in-memory trie of company names used for autocomplete.
//!
//! Existence-only: a name is either indexed or not. Matching is exact on
//! characters (case-sensitive). All access goes through one `RwLock`: `add`
//! and `remove` take the write side, `prefix_search` the read side, so readers
//! run concurrently with each other but never with a mutation. A full rebuild
//! constructs a fresh trie off-lock and swaps it in under a single write.
//!
//! The index mirrors the store only on a best-effort basis; callers mutate
//! both in sequence and a failure between the two steps leaves them apart.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use metrics::gauge;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("prefix index is full ({max} entries)")]
    CapacityExceeded { max: usize },
}

#[derive(Debug, Default)]
struct Node {
    children: BTreeMap<char, Node>,
    terminal: bool,
}

#[derive(Debug, Default)]
struct Trie {
    root: Node,
    len: usize,
}

impl Trie {
    fn contains(&self, key: &str) -> bool {
        let mut node = &self.root;
        for ch in key.chars() {
            match node.children.get(&ch) {
                Some(n) => node = n,
                None => return false,
            }
        }
        node.terminal
    }

    fn insert(&mut self, key: &str) -> bool {
        let mut node = &mut self.root;
        for ch in key.chars() {
            node = node.children.entry(ch).or_default();
        }
        if node.terminal {
            return false;
        }
        node.terminal = true;
        self.len += 1;
        true
    }

    fn remove(&mut self, key: &str) -> bool {
        let chars: Vec<char> = key.chars().collect();
        let removed = remove_rec(&mut self.root, &chars);
        if removed {
            self.len -= 1;
        }
        removed
    }

    fn with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut node = &self.root;
        for ch in prefix.chars() {
            match node.children.get(&ch) {
                Some(n) => node = n,
                None => return Vec::new(),
            }
        }
        let mut out = Vec::new();
        let mut buf = prefix.to_string();
        collect(node, &mut buf, &mut out);
        out
    }
}

/// Unmarks `key` and prunes branches left without any terminal below them.
fn remove_rec(node: &mut Node, key: &[char]) -> bool {
    match key.split_first() {
        None => {
            let was = node.terminal;
            node.terminal = false;
            was
        }
        Some((ch, rest)) => {
            let Some(child) = node.children.get_mut(ch) else {
                return false;
            };
            let removed = remove_rec(child, rest);
            if removed && !child.terminal && child.children.is_empty() {
                node.children.remove(ch);
            }
            removed
        }
    }
}

fn collect(node: &Node, buf: &mut String, out: &mut Vec<String>) {
    if node.terminal {
        out.push(buf.clone());
    }
    for (ch, child) in &node.children {
        buf.push(*ch);
        collect(child, buf, out);
        buf.pop();
    }
}

#[derive(Debug, Default)]
pub struct PrefixIndex {
    trie: RwLock<Trie>,
    max_entries: Option<usize>,
}

impl PrefixIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index refusing new names once `max_entries` are held.
    pub fn bounded(max_entries: usize) -> Self {
        Self {
            trie: RwLock::default(),
            max_entries: Some(max_entries),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Trie> {
        self.trie.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Trie> {
        self.trie.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Idempotent. Returns `Ok(true)` if the name was newly inserted.
    /// Empty names are ignored.
    pub fn add(&self, name: &str) -> Result<bool, IndexError> {
        if name.is_empty() {
            return Ok(false);
        }
        let mut trie = self.write();
        if let Some(max) = self.max_entries {
            if trie.len >= max && !trie.contains(name) {
                return Err(IndexError::CapacityExceeded { max });
            }
        }
        let inserted = trie.insert(name);
        gauge!("prefix_index_entries").set(trie.len as f64);
        Ok(inserted)
    }

    /// Idempotent. Removing an absent name is a no-op returning `false`.
    pub fn remove(&self, name: &str) -> bool {
        let mut trie = self.write();
        let removed = trie.remove(name);
        gauge!("prefix_index_entries").set(trie.len as f64);
        removed
    }

    /// All indexed names starting with `prefix`, unique, in lexical order.
    pub fn prefix_search(&self, prefix: &str) -> Vec<String> {
        self.read().with_prefix(prefix)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains(name)
    }

    pub fn len(&self) -> usize {
        self.read().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the whole content in one swap. Names beyond the bound are
    /// dropped and reported in the returned count of skipped entries.
    pub fn replace_all<I, S>(&self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fresh = Trie::default();
        let mut skipped = 0usize;
        for name in names {
            let name = name.as_ref();
            if name.is_empty() {
                continue;
            }
            if let Some(max) = self.max_entries {
                if fresh.len >= max && !fresh.contains(name) {
                    skipped += 1;
                    continue;
                }
            }
            fresh.insert(name);
        }
        let mut trie = self.write();
        *trie = fresh;
        gauge!("prefix_index_entries").set(trie.len as f64);
        skipped
    }
}
