use std::collections::BTreeSet;

use crate::model::Snapshot;

/// Names present in both the source and the destination before migration.
///
/// Built once from the before-snapshots and never modified afterwards.
/// Names compare byte-for-byte: no case folding or trimming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictSet {
    names: BTreeSet<String>,
}

impl ConflictSet {
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in byte order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Newline-separated listing for `conflicts.txt`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for name in self.iter() {
            out.push_str(name);
            out.push('\n');
        }
        out
    }
}

pub fn detect(source: &Snapshot, dest: &Snapshot) -> ConflictSet {
    let dest_names: BTreeSet<&str> = dest.names().collect();
    let names = source
        .names()
        .filter(|name| dest_names.contains(name))
        .map(str::to_string)
        .collect();
    ConflictSet { names }
}
