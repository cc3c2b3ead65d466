//! Packing the walked entry list into size-capped batches.

use crate::types::Entry;

/// A planner-chosen group of entries written together into one artifact.
///
/// `size` is the running total of file bytes; directories contribute 0 and
/// never trigger a rollover.
#[derive(Debug, Default)]
pub struct Batch {
    pub entries: Vec<Entry>,
    pub size: u64,
}

/// Group entries, in order, into batches whose accounted file bytes stay
/// under `cap`.
///
/// An entry larger than the cap becomes a singleton batch of its own; it is
/// never split across batches. Empty batches are never emitted.
pub fn plan_batches(entries: Vec<Entry>, cap: u64) -> Vec<Batch> {
    let mut batches = Vec::new();
    let mut current = Batch::default();

    for entry in entries {
        if entry.size > cap {
            if !current.entries.is_empty() {
                batches.push(std::mem::take(&mut current));
            }
            let size = entry.size;
            batches.push(Batch {
                entries: vec![entry],
                size,
            });
            continue;
        }

        if current.size + entry.size > cap {
            batches.push(std::mem::take(&mut current));
        }

        current.size += entry.size;
        current.entries.push(entry);
    }

    if !current.entries.is_empty() {
        batches.push(current);
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntryKind;

    fn file(path: &str, size: u64) -> Entry {
        Entry {
            relative_path: path.into(),
            kind: EntryKind::File,
            size,
        }
    }

    fn dir(path: &str) -> Entry {
        Entry {
            relative_path: path.into(),
            kind: EntryKind::Directory,
            size: 0,
        }
    }

    fn paths(batch: &Batch) -> Vec<&str> {
        batch
            .entries
            .iter()
            .map(|e| e.relative_path.as_str())
            .collect()
    }

    #[test]
    fn empty_input_yields_no_batches() {
        assert!(plan_batches(Vec::new(), 100).is_empty());
    }

    #[test]
    fn splits_when_cap_would_be_exceeded() {
        let mib = 1024 * 1024;
        let entries = vec![file("a", mib), file("b", mib), file("c", mib)];
        let batches = plan_batches(entries, mib * 5 / 2);
        assert_eq!(batches.len(), 2);
        assert_eq!(paths(&batches[0]), ["a", "b"]);
        assert_eq!(paths(&batches[1]), ["c"]);
    }

    #[test]
    fn oversize_entry_becomes_singleton() {
        let entries = vec![dir("d"), file("d/big", 300), file("small", 10)];
        let batches = plan_batches(entries, 200);
        assert_eq!(batches.len(), 3);
        assert_eq!(paths(&batches[0]), ["d"]);
        assert_eq!(paths(&batches[1]), ["d/big"]);
        assert_eq!(batches[1].size, 300);
        assert_eq!(paths(&batches[2]), ["small"]);
    }

    #[test]
    fn entry_exactly_at_cap_fills_a_batch() {
        let entries = vec![file("a", 100), file("b", 1)];
        let batches = plan_batches(entries, 100);
        assert_eq!(batches.len(), 2);
        assert_eq!(paths(&batches[0]), ["a"]);
        assert_eq!(paths(&batches[1]), ["b"]);
    }

    #[test]
    fn directories_ride_with_full_batches() {
        let entries = vec![file("a", 100), dir("d"), file("b", 50)];
        let batches = plan_batches(entries, 100);
        assert_eq!(batches.len(), 2);
        assert_eq!(paths(&batches[0]), ["a", "d"]);
        assert_eq!(paths(&batches[1]), ["b"]);
    }
}
