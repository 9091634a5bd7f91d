use std::collections::{
    btree_map,
    BTreeMap,
    BTreeSet,
};

use compact_str::CompactString;

use crate::host::Host;

/// Threads currently pointed at one target.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InFlightAttack {
    pub threads: usize,
    pub servers: BTreeSet<CompactString>,
}

/// Who is attacking what, as seen in the process table right now.
///
/// Nothing is remembered between scans: the process table is the only source
/// of truth, so scan again every cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttackRegistry {
    attacks: BTreeMap<CompactString, InFlightAttack>,
}

impl AttackRegistry {
    /// Groups every process running one of `filenames` by its first argument.
    pub fn scan<W>(
        host: &impl Host,
        workers: &[W],
        filenames: &[&str],
    ) -> AttackRegistry
    where
        W: AsRef<str>,
    {
        let mut attacks = BTreeMap::<CompactString, InFlightAttack>::new();

        for worker in workers {
            let worker = worker.as_ref();

            for process in host.list_processes(worker) {
                if !filenames.contains(&process.filename.as_str()) {
                    continue;
                }

                // an attack script without a target isn't attacking anything
                let target = match process.args.first() {
                    Some(t) => CompactString::from(t.as_str()),
                    None => continue,
                };

                let attack = attacks.entry(target).or_default();
                attack.threads += process.threads;
                attack.servers.insert(CompactString::from(worker));
            }
        }

        AttackRegistry {
            attacks,
        }
    }

    pub fn contains(
        &self,
        target: &str,
    ) -> bool {
        self.attacks.contains_key(target)
    }

    pub fn get(
        &self,
        target: &str,
    ) -> Option<&InFlightAttack> {
        self.attacks.get(target)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, CompactString, InFlightAttack> {
        self.attacks.iter()
    }

    pub fn len(&self) -> usize {
        self.attacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attacks.is_empty()
    }

    pub fn total_threads(&self) -> usize {
        self.attacks.values().map(|a| a.threads).sum()
    }

    pub fn as_map(&self) -> &BTreeMap<CompactString, InFlightAttack> {
        &self.attacks
    }
}
