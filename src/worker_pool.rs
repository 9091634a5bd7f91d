use std::collections::{
    HashSet,
    VecDeque,
};

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::{
    config::AttackConfig,
    host::Host,
    utils::{
        gb_to_hundredths_ceil,
        gb_to_hundredths_floor,
    },
};

/// Returns every node reachable from the local one, local node first, in
/// breadth-first order.
pub fn discover(host: &impl Host) -> Vec<CompactString> {
    let home = host.hostname();

    let mut traversed = vec![];
    let mut seen = HashSet::new();
    let mut pending = VecDeque::new();

    seen.insert(home.clone());
    pending.push_front(home);

    while let Some(node) = pending.pop_back() {
        for child in host.neighbors(&node) {
            // don't consider machines that are already found
            if seen.insert(child.clone()) {
                pending.push_front(child);
            }
        }

        traversed.push(node);
    }

    traversed
}

/// Tries to root every node we are skilled enough for. Returns how many
/// nodes were newly rooted.
pub fn acquire_root(
    host: &impl Host,
    nodes: &[CompactString],
    hacking_level: usize,
) -> usize {
    let home = host.hostname();

    nodes
        .iter()
        .filter(|n| **n != home)
        .filter(|n| !host.has_root(n))
        .filter(|n| {
            host.economic_state(n).required_hacking_level <= hacking_level
        })
        .filter(|n| host.gain_root(n))
        .count()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkerClass {
    /// The node the scheduler itself runs on.
    Local,
    /// Bought by the player.
    Purchased,
    /// Someone else's server that we've rooted (or could).
    Compromised,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Worker {
    hostname: CompactString,
    class: WorkerClass,
    has_root: bool,
    required_hacking_level: usize,

    max_ram_hundredths: u64,
    used_ram_hundredths: u64,
    reserved_hundredths: u64,
}

impl Worker {
    pub fn observe(
        host: &impl Host,
        hostname: CompactString,
        home_reserve_hundredths: u64,
    ) -> Worker {
        let class = if hostname == host.hostname() {
            WorkerClass::Local
        }
        else if host.is_purchased(&hostname) {
            WorkerClass::Purchased
        }
        else {
            WorkerClass::Compromised
        };

        let capacity = host.worker_capacity(&hostname);
        let reserved_hundredths = match class {
            WorkerClass::Local => home_reserve_hundredths,
            _ => 0,
        };

        Worker {
            has_root: host.has_root(&hostname),
            required_hacking_level: host
                .economic_state(&hostname)
                .required_hacking_level,
            hostname,
            class,
            max_ram_hundredths: gb_to_hundredths_floor(capacity.total),
            used_ram_hundredths: gb_to_hundredths_ceil(capacity.used),
            reserved_hundredths,
        }
    }

    /// Builds a worker without asking the game. Used by callers that already
    /// know the numbers.
    pub fn new(
        hostname: &str,
        class: WorkerClass,
        max_ram_hundredths: u64,
        used_ram_hundredths: u64,
    ) -> Worker {
        Worker {
            hostname: CompactString::from(hostname),
            class,
            has_root: true,
            required_hacking_level: 1,
            max_ram_hundredths,
            used_ram_hundredths,
            reserved_hundredths: 0,
        }
    }

    pub fn with_reserve(
        mut self,
        reserved_hundredths: u64,
    ) -> Worker {
        self.reserved_hundredths = reserved_hundredths;
        self
    }

    pub fn get_hostname(&self) -> &str {
        &*self.hostname
    }

    pub fn get_class(&self) -> WorkerClass {
        self.class
    }

    pub fn has_root(&self) -> bool {
        self.has_root
    }

    pub fn get_required_hacking_level(&self) -> usize {
        self.required_hacking_level
    }

    pub fn get_max_ram_hundredths(&self) -> u64 {
        self.max_ram_hundredths
    }

    /// RAM not taken by any running process, minus the headroom kept on the
    /// local node. Never negative.
    pub fn available_capacity(&self) -> u64 {
        self.max_ram_hundredths
            .saturating_sub(self.used_ram_hundredths)
            .saturating_sub(self.reserved_hundredths)
    }
}

/// Composable worker predicates. An empty filter lets everything through.
#[derive(Clone, Debug, Default)]
pub struct WorkerFilter {
    classes: Option<SmallVec<[WorkerClass; 3]>>,
    max_required_level: Option<usize>,
    require_root: bool,
    require_capacity: bool,
}

impl WorkerFilter {
    pub fn new() -> WorkerFilter {
        WorkerFilter::default()
    }

    /// The filter the attack scheduler deploys with.
    pub fn from_config(
        config: &AttackConfig,
        hacking_level: usize,
    ) -> WorkerFilter {
        use WorkerClass::*;

        let mut filter = WorkerFilter::new()
            .within_level(hacking_level)
            .rooted()
            .with_capacity();

        if config.purchased_only {
            filter = filter.classes(&[Local, Purchased]);
        }
        else if config.hacked_only {
            filter = filter.classes(&[Compromised]);
        }

        filter
    }

    pub fn classes(
        mut self,
        classes: &[WorkerClass],
    ) -> WorkerFilter {
        self.classes = Some(classes.iter().copied().collect());
        self
    }

    pub fn within_level(
        mut self,
        level: usize,
    ) -> WorkerFilter {
        self.max_required_level = Some(level);
        self
    }

    pub fn rooted(mut self) -> WorkerFilter {
        self.require_root = true;
        self
    }

    pub fn with_capacity(mut self) -> WorkerFilter {
        self.require_capacity = true;
        self
    }

    pub fn matches(
        &self,
        worker: &Worker,
    ) -> bool {
        if let Some(classes) = &self.classes {
            if !classes.contains(&worker.class) {
                return false;
            }
        }

        // our own node never has a level requirement worth respecting
        if let Some(level) = self.max_required_level {
            if worker.class != WorkerClass::Local
                && level < worker.required_hacking_level
            {
                return false;
            }
        }

        if self.require_root && !worker.has_root {
            return false;
        }

        !self.require_capacity || 0 < worker.available_capacity()
    }
}

/// A snapshot of the network's RAM. Rebuild it every cycle; the game moves
/// under it constantly.
#[derive(Clone, Debug, Default)]
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    pub fn observe(
        host: &impl Host,
        nodes: &[CompactString],
        home_reserve_hundredths: u64,
    ) -> WorkerPool {
        let workers = nodes
            .iter()
            .cloned()
            .map(|n| Worker::observe(host, n, home_reserve_hundredths))
            .collect();

        WorkerPool {
            workers,
        }
    }

    pub fn from_workers(workers: Vec<Worker>) -> WorkerPool {
        WorkerPool {
            workers,
        }
    }

    pub fn workers(&self) -> &[Worker] {
        &*self.workers
    }

    pub fn get(
        &self,
        hostname: &str,
    ) -> Option<&Worker> {
        self.workers.iter().find(|w| w.get_hostname() == hostname)
    }

    pub fn available_capacity(
        &self,
        hostname: &str,
    ) -> u64 {
        self.get(hostname).map_or(0, Worker::available_capacity)
    }

    pub fn filter(
        &self,
        filter: &WorkerFilter,
    ) -> Vec<Worker> {
        self.workers
            .iter()
            .filter(|w| filter.matches(w))
            .cloned()
            .collect()
    }
}

/// Largest free RAM first, hostname to break ties.
pub fn sort_by_capacity(workers: &mut [Worker]) {
    workers.sort_unstable_by(|w1, w2| {
        w2.available_capacity()
            .cmp(&w1.available_capacity())
            .then_with(|| w1.hostname.cmp(&w2.hostname))
    });
}
