//! Greedy placement of batch threads onto worker RAM.

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::{
    operation::{
        Operation,
        ThreadCounts,
    },
    worker_pool::Worker,
};

/// Threads wanted for one operation and what each of them costs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Requirement {
    pub operation: Operation,
    pub threads: usize,
    pub cost_hundredths: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub worker: CompactString,
    pub operation: Operation,
    pub threads: usize,
    pub cost_hundredths: u64,
}

impl Placement {
    pub fn ram_hundredths(&self) -> u64 {
        (self.threads as u64).saturating_mul(self.cost_hundredths)
    }
}

/// Where each thread goes, and how many couldn't go anywhere.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeploymentPlan {
    placements: Vec<Placement>,
    required: ThreadCounts,
    placed: ThreadCounts,
}

impl DeploymentPlan {
    pub fn placements(&self) -> &[Placement] {
        &*self.placements
    }

    pub fn required(
        &self,
        op: Operation,
    ) -> usize {
        self.required[op]
    }

    pub fn placed(
        &self,
        op: Operation,
    ) -> usize {
        self.placed[op]
    }

    pub fn shortfall(
        &self,
        op: Operation,
    ) -> usize {
        self.required[op].saturating_sub(self.placed[op])
    }

    pub fn required_counts(&self) -> ThreadCounts {
        self.required
    }

    pub fn placed_counts(&self) -> ThreadCounts {
        self.placed
    }

    pub fn shortfall_counts(&self) -> ThreadCounts {
        self.required.saturating_sub(&self.placed)
    }

    pub fn total_shortfall(&self) -> usize {
        self.shortfall_counts().total()
    }

    /// RAM the plan takes on `worker`.
    pub fn committed_on(
        &self,
        worker: &str,
    ) -> u64 {
        self.placements
            .iter()
            .filter(|p| p.worker.as_str() == worker)
            .map(Placement::ram_hundredths)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

/// Fills workers in the order given (callers sort largest first), placing as
/// many threads of each operation as fit before moving on to the next one.
///
/// Operations are always tried weaken, grow, correction weaken, hack on each
/// worker no matter how `requirements` is ordered. A requirement with a zero
/// per-thread cost is never placed.
pub fn allocate(
    workers: &[Worker],
    requirements: &[Requirement],
) -> DeploymentPlan {
    let mut remaining = requirements
        .iter()
        .copied()
        .collect::<SmallVec<[Requirement; 4]>>();
    remaining.sort_by_key(|r| r.operation.priority());

    let mut plan = DeploymentPlan::default();
    for requirement in remaining.iter() {
        plan.required[requirement.operation] = plan.required
            [requirement.operation]
            .saturating_add(requirement.threads);
    }

    for worker in workers {
        let mut free = worker.available_capacity();

        for requirement in remaining.iter_mut() {
            if requirement.threads == 0 {
                continue;
            }

            let fits = match free.checked_div(requirement.cost_hundredths) {
                Some(f) => usize::try_from(f).unwrap_or(usize::MAX),
                None => 0,
            };

            let threads = requirement.threads.min(fits);
            if threads == 0 {
                continue;
            }

            requirement.threads -= threads;
            free -= threads as u64 * requirement.cost_hundredths;

            plan.placed[requirement.operation] += threads;
            plan.placements.push(Placement {
                worker: CompactString::from(worker.get_hostname()),
                operation: requirement.operation,
                threads,
                cost_hundredths: requirement.cost_hundredths,
            });
        }

        if remaining.iter().all(|r| r.threads == 0) {
            break;
        }
    }

    plan
}
