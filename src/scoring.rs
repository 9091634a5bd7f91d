//! Target ranking and per-operation thread requirements.
//!
//! All formulas here are pure over a [`Target`] snapshot; the only game calls
//! happen in [`Target::observe`].

use std::collections::BTreeMap;

use compact_str::CompactString;
use decorum::N64;

use crate::{
    host::{
        EconomicState,
        Host,
    },
    operation::{
        Operation,
        ThreadCounts,
    },
    script_deploy::HGW,
};

/// Leaving security this close to minimum avoids chasing rounding noise.
const WEAKEN_TOLERANCE: f64 = 1.;
const SCORE_DECAY_PER_SECOND: f64 = 0.95;
const MONEY_NORMALIZATION: f64 = 1e6;
/// A hack leg never plans to take more than this, so regrowth stays finite.
const MAX_STOLEN_FRACTION: f64 = 0.99;

/// Milliseconds per operation against one target.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Durations {
    pub hack: f64,
    pub grow: f64,
    pub weaken: f64,
}

impl Durations {
    pub fn of(
        &self,
        hgw: HGW,
    ) -> f64 {
        match hgw {
            HGW::Hack => self.hack,
            HGW::Grow => self.grow,
            HGW::Weaken => self.weaken,
        }
    }

    /// Time from the start of a batch to its hack landing.
    pub fn full_cycle(&self) -> f64 {
        self.grow.max(self.weaken) + self.hack
    }
}

/// What a single thread of each primitive does to the target.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UnitEffects {
    /// fraction of current money stolen
    pub hack: f64,
    /// security added by hack
    pub hack_security: f64,
    /// security added
    pub grow_security: f64,
    /// security removed
    pub weaken_security: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    hostname: CompactString,
    economy: EconomicState,
    durations: Durations,
    effects: UnitEffects,
    /// game's grow-thread estimate to go from current money back to max
    growth_threads: f64,
    purchased: bool,
    local: bool,
    has_root: bool,
}

impl Target {
    pub fn observe(
        host: &impl Host,
        hostname: &str,
    ) -> Target {
        let economy = host.economic_state(hostname);
        let multiplier = economy.max_money / economy.current_money.max(1.);

        Target {
            hostname: CompactString::from(hostname),
            durations: Durations {
                hack: host.operation_duration(hostname, HGW::Hack),
                grow: host.operation_duration(hostname, HGW::Grow),
                weaken: host.operation_duration(hostname, HGW::Weaken),
            },
            effects: UnitEffects {
                hack: host.unit_effect(hostname, HGW::Hack),
                hack_security: host.hack_security(hostname),
                grow_security: host.unit_effect(hostname, HGW::Grow),
                weaken_security: host.unit_effect(hostname, HGW::Weaken),
            },
            growth_threads: host.growth_threads(hostname, multiplier),
            purchased: host.is_purchased(hostname),
            local: *hostname == *host.hostname(),
            has_root: host.has_root(hostname),
            economy,
        }
    }

    pub fn new(
        hostname: &str,
        economy: EconomicState,
        durations: Durations,
        effects: UnitEffects,
        growth_threads: f64,
    ) -> Target {
        Target {
            hostname: CompactString::from(hostname),
            economy,
            durations,
            effects,
            growth_threads,
            purchased: false,
            local: false,
            has_root: true,
        }
    }

    pub fn get_hostname(&self) -> &str {
        &*self.hostname
    }

    pub fn get_economy(&self) -> &EconomicState {
        &self.economy
    }

    pub fn get_durations(&self) -> &Durations {
        &self.durations
    }

    pub fn get_effects(&self) -> &UnitEffects {
        &self.effects
    }

    /// Zero max money or a zero steal rate means hack does nothing here.
    pub fn is_hackable(&self) -> bool {
        0. < self.economy.max_money && 0. < self.effects.hack
    }

    pub fn is_candidate(
        &self,
        hacking_level: usize,
    ) -> bool {
        !self.local
            && !self.purchased
            && self.has_root
            && self.economy.required_hacking_level <= hacking_level
            && self.is_hackable()
    }
}

/// Knobs that decide how big each leg of a batch is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThreadPolicy {
    pub growth_target_fraction: f64,
    pub hack_target_fraction: f64,
    pub correction_weaken: bool,
    pub max_threads_cap: Option<usize>,
}

impl Default for ThreadPolicy {
    fn default() -> ThreadPolicy {
        ThreadPolicy {
            growth_target_fraction: 0.9,
            hack_target_fraction: 0.25,
            correction_weaken: true,
            max_threads_cap: None,
        }
    }
}

/// Higher is better: lots of money, little security, short cycles.
pub fn score(target: &Target) -> f64 {
    let economy = &target.economy;

    let money = economy.max_money / MONEY_NORMALIZATION;
    let security = 1. / economy.min_security.max(1.);
    let decay = SCORE_DECAY_PER_SECOND
        .powf(target.durations.full_cycle() / 1000.);

    money * security * decay
}

/// `f64 -> usize` rounding up, with negatives and NaN pinned at zero.
fn ceil_threads(threads: f64) -> usize {
    threads.ceil().max(0.) as usize
}

fn capped(
    threads: usize,
    policy: &ThreadPolicy,
) -> usize {
    match policy.max_threads_cap {
        Some(cap) => threads.min(cap),
        None => threads,
    }
}

/// Weaken threads that cancel the security added by `grow` grow threads.
fn correction_threads(
    target: &Target,
    grow: usize,
) -> usize {
    let effects = &target.effects;
    if effects.weaken_security <= 0. {
        return 0;
    }

    ceil_threads(grow as f64 * (effects.grow_security / effects.weaken_security))
}

pub fn required_threads(
    target: &Target,
    op: Operation,
    policy: &ThreadPolicy,
) -> usize {
    let economy = &target.economy;
    let effects = &target.effects;

    if !target.is_hackable() {
        return 0;
    }

    match op {
        Operation::Weaken => {
            let excess = economy.current_security - economy.min_security;
            if excess <= WEAKEN_TOLERANCE || effects.weaken_security <= 0. {
                return 0;
            }

            ceil_threads(excess / effects.weaken_security)
        },

        Operation::Grow => {
            let threshold = economy.max_money * policy.growth_target_fraction;
            if threshold <= economy.current_money {
                return 0;
            }

            ceil_threads(target.growth_threads)
        },

        Operation::CorrectionWeaken => {
            let grow = required_threads(target, Operation::Grow, policy);
            correction_threads(target, grow)
        },

        // (max * fraction) / (per_thread * max), with max cancelled out
        Operation::Hack => {
            ceil_threads(policy.hack_target_fraction / effects.hack)
        },
    }
}

/// Thread counts for a whole batch, with the correction policy and the cap
/// applied. The correction leg covers the grow threads actually sent.
pub fn requirements(
    target: &Target,
    policy: &ThreadPolicy,
) -> ThreadCounts {
    use Operation::*;

    let mut counts = ThreadCounts::default();
    counts[Weaken] = capped(required_threads(target, Weaken, policy), policy);
    counts[Grow] = capped(required_threads(target, Grow, policy), policy);
    if policy.correction_weaken && target.is_hackable() {
        counts[CorrectionWeaken] =
            capped(correction_threads(target, counts[Grow]), policy);
    }
    counts[Hack] = capped(required_threads(target, Hack, policy), policy);

    counts
}

/// Security at minimum (within tolerance) and money above the growth
/// threshold: a hack-first batch can start from here.
pub fn is_prepared(
    target: &Target,
    policy: &ThreadPolicy,
) -> bool {
    required_threads(target, Operation::Weaken, policy) == 0
        && required_threads(target, Operation::Grow, policy) == 0
}

/// Hack threads of one batch, capped.
pub fn hack_threads(
    target: &Target,
    policy: &ThreadPolicy,
) -> usize {
    capped(required_threads(target, Operation::Hack, policy), policy)
}

/// Money multiplier that restores what `hack` hack threads take.
pub fn regrowth_multiplier(
    target: &Target,
    hack: usize,
) -> f64 {
    let stolen = (hack as f64 * target.effects.hack).min(MAX_STOLEN_FRACTION);
    1. / (1. - stolen.max(0.))
}

/// Thread counts for a hack-first batch. Every repair leg is sized from the
/// hack leg rather than from the target's current state: weaken cancels the
/// hack's security, grow restores the stolen money (`regrowth_threads` is the
/// game's estimate for [`regrowth_multiplier`]) and the correction weaken
/// cancels the grow's security.
pub fn hwgw_requirements(
    target: &Target,
    policy: &ThreadPolicy,
    regrowth_threads: f64,
) -> ThreadCounts {
    use Operation::*;

    let effects = &target.effects;
    let mut counts = ThreadCounts::default();
    if !target.is_hackable() || effects.weaken_security <= 0. {
        return counts;
    }

    counts[Hack] = hack_threads(target, policy);
    counts[Weaken] = capped(
        ceil_threads(
            counts[Hack] as f64 * (effects.hack_security / effects.weaken_security),
        ),
        policy,
    );
    counts[Grow] = capped(ceil_threads(regrowth_threads), policy);
    if policy.correction_weaken {
        counts[CorrectionWeaken] =
            capped(correction_threads(target, counts[Grow]), policy);
    }

    counts
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoredTarget {
    pub target: Target,
    pub score: f64,
}

/// Ranks targets by score, best first. Targets named in `exclude`, and any
/// whose score isn't a finite number, are dropped.
pub fn rank<V>(
    targets: impl IntoIterator<Item = Target>,
    exclude: &BTreeMap<CompactString, V>,
) -> Vec<ScoredTarget> {
    let mut scored = targets
        .into_iter()
        .filter(|t| !exclude.contains_key(t.get_hostname()))
        .map(|target| {
            let score = score(&target);
            ScoredTarget {
                target,
                score,
            }
        })
        .filter(|s| s.score.is_finite())
        .collect::<Vec<_>>();

    scored.sort_by(|s1, s2| {
        N64::from_inner(s2.score)
            .cmp(&N64::from_inner(s1.score))
            .then_with(|| s1.target.hostname.cmp(&s2.target.hostname))
    });

    scored
}
