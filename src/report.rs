//! Read-only tables for the `targets` and `attacks` modes.

use std::collections::BTreeMap;

use clap::Args;
use itertools::Itertools;

use crate::{
    host::Host,
    operation::Operation,
    registry::AttackRegistry,
    script_deploy::ATTACK_SCRIPTS,
    scoring::{
        rank,
        requirements,
        Target,
        ThreadPolicy,
    },
    worker_pool::discover,
};

#[derive(Args, Debug, Clone)]
pub struct TargetsMode {
    /// How many of the best targets to list.
    #[arg(long, short, default_value_t = 10)]
    count: usize,
}

impl TargetsMode {
    pub fn execute(
        &self,
        host: &impl Host,
    ) {
        host.tprint(&targets_table(host, self.count, &ThreadPolicy::default()));
    }
}

/// The `count` best targets, whether or not something is already on them.
pub fn targets_table(
    host: &impl Host,
    count: usize,
    policy: &ThreadPolicy,
) -> String {
    let nodes = discover(host);
    let level = host.hacking_level();
    let registry = AttackRegistry::scan(host, &nodes, &ATTACK_SCRIPTS);

    let candidates = nodes
        .iter()
        .map(|n| Target::observe(host, n))
        .filter(|t| t.is_candidate(level));
    let ranked = rank(candidates, &BTreeMap::<_, ()>::new())
        .into_iter()
        .take(count)
        .collect::<Vec<_>>();

    if ranked.is_empty() {
        return "No suitable targets found".to_owned();
    }

    let name_len = ranked
        .iter()
        .map(|s| s.target.get_hostname().len())
        .max()
        .unwrap_or(0)
        .max("Target".len());

    let header = format!(
        " {: <lnl$}  {: >10}  {: >16}  {: >7}  {: >8}  {}",
        "Target",
        "Score",
        "Max Money",
        "Min Sec",
        "Cycle",
        "Threads W/G/W2/H",
        lnl = name_len,
    );

    let mut rows = ranked.iter().map(|scored| {
        let target = &scored.target;
        let economy = target.get_economy();
        let threads = requirements(target, policy);

        // '*' marks targets that are already under attack
        let in_flight = match registry.contains(target.get_hostname()) {
            true => '*',
            false => ' ',
        };

        format!(
            "{}{: <lnl$}  {: >10.4}  {: >15.0}$  {: >7.2}  {: >7.1}s  {}",
            in_flight,
            target.get_hostname(),
            scored.score,
            economy.max_money,
            economy.min_security,
            target.get_durations().full_cycle() / 1000.,
            Operation::PRIORITY.iter().map(|op| threads[*op]).join("/"),
            lnl = name_len,
        )
    });

    format!("\n{}\n{}", header, rows.join("\n"))
}

pub fn attacks_table(host: &impl Host) -> String {
    let nodes = discover(host);
    let registry = AttackRegistry::scan(host, &nodes, &ATTACK_SCRIPTS);

    if registry.is_empty() {
        return "No attacks currently running".to_owned();
    }

    let name_len = registry
        .iter()
        .map(|(target, _)| target.len())
        .max()
        .unwrap_or(0)
        .max("Target".len());

    let header = format!(
        "{: <lnl$}  {: >8}  {: >29}  {: >15}  {}",
        "Target",
        "Threads",
        "Money",
        "Security",
        "Servers",
        lnl = name_len,
    );

    let mut rows = registry.iter().map(|(target, attack)| {
        let economy = host.economic_state(target);

        format!(
            "{: <lnl$}  {: >8}  {: >13.0}$ / {: >12.0}$  {: >6.2} / {: >6.2}  {}",
            target.as_str(),
            attack.threads,
            economy.current_money,
            economy.max_money,
            economy.current_security,
            economy.min_security,
            attack.servers.iter().join(", "),
            lnl = name_len,
        )
    });

    format!(
        "\n{}\n{}\n{} targets, {} threads",
        header,
        rows.join("\n"),
        registry.len(),
        registry.total_threads()
    )
}
