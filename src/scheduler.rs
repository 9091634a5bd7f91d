//! The attack loop: pick a target, size a batch, fit it into RAM, launch it.
//!
//! Each cycle walks `SelectTarget -> ComputeRequirements -> Allocate ->
//! Dispatch` and then either sleeps back into `SelectTarget` or stops. Every
//! cycle starts from a fresh network scan and process table; nothing observed
//! in one cycle is trusted in the next.

use core::fmt;

use clap::ValueEnum;
use compact_str::CompactString;
use itertools::Itertools;

use crate::{
    allocator::{
        allocate,
        DeploymentPlan,
        Requirement,
    },
    config::AttackConfig,
    error::{
        Error,
        Result,
    },
    event_pool::{
        Event,
        EventLoop,
        EventLoopContext,
        EventLoopState,
    },
    host::Host,
    operation::{
        Operation,
        ThreadCounts,
    },
    registry::AttackRegistry,
    script_deploy::{
        ATTACK_SCRIPTS,
        HGW,
    },
    scoring::{
        hack_threads,
        hwgw_requirements,
        is_prepared,
        rank,
        regrowth_multiplier,
        requirements,
        Durations,
        Target,
    },
    utils::gb_to_hundredths,
    worker_pool::{
        acquire_root,
        discover,
        sort_by_capacity,
        WorkerFilter,
        WorkerPool,
    },
};

/// The order a batch's operations land on the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BatchOrder {
    /// Fix security, refill money, fix security again, then steal.
    Wgwh,
    /// Steal from an already prepared target, then repair it.
    Hwgw,
}

impl BatchOrder {
    pub fn landing_order(&self) -> [Operation; 4] {
        use Operation::*;

        match self {
            BatchOrder::Wgwh => [Weaken, Grow, CorrectionWeaken, Hack],
            BatchOrder::Hwgw => [Hack, Weaken, Grow, CorrectionWeaken],
        }
    }
}

/// How long each operation's worker sleeps before starting, so that every
/// operation lands `margin` after the one before it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BatchTiming {
    delays: [f64; 4],
    landings: [f64; 4],
}

impl BatchTiming {
    pub fn compute(
        durations: &Durations,
        order: BatchOrder,
        correction_weaken: bool,
        margin: f64,
    ) -> BatchTiming {
        let included = order
            .landing_order()
            .into_iter()
            .filter(|op| correction_weaken || *op != Operation::CorrectionWeaken)
            .collect::<Vec<_>>();

        let longest = included
            .iter()
            .map(|op| durations.of(op.primitive()))
            .fold(0., f64::max);

        let mut timing = BatchTiming::default();
        for (slot, op) in included.into_iter().enumerate() {
            let duration = durations.of(op.primitive());
            let delay = longest - duration + slot as f64 * margin;

            timing.delays[op.priority()] = delay;
            timing.landings[op.priority()] = delay + duration;
        }

        timing
    }

    pub fn delay(
        &self,
        op: Operation,
    ) -> f64 {
        self.delays[op.priority()]
    }

    /// Milliseconds after dispatch that `op` finishes.
    pub fn landing(
        &self,
        op: Operation,
    ) -> f64 {
        self.landings[op.priority()]
    }
}

/// RAM per thread of each worker script, read once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScriptCosts {
    pub hack: u64,
    pub grow: u64,
    pub weaken: u64,
}

impl ScriptCosts {
    /// Writes the worker scripts onto this node and sizes them.
    pub fn install(host: &impl Host) -> Result<ScriptCosts> {
        let mut costs = [0; 3];

        for (cost, hgw) in costs.iter_mut().zip(HGW::ALL) {
            let script = hgw.script();
            if !script.install_locally(host) {
                return Err(Error::MissingScript {
                    script: script.filename,
                });
            }

            *cost = gb_to_hundredths(host.script_ram(script.filename));
            if *cost == 0 {
                return Err(Error::MissingScript {
                    script: script.filename,
                });
            }
        }

        let [hack, grow, weaken] = costs;
        Ok(ScriptCosts {
            hack,
            grow,
            weaken,
        })
    }

    pub fn of(
        &self,
        op: Operation,
    ) -> u64 {
        match op.primitive() {
            HGW::Hack => self.hack,
            HGW::Grow => self.grow,
            HGW::Weaken => self.weaken,
        }
    }
}

/// A sized, timed batch against one target, not yet placed.
#[derive(Clone, Debug, PartialEq)]
pub struct AttackBatch {
    pub target: Target,
    pub required: ThreadCounts,
    pub timing: BatchTiming,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    SelectTarget,
    ComputeRequirements(Target),
    Allocate(AttackBatch),
    Dispatch(AttackBatch, DeploymentPlan),
    WaitCooldown,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    /// Carry on right away.
    Next(Phase),
    /// Come back to this phase after sleeping this many milliseconds.
    Sleep(f64, Phase),
    Stop,
}

/// What one cycle asked for and what actually got launched.
#[derive(Clone, Debug, PartialEq)]
pub struct CycleSummary {
    pub target: CompactString,
    pub required: ThreadCounts,
    pub deployed: ThreadCounts,
    pub shortfall: ThreadCounts,
    pub failed_dispatches: usize,
}

impl CycleSummary {
    pub fn is_complete(&self) -> bool {
        self.shortfall.is_zero()
    }
}

impl fmt::Display for CycleSummary {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "{}: Required Threads: {} Deployed Threads: {}",
            self.target, self.required, self.deployed
        )?;

        if !self.is_complete() {
            write!(f, " Shortfall: {}", self.shortfall)?;
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct SchedulerEvent {
    trigger_time: f64,
    phase: Phase,
}

impl Event for SchedulerEvent {
    fn trigger_time(&self) -> f64 {
        self.trigger_time
    }
}

#[derive(Debug)]
pub struct AttackScheduler {
    config: AttackConfig,
    costs: ScriptCosts,
    cycles: usize,
    last_summary: Option<CycleSummary>,
}

impl AttackScheduler {
    pub fn new(
        host: &impl Host,
        config: AttackConfig,
    ) -> Result<AttackScheduler> {
        config.validate()?;

        if let Some(target) = &config.target {
            let known = discover(host).iter().any(|n| n.as_str() == target.as_str());
            if !known {
                return Err(Error::UnknownTarget {
                    target: target.clone(),
                });
            }
        }

        let costs = ScriptCosts::install(host)?;

        Ok(AttackScheduler {
            config,
            costs,
            cycles: 0,
            last_summary: None,
        })
    }

    /// Completed dispatches so far.
    pub fn get_cycles(&self) -> usize {
        self.cycles
    }

    pub fn get_last_summary(&self) -> Option<&CycleSummary> {
        self.last_summary.as_ref()
    }

    /// Runs until single-shot mode finishes. In loop mode this only returns
    /// when the game kills the script.
    pub async fn run<H: Host>(
        self,
        host: &H,
    ) -> AttackScheduler {
        let mut event_loop = EventLoop::new(self);
        event_loop.run(host).await;
        event_loop.into_state()
    }

    pub fn step<H: Host>(
        &mut self,
        host: &H,
        phase: Phase,
    ) -> Transition {
        match phase {
            Phase::SelectTarget => self.select_target(host),
            Phase::ComputeRequirements(target) => {
                self.compute_requirements(host, target)
            },
            Phase::Allocate(batch) => self.allocate(host, batch),
            Phase::Dispatch(batch, plan) => self.dispatch(host, batch, plan),
            Phase::WaitCooldown => {
                if self.config.loop_mode {
                    Transition::Sleep(
                        self.config.cooldown_ms as f64,
                        Phase::SelectTarget,
                    )
                }
                else {
                    Transition::Stop
                }
            },
        }
    }

    fn select_target<H: Host>(
        &mut self,
        host: &H,
    ) -> Transition {
        let verbose = self.config.verbose;
        let nodes = discover(host);
        let level = host.hacking_level();

        if self.config.gain_root {
            let rooted = acquire_root(host, &nodes, level);
            if 0 < rooted {
                crate::info!(host, verbose, "Gained root on {} servers", rooted);
            }
        }

        if let Some(name) = &self.config.target {
            let target = Target::observe(host, name);
            return Transition::Next(Phase::ComputeRequirements(target));
        }

        let registry = AttackRegistry::scan(host, &nodes, &ATTACK_SCRIPTS);
        let candidates = nodes
            .iter()
            .map(|n| Target::observe(host, n))
            .filter(|t| t.is_candidate(level));

        let ranked = rank(candidates, registry.as_map());
        crate::debug!(
            host,
            "{} targets under attack, {} candidates left",
            registry.len(),
            ranked.len()
        );

        match ranked.into_iter().next() {
            Some(best) => {
                crate::info!(
                    host,
                    verbose,
                    "========================================\nSelected \
                     target: {} [Max Money: ${:.0}] [Score: {:.4}] [Time to \
                     Attack: {:.1}s]",
                    best.target.get_hostname(),
                    best.target.get_economy().max_money,
                    best.score,
                    best.target.get_durations().full_cycle() / 1000.,
                );

                Transition::Next(Phase::ComputeRequirements(best.target))
            },

            None => {
                crate::warn!(
                    host,
                    verbose,
                    "No suitable targets found. Waiting {}s before retrying...",
                    self.config.cooldown_ms as f64 / 1000.
                );

                Transition::Next(Phase::WaitCooldown)
            },
        }
    }

    fn compute_requirements<H: Host>(
        &mut self,
        host: &H,
        target: Target,
    ) -> Transition {
        let policy = self.config.thread_policy();

        // a hack-first batch only holds together against a prepared target
        let order = match self.config.order {
            BatchOrder::Hwgw if !is_prepared(&target, &policy) => {
                crate::info!(
                    host,
                    self.config.verbose,
                    "{} is not prepared yet. Sending a WGWH batch first",
                    target.get_hostname()
                );
                BatchOrder::Wgwh
            },
            order => order,
        };

        let required = match order {
            BatchOrder::Wgwh => requirements(&target, &policy),
            BatchOrder::Hwgw => {
                let multiplier =
                    regrowth_multiplier(&target, hack_threads(&target, &policy));
                let regrowth =
                    host.growth_threads(target.get_hostname(), multiplier);
                hwgw_requirements(&target, &policy, regrowth)
            },
        };
        let timing = BatchTiming::compute(
            target.get_durations(),
            order,
            self.config.correction_weaken,
            self.config.safety_margin_ms as f64,
        );

        crate::info!(
            host,
            self.config.verbose,
            "Required Threads: {}",
            required
        );
        crate::debug!(
            host,
            "Delays: {}",
            Operation::PRIORITY
                .iter()
                .map(|op| format!("[{}: {:.0}ms]", op, timing.delay(*op)))
                .join(" ")
        );

        Transition::Next(Phase::Allocate(AttackBatch {
            target,
            required,
            timing,
        }))
    }

    fn allocate<H: Host>(
        &mut self,
        host: &H,
        batch: AttackBatch,
    ) -> Transition {
        let pool = WorkerPool::observe(
            host,
            &discover(host),
            self.config.home_reserve_hundredths(),
        );
        let filter = WorkerFilter::from_config(&self.config, host.hacking_level());

        let mut workers = pool.filter(&filter);
        sort_by_capacity(&mut workers);

        let requirements = batch
            .required
            .iter()
            .filter(|(_, threads)| 0 < *threads)
            .map(|(operation, threads)| Requirement {
                operation,
                threads,
                cost_hundredths: self.costs.of(operation),
            })
            .collect::<Vec<_>>();

        let plan = allocate(&workers, &requirements);

        if 0 < plan.total_shortfall() {
            crate::warn!(
                host,
                self.config.verbose,
                "Not all required threads fit in RAM across {} workers. \
                 Short by {}",
                workers.len(),
                plan.shortfall_counts()
            );
        }

        Transition::Next(Phase::Dispatch(batch, plan))
    }

    fn dispatch<H: Host>(
        &mut self,
        host: &H,
        batch: AttackBatch,
        plan: DeploymentPlan,
    ) -> Transition {
        let verbose = self.config.verbose;
        let target = batch.target.get_hostname();

        let mut deployed = ThreadCounts::default();
        let mut failed_dispatches = 0;

        for placement in plan.placements() {
            let op = placement.operation;
            let script = op.primitive().script();

            if !script.deploy_to_machine(host, &placement.worker) {
                crate::warn!(
                    host,
                    verbose,
                    "Could not copy {} to {}",
                    script.filename,
                    placement.worker
                );
                failed_dispatches += 1;
                continue;
            }

            let report = match op {
                Operation::Hack => self.config.verbose_hacked,
                _ => verbose,
            };
            let args = [
                target.to_owned(),
                format!("{}", batch.timing.delay(op).round() as u64),
                report.to_string(),
            ];

            match host.start_process(
                &placement.worker,
                script.filename,
                placement.threads,
                &args,
            ) {
                Some(pid) => {
                    deployed[op] += placement.threads;
                    crate::debug!(
                        host,
                        "{} x{} on {} (pid {})",
                        op,
                        placement.threads,
                        placement.worker,
                        pid
                    );
                },

                None => {
                    failed_dispatches += 1;
                    crate::warn!(
                        host,
                        verbose,
                        "Failed to start {} x{} on {}",
                        op,
                        placement.threads,
                        placement.worker
                    );
                },
            }
        }

        let summary = CycleSummary {
            target: CompactString::from(target),
            required: batch.required,
            shortfall: batch.required.saturating_sub(&deployed),
            deployed,
            failed_dispatches,
        };
        crate::info!(host, verbose, "{}", summary);

        let complete = summary.is_complete();
        self.last_summary = Some(summary);
        self.cycles += 1;

        if !self.config.loop_mode {
            Transition::Stop
        }
        else if !complete {
            Transition::Next(Phase::WaitCooldown)
        }
        else {
            Transition::Sleep(self.config.interval_ms as f64, Phase::SelectTarget)
        }
    }

    /// Steps through phases until one asks to sleep or stop.
    fn drive<H: Host>(
        &mut self,
        host: &H,
        mut phase: Phase,
        ctx: &mut EventLoopContext<SchedulerEvent>,
    ) {
        loop {
            match self.step(host, phase) {
                Transition::Next(next) => phase = next,
                Transition::Sleep(millis, next) => {
                    ctx.add_event(SchedulerEvent {
                        trigger_time: host.now() + millis,
                        phase: next,
                    });
                    return;
                },
                Transition::Stop => return,
            }
        }
    }
}

impl EventLoopState for AttackScheduler {
    type Event = SchedulerEvent;

    fn initial_run<H: Host>(
        &mut self,
        host: &H,
        ctx: &mut EventLoopContext<SchedulerEvent>,
    ) {
        ctx.add_event(SchedulerEvent {
            trigger_time: host.now(),
            phase: Phase::SelectTarget,
        });
    }

    fn on_event<H: Host>(
        &mut self,
        host: &H,
        event: SchedulerEvent,
        ctx: &mut EventLoopContext<SchedulerEvent>,
    ) {
        self.drive(host, event.phase, ctx);
    }

    fn on_event_fail<H: Host>(
        &mut self,
        host: &H,
        event: SchedulerEvent,
        ctx: &mut EventLoopContext<SchedulerEvent>,
    ) {
        crate::debug!(
            host,
            "cycle is {:.0}ms late",
            host.now() - event.trigger_time
        );
        self.drive(host, event.phase, ctx);
    }
}

/// Sets up a scheduler for `config` and runs it to completion.
pub async fn attack<H: Host>(
    host: &H,
    config: AttackConfig,
) -> Result<()> {
    let scheduler = AttackScheduler::new(host, config)?;
    let scheduler = scheduler.run(host).await;

    crate::debug!(host, "attack finished after {} cycles", scheduler.cycles);
    Ok(())
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::test_utils::{
        MockHost,
        MockServer,
    };

    fn durations() -> Durations {
        Durations {
            hack: 1_000.,
            grow: 3_200.,
            weaken: 4_000.,
        }
    }

    /// 10M max money drained to 2M at security 10 over a minimum of 5.
    fn drained() -> MockServer {
        let mut server = MockServer::target(10_000_000., 5., 1_000.);
        server.economy.current_money = 2_000_000.;
        server.economy.current_security = 10.;
        server
    }

    fn config() -> AttackConfig {
        AttackConfig::default()
    }

    fn looping() -> AttackConfig {
        AttackConfig {
            loop_mode: true,
            ..Default::default()
        }
    }

    fn hwgw() -> AttackConfig {
        AttackConfig {
            order: BatchOrder::Hwgw,
            ..Default::default()
        }
    }

    fn start_list(host: &MockHost) -> Vec<(String, String, usize, Vec<String>)> {
        host.starts()
            .into_iter()
            .map(|(worker, script, threads, args)| {
                (worker.to_string(), script.to_string(), threads, args)
            })
            .collect()
    }

    /// Steps until the scheduler wants to wait or stop.
    fn cycle(
        scheduler: &mut AttackScheduler,
        host: &MockHost,
    ) -> Transition {
        let mut phase = Phase::SelectTarget;

        loop {
            match scheduler.step(host, phase) {
                Transition::Next(Phase::WaitCooldown) => {
                    return Transition::Next(Phase::WaitCooldown)
                },
                Transition::Next(next) => phase = next,
                other => return other,
            }
        }
    }

    #[test]
    fn wgwh_lands_in_order_with_hack_last() {
        let timing =
            BatchTiming::compute(&durations(), BatchOrder::Wgwh, true, 500.);

        assert_eq!(timing.delay(Operation::Weaken), 0.);
        assert_eq!(timing.delay(Operation::Grow), 1_300.);
        assert_eq!(timing.delay(Operation::CorrectionWeaken), 1_000.);
        assert_eq!(timing.delay(Operation::Hack), 4_500.);

        let landings = Operation::PRIORITY
            .iter()
            .map(|op| timing.landing(*op))
            .collect::<Vec<_>>();
        assert_eq!(landings, vec![4_000., 4_500., 5_000., 5_500.]);
    }

    #[test]
    fn hack_waits_for_the_longest_operation_plus_margin() {
        for correction in [true, false] {
            let timing = BatchTiming::compute(
                &durations(),
                BatchOrder::Wgwh,
                correction,
                200.,
            );

            assert!(3_000. + 200. <= timing.delay(Operation::Hack));
            for op in [Operation::Weaken, Operation::Grow] {
                assert!(timing.landing(op) < timing.landing(Operation::Hack));
            }
        }
    }

    #[test]
    fn without_correction_the_slots_close_up() {
        let timing =
            BatchTiming::compute(&durations(), BatchOrder::Wgwh, false, 500.);

        assert_eq!(timing.landing(Operation::Hack), 5_000.);
        assert_eq!(timing.delay(Operation::CorrectionWeaken), 0.);
    }

    #[test]
    fn hwgw_hack_lands_first() {
        let timing =
            BatchTiming::compute(&durations(), BatchOrder::Hwgw, true, 200.);

        assert_eq!(timing.delay(Operation::Hack), 3_000.);
        assert_eq!(timing.delay(Operation::Weaken), 200.);
        assert_eq!(timing.delay(Operation::Grow), 1_200.);
        assert_eq!(timing.delay(Operation::CorrectionWeaken), 600.);
        assert_eq!(timing.landing(Operation::Hack), 4_000.);
    }

    #[test]
    fn script_costs_are_read_after_install() {
        let host = MockHost::new("home");
        let costs = ScriptCosts::install(&host).unwrap();

        assert_eq!(costs.of(Operation::Hack), 170);
        assert_eq!(costs.of(Operation::CorrectionWeaken), 175);
        assert!(host.has_file("home", "child_grow.js"));
    }

    #[test]
    fn zero_ram_script_is_fatal_at_startup() {
        let host = MockHost::new("home").with_script_ram("child_grow.js", 0.);

        assert_eq!(
            AttackScheduler::new(&host, config()).unwrap_err(),
            Error::MissingScript {
                script: "child_grow.js",
            }
        );
    }

    #[test]
    fn unknown_explicit_target_is_fatal_at_startup() {
        let host = MockHost::new("home");
        let config = AttackConfig {
            target: Some("nowhere".to_owned()),
            ..Default::default()
        };

        assert!(matches!(
            AttackScheduler::new(&host, config),
            Err(Error::UnknownTarget { .. })
        ));
    }

    #[test]
    fn invalid_config_is_fatal_at_startup() {
        let host = MockHost::new("home");
        let config = AttackConfig {
            hack_target_fraction: 2.,
            ..Default::default()
        };

        assert!(matches!(
            AttackScheduler::new(&host, config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn single_shot_deploys_a_full_batch() {
        let host = MockHost::new("home")
            .with_local_ram(64.)
            .with_worker("pserv-0", 512., true)
            .with_server("joesguns", drained());

        let scheduler = AttackScheduler::new(&host, config()).unwrap();
        let scheduler = block_on(scheduler.run(&host));

        let summary = scheduler.get_last_summary().unwrap();
        assert_eq!(summary.target.as_str(), "joesguns");
        assert_eq!(
            summary.required,
            ThreadCounts {
                weaken: 100,
                grow: 40,
                correction_weaken: 4,
                hack: 25,
            }
        );
        assert_eq!(summary.deployed, summary.required);
        assert!(summary.is_complete());
        assert_eq!(scheduler.get_cycles(), 1);
        assert!(host.sleeps().is_empty());

        let starts = start_list(&host);
        let args = |delay: &str| {
            vec!["joesguns".to_owned(), delay.to_owned(), "false".to_owned()]
        };
        let expected: Vec<(String, String, usize, Vec<String>)> = vec![
            ("pserv-0".into(), "child_weaken.js".into(), 100, args("0")),
            ("pserv-0".into(), "child_grow.js".into(), 40, args("1300")),
            ("pserv-0".into(), "child_weaken.js".into(), 4, args("1000")),
            ("pserv-0".into(), "child_hack.js".into(), 25, args("4500")),
        ];
        assert_eq!(starts, expected);

        let registry =
            AttackRegistry::scan(&host, &discover(&host), &ATTACK_SCRIPTS);
        assert_eq!(registry.get("joesguns").unwrap().threads, 169);
    }

    #[test]
    fn hwgw_on_a_prepared_target_sends_every_leg() {
        let host = MockHost::new("home")
            .with_worker("pserv-0", 512., true)
            .with_server("joesguns", MockServer::target(10_000_000., 5., 1_000.));

        let scheduler = AttackScheduler::new(&host, hwgw()).unwrap();
        let scheduler = block_on(scheduler.run(&host));

        // 25 hacks take 25%; everything else repairs exactly that
        let summary = scheduler.get_last_summary().unwrap();
        assert_eq!(
            summary.required,
            ThreadCounts {
                weaken: 1,
                grow: 4,
                correction_weaken: 1,
                hack: 25,
            }
        );
        assert!(summary.is_complete());

        let args = |delay: &str| {
            vec!["joesguns".to_owned(), delay.to_owned(), "false".to_owned()]
        };
        // lands hack 4000, weaken 4500, grow 5000, correction 5500
        let expected: Vec<(String, String, usize, Vec<String>)> = vec![
            ("pserv-0".into(), "child_weaken.js".into(), 1, args("500")),
            ("pserv-0".into(), "child_grow.js".into(), 4, args("1800")),
            ("pserv-0".into(), "child_weaken.js".into(), 1, args("1500")),
            ("pserv-0".into(), "child_hack.js".into(), 25, args("3000")),
        ];
        assert_eq!(start_list(&host), expected);
    }

    #[test]
    fn hwgw_on_a_drained_target_prepares_first() {
        let host = MockHost::new("home")
            .with_local_ram(64.)
            .with_worker("pserv-0", 512., true)
            .with_server("joesguns", drained());

        let scheduler = AttackScheduler::new(&host, hwgw()).unwrap();
        let scheduler = block_on(scheduler.run(&host));

        let summary = scheduler.get_last_summary().unwrap();
        assert_eq!(
            summary.required,
            ThreadCounts {
                weaken: 100,
                grow: 40,
                correction_weaken: 4,
                hack: 25,
            }
        );

        // WGWH timing: the hack lands after every repair leg
        let delays = start_list(&host)
            .into_iter()
            .map(|(_, script, _, args)| (script, args[1].clone()))
            .collect::<Vec<_>>();
        let expected: Vec<(String, String)> = vec![
            ("child_weaken.js".into(), "0".into()),
            ("child_grow.js".into(), "1300".into()),
            ("child_weaken.js".into(), "1000".into()),
            ("child_hack.js".into(), "4500".into()),
        ];
        assert_eq!(delays, expected);
        assert!(host
            .script_log()
            .iter()
            .any(|line| line.contains("joesguns is not prepared yet")));
    }

    #[test]
    fn capped_grow_gets_a_matching_correction() {
        let host = MockHost::new("home")
            .with_worker("pserv-0", 512., true)
            .with_server("joesguns", drained());
        let config = AttackConfig {
            max_threads_cap: Some(30),
            ..Default::default()
        };

        let scheduler = AttackScheduler::new(&host, config).unwrap();
        let scheduler = block_on(scheduler.run(&host));

        // 30 * 0.004 / 0.05 = 2.4
        let summary = scheduler.get_last_summary().unwrap();
        assert_eq!(
            summary.required,
            ThreadCounts {
                weaken: 30,
                grow: 30,
                correction_weaken: 3,
                hack: 25,
            }
        );
    }

    #[test]
    fn best_scoring_free_target_is_picked() {
        let host = MockHost::new("home")
            .with_worker("pserv-0", 512., true)
            .with_server("joesguns", MockServer::target(10_000_000., 5., 1_000.))
            .with_server(
                "sigma-cosmetics",
                MockServer::target(20_000_000., 5., 1_000.),
            );

        let mut scheduler = AttackScheduler::new(&host, config()).unwrap();
        assert_eq!(cycle(&mut scheduler, &host), Transition::Stop);
        assert_eq!(
            scheduler.get_last_summary().unwrap().target.as_str(),
            "sigma-cosmetics"
        );

        // sigma-cosmetics is now in the process table
        assert_eq!(cycle(&mut scheduler, &host), Transition::Stop);
        assert_eq!(
            scheduler.get_last_summary().unwrap().target.as_str(),
            "joesguns"
        );
    }

    #[test]
    fn everything_in_flight_backs_off() {
        let host = MockHost::new("home")
            .with_worker("pserv-0", 512., true)
            .with_server("joesguns", drained())
            .with_process("pserv-0", "child_weaken.js", &["joesguns", "0"], 3);

        let mut scheduler = AttackScheduler::new(&host, looping()).unwrap();

        assert_eq!(
            scheduler.step(&host, Phase::SelectTarget),
            Transition::Next(Phase::WaitCooldown)
        );
        assert_eq!(
            scheduler.step(&host, Phase::WaitCooldown),
            Transition::Sleep(10_000., Phase::SelectTarget)
        );
        assert!(host
            .script_log()
            .iter()
            .any(|l| l.starts_with("WARNING: No suitable targets")));
    }

    #[test]
    fn single_shot_without_targets_just_exits() {
        let host = MockHost::new("home").with_worker("pserv-0", 512., true);

        let scheduler = AttackScheduler::new(&host, config()).unwrap();
        let scheduler = block_on(scheduler.run(&host));

        assert!(scheduler.get_last_summary().is_none());
        assert!(host.starts().is_empty());
        assert!(host.sleeps().is_empty());
    }

    #[test]
    fn shortfall_in_loop_mode_cools_down() {
        let host = MockHost::new("home")
            .with_worker("n00dles", 4., false)
            .with_server("joesguns", drained());

        let mut scheduler = AttackScheduler::new(&host, looping()).unwrap();

        assert_eq!(
            cycle(&mut scheduler, &host),
            Transition::Next(Phase::WaitCooldown)
        );

        let summary = scheduler.get_last_summary().unwrap();
        // 4GB fits two 1.75GB weaken threads
        assert_eq!(summary.deployed.weaken, 2);
        assert_eq!(summary.shortfall.weaken, 98);
        assert_eq!(summary.deployed.hack, 0);
    }

    #[test]
    fn complete_batch_in_loop_mode_sleeps_the_interval() {
        let host = MockHost::new("home")
            .with_worker("pserv-0", 512., true)
            .with_server("joesguns", drained());

        let mut scheduler = AttackScheduler::new(&host, looping()).unwrap();

        assert_eq!(
            cycle(&mut scheduler, &host),
            Transition::Sleep(1_000., Phase::SelectTarget)
        );
    }

    #[test]
    fn refused_starts_do_not_stop_the_batch() {
        let host = MockHost::new("home")
            .with_local_ram(64.)
            .with_worker("pserv-0", 200., true)
            .with_worker("pserv-1", 150., true)
            .with_server("joesguns", drained())
            .refusing_starts_on("pserv-0");

        let mut scheduler = AttackScheduler::new(&host, config()).unwrap();
        assert_eq!(cycle(&mut scheduler, &host), Transition::Stop);

        let summary = scheduler.get_last_summary().unwrap();
        assert_eq!(summary.failed_dispatches, 2);
        assert_eq!(
            summary.deployed,
            ThreadCounts {
                weaken: 0,
                grow: 26,
                correction_weaken: 4,
                hack: 25,
            }
        );
        assert_eq!(summary.shortfall.weaken, 100);
        assert_eq!(summary.shortfall.grow, 14);
    }

    #[test]
    fn purchased_only_keeps_off_hacked_servers() {
        let host = MockHost::new("home")
            .with_worker("pserv-0", 8., true)
            .with_worker("n00dles", 512., false)
            .with_server("joesguns", drained());

        let config = AttackConfig {
            purchased_only: true,
            ..Default::default()
        };
        let mut scheduler = AttackScheduler::new(&host, config).unwrap();
        cycle(&mut scheduler, &host);

        assert!(host
            .starts()
            .iter()
            .all(|(worker, ..)| worker.as_str() == "pserv-0"));
        assert!(!host.starts().is_empty());
    }

    #[test]
    fn explicit_target_ignores_registry() {
        let host = MockHost::new("home")
            .with_worker("pserv-0", 512., true)
            .with_server("joesguns", drained())
            .with_process("pserv-0", "child_weaken.js", &["joesguns", "0"], 3);

        let config = AttackConfig {
            target: Some("joesguns".to_owned()),
            ..Default::default()
        };
        let mut scheduler = AttackScheduler::new(&host, config).unwrap();

        assert_eq!(cycle(&mut scheduler, &host), Transition::Stop);
        assert_eq!(
            scheduler.get_last_summary().unwrap().target.as_str(),
            "joesguns"
        );
    }

    #[test]
    fn locked_servers_get_rooted_before_targeting() {
        let mut locked = drained();
        locked.root = false;

        let host = MockHost::new("home")
            .with_worker("pserv-0", 512., true)
            .with_server("joesguns", locked);

        let mut scheduler = AttackScheduler::new(&host, config()).unwrap();
        cycle(&mut scheduler, &host);

        assert!(host.server("joesguns").root);
        assert_eq!(
            scheduler.get_last_summary().unwrap().target.as_str(),
            "joesguns"
        );
    }

    #[test]
    fn attack_reports_startup_errors() {
        let host = MockHost::new("home").with_script_ram("child_hack.js", 0.);

        assert_eq!(
            block_on(attack(&host, config())),
            Err(Error::MissingScript {
                script: "child_hack.js",
            })
        );
    }

    #[test]
    fn attack_runs_one_cycle_in_single_shot() {
        let host = MockHost::new("home")
            .with_worker("pserv-0", 512., true)
            .with_server("joesguns", drained());

        assert_eq!(block_on(attack(&host, config())), Ok(()));
        assert_eq!(host.starts().len(), 4);
        assert!(host
            .script_log()
            .iter()
            .any(|l| l == "attack finished after 1 cycles"));
    }
}
