//! The game API surface the scheduler depends on.
//!
//! Everything in here is owned by the game: the network graph, the economy
//! formulas, RAM accounting and the process table. The in-game implementation
//! lives in [`crate::netscript::NsWrapper`]; tests use an in-memory mock.

use compact_str::CompactString;

use crate::script_deploy::HGW;

/// Money and security of a server at the moment it was queried.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EconomicState {
    pub max_money: f64,
    pub current_money: f64,
    pub current_security: f64,
    pub min_security: f64,
    pub required_hacking_level: usize,
}

/// RAM of a server in GB.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Capacity {
    pub total: f64,
    pub used: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessInfo {
    pub filename: CompactString,
    pub args: Vec<String>,
    pub threads: usize,
}

#[allow(async_fn_in_trait)]
pub trait Host {
    /// Hostname of the node this script runs on.
    fn hostname(&self) -> CompactString;

    fn neighbors(
        &self,
        node: &str,
    ) -> Vec<CompactString>;

    fn economic_state(
        &self,
        target: &str,
    ) -> EconomicState;

    /// Milliseconds a single `op` against `target` takes right now.
    fn operation_duration(
        &self,
        target: &str,
        op: HGW,
    ) -> f64;

    /// Effect of one thread of `op`: fraction of money stolen for hack,
    /// security added for grow, security removed for weaken.
    fn unit_effect(
        &self,
        target: &str,
        op: HGW,
    ) -> f64;

    /// Security one hack thread adds to `target`.
    fn hack_security(
        &self,
        target: &str,
    ) -> f64;

    /// Grow threads needed to multiply the target's money by `multiplier`.
    fn growth_threads(
        &self,
        target: &str,
        multiplier: f64,
    ) -> f64;

    fn worker_capacity(
        &self,
        worker: &str,
    ) -> Capacity;

    fn list_processes(
        &self,
        worker: &str,
    ) -> Vec<ProcessInfo>;

    /// RAM per thread of a script stored on this node, in GB.
    fn script_ram(
        &self,
        script: &str,
    ) -> f64;

    /// Returns the pid, or `None` when the game refused to start it.
    fn start_process(
        &self,
        worker: &str,
        script: &str,
        threads: usize,
        args: &[String],
    ) -> Option<usize>;

    /// Copies `script` from this node to `worker` unless it is already there.
    fn ensure_program_present(
        &self,
        worker: &str,
        script: &str,
    ) -> bool;

    /// Writes `contents` into `script` on this node.
    fn write_local(
        &self,
        script: &str,
        contents: &str,
    ) -> bool;

    fn is_purchased(
        &self,
        node: &str,
    ) -> bool;

    fn has_root(
        &self,
        node: &str,
    ) -> bool;

    /// Opens whatever ports we can and nukes the node.
    fn gain_root(
        &self,
        node: &str,
    ) -> bool;

    fn hacking_level(&self) -> usize;

    /// Wall clock in milliseconds.
    fn now(&self) -> f64;

    /// Script log.
    fn print(
        &self,
        text: &str,
    );

    /// Terminal.
    fn tprint(
        &self,
        text: &str,
    );

    async fn sleep(
        &self,
        millis: f64,
    );
}
