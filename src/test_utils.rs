//! In-memory game used by the unit tests.

use std::{
    cell::{
        Cell,
        RefCell,
    },
    collections::{
        BTreeMap,
        BTreeSet,
    },
};

use compact_str::CompactString;

use crate::{
    host::{
        Capacity,
        EconomicState,
        Host,
        ProcessInfo,
    },
    script_deploy::HGW,
};

pub const GROW_TIME_MUL: f64 = 3.2;
pub const WEAKEN_TIME_MUL: f64 = 4.;

#[derive(Clone, Debug)]
pub struct MockServer {
    pub economy: EconomicState,
    pub purchased: bool,
    pub root: bool,
    pub can_root: bool,
    pub max_ram: f64,
    pub used_ram: f64,
    pub hack_time: f64,
    pub hack_fraction: f64,
    pub hack_security: f64,
    pub grow_security: f64,
    pub weaken_security: f64,
    /// grow threads per unit of money multiplier above one
    pub growth_rate: f64,
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer {
            economy: EconomicState {
                min_security: 1.,
                current_security: 1.,
                ..Default::default()
            },
            purchased: false,
            root: true,
            can_root: true,
            max_ram: 0.,
            used_ram: 0.,
            hack_time: 1_000.,
            hack_fraction: 0.,
            hack_security: 0.002,
            grow_security: 0.004,
            weaken_security: 0.05,
            growth_rate: 10.,
        }
    }
}

impl MockServer {
    /// A money server at minimum security and full money.
    pub fn target(
        max_money: f64,
        min_security: f64,
        hack_time: f64,
    ) -> MockServer {
        MockServer {
            economy: EconomicState {
                max_money,
                current_money: max_money,
                current_security: min_security,
                min_security,
                required_hacking_level: 1,
            },
            hack_time,
            hack_fraction: 0.01,
            ..Default::default()
        }
    }
}

pub struct MockHost {
    local: CompactString,
    links: BTreeMap<CompactString, Vec<CompactString>>,
    servers: RefCell<BTreeMap<CompactString, MockServer>>,
    processes: RefCell<BTreeMap<CompactString, Vec<ProcessInfo>>>,
    files: RefCell<BTreeSet<(CompactString, CompactString)>>,
    script_rams: BTreeMap<&'static str, f64>,
    refused: BTreeSet<CompactString>,
    level: usize,
    next_pid: Cell<usize>,
    clock: Cell<f64>,
    sleeps: RefCell<Vec<f64>>,
    terminal: RefCell<Vec<String>>,
    script_log: RefCell<Vec<String>>,
    starts: RefCell<Vec<(CompactString, CompactString, usize, Vec<String>)>>,
}

impl MockHost {
    pub fn new(local: &str) -> MockHost {
        let mut servers = BTreeMap::new();
        servers.insert(CompactString::from(local), MockServer::default());

        let mut script_rams = BTreeMap::new();
        script_rams.insert("child_weaken.js", 1.75);
        script_rams.insert("child_grow.js", 1.75);
        script_rams.insert("child_hack.js", 1.7);

        MockHost {
            local: CompactString::from(local),
            links: BTreeMap::new(),
            servers: RefCell::new(servers),
            processes: RefCell::new(BTreeMap::new()),
            files: RefCell::new(BTreeSet::new()),
            script_rams,
            refused: BTreeSet::new(),
            level: 100,
            next_pid: Cell::new(1),
            clock: Cell::new(0.),
            sleeps: RefCell::new(vec![]),
            terminal: RefCell::new(vec![]),
            script_log: RefCell::new(vec![]),
            starts: RefCell::new(vec![]),
        }
    }

    pub fn link(
        mut self,
        a: &str,
        b: &str,
    ) -> MockHost {
        self.links
            .entry(CompactString::from(a))
            .or_default()
            .push(CompactString::from(b));
        self.links
            .entry(CompactString::from(b))
            .or_default()
            .push(CompactString::from(a));
        self
    }

    pub fn with_server(
        self,
        name: &str,
        server: MockServer,
    ) -> MockHost {
        self.servers
            .borrow_mut()
            .insert(CompactString::from(name), server);
        let local = self.local.clone();
        self.link(&local, name)
    }

    pub fn with_worker(
        self,
        name: &str,
        ram: f64,
        purchased: bool,
    ) -> MockHost {
        let server = MockServer {
            max_ram: ram,
            purchased,
            ..Default::default()
        };
        self.with_server(name, server)
    }

    pub fn with_local_ram(
        self,
        ram: f64,
    ) -> MockHost {
        self.update(&self.local.clone(), |s| s.max_ram = ram);
        self
    }

    pub fn with_hacking_level(
        mut self,
        level: usize,
    ) -> MockHost {
        self.level = level;
        self
    }

    pub fn with_script_ram(
        mut self,
        script: &'static str,
        ram: f64,
    ) -> MockHost {
        self.script_rams.insert(script, ram);
        self
    }

    pub fn with_process(
        self,
        worker: &str,
        filename: &str,
        args: &[&str],
        threads: usize,
    ) -> MockHost {
        self.processes
            .borrow_mut()
            .entry(CompactString::from(worker))
            .or_default()
            .push(ProcessInfo {
                filename: CompactString::from(filename),
                args: args.iter().map(|a| a.to_string()).collect(),
                threads,
            });
        self
    }

    pub fn refusing_starts_on(
        mut self,
        worker: &str,
    ) -> MockHost {
        self.refused.insert(CompactString::from(worker));
        self
    }

    pub fn update(
        &self,
        name: &str,
        change: impl FnOnce(&mut MockServer),
    ) {
        if let Some(server) = self.servers.borrow_mut().get_mut(name) {
            change(server);
        }
    }

    pub fn server(
        &self,
        name: &str,
    ) -> MockServer {
        self.servers.borrow()[name].clone()
    }

    pub fn has_file(
        &self,
        node: &str,
        file: &str,
    ) -> bool {
        self.files
            .borrow()
            .contains(&(CompactString::from(node), CompactString::from(file)))
    }

    pub fn terminal(&self) -> Vec<String> {
        self.terminal.borrow().clone()
    }

    pub fn script_log(&self) -> Vec<String> {
        self.script_log.borrow().clone()
    }

    pub fn sleeps(&self) -> Vec<f64> {
        self.sleeps.borrow().clone()
    }

    /// `(worker, script, threads, args)` of every process started so far.
    pub fn starts(&self) -> Vec<(CompactString, CompactString, usize, Vec<String>)> {
        self.starts.borrow().clone()
    }

    pub fn set_clock(
        &self,
        millis: f64,
    ) {
        self.clock.set(millis);
    }
}

impl Host for MockHost {
    fn hostname(&self) -> CompactString {
        self.local.clone()
    }

    fn neighbors(
        &self,
        node: &str,
    ) -> Vec<CompactString> {
        self.links.get(node).cloned().unwrap_or_default()
    }

    fn economic_state(
        &self,
        target: &str,
    ) -> EconomicState {
        self.server(target).economy
    }

    fn operation_duration(
        &self,
        target: &str,
        op: HGW,
    ) -> f64 {
        let hack_time = self.server(target).hack_time;

        match op {
            HGW::Hack => hack_time,
            HGW::Grow => hack_time * GROW_TIME_MUL,
            HGW::Weaken => hack_time * WEAKEN_TIME_MUL,
        }
    }

    fn unit_effect(
        &self,
        target: &str,
        op: HGW,
    ) -> f64 {
        let server = self.server(target);

        match op {
            HGW::Hack => server.hack_fraction,
            HGW::Grow => server.grow_security,
            HGW::Weaken => server.weaken_security,
        }
    }

    fn hack_security(
        &self,
        target: &str,
    ) -> f64 {
        self.server(target).hack_security
    }

    fn growth_threads(
        &self,
        target: &str,
        multiplier: f64,
    ) -> f64 {
        (multiplier - 1.).max(0.) * self.server(target).growth_rate
    }

    fn worker_capacity(
        &self,
        worker: &str,
    ) -> Capacity {
        let server = self.server(worker);

        Capacity {
            total: server.max_ram,
            used: server.used_ram,
        }
    }

    fn list_processes(
        &self,
        worker: &str,
    ) -> Vec<ProcessInfo> {
        self.processes
            .borrow()
            .get(worker)
            .cloned()
            .unwrap_or_default()
    }

    fn script_ram(
        &self,
        script: &str,
    ) -> f64 {
        if !self.has_file(&self.local, script) {
            return 0.;
        }

        self.script_rams.get(script).copied().unwrap_or(0.)
    }

    fn start_process(
        &self,
        worker: &str,
        script: &str,
        threads: usize,
        args: &[String],
    ) -> Option<usize> {
        if self.refused.contains(worker) || !self.has_file(worker, script) {
            return None;
        }

        let ram = threads as f64 * self.script_rams.get(script).copied()?;
        let server = self.server(worker);
        if server.max_ram - server.used_ram + 1e-9 < ram {
            return None;
        }

        self.update(worker, |s| s.used_ram += ram);
        self.processes
            .borrow_mut()
            .entry(CompactString::from(worker))
            .or_default()
            .push(ProcessInfo {
                filename: CompactString::from(script),
                args: args.to_vec(),
                threads,
            });
        self.starts.borrow_mut().push((
            CompactString::from(worker),
            CompactString::from(script),
            threads,
            args.to_vec(),
        ));

        let pid = self.next_pid.get();
        self.next_pid.set(pid + 1);
        Some(pid)
    }

    fn ensure_program_present(
        &self,
        worker: &str,
        script: &str,
    ) -> bool {
        if self.has_file(worker, script) {
            return true;
        }

        if !self.has_file(&self.local, script) {
            return false;
        }

        self.files
            .borrow_mut()
            .insert((CompactString::from(worker), CompactString::from(script)));
        true
    }

    fn write_local(
        &self,
        script: &str,
        _contents: &str,
    ) -> bool {
        self.files
            .borrow_mut()
            .insert((self.local.clone(), CompactString::from(script)));
        true
    }

    fn is_purchased(
        &self,
        node: &str,
    ) -> bool {
        self.server(node).purchased
    }

    fn has_root(
        &self,
        node: &str,
    ) -> bool {
        self.server(node).root
    }

    fn gain_root(
        &self,
        node: &str,
    ) -> bool {
        let can_root = self.server(node).can_root;
        if can_root {
            self.update(node, |s| s.root = true);
        }

        can_root
    }

    fn hacking_level(&self) -> usize {
        self.level
    }

    fn now(&self) -> f64 {
        self.clock.get()
    }

    fn print(
        &self,
        text: &str,
    ) {
        self.script_log.borrow_mut().push(text.to_owned());
    }

    fn tprint(
        &self,
        text: &str,
    ) {
        self.terminal.borrow_mut().push(text.to_owned());
    }

    async fn sleep(
        &self,
        millis: f64,
    ) {
        self.sleeps.borrow_mut().push(millis);
        self.clock.set(self.clock.get() + millis.max(0.));
    }
}
