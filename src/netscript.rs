use std::sync::{
    Mutex,
    PoisonError,
};

use compact_str::CompactString;
use js_sys::{
    Array,
    JsString,
};
use wasm_bindgen::{
    prelude::*,
    JsCast,
    JsValue,
};

use crate::{
    host::{
        Capacity,
        EconomicState,
        Host,
        ProcessInfo,
    },
    script_deploy::HGW,
    utils::get_attribute,
};

// thank you github.com/paulcdejean
#[wasm_bindgen]
extern "C" {
    pub type NS;

    #[wasm_bindgen(method)]
    fn tprint(
        this: &NS,
        print: &str,
    );

    #[wasm_bindgen(method)]
    fn print(
        this: &NS,
        print: &str,
    );

    #[wasm_bindgen(method)]
    async fn sleep(
        this: &NS,
        millis: i32,
    );

    #[wasm_bindgen(method)]
    fn getHostname(this: &NS) -> JsValue;

    #[wasm_bindgen(method)]
    fn scan(
        this: &NS,
        scan: Option<&str>,
    ) -> Vec<JsValue>;

    #[wasm_bindgen(method)]
    fn ps(
        this: &NS,
        host: Option<&str>,
    ) -> Vec<JsValue>;

    #[wasm_bindgen(catch, method, variadic)]
    fn exec(
        this: &NS,
        script_name: &str,
        host: &str,
        num_threads: Option<i32>,
        args: Box<[JsString]>,
    ) -> Result<i32, JsValue>;

    #[wasm_bindgen(catch, method)]
    fn nuke(
        this: &NS,
        host: &str,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, method)]
    fn brutessh(
        this: &NS,
        hostname: &str,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, method)]
    fn ftpcrack(
        this: &NS,
        hostname: &str,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, method)]
    fn relaysmtp(
        this: &NS,
        hostname: &str,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, method)]
    fn httpworm(
        this: &NS,
        hostname: &str,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, method)]
    fn sqlinject(
        this: &NS,
        hostname: &str,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(method)]
    fn hasRootAccess(
        this: &NS,
        host: &str,
    ) -> bool;

    #[wasm_bindgen(method)]
    fn getServer(
        this: &NS,
        host: Option<&str>,
    ) -> Server;

    #[wasm_bindgen(method)]
    fn getHackingLevel(this: &NS) -> i32;

    #[wasm_bindgen(method)]
    fn getHackTime(
        this: &NS,
        host: &str,
    ) -> f64;

    #[wasm_bindgen(method)]
    fn getGrowTime(
        this: &NS,
        host: &str,
    ) -> f64;

    #[wasm_bindgen(method)]
    fn getWeakenTime(
        this: &NS,
        host: &str,
    ) -> f64;

    #[wasm_bindgen(method)]
    fn getServerMaxRam(
        this: &NS,
        host: &str,
    ) -> f64;

    #[wasm_bindgen(method)]
    fn getServerUsedRam(
        this: &NS,
        host: &str,
    ) -> f64;

    #[wasm_bindgen(method)]
    fn getScriptRam(
        this: &NS,
        script: &str,
        host: Option<&str>,
    ) -> f64;

    #[wasm_bindgen(method)]
    fn hackAnalyze(
        this: &NS,
        host: &str,
    ) -> f64;

    #[wasm_bindgen(method)]
    fn hackAnalyzeSecurity(
        this: &NS,
        threads: i32,
        host: Option<&str>,
    ) -> f64;

    #[wasm_bindgen(method)]
    fn growthAnalyzeSecurity(
        this: &NS,
        threads: i32,
        host: Option<&str>,
        cores: Option<i32>,
    ) -> f64;

    #[wasm_bindgen(method)]
    fn weakenAnalyze(
        this: &NS,
        threads: i32,
        cores: Option<i32>,
    ) -> f64;

    #[wasm_bindgen(catch, method)]
    fn growthAnalyze(
        this: &NS,
        host: &str,
        growth_factor: f64,
        cores: Option<i32>,
    ) -> Result<f64, JsValue>;

    #[wasm_bindgen(method)]
    fn write(
        this: &NS,
        filename: &str,
        data: &str,
        mode: char,
    );

    #[wasm_bindgen(method)]
    fn scp(
        this: &NS,
        file: &str,
        destination: &str,
        source: &str,
    ) -> bool;

    #[wasm_bindgen(method)]
    fn fileExists(
        this: &NS,
        file: &str,
        host: &str,
    ) -> bool;

    pub type Server;

    pub type Date;

    #[wasm_bindgen(static_method_of = Date)]
    pub fn now() -> f64;
}

/// Numbers the game hands back as JS numbers; missing fields read as zero.
fn number_attribute(
    object: &JsValue,
    field_name: &str,
) -> f64 {
    get_attribute(object, field_name, JsValue::as_f64)
        .ok()
        .flatten()
        .unwrap_or(0.)
}

fn bool_attribute(
    object: &JsValue,
    field_name: &str,
) -> bool {
    get_attribute(object, field_name, JsValue::as_bool)
        .ok()
        .flatten()
        .unwrap_or(false)
}

/// Script arguments can be strings, numbers or booleans.
pub(crate) fn arg_to_string(arg: JsValue) -> String {
    if let Some(s) = arg.as_string() {
        s
    }
    else if let Some(n) = arg.as_f64() {
        n.to_string()
    }
    else if let Some(b) = arg.as_bool() {
        b.to_string()
    }
    else {
        String::new()
    }
}

fn to_process_info(process: &JsValue) -> Option<ProcessInfo> {
    let filename = get_attribute(process, "filename", JsValue::as_string)
        .ok()
        .flatten()?;
    let threads = number_attribute(process, "threads").max(0.) as usize;
    let args = get_attribute(process, "args", |a| {
        a.dyn_ref::<Array>()
            .map(|a| a.iter().map(arg_to_string).collect::<Vec<_>>())
    })
    .ok()
    .flatten()
    .unwrap_or_default();

    Some(ProcessInfo {
        filename: CompactString::from(filename),
        args,
        threads,
    })
}

pub struct NsWrapper<'a>(Mutex<&'a NS>);

impl<'a> NsWrapper<'a> {
    pub fn new(ns: &'a NS) -> NsWrapper<'a> {
        NsWrapper(Mutex::new(ns))
    }

    fn ns(&self) -> &'a NS {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get_server(
        &self,
        host: &str,
    ) -> Server {
        self.ns().getServer(Some(host))
    }

    /// Runs every port opener (the ones we don't own just fail), then nukes.
    fn open_ports_and_nuke(
        &self,
        hostname: &str,
    ) -> bool {
        let ns = self.ns();

        let _ = ns.brutessh(hostname);
        let _ = ns.ftpcrack(hostname);
        let _ = ns.relaysmtp(hostname);
        let _ = ns.httpworm(hostname);
        let _ = ns.sqlinject(hostname);

        ns.nuke(hostname).is_ok()
    }
}

impl<'a> Host for NsWrapper<'a> {
    fn hostname(&self) -> CompactString {
        self.ns()
            .getHostname()
            .as_string()
            .map(CompactString::from)
            .unwrap_or_default()
    }

    fn neighbors(
        &self,
        node: &str,
    ) -> Vec<CompactString> {
        self.ns()
            .scan(Some(node))
            .into_iter()
            .filter_map(|m| m.as_string())
            .map(CompactString::from)
            .collect::<Vec<_>>()
    }

    fn economic_state(
        &self,
        target: &str,
    ) -> EconomicState {
        let server = self.get_server(target);

        EconomicState {
            max_money: number_attribute(&server, "moneyMax"),
            current_money: number_attribute(&server, "moneyAvailable"),
            current_security: number_attribute(&server, "hackDifficulty"),
            min_security: number_attribute(&server, "minDifficulty"),
            required_hacking_level: number_attribute(
                &server,
                "requiredHackingSkill",
            )
            .max(0.) as usize,
        }
    }

    fn operation_duration(
        &self,
        target: &str,
        op: HGW,
    ) -> f64 {
        let ns = self.ns();

        match op {
            HGW::Hack => ns.getHackTime(target),
            HGW::Grow => ns.getGrowTime(target),
            HGW::Weaken => ns.getWeakenTime(target),
        }
    }

    fn unit_effect(
        &self,
        target: &str,
        op: HGW,
    ) -> f64 {
        let ns = self.ns();

        match op {
            HGW::Hack => ns.hackAnalyze(target),
            HGW::Grow => ns.growthAnalyzeSecurity(1, Some(target), None),
            HGW::Weaken => ns.weakenAnalyze(1, None),
        }
    }

    fn hack_security(
        &self,
        target: &str,
    ) -> f64 {
        self.ns().hackAnalyzeSecurity(1, Some(target))
    }

    fn growth_threads(
        &self,
        target: &str,
        multiplier: f64,
    ) -> f64 {
        // the game throws on multipliers below one
        if multiplier <= 1. {
            return 0.;
        }

        self.ns()
            .growthAnalyze(target, multiplier, None)
            .unwrap_or(0.)
    }

    fn worker_capacity(
        &self,
        worker: &str,
    ) -> Capacity {
        let ns = self.ns();

        Capacity {
            total: ns.getServerMaxRam(worker),
            used: ns.getServerUsedRam(worker),
        }
    }

    fn list_processes(
        &self,
        worker: &str,
    ) -> Vec<ProcessInfo> {
        self.ns()
            .ps(Some(worker))
            .iter()
            .filter_map(to_process_info)
            .collect::<Vec<_>>()
    }

    fn script_ram(
        &self,
        script: &str,
    ) -> f64 {
        let home = self.hostname();
        self.ns().getScriptRam(script, Some(home.as_str()))
    }

    fn start_process(
        &self,
        worker: &str,
        script: &str,
        threads: usize,
        args: &[String],
    ) -> Option<usize> {
        let args = args
            .iter()
            .map(|a| JsString::from(a.as_str()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let threads = i32::try_from(threads).ok()?;

        match self.ns().exec(script, worker, Some(threads), args) {
            Ok(0) | Err(_) => None,
            Ok(pid) => usize::try_from(pid).ok(),
        }
    }

    fn ensure_program_present(
        &self,
        worker: &str,
        script: &str,
    ) -> bool {
        let ns = self.ns();
        if ns.fileExists(script, worker) {
            return true;
        }

        ns.scp(script, worker, &self.hostname())
    }

    fn write_local(
        &self,
        script: &str,
        contents: &str,
    ) -> bool {
        let ns = self.ns();
        ns.write(script, contents, 'w');
        ns.fileExists(script, &self.hostname())
    }

    fn is_purchased(
        &self,
        node: &str,
    ) -> bool {
        bool_attribute(&self.get_server(node), "purchasedByPlayer")
    }

    fn has_root(
        &self,
        node: &str,
    ) -> bool {
        self.ns().hasRootAccess(node)
    }

    fn gain_root(
        &self,
        node: &str,
    ) -> bool {
        self.open_ports_and_nuke(node)
    }

    fn hacking_level(&self) -> usize {
        self.ns().getHackingLevel().max(0) as usize
    }

    fn now(&self) -> f64 {
        Date::now()
    }

    fn print(
        &self,
        text: &str,
    ) {
        self.ns().print(text);
    }

    fn tprint(
        &self,
        text: &str,
    ) {
        self.ns().tprint(text);
    }

    async fn sleep(
        &self,
        millis: f64,
    ) {
        self.ns().sleep(millis.max(0.).round() as i32).await;
    }
}
