pub mod allocator;
pub mod config;
pub mod error;
pub mod event_pool;
pub mod host;
pub mod log;
pub mod netscript;
pub mod operation;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod scoring;
pub mod script_deploy;
pub mod utils;
pub mod worker_pool;

#[cfg(test)]
mod test_utils;

use clap::{
    error::ErrorKind::DisplayHelp,
    Parser,
};
use js_sys::Array;
use wasm_bindgen::prelude::*;

use crate::{
    config::AttackMode,
    host::Host,
    netscript::{
        arg_to_string,
        NsWrapper,
        NS,
    },
    report::{
        attacks_table,
        TargetsMode,
    },
};

#[wasm_bindgen]
pub async fn execute_command(
    ns: NS,
    args: Array,
) {
    let ns = NsWrapper::new(&ns);

    // the game hands numeric arguments over as numbers
    let mut strargs = vec!["run bitdeploy.js".to_owned()];
    strargs.extend(args.iter().map(arg_to_string));

    match AppMode::try_parse_from(strargs) {
        Err(e) if e.kind() == DisplayHelp => {
            let error_msg =
                format!("\n{}", clap::Error::raw(e.kind().clone(), e),);

            ns.tprint(&*error_msg);
        },

        Ok(AppMode::Attack(attack_mode)) => {
            let result = match attack_mode.into_config() {
                Ok(config) => scheduler::attack(&ns, config).await,
                Err(e) => Err(e.into()),
            };

            if let Err(e) = result {
                ns.tprint(&format!("ERROR: {}", e));
            }
        },

        Ok(AppMode::Targets(targets_mode)) => targets_mode.execute(&ns),

        Ok(AppMode::Attacks) => ns.tprint(&attacks_table(&ns)),

        Err(e) => ns.tprint(&format!("unable to process message:\n{}", e)),
    }
}

#[derive(Parser)]
enum AppMode {
    /// Pick targets and launch hack/grow/weaken batches against them.
    Attack(AttackMode),
    /// List the best-scoring targets.
    Targets(TargetsMode),
    /// List what is currently being attacked, and from where.
    Attacks,
}
