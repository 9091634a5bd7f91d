use crate::host::Host;

/// A worker script shipped inside the wasm module.
pub struct DynamicFile<'a> {
    pub filename: &'a str,
    pub contents: &'a str,
}

impl<'a> DynamicFile<'a> {
    /// Writes the script onto the node running the scheduler, which is where
    /// every later copy is made from.
    pub fn install_locally(
        &self,
        host: &impl Host,
    ) -> bool {
        host.write_local(self.filename, self.contents)
    }

    pub fn deploy_to_machine(
        &self,
        host: &impl Host,
        worker: &str,
    ) -> bool {
        host.ensure_program_present(worker, self.filename)
    }
}

pub const WEAKEN_SCRIPT: DynamicFile<'static> = DynamicFile {
    filename: "child_weaken.js",
    contents: include_str!("child_weaken.js"),
};

pub const HACK_SCRIPT: DynamicFile<'static> = DynamicFile {
    filename: "child_hack.js",
    contents: include_str!("child_hack.js"),
};

pub const GROW_SCRIPT: DynamicFile<'static> = DynamicFile {
    filename: "child_grow.js",
    contents: include_str!("child_grow.js"),
};

/// Every script whose processes count as an attack on their first argument.
pub const ATTACK_SCRIPTS: [&str; 3] = [
    WEAKEN_SCRIPT.filename,
    GROW_SCRIPT.filename,
    HACK_SCRIPT.filename,
];

/// The three primitives the game exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HGW {
    Hack,
    Grow,
    Weaken,
}

impl HGW {
    pub const ALL: [HGW; 3] = [HGW::Hack, HGW::Grow, HGW::Weaken];

    pub fn script(&self) -> &'static DynamicFile<'static> {
        use HGW::*;

        match self {
            Hack => &HACK_SCRIPT,
            Weaken => &WEAKEN_SCRIPT,
            Grow => &GROW_SCRIPT,
        }
    }
}
