use clap::Args;

use crate::{
    error::ConfigError,
    scheduler::BatchOrder,
    utils::gb_to_hundredths,
};

#[derive(Args, Debug, Clone)]
pub struct AttackMode {
    /// Attack this server instead of picking the best-scoring one.
    #[arg(long, short)]
    target: Option<String>,
    /// Only deploy onto home and purchased servers.
    #[arg(long, conflicts_with = "hacked_only")]
    purchased_only: bool,
    /// Only deploy onto rooted servers we don't own.
    #[arg(long)]
    hacked_only: bool,
    /// Mirror the log to the terminal.
    #[arg(long, short)]
    verbose: bool,
    /// Have hack workers report what they stole.
    #[arg(long)]
    verbose_hacked: bool,
    /// Keep picking targets until the script is killed.
    #[arg(long = "loop", short)]
    loop_mode: bool,
    /// Money below this fraction of max gets grown.
    #[arg(long, default_value_t = 0.9)]
    growth_target_fraction: f64,
    /// Fraction of max money to steal per batch.
    #[arg(long, default_value_t = 0.25)]
    hack_target_fraction: f64,
    /// Cap on the threads of any single operation.
    #[arg(long)]
    max_threads: Option<usize>,
    #[arg(long, value_enum, default_value_t = BatchOrder::Wgwh)]
    order: BatchOrder,
    /// Skip the weaken that follows grow.
    #[arg(long)]
    no_correction: bool,
    #[arg(long, default_value_t = 10_000)]
    cooldown_ms: u64,
    #[arg(long, default_value_t = 1_000)]
    interval_ms: u64,
    /// Gap between consecutive landings in a batch.
    #[arg(long, default_value_t = 500)]
    safety_margin_ms: u64,
    /// RAM kept free on home for the scheduler itself.
    #[arg(long, default_value_t = 16.)]
    home_reserve_gb: f64,
    /// Don't try to nuke servers we lack root on.
    #[arg(long)]
    no_root: bool,
}

impl AttackMode {
    pub fn into_config(self) -> Result<AttackConfig, ConfigError> {
        let config = AttackConfig {
            target: self.target,
            purchased_only: self.purchased_only,
            hacked_only: self.hacked_only,
            verbose: self.verbose,
            verbose_hacked: self.verbose_hacked,
            loop_mode: self.loop_mode,
            growth_target_fraction: self.growth_target_fraction,
            hack_target_fraction: self.hack_target_fraction,
            max_threads_cap: self.max_threads,
            order: self.order,
            correction_weaken: !self.no_correction,
            cooldown_ms: self.cooldown_ms,
            interval_ms: self.interval_ms,
            safety_margin_ms: self.safety_margin_ms,
            home_reserve_gb: self.home_reserve_gb,
            gain_root: !self.no_root,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Everything the scheduler needs to know, decided once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct AttackConfig {
    pub target: Option<String>,
    pub purchased_only: bool,
    pub hacked_only: bool,
    pub verbose: bool,
    pub verbose_hacked: bool,
    pub loop_mode: bool,
    pub growth_target_fraction: f64,
    pub hack_target_fraction: f64,
    pub max_threads_cap: Option<usize>,
    pub order: BatchOrder,
    pub correction_weaken: bool,
    pub cooldown_ms: u64,
    pub interval_ms: u64,
    pub safety_margin_ms: u64,
    pub home_reserve_gb: f64,
    pub gain_root: bool,
}

impl Default for AttackConfig {
    fn default() -> AttackConfig {
        AttackConfig {
            target: None,
            purchased_only: false,
            hacked_only: false,
            verbose: false,
            verbose_hacked: false,
            loop_mode: false,
            growth_target_fraction: 0.9,
            hack_target_fraction: 0.25,
            max_threads_cap: None,
            order: BatchOrder::Wgwh,
            correction_weaken: true,
            cooldown_ms: 10_000,
            interval_ms: 1_000,
            safety_margin_ms: 500,
            home_reserve_gb: 16.,
            gain_root: true,
        }
    }
}

impl AttackConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("growth target fraction", self.growth_target_fraction)?;
        check_fraction("hack target fraction", self.hack_target_fraction)?;

        if let Some(target) = &self.target {
            if target.trim().is_empty() {
                return Err(ConfigError::EmptyTarget);
            }
        }

        // negated so NaN is rejected too
        if !(0. <= self.home_reserve_gb) {
            return Err(ConfigError::NegativeReserve(self.home_reserve_gb));
        }

        if self.loop_mode && self.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        Ok(())
    }

    pub fn home_reserve_hundredths(&self) -> u64 {
        gb_to_hundredths(self.home_reserve_gb)
    }

    pub fn thread_policy(&self) -> crate::scoring::ThreadPolicy {
        crate::scoring::ThreadPolicy {
            growth_target_fraction: self.growth_target_fraction,
            hack_target_fraction: self.hack_target_fraction,
            correction_weaken: self.correction_weaken,
            max_threads_cap: self.max_threads_cap,
        }
    }
}

fn check_fraction(
    name: &'static str,
    value: f64,
) -> Result<(), ConfigError> {
    if 0. < value && value <= 1. {
        Ok(())
    }
    else {
        Err(ConfigError::FractionOutOfRange {
            name,
            value,
        })
    }
}
