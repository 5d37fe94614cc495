use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::config::{
    self, CollatorCfg, CollatorOverrides, CollectorCfg, CollectorOverrides, DEFAULT_OUT_ROOT,
    LvdsCfg, LvdsOverrides,
};

/// Deterministic test vectors for the VNIR subsystem testbenches
#[derive(Parser)]
#[command(name = "datagen", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, value_name = "LEVEL", global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Frames plus per-window sums and averages for the row collector bench
    RowCollector(CollectorArgs),
    /// Frames plus red/nir/blue sums for the subsystem bench
    Subsystem(CollectorArgs),
    /// Idle and readout LVDS words as binary text
    LvdsDecoder(LvdsArgs),
    /// Print row collator constants as VHDL
    RowCollatorTb(CollatorArgs),
    /// Print LVDS decoder constants as VHDL
    LvdsDecoderTb(LvdsArgs),
    /// Every file-writing generator with its defaults
    All(AllArgs),
}

#[derive(Args)]
pub struct CollectorArgs {
    /// JSON file with any of the settings below
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: CollectorOverrides,
}

impl CollectorArgs {
    pub fn resolve(self, defaults: CollectorCfg) -> anyhow::Result<CollectorCfg> {
        config::resolve(defaults, self.config.as_deref(), self.overrides)
    }
}

#[derive(Args)]
pub struct LvdsArgs {
    /// JSON file with any of the settings below
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: LvdsOverrides,
}

impl LvdsArgs {
    pub fn resolve(self) -> anyhow::Result<LvdsCfg> {
        config::resolve(LvdsCfg::default(), self.config.as_deref(), self.overrides)
    }
}

#[derive(Args)]
pub struct CollatorArgs {
    /// JSON file with any of the settings below
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: CollatorOverrides,
}

impl CollatorArgs {
    pub fn resolve(self) -> anyhow::Result<CollatorCfg> {
        config::resolve(CollatorCfg::default(), self.config.as_deref(), self.overrides)
    }
}

#[derive(Args)]
pub struct AllArgs {
    /// Directory holding one subdirectory per bench
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUT_ROOT)]
    pub out_root: PathBuf,

    #[arg(long)]
    pub seed: Option<u64>,
}

impl AllArgs {
    pub fn out_root(&self) -> &Path {
        &self.out_root
    }
}
