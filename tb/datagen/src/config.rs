use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Args;
use collector::{CollectError, Window, WindowLayout, frames::DEFAULT_SEED};
use serde::{Deserialize, de::DeserializeOwned};

pub const DEFAULT_OUT_ROOT: &str = "out";
pub const ROW_COLLECTOR_DIR: &str = "row_collector";
pub const SUBSYSTEM_DIR: &str = "vnir_subsystem";
pub const LVDS_DECODER_DIR: &str = "lvds_decoder";

pub const ROW_COLLECTOR_WINDOWS: [Window; 3] = [
    Window::fixed(10, 17),
    Window::fixed(24, 39),
    Window::fixed(51, 52),
];
pub const SUBSYSTEM_WINDOWS: [Window; 3] = [
    Window::fixed(0, 0),
    Window::fixed(1, 1),
    Window::fixed(2, 2),
];

/// Frame synthesis settings shared by the row collector and subsystem benches.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectorCfg {
    pub windows: Vec<Window>,
    pub row_width: usize,
    pub bits: u32,
    pub image_length: usize,
    pub seed: u64,
    pub out_dir: PathBuf,
}

impl CollectorCfg {
    pub fn row_collector(out_root: &Path) -> Self {
        Self {
            windows: ROW_COLLECTOR_WINDOWS.to_vec(),
            row_width: 2048,
            bits: 10,
            image_length: 10,
            seed: DEFAULT_SEED,
            out_dir: out_root.join(ROW_COLLECTOR_DIR),
        }
    }

    pub fn subsystem(out_root: &Path) -> Self {
        Self {
            windows: SUBSYSTEM_WINDOWS.to_vec(),
            image_length: 2,
            out_dir: out_root.join(SUBSYSTEM_DIR),
            ..Self::row_collector(out_root)
        }
    }

    pub fn layout(&self) -> Result<WindowLayout, CollectError> {
        WindowLayout::new(self.windows.clone())
    }
}

#[derive(Clone, Debug)]
pub struct LvdsCfg {
    pub readout_time: usize,
    pub lvds_width: usize,
    pub bits: u32,
    pub seed: u64,
    pub out_dir: PathBuf,
}

impl Default for LvdsCfg {
    fn default() -> Self {
        Self {
            readout_time: 10,
            lvds_width: 16,
            bits: 10,
            seed: DEFAULT_SEED,
            out_dir: Path::new(DEFAULT_OUT_ROOT).join(LVDS_DECODER_DIR),
        }
    }
}

/// Row collator bench data, shaped `(channels, rows, row_width)`.
#[derive(Clone, Debug)]
pub struct CollatorCfg {
    pub channels: usize,
    pub rows: usize,
    pub row_width: usize,
    pub bits: u32,
    pub seed: u64,
}

impl Default for CollatorCfg {
    fn default() -> Self {
        Self {
            channels: 3,
            rows: 10,
            row_width: 2048,
            bits: 10,
            seed: DEFAULT_SEED,
        }
    }
}

/// Partial settings read from a JSON file or the command line.
pub trait Overrides: DeserializeOwned {
    type Cfg;

    fn apply_to(self, cfg: &mut Self::Cfg);
}

#[derive(Args, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CollectorOverrides {
    /// Readout window as LO:HI; repeat once per window, in readout order
    #[arg(long = "window", value_name = "LO:HI")]
    pub windows: Option<Vec<Window>>,
    /// Samples per row
    #[arg(long)]
    pub row_width: Option<usize>,
    /// Sample bit depth
    #[arg(long)]
    pub bits: Option<u32>,
    /// Number of output image rows
    #[arg(long)]
    pub image_length: Option<usize>,
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

impl Overrides for CollectorOverrides {
    type Cfg = CollectorCfg;

    fn apply_to(self, cfg: &mut CollectorCfg) {
        if let Some(v) = self.windows {
            cfg.windows = v;
        }
        if let Some(v) = self.row_width {
            cfg.row_width = v;
        }
        if let Some(v) = self.bits {
            cfg.bits = v;
        }
        if let Some(v) = self.image_length {
            cfg.image_length = v;
        }
        if let Some(v) = self.seed {
            cfg.seed = v;
        }
        if let Some(v) = self.out_dir {
            cfg.out_dir = v;
        }
    }
}

#[derive(Args, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LvdsOverrides {
    /// Words per LVDS channel in the readout burst
    #[arg(long)]
    pub readout_time: Option<usize>,
    /// Number of LVDS channels
    #[arg(long)]
    pub lvds_width: Option<usize>,
    #[arg(long)]
    pub bits: Option<u32>,
    #[arg(long)]
    pub seed: Option<u64>,
    /// Output directory (file output only)
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

impl Overrides for LvdsOverrides {
    type Cfg = LvdsCfg;

    fn apply_to(self, cfg: &mut LvdsCfg) {
        if let Some(v) = self.readout_time {
            cfg.readout_time = v;
        }
        if let Some(v) = self.lvds_width {
            cfg.lvds_width = v;
        }
        if let Some(v) = self.bits {
            cfg.bits = v;
        }
        if let Some(v) = self.seed {
            cfg.seed = v;
        }
        if let Some(v) = self.out_dir {
            cfg.out_dir = v;
        }
    }
}

#[derive(Args, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CollatorOverrides {
    #[arg(long)]
    pub channels: Option<usize>,
    /// Rows averaged per channel
    #[arg(long)]
    pub rows: Option<usize>,
    #[arg(long)]
    pub row_width: Option<usize>,
    #[arg(long)]
    pub bits: Option<u32>,
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Overrides for CollatorOverrides {
    type Cfg = CollatorCfg;

    fn apply_to(self, cfg: &mut CollatorCfg) {
        if let Some(v) = self.channels {
            cfg.channels = v;
        }
        if let Some(v) = self.rows {
            cfg.rows = v;
        }
        if let Some(v) = self.row_width {
            cfg.row_width = v;
        }
        if let Some(v) = self.bits {
            cfg.bits = v;
        }
        if let Some(v) = self.seed {
            cfg.seed = v;
        }
    }
}

pub fn load<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

/// Defaults, then the config file, then command line flags.
pub fn resolve<O: Overrides>(
    mut cfg: O::Cfg,
    file: Option<&Path>,
    cli: O,
) -> anyhow::Result<O::Cfg> {
    if let Some(path) = file {
        load::<O>(path)?.apply_to(&mut cfg);
    }
    cli.apply_to(&mut cfg);
    Ok(cfg)
}
