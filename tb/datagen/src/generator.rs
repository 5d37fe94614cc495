use std::io::Write;

use anyhow::{Context, ensure};
use collector::{Reduction, Sampler, WindowLayout, collect, floor_mean};
use ndarray::{Array1, Array2, Array3, Axis, s};
use tracing::{debug, info};

use crate::{
    config::{CollatorCfg, CollectorCfg, LvdsCfg},
    text::{OutputDir, write_binary_row, write_binary_rows, write_decimal_rows, write_windows},
    vhdl::{self, Element},
};

/// Channel file names of the subsystem bench, in window order.
pub const SUBSYSTEM_CHANNELS: [&str; 3] = ["red", "nir", "blue"];

/// Random frames over a window layout and their per-window reduction.
pub struct FrameDataset {
    pub layout: WindowLayout,
    pub image_length: usize,
    pub frames: Array3<u16>,
    pub reduction: Reduction,
}

impl FrameDataset {
    pub fn generate(cfg: &CollectorCfg) -> anyhow::Result<Self> {
        let layout = cfg.layout().context("invalid window layout")?;
        let mut sampler = Sampler::new(cfg.seed, cfg.bits)?;
        let n_frames = layout.frame_count(cfg.image_length)?;
        debug!(
            n_frames,
            rows_per_frame = layout.rows_per_frame(),
            row_width = cfg.row_width,
            seed = cfg.seed,
            "generating frames"
        );

        let frames = sampler.frames(n_frames, layout.rows_per_frame(), cfg.row_width);
        let reduction = collect(&layout, frames.view(), cfg.image_length)?;
        info!(
            accepted = reduction.stats.accepted,
            discarded = reduction.stats.discarded,
            "frames reduced"
        );

        Ok(Self {
            layout,
            image_length: cfg.image_length,
            frames,
            reduction,
        })
    }

    fn save_rows(&self, out: &OutputDir) -> anyhow::Result<()> {
        out.write("rows.out", |w| {
            self.frames
                .outer_iter()
                .try_for_each(|frame| write_decimal_rows(w, frame))
        })?;
        Ok(())
    }

    /// `rows.out`, `sum/colour{i}.out`, `average/colour{i}.out`, `config.out`.
    pub fn save_row_collector(&self, out: &OutputDir) -> anyhow::Result<()> {
        self.save_rows(out)?;
        for i in 0..self.layout.len() {
            out.write(format!("sum/colour{i}.out"), |w| {
                write_decimal_rows(w, self.reduction.sums.slice(s![.., i, ..]))
            })?;
            out.write(format!("average/colour{i}.out"), |w| {
                write_decimal_rows(w, self.reduction.averages.slice(s![.., i, ..]))
            })?;
        }
        out.write("config.out", |w| {
            write_windows(w, &self.layout)?;
            writeln!(w, "{}", self.image_length)
        })?;
        Ok(())
    }

    /// `rows.out`, one file of sums per colour channel, `config.out` and
    /// `image_length.out`.
    pub fn save_subsystem(&self, out: &OutputDir) -> anyhow::Result<()> {
        ensure!(
            self.layout.len() == SUBSYSTEM_CHANNELS.len(),
            "subsystem vectors need {} windows ({}), got {}",
            SUBSYSTEM_CHANNELS.len(),
            SUBSYSTEM_CHANNELS.join(", "),
            self.layout.len()
        );
        self.save_rows(out)?;
        // the subsystem bench checks raw sums, not averages
        for (i, name) in SUBSYSTEM_CHANNELS.iter().enumerate() {
            out.write(format!("{name}.out"), |w| {
                write_decimal_rows(w, self.reduction.sums.slice(s![.., i, ..]))
            })?;
        }
        out.write("config.out", |w| write_windows(w, &self.layout))?;
        out.write("image_length.out", |w| writeln!(w, "{}", self.image_length))?;
        Ok(())
    }
}

/// Idle word set followed by a readout burst, one word per LVDS channel.
pub struct LvdsDataset {
    pub bits: u32,
    pub idle: Array1<u16>,
    pub transmit: Array2<u16>,
}

impl LvdsDataset {
    pub fn generate(cfg: &LvdsCfg) -> anyhow::Result<Self> {
        let mut sampler = Sampler::new(cfg.seed, cfg.bits)?;
        let idle = sampler.vector(cfg.lvds_width);
        let transmit = sampler.matrix(cfg.readout_time, cfg.lvds_width);
        Ok(Self {
            bits: sampler.bits(),
            idle,
            transmit,
        })
    }

    pub fn save(&self, out: &OutputDir) -> anyhow::Result<()> {
        out.write("data_idle.out", |w| write_binary_row(w, self.idle.view(), self.bits))?;
        out.write("data_transmit.out", |w| write_binary_rows(w, self.transmit.view(), self.bits))?;
        Ok(())
    }

    pub fn vhdl_constants(&self) -> String {
        let element = Element::LogicVector { width: self.bits };
        let idle = vhdl::aggregate1(self.idle.view(), element);
        let transmit = vhdl::aggregate2(self.transmit.view(), element, "");
        format!(
            "{}\n{}\n",
            vhdl::constant("data_idle", "lvds_data_t", &idle),
            vhdl::constant("data_transmit", "lvds_data_vector_t", &transmit)
        )
    }
}

/// Row collator input rows and their per-channel floor averages.
pub struct CollatorDataset {
    pub bits: u32,
    pub data: Array3<u16>,
    pub averages: Array2<u64>,
}

impl CollatorDataset {
    pub fn generate(cfg: &CollatorCfg) -> anyhow::Result<Self> {
        let mut sampler = Sampler::new(cfg.seed, cfg.bits)?;
        let data = sampler.frames(cfg.channels, cfg.rows, cfg.row_width);
        let averages = floor_mean(data.view(), Axis(1))?;
        Ok(Self {
            bits: sampler.bits(),
            data,
            averages,
        })
    }

    pub fn vhdl_constants(&self) -> String {
        let element = Element::Unsigned { width: self.bits };
        let data = vhdl::aggregate3(self.data.view(), element, "");
        let averages = vhdl::aggregate2(self.averages.view(), element, "");
        format!(
            "{}\n{}\n",
            vhdl::constant("data", "data_t", &data),
            vhdl::constant("averages", "averages_t", &averages)
        )
    }
}

pub fn row_collector(cfg: &CollectorCfg) -> anyhow::Result<()> {
    let dataset = FrameDataset::generate(cfg)?;
    let out = OutputDir::create(&cfg.out_dir)?;
    dataset.save_row_collector(&out)
}

pub fn subsystem(cfg: &CollectorCfg) -> anyhow::Result<()> {
    let dataset = FrameDataset::generate(cfg)?;
    let out = OutputDir::create(&cfg.out_dir)?;
    dataset.save_subsystem(&out)
}

pub fn lvds_decoder(cfg: &LvdsCfg) -> anyhow::Result<()> {
    let dataset = LvdsDataset::generate(cfg)?;
    let out = OutputDir::create(&cfg.out_dir)?;
    dataset.save(&out)
}

pub fn lvds_decoder_tb<W: Write>(cfg: &LvdsCfg, w: &mut W) -> anyhow::Result<()> {
    let dataset = LvdsDataset::generate(cfg)?;
    w.write_all(dataset.vhdl_constants().as_bytes())?;
    Ok(())
}

pub fn row_collator_tb<W: Write>(cfg: &CollatorCfg, w: &mut W) -> anyhow::Result<()> {
    let dataset = CollatorDataset::generate(cfg)?;
    w.write_all(dataset.vhdl_constants().as_bytes())?;
    Ok(())
}
