use std::io::{self, Write};

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::{
    cli::{Cli, Command},
    config::{CollectorCfg, DEFAULT_OUT_ROOT, LVDS_DECODER_DIR, LvdsCfg},
};

mod cli;
mod config;
mod generator;
mod text;
mod vhdl;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let default_root = std::path::Path::new(DEFAULT_OUT_ROOT);
    match cli.command {
        Command::RowCollector(args) => {
            let cfg = args.resolve(CollectorCfg::row_collector(default_root))?;
            debug!(?cfg, "row collector");
            generator::row_collector(&cfg)
        }
        Command::Subsystem(args) => {
            let cfg = args.resolve(CollectorCfg::subsystem(default_root))?;
            debug!(?cfg, "subsystem");
            generator::subsystem(&cfg)
        }
        Command::LvdsDecoder(args) => {
            let cfg = args.resolve()?;
            debug!(?cfg, "lvds decoder");
            generator::lvds_decoder(&cfg)
        }
        Command::RowCollatorTb(args) => {
            let cfg = args.resolve()?;
            debug!(?cfg, "row collator testbench constants");
            print_with(|w| generator::row_collator_tb(&cfg, w))
        }
        Command::LvdsDecoderTb(args) => {
            let cfg = args.resolve()?;
            debug!(?cfg, "lvds decoder testbench constants");
            print_with(|w| generator::lvds_decoder_tb(&cfg, w))
        }
        Command::All(args) => {
            let root = args.out_root();
            let mut row_collector = CollectorCfg::row_collector(root);
            let mut subsystem = CollectorCfg::subsystem(root);
            let mut lvds = LvdsCfg {
                out_dir: root.join(LVDS_DECODER_DIR),
                ..LvdsCfg::default()
            };
            if let Some(seed) = args.seed {
                row_collector.seed = seed;
                subsystem.seed = seed;
                lvds.seed = seed;
            }

            generator::row_collector(&row_collector).context("row collector")?;
            generator::subsystem(&subsystem).context("subsystem")?;
            generator::lvds_decoder(&lvds).context("lvds decoder")?;
            info!(root = %root.display(), "all test vectors written");
            Ok(())
        }
    }
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Testbench constants go to stdout; logs stay on stderr.
fn print_with<F>(body: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut io::StdoutLock<'static>) -> anyhow::Result<()>,
{
    let mut stdout = io::stdout().lock();
    body(&mut stdout)?;
    stdout.flush().context("flushing stdout")
}
