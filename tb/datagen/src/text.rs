use std::{
    fmt::Display,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use collector::WindowLayout;
use ndarray::{ArrayView1, ArrayView2};
use tracing::info;

/// Space separated decimal samples, no trailing space.
pub fn write_decimal_row<W: Write, T: Display>(
    w: &mut W,
    row: ArrayView1<'_, T>,
) -> io::Result<()> {
    for (i, v) in row.iter().enumerate() {
        if i > 0 {
            w.write_all(b" ")?;
        }
        write!(w, "{v}")?;
    }
    writeln!(w)
}

pub fn write_decimal_rows<W: Write, T: Display>(
    w: &mut W,
    rows: ArrayView2<'_, T>,
) -> io::Result<()> {
    rows.outer_iter().try_for_each(|row| write_decimal_row(w, row))
}

/// Space separated binary words, each zero-padded to at least `bits` digits.
pub fn write_binary_row<W: Write>(
    w: &mut W,
    row: ArrayView1<'_, u16>,
    bits: u32,
) -> io::Result<()> {
    let width = bits as usize;
    for (i, v) in row.iter().enumerate() {
        if i > 0 {
            w.write_all(b" ")?;
        }
        write!(w, "{v:0width$b}")?;
    }
    writeln!(w)
}

pub fn write_binary_rows<W: Write>(
    w: &mut W,
    rows: ArrayView2<'_, u16>,
    bits: u32,
) -> io::Result<()> {
    rows.outer_iter().try_for_each(|row| write_binary_row(w, row, bits))
}

/// One `lo hi` line per window.
pub fn write_windows<W: Write>(w: &mut W, layout: &WindowLayout) -> io::Result<()> {
    layout
        .iter()
        .try_for_each(|win| writeln!(w, "{} {}", win.lo(), win.hi()))
}

/// Output directory tree of one generator run.
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    pub fn create(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("creating output directory {}", root.display()))?;
        Ok(Self { root })
    }

    /// Writes `rel` under the root through a buffered writer, creating parent
    /// directories as needed.
    pub fn write<F>(&self, rel: impl AsRef<Path>, body: F) -> anyhow::Result<PathBuf>
    where
        F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
    {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = BufWriter::with_capacity(1 << 20, file);
        body(&mut writer).with_context(|| format!("writing {}", path.display()))?;
        writer
            .into_inner()
            .map_err(|e| e.into_error())
            .and_then(|f| f.sync_all())
            .with_context(|| format!("flushing {}", path.display()))?;

        info!(path = %path.display(), "wrote");
        Ok(path)
    }
}
