use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, s};
use tracing::{debug, trace};

use crate::{error::CollectError, window::WindowLayout};

/// Number of frame rows that landed in an output row, and that fell outside
/// the image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Accumulation {
    pub accepted: usize,
    pub discarded: usize,
}

impl std::ops::AddAssign for Accumulation {
    fn add_assign(&mut self, rhs: Self) {
        self.accepted += rhs.accepted;
        self.discarded += rhs.discarded;
    }
}

/// Running per-window sums indexed by `(output_row, window, column)`.
///
/// A frame row with sensor offset `o` seen in frame `f` belongs to output row
/// `f - o`. Rows whose output row falls outside `[0, image_length)` are
/// dropped, so output rows that are never reached stay zero.
pub struct Accumulator<'a> {
    layout: &'a WindowLayout,
    image_length: usize,
    sums: Array3<u64>,
    stats: Accumulation,
}

impl<'a> Accumulator<'a> {
    pub fn new(layout: &'a WindowLayout, image_length: usize, row_width: usize) -> Self {
        Self {
            layout,
            image_length,
            sums: Array3::zeros((image_length, layout.len(), row_width)),
            stats: Accumulation::default(),
        }
    }

    pub fn row_width(&self) -> usize {
        self.sums.dim().2
    }

    pub fn add_frame(
        &mut self,
        frame_index: usize,
        frame: ArrayView2<'_, u16>,
    ) -> Result<Accumulation, CollectError> {
        if frame.ncols() != self.row_width() {
            return Err(CollectError::ShapeMismatch {
                expected: self.row_width(),
                found: frame.ncols(),
            });
        }
        let rows_per_frame = self.layout.rows_per_frame();
        if frame.nrows() > rows_per_frame {
            return Err(CollectError::RowOutOfRange {
                row: rows_per_frame,
                rows_per_frame,
            });
        }

        let mut stats = Accumulation::default();
        for (row_index, row) in frame.outer_iter().enumerate() {
            let loc = self.layout.locate(row_index)?;
            let x_row = frame_index as i64 - loc.real_offset as i64;
            match usize::try_from(x_row).ok().filter(|&x| x < self.image_length) {
                Some(x) => {
                    trace!(window = loc.window, x_row, "row accumulated");
                    self.sums
                        .slice_mut(s![x, loc.window, ..])
                        .zip_mut_with(&row, |sum, &px| *sum += u64::from(px));
                    stats.accepted += 1;
                }
                None => {
                    trace!(window = loc.window, x_row, "row discarded");
                    stats.discarded += 1;
                }
            }
        }

        self.stats += stats;
        Ok(stats)
    }

    pub fn add_frames(
        &mut self,
        frames: ArrayView3<'_, u16>,
    ) -> Result<Accumulation, CollectError> {
        let mut stats = Accumulation::default();
        for (frame_index, frame) in frames.outer_iter().enumerate() {
            stats += self.add_frame(frame_index, frame)?;
        }
        Ok(stats)
    }

    pub fn stats(&self) -> Accumulation {
        self.stats
    }

    pub fn sums(&self) -> ArrayView3<'_, u64> {
        self.sums.view()
    }

    pub fn into_sums(self) -> Array3<u64> {
        self.sums
    }
}

/// Floor-divides each window's sums by the window size.
pub fn averages(
    sums: ArrayView3<'_, u64>,
    layout: &WindowLayout,
) -> Result<Array3<u64>, CollectError> {
    if sums.dim().1 != layout.len() {
        return Err(CollectError::ShapeMismatch {
            expected: layout.len(),
            found: sums.dim().1,
        });
    }
    let mut averages = sums.to_owned();
    for (i, w) in layout.iter().enumerate() {
        let size = w.size() as u64;
        averages.slice_mut(s![.., i, ..]).mapv_inplace(|sum| sum / size);
    }
    Ok(averages)
}

/// Floor of the mean along `axis`.
pub fn floor_mean(data: ArrayView3<'_, u16>, axis: Axis) -> Result<Array2<u64>, CollectError> {
    let n = data.len_of(axis) as u64;
    if n == 0 {
        return Err(CollectError::EmptyAxis);
    }
    Ok(data.mapv(u64::from).sum_axis(axis).mapv(|sum| sum / n))
}

pub struct Reduction {
    pub sums: Array3<u64>,
    pub averages: Array3<u64>,
    pub stats: Accumulation,
}

/// Accumulates every frame and derives the per-window averages.
pub fn collect(
    layout: &WindowLayout,
    frames: ArrayView3<'_, u16>,
    image_length: usize,
) -> Result<Reduction, CollectError> {
    let mut acc = Accumulator::new(layout, image_length, frames.dim().2);
    let stats = acc.add_frames(frames)?;
    debug!(
        frames = frames.dim().0,
        accepted = stats.accepted,
        discarded = stats.discarded,
        "frames accumulated"
    );
    let sums = acc.into_sums();
    let averages = averages(sums.view(), layout)?;
    Ok(Reduction {
        sums,
        averages,
        stats,
    })
}
