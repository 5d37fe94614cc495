use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::CollectError;

/// Inclusive range `[lo, hi]` of sensor rows that are read out as one colour
/// channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct Window {
    lo: usize,
    hi: usize,
}

#[derive(Deserialize)]
struct RawWindow {
    lo: usize,
    hi: usize,
}

impl TryFrom<RawWindow> for Window {
    type Error = CollectError;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        Window::new(raw.lo, raw.hi)
    }
}

impl Window {
    /// `hi` must stay below `usize::MAX` so that `size()` fits in a `usize`.
    pub fn new(lo: usize, hi: usize) -> Result<Self, CollectError> {
        if lo > hi {
            return Err(CollectError::InvalidWindow { lo, hi });
        }
        if hi == usize::MAX {
            return Err(CollectError::WindowTooLarge { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    /// Compile-time constructor for hard-coded layouts.
    pub const fn fixed(lo: usize, hi: usize) -> Self {
        assert!(lo <= hi, "window lo above hi");
        assert!(hi < usize::MAX, "window hi out of range");
        Self { lo, hi }
    }

    pub fn lo(&self) -> usize {
        self.lo
    }

    pub fn hi(&self) -> usize {
        self.hi
    }

    pub fn size(&self) -> usize {
        self.hi - self.lo + 1
    }

    pub fn contains(&self, row: usize) -> bool {
        (self.lo..=self.hi).contains(&row)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.lo, self.hi)
    }
}

impl FromStr for Window {
    type Err = CollectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CollectError::MalformedWindow(s.to_string());
        let (lo, hi) = s.split_once(':').ok_or_else(malformed)?;
        let lo = lo.trim().parse().map_err(|_| malformed())?;
        let hi = hi.trim().parse().map_err(|_| malformed())?;
        Window::new(lo, hi)
    }
}

/// Where a row of the concatenated frame layout comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowLocation {
    pub window: usize,
    /// Row in sensor coordinates, i.e. inside `[lo, hi]` of its window.
    pub real_offset: usize,
}

/// Windows laid out back to back in the synthetic row stream of one frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Window>", into = "Vec<Window>")]
pub struct WindowLayout {
    windows: Vec<Window>,
    // first frame row of each window
    starts: Vec<usize>,
    rows_per_frame: usize,
}

impl WindowLayout {
    /// Windows must be non-empty and must not overlap. They are laid out in
    /// the given order, which need not follow sensor row order.
    pub fn new(windows: Vec<Window>) -> Result<Self, CollectError> {
        if windows.is_empty() {
            return Err(CollectError::EmptyLayout);
        }
        let mut by_lo = windows.clone();
        by_lo.sort_by_key(Window::lo);
        for pair in by_lo.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            if first.hi >= second.lo {
                return Err(CollectError::OverlappingWindows { first, second });
            }
        }

        let mut starts = Vec::with_capacity(windows.len());
        // disjoint windows below usize::MAX hold at most usize::MAX rows
        let mut rows_per_frame = 0;
        for w in &windows {
            starts.push(rows_per_frame);
            rows_per_frame += w.size();
        }

        Ok(Self {
            windows,
            starts,
            rows_per_frame,
        })
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn iter(&self) -> impl Iterator<Item = &Window> {
        self.windows.iter()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn rows_per_frame(&self) -> usize {
        self.rows_per_frame
    }

    /// Highest sensor row covered by any window.
    pub fn max_hi(&self) -> usize {
        self.windows.iter().map(Window::hi).max().unwrap_or(0)
    }

    /// Number of frames needed for every output row to see every window row.
    pub fn frame_count(&self, image_length: usize) -> Result<usize, CollectError> {
        let max_hi = self.max_hi();
        image_length
            .checked_add(max_hi)
            .ok_or(CollectError::FrameCountOverflow {
                image_length,
                max_hi,
            })
    }

    pub fn locate(&self, row: usize) -> Result<RowLocation, CollectError> {
        if row >= self.rows_per_frame {
            return Err(CollectError::RowOutOfRange {
                row,
                rows_per_frame: self.rows_per_frame,
            });
        }
        // starts[0] == 0, so at least one start is <= row
        let window = self.starts.partition_point(|&start| start <= row) - 1;
        let relative = row - self.starts[window];
        Ok(RowLocation {
            window,
            real_offset: self.windows[window].lo + relative,
        })
    }

    pub fn resolve(&self, row: usize) -> Result<(usize, &Window), CollectError> {
        let loc = self.locate(row)?;
        Ok((loc.window, &self.windows[loc.window]))
    }

    pub fn real_offset(&self, row: usize) -> Result<usize, CollectError> {
        self.locate(row).map(|loc| loc.real_offset)
    }
}

impl TryFrom<Vec<Window>> for WindowLayout {
    type Error = CollectError;

    fn try_from(windows: Vec<Window>) -> Result<Self, Self::Error> {
        WindowLayout::new(windows)
    }
}

impl From<WindowLayout> for Vec<Window> {
    fn from(layout: WindowLayout) -> Self {
        layout.windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(bounds: &[(usize, usize)]) -> WindowLayout {
        let windows = bounds
            .iter()
            .map(|&(lo, hi)| Window::new(lo, hi).unwrap())
            .collect();
        WindowLayout::new(windows).unwrap()
    }

    // Straight cumulative scan, kept independent from the prefix-sum lookup.
    fn scan(layout: &WindowLayout, row: usize) -> Vec<(usize, usize)> {
        let mut claims = Vec::new();
        let mut sizes = 0;
        for (i, w) in layout.iter().enumerate() {
            if row >= sizes && row - sizes < w.size() {
                claims.push((i, row - sizes + w.lo()));
            }
            sizes += w.size();
        }
        claims
    }

    #[test]
    fn window_size_is_inclusive() {
        assert_eq!(Window::new(10, 17).unwrap().size(), 8);
        assert_eq!(Window::new(3, 3).unwrap().size(), 1);
        assert_eq!(
            Window::new(5, 4),
            Err(CollectError::InvalidWindow { lo: 5, hi: 4 })
        );
    }

    #[test]
    fn single_row_windows_resolve_to_themselves() {
        let l = layout(&[(0, 0), (1, 1), (2, 2)]);
        assert_eq!(l.rows_per_frame(), 3);
        let (index, w) = l.resolve(1).unwrap();
        assert_eq!(index, 1);
        assert_eq!(*w, Window::fixed(1, 1));
        assert_eq!(l.real_offset(1).unwrap(), 1);
    }

    #[test]
    fn every_row_claimed_by_exactly_one_window() {
        for bounds in [
            vec![(0, 0), (1, 1), (2, 2)],
            vec![(0, 1), (2, 3), (4, 5)],
            vec![(10, 17), (24, 39), (51, 52)],
            vec![(7, 7)],
        ] {
            let l = layout(&bounds);
            for row in 0..l.rows_per_frame() {
                let claims = scan(&l, row);
                assert_eq!(claims.len(), 1, "row {row} of {bounds:?}");
                let loc = l.locate(row).unwrap();
                assert_eq!((loc.window, loc.real_offset), claims[0]);
                assert!(l.windows()[loc.window].contains(loc.real_offset));
            }
        }
    }

    #[test]
    fn gaps_between_windows_are_skipped() {
        let l = layout(&[(10, 17), (24, 39), (51, 52)]);
        assert_eq!(l.rows_per_frame(), 8 + 16 + 2);
        assert_eq!(l.real_offset(7).unwrap(), 17);
        assert_eq!(l.real_offset(8).unwrap(), 24);
        assert_eq!(l.resolve(24).unwrap().0, 2);
        assert_eq!(l.real_offset(25).unwrap(), 52);
        assert_eq!(l.frame_count(10), Ok(62));
    }

    #[test]
    fn rows_past_the_layout_fail() {
        let l = layout(&[(0, 1), (2, 3)]);
        assert_eq!(
            l.locate(4),
            Err(CollectError::RowOutOfRange {
                row: 4,
                rows_per_frame: 4
            })
        );
        assert!(l.resolve(100).is_err());
    }

    #[test]
    fn layout_rejects_empty_and_overlapping() {
        assert_eq!(WindowLayout::new(vec![]), Err(CollectError::EmptyLayout));
        let overlapping = vec![Window::fixed(0, 4), Window::fixed(4, 6)];
        assert_eq!(
            WindowLayout::new(overlapping),
            Err(CollectError::OverlappingWindows {
                first: Window::fixed(0, 4),
                second: Window::fixed(4, 6),
            })
        );
        // overlap is found regardless of the configured order
        let shuffled = vec![Window::fixed(8, 9), Window::fixed(20, 30), Window::fixed(2, 8)];
        assert_eq!(
            WindowLayout::new(shuffled),
            Err(CollectError::OverlappingWindows {
                first: Window::fixed(2, 8),
                second: Window::fixed(8, 9),
            })
        );
    }

    #[test]
    fn descending_windows_keep_their_readout_order() {
        let l = layout(&[(24, 39), (10, 17)]);
        assert_eq!(l.rows_per_frame(), 16 + 8);
        assert_eq!(l.resolve(0).unwrap(), (0, &Window::fixed(24, 39)));
        assert_eq!(l.real_offset(15).unwrap(), 39);
        assert_eq!(l.resolve(16).unwrap(), (1, &Window::fixed(10, 17)));
        assert_eq!(l.real_offset(16).unwrap(), 10);
        assert_eq!(l.real_offset(23).unwrap(), 17);
        for row in 0..l.rows_per_frame() {
            assert_eq!(scan(&l, row).len(), 1);
        }
        // enough frames for the highest window, not the last configured one
        assert_eq!(l.max_hi(), 39);
        assert_eq!(l.frame_count(2), Ok(41));
    }

    #[test]
    fn huge_windows_fail_instead_of_overflowing() {
        assert_eq!(
            Window::new(0, usize::MAX),
            Err(CollectError::WindowTooLarge {
                lo: 0,
                hi: usize::MAX
            })
        );
        assert!(format!("0:{}", usize::MAX).parse::<Window>().is_err());

        let big = Window::new(0, usize::MAX - 1).unwrap();
        assert_eq!(big.size(), usize::MAX);
        assert_eq!(
            WindowLayout::new(vec![Window::fixed(0, 0), big]),
            Err(CollectError::OverlappingWindows {
                first: Window::fixed(0, 0),
                second: big,
            })
        );
        // every addressable row in two windows, in reverse order
        let l = WindowLayout::new(vec![
            Window::new(usize::MAX - 1, usize::MAX - 1).unwrap(),
            Window::new(0, usize::MAX - 2).unwrap(),
        ])
        .unwrap();
        assert_eq!(l.rows_per_frame(), usize::MAX);
        assert_eq!(l.real_offset(usize::MAX - 1).unwrap(), usize::MAX - 2);
        assert_eq!(
            l.frame_count(1),
            Err(CollectError::FrameCountOverflow {
                image_length: 1,
                max_hi: usize::MAX - 1
            })
        );
    }

    #[test]
    fn frame_count_overflow_is_an_error() {
        let l = layout(&[(10, 17)]);
        assert_eq!(
            l.frame_count(usize::MAX),
            Err(CollectError::FrameCountOverflow {
                image_length: usize::MAX,
                max_hi: 17
            })
        );
        assert_eq!(l.frame_count(usize::MAX - 17), Ok(usize::MAX));
    }

    #[test]
    fn window_parses_from_lo_hi() {
        assert_eq!("24:39".parse::<Window>().unwrap(), Window::fixed(24, 39));
        assert_eq!(" 1 : 2 ".parse::<Window>().unwrap(), Window::fixed(1, 2));
        assert!(matches!(
            "24-39".parse::<Window>(),
            Err(CollectError::MalformedWindow(_))
        ));
        assert!(matches!(
            "9:3".parse::<Window>(),
            Err(CollectError::InvalidWindow { lo: 9, hi: 3 })
        ));
        assert_eq!(Window::fixed(51, 52).to_string(), "51:52");
    }

    #[test]
    fn layout_deserializes_with_validation() {
        let l: WindowLayout =
            serde_json::from_str(r#"[{"lo":0,"hi":1},{"lo":2,"hi":3}]"#).unwrap();
        assert_eq!(l.rows_per_frame(), 4);
        assert!(serde_json::from_str::<WindowLayout>(r#"[{"lo":3,"hi":1}]"#).is_err());
        assert!(serde_json::from_str::<WindowLayout>("[]").is_err());
        assert_eq!(
            serde_json::to_string(&l).unwrap(),
            r#"[{"lo":0,"hi":1},{"lo":2,"hi":3}]"#
        );
    }
}
