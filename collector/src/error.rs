use thiserror::Error;

use crate::window::Window;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollectError {
    #[error("window layout has no windows")]
    EmptyLayout,
    #[error("window {lo}:{hi} has lo above hi")]
    InvalidWindow { lo: usize, hi: usize },
    #[error("window {lo}:{hi} reaches the last addressable row")]
    WindowTooLarge { lo: usize, hi: usize },
    #[error("windows {first} and {second} overlap")]
    OverlappingWindows { first: Window, second: Window },
    #[error("image length {image_length} plus window row {max_hi} overflows the frame count")]
    FrameCountOverflow { image_length: usize, max_hi: usize },
    #[error("cannot parse window {0:?}, expected LO:HI")]
    MalformedWindow(String),
    #[error("row index {row} is outside the configured windows ({rows_per_frame} rows per frame)")]
    RowOutOfRange { row: usize, rows_per_frame: usize },
    #[error("sample bit depth {0} is not in 1..=16")]
    InvalidBitDepth(u32),
    #[error("array shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: usize, found: usize },
    #[error("cannot average over an empty axis")]
    EmptyAxis,
}
