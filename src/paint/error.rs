use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    NoSurface,
    PaletteUnavailable,
    NoTargetImage,
    NoPosition,
    /// The target cannot be replaced while a run is active.
    Busy,
    ColorMissing { id: u32 },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSurface => write!(f, "ERROR: Site canvas not found!"),
            Self::PaletteUnavailable => write!(f, "ERROR: Site color palette is closed!"),
            Self::NoTargetImage => write!(f, "Capture image first."),
            Self::NoPosition => write!(f, "Set position first."),
            Self::Busy => write!(f, "Stop the current run first."),
            Self::ColorMissing { id } => f.write_str(&crate::paint::status::color_missing(*id)),
        }
    }
}

impl std::error::Error for RunError {}
