//! IEC 61217 coordinate frame identifiers and the fixed room topology
//!
//! The parent of every frame is a compile-time fact; only the numeric content
//! of each edge changes at run time.

use std::fmt;
use std::str::FromStr;

use super::tree::TransformError;

/// Named coordinate frame of the treatment room
///
/// The discriminant doubles as the frame's slot in [`super::FrameTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CoordinateFrame {
    /// Room frame, origin at the isocenter. Root of the tree.
    FixedReference = 0,
    /// Rotating gantry arm
    Gantry,
    /// Beam limiting device mounted on the gantry
    Collimator,
    /// Left kV imaging panel
    LeftImagingPanel,
    /// Right kV imaging panel
    RightImagingPanel,
    /// Couch rotation about the vertical axis
    PatientSupportRotation,
    /// Telescoping couch column
    PatientSupport,
    /// Eccentric rotation stage of the table top
    TableTopEccentricRotation,
    /// Table top the patient lies on
    TableTop,
    /// Patient frame, rigidly attached to the table top
    Patient,
    /// Patient image space (right-anterior-superior)
    Ras,
}

impl CoordinateFrame {
    /// Number of frames in the room
    pub const COUNT: usize = 11;

    /// Every frame, parents before children
    pub const ALL: [CoordinateFrame; Self::COUNT] = [
        Self::FixedReference,
        Self::Gantry,
        Self::Collimator,
        Self::LeftImagingPanel,
        Self::RightImagingPanel,
        Self::PatientSupportRotation,
        Self::PatientSupport,
        Self::TableTopEccentricRotation,
        Self::TableTop,
        Self::Patient,
        Self::Ras,
    ];

    /// The root of the tree
    pub const ROOT: CoordinateFrame = Self::FixedReference;

    /// Slot index of this frame
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Frame stored in a slot, if the slot exists
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Fixed parent of this frame; `None` only for the root
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::FixedReference => None,
            Self::Gantry | Self::PatientSupportRotation => Some(Self::FixedReference),
            Self::Collimator | Self::LeftImagingPanel | Self::RightImagingPanel => Some(Self::Gantry),
            Self::PatientSupport | Self::TableTopEccentricRotation => {
                Some(Self::PatientSupportRotation)
            }
            Self::TableTop => Some(Self::TableTopEccentricRotation),
            Self::Patient => Some(Self::TableTop),
            Self::Ras => Some(Self::Patient),
        }
    }

    /// Stable name used for lookup by hosts
    pub const fn name(self) -> &'static str {
        match self {
            Self::FixedReference => "FixedReference",
            Self::Gantry => "Gantry",
            Self::Collimator => "Collimator",
            Self::LeftImagingPanel => "LeftImagingPanel",
            Self::RightImagingPanel => "RightImagingPanel",
            Self::PatientSupportRotation => "PatientSupportRotation",
            Self::PatientSupport => "PatientSupport",
            Self::TableTopEccentricRotation => "TableTopEccentricRotation",
            Self::TableTop => "TableTop",
            Self::Patient => "Patient",
            Self::Ras => "RAS",
        }
    }
}

impl fmt::Display for CoordinateFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CoordinateFrame {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|frame| frame.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| TransformError::UnknownFrame(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_indexed_by_discriminant() {
        for (i, frame) in CoordinateFrame::ALL.iter().enumerate() {
            assert_eq!(frame.index(), i);
            assert_eq!(CoordinateFrame::from_index(i), Some(*frame));
        }
        assert_eq!(CoordinateFrame::from_index(CoordinateFrame::COUNT), None);
    }

    #[test]
    fn test_single_root_and_parents_first() {
        let roots: Vec<_> = CoordinateFrame::ALL.iter().filter(|f| f.parent().is_none()).collect();
        assert_eq!(roots, vec![&CoordinateFrame::ROOT]);

        // Parents precede children, which rules out cycles
        for frame in CoordinateFrame::ALL {
            if let Some(parent) = frame.parent() {
                assert!(parent.index() < frame.index(), "{parent} must precede {frame}");
            }
        }
    }

    #[test]
    fn test_name_roundtrip() {
        for frame in CoordinateFrame::ALL {
            assert_eq!(frame.name().parse::<CoordinateFrame>().ok(), Some(frame));
        }
        assert_eq!("ras".parse::<CoordinateFrame>().ok(), Some(CoordinateFrame::Ras));
        assert!(matches!(
            "Couch".parse::<CoordinateFrame>(),
            Err(TransformError::UnknownFrame(name)) if name == "Couch"
        ));
    }
}
