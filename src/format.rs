//! Capability table layouts and constants.
//!
//! Defines the three generator modes, the CSV column layout each one expects,
//! and how every hierarchy level is rendered as a C array of structs. Consumers
//! compile the output against `libmfxvplsw_caps.h`, so type names and field
//! order here must match that header.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::grouping::Hierarchy;

/// Major version written into the root descriptor.
pub const STRUCT_VERSION_MAJOR: u16 = 1;

/// Minor version written into the root descriptor.
pub const STRUCT_VERSION_MINOR: u16 = 0;

/// Header included at the top of every generated file.
pub const DEFAULT_INCLUDE: &str = "src/libmfxvplsw_caps.h";

/// C element type of every leaf (color/pixel format) array.
pub const LEAF_TYPE: &str = "mfxU32";

/// Error for an unrecognized mode selector.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid mode: {0} (expected dec, enc or vpp)")]
pub struct UsageError(pub String);

/// Generator variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Mode {
    Decode,
    Encode,
    Vpp,
}

impl Mode {
    /// Column layout and rendering rules for this mode.
    #[must_use]
    pub fn layout(self) -> &'static Layout {
        match self {
            Mode::Decode => &DECODE,
            Mode::Encode => &ENCODE,
            Mode::Vpp => &VPP,
        }
    }

    /// Short selector used on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Decode => "dec",
            Mode::Encode => "enc",
            Mode::Vpp => "vpp",
        }
    }
}

impl FromStr for Mode {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dec" | "decode" => Ok(Mode::Decode),
            "enc" | "encode" => Ok(Mode::Encode),
            "vpp" => Ok(Mode::Vpp),
            _ => Err(UsageError(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.layout().title)
    }
}

/// One field of a struct entry inside a level array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Column of the group's closing row, emitted verbatim.
    Column(usize),
    /// Three integer columns starting here, emitted as `{ min, max, step }`.
    Range(usize),
    /// Reserved block, emitted as `{}`.
    Reserved,
    /// Number of members (child groups or leaf values).
    Count,
    /// Cast reference to the member array.
    Children,
}

/// Rendering rules for one hierarchy level.
#[derive(Debug)]
pub struct Level {
    /// Column whose value delimits groups at this level.
    pub key: usize,
    /// Letter used in array names for this level's index (`c`, `p`, `m`, ...).
    pub tag: char,
    /// C struct type of entries at this level.
    pub entry_type: &'static str,
    /// Array name prefix for arrays of this level's entries.
    pub array: &'static str,
    /// Entry fields, in struct order.
    pub fields: &'static [Field],
}

/// Full per-mode layout: levels outermost first, leaf list, root descriptor.
#[derive(Debug)]
pub struct Layout {
    pub mode: Mode,
    /// Human-readable name used in reports ("Decode").
    pub title: &'static str,
    /// What an outermost group is called in reports ("codecs").
    pub noun: &'static str,
    /// Exact number of CSV columns.
    pub columns: usize,
    pub levels: &'static [Level],
    /// Column holding the per-row leaf value.
    pub leaf: usize,
    /// Array name prefix for leaf arrays.
    pub leaf_array: &'static str,
    /// Descriptor struct type.
    pub descriptor_type: &'static str,
    /// Descriptor variable name.
    pub descriptor: &'static str,
}

impl Layout {
    /// Grouping hierarchy derived from the level keys.
    #[must_use]
    pub fn hierarchy(&self) -> Hierarchy {
        Hierarchy::new(self.levels.iter().map(|l| l.key).collect(), self.leaf)
    }

    /// Element type of the array that holds the members of a level-`depth` group.
    #[must_use]
    pub fn member_type(&self, depth: usize) -> &'static str {
        self.levels
            .get(depth + 1)
            .map_or(LEAF_TYPE, |l| l.entry_type)
    }

    /// Array name prefix for the members of a level-`depth` group.
    #[must_use]
    pub fn member_array(&self, depth: usize) -> &'static str {
        self.levels
            .get(depth + 1)
            .map_or(self.leaf_array, |l| l.array)
    }
}

use Field::{Children, Column, Count, Range, Reserved};

/// decode: CodecID, MaxcodecLevel, Profile, MemHandleType, Width{3}, Height{3}, ColorFormat.
pub static DECODE: Layout = Layout {
    mode: Mode::Decode,
    title: "Decode",
    noun: "codecs",
    columns: 11,
    levels: &[
        Level {
            key: 0,
            tag: 'c',
            entry_type: "DecCodec",
            array: "decCodec",
            fields: &[Column(0), Reserved, Column(1), Count, Children],
        },
        Level {
            key: 2,
            tag: 'p',
            entry_type: "DecProfile",
            array: "decProfile",
            fields: &[Column(2), Reserved, Count, Children],
        },
        Level {
            key: 3,
            tag: 'm',
            entry_type: "DecMemDesc",
            array: "decMemDesc",
            fields: &[Column(3), Range(4), Range(7), Reserved, Count, Children],
        },
    ],
    leaf: 10,
    leaf_array: "decColorFmt",
    descriptor_type: "mfxDecoderDescription",
    descriptor: "decoderDesc",
};

/// encode: CodecID, MaxcodecLevel, BiDirectionalPrediction, Profile, MemHandleType,
/// Width{3}, Height{3}, ColorFormat.
pub static ENCODE: Layout = Layout {
    mode: Mode::Encode,
    title: "Encode",
    noun: "codecs",
    columns: 12,
    levels: &[
        Level {
            key: 0,
            tag: 'c',
            entry_type: "EncCodec",
            array: "encCodec",
            fields: &[Column(0), Column(1), Column(2), Reserved, Count, Children],
        },
        Level {
            key: 3,
            tag: 'p',
            entry_type: "EncProfile",
            array: "encProfile",
            fields: &[Column(3), Reserved, Count, Children],
        },
        Level {
            key: 4,
            tag: 'm',
            entry_type: "EncMemDesc",
            array: "encMemDesc",
            fields: &[Column(4), Range(5), Range(8), Reserved, Count, Children],
        },
    ],
    leaf: 11,
    leaf_array: "encColorFmt",
    descriptor_type: "mfxEncoderDescription",
    descriptor: "encoderDesc",
};

/// vpp: FilterFourCC, MaxDelayInFrames, MemHandleType, Width{3}, Height{3}, InFormat, OutFormat.
pub static VPP: Layout = Layout {
    mode: Mode::Vpp,
    title: "VPP",
    noun: "filters",
    columns: 11,
    levels: &[
        Level {
            key: 0,
            tag: 'f',
            entry_type: "VPPFilter",
            array: "vppFilter",
            fields: &[Column(0), Column(1), Reserved, Count, Children],
        },
        Level {
            key: 2,
            tag: 'm',
            entry_type: "VPPMemDesc",
            array: "vppMemDesc",
            fields: &[Column(2), Range(3), Range(6), Reserved, Count, Children],
        },
        Level {
            key: 9,
            tag: 'i',
            entry_type: "VPPFormat",
            array: "vppFormatIn",
            fields: &[Column(9), Reserved, Count, Children],
        },
    ],
    leaf: 10,
    leaf_array: "vppFormatOut",
    descriptor_type: "mfxVPPDescription",
    descriptor: "vppDesc",
};
