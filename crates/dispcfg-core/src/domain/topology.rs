//! Path and mode records.
//!
//! These types mirror the layout the display configuration service hands
//! out: a path array and a mode array, cross-referenced by index.  A path
//! link of `None` is the "invalid index" sentinel of the native API.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index into the mode array.
pub type ModeIndex = usize;

/// Locally unique identifier of a display adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct AdapterId {
    pub low_part: u32,
    pub high_part: i32,
}

impl AdapterId {
    pub const fn new(low_part: u32, high_part: i32) -> Self {
        Self { low_part, high_part }
    }
}

impl fmt::Display for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}-{:08X}", self.high_part, self.low_part)
    }
}

/// Caller-facing display number.  1-based, assigned by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DisplayId(pub u32);

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A monitor connection that can be recognised across snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhysicalTarget {
    pub adapter_id: AdapterId,
    pub target_id: u32,
}

/// A desktop coordinate.  The primary display's source mode sits at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns this point moved by `(dx, dy)`, or `None` when either
    /// coordinate leaves the `i32` range.
    pub fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self { x: self.x.checked_add(dx)?, y: self.y.checked_add(dy)? })
    }

    /// Returns the `(dx, dy)` that moves this point onto `to`.
    pub fn delta_to(self, to: Point) -> Option<(i32, i32)> {
        Some((to.x.checked_sub(self.x)?, to.y.checked_sub(self.y)?))
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A rectangle in desktop coordinates.
///
/// `x` and `y` are the top-left corner.  The right and bottom edges are
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Returns the rightmost X coordinate (exclusive), saturating at
    /// `i32::MAX`.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(extent(self.width))
    }

    /// Returns the bottommost Y coordinate (exclusive), saturating at
    /// `i32::MAX`.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(extent(self.height))
    }

    /// Returns `true` if this region overlaps with `other`.
    pub fn overlaps(&self, other: &Region) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A pixel length as a signed coordinate span, clamped to `i32::MAX`.
pub fn extent(length: u32) -> i32 {
    i32::try_from(length).unwrap_or(i32::MAX)
}

/// A rational number as used for refresh rates and sync frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self { numerator, denominator }
    }

    /// Builds a rational from a refresh rate in Hz with millihertz precision.
    pub fn from_hz(hz: f64) -> Self {
        Self { numerator: (hz * 1000.0).round() as u32, denominator: 1000 }
    }

    /// Returns the value in Hz, or `0.0` for a zero denominator.
    pub fn as_hz(&self) -> f64 {
        if self.denominator == 0 {
            return 0.0;
        }
        self.numerator as f64 / self.denominator as f64
    }
}

/// Connector technology of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputTechnology {
    Hd15,
    SVideo,
    CompositeVideo,
    ComponentVideo,
    Dvi,
    Hdmi,
    Lvds,
    DJpn,
    Sdi,
    DisplayPortExternal,
    DisplayPortEmbedded,
    UdiExternal,
    UdiEmbedded,
    SdtvDongle,
    Miracast,
    IndirectWired,
    IndirectVirtual,
    DisplayPortUsbTunnel,
    Internal,
    /// Any value the platform reports that is not listed above,
    /// including its own "other" marker.
    Other(u32),
}

impl From<u32> for OutputTechnology {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Hd15,
            1 => Self::SVideo,
            2 => Self::CompositeVideo,
            3 => Self::ComponentVideo,
            4 => Self::Dvi,
            5 => Self::Hdmi,
            6 => Self::Lvds,
            8 => Self::DJpn,
            9 => Self::Sdi,
            10 => Self::DisplayPortExternal,
            11 => Self::DisplayPortEmbedded,
            12 => Self::UdiExternal,
            13 => Self::UdiEmbedded,
            14 => Self::SdtvDongle,
            15 => Self::Miracast,
            16 => Self::IndirectWired,
            17 => Self::IndirectVirtual,
            18 => Self::DisplayPortUsbTunnel,
            0x8000_0000 => Self::Internal,
            other => Self::Other(other),
        }
    }
}

impl From<OutputTechnology> for u32 {
    fn from(value: OutputTechnology) -> Self {
        match value {
            OutputTechnology::Hd15 => 0,
            OutputTechnology::SVideo => 1,
            OutputTechnology::CompositeVideo => 2,
            OutputTechnology::ComponentVideo => 3,
            OutputTechnology::Dvi => 4,
            OutputTechnology::Hdmi => 5,
            OutputTechnology::Lvds => 6,
            OutputTechnology::DJpn => 8,
            OutputTechnology::Sdi => 9,
            OutputTechnology::DisplayPortExternal => 10,
            OutputTechnology::DisplayPortEmbedded => 11,
            OutputTechnology::UdiExternal => 12,
            OutputTechnology::UdiEmbedded => 13,
            OutputTechnology::SdtvDongle => 14,
            OutputTechnology::Miracast => 15,
            OutputTechnology::IndirectWired => 16,
            OutputTechnology::IndirectVirtual => 17,
            OutputTechnology::DisplayPortUsbTunnel => 18,
            OutputTechnology::Internal => 0x8000_0000,
            OutputTechnology::Other(raw) => raw,
        }
    }
}

/// Clockwise rotation applied to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum Rotation {
    #[default]
    Identity = 1,
    Rotate90 = 2,
    Rotate180 = 3,
    Rotate270 = 4,
}

impl Rotation {
    /// Returns `true` for the rotations that turn a landscape panel portrait.
    pub fn is_portrait(self) -> bool {
        matches!(self, Rotation::Rotate90 | Rotation::Rotate270)
    }
}

impl TryFrom<u32> for Rotation {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Rotation::Identity),
            2 => Ok(Rotation::Rotate90),
            3 => Ok(Rotation::Rotate180),
            4 => Ok(Rotation::Rotate270),
            _ => Err(()),
        }
    }
}

/// How a source image is fitted onto a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum Scaling {
    Identity = 1,
    Centered = 2,
    Stretched = 3,
    AspectRatioCenteredMax = 4,
    Custom = 5,
    #[default]
    Preferred = 128,
}

impl TryFrom<u32> for Scaling {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Scaling::Identity),
            2 => Ok(Scaling::Centered),
            3 => Ok(Scaling::Stretched),
            4 => Ok(Scaling::AspectRatioCenteredMax),
            5 => Ok(Scaling::Custom),
            128 => Ok(Scaling::Preferred),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum ScanlineOrdering {
    #[default]
    Unspecified = 0,
    Progressive = 1,
    Interlaced = 2,
    InterlacedLowerFieldFirst = 3,
}

impl From<u32> for ScanlineOrdering {
    fn from(value: u32) -> Self {
        match value {
            1 => ScanlineOrdering::Progressive,
            2 => ScanlineOrdering::Interlaced,
            3 => ScanlineOrdering::InterlacedLowerFieldFirst,
            _ => ScanlineOrdering::Unspecified,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum PixelFormat {
    Bpp8 = 1,
    Bpp16 = 2,
    Bpp24 = 3,
    #[default]
    Bpp32 = 4,
    NonGdi = 5,
}

impl TryFrom<u32> for PixelFormat {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PixelFormat::Bpp8),
            2 => Ok(PixelFormat::Bpp16),
            3 => Ok(PixelFormat::Bpp24),
            4 => Ok(PixelFormat::Bpp32),
            5 => Ok(PixelFormat::NonGdi),
            _ => Err(()),
        }
    }
}

/// Path status bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PathFlags(pub u32);

impl PathFlags {
    pub const ACTIVE: u32 = 0x0000_0001;
    pub const SUPPORT_VIRTUAL_MODE: u32 = 0x0000_0008;

    pub fn is_active(&self) -> bool {
        self.0 & Self::ACTIVE != 0
    }

    pub fn set_active(&mut self, active: bool) {
        if active {
            self.0 |= Self::ACTIVE;
        } else {
            self.0 &= !Self::ACTIVE;
        }
    }
}

/// Source end of a path: which GPU output feeds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSourceInfo {
    pub adapter_id: AdapterId,
    /// Per-adapter source number.
    pub id: u32,
    pub mode_idx: Option<ModeIndex>,
    pub clone_group_id: Option<u32>,
    pub status_flags: u32,
}

/// Target end of a path: the monitor connection and how it is driven.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathTargetInfo {
    pub adapter_id: AdapterId,
    pub id: u32,
    pub mode_idx: Option<ModeIndex>,
    pub desktop_mode_idx: Option<ModeIndex>,
    pub output_technology: OutputTechnology,
    pub rotation: Rotation,
    pub scaling: Scaling,
    pub refresh_rate: Rational,
    pub scanline_ordering: ScanlineOrdering,
    /// Whether a monitor is connected and can be driven.
    pub available: bool,
    pub status_flags: u32,
}

/// One potential source→target connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathInfo {
    pub source: PathSourceInfo,
    pub target: PathTargetInfo,
    pub flags: PathFlags,
}

impl PathInfo {
    pub fn is_active(&self) -> bool {
        self.flags.is_active()
    }

    pub fn physical_target(&self) -> PhysicalTarget {
        PhysicalTarget { adapter_id: self.target.adapter_id, target_id: self.target.id }
    }

    /// Clears every mode link and the active bit.
    pub fn deactivate(&mut self) {
        self.flags.set_active(false);
        self.clear_mode_links();
    }

    pub fn clear_mode_links(&mut self) {
        self.source.mode_idx = None;
        self.target.mode_idx = None;
        self.target.desktop_mode_idx = None;
    }
}

/// Source mode: desktop geometry of a GPU output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMode {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    pub position: Point,
}

impl SourceMode {
    /// The primary display is the one whose desktop starts at the origin.
    pub fn is_primary(&self) -> bool {
        self.position == Point::ORIGIN
    }

    pub fn region(&self) -> Region {
        Region::new(self.position.x, self.position.y, self.width, self.height)
    }
}

/// Timing of the signal sent to a monitor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoSignalInfo {
    pub pixel_rate: u64,
    pub h_sync_freq: Rational,
    pub v_sync_freq: Rational,
    pub active_size: Size,
    pub total_size: Size,
    pub video_standard: u32,
    pub scanline_ordering: ScanlineOrdering,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMode {
    pub signal: VideoSignalInfo,
}

/// Visible sub-region of a source shown on one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopImageInfo {
    pub path_source_size: Point,
    pub image_region: Region,
    pub image_clip: Region,
}

/// The three mode record variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeKind {
    Source(SourceMode),
    Target(TargetMode),
    DesktopImage(DesktopImageInfo),
}

impl ModeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModeKind::Source(_) => "source",
            ModeKind::Target(_) => "target",
            ModeKind::DesktopImage(_) => "desktop-image",
        }
    }
}

/// One entry of the mode array.
///
/// `id` is the source id for source modes and the target id for the other
/// two variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeInfo {
    pub adapter_id: AdapterId,
    pub id: u32,
    pub kind: ModeKind,
}
