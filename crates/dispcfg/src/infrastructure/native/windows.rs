//! Windows CCD binding.
//!
//! Translates between the `DISPLAYCONFIG_*` structures and the
//! `dispcfg_core` records.  Paths flagged `DISPLAYCONFIG_PATH_SUPPORT_VIRTUAL_MODE`
//! carry their mode links in the virtual-mode-aware layout: two 16-bit
//! fields packed into the 32-bit index, with `0xFFFF` as the invalid value.
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls and
//! union reads.  All `unsafe` blocks are annotated with `// SAFETY:` comments.

use dispcfg_core::{
    AdapterId, DesktopImageInfo, ModeIndex, ModeInfo, ModeKind, OutputTechnology, PathFlags,
    PathInfo, PathSourceInfo, PathTargetInfo, PixelFormat, Point, Rational, Region, Rotation,
    Scaling, ScanlineOrdering, Size, SourceMode, TargetDeviceName, TargetMode, TopologyError,
    VideoSignalInfo,
};
use tracing::debug;
use windows::Win32::Devices::Display::{
    DisplayConfigGetDeviceInfo, GetDisplayConfigBufferSizes, QueryDisplayConfig,
    SetDisplayConfig, DISPLAYCONFIG_2DREGION, DISPLAYCONFIG_ADAPTER_NAME,
    DISPLAYCONFIG_DESKTOP_IMAGE_INFO, DISPLAYCONFIG_DEVICE_INFO_GET_ADAPTER_NAME,
    DISPLAYCONFIG_DEVICE_INFO_GET_TARGET_NAME, DISPLAYCONFIG_DEVICE_INFO_GET_TARGET_PREFERRED_MODE,
    DISPLAYCONFIG_DEVICE_INFO_HEADER, DISPLAYCONFIG_DEVICE_INFO_TYPE, DISPLAYCONFIG_MODE_INFO,
    DISPLAYCONFIG_MODE_INFO_0, DISPLAYCONFIG_MODE_INFO_TYPE, DISPLAYCONFIG_MODE_INFO_TYPE_DESKTOP_IMAGE,
    DISPLAYCONFIG_MODE_INFO_TYPE_SOURCE, DISPLAYCONFIG_MODE_INFO_TYPE_TARGET,
    DISPLAYCONFIG_PATH_INFO, DISPLAYCONFIG_PATH_SOURCE_INFO, DISPLAYCONFIG_PATH_TARGET_INFO,
    DISPLAYCONFIG_PIXELFORMAT, DISPLAYCONFIG_RATIONAL, DISPLAYCONFIG_ROTATION,
    DISPLAYCONFIG_SCALING, DISPLAYCONFIG_SCANLINE_ORDERING, DISPLAYCONFIG_SOURCE_MODE,
    DISPLAYCONFIG_TARGET_DEVICE_NAME, DISPLAYCONFIG_TARGET_MODE,
    DISPLAYCONFIG_TARGET_PREFERRED_MODE, DISPLAYCONFIG_VIDEO_OUTPUT_TECHNOLOGY,
    DISPLAYCONFIG_VIDEO_SIGNAL_INFO, DISPLAYCONFIG_VIDEO_SIGNAL_INFO_0,
    QUERY_DISPLAY_CONFIG_FLAGS, SET_DISPLAY_CONFIG_FLAGS,
};
use windows::Win32::Foundation::{LUID, POINTL, RECTL};

use crate::application::boundary::{
    ApplyFlags, BufferSizes, DisplayConfigApi, PreferredMode, QueriedConfig, QueryFlags,
    ERROR_NOT_SUPPORTED, ERROR_SUCCESS,
};

const INVALID_INDEX: u32 = 0xFFFF_FFFF;
const INVALID_PACKED: u32 = 0xFFFF;

/// [`DisplayConfigApi`] backed by `user32.dll`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsDisplayConfigApi;

impl WindowsDisplayConfigApi {
    pub fn new() -> Self {
        Self
    }
}

impl DisplayConfigApi for WindowsDisplayConfigApi {
    fn query_sizes(&self, flags: QueryFlags) -> Result<BufferSizes, TopologyError> {
        let mut paths = 0u32;
        let mut modes = 0u32;
        // SAFETY: Both out-pointers refer to live, writable locals.
        let status = unsafe {
            GetDisplayConfigBufferSizes(QUERY_DISPLAY_CONFIG_FLAGS(flags.0), &mut paths, &mut modes)
        };
        check("GetDisplayConfigBufferSizes", status.0 as i32)?;
        Ok(BufferSizes { paths, modes })
    }

    fn query_config(
        &self,
        flags: QueryFlags,
        sizes: BufferSizes,
    ) -> Result<QueriedConfig, TopologyError> {
        let mut path_count = sizes.paths;
        let mut mode_count = sizes.modes;
        let mut raw_paths = vec![DISPLAYCONFIG_PATH_INFO::default(); path_count as usize];
        let mut raw_modes = vec![DISPLAYCONFIG_MODE_INFO::default(); mode_count as usize];

        // SAFETY: The arrays hold exactly `path_count` and `mode_count`
        // elements; the service writes at most that many and updates the
        // counts.  No topology id is requested, so that pointer is absent.
        let status = unsafe {
            QueryDisplayConfig(
                QUERY_DISPLAY_CONFIG_FLAGS(flags.0),
                &mut path_count,
                raw_paths.as_mut_ptr(),
                &mut mode_count,
                raw_modes.as_mut_ptr(),
                None,
            )
        };
        check("QueryDisplayConfig", status.0 as i32)?;
        raw_paths.truncate(path_count as usize);
        raw_modes.truncate(mode_count as usize);

        let modes = raw_modes.iter().map(mode_from_raw).collect::<Result<Vec<_>, _>>()?;
        let paths = raw_paths.iter().map(path_from_raw).collect();
        Ok(QueriedConfig { paths, modes })
    }

    fn apply_config(
        &self,
        paths: &[PathInfo],
        modes: Option<Vec<ModeInfo>>,
        flags: ApplyFlags,
    ) -> Result<(), TopologyError> {
        let raw_paths: Vec<DISPLAYCONFIG_PATH_INFO> = paths.iter().map(path_to_raw).collect();
        let raw_modes: Option<Vec<DISPLAYCONFIG_MODE_INFO>> =
            modes.map(|modes| modes.iter().map(mode_to_raw).collect());
        debug!(paths = raw_paths.len(), %flags, "SetDisplayConfig");

        // SAFETY: Both slices outlive the call and contain fully initialised
        // structures.
        let status = unsafe {
            SetDisplayConfig(
                Some(&raw_paths),
                raw_modes.as_deref(),
                SET_DISPLAY_CONFIG_FLAGS(flags.0),
            )
        };
        check("SetDisplayConfig", status)
    }

    fn preferred_mode(
        &self,
        adapter_id: AdapterId,
        target_id: u32,
    ) -> Result<PreferredMode, TopologyError> {
        let mut request = DISPLAYCONFIG_TARGET_PREFERRED_MODE {
            header: header::<DISPLAYCONFIG_TARGET_PREFERRED_MODE>(
                DISPLAYCONFIG_DEVICE_INFO_GET_TARGET_PREFERRED_MODE,
                adapter_id,
                target_id,
            ),
            ..Default::default()
        };
        // SAFETY: `header` is the first field of the request and its `size`
        // matches the full structure.
        let status = unsafe { DisplayConfigGetDeviceInfo(&mut request.header) };
        check("DisplayConfigGetDeviceInfo", status)?;
        Ok(PreferredMode {
            width: request.width,
            height: request.height,
            target_mode: target_mode_from_raw(&request.targetMode),
        })
    }

    fn target_device_name(
        &self,
        adapter_id: AdapterId,
        target_id: u32,
    ) -> Result<TargetDeviceName, TopologyError> {
        let mut request = DISPLAYCONFIG_TARGET_DEVICE_NAME {
            header: header::<DISPLAYCONFIG_TARGET_DEVICE_NAME>(
                DISPLAYCONFIG_DEVICE_INFO_GET_TARGET_NAME,
                adapter_id,
                target_id,
            ),
            ..Default::default()
        };
        // SAFETY: See `preferred_mode`.
        let status = unsafe { DisplayConfigGetDeviceInfo(&mut request.header) };
        check("DisplayConfigGetDeviceInfo", status)?;
        Ok(TargetDeviceName {
            monitor_friendly_name: wide_to_string(&request.monitorFriendlyDeviceName),
            monitor_device_path: wide_to_string(&request.monitorDevicePath),
            output_technology: OutputTechnology::from(request.outputTechnology.0 as u32),
            connector_instance: request.connectorInstance,
        })
    }

    fn adapter_name(&self, adapter_id: AdapterId) -> Result<String, TopologyError> {
        let mut request = DISPLAYCONFIG_ADAPTER_NAME {
            header: header::<DISPLAYCONFIG_ADAPTER_NAME>(
                DISPLAYCONFIG_DEVICE_INFO_GET_ADAPTER_NAME,
                adapter_id,
                0,
            ),
            ..Default::default()
        };
        // SAFETY: See `preferred_mode`.
        let status = unsafe { DisplayConfigGetDeviceInfo(&mut request.header) };
        check("DisplayConfigGetDeviceInfo", status)?;
        Ok(wide_to_string(&request.adapterDevicePath))
    }
}

fn check(operation: &'static str, status: i32) -> Result<(), TopologyError> {
    if status == ERROR_SUCCESS {
        Ok(())
    } else {
        Err(TopologyError::NativeApi { operation, code: status })
    }
}

fn header<T>(
    kind: DISPLAYCONFIG_DEVICE_INFO_TYPE,
    adapter_id: AdapterId,
    id: u32,
) -> DISPLAYCONFIG_DEVICE_INFO_HEADER {
    DISPLAYCONFIG_DEVICE_INFO_HEADER {
        r#type: kind,
        size: std::mem::size_of::<T>() as u32,
        adapterId: luid(adapter_id),
        id,
    }
}

fn wide_to_string(buffer: &[u16]) -> String {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..len])
}

fn luid(adapter_id: AdapterId) -> LUID {
    LUID { LowPart: adapter_id.low_part, HighPart: adapter_id.high_part }
}

fn adapter(luid: LUID) -> AdapterId {
    AdapterId::new(luid.LowPart, luid.HighPart)
}

// ── Index packing ─────────────────────────────────────────────────────────────

/// Splits a virtual-mode-aware field into its (low, high) halves.
fn unpack(raw: u32) -> (Option<u32>, Option<u32>) {
    let half = |v: u32| (v != INVALID_PACKED).then_some(v);
    (half(raw & 0xFFFF), half(raw >> 16))
}

fn pack(low: Option<u32>, high: Option<u32>) -> u32 {
    let half = |v: Option<u32>| v.map_or(INVALID_PACKED, |v| v & 0xFFFF);
    half(low) | (half(high) << 16)
}

fn plain_index(raw: u32) -> Option<ModeIndex> {
    (raw != INVALID_INDEX).then_some(raw as ModeIndex)
}

fn plain_raw(index: Option<ModeIndex>) -> u32 {
    index.map_or(INVALID_INDEX, |i| i as u32)
}

// ── Paths ─────────────────────────────────────────────────────────────────────

fn path_from_raw(raw: &DISPLAYCONFIG_PATH_INFO) -> PathInfo {
    let flags = PathFlags(raw.flags);
    let virtual_aware = raw.flags & PathFlags::SUPPORT_VIRTUAL_MODE != 0;
    // SAFETY: Both union variants are a plain `u32` view of the same field.
    let source_raw = unsafe { raw.sourceInfo.Anonymous.modeInfoIdx };
    // SAFETY: As above.
    let target_raw = unsafe { raw.targetInfo.Anonymous.modeInfoIdx };

    let (source_mode, clone_group, target_mode, desktop_mode) = if virtual_aware {
        let (clone_group, source_mode) = unpack(source_raw);
        let (desktop_mode, target_mode) = unpack(target_raw);
        (
            source_mode.map(|i| i as ModeIndex),
            clone_group,
            target_mode.map(|i| i as ModeIndex),
            desktop_mode.map(|i| i as ModeIndex),
        )
    } else {
        (plain_index(source_raw), None, plain_index(target_raw), None)
    };

    let target = &raw.targetInfo;
    PathInfo {
        source: PathSourceInfo {
            adapter_id: adapter(raw.sourceInfo.adapterId),
            id: raw.sourceInfo.id,
            mode_idx: source_mode,
            clone_group_id: clone_group,
            status_flags: raw.sourceInfo.statusFlags,
        },
        target: PathTargetInfo {
            adapter_id: adapter(target.adapterId),
            id: target.id,
            mode_idx: target_mode,
            desktop_mode_idx: desktop_mode,
            output_technology: OutputTechnology::from(target.outputTechnology.0 as u32),
            rotation: Rotation::try_from(target.rotation.0 as u32).unwrap_or_default(),
            scaling: Scaling::try_from(target.scaling.0 as u32).unwrap_or_default(),
            refresh_rate: rational(target.refreshRate),
            scanline_ordering: ScanlineOrdering::from(target.scanLineOrdering.0 as u32),
            available: target.targetAvailable.as_bool(),
            status_flags: target.statusFlags,
        },
        flags,
    }
}

fn path_to_raw(path: &PathInfo) -> DISPLAYCONFIG_PATH_INFO {
    let virtual_aware = path.flags.0 & PathFlags::SUPPORT_VIRTUAL_MODE != 0;
    let (source_raw, target_raw) = if virtual_aware {
        let as_u32 = |i: Option<ModeIndex>| i.map(|i| i as u32);
        (
            pack(path.source.clone_group_id, as_u32(path.source.mode_idx)),
            pack(as_u32(path.target.desktop_mode_idx), as_u32(path.target.mode_idx)),
        )
    } else {
        (plain_raw(path.source.mode_idx), plain_raw(path.target.mode_idx))
    };

    let mut source = DISPLAYCONFIG_PATH_SOURCE_INFO {
        adapterId: luid(path.source.adapter_id),
        id: path.source.id,
        statusFlags: path.source.status_flags,
        ..Default::default()
    };
    source.Anonymous.modeInfoIdx = source_raw;

    let mut target = DISPLAYCONFIG_PATH_TARGET_INFO {
        adapterId: luid(path.target.adapter_id),
        id: path.target.id,
        outputTechnology: DISPLAYCONFIG_VIDEO_OUTPUT_TECHNOLOGY(
            u32::from(path.target.output_technology) as i32,
        ),
        rotation: DISPLAYCONFIG_ROTATION(path.target.rotation as i32),
        scaling: DISPLAYCONFIG_SCALING(path.target.scaling as i32),
        refreshRate: raw_rational(path.target.refresh_rate),
        scanLineOrdering: DISPLAYCONFIG_SCANLINE_ORDERING(path.target.scanline_ordering as i32),
        targetAvailable: path.target.available.into(),
        statusFlags: path.target.status_flags,
        ..Default::default()
    };
    target.Anonymous.modeInfoIdx = target_raw;

    DISPLAYCONFIG_PATH_INFO { sourceInfo: source, targetInfo: target, flags: path.flags.0 }
}

// ── Modes ─────────────────────────────────────────────────────────────────────

fn mode_from_raw(raw: &DISPLAYCONFIG_MODE_INFO) -> Result<ModeInfo, TopologyError> {
    let kind = match raw.infoType {
        DISPLAYCONFIG_MODE_INFO_TYPE_SOURCE => {
            // SAFETY: `infoType` selects the `sourceMode` variant.
            let mode = unsafe { raw.Anonymous.sourceMode };
            ModeKind::Source(SourceMode {
                width: mode.width,
                height: mode.height,
                pixel_format: PixelFormat::try_from(mode.pixelFormat.0 as u32).unwrap_or_default(),
                position: Point::new(mode.position.x, mode.position.y),
            })
        }
        DISPLAYCONFIG_MODE_INFO_TYPE_TARGET => {
            // SAFETY: `infoType` selects the `targetMode` variant.
            let mode = unsafe { raw.Anonymous.targetMode };
            ModeKind::Target(target_mode_from_raw(&mode))
        }
        DISPLAYCONFIG_MODE_INFO_TYPE_DESKTOP_IMAGE => {
            // SAFETY: `infoType` selects the `desktopImageInfo` variant.
            let info = unsafe { raw.Anonymous.desktopImageInfo };
            ModeKind::DesktopImage(DesktopImageInfo {
                path_source_size: Point::new(info.PathSourceSize.x, info.PathSourceSize.y),
                image_region: region(info.DesktopImageRegion),
                image_clip: region(info.DesktopImageClip),
            })
        }
        DISPLAYCONFIG_MODE_INFO_TYPE(other) => {
            debug!(info_type = other, "unknown mode record type");
            return Err(TopologyError::NativeApi {
                operation: "QueryDisplayConfig",
                code: ERROR_NOT_SUPPORTED,
            });
        }
    };
    Ok(ModeInfo { adapter_id: adapter(raw.adapterId), id: raw.id, kind })
}

fn mode_to_raw(mode: &ModeInfo) -> DISPLAYCONFIG_MODE_INFO {
    let (info_type, body) = match &mode.kind {
        ModeKind::Source(source) => (
            DISPLAYCONFIG_MODE_INFO_TYPE_SOURCE,
            DISPLAYCONFIG_MODE_INFO_0 {
                sourceMode: DISPLAYCONFIG_SOURCE_MODE {
                    width: source.width,
                    height: source.height,
                    pixelFormat: DISPLAYCONFIG_PIXELFORMAT(source.pixel_format as i32),
                    position: POINTL { x: source.position.x, y: source.position.y },
                },
            },
        ),
        ModeKind::Target(target) => (
            DISPLAYCONFIG_MODE_INFO_TYPE_TARGET,
            DISPLAYCONFIG_MODE_INFO_0 { targetMode: target_mode_to_raw(target) },
        ),
        ModeKind::DesktopImage(info) => (
            DISPLAYCONFIG_MODE_INFO_TYPE_DESKTOP_IMAGE,
            DISPLAYCONFIG_MODE_INFO_0 {
                desktopImageInfo: DISPLAYCONFIG_DESKTOP_IMAGE_INFO {
                    PathSourceSize: POINTL { x: info.path_source_size.x, y: info.path_source_size.y },
                    DesktopImageRegion: rectl(info.image_region),
                    DesktopImageClip: rectl(info.image_clip),
                },
            },
        ),
    };
    DISPLAYCONFIG_MODE_INFO {
        infoType: info_type,
        id: mode.id,
        adapterId: luid(mode.adapter_id),
        Anonymous: body,
    }
}

fn target_mode_from_raw(raw: &DISPLAYCONFIG_TARGET_MODE) -> TargetMode {
    let signal = &raw.targetVideoSignalInfo;
    // SAFETY: Both union variants are a plain `u32` view of the same field.
    let video_standard = unsafe { signal.Anonymous.videoStandard };
    TargetMode {
        signal: VideoSignalInfo {
            pixel_rate: signal.pixelRate,
            h_sync_freq: rational(signal.hSyncFreq),
            v_sync_freq: rational(signal.vSyncFreq),
            active_size: Size::new(signal.activeSize.cx, signal.activeSize.cy),
            total_size: Size::new(signal.totalSize.cx, signal.totalSize.cy),
            video_standard,
            scanline_ordering: ScanlineOrdering::from(signal.scanLineOrdering.0 as u32),
        },
    }
}

fn target_mode_to_raw(mode: &TargetMode) -> DISPLAYCONFIG_TARGET_MODE {
    let signal = &mode.signal;
    DISPLAYCONFIG_TARGET_MODE {
        targetVideoSignalInfo: DISPLAYCONFIG_VIDEO_SIGNAL_INFO {
            pixelRate: signal.pixel_rate,
            hSyncFreq: raw_rational(signal.h_sync_freq),
            vSyncFreq: raw_rational(signal.v_sync_freq),
            activeSize: DISPLAYCONFIG_2DREGION {
                cx: signal.active_size.width,
                cy: signal.active_size.height,
            },
            totalSize: DISPLAYCONFIG_2DREGION {
                cx: signal.total_size.width,
                cy: signal.total_size.height,
            },
            Anonymous: DISPLAYCONFIG_VIDEO_SIGNAL_INFO_0 { videoStandard: signal.video_standard },
            scanLineOrdering: DISPLAYCONFIG_SCANLINE_ORDERING(signal.scanline_ordering as i32),
        },
    }
}

fn rational(raw: DISPLAYCONFIG_RATIONAL) -> Rational {
    Rational::new(raw.Numerator, raw.Denominator)
}

fn raw_rational(value: Rational) -> DISPLAYCONFIG_RATIONAL {
    DISPLAYCONFIG_RATIONAL { Numerator: value.numerator, Denominator: value.denominator }
}

fn region(rect: RECTL) -> Region {
    Region::new(
        rect.left,
        rect.top,
        (rect.right - rect.left).max(0) as u32,
        (rect.bottom - rect.top).max(0) as u32,
    )
}

fn rectl(region: Region) -> RECTL {
    RECTL { left: region.x, top: region.y, right: region.right(), bottom: region.bottom() }
}
