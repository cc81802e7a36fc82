/// Partition enumeration.
///
/// Lists mounted filesystems backed by a real device, dropping pseudo
/// filesystems (proc, sysfs, tmpfs, cgroup, ...). On Linux the mount table
/// comes from `/proc/self/mounts` and "physical" means the filesystem type is
/// not flagged `nodev` in `/proc/filesystems`. On Windows the drive roots
/// come from `GetLogicalDriveStringsW`.
use crate::error::{ProbeError, Result};
use serde::Serialize;
use tracing::debug;

/// A mounted filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    /// Backing device, e.g. "/dev/sda1" or "C:\".
    pub device: String,
    /// Mount point, e.g. "/boot".
    pub mountpoint: String,
    /// Filesystem type, e.g. "ext4", "NTFS".
    pub fstype: String,
    /// Comma separated mount options.
    pub opts: String,
}

/// List physical partitions, skipping any whose mount point contains one
/// of the `ignore` substrings.
pub fn list_partitions<S: AsRef<str>>(ignore: &[S]) -> Result<Vec<Partition>> {
    let all = physical_partitions()?;
    Ok(filter_partitions(all, ignore))
}

/// Drop partitions whose mount point contains any of `ignore`.
///
/// Empty strings are removed first: `""` is a substring of every mount
/// point and would otherwise hide all partitions.
pub fn filter_partitions<S: AsRef<str>>(partitions: Vec<Partition>, ignore: &[S]) -> Vec<Partition> {
    let ignore: Vec<&str> = ignore
        .iter()
        .map(|s| s.as_ref())
        .filter(|s| !s.is_empty())
        .collect();

    partitions
        .into_iter()
        .filter(|part| {
            let hit = ignore.iter().any(|item| part.mountpoint.contains(item));
            if hit {
                debug!("Ignoring partition {}", part.mountpoint);
            }
            !hit
        })
        .collect()
}

#[cfg(target_os = "linux")]
fn physical_partitions() -> Result<Vec<Partition>> {
    const FILESYSTEMS: &str = "/proc/filesystems";
    const MOUNTS: &str = "/proc/self/mounts";

    let read = |path: &str| {
        std::fs::read_to_string(path).map_err(|err| ProbeError::MountTable {
            path: path.to_string(),
            reason: crate::error::os_reason(&err),
        })
    };

    let fstypes = linux::parse_filesystems(&read(FILESYSTEMS)?);
    Ok(linux::physical_only(linux::parse_mounts(&read(MOUNTS)?), &fstypes))
}

#[cfg(windows)]
fn physical_partitions() -> Result<Vec<Partition>> {
    Ok(windows_drives::enumerate())
}

#[cfg(not(any(target_os = "linux", windows)))]
fn physical_partitions() -> Result<Vec<Partition>> {
    Err(ProbeError::Unsupported("partition listing"))
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
mod linux {
    use super::Partition;
    use std::collections::HashSet;

    /// Filesystem types that are backed by a device.
    ///
    /// Lines look like `nodev\tsysfs` or `\text4`. ZFS is listed as `nodev`
    /// but its datasets are real storage, so it is kept.
    pub(super) fn parse_filesystems(content: &str) -> HashSet<String> {
        let mut types = HashSet::new();
        for line in content.lines() {
            let line = line.trim_end();
            if line.starts_with("nodev") {
                if let Some(fstype) = line.split_whitespace().nth(1) {
                    if fstype == "zfs" {
                        types.insert(fstype.to_string());
                    }
                }
            } else if let Some(fstype) = line.split_whitespace().next() {
                types.insert(fstype.to_string());
            }
        }
        types
    }

    /// Keep mounts with a real device whose type is in `fstypes`. A device
    /// of `none` counts as no device.
    pub(super) fn physical_only(mounts: Vec<Partition>, fstypes: &HashSet<String>) -> Vec<Partition> {
        mounts
            .into_iter()
            .filter(|part| {
                !part.device.is_empty() && part.device != "none" && fstypes.contains(&part.fstype)
            })
            .collect()
    }

    /// Parse `/proc/self/mounts` (fstab format). Malformed lines are skipped.
    pub(super) fn parse_mounts(content: &str) -> Vec<Partition> {
        content
            .lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let device = fields.next()?;
                let mountpoint = fields.next()?;
                let fstype = fields.next()?;
                let opts = fields.next().unwrap_or_default();
                Some(Partition {
                    device: unescape(device),
                    mountpoint: unescape(mountpoint),
                    fstype: fstype.to_string(),
                    opts: opts.to_string(),
                })
            })
            .collect()
    }

    /// Decode the kernel's octal escapes (`\040` for space, `\011` tab,
    /// `\012` newline, `\134` backslash).
    pub(super) fn unescape(field: &str) -> String {
        if !field.contains('\\') {
            return field.to_string();
        }
        let bytes = field.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\\' && i + 3 < bytes.len() && is_octal_escape(&bytes[i + 1..i + 4]) {
                let value = (bytes[i + 1] - b'0') * 64 + (bytes[i + 2] - b'0') * 8 + (bytes[i + 3] - b'0');
                out.push(value);
                i += 4;
            } else {
                out.push(bytes[i]);
                i += 1;
            }
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    fn is_octal_escape(digits: &[u8]) -> bool {
        digits.len() == 3 && digits[0] <= b'3' && digits.iter().all(|d| (b'0'..=b'7').contains(d))
    }
}

#[cfg(windows)]
mod windows_drives {
    use super::Partition;
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;
    use windows::Win32::Storage::FileSystem::{
        GetDriveTypeW, GetLogicalDriveStringsW, GetVolumeInformationW,
    };

    // Drive type constants from the Windows API.
    const DRIVE_REMOVABLE_VAL: u32 = 2;
    const DRIVE_FIXED_VAL: u32 = 3;
    const DRIVE_CDROM_VAL: u32 = 5;

    /// Local drives with readable volume information.
    ///
    /// Network drives are skipped, as are drives whose volume cannot be
    /// queried (an optical or card drive with no media inserted).
    pub(super) fn enumerate() -> Vec<Partition> {
        let mut partitions = Vec::new();

        // GetLogicalDriveStringsW returns null-separated drive root strings.
        let mut buffer = [0u16; 256];
        let len = unsafe { GetLogicalDriveStringsW(Some(&mut buffer)) };
        if len == 0 {
            tracing::warn!("GetLogicalDriveStringsW returned 0");
            return partitions;
        }

        let full = OsString::from_wide(&buffer[..len as usize]);
        let full_str = full.to_string_lossy();

        for root in full_str.split('\0').filter(|s| !s.is_empty()) {
            let root_wide: Vec<u16> = root.encode_utf16().chain(std::iter::once(0)).collect();
            let root_pcwstr = windows::core::PCWSTR(root_wide.as_ptr());

            let opts = match unsafe { GetDriveTypeW(root_pcwstr) } {
                DRIVE_FIXED_VAL => "rw,fixed",
                DRIVE_REMOVABLE_VAL => "rw,removable",
                DRIVE_CDROM_VAL => "ro,cdrom",
                // Network drives and unknown types.
                _ => continue,
            };

            let mut fs_buf = [0u16; 256];
            let has_volume_info = unsafe {
                GetVolumeInformationW(root_pcwstr, None, None, None, None, Some(&mut fs_buf)).is_ok()
            };
            if !has_volume_info {
                tracing::debug!("No volume information for {root}, skipping");
                continue;
            }
            let fstype = String::from_utf16_lossy(
                &fs_buf[..fs_buf.iter().position(|&c| c == 0).unwrap_or(0)],
            );

            partitions.push(Partition {
                device: root.to_string(),
                mountpoint: root.to_string(),
                fstype,
                opts: opts.to_string(),
            });
        }

        partitions
    }
}

#[cfg(test)]
mod tests {
    use super::linux::{parse_filesystems, parse_mounts, physical_only, unescape};
    use super::*;

    const FILESYSTEMS: &str = "nodev\tsysfs\nnodev\ttmpfs\nnodev\tproc\n\text4\n\txfs\n\tvfat\nnodev\tzfs\n";

    const MOUNTS: &str = "\
sysfs /sys sysfs rw,nosuid,nodev,noexec,relatime 0 0
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
/dev/sda2 / ext4 rw,relatime 0 0
/dev/sda1 /boot/efi vfat rw,relatime 0 0
tmpfs /run tmpfs rw,nosuid,nodev 0 0
/dev/sdb1 /mnt/backup\\040disk xfs rw,relatime 0 0
";

    fn part(mountpoint: &str) -> Partition {
        Partition {
            device: "/dev/x".into(),
            mountpoint: mountpoint.into(),
            fstype: "ext4".into(),
            opts: "rw".into(),
        }
    }

    #[test]
    fn filesystems_keep_device_backed_types_and_zfs() {
        let types = parse_filesystems(FILESYSTEMS);
        for t in ["ext4", "xfs", "vfat", "zfs"] {
            assert!(types.contains(t), "expected {t}");
        }
        for t in ["sysfs", "tmpfs", "proc", "nodev"] {
            assert!(!types.contains(t), "unexpected {t}");
        }
    }

    #[test]
    fn mounts_are_parsed_and_unescaped() {
        let mounts = parse_mounts(MOUNTS);
        assert_eq!(mounts.len(), 6);
        assert_eq!(mounts[2].device, "/dev/sda2");
        assert_eq!(mounts[2].mountpoint, "/");
        assert_eq!(mounts[2].fstype, "ext4");
        assert_eq!(mounts[2].opts, "rw,relatime");
        assert_eq!(mounts[5].mountpoint, "/mnt/backup disk");
    }

    #[test]
    fn physical_only_drops_pseudo_types_and_deviceless_mounts() {
        let mut mounts = parse_mounts(MOUNTS);
        mounts.extend(parse_mounts("none /mnt/overlay ext4 rw 0 0\n"));
        let kept = physical_only(mounts, &parse_filesystems(FILESYSTEMS));
        let points: Vec<_> = kept.iter().map(|p| p.mountpoint.as_str()).collect();
        assert_eq!(points, ["/", "/boot/efi", "/mnt/backup disk"]);
    }

    #[test]
    fn unescape_handles_octal_and_plain_text() {
        assert_eq!(unescape("/plain"), "/plain");
        assert_eq!(unescape(r"/a\040b"), "/a b");
        assert_eq!(unescape(r"/back\134slash"), r"/back\slash");
        // Not a complete escape, left as is.
        assert_eq!(unescape(r"/odd\04"), r"/odd\04");
    }

    #[test]
    fn ignore_list_matches_substrings() {
        let parts = vec![part("/"), part("/boot"), part("/var/lib/docker"), part("/snap/core")];
        let kept = filter_partitions(parts, &["docker", "/snap"]);
        let mounts: Vec<_> = kept.iter().map(|p| p.mountpoint.as_str()).collect();
        assert_eq!(mounts, ["/", "/boot"]);
    }

    #[test]
    fn empty_ignore_string_does_not_hide_everything() {
        let parts = vec![part("/"), part("/boot")];
        let none: [&str; 0] = [];
        assert_eq!(
            filter_partitions(parts.clone(), &[""]),
            filter_partitions(parts, &none)
        );
    }

    #[test]
    fn empty_strings_mixed_with_real_entries() {
        let parts = vec![part("/"), part("/boot")];
        let kept = filter_partitions(parts, &["", "boot", ""]);
        assert_eq!(kept, vec![part("/")]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn live_listing_has_no_pseudo_filesystems() {
        // Containers may expose no physical mounts at all; only check what is there.
        let parts = list_partitions::<&str>(&[]).unwrap();
        for p in &parts {
            assert!(!["proc", "sysfs", "tmpfs", "cgroup2"].contains(&p.fstype.as_str()));
        }
    }
}
