/// Unix/OS-9 compatibility fields trailing a level-0 header's extended area.
///
/// Old-style LHA archivers append this area after the filename/CRC when the
/// generation byte at offset `0` names a system that records permissions and
/// ownership; byte `0` itself and the timestamp at `1..5` are already exposed
/// through [`crate::header::LhaHeader::parse_last_modified`]. The remaining
/// bytes hold numeric permission/ownership fields at the same offsets in both
/// variants; the length of the area (12 vs 22 bytes) is what distinguishes
/// them, with OS-9 carrying additional system-specific bytes this crate does
/// not further interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Level0Compat {
    /// 12-byte Unix compatibility area.
    Unix {
        /// Unix file mode bits, at offset `5..7`.
        perms: u16,
        /// Numeric owner ID, at offset `7..9`.
        uid: u16,
        /// Numeric group ID, at offset `9..11`.
        gid: u16,
    },
    /// 22-byte OS-9 compatibility area.
    Os9 {
        /// Permission bits, at offset `5..7`.
        perms: u16,
        /// Numeric owner ID, at offset `7..9`.
        owner: u16,
        /// Numeric group ID, at offset `9..11`.
        group: u16,
    },
}

fn read_u16_at(data: &[u8], offset: usize) -> Option<u16> {
    data.get(offset..offset + 2)
        .map(|s| u16::from_le_bytes([s[0], s[1]]))
}

impl Level0Compat {
    /// Parses a level-0 header's trailing extended area, if its length matches
    /// one of the recognized Unix/OS-9 compatibility area sizes.
    pub(crate) fn parse(extended_area: &[u8]) -> Option<Self> {
        match extended_area.len() {
            12 => Some(Level0Compat::Unix {
                perms: read_u16_at(extended_area, 5)?,
                uid: read_u16_at(extended_area, 7)?,
                gid: read_u16_at(extended_area, 9)?,
            }),
            22 => Some(Level0Compat::Os9 {
                perms: read_u16_at(extended_area, 5)?,
                owner: read_u16_at(extended_area, 7)?,
                group: read_u16_at(extended_area, 9)?,
            }),
            _ => None
        }
    }
}
