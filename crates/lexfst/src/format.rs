// Compiled FST footer: layout, serialization and validation.

use bytemuck::{Pod, Zeroable};

use crate::FstError;

/// Footer magic number (little-endian).
pub const MAGIC: u32 = 0x4C58_4653;

/// Current (and only) supported format version.
pub const VERSION: u32 = 1;

/// Size of the footer in bytes.
pub const FOOTER_SIZE: usize = size_of::<Footer>();

/// Trailing metadata of a compiled FST.
///
/// The footer occupies the last 32 bytes of the data, all fields stored
/// little-endian:
/// - bytes 0..4: magic number
/// - bytes 4..8: format version
/// - bytes 8..12: output width in bytes (0..=8)
/// - bytes 12..16: reserved (zero)
/// - bytes 16..24: number of keys
/// - bytes 24..32: address of the root node
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct Footer {
    pub magic: u32,
    pub version: u32,
    pub output_width: u32,
    pub reserved: u32,
    pub key_count: u64,
    pub root_addr: u64,
}

const _: () = assert!(size_of::<Footer>() == 32);

impl Footer {
    pub fn new(output_width: u8, key_count: u64, root_addr: u64) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            output_width: u32::from(output_width),
            reserved: 0,
            key_count,
            root_addr,
        }
    }

    /// Serialize to the on-disk (little-endian) representation.
    pub fn to_bytes(&self) -> [u8; FOOTER_SIZE] {
        let le = Footer {
            magic: self.magic.to_le(),
            version: self.version.to_le(),
            output_width: self.output_width.to_le(),
            reserved: self.reserved.to_le(),
            key_count: self.key_count.to_le(),
            root_addr: self.root_addr.to_le(),
        };
        bytemuck::cast(le)
    }

    /// Width of every output field, in bytes.
    pub fn output_width(&self) -> u8 {
        self.output_width as u8
    }
}

/// Parses and validates the footer at the end of `data`.
///
/// Checks the magic number, the version, the output width and that the root
/// address falls inside the node region. Decoding the root node itself is
/// left to the caller.
pub fn parse_footer(data: &[u8]) -> Result<Footer, FstError> {
    if data.len() < FOOTER_SIZE {
        return Err(FstError::TooShort {
            expected: FOOTER_SIZE,
            actual: data.len(),
        });
    }

    let raw: Footer = bytemuck::pod_read_unaligned(&data[data.len() - FOOTER_SIZE..]);
    let footer = Footer {
        magic: u32::from_le(raw.magic),
        version: u32::from_le(raw.version),
        output_width: u32::from_le(raw.output_width),
        reserved: u32::from_le(raw.reserved),
        key_count: u64::from_le(raw.key_count),
        root_addr: u64::from_le(raw.root_addr),
    };

    if footer.magic != MAGIC {
        return Err(FstError::InvalidMagic);
    }
    if footer.version != VERSION {
        return Err(FstError::UnsupportedVersion {
            found: footer.version,
            supported: VERSION,
        });
    }
    if footer.output_width > 8 {
        return Err(FstError::CorruptFormat(format!(
            "output width {} exceeds 8 bytes",
            footer.output_width
        )));
    }
    let node_region = (data.len() - FOOTER_SIZE) as u64;
    if footer.root_addr >= node_region {
        return Err(FstError::CorruptFormat(format!(
            "root address {} outside node region of {} bytes",
            footer.root_addr, node_region
        )));
    }

    Ok(footer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_data(footer: Footer) -> Vec<u8> {
        let mut data = vec![0u8; 8];
        data.extend_from_slice(&footer.to_bytes());
        data
    }

    #[test]
    fn parse_valid_footer() {
        let data = make_data(Footer::new(4, 17, 6));
        let footer = parse_footer(&data).unwrap();
        assert_eq!(footer.output_width(), 4);
        assert_eq!(footer.key_count, 17);
        assert_eq!(footer.root_addr, 6);
    }

    #[test]
    fn footer_bytes_are_little_endian() {
        let bytes = Footer::new(8, 0x0102, 3).to_bytes();
        assert_eq!(&bytes[..4], &MAGIC.to_le_bytes());
        assert_eq!(&bytes[4..8], &[1, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[8, 0, 0, 0]);
        assert_eq!(&bytes[16..18], &[0x02, 0x01]);
        assert_eq!(bytes[24], 3);
    }

    #[test]
    fn reject_too_short() {
        let data = [0u8; 8];
        let err = parse_footer(&data).unwrap_err();
        assert!(matches!(
            err,
            FstError::TooShort {
                expected: 32,
                actual: 8
            }
        ));
    }

    #[test]
    fn reject_invalid_magic() {
        let mut data = make_data(Footer::new(8, 0, 0));
        let at = data.len() - FOOTER_SIZE;
        data[at] ^= 0xFF;
        let err = parse_footer(&data).unwrap_err();
        assert!(matches!(err, FstError::InvalidMagic));
    }

    #[test]
    fn reject_unknown_version() {
        let mut footer = Footer::new(8, 0, 0);
        footer.version = 7;
        let err = parse_footer(&make_data(footer)).unwrap_err();
        assert!(matches!(
            err,
            FstError::UnsupportedVersion {
                found: 7,
                supported: 1
            }
        ));
    }

    #[test]
    fn reject_wide_outputs() {
        let mut footer = Footer::new(8, 0, 0);
        footer.output_width = 9;
        let err = parse_footer(&make_data(footer)).unwrap_err();
        assert!(matches!(err, FstError::CorruptFormat(_)));
    }

    #[test]
    fn reject_root_past_nodes() {
        let err = parse_footer(&make_data(Footer::new(8, 1, 8))).unwrap_err();
        assert!(matches!(err, FstError::CorruptFormat(_)));
    }

    #[test]
    fn footer_without_nodes_is_rejected() {
        let data = Footer::new(8, 0, 0).to_bytes();
        assert!(parse_footer(&data).is_err());
    }
}
