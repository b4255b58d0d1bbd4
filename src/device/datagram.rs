//! Real-time datagram framing
//!
//! A serialized frame is split in chunks of at most [MAX_CHUNK_SIZE] bytes. Each chunk is
//! prefixed by a header whose layout depends on the device generation:
//!
//! * v1: `[0x01] + token + [chunk length] + chunk`
//! * v2: `[0x02] + token + [0x00] + chunk`
//! * v3: `[0x03] + token + [0x00, 0x00] + [chunk index] + chunk`

use bytes::{BufMut, Bytes, BytesMut};

use super::response::Version;

/// Largest pixel payload carried by a single datagram
pub const MAX_CHUNK_SIZE: usize = 900;

const LAST_V1_FIRMWARE: Version = Version::new(2, 3, 8);
const LAST_V2_FIRMWARE: Version = Version::new(2, 4, 6);
const UNKNOWN_FIRMWARE: Version = Version::new(0, 0, 0);

/// Real-time protocol revision spoken by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeviceGeneration {
    V1,
    V2,
    V3,
}

impl DeviceGeneration {
    /// Derive the generation from the firmware family and version
    ///
    /// An unknown firmware version compares as `0.0.0`.
    pub fn from_firmware(family: Option<&str>, version: Option<&Version>) -> Self {
        let version = version.copied().unwrap_or(UNKNOWN_FIRMWARE);

        if family == Some("D") && version <= LAST_V1_FIRMWARE {
            Self::V1
        } else if version <= LAST_V2_FIRMWARE {
            Self::V2
        } else {
            Self::V3
        }
    }

    /// Wrap one chunk of pixel data
    ///
    /// # Parameters
    ///
    /// * `token`: decoded session token
    /// * `index`: position of the chunk in the frame, truncated to one byte
    /// * `chunk`: pixel bytes
    pub fn datagram(self, token: &[u8], index: usize, chunk: &[u8]) -> Bytes {
        let mut buf = BytesMut::with_capacity(1 + token.len() + 3 + chunk.len());

        match self {
            Self::V1 => {
                buf.put_u8(0x01);
                buf.put_slice(token);
                // Truncated to one byte
                buf.put_u8(chunk.len() as u8);
            }
            Self::V2 => {
                buf.put_u8(0x02);
                buf.put_slice(token);
                buf.put_u8(0x00);
            }
            Self::V3 => {
                buf.put_u8(0x03);
                buf.put_slice(token);
                buf.put_slice(&[0x00, 0x00]);
                buf.put_u8(index as u8);
            }
        }

        buf.put_slice(chunk);
        buf.freeze()
    }

    /// Length of the header preceding the chunk bytes
    pub fn header_len(self, token_len: usize) -> usize {
        match self {
            Self::V1 | Self::V2 => 1 + token_len + 1,
            Self::V3 => 1 + token_len + 3,
        }
    }
}

/// Split a serialized frame into datagrams
pub fn frame_datagrams(
    generation: DeviceGeneration,
    token: &[u8],
    payload: &[u8],
    chunk_size: usize,
) -> Vec<Bytes> {
    payload
        .chunks(chunk_size.max(1).min(MAX_CHUNK_SIZE))
        .enumerate()
        .map(|(index, chunk)| generation.datagram(token, index, chunk))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &[u8] = &[0xde, 0xad, 0xbe, 0xef, 0x01, 0x02, 0x03, 0x04];

    #[test]
    fn test_generation_from_firmware() {
        let v = |s: &str| s.parse::<Version>().unwrap();

        assert_eq!(
            DeviceGeneration::from_firmware(Some("D"), Some(&v("2.3.8"))),
            DeviceGeneration::V1
        );
        assert_eq!(
            DeviceGeneration::from_firmware(Some("D"), Some(&v("2.3.9"))),
            DeviceGeneration::V2
        );
        assert_eq!(
            DeviceGeneration::from_firmware(Some("F"), Some(&v("2.3.8"))),
            DeviceGeneration::V2
        );
        assert_eq!(
            DeviceGeneration::from_firmware(Some("G"), Some(&v("2.4.6"))),
            DeviceGeneration::V2
        );
        assert_eq!(
            DeviceGeneration::from_firmware(Some("G"), Some(&v("2.4.7"))),
            DeviceGeneration::V3
        );
        assert_eq!(
            DeviceGeneration::from_firmware(Some("F"), None),
            DeviceGeneration::V2
        );
        assert_eq!(
            DeviceGeneration::from_firmware(Some("D"), None),
            DeviceGeneration::V1
        );
        assert_eq!(
            DeviceGeneration::from_firmware(None, None),
            DeviceGeneration::V2
        );
    }

    #[test]
    fn test_headers() {
        let chunk = [1, 2, 3];

        let v1 = DeviceGeneration::V1.datagram(TOKEN, 0, &chunk);
        assert_eq!(v1[0], 0x01);
        assert_eq!(&v1[1..9], TOKEN);
        assert_eq!(&v1[9..], &[3, 1, 2, 3]);

        let v2 = DeviceGeneration::V2.datagram(TOKEN, 5, &chunk);
        assert_eq!(v2[0], 0x02);
        assert_eq!(&v2[9..], &[0, 1, 2, 3]);

        let v3 = DeviceGeneration::V3.datagram(TOKEN, 5, &chunk);
        assert_eq!(v3[0], 0x03);
        assert_eq!(&v3[1..9], TOKEN);
        assert_eq!(&v3[9..], &[0, 0, 5, 1, 2, 3]);

        for generation in [DeviceGeneration::V1, DeviceGeneration::V2, DeviceGeneration::V3] {
            let datagram = generation.datagram(TOKEN, 0, &chunk);
            assert_eq!(
                datagram.len(),
                generation.header_len(TOKEN.len()) + chunk.len()
            );
        }
    }

    #[test]
    fn test_chunking_reassembles() {
        for &size in &[0usize, 1, 899, 900, 901, 1260, 2700, 2701] {
            let payload: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
            let datagrams =
                frame_datagrams(DeviceGeneration::V3, TOKEN, &payload, MAX_CHUNK_SIZE);

            assert_eq!(datagrams.len(), (size + MAX_CHUNK_SIZE - 1) / MAX_CHUNK_SIZE);

            let header = DeviceGeneration::V3.header_len(TOKEN.len());
            let mut reassembled = Vec::new();
            for (index, datagram) in datagrams.iter().enumerate() {
                assert!(datagram.len() - header <= MAX_CHUNK_SIZE);
                assert_eq!(datagram[header - 1], index as u8);
                reassembled.extend_from_slice(&datagram[header..]);
            }

            assert_eq!(reassembled, payload);
        }
    }

    #[test]
    fn test_chunk_size_is_capped() {
        let payload = vec![0u8; 1000];
        assert_eq!(
            frame_datagrams(DeviceGeneration::V2, &[], &payload, 4096).len(),
            2
        );
        assert_eq!(
            frame_datagrams(DeviceGeneration::V2, &[], &payload, 500).len(),
            2
        );
    }
}
