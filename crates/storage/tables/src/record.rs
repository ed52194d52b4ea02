//! Fixed-width record encoding.
//!
//! Every record in a file has the same byte width, computed from the fixed
//! field widths below and persisted in the file header at creation time. The
//! packed layout is `[id:i32][name][surname][address][city]` with each string
//! field NUL-padded to its declared width.

use crate::errors::{TableError, TableResult};
use binary_helpers::le::{read_le, write_le};
use page::errors::LayoutError;
use std::fmt;

/// Width of the `name` field in bytes.
pub const NAME_LEN: usize = 15;
/// Width of the `surname` field in bytes.
pub const SURNAME_LEN: usize = 20;
/// Width of the `address` field in bytes.
pub const ADDRESS_LEN: usize = 20;
/// Width of the `city` field in bytes.
pub const CITY_LEN: usize = 15;

const ID_OFFSET: usize = 0;
const NAME_OFFSET: usize = ID_OFFSET + 4;
const SURNAME_OFFSET: usize = NAME_OFFSET + NAME_LEN;
const ADDRESS_OFFSET: usize = SURNAME_OFFSET + SURNAME_LEN;
const CITY_OFFSET: usize = ADDRESS_OFFSET + ADDRESS_LEN;

/// Total packed width of one record.
pub const RECORD_SIZE: usize = CITY_OFFSET + CITY_LEN;

/// One fixed-width record. `id` is the primary key, `name` the secondary
/// key; the remaining fields are carried opaquely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: i32,
    pub name: String,
    pub surname: String,
    pub address: String,
    pub city: String,
}

impl Record {
    /// Builds a record. String fields longer than their fixed width are
    /// truncated at encode time.
    pub fn new(
        id: i32,
        name: impl Into<String>,
        surname: impl Into<String>,
        address: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            surname: surname.into(),
            address: address.into(),
            city: city.into(),
        }
    }

    /// Packs the record into its fixed-width byte layout.
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0u8; RECORD_SIZE];
        // The buffer is exactly RECORD_SIZE bytes, so this write cannot fail.
        let _ = write_le::<i32>(&mut bytes, ID_OFFSET, self.id);

        write_padded(&mut bytes[NAME_OFFSET..NAME_OFFSET + NAME_LEN], &self.name);
        write_padded(
            &mut bytes[SURNAME_OFFSET..SURNAME_OFFSET + SURNAME_LEN],
            &self.surname,
        );
        write_padded(
            &mut bytes[ADDRESS_OFFSET..ADDRESS_OFFSET + ADDRESS_LEN],
            &self.address,
        );
        write_padded(&mut bytes[CITY_OFFSET..CITY_OFFSET + CITY_LEN], &self.city);
        bytes
    }

    /// Unpacks a record from its fixed-width byte layout.
    /// Fails if `bytes` is not exactly [`RECORD_SIZE`] long.
    pub fn decode(bytes: &[u8]) -> TableResult<Self> {
        if bytes.len() != RECORD_SIZE {
            return Err(TableError::CorruptRecord {
                expected: RECORD_SIZE,
                actual: bytes.len(),
            });
        }

        let id = read_le::<i32>(bytes, ID_OFFSET).map_err(LayoutError::from)?;

        Ok(Self {
            id,
            name: read_padded(&bytes[NAME_OFFSET..NAME_OFFSET + NAME_LEN]),
            surname: read_padded(&bytes[SURNAME_OFFSET..SURNAME_OFFSET + SURNAME_LEN]),
            address: read_padded(&bytes[ADDRESS_OFFSET..ADDRESS_OFFSET + ADDRESS_LEN]),
            city: read_padded(&bytes[CITY_OFFSET..CITY_OFFSET + CITY_LEN]),
        })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {})",
            self.id, self.name, self.surname, self.address, self.city
        )
    }
}

/// Copies `value` into `target`, truncating to the field width and leaving
/// the remainder NUL-padded.
fn write_padded(target: &mut [u8], value: &str) {
    let raw = value.as_bytes();
    let n = raw.len().min(target.len());
    target[..n].copy_from_slice(&raw[..n]);
}

/// Reads a NUL-padded field back into a `String`. Non-UTF-8 bytes are
/// replaced rather than rejected; records are written by this crate, so this
/// only triggers on foreign or corrupted files.
fn read_padded(raw: &[u8]) -> String {
    let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_size_matches_field_widths() {
        assert_eq!(RECORD_SIZE, 74);
    }

    #[test]
    fn encode_decode_roundtrip() {
        let record = Record::new(42, "alice", "liddell", "4 Rabbit Hole", "Oxford");
        let decoded = Record::decode(&record.encode()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn negative_id_roundtrips() {
        let record = Record::new(-7, "x", "y", "z", "w");
        assert_eq!(Record::decode(&record.encode()).unwrap().id, -7);
    }

    #[test]
    fn long_fields_are_truncated_to_their_width() {
        let long = "a".repeat(100);
        let record = Record::new(1, long.clone(), long.clone(), long.clone(), long);
        let decoded = Record::decode(&record.encode()).unwrap();
        assert_eq!(decoded.name.len(), NAME_LEN);
        assert_eq!(decoded.surname.len(), SURNAME_LEN);
        assert_eq!(decoded.address.len(), ADDRESS_LEN);
        assert_eq!(decoded.city.len(), CITY_LEN);
    }

    #[test]
    fn decode_rejects_wrong_width() {
        let result = Record::decode(&[0u8; RECORD_SIZE - 1]);
        assert!(matches!(
            result.unwrap_err(),
            TableError::CorruptRecord {
                expected: RECORD_SIZE,
                actual,
            } if actual == RECORD_SIZE - 1
        ));
    }

    #[test]
    fn id_is_little_endian_at_offset_zero() {
        let record = Record::new(0x01020304, "", "", "", "");
        let bytes = record.encode();
        assert_eq!(&bytes[0..4], &[0x04, 0x03, 0x02, 0x01]);
    }
}
