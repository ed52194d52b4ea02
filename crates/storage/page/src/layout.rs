//! Page Layout Definitions and Accessors
//! -------------------------------------
//!
//! Every file managed by this engine follows the same convention: page 0 is a
//! header page holding a handful of `u32` fields, and every other page is a
//! data page that starts with a 4-byte record count followed by fixed-width
//! records packed contiguously. The hash table additionally keeps per-bucket
//! metadata at the front of each bucket's first page, so its record area
//! starts at byte 12 instead of byte 4.
//!
//! All fields are stored in **little-endian** format and accessed via
//! zero-copy typed wrappers (a `*Ref` view per page kind for reads, a `*Mut`
//! view for writes).
//!
//! # Binary Layouts
//!
//! | Page kind          | Fields                                                   | Records start |
//! |--------------------|----------------------------------------------------------|---------------|
//! | Heap header (p. 0) | `record_size: u32 @0`, `record_count: u32 @4`, `page_count: u32 @8` | —   |
//! | Table header (p. 0)| `bucket_count: u32 @0`                                   | —             |
//! | Data page          | `record_count: u32 @0`                                   | byte 4        |
//! | Bucket page        | `record_count: u32 @0`, `record_size: u32 @4`, `tail_page: u32 @8` | byte 12 |
//!
//! # Invariants
//!
//! - `records_start + record_count * record_size <= PAGE_SIZE` always holds;
//!   [`push_record`](DataPageMut::push_record) rejects the insert that would
//!   break it with [`LayoutError::PageFull`].
//! - Header fields written at creation time (`record_size`, `bucket_count`)
//!   never change afterwards; the views do not enforce this, the owning
//!   session handles do.

use crate::errors::LayoutError;
use crate::PAGE_SIZE;
use binary_helpers::le::{read_le, write_le};
use paste::paste;

/// Offset of the first record in a plain data page.
pub const DATA_RECORDS_START: usize = 4;

/// Offset of the first record in a bucket page (after the metadata triple).
pub const BUCKET_RECORDS_START: usize = 12;

/// Number of fixed-width records a page can hold when its record area starts
/// at `records_start`.
pub fn max_records_per_page(record_size: usize, records_start: usize) -> usize {
    debug_assert!(record_size > 0);
    (PAGE_SIZE - records_start) / record_size
}

fn check_page_slice(len: usize) -> Result<(), LayoutError> {
    if len != PAGE_SIZE {
        return Err(LayoutError::PageSliceSizeMismatch {
            expected: PAGE_SIZE,
            actual: len,
        });
    }
    Ok(())
}

fn record_slice(
    bytes: &[u8],
    records_start: usize,
    index: usize,
    record_size: usize,
) -> Result<&[u8], LayoutError> {
    let start = records_start + index * record_size;
    let end = start + record_size;
    if end > PAGE_SIZE {
        return Err(LayoutError::RecordOutOfBounds { index, record_size });
    }
    Ok(&bytes[start..end])
}

/// Defines one page-kind's field constants, read-only view and mutable view.
///
/// Pattern: `field_id(identifier): field_type(type) = field_offset(usize)`
macro_rules! impl_page_views {
    (
        $prefix:ident, $ref_name:ident, $mut_name:ident {
            $( $field_name:ident : $field_type:ty = $field_offset:expr ; )*
        }
    ) => {
        paste! {
            $(
                #[doc = concat!("Offset of ", stringify!($field_name), " — type ", stringify!($field_type))]
                pub const [<$prefix:upper _ $field_name:upper>] : usize = $field_offset;
            )*

            #[doc = concat!("Immutable view over a ", stringify!($prefix), " page.")]
            #[derive(Debug)]
            pub struct $ref_name<'a> {
                bytes: &'a [u8],
            }

            impl<'a> $ref_name<'a> {
                /// Creates the view if `bytes` is exactly one page long.
                pub fn new(bytes: &'a [u8]) -> Result<Self, LayoutError> {
                    check_page_slice(bytes.len())?;
                    Ok(Self { bytes })
                }

                $(
                    #[doc = concat!(
                        "Getter for field `", stringify!($field_name), "` at offset ",
                        stringify!($field_offset), "."
                    )]
                    pub fn [<get_ $field_name>](&self) -> Result<$field_type, LayoutError> {
                        Ok(read_le::<$field_type>(self.bytes, $field_offset)?)
                    }
                )*
            }

            #[doc = concat!("Mutable view over a ", stringify!($prefix), " page.")]
            #[derive(Debug)]
            pub struct $mut_name<'a> {
                bytes: &'a mut [u8],
            }

            impl<'a> $mut_name<'a> {
                /// Creates the view if `bytes` is exactly one page long.
                pub fn new(bytes: &'a mut [u8]) -> Result<Self, LayoutError> {
                    check_page_slice(bytes.len())?;
                    Ok(Self { bytes })
                }

                $(
                    #[doc = concat!(
                        "Getter for field `", stringify!($field_name), "` at offset ",
                        stringify!($field_offset), "."
                    )]
                    pub fn [<get_ $field_name>](&self) -> Result<$field_type, LayoutError> {
                        Ok(read_le::<$field_type>(self.bytes, $field_offset)?)
                    }

                    #[doc = concat!(
                        "Setter for field `", stringify!($field_name), "` at offset ",
                        stringify!($field_offset), "."
                    )]
                    pub fn [<set_ $field_name>](&mut self, val: $field_type) -> Result<(), LayoutError> {
                        write_le::<$field_type>(self.bytes, $field_offset, val)?;
                        Ok(())
                    }
                )*
            }
        }
    };
}

/// Adds record-area accessors to a pair of page views whose record region
/// starts at `records_start`. Requires the views to expose a `record_count`
/// field.
macro_rules! impl_record_area {
    ($ref_name:ident, $mut_name:ident, records_start = $start:expr) => {
        impl<'a> $ref_name<'a> {
            /// Offset of the first record in this page kind.
            pub const RECORDS_START: usize = $start;

            /// Borrow the raw bytes of record `index`.
            pub fn record(&self, index: usize, record_size: usize) -> Result<&[u8], LayoutError> {
                record_slice(self.bytes, $start, index, record_size)
            }

            /// Whether one more record of `record_size` bytes fits.
            pub fn has_space(&self, record_size: usize) -> Result<bool, LayoutError> {
                let count = self.get_record_count()? as usize;
                Ok(count < max_records_per_page(record_size, $start))
            }
        }

        impl<'a> $mut_name<'a> {
            /// Offset of the first record in this page kind.
            pub const RECORDS_START: usize = $start;

            /// Borrow the raw bytes of record `index`.
            pub fn record(&self, index: usize, record_size: usize) -> Result<&[u8], LayoutError> {
                record_slice(self.bytes, $start, index, record_size)
            }

            /// Whether one more record of `record_size` bytes fits.
            pub fn has_space(&self, record_size: usize) -> Result<bool, LayoutError> {
                let count = self.get_record_count()? as usize;
                Ok(count < max_records_per_page(record_size, $start))
            }

            /// Appends `record` after the last record and bumps the count.
            /// Returns the index the record was placed at.
            pub fn push_record(&mut self, record: &[u8]) -> Result<u32, LayoutError> {
                let record_size = record.len();
                let count = self.get_record_count()? as usize;
                if count >= max_records_per_page(record_size, $start) {
                    return Err(LayoutError::PageFull {
                        record_count: count,
                        record_size,
                    });
                }
                let start = $start + count * record_size;
                self.bytes[start..start + record_size].copy_from_slice(record);
                self.set_record_count((count + 1) as u32)?;
                Ok(count as u32)
            }
        }
    };
}

impl_page_views!(heap_header, HeapHeaderRef, HeapHeaderMut {
    record_size : u32 = 0;
    record_count : u32 = 4;
    page_count : u32 = 8;
});

impl_page_views!(table_header, TableHeaderRef, TableHeaderMut {
    bucket_count : u32 = 0;
});

impl_page_views!(data_page, DataPageRef, DataPageMut {
    record_count : u32 = 0;
});

impl_page_views!(bucket_page, BucketPageRef, BucketPageMut {
    record_count : u32 = 0;
    record_size : u32 = 4;
    tail_page : u32 = 8;
});

impl_record_area!(DataPageRef, DataPageMut, records_start = DATA_RECORDS_START);
impl_record_area!(BucketPageRef, BucketPageMut, records_start = BUCKET_RECORDS_START);

impl<'a> BucketPageMut<'a> {
    /// Initializes a freshly allocated bucket page with an empty record area.
    pub fn init(&mut self, record_size: u32, tail_page: u32) -> Result<(), LayoutError> {
        self.set_record_count(0)?;
        self.set_record_size(record_size)?;
        self.set_tail_page(tail_page)?;
        Ok(())
    }
}

#[cfg(test)]
mod header_view_tests {
    use super::*;

    #[test]
    fn heap_header_roundtrip() {
        let mut bytes = [0u8; PAGE_SIZE];
        {
            let mut header = HeapHeaderMut::new(&mut bytes).unwrap();
            header.set_record_size(74).unwrap();
            header.set_record_count(3).unwrap();
            header.set_page_count(2).unwrap();
        }

        let header = HeapHeaderRef::new(&bytes).unwrap();
        assert_eq!(header.get_record_size().unwrap(), 74);
        assert_eq!(header.get_record_count().unwrap(), 3);
        assert_eq!(header.get_page_count().unwrap(), 2);
    }

    #[test]
    fn heap_header_fields_at_expected_offsets() {
        let mut bytes = [0u8; PAGE_SIZE];
        bytes[HEAP_HEADER_RECORD_SIZE..HEAP_HEADER_RECORD_SIZE + 4]
            .copy_from_slice(&74u32.to_le_bytes());
        bytes[HEAP_HEADER_RECORD_COUNT..HEAP_HEADER_RECORD_COUNT + 4]
            .copy_from_slice(&9u32.to_le_bytes());
        bytes[HEAP_HEADER_PAGE_COUNT..HEAP_HEADER_PAGE_COUNT + 4]
            .copy_from_slice(&4u32.to_le_bytes());

        let header = HeapHeaderRef::new(&bytes).unwrap();
        assert_eq!(header.get_record_size().unwrap(), 74);
        assert_eq!(header.get_record_count().unwrap(), 9);
        assert_eq!(header.get_page_count().unwrap(), 4);
    }

    #[test]
    fn table_header_roundtrip() {
        let mut bytes = [0u8; PAGE_SIZE];
        {
            let mut header = TableHeaderMut::new(&mut bytes).unwrap();
            header.set_bucket_count(10).unwrap();
        }

        let header = TableHeaderRef::new(&bytes).unwrap();
        assert_eq!(header.get_bucket_count().unwrap(), 10);
    }

    #[test]
    fn view_rejects_wrong_slice_size() {
        let bytes = [0u8; PAGE_SIZE + 1];
        let result = HeapHeaderRef::new(&bytes);
        assert!(matches!(
            result.unwrap_err(),
            LayoutError::PageSliceSizeMismatch { actual, .. } if actual == PAGE_SIZE + 1
        ));
    }
}
