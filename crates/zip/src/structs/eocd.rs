use memchr::memmem;

use winnow::{
    binary::{le_u16, le_u32},
    prelude::*,
    token::take,
};

#[derive(Debug)]
pub(crate) struct EndOfCentralDirectory {
    pub(crate) disk_number: u16,
    pub(crate) central_dir_start_disk: u16,
    pub(crate) entries_on_this_disk: u16,
    pub(crate) total_entries: u16,
    pub(crate) central_dir_size: u32,
    pub(crate) central_dir_offset: u32,
    pub(crate) comment_length: u16,
    pub(crate) comment: Vec<u8>,
}

impl EndOfCentralDirectory {
    const MAGIC: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];

    #[inline(always)]
    const fn magic_u32() -> u32 {
        u32::from_le_bytes(Self::MAGIC)
    }

    pub(crate) fn parse(input: &mut &[u8]) -> ModalResult<EndOfCentralDirectory> {
        let (
            _,
            disk_number,
            central_dir_start_disk,
            entries_on_this_disk,
            total_entries,
            central_dir_size,
            central_dir_offset,
            comment_length,
        ) = (
            le_u32.verify(|magic| *magic == Self::magic_u32()), // magic
            le_u16,                                             // disk_number
            le_u16,                                             // central_dir_start_disk
            le_u16,                                             // entries_on_this_disk
            le_u16,                                             // total_entries
            le_u32,                                             // central_dir_size
            le_u32,                                             // central_dir_offset
            le_u16,                                             // comment_length
        )
            .parse_next(input)?;

        let comment = take(comment_length).parse_next(input)?;

        Ok(EndOfCentralDirectory {
            disk_number,
            central_dir_start_disk,
            entries_on_this_disk,
            total_entries,
            central_dir_size,
            central_dir_offset,
            comment_length,
            comment: comment.to_vec(),
        })
    }

    /// Searches backward from the end of the file in `chunk_size`-byte windows,
    /// since the EOCD comment can push the real magic arbitrarily far from EOF.
    pub(crate) fn find_eocd(input: &[u8], chunk_size: usize) -> Option<usize> {
        let mut end = input.len();

        while end > 0 {
            let start = end.saturating_sub(chunk_size);
            let chunk = &input[start..end];

            if let Some(pos) = memmem::rfind(chunk, &Self::MAGIC) {
                return Some(start + pos);
            }

            end = start;
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_magic_at_tail() {
        let mut data = vec![0u8; 100];
        data.extend_from_slice(&EndOfCentralDirectory::MAGIC);
        data.extend_from_slice(&[0u8; 18]);
        assert_eq!(EndOfCentralDirectory::find_eocd(&data, 4096), Some(100));
    }

    #[test]
    fn missing_magic_returns_none() {
        let data = vec![0u8; 200];
        assert_eq!(EndOfCentralDirectory::find_eocd(&data, 64), None);
    }
}
