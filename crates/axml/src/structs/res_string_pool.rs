use bitflags::bitflags;
use winnow::binary::{le_u8, le_u16, le_u32};
use winnow::combinator::repeat;
use winnow::error::{ErrMode, Needed};
use winnow::prelude::*;
use winnow::token::take;

use crate::structs::common::ResChunkHeader;

bitflags! {
    #[derive(Debug)]
    pub(crate) struct StringType: u32 {
        const Sorted = 1 << 0;
        const Utf8 = 1 << 8;
    }
}

/// Header of a `RES_STRING_POOL_TYPE` chunk (§3 StringPool).
#[derive(Debug)]
pub(crate) struct ResStringPoolHeader {
    pub(crate) header: ResChunkHeader,
    pub(crate) string_count: u32,
    pub(crate) style_count: u32,
    pub(crate) flags: u32,
    pub(crate) strings_start: u32,
    pub(crate) styles_start: u32,
}

impl ResStringPoolHeader {
    pub fn parse(input: &mut &[u8]) -> ModalResult<ResStringPoolHeader> {
        let header = ResChunkHeader::parse(input)?;
        let (string_count, style_count, flags, strings_start, styles_start) =
            (le_u32, le_u32, le_u32, le_u32, le_u32).parse_next(input)?;

        Ok(ResStringPoolHeader {
            header,
            string_count,
            style_count,
            flags,
            strings_start,
            styles_start,
        })
    }

    #[inline]
    pub fn is_sorted(&self) -> bool {
        StringType::from_bits_truncate(self.flags).contains(StringType::Sorted)
    }

    #[inline]
    pub fn is_utf8(&self) -> bool {
        StringType::from_bits_truncate(self.flags).contains(StringType::Utf8)
    }
}

/// Decoded string pool: both the raw string sequence and the parallel style
/// (span) sequence that annotates a subset of those strings with rich-text
/// runs (bold/italic ranges etc). Most consumers only ever touch `strings`;
/// `styles` exists because the format carries it and a faithful decoder
/// doesn't get to skip bytes it finds inconvenient.
#[derive(Debug)]
pub(crate) struct StringPool {
    pub(crate) header: ResStringPoolHeader,
    pub(crate) string_offsets: Vec<u32>,
    pub(crate) style_offsets: Vec<u32>,
    pub(crate) strings: Vec<String>,
    pub(crate) styles: Vec<String>,

    /// Set when the declared `string_count` disagreed with what the offset
    /// table geometry implies; we trust the geometry and carry on.
    pub(crate) invalid_string_count: bool,
}

impl StringPool {
    pub fn parse(input: &mut &[u8]) -> ModalResult<StringPool> {
        let mut string_header = ResStringPoolHeader::parse(input)?;

        let mut invalid_string_count = false;
        let calculated_string_count = string_header
            .strings_start
            .saturating_sub(string_header.style_count * 4 + 28)
            / 4;

        if calculated_string_count != string_header.string_count {
            string_header.string_count = calculated_string_count;
            invalid_string_count = true;
        }

        let string_offsets =
            repeat(string_header.string_count as usize, le_u32).parse_next(input)?;

        let style_offsets = repeat(string_header.style_count as usize, le_u32).parse_next(input)?;

        let (strings, styles) =
            Self::parse_strings_and_styles(input, &string_header, &string_offsets, &style_offsets)?;

        Ok(StringPool {
            header: string_header,
            string_offsets,
            style_offsets,
            strings,
            styles,
            invalid_string_count,
        })
    }

    fn parse_strings_and_styles(
        input: &mut &[u8],
        string_header: &ResStringPoolHeader,
        string_offsets: &[u32],
        style_offsets: &[u32],
    ) -> ModalResult<(Vec<String>, Vec<String>)> {
        let string_pool_size = string_header
            .header
            .size
            .saturating_sub(string_header.strings_start) as usize;

        // take just the string+style chunk, because malware likes tampering the string pool
        let (slice, rest) = input
            .split_at_checked(string_pool_size)
            .ok_or_else(|| ErrMode::Incomplete(Needed::Unknown))?;
        *input = rest;

        let is_utf8 = string_header.is_utf8();
        let mut strings = Vec::with_capacity(string_header.string_count as usize);

        for &offset in string_offsets {
            let Some(chunk) = slice.get(offset as usize..) else {
                continue;
            };
            if let Ok(s) = Self::parse_string(&mut &chunk[..], is_utf8) {
                strings.push(s);
            }
        }

        let styles = Self::parse_styles(string_header, style_offsets, slice, &strings);

        Ok((strings, styles))
    }

    /// Decode the style (span) sequence. Each entry is a run of
    /// `(name_index, first_char, last_char)` triples terminated by
    /// `0xFFFFFFFF`, where `name_index` refers back into `strings`. Each run
    /// renders as `tag[first-last]` pairs, joined by `, `.
    fn parse_styles(
        string_header: &ResStringPoolHeader,
        style_offsets: &[u32],
        slice: &[u8],
        strings: &[String],
    ) -> Vec<String> {
        if style_offsets.is_empty() {
            return Vec::new();
        }

        // `slice` starts at `strings_start`; the styles region begins at
        // `styles_start`, so offsets inside `slice` are relative to that.
        let base = (string_header.styles_start as usize)
            .saturating_sub(string_header.strings_start as usize);

        style_offsets
            .iter()
            .map(|&offset| {
                let Some(run) = slice.get(base + offset as usize..) else {
                    return String::new();
                };

                let read_u32 = |bytes: &[u8], at: usize| -> Option<u32> {
                    bytes.get(at..at + 4).map(|b| {
                        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
                    })
                };

                let mut spans = Vec::new();
                let mut pos = 0usize;
                while let Some(name_index) = read_u32(run, pos) {
                    if name_index == 0xFFFF_FFFF {
                        break;
                    }
                    let Some(first_char) = read_u32(run, pos + 4) else {
                        break;
                    };
                    let Some(last_char) = read_u32(run, pos + 8) else {
                        break;
                    };
                    let tag = strings
                        .get(name_index as usize)
                        .cloned()
                        .unwrap_or_default();
                    spans.push(format!("{tag}[{first_char}-{last_char}]"));
                    pos += 12;
                }

                spans.join(", ")
            })
            .collect()
    }

    fn parse_string(input: &mut &[u8], is_utf8: bool) -> ModalResult<String> {
        let string = if !is_utf8 {
            // utf-16
            let u16len = le_u16(input)?;

            // check if regular utf-16 or with fixup
            let real_len = if u16len & 0x8000 != 0 {
                let u16len_fix: u16 = le_u16(input)?;
                (((u16len & 0x7FFF) as u32) << 16 | u16len_fix as u32) as usize
            } else {
                u16len as usize
            };

            let content = take(real_len * 2).parse_next(input)?;
            // skip the trailing NUL terminator
            let _ = le_u16(input)?;

            Self::read_utf16(content, real_len)
        } else {
            // utf-8: a char-count prefix (ignored, only advances the cursor),
            // then a byte-count prefix that is the real payload length.
            let _char_count = Self::read_utf8_len(input)?;
            let byte_count = Self::read_utf8_len(input)?;

            let content = take(byte_count).parse_next(input)?;
            // skip the trailing NUL terminator
            let _ = le_u8(input)?;

            String::from_utf8_lossy(content).to_string()
        };

        Ok(string)
    }

    /// One of the two variable-length prefixes in the UTF-8 string format:
    /// a single byte, extended to two (high bit set on the first) for
    /// values that don't fit in 7 bits.
    fn read_utf8_len(input: &mut &[u8]) -> ModalResult<usize> {
        let first = le_u8(input)?;
        if first & 0x80 != 0 {
            let second = le_u8(input)?;
            Ok((((first & 0x7F) as usize) << 8) | second as usize)
        } else {
            Ok(first as usize)
        }
    }

    fn read_utf16(slice: &[u8], size: usize) -> String {
        std::char::decode_utf16(
            slice
                .chunks_exact(2)
                .take(size)
                .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]])),
        )
        .collect::<Result<String, _>>()
        .unwrap_or_default()
    }

    pub fn get(&self, idx: u32) -> Option<&String> {
        self.strings.get(idx as usize)
    }

    pub fn get_style(&self, idx: u32) -> Option<&String> {
        self.styles.get(idx as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8_pool_bytes(strings: &[&str]) -> Vec<u8> {
        let mut body = Vec::new();
        let mut offsets = Vec::new();
        for s in strings {
            offsets.push(body.len() as u32);
            body.push(s.chars().count() as u8); // UTF-16 char count
            body.push(s.len() as u8); // UTF-8 byte count
            body.extend_from_slice(s.as_bytes());
            body.push(0);
        }

        let strings_start = 28 + offsets.len() as u32 * 4;
        let size = strings_start + body.len() as u32;

        let mut out = Vec::new();
        out.extend_from_slice(&1u16.to_le_bytes()); // type RES_STRING_POOL_TYPE
        out.extend_from_slice(&28u16.to_le_bytes()); // header_size
        out.extend_from_slice(&size.to_le_bytes()); // size
        out.extend_from_slice(&(strings.len() as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // style_count
        out.extend_from_slice(&StringType::Utf8.bits().to_le_bytes());
        out.extend_from_slice(&strings_start.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // styles_start
        for off in offsets {
            out.extend_from_slice(&off.to_le_bytes());
        }
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn decodes_utf8_strings() {
        let bytes = utf8_pool_bytes(&["android", "manifest"]);
        let mut input = bytes.as_slice();
        let pool = StringPool::parse(&mut input).expect("valid pool");
        assert_eq!(pool.strings, vec!["android".to_string(), "manifest".to_string()]);
        assert!(!pool.header.is_sorted());
        assert!(pool.header.is_utf8());
    }

    #[test]
    fn missing_string_offset_is_skipped_not_fatal() {
        let mut bytes = utf8_pool_bytes(&["a"]);
        // corrupt the single offset so it points past the chunk
        let strings_start = u32::from_le_bytes(bytes[20..24].try_into().unwrap()) as usize;
        bytes[strings_start - 4..strings_start].copy_from_slice(&999u32.to_le_bytes());
        let mut input = bytes.as_slice();
        let pool = StringPool::parse(&mut input).expect("still parses");
        assert!(pool.strings.is_empty());
    }
}
