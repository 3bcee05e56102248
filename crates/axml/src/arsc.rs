use std::collections::HashMap;

use log::warn;
use winnow::error::ErrMode;
use winnow::prelude::*;
use winnow::stream::Stream;
use winnow::token::take;

use crate::errors::ArscError;
use crate::resource_id::ResourceId;
use crate::structs::res_table_config::ResTableConfig;
use crate::structs::{
    ResChunkHeader, ResTableEntry, ResTableHeader, ResTablePackage, ResourceType, ResourceValueType,
    StringPool,
};

/// A resolved resource value, projected from a `ResValue` per §4.3 step 4.
///
/// `Raw` covers every data type the core doesn't give special treatment to
/// (references, attributes, floats, dimensions, fractions, colors) -
/// callers that need those get the untouched 32-bit payload back.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Str(String),
    Int(u32),
    Bool(bool),
    Raw(u32),
}

/// A decoded `resources.arsc` resource table.
///
/// This is the sole entry point into resource resolution: every package's
/// type chunks are kept as parsed, and [`ArscTable::get_resource`] is the
/// only place the configuration matcher (`ResTableConfig::matches` /
/// `is_better_than`) gets invoked.
#[derive(Debug)]
pub struct ArscTable {
    pub(crate) global_strings: StringPool,
    pub(crate) packages: HashMap<u8, ResTablePackage>,
}

impl ArscTable {
    pub fn parse(input: &mut &[u8]) -> Result<ArscTable, ArscError> {
        let available = input.len();
        let header = ResTableHeader::parse(input)
            .map_err(|_| ArscError::BadHeader("RES_TABLE_TYPE header"))?;

        if header.header.type_ != ResourceType::Table {
            return Err(ArscError::BadHeader("not a RES_TABLE chunk"));
        }

        if header.package_count < 1 {
            warn!(
                "expected at least one resource package, but got {}",
                header.package_count
            );
        }

        let consumed = available - input.len();
        let body_len = (header.header.size as usize).saturating_sub(consumed);
        let Some((mut body, rest)) = input.split_at_checked(body_len) else {
            return Err(ArscError::Truncated {
                declared: header.header.size,
                available: input.len() + consumed,
            });
        };
        *input = rest;

        let global_strings =
            StringPool::parse(&mut body).map_err(|_| ArscError::BadHeader("global string pool"))?;

        let mut packages = HashMap::new();

        loop {
            let checkpoint = body.checkpoint();
            let chunk_header = match ResChunkHeader::parse(&mut body) {
                Ok(h) => h,
                Err(ErrMode::Backtrack(_)) => break,
                Err(_) => break,
            };

            match chunk_header.type_ {
                ResourceType::TablePackage => {
                    body.reset(&checkpoint);
                    let package = ResTablePackage::parse(&mut body)
                        .map_err(|_| ArscError::BadHeader("RES_TABLE_PACKAGE"))?;
                    packages.insert(package.header.id as u8, package);
                }
                _ => {
                    let skip = chunk_header.content_size() as usize;
                    let Ok(_) = take::<usize, _, winnow::error::ContextError>(skip).parse_next(&mut body)
                    else {
                        break;
                    };
                }
            }
        }

        Ok(ArscTable {
            global_strings,
            packages,
        })
    }

    /// Resolve `id` to a [`Value`], using `config` as the device configuration to
    /// match against (§4.3). `None` behaves as the "default"/empty configuration.
    pub fn get_resource(
        &self,
        id: ResourceId,
        config: Option<&ResTableConfig>,
    ) -> Result<Value, ArscError> {
        let package = self
            .packages
            .get(&id.package())
            .ok_or(ArscError::NotFoundPackage(id.package()))?;

        let not_found = || ArscError::NotFoundEntry {
            package: id.package(),
            type_id: id.type_id(),
            entry: id.entry(),
        };

        let entry = package
            .resolve(id.type_id(), id.entry(), config)
            .ok_or_else(not_found)?;

        Self::project(entry, &self.global_strings).ok_or_else(not_found)
    }

    fn project(entry: &ResTableEntry, strings: &StringPool) -> Option<Value> {
        match entry {
            ResTableEntry::NoEntry => None,
            // Map/style entries have no single scalar value to project; out of scope.
            ResTableEntry::Complex(_) => None,
            ResTableEntry::Default(e) => {
                Some(Self::project_raw(&e.value.data_type, e.value.data, strings))
            }
            ResTableEntry::Compact(e) => {
                let data_type = ResourceValueType::from((e.flags >> 8) as u8);
                Some(Self::project_raw(&data_type, e.data, strings))
            }
        }
    }

    fn project_raw(data_type: &ResourceValueType, data: u32, strings: &StringPool) -> Value {
        match data_type {
            ResourceValueType::Null => Value::Null,
            ResourceValueType::String => strings
                .get(data)
                .cloned()
                .map(Value::Str)
                .unwrap_or(Value::Null),
            ResourceValueType::Dec | ResourceValueType::Hex => Value::Int(data),
            ResourceValueType::Boolean => Value::Bool(data != 0),
            _ => Value::Raw(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::resource_table::{ResTableEntryDefault, ResTablePackageHeader, ResTableType};
    use crate::structs::ResourceValue;

    fn utf8_string_pool(strings: &[&str]) -> StringPool {
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
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&28u16.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&(strings.len() as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0x100u32.to_le_bytes()); // UTF8 flag
        out.extend_from_slice(&strings_start.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        for off in offsets {
            out.extend_from_slice(&off.to_le_bytes());
        }
        out.extend_from_slice(&body);

        StringPool::parse(&mut out.as_slice()).expect("valid pool")
    }

    fn string_entry(key_index: u32, value_string_index: u32) -> ResTableEntry {
        ResTableEntry::Default(ResTableEntryDefault {
            size: 8,
            flags: 0,
            index: key_index,
            value: ResourceValue {
                size: 8,
                res: 0,
                data_type: ResourceValueType::String,
                data: value_string_index,
            },
        })
    }

    fn type_chunk(config: ResTableConfig, entry: ResTableEntry) -> ResTableType {
        ResTableType {
            header: ResChunkHeader {
                type_: ResourceType::TableType,
                header_size: 0,
                size: 0,
            },
            id: 1,
            flags: 0,
            reserved: 0,
            entry_count: 1,
            entries_start: 0,
            config,
            entry_offsets: vec![0],
            entries: vec![entry],
        }
    }

    fn sample_table() -> ArscTable {
        let default_type = type_chunk(
            ResTableConfig::new(),
            string_entry(0, 0), // "FireworksMeasure"
        );
        let ja_type = type_chunk(
            ResTableConfig::new().with_locale("ja", ""),
            string_entry(0, 1), // "花火距離計算"
        );

        let package = ResTablePackage {
            header: ResTablePackageHeader {
                header: ResChunkHeader {
                    type_: ResourceType::TablePackage,
                    header_size: 0,
                    size: 0,
                },
                id: 0x7f,
                name: [0u8; 256],
                type_strings: 0,
                last_public_type: 0,
                key_strings: 0,
                last_public_key: 0,
                type_id_offset: 0,
            },
            type_strings: utf8_string_pool(&["string"]),
            key_strings: utf8_string_pool(&["label"]),
            types: vec![default_type, ja_type],
        };

        let mut packages = HashMap::new();
        packages.insert(0x7f, package);

        ArscTable {
            global_strings: utf8_string_pool(&["FireworksMeasure", "\u{82b1}\u{706b}\u{8ddd}\u{96e2}\u{8a08}\u{7b97}"]),
            packages,
        }
    }

    // §8 boundary A: no constraint on the request selects the default
    // (unqualified) entry over any language-qualified alternative.
    #[test]
    fn empty_request_selects_default_variant() {
        let table = sample_table();
        let id = ResourceId::new(0x7f, 0x01, 0x0000);
        let value = table.get_resource(id, Some(&ResTableConfig::new())).unwrap();
        assert_eq!(value, Value::Str("FireworksMeasure".to_string()));
    }

    // §8 boundary B: a request naming the Japanese locale selects that variant.
    #[test]
    fn japanese_request_selects_japanese_variant() {
        let table = sample_table();
        let id = ResourceId::new(0x7f, 0x01, 0x0000);
        let config = ResTableConfig::new().with_locale("ja", "");
        let value = table.get_resource(id, Some(&config)).unwrap();
        assert_eq!(value, Value::Str("\u{82b1}\u{706b}\u{8ddd}\u{96e2}\u{8a08}\u{7b97}".to_string()));
    }

    // §8 boundary C: a nil request falls back to the most-specific variant.
    #[test]
    fn nil_request_selects_most_specific_variant() {
        let table = sample_table();
        let id = ResourceId::new(0x7f, 0x01, 0x0000);
        let value = table.get_resource(id, None).unwrap();
        assert_eq!(value, Value::Str("\u{82b1}\u{706b}\u{8ddd}\u{96e2}\u{8a08}\u{7b97}".to_string()));
    }

    #[test]
    fn unknown_package_is_not_found() {
        let table = sample_table();
        let id = ResourceId::new(0x01, 0x01, 0x0000);
        assert!(matches!(
            table.get_resource(id, None),
            Err(ArscError::NotFoundPackage(0x01))
        ));
    }

    #[test]
    fn unknown_entry_is_not_found() {
        let table = sample_table();
        let id = ResourceId::new(0x7f, 0x01, 0x0099);
        assert!(matches!(
            table.get_resource(id, None),
            Err(ArscError::NotFoundEntry { .. })
        ));
    }
}
