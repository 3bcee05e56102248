//! Typed attribute value wrappers (§4.6).
//!
//! Binary XML attributes carry either inline text or a `@0x...` reference
//! into a resource table. These wrappers hide that distinction behind a
//! single `value()` accessor: empty text is the type's zero value,
//! non-reference text is parsed directly, and a reference is resolved
//! through a bound [`ArscTable`], requiring the resolved value's dynamic
//! kind to match the accessor.

use crate::arsc::{ArscTable, Value};
use crate::errors::ValueError;
use crate::resource_id::ResourceId;
use crate::structs::res_table_config::ResTableConfig;

#[derive(Debug, Clone, Copy)]
struct Binding<'a> {
    table: &'a ArscTable,
    config: Option<&'a ResTableConfig>,
}

fn resolve_reference<'a>(
    raw: &str,
    binding: Option<Binding<'a>>,
) -> Result<Option<Value>, ValueError> {
    if !raw.starts_with('@') {
        return Ok(None);
    }

    let id = ResourceId::parse(raw).ok_or(ValueError::BadResourceId)?;
    let binding = binding.ok_or(ValueError::NoTable)?;
    let value = binding.table.get_resource(id, binding.config)?;
    Ok(Some(value))
}

/// A `boolean`-typed attribute value.
#[derive(Debug, Clone)]
pub struct Bool<'a> {
    raw: String,
    binding: Option<Binding<'a>>,
}

impl<'a> Bool<'a> {
    pub fn new(raw: impl Into<String>) -> Self {
        Bool {
            raw: raw.into(),
            binding: None,
        }
    }

    /// Bind a resource table (and optionally a device configuration) to resolve
    /// `@0x...` references against. Returns a new value; the receiver is untouched.
    pub fn bind(&self, table: &'a ArscTable, config: Option<&'a ResTableConfig>) -> Self {
        Bool {
            raw: self.raw.clone(),
            binding: Some(Binding { table, config }),
        }
    }

    pub fn value(&self) -> Result<bool, ValueError> {
        if self.raw.is_empty() {
            return Ok(false);
        }

        if let Some(resolved) = resolve_reference(&self.raw, self.binding)? {
            return match resolved {
                Value::Bool(b) => Ok(b),
                Value::Int(i) => Ok(i != 0),
                Value::Null => Ok(false),
                _ => Err(ValueError::TypeMismatch),
            };
        }

        match self.raw.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => other
                .parse::<i64>()
                .map(|v| v != 0)
                .map_err(|_| ValueError::TypeMismatch),
        }
    }
}

/// A 32-bit integer-typed attribute value (decimal or `0x...` hex literal).
#[derive(Debug, Clone)]
pub struct Int32<'a> {
    raw: String,
    binding: Option<Binding<'a>>,
}

impl<'a> Int32<'a> {
    pub fn new(raw: impl Into<String>) -> Self {
        Int32 {
            raw: raw.into(),
            binding: None,
        }
    }

    pub fn bind(&self, table: &'a ArscTable, config: Option<&'a ResTableConfig>) -> Self {
        Int32 {
            raw: self.raw.clone(),
            binding: Some(Binding { table, config }),
        }
    }

    pub fn value(&self) -> Result<i32, ValueError> {
        if self.raw.is_empty() {
            return Ok(0);
        }

        if let Some(resolved) = resolve_reference(&self.raw, self.binding)? {
            return match resolved {
                Value::Int(i) => Ok(i as i32),
                Value::Bool(b) => Ok(b as i32),
                Value::Null => Ok(0),
                _ => Err(ValueError::TypeMismatch),
            };
        }

        if let Some(hex) = self.raw.strip_prefix("0x").or_else(|| self.raw.strip_prefix("0X")) {
            return i64::from_str_radix(hex, 16)
                .map(|v| v as i32)
                .map_err(|_| ValueError::TypeMismatch);
        }

        self.raw.parse::<i32>().map_err(|_| ValueError::TypeMismatch)
    }
}

/// A string-typed attribute value.
#[derive(Debug, Clone)]
pub struct Str<'a> {
    raw: String,
    binding: Option<Binding<'a>>,
}

impl<'a> Str<'a> {
    pub fn new(raw: impl Into<String>) -> Self {
        Str {
            raw: raw.into(),
            binding: None,
        }
    }

    pub fn bind(&self, table: &'a ArscTable, config: Option<&'a ResTableConfig>) -> Self {
        Str {
            raw: self.raw.clone(),
            binding: Some(Binding { table, config }),
        }
    }

    pub fn value(&self) -> Result<String, ValueError> {
        if self.raw.is_empty() {
            return Ok(String::new());
        }

        if let Some(resolved) = resolve_reference(&self.raw, self.binding)? {
            return match resolved {
                Value::Str(s) => Ok(s),
                Value::Null => Ok(String::new()),
                _ => Err(ValueError::TypeMismatch),
            };
        }

        Ok(self.raw.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_zero_value() {
        assert_eq!(Bool::new("").value().unwrap(), false);
        assert_eq!(Int32::new("").value().unwrap(), 0);
        assert_eq!(Str::new("").value().unwrap(), "");
    }

    #[test]
    fn plain_text_parses_directly() {
        assert!(Bool::new("true").value().unwrap());
        assert!(!Bool::new("false").value().unwrap());
        assert_eq!(Int32::new("42").value().unwrap(), 42);
        assert_eq!(Int32::new("0x2a").value().unwrap(), 42);
        assert_eq!(Str::new("hello").value().unwrap(), "hello");
    }

    #[test]
    fn reference_without_binding_errors() {
        assert!(matches!(
            Bool::new("@0x7f010000").value(),
            Err(ValueError::NoTable)
        ));
    }

    #[test]
    fn malformed_reference_is_bad_resource_id() {
        // Looks like a reference (leading '@') but isn't valid hex.
        assert!(matches!(
            Int32::new("@not-a-ref").value(),
            Err(ValueError::BadResourceId)
        ));
    }

    fn table_with_single_bool_resource() -> ArscTable {
        use crate::structs::resource_table::{
            ResTableEntry, ResTableEntryDefault, ResTablePackage, ResTablePackageHeader, ResTableType,
        };
        use crate::structs::{ResChunkHeader, ResourceType, ResourceValue, ResourceValueType, StringPool};
        use std::collections::HashMap;

        fn empty_pool() -> StringPool {
            let mut out = Vec::new();
            out.extend_from_slice(&1u16.to_le_bytes());
            out.extend_from_slice(&28u16.to_le_bytes());
            out.extend_from_slice(&28u32.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&28u32.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            StringPool::parse(&mut out.as_slice()).expect("valid empty pool")
        }

        let entry = ResTableEntry::Default(ResTableEntryDefault {
            size: 8,
            flags: 0,
            index: 0,
            value: ResourceValue {
                size: 8,
                res: 0,
                data_type: ResourceValueType::Boolean,
                data: 1,
            },
        });
        let ty = ResTableType {
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
            config: ResTableConfig::new(),
            entry_offsets: vec![0],
            entries: vec![entry],
        };
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
            type_strings: empty_pool(),
            key_strings: empty_pool(),
            types: vec![ty],
        };
        let mut packages = HashMap::new();
        packages.insert(0x7f, package);
        ArscTable {
            global_strings: empty_pool(),
            packages,
        }
    }

    #[test]
    fn bound_reference_resolves_through_table() {
        let table = table_with_single_bool_resource();
        let attr = Bool::new("@0x7f010000").bind(&table, None);
        assert!(attr.value().unwrap());
    }

    #[test]
    fn bound_reference_type_mismatch_errors() {
        let table = table_with_single_bool_resource();
        let attr = Str::new("@0x7f010000").bind(&table, None);
        assert!(matches!(attr.value(), Err(ValueError::TypeMismatch)));
    }
}
