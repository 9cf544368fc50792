//! Compiled resource table (`resources.arsc`).
//!
//! Only one value per entry is kept, the one of the default configuration when there is one.
//! That is enough to map the numeric references of a compiled manifest back to the files they
//! point to.

use super::resource::ResourceRef;
use crate::error::Kind;
use anyhow::{Context, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::{collections::HashMap, io::Cursor};

const STRING_POOL_CHUNK: u16 = 0x0001;
const TABLE_CHUNK: u16 = 0x0002;
const PACKAGE_CHUNK: u16 = 0x0200;
const TYPE_CHUNK: u16 = 0x0201;

const CHUNK_HEADER_SIZE: usize = 8;
const UTF8_FLAG: u32 = 1 << 8;

const SPARSE_FLAG: u8 = 0x01;
const OFFSET16_FLAG: u8 = 0x02;
const NO_ENTRY: u32 = 0xffff_ffff;
const NO_ENTRY16: u16 = 0xffff;

const COMPLEX_ENTRY: u16 = 0x0001;
const COMPACT_ENTRY: u16 = 0x0008;
const STRING_VALUE: u8 = 0x03;

/// Entry of the resource table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    /// Resource type: `xml`, `string`, `raw`…
    pub type_name: String,
    /// Resource name.
    pub key: String,
    /// String value. For file based resources, the path of the file inside the package.
    pub value: Option<String>,
}

/// Resource table of an APK, indexed by resource identifier.
#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
    entries: HashMap<u32, TableEntry>,
}

impl ResourceTable {
    /// Parses a `resources.arsc` file.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let table = Chunk::read(bytes, 0)?;
        if table.ty != TABLE_CHUNK {
            return Err(malformed(format!(
                "unexpected chunk type {:#06x} at the start of the resource table",
                table.ty
            )));
        }

        let mut strings = Vec::new();
        let mut entries = HashMap::new();
        for chunk in table.children(bytes)? {
            match chunk.ty {
                STRING_POOL_CHUNK => strings = read_string_pool(chunk.bytes(bytes))?,
                PACKAGE_CHUNK => read_package(chunk.bytes(bytes), &strings, &mut entries)
                    .context("invalid package in the resource table")?,
                _ => {}
            }
        }

        Ok(Self { entries })
    }

    /// Gets the entry with the given identifier.
    pub fn get(&self, id: u32) -> Option<&TableEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a numeric reference. Any other reference, or an identifier missing from the
    /// table, is returned unchanged.
    pub fn resolve(&self, reference: &ResourceRef) -> ResourceRef {
        let Some(entry) = reference.id().and_then(|id| self.get(id)) else {
            return reference.clone();
        };

        match (entry.type_name.as_str(), &entry.value) {
            ("string", _) => ResourceRef::DeferredString(entry.key.clone()),
            // Shrunk packages rename resource files, the table has the real path.
            (_, Some(path)) if path.starts_with("res/") => ResourceRef::File(path.clone()),
            (type_name, _) => ResourceRef::resolve(&format!("@{}/{}", type_name, entry.key)),
        }
    }
}

/// Chunk header with its position in the buffer.
#[derive(Debug, Clone, Copy)]
struct Chunk {
    ty: u16,
    header_size: usize,
    start: usize,
    size: usize,
}

impl Chunk {
    fn read(bytes: &[u8], start: usize) -> Result<Self> {
        let mut reader = Cursor::new(slice(bytes, start, CHUNK_HEADER_SIZE)?);
        let ty = reader.read_u16::<LittleEndian>()?;
        let header_size = usize::from(reader.read_u16::<LittleEndian>()?);
        let size = reader.read_u32::<LittleEndian>()? as usize;

        if header_size < CHUNK_HEADER_SIZE || size < header_size || start + size > bytes.len() {
            return Err(malformed(format!(
                "invalid chunk {:#06x} at offset {} (header {} bytes, size {} bytes)",
                ty, start, header_size, size
            )));
        }

        Ok(Self {
            ty,
            header_size,
            start,
            size,
        })
    }

    fn bytes<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[self.start..self.start + self.size]
    }

    /// Chunks following the header of this one.
    fn children(&self, bytes: &[u8]) -> Result<Vec<Self>> {
        let end = self.start + self.size;
        let mut offset = self.start + self.header_size;
        let mut children = Vec::new();
        while offset + CHUNK_HEADER_SIZE <= end {
            let child = Self::read(&bytes[..end], offset)?;
            offset += child.size;
            children.push(child);
        }
        Ok(children)
    }
}

fn read_package(
    package: &[u8],
    strings: &[String],
    entries: &mut HashMap<u32, TableEntry>,
) -> Result<()> {
    let header = Chunk::read(package, 0)?;
    let mut reader = Cursor::new(slice(package, CHUNK_HEADER_SIZE, 4)?);
    let package_id = reader.read_u32::<LittleEndian>()?;

    // id, then the 128 UTF-16 units of the package name.
    let mut reader = Cursor::new(slice(package, CHUNK_HEADER_SIZE + 4 + 256, 12)?);
    let type_strings = reader.read_u32::<LittleEndian>()? as usize;
    let _last_public_type = reader.read_u32::<LittleEndian>()?;
    let key_strings = reader.read_u32::<LittleEndian>()? as usize;

    let type_names = read_string_pool(Chunk::read(package, type_strings)?.bytes(package))?;
    let keys = read_string_pool(Chunk::read(package, key_strings)?.bytes(package))?;

    let mut defaults = HashMap::new();
    for chunk in header.children(package)? {
        if chunk.ty != TYPE_CHUNK {
            continue;
        }

        let table_type = read_type(chunk.bytes(package))?;
        let Some(type_name) = usize::from(table_type.id)
            .checked_sub(1)
            .and_then(|i| type_names.get(i))
        else {
            continue;
        };

        for (index, key, value) in table_type.entries {
            let id = (package_id << 24) | (u32::from(table_type.id) << 16) | index;
            if defaults.get(&id).copied().unwrap_or(false) {
                continue;
            }
            let key = keys.get(key as usize).cloned().unwrap_or_default();
            let value = value.and_then(|v| strings.get(v as usize).cloned());

            let _ = defaults.insert(id, table_type.default_config);
            let _ = entries.insert(
                id,
                TableEntry {
                    type_name: type_name.clone(),
                    key,
                    value,
                },
            );
        }
    }

    Ok(())
}

/// Entries of one type chunk, for one configuration.
struct TableType {
    id: u8,
    default_config: bool,
    /// Entry index, key string index and global string index of the value.
    entries: Vec<(u32, u32, Option<u32>)>,
}

fn read_type(chunk: &[u8]) -> Result<TableType> {
    let header = Chunk::read(chunk, 0)?;
    let mut reader = Cursor::new(slice(chunk, CHUNK_HEADER_SIZE, 16)?);
    let id = reader.read_u8()?;
    let flags = reader.read_u8()?;
    let _reserved = reader.read_u16::<LittleEndian>()?;
    let entry_count = reader.read_u32::<LittleEndian>()? as usize;
    let entries_start = reader.read_u32::<LittleEndian>()? as usize;
    let config_size = reader.read_u32::<LittleEndian>()? as usize;

    let config = slice(chunk, CHUNK_HEADER_SIZE + 12, config_size.max(4))?;
    let default_config = config[4..].iter().all(|b| *b == 0);

    let mut offsets = Vec::with_capacity(entry_count);
    let mut reader = Cursor::new(chunk.get(header.header_size..).unwrap_or_default());
    for index in 0..entry_count as u32 {
        if flags & SPARSE_FLAG != 0 {
            let index = u32::from(reader.read_u16::<LittleEndian>()?);
            let offset = usize::from(reader.read_u16::<LittleEndian>()?) * 4;
            offsets.push((index, offset));
        } else if flags & OFFSET16_FLAG != 0 {
            let offset = reader.read_u16::<LittleEndian>()?;
            if offset != NO_ENTRY16 {
                offsets.push((index, usize::from(offset) * 4));
            }
        } else {
            let offset = reader.read_u32::<LittleEndian>()?;
            if offset != NO_ENTRY {
                offsets.push((index, offset as usize));
            }
        }
    }

    let mut entries = Vec::with_capacity(offsets.len());
    for (index, offset) in offsets {
        let mut reader = Cursor::new(slice(chunk, entries_start + offset, 8)?);
        let size = reader.read_u16::<LittleEndian>()?;
        let entry_flags = reader.read_u16::<LittleEndian>()?;

        let (key, value) = if entry_flags & COMPACT_ENTRY != 0 {
            // The key index takes the place of the size, the value type the high flag byte.
            let data = reader.read_u32::<LittleEndian>()?;
            let value = ((entry_flags >> 8) as u8 == STRING_VALUE).then_some(data);
            (u32::from(size), value)
        } else {
            let key = reader.read_u32::<LittleEndian>()?;
            let value = if entry_flags & COMPLEX_ENTRY != 0 {
                None
            } else {
                let mut reader =
                    Cursor::new(slice(chunk, entries_start + offset + usize::from(size), 8)?);
                let _value_size = reader.read_u16::<LittleEndian>()?;
                let _res0 = reader.read_u8()?;
                let data_type = reader.read_u8()?;
                let data = reader.read_u32::<LittleEndian>()?;
                (data_type == STRING_VALUE).then_some(data)
            };
            (key, value)
        };
        entries.push((index, key, value));
    }

    Ok(TableType {
        id,
        default_config,
        entries,
    })
}

fn read_string_pool(chunk: &[u8]) -> Result<Vec<String>> {
    let header = Chunk::read(chunk, 0)?;
    if header.ty != STRING_POOL_CHUNK {
        return Err(malformed(format!(
            "expected a string pool, found chunk type {:#06x}",
            header.ty
        )));
    }

    let mut reader = Cursor::new(slice(chunk, CHUNK_HEADER_SIZE, 20)?);
    let string_count = reader.read_u32::<LittleEndian>()? as usize;
    let _style_count = reader.read_u32::<LittleEndian>()?;
    let flags = reader.read_u32::<LittleEndian>()?;
    let strings_start = reader.read_u32::<LittleEndian>()? as usize;

    let mut offsets = Cursor::new(slice(chunk, header.header_size, string_count * 4)?);
    let data = chunk.get(strings_start..).unwrap_or_default();
    let mut strings = Vec::with_capacity(string_count);
    for _ in 0..string_count {
        let offset = offsets.read_u32::<LittleEndian>()? as usize;
        let string = if flags & UTF8_FLAG != 0 {
            read_utf8(data, offset)
        } else {
            read_utf16(data, offset)
        };
        strings.push(string.context("string out of the string pool bounds")?);
    }

    Ok(strings)
}

fn read_utf8(data: &[u8], offset: usize) -> Result<String> {
    let mut reader = Cursor::new(data.get(offset..).unwrap_or_default());
    let length = |reader: &mut Cursor<&[u8]>| -> Result<usize> {
        let first = usize::from(reader.read_u8()?);
        Ok(if first & 0x80 != 0 {
            ((first & 0x7f) << 8) | usize::from(reader.read_u8()?)
        } else {
            first
        })
    };
    let _chars = length(&mut reader)?;
    let bytes = length(&mut reader)?;
    let start = offset + reader.position() as usize;

    Ok(String::from_utf8_lossy(slice(data, start, bytes)?).into_owned())
}

fn read_utf16(data: &[u8], offset: usize) -> Result<String> {
    let mut reader = Cursor::new(data.get(offset..).unwrap_or_default());
    let first = usize::from(reader.read_u16::<LittleEndian>()?);
    let units = if first & 0x8000 != 0 {
        ((first & 0x7fff) << 16) | usize::from(reader.read_u16::<LittleEndian>()?)
    } else {
        first
    };

    let mut string = Vec::with_capacity(units);
    for _ in 0..units {
        string.push(reader.read_u16::<LittleEndian>()?);
    }
    Ok(String::from_utf16_lossy(&string))
}

fn slice(bytes: &[u8], start: usize, len: usize) -> Result<&[u8]> {
    bytes.get(start..start + len).ok_or_else(|| {
        malformed(format!(
            "{} bytes at offset {} are out of bounds ({} bytes)",
            len,
            start,
            bytes.len()
        ))
    })
}

fn malformed(message: String) -> anyhow::Error {
    Kind::Parse {
        message: format!("malformed resource table: {}", message),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::ResourceTable;
    use crate::static_analysis::manifest::ResourceRef;

    const TABLE: &[u8] = include_bytes!("../../../tests/fixtures/compiled/resources.arsc");

    #[test]
    fn it_parses_the_resource_table() {
        let table = ResourceTable::parse(TABLE).unwrap();
        assert_eq!(table.len(), 5);

        let nsc = table.get(0x7f13_0000).unwrap();
        assert_eq!(nsc.type_name, "xml");
        assert_eq!(nsc.key, "network_security_config");
        assert_eq!(nsc.value.as_deref(), Some("res/Ab.xml"));

        // The default configuration wins over the localized one.
        let label = table.get(0x7f0f_0000).unwrap();
        assert_eq!(label.type_name, "string");
        assert_eq!(label.value.as_deref(), Some("Example"));

        assert!(table.get(0x7f13_0003).is_none());
        assert!(table.get(0x7e13_0000).is_none());
    }

    #[test]
    fn it_resolves_compiled_references() {
        let table = ResourceTable::parse(TABLE).unwrap();

        assert_eq!(
            table.resolve(&ResourceRef::resolve("@0x7f130000")),
            ResourceRef::File("res/Ab.xml".to_owned())
        );
        assert_eq!(
            table.resolve(&ResourceRef::resolve("@0x7f130001")),
            ResourceRef::File("res/xml/backup_rules.xml".to_owned())
        );
        assert_eq!(
            table.resolve(&ResourceRef::resolve("@0x7f0f0000")),
            ResourceRef::DeferredString("app_name".to_owned())
        );
        // Unknown identifiers and text references are kept.
        assert_eq!(
            table.resolve(&ResourceRef::resolve("@0x7f130009")),
            ResourceRef::Unresolved("@0x7f130009".to_owned())
        );
        assert_eq!(
            table.resolve(&ResourceRef::resolve("@xml/rules")),
            ResourceRef::File("res/xml/rules.xml".to_owned())
        );
    }

    #[test]
    fn it_rejects_truncated_tables() {
        assert!(ResourceTable::parse(&[]).is_err());
        assert!(ResourceTable::parse(&TABLE[..TABLE.len() / 2]).is_err());
        // An AXML document is not a resource table.
        assert!(ResourceTable::parse(&[0x03, 0x00, 0x08, 0x00, 0x08, 0x00, 0x00, 0x00]).is_err());
    }
}
