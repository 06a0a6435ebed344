//! # Record Codec
//!
//! Pub file records (NPCs, items, spells, classes) share one binary shape:
//!
//! ```text
//! {BYTE name length}...{name bytes}...{fixed data}
//! ```
//!
//! The fixed data is described per record type by a layout table of
//! numeric fields and reserved padding. Padding is written as
//! [`PADDING_BYTE`] and skipped on read, so a record survives a round trip
//! byte for byte.
//!
//! Every field in a layout is also addressable through [`RecordProperty`],
//! which backs the typed [`PubRecord::get`] accessor.

use bytes::BytesMut;
use eoclient_core::{EoError, Result};
use eoclient_protocol::codecs::{
    decode_number, read_fixed_string, read_number, write_number, CHAR_WIDTH, PADDING_BYTE,
};

/// Logical identifier of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordProperty {
    GlobalId,
    GlobalName,

    NpcGraphic,
    NpcBoss,
    NpcChild,
    NpcType,
    NpcVendorId,
    NpcHp,
    NpcMinDamage,
    NpcMaxDamage,
    NpcAccuracy,
    NpcEvade,
    NpcArmor,
    NpcExp,

    ItemGraphic,
    ItemType,
    ItemSubType,
    ItemSpecial,
    ItemHp,
    ItemTp,
    ItemMinDamage,
    ItemMaxDamage,
    ItemAccuracy,
    ItemEvade,
    ItemArmor,
    ItemStr,
    ItemInt,
    ItemWis,
    ItemAgi,
    ItemCon,
    ItemCha,
    ItemLight,
    ItemDark,
    ItemEarth,
    ItemAir,
    ItemWater,
    ItemFire,
    /// Scroll map, doll graphic, exp reward, hair color, effect or key
    ItemSpec1,
    /// Gender or scroll x
    ItemSpec2,
    /// Scroll y
    ItemSpec3,
    ItemLevelReq,
    ItemClassReq,
    ItemStrReq,
    ItemIntReq,
    ItemWisReq,
    ItemAgiReq,
    ItemConReq,
    ItemChaReq,
    ItemElement,
    ItemElementDamage,
    ItemWeight,
    ItemSize,

    SpellShout,
    SpellIcon,
    SpellGraphic,
    SpellTp,
    SpellSp,
    SpellCastTime,
    SpellType,
    SpellElement,
    SpellElementPower,
    SpellTargetRestrict,
    SpellTargetType,
    SpellMaxSkillLevel,
    SpellMinDamage,
    SpellMaxDamage,
    SpellAccuracy,
    SpellHpHeal,
    SpellTpHeal,
    SpellSpHeal,
    SpellStr,
    SpellInt,
    SpellWis,
    SpellAgi,
    SpellCon,
    SpellCha,

    ClassBase,
    ClassType,
    ClassStr,
    ClassInt,
    ClassWis,
    ClassAgi,
    ClassCon,
    ClassCha,
}

impl std::fmt::Display for RecordProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One entry of a fixed data layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutEntry {
    /// A numeric field of the given encoded width
    Field(RecordProperty, usize),
    /// Reserved bytes, written as [`PADDING_BYTE`]
    Padding(usize),
}

/// Total byte size of a layout
pub const fn layout_size(layout: &[LayoutEntry]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < layout.len() {
        total += match layout[i] {
            LayoutEntry::Field(_, width) => width,
            LayoutEntry::Padding(count) => count,
        };
        i += 1;
    }
    total
}

/// Untyped value of a record property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Number(u32),
    Text(String),
}

/// Conversion target for [`PubRecord::get`]
pub trait FromProperty: Sized {
    const TYPE_NAME: &'static str;

    fn from_property(value: PropertyValue) -> Option<Self>;
}

impl FromProperty for PropertyValue {
    const TYPE_NAME: &'static str = "PropertyValue";

    fn from_property(value: PropertyValue) -> Option<Self> {
        Some(value)
    }
}

impl FromProperty for String {
    const TYPE_NAME: &'static str = "String";

    fn from_property(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Text(text) => Some(text),
            PropertyValue::Number(_) => None,
        }
    }
}

macro_rules! numeric_from_property {
    ($($ty:ty),*) => {
        $(
            impl FromProperty for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);

                fn from_property(value: PropertyValue) -> Option<Self> {
                    match value {
                        PropertyValue::Number(n) => <$ty>::try_from(n).ok(),
                        PropertyValue::Text(_) => None,
                    }
                }
            }
        )*
    };
}

numeric_from_property!(u8, u16, u32, u64, i32, i64, usize);

/// Narrow a decoded field into its struct type
pub(crate) fn narrow<T: TryFrom<u32>>(property: RecordProperty, value: u32) -> Result<T> {
    T::try_from(value)
        .map_err(|_| EoError::InvalidData(format!("{} value {} out of range", property, value)))
}

/// A fixed-layout pub file record
pub trait PubRecord: Clone + Default + std::fmt::Debug {
    /// Three-byte file magic ("ENF", "EIF", ...)
    const FILE_MAGIC: [u8; 3];
    /// Fixed data layout following the names
    const LAYOUT: &'static [LayoutEntry];
    /// Size of the fixed data part
    const DATA_SIZE: usize = layout_size(Self::LAYOUT);

    fn id(&self) -> u32;
    fn set_id(&mut self, id: u32);

    /// Length-prefixed names in wire order (most records have one)
    fn names(&self) -> Vec<&str>;
    fn set_names(&mut self, names: Vec<String>) -> Result<()>;

    /// Number of names preceding the fixed data
    fn name_count() -> usize {
        1
    }

    /// Value of a record-specific property, `None` if it does not apply
    fn property(&self, property: RecordProperty) -> Option<PropertyValue>;

    /// Store a decoded numeric field from the layout
    fn set_property(&mut self, property: RecordProperty, value: u32) -> Result<()>;

    fn name(&self) -> &str {
        self.names().first().copied().unwrap_or_default()
    }

    /// Typed property lookup
    ///
    /// # Errors
    /// - `OutOfRange` if the property does not belong to this record type
    /// - `InvalidCast` if the value cannot be represented as `T`
    fn get<T: FromProperty>(&self, property: RecordProperty) -> Result<T> {
        let value = match property {
            RecordProperty::GlobalId => Some(PropertyValue::Number(self.id())),
            RecordProperty::GlobalName => Some(PropertyValue::Text(self.name().to_string())),
            other => self.property(other),
        }
        .ok_or_else(|| EoError::OutOfRange(property.to_string()))?;

        T::from_property(value).ok_or_else(|| EoError::InvalidCast {
            property: property.to_string(),
            requested: T::TYPE_NAME,
        })
    }
}

/// Encode a record: names, then the fixed data
pub fn serialize<R: PubRecord>(record: &R) -> Result<Vec<u8>> {
    let names = record.names();
    let mut buf = BytesMut::with_capacity(R::DATA_SIZE + names.iter().map(|n| n.len() + 1).sum::<usize>());

    for name in &names {
        write_number(&mut buf, name.len() as u32, CHAR_WIDTH)?;
    }
    for name in &names {
        buf.extend_from_slice(name.as_bytes());
    }

    buf.extend_from_slice(&serialize_data(record)?);
    Ok(buf.to_vec())
}

/// Encode only the fixed data part of a record
pub fn serialize_data<R: PubRecord>(record: &R) -> Result<Vec<u8>> {
    let mut buf = BytesMut::with_capacity(R::DATA_SIZE);

    for entry in R::LAYOUT {
        match *entry {
            LayoutEntry::Field(property, width) => {
                let value = record.get::<u32>(property)?;
                write_number(&mut buf, value, width)?;
            }
            LayoutEntry::Padding(count) => buf.extend(std::iter::repeat(PADDING_BYTE).take(count)),
        }
    }

    Ok(buf.to_vec())
}

/// Decode a complete record (names and fixed data)
///
/// The bytes following the names must be exactly `R::DATA_SIZE` long.
pub fn deserialize<R: PubRecord>(bytes: &[u8]) -> Result<R> {
    let mut buf = bytes;
    let (names, data) = split_names::<R>(&mut buf)?;

    let mut record = R::default();
    record.set_names(names)?;
    deserialize_data(&mut record, data)?;
    Ok(record)
}

/// Decode the fixed data part into `record`
///
/// `record` is left untouched on failure.
pub fn deserialize_data<R: PubRecord>(record: &mut R, bytes: &[u8]) -> Result<()> {
    if bytes.len() != R::DATA_SIZE {
        return Err(EoError::InvalidRecordLength {
            expected: R::DATA_SIZE,
            actual: bytes.len(),
        });
    }

    let mut decoded = record.clone();
    let mut offset = 0;
    for entry in R::LAYOUT {
        match *entry {
            LayoutEntry::Field(property, width) => {
                let value = decode_number(&bytes[offset..offset + width])?;
                decoded.set_property(property, value)?;
                offset += width;
            }
            LayoutEntry::Padding(count) => offset += count,
        }
    }

    *record = decoded;
    Ok(())
}

/// Read the length-prefixed names from the front of `buf`
///
/// Returns the names and the remaining bytes, which are not validated.
pub(crate) fn split_names<'a, R: PubRecord>(buf: &mut &'a [u8]) -> Result<(Vec<String>, &'a [u8])> {
    let count = R::name_count();
    let mut lengths = Vec::with_capacity(count);
    for _ in 0..count {
        lengths.push(read_number(buf, CHAR_WIDTH)? as usize);
    }

    let mut names = Vec::with_capacity(count);
    for len in lengths {
        names.push(read_fixed_string(buf, len)?);
    }

    let rest: &'a [u8] = *buf;
    Ok((names, rest))
}

/// Encoded size of a record starting at the front of `bytes`
pub(crate) fn encoded_len<R: PubRecord>(bytes: &[u8]) -> Result<usize> {
    let mut buf = bytes;
    let (_, rest) = split_names::<R>(&mut buf)?;
    let header = bytes.len() - rest.len();
    if rest.len() < R::DATA_SIZE {
        return Err(EoError::InvalidRecordLength {
            expected: R::DATA_SIZE,
            actual: rest.len(),
        });
    }
    Ok(header + R::DATA_SIZE)
}
