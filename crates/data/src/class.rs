//! Class definitions (`dat001.ecf`)

use eoclient_core::{EoError, Result};
use crate::record::{narrow, LayoutEntry, PropertyValue, PubRecord, RecordProperty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ClassType {
    #[default]
    Melee = 0,
    Rogue = 1,
    Magician = 2,
    Archer = 3,
    Peasant = 4,
}

impl ClassType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(ClassType::Melee),
            1 => Some(ClassType::Rogue),
            2 => Some(ClassType::Magician),
            3 => Some(ClassType::Archer),
            4 => Some(ClassType::Peasant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassRecord {
    pub id: u32,
    pub name: String,
    /// Parent class id
    pub base: u8,
    pub class_type: ClassType,
    pub str: u16,
    pub int: u16,
    pub wis: u16,
    pub agi: u16,
    pub con: u16,
    pub cha: u16,
}

const CLASS_LAYOUT: &[LayoutEntry] = &[
    LayoutEntry::Field(RecordProperty::ClassBase, 1),
    LayoutEntry::Field(RecordProperty::ClassType, 1),
    LayoutEntry::Field(RecordProperty::ClassStr, 2),
    LayoutEntry::Field(RecordProperty::ClassInt, 2),
    LayoutEntry::Field(RecordProperty::ClassWis, 2),
    LayoutEntry::Field(RecordProperty::ClassAgi, 2),
    LayoutEntry::Field(RecordProperty::ClassCon, 2),
    LayoutEntry::Field(RecordProperty::ClassCha, 2),
];

impl PubRecord for ClassRecord {
    const FILE_MAGIC: [u8; 3] = *b"ECF";
    const LAYOUT: &'static [LayoutEntry] = CLASS_LAYOUT;

    fn id(&self) -> u32 {
        self.id
    }

    fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    fn names(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }

    fn set_names(&mut self, mut names: Vec<String>) -> Result<()> {
        self.name = names.pop().ok_or_else(|| EoError::InvalidData("Class record without name".into()))?;
        Ok(())
    }

    fn property(&self, property: RecordProperty) -> Option<PropertyValue> {
        use RecordProperty as P;
        let value = match property {
            P::ClassBase => self.base as u32,
            P::ClassType => self.class_type as u32,
            P::ClassStr => self.str as u32,
            P::ClassInt => self.int as u32,
            P::ClassWis => self.wis as u32,
            P::ClassAgi => self.agi as u32,
            P::ClassCon => self.con as u32,
            P::ClassCha => self.cha as u32,
            _ => return None,
        };
        Some(PropertyValue::Number(value))
    }

    fn set_property(&mut self, property: RecordProperty, value: u32) -> Result<()> {
        use RecordProperty as P;
        match property {
            P::ClassBase => self.base = narrow(property, value)?,
            P::ClassType => {
                self.class_type = ClassType::from_u32(value)
                    .ok_or_else(|| EoError::InvalidData(format!("Unknown class type {}", value)))?
            }
            P::ClassStr => self.str = narrow(property, value)?,
            P::ClassInt => self.int = narrow(property, value)?,
            P::ClassWis => self.wis = narrow(property, value)?,
            P::ClassAgi => self.agi = narrow(property, value)?,
            P::ClassCon => self.con = narrow(property, value)?,
            P::ClassCha => self.cha = narrow(property, value)?,
            _ => return Err(EoError::OutOfRange(property.to_string())),
        }
        Ok(())
    }
}
