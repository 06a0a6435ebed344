//! Spell definitions (`dat001.esf`)
//!
//! Spells carry two strings, the name and the shout spoken when casting.
//! Both length bytes come first, then both strings.

use eoclient_core::{EoError, Result};
use crate::record::{narrow, LayoutEntry, PropertyValue, PubRecord, RecordProperty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SpellType {
    #[default]
    Heal = 0,
    Damage = 1,
    Bard = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SpellTargetRestrict {
    #[default]
    Npc = 0,
    Friendly = 1,
    Opponent = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SpellTargetType {
    #[default]
    Normal = 0,
    Myself = 1,
    Reserved = 2,
    Group = 3,
}

impl SpellType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(SpellType::Heal),
            1 => Some(SpellType::Damage),
            2 => Some(SpellType::Bard),
            _ => None,
        }
    }
}

impl SpellTargetRestrict {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(SpellTargetRestrict::Npc),
            1 => Some(SpellTargetRestrict::Friendly),
            2 => Some(SpellTargetRestrict::Opponent),
            _ => None,
        }
    }
}

impl SpellTargetType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(SpellTargetType::Normal),
            1 => Some(SpellTargetType::Myself),
            2 => Some(SpellTargetType::Reserved),
            3 => Some(SpellTargetType::Group),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpellRecord {
    pub id: u32,
    pub name: String,
    pub shout: String,
    pub icon: u16,
    pub graphic: u16,
    pub tp: u16,
    pub sp: u16,
    pub cast_time: u8,
    pub spell_type: SpellType,
    pub element: u8,
    pub element_power: u16,
    pub target_restrict: SpellTargetRestrict,
    pub target_type: SpellTargetType,
    pub max_skill_level: u16,
    pub min_damage: u16,
    pub max_damage: u16,
    pub accuracy: u16,
    pub hp_heal: u16,
    pub tp_heal: u16,
    pub sp_heal: u8,
    pub str: u16,
    pub int: u16,
    pub wis: u16,
    pub agi: u16,
    pub con: u16,
    pub cha: u16,
}

const SPELL_LAYOUT: &[LayoutEntry] = &[
    LayoutEntry::Field(RecordProperty::SpellIcon, 2),
    LayoutEntry::Field(RecordProperty::SpellGraphic, 2),
    LayoutEntry::Field(RecordProperty::SpellTp, 2),
    LayoutEntry::Field(RecordProperty::SpellSp, 2),
    LayoutEntry::Field(RecordProperty::SpellCastTime, 1),
    LayoutEntry::Padding(2),
    LayoutEntry::Field(RecordProperty::SpellType, 3),
    LayoutEntry::Field(RecordProperty::SpellElement, 1),
    LayoutEntry::Field(RecordProperty::SpellElementPower, 2),
    LayoutEntry::Field(RecordProperty::SpellTargetRestrict, 1),
    LayoutEntry::Field(RecordProperty::SpellTargetType, 1),
    LayoutEntry::Padding(4),
    LayoutEntry::Field(RecordProperty::SpellMaxSkillLevel, 2),
    LayoutEntry::Field(RecordProperty::SpellMinDamage, 2),
    LayoutEntry::Field(RecordProperty::SpellMaxDamage, 2),
    LayoutEntry::Field(RecordProperty::SpellAccuracy, 2),
    LayoutEntry::Padding(3),
    LayoutEntry::Field(RecordProperty::SpellHpHeal, 2),
    LayoutEntry::Field(RecordProperty::SpellTpHeal, 2),
    LayoutEntry::Field(RecordProperty::SpellSpHeal, 1),
    LayoutEntry::Field(RecordProperty::SpellStr, 2),
    LayoutEntry::Field(RecordProperty::SpellInt, 2),
    LayoutEntry::Field(RecordProperty::SpellWis, 2),
    LayoutEntry::Field(RecordProperty::SpellAgi, 2),
    LayoutEntry::Field(RecordProperty::SpellCon, 2),
    LayoutEntry::Field(RecordProperty::SpellCha, 2),
];

impl PubRecord for SpellRecord {
    const FILE_MAGIC: [u8; 3] = *b"ESF";
    const LAYOUT: &'static [LayoutEntry] = SPELL_LAYOUT;

    fn id(&self) -> u32 {
        self.id
    }

    fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    fn names(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.shout.as_str()]
    }

    fn set_names(&mut self, names: Vec<String>) -> Result<()> {
        let [name, shout]: [String; 2] = names
            .try_into()
            .map_err(|_| EoError::InvalidData("Spell record needs a name and a shout".into()))?;
        self.name = name;
        self.shout = shout;
        Ok(())
    }

    fn name_count() -> usize {
        2
    }

    fn property(&self, property: RecordProperty) -> Option<PropertyValue> {
        use RecordProperty as P;
        let value = match property {
            P::SpellShout => return Some(PropertyValue::Text(self.shout.clone())),
            P::SpellIcon => self.icon as u32,
            P::SpellGraphic => self.graphic as u32,
            P::SpellTp => self.tp as u32,
            P::SpellSp => self.sp as u32,
            P::SpellCastTime => self.cast_time as u32,
            P::SpellType => self.spell_type as u32,
            P::SpellElement => self.element as u32,
            P::SpellElementPower => self.element_power as u32,
            P::SpellTargetRestrict => self.target_restrict as u32,
            P::SpellTargetType => self.target_type as u32,
            P::SpellMaxSkillLevel => self.max_skill_level as u32,
            P::SpellMinDamage => self.min_damage as u32,
            P::SpellMaxDamage => self.max_damage as u32,
            P::SpellAccuracy => self.accuracy as u32,
            P::SpellHpHeal => self.hp_heal as u32,
            P::SpellTpHeal => self.tp_heal as u32,
            P::SpellSpHeal => self.sp_heal as u32,
            P::SpellStr => self.str as u32,
            P::SpellInt => self.int as u32,
            P::SpellWis => self.wis as u32,
            P::SpellAgi => self.agi as u32,
            P::SpellCon => self.con as u32,
            P::SpellCha => self.cha as u32,
            _ => return None,
        };
        Some(PropertyValue::Number(value))
    }

    fn set_property(&mut self, property: RecordProperty, value: u32) -> Result<()> {
        use RecordProperty as P;
        let unknown = |what: &str| EoError::InvalidData(format!("Unknown spell {} {}", what, value));
        match property {
            P::SpellIcon => self.icon = narrow(property, value)?,
            P::SpellGraphic => self.graphic = narrow(property, value)?,
            P::SpellTp => self.tp = narrow(property, value)?,
            P::SpellSp => self.sp = narrow(property, value)?,
            P::SpellCastTime => self.cast_time = narrow(property, value)?,
            P::SpellType => self.spell_type = SpellType::from_u32(value).ok_or_else(|| unknown("type"))?,
            P::SpellElement => self.element = narrow(property, value)?,
            P::SpellElementPower => self.element_power = narrow(property, value)?,
            P::SpellTargetRestrict => {
                self.target_restrict =
                    SpellTargetRestrict::from_u32(value).ok_or_else(|| unknown("target restriction"))?
            }
            P::SpellTargetType => {
                self.target_type = SpellTargetType::from_u32(value).ok_or_else(|| unknown("target type"))?
            }
            P::SpellMaxSkillLevel => self.max_skill_level = narrow(property, value)?,
            P::SpellMinDamage => self.min_damage = narrow(property, value)?,
            P::SpellMaxDamage => self.max_damage = narrow(property, value)?,
            P::SpellAccuracy => self.accuracy = narrow(property, value)?,
            P::SpellHpHeal => self.hp_heal = narrow(property, value)?,
            P::SpellTpHeal => self.tp_heal = narrow(property, value)?,
            P::SpellSpHeal => self.sp_heal = narrow(property, value)?,
            P::SpellStr => self.str = narrow(property, value)?,
            P::SpellInt => self.int = narrow(property, value)?,
            P::SpellWis => self.wis = narrow(property, value)?,
            P::SpellAgi => self.agi = narrow(property, value)?,
            P::SpellCon => self.con = narrow(property, value)?,
            P::SpellCha => self.cha = narrow(property, value)?,
            _ => return Err(EoError::OutOfRange(property.to_string())),
        }
        Ok(())
    }
}
