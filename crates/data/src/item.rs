//! Item definitions (`dat001.eif`)

use eoclient_core::{EoError, Result};
use crate::record::{narrow, LayoutEntry, PropertyValue, PubRecord, RecordProperty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ItemType {
    #[default]
    Static = 0,
    UnknownType1 = 1,
    Money = 2,
    Heal = 3,
    Teleport = 4,
    Spell = 5,
    ExpReward = 6,
    StatReward = 7,
    SkillReward = 8,
    Key = 9,
    Weapon = 10,
    Shield = 11,
    Armor = 12,
    Hat = 13,
    Boots = 14,
    Gloves = 15,
    Accessory = 16,
    Belt = 17,
    Necklace = 18,
    Ring = 19,
    Armlet = 20,
    Bracer = 21,
    Beer = 22,
    EffectPotion = 23,
    HairDye = 24,
    CureCurse = 25,
}

impl ItemType {
    pub fn from_u32(value: u32) -> Option<Self> {
        use ItemType::*;
        const ALL: [ItemType; 26] = [
            Static, UnknownType1, Money, Heal, Teleport, Spell, ExpReward, StatReward,
            SkillReward, Key, Weapon, Shield, Armor, Hat, Boots, Gloves, Accessory, Belt,
            Necklace, Ring, Armlet, Bracer, Beer, EffectPotion, HairDye, CureCurse,
        ];
        ALL.get(value as usize).copied()
    }

    /// Whether the item occupies a paperdoll slot
    pub fn is_equipment(self) -> bool {
        (ItemType::Weapon as u8..=ItemType::Bracer as u8).contains(&(self as u8))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ItemSubType {
    #[default]
    None = 0,
    Ranged = 1,
    Arrows = 2,
    Wings = 3,
    TwoHanded = 4,
}

impl ItemSubType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(ItemSubType::None),
            1 => Some(ItemSubType::Ranged),
            2 => Some(ItemSubType::Arrows),
            3 => Some(ItemSubType::Wings),
            4 => Some(ItemSubType::TwoHanded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ItemSpecial {
    #[default]
    Normal = 0,
    Rare = 1,
    Legendary = 2,
    Unique = 3,
    Lore = 4,
    Cursed = 5,
}

impl ItemSpecial {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(ItemSpecial::Normal),
            1 => Some(ItemSpecial::Rare),
            2 => Some(ItemSpecial::Legendary),
            3 => Some(ItemSpecial::Unique),
            4 => Some(ItemSpecial::Lore),
            5 => Some(ItemSpecial::Cursed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemRecord {
    pub id: u32,
    pub name: String,
    pub graphic: u16,
    pub item_type: ItemType,
    pub sub_type: ItemSubType,
    pub special: ItemSpecial,
    pub hp: u16,
    pub tp: u16,
    pub min_damage: u16,
    pub max_damage: u16,
    pub accuracy: u16,
    pub evade: u16,
    pub armor: u16,
    pub str: u8,
    pub int: u8,
    pub wis: u8,
    pub agi: u8,
    pub con: u8,
    pub cha: u8,
    pub light: u8,
    pub dark: u8,
    pub earth: u8,
    pub air: u8,
    pub water: u8,
    pub fire: u8,
    /// Scroll map, doll graphic, exp reward, hair color, effect or key,
    /// depending on the item type
    pub spec1: u32,
    pub spec2: u8,
    pub spec3: u8,
    pub level_req: u16,
    pub class_req: u16,
    pub str_req: u16,
    pub int_req: u16,
    pub wis_req: u16,
    pub agi_req: u16,
    pub con_req: u16,
    pub cha_req: u16,
    pub element: u8,
    pub element_damage: u8,
    pub weight: u8,
    pub size: u8,
}

impl ItemRecord {
    /// Paperdoll graphic for equipment
    pub fn doll_graphic(&self) -> Option<u32> {
        self.item_type.is_equipment().then_some(self.spec1)
    }
}

const ITEM_LAYOUT: &[LayoutEntry] = &[
    LayoutEntry::Field(RecordProperty::ItemGraphic, 2),
    LayoutEntry::Field(RecordProperty::ItemType, 1),
    LayoutEntry::Field(RecordProperty::ItemSubType, 1),
    LayoutEntry::Field(RecordProperty::ItemSpecial, 1),
    LayoutEntry::Field(RecordProperty::ItemHp, 2),
    LayoutEntry::Field(RecordProperty::ItemTp, 2),
    LayoutEntry::Field(RecordProperty::ItemMinDamage, 2),
    LayoutEntry::Field(RecordProperty::ItemMaxDamage, 2),
    LayoutEntry::Field(RecordProperty::ItemAccuracy, 2),
    LayoutEntry::Field(RecordProperty::ItemEvade, 2),
    LayoutEntry::Field(RecordProperty::ItemArmor, 2),
    LayoutEntry::Padding(1),
    LayoutEntry::Field(RecordProperty::ItemStr, 1),
    LayoutEntry::Field(RecordProperty::ItemInt, 1),
    LayoutEntry::Field(RecordProperty::ItemWis, 1),
    LayoutEntry::Field(RecordProperty::ItemAgi, 1),
    LayoutEntry::Field(RecordProperty::ItemCon, 1),
    LayoutEntry::Field(RecordProperty::ItemCha, 1),
    LayoutEntry::Field(RecordProperty::ItemLight, 1),
    LayoutEntry::Field(RecordProperty::ItemDark, 1),
    LayoutEntry::Field(RecordProperty::ItemEarth, 1),
    LayoutEntry::Field(RecordProperty::ItemAir, 1),
    LayoutEntry::Field(RecordProperty::ItemWater, 1),
    LayoutEntry::Field(RecordProperty::ItemFire, 1),
    LayoutEntry::Field(RecordProperty::ItemSpec1, 3),
    LayoutEntry::Field(RecordProperty::ItemSpec2, 1),
    LayoutEntry::Field(RecordProperty::ItemSpec3, 1),
    LayoutEntry::Field(RecordProperty::ItemLevelReq, 2),
    LayoutEntry::Field(RecordProperty::ItemClassReq, 2),
    LayoutEntry::Field(RecordProperty::ItemStrReq, 2),
    LayoutEntry::Field(RecordProperty::ItemIntReq, 2),
    LayoutEntry::Field(RecordProperty::ItemWisReq, 2),
    LayoutEntry::Field(RecordProperty::ItemAgiReq, 2),
    LayoutEntry::Field(RecordProperty::ItemConReq, 2),
    LayoutEntry::Field(RecordProperty::ItemChaReq, 2),
    LayoutEntry::Field(RecordProperty::ItemElement, 1),
    LayoutEntry::Field(RecordProperty::ItemElementDamage, 1),
    LayoutEntry::Field(RecordProperty::ItemWeight, 1),
    LayoutEntry::Padding(1),
    LayoutEntry::Field(RecordProperty::ItemSize, 1),
];

impl PubRecord for ItemRecord {
    const FILE_MAGIC: [u8; 3] = *b"EIF";
    const LAYOUT: &'static [LayoutEntry] = ITEM_LAYOUT;

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
        self.name = names.pop().ok_or_else(|| EoError::InvalidData("Item record without name".into()))?;
        Ok(())
    }

    fn property(&self, property: RecordProperty) -> Option<PropertyValue> {
        use RecordProperty as P;
        let value = match property {
            P::ItemGraphic => self.graphic as u32,
            P::ItemType => self.item_type as u32,
            P::ItemSubType => self.sub_type as u32,
            P::ItemSpecial => self.special as u32,
            P::ItemHp => self.hp as u32,
            P::ItemTp => self.tp as u32,
            P::ItemMinDamage => self.min_damage as u32,
            P::ItemMaxDamage => self.max_damage as u32,
            P::ItemAccuracy => self.accuracy as u32,
            P::ItemEvade => self.evade as u32,
            P::ItemArmor => self.armor as u32,
            P::ItemStr => self.str as u32,
            P::ItemInt => self.int as u32,
            P::ItemWis => self.wis as u32,
            P::ItemAgi => self.agi as u32,
            P::ItemCon => self.con as u32,
            P::ItemCha => self.cha as u32,
            P::ItemLight => self.light as u32,
            P::ItemDark => self.dark as u32,
            P::ItemEarth => self.earth as u32,
            P::ItemAir => self.air as u32,
            P::ItemWater => self.water as u32,
            P::ItemFire => self.fire as u32,
            P::ItemSpec1 => self.spec1,
            P::ItemSpec2 => self.spec2 as u32,
            P::ItemSpec3 => self.spec3 as u32,
            P::ItemLevelReq => self.level_req as u32,
            P::ItemClassReq => self.class_req as u32,
            P::ItemStrReq => self.str_req as u32,
            P::ItemIntReq => self.int_req as u32,
            P::ItemWisReq => self.wis_req as u32,
            P::ItemAgiReq => self.agi_req as u32,
            P::ItemConReq => self.con_req as u32,
            P::ItemChaReq => self.cha_req as u32,
            P::ItemElement => self.element as u32,
            P::ItemElementDamage => self.element_damage as u32,
            P::ItemWeight => self.weight as u32,
            P::ItemSize => self.size as u32,
            _ => return None,
        };
        Some(PropertyValue::Number(value))
    }

    fn set_property(&mut self, property: RecordProperty, value: u32) -> Result<()> {
        use RecordProperty as P;
        let unknown = |what: &str| EoError::InvalidData(format!("Unknown item {} {}", what, value));
        match property {
            P::ItemGraphic => self.graphic = narrow(property, value)?,
            P::ItemType => self.item_type = ItemType::from_u32(value).ok_or_else(|| unknown("type"))?,
            P::ItemSubType => self.sub_type = ItemSubType::from_u32(value).ok_or_else(|| unknown("subtype"))?,
            P::ItemSpecial => self.special = ItemSpecial::from_u32(value).ok_or_else(|| unknown("special"))?,
            P::ItemHp => self.hp = narrow(property, value)?,
            P::ItemTp => self.tp = narrow(property, value)?,
            P::ItemMinDamage => self.min_damage = narrow(property, value)?,
            P::ItemMaxDamage => self.max_damage = narrow(property, value)?,
            P::ItemAccuracy => self.accuracy = narrow(property, value)?,
            P::ItemEvade => self.evade = narrow(property, value)?,
            P::ItemArmor => self.armor = narrow(property, value)?,
            P::ItemStr => self.str = narrow(property, value)?,
            P::ItemInt => self.int = narrow(property, value)?,
            P::ItemWis => self.wis = narrow(property, value)?,
            P::ItemAgi => self.agi = narrow(property, value)?,
            P::ItemCon => self.con = narrow(property, value)?,
            P::ItemCha => self.cha = narrow(property, value)?,
            P::ItemLight => self.light = narrow(property, value)?,
            P::ItemDark => self.dark = narrow(property, value)?,
            P::ItemEarth => self.earth = narrow(property, value)?,
            P::ItemAir => self.air = narrow(property, value)?,
            P::ItemWater => self.water = narrow(property, value)?,
            P::ItemFire => self.fire = narrow(property, value)?,
            P::ItemSpec1 => self.spec1 = value,
            P::ItemSpec2 => self.spec2 = narrow(property, value)?,
            P::ItemSpec3 => self.spec3 = narrow(property, value)?,
            P::ItemLevelReq => self.level_req = narrow(property, value)?,
            P::ItemClassReq => self.class_req = narrow(property, value)?,
            P::ItemStrReq => self.str_req = narrow(property, value)?,
            P::ItemIntReq => self.int_req = narrow(property, value)?,
            P::ItemWisReq => self.wis_req = narrow(property, value)?,
            P::ItemAgiReq => self.agi_req = narrow(property, value)?,
            P::ItemConReq => self.con_req = narrow(property, value)?,
            P::ItemChaReq => self.cha_req = narrow(property, value)?,
            P::ItemElement => self.element = narrow(property, value)?,
            P::ItemElementDamage => self.element_damage = narrow(property, value)?,
            P::ItemWeight => self.weight = narrow(property, value)?,
            P::ItemSize => self.size = narrow(property, value)?,
            _ => return Err(EoError::OutOfRange(property.to_string())),
        }
        Ok(())
    }
}
