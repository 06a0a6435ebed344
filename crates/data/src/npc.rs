//! NPC definitions (`dat001.enf`)

use eoclient_core::{EoError, Result};
use crate::record::{narrow, LayoutEntry, PropertyValue, PubRecord, RecordProperty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum NpcType {
    #[default]
    Npc = 0,
    Passive = 1,
    Aggressive = 2,
    Unknown1 = 3,
    Unknown2 = 4,
    Unknown3 = 5,
    Shop = 6,
    Inn = 7,
    Unknown4 = 8,
    Bank = 9,
    Barber = 10,
    Guild = 11,
    Priest = 12,
    Law = 13,
    Skills = 14,
    Quest = 15,
}

impl NpcType {
    pub fn from_u32(value: u32) -> Option<Self> {
        use NpcType::*;
        let npc_type = match value {
            0 => Npc,
            1 => Passive,
            2 => Aggressive,
            3 => Unknown1,
            4 => Unknown2,
            5 => Unknown3,
            6 => Shop,
            7 => Inn,
            8 => Unknown4,
            9 => Bank,
            10 => Barber,
            11 => Guild,
            12 => Priest,
            13 => Law,
            14 => Skills,
            15 => Quest,
            _ => return None,
        };
        Some(npc_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NpcRecord {
    pub id: u32,
    pub name: String,
    pub graphic: u16,
    pub boss: u16,
    pub child: u16,
    pub npc_type: NpcType,
    pub vendor_id: u16,
    pub hp: u32,
    pub min_damage: u16,
    pub max_damage: u16,
    pub accuracy: u16,
    pub evade: u16,
    pub armor: u16,
    pub exp: u16,
}

const NPC_LAYOUT: &[LayoutEntry] = &[
    LayoutEntry::Field(RecordProperty::NpcGraphic, 2),
    LayoutEntry::Padding(1),
    LayoutEntry::Field(RecordProperty::NpcBoss, 2),
    LayoutEntry::Field(RecordProperty::NpcChild, 2),
    LayoutEntry::Field(RecordProperty::NpcType, 2),
    LayoutEntry::Field(RecordProperty::NpcVendorId, 2),
    LayoutEntry::Field(RecordProperty::NpcHp, 3),
    LayoutEntry::Padding(2),
    LayoutEntry::Field(RecordProperty::NpcMinDamage, 2),
    LayoutEntry::Field(RecordProperty::NpcMaxDamage, 2),
    LayoutEntry::Field(RecordProperty::NpcAccuracy, 2),
    LayoutEntry::Field(RecordProperty::NpcEvade, 2),
    LayoutEntry::Field(RecordProperty::NpcArmor, 2),
    LayoutEntry::Padding(10),
    LayoutEntry::Field(RecordProperty::NpcExp, 2),
    LayoutEntry::Padding(1),
];

impl PubRecord for NpcRecord {
    const FILE_MAGIC: [u8; 3] = *b"ENF";
    const LAYOUT: &'static [LayoutEntry] = NPC_LAYOUT;

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
        self.name = names.pop().ok_or_else(|| EoError::InvalidData("NPC record without name".into()))?;
        Ok(())
    }

    fn property(&self, property: RecordProperty) -> Option<PropertyValue> {
        use RecordProperty as P;
        let value = match property {
            P::NpcGraphic => self.graphic as u32,
            P::NpcBoss => self.boss as u32,
            P::NpcChild => self.child as u32,
            P::NpcType => self.npc_type as u32,
            P::NpcVendorId => self.vendor_id as u32,
            P::NpcHp => self.hp,
            P::NpcMinDamage => self.min_damage as u32,
            P::NpcMaxDamage => self.max_damage as u32,
            P::NpcAccuracy => self.accuracy as u32,
            P::NpcEvade => self.evade as u32,
            P::NpcArmor => self.armor as u32,
            P::NpcExp => self.exp as u32,
            _ => return None,
        };
        Some(PropertyValue::Number(value))
    }

    fn set_property(&mut self, property: RecordProperty, value: u32) -> Result<()> {
        use RecordProperty as P;
        match property {
            P::NpcGraphic => self.graphic = narrow(property, value)?,
            P::NpcBoss => self.boss = narrow(property, value)?,
            P::NpcChild => self.child = narrow(property, value)?,
            P::NpcType => {
                self.npc_type = NpcType::from_u32(value)
                    .ok_or_else(|| EoError::InvalidData(format!("Unknown NPC type {}", value)))?
            }
            P::NpcVendorId => self.vendor_id = narrow(property, value)?,
            P::NpcHp => self.hp = value,
            P::NpcMinDamage => self.min_damage = narrow(property, value)?,
            P::NpcMaxDamage => self.max_damage = narrow(property, value)?,
            P::NpcAccuracy => self.accuracy = narrow(property, value)?,
            P::NpcEvade => self.evade = narrow(property, value)?,
            P::NpcArmor => self.armor = narrow(property, value)?,
            P::NpcExp => self.exp = narrow(property, value)?,
            _ => return Err(EoError::OutOfRange(property.to_string())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{deserialize, deserialize_data, serialize};
    use eoclient_protocol::codecs::encode_number;

    fn test_record() -> NpcRecord {
        NpcRecord {
            id: 1,
            name: "TestName".to_string(),
            graphic: 123,
            boss: 321,
            child: 4321,
            npc_type: NpcType::Barber,
            vendor_id: 1234,
            hp: 123456,
            min_damage: 16543,
            max_damage: 16544,
            accuracy: 31313,
            evade: 13131,
            armor: 222,
            exp: 44332,
        }
    }

    fn expected_data(rec: &NpcRecord) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(encode_number(rec.graphic as u32, 2).unwrap());
        bytes.push(254);
        bytes.extend(encode_number(rec.boss as u32, 2).unwrap());
        bytes.extend(encode_number(rec.child as u32, 2).unwrap());
        bytes.extend(encode_number(rec.npc_type as u32, 2).unwrap());
        bytes.extend(encode_number(rec.vendor_id as u32, 2).unwrap());
        bytes.extend(encode_number(rec.hp, 3).unwrap());
        bytes.extend([254; 2]);
        bytes.extend(encode_number(rec.min_damage as u32, 2).unwrap());
        bytes.extend(encode_number(rec.max_damage as u32, 2).unwrap());
        bytes.extend(encode_number(rec.accuracy as u32, 2).unwrap());
        bytes.extend(encode_number(rec.evade as u32, 2).unwrap());
        bytes.extend(encode_number(rec.armor as u32, 2).unwrap());
        bytes.extend([254; 10]);
        bytes.extend(encode_number(rec.exp as u32, 2).unwrap());
        bytes.push(254);
        bytes
    }

    #[test]
    fn test_data_size() {
        assert_eq!(NpcRecord::DATA_SIZE, 39);
    }

    #[test]
    fn test_serialize_writes_expected_format() {
        let record = test_record();
        let mut expected = encode_number(8, 1).unwrap();
        expected.extend(b"TestName");
        expected.extend(expected_data(&record));

        assert_eq!(serialize(&record).unwrap(), expected);
    }

    #[test]
    fn test_serialize_type_five() {
        let record = NpcRecord {
            npc_type: NpcType::Unknown3,
            ..test_record()
        };
        let bytes = serialize(&record).unwrap();
        // name length byte, 8 name bytes, then the type at data offset 7
        assert_eq!(&bytes[16..18], &[6, 254]);
        assert_eq!(&bytes[9..], expected_data(&record).as_slice());

        let decoded: NpcRecord = deserialize(&bytes).unwrap();
        assert_eq!(decoded.npc_type, NpcType::Unknown3);
        assert_eq!(decoded.get::<u32>(RecordProperty::NpcType).unwrap(), 5);
    }

    #[test]
    fn test_deserialize_data_restores_fields() {
        let source = test_record();
        let mut record = NpcRecord {
            id: source.id,
            name: source.name.clone(),
            ..Default::default()
        };
        deserialize_data(&mut record, &expected_data(&source)).unwrap();
        assert_eq!(record, source);
    }

    #[test]
    fn test_full_roundtrip() {
        let record = test_record();
        let bytes = serialize(&record).unwrap();
        let mut decoded: NpcRecord = deserialize(&bytes).unwrap();
        assert_eq!(decoded.id, 0);
        decoded.set_id(record.id);
        assert_eq!(decoded, record);
        assert_eq!(serialize(&decoded).unwrap(), bytes);
    }

    #[test]
    fn test_invalid_length() {
        let mut record = NpcRecord::default();
        let err = deserialize_data(&mut record, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, EoError::InvalidRecordLength { expected: 39, actual: 3 }));
        assert_eq!(record, NpcRecord::default());
    }

    #[test]
    fn test_unknown_type_keeps_record() {
        let mut source = expected_data(&test_record());
        // type field at offset 7
        source[7..9].copy_from_slice(&encode_number(99, 2).unwrap());
        let mut record = NpcRecord::default();
        assert!(matches!(
            deserialize_data(&mut record, &source),
            Err(EoError::InvalidData(_))
        ));
        assert_eq!(record, NpcRecord::default());
    }

    #[test]
    fn test_global_properties() {
        let record = NpcRecord {
            id: 44,
            name: "some name".into(),
            ..Default::default()
        };
        assert_eq!(record.get::<u32>(RecordProperty::GlobalId).unwrap(), 44);
        assert_eq!(record.get::<String>(RecordProperty::GlobalName).unwrap(), "some name");
    }

    #[test]
    fn test_all_npc_properties_readable() {
        let record = NpcRecord::default();
        let properties = NPC_LAYOUT.iter().filter_map(|entry| match entry {
            LayoutEntry::Field(property, _) => Some(*property),
            LayoutEntry::Padding(_) => None,
        });
        for property in properties {
            assert!(record.get::<PropertyValue>(property).is_ok(), "{}", property);
        }
    }

    #[test]
    fn test_foreign_properties_out_of_range() {
        let record = NpcRecord::default();
        for property in [RecordProperty::ItemSubType, RecordProperty::SpellAccuracy, RecordProperty::ClassAgi] {
            assert!(matches!(
                record.get::<PropertyValue>(property),
                Err(EoError::OutOfRange(_))
            ));
        }
    }

    #[test]
    fn test_invalid_cast() {
        let record = NpcRecord::default();
        assert!(matches!(
            record.get::<u32>(RecordProperty::GlobalName),
            Err(EoError::InvalidCast { .. })
        ));
        let record = NpcRecord { hp: 123456, ..Default::default() };
        assert!(matches!(
            record.get::<u16>(RecordProperty::NpcHp),
            Err(EoError::InvalidCast { .. })
        ));
    }
}
