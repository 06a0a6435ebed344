//! # EO Packet Families and Actions
//!
//! Every frame is classified by a two-level header: a **family** (the
//! category, e.g. `Locker`) and an **action** (the verb within it, e.g.
//! `Open`). Both travel as raw header bytes.
//!
//! Only the families and actions this client core works with are listed;
//! unknown header bytes map to `None` and such frames are dropped by the
//! frame decoder.

/// Packet family (header byte 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketFamily {
    /// Keep-alive and sequence maintenance
    Connection = 1,
    Account = 2,
    Character = 3,
    Login = 4,
    /// Character selection and file metadata
    Welcome = 5,
    Walk = 6,
    Face = 7,
    Chair = 8,
    Emote = 9,
    Attack = 11,
    Spell = 12,
    Shop = 13,
    Item = 14,
    StatSkill = 16,
    Global = 17,
    Talk = 18,
    Warp = 19,
    Jukebox = 21,
    Players = 22,
    Avatar = 23,
    Party = 24,
    Refresh = 25,
    Npc = 26,
    PlayerRange = 27,
    NpcRange = 28,
    Range = 29,
    Paperdoll = 30,
    Effect = 31,
    Trade = 32,
    Chest = 33,
    Door = 34,
    Message = 35,
    Bank = 36,
    /// Private item storage
    Locker = 37,
    Barber = 38,
    Guild = 39,
    Music = 40,
    Sit = 41,
    Recover = 42,
    Board = 43,
    Cast = 44,
    Arena = 45,
    Priest = 46,
    Marriage = 47,
    AdminInteract = 48,
    Citizen = 49,
    Quest = 50,
    Book = 51,
    Error = 250,
    /// Connection init handshake and file transfer replies
    Init = 255,
}

impl PacketFamily {
    /// Convert a header byte to a family
    ///
    /// # Example
    /// ```rust
    /// use eoclient_protocol::PacketFamily;
    ///
    /// assert_eq!(PacketFamily::from_u8(37), Some(PacketFamily::Locker));
    /// assert_eq!(PacketFamily::from_u8(200), None);
    /// ```
    pub fn from_u8(value: u8) -> Option<Self> {
        use PacketFamily::*;
        let family = match value {
            1 => Connection,
            2 => Account,
            3 => Character,
            4 => Login,
            5 => Welcome,
            6 => Walk,
            7 => Face,
            8 => Chair,
            9 => Emote,
            11 => Attack,
            12 => Spell,
            13 => Shop,
            14 => Item,
            16 => StatSkill,
            17 => Global,
            18 => Talk,
            19 => Warp,
            21 => Jukebox,
            22 => Players,
            23 => Avatar,
            24 => Party,
            25 => Refresh,
            26 => Npc,
            27 => PlayerRange,
            28 => NpcRange,
            29 => Range,
            30 => Paperdoll,
            31 => Effect,
            32 => Trade,
            33 => Chest,
            34 => Door,
            35 => Message,
            36 => Bank,
            37 => Locker,
            38 => Barber,
            39 => Guild,
            40 => Music,
            41 => Sit,
            42 => Recover,
            43 => Board,
            44 => Cast,
            45 => Arena,
            46 => Priest,
            47 => Marriage,
            48 => AdminInteract,
            49 => Citizen,
            50 => Quest,
            51 => Book,
            250 => Error,
            255 => Init,
            _ => return None,
        };
        Some(family)
    }

    /// Convert family to its header byte
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Packet action (header byte 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketAction {
    Request = 1,
    Accept = 2,
    Reply = 3,
    Remove = 4,
    Agree = 5,
    Create = 6,
    Add = 7,
    Player = 8,
    Take = 9,
    Use = 10,
    Buy = 11,
    Sell = 12,
    Open = 13,
    Close = 14,
    Message = 15,
    Spec = 16,
    Admin = 17,
    List = 18,
    Tell = 20,
    Report = 21,
    Announce = 22,
    Server = 23,
    Drop = 24,
    Junk = 25,
    Obtain = 26,
    Get = 27,
    Kick = 28,
    Rank = 29,
    TargetSelf = 30,
    TargetOther = 31,
    TargetGroup = 33,
    Dialog = 34,
    Ping = 240,
    Pong = 241,
    Net242 = 242,
    Net243 = 243,
    Net244 = 244,
    Error = 250,
    Init = 255,
}

impl PacketAction {
    /// Convert a header byte to an action
    pub fn from_u8(value: u8) -> Option<Self> {
        use PacketAction::*;
        let action = match value {
            1 => Request,
            2 => Accept,
            3 => Reply,
            4 => Remove,
            5 => Agree,
            6 => Create,
            7 => Add,
            8 => Player,
            9 => Take,
            10 => Use,
            11 => Buy,
            12 => Sell,
            13 => Open,
            14 => Close,
            15 => Message,
            16 => Spec,
            17 => Admin,
            18 => List,
            20 => Tell,
            21 => Report,
            22 => Announce,
            23 => Server,
            24 => Drop,
            25 => Junk,
            26 => Obtain,
            27 => Get,
            28 => Kick,
            29 => Rank,
            30 => TargetSelf,
            31 => TargetOther,
            33 => TargetGroup,
            34 => Dialog,
            240 => Ping,
            241 => Pong,
            242 => Net242,
            243 => Net243,
            244 => Net244,
            250 => Error,
            255 => Init,
            _ => return None,
        };
        Some(action)
    }

    /// Convert action to its header byte
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Dispatch-table key: one (family, action) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FamilyActionKey {
    pub family: PacketFamily,
    pub action: PacketAction,
}

impl FamilyActionKey {
    pub const fn new(family: PacketFamily, action: PacketAction) -> Self {
        Self { family, action }
    }

    /// Init handshake / file transfer replies
    pub const INIT: Self = Self::new(PacketFamily::Init, PacketAction::Init);

    /// Server keep-alive carrying new sequence seeds
    pub const CONNECTION_PLAYER: Self = Self::new(PacketFamily::Connection, PacketAction::Player);
}

impl std::fmt::Display for FamilyActionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}_{:?}", self.family, self.action)
    }
}

/// File kinds that can be requested from the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InitFileType {
    Map = 1,
    Item = 2,
    Npc = 3,
    Spell = 4,
    Class = 5,
}

impl InitFileType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Map),
            2 => Some(Self::Item),
            3 => Some(Self::Npc),
            4 => Some(Self::Spell),
            5 => Some(Self::Class),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// First payload byte of an `Init_Init` reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InitReply {
    OutOfDate = 1,
    Ok = 2,
    Banned = 3,
    FileMap = 4,
    FileEif = 5,
    FileEnf = 6,
    FileEsf = 7,
    Players = 8,
    MapMutation = 9,
    FriendListPlayers = 10,
    FileEcf = 11,
}

impl InitReply {
    pub fn from_u8(value: u8) -> Option<Self> {
        use InitReply::*;
        let reply = match value {
            1 => OutOfDate,
            2 => Ok,
            3 => Banned,
            4 => FileMap,
            5 => FileEif,
            6 => FileEnf,
            7 => FileEsf,
            8 => Players,
            9 => MapMutation,
            10 => FriendListPlayers,
            11 => FileEcf,
            _ => return None,
        };
        Some(reply)
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// File type carried by a file-transfer reply
    pub fn file_type(self) -> Option<InitFileType> {
        match self {
            InitReply::FileMap | InitReply::MapMutation => Some(InitFileType::Map),
            InitReply::FileEif => Some(InitFileType::Item),
            InitReply::FileEnf => Some(InitFileType::Npc),
            InitReply::FileEsf => Some(InitFileType::Spell),
            InitReply::FileEcf => Some(InitFileType::Class),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_family_roundtrip() {
        for byte in 0..=255u8 {
            if let Some(family) = PacketFamily::from_u8(byte) {
                assert_eq!(family.as_u8(), byte);
            }
        }
        assert_eq!(PacketFamily::from_u8(10), None);
    }

    #[test]
    fn test_action_roundtrip() {
        for byte in 0..=255u8 {
            if let Some(action) = PacketAction::from_u8(byte) {
                assert_eq!(action.as_u8(), byte);
            }
        }
        assert_eq!(PacketAction::from_u8(19), None);
    }

    #[test]
    fn test_key_equality_and_hash() {
        let a = FamilyActionKey::new(PacketFamily::Locker, PacketAction::Open);
        let b = FamilyActionKey::new(PacketFamily::Locker, PacketAction::Open);
        let c = FamilyActionKey::new(PacketFamily::Locker, PacketAction::Get);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
        assert_eq!(a.to_string(), "Locker_Open");
    }

    #[test]
    fn test_init_reply_file_types() {
        assert_eq!(InitReply::FileEnf.file_type(), Some(InitFileType::Npc));
        assert_eq!(InitReply::FileMap.file_type(), Some(InitFileType::Map));
        assert_eq!(InitReply::Ok.file_type(), None);
        assert_eq!(InitReply::from_u8(11), Some(InitReply::FileEcf));
    }
}
