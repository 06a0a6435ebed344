//! # File Transfer Handlers
//!
//! Receives data files requested with [`Client::request_file`] and the
//! server's advertised file metadata, and stores both in the session's
//! [`DataRepositories`].
//!
//! # Packet Formats
//!
//! ```text
//! Init_Init   {BYTE reply}{BYTE file id}{raw pub file}    (FileEif, FileEnf, FileEsf, FileEcf)
//! Init_Init   {BYTE reply}{raw map file}                   (FileMap, MapMutation)
//! Welcome_Reply  see eoclient_protocol::WelcomeFileInfo
//! ```
//!
//! Map replies do not name the map; the id comes from the last map the
//! client asked for, falling back to the map advertised in `Welcome_Reply`.
//!
//! Handlers parse the file and swap it into memory on the receiver task.
//! The received bytes are written to disk unchanged on Tokio's blocking
//! pool; [`FileTransferHandlers::flush`] waits for outstanding writes.
//!
//! [`Client::request_file`]: crate::Client::request_file

use eoclient_core::{EoError, MapId, Result};
use eoclient_data::{pub_file_path, write_data_file, DataRepositories, MapFile, PubFile, PubFileSlot, PubRecord};
use eoclient_protocol::{FamilyActionKey, InitFileType, InitReply, PacketAction, PacketFamily, PacketFrame, WelcomeFileInfo};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::handlers::HandlerRegistry;

/// Key of the `Welcome_Reply` frame carrying file metadata
pub const WELCOME_REPLY: FamilyActionKey = FamilyActionKey::new(PacketFamily::Welcome, PacketAction::Reply);

/// `Init_Init` and `Welcome_Reply` handlers feeding the repositories
#[derive(Debug)]
pub struct FileTransferHandlers {
    repositories: Arc<DataRepositories>,
    pending_map: Mutex<Option<MapId>>,
    welcome: Mutex<Option<WelcomeFileInfo>>,
    welcome_tx: broadcast::Sender<WelcomeFileInfo>,
    saves: Mutex<Vec<JoinHandle<()>>>,
}

impl FileTransferHandlers {
    pub fn new(repositories: Arc<DataRepositories>) -> Arc<Self> {
        let (welcome_tx, _) = broadcast::channel(8);
        Arc::new(Self {
            repositories,
            pending_map: Mutex::new(None),
            welcome: Mutex::new(None),
            welcome_tx,
            saves: Mutex::new(Vec::new()),
        })
    }

    /// Install both handlers into `registry`
    pub fn register(self: &Arc<Self>, registry: &HandlerRegistry) {
        let handlers = Arc::clone(self);
        registry.register_function(FamilyActionKey::INIT, move |frame| handlers.handle_init(frame));

        let handlers = Arc::clone(self);
        registry.register_function(WELCOME_REPLY, move |frame| handlers.handle_welcome(frame));
    }

    pub fn repositories(&self) -> &Arc<DataRepositories> {
        &self.repositories
    }

    /// Map id the next map file reply belongs to
    pub fn expect_map(&self, id: MapId) {
        *self.pending_map.lock() = Some(id);
    }

    /// Metadata from the most recent `Welcome_Reply`
    pub fn welcome(&self) -> Option<WelcomeFileInfo> {
        self.welcome.lock().clone()
    }

    /// Be told about every `Welcome_Reply` after it is recorded
    pub fn subscribe_welcome(&self) -> broadcast::Receiver<WelcomeFileInfo> {
        self.welcome_tx.subscribe()
    }

    /// Record advertised checksums and lengths
    pub fn handle_welcome(&self, frame: &mut PacketFrame) -> Result<()> {
        let welcome = WelcomeFileInfo::parse(frame)?;
        tracing::info!(
            "Server advertised files for session {} (map {})",
            welcome.session_id,
            welcome.map_id
        );

        self.repositories.checksums().record_welcome(&welcome);
        {
            let mut pending = self.pending_map.lock();
            if pending.is_none() {
                *pending = Some(welcome.map_id);
            }
        }
        *self.welcome.lock() = Some(welcome.clone());
        let _ = self.welcome_tx.send(welcome);
        Ok(())
    }

    /// Route a post-handshake `Init_Init` reply
    pub fn handle_init(&self, frame: &mut PacketFrame) -> Result<()> {
        let code = frame.get_byte()?;
        let reply = u8::try_from(code)
            .ok()
            .and_then(InitReply::from_u8)
            .ok_or_else(|| EoError::InvalidData(format!("Unknown init reply {}", code)))?;

        match reply.file_type() {
            Some(InitFileType::Map) => self.receive_map(frame),
            Some(file_type) => {
                let _file_id = frame.get_byte()?;
                let bytes = frame.get_bytes(frame.remaining())?;
                match file_type {
                    InitFileType::Item => install(&self.repositories.items, file_type, &bytes)?,
                    InitFileType::Npc => install(&self.repositories.npcs, file_type, &bytes)?,
                    InitFileType::Spell => install(&self.repositories.spells, file_type, &bytes)?,
                    InitFileType::Class => install(&self.repositories.classes, file_type, &bytes)?,
                    InitFileType::Map => return Ok(()),
                }

                if let Some(path) = pub_file_path(self.repositories.data_dir(), file_type) {
                    self.persist(format!("{:?} file", file_type), move || {
                        write_data_file(&path, &bytes)?;
                        Ok(path)
                    });
                }
                Ok(())
            }
            None => {
                tracing::trace!("Ignoring init reply {:?}", reply);
                Ok(())
            }
        }
    }

    fn receive_map(&self, frame: &mut PacketFrame) -> Result<()> {
        let id = self
            .pending_map
            .lock()
            .take()
            .ok_or_else(|| EoError::NotFound("map file received without a pending map request".into()))?;

        let bytes = frame.get_bytes(frame.remaining())?;
        let map = MapFile::from_bytes(id, &bytes)?;
        tracing::info!("Received map {} ({} bytes)", id, bytes.len());
        self.repositories.insert_map(map);

        let data_dir = self.repositories.data_dir().to_path_buf();
        self.persist(format!("map {}", id), move || MapFile::save_raw(&data_dir, id, &bytes));
        Ok(())
    }

    /// Run a disk write off the receiver task
    ///
    /// Outside a Tokio runtime the write happens inline. Failures only log a
    /// warning; the in-memory copy is already installed.
    fn persist<F>(&self, what: String, write: F)
    where
        F: FnOnce() -> Result<PathBuf> + Send + 'static,
    {
        let job = move || match write() {
            Ok(path) => tracing::info!("Saved {} to {}", what, path.display()),
            Err(e) => tracing::warn!("Failed to save {}: {}", what, e),
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let mut saves = self.saves.lock();
                saves.retain(|save| !save.is_finished());
                saves.push(runtime.spawn_blocking(job));
            }
            Err(_) => job(),
        }
    }

    /// Wait for every queued disk write to finish
    pub async fn flush(&self) {
        let saves: Vec<_> = self.saves.lock().drain(..).collect();
        for save in saves {
            if let Err(e) = save.await {
                tracing::warn!("File save task ended abnormally: {}", e);
            }
        }
    }
}

/// Parse a received pub file and swap it into its slot
fn install<R: PubRecord>(slot: &PubFileSlot<R>, file_type: InitFileType, bytes: &[u8]) -> Result<()> {
    let file = PubFile::<R>::from_bytes(bytes)?;
    tracing::info!("Received {:?} file ({} record(s))", file_type, file.len());
    slot.set(file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use eoclient_data::{map_file_path, MapFileInfo, MapFileProperties, NpcRecord, NpcType};
    use eoclient_protocol::{PacketFamily, PubFileInfo};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<FileTransferHandlers>, HandlerRegistry) {
        let dir = TempDir::new().unwrap();
        let handlers = FileTransferHandlers::new(Arc::new(DataRepositories::new(dir.path())));
        let registry = HandlerRegistry::new();
        handlers.register(&registry);
        (dir, handlers, registry)
    }

    fn init_frame(reply: InitReply, body: &[u8], with_file_id: bool) -> PacketFrame {
        let mut frame = PacketFrame::new(PacketFamily::Init, PacketAction::Init);
        frame.add_byte(reply.as_u8() as u32).unwrap();
        if with_file_id {
            frame.add_byte(1).unwrap();
        }
        frame.add_bytes(body);
        frame
    }

    #[test]
    fn test_register() {
        let (_dir, _handlers, registry) = setup();
        assert!(registry.has_handler(FamilyActionKey::INIT));
        assert!(registry.has_handler(WELCOME_REPLY));
        assert_eq!(registry.handler_count(), 2);
    }

    #[test]
    fn test_receive_npc_file() {
        let (dir, handlers, registry) = setup();
        let npcs = PubFile::new(
            77,
            vec![NpcRecord {
                name: "Crow".into(),
                hp: 10,
                npc_type: NpcType::Aggressive,
                ..Default::default()
            }],
        );

        let mut frame = init_frame(InitReply::FileEnf, &npcs.to_bytes().unwrap(), true);
        assert!(registry.dispatch(&mut frame).unwrap());

        let stored = handlers.repositories().npcs.get().unwrap();
        assert_eq!(stored.checksum(), 77);
        assert_eq!(stored.record(1).unwrap().name, "Crow");
        assert!(pub_file_path(dir.path(), InitFileType::Npc).unwrap().exists());
    }

    #[test]
    fn test_receive_map_uses_pending_id() {
        let (dir, handlers, registry) = setup();
        let map = MapFile::new(
            MapId::new(5),
            MapFileProperties {
                checksum: [1, 2, 3, 4],
                file_size: 0,
                name: "Aeven".into(),
                width: 20,
                height: 30,
            },
        );

        handlers.expect_map(MapId::new(5));
        let mut frame = init_frame(InitReply::FileMap, &map.to_bytes().unwrap(), false);
        registry.dispatch(&mut frame).unwrap();

        let stored = handlers.repositories().map(MapId::new(5)).unwrap();
        assert_eq!(stored.properties.name, "Aeven");
        assert!(map_file_path(dir.path(), MapId::new(5)).exists());

        // No request outstanding any more
        let mut frame = init_frame(InitReply::FileMap, &map.to_bytes().unwrap(), false);
        assert!(matches!(registry.dispatch(&mut frame), Err(EoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_received_map_matches_advertised_length() {
        let (dir, handlers, registry) = setup();
        let map = MapFile::new(
            MapId::new(5),
            MapFileProperties {
                checksum: [1, 2, 3, 4],
                name: "Aeven".into(),
                width: 20,
                height: 30,
                ..Default::default()
            },
        );
        // Bytes the parser skips must still count towards the length
        let mut wire = map.to_bytes().unwrap();
        wire.extend([9, 9, 9]);

        let repositories = handlers.repositories();
        repositories.checksums().set_map(
            MapId::new(5),
            MapFileInfo {
                checksum: [1, 2, 3, 4],
                length: wire.len() as u32,
            },
        );
        assert!(repositories.needs_file(InitFileType::Map, Some(MapId::new(5))));

        handlers.expect_map(MapId::new(5));
        let mut frame = init_frame(InitReply::FileMap, &wire, false);
        registry.dispatch(&mut frame).unwrap();
        handlers.flush().await;

        let stored = repositories.map(MapId::new(5)).unwrap();
        assert_eq!(stored.properties.file_size, wire.len());
        assert_eq!(std::fs::read(map_file_path(dir.path(), MapId::new(5))).unwrap(), wire);
        assert!(!repositories.needs_file(InitFileType::Map, Some(MapId::new(5))));
    }

    #[tokio::test]
    async fn test_pub_file_saved_in_background() {
        let (dir, handlers, registry) = setup();
        let npcs = PubFile::new(
            31,
            vec![NpcRecord {
                name: "Goat".into(),
                ..Default::default()
            }],
        );
        let body = npcs.to_bytes().unwrap();

        let mut frame = init_frame(InitReply::FileEnf, &body, true);
        assert!(registry.dispatch(&mut frame).unwrap());
        // Installed before the write completes
        assert_eq!(handlers.repositories().npcs.get().unwrap().checksum(), 31);

        handlers.flush().await;
        let path = pub_file_path(dir.path(), InitFileType::Npc).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), body);
        assert!(handlers.saves.lock().is_empty());
    }

    #[test]
    fn test_welcome_records_checksums() {
        let (_dir, handlers, registry) = setup();
        let mut notified = handlers.subscribe_welcome();

        let mut frame = PacketFrame::new(PacketFamily::Welcome, PacketAction::Reply);
        frame.add_short(1234).unwrap();
        frame.add_int(99).unwrap();
        frame.add_short(5).unwrap();
        frame.add_bytes(&[10, 20, 30, 40]);
        frame.add_three(2048).unwrap();
        for (checksum, length) in [(100, 10), (200, 20), (300, 30), (400, 40)] {
            frame.add_int(checksum).unwrap();
            frame.add_short(length).unwrap();
        }
        registry.dispatch(&mut frame).unwrap();

        let welcome = handlers.welcome().unwrap();
        assert_eq!(welcome.session_id, 1234);
        assert_eq!(notified.try_recv().unwrap(), welcome);
        assert_eq!(welcome.map_id, MapId::new(5));

        let checksums = handlers.repositories().checksums();
        assert_eq!(
            checksums.pub_file(InitFileType::Npc),
            Some(PubFileInfo { checksum: 200, length: 20 })
        );
        assert_eq!(checksums.map(MapId::new(5)).unwrap().length, 2048);
        assert!(handlers.repositories().needs_file(InitFileType::Npc, None));
    }

    #[test]
    fn test_non_file_reply_ignored() {
        let (_dir, handlers, registry) = setup();
        let mut frame = init_frame(InitReply::Players, &[1, 2, 3], false);
        assert!(registry.dispatch(&mut frame).unwrap());
        assert_eq!(handlers.repositories().map_count(), 0);
    }
}
