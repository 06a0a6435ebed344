//! # Data Repositories
//!
//! Explicitly owned storage for everything loaded from disk or received
//! from the server during a session: the four pub files, cached maps and
//! the server-advertised file metadata.
//!
//! Writers (the receiver loop's file handlers) replace whole snapshots;
//! readers clone an `Arc` and never observe a half-updated file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use dashmap::DashMap;
use parking_lot::RwLock;
use eoclient_core::{EoError, MapId, Result};
use eoclient_protocol::InitFileType;
use crate::freshness::FileChecksumProvider;
use crate::map::{map_id_from_path, MapFile};
use crate::pub_file::{pub_file_path, PubFile};
use crate::record::PubRecord;
use crate::{ClassRecord, ItemRecord, NpcRecord, SpellRecord};

/// Replaceable snapshot of one pub file
#[derive(Debug)]
pub struct PubFileSlot<R> {
    file: RwLock<Option<Arc<PubFile<R>>>>,
}

impl<R> Default for PubFileSlot<R> {
    fn default() -> Self {
        Self {
            file: RwLock::new(None),
        }
    }
}

impl<R: PubRecord> PubFileSlot<R> {
    pub fn get(&self) -> Option<Arc<PubFile<R>>> {
        self.file.read().clone()
    }

    pub fn set(&self, file: PubFile<R>) -> Arc<PubFile<R>> {
        let file = Arc::new(file);
        *self.file.write() = Some(Arc::clone(&file));
        file
    }

    pub fn clear(&self) {
        *self.file.write() = None;
    }

    /// Checksum and record count of the loaded file
    pub fn metadata(&self) -> Option<(u32, usize)> {
        self.file.read().as_ref().map(|file| (file.checksum(), file.len()))
    }

    /// Load from disk if the file exists
    fn load_optional(&self, path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        self.set(PubFile::load(path)?);
        Ok(true)
    }
}

#[derive(Debug)]
pub struct DataRepositories {
    data_dir: PathBuf,
    pub items: PubFileSlot<ItemRecord>,
    pub npcs: PubFileSlot<NpcRecord>,
    pub spells: PubFileSlot<SpellRecord>,
    pub classes: PubFileSlot<ClassRecord>,
    maps: DashMap<MapId, Arc<MapFile>>,
    checksums: FileChecksumProvider,
}

impl DataRepositories {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            items: PubFileSlot::default(),
            npcs: PubFileSlot::default(),
            spells: PubFileSlot::default(),
            classes: PubFileSlot::default(),
            maps: DashMap::new(),
            checksums: FileChecksumProvider::default(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Server-advertised file metadata
    pub fn checksums(&self) -> &FileChecksumProvider {
        &self.checksums
    }

    pub fn map(&self, id: MapId) -> Option<Arc<MapFile>> {
        self.maps.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn insert_map(&self, map: MapFile) -> Arc<MapFile> {
        let map = Arc::new(map);
        self.maps.insert(map.id, Arc::clone(&map));
        map
    }

    pub fn map_count(&self) -> usize {
        self.maps.len()
    }

    /// Checksum and record count of a loaded pub file
    pub fn pub_file_metadata(&self, file_type: InitFileType) -> Option<(u32, usize)> {
        match file_type {
            InitFileType::Item => self.items.metadata(),
            InitFileType::Npc => self.npcs.metadata(),
            InitFileType::Spell => self.spells.metadata(),
            InitFileType::Class => self.classes.metadata(),
            InitFileType::Map => None,
        }
    }

    /// Load whatever pub files and maps already exist under the data directory
    ///
    /// Missing files are fine; corrupt ones are logged and skipped so the
    /// freshness check requests them again.
    pub fn load_from_disk(&self) -> Result<()> {
        let dir = &self.data_dir;
        let results = [
            (InitFileType::Item, self.items.load_optional(&pub_path(dir, InitFileType::Item)?)),
            (InitFileType::Npc, self.npcs.load_optional(&pub_path(dir, InitFileType::Npc)?)),
            (InitFileType::Spell, self.spells.load_optional(&pub_path(dir, InitFileType::Spell)?)),
            (InitFileType::Class, self.classes.load_optional(&pub_path(dir, InitFileType::Class)?)),
        ];
        for (file_type, result) in results {
            match result {
                Ok(true) => tracing::debug!("Loaded cached {:?} file", file_type),
                Ok(false) => tracing::debug!("No cached {:?} file", file_type),
                Err(e) => tracing::warn!("Failed to load cached {:?} file: {}", file_type, e),
            }
        }

        let maps_dir = dir.join("maps");
        if maps_dir.is_dir() {
            for entry in std::fs::read_dir(&maps_dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("emf") || map_id_from_path(&path).is_err() {
                    continue;
                }
                match MapFile::load(&path) {
                    Ok(map) => {
                        self.insert_map(map);
                    }
                    Err(e) => tracing::warn!("Failed to load map {}: {}", path.display(), e),
                }
            }
        }

        tracing::info!("Data repositories loaded ({} cached map(s))", self.map_count());
        Ok(())
    }

    /// Drop everything held for the session
    pub fn clear(&self) {
        self.items.clear();
        self.npcs.clear();
        self.spells.clear();
        self.classes.clear();
        self.maps.clear();
        self.checksums.clear();
    }
}

fn pub_path(dir: &Path, file_type: InitFileType) -> Result<PathBuf> {
    pub_file_path(dir, file_type).ok_or_else(|| EoError::NotFound(format!("{:?} is not a pub file", file_type)))
}
