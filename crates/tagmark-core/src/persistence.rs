//! On-disk record store for Tagmark.
//!
//! [`FileStore`] keeps the whole database in memory and writes it through to
//! a single file after every mutation. Bookmark collections are small, so a
//! full rewrite is cheap and keeps the format trivial. The on-disk format is
//! designed for:
//!
//! - Versioning: format changes are detected and handled
//! - Atomic writes: prevent corruption on crash
//! - Integrity: a checksum detects corruption
//!
//! The search index is never written here; it is rebuilt from the loaded
//! bookmarks on every start.
//!
//! ## Database File Format
//!
//! ```text
//! [Header: 32 bytes]
//!   - Magic: "TGMK" (4 bytes)
//!   - Version: u32 (4 bytes)
//!   - Flags: u32 (4 bytes) - compression
//!   - Record count: u64 (8 bytes)
//!   - Reserved: 12 bytes
//!
//! [Body: variable]
//!   - bincode(DatabaseSnapshot), LZ4 with prepended size when compressed
//!
//! [Footer: 8 bytes]
//!   - CRC32 checksum of the body: u32
//!   - Magic: "KMGT" (4 bytes)
//! ```

use crate::error::{Result, TagmarkError};
use crate::store::{BookmarkStore, DatabaseSnapshot, MemoryStore};
use crate::types::{Bookmark, BookmarkId, Category, CategoryId, Tag, TagId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Magic bytes at the start of database files
pub const MAGIC_HEADER: &[u8; 4] = b"TGMK";
/// Magic bytes at the end of database files (reversed)
pub const MAGIC_FOOTER: &[u8; 4] = b"KMGT";
/// Current database format version
pub const STORE_VERSION: u32 = 1;

const HEADER_LEN: usize = 32;
const FOOTER_LEN: usize = 8;
const DATABASE_FILE: &str = "tagmark.db";

/// Flags for the database file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreFlags(u32);

impl StoreFlags {
    /// No compression
    pub const NONE: Self = StoreFlags(0);
    /// LZ4 compression
    pub const COMPRESSED_LZ4: Self = StoreFlags(1);

    fn is_compressed(&self) -> bool {
        self.0 & 1 != 0
    }
}

/// Header structure for the database file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreHeader {
    magic: [u8; 4],
    version: u32,
    flags: u32,
    record_count: u64,
    reserved: [u8; 12],
}

impl StoreHeader {
    fn new(record_count: u64, flags: StoreFlags) -> Self {
        StoreHeader {
            magic: *MAGIC_HEADER,
            version: STORE_VERSION,
            flags: flags.0,
            record_count,
            reserved: [0; 12],
        }
    }

    fn validate(&self) -> Result<()> {
        if self.magic != *MAGIC_HEADER {
            return Err(TagmarkError::corrupted("Invalid magic bytes in header"));
        }
        // Accept older versions; newer versions fail.
        if self.version > STORE_VERSION {
            return Err(TagmarkError::StoreVersionMismatch {
                found: self.version,
                expected: STORE_VERSION,
            });
        }
        Ok(())
    }
}

/// A [`BookmarkStore`] persisted to a single file.
///
/// ## Example
///
/// ```rust,ignore
/// use tagmark_core::{BookmarkStore, FileStore};
///
/// let store = FileStore::open("./data")?;
/// for bookmark in store.all_bookmarks()? {
///     println!("{}", bookmark.title);
/// }
/// ```
pub struct FileStore {
    /// Base directory for the database file
    base_dir: PathBuf,

    /// Whether to use compression
    use_compression: bool,

    /// Working image of the database
    memory: MemoryStore,

    /// Serializes mutate-then-save sequences
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store rooted at `base_dir` without touching the disk.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        FileStore {
            base_dir: base_dir.as_ref().to_path_buf(),
            use_compression: true,
            memory: MemoryStore::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Open the store, loading the database file when it exists.
    ///
    /// A missing file yields an empty store. A corrupted file is an error;
    /// see [`restore_from_backup`](Self::restore_from_backup).
    pub fn open(base_dir: impl AsRef<Path>) -> Result<Self> {
        let store = Self::new(base_dir);
        if store.exists() {
            let snapshot = store.load()?;
            store.memory.replace_all(snapshot)?;
        } else {
            debug!(path = %store.database_path().display(), "No database file, starting empty");
        }
        Ok(store)
    }

    /// Open the store, falling back to the backup file when the main file is
    /// corrupted or from a newer version.
    pub fn open_or_restore(base_dir: impl AsRef<Path>) -> Result<Self> {
        match Self::open(base_dir.as_ref()) {
            Ok(store) => Ok(store),
            Err(e) if e.requires_restore() => {
                warn!(error = %e, "Database unreadable, trying backup");
                let store = Self::new(base_dir);
                store.restore_from_backup()?;
                Ok(store)
            }
            Err(e) => Err(e),
        }
    }

    /// Set whether to use compression when saving.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.use_compression = compress;
        self
    }

    /// Get the path to the database file.
    pub fn database_path(&self) -> PathBuf {
        self.base_dir.join(DATABASE_FILE)
    }

    /// Get the path to the backup database file.
    pub fn backup_path(&self) -> PathBuf {
        self.base_dir.join(format!("{}.bak", DATABASE_FILE))
    }

    /// Get the path to a temporary file during save.
    fn temp_path(&self) -> PathBuf {
        self.base_dir.join(format!("{}.tmp", DATABASE_FILE))
    }

    /// Check if a database file exists.
    pub fn exists(&self) -> bool {
        self.database_path().exists()
    }

    /// Write the current image to disk.
    ///
    /// Uses atomic write (write to temp, then rename) to prevent corruption.
    pub fn save(&self) -> Result<()> {
        self.write_snapshot(&self.memory.snapshot()?)
    }

    fn write_snapshot(&self, snapshot: &DatabaseSnapshot) -> Result<()> {
        fs::create_dir_all(&self.base_dir)?;

        let record_count = snapshot.record_count() as u64;
        let flags = if self.use_compression {
            StoreFlags::COMPRESSED_LZ4
        } else {
            StoreFlags::NONE
        };

        let bytes = bincode::serialize(snapshot)?;
        let body = if self.use_compression {
            lz4_flex::compress_prepend_size(&bytes)
        } else {
            bytes
        };

        let temp_path = self.temp_path();
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);

            let header_bytes = bincode::serialize(&StoreHeader::new(record_count, flags))?;
            writer.write_all(&header_bytes)?;
            writer.write_all(&body)?;

            let checksum = crc32fast::hash(&body);
            writer.write_all(&checksum.to_le_bytes())?;
            writer.write_all(MAGIC_FOOTER)?;

            writer.flush()?;
        }

        // Backup existing database
        let database_path = self.database_path();
        let backup_path = self.backup_path();
        if database_path.exists() {
            let _ = fs::remove_file(&backup_path);
            let _ = fs::rename(&database_path, &backup_path);
        }

        fs::rename(&temp_path, &database_path)?;

        debug!(
            path = %database_path.display(),
            records = record_count,
            compressed = self.use_compression,
            "Database saved"
        );

        Ok(())
    }

    /// Read and verify the database file.
    pub fn load(&self) -> Result<DatabaseSnapshot> {
        read_database(&self.database_path())
    }

    /// Delete all stored data, on disk and in memory.
    pub fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock();

        let database_path = self.database_path();
        let backup_path = self.backup_path();

        if database_path.exists() {
            fs::remove_file(&database_path)?;
        }
        if backup_path.exists() {
            fs::remove_file(&backup_path)?;
        }

        self.memory.replace_all(DatabaseSnapshot::default())?;
        info!(dir = %self.base_dir.display(), "Database cleared");
        Ok(())
    }

    /// Restore from backup if the main database is corrupted.
    pub fn restore_from_backup(&self) -> Result<DatabaseSnapshot> {
        let _guard = self.write_lock.lock();

        let backup_path = self.backup_path();
        if !backup_path.exists() {
            return Err(TagmarkError::StoreNotFound { path: backup_path });
        }

        let snapshot = read_database(&backup_path)?;
        fs::copy(&backup_path, self.database_path())?;
        self.memory.replace_all(snapshot.clone())?;

        warn!(path = %backup_path.display(), "Database restored from backup");
        Ok(snapshot)
    }

    /// Write every record as pretty-printed JSON.
    pub fn export_json(&self, path: &Path) -> Result<usize> {
        let snapshot = self.memory.snapshot()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(path, json)?;

        info!(path = %path.display(), records = snapshot.record_count(), "Exported database");
        Ok(snapshot.record_count())
    }

    /// Replace every record with the contents of a JSON export.
    pub fn import_json(&self, path: &Path) -> Result<DatabaseSnapshot> {
        let contents = fs::read_to_string(path)?;
        let mut snapshot: DatabaseSnapshot = serde_json::from_str(&contents)?;
        if snapshot.version > crate::store::SNAPSHOT_VERSION {
            return Err(TagmarkError::StoreVersionMismatch {
                found: snapshot.version,
                expected: crate::store::SNAPSHOT_VERSION,
            });
        }
        snapshot.version = crate::store::SNAPSHOT_VERSION;

        self.replace_all(snapshot.clone())?;
        info!(path = %path.display(), records = snapshot.record_count(), "Imported database");
        Ok(snapshot)
    }

    /// Apply a mutation to a staged copy of the image, persist it, and only
    /// then publish it. A failed write leaves the image untouched.
    fn mutate<T>(&self, apply: impl FnOnce(&MemoryStore) -> Result<T>) -> Result<T> {
        let _guard = self.write_lock.lock();

        let staged = MemoryStore::from_snapshot(self.memory.snapshot()?);
        let value = apply(&staged)?;
        let snapshot = staged.snapshot()?;

        self.write_snapshot(&snapshot)?;
        self.memory.replace_all(snapshot)?;
        Ok(value)
    }
}

fn read_database(path: &Path) -> Result<DatabaseSnapshot> {
    if !path.exists() {
        return Err(TagmarkError::StoreNotFound {
            path: path.to_path_buf(),
        });
    }

    info!(path = %path.display(), "Loading database");

    let file = File::open(path)?;
    let file_len = file.metadata()?.len() as usize;
    if file_len < HEADER_LEN + FOOTER_LEN {
        return Err(TagmarkError::corrupted(format!(
            "File too short: {} bytes",
            file_len
        )));
    }
    let mut reader = BufReader::new(file);

    let mut header_bytes = [0u8; HEADER_LEN];
    reader.read_exact(&mut header_bytes)?;
    let header: StoreHeader = bincode::deserialize(&header_bytes)
        .map_err(|e| TagmarkError::corrupted(format!("Unreadable header: {}", e)))?;
    header.validate()?;

    let flags = StoreFlags(header.flags);

    let mut body = vec![0u8; file_len - HEADER_LEN - FOOTER_LEN];
    reader.read_exact(&mut body)?;

    let mut footer = [0u8; FOOTER_LEN];
    reader.read_exact(&mut footer)?;

    let stored_checksum = u32::from_le_bytes([footer[0], footer[1], footer[2], footer[3]]);
    if &footer[4..8] != MAGIC_FOOTER {
        return Err(TagmarkError::corrupted("Invalid footer magic bytes"));
    }

    let computed_checksum = crc32fast::hash(&body);
    if stored_checksum != computed_checksum {
        return Err(TagmarkError::corrupted(format!(
            "Checksum mismatch: expected {:08x}, got {:08x}",
            stored_checksum, computed_checksum
        )));
    }

    let bytes = if flags.is_compressed() {
        lz4_flex::decompress_size_prepended(&body)
            .map_err(|e| TagmarkError::corrupted(format!("Decompression failed: {}", e)))?
    } else {
        body
    };

    let snapshot: DatabaseSnapshot = bincode::deserialize(&bytes)
        .map_err(|e| TagmarkError::corrupted(format!("Deserialization failed: {}", e)))?;

    if snapshot.record_count() as u64 != header.record_count {
        return Err(TagmarkError::corrupted(format!(
            "Record count mismatch: header says {}, body has {}",
            header.record_count,
            snapshot.record_count()
        )));
    }

    info!(
        bookmarks = snapshot.bookmarks.len(),
        categories = snapshot.categories.len(),
        tags = snapshot.tags.len(),
        "Database loaded"
    );

    Ok(snapshot)
}

impl BookmarkStore for FileStore {
    fn get_bookmark(&self, id: &BookmarkId) -> Result<Option<Bookmark>> {
        self.memory.get_bookmark(id)
    }

    fn put_bookmark(&self, bookmark: &Bookmark) -> Result<()> {
        self.mutate(|memory| memory.put_bookmark(bookmark))
    }

    fn delete_bookmark(&self, id: &BookmarkId) -> Result<bool> {
        self.mutate(|memory| memory.delete_bookmark(id))
    }

    fn all_bookmarks(&self) -> Result<Vec<Bookmark>> {
        self.memory.all_bookmarks()
    }

    fn get_category(&self, id: &CategoryId) -> Result<Option<Category>> {
        self.memory.get_category(id)
    }

    fn put_category(&self, category: &Category) -> Result<()> {
        self.mutate(|memory| memory.put_category(category))
    }

    fn delete_category(&self, id: &CategoryId) -> Result<bool> {
        self.mutate(|memory| memory.delete_category(id))
    }

    fn all_categories(&self) -> Result<Vec<Category>> {
        self.memory.all_categories()
    }

    fn get_tag(&self, id: &TagId) -> Result<Option<Tag>> {
        self.memory.get_tag(id)
    }

    fn put_tag(&self, tag: &Tag) -> Result<()> {
        self.mutate(|memory| memory.put_tag(tag))
    }

    fn delete_tag(&self, id: &TagId) -> Result<bool> {
        self.mutate(|memory| memory.delete_tag(id))
    }

    fn all_tags(&self) -> Result<Vec<Tag>> {
        self.memory.all_tags()
    }

    fn snapshot(&self) -> Result<DatabaseSnapshot> {
        self.memory.snapshot()
    }

    fn replace_all(&self, snapshot: DatabaseSnapshot) -> Result<()> {
        self.mutate(|memory| memory.replace_all(snapshot))
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.database_path())
            .field("bookmarks", &self.memory.bookmark_count())
            .finish()
    }
}
