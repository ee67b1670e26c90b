use std::fmt;
use std::time::Duration;

/// SQLite rollback journal strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    /// Delete the rollback journal at the end of each transaction.
    Delete,
    /// Truncate the journal instead of deleting it.
    Truncate,
    /// Overwrite the journal header instead of deleting it.
    Persist,
    /// Keep the journal in memory.
    Memory,
    /// Write-ahead log.
    Wal,
    /// No journal; rollback is unavailable.
    Off,
}

impl JournalMode {
    /// Pragma value for this mode.
    pub const fn as_str(self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }
}

impl fmt::Display for JournalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How aggressively SQLite syncs to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synchronous {
    /// Hand writes to the OS without syncing.
    Off,
    /// Sync at critical moments only.
    Normal,
    /// Sync before each transaction commits.
    Full,
    /// `Full` plus a directory sync after journal unlink.
    Extra,
}

impl Synchronous {
    /// Pragma value for this level.
    pub const fn as_str(self) -> &'static str {
        match self {
            Synchronous::Off => "OFF",
            Synchronous::Normal => "NORMAL",
            Synchronous::Full => "FULL",
            Synchronous::Extra => "EXTRA",
        }
    }
}

impl fmt::Display for Synchronous {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options applied when the engine opens its connection.
///
/// Unset pragmas keep SQLite's defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    /// Create the database file when it does not exist.
    pub create_if_missing: bool,
    /// Open without write access.
    pub read_only: bool,
    /// `PRAGMA journal_mode` applied after opening.
    pub journal_mode: Option<JournalMode>,
    /// `PRAGMA synchronous` applied after opening.
    pub synchronous: Option<Synchronous>,
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout: Option<Duration>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            read_only: false,
            journal_mode: None,
            synchronous: None,
            busy_timeout: None,
        }
    }
}

impl OpenOptions {
    /// Write-ahead logging with `NORMAL` sync, suited to concurrent readers.
    pub fn wal() -> Self {
        Self {
            journal_mode: Some(JournalMode::Wal),
            synchronous: Some(Synchronous::Normal),
            ..Self::default()
        }
    }

    /// Read-only access to an existing database.
    pub fn read_only() -> Self {
        Self {
            create_if_missing: false,
            read_only: true,
            ..Self::default()
        }
    }

    pub(crate) fn flags(&self) -> rusqlite::OpenFlags {
        use rusqlite::OpenFlags;

        let mut flags = OpenFlags::SQLITE_OPEN_FULL_MUTEX | OpenFlags::SQLITE_OPEN_URI;
        if self.read_only {
            flags |= OpenFlags::SQLITE_OPEN_READ_ONLY;
        } else {
            flags |= OpenFlags::SQLITE_OPEN_READ_WRITE;
            if self.create_if_missing {
                flags |= OpenFlags::SQLITE_OPEN_CREATE;
            }
        }
        flags
    }
}
