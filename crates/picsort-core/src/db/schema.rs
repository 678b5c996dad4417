//! Store schema definitions
//!
//! One store file per dataset root, holding schema metadata, cached
//! artifacts and bin membership.

/// Schema version written to `metadata.schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Metadata table, created before the version check
pub const METADATA_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS metadata (
    key             TEXT PRIMARY KEY,
    value           TEXT NOT NULL
);
"#;

/// Artifact and membership tables
pub const INIT_SCHEMA: &str = r#"
-- Derived thumbnail/preview pair, JPEG encoded
CREATE TABLE IF NOT EXISTS artifacts (
    path            TEXT PRIMARY KEY,
    thumbnail       BLOB NOT NULL,
    preview         BLOB NOT NULL
);

-- Image to bin membership; bin 0 is "unsorted"
CREATE TABLE IF NOT EXISTS bins (
    path            TEXT NOT NULL,
    bin_id          INTEGER NOT NULL DEFAULT 0,
    UNIQUE (path, bin_id)
);

CREATE INDEX IF NOT EXISTS idx_bins_bin_id ON bins(bin_id);
"#;
