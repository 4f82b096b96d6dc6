//! Loader configuration.
//!
//! [`LoaderConfig`] decides how strictly [`crate::MetadataRoot`] treats damaged input. The
//! default is strict: any table that cannot be decoded aborts the load. The lenient preset
//! keeps whatever decoded before the failure, which suits inspection of obfuscated or
//! truncated images.
//!
//! ```rust,no_run
//! use cilmeta::{LoaderConfig, MetadataRoot};
//!
//! let blob = std::fs::read("metadata.bin")?;
//! let root = MetadataRoot::read_with_config(&blob, LoaderConfig::lenient())?;
//! if let Some(error) = root.tables()?.decode_error() {
//!     eprintln!("partially decoded: {error}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Configuration controlling how a metadata root is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Keep the tables decoded before a truncated table instead of failing the load.
    ///
    /// The failure is recorded on the tables heap (see
    /// [`crate::metadata::streams::TablesHeap::decode_error`]). The 24-byte header and the
    /// row-count array are required regardless.
    pub lenient_tables: bool,

    /// Decode every recognized heap while loading, so heap failures surface from the
    /// constructor rather than from the first access.
    pub eager_heaps: bool,

    /// Largest stream count accepted from the root header.
    pub max_streams: u16,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            lenient_tables: false,
            eager_heaps: false,
            max_streams: 16,
        }
    }
}

impl LoaderConfig {
    /// Fail on any damage and decode every heap up front.
    #[must_use]
    pub fn strict() -> Self {
        LoaderConfig {
            eager_heaps: true,
            ..LoaderConfig::default()
        }
    }

    /// Recover from truncated tables and decode heaps on first use.
    #[must_use]
    pub fn lenient() -> Self {
        LoaderConfig {
            lenient_tables: true,
            ..LoaderConfig::default()
        }
    }
}
