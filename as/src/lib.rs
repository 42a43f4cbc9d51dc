//! ArtifactStore - append-only store for enriched template artifacts
//!
//! Every enrichment run mints a new, immutable artifact next to the template it
//! was derived from. Artifacts are never rewritten; newer runs add files with a
//! higher sequence number or land in a higher version directory.
//!
//! # Layout
//!
//! ```text
//! {template_dir}/
//! ├── rust-specialist.json
//! └── enriched/
//!     ├── 0.0.2/
//!     │   ├── rust-specialist.enriched.001.json
//!     │   └── rust-specialist.enriched.002.json
//!     └── 0.0.3/
//!         └── rust-specialist.enriched.001.json
//! ```
//!
//! # Example
//!
//! ```ignore
//! use artifactstore::{ArtifactStore, Version};
//!
//! let store = ArtifactStore::for_template("templates/rust-specialist.json")?;
//! if let Some(latest) = store.latest()? {
//!     println!("{} (v{}, #{})", latest.path.display(), latest.version, latest.sequence);
//! }
//! let written = store.write_new(&Version::new(0, 0, 4), b"{}")?;
//! ```

pub mod cli;
mod error;
mod store;
mod version;

pub use error::ArtifactError;
pub use store::{ArtifactRef, ArtifactStore, ENRICHED_DIR, is_enriched_artifact, parse_artifact_name};
pub use version::Version;

/// Width of the zero-padded sequence suffix
pub const SEQUENCE_WIDTH: usize = 3;

/// How many successive sequence numbers `write_new` tries before giving up
pub const MAX_WRITE_ATTEMPTS: u32 = 16;
