//! Cache mount orchestration
//!
//! Turns a [`MountRequest`] into filesystem side effects and a report:
//! resolve the enabled modes, plan them, mount every planned and manual path
//! from the cache root, remove stale paths, and persist metadata describing
//! what was mounted.
//!
//! # Dry run
//!
//! When the [`Mounter`] is not destructive every step still runs and reports
//! what would happen. Only the mount, removal and metadata write calls are
//! skipped.
//!
//! # Layout of the cache root
//!
//! | Path | Content |
//! |------|---------|
//! | `<root>/<mount path>` | cached data for one mount path |
//! | `<root>/.hoard/cache-metadata.json` | metadata of the last destructive run |

mod metadata;
mod mounter;
mod request;
mod response;

pub use metadata::{CacheMetadata, CacheMetadataEntry, METADATA_DIR, METADATA_FILE};
pub use mounter::{cache_path, resolve_home, Mounter};
pub use request::MountRequest;
pub use response::{MountResponse, MountResponseInput, MountResponseOutput, MountResult};
