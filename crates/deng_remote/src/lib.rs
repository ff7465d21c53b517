//! # deng_remote - idgames Link
//!
//! Browses the idgames archive as a package repository:
//! - **listing**: the mirror's `ls-laR.gz`, decompressed and parsed into a file tree
//! - **package**: package ids and versions derived from listing paths
//! - **metadata**: synthesized `info.dei` metadata per package
//! - **link**: background download and the Disconnected → Loading → Ready state machine
//!
//! ## Example
//!
//! ```ignore
//! use deng_remote::prelude::*;
//!
//! let mut link = IdgamesLink::new(LinkConfig::default());
//! link.connect()?;
//! loop {
//!     for event in link.poll() {
//!         if event == LinkEvent::StatusChanged(LinkStatus::Ready) {
//!             for package in link.find_packages("^idgames\\.levels\\.doom\\.")? {
//!                 println!("{}", package.versioned_id());
//!             }
//!         }
//!     }
//! }
//! ```

pub mod link;
pub mod listing;
pub mod metadata;
pub mod package;

pub use link::{IdgamesLink, LinkConfig, LinkError, LinkEvent, LinkStatus, DEFAULT_LISTING_URL};
pub use listing::{Folder, Listing, ListingError, Modified, RemoteFile};
pub use metadata::{MetadataError, PackageMetadata};
pub use package::{is_bucket_folder, is_package_archive, package_id, PackageInfo};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::link::{IdgamesLink, LinkConfig, LinkError, LinkEvent, LinkStatus};
    pub use crate::listing::Listing;
    pub use crate::metadata::PackageMetadata;
    pub use crate::package::PackageInfo;
}
