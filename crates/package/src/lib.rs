//! Mission package bundling.
//!
//! A package is a zip container holding `MANIFEST/manifest.xml` plus one
//! entry per bundled resource at `<hash>/<file name>`. The manifest is a
//! pure function of the package uid, name, parameters, and entry list, so
//! regenerating a package for the same owner yields identical manifest
//! bytes.

pub mod bundle;
pub mod error;
pub mod manifest;

pub use bundle::{EntrySource, MissionPackage, StoreSource, package_uid_for};
pub use error::PackageError;
pub use manifest::{MANIFEST_PATH, Manifest, ManifestContent, Parameter};
