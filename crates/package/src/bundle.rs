use std::collections::BTreeSet;
use std::io::{Cursor, Write};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tracing::debug;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use marti_blob::{BlobError, BlobReader, BlobStore, sanitize_file_name};
use marti_core::Resource;

use crate::error::PackageError;
use crate::manifest::{MANIFEST_PATH, Manifest, ManifestContent, Parameter};

/// Stable package identifier for a logical owner.
///
/// Name-based (`UUIDv5` in the nil namespace), so every regeneration for the
/// same owner produces the same uid.
pub fn package_uid_for(owner: &str) -> String {
    Uuid::new_v5(&Uuid::nil(), owner.as_bytes()).to_string()
}

/// Where bundled entry bytes come from.
#[async_trait]
pub trait EntrySource: Send + Sync {
    async fn open(&self, resource: &Resource) -> Result<BlobReader, BlobError>;
}

/// Reads entries from a content-addressed store by `(scope, hash)`.
pub struct StoreSource<'a>(pub &'a dyn BlobStore);

#[async_trait]
impl EntrySource for StoreSource<'_> {
    async fn open(&self, resource: &Resource) -> Result<BlobReader, BlobError> {
        self.0.get(&resource.scope, &resource.hash).await
    }
}

/// A package under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionPackage {
    uid: String,
    name: String,
    params: Vec<Parameter>,
    entries: Vec<Resource>,
}

impl MissionPackage {
    pub fn new(uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            params: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set a configuration parameter, replacing an earlier value for `key`.
    pub fn param(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|p| p.name == key) {
            Some(existing) => existing.value = value,
            None => self.params.push(Parameter::new(key, value)),
        }
        self
    }

    pub fn add_files(&mut self, resources: impl IntoIterator<Item = Resource>) -> &mut Self {
        self.entries.extend(resources);
        self
    }

    /// Entries paired with their archive paths, first occurrence of a path wins.
    fn placed(&self) -> Vec<(String, &Resource)> {
        let mut seen = BTreeSet::new();
        self.entries
            .iter()
            .map(|r| (entry_path(r), r))
            .filter(|(path, _)| seen.insert(path.clone()))
            .collect()
    }

    /// The manifest describing this package.
    pub fn manifest(&self) -> Manifest {
        let mut configuration = vec![
            Parameter::new("uid", self.uid.clone()),
            Parameter::new("name", self.name.clone()),
        ];
        configuration.extend(self.params.iter().cloned());

        let contents = self
            .placed()
            .into_iter()
            .map(|(zip_entry, r)| {
                let mut parameters = vec![Parameter::new("name", r.name.clone())];
                if !r.uid.is_empty() {
                    parameters.push(Parameter::new("uid", r.uid.clone()));
                }
                if !r.mime_type.is_empty() {
                    parameters.push(Parameter::new("contentType", r.mime_type.clone()));
                }
                ManifestContent {
                    ignore: false,
                    zip_entry,
                    parameters,
                }
            })
            .collect();

        Manifest::new(configuration, contents)
    }

    /// Build the archive, reading each entry from `source`.
    ///
    /// Any entry that cannot be read aborts the whole bundle.
    pub async fn bundle(&self, source: &dyn EntrySource) -> Result<Vec<u8>, PackageError> {
        let manifest = self.manifest().to_xml()?;
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(MANIFEST_PATH, options)?;
        zip.write_all(manifest.as_bytes())?;

        for (path, resource) in self.placed() {
            let mut content = Vec::new();
            source.open(resource).await?.read_to_end(&mut content).await?;
            zip.start_file(path, options)?;
            zip.write_all(&content)?;
        }

        let bytes = zip.finish()?.into_inner();
        debug!(
            uid = %self.uid,
            name = %self.name,
            entries = self.entries.len(),
            bytes = bytes.len(),
            "package bundled"
        );
        Ok(bytes)
    }
}

fn entry_path(resource: &Resource) -> String {
    let file = sanitize_file_name(&resource.file_name)
        .or_else(|| sanitize_file_name(&resource.name))
        .unwrap_or_else(|| resource.hash.to_string());
    format!("{}/{file}", resource.hash)
}
