use serde::{Deserialize, Serialize};

use crate::error::PackageError;

/// Archive path of the manifest document.
pub const MANIFEST_PATH: &str = "MANIFEST/manifest.xml";

const MANIFEST_VERSION: &str = "2";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@value")]
    pub value: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterList {
    #[serde(rename = "Parameter", default)]
    pub parameters: Vec<Parameter>,
}

/// One bundled file: its path inside the archive and its original metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestContent {
    #[serde(rename = "@ignore")]
    pub ignore: bool,
    #[serde(rename = "@zipEntry")]
    pub zip_entry: String,
    #[serde(rename = "Parameter", default)]
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentList {
    #[serde(rename = "Content", default)]
    pub contents: Vec<ManifestContent>,
}

/// The package manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "MissionPackageManifest")]
pub struct Manifest {
    #[serde(rename = "@version")]
    pub version: String,
    #[serde(rename = "Configuration")]
    pub configuration: ParameterList,
    #[serde(rename = "Contents")]
    pub contents: ContentList,
}

impl Manifest {
    pub fn new(configuration: Vec<Parameter>, contents: Vec<ManifestContent>) -> Self {
        Self {
            version: MANIFEST_VERSION.to_owned(),
            configuration: ParameterList {
                parameters: configuration,
            },
            contents: ContentList { contents },
        }
    }

    /// Value of the configuration parameter `name`.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.configuration
            .parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn zip_entries(&self) -> impl Iterator<Item = &str> {
        self.contents.contents.iter().map(|c| c.zip_entry.as_str())
    }

    pub fn to_xml(&self) -> Result<String, PackageError> {
        quick_xml::se::to_string(self).map_err(|e| PackageError::Manifest(e.to_string()))
    }

    pub fn from_xml(xml: &str) -> Result<Self, PackageError> {
        quick_xml::de::from_str(xml).map_err(|e| PackageError::Manifest(e.to_string()))
    }
}
