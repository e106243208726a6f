use marti_blob::BlobError;

#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("blob error: {0}")]
    Blob(#[from] BlobError),

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
