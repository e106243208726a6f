use thiserror::Error;

/// Errors raised while rendering or parsing the XML document shapes.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("xml write error: {0}")]
    Write(#[from] std::io::Error),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("xml serialization error: {0}")]
    Serialize(#[from] quick_xml::se::SeError),

    #[error("xml parse error: {0}")]
    Parse(#[from] quick_xml::de::DeError),

    #[error("xml output is not utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
