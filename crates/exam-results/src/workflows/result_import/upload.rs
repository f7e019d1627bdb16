//! Type and size gating for uploaded result sheets.

/// A file as received from the transport, before any checks.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn csv(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: Some(filename.into()),
            content_type: Some(mime::TEXT_CSV.to_string()),
            bytes: bytes.into(),
        }
    }
}

/// An upload that passed the gate; its buffer is bounded by the size cap.
#[derive(Debug)]
pub struct CsvUpload {
    filename: String,
    bytes: Vec<u8>,
}

impl CsvUpload {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadRejection {
    #[error("no CSV file was uploaded")]
    MissingFile,
    #[error("exactly one file may be uploaded per import")]
    MultipleFiles,
    #[error("only CSV files are accepted (got '{filename}' as {content_type})")]
    UnsupportedType {
        filename: String,
        content_type: String,
    },
    #[error("uploaded file exceeds the {limit} byte limit")]
    TooLarge { limit: usize },
    #[error("uploaded file is empty")]
    Empty,
    #[error("could not read multipart upload: {0}")]
    Transport(String),
}

/// Checks applied to every upload before decoding.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    max_bytes: usize,
}

impl UploadPolicy {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn accept(&self, file: UploadedFile) -> Result<CsvUpload, UploadRejection> {
        let UploadedFile {
            filename,
            content_type,
            bytes,
        } = file;
        let filename = filename.unwrap_or_default();

        if !is_csv_content_type(content_type.as_deref()) && !has_csv_extension(&filename) {
            return Err(UploadRejection::UnsupportedType {
                filename,
                content_type: content_type.unwrap_or_else(|| "unknown type".to_string()),
            });
        }

        if bytes.len() > self.max_bytes {
            return Err(UploadRejection::TooLarge {
                limit: self.max_bytes,
            });
        }

        if bytes.is_empty() {
            return Err(UploadRejection::Empty);
        }

        Ok(CsvUpload { filename, bytes })
    }
}

fn is_csv_content_type(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|raw| raw.parse::<mime::Mime>().ok())
        .map(|parsed| parsed.essence_str() == mime::TEXT_CSV.essence_str())
        .unwrap_or(false)
}

fn has_csv_extension(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".csv")
}
