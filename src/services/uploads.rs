//! Size and extension rules for files uploaded to the tool router.

use crate::domain::scan::UploadedFile;
use crate::models::config::ServerConfig;
use crate::services::tools::ToolRequestError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadKind {
    Capture,
    MobileApp,
    SourceArchive,
}

impl UploadKind {
    /// Accepted extensions, longest first so `tar.gz` wins over `gz`.
    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            UploadKind::Capture => &["pcapng", "pcap", "cap"],
            UploadKind::MobileApp => &["apk", "ipa"],
            UploadKind::SourceArchive => &["tar.gz", "tgz", "zip"],
        }
    }

    const fn label(self) -> &'static str {
        match self {
            UploadKind::Capture => "packet capture",
            UploadKind::MobileApp => "mobile application",
            UploadKind::SourceArchive => "source archive",
        }
    }
}

/// Per-kind upload size limits, in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadLimits {
    pub capture: usize,
    pub mobile_app: usize,
    pub source_archive: usize,
}

impl From<&ServerConfig> for UploadLimits {
    fn from(config: &ServerConfig) -> Self {
        Self {
            capture: config.max_pcap_file_size,
            mobile_app: config.max_app_file_size,
            source_archive: config.max_source_file_size,
        }
    }
}

impl UploadLimits {
    pub fn policy(&self, kind: UploadKind) -> UploadPolicy {
        let max_size = match kind {
            UploadKind::Capture => self.capture,
            UploadKind::MobileApp => self.mobile_app,
            UploadKind::SourceArchive => self.source_archive,
        };
        UploadPolicy { kind, max_size }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadPolicy {
    pub kind: UploadKind,
    pub max_size: usize,
}

impl UploadPolicy {
    /// Validates the file and returns the matched extension in lower case.
    pub fn check(&self, file: &UploadedFile) -> Result<&'static str, ToolRequestError> {
        let name = file.file_name.to_ascii_lowercase();
        let extension = self
            .kind
            .extensions()
            .iter()
            .copied()
            .find(|ext| name.ends_with(&format!(".{ext}")))
            .ok_or_else(|| {
                ToolRequestError::Upload(format!(
                    "Invalid {} file type. Allowed extensions: {}",
                    self.kind.label(),
                    self.kind.extensions().join(", ")
                ))
            })?;

        if file.size == 0 {
            return Err(ToolRequestError::Upload("Uploaded file is empty".to_string()));
        }

        if file.size > self.max_size {
            return Err(ToolRequestError::Upload(format!(
                "File too large. Maximum size for a {} is {} bytes",
                self.kind.label(),
                self.max_size
            )));
        }

        Ok(extension)
    }
}
