//! Decoding of tool router bodies into [`RawToolRequest`].

use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use serde_json::{Map, Value};

use crate::domain::scan::UploadedFile;
use crate::forms::FormError;
use crate::services::tools::RawToolRequest;

/// Multipart variant of a tool request, used when a file is uploaded.
#[derive(MultipartForm)]
pub struct ToolUploadForm {
    pub tool: Option<Text<String>>,
    pub url: Option<Text<String>>,
    pub scan_type: Option<Text<String>>,
    pub email_content: Option<Text<String>>,
    pub password: Option<Text<String>>,
    pub target: Option<Text<String>>,
    pub provider: Option<Text<String>>,
    pub config: Option<Text<String>>,
    pub package_name: Option<Text<String>>,
    pub code: Option<Text<String>>,
    pub language: Option<Text<String>>,
    pub framework: Option<Text<String>>,
    pub answers: Option<Text<String>>,
    pub system_description: Option<Text<String>>,
    pub methodology: Option<Text<String>>,
    pub model: Option<Text<String>>,
    pub pcap_file: Option<TempFile>,
    pub app_file: Option<TempFile>,
    pub source_file: Option<TempFile>,
    pub file: Option<TempFile>,
}

fn uploaded(file: &TempFile) -> UploadedFile {
    UploadedFile {
        file_name: file.file_name.clone().unwrap_or_default(),
        size: file.size,
        content_type: file.content_type.as_ref().map(ToString::to_string),
        path: file.file.path().to_path_buf(),
    }
}

impl ToolUploadForm {
    /// Builds the raw request; the temp files must outlive the returned value's use.
    pub fn to_raw(&self) -> RawToolRequest {
        let texts = [
            ("tool", &self.tool),
            ("url", &self.url),
            ("scan_type", &self.scan_type),
            ("email_content", &self.email_content),
            ("password", &self.password),
            ("target", &self.target),
            ("provider", &self.provider),
            ("config", &self.config),
            ("package_name", &self.package_name),
            ("code", &self.code),
            ("language", &self.language),
            ("framework", &self.framework),
            ("answers", &self.answers),
            ("system_description", &self.system_description),
            ("methodology", &self.methodology),
            ("model", &self.model),
        ];

        let fields = texts
            .into_iter()
            .filter_map(|(name, value)| {
                value
                    .as_ref()
                    .map(|text| (name.to_string(), Value::String(text.0.clone())))
            })
            .collect::<Map<_, _>>();

        let upload = [&self.pcap_file, &self.app_file, &self.source_file, &self.file]
            .into_iter()
            .flatten()
            .next()
            .map(uploaded);

        RawToolRequest::new(fields).with_upload(upload)
    }
}

/// Decodes a JSON object body.
pub fn fields_from_json(body: &[u8]) -> Result<Map<String, Value>, FormError> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(FormError::NotAnObject),
    }
}

/// Decodes an `application/x-www-form-urlencoded` body; the last value of a repeated key wins.
pub fn fields_from_form(body: &[u8]) -> Result<Map<String, Value>, FormError> {
    let pairs = serde_html_form::from_bytes::<Vec<(String, String)>>(body)
        .map_err(|err| FormError::Encoded(err.to_string()))?;

    Ok(pairs
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_body_must_be_an_object() {
        let fields = fields_from_json(br#"{"tool":"waf","url":"https://example.com"}"#)
            .expect("fields");
        assert_eq!(fields.get("tool"), Some(&json!("waf")));

        assert!(matches!(fields_from_json(b"[1]"), Err(FormError::NotAnObject)));
        assert!(matches!(fields_from_json(b"{"), Err(FormError::Json(_))));
    }

    #[test]
    fn form_body_is_decoded() {
        let fields =
            fields_from_form(b"tool=cloud&provider=aws&config=%7B%22a%22%3A1%7D").expect("fields");
        assert_eq!(fields.get("provider"), Some(&json!("aws")));
        assert_eq!(fields.get("config"), Some(&json!("{\"a\":1}")));
    }
}
