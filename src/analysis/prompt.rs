//! Prompt construction and reply parsing for LLM-backed analysis.

use serde_json::{Map, Value};

use crate::analysis::AnalysisError;
use crate::domain::scan::{
    CodeInput, MobileInput, NetworkInput, PhishingInput, ToolInput, UploadedFile,
};

const RESPONSE_FORMAT: &str = "Respond with a single JSON object containing the keys \
\"summary\" (string), \"risk_level\" (one of \"low\", \"medium\", \"high\", \"critical\"), \
\"findings\" (array of objects with \"title\", \"severity\" and \"description\") and \
\"recommendations\" (array of strings).";

fn describe_file(file: &UploadedFile) -> String {
    format!(
        "file name: {}, size: {} bytes, content type: {}",
        file.file_name,
        file.size,
        file.content_type.as_deref().unwrap_or("unknown")
    )
}

fn task(input: &ToolInput) -> String {
    match input {
        ToolInput::Vulnerability { url, depth } => format!(
            "Act as a web application vulnerability scanner. Perform a {depth} assessment of \
             {url}. Cover injection flaws, XSS, misconfigured security headers, TLS issues \
             and exposed sensitive endpoints."
        ),
        ToolInput::Waf { url } => format!(
            "Act as a web application firewall analyst. Determine whether {url} is protected \
             by a WAF, identify the likely vendor and assess how well the configuration \
             blocks common attack payloads."
        ),
        ToolInput::Phishing(PhishingInput::Url(url)) => format!(
            "Act as a phishing detection engine. Assess whether the URL {url} is a phishing \
             site. Consider typosquatting, suspicious paths and brand impersonation."
        ),
        ToolInput::Phishing(PhishingInput::Email(body)) => format!(
            "Act as a phishing detection engine. Assess whether the following email is a \
             phishing attempt. Consider urgency cues, spoofed senders and malicious links.\n\n\
             Email:\n{body}"
        ),
        ToolInput::Password { password } => format!(
            "Act as a password strength auditor. Evaluate the password below for length, \
             character variety, dictionary words and known breach patterns. Estimate the \
             time to crack it. Never repeat the password in your answer.\n\nPassword: {}",
            password.expose()
        ),
        ToolInput::Network(NetworkInput::Capture(file)) => format!(
            "Act as a network traffic analyst. A packet capture was uploaded ({}). Describe \
             the threats such a capture typically reveals and what to look for in it.",
            describe_file(file)
        ),
        ToolInput::Network(NetworkInput::Host(host)) => format!(
            "Act as a network security analyst. Assess the exposure of host {host}: likely \
             open services, risky protocols and hardening steps."
        ),
        ToolInput::Iot { target } => format!(
            "Act as an IoT security scanner. Assess the device or search target \"{target}\" \
             for default credentials, outdated firmware and exposed management interfaces."
        ),
        ToolInput::Cloud { provider, config } => format!(
            "Act as a cloud security posture analyst for {provider}. Review the configuration \
             below for public exposure, weak IAM policies, missing encryption and logging \
             gaps.\n\nConfiguration:\n{config}"
        ),
        ToolInput::Mobile(MobileInput::Package { platform, file }) => format!(
            "Act as a mobile application security scanner. An {platform} package was uploaded \
             ({}). Describe the security checks relevant to it: permissions, insecure \
             storage, hardcoded secrets and transport security.",
            describe_file(file)
        ),
        ToolInput::Mobile(MobileInput::StoreLookup(package)) => format!(
            "Act as a mobile application security scanner. Assess the published application \
             \"{package}\" for known vulnerabilities, excessive permissions and privacy risks."
        ),
        ToolInput::Code(CodeInput::Snippet { language, code }) => format!(
            "Act as a static code analyzer. Review the following {language} code for security \
             vulnerabilities and insecure patterns.\n\nCode:\n{code}"
        ),
        ToolInput::Code(CodeInput::Archive(file)) => format!(
            "Act as a static code analyzer. A source archive was uploaded ({}). Describe the \
             review plan and common vulnerabilities to check for in such a project.",
            describe_file(file)
        ),
        ToolInput::GrcQuestions { framework, answers } => format!(
            "Act as a governance, risk and compliance auditor for {framework}. Based on the \
             assessment answers below, estimate the compliance level and list the gaps.\n\n\
             Answers:\n{answers}"
        ),
        ToolInput::ThreatModeling {
            description,
            methodology,
        } => format!(
            "Act as a threat modeling expert using the {methodology} methodology. Build a \
             threat model for the following system.\n\nSystem:\n{description}"
        ),
    }
}

/// Full prompt sent to the model for the given input.
pub fn build_prompt(input: &ToolInput) -> String {
    format!("{}\n\n{RESPONSE_FORMAT}", task(input))
}

/// Turns the raw model reply into the `data` of a tool response.
///
/// A JSON object is passed through untouched; any other reply is wrapped as
/// `{"report": <text>}`.
pub fn parse_reply(reply: &str) -> Result<Value, AnalysisError> {
    let reply = reply.trim();
    if reply.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(reply) {
        return Ok(value);
    }

    let mut wrapped = Map::new();
    wrapped.insert("report".to_string(), Value::String(reply.to_string()));
    Ok(Value::Object(wrapped))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;
    use crate::domain::scan::{MobilePlatform, Secret};

    #[test]
    fn object_reply_is_returned_unchanged() {
        let data = parse_reply(r#" {"summary":"ok","findings":[]} "#).expect("reply");
        assert_eq!(data, json!({"summary": "ok", "findings": []}));
    }

    #[test]
    fn non_object_reply_is_wrapped() {
        assert_eq!(
            parse_reply("Looks safe.").expect("reply"),
            json!({"report": "Looks safe."})
        );
        assert_eq!(
            parse_reply("[1,2]").expect("reply"),
            json!({"report": "[1,2]"})
        );
    }

    #[test]
    fn blank_reply_is_an_error() {
        assert!(matches!(
            parse_reply("  \n"),
            Err(AnalysisError::EmptyResponse)
        ));
    }

    #[test]
    fn upload_prompt_carries_metadata_only() {
        let input = ToolInput::Mobile(MobileInput::Package {
            platform: MobilePlatform::Android,
            file: UploadedFile {
                file_name: "app.apk".to_string(),
                size: 2048,
                content_type: None,
                path: PathBuf::from("/tmp/upload-123"),
            },
        });

        let prompt = build_prompt(&input);

        assert!(prompt.contains("app.apk"));
        assert!(prompt.contains("2048 bytes"));
        assert!(!prompt.contains("/tmp/upload-123"));
    }

    #[test]
    fn password_prompt_uses_the_secret_value() {
        let prompt = build_prompt(&ToolInput::Password {
            password: Secret::new("correct horse"),
        });
        assert!(prompt.contains("correct horse"));
        assert!(prompt.ends_with(RESPONSE_FORMAT));
    }
}
