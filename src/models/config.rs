//! Configuration model loaded from external sources.

use serde::Deserialize;

fn default_ollama_timeout_secs() -> u64 {
    300
}

fn default_min_human_click_delay_secs() -> i64 {
    3
}

#[derive(Clone, Debug, Deserialize)]
/// Settings shared across handlers, the analyzers and the maintenance tools.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub database_url: String,
    pub templates_dir: String,
    /// Externally reachable base URL used to build tracking links.
    pub public_url: String,
    pub ollama_url: String,
    pub ollama_default_model: String,
    #[serde(default = "default_ollama_timeout_secs")]
    pub ollama_timeout_secs: u64,
    /// Upper bound for APK/IPA uploads, in bytes.
    pub max_app_file_size: usize,
    pub max_pcap_file_size: usize,
    pub max_source_file_size: usize,
    /// Events closer than this to the send time are treated as automated.
    #[serde(default = "default_min_human_click_delay_secs")]
    pub min_human_click_delay_secs: i64,
    /// Additional CIDR ranges whose traffic is attributed to scanners.
    #[serde(default)]
    pub bot_ip_ranges: Vec<String>,
    /// Take the tracked client address from `Forwarded`/`X-Forwarded-For`.
    /// Enable only when a reverse proxy overwrites those headers.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

impl ServerConfig {
    /// Largest single upload any tool accepts.
    pub fn max_upload_size(&self) -> usize {
        self.max_app_file_size
            .max(self.max_pcap_file_size)
            .max(self.max_source_file_size)
    }
}
