use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_PAGE_PATH: &str = "blip2-client.html";

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// `None` keeps UI state in memory only.
    pub state_file: Option<PathBuf>,
    pub page_path: PathBuf,
    pub notification_lifetime: Duration,
}

/// `<data dir>/blip2-client/storage.json`, if the platform has a data dir.
pub fn default_state_file() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("blip2-client").join("storage.json"))
}
