use std::path::PathBuf;

use ai_llm_service::error_handler::{env_opt, env_or};

pub const DEFAULT_USER_STORE_DIR: &str = "data/users";
pub const DEFAULT_UPLOADTHING_URL: &str = "https://api.uploadthing.com";

/// Where user documents live and how uploaded objects are removed.
#[derive(Debug, Clone)]
pub struct UserStoreConfig {
    pub dir: PathBuf,
    /// Object storage; `None` means uploads are never deleted remotely.
    pub uploadthing: Option<UploadThingConfig>,
}

#[derive(Debug, Clone)]
pub struct UploadThingConfig {
    pub secret: String,
    pub base_url: String,
}

impl UserStoreConfig {
    pub fn from_env() -> Self {
        let uploadthing = env_opt("UPLOADTHING_SECRET").map(|secret| UploadThingConfig {
            secret,
            base_url: env_or("UPLOADTHING_URL", DEFAULT_UPLOADTHING_URL)
                .trim_end_matches('/')
                .to_string(),
        });
        Self {
            dir: PathBuf::from(env_or("USER_STORE_DIR", DEFAULT_USER_STORE_DIR)),
            uploadthing,
        }
    }
}
