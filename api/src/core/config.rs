use ai_llm_service::error_handler::env_or;

pub const DEFAULT_API_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_AUTH_USER_HEADER: &str = "x-authenticated-user";

/// Listener and session settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub address: String,
    /// Header the auth gateway sets to the authenticated user id.
    pub auth_user_header: String,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            address: env_or("API_ADDRESS", DEFAULT_API_ADDRESS),
            auth_user_header: env_or("AUTH_USER_HEADER", DEFAULT_AUTH_USER_HEADER)
                .to_ascii_lowercase(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_API_ADDRESS.into(),
            auth_user_header: DEFAULT_AUTH_USER_HEADER.into(),
        }
    }
}
