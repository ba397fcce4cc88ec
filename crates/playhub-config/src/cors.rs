use crate::env;

#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

impl CorsConfig {
    pub fn from_env() -> Self {
        env::list("CORS_ALLOWED_ORIGINS")
            .map(|allowed_origins| Self { allowed_origins })
            .unwrap_or_default()
    }
}
