use crate::env;

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
    /// Base URL used to build password-reset links.
    pub frontend_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@playhub.gg".to_string(),
            from_name: "PlayHub".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
        }
    }
}

impl EmailConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env::flag_or("SMTP_ENABLED", defaults.enabled),
            smtp_host: env::string_or("SMTP_HOST", defaults.smtp_host),
            smtp_port: env::parsed_or("SMTP_PORT", defaults.smtp_port),
            smtp_username: env::string_or("SMTP_USERNAME", defaults.smtp_username),
            smtp_password: env::string_or("SMTP_PASSWORD", defaults.smtp_password),
            from_email: env::string_or("FROM_EMAIL", defaults.from_email),
            from_name: env::string_or("FROM_NAME", defaults.from_name),
            frontend_url: env::string_or("FRONTEND_URL", defaults.frontend_url),
        }
    }
}
