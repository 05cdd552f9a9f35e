// Runtime configuration, read once at startup from the environment (and a
// `.env` file, loaded by `main` before this runs).

use crate::core::ai::{
    AiConfig, ModeProfile, DEFAULT_FAST_INSTRUCTION, DEFAULT_RESEARCH_INSTRUCTION,
};
use crate::core::dispatch::WelcomeSettings;
use crate::core::documents::{DocumentTargets, VariantTargets};
use crate::infra::mail::SmtpSettings;
use chrono_tz::Tz;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiBackend {
    Gemini,
    OpenRouter,
}

#[derive(Debug, Clone)]
pub struct AiSettings {
    pub backend: AiBackend,
    pub api_key: String,
    pub fast: ModeProfile,
    pub research: ModeProfile,
}

#[derive(Debug, Clone, Default)]
pub struct GoogleCredentials {
    pub key_path: Option<String>,
    pub key_json: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PeopleSheet {
    pub sheet_id: String,
    pub range: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub ai: AiSettings,
    pub google: GoogleCredentials,
    pub targets: DocumentTargets,
    pub people: PeopleSheet,
    /// `None` disables e-mail delivery.
    pub smtp: Option<SmtpSettings>,
    pub timezone: Tz,
    pub welcome: WelcomeSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let host = or("HOST", "0.0.0.0");
        let port = or("PORT", "8080");
        let listen_addr: SocketAddr =
            format!("{}:{}", host, port)
                .parse()
                .map_err(|_| ConfigError::Invalid {
                    key: "PORT",
                    value: format!("{}:{}", host, port),
                })?;

        let backend = match or("AI_PROVIDER", "gemini").to_lowercase().as_str() {
            "gemini" => AiBackend::Gemini,
            "openrouter" => AiBackend::OpenRouter,
            other => {
                return Err(ConfigError::Invalid {
                    key: "AI_PROVIDER",
                    value: other.to_string(),
                })
            }
        };
        let api_key = match backend {
            AiBackend::Gemini => {
                get("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?
            }
            AiBackend::OpenRouter => {
                get("OPENROUTER_API_KEY").ok_or(ConfigError::Missing("OPENROUTER_API_KEY"))?
            }
        };
        let ai = AiSettings {
            backend,
            api_key,
            fast: ModeProfile {
                config: AiConfig::for_model(or("AI_MODEL_FAST", "gemini-1.5-flash")),
                system_instruction: read_prompt(
                    get("AI_SYSTEM_PROMPT_FAST_FILE"),
                    DEFAULT_FAST_INSTRUCTION,
                ),
            },
            research: ModeProfile {
                config: AiConfig::for_model(or("AI_MODEL_RESEARCH", "gemini-1.5-pro")),
                system_instruction: read_prompt(
                    get("AI_SYSTEM_PROMPT_RESEARCH_FILE"),
                    DEFAULT_RESEARCH_INSTRUCTION,
                ),
            },
        };

        let targets = DocumentTargets {
            form_a: VariantTargets {
                template_id: or("FORM_A_TEMPLATE_ID", "YOUR_FORM_A_TEMPLATE_ID"),
                folder_id: or("FORM_A_FOLDER_ID", "YOUR_FORM_A_FOLDER_ID"),
                checklist_id: Some(or("FORM_A_CHECKLIST_ID", "YOUR_CHECKLIST_ID")),
                email_documents: true,
            },
            subtype_a: VariantTargets {
                template_id: or("SUBTYPE_A_TEMPLATE_ID", "YOUR_SUBTYPE_A_TEMPLATE_ID"),
                folder_id: or("SUBTYPE_A_FOLDER_ID", "YOUR_SUBTYPE_A_FOLDER_ID"),
                checklist_id: None,
                email_documents: false,
            },
            subtype_b: VariantTargets {
                template_id: or("SUBTYPE_B_TEMPLATE_ID", "YOUR_SUBTYPE_B_TEMPLATE_ID"),
                folder_id: or("SUBTYPE_B_FOLDER_ID", "YOUR_SUBTYPE_B_FOLDER_ID"),
                checklist_id: None,
                email_documents: false,
            },
        };

        let smtp_port = or("SMTP_PORT", "587");
        let smtp = match (get("SMTP_EMAIL"), get("SMTP_PASSWORD")) {
            (Some(email), Some(password)) => Some(SmtpSettings {
                server: or("SMTP_SERVER", "smtp.your-domain.com"),
                port: smtp_port.parse().map_err(|_| ConfigError::Invalid {
                    key: "SMTP_PORT",
                    value: smtp_port.clone(),
                })?,
                email,
                password,
            }),
            _ => None,
        };

        let tz_name = or("FORM_TIMEZONE", "Europe/Warsaw");
        let timezone: Tz = tz_name.parse().map_err(|_| ConfigError::Invalid {
            key: "FORM_TIMEZONE",
            value: tz_name.clone(),
        })?;

        Ok(Self {
            listen_addr,
            ai,
            google: GoogleCredentials {
                key_path: get("GOOGLE_SERVICE_ACCOUNT_KEY"),
                key_json: get("GOOGLE_SERVICE_ACCOUNT_JSON"),
            },
            targets,
            people: PeopleSheet {
                sheet_id: or("FORM_A_SHEET_ID", "YOUR_SHEET_ID"),
                range: or("FORM_A_SHEET_RANGE", "Sheet1!A2:J"),
            },
            smtp,
            timezone,
            welcome: WelcomeSettings {
                image_url: or("WELCOME_IMAGE_URL", ""),
                help_url: or("HELP_URL", "https://support.google.com/chat"),
            },
        })
    }
}

/// Reads a system instruction override, falling back to the built-in one.
fn read_prompt(path: Option<String>, default: &str) -> String {
    let Some(path) = path else {
        return default.to_string();
    };
    match std::fs::read_to_string(&path) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            tracing::warn!("System prompt file {} is empty, using the default", path);
            default.to_string()
        }
        Err(e) => {
            tracing::warn!("Failed to read system prompt file at {}: {}", path, e);
            default.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_with_only_api_key() {
        let config = config(&[("GEMINI_API_KEY", "key")]).unwrap();

        assert_eq!(config.listen_addr.port(), 8080);
        assert_eq!(config.ai.backend, AiBackend::Gemini);
        assert_eq!(config.ai.fast.config.model, "gemini-1.5-flash");
        assert_eq!(config.ai.research.config.model, "gemini-1.5-pro");
        assert_eq!(config.ai.fast.system_instruction, DEFAULT_FAST_INSTRUCTION);
        assert_eq!(config.people.range, "Sheet1!A2:J");
        assert_eq!(config.timezone, chrono_tz::Europe::Warsaw);
        assert!(config.smtp.is_none());
        assert!(config.targets.form_a.email_documents);
        assert!(config.targets.form_a.checklist_id.is_some());
        assert!(!config.targets.subtype_b.email_documents);
        assert!(config.google.key_path.is_none());
    }

    #[test]
    fn missing_gemini_key_is_an_error() {
        let err = config(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GEMINI_API_KEY")));
    }

    #[test]
    fn openrouter_needs_its_own_key() {
        let err = config(&[("AI_PROVIDER", "openrouter"), ("GEMINI_API_KEY", "g")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("OPENROUTER_API_KEY")));

        let config = config(&[("AI_PROVIDER", "OpenRouter"), ("OPENROUTER_API_KEY", "o")]).unwrap();
        assert_eq!(config.ai.backend, AiBackend::OpenRouter);
        assert_eq!(config.ai.api_key, "o");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config(&[("GEMINI_API_KEY", "k"), ("PORT", "http")]),
            Err(ConfigError::Invalid { key: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("GEMINI_API_KEY", "k"), ("FORM_TIMEZONE", "Mars/Olympus")]),
            Err(ConfigError::Invalid {
                key: "FORM_TIMEZONE",
                ..
            })
        ));
        assert!(matches!(
            config(&[("GEMINI_API_KEY", "k"), ("AI_PROVIDER", "llama")]),
            Err(ConfigError::Invalid {
                key: "AI_PROVIDER",
                ..
            })
        ));
    }

    #[test]
    fn smtp_needs_both_credentials() {
        let only_email =
            config(&[("GEMINI_API_KEY", "k"), ("SMTP_EMAIL", "bot@example.com")]).unwrap();
        assert!(only_email.smtp.is_none());

        let both = config(&[
            ("GEMINI_API_KEY", "k"),
            ("SMTP_EMAIL", "bot@example.com"),
            ("SMTP_PASSWORD", "secret"),
            ("SMTP_PORT", "2525"),
        ])
        .unwrap();
        let smtp = both.smtp.unwrap();
        assert_eq!(smtp.server, "smtp.your-domain.com");
        assert_eq!(smtp.port, 2525);
    }

    #[test]
    fn prompt_file_overrides_instruction() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Answer like a tax advisor.").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = config(&[
            ("GEMINI_API_KEY", "k"),
            ("AI_SYSTEM_PROMPT_RESEARCH_FILE", path.as_str()),
        ])
        .unwrap();

        assert_eq!(config.ai.research.system_instruction, "Answer like a tax advisor.");
        assert_eq!(config.ai.fast.system_instruction, DEFAULT_FAST_INSTRUCTION);
    }

    #[test]
    fn unreadable_prompt_file_falls_back() {
        let text = read_prompt(Some("/nonexistent/prompt.txt".into()), "default");
        assert_eq!(text, "default");
    }
}
