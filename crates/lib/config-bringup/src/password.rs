//! Password resolution.

use crate::PasswordError;

/// Resolve the password from config, including env lookups.
pub fn resolve_password(source: &config_core::PasswordSource) -> Result<String, PasswordError> {
    match source {
        config_core::PasswordSource::Plain(password) => Ok(password.clone()),
        config_core::PasswordSource::Env { env } => match std::env::var(env) {
            Ok(password) => Ok(password),
            Err(std::env::VarError::NotPresent) => {
                Err(PasswordError::MissingEnv { var: env.clone() })
            }
            Err(source) => Err(PasswordError::Env {
                var: env.clone(),
                source,
            }),
        },
    }
}
