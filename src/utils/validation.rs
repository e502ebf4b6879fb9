use crate::utils::error::{BootError, Result};
use std::path::Path;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(BootError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(BootError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_absolute_path(field_name: &str, path: &str) -> Result<()> {
    validate_path(field_name, path)?;

    if !Path::new(path).is_absolute() {
        return Err(BootError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path must be absolute".to_string(),
        });
    }

    Ok(())
}

/// sshd must never be left on the conventional port 22; the rebind to an
/// unprivileged high port is an invariant of the image, not a preference.
pub fn validate_service_port(field_name: &str, port: u16) -> Result<()> {
    if port == 22 {
        return Err(BootError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: port.to_string(),
            reason: "Port 22 is reserved for the host; use the rebound port".to_string(),
        });
    }

    if port < 1024 {
        return Err(BootError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: port.to_string(),
            reason: "Port must be in the unprivileged range (1024-65535)".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BootError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_empty_list<T>(field_name: &str, values: &[T]) -> Result<()> {
    if values.is_empty() {
        return Err(BootError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: "[]".to_string(),
            reason: "List cannot be empty".to_string(),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| BootError::MissingConfigError {
        field: field_name.to_string(),
    })
}

/// Rejects values that still contain an unresolved `${VAR}` placeholder,
/// which means the expected environment variable was not set at startup.
pub fn validate_resolved_value(field_name: &str, value: &str) -> Result<()> {
    if value.contains("${") {
        return Err(BootError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value contains an unresolved environment variable".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_service_port() {
        assert!(validate_service_port("ssh.port", 2222).is_ok());
        assert!(validate_service_port("ssh.port", 22).is_err());
        assert!(validate_service_port("ssh.port", 80).is_err());
        assert!(validate_service_port("ssh.port", 1024).is_ok());
    }

    #[test]
    fn test_validate_absolute_path() {
        assert!(validate_absolute_path("database.extensions", "/usr/lib/sqlite3/pjson1").is_ok());
        assert!(validate_absolute_path("database.extensions", "sqlite3/pjson1").is_err());
        assert!(validate_absolute_path("database.extensions", "").is_err());
    }

    #[test]
    fn test_validate_path_rejects_null_bytes() {
        assert!(validate_path("app.entrypoint", "/usr/bin/python3").is_ok());
        assert!(validate_path("app.entrypoint", "/usr/bin/\0python3").is_err());
    }

    #[test]
    fn test_validate_resolved_value() {
        assert!(validate_resolved_value("provision.root_password", "hunter2").is_ok());
        assert!(validate_resolved_value("provision.root_password", "${ROOT_PASSWORD}").is_err());
    }

    #[test]
    fn test_validate_non_empty_list() {
        assert!(validate_non_empty_list("database.extensions", &["a"]).is_ok());
        assert!(validate_non_empty_list::<String>("database.extensions", &[]).is_err());
    }
}
