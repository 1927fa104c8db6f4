use crate::domain::model::EndpointAddress;
use crate::utils::error::{ChooserError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_master_uri(field_name: &str, uri: &str) -> Result<()> {
    EndpointAddress::new(uri)
        .to_url()
        .map(|_| ())
        .map_err(|e| match e {
            ChooserError::InvalidAddressError { value, reason } => {
                ChooserError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value,
                    reason,
                }
            }
            other => other,
        })
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ChooserError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ChooserError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ChooserError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ChooserError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_master_uri() {
        assert!(validate_master_uri("master.default_uri", "http://localhost:11311/").is_ok());
        assert!(validate_master_uri("master.default_uri", "https://master.example.com").is_ok());
        assert!(validate_master_uri("master.default_uri", "").is_err());
        assert!(validate_master_uri("master.default_uri", "localhost:11311").is_err());
        assert!(validate_master_uri("master.default_uri", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_master_uri_reports_field() {
        let err = validate_master_uri("master.default_uri", "not a uri").unwrap_err();
        match err {
            ChooserError::InvalidConfigValueError { field, value, .. } => {
                assert_eq!(field, "master.default_uri");
                assert_eq!(value, "not a uri");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("probe.timeout_seconds", 3u64, 1, 60).is_ok());
        assert!(validate_range("probe.timeout_seconds", 0u64, 1, 60).is_err());
        assert!(validate_range("probe.timeout_seconds", 61u64, 1, 60).is_err());
    }

    #[test]
    fn test_validate_path_and_strings() {
        assert!(validate_path("storage.prefs_path", "./prefs.toml").is_ok());
        assert!(validate_path("storage.prefs_path", "").is_err());
        assert!(validate_path("storage.prefs_path", "a\0b").is_err());
        assert!(validate_non_empty_string("master.caller_id", "   ").is_err());
    }
}
