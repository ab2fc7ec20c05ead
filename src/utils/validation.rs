use crate::utils::error::{EtlError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 門檻必須嚴格遞增，否則箱型判斷會有無法到達的級距
pub fn validate_increasing(field_name: &str, values: &[i64]) -> Result<()> {
    if values.is_empty() {
        return Err(EtlError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    for pair in values.windows(2) {
        if pair[1] <= pair[0] {
            return Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: format!("{:?}", values),
                reason: format!("{} is not greater than {}", pair[1], pair[0]),
            });
        }
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
        return Err(EtlError::InvalidConfigValueError {
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
    fn test_validate_url() {
        assert!(validate_url("locator.seven_url", "https://emap.pcsc.com.tw").is_ok());
        assert!(validate_url("locator.seven_url", "http://127.0.0.1:8080").is_ok());
        assert!(validate_url("locator.seven_url", "").is_err());
        assert!(validate_url("locator.seven_url", "invalid-url").is_err());
        assert!(validate_url("locator.seven_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_increasing() {
        assert!(validate_increasing("packaging.tiers", &[14, 47]).is_ok());
        assert!(validate_increasing("packaging.tiers", &[47, 14]).is_err());
        assert!(validate_increasing("packaging.tiers", &[14, 14]).is_err());
        assert!(validate_increasing("packaging.tiers", &[]).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("order.owner_id", "A442").is_ok());
        assert!(validate_non_empty_string("order.owner_id", "   ").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("locator.timeout_seconds", 10, 1, 120).is_ok());
        assert!(validate_range("locator.timeout_seconds", 0, 1, 120).is_err());
    }
}
