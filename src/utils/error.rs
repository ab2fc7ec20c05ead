use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Store locator request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Input does not match the {platform} layout, missing columns: {}", missing.join(", "))]
    SchemaMismatch {
        platform: String,
        missing: Vec<String>,
    },

    #[error("Could not identify the platform from columns: {}", columns.join(", "))]
    UnknownPlatform { columns: Vec<String> },

    #[error("Order {order_id}: product '{product_code}' is not in the catalog")]
    ProductNotFound {
        order_id: String,
        product_code: String,
    },

    #[error("Order {order_id}: quantity '{value}' is not a number")]
    InvalidQuantity { order_id: String, value: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Input,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::CsvError(_)
            | EtlError::SchemaMismatch { .. }
            | EtlError::UnknownPlatform { .. } => ErrorCategory::Input,
            EtlError::ProductNotFound { .. }
            | EtlError::InvalidQuantity { .. }
            | EtlError::ProcessingError { .. }
            | EtlError::ValidationError { .. } => ErrorCategory::Data,
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(_) | EtlError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Data | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::SchemaMismatch { platform, missing } => {
                format!("檔案欄位與 {} 格式不符，缺少: {}", platform, missing.join(", "))
            }
            EtlError::UnknownPlatform { .. } => "無法判斷訂單檔案所屬平台".to_string(),
            EtlError::ProductNotFound {
                order_id,
                product_code,
            } => format!("訂單 {} 的商品 {} 不在商品設定中", order_id, product_code),
            EtlError::InvalidQuantity { order_id, value } => {
                format!("訂單 {} 的數量 '{}' 不是數字", order_id, value)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network connectivity or rerun with --offline",
            ErrorCategory::Input => "Make sure the export comes from a supported platform and was not edited",
            ErrorCategory::Data => "Fix the product catalog or the offending order rows and rerun",
            ErrorCategory::Configuration => "Review the TOML configuration and command-line flags",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

impl From<toml::de::Error> for EtlError {
    fn from(e: toml::de::Error) -> Self {
        EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_errors_are_high_severity() {
        let err = EtlError::ProductNotFound {
            order_id: "S1".to_string(),
            product_code: "X".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("S1"));
    }

    #[test]
    fn test_schema_mismatch_lists_columns() {
        let err = EtlError::SchemaMismatch {
            platform: "shopline".to_string(),
            missing: vec!["訂單號碼".to_string(), "數量".to_string()],
        };
        assert!(err.to_string().contains("訂單號碼, 數量"));
        assert_eq!(err.category(), ErrorCategory::Input);
    }
}
