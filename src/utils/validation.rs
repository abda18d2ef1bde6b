use crate::utils::error::{CatalogError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(CatalogError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(CatalogError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(CatalogError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(CatalogError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(CatalogError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 欄位名稱不可重複，否則後者會蓋掉前者
pub fn validate_unique_columns(field_name: &str, columns: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for column in columns {
        validate_non_empty_string(field_name, column)?;
        if !seen.insert(column.as_str()) {
            return Err(CatalogError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: column.clone(),
                reason: "Column listed more than once".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("feed.url", "https://docs.google.com/spreadsheets/d/e/x/pub").is_ok());
        assert!(validate_url("feed.url", "http://example.com").is_ok());
        assert!(validate_url("feed.url", "").is_err());
        assert!(validate_url("feed.url", "YOUR_GOOGLE_SHEET_CSV_URL_HERE").is_err());
        assert!(validate_url("feed.url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output", "./site/index.html").is_ok());
        assert!(validate_path("output", "").is_err());
        assert!(validate_path("output", "a\0b").is_err());
    }

    #[test]
    fn test_validate_unique_columns() {
        let cols = vec!["Name".to_string(), "Breed".to_string()];
        assert!(validate_unique_columns("filters.search_columns", &cols).is_ok());

        let dup = vec!["Name".to_string(), "Name".to_string()];
        assert!(validate_unique_columns("filters.search_columns", &dup).is_err());

        let blank = vec![" ".to_string()];
        assert!(validate_unique_columns("filters.search_columns", &blank).is_err());
    }
}
