use std::path::Path;

use unic_langid::LanguageIdentifier;

/// Validate file path exists and is readable
pub fn validate_file_path(path: &str) -> Result<(), String> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        return Err(format!("File does not exist: {}", path));
    }

    if !path_obj.is_file() {
        return Err(format!("Path is not a file: {}", path));
    }

    Ok(())
}

/// Validate output directory exists or can be created
pub fn validate_output_path(path: &str) -> Result<(), String> {
    let path_obj = Path::new(path);

    if let Some(parent) = path_obj.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Cannot create output directory: {}", e))?;
        }
    }

    Ok(())
}

/// Validate a BCP 47 language code, accepting `pt_BR` style underscores
pub fn validate_language_code(lang: &str) -> Result<(), String> {
    if lang.trim().is_empty() {
        return Err("Language code cannot be empty".to_string());
    }

    lang.replace('_', "-")
        .parse::<LanguageIdentifier>()
        .map(|_| ())
        .map_err(|_| {
            format!(
                "Invalid language code format: {}. Expected valid BCP 47 language identifier",
                lang
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_language_code() {
        assert!(validate_language_code("fr").is_ok());
        assert!(validate_language_code("pt_BR").is_ok());
        assert!(validate_language_code("zh-Hant-TW").is_ok());
        assert!(validate_language_code("").is_err());
        assert!(validate_language_code("not a code").is_err());
    }

    #[test]
    fn test_validate_output_path_creates_parent() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("nested/out/en.json");
        validate_output_path(output.to_str().unwrap()).unwrap();
        assert!(dir.path().join("nested/out").is_dir());
        assert!(validate_output_path("plain.json").is_ok());
    }

    #[test]
    fn test_validate_file_path() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(validate_file_path(dir.path().to_str().unwrap()).is_err());
        assert!(validate_file_path("/definitely/not/here.json").is_err());
    }
}
