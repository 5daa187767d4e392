use std::path::Path;

use stash_core::SecretMap;

use super::error::SecretsFileError;

/// Reads a `.env`-style file of `KEY=VALUE` lines.
pub fn load_secrets_file(path: &Path) -> Result<SecretMap, SecretsFileError> {
    if !path.is_file() {
        return Err(SecretsFileError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|source| SecretsFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_secrets_str(&text)
}

/// Blank lines and `#` comments are skipped. Keys and values are trimmed and
/// one pair of matching surrounding quotes is removed. Later keys win.
pub fn parse_secrets_str(text: &str) -> Result<SecretMap, SecretsFileError> {
    let mut secrets = SecretMap::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(SecretsFileError::InvalidLine { line: line_no });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(SecretsFileError::EmptyKey { line: line_no });
        }
        secrets.insert(key, unquote(value.trim()));
    }
    Ok(secrets)
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comments_quotes_and_duplicates() {
        let text = "# creds\n\nAPI_KEY = abc123 \nTOKEN=\"quoted value\"\nSINGLE='x'\nAPI_KEY=override\nURL=http://h/?a=b\n";
        let secrets = parse_secrets_str(text).unwrap();
        assert_eq!(secrets.get("API_KEY"), Some("override"));
        assert_eq!(secrets.get("TOKEN"), Some("quoted value"));
        assert_eq!(secrets.get("SINGLE"), Some("x"));
        assert_eq!(secrets.get("URL"), Some("http://h/?a=b"));
        assert_eq!(secrets.len(), 4);
    }

    #[test]
    fn mismatched_quotes_are_kept() {
        let secrets = parse_secrets_str("K=\"abc'").unwrap();
        assert_eq!(secrets.get("K"), Some("\"abc'"));
    }

    #[test]
    fn reports_line_numbers() {
        let err = parse_secrets_str("A=1\n\nnot a pair\n").unwrap_err();
        assert!(matches!(err, SecretsFileError::InvalidLine { line: 3 }));
        let err = parse_secrets_str("=value").unwrap_err();
        assert!(matches!(err, SecretsFileError::EmptyKey { line: 1 }));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_secrets_file(Path::new("/definitely/not/here.env")).unwrap_err();
        assert!(matches!(err, SecretsFileError::NotFound(_)));
    }
}
