use std::path::Path;

use tracing::info;

use crate::error::InputError;

/// Read a plain-text UTF-8 transcript
pub fn read_transcript(path: &Path) -> Result<String, InputError> {
    let content = std::fs::read_to_string(path).map_err(|source| InputError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        "Loaded transcript {:?} ({} characters)",
        path,
        content.chars().count()
    );
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_transcript() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Doctor: Hello\nPatient: Hi").unwrap();

        let content = read_transcript(file.path()).unwrap();
        assert_eq!(content, "Doctor: Hello\nPatient: Hi");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");

        match read_transcript(&path) {
            Err(InputError::Unreadable { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected Unreadable, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00]).unwrap();

        assert!(matches!(
            read_transcript(file.path()),
            Err(InputError::Unreadable { .. })
        ));
    }
}
