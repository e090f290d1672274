// churnflow-core/src/infrastructure/fs.rs

use crate::infrastructure::error::InfrastructureError;
use std::io::Write;
use std::path::Path;

/// Writes `content` to `path` through a temporary sibling file, creating parent directories.
///
/// Readers see either the previous file or the complete new one, never a partial write.
/// Concurrent writers to the same path: the last rename wins.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    // Same directory as the target so the rename never crosses filesystems
    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_ref())?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_missing_parents() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("raw/billing/dt=2024-01-01/billing.csv");

        atomic_write(&file_path, "customer_id\n1\n")?;

        assert_eq!(fs::read_to_string(file_path)?, "customer_id\n1\n");
        Ok(())
    }

    #[test]
    fn test_atomic_write_last_writer_wins() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("billing.csv");

        atomic_write(&file_path, "first")?;
        atomic_write(&file_path, "second")?;

        assert_eq!(fs::read_to_string(&file_path)?, "second");
        // No temp files left behind
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }
}
