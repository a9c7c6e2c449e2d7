use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory that keeps a copy of every committed PMTM file.
#[derive(Debug, Clone)]
pub struct Archive {
    dir: PathBuf,
}

impl Archive {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Where `source` lands once archived.
    pub fn destination(&self, source: &Path) -> io::Result<PathBuf> {
        let name = source.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no file name", source.display()),
            )
        })?;
        std::path::absolute(self.dir.join(name))
    }

    /// Copy `source` into the archive, creating the directory if needed.
    pub fn store(&self, source: &Path) -> io::Result<PathBuf> {
        let destination = self.destination(source)?;
        fs::create_dir_all(&self.dir)?;
        fs::copy(source, &destination)?;
        debug!("Archived {} to {}", source.display(), destination.display());
        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_destination_keeps_file_name() {
        let archive = Archive::new("/srv/pmtm");
        assert_eq!(
            archive.destination(Path::new("/tmp/run/chimaera.pmtm")).unwrap(),
            PathBuf::from("/srv/pmtm/chimaera.pmtm")
        );
        assert!(archive.destination(Path::new("/")).is_err());
    }

    #[test]
    fn test_store_creates_directory() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("run.pmtm");
        fs::write(&source, "Performance Modelling Timing File\n").unwrap();

        let archive = Archive::new(dir.path().join("archive").join("nested"));
        let stored = archive.store(&source).unwrap();
        assert_eq!(stored, archive.destination(&source).unwrap());
        assert_eq!(
            fs::read_to_string(stored).unwrap(),
            "Performance Modelling Timing File\n"
        );
    }
}
