use crate::domain::directory::Directory;
use crate::domain::ports::DirectoryStore;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Directory persisted as a JSON object keyed by username:
///
/// ```json
/// { "alice": { "user_id": 1, "note": "Alice Smith" } }
/// ```
///
/// Nothing is cached; every `load` reads the file again.
pub struct JsonDirectoryStore {
    path: PathBuf,
}

impl JsonDirectoryStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DirectoryStore for JsonDirectoryStore {
    /// A missing file is an empty directory. A malformed file is an error, so a
    /// later save cannot silently wipe it.
    async fn load(&self) -> Result<Directory> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Directory::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Directory::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, directory: &Directory) -> Result<()> {
        let mut bytes = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
        directory.serialize(&mut serializer)?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
