use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::Role;

const TOKEN_KEY: &str = "auth_token";
const USER_KEY: &str = "user_data.json";

/// User record and role persisted alongside the token; the record stays raw
/// JSON so the store is agnostic to the three profile shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    pub user: serde_json::Value,
    pub role: Role,
}

/// Abstraction over the device's secure storage.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn store_token(&self, token: &str) -> Result<()>;

    async fn load_token(&self) -> Result<Option<String>>;

    async fn store_user(&self, user: &StoredUser) -> Result<()>;

    async fn load_user(&self) -> Result<Option<StoredUser>>;

    /// Removes everything; absent keys are not an error.
    async fn clear_all(&self) -> Result<()>;
}

/// File-backed store, one file per key, owner-readable only on unix.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    async fn write(&self, key: &str, contents: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create session dir {}", self.dir.display()))?;
        let path = self.path(key);
        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        restrict_permissions(&path).await?;
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("failed to remove {}", path.display())),
        }
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, Permissions::from_mode(0o600))
        .await
        .with_context(|| format!("failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn store_token(&self, token: &str) -> Result<()> {
        self.write(TOKEN_KEY, token.as_bytes()).await
    }

    async fn load_token(&self) -> Result<Option<String>> {
        match self.read(TOKEN_KEY).await? {
            Some(bytes) => Ok(Some(
                String::from_utf8(bytes).context("stored token is not valid utf-8")?,
            )),
            None => Ok(None),
        }
    }

    async fn store_user(&self, user: &StoredUser) -> Result<()> {
        let encoded = serde_json::to_vec(user).context("failed to encode stored user")?;
        self.write(USER_KEY, &encoded).await
    }

    async fn load_user(&self) -> Result<Option<StoredUser>> {
        match self.read(USER_KEY).await? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).context("failed to decode stored user")?,
            )),
            None => Ok(None),
        }
    }

    async fn clear_all(&self) -> Result<()> {
        self.remove(TOKEN_KEY).await?;
        self.remove(USER_KEY).await?;
        Ok(())
    }
}
