//! User document persistence.
//!
//! [`JsonFileUserRepository`] keeps one pretty-printed JSON document per user
//! under a directory; [`InMemoryUserRepository`] backs tests and ephemeral runs.
//! Both serialize writers so concurrent file appends and `dateProcessed`
//! stamps for the same user never lose each other's update.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::{
    errors::{Result, UserStoreError},
    model::{KnowledgebaseFile, UserRecord},
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Loads the user document.
    ///
    /// # Errors
    /// [`UserStoreError::NotFound`] if the user has no document yet.
    async fn get(&self, user_id: &str) -> Result<UserRecord>;

    /// Replaces the whole user document.
    async fn put(&self, record: &UserRecord) -> Result<()>;

    /// Appends a file to the user's knowledgebase, creating the document if
    /// needed. A file whose `key` is already registered is rejected.
    async fn append_file(&self, user_id: &str, file: KnowledgebaseFile) -> Result<UserRecord>;

    /// Stamps (or with `None`, clears) `dateProcessed` on one file.
    async fn set_date_processed(
        &self,
        user_id: &str,
        key: &str,
        at: Option<DateTime<Utc>>,
    ) -> Result<()>;

    /// Removes a file record; returns `false` when no file had that key.
    async fn remove_file(&self, user_id: &str, key: &str) -> Result<bool>;
}

/// Rejects ids that could escape the store directory.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    let ok = !user_id.is_empty()
        && user_id != "."
        && user_id != ".."
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));
    if ok {
        Ok(())
    } else {
        Err(UserStoreError::InvalidUserId(user_id.to_string()))
    }
}

fn apply_append(record: &mut UserRecord, file: KnowledgebaseFile) -> Result<()> {
    if record.file(&file.key).is_some() {
        return Err(UserStoreError::DuplicateFile(file.key));
    }
    record.files.knowledgebase.push(file);
    Ok(())
}

fn apply_processed(record: &mut UserRecord, key: &str, at: Option<DateTime<Utc>>) -> Result<()> {
    let file = record
        .file_mut(key)
        .ok_or_else(|| UserStoreError::FileNotFound(key.to_string()))?;
    file.date_processed = at;
    Ok(())
}

fn apply_remove(record: &mut UserRecord, key: &str) -> bool {
    let before = record.files.knowledgebase.len();
    record.files.knowledgebase.retain(|f| f.key != key);
    record.files.knowledgebase.len() != before
}

/* ------------------------------------------------------------------------- */
/* JSON files                                                                */
/* ------------------------------------------------------------------------- */

pub struct JsonFileUserRepository {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileUserRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, user_id: &str) -> Result<PathBuf> {
        validate_user_id(user_id)?;
        Ok(self.dir.join(format!("{user_id}.json")))
    }

    async fn read(&self, user_id: &str) -> Result<Option<UserRecord>> {
        let path = self.path_for(user_id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, record: &UserRecord) -> Result<()> {
        let path = self.path_for(&record.id)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(target: "user_store", user_id = %record.id, path = %path.display(), "user document written");
        Ok(())
    }
}

#[async_trait]
impl UserRepository for JsonFileUserRepository {
    async fn get(&self, user_id: &str) -> Result<UserRecord> {
        self.read(user_id)
            .await?
            .ok_or_else(|| UserStoreError::NotFound(user_id.to_string()))
    }

    async fn put(&self, record: &UserRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(record).await
    }

    async fn append_file(&self, user_id: &str, file: KnowledgebaseFile) -> Result<UserRecord> {
        let _guard = self.write_lock.lock().await;
        let mut record = self
            .read(user_id)
            .await?
            .unwrap_or_else(|| UserRecord::new(user_id));
        let key = file.key.clone();
        apply_append(&mut record, file)?;
        self.write(&record).await?;
        info!(target: "user_store", user_id, key = %key, "file registered");
        Ok(record)
    }

    async fn set_date_processed(
        &self,
        user_id: &str,
        key: &str,
        at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.get(user_id).await?;
        apply_processed(&mut record, key, at)?;
        self.write(&record).await
    }

    async fn remove_file(&self, user_id: &str, key: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let Some(mut record) = self.read(user_id).await? else {
            return Ok(false);
        };
        if !apply_remove(&mut record, key) {
            return Ok(false);
        }
        self.write(&record).await?;
        Ok(true)
    }
}

/* ------------------------------------------------------------------------- */
/* In memory                                                                 */
/* ------------------------------------------------------------------------- */

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(record: UserRecord) -> Self {
        let mut users = HashMap::new();
        users.insert(record.id.clone(), record);
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, user_id: &str) -> Result<UserRecord> {
        self.users
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| UserStoreError::NotFound(user_id.to_string()))
    }

    async fn put(&self, record: &UserRecord) -> Result<()> {
        self.users
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn append_file(&self, user_id: &str, file: KnowledgebaseFile) -> Result<UserRecord> {
        let mut users = self.users.write().await;
        let record = users
            .entry(user_id.to_string())
            .or_insert_with(|| UserRecord::new(user_id));
        apply_append(record, file)?;
        Ok(record.clone())
    }

    async fn set_date_processed(
        &self,
        user_id: &str,
        key: &str,
        at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut users = self.users.write().await;
        let record = users
            .get_mut(user_id)
            .ok_or_else(|| UserStoreError::NotFound(user_id.to_string()))?;
        apply_processed(record, key, at)
    }

    async fn remove_file(&self, user_id: &str, key: &str) -> Result<bool> {
        let mut users = self.users.write().await;
        Ok(users
            .get_mut(user_id)
            .map(|r| apply_remove(r, key))
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_ids_cannot_traverse() {
        assert!(validate_user_id("64f0c1e2ab").is_ok());
        assert!(validate_user_id("jane.doe@example.com").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("..").is_err());
        assert!(validate_user_id("../etc/passwd").is_err());
        assert!(validate_user_id("a/b").is_err());
    }

    #[test]
    fn remove_reports_whether_anything_changed() {
        let mut rec = UserRecord::new("u1");
        assert!(!apply_remove(&mut rec, "missing"));
    }
}
