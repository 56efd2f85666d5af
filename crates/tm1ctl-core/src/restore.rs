// ── Backup-set restore ──
//
// Stages a local backup-set as a temporary document in the hidden
// `.backupsets` folder of a database, triggers `tm1s.Restore` on it, and
// deletes the staged document again. Once the document exists, every exit
// path runs the cleanup exactly once; a cleanup failure is logged and
// reported but never replaces the primary outcome.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::DatabaseApi;
use crate::error::CoreError;
use crate::odata::entity_key;

const FOLDER_TYPE: &str = "#ibm.tm1.api.v1.Folder";
const DOCUMENT_TYPE: &str = "#ibm.tm1.api.v1.Document";
const STAGING_FOLDER: &str = ".backupsets";

/// When the `.backupsets` staging folder is (re)created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FolderCheck {
    /// Any failure of the existence check triggers creation.
    #[default]
    CreateOnAnyFailure,
    /// Only a `404` triggers creation; other failures abort.
    CreateOnNotFound,
}

/// Progress of a restore, reported as each step starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStage {
    CheckingStagingFolder,
    EnsuringStagingFolder,
    StagingDocument,
    UploadingContent,
    Restoring,
    CleaningUp,
    Done,
}

impl fmt::Display for RestoreStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CheckingStagingFolder => "checking staging folder",
            Self::EnsuringStagingFolder => "creating staging folder",
            Self::StagingDocument => "staging document",
            Self::UploadingContent => "uploading backup set",
            Self::Restoring => "restoring database",
            Self::CleaningUp => "removing staged document",
            Self::Done => "done",
        })
    }
}

/// Outcome of a successful restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    /// Name the backup-set was staged under.
    pub staged_name: String,
    pub bytes_uploaded: u64,
    /// Set when the staged document could not be removed.
    pub cleanup_warning: Option<String>,
}

/// Restore a database from a local backup-set file.
pub struct Restore<'a> {
    api: &'a DatabaseApi,
    folder_check: FolderCheck,
    progress: Option<Box<dyn FnMut(RestoreStage) + Send + 'a>>,
}

impl<'a> Restore<'a> {
    pub fn new(api: &'a DatabaseApi) -> Self {
        Self {
            api,
            folder_check: FolderCheck::default(),
            progress: None,
        }
    }

    #[must_use]
    pub fn folder_check(mut self, check: FolderCheck) -> Self {
        self.folder_check = check;
        self
    }

    /// Called with each stage as it starts.
    #[must_use]
    pub fn on_progress(mut self, progress: impl FnMut(RestoreStage) + Send + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub async fn run(mut self, backupset: &Path) -> Result<RestoreReport, CoreError> {
        check_local_file(backupset).await?;

        self.ensure_staging_folder().await?;

        let staged_name = staging_name(backupset);
        self.report(RestoreStage::StagingDocument);
        self.api
            .post(
                &format!("{}/Contents", staging_folder()),
                &json!({ "@odata.type": DOCUMENT_TYPE, "Name": staged_name }),
            )
            .await?;
        debug!(name = %staged_name, "staged backup set document");

        // The document exists from here on: no early return until cleanup ran.
        let outcome = self.upload_and_restore(&staged_name, backupset).await;

        self.report(RestoreStage::CleaningUp);
        let cleanup_warning = match self.api.delete(&staged_document(&staged_name)).await {
            Ok(()) => None,
            Err(e) => {
                let message = format!(
                    "temporary backup set '{staged_name}' in '{STAGING_FOLDER}' could not be deleted: {e}"
                );
                warn!("{message}");
                Some(message)
            }
        };

        let bytes_uploaded = outcome?;
        self.report(RestoreStage::Done);
        info!(bytes = bytes_uploaded, "restore completed");

        Ok(RestoreReport {
            staged_name,
            bytes_uploaded,
            cleanup_warning,
        })
    }

    async fn ensure_staging_folder(&mut self) -> Result<(), CoreError> {
        self.report(RestoreStage::CheckingStagingFolder);
        let Err(err) = self.api.get(&staging_folder()).await else {
            return Ok(());
        };

        if self.folder_check == FolderCheck::CreateOnNotFound && !err.is_not_found() {
            return Err(err);
        }
        debug!("staging folder check failed ({err}), creating it");

        self.report(RestoreStage::EnsuringStagingFolder);
        self.api
            .post(
                "Contents('Files')/Contents",
                &json!({ "@odata.type": FOLDER_TYPE, "Name": STAGING_FOLDER }),
            )
            .await?;
        Ok(())
    }

    async fn upload_and_restore(
        &mut self,
        staged_name: &str,
        backupset: &Path,
    ) -> Result<u64, CoreError> {
        self.report(RestoreStage::UploadingContent);
        let content = format!("{}/Content", staged_document(staged_name));
        let bytes = self.api.put_file(&content, backupset).await?;

        self.report(RestoreStage::Restoring);
        self.api
            .post("tm1s.Restore", &json!({ "URL": staged_name }))
            .await?;
        Ok(bytes)
    }

    fn report(&mut self, stage: RestoreStage) {
        if let Some(progress) = self.progress.as_mut() {
            progress(stage);
        }
    }
}

/// `Contents('Files')/Contents('.backupsets')`
fn staging_folder() -> String {
    format!("Contents('Files')/{}", entity_key("Contents", STAGING_FOLDER))
}

/// A document inside the staging folder.
fn staged_document(name: &str) -> String {
    format!("{}/{}", staging_folder(), entity_key("Contents", name))
}

/// `{uuid-v4}-{file name}`
fn staging_name(backupset: &Path) -> String {
    let file_name = backupset
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}-{file_name}", Uuid::new_v4())
}

async fn check_local_file(path: &Path) -> Result<(), CoreError> {
    let local_file = |reason: String| CoreError::LocalFile {
        path: PathBuf::from(path),
        reason,
    };
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| local_file(e.to_string()))?;
    if !meta.is_file() {
        return Err(local_file("not a regular file".into()));
    }
    Ok(())
}
