//! Persistent registry of workspace profiles and the active pointer.
//!
//! # Layout
//!
//! ```text
//! <home>/
//!   accounts/
//!     acme.json      one file per profile (0600 on unix)
//!     beta.json
//!   active           name of the active profile
//! ```
//!
//! # Locking
//!
//! All state sits behind one `tokio::sync::Mutex`. Each mutating operation
//! holds it for the whole read-modify-write, including the file writes, so two
//! concurrent `switch` calls cannot interleave. The lock is never held across a
//! network call; the validator reads a profile, releases the lock, talks to
//! Jira, then re-acquires it in [`WorkspaceStore::mark_validated`].
//!
//! # Pointer consistency
//!
//! The pointer file is written before in-memory state changes, so a failed
//! write leaves both unchanged. A pointer naming a profile that no longer
//! exists is cleared (file deleted) the moment it is noticed.

use crate::atomic::{make_temp_path, write_json_atomic, write_text_atomic};
use crate::error::{Result, StoreError};
use crate::profile::{
    AuthType, NewProfile, ProfileFile, ResolvedWorkspace, WorkspaceProfile, WorkspaceSummary,
    validate_name,
};
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Directory holding one file per profile.
pub const ACCOUNTS_DIR: &str = "accounts";

/// File holding the active profile's name.
pub const ACTIVE_FILE: &str = "active";

/// Result of [`WorkspaceStore::add`].
#[derive(Debug, Clone)]
pub struct AddOutcome {
    /// The stored profile, masked.
    pub workspace: WorkspaceSummary,
    /// Whether the profile became active.
    pub activated: bool,
}

/// Result of [`WorkspaceStore::switch`].
#[derive(Debug, Clone)]
pub struct SwitchOutcome {
    /// The now-active profile, masked.
    pub workspace: WorkspaceSummary,
    /// The profile was already active; nothing was written.
    pub already_active: bool,
}

/// Result of [`WorkspaceStore::remove`].
#[derive(Debug, Clone)]
pub struct RemoveOutcome {
    /// Name of the removed profile.
    pub name: String,
    /// The profile was active and the pointer has been cleared.
    pub was_active: bool,
}

#[derive(Debug, Default)]
struct StoreState {
    /// Ordered by `created`, then name.
    profiles: Vec<WorkspaceProfile>,
    active: Option<String>,
}

impl StoreState {
    fn position(&self, name: &str) -> Option<usize> {
        self.profiles.iter().position(|p| p.name == name)
    }

    fn get(&self, name: &str) -> Option<&WorkspaceProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    fn is_active(&self, name: &str) -> bool {
        self.active.as_deref() == Some(name)
    }

    fn insert(&mut self, profile: WorkspaceProfile) {
        let key = (profile.created, profile.name.as_str());
        let at = self
            .profiles
            .partition_point(|p| (p.created, p.name.as_str()) <= key);
        self.profiles.insert(at, profile);
    }
}

/// Multi-workspace credential store.
#[derive(Debug)]
pub struct WorkspaceStore {
    root: PathBuf,
    state: Mutex<StoreState>,
}

impl WorkspaceStore {
    /// Open the store rooted at `root`, creating the directory layout if needed.
    ///
    /// Unreadable profile files are skipped with a warning. A dangling active
    /// pointer is removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created or listed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join(ACCOUNTS_DIR)).await?;

        let state = load_state(&root).await?;
        info!(
            home = %root.display(),
            workspaces = state.profiles.len(),
            active = state.active.as_deref().unwrap_or("<none>"),
            "Opened workspace store"
        );

        Ok(Self {
            root,
            state: Mutex::new(state),
        })
    }

    /// The store's home directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a profile's file.
    #[must_use]
    pub fn profile_path(&self, name: &str) -> PathBuf {
        profile_path(&self.root, name)
    }

    fn active_path(&self) -> PathBuf {
        self.root.join(ACTIVE_FILE)
    }

    /// Add a profile. The first usable profile becomes active.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidProfile`] if a field fails validation
    /// - [`StoreError::DuplicateName`] if the name is taken; the existing
    ///   profile is left untouched
    /// - I/O errors from writing the file
    pub async fn add(&self, new: NewProfile) -> Result<AddOutcome> {
        let profile = new.into_profile(Utc::now())?;
        let path = self.profile_path(&profile.name);

        let mut state = self.state.lock().await;
        if state.get(&profile.name).is_some() || tokio::fs::try_exists(&path).await? {
            return Err(StoreError::DuplicateName(profile.name));
        }

        let activate = state.active.is_none()
            && !state.profiles.iter().any(WorkspaceProfile::is_complete);

        write_json_atomic(&path, &profile.to_file()).await?;
        let name = profile.name.clone();
        state.insert(profile);
        info!(workspace = %name, "Added workspace");

        if activate {
            write_text_atomic(self.active_path(), &name).await?;
            state.active = Some(name.clone());
            info!(workspace = %name, "Activated first workspace");
        }

        let workspace = state
            .get(&name)
            .map(|p| p.summary(activate))
            .ok_or_else(|| StoreError::NotFound(name.clone()))?;
        Ok(AddOutcome {
            workspace,
            activated: activate,
        })
    }

    /// Masked snapshot of all profiles in insertion order.
    ///
    /// Incomplete profiles are re-read from disk first, like
    /// [`profile`](Self::profile) does.
    pub async fn list(&self) -> Vec<WorkspaceSummary> {
        let mut state = self.state.lock().await;
        self.refresh_incomplete(&mut state).await;
        state
            .profiles
            .iter()
            .map(|p| p.summary(state.is_active(&p.name)))
            .collect()
    }

    /// The active profile, masked.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoActiveWorkspace`] if the pointer is unset or
    /// names a profile that no longer exists.
    pub async fn get_active(&self) -> Result<WorkspaceSummary> {
        let mut state = self.state.lock().await;
        self.refresh_incomplete(&mut state).await;
        let name = self.active_name(&mut state).await?;
        state
            .get(&name)
            .map(|p| p.summary(true))
            .ok_or(StoreError::NoActiveWorkspace)
    }

    /// Make `name` the active profile.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown name; the pointer is
    /// left unchanged.
    pub async fn switch(&self, name: &str) -> Result<SwitchOutcome> {
        let mut state = self.state.lock().await;
        let Some(profile) = state.get(name) else {
            return Err(StoreError::NotFound(name.to_string()));
        };
        let workspace = profile.summary(true);
        if !profile.is_complete() {
            warn!(workspace = %name, "Switching to a workspace with incomplete credentials");
        }

        if state.is_active(name) {
            debug!(workspace = %name, "Workspace already active");
            return Ok(SwitchOutcome {
                workspace,
                already_active: true,
            });
        }

        write_text_atomic(self.active_path(), name).await?;
        state.active = Some(name.to_string());
        info!(workspace = %name, "Switched active workspace");

        Ok(SwitchOutcome {
            workspace,
            already_active: false,
        })
    }

    /// Delete a profile. Removing the active profile clears the pointer; no
    /// other profile is activated in its place.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown name.
    pub async fn remove(&self, name: &str) -> Result<RemoveOutcome> {
        let mut state = self.state.lock().await;
        let Some(index) = state.position(name) else {
            return Err(StoreError::NotFound(name.to_string()));
        };

        remove_if_exists(&self.profile_path(name)).await?;
        state.profiles.remove(index);
        info!(workspace = %name, "Removed workspace");

        let was_active = state.is_active(name);
        if was_active {
            remove_if_exists(&self.active_path()).await?;
            state.active = None;
            info!(workspace = %name, "Cleared active workspace");
        }

        Ok(RemoveOutcome {
            name: name.to_string(),
            was_active,
        })
    }

    /// Write a placeholder profile for the user to complete by hand.
    ///
    /// The skeleton occupies its name but is never activated automatically,
    /// and cannot be validated or used until its placeholders are replaced.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidProfile`] for a bad name
    /// - [`StoreError::DuplicateName`] if the name is taken
    pub async fn create_skeleton(&self, name: &str, auth_type: AuthType) -> Result<PathBuf> {
        validate_name(name)?;
        let path = self.profile_path(name);

        let mut state = self.state.lock().await;
        if state.get(name).is_some() || tokio::fs::try_exists(&path).await? {
            return Err(StoreError::DuplicateName(name.to_string()));
        }

        let file = ProfileFile::skeleton(name, auth_type, Utc::now());
        write_json_atomic(&path, &file).await?;
        state.insert(WorkspaceProfile::from_file(name, file));
        info!(workspace = %name, path = %path.display(), "Created workspace skeleton");

        Ok(path)
    }

    /// The unmasked profile for `name`, or for the active profile when `None`.
    ///
    /// An incomplete profile is re-read from disk first, so edits to a
    /// skeleton take effect without a restart.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NoActiveWorkspace`] if `name` is `None` and nothing is active
    /// - [`StoreError::NotFound`] for an unknown name
    pub async fn profile(&self, name: Option<&str>) -> Result<WorkspaceProfile> {
        let mut state = self.state.lock().await;
        let name = match name {
            Some(name) => name.to_string(),
            None => self.active_name(&mut state).await?,
        };
        let index = state
            .position(&name)
            .ok_or_else(|| StoreError::NotFound(name.clone()))?;

        if !state.profiles[index].is_complete() {
            self.refresh(&mut state, index).await?;
        }

        state
            .get(&name)
            .cloned()
            .ok_or(StoreError::NotFound(name))
    }

    /// Resolve credentials for one operation.
    ///
    /// # Errors
    ///
    /// Everything [`profile`](Self::profile) returns, plus
    /// [`StoreError::IncompleteCredentials`] for a skeleton.
    pub async fn credentials(&self, name: Option<&str>) -> Result<ResolvedWorkspace> {
        let profile = self.profile(name).await?;
        if !profile.is_complete() {
            return Err(StoreError::IncompleteCredentials(profile.name));
        }
        Ok(ResolvedWorkspace::from_profile(&profile))
    }

    /// Record a successful validation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the profile was removed meanwhile.
    pub async fn mark_validated(&self, name: &str, at: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.lock().await;
        let index = state
            .position(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;

        let mut updated = state.profiles[index].clone();
        updated.last_validated = Some(at);
        write_json_atomic(self.profile_path(name), &updated.to_file()).await?;
        state.profiles[index] = updated;
        debug!(workspace = %name, "Recorded successful validation");
        Ok(())
    }

    /// Re-read every profile and the pointer from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the accounts directory cannot be listed.
    pub async fn reload(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = load_state(&self.root).await?;
        info!(workspaces = state.profiles.len(), "Reloaded workspace store");
        Ok(())
    }

    /// Name of the active profile, healing a dangling pointer.
    async fn active_name(&self, state: &mut StoreState) -> Result<String> {
        let name = state.active.clone().ok_or(StoreError::NoActiveWorkspace)?;
        if state.get(&name).is_some() {
            return Ok(name);
        }

        warn!(workspace = %name, "Active workspace no longer exists; clearing pointer");
        remove_if_exists(&self.active_path()).await?;
        state.active = None;
        Err(StoreError::NoActiveWorkspace)
    }

    /// Re-read every incomplete profile. Failures are logged and the cached
    /// copy is kept.
    async fn refresh_incomplete(&self, state: &mut StoreState) {
        let stale: Vec<String> = state
            .profiles
            .iter()
            .filter(|p| !p.is_complete())
            .map(|p| p.name.clone())
            .collect();

        for name in stale {
            let Some(index) = state.position(&name) else {
                continue;
            };
            match self.refresh(state, index).await {
                Ok(()) | Err(StoreError::NotFound(_)) => {}
                Err(e) => warn!(workspace = %name, error = %e, "Could not re-read workspace"),
            }
        }
    }

    /// Replace the in-memory copy of a profile with what is on disk.
    async fn refresh(&self, state: &mut StoreState, index: usize) -> Result<()> {
        let name = state.profiles[index].name.clone();
        let path = self.profile_path(&name);

        match read_profile_file(&path).await {
            Ok(file) => {
                state.profiles[index] = WorkspaceProfile::from_file(&name, file);
                debug!(workspace = %name, "Re-read incomplete workspace from disk");
                Ok(())
            }
            Err(StoreError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                warn!(workspace = %name, "Workspace file disappeared; dropping it");
                state.profiles.remove(index);
                if state.is_active(&name) {
                    remove_if_exists(&self.active_path()).await?;
                    state.active = None;
                }
                Err(StoreError::NotFound(name))
            }
            Err(e) => Err(e),
        }
    }
}

fn profile_path(root: &Path, name: &str) -> PathBuf {
    root.join(ACCOUNTS_DIR).join(format!("{name}.json"))
}

async fn read_profile_file(path: &Path) -> Result<ProfileFile> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&contents)?)
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn load_state(root: &Path) -> Result<StoreState> {
    let mut state = StoreState::default();

    let mut entries = tokio::fs::read_dir(root.join(ACCOUNTS_DIR)).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Err(e) = validate_name(name) {
            warn!(path = %path.display(), error = %e, "Skipping workspace file with invalid name");
            continue;
        }

        match read_profile_file(&path).await {
            Ok(file) => {
                debug!(workspace = %name, "Loaded workspace");
                state.insert(WorkspaceProfile::from_file(name, file));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable workspace file");
            }
        }
    }

    let active_path = root.join(ACTIVE_FILE);
    match tokio::fs::read_to_string(&active_path).await {
        Ok(contents) => {
            let name = contents.trim();
            if name.is_empty() {
                remove_if_exists(&active_path).await?;
            } else if state.get(name).is_some() {
                state.active = Some(name.to_string());
            } else {
                warn!(workspace = %name, "Active workspace not found; clearing pointer");
                remove_if_exists(&active_path).await?;
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    // Leftovers from an interrupted write.
    let stale = make_temp_path(&active_path);
    if tokio::fs::try_exists(&stale).await? {
        remove_if_exists(&stale).await?;
    }

    Ok(state)
}
