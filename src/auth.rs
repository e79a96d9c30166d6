//! Identity for record attribution. Learning records are only written when
//! someone is signed in; anonymous practice never touches the store.

use std::fs;
use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::event::AppEvent;

pub trait IdentityProvider: Send {
    fn current_user(&self) -> Option<String>;
    fn sign_in(&mut self, user: &str) -> Result<()>;
    fn sign_out(&mut self) -> Result<()>;
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct IdentityFile {
    user: Option<String>,
}

/// File-backed identity that survives restarts. Changes are announced on
/// the app event channel so the session can reload learning state.
pub struct LocalIdentity {
    base_dir: PathBuf,
    current: Option<String>,
    events: mpsc::Sender<AppEvent>,
}

impl LocalIdentity {
    pub fn new(events: mpsc::Sender<AppEvent>) -> Result<Self> {
        let base_dir = dirs::data_dir()
            .context("could not determine data directory")?
            .join("hantype");
        Self::with_base_dir(base_dir, events)
    }

    pub fn with_base_dir(base_dir: PathBuf, events: mpsc::Sender<AppEvent>) -> Result<Self> {
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("could not create {}", base_dir.display()))?;
        let current = match fs::read_to_string(base_dir.join("identity.json")) {
            Ok(contents) => serde_json::from_str::<IdentityFile>(&contents)
                .unwrap_or_default()
                .user,
            Err(_) => None,
        };
        Ok(Self {
            base_dir,
            current,
            events,
        })
    }

    fn persist(&self) -> Result<()> {
        let path = self.base_dir.join("identity.json");
        let tmp = path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(&IdentityFile {
            user: self.current.clone(),
        })?;
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn announce(&self) {
        let _ = self
            .events
            .send(AppEvent::IdentityChanged(self.current.clone()));
    }
}

impl IdentityProvider for LocalIdentity {
    fn current_user(&self) -> Option<String> {
        self.current.clone()
    }

    fn sign_in(&mut self, user: &str) -> Result<()> {
        let trimmed = user.trim();
        anyhow::ensure!(!trimmed.is_empty(), "user name must not be empty");
        self.current = Some(trimmed.to_string());
        self.persist()?;
        self.announce();
        Ok(())
    }

    fn sign_out(&mut self) -> Result<()> {
        if self.current.is_none() {
            return Ok(());
        }
        self.current = None;
        self.persist()?;
        self.announce();
        Ok(())
    }
}
