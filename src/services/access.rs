use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{AccessMode, Settings};
use crate::models::UserId;

/// Static allow-list gate. Open mode lets everyone through.
#[derive(Debug, Clone)]
pub struct AccessControl {
    mode: AccessMode,
    allowed: Arc<HashSet<UserId>>,
}

impl AccessControl {
    pub fn new(mode: AccessMode, allowed: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            mode,
            allowed: Arc::new(allowed.into_iter().collect()),
        }
    }

    pub fn open() -> Self {
        Self::new(AccessMode::Public, std::iter::empty())
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.mode, settings.allowed_user_ids.iter().copied())
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn is_allowed(&self, user_id: UserId) -> bool {
        match self.mode {
            AccessMode::Public => true,
            AccessMode::Private => self.allowed.contains(&user_id),
        }
    }
}
