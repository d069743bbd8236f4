use parking_lot::RwLock;

/// Identity of the signed-in user, set by the auth layer.
#[derive(Debug, Default)]
pub struct Session {
    user_id: RwLock<Option<String>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: RwLock::new(Some(user_id.into())),
        }
    }

    pub fn set_user_id(&self, user_id: Option<String>) {
        *self.user_id.write() = user_id;
    }

    pub fn user_id(&self) -> Option<String> {
        self.user_id.read().clone()
    }

    /// Ids compare as strings; an anonymous session owns nothing.
    pub fn is_current(&self, user_id: &str) -> bool {
        match self.user_id.read().as_deref() {
            Some(current) => !current.is_empty() && current == user_id,
            None => false,
        }
    }
}
