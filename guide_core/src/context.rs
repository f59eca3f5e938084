//! Process-scoped guide state shared by the services.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::Language;

/// Explicit context handed to each component at construction.
///
/// Cloning shares the same underlying state. The language only changes
/// through [`GuideContext::set_language`].
#[derive(Debug, Clone, Default)]
pub struct GuideContext {
    language: Arc<RwLock<Language>>,
}

impl GuideContext {
    pub fn new(language: Language) -> Self {
        Self {
            language: Arc::new(RwLock::new(language)),
        }
    }

    pub fn language(&self) -> Language {
        *self.language.read()
    }

    pub fn set_language(&self, language: Language) {
        let mut current = self.language.write();
        if *current != language {
            tracing::info!(from = %*current, to = %language, "Display language changed");
            *current = language;
        }
    }
}
