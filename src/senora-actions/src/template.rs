//! Form templates.

use std::path::Path;

use senora_slack::View;

use crate::error::{ActionError, ActionResult};

/// An action's modal, as loaded from its definition file.
///
/// The wrapped [`View`] is never mutated; the dialog clones it when it needs
/// to attach a callback id and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FormTemplate {
    name: String,
    view: View,
}

impl FormTemplate {
    /// Build a template from an already-parsed view.
    pub fn new(name: impl Into<String>, view: View) -> Self {
        Self {
            name: name.into(),
            view,
        }
    }

    /// Parse a template document. `path` is only used in error messages.
    pub fn parse(name: impl Into<String>, document: &str, path: &Path) -> ActionResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(document).map_err(|source| ActionError::InvalidJson {
                path: path.to_path_buf(),
                source,
            })?;

        let invalid = |reason: &str| ActionError::InvalidTemplate {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let object = value
            .as_object()
            .ok_or_else(|| invalid("template must be a JSON object"))?;
        if !object.get("title").is_some_and(|t| t.is_object()) {
            return Err(invalid("missing 'title' text object"));
        }
        if !object.get("blocks").is_some_and(|b| b.is_array()) {
            return Err(invalid("missing 'blocks' array"));
        }

        let view: View = serde_json::from_value(value)
            .map_err(|e| invalid(&e.to_string()))?;
        if view.view_type != "modal" {
            return Err(invalid("only 'modal' views can be used as action forms"));
        }

        Ok(Self::new(name, view))
    }

    /// Action name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The modal as defined on disk.
    pub fn view(&self) -> &View {
        &self.view
    }

    /// Modal title.
    pub fn title(&self) -> Option<&str> {
        self.view.title_text()
    }
}
