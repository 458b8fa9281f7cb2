//! Action directory scanning.
//!
//! Layout:
//! ```text
//! actions/
//!   deploy/modal.json
//!   restart-service/modal.json
//!   _shared/          (ignored)
//!   .git/             (ignored)
//! ```
//!
//! Each immediate subdirectory is one action named after the directory.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ActionError, ActionResult};
use crate::template::FormTemplate;

/// File holding an action's modal.
pub const TEMPLATE_FILE: &str = "modal.json";

/// Whether a directory entry name can be an action.
pub fn is_action_dir_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.') && !name.starts_with('_')
}

/// Load the template of one action directory.
pub fn load_action_dir(dir: &Path) -> ActionResult<FormTemplate> {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ActionError::InvalidTemplate {
            path: dir.to_path_buf(),
            reason: "directory name is not valid UTF-8".to_string(),
        })?;

    let path = dir.join(TEMPLATE_FILE);
    if !path.is_file() {
        return Err(ActionError::MissingTemplate(path));
    }

    let document = std::fs::read_to_string(&path).map_err(|source| ActionError::Io {
        path: path.clone(),
        source,
    })?;

    FormTemplate::parse(name, &document, &path)
}

/// Scan a directory for actions, in name order.
///
/// Broken actions are logged and skipped. A missing or unreadable root yields
/// no actions rather than an error.
pub fn scan_directory(root: &Path) -> Vec<FormTemplate> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Actions directory {} not readable: {}", root.display(), e);
            return Vec::new();
        }
    };

    let mut dirs: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_action_dir_name)
        })
        .collect();
    dirs.sort();

    let mut templates = Vec::with_capacity(dirs.len());
    for dir in dirs {
        match load_action_dir(&dir) {
            Ok(template) => {
                debug!(action = %template.name(), "Loaded action");
                templates.push(template);
            }
            Err(e) => warn!("Skipping action {}: {}", dir.display(), e),
        }
    }

    templates
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    const VALID: &str = r#"{"type": "modal", "title": {"type": "plain_text", "text": "T"}, "blocks": []}"#;

    fn write_action(root: &Path, name: &str, document: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(TEMPLATE_FILE), document).unwrap();
    }

    #[test]
    fn test_is_action_dir_name() {
        assert!(is_action_dir_name("deploy"));
        assert!(!is_action_dir_name(".git"));
        assert!(!is_action_dir_name("_shared"));
        assert!(!is_action_dir_name(""));
    }

    #[test]
    fn test_scan_skips_hidden_private_and_broken() {
        let temp = TempDir::new().unwrap();
        write_action(temp.path(), "restart", VALID);
        write_action(temp.path(), "deploy", VALID);
        write_action(temp.path(), "_template", VALID);
        write_action(temp.path(), ".hidden", VALID);
        write_action(temp.path(), "broken", "{ not json");
        fs::create_dir_all(temp.path().join("empty")).unwrap();
        fs::write(temp.path().join("README.md"), "not an action").unwrap();

        let names: Vec<_> = scan_directory(temp.path())
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["deploy", "restart"]);
    }

    #[test]
    fn test_scan_missing_root() {
        let temp = TempDir::new().unwrap();
        assert!(scan_directory(&temp.path().join("nope")).is_empty());
    }

    #[test]
    fn test_load_action_dir_errors() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("empty")).unwrap();
        assert!(matches!(
            load_action_dir(&temp.path().join("empty")),
            Err(ActionError::MissingTemplate(_))
        ));

        write_action(temp.path(), "bad", r#"{"title": 1, "blocks": []}"#);
        assert!(matches!(
            load_action_dir(&temp.path().join("bad")),
            Err(ActionError::InvalidTemplate { .. })
        ));
    }
}
