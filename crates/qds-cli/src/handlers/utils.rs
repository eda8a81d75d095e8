//! Shared utilities for command handlers

use crate::cli::{ListArgs, PayloadArgs};
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Request body from `--data` or `--file`, if either was given
pub fn load_payload(args: &PayloadArgs) -> Result<Option<Map<String, Value>>> {
    let value = match (&args.data, &args.file) {
        (Some(data), _) => serde_json::from_str::<Value>(data)
            .map_err(|e| Error::invalid_args(format!("--data is not valid JSON: {}", e)))?,
        (None, Some(path)) => load_payload_file(path)?,
        (None, None) => return Ok(None),
    };

    match value {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(Error::invalid_args("Request body must be a JSON object")),
    }
}

/// Payload that must be present (create and update)
pub fn require_payload(args: &PayloadArgs) -> Result<Value> {
    load_payload(args)?
        .map(Value::Object)
        .ok_or_else(|| Error::invalid_args("A request body is required (--data or --file)"))
}

/// Parse a JSON or YAML payload file, picking the format by extension
pub fn load_payload_file(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;

    let is_yaml = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false);

    if is_yaml {
        serde_yaml::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "YAML".to_string(),
        })
    } else {
        serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "JSON".to_string(),
        })
    }
}

/// Query parameters for a list call
pub fn list_params(args: &ListArgs) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if let Some(page) = args.page {
        params.push(("page".to_string(), page.to_string()));
    }
    if let Some(per_page) = args.per_page {
        params.push(("per_page".to_string(), per_page.to_string()));
    }
    params
}

/// Overlay `top` onto `base`; keys in `top` win
pub fn merge_over(mut base: Map<String, Value>, top: Map<String, Value>) -> Map<String, Value> {
    base.extend(top);
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_inline_data() {
        let args = PayloadArgs {
            data: Some(r#"{"name": "etl"}"#.to_string()),
            file: None,
        };
        let payload = load_payload(&args).unwrap().unwrap();
        assert_eq!(payload["name"], "etl");
    }

    #[test]
    fn test_no_payload() {
        assert!(load_payload(&PayloadArgs::default()).unwrap().is_none());
        let err = require_payload(&PayloadArgs::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_payload_must_be_object() {
        let args = PayloadArgs {
            data: Some("[1, 2]".to_string()),
            file: None,
        };
        assert!(matches!(load_payload(&args), Err(Error::InvalidArgs(_))));
    }

    #[test]
    fn test_yaml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cluster.yaml");
        fs::write(&path, "label:\n  - etl\nnode_type: m5.xlarge\n").unwrap();

        let args = PayloadArgs {
            data: None,
            file: Some(path),
        };
        let payload = load_payload(&args).unwrap().unwrap();
        assert_eq!(Value::Object(payload), json!({"label": ["etl"], "node_type": "m5.xlarge"}));
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let err = load_payload_file(&PathBuf::from("/nonexistent/body.json")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("body.json");
        fs::write(&path, "{not json").unwrap();
        let err = load_payload_file(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat { .. }));
    }

    #[test]
    fn test_list_params() {
        let args = ListArgs {
            page: Some(2),
            per_page: None,
        };
        assert_eq!(list_params(&args), vec![("page".to_string(), "2".to_string())]);
        assert!(list_params(&ListArgs::default()).is_empty());
    }

    #[test]
    fn test_merge_over() {
        let base = json!({"query": "old", "label": "etl"});
        let top = json!({"query": "new"});
        let merged = merge_over(
            base.as_object().unwrap().clone(),
            top.as_object().unwrap().clone(),
        );
        assert_eq!(Value::Object(merged), json!({"query": "new", "label": "etl"}));
    }
}
