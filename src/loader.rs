//! CSDL document loading.
//!
//! Reads the JSON form of CSDL produced by the parser into
//! [`CsdlDocument`] values and assembles them into an [`EdmModel`].

use std::path::Path;

use tracing::debug;

use crate::csdl::CsdlDocument;
use crate::error::LoadError;
use crate::model::EdmModel;

/// Load a CSDL document from a file path.
///
/// The document's `source` is set to the path so source locations name it.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't a CSDL document.
pub fn load_document(path: &Path) -> Result<CsdlDocument, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    let mut doc = load_document_str(&content)?;
    doc.source = Some(path.display().to_string());
    debug!(path = %path.display(), schemas = doc.schemas.len(), "loaded document");
    Ok(doc)
}

/// Load a CSDL document from a JSON string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't a CSDL document.
pub fn load_document_str(content: &str) -> Result<CsdlDocument, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load every file and build one model from them, in order.
///
/// # Errors
///
/// Returns the first `LoadError` encountered.
pub fn load_model<P: AsRef<Path>>(paths: &[P]) -> Result<EdmModel, LoadError> {
    let docs = paths
        .iter()
        .map(|p| load_document(p.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(EdmModel::from_documents(&docs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PEOPLE: &str = r#"{"Schemas": [{"Namespace": "NS", "EntityTypes": [{"Name": "Person"}]}]}"#;

    #[test]
    fn load_document_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", PEOPLE).unwrap();

        let doc = load_document(file.path()).unwrap();
        assert_eq!(doc.schemas[0].namespace, "NS");
        assert_eq!(doc.source.as_deref(), Some(file.path().display().to_string().as_str()));
    }

    #[test]
    fn load_document_file_not_found() {
        let result = load_document(Path::new("/nonexistent/model.json"));
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }

    #[test]
    fn load_document_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();

        let result = load_document(file.path());
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn load_document_str_rejects_wrong_shape() {
        let result = load_document_str(r#"{"Schemas": [{"EntityTypes": []}]}"#);
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn load_model_merges_files() {
        let mut first = NamedTempFile::new().unwrap();
        writeln!(first, "{}", PEOPLE).unwrap();
        let mut second = NamedTempFile::new().unwrap();
        writeln!(
            second,
            r#"{{"Schemas": [{{"Namespace": "Other", "ComplexTypes": [{{"Name": "Address"}}]}}]}}"#
        )
        .unwrap();

        let model = load_model(&[first.path(), second.path()]).unwrap();
        assert!(model.find_type("NS.Person").is_found());
        assert!(model.find_type("Other.Address").is_found());
    }
}
