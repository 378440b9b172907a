// フォルダ入力: ディレクトリを再帰走査してフラットなファイル一覧にする

use std::path::Path;
use std::sync::Arc;

use walkdir::WalkDir;

use crate::error::MosaicError;

/// A file handed to the extraction pipeline.
#[derive(Debug, Clone)]
pub struct InputFile {
    /// `/`-separated path relative to the selected folder.
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Last path segment of `name`.
    pub fn base_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Read every regular file below `root`, sorted by relative name.
///
/// No filtering happens here; the extraction pipeline decides which files
/// are documents.
pub fn collect_folder(root: &Path) -> crate::error::Result<Vec<InputFile>> {
    if !root.is_dir() {
        return Err(MosaicError::config(format!(
            "input folder {} does not exist or is not a directory",
            root.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| MosaicError::IoError(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let bytes = std::fs::read(entry.path())?;
        files.push(InputFile::new(name, bytes));
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_folder_recurses_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.docx"), b"b").unwrap();
        std::fs::write(dir.path().join("a.docx"), b"a").unwrap();
        std::fs::write(dir.path().join("sub").join("c.docx"), b"c").unwrap();

        let files = collect_folder(dir.path()).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.docx", "b.docx", "sub/c.docx"]);
        assert_eq!(&*files[2].bytes, b"c");
        assert_eq!(files[2].base_name(), "c.docx");
    }

    #[test]
    fn test_collect_folder_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_folder(&dir.path().join("nope")).is_err());
    }
}
