use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::{debug, warn};

use crate::errors::CatalogError;
use crate::manifest::MeasureManifest;

const MANIFEST_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Manifests read from a file or directory, together with the entries that
/// could not be read. Rejected entries are keyed by manifest id, or by file
/// path when the whole file was unreadable.
#[derive(Debug, Default)]
pub struct LoadedManifests {
    pub manifests: Vec<MeasureManifest>,
    pub rejected: Vec<(String, CatalogError)>,
}

impl LoadedManifests {
    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    fn reject(&mut self, key: String, err: CatalogError) {
        warn!(target: "catalog", entry = %key, error = %err, "measure manifest skipped");
        self.rejected.push((key, err));
    }
}

/// Reads a manifest file holding either a single manifest or a list of them.
///
/// Fails only when the file cannot be read or is not YAML; a malformed entry
/// is recorded in `rejected` and the other entries are kept.
pub fn load_manifest_file(path: &Path) -> Result<LoadedManifests, CatalogError> {
    let raw = fs::read_to_string(path).map_err(|err| CatalogError::io(path, err))?;
    let document: Value = serde_yaml::from_str(&raw).map_err(|err| CatalogError::parse(path, err))?;
    let entries = match document {
        Value::Null => Vec::new(),
        Value::Sequence(entries) => entries,
        other => vec![other],
    };

    let mut loaded = LoadedManifests::default();
    for entry in entries {
        match manifest_from_value(path, entry) {
            Ok(manifest) => loaded.manifests.push(manifest),
            Err((id, err)) => loaded.reject(id, err),
        }
    }
    Ok(loaded)
}

/// Loads every `.yaml`/`.yml` file below `root`, in path order. Manifests
/// without a group are placed in the group named after their directory
/// relative to `root` (`/` for files directly in it).
///
/// Symbolic links to directories are not followed. Only an unreadable `root`
/// fails the call; any other unreadable file or entry is recorded as
/// rejected.
pub fn load_manifest_dir(root: &Path) -> Result<LoadedManifests, CatalogError> {
    let mut loaded = LoadedManifests::default();
    let mut files = Vec::new();
    let entries = fs::read_dir(root).map_err(|err| CatalogError::io(root, err))?;
    collect_files(root, entries, &mut files, &mut loaded);
    files.sort();

    for file in files {
        let group = directory_group(root, &file);
        let from_file = match load_manifest_file(&file) {
            Ok(from_file) => from_file,
            Err(err) => {
                loaded.reject(file.display().to_string(), err);
                continue;
            }
        };
        debug!(target: "catalog", path = %file.display(), count = from_file.len(), "manifest file loaded");
        loaded.rejected.extend(from_file.rejected);
        loaded
            .manifests
            .extend(from_file.manifests.into_iter().map(|mut manifest| {
                if manifest.group.is_none() {
                    manifest.group = Some(group.clone());
                }
                manifest
            }));
    }
    Ok(loaded)
}

/// Loads a file or a directory, whichever `path` points at.
pub fn load_manifest_path(path: &Path) -> Result<LoadedManifests, CatalogError> {
    if path.is_dir() {
        load_manifest_dir(path)
    } else {
        load_manifest_file(path)
    }
}

fn manifest_from_value(path: &Path, value: Value) -> Result<MeasureManifest, (String, CatalogError)> {
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string());
    serde_yaml::from_value(value)
        .map_err(|err| (id.clone(), CatalogError::configuration(id, format!("{}", err))))
}

fn collect_files(
    dir: &Path,
    entries: fs::ReadDir,
    files: &mut Vec<PathBuf>,
    loaded: &mut LoadedManifests,
) {
    for entry in entries {
        let (path, file_type) = match entry.and_then(|entry| Ok((entry.path(), entry.file_type()?))) {
            Ok(found) => found,
            Err(err) => {
                loaded.reject(dir.display().to_string(), CatalogError::io(dir, err));
                continue;
            }
        };
        if file_type.is_dir() {
            match fs::read_dir(&path) {
                Ok(children) => collect_files(&path, children, files, loaded),
                Err(err) => loaded.reject(path.display().to_string(), CatalogError::io(&path, err)),
            }
        } else if (file_type.is_file() || (file_type.is_symlink() && path.is_file()))
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| MANIFEST_EXTENSIONS.contains(&ext))
        {
            files.push(path);
        }
    }
}

fn directory_group(root: &Path, file: &Path) -> String {
    let relative = file
        .parent()
        .and_then(|parent| parent.strip_prefix(root).ok())
        .map(|parent| {
            parent
                .components()
                .map(|component| component.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default();
    format!("/{}", relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MeasureKind;
    use tempfile::tempdir;

    #[test]
    fn single_and_list_documents() {
        let dir = tempdir().unwrap();
        let single = dir.path().join("height.yaml");
        fs::write(&single, "id: Height\nmeasure:\n  name: height\n").unwrap();
        let list = dir.path().join("more.yaml");
        fs::write(
            &list,
            "- id: Number of Nodes\n  measure:\n    name: number_of_nodes\n- id: Number of Leaves\n  measure:\n    name: number_of_leaves\n",
        )
        .unwrap();

        let loaded = load_manifest_file(&single).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.manifests[0].measure, MeasureKind::Height);
        let loaded = load_manifest_file(&list).unwrap();
        assert!(loaded.rejected.is_empty());
        assert_eq!(
            loaded.manifests.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            ["Number of Nodes", "Number of Leaves"]
        );
    }

    #[test]
    fn directory_layout_provides_groups() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("internal").join("statistics");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("height.yml"), "id: Height\nmeasure:\n  name: height\n").unwrap();
        fs::write(
            dir.path().join("root.yaml"),
            "id: Custom\ngroup: /custom\nmeasure:\n  name: number_of_nodes\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not a manifest").unwrap();

        let loaded = load_manifest_dir(dir.path()).unwrap();
        assert_eq!(loaded.len(), 2);
        let height = loaded.manifests.iter().find(|m| m.id == "Height").unwrap();
        assert_eq!(height.group.as_deref(), Some("/internal/statistics"));
        let custom = loaded.manifests.iter().find(|m| m.id == "Custom").unwrap();
        assert_eq!(custom.group.as_deref(), Some("/custom"));
    }

    #[test]
    fn unknown_measure_is_a_configuration_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "id: Silhouette\nmeasure:\n  name: silhouette\n").unwrap();
        let loaded = load_manifest_file(&path).unwrap();
        assert!(loaded.is_empty());
        let (key, err) = &loaded.rejected[0];
        assert_eq!(key, "Silhouette");
        assert!(
            matches!(err, CatalogError::Configuration { id, .. } if id == "Silhouette"),
            "{err:?}"
        );
    }

    #[test]
    fn syntax_and_io_errors_are_distinguished() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "id: [unterminated\n").unwrap();
        assert!(matches!(
            load_manifest_file(&path),
            Err(CatalogError::Parse { .. })
        ));
        assert!(matches!(
            load_manifest_file(&dir.path().join("missing.yaml")),
            Err(CatalogError::Io { .. })
        ));
    }

    #[test]
    fn bad_list_entry_keeps_its_siblings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mixed.yaml");
        fs::write(
            &path,
            "- id: Height\n  measure:\n    name: height\n- id: Silhouette\n  measure:\n    name: silhouette\n- id: Number of Nodes\n  measure:\n    name: number_of_nodes\n",
        )
        .unwrap();

        let loaded = load_manifest_file(&path).unwrap();
        assert_eq!(
            loaded.manifests.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            ["Height", "Number of Nodes"]
        );
        assert_eq!(loaded.rejected.len(), 1);
        assert_eq!(loaded.rejected[0].0, "Silhouette");
    }

    #[test]
    fn bad_files_do_not_block_the_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a_height.yaml"), "id: Height\nmeasure:\n  name: height\n").unwrap();
        fs::write(
            dir.path().join("b_bad.yaml"),
            "id: Silhouette\nmeasure:\n  name: silhouette\n",
        )
        .unwrap();
        fs::write(dir.path().join("b_broken.yaml"), "id: [unterminated\n").unwrap();
        fs::write(
            dir.path().join("c_nodes.yaml"),
            "id: Number of Nodes\nmeasure:\n  name: number_of_nodes\n",
        )
        .unwrap();

        let loaded = load_manifest_dir(dir.path()).unwrap();
        assert_eq!(
            loaded.manifests.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            ["Height", "Number of Nodes"]
        );
        assert_eq!(loaded.rejected.len(), 2);
        assert!(loaded
            .rejected
            .iter()
            .any(|(_, err)| matches!(err, CatalogError::Configuration { .. })));
        assert!(loaded
            .rejected
            .iter()
            .any(|(_, err)| matches!(err, CatalogError::Parse { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn directory_symlinks_are_not_followed() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("height.yaml"), "id: Height\nmeasure:\n  name: height\n").unwrap();
        std::os::unix::fs::symlink(dir.path(), nested.join("loop")).unwrap();

        let loaded = load_manifest_dir(dir.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.rejected.is_empty());
    }
}
