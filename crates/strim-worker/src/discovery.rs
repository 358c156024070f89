//! Audio file discovery and output path resolution.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use strim_models::{AudioFormat, FileTask};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{CollisionPolicy, TrimConfig};
use crate::error::{WorkerError, WorkerResult};

/// Walk the root folder and build one task per supported audio file.
///
/// Tasks are sorted by source path so suffixes assigned by
/// [`CollisionPolicy::Rename`] are stable between runs.
pub fn discover(config: &TrimConfig) -> WorkerResult<Vec<FileTask>> {
    let sources = find_audio_files(
        &config.root_folder,
        config.scan_subdirectories,
        config.output_root(),
    )?;

    debug!(
        root = %config.root_folder.display(),
        count = sources.len(),
        "Discovered audio files"
    );

    Ok(resolve_destinations(
        &config.root_folder,
        sources,
        config.output_root(),
        config.collision_policy,
    ))
}

/// List supported audio files under `root`, skipping the output folder.
pub fn find_audio_files(
    root: &Path,
    recursive: bool,
    output_root: Option<&Path>,
) -> WorkerResult<Vec<PathBuf>> {
    let excluded = excluded_dir(root, output_root);

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| match &excluded {
            Some(dir) if entry.file_type().is_dir() => entry
                .path()
                .canonicalize()
                .map_or(true, |path| &path != dir),
            _ => true,
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(WorkerError::discovery(root, e.to_string()));
            }
            Err(e) => {
                warn!(root = %root.display(), "Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_file() && AudioFormat::from_path(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Output folder to prune from the walk, when it lies strictly inside the root.
fn excluded_dir(root: &Path, output_root: Option<&Path>) -> Option<PathBuf> {
    let output = output_root?.canonicalize().ok()?;
    let root = root.canonicalize().ok()?;
    (output != root && output.starts_with(&root)).then_some(output)
}

/// Assign every source its output path according to `policy`.
///
/// `output_root == None` means sources are replaced in place.
pub fn resolve_destinations(
    root: &Path,
    sources: Vec<PathBuf>,
    output_root: Option<&Path>,
    policy: CollisionPolicy,
) -> Vec<FileTask> {
    let Some(output_root) = output_root else {
        return sources
            .into_iter()
            .map(|source| FileTask::new(source.clone(), source))
            .collect();
    };

    match policy {
        CollisionPolicy::Mirror => sources
            .into_iter()
            .map(|source| {
                let relative = source
                    .strip_prefix(root)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| file_name(&source));
                let destination = output_root.join(relative);
                FileTask::new(source, destination)
            })
            .collect(),
        CollisionPolicy::Rename => {
            let mut taken = HashSet::new();
            sources
                .into_iter()
                .map(|source| {
                    let name = unique_name(&file_name(&source), &mut taken);
                    let destination = output_root.join(name);
                    FileTask::new(source, destination)
                })
                .collect()
        }
        CollisionPolicy::Error => {
            let mut claimed: HashMap<String, PathBuf> = HashMap::new();
            sources
                .into_iter()
                .map(|source| {
                    let name = file_name(&source);
                    let task = FileTask::new(source.clone(), output_root.join(&name));
                    match claimed.get(&collision_key(&name)) {
                        Some(first) => task.with_conflict(format!(
                            "output name {} is already used by {}",
                            name.display(),
                            first.display()
                        )),
                        None => {
                            claimed.insert(collision_key(&name), source);
                            task
                        }
                    }
                })
                .collect()
        }
    }
}

fn file_name(path: &Path) -> PathBuf {
    path.file_name().map(PathBuf::from).unwrap_or_default()
}

/// Names are compared case-insensitively so outputs stay distinct on
/// case-insensitive filesystems.
fn collision_key(name: &Path) -> String {
    name.to_string_lossy().to_lowercase()
}

/// First of `name`, `stem (1).ext`, `stem (2).ext`, ... not yet in `taken`.
fn unique_name(name: &Path, taken: &mut HashSet<String>) -> PathBuf {
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut candidate = name.to_path_buf();
    let mut n = 1;
    while !taken.insert(collision_key(&candidate)) {
        candidate = PathBuf::from(format!("{stem} ({n}){ext}"));
        n += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    fn names(paths: &[PathBuf], root: &Path) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_finds_supported_files_only() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(&root.join("a.mp3"));
        touch(&root.join("B.FLAC"));
        touch(&root.join("notes.txt"));
        touch(&root.join("cover.jpg"));
        touch(&root.join("sub").join("c.wav"));

        let recursive = find_audio_files(root, true, None).unwrap();
        assert_eq!(names(&recursive, root), vec!["B.FLAC", "a.mp3", "sub/c.wav"]);

        let top_level = find_audio_files(root, false, None).unwrap();
        assert_eq!(names(&top_level, root), vec!["B.FLAC", "a.mp3"]);
    }

    #[test]
    fn test_skips_output_folder_inside_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(&root.join("a.ogg"));
        touch(&root.join("trimmed").join("a.ogg"));

        let files = find_audio_files(root, true, Some(&root.join("trimmed"))).unwrap();
        assert_eq!(names(&files, root), vec!["a.ogg"]);
    }

    #[test]
    fn test_output_folder_equal_to_root_is_not_pruned() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(&root.join("a.ogg"));

        let files = find_audio_files(root, true, Some(root)).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = find_audio_files(&dir.path().join("missing"), true, None).unwrap_err();
        assert!(matches!(err, WorkerError::Discovery { .. }));
    }

    #[test]
    fn test_replace_in_place() {
        let root = Path::new("/music");
        let tasks = resolve_destinations(
            root,
            vec![root.join("x/a.mp3")],
            None,
            CollisionPolicy::Mirror,
        );
        assert!(tasks[0].replaces_source());
        assert_eq!(tasks[0].format, Some(AudioFormat::Mp3));
    }

    #[test]
    fn test_mirror_keeps_subdirectories() {
        let root = Path::new("/music");
        let out = Path::new("/out");
        let tasks = resolve_destinations(
            root,
            vec![root.join("x/a.mp3"), root.join("y/a.mp3")],
            Some(out),
            CollisionPolicy::Mirror,
        );
        assert_eq!(tasks[0].destination, out.join("x/a.mp3"));
        assert_eq!(tasks[1].destination, out.join("y/a.mp3"));
        assert!(tasks.iter().all(|t| t.conflict.is_none()));
    }

    #[test]
    fn test_rename_suffixes_duplicates() {
        let root = Path::new("/music");
        let out = Path::new("/out");
        let tasks = resolve_destinations(
            root,
            vec![
                root.join("x/a.mp3"),
                root.join("y/a.mp3"),
                root.join("z/A.mp3"),
                root.join("z/b.wav"),
            ],
            Some(out),
            CollisionPolicy::Rename,
        );
        let destinations: Vec<PathBuf> = tasks.iter().map(|t| t.destination.clone()).collect();
        assert_eq!(
            destinations,
            vec![
                out.join("a.mp3"),
                out.join("a (1).mp3"),
                out.join("A (2).mp3"),
                out.join("b.wav"),
            ]
        );
    }

    #[test]
    fn test_error_policy_marks_later_duplicates() {
        let root = Path::new("/music");
        let out = Path::new("/out");
        let tasks = resolve_destinations(
            root,
            vec![root.join("x/a.mp3"), root.join("y/a.mp3"), root.join("y/b.mp3")],
            Some(out),
            CollisionPolicy::Error,
        );
        assert!(tasks[0].conflict.is_none());
        assert!(tasks[1]
            .conflict
            .as_deref()
            .is_some_and(|c| c.contains("a.mp3")));
        assert!(tasks[2].conflict.is_none());
    }

    #[test]
    fn test_discover_uses_config() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("in");
        touch(&root.join("one.aiff"));
        touch(&root.join("deep").join("two.ape"));

        let config = TrimConfig {
            root_folder: root.clone(),
            destination_folder: Some(dir.path().join("out")),
            scan_subdirectories: true,
            ..Default::default()
        };
        let tasks = discover(&config).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].destination, dir.path().join("out/deep/two.ape"));
        assert_eq!(tasks[1].destination, dir.path().join("out/one.aiff"));
    }
}
