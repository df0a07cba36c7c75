use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{PlatformError, Result};

use super::config_loader::{CONFIG_FILENAME, DEBUG_LOG_FILENAME};
use super::registry::FolderRegistry;
use super::reveal;

/// Reject names that would leave the root, nest, or corrupt the record store.
pub fn validate_name(name: &str) -> Result<()> {
    let bad = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ',' | '"' | '\n' | '\r' | '\0'));
    if bad {
        return Err(PlatformError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Every entry under `path`, deepest first, ending with `path` itself.
/// Symlinks are listed, never followed, `path` included.
pub fn plan_removal(path: &Path) -> Result<Vec<(PathBuf, bool)>> {
    let mut plan = Vec::new();
    for entry in WalkDir::new(path)
        .follow_root_links(false)
        .contents_first(true)
    {
        let entry = entry.map_err(|e| {
            let io = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
            PlatformError::Io(io)
        })?;
        plan.push((entry.path().to_path_buf(), entry.file_type().is_dir()));
    }
    Ok(plan)
}

/// Delete a directory tree in two phases: walk everything first, then
/// remove. A failed walk removes nothing; a failed removal reports what is
/// still on disk. Returns the number of entries removed.
pub async fn remove_tree(path: &Path) -> Result<usize> {
    if !path.is_dir() {
        return Err(PlatformError::FolderNotFound(path.to_path_buf()));
    }
    let plan = plan_removal(path)?;
    remove_planned(path, &plan).await
}

/// Remove the entries of `plan` in order. On the first failure, the entries
/// of the plan still on disk are reported in a `PartialDelete`.
pub async fn remove_planned(path: &Path, plan: &[(PathBuf, bool)]) -> Result<usize> {
    for (index, (entry, is_dir)) in plan.iter().enumerate() {
        let removed = if *is_dir {
            tokio::fs::remove_dir(entry).await
        } else {
            tokio::fs::remove_file(entry).await
        };
        if let Err(source) = removed {
            let remaining: Vec<PathBuf> = plan[index..]
                .iter()
                .map(|(p, _)| p.clone())
                .filter(|p| p.symlink_metadata().is_ok())
                .collect();
            tracing::warn!(
                path = %path.display(),
                failed = %entry.display(),
                remaining = remaining.len(),
                "folder only partially deleted"
            );
            return Err(PlatformError::PartialDelete {
                path: path.to_path_buf(),
                remaining,
                source,
            });
        }
    }
    Ok(plan.len())
}

/// Folders and files under a single root directory, with the folder registry
/// kept alongside.
pub struct FolderManager {
    root: PathBuf,
    registry: FolderRegistry,
    reserved: Vec<String>,
}

impl FolderManager {
    pub fn new(root: PathBuf, registry_file: &str) -> Self {
        let registry = FolderRegistry::new(root.join(registry_file));
        // The store may sit in a subdirectory; its top-level entry is what a
        // folder would clash with.
        let store_entry = Path::new(registry_file)
            .components()
            .next()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .unwrap_or_else(|| registry_file.to_string());
        let reserved = vec![
            store_entry,
            CONFIG_FILENAME.to_string(),
            DEBUG_LOG_FILENAME.to_string(),
        ];
        Self {
            root,
            registry,
            reserved,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &FolderRegistry {
        &self.registry
    }

    pub fn folder_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    fn existing_folder(&self, name: &str) -> Result<PathBuf> {
        let path = self.folder_path(name)?;
        if !path.is_dir() {
            return Err(PlatformError::FolderNotFound(path));
        }
        Ok(path)
    }

    fn file_path(&self, folder: &str, file: &str) -> Result<PathBuf> {
        validate_name(file)?;
        Ok(self.existing_folder(folder)?.join(file))
    }

    /// Registered folders that still exist on disk.
    pub async fn list_folders(&self) -> Result<Vec<String>> {
        self.registry.reconcile(&self.root).await
    }

    /// Names of the directories directly under the root.
    async fn directories(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        Ok(names)
    }

    /// Create `name` under the root and record it. Names of dockyard's own
    /// files are refused, as are names differing from an existing folder
    /// only by case, since both would build the same image.
    pub async fn create_folder(&self, name: &str) -> Result<PathBuf> {
        let path = self.folder_path(name)?;
        if self.reserved.iter().any(|r| r.eq_ignore_ascii_case(name)) {
            return Err(PlatformError::ReservedName(name.to_string()));
        }
        if path.exists() {
            return Err(PlatformError::FolderAlreadyExists(name.to_string()));
        }
        let lowered = name.to_lowercase();
        if let Some(existing) = self
            .directories()
            .await?
            .into_iter()
            .find(|d| d.to_lowercase() == lowered)
        {
            return Err(PlatformError::NameCollision {
                name: name.to_string(),
                existing,
            });
        }
        tokio::fs::create_dir_all(&path).await?;
        // A record can outlive its folder if the folder was removed by hand.
        if !self.registry.contains(name).await? {
            self.registry.save(name).await?;
        }
        tracing::info!(folder = %name, path = %path.display(), "folder created");
        Ok(path)
    }

    /// Delete a folder and everything in it, then forget it. The registry
    /// record survives a partial delete.
    pub async fn delete_folder(&self, name: &str) -> Result<usize> {
        let path = self.existing_folder(name)?;
        let removed = remove_tree(&path).await?;
        self.registry.remove(name).await?;
        tracing::info!(folder = %name, removed, "folder deleted");
        Ok(removed)
    }

    /// Names of the entries directly inside `folder`, sorted.
    pub async fn list_files(&self, folder: &str) -> Result<Vec<String>> {
        let path = self.existing_folder(folder)?;
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&path).await?;
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }

    /// Write `content` to `file` inside `folder`, replacing any existing file.
    pub async fn create_file(&self, folder: &str, file: &str, content: &str) -> Result<PathBuf> {
        let path = self.file_path(folder, file)?;
        tokio::fs::write(&path, content).await?;
        tracing::info!(folder = %folder, file = %file, bytes = content.len(), "file written");
        Ok(path)
    }

    pub async fn read_file(&self, folder: &str, file: &str) -> Result<String> {
        let path = self.file_path(folder, file)?;
        Ok(tokio::fs::read_to_string(&path).await?)
    }

    pub async fn delete_file(&self, folder: &str, file: &str) -> Result<()> {
        let path = self.file_path(folder, file)?;
        tokio::fs::remove_file(&path).await?;
        tracing::info!(folder = %folder, file = %file, "file deleted");
        Ok(())
    }

    pub fn reveal_folder(&self, name: &str) -> Result<()> {
        reveal::reveal(&self.existing_folder(name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_in(dir: &Path) -> FolderManager {
        FolderManager::new(dir.to_path_buf(), "created_folders.csv")
    }

    #[test]
    fn rejects_unsafe_names() {
        for name in ["", " ", ".", "..", "a/b", "a\\b", "a,b", "a\"b", "a\nb"] {
            assert!(validate_name(name).is_err(), "{name:?} should be rejected");
        }
        for name in ["demo", "my-app", "App_2", ".hidden", "app.v1"] {
            assert!(validate_name(name).is_ok(), "{name:?} should be accepted");
        }
    }

    #[tokio::test]
    async fn create_folder_records_it() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path());
        let path = manager.create_folder("demo").await.unwrap();
        assert!(path.is_dir());
        assert_eq!(manager.list_folders().await.unwrap(), vec!["demo"]);
    }

    #[tokio::test]
    async fn second_create_fails_and_records_once() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path());
        manager.create_folder("demo").await.unwrap();
        assert!(matches!(
            manager.create_folder("demo").await,
            Err(PlatformError::FolderAlreadyExists(_))
        ));
        assert_eq!(manager.registry().load().await.unwrap(), vec!["demo"]);
    }

    #[tokio::test]
    async fn stale_record_does_not_block_or_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path());
        manager.registry().save("demo").await.unwrap();

        manager.create_folder("demo").await.unwrap();
        assert_eq!(manager.registry().load().await.unwrap(), vec!["demo"]);
    }

    #[tokio::test]
    async fn invalid_name_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path());
        assert!(matches!(
            manager.create_folder("../escape").await,
            Err(PlatformError::InvalidName(_))
        ));
        assert!(!manager.registry().path().exists());
    }

    #[tokio::test]
    async fn own_file_names_are_reserved() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path());
        for name in ["created_folders.csv", ".dockyard.yaml", ".dockyard-debug.log"] {
            assert!(matches!(
                manager.create_folder(name).await,
                Err(PlatformError::ReservedName(_))
            ));
            assert!(!dir.path().join(name).exists());
        }

        manager.create_folder("demo").await.unwrap();
        assert_eq!(manager.list_folders().await.unwrap(), vec!["demo"]);
    }

    #[tokio::test]
    async fn nested_registry_reserves_its_top_directory() {
        let dir = tempfile::tempdir().unwrap();
        let manager = FolderManager::new(dir.path().to_path_buf(), "state/folders.csv");
        assert!(matches!(
            manager.create_folder("state").await,
            Err(PlatformError::ReservedName(_))
        ));
        manager.create_folder("demo").await.unwrap();
        assert!(dir.path().join("state").join("folders.csv").is_file());
    }

    #[tokio::test]
    async fn names_differing_only_by_case_collide() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path());
        manager.create_folder("Demo").await.unwrap();
        match manager.create_folder("demo").await {
            // Case-insensitive filesystems see the same directory.
            Err(PlatformError::FolderAlreadyExists(_)) => {}
            Err(PlatformError::NameCollision { existing, .. }) => assert_eq!(existing, "Demo"),
            other => panic!("expected a collision, got {other:?}"),
        }
        assert_eq!(manager.registry().load().await.unwrap(), vec!["Demo"]);
    }

    #[tokio::test]
    async fn delete_missing_folder_leaves_registry_alone() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path());
        manager.create_folder("keep").await.unwrap();
        manager.registry().save("ghost").await.unwrap();
        let before = tokio::fs::read_to_string(manager.registry().path())
            .await
            .unwrap();

        assert!(matches!(
            manager.delete_folder("ghost").await,
            Err(PlatformError::FolderNotFound(_))
        ));
        let after = tokio::fs::read_to_string(manager.registry().path())
            .await
            .unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn delete_folder_removes_nested_contents() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path());
        let root = manager.create_folder("demo").await.unwrap();
        std::fs::write(root.join("app.py"), "print('hi')").unwrap();
        std::fs::create_dir(root.join("static")).unwrap();
        std::fs::write(root.join("static").join("style.css"), "body {}").unwrap();

        let removed = manager.delete_folder("demo").await.unwrap();
        assert_eq!(removed, 4);
        assert!(!root.exists());
        assert!(manager.list_folders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_tree_on_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            remove_tree(&dir.path().join("missing")).await,
            Err(PlatformError::FolderNotFound(_))
        ));
    }

    #[test]
    fn plan_lists_contents_before_their_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("demo");
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("sub").join("a.txt"), "a").unwrap();
        std::fs::write(root.join("b.txt"), "b").unwrap();

        let plan = plan_removal(&root).unwrap();
        let position = |p: &Path| plan.iter().position(|(e, _)| e == p).unwrap();
        assert_eq!(plan.len(), 4);
        assert_eq!(plan.last().unwrap().0, root);
        assert!(position(&root.join("sub").join("a.txt")) < position(&root.join("sub")));
        assert!(plan.iter().any(|(e, is_dir)| *e == root.join("sub") && *is_dir));
    }

    #[tokio::test]
    async fn failed_removal_reports_what_remains() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("demo");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("a.txt"), "a").unwrap();
        std::fs::write(root.join("b.txt"), "b").unwrap();

        // The second step targets an entry that is already gone.
        let plan = vec![
            (root.join("a.txt"), false),
            (root.join("ghost.txt"), false),
            (root.join("b.txt"), false),
            (root.clone(), true),
        ];
        match remove_planned(&root, &plan).await {
            Err(PlatformError::PartialDelete {
                path,
                remaining,
                source,
            }) => {
                assert_eq!(path, root);
                assert_eq!(remaining, vec![root.join("b.txt"), root.clone()]);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected a partial delete, got {other:?}"),
        }
        assert!(!root.join("a.txt").exists());
        assert!(root.join("b.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn partial_delete_keeps_the_record() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path());
        let root = manager.create_folder("demo").await.unwrap();
        let locked = root.join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::write(locked.join("a.txt"), "a").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        // Permission bits do not bind root.
        if std::fs::write(locked.join("write-check"), "").is_ok() {
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = manager.delete_folder("demo").await;
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        match result {
            Err(PlatformError::PartialDelete { remaining, .. }) => {
                assert!(remaining.contains(&locked.join("a.txt")));
                assert_eq!(remaining.last(), Some(&root));
            }
            other => panic!("expected a partial delete, got {other:?}"),
        }
        assert!(manager.registry().contains("demo").await.unwrap());
        assert_eq!(manager.list_folders().await.unwrap(), vec!["demo"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_folder_is_removed_as_a_link() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("precious.txt"), "keep").unwrap();

        let root = dir.path().join("root");
        std::fs::create_dir(&root).unwrap();
        let manager = manager_in(&root);
        std::os::unix::fs::symlink(&target, root.join("linked")).unwrap();
        manager.registry().save("linked").await.unwrap();

        let linked = root.join("linked");
        assert_eq!(plan_removal(&linked).unwrap(), vec![(linked.clone(), false)]);

        assert_eq!(manager.delete_folder("linked").await.unwrap(), 1);
        assert!(linked.symlink_metadata().is_err());
        assert_eq!(
            std::fs::read_to_string(target.join("precious.txt")).unwrap(),
            "keep"
        );
        assert!(!manager.registry().contains("linked").await.unwrap());
    }

    #[tokio::test]
    async fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path());
        manager.create_folder("demo").await.unwrap();

        manager
            .create_file("demo", "Dockerfile", "FROM python:3.12\n")
            .await
            .unwrap();
        manager.create_file("demo", "app.py", "").await.unwrap();
        assert_eq!(
            manager.list_files("demo").await.unwrap(),
            vec!["Dockerfile", "app.py"]
        );

        manager
            .create_file("demo", "app.py", "print('edited')")
            .await
            .unwrap();
        assert_eq!(
            manager.read_file("demo", "app.py").await.unwrap(),
            "print('edited')"
        );

        manager.delete_file("demo", "app.py").await.unwrap();
        assert_eq!(manager.list_files("demo").await.unwrap(), vec!["Dockerfile"]);
    }

    #[tokio::test]
    async fn delete_missing_file_reports_cause() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path());
        manager.create_folder("demo").await.unwrap();
        match manager.delete_file("demo", "nope.txt").await {
            Err(PlatformError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn file_ops_need_an_existing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path());
        assert!(matches!(
            manager.create_file("nope", "a.txt", "x").await,
            Err(PlatformError::FolderNotFound(_))
        ));
        assert!(matches!(
            manager.list_files("nope").await,
            Err(PlatformError::FolderNotFound(_))
        ));
    }
}
