//! 디렉토리 탐색기 -- 스캔 루트 아래 파일을 지연 열거
//!
//! [`DirectoryWalker::iter`]는 호출할 때마다 새 방문 집합으로 처음부터 탐색하는
//! [`WalkIter`]를 만듭니다. 탐색 중 실패는 `Err(ErrorInfo)` 항목으로 흘려보내고
//! 형제 엔트리 탐색을 계속합니다.
//!
//! 물리 디렉토리는 [`Platform::canonical_identity`]로 식별하여 스캔당 한 번만 방문합니다.
//! 심볼릭 링크로 같은 디렉토리에 두 경로로 도달하더라도 파일은 한 번만 나옵니다.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::debug;
use walkdir::WalkDir;

use sbomkit_core::platform::{PathIdentity, Platform};

use crate::aggregator::{ErrorInfo, ErrorKind};
use crate::error::FileInventoryError;
use crate::filter::ScanFilter;
use crate::types::FileIdentity;

/// 에러 레코드의 component 값
pub const WALKER_COMPONENT: &str = "directory-walker";

/// 방문한 물리 디렉토리 집합
#[derive(Debug, Default)]
pub struct VisitedDirs {
    inner: Mutex<HashSet<PathIdentity>>,
}

impl VisitedDirs {
    /// 빈 집합을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 처음 방문하는 디렉토리면 `true`를 반환합니다.
    pub fn insert(&self, identity: PathIdentity) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(identity)
    }

    /// 방문한 디렉토리 수
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// 방문 기록이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 탐색 요약
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// 방문한 물리 디렉토리 수
    pub directories_visited: usize,
    /// 내보낸 파일 수
    pub files_yielded: usize,
    /// 취소로 조기 종료했는지
    pub cancelled: bool,
}

/// 디렉토리 탐색기
#[derive(Debug, Clone)]
pub struct DirectoryWalker {
    base: PathBuf,
    root: PathBuf,
    filter: ScanFilter,
    platform: Arc<dyn Platform>,
    follow_links: bool,
}

impl DirectoryWalker {
    /// 탐색기를 생성합니다.
    ///
    /// - `base`: 상대 경로 계산 기준
    /// - `root`: 실제 탐색 시작점 (`base` 자신 또는 그 하위)
    ///
    /// # Errors
    ///
    /// `root`가 없거나 디렉토리가 아니면 `FileInventoryError::RootNotFound`
    pub fn new(
        base: impl Into<PathBuf>,
        root: impl Into<PathBuf>,
        filter: ScanFilter,
        platform: Arc<dyn Platform>,
    ) -> Result<Self, FileInventoryError> {
        let root = root.into();
        let is_dir = std::fs::metadata(&root)
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(FileInventoryError::RootNotFound {
                path: root.display().to_string(),
            });
        }

        Ok(Self {
            base: base.into(),
            root,
            filter,
            platform,
            follow_links: true,
        })
    }

    /// 심볼릭 링크 추적 여부를 설정합니다 (기본 `true`).
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// 탐색 시작점
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 처음부터 탐색하는 새 반복자를 만듭니다.
    ///
    /// 취소 신호는 하위 디렉토리로 내려가기 직전마다 확인합니다.
    pub fn iter(&self, cancel: CancellationToken) -> WalkIter {
        let inner = WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
            .into_iter();

        WalkIter {
            inner,
            base: self.base.clone(),
            filter: self.filter.clone(),
            platform: Arc::clone(&self.platform),
            follow_links: self.follow_links,
            visited: VisitedDirs::new(),
            cancel,
            summary: WalkSummary::default(),
            finished: false,
        }
    }
}

/// 탐색 반복자
///
/// 이어서 재개할 수 없으며, 다시 탐색하려면 [`DirectoryWalker::iter`]를 다시 호출합니다.
pub struct WalkIter {
    inner: walkdir::IntoIter,
    base: PathBuf,
    filter: ScanFilter,
    platform: Arc<dyn Platform>,
    follow_links: bool,
    visited: VisitedDirs,
    cancel: CancellationToken,
    summary: WalkSummary,
    finished: bool,
}

impl WalkIter {
    /// 현재까지의 탐색 요약
    pub fn summary(&self) -> WalkSummary {
        self.summary
    }

    fn relative(&self, path: &Path) -> String {
        match path.strip_prefix(&self.base) {
            Ok(rel) => self.platform.normalize_relative(rel),
            Err(_) => self.platform.normalize_relative(path),
        }
    }

    fn display_path(relative: String) -> String {
        if relative.is_empty() {
            ".".to_owned()
        } else {
            relative
        }
    }

    /// walkdir 에러를 레코드로 변환합니다. 기록할 필요가 없으면 `None`.
    fn classify_error(&self, err: walkdir::Error) -> Option<ErrorInfo> {
        if let Some(ancestor) = err.loop_ancestor() {
            // 조상 디렉토리는 이미 방문 집합에 있습니다.
            debug!(
                path = ?err.path(),
                ancestor = %ancestor.display(),
                "symlink loop detected, skipping"
            );
            return None;
        }

        let cause = match err.io_error() {
            Some(io) => io.to_string(),
            None => err.to_string(),
        };

        let Some(path) = err.path().map(Path::to_path_buf) else {
            return Some(ErrorInfo::new(
                ErrorKind::EntryUnreadable,
                WALKER_COMPONENT,
                cause,
            ));
        };

        let relative = self.relative(&path);
        let is_dir = std::fs::metadata(&path)
            .map(|m| m.is_dir())
            .unwrap_or(false);

        if is_dir {
            if !self.filter.allows_dir(&relative) {
                return None;
            }
            Some(
                ErrorInfo::directory_unreadable(
                    WALKER_COMPONENT,
                    Self::display_path(relative),
                    cause,
                )
                .with_message("directory contents skipped"),
            )
        } else {
            if !self.filter.allows_file(&relative) {
                return None;
            }
            Some(
                ErrorInfo::new(ErrorKind::EntryUnreadable, WALKER_COMPONENT, cause)
                    .with_path(Self::display_path(relative)),
            )
        }
    }
}

impl Iterator for WalkIter {
    type Item = Result<FileIdentity, ErrorInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let entry = match self.inner.next() {
                None => {
                    self.finished = true;
                    return None;
                }
                Some(Ok(entry)) => entry,
                Some(Err(err)) => match self.classify_error(err) {
                    Some(info) => return Some(Err(info)),
                    None => continue,
                },
            };

            let relative = self.relative(entry.path());
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if entry.depth() > 0 && !self.filter.allows_dir(&relative) {
                    debug!(path = %relative, "directory excluded by filter");
                    self.inner.skip_current_dir();
                    continue;
                }

                if self.cancel.is_cancelled() {
                    debug!(path = %relative, "walk cancelled before descending");
                    self.summary.cancelled = true;
                    self.finished = true;
                    return None;
                }

                match self.platform.canonical_identity(entry.path()) {
                    Ok(identity) => {
                        if !self.visited.insert(identity) {
                            debug!(path = %relative, "directory already visited, skipping");
                            self.inner.skip_current_dir();
                            continue;
                        }
                    }
                    Err(e) => {
                        self.inner.skip_current_dir();
                        return Some(Err(ErrorInfo::directory_unreadable(
                            WALKER_COMPONENT,
                            Self::display_path(relative),
                            e,
                        )
                        .with_message("could not resolve directory identity")));
                    }
                }

                self.summary.directories_visited += 1;
                continue;
            }

            if file_type.is_symlink() && !self.follow_links {
                debug!(path = %relative, "symlink not followed");
                continue;
            }

            if !self.filter.allows_file(&relative) {
                continue;
            }

            if !file_type.is_file() {
                return Some(Err(ErrorInfo::new(
                    ErrorKind::UnsupportedFileType,
                    WALKER_COMPONENT,
                    format!("unsupported file type: {file_type:?}"),
                )
                .with_path(relative)));
            }

            self.summary.files_yielded += 1;
            return Some(Ok(FileIdentity::new(entry.into_path(), relative)));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use sbomkit_core::platform::{OsFamily, StaticPlatform};

    use super::*;

    fn platform() -> Arc<dyn Platform> {
        Arc::new(StaticPlatform::new(OsFamily::Linux))
    }

    fn collect(walker: &DirectoryWalker) -> (Vec<String>, Vec<ErrorInfo>) {
        let mut files = Vec::new();
        let mut errors = Vec::new();
        for item in walker.iter(CancellationToken::new()) {
            match item {
                Ok(file) => files.push(file.relative),
                Err(info) => errors.push(info),
            }
        }
        (files, errors)
    }

    #[test]
    fn missing_root_is_root_not_found() {
        let err = DirectoryWalker::new(
            "/nonexistent/sbomkit",
            "/nonexistent/sbomkit",
            ScanFilter::allow_all(),
            platform(),
        )
        .unwrap_err();
        assert!(matches!(err, FileInventoryError::RootNotFound { .. }));
    }

    #[test]
    fn file_root_is_root_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, b"x").unwrap();
        let err =
            DirectoryWalker::new(dir.path(), &file, ScanFilter::allow_all(), platform()).unwrap_err();
        assert!(matches!(err, FileInventoryError::RootNotFound { .. }));
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();
        let walker =
            DirectoryWalker::new(dir.path(), dir.path(), ScanFilter::allow_all(), platform())
                .unwrap();
        let (files, errors) = collect(&walker);
        assert!(files.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn yields_relative_forward_slash_paths_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib/x64")).unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("lib/x64/core.so"), b"c").unwrap();

        let walker =
            DirectoryWalker::new(dir.path(), dir.path(), ScanFilter::allow_all(), platform())
                .unwrap();
        let (files, errors) = collect(&walker);
        assert!(errors.is_empty());
        assert_eq!(files, vec!["a.txt", "b.txt", "lib/x64/core.so"]);
    }

    #[test]
    fn component_root_keeps_base_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("bin")).unwrap();
        fs::write(dir.path().join("outside.txt"), b"o").unwrap();
        fs::write(dir.path().join("bin/app.exe"), b"a").unwrap();

        let walker = DirectoryWalker::new(
            dir.path(),
            dir.path().join("bin"),
            ScanFilter::allow_all(),
            platform(),
        )
        .unwrap();
        let (files, _) = collect(&walker);
        assert_eq!(files, vec!["bin/app.exe"]);
    }

    #[test]
    fn excluded_directory_is_pruned() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("obj/debug")).unwrap();
        fs::write(dir.path().join("obj/debug/tmp.o"), b"o").unwrap();
        fs::write(dir.path().join("keep.txt"), b"k").unwrap();

        let filter = ScanFilter::new(&[], &["**/obj".to_owned()], false).unwrap();
        let walker = DirectoryWalker::new(dir.path(), dir.path(), filter, platform()).unwrap();
        let (files, _) = collect(&walker);
        assert_eq!(files, vec!["keep.txt"]);
    }

    #[test]
    fn iter_is_restartable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        let walker =
            DirectoryWalker::new(dir.path(), dir.path(), ScanFilter::allow_all(), platform())
                .unwrap();
        assert_eq!(collect(&walker).0.len(), 1);
        assert_eq!(collect(&walker).0.len(), 1);
    }

    #[test]
    fn cancelled_walk_stops_before_descending() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/a.txt"), b"a").unwrap();
        let walker =
            DirectoryWalker::new(dir.path(), dir.path(), ScanFilter::allow_all(), platform())
                .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut iter = walker.iter(cancel);
        assert!(iter.next().is_none());
        assert!(iter.summary().cancelled);
        assert!(iter.next().is_none());
    }

    #[test]
    fn visited_dirs_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let platform = StaticPlatform::new(OsFamily::Linux);
        let visited = VisitedDirs::new();
        assert!(visited.insert(platform.canonical_identity(dir.path()).unwrap()));
        assert!(!visited.insert(platform.canonical_identity(dir.path()).unwrap()));
        assert_eq!(visited.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_is_visited_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("real")).unwrap();
        fs::write(dir.path().join("real/data.bin"), b"d").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("alias")).unwrap();

        let walker =
            DirectoryWalker::new(dir.path(), dir.path(), ScanFilter::allow_all(), platform())
                .unwrap();
        let (files, errors) = collect(&walker);
        assert!(errors.is_empty());
        // sort_by_file_name: "alias"가 먼저 방문되고 "real"은 건너뜀
        assert_eq!(files, vec!["alias/data.bin"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loop_terminates() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("a/f.txt"), b"f").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("a/back")).unwrap();

        let walker =
            DirectoryWalker::new(dir.path(), dir.path(), ScanFilter::allow_all(), platform())
                .unwrap();
        let (files, errors) = collect(&walker);
        assert_eq!(files, vec!["a/f.txt"]);
        assert!(errors.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn links_not_followed_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("real")).unwrap();
        fs::write(dir.path().join("real/data.bin"), b"d").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real/data.bin"), dir.path().join("link.bin"))
            .unwrap();

        let walker =
            DirectoryWalker::new(dir.path(), dir.path(), ScanFilter::allow_all(), platform())
                .unwrap()
                .follow_links(false);
        let (files, errors) = collect(&walker);
        assert!(errors.is_empty());
        assert_eq!(files, vec!["real/data.bin"]);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_entry_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("dangling"))
            .unwrap();
        fs::write(dir.path().join("ok.txt"), b"ok").unwrap();

        let walker =
            DirectoryWalker::new(dir.path(), dir.path(), ScanFilter::allow_all(), platform())
                .unwrap();
        let (files, errors) = collect(&walker);
        assert_eq!(files, vec!["ok.txt"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::EntryUnreadable);
        assert_eq!(errors[0].path.as_deref(), Some("dangling"));
    }
}
