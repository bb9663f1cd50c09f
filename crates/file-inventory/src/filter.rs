//! include/exclude 필터
//!
//! glob 패턴은 base_path 기준 `/` 구분 상대 경로에 매칭됩니다.
//! `*`는 경로 구분자를 넘지 않으며, 여러 단계는 `**`로 표현합니다.
//!
//! - include: 파일에만 적용. 비어 있으면 모든 파일 포함.
//! - exclude: 파일과 디렉토리 모두에 적용. 디렉토리가 일치하면 하위 트리 전체를 건너뜁니다.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use sbomkit_core::platform::Platform;

use crate::error::FileInventoryError;

/// 컴파일된 include/exclude 필터
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl ScanFilter {
    /// 모든 경로를 허용하는 필터
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// 패턴 목록으로 필터를 생성합니다.
    ///
    /// # Errors
    ///
    /// 잘못된 glob 패턴이 있으면 `FileInventoryError::Config` 반환
    pub fn new(
        include: &[String],
        exclude: &[String],
        case_insensitive: bool,
    ) -> Result<Self, FileInventoryError> {
        Ok(Self {
            include: compile("include", include, case_insensitive)?,
            exclude: compile("exclude", exclude, case_insensitive)?,
        })
    }

    /// 플랫폼의 대소문자 규칙으로 필터를 생성합니다.
    pub fn for_platform(
        include: &[String],
        exclude: &[String],
        platform: &dyn Platform,
    ) -> Result<Self, FileInventoryError> {
        Self::new(include, exclude, !platform.is_case_sensitive())
    }

    /// 디렉토리로 내려갈지 판단합니다. 루트(`""`)는 항상 허용됩니다.
    pub fn allows_dir(&self, relative: &str) -> bool {
        if relative.is_empty() {
            return true;
        }
        !self.is_excluded(relative)
    }

    /// 파일을 인벤토리에 포함할지 판단합니다.
    pub fn allows_file(&self, relative: &str) -> bool {
        if self.is_excluded(relative) {
            return false;
        }
        match &self.include {
            Some(set) => set.is_match(relative),
            None => true,
        }
    }

    fn is_excluded(&self, relative: &str) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|set| set.is_match(relative))
    }
}

fn compile(
    field: &str,
    patterns: &[String],
    case_insensitive: bool,
) -> Result<Option<GlobSet>, FileInventoryError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .literal_separator(true)
            .build()
            .map_err(|e| FileInventoryError::Config {
                field: field.to_owned(),
                reason: format!("invalid glob '{pattern}': {e}"),
            })?;
        builder.add(glob);
    }

    let set = builder.build().map_err(|e| FileInventoryError::Config {
        field: field.to_owned(),
        reason: e.to_string(),
    })?;
    Ok(Some(set))
}
