//! 파일 인벤토리 설정
//!
//! [`FileInventoryConfig`]는 core의 [`FilesConfig`](sbomkit_core::config::FilesConfig)를
//! 타입이 지정된 값으로 변환하고 파이프라인 고유 상한을 검증합니다.
//! [`ScanConfiguration`]은 스캔 한 번에 필요한 루트 경로와 provider 레지스트리를 묶습니다.
//!
//! # 사용 예시
//!
//! ```
//! use sbomkit_file_inventory::{FileInventoryConfig, FileInventoryConfigBuilder, HashAlgorithm};
//!
//! // 기본값으로 생성
//! let config = FileInventoryConfig::default();
//! config.validate().unwrap();
//!
//! // 빌더로 생성
//! let config = FileInventoryConfigBuilder::new()
//!     .base_path("/srv/drop")
//!     .algorithms(vec![HashAlgorithm::Sha256])
//!     .worker_count(4)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.worker_count, 4);
//! ```

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use sbomkit_core::platform::Platform;

use crate::error::FileInventoryError;
use crate::provider::{DEFAULT_READ_BUFFER_SIZE, DigestProvider};
use crate::registry::{DuplicatePolicy, IntegrityProviderRegistry};
use crate::types::HashAlgorithm;

/// 설정 상한값 상수
const MAX_WORKER_COUNT: usize = 256;
const MAX_DEFAULT_WORKERS: usize = 64;
const MAX_QUEUE_CAPACITY: usize = 65_536;
const MIN_READ_BUFFER_SIZE: usize = 4 * 1024; // 4 KiB
const MAX_READ_BUFFER_SIZE: usize = 16 * 1024 * 1024; // 16 MiB

/// 기본 워커 수: 가용 병렬성을 1..=64로 제한한 값
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_DEFAULT_WORKERS)
}

/// 파일 인벤토리 설정
///
/// # 필드
///
/// - **base_path**: 상대 경로 계산 기준이 되는 루트
/// - **component_path**: 탐색 범위를 좁히는 base_path 하위 경로
/// - **algorithms**: 내장 다이제스트 provider로 계산할 알고리즘
/// - **include / exclude**: glob 필터
/// - **worker_count**: 동시 해시 계산 수
/// - **queue_capacity**: 워크 큐 용량
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInventoryConfig {
    /// 스캔 기준 경로
    pub base_path: String,
    /// base_path 기준 하위 경로 (없으면 base_path 전체)
    pub component_path: Option<String>,
    /// 계산할 알고리즘 (비어 있으면 해시 없는 엔트리)
    pub algorithms: Vec<HashAlgorithm>,
    /// 포함 glob (파일에만 적용)
    pub include: Vec<String>,
    /// 제외 glob (파일, 디렉토리)
    pub exclude: Vec<String>,
    /// 심볼릭 링크 추적 여부
    pub follow_links: bool,
    /// 워커 수
    pub worker_count: usize,
    /// 워크 큐 용량
    pub queue_capacity: usize,
    /// 중복 알고리즘 처리 규칙
    pub duplicate_policy: DuplicatePolicy,
    /// provider 읽기 버퍼 크기 (바이트)
    pub read_buffer_size: usize,
}

impl Default for FileInventoryConfig {
    fn default() -> Self {
        Self {
            base_path: ".".to_owned(),
            component_path: None,
            algorithms: vec![HashAlgorithm::Sha1, HashAlgorithm::Sha256],
            include: Vec::new(),
            exclude: Vec::new(),
            follow_links: true,
            worker_count: default_worker_count(),
            queue_capacity: 1024,
            duplicate_policy: DuplicatePolicy::FirstRegisteredWins,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl FileInventoryConfig {
    /// core의 `FilesConfig`에서 설정을 생성합니다.
    ///
    /// - `worker_count` 0은 기본 워커 수로 대체됩니다.
    /// - 빈 `component_path`는 없음으로 취급됩니다.
    /// - 알 수 없는 알고리즘 이름과 정책은 무시되고 기본값이 쓰입니다 (core 검증에서 거부됨).
    pub fn from_core(core: &sbomkit_core::config::FilesConfig) -> Self {
        let algorithms = core
            .algorithms
            .iter()
            .filter_map(|a| HashAlgorithm::from_str_loose(a))
            .collect();
        let component_path = Some(core.component_path.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_owned);
        let worker_count = if core.worker_count == 0 {
            default_worker_count()
        } else {
            core.worker_count
        };
        let duplicate_policy =
            DuplicatePolicy::from_str_loose(&core.duplicate_policy).unwrap_or_default();

        Self {
            base_path: core.base_path.clone(),
            component_path,
            algorithms,
            include: core.include.clone(),
            exclude: core.exclude.clone(),
            follow_links: core.follow_links,
            worker_count,
            queue_capacity: core.queue_capacity,
            duplicate_policy,
            read_buffer_size: core.read_buffer_size,
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `base_path`: 비어있으면 안 됨
    /// - `component_path`: 상대 경로, `..` 불가
    /// - `worker_count`: 1-256
    /// - `queue_capacity`: 1-65536
    /// - `read_buffer_size`: 4 KiB-16 MiB
    pub fn validate(&self) -> Result<(), FileInventoryError> {
        if self.base_path.trim().is_empty() {
            return Err(FileInventoryError::Config {
                field: "base_path".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if let Some(component) = &self.component_path {
            validate_component_path(component)?;
        }

        if self.worker_count == 0 || self.worker_count > MAX_WORKER_COUNT {
            return Err(FileInventoryError::Config {
                field: "worker_count".to_owned(),
                reason: format!("must be 1-{MAX_WORKER_COUNT}"),
            });
        }

        if self.queue_capacity == 0 || self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(FileInventoryError::Config {
                field: "queue_capacity".to_owned(),
                reason: format!("must be 1-{MAX_QUEUE_CAPACITY}"),
            });
        }

        if !(MIN_READ_BUFFER_SIZE..=MAX_READ_BUFFER_SIZE).contains(&self.read_buffer_size) {
            return Err(FileInventoryError::Config {
                field: "read_buffer_size".to_owned(),
                reason: format!("must be {MIN_READ_BUFFER_SIZE}-{MAX_READ_BUFFER_SIZE}"),
            });
        }

        Ok(())
    }
}

fn validate_component_path(component: &str) -> Result<(), FileInventoryError> {
    let path = Path::new(component);
    if path.is_absolute() || path.has_root() {
        return Err(FileInventoryError::Config {
            field: "component_path".to_owned(),
            reason: format!("'{component}' must be relative to base_path"),
        });
    }
    if path.components().any(|c| c == Component::ParentDir) {
        return Err(FileInventoryError::Config {
            field: "component_path".to_owned(),
            reason: format!("'{component}' contains path traversal pattern '..'"),
        });
    }
    Ok(())
}

/// 파일 인벤토리 설정 빌더
#[derive(Debug, Default)]
pub struct FileInventoryConfigBuilder {
    config: FileInventoryConfig,
}

impl FileInventoryConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 기준 경로를 설정합니다.
    pub fn base_path(mut self, path: impl Into<String>) -> Self {
        self.config.base_path = path.into();
        self
    }

    /// 하위 컴포넌트 경로를 설정합니다.
    pub fn component_path(mut self, path: impl Into<String>) -> Self {
        self.config.component_path = Some(path.into());
        self
    }

    /// 알고리즘 목록을 설정합니다.
    pub fn algorithms(mut self, algorithms: Vec<HashAlgorithm>) -> Self {
        self.config.algorithms = algorithms;
        self
    }

    /// include 패턴을 설정합니다.
    pub fn include(mut self, patterns: Vec<String>) -> Self {
        self.config.include = patterns;
        self
    }

    /// exclude 패턴을 설정합니다.
    pub fn exclude(mut self, patterns: Vec<String>) -> Self {
        self.config.exclude = patterns;
        self
    }

    /// 심볼릭 링크 추적 여부를 설정합니다.
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.config.follow_links = follow;
        self
    }

    /// 워커 수를 설정합니다.
    pub fn worker_count(mut self, count: usize) -> Self {
        self.config.worker_count = count;
        self
    }

    /// 워크 큐 용량을 설정합니다.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// 중복 알고리즘 처리 규칙을 설정합니다.
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.config.duplicate_policy = policy;
        self
    }

    /// 읽기 버퍼 크기를 설정합니다.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `FileInventoryError::Config` 반환
    pub fn build(self) -> Result<FileInventoryConfig, FileInventoryError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// 스캔 한 번의 입력
///
/// `registry`는 스캔 중 변경되지 않습니다.
#[derive(Debug, Clone)]
pub struct ScanConfiguration {
    /// 상대 경로 기준
    pub base_path: PathBuf,
    /// 탐색 범위를 좁히는 하위 경로
    pub component_path: Option<String>,
    /// provider 레지스트리
    pub registry: Arc<IntegrityProviderRegistry>,
}

impl ScanConfiguration {
    /// 기준 경로와 레지스트리로 생성합니다.
    pub fn new(base_path: impl Into<PathBuf>, registry: IntegrityProviderRegistry) -> Self {
        Self {
            base_path: base_path.into(),
            component_path: None,
            registry: Arc::new(registry),
        }
    }

    /// 하위 컴포넌트 경로를 지정합니다.
    pub fn with_component_path(mut self, component_path: impl Into<String>) -> Self {
        self.component_path = Some(component_path.into());
        self
    }

    /// 하위 컴포넌트 경로를 검증합니다.
    ///
    /// # Errors
    ///
    /// 절대 경로이거나 `..`를 포함하면 `FileInventoryError::Config`
    pub fn validate(&self) -> Result<(), FileInventoryError> {
        match self.component_path.as_deref().map(str::trim) {
            Some(component) if !component.is_empty() => validate_component_path(component),
            _ => Ok(()),
        }
    }

    /// 실제 탐색 시작점
    pub fn scan_root(&self) -> PathBuf {
        match self.component_path.as_deref().map(str::trim) {
            Some(component) if !component.is_empty() => self.base_path.join(component),
            _ => self.base_path.clone(),
        }
    }

    /// 설정에서 스캔 입력을 만듭니다.
    ///
    /// 알고리즘마다 기본 비활성화 환경변수를 가진 [`DigestProvider`]를 하나씩 등록한 뒤
    /// 현재 환경에서 활성화된 provider만 남깁니다.
    pub fn from_config(config: &FileInventoryConfig, platform: &dyn Platform) -> Self {
        let mut registry = IntegrityProviderRegistry::new(config.duplicate_policy);
        for algorithm in &config.algorithms {
            registry.register(Arc::new(
                DigestProvider::single(*algorithm).with_buffer_size(config.read_buffer_size),
            ));
        }

        Self {
            base_path: PathBuf::from(&config.base_path),
            component_path: config.component_path.clone(),
            registry: Arc::new(registry.select_enabled(platform)),
        }
    }
}
