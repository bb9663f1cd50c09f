//! 설정 관리 -- sbomkit.toml 파싱 및 런타임 설정
//!
//! [`SbomkitConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`SBOMKIT_FILES_WORKER_COUNT=8` 형식)
//! 2. 설정 파일 (`sbomkit.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), sbomkit_core::error::SbomkitError> {
//! use sbomkit_core::config::SbomkitConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = SbomkitConfig::load("sbomkit.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = SbomkitConfig::parse("[files]\nbase_path = \"/build/drop\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, SbomkitError};

/// 허용되는 해시 알고리즘 이름
pub const KNOWN_ALGORITHMS: [&str; 5] = ["md5", "sha1", "sha256", "sha512", "blake3"];

/// sbomkit 통합 설정
///
/// `sbomkit.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SbomkitConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 파일 인벤토리 설정
    #[serde(default)]
    pub files: FilesConfig,
}

impl SbomkitConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SbomkitError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SbomkitError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SbomkitError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                SbomkitError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, SbomkitError> {
        toml::from_str(toml_str).map_err(|e| {
            SbomkitError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SBOMKIT_{SECTION}_{FIELD}`
    /// 예: `SBOMKIT_FILES_BASE_PATH=/build/drop`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SBOMKIT_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SBOMKIT_GENERAL_LOG_FORMAT");

        // Files
        override_string(&mut self.files.base_path, "SBOMKIT_FILES_BASE_PATH");
        override_string(
            &mut self.files.component_path,
            "SBOMKIT_FILES_COMPONENT_PATH",
        );
        override_csv(&mut self.files.algorithms, "SBOMKIT_FILES_ALGORITHMS");
        override_csv(&mut self.files.include, "SBOMKIT_FILES_INCLUDE");
        override_csv(&mut self.files.exclude, "SBOMKIT_FILES_EXCLUDE");
        override_bool(&mut self.files.follow_links, "SBOMKIT_FILES_FOLLOW_LINKS");
        override_usize(&mut self.files.worker_count, "SBOMKIT_FILES_WORKER_COUNT");
        override_usize(
            &mut self.files.queue_capacity,
            "SBOMKIT_FILES_QUEUE_CAPACITY",
        );
        override_string(
            &mut self.files.duplicate_policy,
            "SBOMKIT_FILES_DUPLICATE_POLICY",
        );
        override_usize(
            &mut self.files.read_buffer_size,
            "SBOMKIT_FILES_READ_BUFFER_SIZE",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 숫자 범위처럼 모듈이 더 엄격하게 검사하는 항목은
    /// 각 모듈 설정의 `validate()`에서 다시 확인합니다.
    pub fn validate(&self) -> Result<(), SbomkitError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.files.base_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "files.base_path".to_owned(),
                reason: "base_path must not be empty".to_owned(),
            }
            .into());
        }

        for algorithm in &self.files.algorithms {
            let normalized = algorithm.trim().to_ascii_lowercase().replace(['-', '_'], "");
            if !KNOWN_ALGORITHMS.contains(&normalized.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "files.algorithms".to_owned(),
                    reason: format!(
                        "unknown algorithm '{algorithm}', expected one of: {}",
                        KNOWN_ALGORITHMS.join(", ")
                    ),
                }
                .into());
            }
        }

        let valid_policies = ["first_wins", "last_wins"];
        if !valid_policies.contains(&self.files.duplicate_policy.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "files.duplicate_policy".to_owned(),
                reason: format!("must be one of: {}", valid_policies.join(", ")),
            }
            .into());
        }

        if self.files.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "files.queue_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 파일 인벤토리 설정
///
/// 문자열 기반의 느슨한 표현입니다. 파일 인벤토리 크레이트가
/// 타입이 있는 설정으로 변환하면서 세부 검증을 수행합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// 컴포넌트 루트 경로 (필수)
    pub base_path: String,
    /// 스캔 범위를 좁히는 하위 경로 (비어 있으면 base_path 전체)
    pub component_path: String,
    /// 계산할 해시 알고리즘 목록
    pub algorithms: Vec<String>,
    /// 포함 glob 패턴 (비어 있으면 모든 파일)
    pub include: Vec<String>,
    /// 제외 glob 패턴
    pub exclude: Vec<String>,
    /// 심볼릭 링크 추적 여부
    pub follow_links: bool,
    /// 해시 워커 수 (0이면 CPU 수 기반 자동)
    pub worker_count: usize,
    /// 작업 큐 용량
    pub queue_capacity: usize,
    /// 중복 알고리즘 처리 정책 (first_wins, last_wins)
    pub duplicate_policy: String,
    /// 파일 읽기 버퍼 크기 (바이트)
    pub read_buffer_size: usize,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            base_path: ".".to_owned(),
            component_path: String::new(),
            algorithms: vec!["sha1".to_owned(), "sha256".to_owned()],
            include: Vec::new(),
            exclude: Vec::new(),
            follow_links: true,
            worker_count: 0,
            queue_capacity: 1024,
            duplicate_policy: "first_wins".to_owned(),
            read_buffer_size: 64 * 1024,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
