//! 플랫폼 어댑터 -- OS별 경로 비교 규칙과 환경변수 조회
//!
//! 경로 동등성 판단, 방문 디렉토리 식별, 환경변수 기반 동작 전환을
//! 전역 상태 대신 [`Platform`] trait으로 주입받습니다.
//!
//! - [`OsPlatform`]: 현재 프로세스의 OS와 환경변수를 사용
//! - [`StaticPlatform`]: 고정된 OS/대소문자 규칙과 메모리 내 환경변수 (테스트, 임베딩용)

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

/// OS 계열
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OsFamily {
    /// Linux
    Linux,
    /// macOS
    MacOs,
    /// Windows
    Windows,
    /// 기타 Unix 계열
    Other,
}

impl OsFamily {
    /// 컴파일 대상 OS를 반환합니다.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }

    /// 기본 파일 시스템이 대소문자를 구분하는지 반환합니다.
    pub fn default_case_sensitive(&self) -> bool {
        !matches!(self, Self::Windows | Self::MacOs)
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::MacOs => write!(f, "macos"),
            Self::Windows => write!(f, "windows"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// 물리 디렉토리 식별자
///
/// 심볼릭 링크 해석 후의 정규 경로를 `/` 구분자로 정규화하고,
/// 대소문자 비구분 플랫폼에서는 소문자로 변환한 값입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathIdentity(String);

impl PathIdentity {
    /// 정규화된 문자열을 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 플랫폼 어댑터 trait
///
/// 호출 간 상태를 유지하지 않는 순수 함수 집합입니다.
/// 대부분의 메서드는 `is_case_sensitive`만 구현하면 기본 구현을 그대로 사용할 수 있습니다.
pub trait Platform: Send + Sync + fmt::Debug {
    /// OS 계열
    fn os_family(&self) -> OsFamily;

    /// 파일 시스템 경로 비교 시 대소문자 구분 여부
    fn is_case_sensitive(&self) -> bool;

    /// 환경변수 조회
    fn env_var(&self, key: &str) -> Option<String>;

    /// 두 경로 문자열을 플랫폼 규칙으로 비교합니다.
    fn compare_paths(&self, a: &str, b: &str) -> Ordering {
        if self.is_case_sensitive() {
            a.cmp(b)
        } else {
            let lhs = a.bytes().map(|b| b.to_ascii_lowercase());
            let rhs = b.bytes().map(|b| b.to_ascii_lowercase());
            lhs.cmp(rhs)
        }
    }

    /// 두 경로 문자열이 플랫폼 규칙상 같은지 확인합니다.
    fn paths_equal(&self, a: &str, b: &str) -> bool {
        self.compare_paths(a, b) == Ordering::Equal
    }

    /// 상대 경로를 OS와 무관한 `/` 구분 문자열로 정규화합니다.
    ///
    /// `.` 컴포넌트는 제거되며, 대소문자는 보존됩니다.
    fn normalize_relative(&self, path: &Path) -> String {
        let mut parts: Vec<String> = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::ParentDir => parts.push("..".to_owned()),
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        // Unix에서는 `\`가 파일명 문자이므로 Windows 계열에서만 분리합니다.
        let joined = parts.join("/");
        if self.os_family() == OsFamily::Windows {
            joined.replace('\\', "/")
        } else {
            joined
        }
    }

    /// 경로의 물리 식별자를 계산합니다 (방문 집합 키).
    fn canonical_identity(&self, path: &Path) -> io::Result<PathIdentity> {
        let canonical = std::fs::canonicalize(path)?;
        let mut text = canonical.to_string_lossy().replace('\\', "/");
        if !self.is_case_sensitive() {
            text = text.to_lowercase();
        }
        Ok(PathIdentity(text))
    }

    /// 환경변수가 참 값(`1`, `true`, `yes`, `on`)으로 설정되어 있는지 확인합니다.
    fn env_flag(&self, key: &str) -> bool {
        self.env_var(key)
            .map(|v| {
                matches!(
                    v.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes" | "on"
                )
            })
            .unwrap_or(false)
    }
}

/// 현재 프로세스 플랫폼
#[derive(Debug, Clone, Copy, Default)]
pub struct OsPlatform;

impl Platform for OsPlatform {
    fn os_family(&self) -> OsFamily {
        OsFamily::current()
    }

    fn is_case_sensitive(&self) -> bool {
        self.os_family().default_case_sensitive()
    }

    fn env_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// 고정 플랫폼
///
/// OS 계열과 대소문자 규칙, 환경변수를 명시적으로 지정합니다.
/// 프로세스 환경변수는 읽지 않습니다.
#[derive(Debug, Clone)]
pub struct StaticPlatform {
    os_family: OsFamily,
    case_sensitive: bool,
    env: HashMap<String, String>,
}

impl StaticPlatform {
    /// OS 계열의 기본 대소문자 규칙으로 생성합니다.
    pub fn new(os_family: OsFamily) -> Self {
        Self {
            os_family,
            case_sensitive: os_family.default_case_sensitive(),
            env: HashMap::new(),
        }
    }

    /// 대소문자 구분 여부를 지정합니다.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// 환경변수를 추가합니다.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl Platform for StaticPlatform {
    fn os_family(&self) -> OsFamily {
        self.os_family
    }

    fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    fn env_var(&self, key: &str) -> Option<String> {
        self.env.get(key).cloned()
    }
}
