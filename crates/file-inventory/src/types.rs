//! 도메인 타입 -- 파일 인벤토리 전용 데이터 구조
//!
//! 해시 레코드, 파일 엔트리, 스캔 결과 등 문서 조립 계층에 넘겨지는 타입을 정의합니다.

use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use sbomkit_core::platform::Platform;

use crate::aggregator::{ErrorInfo, ErrorKind};

/// 내장 해시 알고리즘
///
/// 외부 provider는 이 목록에 없는 알고리즘 이름도 [`FileHash::custom`]으로 전달할 수 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD5
    Md5,
    /// SHA-1
    Sha1,
    /// SHA-256
    Sha256,
    /// SHA-512
    Sha512,
    /// BLAKE3 (256-bit)
    Blake3,
}

impl HashAlgorithm {
    /// 알고리즘 어휘 이름을 반환합니다 (소문자).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }

    /// 문자열에서 알고리즘을 파싱합니다 (대소문자, `-`, `_` 구분 없음).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "md5" => Some(Self::Md5),
            "sha1" => Some(Self::Sha1),
            "sha256" => Some(Self::Sha256),
            "sha512" => Some(Self::Sha512),
            "blake3" => Some(Self::Blake3),
            _ => None,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 단일 해시 레코드
///
/// `algorithm`은 검증 없이 그대로 전달됩니다. 어휘 검증은 문서 조립 계층의 몫입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHash {
    /// 알고리즘 이름
    pub algorithm: String,
    /// 16진수 다이제스트
    pub value: String,
}

impl FileHash {
    /// 내장 알고리즘으로 생성합니다.
    pub fn new(algorithm: HashAlgorithm, value: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.as_str().to_owned(),
            value: value.into(),
        }
    }

    /// 임의의 알고리즘 이름으로 생성합니다.
    pub fn custom(algorithm: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            value: value.into(),
        }
    }

    /// 알고리즘 이름이 같은지 확인합니다 (ASCII 대소문자 무시).
    pub fn same_algorithm(&self, algorithm: &str) -> bool {
        self.algorithm.eq_ignore_ascii_case(algorithm)
    }
}

impl fmt::Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.value)
    }
}

/// 탐색된 파일의 식별 정보
///
/// 워커와 provider는 이 값만으로 파일을 연다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    /// 실제 파일 시스템 경로
    pub absolute: PathBuf,
    /// base_path 기준 `/` 구분 상대 경로
    pub relative: String,
}

impl FileIdentity {
    /// 새 식별 정보를 생성합니다.
    pub fn new(absolute: impl Into<PathBuf>, relative: impl Into<String>) -> Self {
        Self {
            absolute: absolute.into(),
            relative: relative.into(),
        }
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative)
    }
}

/// 파일 엔트리
///
/// 탐색된 파일 하나와 그 파일에 대해 계산된 모든 해시입니다.
/// 같은 알고리즘의 해시는 최대 하나만 포함됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// base_path 기준 상대 경로
    pub path: String,
    /// 해시 목록 (provider 등록 순서)
    pub hashes: Vec<FileHash>,
}

impl FileEntry {
    /// 알고리즘 이름으로 해시를 찾습니다.
    pub fn hash(&self, algorithm: &str) -> Option<&FileHash> {
        self.hashes.iter().find(|h| h.same_algorithm(algorithm))
    }

    /// 해당 알고리즘의 해시가 있는지 확인합니다.
    pub fn has_algorithm(&self, algorithm: &str) -> bool {
        self.hash(algorithm).is_some()
    }
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} hashes)", self.path, self.hashes.len())
    }
}

/// 스캔 종료 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    /// 모든 탐색 파일 처리 완료
    Completed,
    /// 외부 취소 신호로 조기 종료
    Cancelled,
}

impl ScanStatus {
    /// 메트릭 레이블용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 스캔 통계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// 워크 큐에 들어간 파일 수
    pub files_discovered: usize,
    /// 엔트리로 완성된 파일 수
    pub files_hashed: usize,
    /// 취소로 처리되지 않은 파일 수
    pub files_abandoned: usize,
    /// 방문한 물리 디렉토리 수
    pub directories_visited: usize,
    /// 기록된 provider 실패 수
    pub provider_failures: usize,
    /// 스캔 소요 시간
    pub duration: Duration,
}

/// 스캔 결과
///
/// `entries`, `errors`, `status` 세 부분으로 "파일 없음", "부분 실패", "취소"를 구분합니다.
/// 스캔 시작 실패(루트 없음)는 이 값 대신 `Err`로 반환됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// 스캔 ID (UUID v4)
    pub scan_id: String,
    /// 종료 상태
    pub status: ScanStatus,
    /// 완성된 파일 엔트리 (순서 보장 없음)
    pub entries: Vec<FileEntry>,
    /// 집계된 파일/디렉토리 단위 에러
    pub errors: Vec<ErrorInfo>,
    /// 통계
    pub stats: ScanStats,
    /// 스캔 시작 시각
    pub started_at: SystemTime,
}

impl ScanReport {
    /// 취소로 종료되었는지 확인합니다.
    pub fn is_cancelled(&self) -> bool {
        self.status == ScanStatus::Cancelled
    }

    /// 기록된 에러가 있는지 확인합니다.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// 특정 종류의 에러만 반환합니다.
    pub fn errors_of_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &ErrorInfo> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    /// 경로로 엔트리를 찾습니다 (플랫폼 규칙 비교).
    pub fn entry(&self, platform: &dyn Platform, path: &str) -> Option<&FileEntry> {
        self.entries
            .iter()
            .find(|e| platform.paths_equal(&e.path, path))
    }

    /// 엔트리를 경로 기준으로 정렬합니다.
    ///
    /// 대소문자만 다른 경로는 원본 문자열로 한 번 더 비교하여 결과가 항상 같도록 합니다.
    pub fn sort_entries(&mut self, platform: &dyn Platform) {
        self.entries.sort_by(|a, b| match platform.compare_paths(&a.path, &b.path) {
            Ordering::Equal => a.path.cmp(&b.path),
            other => other,
        });
    }
}
