//! 무결성 provider -- 파일 하나에 대한 해시 계산 인터페이스
//!
//! [`IntegrityProvider`] trait은 레지스트리에 등록되는 해시 계산기가 구현해야 하는 인터페이스입니다.
//! 내장 구현인 [`DigestProvider`]는 파일을 한 번만 읽으면서 설정된 모든 알고리즘을 동시에 계산합니다.
//!
//! # 확장
//!
//! 외부 도구 호출이나 캐시 조회 등 다른 방식의 provider는 이 trait을 구현하여
//! [`IntegrityProviderRegistry`](crate::registry::IntegrityProviderRegistry)에 등록합니다.

use std::fs::File;
use std::io::{ErrorKind as IoErrorKind, Read};

use sha2::Digest;

use sbomkit_core::platform::Platform;

use crate::error::FileInventoryError;
use crate::types::{FileHash, FileIdentity, HashAlgorithm};

/// 기본 읽기 버퍼 크기 (64 KiB)
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// 무결성 provider trait
///
/// 구현체는 여러 워커 스레드에서 동시에 호출됩니다.
pub trait IntegrityProvider: Send + Sync {
    /// 에러 레코드와 로그에 쓰이는 provider 이름
    fn name(&self) -> &str;

    /// 파일 하나의 해시 목록을 계산합니다.
    ///
    /// 실패는 해당 파일, 해당 provider에만 한정됩니다.
    fn compute(
        &self,
        file: &FileIdentity,
        platform: &dyn Platform,
    ) -> Result<Vec<FileHash>, FileInventoryError>;

    /// 현재 환경에서 이 provider를 사용할지 여부
    fn is_enabled(&self, _platform: &dyn Platform) -> bool {
        true
    }
}

enum DigestState {
    Md5(md5::Md5),
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
    Sha512(sha2::Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => Self::Md5(md5::Md5::new()),
            HashAlgorithm::Sha1 => Self::Sha1(sha1::Sha1::new()),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Sha512 => Self::Sha512(sha2::Sha512::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Md5(h) => hex::encode(h.finalize()),
            Self::Sha1(h) => hex::encode(h.finalize()),
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha512(h) => hex::encode(h.finalize()),
            Self::Blake3(h) => hex::encode(h.finalize().as_bytes()),
        }
    }
}

/// 내장 다이제스트 provider
///
/// 설정된 알고리즘마다 [`FileHash`] 하나를 등록 순서대로 반환합니다.
#[derive(Debug, Clone)]
pub struct DigestProvider {
    name: String,
    algorithms: Vec<HashAlgorithm>,
    buffer_size: usize,
    disable_env: Option<String>,
}

impl DigestProvider {
    /// 여러 알고리즘을 한 번의 읽기로 계산하는 provider를 생성합니다.
    pub fn new(algorithms: impl IntoIterator<Item = HashAlgorithm>) -> Self {
        let mut unique: Vec<HashAlgorithm> = Vec::new();
        for algorithm in algorithms {
            if !unique.contains(&algorithm) {
                unique.push(algorithm);
            }
        }
        let name = format!(
            "digest[{}]",
            unique
                .iter()
                .map(HashAlgorithm::as_str)
                .collect::<Vec<_>>()
                .join(",")
        );

        Self {
            name,
            algorithms: unique,
            buffer_size: DEFAULT_READ_BUFFER_SIZE,
            disable_env: None,
        }
    }

    /// 단일 알고리즘 provider를 생성합니다.
    ///
    /// 이름은 알고리즘 이름이며, 기본 비활성화 환경변수가 설정됩니다.
    pub fn single(algorithm: HashAlgorithm) -> Self {
        Self {
            name: algorithm.as_str().to_owned(),
            algorithms: vec![algorithm],
            buffer_size: DEFAULT_READ_BUFFER_SIZE,
            disable_env: Some(Self::default_env_key(algorithm)),
        }
    }

    /// 알고리즘별 기본 비활성화 환경변수 이름 (`SBOMKIT_DISABLE_SHA256` 등)
    pub fn default_env_key(algorithm: HashAlgorithm) -> String {
        format!("SBOMKIT_DISABLE_{}", algorithm.as_str().to_ascii_uppercase())
    }

    /// 읽기 버퍼 크기를 지정합니다. 0이면 기본값을 사용합니다.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = if size == 0 {
            DEFAULT_READ_BUFFER_SIZE
        } else {
            size
        };
        self
    }

    /// 이 환경변수가 참 값이면 provider를 비활성화합니다.
    pub fn with_disable_env(mut self, key: impl Into<String>) -> Self {
        self.disable_env = Some(key.into());
        self
    }

    /// provider 이름을 지정합니다.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 계산할 알고리즘 목록
    pub fn algorithms(&self) -> &[HashAlgorithm] {
        &self.algorithms
    }

    /// 비활성화 환경변수 이름
    pub fn disable_env(&self) -> Option<&str> {
        self.disable_env.as_deref()
    }

    fn io_error(file: &FileIdentity, source: std::io::Error) -> FileInventoryError {
        FileInventoryError::Io {
            path: file.relative.clone(),
            source,
        }
    }
}

impl IntegrityProvider for DigestProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(
        &self,
        file: &FileIdentity,
        _platform: &dyn Platform,
    ) -> Result<Vec<FileHash>, FileInventoryError> {
        if self.algorithms.is_empty() {
            return Ok(Vec::new());
        }

        let mut reader = File::open(&file.absolute).map_err(|e| Self::io_error(file, e))?;
        let mut states: Vec<DigestState> =
            self.algorithms.iter().copied().map(DigestState::new).collect();
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
                Err(e) => return Err(Self::io_error(file, e)),
            };
            for state in &mut states {
                state.update(&buffer[..read]);
            }
        }

        Ok(self
            .algorithms
            .iter()
            .zip(states)
            .map(|(algorithm, state)| FileHash::new(*algorithm, state.finalize_hex()))
            .collect())
    }

    fn is_enabled(&self, platform: &dyn Platform) -> bool {
        match &self.disable_env {
            Some(key) => !platform.env_flag(key),
            None => true,
        }
    }
}
