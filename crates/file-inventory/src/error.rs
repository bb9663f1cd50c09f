//! 파일 인벤토리 에러 타입
//!
//! [`FileInventoryError`]는 파일 인벤토리 모듈 내에서 발생할 수 있는 모든 에러를 나타냅니다.
//! `From<FileInventoryError> for SbomkitError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 자연스럽게 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **스캔 중단**: `RootNotFound`, `AlreadyCompleted`, `Channel`
//! - **Provider**: `Provider`, `Io`
//! - **설정**: `Config`
//!
//! 파일/디렉토리 단위 실패는 이 타입이 아니라
//! [`ErrorInfo`](crate::aggregator::ErrorInfo)로 집계됩니다.

use sbomkit_core::error::{ConfigError, SbomkitError, ScanError};

/// 파일 인벤토리 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum FileInventoryError {
    /// 스캔 루트가 없거나 디렉토리가 아님
    #[error("scan root not found: {path}")]
    RootNotFound {
        /// 스캔 루트 경로
        path: String,
    },

    /// Idle 상태가 아닌 파이프라인에서 start 호출
    #[error("pipeline is {state}, a new pipeline is required for another scan")]
    AlreadyCompleted {
        /// 호출 시점 상태명
        state: String,
    },

    /// Provider 내부 실패
    #[error("provider '{provider}' failed: {reason}")]
    Provider {
        /// Provider 이름
        provider: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널/태스크 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

impl From<FileInventoryError> for SbomkitError {
    fn from(err: FileInventoryError) -> Self {
        match err {
            FileInventoryError::RootNotFound { path } => {
                SbomkitError::Scan(ScanError::RootNotFound(path))
            }
            FileInventoryError::AlreadyCompleted { state } => {
                SbomkitError::Scan(ScanError::AlreadyCompleted(state))
            }
            FileInventoryError::Config { field, reason } => {
                SbomkitError::Config(ConfigError::InvalidValue { field, reason })
            }
            FileInventoryError::Provider { provider, reason } => SbomkitError::Scan(
                ScanError::Failed(format!("provider '{provider}' failed: {reason}")),
            ),
            FileInventoryError::Channel(msg) => SbomkitError::Scan(ScanError::Failed(msg)),
            FileInventoryError::Io { path, source } => {
                SbomkitError::Scan(ScanError::Failed(format!("io error: {path}: {source}")))
            }
        }
    }
}
