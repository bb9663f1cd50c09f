//! 에러 타입 -- 도메인별 에러 정의

/// sbomkit 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum SbomkitError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파일 스캔 에러
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// 로깅 초기화 에러
    #[error("logging init failed: {0}")]
    Logging(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파일 스캔 에러
///
/// 스캔 전체를 중단시키는 에러만 표현합니다. 파일 단위 실패는
/// 스캔 결과의 에러 목록으로 전달되며 이 타입으로 올라오지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// 스캔 루트가 존재하지 않음
    #[error("scan root not found: {0}")]
    RootNotFound(String),

    /// 이미 완료된 파이프라인 재사용
    #[error("pipeline already used: {0}")]
    AlreadyCompleted(String),

    /// 스캔 실행 실패 (태스크 조인, 채널 등)
    #[error("scan failed: {0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_into_top_level() {
        let err: SbomkitError = ConfigError::InvalidValue {
            field: "files.worker_count".to_owned(),
            reason: "must be greater than 0".to_owned(),
        }
        .into();
        assert!(matches!(err, SbomkitError::Config(_)));
        assert!(err.to_string().contains("files.worker_count"));
    }

    #[test]
    fn scan_error_display_includes_path() {
        let err: SbomkitError = ScanError::RootNotFound("/nope".to_owned()).into();
        assert_eq!(err.to_string(), "scan error: scan root not found: /nope");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: SbomkitError = io.into();
        assert!(matches!(err, SbomkitError::Io(_)));
    }
}
