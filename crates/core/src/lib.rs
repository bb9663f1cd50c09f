//! sbomkit 공통 크레이트
//!
//! 파일 인벤토리를 포함한 모든 sbomkit 모듈이 공유하는 타입을 제공합니다.
//!
//! - [`error`]: 최상위 에러 (`SbomkitError`)와 도메인별 에러
//! - [`config`]: `sbomkit.toml` 파싱, 환경변수 오버라이드, 검증
//! - [`platform`]: OS별 경로 비교/정규화, 환경변수 조회 (`Platform` trait)
//! - [`logging`]: `tracing-subscriber` 초기화
//! - [`metrics`]: 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod platform;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, SbomkitError, ScanError};

// 설정
pub use config::{FilesConfig, GeneralConfig, SbomkitConfig};

// 플랫폼
pub use platform::{OsFamily, OsPlatform, PathIdentity, Platform, StaticPlatform};
