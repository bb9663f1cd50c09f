//! 에러 집계기 -- 스캔을 중단하지 않는 파일/디렉토리 단위 실패 수집
//!
//! [`ErrorAggregator`]는 여러 스레드에서 동시에 기록할 수 있으며
//! 기록을 버리지 않습니다. 스캔 종료 시 파이프라인이 [`ErrorAggregator::drain`]을
//! 한 번 호출하여 전체 목록을 호출자에게 넘깁니다.

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::warn;

use sbomkit_core::metrics as m;

/// 실패 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 디렉토리를 열 수 없음 (권한, 경합 삭제)
    DirectoryUnreadable,
    /// 엔트리 메타데이터를 읽을 수 없음 (끊어진 심볼릭 링크 등)
    EntryUnreadable,
    /// 해시 대상이 아닌 파일 종류 (FIFO, 소켓, 장치)
    UnsupportedFileType,
    /// 파일 하나에 대한 provider 하나의 실패
    ProviderFailure,
}

impl ErrorKind {
    /// 메트릭 레이블용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectoryUnreadable => "directory_unreadable",
            Self::EntryUnreadable => "entry_unreadable",
            Self::UnsupportedFileType => "unsupported_file_type",
            Self::ProviderFailure => "provider_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 실패 레코드
///
/// 생성 후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// 실패 종류
    pub kind: ErrorKind,
    /// 실패를 보고한 구성 요소 (walker, provider 이름 등)
    pub component: String,
    /// 관련 경로 (base_path 기준 상대 경로)
    pub path: Option<String>,
    /// 원인 상세
    pub cause: String,
    /// 부가 메시지
    pub message: Option<String>,
}

impl ErrorInfo {
    /// 새 레코드를 생성합니다.
    pub fn new(kind: ErrorKind, component: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self {
            kind,
            component: component.into(),
            path: None,
            cause: cause.to_string(),
            message: None,
        }
    }

    /// 관련 경로를 지정합니다.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// 부가 메시지를 지정합니다.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// 디렉토리 읽기 실패
    pub fn directory_unreadable(
        component: impl Into<String>,
        path: impl Into<String>,
        cause: impl fmt::Display,
    ) -> Self {
        Self::new(ErrorKind::DirectoryUnreadable, component, cause).with_path(path)
    }

    /// provider 실패
    pub fn provider_failure(
        provider: impl Into<String>,
        path: impl Into<String>,
        cause: impl fmt::Display,
    ) -> Self {
        Self::new(ErrorKind::ProviderFailure, provider, cause).with_path(path)
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.component)?;
        if let Some(path) = &self.path {
            write!(f, " {path}")?;
        }
        write!(f, ": {}", self.cause)?;
        if let Some(message) = &self.message {
            write!(f, " ({message})")?;
        }
        Ok(())
    }
}

/// 스캔 단위 에러 집계기
#[derive(Debug, Default)]
pub struct ErrorAggregator {
    records: Mutex<Vec<ErrorInfo>>,
    drained: AtomicBool,
}

impl ErrorAggregator {
    /// 빈 집계기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 레코드 하나를 추가합니다.
    pub fn record(
        &self,
        kind: ErrorKind,
        component: impl Into<String>,
        cause: impl fmt::Display,
        path: Option<String>,
        message: Option<String>,
    ) {
        let mut info = ErrorInfo::new(kind, component, cause);
        info.path = path;
        info.message = message;
        self.record_info(info);
    }

    /// 이미 만들어진 레코드를 추가합니다.
    pub fn record_info(&self, info: ErrorInfo) {
        warn!(
            kind = %info.kind,
            component = %info.component,
            path = info.path.as_deref().unwrap_or("-"),
            cause = %info.cause,
            "scan error recorded"
        );
        counter!(m::FILE_INVENTORY_ERRORS_TOTAL, m::LABEL_KIND => info.kind.as_str())
            .increment(1);

        // 다른 기록자가 패닉하더라도 레코드는 계속 받습니다.
        let mut records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        records.push(info);
    }

    /// 현재까지 기록된 수
    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// 기록이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 전체 레코드를 기록 순서대로 꺼냅니다.
    ///
    /// 스캔당 한 번 호출됩니다. 두 번째 호출은 빈 목록을 반환합니다.
    pub fn drain(&self) -> Vec<ErrorInfo> {
        if self.drained.swap(true, Ordering::AcqRel) {
            warn!("error aggregator drained more than once");
        }
        let mut records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        std::mem::take(&mut *records)
    }
}
