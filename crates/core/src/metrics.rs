//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 익스포터 설치는 임베딩하는 쪽의 몫입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `sbomkit_`
//! - 모듈명: `file_inventory_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(sbomkit_core::metrics::FILE_INVENTORY_FILES_HASHED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 에러 종류 레이블 키 (directory_unreadable, provider_failure, ...)
pub const LABEL_KIND: &str = "kind";

/// 스캔 종료 상태 레이블 키 (completed, cancelled)
pub const LABEL_STATUS: &str = "status";

// ─── File Inventory 메트릭 ──────────────────────────────────────────

/// File Inventory: 해시 계산이 끝난 파일 수 (counter)
pub const FILE_INVENTORY_FILES_HASHED_TOTAL: &str = "sbomkit_file_inventory_files_hashed_total";

/// File Inventory: 기록된 파일 단위 에러 수 (counter, label: kind)
pub const FILE_INVENTORY_ERRORS_TOTAL: &str = "sbomkit_file_inventory_errors_total";

/// File Inventory: 종료된 스캔 수 (counter, label: status)
pub const FILE_INVENTORY_SCANS_TOTAL: &str = "sbomkit_file_inventory_scans_total";

/// File Inventory: 스캔 소요 시간 (histogram, 초)
pub const FILE_INVENTORY_SCAN_DURATION_SECONDS: &str =
    "sbomkit_file_inventory_scan_duration_seconds";

/// 전체 메트릭 이름 목록
pub const ALL_METRIC_NAMES: [&str; 4] = [
    FILE_INVENTORY_FILES_HASHED_TOTAL,
    FILE_INVENTORY_ERRORS_TOTAL,
    FILE_INVENTORY_SCANS_TOTAL,
    FILE_INVENTORY_SCAN_DURATION_SECONDS,
];

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 스캔 소요 시간 히스토그램 버킷 (초)
///
/// 100ms ~ 600s 범위 (수만 개 파일 해싱 포함)
pub const SCAN_DURATION_BUCKETS: [f64; 10] =
    [0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        FILE_INVENTORY_FILES_HASHED_TOTAL,
        "Total number of files whose integrity records were computed"
    );
    describe_counter!(
        FILE_INVENTORY_ERRORS_TOTAL,
        "Total number of per-file or per-directory failures recorded during scans"
    );
    describe_counter!(
        FILE_INVENTORY_SCANS_TOTAL,
        "Total number of file inventory scans that reached a terminal state"
    );
    describe_histogram!(
        FILE_INVENTORY_SCAN_DURATION_SECONDS,
        "Time to complete a single file inventory scan in seconds"
    );
}
