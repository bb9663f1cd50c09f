//! sbomkit 파일 무결성 인벤토리
//!
//! 디렉토리 트리를 탐색하여 파일마다 하나 이상의 무결성 해시를 계산하고,
//! 파일/디렉토리 단위 실패를 스캔 중단 없이 모아 문서 조립 계층에 넘깁니다.
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`FileInventoryError`)
//! - [`config`]: Pipeline configuration (`FileInventoryConfig`, builder, `ScanConfiguration`)
//! - [`types`]: Domain types (`FileEntry`, `FileHash`, `HashAlgorithm`, `ScanReport`)
//! - [`aggregator`]: Error collection (`ErrorAggregator`, `ErrorInfo`, `ErrorKind`)
//! - [`filter`]: include/exclude glob predicate (`ScanFilter`)
//! - [`walker`]: Directory traversal with visited-set dedup (`DirectoryWalker`)
//! - [`provider`]: Hash provider trait and built-in digests (`IntegrityProvider`, `DigestProvider`)
//! - [`registry`]: Ordered provider registry (`IntegrityProviderRegistry`, `DuplicatePolicy`)
//! - [`pipeline`]: Main orchestrator (`FileIntegrityPipeline`, `FileIntegrityPipelineBuilder`)
//!
//! # Architecture
//!
//! ```text
//! base_path/component_path --> DirectoryWalker --> FileIdentity
//!                                    |                   |
//!                               ErrorInfo         bounded mpsc queue
//!                                    |                   |
//!                                    |          IntegrityProviderRegistry (x worker_count)
//!                                    |                   |
//!                                    +---> ErrorAggregator <--- provider failures
//!                                                |               |
//!                                                v               v
//!                                             ScanReport { entries, errors, status }
//! ```
//!
//! # 사용 예시
//!
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use sbomkit_file_inventory::{FileInventoryConfigBuilder, FileIntegrityPipelineBuilder};
//!
//! # async fn example() -> Result<(), sbomkit_file_inventory::FileInventoryError> {
//! let config = FileInventoryConfigBuilder::new()
//!     .base_path("/srv/drop")
//!     .build()?;
//! let mut pipeline = FileIntegrityPipelineBuilder::new().config(config).build()?;
//! let scan = pipeline.scan_configuration();
//! let report = pipeline.start(scan, CancellationToken::new()).await?;
//! println!("{} files, {} errors", report.entries.len(), report.errors.len());
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod provider;
pub mod registry;
pub mod types;
pub mod walker;

// --- Public API Re-exports ---

// Pipeline (main orchestrator)
pub use pipeline::{FileIntegrityPipeline, FileIntegrityPipelineBuilder, FileOutcome, PipelineState};

// Configuration
pub use config::{FileInventoryConfig, FileInventoryConfigBuilder, ScanConfiguration};

// Error
pub use error::FileInventoryError;

// Types
pub use types::{
    FileEntry, FileHash, FileIdentity, HashAlgorithm, ScanReport, ScanStats, ScanStatus,
};

// Errors collected during a scan
pub use aggregator::{ErrorAggregator, ErrorInfo, ErrorKind};

// Traversal
pub use filter::ScanFilter;
pub use walker::{DirectoryWalker, VisitedDirs, WalkIter, WalkSummary};

// Providers
pub use provider::{DigestProvider, IntegrityProvider};
pub use registry::{DuplicatePolicy, HashOutcome, IntegrityProviderRegistry};
