//! 파일 무결성 파이프라인 -- 탐색, 해시 계산, 에러 집계의 전체 흐름 관리
//!
//! [`FileIntegrityPipeline`]은 스캔 한 번을 수행하는 일회용 인스턴스입니다.
//! 다시 스캔하려면 [`FileIntegrityPipelineBuilder`]로 새 인스턴스를 만들어야 합니다.
//!
//! # 내부 아키텍처
//!
//! ```text
//! DirectoryWalker (spawn_blocking)
//!        |
//!        | FileIdentity
//!        v
//!  mpsc (queue_capacity) --> worker x N --> spawn_blocking(registry.compute_hashes)
//!                                                   |
//!        | Err(ErrorInfo)                           | Ok(FileOutcome)
//!        v                                          v
//!   result mpsc ---------------------------> orchestrator --> entries / ErrorAggregator
//!                                                   |
//!                                                   v
//!                                              ScanReport
//! ```
//!
//! # 상태 전이
//!
//! `Idle -> Walking -> Draining -> Completed`
//!
//! 탐색이 끝나면 `Draining`으로 전환되고, 큐에 남은 파일이 모두 처리되거나
//! 취소되면 `Completed`가 됩니다. 전환은 [`FileIntegrityPipeline::subscribe`]로 관찰합니다.

use std::sync::Arc;
use std::time::{Instant, SystemTime};

use metrics::{counter, histogram};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sbomkit_core::metrics as m;
use sbomkit_core::platform::{OsPlatform, Platform};

use crate::aggregator::{ErrorAggregator, ErrorInfo, ErrorKind};
use crate::config::{FileInventoryConfig, ScanConfiguration};
use crate::error::FileInventoryError;
use crate::filter::ScanFilter;
use crate::registry::IntegrityProviderRegistry;
use crate::types::{FileEntry, FileIdentity, ScanReport, ScanStats, ScanStatus};
use crate::walker::{DirectoryWalker, WalkSummary};

/// 에러 레코드의 component 값
const PIPELINE_COMPONENT: &str = "file-integrity-pipeline";

/// 파이프라인 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// 생성됨, 아직 시작하지 않음
    Idle,
    /// 디렉토리 탐색 중
    Walking,
    /// 탐색 종료, 남은 파일 처리 중
    Draining,
    /// 스캔 종료
    Completed,
}

impl PipelineState {
    /// 상태명
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Walking => "walking",
            Self::Draining => "draining",
            Self::Completed => "completed",
        }
    }
}

/// 워커가 파일 하나를 처리한 결과
#[derive(Debug, Clone)]
pub struct FileOutcome {
    /// 완성된 엔트리
    pub entry: FileEntry,
    /// 이 파일에서 발생한 provider 실패
    pub failures: Vec<ErrorInfo>,
}

/// 결과 채널 항목: 완성된 파일 또는 탐색/작업 단위 실패
pub type WorkResult = Result<FileOutcome, ErrorInfo>;

/// 파일 무결성 파이프라인
pub struct FileIntegrityPipeline {
    /// 설정
    config: FileInventoryConfig,
    /// 컴파일된 include/exclude 필터
    filter: ScanFilter,
    /// 플랫폼 어댑터
    platform: Arc<dyn Platform>,
    /// 현재 상태 (구독자에게 전파)
    state: watch::Sender<PipelineState>,
}

impl FileIntegrityPipeline {
    /// 현재 상태를 반환합니다.
    pub fn state(&self) -> PipelineState {
        *self.state.borrow()
    }

    /// 현재 상태명을 반환합니다.
    pub fn state_name(&self) -> &'static str {
        self.state().as_str()
    }

    /// 상태 변화를 구독합니다.
    ///
    /// `start()`가 파이프라인을 빌려 쓰는 동안에도 `Walking`, `Draining` 전환을 관찰할 수 있습니다.
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: PipelineState) {
        self.state.send_replace(state);
    }

    /// 설정을 반환합니다.
    pub fn config(&self) -> &FileInventoryConfig {
        &self.config
    }

    /// 설정과 플랫폼으로 기본 스캔 입력을 만듭니다.
    pub fn scan_configuration(&self) -> ScanConfiguration {
        ScanConfiguration::from_config(&self.config, self.platform.as_ref())
    }

    /// 스캔을 수행합니다.
    ///
    /// 파일/디렉토리 단위 실패는 [`ScanReport::errors`]에 모이며 스캔을 중단하지 않습니다.
    /// 취소 시 이미 계산 중인 파일은 끝까지 처리되고, 큐에 남은 파일은 버려집니다.
    ///
    /// # Errors
    ///
    /// - `AlreadyCompleted`: `Idle` 상태가 아님
    /// - `Config`: `component_path`가 절대 경로이거나 `..` 포함 (상태는 `Completed`)
    /// - `RootNotFound`: 스캔 루트가 없거나 디렉토리가 아님 (상태는 `Completed`)
    /// - `Channel`: 탐색 태스크 비정상 종료
    pub async fn start(
        &mut self,
        scan: ScanConfiguration,
        cancel: CancellationToken,
    ) -> Result<ScanReport, FileInventoryError> {
        if self.state() != PipelineState::Idle {
            return Err(FileInventoryError::AlreadyCompleted {
                state: self.state_name().to_owned(),
            });
        }

        let started = Instant::now();
        let started_at = SystemTime::now();
        let scan_id = uuid::Uuid::new_v4().to_string();
        self.set_state(PipelineState::Walking);

        if let Err(e) = scan.validate() {
            self.set_state(PipelineState::Completed);
            warn!(scan_id = %scan_id, error = %e, "invalid scan configuration");
            return Err(e);
        }

        let root = scan.scan_root();
        let walker = match DirectoryWalker::new(
            &scan.base_path,
            &root,
            self.filter.clone(),
            Arc::clone(&self.platform),
        ) {
            Ok(walker) => walker.follow_links(self.config.follow_links),
            Err(e) => {
                self.set_state(PipelineState::Completed);
                warn!(scan_id = %scan_id, root = %root.display(), error = %e, "scan root unavailable");
                return Err(e);
            }
        };

        info!(
            scan_id = %scan_id,
            root = %root.display(),
            workers = self.config.worker_count,
            providers = scan.registry.len(),
            "file integrity scan started"
        );

        let aggregator = ErrorAggregator::new();
        let capacity = self.config.queue_capacity;
        let (work_tx, work_rx) = mpsc::channel::<FileIdentity>(capacity);
        let (result_tx, mut result_rx) = mpsc::channel::<WorkResult>(capacity);

        let mut walker_handle = spawn_walker(walker, cancel.clone(), work_tx, result_tx.clone());

        let work_rx = Arc::new(Mutex::new(work_rx));
        let workers: Vec<JoinHandle<()>> = (0..self.config.worker_count)
            .map(|id| {
                spawn_worker(
                    id,
                    Arc::clone(&work_rx),
                    result_tx.clone(),
                    Arc::clone(&scan.registry),
                    Arc::clone(&self.platform),
                    cancel.clone(),
                )
            })
            .collect();
        // 탐색기와 워커가 모두 끝나면 결과 채널이 닫히도록 원본 송신자는 버립니다.
        drop(result_tx);
        drop(work_rx);

        let mut entries: Vec<FileEntry> = Vec::new();
        let mut walk_result = None;

        loop {
            tokio::select! {
                joined = &mut walker_handle, if walk_result.is_none() => {
                    debug!(scan_id = %scan_id, "walk finished, draining work queue");
                    self.set_state(PipelineState::Draining);
                    walk_result = Some(joined);
                }
                received = result_rx.recv() => match received {
                    Some(Ok(outcome)) => {
                        for failure in outcome.failures {
                            aggregator.record_info(failure);
                        }
                        entries.push(outcome.entry);
                    }
                    Some(Err(info)) => aggregator.record_info(info),
                    None => break,
                },
            }
        }

        let walk_result = match walk_result {
            Some(joined) => joined,
            None => walker_handle.await,
        };

        for worker in workers {
            if let Err(e) = worker.await {
                warn!(scan_id = %scan_id, error = %e, "hash worker terminated abnormally");
            }
        }

        self.set_state(PipelineState::Completed);

        let (summary, discovered) = walk_result
            .map_err(|e| FileInventoryError::Channel(format!("walker task failed: {e}")))?;

        // 모든 파일을 처리한 뒤에 도착한 취소는 결과에 영향이 없습니다.
        let interrupted = summary.cancelled || summary.files_yielded > entries.len();
        let status = if cancel.is_cancelled() && interrupted {
            ScanStatus::Cancelled
        } else {
            ScanStatus::Completed
        };

        let errors = aggregator.drain();
        let duration = started.elapsed();
        let stats = ScanStats {
            files_discovered: discovered,
            files_hashed: entries.len(),
            files_abandoned: discovered.saturating_sub(entries.len()),
            directories_visited: summary.directories_visited,
            provider_failures: errors
                .iter()
                .filter(|e| e.kind == ErrorKind::ProviderFailure)
                .count(),
            duration,
        };

        counter!(m::FILE_INVENTORY_FILES_HASHED_TOTAL)
            .increment(u64::try_from(stats.files_hashed).unwrap_or(u64::MAX));
        counter!(m::FILE_INVENTORY_SCANS_TOTAL, m::LABEL_STATUS => status.as_str()).increment(1);
        histogram!(m::FILE_INVENTORY_SCAN_DURATION_SECONDS).record(duration.as_secs_f64());

        info!(
            scan_id = %scan_id,
            status = %status,
            files = stats.files_hashed,
            abandoned = stats.files_abandoned,
            directories = stats.directories_visited,
            errors = errors.len(),
            duration_ms = duration.as_millis() as u64,
            "file integrity scan finished"
        );

        Ok(ScanReport {
            scan_id,
            status,
            entries,
            errors,
            stats,
            started_at,
        })
    }
}

/// 탐색기를 blocking 스레드에서 돌리며 파일은 워크 큐에, 탐색 실패는 결과 채널에 넣습니다.
///
/// 반환값은 탐색 요약과 큐에 넣은 파일 수입니다.
fn spawn_walker(
    walker: DirectoryWalker,
    cancel: CancellationToken,
    work_tx: mpsc::Sender<FileIdentity>,
    result_tx: mpsc::Sender<WorkResult>,
) -> JoinHandle<(WalkSummary, usize)> {
    tokio::task::spawn_blocking(move || {
        let mut iter = walker.iter(cancel.clone());
        let mut discovered = 0usize;

        for item in iter.by_ref() {
            match item {
                Ok(file) => {
                    if cancel.is_cancelled() {
                        break;
                    }
                    // 워커가 모두 종료되어 수신자가 사라진 경우
                    if work_tx.blocking_send(file).is_err() {
                        break;
                    }
                    discovered += 1;
                }
                Err(info) => {
                    if result_tx.blocking_send(Err(info)).is_err() {
                        break;
                    }
                }
            }
        }

        (iter.summary(), discovered)
    })
}

/// 큐에서 파일을 꺼내 레지스트리를 실행하는 워커를 띄웁니다.
fn spawn_worker(
    id: usize,
    work_rx: Arc<Mutex<mpsc::Receiver<FileIdentity>>>,
    result_tx: mpsc::Sender<WorkResult>,
    registry: Arc<IntegrityProviderRegistry>,
    platform: Arc<dyn Platform>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let next = {
                let mut rx = work_rx.lock().await;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    item = rx.recv() => item,
                }
            };

            let Some(file) = next else {
                break;
            };
            if cancel.is_cancelled() {
                break;
            }

            let relative = file.relative.clone();
            let registry = Arc::clone(&registry);
            let platform = Arc::clone(&platform);
            let computed = tokio::task::spawn_blocking(move || {
                let outcome = registry.compute_hashes(&file, platform.as_ref());
                FileOutcome {
                    entry: FileEntry {
                        path: file.relative,
                        hashes: outcome.hashes,
                    },
                    failures: outcome.failures,
                }
            })
            .await;

            let result = computed.map_err(|e| {
                ErrorInfo::new(ErrorKind::ProviderFailure, PIPELINE_COMPONENT, e)
                    .with_path(relative)
                    .with_message("hash task terminated abnormally")
            });
            if result_tx.send(result).await.is_err() {
                break;
            }
        }
        debug!(worker = id, "hash worker stopped");
    })
}

/// 파일 무결성 파이프라인 빌더
pub struct FileIntegrityPipelineBuilder {
    config: FileInventoryConfig,
    platform: Option<Arc<dyn Platform>>,
}

impl FileIntegrityPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: FileInventoryConfig::default(),
            platform: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: FileInventoryConfig) -> Self {
        self.config = config;
        self
    }

    /// 플랫폼 어댑터를 지정합니다.
    ///
    /// 지정하지 않으면 [`OsPlatform`]을 사용합니다.
    pub fn platform(mut self, platform: Arc<dyn Platform>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// 파이프라인을 빌드합니다.
    ///
    /// # Errors
    ///
    /// 설정 검증 실패 또는 잘못된 glob 패턴이면 `FileInventoryError::Config`
    pub fn build(self) -> Result<FileIntegrityPipeline, FileInventoryError> {
        self.config.validate()?;

        let platform = self.platform.unwrap_or_else(|| Arc::new(OsPlatform));
        let filter =
            ScanFilter::for_platform(&self.config.include, &self.config.exclude, platform.as_ref())?;

        Ok(FileIntegrityPipeline {
            config: self.config,
            filter,
            platform,
            state: watch::channel(PipelineState::Idle).0,
        })
    }
}

impl Default for FileIntegrityPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
