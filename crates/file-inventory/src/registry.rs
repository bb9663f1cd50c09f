//! Provider 레지스트리 -- 등록 순서대로 provider를 호출하여 파일 해시를 모음
//!
//! provider 하나의 실패(에러 반환 또는 패닉)는 해당 파일의 해당 provider에 한정된
//! [`ErrorInfo`]로 변환되며, 나머지 provider의 결과는 엔트리에 그대로 남습니다.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sbomkit_core::platform::Platform;

use crate::aggregator::ErrorInfo;
use crate::provider::IntegrityProvider;
use crate::types::{FileHash, FileIdentity};

/// 같은 알고리즘의 해시가 여러 provider에서 나올 때의 처리 규칙
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// 먼저 등록된 provider의 값 유지
    #[default]
    FirstRegisteredWins,
    /// 나중에 등록된 provider의 값으로 교체
    LastRegisteredWins,
}

impl DuplicatePolicy {
    /// 설정 문자열 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstRegisteredWins => "first_wins",
            Self::LastRegisteredWins => "last_wins",
        }
    }

    /// 설정 문자열에서 파싱합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first_wins" | "first" | "first_registered_wins" => Some(Self::FirstRegisteredWins),
            "last_wins" | "last" | "last_registered_wins" => Some(Self::LastRegisteredWins),
            _ => None,
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 파일 하나에 대한 레지스트리 실행 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashOutcome {
    /// 병합된 해시 (알고리즘당 최대 하나)
    pub hashes: Vec<FileHash>,
    /// provider별 실패
    pub failures: Vec<ErrorInfo>,
}

/// 무결성 provider 레지스트리
///
/// 등록이 끝난 뒤에는 읽기만 하므로 `Arc`로 워커 간에 공유합니다.
#[derive(Clone, Default)]
pub struct IntegrityProviderRegistry {
    providers: Vec<Arc<dyn IntegrityProvider>>,
    policy: DuplicatePolicy,
}

impl IntegrityProviderRegistry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            providers: Vec::new(),
            policy,
        }
    }

    /// provider를 등록 순서 끝에 추가합니다.
    pub fn register(&mut self, provider: Arc<dyn IntegrityProvider>) {
        debug!(provider = provider.name(), "integrity provider registered");
        self.providers.push(provider);
    }

    /// provider를 추가한 레지스트리를 반환합니다.
    pub fn with_provider(mut self, provider: Arc<dyn IntegrityProvider>) -> Self {
        self.register(provider);
        self
    }

    /// 등록된 provider 수
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// 등록된 provider가 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// 중복 처리 규칙
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// 등록 순서대로 provider 이름을 반환합니다.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// 현재 환경에서 활성화된 provider만 남긴 레지스트리를 반환합니다.
    pub fn select_enabled(&self, platform: &dyn Platform) -> Self {
        let providers = self
            .providers
            .iter()
            .filter(|p| {
                let enabled = p.is_enabled(platform);
                if !enabled {
                    debug!(provider = p.name(), "integrity provider disabled by environment");
                }
                enabled
            })
            .cloned()
            .collect();

        Self {
            providers,
            policy: self.policy,
        }
    }

    /// 등록된 모든 provider로 파일 하나의 해시를 계산합니다.
    pub fn compute_hashes(&self, file: &FileIdentity, platform: &dyn Platform) -> HashOutcome {
        let mut outcome = HashOutcome::default();

        for provider in &self.providers {
            let result = panic::catch_unwind(AssertUnwindSafe(|| provider.compute(file, platform)));
            match result {
                Ok(Ok(hashes)) => {
                    for hash in hashes {
                        self.merge(&mut outcome.hashes, hash, provider.name(), file);
                    }
                }
                Ok(Err(e)) => {
                    outcome.failures.push(ErrorInfo::provider_failure(
                        provider.name(),
                        file.relative.clone(),
                        e,
                    ));
                }
                Err(payload) => {
                    outcome.failures.push(
                        ErrorInfo::provider_failure(
                            provider.name(),
                            file.relative.clone(),
                            panic_message(payload.as_ref()),
                        )
                        .with_message("provider panicked"),
                    );
                }
            }
        }

        outcome
    }

    fn merge(&self, hashes: &mut Vec<FileHash>, hash: FileHash, provider: &str, file: &FileIdentity) {
        if hash.algorithm.trim().is_empty() {
            warn!(provider, path = %file.relative, "hash without algorithm name dropped");
            return;
        }

        match hashes.iter().position(|h| h.same_algorithm(&hash.algorithm)) {
            None => hashes.push(hash),
            Some(index) => match self.policy {
                DuplicatePolicy::FirstRegisteredWins => {
                    debug!(
                        provider,
                        algorithm = %hash.algorithm,
                        path = %file.relative,
                        "duplicate algorithm ignored"
                    );
                }
                DuplicatePolicy::LastRegisteredWins => {
                    hashes[index] = hash;
                }
            },
        }
    }
}

impl fmt::Debug for IntegrityProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrityProviderRegistry")
            .field("providers", &self.provider_names())
            .field("policy", &self.policy)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "provider panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use sbomkit_core::platform::{OsFamily, StaticPlatform};

    use super::*;
    use crate::aggregator::ErrorKind;
    use crate::error::FileInventoryError;

    struct Fixed {
        name: &'static str,
        hashes: Vec<(&'static str, &'static str)>,
    }

    impl IntegrityProvider for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn compute(
            &self,
            _file: &FileIdentity,
            _platform: &dyn Platform,
        ) -> Result<Vec<FileHash>, FileInventoryError> {
            Ok(self
                .hashes
                .iter()
                .map(|(a, v)| FileHash::custom(*a, *v))
                .collect())
        }
    }

    struct Failing;

    impl IntegrityProvider for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn compute(
            &self,
            _file: &FileIdentity,
            _platform: &dyn Platform,
        ) -> Result<Vec<FileHash>, FileInventoryError> {
            Err(FileInventoryError::Provider {
                provider: "failing".to_owned(),
                reason: "backend unavailable".to_owned(),
            })
        }
    }

    struct Panicking;

    impl IntegrityProvider for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn compute(
            &self,
            _file: &FileIdentity,
            _platform: &dyn Platform,
        ) -> Result<Vec<FileHash>, FileInventoryError> {
            panic!("provider blew up");
        }
    }

    struct EnvGated;

    impl IntegrityProvider for EnvGated {
        fn name(&self) -> &str {
            "gated"
        }

        fn compute(
            &self,
            _file: &FileIdentity,
            _platform: &dyn Platform,
        ) -> Result<Vec<FileHash>, FileInventoryError> {
            Ok(Vec::new())
        }

        fn is_enabled(&self, platform: &dyn Platform) -> bool {
            !platform.env_flag("GATED_OFF")
        }
    }

    fn fixed(name: &'static str, hashes: Vec<(&'static str, &'static str)>) -> Arc<dyn IntegrityProvider> {
        Arc::new(Fixed { name, hashes })
    }

    fn file() -> FileIdentity {
        FileIdentity::new("/virtual/c.txt", "c.txt")
    }

    fn platform() -> StaticPlatform {
        StaticPlatform::new(OsFamily::Linux)
    }

    #[test]
    fn empty_registry_yields_no_hashes() {
        let registry = IntegrityProviderRegistry::default();
        let outcome = registry.compute_hashes(&file(), &platform());
        assert!(outcome.hashes.is_empty());
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn hashes_follow_registration_order() {
        let registry = IntegrityProviderRegistry::default()
            .with_provider(fixed("b", vec![("sha256", "22")]))
            .with_provider(fixed("a", vec![("md5", "11")]));
        assert_eq!(registry.provider_names(), vec!["b", "a"]);

        let outcome = registry.compute_hashes(&file(), &platform());
        let algs: Vec<_> = outcome.hashes.iter().map(|h| h.algorithm.as_str()).collect();
        assert_eq!(algs, vec!["sha256", "md5"]);
    }

    #[test]
    fn failing_provider_is_isolated() {
        let registry = IntegrityProviderRegistry::default()
            .with_provider(Arc::new(Failing))
            .with_provider(fixed("sha1", vec![("sha1", "abc")]));

        let outcome = registry.compute_hashes(&file(), &platform());
        assert_eq!(outcome.hashes, vec![FileHash::custom("sha1", "abc")]);
        assert_eq!(outcome.failures.len(), 1);
        let failure = &outcome.failures[0];
        assert_eq!(failure.kind, ErrorKind::ProviderFailure);
        assert_eq!(failure.component, "failing");
        assert_eq!(failure.path.as_deref(), Some("c.txt"));
        assert!(failure.cause.contains("backend unavailable"));
    }

    #[test]
    fn panicking_provider_is_isolated() {
        let registry = IntegrityProviderRegistry::default()
            .with_provider(Arc::new(Panicking))
            .with_provider(fixed("sha1", vec![("sha1", "abc")]));

        let outcome = registry.compute_hashes(&file(), &platform());
        assert_eq!(outcome.hashes.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].component, "panicking");
        assert!(outcome.failures[0].cause.contains("provider blew up"));
    }

    #[test]
    fn first_registered_wins_by_default() {
        let registry = IntegrityProviderRegistry::default()
            .with_provider(fixed("p1", vec![("SHA1", "first")]))
            .with_provider(fixed("p2", vec![("sha1", "second")]));
        let outcome = registry.compute_hashes(&file(), &platform());
        assert_eq!(outcome.hashes, vec![FileHash::custom("SHA1", "first")]);
    }

    #[test]
    fn last_registered_wins_when_configured() {
        let registry = IntegrityProviderRegistry::new(DuplicatePolicy::LastRegisteredWins)
            .with_provider(fixed("p1", vec![("sha1", "first"), ("md5", "m")]))
            .with_provider(fixed("p2", vec![("sha1", "second")]));
        let outcome = registry.compute_hashes(&file(), &platform());
        assert_eq!(
            outcome.hashes,
            vec![FileHash::custom("sha1", "second"), FileHash::custom("md5", "m")]
        );
    }

    #[test]
    fn duplicates_within_one_provider_follow_policy() {
        let registry = IntegrityProviderRegistry::default()
            .with_provider(fixed("p", vec![("md5", "a"), ("md5", "b")]));
        let outcome = registry.compute_hashes(&file(), &platform());
        assert_eq!(outcome.hashes, vec![FileHash::custom("md5", "a")]);
    }

    #[test]
    fn empty_algorithm_name_is_dropped() {
        let registry = IntegrityProviderRegistry::default()
            .with_provider(fixed("p", vec![(" ", "a"), ("md5", "b")]));
        let outcome = registry.compute_hashes(&file(), &platform());
        assert_eq!(outcome.hashes, vec![FileHash::custom("md5", "b")]);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn select_enabled_drops_disabled_providers() {
        let registry = IntegrityProviderRegistry::default()
            .with_provider(Arc::new(EnvGated))
            .with_provider(fixed("always", vec![]));

        let off = platform().with_env("GATED_OFF", "true");
        assert_eq!(registry.select_enabled(&off).provider_names(), vec!["always"]);
        assert_eq!(registry.select_enabled(&platform()).len(), 2);
    }

    #[test]
    fn policy_parses_config_names() {
        assert_eq!(
            DuplicatePolicy::from_str_loose("first_wins"),
            Some(DuplicatePolicy::FirstRegisteredWins)
        );
        assert_eq!(
            DuplicatePolicy::from_str_loose(" LAST_WINS "),
            Some(DuplicatePolicy::LastRegisteredWins)
        );
        assert_eq!(DuplicatePolicy::from_str_loose("random"), None);
    }
}
