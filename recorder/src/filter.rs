//! Application/engine filter (spec §4.8).
//!
//! Parsed asynchronously on a background thread, since the recorder must
//! not stall the first `record_application_info` call waiting on a disk
//! read. `ApplicationFilter::test_application_info` blocks the *first*
//! caller that needs a verdict before the parse finishes, then returns
//! instantly for everyone after — matching spec §4.8: "parsed
//! asynchronously at startup; `test_application_info` blocks on the
//! parse, on failure is permissive (log error, return true)."

use fossilize_types::application::ApplicationInfo;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

/// One of the three environment-variable predicates spec §4.8 lists.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "predicate", rename_all = "camelCase")]
pub enum EnvPredicate {
    Contains { name: String, value: String },
    Equals { name: String, value: String },
    NonNull { name: String },
}

impl EnvPredicate {
    fn matches(&self, lookup: &dyn Fn(&str) -> Option<String>) -> bool {
        match self {
            EnvPredicate::Contains { name, value } => lookup(name).is_some_and(|v| v.contains(value.as_str())),
            EnvPredicate::Equals { name, value } => lookup(name).as_deref() == Some(value.as_str()),
            EnvPredicate::NonNull { name } => lookup(name).is_some(),
        }
    }
}

/// A per-app/engine filter entry. `None` fields are unconstrained.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEngineFilter {
    pub application_name: Option<String>,
    pub engine_name: Option<String>,
    pub minimum_application_version: Option<u32>,
    pub minimum_engine_version: Option<u32>,
    pub minimum_api_version: Option<u32>,
    /// Per-app opt-in/out for recording immutable samplers (spec §4.8
    /// "Optional immutable-sampler recording opt-in/out per app").
    #[serde(default)]
    pub record_immutable_samplers: Option<bool>,
    #[serde(default)]
    pub env_blacklist: Vec<EnvPredicate>,
}

impl AppEngineFilter {
    fn applies_to(&self, info: &ApplicationInfo) -> bool {
        if let Some(name) = &self.application_name {
            if info.application_name.as_deref() != Some(name.as_str()) {
                return false;
            }
        }
        if let Some(name) = &self.engine_name {
            if info.engine_name.as_deref() != Some(name.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Bucketing configuration (spec §4.8 "Optional bucketing"). Consulted by
/// the interceptor (out of scope) to pick a shard suffix; kept here as a
/// pure function of the inputs it names so a caller that *does* want
/// bucketed paths can compute the suffix without reimplementing the rule.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketVariantDependencies {
    #[serde(default)]
    pub vendor_id: bool,
    #[serde(default)]
    pub application_name: bool,
    #[serde(default)]
    pub engine_name: bool,
    /// Names of feature bits that participate in the bucket hash (e.g.
    /// `"bufferDeviceAddress"`, `"descriptorIndexing"`, `"mutableDescriptorType"`,
    /// `"fragmentShadingRate"`, `"dynamicRendering"`, `"descriptorBuffer"`).
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationFilterDoc {
    #[serde(default)]
    pub blacklisted_applications: Vec<String>,
    #[serde(default)]
    pub blacklisted_engines: Vec<String>,
    #[serde(default)]
    pub filters: Vec<AppEngineFilter>,
    #[serde(default)]
    pub bucket_variant_dependencies: Option<BucketVariantDependencies>,
}

impl ApplicationFilterDoc {
    fn matching_filters<'a>(&'a self, info: &'a ApplicationInfo) -> impl Iterator<Item = &'a AppEngineFilter> {
        self.filters.iter().filter(move |f| f.applies_to(info))
    }

    /// Spec §4.8: "Blacklisted application names... Blacklisted engine
    /// names... Per-app/engine filters (minimum app version, engine
    /// version, API version)... Per-app/engine environment-variable
    /// blacklists."
    pub fn test(&self, info: &ApplicationInfo, env_lookup: &dyn Fn(&str) -> Option<String>) -> bool {
        if let Some(name) = &info.application_name {
            if self.blacklisted_applications.iter().any(|b| b == name) {
                return false;
            }
        }
        if let Some(name) = &info.engine_name {
            if self.blacklisted_engines.iter().any(|b| b == name) {
                return false;
            }
        }
        for filter in self.matching_filters(info) {
            if let Some(min) = filter.minimum_application_version {
                if info.application_version < min {
                    return false;
                }
            }
            if let Some(min) = filter.minimum_engine_version {
                if info.engine_version < min {
                    return false;
                }
            }
            if let Some(min) = filter.minimum_api_version {
                if info.api_version < min {
                    return false;
                }
            }
            if filter.env_blacklist.iter().any(|p| p.matches(env_lookup)) {
                return false;
            }
        }
        true
    }

    /// Defaults to `true` (record immutable samplers) when no matching
    /// filter entry says otherwise.
    pub fn record_immutable_samplers(&self, info: &ApplicationInfo) -> bool {
        self.matching_filters(info)
            .find_map(|f| f.record_immutable_samplers)
            .unwrap_or(true)
    }
}

enum FilterState {
    Pending,
    Ready(Option<ApplicationFilterDoc>),
}

/// Owns the background parse and the blocking handshake described in
/// spec §4.8.
pub struct ApplicationFilter {
    state: Mutex<FilterState>,
    cv: Condvar,
}

impl ApplicationFilter {
    /// Spawns the background parse immediately. `path: None` resolves to
    /// "no filter configured" without touching a thread, since there's
    /// nothing to parse.
    pub fn spawn(path: Option<PathBuf>) -> Arc<ApplicationFilter> {
        let filter = Arc::new(ApplicationFilter {
            state: Mutex::new(FilterState::Pending),
            cv: Condvar::new(),
        });
        let Some(path) = path else {
            *filter.state.lock().expect("filter mutex poisoned") = FilterState::Ready(None);
            return filter;
        };
        let background = Arc::clone(&filter);
        thread::spawn(move || {
            let doc = std::fs::read(&path)
                .ok()
                .and_then(|bytes| match serde_json::from_slice::<ApplicationFilterDoc>(&bytes) {
                    Ok(doc) => Some(doc),
                    Err(e) => {
                        log::error!("application filter {} failed to parse: {}", path.display(), e);
                        None
                    }
                });
            let mut guard = background.state.lock().expect("filter mutex poisoned");
            *guard = FilterState::Ready(doc);
            background.cv.notify_all();
        });
        filter
    }

    /// A filter with nothing configured: every application passes.
    pub fn permissive() -> Arc<ApplicationFilter> {
        ApplicationFilter::spawn(None)
    }

    fn wait_for_doc(&self) -> Option<ApplicationFilterDoc> {
        let mut guard = self.state.lock().expect("filter mutex poisoned");
        loop {
            match &*guard {
                FilterState::Ready(doc) => return doc.clone(),
                FilterState::Pending => guard = self.cv.wait(guard).expect("filter mutex poisoned"),
            }
        }
    }

    /// Blocks on the background parse (only actually blocks for the
    /// thread unlucky enough to race the parse). A failed or absent
    /// filter is permissive: "on failure is permissive (log error, return
    /// true)" (spec §4.8).
    pub fn test_application_info(&self, info: &ApplicationInfo, env_lookup: &dyn Fn(&str) -> Option<String>) -> bool {
        match self.wait_for_doc() {
            Some(doc) => doc.test(info, env_lookup),
            None => true,
        }
    }

    pub fn record_immutable_samplers(&self, info: &ApplicationInfo) -> bool {
        self.wait_for_doc().map(|doc| doc.record_immutable_samplers(info)).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(app: &str) -> ApplicationInfo {
        ApplicationInfo {
            application_name: Some(app.to_string()),
            application_version: 1,
            engine_name: None,
            engine_version: 0,
            api_version: 0,
        }
    }

    #[test]
    fn blacklisted_application_is_rejected() {
        let doc = ApplicationFilterDoc {
            blacklisted_applications: vec!["bad-app".into()],
            ..Default::default()
        };
        assert!(!doc.test(&info("bad-app"), &|_| None));
        assert!(doc.test(&info("good-app"), &|_| None));
    }

    #[test]
    fn minimum_version_filter_rejects_older_applications() {
        let doc = ApplicationFilterDoc {
            filters: vec![AppEngineFilter {
                application_name: Some("versioned-app".into()),
                minimum_application_version: Some(5),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut old = info("versioned-app");
        old.application_version = 1;
        assert!(!doc.test(&old, &|_| None));
        let mut new = info("versioned-app");
        new.application_version = 9;
        assert!(doc.test(&new, &|_| None));
    }

    #[test]
    fn env_blacklist_predicates() {
        let doc = ApplicationFilterDoc {
            filters: vec![AppEngineFilter {
                application_name: Some("env-app".into()),
                env_blacklist: vec![EnvPredicate::Equals {
                    name: "DISABLE_CACHE".into(),
                    value: "1".into(),
                }],
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(!doc.test(&info("env-app"), &|k| if k == "DISABLE_CACHE" { Some("1".into()) } else { None }));
        assert!(doc.test(&info("env-app"), &|_| None));
    }

    #[test]
    fn permissive_filter_accepts_everything() {
        let filter = ApplicationFilter::permissive();
        assert!(filter.test_application_info(&info("anything"), &|_| None));
    }

    #[test]
    fn missing_file_is_permissive() {
        let filter = ApplicationFilter::spawn(Some(PathBuf::from("/nonexistent/fossilize-filter.json")));
        assert!(filter.test_application_info(&info("anything"), &|_| None));
    }
}
