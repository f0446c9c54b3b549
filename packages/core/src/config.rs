//! Client configuration.

use serde::Deserialize;

use crate::request_ids::DEFAULT_CAPACITY;

/// How instance type descriptors are cached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorPolicy {
    /// One descriptor per remote type name, reused by every instance.
    #[default]
    PerType,

    /// Every instance keeps its own descriptor; abbreviated descriptors are
    /// looked up from the remote again.
    PerInstance,
}

/// Configuration for a mirroring client.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Target of session-level events (`context_updated`, `new_type`).
    pub root_target: String,

    /// Maximum number of requests in flight on a correlated transport.
    pub request_id_capacity: usize,

    pub descriptor_policy: DescriptorPolicy,

    /// Store the value carried by an `object_changed` event in the cache
    /// instead of refetching it on the next read.
    pub seed_changed_values: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            root_target: "jigna".to_string(),
            request_id_capacity: DEFAULT_CAPACITY,
            descriptor_policy: DescriptorPolicy::PerType,
            seed_changed_values: false,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root_target(mut self, root_target: impl Into<String>) -> Self {
        self.root_target = root_target.into();
        self
    }

    pub fn with_request_id_capacity(mut self, capacity: usize) -> Self {
        self.request_id_capacity = capacity;
        self
    }

    pub fn with_descriptor_policy(mut self, policy: DescriptorPolicy) -> Self {
        self.descriptor_policy = policy;
        self
    }

    pub fn with_seed_changed_values(mut self, seed: bool) -> Self {
        self.seed_changed_values = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.root_target, "jigna");
        assert_eq!(config.request_id_capacity, 1024);
        assert_eq!(config.descriptor_policy, DescriptorPolicy::PerType);
        assert!(!config.seed_changed_values);
    }

    #[test]
    fn partial_config_from_json() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"request_id_capacity": 8, "descriptor_policy": "per_instance"}"#,
        )
        .unwrap();
        assert_eq!(config.request_id_capacity, 8);
        assert_eq!(config.descriptor_policy, DescriptorPolicy::PerInstance);
        assert_eq!(config.root_target, "jigna");
    }

    #[test]
    fn builder() {
        let config = ClientConfig::new()
            .with_root_target("app")
            .with_seed_changed_values(true);
        assert_eq!(config.root_target, "app");
        assert!(config.seed_changed_values);
    }
}
