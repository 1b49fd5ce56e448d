//! Cluster registry (component D): the set of live (node, application)
//! pairs, maintained from periodic announcements.

use dashmap::DashMap;

use crate::envelope::Announcement;

/// Concurrent `node -> application` map. Last-writer-wins; never expires
/// entries (§9 open question — "never expire" is the default this crate
/// ships).
#[derive(Default)]
pub struct ClusterRegistry {
    nodes: DashMap<String, String>,
}

impl ClusterRegistry {
    pub fn new() -> Self {
        ClusterRegistry::default()
    }

    /// Insert or overwrite the application a node is serving. `app` may be
    /// empty — that's still a legal "seen" marker (§3 invariants).
    pub fn update(&self, node: impl Into<String>, app: impl Into<String>) {
        self.nodes.insert(node.into(), app.into());
    }

    /// Fold a decoded [`Announcement`] into the registry.
    pub fn apply_announcement(&self, announcement: &Announcement) {
        self.update(announcement.node.clone(), announcement.application.clone());
    }

    /// A point-in-time copy of every node known to the registry.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        self.nodes
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn application_of(&self, node: &str) -> Option<String> {
        self.nodes.get(node).map(|v| v.clone())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_is_last_writer_wins() {
        let registry = ClusterRegistry::new();
        registry.update("nB", "myapp");
        registry.update("nB", "otherapp");
        assert_eq!(registry.application_of("nB"), Some("otherapp".to_string()));
    }

    #[test]
    fn update_with_empty_app_is_legal() {
        let registry = ClusterRegistry::new();
        registry.update("nB", "");
        assert_eq!(registry.application_of("nB"), Some(String::new()));
    }

    #[test]
    fn announcement_updates_registry_matching_s3() {
        let registry = ClusterRegistry::new();
        let announcement = Announcement {
            event_name: "proxy".to_string(),
            node: "nB".to_string(),
            application: "myapp".to_string(),
        };
        registry.apply_announcement(&announcement);
        let snapshot = registry.snapshot();
        assert!(snapshot.contains(&("nB".to_string(), "myapp".to_string())));
    }
}
