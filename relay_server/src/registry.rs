use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

struct ClientEntry<S> {
    session: S,
    resources: HashSet<String>,
    last_seen: Instant,
}

/// Connected clients and the resources each one listens to.
///
/// Generic over the session handle so it can be exercised without sockets.
pub struct SubscriptionRegistry<S> {
    clients: HashMap<String, ClientEntry<S>>,
}

impl<S> Default for SubscriptionRegistry<S> {
    fn default() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }
}

impl<S: Clone> SubscriptionRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, client_id: &str, session: S) {
        self.clients.insert(
            client_id.to_string(),
            ClientEntry {
                session,
                resources: HashSet::new(),
                last_seen: Instant::now(),
            },
        );
    }

    pub fn remove(&mut self, client_id: &str) -> Option<S> {
        self.clients.remove(client_id).map(|entry| entry.session)
    }

    /// Returns `false` for unknown clients or repeated subscriptions.
    pub fn subscribe(&mut self, client_id: &str, resource: &str) -> bool {
        self.clients
            .get_mut(client_id)
            .is_some_and(|entry| entry.resources.insert(resource.to_string()))
    }

    pub fn unsubscribe(&mut self, client_id: &str, resource: &str) -> bool {
        self.clients
            .get_mut(client_id)
            .is_some_and(|entry| entry.resources.remove(resource))
    }

    pub fn touch(&mut self, client_id: &str) {
        if let Some(entry) = self.clients.get_mut(client_id) {
            entry.last_seen = Instant::now();
        }
    }

    pub fn last_seen(&self, client_id: &str) -> Option<Instant> {
        self.clients.get(client_id).map(|entry| entry.last_seen)
    }

    /// Sessions subscribed to `resource`, minus the originating client.
    pub fn subscribers(&self, resource: &str, except: Option<&str>) -> Vec<(String, S)> {
        self.clients
            .iter()
            .filter(|(id, entry)| Some(id.as_str()) != except && entry.resources.contains(resource))
            .map(|(id, entry)| (id.clone(), entry.session.clone()))
            .collect()
    }

    /// Clients silent for longer than `timeout` as of `now`.
    pub fn stale(&self, now: Instant, timeout: Duration) -> Vec<String> {
        self.clients
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.last_seen) > timeout)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
