/// Listeners a component has attached, kept so teardown can detach them all
#[derive(Debug, Clone)]
pub struct Subscriptions<K> {
    entries: Vec<K>,
}

impl<K: PartialEq> Subscriptions<K> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Attach a listener; attaching the same one twice is a no-op
    pub fn subscribe(&mut self, listener: K) {
        if !self.entries.contains(&listener) {
            self.entries.push(listener);
        }
    }

    pub fn is_subscribed(&self, listener: &K) -> bool {
        self.entries.contains(listener)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Detach everything, handing back what was attached
    pub fn drain(&mut self) -> Vec<K> {
        std::mem::take(&mut self.entries)
    }
}

impl<K: PartialEq> Default for Subscriptions<K> {
    fn default() -> Self {
        Self::new()
    }
}
