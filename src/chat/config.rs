//! Chat room configuration

/// Default outbound queue depth per member
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 64;

/// Chat broadcaster options
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Deliver a member's own messages back to it
    pub echo_to_sender: bool,

    /// Messages queued per member before sends to it start failing
    pub outbound_capacity: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            echo_to_sender: true,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }
}

impl ChatConfig {
    /// Set whether the sender receives its own messages
    pub fn echo_to_sender(mut self, echo: bool) -> Self {
        self.echo_to_sender = echo;
        self
    }

    /// Set the per-member queue depth (at least 1)
    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChatConfig::default();
        assert!(config.echo_to_sender);
        assert_eq!(config.outbound_capacity, DEFAULT_OUTBOUND_CAPACITY);
    }

    #[test]
    fn test_outbound_capacity_floor() {
        let config = ChatConfig::default().echo_to_sender(false).outbound_capacity(0);
        assert!(!config.echo_to_sender);
        assert_eq!(config.outbound_capacity, 1);
    }
}
