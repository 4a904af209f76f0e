//! Operational alerts raised by the login flow.

use tracing::error;

/// Receives integration defects that need a human to look at them.
pub trait AlertSink: Send + Sync {
    /// The billing provider reported a status this service does not understand.
    fn unsupported_billing_status(&self, account_id: u64, status: &str);
}

/// Emits alerts as `error` events on the `keyward::alert` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn unsupported_billing_status(&self, account_id: u64, status: &str) {
        error!(
            target: "keyward::alert",
            account_id,
            status,
            "invalid subscription status"
        );
    }
}
