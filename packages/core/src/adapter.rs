//! The contract with the UI layer that renders mirrored objects.

use crate::Value;

/// Receives change notifications from a session.
///
/// Implementations typically schedule a re-render. Calls arrive on the
/// session's thread, at most once per handled event batch.
pub trait BindingAdapter {
    /// Cached state changed; views reading proxies should refresh.
    fn schedule_refresh(&self);

    /// A top-level model was (re)bound under `name`.
    fn bind_model(&self, _name: &str, _value: &Value) {}
}
