/// Lifecycle shared by filters, layouts, appenders and processors.
///
/// Elements that hold no resources are always started, which is what the
/// default methods describe.
pub trait Element {
    fn is_started(&self) -> bool {
        true
    }

    /// Returns `false` when the element could not be started.
    fn start(&self) -> bool {
        true
    }

    /// Returns `false` when the element could not be stopped.
    fn stop(&self) -> bool {
        true
    }
}
