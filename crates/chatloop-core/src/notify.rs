/// Turn-completion notification hook (e.g., a sound).
///
/// Returns whether the notification was delivered. Failures never affect the
/// turn result.
pub trait Notifier: Send + Sync {
    fn play(&self) -> bool;
}
