//! Plugin Seam - Registration-Only Build Extensions

use crate::compiler::Compiler;

/// A build extension registered with the compiler before a run.
///
/// `apply` is invoked once when the plugin is registered and must perform
/// no I/O: it only subscribes to the compiler's compilation-created hook
/// and, from there, to process-assets taps. The taps fire later, inside
/// [`Compiler::run`].
pub trait Plugin {
    /// Stable name used in hook bookkeeping and error reports.
    fn name(&self) -> &'static str;

    /// Subscribe to compiler lifecycle hooks.
    fn apply(&self, compiler: &mut Compiler);
}
