//! Browser Environment Queries
//!
//! Facts about the hosting page that drive interaction-flow selection.

use crate::platform::PlatformSendSync;

/// Read-only view of the hosting page
///
/// All methods are cheap and evaluated at call time; implementations must not
/// cache answers that can change (popup support in particular).
pub trait BrowserEnvironment: PlatformSendSync {
    /// `false` for headless hosts with no window at all
    fn is_browser(&self) -> bool;

    /// Whether the page runs inside a foreign frame (`window !== window.top`).
    ///
    /// Implementations report `true` when the check itself fails, since a
    /// cross-origin parent is the usual cause.
    fn is_embedded(&self) -> bool;

    /// Hostname of the current page
    fn hostname(&self) -> Option<String>;

    /// Origin of the current page (`scheme://host[:port]`)
    fn origin(&self) -> Option<String>;

    /// Check whether popup windows can be opened
    fn popups_supported(&self) -> bool;
}
