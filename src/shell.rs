//! Shell notification
//!
//! Explorer caches file type icons and associations. After registry changes it
//! is told to re-read them in two ways:
//!
//! 1. `WM_SETTINGCHANGE` broadcast to all top-level windows via
//!    `SendMessageTimeoutW` with `SMTO_ABORTIFHUNG`, so a hung window cannot
//!    block the caller for longer than the timeout
//! 2. `SHChangeNotify(SHCNE_ASSOCCHANGED)`, the shell-wide "associations
//!    changed" event
//!
//! Both are fire-and-forget; failures are logged, never returned.

use std::time::Duration;

/// Upper bound on the settings broadcast
pub const DEFAULT_BROADCAST_TIMEOUT: Duration = Duration::from_millis(5000);

/// Ask the desktop shell to refresh file icons and associations
///
/// Uses [`DEFAULT_BROADCAST_TIMEOUT`] for the settings broadcast.
pub fn refresh_icons() {
    refresh_icons_with_timeout(DEFAULT_BROADCAST_TIMEOUT);
}

/// Ask the desktop shell to refresh file icons and associations, waiting at
/// most `timeout` for each window to process the settings broadcast
#[cfg(windows)]
#[expect(
    unsafe_code,
    reason = "Required for Windows FFI to broadcast WM_SETTINGCHANGE and call SHChangeNotify"
)]
pub fn refresh_icons_with_timeout(timeout: Duration) {
    use tracing::{debug, warn};
    use windows::Win32::Foundation::{LPARAM, WPARAM};
    use windows::Win32::UI::Shell::{SHCNE_ASSOCCHANGED, SHCNF_IDLIST, SHChangeNotify};
    use windows::Win32::UI::WindowsAndMessaging::{
        HWND_BROADCAST, SMTO_ABORTIFHUNG, SendMessageTimeoutW, WM_SETTINGCHANGE,
    };

    let timeout_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);

    // SAFETY: HWND_BROADCAST with WM_SETTINGCHANGE and null wParam/lParam is a
    // documented broadcast that passes no pointers; the result pointer is omitted.
    let delivered = unsafe {
        SendMessageTimeoutW(
            HWND_BROADCAST,
            WM_SETTINGCHANGE,
            WPARAM(0),
            LPARAM(0),
            SMTO_ABORTIFHUNG,
            timeout_ms,
            None,
        )
    };
    if delivered.0 == 0 {
        warn!(
            "WM_SETTINGCHANGE broadcast failed or timed out after {} ms",
            timeout_ms
        );
    }

    // SAFETY: SHCNE_ASSOCCHANGED takes no items, so both item pointers are null.
    unsafe {
        SHChangeNotify(SHCNE_ASSOCCHANGED, SHCNF_IDLIST, None, None);
    }

    debug!("Shell notified of association changes");
}

/// Stub implementation for non-Windows platforms (no desktop shell to notify)
#[cfg(not(windows))]
pub fn refresh_icons_with_timeout(timeout: Duration) {
    tracing::debug!(
        "Icon refresh requested (timeout {:?}); no Windows shell to notify",
        timeout
    );
}
