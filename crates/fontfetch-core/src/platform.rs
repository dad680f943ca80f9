//! OS font registration hooks.
//!
//! Linux needs a fontconfig cache refresh for newly installed fonts to become
//! visible; macOS picks up files in the user font directory automatically;
//! on Windows a session restart may be required without registry integration.

use std::path::PathBuf;

/// Make newly installed fonts visible to the OS.
pub fn register_fonts(font_paths: &[PathBuf]) {
    if font_paths.is_empty() {
        return;
    }
    log::debug!("registering {} fonts", font_paths.len());
    refresh_system_state();
}

/// Drop removed fonts from the OS's view.
pub fn unregister_fonts(font_paths: &[PathBuf]) {
    if font_paths.is_empty() {
        return;
    }
    log::debug!("unregistering {} fonts", font_paths.len());
    refresh_system_state();
}

fn refresh_system_state() {
    #[cfg(target_os = "linux")]
    {
        match std::process::Command::new("fc-cache").arg("-f").output() {
            Ok(output) if output.status.success() => {
                log::debug!("fc-cache refreshed");
            }
            Ok(output) => {
                log::warn!(
                    "fc-cache failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("fc-cache not found; install fontconfig to update the font cache");
            }
            Err(e) => {
                log::warn!("could not run fc-cache: {e}");
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        // fonts in ~/Library/Fonts are picked up automatically
        log::debug!("font registration is automatic on macOS");
    }

    #[cfg(target_os = "windows")]
    {
        log::warn!("fonts may not be visible until the session is restarted");
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        log::debug!("no font registration hook for this platform");
    }
}
