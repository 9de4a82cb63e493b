//! Browser-window popup provider.
//!
//! Opens the authorization page as a Chromium-family "app" window (no tabs,
//! no address bar) in a child process. The window counts as closed once
//! that process exits. Each popup name gets its own profile directory so
//! the launch never hands off to an already-running browser and returns
//! immediately.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use tubelink_settings::PopupSettings;

use super::{PopupGeometry, PopupHandle, PopupProvider};

/// Executables tried in order when no browser is configured.
const BROWSER_CANDIDATES: &[&str] = &[
    "google-chrome-stable",
    "google-chrome",
    "chromium-browser",
    "chromium",
    "brave-browser",
    "brave",
    "microsoft-edge",
    "/usr/bin/google-chrome",
    "/usr/bin/chromium",
    "/snap/bin/chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
];

/// Locate a Chromium-family browser on this machine.
pub fn find_browser() -> Option<PathBuf> {
    BROWSER_CANDIDATES.iter().find_map(|candidate| {
        let path = Path::new(candidate);
        if path.is_absolute() {
            path.exists().then(|| path.to_path_buf())
        } else {
            which::which(candidate).ok()
        }
    })
}

/// Command-line arguments that open `url` as a popup window.
pub fn popup_args(
    url: &str,
    name: &str,
    geometry: &PopupGeometry,
    profile_root: &Path,
) -> Vec<String> {
    vec![
        format!("--app={url}"),
        format!("--window-size={},{}", geometry.width, geometry.height),
        format!("--window-position={},{}", geometry.left, geometry.top),
        format!(
            "--user-data-dir={}",
            profile_root.join(profile_dir_name(name)).display()
        ),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
    ]
}

/// Filesystem-safe directory name for a popup name.
fn profile_dir_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "popup".to_string()
    } else {
        cleaned
    }
}

/// [`PopupProvider`] that launches a browser process per popup.
#[derive(Clone, Debug)]
pub struct BrowserPopupProvider {
    browser: Option<PathBuf>,
    profile_root: PathBuf,
}

impl BrowserPopupProvider {
    /// Provider using `browser`, keeping popup profiles under `profile_root`.
    ///
    /// With `browser == None` every popup is reported as blocked.
    pub fn new(browser: Option<PathBuf>, profile_root: impl Into<PathBuf>) -> Self {
        Self {
            browser,
            profile_root: profile_root.into(),
        }
    }

    /// Provider using the configured browser, or the first one discovered.
    pub fn from_settings(settings: &PopupSettings, profile_root: impl Into<PathBuf>) -> Self {
        let browser = settings
            .browser_path
            .as_ref()
            .map(PathBuf::from)
            .or_else(find_browser);
        Self::new(browser, profile_root)
    }

    /// Browser executable in use, if any.
    pub fn browser(&self) -> Option<&Path> {
        self.browser.as_deref()
    }
}

impl PopupProvider for BrowserPopupProvider {
    fn open(
        &self,
        url: &str,
        name: &str,
        geometry: &PopupGeometry,
    ) -> Option<Box<dyn PopupHandle>> {
        let Some(browser) = &self.browser else {
            tracing::warn!("no browser available to open the authorization popup");
            return None;
        };

        let args = popup_args(url, name, geometry, &self.profile_root);
        let mut cmd = Command::new(browser);
        let _ = cmd
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        match cmd.spawn() {
            Ok(child) => {
                tracing::debug!(browser = %browser.display(), pid = child.id(), name, "popup opened");
                Some(Box::new(BrowserPopup { child: Some(child) }))
            }
            Err(e) => {
                tracing::warn!(browser = %browser.display(), "failed to launch popup: {e}");
                None
            }
        }
    }
}

/// A popup backed by a browser child process. `None` once it has exited.
#[derive(Debug)]
struct BrowserPopup {
    child: Option<Child>,
}

impl PopupHandle for BrowserPopup {
    fn is_closed(&mut self) -> bool {
        let Some(child) = &mut self.child else {
            return true;
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!(%status, "popup process exited");
                self.child = None;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("lost track of popup process: {e}");
                self.child = None;
            }
        }
        self.child.is_none()
    }

    fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        let Some(mut child) = self.child.take() else {
            return;
        };
        if let Err(e) = child.kill() {
            tracing::warn!("failed to close popup: {e}");
        }
        if matches!(child.try_wait(), Ok(None)) {
            reap(child);
        }
    }
}

/// Wait for a killed child off the async worker threads.
fn reap(mut child: Child) {
    let mut wait = move || {
        let _ = child.wait();
    };
    match tokio::runtime::Handle::try_current() {
        Ok(rt) => {
            let _ = rt.spawn_blocking(wait);
        }
        Err(_) => wait(),
    }
}

impl Drop for BrowserPopup {
    fn drop(&mut self) {
        self.close();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
