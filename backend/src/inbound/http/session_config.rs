//! Cookie-session key and flags, validated against the build mode.
//!
//! Debug builds fall back to safe defaults with a warning; release builds
//! refuse to start on a missing key, an ephemeral key, or `SameSite=None`
//! without `Secure`.

use std::path::{Path, PathBuf};

use actix_web::cookie::{Key, SameSite};
use sha2::{Digest, Sha256};
use tracing::warn;
use zeroize::Zeroizing;

pub const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
const DERIVE_MIN_LEN: usize = 32;
const FINGERPRINT_BYTES: usize = 8;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    /// # Examples
    ///
    /// ```rust
    /// use routeshare::inbound::http::session_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// assert_eq!(mode == BuildMode::Debug, cfg!(debug_assertions));
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Raw session toggles as loaded from configuration.
#[derive(Clone, Debug, Default)]
pub struct SessionToggles {
    pub key_file: Option<PathBuf>,
    pub cookie_secure: Option<bool>,
    pub same_site: Option<String>,
    pub allow_ephemeral: bool,
}

/// Validated session middleware inputs.
pub struct SessionSettings {
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("missing required session setting: {name}")]
    Missing { name: &'static str },
    #[error("invalid sameSite value '{value}'; expected Strict|Lax|None")]
    InvalidSameSite { value: String },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("sameSite=None requires secure session cookies")]
    InsecureSameSiteNone,
    #[error("ephemeral session keys are not allowed in release builds")]
    EphemeralNotAllowed,
}

/// Resolve `toggles` into middleware settings.
///
/// # Errors
///
/// Release builds reject missing toggles, unreadable or short keys, an
/// ephemeral key and insecure `SameSite=None`. Debug builds warn and fall
/// back instead, failing only on a key file too short to derive from.
pub fn session_settings(
    toggles: &SessionToggles,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    if toggles.allow_ephemeral && !mode.is_debug() {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let cookie_secure = match toggles.cookie_secure {
        Some(flag) => flag,
        None if mode.is_debug() => {
            warn!("session cookieSecure not set; defaulting to secure");
            true
        }
        None => {
            return Err(SessionConfigError::Missing {
                name: "cookieSecure",
            });
        }
    };
    let same_site = same_site(toggles.same_site.as_deref(), mode, cookie_secure)?;
    let key_path = toggles
        .key_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(SESSION_KEY_DEFAULT_PATH));
    let key = session_key(&key_path, mode, toggles.allow_ephemeral)?;
    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

fn same_site(
    raw: Option<&str>,
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<SameSite, SessionConfigError> {
    let fallback = if mode.is_debug() {
        SameSite::Lax
    } else {
        SameSite::Strict
    };
    let Some(raw) = raw else {
        if mode.is_debug() {
            return Ok(fallback);
        }
        return Err(SessionConfigError::Missing { name: "sameSite" });
    };
    match raw.to_ascii_lowercase().as_str() {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" if cookie_secure => Ok(SameSite::None),
        "none" if mode.is_debug() => {
            warn!("sameSite=None without secure cookies; browsers may drop the session");
            Ok(SameSite::None)
        }
        "none" => Err(SessionConfigError::InsecureSameSiteNone),
        _ if mode.is_debug() => {
            warn!(value = %raw, "invalid sameSite; using default");
            Ok(fallback)
        }
        _ => Err(SessionConfigError::InvalidSameSite {
            value: raw.to_owned(),
        }),
    }
}

fn session_key(
    path: &Path,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionConfigError> {
    match std::fs::read(path).map(Zeroizing::new) {
        Ok(bytes) => {
            let min_len = match mode {
                BuildMode::Release => SESSION_KEY_MIN_LEN,
                BuildMode::Debug => DERIVE_MIN_LEN,
            };
            if bytes.len() < min_len {
                return Err(SessionConfigError::KeyTooShort {
                    path: path.to_path_buf(),
                    length: bytes.len(),
                    min_len,
                });
            }
            Ok(Key::derive_from(&bytes))
        }
        Err(error) if mode.is_debug() || allow_ephemeral => {
            warn!(
                path = %path.display(),
                %error,
                "using temporary session key (dev only)"
            );
            Ok(Key::generate())
        }
        Err(source) => Err(SessionConfigError::KeyRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// First eight bytes of the SHA-256 of the signing key, hex encoded; safe to
/// log when checking which key a node runs with.
///
/// ```rust
/// use actix_web::cookie::Key;
/// use routeshare::inbound::http::session_config::key_fingerprint;
///
/// let fp = key_fingerprint(&Key::generate());
/// assert_eq!(fp.len(), 16);
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}
