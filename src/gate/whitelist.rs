// Route whitelist: which gate checks a path may skip

use std::ops::BitOr;

/// Per-route capability bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteFlags(u8);

impl RouteFlags {
    pub const NONE: RouteFlags = RouteFlags(0);
    pub const SKIP_API_KEY: RouteFlags = RouteFlags(1);
    pub const SKIP_TOKEN: RouteFlags = RouteFlags(1 << 1);

    pub fn contains(self, other: RouteFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for RouteFlags {
    type Output = RouteFlags;

    fn bitor(self, rhs: RouteFlags) -> RouteFlags {
        RouteFlags(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistEntry {
    pub prefix: String,
    pub flags: RouteFlags,
}

/// Immutable prefix table built once at startup
///
/// Matching is plain prefix comparison on the normalized path, so `/doc`
/// also covers `/documents`.
#[derive(Debug, Clone)]
pub struct Whitelist {
    entries: Vec<WhitelistEntry>,
}

impl Whitelist {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, RouteFlags)>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(prefix, flags)| WhitelistEntry {
                    prefix: prefix.into().to_ascii_lowercase(),
                    flags,
                })
                .collect(),
        }
    }

    /// Health, documentation and login routes
    pub fn standard() -> Self {
        let open = RouteFlags::SKIP_API_KEY | RouteFlags::SKIP_TOKEN;
        Self::new([
            ("/health", open),
            ("/health/", open),
            ("/doc", open),
            ("/doc/", open),
            ("/user/authorize", RouteFlags::SKIP_TOKEN),
        ])
    }

    pub fn entries(&self) -> &[WhitelistEntry] {
        &self.entries
    }

    /// True when `path` may skip the check named by `flag`
    ///
    /// The root path skips every check.
    pub fn allows(&self, path: &str, flag: RouteFlags) -> bool {
        let normalized = normalize_path(path);
        if normalized.is_empty() || normalized == "/" {
            return true;
        }
        self.entries
            .iter()
            .any(|e| normalized.starts_with(&e.prefix) && e.flags.contains(flag))
    }
}

/// Lower-case the path and replace a leading `/v<digits>/` segment with `/`
pub fn normalize_path(path: &str) -> String {
    let lowered = path.to_ascii_lowercase();
    if let Some(rest) = lowered.strip_prefix("/v") {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 && rest[digits..].starts_with('/') {
            return rest[digits..].to_string();
        }
    }
    lowered
}
