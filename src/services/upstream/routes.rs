//! Static path-prefix → upstream table.
//!
//! Matching is longest-prefix on path-segment boundaries: `/exhibitor`
//! matches `/exhibitor` and `/exhibitor/...` but never `/exhibitorx`.
//! The prefix `/` is the catch-all.
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("route prefix must start with '/': {0}")]
    InvalidPrefix(String),
    #[error("invalid upstream url: {0}")]
    InvalidUpstream(String),
}

/// One registered prefix and the base address it forwards to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRoute {
    prefix: String,
    upstream: Url,
}

impl UpstreamRoute {
    pub fn new(prefix: &str, upstream: &str) -> Result<Self, RouteError> {
        if !prefix.starts_with('/') {
            return Err(RouteError::InvalidPrefix(prefix.to_string()));
        }

        // `/exhibitor/` and `/exhibitor` register the same route.
        let trimmed = prefix.trim_end_matches('/');
        let prefix = if trimmed.is_empty() { "/" } else { trimmed };

        let upstream = Url::parse(upstream)
            .map_err(|_| RouteError::InvalidUpstream(upstream.to_string()))?;
        if !matches!(upstream.scheme(), "http" | "https") || upstream.host().is_none() {
            return Err(RouteError::InvalidUpstream(upstream.to_string()));
        }

        Ok(Self {
            prefix: prefix.to_string(),
            upstream,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn upstream(&self) -> &Url {
        &self.upstream
    }

    /// Returns the path left after stripping this prefix, or `None` if the
    /// prefix does not match `path`.
    fn strip<'p>(&self, path: &'p str) -> Option<&'p str> {
        if self.prefix == "/" {
            return Some(path);
        }

        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

/// A route selected for one request, with the rewritten upstream path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub route: &'a UpstreamRoute,
    pub path: String,
}

impl RouteMatch<'_> {
    /// Joins the rewritten path (and the inbound query, if any) onto the
    /// upstream base address.
    pub fn target_url(&self, query: Option<&str>) -> Url {
        let mut url = self.route.upstream.clone();
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}{}", base, self.path));
        url.set_query(query);
        url
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    // Sorted by prefix length, longest first.
    routes: Vec<UpstreamRoute>,
}

impl RouteTable {
    pub fn new(mut routes: Vec<UpstreamRoute>) -> Self {
        // First registration wins when a prefix is listed twice.
        routes.sort_by(|a, b| {
            b.prefix
                .len()
                .cmp(&a.prefix.len())
                .then_with(|| a.prefix.cmp(&b.prefix))
        });
        routes.dedup_by(|a, b| a.prefix == b.prefix);
        Self { routes }
    }

    pub fn routes(&self) -> &[UpstreamRoute] {
        &self.routes
    }

    pub fn route(&self, path: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            route.strip(path).map(|rest| RouteMatch {
                route,
                path: if rest.is_empty() {
                    "/".to_string()
                } else {
                    rest.to_string()
                },
            })
        })
    }
}
