/// RouteClass
///
/// Whether a request path must carry a valid credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
}

/// RoutePolicy
///
/// Deny-by-default classification: everything under `api_root` is protected unless it
/// sits under one of the public prefixes. Paths outside the API root (health probe,
/// API docs) are public. Built once from configuration; `classify` is a pure function.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    api_root: String,
    public_prefixes: Vec<String>,
}

impl RoutePolicy {
    pub fn new<I, P>(api_root: &str, public_prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        Self {
            api_root: normalize(api_root),
            public_prefixes: public_prefixes
                .into_iter()
                .map(|prefix| normalize(prefix.as_ref()))
                .collect(),
        }
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        if self
            .public_prefixes
            .iter()
            .any(|prefix| is_under(path, prefix))
        {
            return RouteClass::Public;
        }
        if is_under(path, &self.api_root) {
            RouteClass::Protected
        } else {
            RouteClass::Public
        }
    }
}

// Stored without a trailing slash; the root itself becomes "".
fn normalize(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

// Segment-aware, ASCII case-insensitive: "/api/auth" covers "/API/Auth/login" but not "/api/authx".
fn is_under(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    if path.len() < prefix.len() || !path.is_char_boundary(prefix.len()) {
        return false;
    }
    let (head, rest) = path.split_at(prefix.len());
    head.eq_ignore_ascii_case(prefix) && (rest.is_empty() || rest.starts_with('/'))
}
