//! # Backend Paths
//!
//! Canonical storage path construction for engine configuration objects.
//!
//! Vault addresses every configuration object by a slash-separated path under
//! an auth mount, e.g. `auth/kube1/config/my-config`. Paths assembled from
//! user-declared fragments may carry stray or duplicated separators, so every
//! path goes through [`cleanse_path`] before it reaches the transport.

/// Build the canonical backend path for a resource instance.
///
/// Joins `mount / engine_path / subtype / name` with `/` and cleanses the
/// result. Empty `engine_path` or `name` simply yields a shorter path;
/// callers reject those through validation where they are not acceptable.
///
/// # Example
///
/// ```
/// use vault_engine_controller::vault::build_path;
///
/// assert_eq!(build_path("auth", "kube1", "config", "my-config"), "auth/kube1/config/my-config");
/// ```
pub fn build_path(mount: &str, engine_path: &str, subtype: &str, name: &str) -> String {
    cleanse_path(&format!("{mount}/{engine_path}/{subtype}/{name}"))
}

/// Normalize a backend path.
///
/// Collapses any run of consecutive `/` into a single separator and strips a
/// single leading separator. Idempotent: cleansing a cleansed path is a
/// no-op.
pub fn cleanse_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut last_was_separator = false;
    for ch in path.chars() {
        if ch == '/' {
            if !last_was_separator {
                out.push('/');
            }
            last_was_separator = true;
        } else {
            out.push(ch);
            last_was_separator = false;
        }
    }
    match out.strip_prefix('/') {
        Some(stripped) => stripped.to_string(),
        None => out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_path_joins_segments() {
        assert_eq!(
            build_path("auth", "kube1", "config", "my-config"),
            "auth/kube1/config/my-config"
        );
    }

    #[test]
    fn test_build_path_collapses_redundant_separators() {
        assert_eq!(
            build_path("auth/", "/kube1/", "role", "reader"),
            "auth/kube1/role/reader"
        );
    }

    #[test]
    fn test_build_path_with_empty_name() {
        // Empty segments are permitted and yield a shorter path
        assert_eq!(build_path("auth", "kube1", "config", ""), "auth/kube1/config/");
    }

    #[test]
    fn test_cleanse_path_strips_single_leading_separator() {
        assert_eq!(cleanse_path("/auth/kube1"), "auth/kube1");
        assert_eq!(cleanse_path("//auth//kube1"), "auth/kube1");
    }

    #[test]
    fn test_cleanse_path_idempotent() {
        for raw in ["auth//kube1///config/x", "/a/b/c", "", "///", "a"] {
            let once = cleanse_path(raw);
            assert_eq!(cleanse_path(&once), once, "cleansing {raw:?} twice diverged");
        }
    }
}
