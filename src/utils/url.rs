//! Backend URL helpers.
//!
//! Base URLs come from user configuration and frequently carry trailing
//! slashes; endpoints are written with or without a leading one.

/// Strip trailing slashes from a configured base URL.
///
/// # Examples
///
/// ```
/// use threadline::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:8080/"), "http://localhost:8080");
/// assert_eq!(normalize_base_url("http://localhost:8080///"), "http://localhost:8080");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash.
///
/// # Examples
///
/// ```
/// use threadline::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8080/", "/api/folder"),
///     "http://localhost:8080/api/folder"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{normalized_base}/{endpoint}")
}
