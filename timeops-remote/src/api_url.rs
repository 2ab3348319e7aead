/// Versioned base path prepended to every endpoint.
pub(crate) const API_BASE_PATH: &str = "/api/v1";

#[derive(Debug, Clone)]
pub struct ApiUrl(String);

impl AsRef<str> for ApiUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ApiUrl {
    /// Creates a new ApiUrl rooted at the given server URL.
    pub fn new(base_url: &str) -> Self {
        Self(base_url.trim_end_matches('/').to_string()).append_path(API_BASE_PATH)
    }

    /// Append the given path to the URL.
    pub fn append_path(&self, path: &str) -> Self {
        let trimmed_url = self.0.trim_end_matches('/');
        let trimmed_path = path.trim_start_matches('/');
        Self(format!("{}/{}", trimmed_url, trimmed_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_path_trims_slashes() {
        let url = ApiUrl::new("http://localhost:3000/");
        assert_eq!(url.as_ref(), "http://localhost:3000/api/v1");

        let entries = url.append_path("/entries");
        assert_eq!(entries.as_ref(), "http://localhost:3000/api/v1/entries");
    }

    #[test]
    fn append_path_with_id_segment() {
        let url = ApiUrl::new("http://localhost:3000")
            .append_path("entries")
            .append_path("42");
        assert_eq!(url.as_ref(), "http://localhost:3000/api/v1/entries/42");
    }
}
