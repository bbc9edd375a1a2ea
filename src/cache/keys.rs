//! Cache key definitions.
//!
//! Every key the application writes is built here so that the read path and
//! the invalidation path can never disagree on a key's shape.

use crate::application::pagination::PageRequest;

/// Builds namespaced cache keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// A single post, as returned by `GET /posts/{id}`.
    pub fn post_item(&self, id: i64) -> String {
        format!("{}posts:item:id={id}", self.prefix)
    }

    /// One page of the post list under list generation `version`.
    pub fn post_list(&self, version: u64, page: PageRequest) -> String {
        format!(
            "{}posts:list:v={version}:page={}:per_page={}",
            self.prefix, page.page, page.per_page
        )
    }

    /// Counter whose bump orphans every cached list page.
    pub fn post_list_version(&self) -> String {
        format!("{}posts:list:version", self.prefix)
    }

    /// Short-lived key written by the startup self-check.
    pub fn self_check(&self) -> String {
        format!("{}health:self_check", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_carry_prefix_and_arguments() {
        let keys = CacheKeys::new("mb:");
        assert_eq!(keys.post_item(42), "mb:posts:item:id=42");
        assert_eq!(
            keys.post_list(3, PageRequest { page: 2, per_page: 5 }),
            "mb:posts:list:v=3:page=2:per_page=5"
        );
        assert_eq!(keys.post_list_version(), "mb:posts:list:version");
    }

    #[test]
    fn list_keys_differ_across_versions() {
        let keys = CacheKeys::new("");
        let page = PageRequest::default();
        assert_ne!(keys.post_list(0, page), keys.post_list(1, page));
    }

    #[test]
    fn version_key_is_not_a_list_page() {
        let keys = CacheKeys::new("mb:");
        assert!(!keys.post_list_version().contains("page="));
        assert!(keys.self_check().starts_with("mb:"));
    }
}
