// Infrastructure modules
pub mod cache;       // Bounded LRU cache
pub mod media;       // Uploaded image storage
pub mod middleware;  // Request-scoped viewer resolution
pub mod page_cache;  // Rendered page cache with TTL
pub mod pagination;  // Page windows over listings
pub mod privacy;     // Ownership and access rules
pub mod security;    // Password hashing and session tokens
pub mod viewer;      // Viewer context

pub use cache::Cache;
pub use viewer::ViewerContext;
