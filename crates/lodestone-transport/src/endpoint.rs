use std::path::PathBuf;

/// Endpoint name used when none is given.
pub const DEFAULT_ENDPOINT: &str = "lodestone";

/// Resolve an endpoint name to a socket path.
///
/// A bare name (no `/`) lives in the system temp directory, so two servers
/// started with the same name contend for the same socket. Anything containing
/// a path separator is taken as a literal path.
pub fn resolve_endpoint(name: &str) -> PathBuf {
    if name.contains('/') {
        PathBuf::from(name)
    } else {
        std::env::temp_dir().join(name)
    }
}
