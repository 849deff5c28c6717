#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub supabase: Supabase,
    pub analytics: Analytics,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// Megabytes.
    pub body_limit: u64,
    /// Seconds.
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Supabase {
    pub jwt_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analytics {
    pub cache_ttl_minutes: i64,
    /// Reject malformed `time_range` tokens instead of coercing them.
    pub strict_time_range: bool,
}

impl Default for Analytics {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: 60,
            strict_time_range: false,
        }
    }
}
