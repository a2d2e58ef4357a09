use serde::Deserialize;

/// Main configuration structure for Sumi-Sync
#[derive(Debug, Clone)]
pub struct Config {
    pub sync: SyncConfig,
    pub downstream: DownstreamConfig,
    pub crawler: CrawlerConfig,
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    /// Source entries that deserialized cleanly, in file order
    pub sources: Vec<SourceConfig>,
}

/// Sync cycle behavior
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Maximum number of new URLs attempted per run
    #[serde(rename = "max-new-per-run", default = "default_max_new_per_run")]
    pub max_new_per_run: usize,

    /// Minutes between the start of one cycle's sleep and the next cycle
    #[serde(rename = "interval-minutes", default = "default_interval_minutes")]
    pub interval_minutes: u64,

    /// Polite delay between two import calls (milliseconds)
    #[serde(rename = "import-delay-ms", default = "default_import_delay_ms")]
    pub import_delay_ms: u64,

    /// Discover and log, but never import
    #[serde(rename = "dry-run", default)]
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_new_per_run: default_max_new_per_run(),
            interval_minutes: default_interval_minutes(),
            import_delay_ms: default_import_delay_ms(),
            dry_run: false,
        }
    }
}

/// Downstream content-management API
#[derive(Debug, Clone, Deserialize)]
pub struct DownstreamConfig {
    /// Base URL of the API, e.g. `http://mealie:9000`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Bearer credential; may also be supplied through the environment
    #[serde(rename = "api-token", default)]
    pub api_token: Option<String>,

    /// Connectivity check path
    #[serde(rename = "health-path", default = "default_health_path")]
    pub health_path: String,

    /// Create-from-URL endpoint path
    #[serde(rename = "import-path", default = "default_import_path")]
    pub import_path: String,

    /// Collection endpoint used for searches
    #[serde(rename = "search-path", default = "default_search_path")]
    pub search_path: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts per request, first try included
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff base (milliseconds); retry n waits factor * 2^(n-1)
    #[serde(rename = "backoff-factor-ms", default = "default_backoff_factor_ms")]
    pub backoff_factor_ms: u64,
}

/// Discovery-side HTTP behavior
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Minimum time between requests to the same domain (seconds)
    #[serde(rename = "rate-limit-seconds", default = "default_rate_limit_seconds")]
    pub rate_limit_seconds: f64,

    /// Per-request timeout for feeds and pages (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            rate_limit_seconds: default_rate_limit_seconds(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default = "default_contact_url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: default_contact_url(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the identification string sent with every discovery request
    pub fn user_agent_string(&self) -> String {
        format!(
            "Mozilla/5.0 (compatible; {}/{}; +{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite state database
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// One configured discovery source
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Unique, human readable name
    pub name: String,

    /// Domains this source is restricted to ("example.com", ".example.com")
    #[serde(rename = "allow-domains", default)]
    pub allow_domains: Vec<String>,

    /// Disabled sources are skipped by the coordinator
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Strategy-specific settings, selected by the `type` tag
    #[serde(flatten)]
    pub kind: SourceKind,
}

/// Discovery strategy of a source
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum SourceKind {
    /// A single RSS/Atom feed
    #[serde(rename = "rss")]
    Rss {
        #[serde(rename = "rss-url")]
        rss_url: String,
        #[serde(rename = "max-entries", default = "default_max_entries")]
        max_entries: usize,
    },

    /// A feed located at `index-url` + `rss-suffix`
    #[serde(rename = "rss-suffix")]
    RssSuffix {
        #[serde(rename = "index-url")]
        index_url: String,
        #[serde(rename = "rss-suffix", default = "default_rss_suffix")]
        rss_suffix: String,
        #[serde(rename = "max-entries", default = "default_max_entries")]
        max_entries: usize,
    },

    /// Crawl an index page (and its pagination) for in-domain links
    #[serde(rename = "crawl-index")]
    CrawlIndex {
        #[serde(rename = "index-url")]
        index_url: String,
        #[serde(rename = "max-pages", default = "default_max_pages")]
        max_pages: usize,
    },

    /// Try feeds in order, crawl a fallback page if none is usable
    #[serde(rename = "rss-or-crawl")]
    RssOrCrawl {
        #[serde(rename = "rss-url-candidates", default)]
        rss_url_candidates: Vec<String>,
        #[serde(rename = "crawl-fallback-url", default)]
        crawl_fallback_url: Option<String>,
        #[serde(rename = "max-entries", default = "default_max_entries")]
        max_entries: usize,
        #[serde(rename = "max-pages", default = "default_max_pages")]
        max_pages: usize,
    },

    /// A literal list of URLs
    #[serde(rename = "url-list")]
    UrlList { urls: Vec<String> },
}

impl SourceKind {
    /// All recognized `type` tags
    pub const TYPE_TAGS: &'static [&'static str] =
        &["rss", "rss-suffix", "crawl-index", "rss-or-crawl", "url-list"];

    /// The `type` tag this variant is configured with
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Rss { .. } => "rss",
            Self::RssSuffix { .. } => "rss-suffix",
            Self::CrawlIndex { .. } => "crawl-index",
            Self::RssOrCrawl { .. } => "rss-or-crawl",
            Self::UrlList { .. } => "url-list",
        }
    }

    /// Returns true if this strategy may need to crawl HTML pages
    pub fn may_crawl(&self) -> bool {
        match self {
            Self::CrawlIndex { .. } => true,
            Self::RssOrCrawl {
                crawl_fallback_url, ..
            } => crawl_fallback_url.is_some(),
            _ => false,
        }
    }
}

fn default_max_new_per_run() -> usize {
    10
}

fn default_interval_minutes() -> u64 {
    1440
}

fn default_import_delay_ms() -> u64 {
    2000
}

fn default_health_path() -> String {
    "/api/app/about".to_string()
}

fn default_import_path() -> String {
    "/api/recipes/create-url".to_string()
}

fn default_search_path() -> String {
    "/api/recipes".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_factor_ms() -> u64 {
    2000
}

fn default_rate_limit_seconds() -> f64 {
    2.0
}

fn default_crawler_name() -> String {
    "SumiSync".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_contact_url() -> String {
    "https://github.com/sumi-sync/sumi-sync".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_max_entries() -> usize {
    20
}

fn default_max_pages() -> usize {
    100
}

fn default_rss_suffix() -> String {
    "/rss".to_string()
}
