//! Route table, logged at startup.

pub const ROUTES: &[(&str, &str, &str)] = &[
    ("GET", "/terms", "All memoized terms, ascending by index"),
    ("GET", "/terms/{index}", "One term, computed on first request"),
    ("GET", "/pi", "Accumulated pi and contributing indexes"),
];

pub fn log_routes() {
    for (method, path, desc) in ROUTES {
        tracing::info!("{:6} {:16} {}", method, path, desc);
    }
}
