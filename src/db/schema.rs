pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS applications (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    category_id INTEGER REFERENCES categories(id)
);

CREATE TABLE IF NOT EXISTS websites (
    id INTEGER PRIMARY KEY,
    domain TEXT NOT NULL UNIQUE,
    category_id INTEGER REFERENCES categories(id)
);

CREATE TABLE IF NOT EXISTS activity_log (
    id INTEGER PRIMARY KEY,
    app_id INTEGER REFERENCES applications(id),
    site_id INTEGER REFERENCES websites(id),
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    duration_secs INTEGER NOT NULL,
    CHECK ((app_id IS NULL) != (site_id IS NULL))
);

CREATE TABLE IF NOT EXISTS blocked_applications (
    app_id INTEGER PRIMARY KEY REFERENCES applications(id)
);

CREATE TABLE IF NOT EXISTS blocked_websites (
    site_id INTEGER PRIMARY KEY REFERENCES websites(id)
);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT
);

CREATE INDEX IF NOT EXISTS idx_activity_log_start ON activity_log(start_time);
CREATE INDEX IF NOT EXISTS idx_activity_log_app ON activity_log(app_id);
CREATE INDEX IF NOT EXISTS idx_activity_log_site ON activity_log(site_id);
"#;
