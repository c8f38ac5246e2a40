//! Versioned schema, applied in order and tracked with `PRAGMA user_version`.

/// Each entry moves the schema one version forward. Never edit a released
/// entry; append a new one.
pub const MIGRATIONS: &[&[&str]] = &[
    // v1: users, posts, likes
    &[
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            user_id INTEGER NOT NULL REFERENCES users(id),
            created_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_posts_user ON posts(user_id)",
        "CREATE TABLE IF NOT EXISTS likes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            post_id INTEGER NOT NULL REFERENCES posts(id),
            created_at TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1 CHECK (active IN (0, 1))
        )",
        "CREATE INDEX IF NOT EXISTS idx_likes_post_active ON likes(post_id, active)",
    ],
    // v2: at most one active like per (user, post)
    &["CREATE UNIQUE INDEX IF NOT EXISTS idx_likes_one_active
        ON likes(user_id, post_id) WHERE active = 1"],
];

/// Schema version after all migrations have run.
pub fn latest_version() -> i64 {
    MIGRATIONS.len() as i64
}
