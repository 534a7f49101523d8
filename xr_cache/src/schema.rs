diesel::table! {
    counts (cache_key) {
        cache_key -> Text,
        data -> Text,
        fetched_at -> BigInt,
    }
}

diesel::table! {
    searches (cache_key) {
        cache_key -> Text,
        data -> Text,
        fetched_at -> BigInt,
    }
}

diesel::table! {
    tweets (cache_key) {
        cache_key -> Text,
        data -> Text,
        fetched_at -> BigInt,
    }
}

diesel::table! {
    users (cache_key) {
        cache_key -> Text,
        username -> Nullable<Text>,
        data -> Text,
        fetched_at -> BigInt,
    }
}

diesel::allow_tables_to_appear_in_same_query!(counts, searches, tweets, users,);

/// DDL applied on every open. `fetched_at` is Unix milliseconds.
pub(crate) const CREATE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS tweets (
        cache_key TEXT PRIMARY KEY NOT NULL,
        data TEXT NOT NULL,
        fetched_at BIGINT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS users (
        cache_key TEXT PRIMARY KEY NOT NULL,
        username TEXT UNIQUE,
        data TEXT NOT NULL,
        fetched_at BIGINT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS searches (
        cache_key TEXT PRIMARY KEY NOT NULL,
        data TEXT NOT NULL,
        fetched_at BIGINT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS counts (
        cache_key TEXT PRIMARY KEY NOT NULL,
        data TEXT NOT NULL,
        fetched_at BIGINT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS tweets_fetched_at ON tweets (fetched_at);
    CREATE INDEX IF NOT EXISTS users_fetched_at ON users (fetched_at);
    CREATE INDEX IF NOT EXISTS searches_fetched_at ON searches (fetched_at);
    CREATE INDEX IF NOT EXISTS counts_fetched_at ON counts (fetched_at);
";
