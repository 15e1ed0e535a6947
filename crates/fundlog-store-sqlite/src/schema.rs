//! SQL schema for the fundlog SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Current state. `name` is the import key but is not unique-enforced.
CREATE TABLE IF NOT EXISTS funds (
    fund_id        TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    amc_name       TEXT,
    primary_badge  TEXT,
    market_cap     TEXT NOT NULL,
    cagr           REAL,
    equity_size    REAL NOT NULL,
    high_return    REAL NOT NULL,
    low_return     REAL NOT NULL,
    std_deviation  REAL NOT NULL,
    sharpe_ratio   REAL NOT NULL,
    sortino_ratio  REAL NOT NULL,
    beta           REAL NOT NULL,
    alpha          REAL NOT NULL,
    r_squared      REAL NOT NULL,
    expense_ratio  REAL NOT NULL,
    nav            REAL NOT NULL,
    aum            REAL NOT NULL,
    lock_in_period TEXT,
    updated_at     TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

CREATE TABLE IF NOT EXISTS fund_articles (
    article_id TEXT PRIMARY KEY,
    fund_id    TEXT NOT NULL REFERENCES funds(fund_id) ON DELETE CASCADE,
    title      TEXT NOT NULL,
    summary    TEXT NOT NULL,
    content    TEXT NOT NULL,
    date       TEXT NOT NULL        -- set at creation, never updated
);

-- One row per write. `fund_id` is deliberately not a foreign key so history
-- survives deletion of the fund.
CREATE TABLE IF NOT EXISTS fund_history (
    history_id     TEXT PRIMARY KEY,
    fund_id        TEXT NOT NULL,
    history_date   TEXT NOT NULL,
    change_kind    TEXT NOT NULL,   -- 'created' | 'updated' | 'deleted'
    updated_at     TEXT NOT NULL,
    name           TEXT NOT NULL,
    amc_name       TEXT,
    primary_badge  TEXT,
    market_cap     TEXT NOT NULL,
    cagr           REAL,
    equity_size    REAL NOT NULL,
    high_return    REAL NOT NULL,
    low_return     REAL NOT NULL,
    std_deviation  REAL NOT NULL,
    sharpe_ratio   REAL NOT NULL,
    sortino_ratio  REAL NOT NULL,
    beta           REAL NOT NULL,
    alpha          REAL NOT NULL,
    r_squared      REAL NOT NULL,
    expense_ratio  REAL NOT NULL,
    nav            REAL NOT NULL,
    aum            REAL NOT NULL,
    lock_in_period TEXT
);

CREATE INDEX IF NOT EXISTS funds_name_idx         ON funds(name);
CREATE INDEX IF NOT EXISTS fund_articles_fund_idx ON fund_articles(fund_id, date);
CREATE INDEX IF NOT EXISTS fund_history_fund_idx  ON fund_history(fund_id, history_date);

PRAGMA user_version = 1;
";
