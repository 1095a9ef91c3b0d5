use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS user_accounts (
            id                  TEXT PRIMARY KEY,
            full_name           TEXT NOT NULL,
            email               TEXT NOT NULL UNIQUE,
            password            TEXT NOT NULL,
            role                TEXT NOT NULL DEFAULT 'member',
            status              TEXT NOT NULL DEFAULT 'pending',
            rejection_reason    TEXT,
            profile_image       TEXT,
            id_document         TEXT,
            approved_by         TEXT REFERENCES user_accounts(id),
            approved_at         TEXT,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_user_accounts_status
            ON user_accounts(status, created_at);

        CREATE TABLE IF NOT EXISTS food_donations (
            id                  TEXT PRIMARY KEY,
            user_id             TEXT NOT NULL REFERENCES user_accounts(id),
            title               TEXT NOT NULL,
            description         TEXT NOT NULL DEFAULT '',
            quantity            TEXT NOT NULL DEFAULT '',
            images              TEXT NOT NULL DEFAULT '[]',
            expires_at          TEXT,
            status              TEXT NOT NULL DEFAULT 'pending',
            approved_by         TEXT REFERENCES user_accounts(id),
            approved_at         TEXT,
            rejection_reason    TEXT,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_food_donations_status
            ON food_donations(status, created_at);

        CREATE TABLE IF NOT EXISTS challenges (
            id              TEXT PRIMARY KEY,
            title           TEXT NOT NULL,
            target_value    INTEGER NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS challenge_participants (
            challenge_id    TEXT NOT NULL REFERENCES challenges(id),
            user_id         TEXT NOT NULL REFERENCES user_accounts(id),
            progress        INTEGER NOT NULL DEFAULT 0,
            completed       INTEGER NOT NULL DEFAULT 0,
            completed_at    TEXT,
            joined_at       TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(challenge_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_participants_challenge
            ON challenge_participants(challenge_id, joined_at);

        CREATE TABLE IF NOT EXISTS sessions (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES user_accounts(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            expires_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_user
            ON sessions(user_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
