use crate::Database;
use crate::models::{
    ChallengeRow, ChallengeSummaryRow, DonationWithOwnerRow, ParticipantRow, UserAccountRow,
};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

const USER_COLUMNS: &str = "id, full_name, email, password, role, status, rejection_reason, \
     profile_image, id_document, approved_by, approved_at, created_at";

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserAccountRow> {
    Ok(UserAccountRow {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: row.get(4)?,
        status: row.get(5)?,
        rejection_reason: row.get(6)?,
        profile_image: row.get(7)?,
        id_document: row.get(8)?,
        approved_by: row.get(9)?,
        approved_at: row.get(10)?,
        created_at: row.get(11)?,
    })
}

impl Database {
    // -- User accounts --

    pub fn create_user(
        &self,
        id: &str,
        full_name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
        status: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO user_accounts (id, full_name, email, password, role, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, full_name, email, password_hash, role, status],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserAccountRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserAccountRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn count_admins(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM user_accounts WHERE role = 'admin'",
                [],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    pub fn list_pending_users(&self) -> Result<Vec<UserAccountRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM user_accounts
                  WHERE status = 'pending' ORDER BY created_at"
            ))?;
            let rows = stmt
                .query_map([], map_user)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// Guarded transition pending -> active. Returns false when the row does
    /// not exist or has already left the pending state.
    pub fn approve_user(&self, id: &str, approver_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE user_accounts
                    SET status = 'active', approved_by = ?2, approved_at = datetime('now')
                  WHERE id = ?1 AND status = 'pending'",
                rusqlite::params![id, approver_id],
            )?;
            Ok(n == 1)
        })
    }

    /// Guarded transition pending -> rejected. The non-empty reason check is
    /// enforced by the caller before this runs.
    pub fn reject_user(&self, id: &str, reason: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE user_accounts
                    SET status = 'rejected', rejection_reason = ?2
                  WHERE id = ?1 AND status = 'pending'",
                rusqlite::params![id, reason],
            )?;
            Ok(n == 1)
        })
    }

    pub fn update_profile(&self, id: &str, full_name: &str, email: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE user_accounts SET full_name = ?2, email = ?3 WHERE id = ?1",
                rusqlite::params![id, full_name, email],
            )?;
            Ok(())
        })
    }

    pub fn update_password(&self, id: &str, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE user_accounts SET password = ?2 WHERE id = ?1",
                rusqlite::params![id, password_hash],
            )?;
            Ok(())
        })
    }

    pub fn update_profile_image(&self, id: &str, file_name: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE user_accounts SET profile_image = ?2 WHERE id = ?1",
                rusqlite::params![id, file_name],
            )?;
            Ok(())
        })
    }

    // -- Food donations --

    pub fn list_pending_donations(&self) -> Result<Vec<DonationWithOwnerRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT d.id, d.title, d.quantity, d.images, d.expires_at, d.status,
                        d.created_at, u.full_name, u.email
                   FROM food_donations d
                   JOIN user_accounts u ON u.id = d.user_id
                  WHERE d.status = 'pending'
                  ORDER BY d.created_at",
            )?;
            let rows = stmt
                .query_map([], map_donation_with_owner)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn get_donation_with_owner(&self, id: &str) -> Result<Option<DonationWithOwnerRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT d.id, d.title, d.quantity, d.images, d.expires_at, d.status,
                            d.created_at, u.full_name, u.email
                       FROM food_donations d
                       JOIN user_accounts u ON u.id = d.user_id
                      WHERE d.id = ?1",
                    [id],
                    map_donation_with_owner,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Guarded transition pending -> approved.
    pub fn approve_donation(&self, id: &str, approver_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE food_donations
                    SET status = 'approved', approved_by = ?2, approved_at = datetime('now')
                  WHERE id = ?1 AND status = 'pending'",
                rusqlite::params![id, approver_id],
            )?;
            Ok(n == 1)
        })
    }

    /// Guarded transition pending -> rejected.
    pub fn reject_donation(&self, id: &str, reason: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE food_donations
                    SET status = 'rejected', rejection_reason = ?2
                  WHERE id = ?1 AND status = 'pending'",
                rusqlite::params![id, reason],
            )?;
            Ok(n == 1)
        })
    }

    // -- Challenges --

    pub fn list_challenges(&self) -> Result<Vec<ChallengeSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.title, c.target_value, c.created_at,
                        (SELECT COUNT(*) FROM challenge_participants p
                          WHERE p.challenge_id = c.id) AS participant_count
                   FROM challenges c
                  ORDER BY c.created_at",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ChallengeSummaryRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        target_value: row.get(2)?,
                        created_at: row.get(3)?,
                        participant_count: row.get(4)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn get_challenge(&self, id: &str) -> Result<Option<ChallengeRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, title, target_value, created_at FROM challenges WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(ChallengeRow {
                            id: row.get(0)?,
                            title: row.get(1)?,
                            target_value: row.get(2)?,
                            created_at: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_participants(&self, challenge_id: &str) -> Result<Vec<ParticipantRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.user_id, u.full_name, u.email, p.progress, p.completed,
                        p.completed_at, p.joined_at
                   FROM challenge_participants p
                   JOIN user_accounts u ON u.id = p.user_id
                  WHERE p.challenge_id = ?1
                  ORDER BY p.joined_at",
            )?;
            let rows = stmt
                .query_map([challenge_id], |row| {
                    Ok(ParticipantRow {
                        user_id: row.get(0)?,
                        full_name: row.get(1)?,
                        email: row.get(2)?,
                        progress: row.get(3)?,
                        completed: row.get::<_, i64>(4)? != 0,
                        completed_at: row.get(5)?,
                        joined_at: row.get(6)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    // -- Sessions --

    /// Insert a session row. `ttl_days` may be negative, which is used by the
    /// expiry tests.
    pub fn create_session(&self, id: &str, user_id: &str, ttl_days: i64) -> Result<()> {
        let modifier = format!("{ttl_days:+} days");
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, user_id, expires_at)
                 VALUES (?1, ?2, datetime('now', ?3))",
                rusqlite::params![id, user_id, modifier],
            )?;
            Ok(())
        })
    }

    /// Resolve a session token to its user, ignoring expired sessions.
    pub fn get_session_user(&self, session_id: &str) -> Result<Option<UserAccountRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM sessions s
                           JOIN user_accounts u ON u.id = s.user_id
                          WHERE s.id = ?1 AND s.expires_at > datetime('now')",
                        user_columns_prefixed("u")
                    ),
                    [session_id],
                    map_user,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_session(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

fn user_columns_prefixed(alias: &str) -> String {
    USER_COLUMNS
        .split(", ")
        .map(|c| format!("{alias}.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserAccountRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM user_accounts WHERE email = ?1"),
            [email],
            map_user,
        )
        .optional()?;
    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserAccountRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM user_accounts WHERE id = ?1"),
            [id],
            map_user,
        )
        .optional()?;
    Ok(row)
}

fn map_donation_with_owner(row: &Row<'_>) -> rusqlite::Result<DonationWithOwnerRow> {
    Ok(DonationWithOwnerRow {
        id: row.get(0)?,
        title: row.get(1)?,
        quantity: row.get(2)?,
        images: row.get(3)?,
        expires_at: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
        owner_name: row.get(7)?,
        owner_email: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed_user(db: &Database, id: &str, email: &str, role: &str, status: &str) {
        db.create_user(id, "Test User", email, "$argon2id$fake", role, status)
            .unwrap();
    }

    fn seed_donation(db: &Database, id: &str, user_id: &str, status: &str) {
        db.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO food_donations (id, user_id, title, quantity, status)
                 VALUES (?1, ?2, 'Bread loaves', '12', ?3)",
                rusqlite::params![id, user_id, status],
            )?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn approve_donation_records_approver_and_timestamp() {
        let db = test_db();
        seed_user(&db, "u1", "donor@example.com", "member", "active");
        seed_user(&db, "a1", "admin@example.com", "admin", "active");
        seed_donation(&db, "d1", "u1", "pending");

        assert!(db.approve_donation("d1", "a1").unwrap());

        let (status, approved_by, approved_at): (String, Option<String>, Option<String>) = db
            .with_conn(|conn| {
                let row = conn.query_row(
                    "SELECT status, approved_by, approved_at FROM food_donations WHERE id = 'd1'",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )?;
                Ok(row)
            })
            .unwrap();
        assert_eq!(status, "approved");
        assert_eq!(approved_by.as_deref(), Some("a1"));
        assert!(approved_at.is_some());
    }

    #[test]
    fn second_approval_fails_the_pending_guard() {
        let db = test_db();
        seed_user(&db, "u1", "donor@example.com", "member", "active");
        seed_user(&db, "a1", "admin@example.com", "admin", "active");
        seed_donation(&db, "d1", "u1", "pending");

        assert!(db.approve_donation("d1", "a1").unwrap());
        assert!(!db.approve_donation("d1", "a1").unwrap());
        assert!(!db.reject_donation("d1", "late reason").unwrap());
    }

    #[test]
    fn reject_donation_stores_the_reason() {
        let db = test_db();
        seed_user(&db, "u1", "donor@example.com", "member", "active");
        seed_donation(&db, "d1", "u1", "pending");

        assert!(db.reject_donation("d1", "photo does not match").unwrap());

        let row = db.get_donation_with_owner("d1").unwrap().unwrap();
        assert_eq!(row.status, "rejected");
        assert_eq!(row.owner_email, "donor@example.com");
    }

    #[test]
    fn approving_a_missing_donation_returns_false() {
        let db = test_db();
        seed_user(&db, "a1", "admin@example.com", "admin", "active");
        assert!(!db.approve_donation("nope", "a1").unwrap());
    }

    #[test]
    fn pending_users_are_listed_and_transitioned() {
        let db = test_db();
        seed_user(&db, "a1", "admin@example.com", "admin", "active");
        seed_user(&db, "u1", "new1@example.com", "member", "pending");
        seed_user(&db, "u2", "new2@example.com", "member", "pending");

        assert_eq!(db.list_pending_users().unwrap().len(), 2);

        assert!(db.approve_user("u1", "a1").unwrap());
        assert!(db.reject_user("u2", "unreadable ID document").unwrap());
        assert!(db.list_pending_users().unwrap().is_empty());

        let u1 = db.get_user_by_id("u1").unwrap().unwrap();
        assert_eq!(u1.status, "active");
        assert_eq!(u1.approved_by.as_deref(), Some("a1"));
        assert!(u1.approved_at.is_some());

        let u2 = db.get_user_by_id("u2").unwrap().unwrap();
        assert_eq!(u2.status, "rejected");
        assert_eq!(u2.rejection_reason.as_deref(), Some("unreadable ID document"));
    }

    #[test]
    fn session_lookup_honors_expiry() {
        let db = test_db();
        seed_user(&db, "a1", "admin@example.com", "admin", "active");

        db.create_session("live", "a1", 7).unwrap();
        db.create_session("stale", "a1", -1).unwrap();

        assert!(db.get_session_user("live").unwrap().is_some());
        assert!(db.get_session_user("stale").unwrap().is_none());
        assert!(db.get_session_user("unknown").unwrap().is_none());

        db.delete_session("live").unwrap();
        assert!(db.get_session_user("live").unwrap().is_none());
    }

    #[test]
    fn participant_listing_joins_names_and_progress() {
        let db = test_db();
        seed_user(&db, "u1", "walker@example.com", "member", "active");
        db.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO challenges (id, title, target_value) VALUES ('c1', 'Share 10 meals', 10)",
                [],
            )?;
            conn.execute(
                "INSERT INTO challenge_participants (challenge_id, user_id, progress, completed)
                 VALUES ('c1', 'u1', 4, 0)",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let challenges = db.list_challenges().unwrap();
        assert_eq!(challenges.len(), 1);
        assert_eq!(challenges[0].participant_count, 1);

        let participants = db.list_participants("c1").unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].full_name, "Test User");
        assert_eq!(participants[0].progress, 4);
        assert!(!participants[0].completed);

        assert!(db.get_challenge("c2").unwrap().is_none());
    }
}
