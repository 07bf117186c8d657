//! Per-agent persistent state store
//!
//! Pure storage over one SQLite database per agent: relationships, goals,
//! secrets, personality, resources, message logs, audit log, and metadata.
//! No business rules live here; the turn engine owns those.
//!
//! The handle is explicitly constructed and injected into the agent. Nothing
//! in this module is a process-wide singleton, so one process can host
//! several agents against separate database files.

pub mod types;

use crate::errors::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use types::{
    AuditLogEntry, Goal, GoalStatus, IncomingMessage, MessageType, OutgoingMessage,
    PersonalityTrait, Relationship, Resolution, Resource, Secret,
};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS relationships (
  race_id TEXT PRIMARY KEY,
  trust_level INTEGER NOT NULL DEFAULT 0,
  is_ally INTEGER NOT NULL DEFAULT 0 CHECK (is_ally IN (0, 1)),
  is_enemy INTEGER NOT NULL DEFAULT 0 CHECK (is_enemy IN (0, 1)),
  notes TEXT,
  last_updated_day INTEGER
);

CREATE TABLE IF NOT EXISTS goals (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  description TEXT NOT NULL,
  priority INTEGER NOT NULL,
  status TEXT NOT NULL CHECK (status IN ('active', 'completed', 'abandoned')),
  created_day INTEGER NOT NULL,
  completed_day INTEGER
);

CREATE TABLE IF NOT EXISTS secrets (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  content TEXT NOT NULL,
  created_day INTEGER NOT NULL,
  revealed INTEGER NOT NULL DEFAULT 0 CHECK (revealed IN (0, 1))
);

CREATE TABLE IF NOT EXISTS personality_state (
  key TEXT PRIMARY KEY,
  value REAL NOT NULL,
  last_updated_day INTEGER
);

CREATE TABLE IF NOT EXISTS resources (
  resource_type TEXT PRIMARY KEY,
  amount INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS incoming_messages (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  from_race TEXT NOT NULL,
  message_type TEXT NOT NULL CHECK (message_type IN ('public', 'secret')),
  content TEXT NOT NULL,
  code TEXT,
  day_number INTEGER NOT NULL,
  resolution TEXT CHECK (
    resolution IN ('pending', 'executed-success', 'executed-fail', 'rejected')
    OR resolution IS NULL
  ),
  resolution_detail TEXT,
  created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_incoming_resolution
  ON incoming_messages(resolution, day_number, created_at);
CREATE INDEX IF NOT EXISTS idx_incoming_day
  ON incoming_messages(day_number, created_at);

CREATE TABLE IF NOT EXISTS outgoing_messages (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  to_race TEXT NOT NULL,
  message_type TEXT NOT NULL CHECK (message_type IN ('public', 'secret')),
  content TEXT NOT NULL,
  code TEXT,
  day_number INTEGER NOT NULL,
  created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS audit_log (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  day_number INTEGER NOT NULL,
  action_type TEXT NOT NULL,
  actor_race TEXT,
  details TEXT,
  created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS metadata (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL
);
";

/// Starting ledger handed to every freshly bootstrapped (or reset) agent
pub const STARTING_RESOURCES: [(&str, i64); 3] =
    [("energy", 1000), ("intelligence", 500), ("influence", 500)];

/// Handle over one agent's SQLite database
pub struct StateStore {
    conn: Mutex<Connection>,
}

impl StateStore {
    /// Open (creating if needed) the database at `path` and apply the schema
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(StateStore {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(StateStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock means a panic mid-statement; nothing to salvage.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Ensure a relationship row per peer, the starting resource allocation,
    /// and metadata defaults. Idempotent: existing rows are left alone.
    pub fn bootstrap(&self, race_id: &str, peers: &[&str]) -> Result<()> {
        let conn = self.lock();

        for peer in peers {
            conn.execute(
                "INSERT OR IGNORE INTO relationships
                   (race_id, trust_level, is_ally, is_enemy, notes, last_updated_day)
                 VALUES (?1, 0, 0, 0, NULL, NULL)",
                params![peer],
            )?;
        }

        for (resource_type, amount) in STARTING_RESOURCES {
            conn.execute(
                "INSERT OR IGNORE INTO resources (resource_type, amount) VALUES (?1, ?2)",
                params![resource_type, amount],
            )?;
        }

        conn.execute(
            "INSERT OR IGNORE INTO metadata (key, value) VALUES ('race_id', ?1)",
            params![race_id],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO metadata (key, value) VALUES ('current_day', '0')",
            [],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO metadata (key, value) VALUES ('last_turn_at', '0')",
            [],
        )?;

        Ok(())
    }

    // --- metadata ---

    pub fn current_day(&self) -> Result<i64> {
        let conn = self.lock();
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'current_day'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    pub fn last_turn_at(&self) -> Result<i64> {
        let conn = self.lock();
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'last_turn_at'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    /// Increment the day counter and stamp the turn time. The single point
    /// that marks a turn as completed.
    pub fn advance_day(&self, now_ms: i64) -> Result<i64> {
        let conn = self.lock();
        let current: Option<String> = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'current_day'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let next = current.and_then(|v| v.parse::<i64>().ok()).unwrap_or(0) + 1;

        conn.execute(
            "INSERT INTO metadata (key, value) VALUES ('current_day', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![next.to_string()],
        )?;
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES ('last_turn_at', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![now_ms.to_string()],
        )?;
        Ok(next)
    }

    // --- messages ---

    /// Store a received message, stamped with our own current day. Code-bearing
    /// messages start `pending`; plain messages carry no resolution at all.
    pub fn insert_incoming(
        &self,
        from_race: &str,
        message_type: MessageType,
        content: &str,
        code: Option<&str>,
        day_number: i64,
        now_ms: i64,
    ) -> Result<i64> {
        let resolution = code.map(|_| Resolution::Pending.as_str());
        let conn = self.lock();
        conn.execute(
            "INSERT INTO incoming_messages
               (from_race, message_type, content, code, day_number, resolution, resolution_detail, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7)",
            params![from_race, message_type.as_str(), content, code, day_number, resolution, now_ms],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_outgoing(
        &self,
        to_race: &str,
        message_type: MessageType,
        content: &str,
        code: Option<&str>,
        day_number: i64,
        now_ms: i64,
    ) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO outgoing_messages
               (to_race, message_type, content, code, day_number, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![to_race, message_type.as_str(), content, code, day_number, now_ms],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Code-bearing messages still awaiting a decision, oldest first
    pub fn pending_code_messages(&self) -> Result<Vec<IncomingMessage>> {
        self.query_incoming(
            "SELECT id, from_race, message_type, content, code, day_number,
                    resolution, resolution_detail, created_at
             FROM incoming_messages
             WHERE resolution = 'pending'
             ORDER BY day_number ASC, created_at ASC",
            [],
        )
    }

    /// All messages stamped with the given day, for narrative context
    pub fn messages_for_day(&self, day: i64) -> Result<Vec<IncomingMessage>> {
        self.query_incoming(
            "SELECT id, from_race, message_type, content, code, day_number,
                    resolution, resolution_detail, created_at
             FROM incoming_messages
             WHERE day_number = ?1
             ORDER BY created_at ASC",
            params![day],
        )
    }

    pub fn recent_incoming(&self, limit: usize) -> Result<Vec<IncomingMessage>> {
        self.query_incoming(
            "SELECT id, from_race, message_type, content, code, day_number,
                    resolution, resolution_detail, created_at
             FROM incoming_messages
             ORDER BY day_number DESC, created_at DESC
             LIMIT ?1",
            params![limit as i64],
        )
    }

    pub fn all_incoming(&self) -> Result<Vec<IncomingMessage>> {
        self.query_incoming(
            "SELECT id, from_race, message_type, content, code, day_number,
                    resolution, resolution_detail, created_at
             FROM incoming_messages
             ORDER BY day_number ASC, created_at ASC",
            [],
        )
    }

    pub fn get_incoming(&self, id: i64) -> Result<Option<IncomingMessage>> {
        let rows = self.query_incoming(
            "SELECT id, from_race, message_type, content, code, day_number,
                    resolution, resolution_detail, created_at
             FROM incoming_messages
             WHERE id = ?1",
            params![id],
        )?;
        Ok(rows.into_iter().next())
    }

    fn query_incoming<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<IncomingMessage>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            let message_type: String = row.get(2)?;
            let resolution: Option<String> = row.get(6)?;
            Ok(IncomingMessage {
                id: row.get(0)?,
                from_race: row.get(1)?,
                message_type: MessageType::parse(&message_type).unwrap_or(MessageType::Public),
                content: row.get(3)?,
                code: row.get(4)?,
                day_number: row.get(5)?,
                resolution: resolution.as_deref().and_then(Resolution::parse),
                resolution_detail: row.get(7)?,
                created_at: row.get(8)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn recent_outgoing(&self, limit: usize) -> Result<Vec<OutgoingMessage>> {
        self.query_outgoing(
            "SELECT id, to_race, message_type, content, code, day_number, created_at
             FROM outgoing_messages
             ORDER BY day_number DESC, created_at DESC
             LIMIT ?1",
            params![limit as i64],
        )
    }

    pub fn all_outgoing(&self) -> Result<Vec<OutgoingMessage>> {
        self.query_outgoing(
            "SELECT id, to_race, message_type, content, code, day_number, created_at
             FROM outgoing_messages
             ORDER BY day_number ASC, created_at ASC",
            [],
        )
    }

    fn query_outgoing<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<OutgoingMessage>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            let message_type: String = row.get(2)?;
            Ok(OutgoingMessage {
                id: row.get(0)?,
                to_race: row.get(1)?,
                message_type: MessageType::parse(&message_type).unwrap_or(MessageType::Public),
                content: row.get(3)?,
                code: row.get(4)?,
                day_number: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Move a pending message to a terminal resolution. Forward-only: returns
    /// false (and writes nothing) when the message is missing or already
    /// resolved.
    pub fn resolve_message(
        &self,
        id: i64,
        resolution: Resolution,
        detail: &str,
    ) -> Result<bool> {
        debug_assert!(resolution.is_terminal());
        let conn = self.lock();
        let updated = conn.execute(
            "UPDATE incoming_messages
             SET resolution = ?1, resolution_detail = ?2
             WHERE id = ?3 AND resolution = 'pending'",
            params![resolution.as_str(), detail, id],
        )?;
        Ok(updated == 1)
    }

    // --- relationships ---

    pub fn relationships(&self) -> Result<Vec<Relationship>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT race_id, trust_level, is_ally, is_enemy, notes, last_updated_day
             FROM relationships
             ORDER BY race_id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Relationship {
                race_id: row.get(0)?,
                trust_level: row.get(1)?,
                is_ally: row.get::<_, i64>(2)? != 0,
                is_enemy: row.get::<_, i64>(3)? != 0,
                notes: row.get(4)?,
                last_updated_day: row.get(5)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Apply a signed trust delta; notes overwrite only when provided.
    /// Returns false when no relationship row exists for the peer.
    pub fn apply_trust_delta(
        &self,
        race_id: &str,
        delta: i64,
        notes: Option<&str>,
        day: i64,
    ) -> Result<bool> {
        let conn = self.lock();
        let updated = conn.execute(
            "UPDATE relationships
             SET trust_level = trust_level + ?1,
                 notes = COALESCE(?2, notes),
                 last_updated_day = ?3
             WHERE race_id = ?4",
            params![delta, notes, day, race_id],
        )?;
        Ok(updated == 1)
    }

    // --- goals / secrets / personality ---

    pub fn active_goals(&self) -> Result<Vec<Goal>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, description, priority, status, created_day, completed_day
             FROM goals
             WHERE status = 'active'
             ORDER BY priority DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            let status: String = row.get(3)?;
            Ok(Goal {
                id: row.get(0)?,
                description: row.get(1)?,
                priority: row.get(2)?,
                status: match status.as_str() {
                    "completed" => GoalStatus::Completed,
                    "abandoned" => GoalStatus::Abandoned,
                    _ => GoalStatus::Active,
                },
                created_day: row.get(4)?,
                completed_day: row.get(5)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn insert_goal(&self, description: &str, priority: i64, day: i64) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO goals (description, priority, status, created_day)
             VALUES (?1, ?2, 'active', ?3)",
            params![description, priority, day],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_secret(&self, content: &str, day: i64) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO secrets (content, created_day, revealed) VALUES (?1, ?2, 0)",
            params![content, day],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn secrets(&self) -> Result<Vec<Secret>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, content, created_day, revealed FROM secrets ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Secret {
                id: row.get(0)?,
                content: row.get(1)?,
                created_day: row.get(2)?,
                revealed: row.get::<_, i64>(3)? != 0,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Last write wins
    pub fn upsert_personality(&self, key: &str, value: f64, day: i64) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO personality_state (key, value, last_updated_day)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE
               SET value = excluded.value, last_updated_day = excluded.last_updated_day",
            params![key, value, day],
        )?;
        Ok(())
    }

    pub fn personality(&self) -> Result<Vec<PersonalityTrait>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT key, value, last_updated_day FROM personality_state ORDER BY key ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(PersonalityTrait {
                key: row.get(0)?,
                value: row.get(1)?,
                last_updated_day: row.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    // --- resources ---

    pub fn resources(&self) -> Result<Vec<Resource>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT resource_type, amount FROM resources ORDER BY resource_type ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Resource {
                resource_type: row.get(0)?,
                amount: row.get(1)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn resource_amount(&self, resource_type: &str) -> Result<i64> {
        let conn = self.lock();
        let amount: Option<i64> = conn
            .query_row(
                "SELECT amount FROM resources WHERE resource_type = ?1",
                params![resource_type],
                |row| row.get(0),
            )
            .optional()?;
        Ok(amount.unwrap_or(0))
    }

    /// Running ledger: the amount may transiently go negative, gifts debit
    /// unconditionally.
    pub fn adjust_resource(&self, resource_type: &str, delta: i64) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO resources (resource_type, amount) VALUES (?1, ?2)
             ON CONFLICT(resource_type) DO UPDATE SET amount = amount + excluded.amount",
            params![resource_type, delta],
        )?;
        Ok(())
    }

    // --- audit log ---

    pub fn append_audit(
        &self,
        day: i64,
        action_type: &str,
        actor_race: Option<&str>,
        details: &serde_json::Value,
        now_ms: i64,
    ) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO audit_log (day_number, action_type, actor_race, details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![day, action_type, actor_race, details.to_string(), now_ms],
        )?;
        Ok(())
    }

    pub fn audit_entries(&self, day: i64) -> Result<Vec<AuditLogEntry>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, day_number, action_type, actor_race, details, created_at
             FROM audit_log
             WHERE day_number = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![day], |row| {
            Ok(AuditLogEntry {
                id: row.get(0)?,
                day_number: row.get(1)?,
                action_type: row.get(2)?,
                actor_race: row.get(3)?,
                details: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    // --- reset ---

    /// Wipe everything and re-run bootstrap: day 0, zeroed relationships,
    /// starting resource allocation.
    pub fn reset(&self, race_id: &str, peers: &[&str]) -> Result<()> {
        {
            let conn = self.lock();
            conn.execute_batch(
                "DELETE FROM incoming_messages;
                 DELETE FROM outgoing_messages;
                 DELETE FROM audit_log;
                 DELETE FROM resources;
                 DELETE FROM relationships;
                 DELETE FROM goals;
                 DELETE FROM secrets;
                 DELETE FROM personality_state;
                 DELETE FROM metadata;",
            )?;
        }
        self.bootstrap(race_id, peers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> StateStore {
        let store = StateStore::open_in_memory().unwrap();
        store
            .bootstrap("zephyrians", &["kromath", "valyrians"])
            .unwrap();
        store
    }

    #[test]
    fn test_bootstrap_relationships() {
        let store = store();
        let rels = store.relationships().unwrap();
        assert_eq!(rels.len(), 2);
        for rel in rels {
            assert_eq!(rel.trust_level, 0);
            assert!(!rel.is_ally);
            assert!(!rel.is_enemy);
            assert!(rel.notes.is_none());
        }
    }

    #[test]
    fn test_bootstrap_is_idempotent() {
        let store = store();
        store.apply_trust_delta("kromath", 7, None, 1).unwrap();
        store
            .bootstrap("zephyrians", &["kromath", "valyrians"])
            .unwrap();

        let rels = store.relationships().unwrap();
        let kromath = rels.iter().find(|r| r.race_id == "kromath").unwrap();
        assert_eq!(kromath.trust_level, 7);
    }

    #[test]
    fn test_starting_resources() {
        let store = store();
        assert_eq!(store.resource_amount("energy").unwrap(), 1000);
        assert_eq!(store.resource_amount("intelligence").unwrap(), 500);
        assert_eq!(store.resource_amount("influence").unwrap(), 500);
    }

    #[test]
    fn test_day_advances_by_one() {
        let store = store();
        assert_eq!(store.current_day().unwrap(), 0);
        assert_eq!(store.advance_day(1000).unwrap(), 1);
        assert_eq!(store.current_day().unwrap(), 1);
        assert_eq!(store.last_turn_at().unwrap(), 1000);
    }

    #[test]
    fn test_incoming_code_message_starts_pending() {
        let store = store();
        let id = store
            .insert_incoming("kromath", MessageType::Secret, "run this", Some("echo hi"), 0, 10)
            .unwrap();

        let msg = store.get_incoming(id).unwrap().unwrap();
        assert!(msg.is_pending());
        assert_eq!(msg.code.as_deref(), Some("echo hi"));
    }

    #[test]
    fn test_plain_message_has_no_resolution() {
        let store = store();
        let id = store
            .insert_incoming("kromath", MessageType::Public, "greetings", None, 0, 10)
            .unwrap();

        let msg = store.get_incoming(id).unwrap().unwrap();
        assert!(msg.resolution.is_none());
        assert!(store.pending_code_messages().unwrap().is_empty());
    }

    #[test]
    fn test_resolution_is_forward_only() {
        let store = store();
        let id = store
            .insert_incoming("kromath", MessageType::Secret, "x", Some("true"), 0, 10)
            .unwrap();

        assert!(store
            .resolve_message(id, Resolution::Rejected, "untrusted")
            .unwrap());
        // Second transition must not apply
        assert!(!store
            .resolve_message(id, Resolution::ExecutedSuccess, "late")
            .unwrap());

        let msg = store.get_incoming(id).unwrap().unwrap();
        assert_eq!(msg.resolution, Some(Resolution::Rejected));
        assert_eq!(msg.resolution_detail.as_deref(), Some("untrusted"));
    }

    #[test]
    fn test_resolve_missing_message() {
        let store = store();
        assert!(!store
            .resolve_message(999, Resolution::ExecutedFail, "nope")
            .unwrap());
    }

    #[test]
    fn test_pending_order_oldest_first() {
        let store = store();
        store
            .insert_incoming("kromath", MessageType::Secret, "b", Some("b"), 2, 50)
            .unwrap();
        store
            .insert_incoming("kromath", MessageType::Secret, "a", Some("a"), 1, 99)
            .unwrap();

        let pending = store.pending_code_messages().unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].content, "a");
        assert_eq!(pending[1].content, "b");
    }

    #[test]
    fn test_trust_delta_and_notes() {
        let store = store();
        assert!(store
            .apply_trust_delta("kromath", -3, Some("stole from us"), 4)
            .unwrap());
        assert!(store.apply_trust_delta("kromath", 1, None, 5).unwrap());

        let rels = store.relationships().unwrap();
        let kromath = rels.iter().find(|r| r.race_id == "kromath").unwrap();
        assert_eq!(kromath.trust_level, -2);
        // Notes survive a delta without notes
        assert_eq!(kromath.notes.as_deref(), Some("stole from us"));
        assert_eq!(kromath.last_updated_day, Some(5));
    }

    #[test]
    fn test_trust_delta_unknown_peer() {
        let store = store();
        assert!(!store.apply_trust_delta("borg", 5, None, 0).unwrap());
    }

    #[test]
    fn test_goals_ordered_by_priority() {
        let store = store();
        store.insert_goal("minor", 1, 0).unwrap();
        store.insert_goal("urgent", 9, 0).unwrap();

        let goals = store.active_goals().unwrap();
        assert_eq!(goals[0].description, "urgent");
        assert_eq!(goals[1].description, "minor");
    }

    #[test]
    fn test_personality_last_write_wins() {
        let store = store();
        store.upsert_personality("aggression", 0.2, 1).unwrap();
        store.upsert_personality("aggression", 0.9, 2).unwrap();

        let traits = store.personality().unwrap();
        assert_eq!(traits.len(), 1);
        assert!((traits[0].value - 0.9).abs() < f64::EPSILON);
        assert_eq!(traits[0].last_updated_day, Some(2));
    }

    #[test]
    fn test_resource_may_go_negative() {
        let store = store();
        store.adjust_resource("energy", -1500).unwrap();
        assert_eq!(store.resource_amount("energy").unwrap(), -500);
    }

    #[test]
    fn test_adjust_unknown_resource_creates_row() {
        let store = store();
        store.adjust_resource("antimatter", 42).unwrap();
        assert_eq!(store.resource_amount("antimatter").unwrap(), 42);
    }

    #[test]
    fn test_audit_append_and_read() {
        let store = store();
        store
            .append_audit(3, "code_rejected", Some("kromath"), &serde_json::json!({"message_id": 7}), 99)
            .unwrap();

        let entries = store.audit_entries(3).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action_type, "code_rejected");
        assert_eq!(entries[0].actor_race.as_deref(), Some("kromath"));
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let store = store();
        store.advance_day(1).unwrap();
        store.adjust_resource("energy", -900).unwrap();
        store
            .insert_incoming("kromath", MessageType::Public, "hi", None, 0, 1)
            .unwrap();
        store.insert_goal("conquer", 5, 0).unwrap();

        store.reset("zephyrians", &["kromath", "valyrians"]).unwrap();

        assert_eq!(store.current_day().unwrap(), 0);
        assert_eq!(store.resource_amount("energy").unwrap(), 1000);
        assert!(store.all_incoming().unwrap().is_empty());
        assert!(store.active_goals().unwrap().is_empty());
        assert_eq!(store.relationships().unwrap().len(), 2);
    }

    #[test]
    fn test_recent_history_limit() {
        let store = store();
        for i in 0..15 {
            store
                .insert_incoming("kromath", MessageType::Public, &format!("m{i}"), None, i, i)
                .unwrap();
        }
        let recent = store.recent_incoming(10).unwrap();
        assert_eq!(recent.len(), 10);
        // Newest first
        assert_eq!(recent[0].content, "m14");
    }
}
