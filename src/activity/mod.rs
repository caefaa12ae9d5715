//! Activity fan-out and the notification feed.
//!
//! Mutations that should notify someone record an activity for the owner of
//! the affected photo/album (or the followed user). Acting on your own
//! content never notifies. Activities outlive the entities they reference:
//! deleting a photo or comment keeps the history, and the feed joins in
//! whatever still exists.

use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::*;
use crate::store::{self, Store, StoreError, StoreResult};

/// Records an activity unless the actor is also the recipient. Runs on a
/// borrowed connection so the engine can sequence it after the row and
/// counter writes of the same transaction.
pub fn record_on(
    conn: &Connection,
    actor_id: &str,
    target_user_id: &str,
    kind: ActivityKind,
) -> StoreResult<Option<String>> {
    if actor_id == target_user_id {
        return Ok(None);
    }
    let id = store::insert_activity_on(conn, actor_id, target_user_id, &kind)?;
    log::debug!(
        "activity {} for {}: {} by {}",
        id,
        target_user_id,
        kind.type_name(),
        actor_id
    );
    Ok(Some(id))
}

/// Read side of the notification feed, owned by the recipient.
pub struct Notifications {
    store: Arc<Store>,
}

impl Notifications {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Newest first. `include_read` widens the feed to already-seen entries.
    pub fn list(
        &self,
        target_user_id: &str,
        include_read: bool,
        page: &Page,
    ) -> StoreResult<PageOf<ActivityView>> {
        let conn = self.store.conn.lock().unwrap();
        let limit = page.limit(20);

        let mut conditions = vec!["target_user_id = ?".to_string()];
        let mut values = vec![rusqlite::types::Value::Text(target_user_id.to_string())];
        if !include_read {
            conditions.push("read = 0".to_string());
        }

        if let Some(cursor) = &page.cursor {
            let created: Option<String> = match conn.query_row(
                "SELECT created_at FROM activities WHERE id = ?1",
                params![cursor],
                |row| row.get(0),
            ) {
                Ok(v) => Some(v),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e.into()),
            };
            let Some(created) = created else {
                return Ok(PageOf::empty());
            };
            conditions.push("(created_at < ? OR (created_at = ? AND id > ?))".to_string());
            values.push(rusqlite::types::Value::Text(created.clone()));
            values.push(rusqlite::types::Value::Text(created));
            values.push(rusqlite::types::Value::Text(cursor.clone()));
        }

        let sql = format!(
            "SELECT * FROM activities WHERE {} ORDER BY created_at DESC, id ASC LIMIT ?",
            conditions.join(" AND ")
        );
        values.push(rusqlite::types::Value::Integer(limit));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values), store::row_to_activity)?;
        let mut activities = Vec::new();
        for row in rows {
            activities.push(row?);
        }

        let next_cursor = if activities.len() as i64 == limit {
            activities.last().map(|a| a.id.clone())
        } else {
            None
        };

        let items = self.enrich_on(&conn, activities)?;
        Ok(PageOf { items, next_cursor })
    }

    /// Joins in the actor and whatever referenced entities still exist; a
    /// deleted referent leaves its field null instead of failing the feed.
    fn enrich_on(
        &self,
        conn: &Connection,
        activities: Vec<Activity>,
    ) -> StoreResult<Vec<ActivityView>> {
        let mut actors: HashMap<String, Option<UserSummary>> = HashMap::new();
        let mut out = Vec::with_capacity(activities.len());
        for activity in activities {
            if !actors.contains_key(&activity.actor_id) {
                let actor =
                    store::find_user_on(conn, &activity.actor_id)?.map(|u| UserSummary::from(&u));
                actors.insert(activity.actor_id.clone(), actor);
            }
            let actor = actors[&activity.actor_id].clone();

            let photo = match activity.kind.photo_id() {
                Some(photo_id) => store::find_photo_on(conn, photo_id)?,
                None => None,
            };
            // For photo activities the album comes through the photo, for
            // album_comment it is referenced directly.
            let album_id = activity
                .kind
                .album_id()
                .map(String::from)
                .or_else(|| photo.as_ref().map(|p| p.album_id.clone()));
            let album = match album_id {
                Some(album_id) => {
                    store::find_album_on(conn, &album_id)?.map(|a| AlbumSummary::from(&a))
                }
                None => None,
            };
            let comment = match activity.kind.comment_id() {
                Some(comment_id) => store::find_comment_on(conn, comment_id)?,
                None => None,
            };

            out.push(ActivityView {
                activity,
                actor,
                photo,
                album,
                comment,
            });
        }
        Ok(out)
    }

    /// Mark specific notifications as read; entries that do not exist or do
    /// not belong to the caller are skipped. Returns the number marked.
    pub fn mark_read(&self, target_user_id: &str, ids: &[String]) -> StoreResult<usize> {
        let conn = self.store.conn.lock().unwrap();
        let mut marked = 0;
        for id in ids {
            marked += conn.execute(
                "UPDATE activities SET read = 1 WHERE id = ?1 AND target_user_id = ?2 AND read = 0",
                params![id, target_user_id],
            )?;
        }
        Ok(marked)
    }

    pub fn mark_all_read(&self, target_user_id: &str) -> StoreResult<usize> {
        let conn = self.store.conn.lock().unwrap();
        let marked = conn.execute(
            "UPDATE activities SET read = 1 WHERE target_user_id = ?1 AND read = 0",
            params![target_user_id],
        )?;
        Ok(marked)
    }

    pub fn unread_count(&self, target_user_id: &str) -> StoreResult<i64> {
        let conn = self.store.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM activities WHERE target_user_id = ?1 AND read = 0",
            params![target_user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete specific notifications owned by the caller. Foreign ids are
    /// skipped, not errors, matching mark_read.
    pub fn delete(&self, target_user_id: &str, ids: &[String]) -> StoreResult<usize> {
        let conn = self.store.conn.lock().unwrap();
        let mut deleted = 0;
        for id in ids {
            deleted += conn.execute(
                "DELETE FROM activities WHERE id = ?1 AND target_user_id = ?2",
                params![id, target_user_id],
            )?;
        }
        Ok(deleted)
    }

    pub fn clear_all(&self, target_user_id: &str) -> StoreResult<usize> {
        let user = self.store.find_user(target_user_id)?;
        if user.is_none() {
            return Err(StoreError::NotFound(format!("User {}", target_user_id)));
        }
        let conn = self.store.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM activities WHERE target_user_id = ?1",
            params![target_user_id],
        )?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_actions_are_suppressed() {
        let store = Store::in_memory().unwrap();
        let conn = store.conn.lock().unwrap();
        let recorded = record_on(
            &conn,
            "u1",
            "u1",
            ActivityKind::Like {
                photo_id: "p1".to_string(),
            },
        )
        .unwrap();
        assert!(recorded.is_none());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM activities", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn recorded_activities_start_unread() {
        let store = Arc::new(Store::in_memory().unwrap());
        {
            let conn = store.conn.lock().unwrap();
            record_on(
                &conn,
                "u1",
                "u2",
                ActivityKind::Follow,
            )
            .unwrap()
            .unwrap();
        }
        let notifications = Notifications::new(store);
        assert_eq!(notifications.unread_count("u2").unwrap(), 1);
        assert_eq!(notifications.unread_count("u1").unwrap(), 0);
    }
}
