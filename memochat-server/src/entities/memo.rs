use std::future::Future;

use crate::entities::dao::Memo;
use crate::entities::{decode_string_list, encode_string_list, parse_rfc3339_or_now, SqliteStore};

/// Read-only memo lookups used to build chat context.
///
/// Both queries return rows ordered by `(created_at, id)` so repeated calls
/// over unchanged data render identical context.
pub trait MemoStore: Send + Sync + 'static {
    /// Memos whose id is in `ids` and owned by `user_id`.
    fn memos_by_ids(
        &self,
        user_id: &str,
        ids: &[String],
    ) -> impl Future<Output = Result<Vec<Memo>, sqlx::Error>> + Send;
    /// Memos owned by `user_id` sharing at least one tag with `tags`.
    fn memos_by_tags(
        &self,
        user_id: &str,
        tags: &[String],
    ) -> impl Future<Output = Result<Vec<Memo>, sqlx::Error>> + Send;
}

type MemoRow = (String, String, String, String, String, Option<String>, String, String);

fn memo_from_row(row: MemoRow) -> Memo {
    let (id, user_id, title, content, tags, category_id, created_at, updated_at) = row;
    Memo {
        id,
        user_id,
        title,
        content,
        tags: decode_string_list(&tags, "memos.tags"),
        category_id,
        created_at: parse_rfc3339_or_now(created_at, "memos.created_at"),
        updated_at: parse_rfc3339_or_now(updated_at, "memos.updated_at"),
    }
}

// The id and tag sets are bound as a single JSON array and expanded with
// `json_each`, which keeps the statement text fixed regardless of set size.

impl MemoStore for SqliteStore {
    async fn memos_by_ids(&self, user_id: &str, ids: &[String]) -> Result<Vec<Memo>, sqlx::Error> {
        let rows: Vec<MemoRow> = sqlx::query_as(
            "SELECT id, user_id, title, content, tags, category_id, created_at, updated_at \
             FROM memos \
             WHERE user_id = ?1 AND id IN (SELECT value FROM json_each(?2)) \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id)
        .bind(encode_string_list(ids))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(memo_from_row).collect())
    }

    async fn memos_by_tags(&self, user_id: &str, tags: &[String]) -> Result<Vec<Memo>, sqlx::Error> {
        let rows: Vec<MemoRow> = sqlx::query_as(
            "SELECT m.id, m.user_id, m.title, m.content, m.tags, m.category_id, m.created_at, m.updated_at \
             FROM memos m \
             WHERE m.user_id = ?1 AND EXISTS ( \
                 SELECT 1 FROM json_each(m.tags) t \
                 JOIN json_each(?2) s ON t.value = s.value) \
             ORDER BY m.created_at ASC, m.id ASC",
        )
        .bind(user_id)
        .bind(encode_string_list(tags))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(memo_from_row).collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn lookup_by_ids_skips_other_owners() {
        let store = testing::store().await;
        testing::seed_memo(&store, "m1", "alice", "Groceries", "Buy milk", &["home"]).await;
        testing::seed_memo(&store, "m2", "bob", "Secret", "Not yours", &["home"]).await;

        let memos = store
            .memos_by_ids("alice", &["m1".into(), "m2".into()])
            .await
            .unwrap();
        assert_eq!(memos.len(), 1);
        assert_eq!(memos[0].id, "m1");
        assert_eq!(memos[0].tags, vec!["home".to_owned()]);
    }

    #[tokio::test]
    async fn lookup_by_tags_uses_overlap() {
        let store = testing::store().await;
        testing::seed_memo(&store, "m1", "alice", "Report", "Q3 numbers", &["work", "urgent"]).await;
        testing::seed_memo(&store, "m2", "alice", "Dinner", "Pasta", &["home"]).await;
        testing::seed_memo(&store, "m3", "alice", "Untagged", "Nothing", &[]).await;

        let memos = store
            .memos_by_tags("alice", &["work".into(), "travel".into()])
            .await
            .unwrap();
        let ids: Vec<_> = memos.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1"]);
    }
}
