//! Renders the caller's selected memos into the text appended to the prompt.

use tracing::warn;

use super::error::ChatError;
use crate::entities::{Memo, MemoStore};

const ATTACHED_HEADER: &str = "\n\n[첨부된 메모들]\n";
const TAGGED_HEADER: &str = "\n\n[태그 관련 메모들]\n";
const NO_TAGS: &str = "없음";

/// What the caller selected as context for one chat turn.
#[derive(Debug, Clone, Copy)]
pub struct ContextSelection<'a> {
    pub memo_ids: &'a [String],
    pub tags: &'a [String],
}

/// Build the memo context block for `user_id`.
///
/// The id block comes first, then the tag block.  A memo matched by both
/// appears in both.  A failed id lookup aborts the turn; a failed tag lookup
/// only drops the tag block.  Nothing is truncated.
pub async fn assemble_context<S: MemoStore>(
    store: &S,
    user_id: &str,
    selection: ContextSelection<'_>,
) -> Result<String, ChatError> {
    let mut context = String::new();

    if !selection.memo_ids.is_empty() {
        let memos = store
            .memos_by_ids(user_id, selection.memo_ids)
            .await
            .map_err(ChatError::ContextFetchFailed)?;
        push_block(&mut context, ATTACHED_HEADER, &memos);
    }

    if !selection.tags.is_empty() {
        match store.memos_by_tags(user_id, selection.tags).await {
            Ok(memos) => push_block(&mut context, TAGGED_HEADER, &memos),
            Err(e) => warn!(error = %e, tags = selection.tags.len(), "tag memo lookup failed; continuing without it"),
        }
    }

    Ok(context)
}

/// A selection that matched no memos adds no header at all, on both the
/// streamed and the buffered chat path.
fn push_block(context: &mut String, header: &str, memos: &[Memo]) {
    if memos.is_empty() {
        return;
    }
    context.push_str(header);
    let rendered: Vec<String> = memos.iter().map(render_memo).collect();
    context.push_str(&rendered.join("\n\n"));
}

fn render_memo(memo: &Memo) -> String {
    let tags = if memo.tags.is_empty() {
        NO_TAGS.to_owned()
    } else {
        memo.tags.join(", ")
    };
    format!("제목: {}\n내용: {}\n태그: {}", memo.title, memo.content, tags)
}
