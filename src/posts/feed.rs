use crate::{
    db::{DbResult, PostFilter},
    posts::models::PostsPage,
    InnerAppState,
};

/// Loads one page of a feed, newest posts first.
pub async fn feed_page(
    state: &InnerAppState,
    filter: PostFilter,
    requested: Option<i64>,
) -> DbResult<PostsPage> {
    let count = state.repo.count_posts(filter).await?;
    let window = state.paginator.window(count, requested);

    let entries = if window.is_empty() {
        vec![]
    } else {
        state
            .repo
            .list_posts(filter, window.offset, window.limit())
            .await?
    };

    tracing::debug!(
        "feed {:?}: page {} of {}, {} posts",
        filter,
        window.number,
        window.total_pages,
        entries.len()
    );

    Ok(window
        .into_page(entries)
        .map(|entry| entry.into_response(&state.media))
        .into())
}
