use std::future::Future;

use futures_util::future::BoxFuture;
use futures_util::{StreamExt, TryStreamExt, stream};

use crate::error::ServiceResult;
use crate::session::AggregationSession;

type Init<'a> = BoxFuture<'a, ServiceResult<()>>;

fn init<'a, T: 'a>(fetch: impl Future<Output = ServiceResult<&'a T>> + Send + 'a) -> Init<'a> {
    Box::pin(async move { fetch.await.map(|_| ()) })
}

/// Raw collections keyed directly by the subject batch.
fn level_one(session: &AggregationSession) -> Vec<Init<'_>> {
    vec![
        init(session.schedules()),
        init(session.schedule_relations()),
        init(session.student_reviews()),
        init(session.student_feedbacks()),
        init(session.subject_users()),
        init(session.room_infos()),
    ]
}

/// Needs schedules, relations and subject users.
fn level_two(session: &AggregationSession) -> Vec<Init<'_>> {
    vec![
        init(session.programs()),
        init(session.subject_areas()),
        init(session.classes()),
        init(session.content_sources()),
        init(session.subject_contents()),
        init(session.reviewer_feedbacks()),
    ]
}

/// Needs the content sources.
fn level_three(session: &AggregationSession) -> Vec<Init<'_>> {
    vec![
        init(session.outcomes()),
        init(session.room_scores()),
        init(session.room_comments()),
        init(session.user_outcomes()),
        init(session.room_trees()),
    ]
}

/// Runs one level with at most `limit` initializers in flight. The first
/// error drops the rest of the level.
async fn run_level(level: Vec<Init<'_>>, limit: usize) -> ServiceResult<()> {
    stream::iter(level).buffer_unordered(limit.max(1)).try_collect::<Vec<()>>().await.map(|_| ())
}

/// Fills every cache a detail reply reads. Levels run in order; each level
/// joins before the next starts.
pub(crate) async fn warm_detail_caches(session: &AggregationSession) -> ServiceResult<()> {
    let limit = session.config().max_concurrency;
    let levels = [level_one(session), level_two(session), level_three(session)];
    for (depth, level) in levels.into_iter().enumerate() {
        let initializers = level.len();
        run_level(level, limit).await?;
        tracing::debug!(level = depth + 1, initializers, "detail level ready");
    }
    tracing::debug!(cached = session.cached_resources(), "detail caches warm");
    Ok(())
}
