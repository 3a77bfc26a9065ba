use super::RepoFailureCause;
use crate::HashSet;
use crate::canonicalize::{Canonical, canonicalize};
use crate::facts::Identified;
use crate::governor::RateGovernor;
use crate::source::{QuotaResource, SourcePage, SourceResult};

const LOG_TARGET: &str = "   collect";

/// Follows a paginated listing under the governor until `limit` distinct entities have been
/// collected or the listing ends. Every call draws from the `resource` budget.
///
/// Every item is canonicalized with the shape its page declares. An identity seen before
/// (pages can overlap when the underlying data changes mid-listing) is dropped. The listing is
/// considered ended when a page hands back a cursor already followed, or when a non-empty page
/// contributes nothing new. The result is sorted by identity.
pub(crate) async fn paginate<T, F, Fut>(
    governor: &RateGovernor,
    resource: QuotaResource,
    scope: &str,
    limit: u32,
    mut fetch: F,
) -> Result<Vec<T>, RepoFailureCause>
where
    T: Canonical + Identified,
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = SourceResult<SourcePage>>,
{
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    if limit == 0 {
        return Ok(Vec::new());
    }

    let what = format!("{} listing for '{scope}'", T::KIND);
    let mut seen = HashSet::default();
    let mut followed: HashSet<String> = HashSet::default();
    let mut collected = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = governor.call(&what, resource, || fetch(cursor.clone())).await?;
        let shape = page.shape;
        let had_items = !page.items.is_empty();
        let before = collected.len();

        for raw in page.items {
            let fact: T = canonicalize(&shape.wrap(raw))?;
            let id = fact.id();
            if seen.insert(id.clone()) {
                collected.push(fact);
                if collected.len() >= limit {
                    break;
                }
            } else {
                log::debug!(target: LOG_TARGET, "Skipping duplicate {} '{id}' in {what}", T::KIND);
            }
        }

        if collected.len() >= limit {
            break;
        }

        cursor = match page.next_cursor {
            Some(next) if !followed.insert(next.clone()) => {
                log::warn!(target: LOG_TARGET, "Stopping {what}: cursor '{next}' was already followed");
                None
            }
            Some(_) if had_items && collected.len() == before => {
                log::warn!(target: LOG_TARGET, "Stopping {what}: a page returned only entities already collected");
                None
            }
            next => next,
        };
        if cursor.is_none() {
            break;
        }
    }

    collected.sort_by_cached_key(Identified::id);
    Ok(collected)
}
