//! Resolve a scraped "A/B/C" category path to shop ids
//!
//! Lookup only: a path that leads into categories the shop does not have
//! resolves to its deepest known prefix.

use tracing::warn;

use crate::application::reconciler::Reconciler;
use crate::domain::constants::catalog;
use crate::domain::entities::{CategoryPath, NaturalKey, RemoteId};

/// Walk `path` from the default category downwards.
///
/// The result always contains `default_id` among the ancestors. A segment
/// that is missing, or whose lookup fails, stops the walk with a warning and
/// the categories resolved so far are returned.
pub async fn resolve_category_path(
    reconciler: &mut Reconciler<'_>,
    path: Option<&str>,
    default_id: &RemoteId,
) -> CategoryPath {
    let mut resolved = CategoryPath::default_only(default_id);

    let segments = path
        .unwrap_or_default()
        .split(catalog::CATEGORY_PATH_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty());

    for segment in segments {
        let parent_id = resolved.terminal_id.clone();
        let key = NaturalKey::category(segment, &parent_id);

        match reconciler.find(&key).await {
            Ok(Some(id)) => {
                if !resolved.ancestor_ids.contains(&id) {
                    resolved.ancestor_ids.push(id.clone());
                }
                resolved.terminal_id = id;
            }
            Ok(None) => {
                warn!(
                    "⚠️ Category '{}' (parent {}) not found; using {}",
                    segment, parent_id, resolved.terminal_id
                );
                resolved.unresolved_segment = Some(segment.to_string());
                break;
            }
            Err(e) => {
                warn!(
                    "⚠️ Lookup of category '{}' (parent {}) failed: {}; using {}",
                    segment, parent_id, e, resolved.terminal_id
                );
                resolved.unresolved_segment = Some(segment.to_string());
                break;
            }
        }
    }

    resolved
}
