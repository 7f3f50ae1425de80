//! Category tree import
//!
//! Depth-first, parents before children: every node is reconciled under the
//! id its parent resolved to, so re-running the pass finds the whole tree
//! and creates nothing.

use serde::Serialize;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::reconciler::{Origin, Reconciler};
use crate::domain::entities::{CategoryNode, NaturalKey, RemoteId};
use crate::domain::services::PayloadBuilder;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryImportSummary {
    pub created: usize,
    pub existing: usize,
    pub failed: usize,
    /// Nameless nodes and descendants of failed nodes.
    pub skipped: usize,
    pub interrupted: bool,
}

impl fmt::Display for CategoryImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {}, existing {}, failed {}, skipped {}",
            self.created, self.existing, self.failed, self.skipped
        )?;
        if self.interrupted {
            f.write_str(" (interrupted)")?;
        }
        Ok(())
    }
}

pub struct CategoryImporter<'r, 'c> {
    reconciler: &'r mut Reconciler<'c>,
    payloads: &'r PayloadBuilder,
}

impl<'r, 'c> CategoryImporter<'r, 'c> {
    pub fn new(reconciler: &'r mut Reconciler<'c>, payloads: &'r PayloadBuilder) -> Self {
        Self {
            reconciler,
            payloads,
        }
    }

    /// Import `nodes` (and their subtrees) under `parent_id`, in input order.
    pub async fn import_tree(
        &mut self,
        nodes: &[CategoryNode],
        parent_id: &RemoteId,
        cancel: &CancellationToken,
    ) -> CategoryImportSummary {
        let mut summary = CategoryImportSummary::default();
        let mut pending: Vec<(&CategoryNode, RemoteId, usize)> =
            nodes.iter().rev().map(|n| (n, parent_id.clone(), 0)).collect();

        while let Some((node, parent_id, depth)) = pending.pop() {
            if cancel.is_cancelled() {
                summary.interrupted = true;
                break;
            }

            let Some(name) = node.display_name() else {
                warn!("⚠️ Skipping category without a name under {}", parent_id);
                summary.skipped += 1 + subtree_size(&node.subcategories);
                continue;
            };

            let key = NaturalKey::category(name, &parent_id);
            let payloads = self.payloads;
            let result = self
                .reconciler
                .reconcile(key, || payloads.category(name, &parent_id))
                .await;

            let indent = "  ".repeat(depth);
            match result {
                Ok(reconciled) => {
                    match reconciled.origin {
                        Origin::Created => {
                            summary.created += 1;
                            info!("{}✅ {} -> created {}", indent, name, reconciled.id);
                        }
                        Origin::Found | Origin::Cached => {
                            summary.existing += 1;
                            info!("{}✔️ {} -> existing {}", indent, name, reconciled.id);
                        }
                    }
                    pending.extend(
                        node.subcategories
                            .iter()
                            .rev()
                            .map(|child| (child, reconciled.id.clone(), depth + 1)),
                    );
                }
                Err(e) => {
                    let skipped = subtree_size(&node.subcategories);
                    summary.failed += 1;
                    summary.skipped += skipped;
                    warn!(
                        "{}❌ {} (parent {}) failed: {}; skipping {} subcategories",
                        indent, name, parent_id, e, skipped
                    );
                }
            }
        }

        summary
    }
}

fn subtree_size(nodes: &[CategoryNode]) -> usize {
    nodes
        .iter()
        .map(|n| 1 + subtree_size(&n.subcategories))
        .sum()
}
