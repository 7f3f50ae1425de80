//! Catalog cleanup against an in-memory shop
mod common;

use async_trait::async_trait;
use catalog_sync_lib::application::{AutoConfirm, CatalogCleaner, Confirm};
use catalog_sync_lib::domain::repositories::Resource;
use common::{Call, FakeShop};
use tokio_util::sync::CancellationToken;

/// Declines one kind and records every prompt.
struct Decline {
    kind: Resource,
    asked: Vec<(Resource, usize)>,
}

#[async_trait]
impl Confirm for Decline {
    async fn confirm(&mut self, resource: Resource, count: usize) -> bool {
        self.asked.push((resource, count));
        resource != self.kind
    }
}

/// Approves, but the user hits Ctrl-C while the prompt is open.
struct InterruptedPrompt {
    cancel: CancellationToken,
    asked: Vec<Resource>,
}

#[async_trait]
impl Confirm for InterruptedPrompt {
    async fn confirm(&mut self, resource: Resource, _count: usize) -> bool {
        self.asked.push(resource);
        self.cancel.cancel();
        true
    }
}

fn populated_shop() -> FakeShop {
    let shop = FakeShop::new();
    let toys = shop.seed(Resource::Categories, &[("name", "Zabawki"), ("id_parent", "2")]);
    shop.seed(Resource::Categories, &[("name", "Klocki"), ("id_parent", toys.as_str())]);
    shop.seed(Resource::Manufacturers, &[("name", "Lego")]);
    shop.seed(Resource::ProductFeatures, &[("name", "Wiek")]);
    shop.seed(Resource::Products, &[("name", "Klocki Zamek")]);
    shop.seed(Resource::Products, &[("name", "Puzzle")]);
    shop
}

#[tokio::test]
async fn removes_everything_but_root_and_home() {
    let shop = populated_shop();

    let summary = CatalogCleaner::new(&shop)
        .clean(&mut AutoConfirm, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.products.deleted, 2);
    assert_eq!(summary.manufacturers.deleted, 1);
    assert_eq!(summary.categories.deleted, 2);
    assert_eq!(summary.features.deleted, 1);
    assert!(!summary.interrupted);

    let remaining: Vec<u64> = shop.entities(Resource::Categories).iter().map(|e| e.id).collect();
    assert_eq!(remaining, vec![1, 2]);
    assert!(shop.entities(Resource::Products).is_empty());
    assert!(shop.entities(Resource::ProductFeatures).is_empty());
}

#[tokio::test]
async fn kinds_are_deleted_in_order_children_first() {
    let shop = populated_shop();
    shop.reset_calls();

    CatalogCleaner::new(&shop)
        .clean(&mut AutoConfirm, &CancellationToken::new())
        .await
        .unwrap();

    let deletes: Vec<(Resource, String)> = shop
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Delete(resource, id) => Some((resource, id)),
            _ => None,
        })
        .collect();
    let kinds: Vec<Resource> = deletes.iter().map(|(r, _)| *r).collect();
    let first_of = |r: Resource| kinds.iter().position(|k| *k == r).unwrap();
    assert!(first_of(Resource::Products) < first_of(Resource::Manufacturers));
    assert!(first_of(Resource::Manufacturers) < first_of(Resource::Categories));
    assert!(first_of(Resource::Categories) < first_of(Resource::ProductFeatures));

    let category_ids: Vec<u64> = deletes
        .iter()
        .filter(|(r, _)| *r == Resource::Categories)
        .map(|(_, id)| id.parse().unwrap())
        .collect();
    assert!(category_ids.windows(2).all(|w| w[0] > w[1]), "highest id first");
}

#[tokio::test]
async fn declined_kind_is_kept() {
    let shop = populated_shop();
    let mut confirm = Decline {
        kind: Resource::Manufacturers,
        asked: Vec::new(),
    };

    let summary = CatalogCleaner::new(&shop)
        .clean(&mut confirm, &CancellationToken::new())
        .await
        .unwrap();

    assert!(summary.manufacturers.declined);
    assert_eq!(summary.manufacturers.total, 1);
    assert_eq!(shop.entities(Resource::Manufacturers).len(), 1);
    assert_eq!(summary.categories.deleted, 2);
    assert_eq!(
        confirm.asked,
        vec![
            (Resource::Products, 2),
            (Resource::Manufacturers, 1),
            (Resource::Categories, 2),
            (Resource::ProductFeatures, 1),
        ]
    );
}

#[tokio::test]
async fn empty_kinds_are_not_prompted() {
    let shop = FakeShop::new();
    let mut confirm = Decline {
        kind: Resource::Products,
        asked: Vec::new(),
    };

    let summary = CatalogCleaner::new(&shop)
        .clean(&mut confirm, &CancellationToken::new())
        .await
        .unwrap();

    assert!(confirm.asked.is_empty());
    assert_eq!(summary.categories.total, 0);
}

#[tokio::test]
async fn unreachable_shop_is_an_error() {
    let shop = populated_shop();
    shop.fail_ping();

    let result = CatalogCleaner::new(&shop)
        .clean(&mut AutoConfirm, &CancellationToken::new())
        .await;

    assert!(result.is_err());
    assert!(shop.calls().iter().all(|c| !matches!(c, Call::Delete(..))));
}

#[tokio::test]
async fn listing_failure_moves_on_to_next_kind() {
    let shop = populated_shop();
    shop.fail_lookups(Resource::Products);

    let summary = CatalogCleaner::new(&shop)
        .clean(&mut AutoConfirm, &CancellationToken::new())
        .await
        .unwrap();

    assert!(summary.products.listing_failed);
    assert_eq!(summary.manufacturers.deleted, 1);
}

#[tokio::test]
async fn stats_exclude_protected_categories() {
    let shop = populated_shop();

    let stats = CatalogCleaner::new(&shop).stats().await.unwrap();

    assert_eq!(stats.products, 2);
    assert_eq!(stats.manufacturers, 1);
    assert_eq!(stats.categories, 2);
    assert_eq!(stats.features, 1);
}

#[tokio::test]
async fn cancellation_stops_the_cleanup() {
    let shop = populated_shop();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = CatalogCleaner::new(&shop)
        .clean(&mut AutoConfirm, &cancel)
        .await
        .unwrap();

    assert!(summary.interrupted);
    assert_eq!(shop.entities(Resource::Products).len(), 2);
}

#[tokio::test]
async fn cancel_during_prompt_deletes_nothing() {
    let shop = populated_shop();
    shop.reset_calls();
    let cancel = CancellationToken::new();
    let mut confirm = InterruptedPrompt {
        cancel: cancel.clone(),
        asked: Vec::new(),
    };

    let summary = CatalogCleaner::new(&shop)
        .clean(&mut confirm, &cancel)
        .await
        .unwrap();

    assert!(summary.interrupted);
    assert_eq!(confirm.asked, vec![Resource::Products]);
    assert!(shop.calls().iter().all(|c| !matches!(c, Call::Delete(..))));
    assert_eq!(shop.entities(Resource::Products).len(), 2);
}
