//! In-memory shop used by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use catalog_sync_lib::domain::document::Element;
use catalog_sync_lib::domain::entities::RemoteId;
use catalog_sync_lib::domain::repositories::{RemoteResource, Resource};
use catalog_sync_lib::domain::value_objects::Query;
use catalog_sync_lib::infrastructure::api_error::{ApiError, ApiResult};

/// Fields the fake understands, read from create payloads.
const FIELDS: [&str; 8] = [
    "name",
    "id_parent",
    "id_feature",
    "value",
    "id_product",
    "price",
    "id_manufacturer",
    "id_category_default",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get(Resource),
    Create(Resource),
    Update(Resource, String),
    Delete(Resource, String),
    ListImages(String),
    UploadImage(String, PathBuf),
    DeleteImage(String, String),
    Ping,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: u64,
    pub fields: BTreeMap<String, String>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    entities: HashMap<Resource, Vec<Entity>>,
    images: HashMap<String, Vec<u64>>,
    calls: Vec<Call>,
    payloads: Vec<(Resource, Element)>,
    fail_create_names: HashSet<String>,
    fail_lookups: HashSet<Resource>,
    fail_ping: bool,
}

pub struct FakeShop {
    state: Mutex<State>,
}

fn rejected(method: &str, what: impl std::fmt::Display) -> ApiError {
    ApiError::http_status(500, method, &what.to_string(), "injected failure")
}

impl FakeShop {
    /// Shop with Root (1) and Home (2) categories.
    pub fn new() -> Self {
        let shop = Self {
            state: Mutex::new(State {
                next_id: 100,
                ..State::default()
            }),
        };
        shop.seed_with_id(Resource::Categories, 1, &[("name", "Root"), ("id_parent", "0")]);
        shop.seed_with_id(Resource::Categories, 2, &[("name", "Home"), ("id_parent", "1")]);
        shop
    }

    fn seed_with_id(&self, resource: Resource, id: u64, fields: &[(&str, &str)]) {
        let mut state = self.state.lock().unwrap();
        state.entities.entry(resource).or_default().push(Entity {
            id,
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        });
    }

    /// Add an entity directly, bypassing the webservice calls.
    pub fn seed(&self, resource: Resource, fields: &[(&str, &str)]) -> RemoteId {
        let id = {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            state.next_id
        };
        self.seed_with_id(resource, id, fields);
        if resource == Resource::Products {
            let product_id = id.to_string();
            self.seed(Resource::StockAvailables, &[("id_product", product_id.as_str()), ("quantity", "0")]);
        }
        RemoteId::new(id.to_string())
    }

    pub fn seed_images(&self, product_id: &RemoteId, image_ids: &[u64]) {
        let mut state = self.state.lock().unwrap();
        state.images.insert(product_id.to_string(), image_ids.to_vec());
    }

    pub fn fail_create_named(&self, name: &str) {
        self.state.lock().unwrap().fail_create_names.insert(name.to_string());
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.fail_create_names.clear();
        state.fail_lookups.clear();
        state.fail_ping = false;
    }

    pub fn fail_lookups(&self, resource: Resource) {
        self.state.lock().unwrap().fail_lookups.insert(resource);
    }

    pub fn fail_ping(&self) {
        self.state.lock().unwrap().fail_ping = true;
    }

    pub fn entities(&self, resource: Resource) -> Vec<Entity> {
        self.state
            .lock()
            .unwrap()
            .entities
            .get(&resource)
            .cloned()
            .unwrap_or_default()
    }

    pub fn find(&self, resource: Resource, field: &str, value: &str) -> Vec<Entity> {
        self.entities(resource)
            .into_iter()
            .filter(|e| e.fields.get(field).map(String::as_str) == Some(value))
            .collect()
    }

    pub fn images(&self, product_id: &RemoteId) -> Vec<u64> {
        self.state
            .lock()
            .unwrap()
            .images
            .get(product_id.as_str())
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn reset_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn creates(&self, resource: Resource) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == Call::Create(resource))
            .count()
    }

    /// Entity payloads sent with create calls.
    pub fn created_payloads(&self, resource: Resource) -> Vec<Element> {
        self.state
            .lock()
            .unwrap()
            .payloads
            .iter()
            .filter(|(r, _)| *r == resource)
            .map(|(_, e)| e.clone())
            .collect()
    }

    fn render(resource: Resource, entities: &[Entity], full: bool) -> Element {
        let items = entities.iter().map(|entity| {
            if !full {
                return Element::new(resource.element()).attr("id", entity.id.to_string());
            }
            let mut item = Element::new(resource.element())
                .child(Element::with_text("id", entity.id.to_string()));
            for (key, value) in &entity.fields {
                let field = if key == "name" || key == "value" {
                    Element::localized(key.as_str(), 1, value.as_str())
                } else {
                    Element::with_text(key.as_str(), value.as_str())
                };
                item.push(field);
            }
            item
        });
        Element::document(Element::new(resource.path()).children(items))
    }
}

impl Default for FakeShop {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteResource for FakeShop {
    async fn get(&self, resource: Resource, query: &Query) -> ApiResult<Element> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Get(resource));
        if state.fail_lookups.contains(&resource) {
            return Err(rejected("GET", resource));
        }

        let matches: Vec<Entity> = state
            .entities
            .get(&resource)
            .map(|all| {
                all.iter()
                    .filter(|entity| {
                        query.filters().iter().all(|(field, value)| {
                            if field == "id" {
                                entity.id.to_string() == *value
                            } else {
                                entity.fields.get(field) == Some(value)
                            }
                        })
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self::render(resource, &matches, query.display().is_some()))
    }

    async fn create(&self, resource: Resource, document: &Element) -> ApiResult<Element> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create(resource));
        let entity = document
            .single_item(resource.element())
            .ok_or_else(|| ApiError::missing_element(resource.element()))?
            .clone();
        state.payloads.push((resource, entity.clone()));

        let mut fields = BTreeMap::new();
        for key in FIELDS {
            if let Some(text) = entity.find(key).and_then(Element::localized_text) {
                fields.insert(key.to_string(), text.to_string());
            }
        }
        if let Some(name) = fields.get("name") {
            if state.fail_create_names.contains(name) {
                return Err(rejected("POST", resource));
            }
        }

        state.next_id += 1;
        let id = state.next_id;
        state
            .entities
            .entry(resource)
            .or_default()
            .push(Entity { id, fields });

        if resource == Resource::Products {
            state.next_id += 1;
            let stock_id = state.next_id;
            let stock_fields = BTreeMap::from([
                ("id_product".to_string(), id.to_string()),
                ("quantity".to_string(), "0".to_string()),
            ]);
            state
                .entities
                .entry(Resource::StockAvailables)
                .or_default()
                .push(Entity {
                    id: stock_id,
                    fields: stock_fields,
                });
        }

        Ok(Element::document(
            Element::new(resource.element()).child(Element::with_text("id", id.to_string())),
        ))
    }

    async fn update(&self, resource: Resource, id: &RemoteId, document: &Element) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Update(resource, id.to_string()));
        let entity = document
            .single_item(resource.element())
            .ok_or_else(|| ApiError::missing_element(resource.element()))?;

        let Some(stored) = state
            .entities
            .get_mut(&resource)
            .and_then(|all| all.iter_mut().find(|e| e.id.to_string() == id.as_str()))
        else {
            return Err(ApiError::http_status(404, "PUT", id.as_str(), "not found"));
        };
        for child in &entity.children {
            if let Some(text) = child.localized_text() {
                if child.name != "id" {
                    stored.fields.insert(child.name.clone(), text.to_string());
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, resource: Resource, id: &RemoteId) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete(resource, id.to_string()));
        let all = state.entities.entry(resource).or_default();
        let before = all.len();
        all.retain(|e| e.id.to_string() != id.as_str());
        if all.len() == before {
            return Err(ApiError::http_status(404, "DELETE", id.as_str(), "not found"));
        }
        Ok(())
    }

    async fn list_image_ids(&self, product_id: &RemoteId) -> ApiResult<Vec<RemoteId>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListImages(product_id.to_string()));
        Ok(state
            .images
            .get(product_id.as_str())
            .map(|ids| ids.iter().map(|id| RemoteId::new(id.to_string())).collect())
            .unwrap_or_default())
    }

    async fn upload_image(&self, product_id: &RemoteId, image_path: &Path) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::UploadImage(product_id.to_string(), image_path.to_path_buf()));
        state.next_id += 1;
        let id = state.next_id;
        state.images.entry(product_id.to_string()).or_default().push(id);
        Ok(())
    }

    async fn delete_image(&self, product_id: &RemoteId, image_id: &RemoteId) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::DeleteImage(product_id.to_string(), image_id.to_string()));
        if let Some(ids) = state.images.get_mut(product_id.as_str()) {
            ids.retain(|id| id.to_string() != image_id.as_str());
        }
        Ok(())
    }

    async fn ping(&self) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Ping);
        if state.fail_ping {
            return Err(ApiError::transport("GET", "/", "connection refused"));
        }
        Ok(())
    }
}
