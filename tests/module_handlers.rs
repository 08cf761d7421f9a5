//! Handlers driven end to end through a router, backed by an in-memory executor.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use recipe_api::config::ModuleConfig;
use recipe_api::routes::operation_route;
use recipe_api::{ApiError, CrudExecutor, ModuleDefinition, ModuleState, Operation};
use serde_json::{json, Map, Value};
use std::sync::{Arc, RwLock};
use tower::ServiceExt;

const BASE: &str = "/api/tea-shop/v1";

#[derive(Default)]
struct MemoryExecutor {
    rows: RwLock<Vec<Map<String, Value>>>,
}

#[async_trait]
impl CrudExecutor for MemoryExecutor {
    async fn create(&self, mut body: Map<String, Value>) -> Result<String, ApiError> {
        let id = uuid::Uuid::new_v4().to_string();
        body.insert("id".into(), Value::String(id.clone()));
        self.rows.write().unwrap().push(body);
        Ok(id)
    }

    async fn read_list(&self) -> Result<Vec<Value>, ApiError> {
        Ok(self.rows.read().unwrap().iter().cloned().map(Value::Object).collect())
    }

    async fn read_single(&self, id: &str) -> Result<Option<Value>, ApiError> {
        let rows = self.rows.read().unwrap();
        Ok(rows.iter().find(|r| r["id"] == id).cloned().map(Value::Object))
    }

    async fn update(&self, id: &str, body: Map<String, Value>) -> Result<(), ApiError> {
        let mut rows = self.rows.write().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r["id"] == id) {
            row.extend(body.into_iter().filter(|(k, _)| k != "id"));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.rows.write().unwrap().retain(|r| r["id"] != id);
        Ok(())
    }
}

/// Every call fails the way a dropped connection would.
struct BrokenExecutor;

#[async_trait]
impl CrudExecutor for BrokenExecutor {
    async fn create(&self, _: Map<String, Value>) -> Result<String, ApiError> {
        Err(ApiError::Store("connection reset by peer".into()))
    }
    async fn read_list(&self) -> Result<Vec<Value>, ApiError> {
        Err(ApiError::Store("connection reset by peer".into()))
    }
    async fn read_single(&self, _: &str) -> Result<Option<Value>, ApiError> {
        Err(ApiError::Store("connection reset by peer".into()))
    }
    async fn update(&self, _: &str, _: Map<String, Value>) -> Result<(), ApiError> {
        Err(ApiError::Store("connection reset by peer".into()))
    }
    async fn delete(&self, _: &str) -> Result<(), ApiError> {
        Err(ApiError::Store("connection reset by peer".into()))
    }
}

fn app(executor: Arc<dyn CrudExecutor>) -> Router {
    let module = ModuleDefinition::from_config(&ModuleConfig {
        name: "Tea Shop".into(),
        database: "memory".into(),
        table: "teas".into(),
        auth: None,
        fields: vec!["name".into(), "origin".into()],
        operations: Operation::ALL.iter().map(|op| op.to_string()).collect(),
    })
    .unwrap();
    let module = Arc::new(module);
    let base = module.base_path();
    assert_eq!(base, BASE);

    let state = ModuleState { module, executor };
    Operation::ALL.iter().fold(Router::new(), |router, op| {
        router.route(&op.path(&base), operation_route(*op, state.clone(), None))
    })
}

async fn call(app: &Router, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn create(app: &Router, body: Value) -> String {
    let (status, created) = call(app, Method::POST, BASE, Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    created["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn created_record_reads_back_by_id() {
    let app = app(Arc::new(MemoryExecutor::default()));

    let (status, created) = call(&app, Method::POST, BASE, Some(json!({"name": "Sencha"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], true);
    assert_eq!(created["code"], 200);
    assert_eq!(created["message"], "Data has been created");
    let id = created["data"]["id"].as_str().unwrap();

    let (status, single) = call(&app, Method::GET, &format!("{}/{}", BASE, id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        single,
        json!({
            "status": true,
            "code": 200,
            "data": {"name": "Sencha", "id": id},
            "message": "Successfully read data"
        })
    );
}

#[tokio::test]
async fn read_list_wraps_an_array() {
    let app = app(Arc::new(MemoryExecutor::default()));

    let (status, empty) = call(&app, Method::GET, BASE, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty["data"], json!([]));
    assert_eq!(empty["message"], "Successfully read data");

    create(&app, json!({"name": "Sencha"})).await;
    create(&app, json!({"name": "Assam", "origin": "India"})).await;
    let (_, list) = call(&app, Method::GET, BASE, None).await;
    let names: Vec<&str> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Sencha", "Assam"]);
}

#[tokio::test]
async fn missing_id_is_a_not_found_envelope() {
    let app = app(Arc::new(MemoryExecutor::default()));
    let (status, body) = call(&app, Method::GET, &format!("{}/nope", BASE), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"status": false, "code": 404, "data": null, "message": "Data not found"})
    );
}

#[tokio::test]
async fn update_then_delete() {
    let app = app(Arc::new(MemoryExecutor::default()));
    let id = create(&app, json!({"name": "Oolong"})).await;
    let item = format!("{}/{}", BASE, id);

    let (status, updated) =
        call(&app, Method::PATCH, &item, Some(json!({"origin": "Taiwan"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        updated,
        json!({"status": true, "code": 200, "data": {"updated": true}, "message": "Successfully update data"})
    );
    let (_, single) = call(&app, Method::GET, &item, None).await;
    assert_eq!(single["data"]["name"], "Oolong");
    assert_eq!(single["data"]["origin"], "Taiwan");

    let (status, deleted) = call(&app, Method::DELETE, &item, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        deleted,
        json!({"status": true, "code": 200, "data": {"deleted": true}, "message": "Successfully delete data"})
    );
    let (status, _) = call(&app, Method::GET, &item, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn store_failures_hide_the_cause() {
    let app = app(Arc::new(BrokenExecutor));
    let requests = [
        (Method::POST, BASE.to_string(), Some(json!({"name": "x"}))),
        (Method::GET, BASE.to_string(), None),
        (Method::GET, format!("{}/a", BASE), None),
        (Method::PATCH, format!("{}/a", BASE), Some(json!({"name": "y"}))),
        (Method::DELETE, format!("{}/a", BASE), None),
    ];
    for (method, path, body) in requests {
        let (status, envelope) = call(&app, method.clone(), &path, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{} {}", method, path);
        assert_eq!(
            envelope,
            json!({"status": false, "code": 500, "data": null, "message": "Internal server error"})
        );
    }
}
