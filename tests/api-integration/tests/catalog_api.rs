use animalandia_api_integration::TestServer;
use animalandia_backend::write_gate::WriteMode;
use serde_json::{json, Value};

fn kibble() -> Value {
    json!({
        "type": "Cat Food",
        "brand": "Purina",
        "name": "Kibble",
        "price": 199.5,
        "img": "x.png"
    })
}

#[tokio::test]
async fn empty_store_lists_empty_array() {
    let server = TestServer::start().await;
    let (status, body) = server.get_json("/api/catfood").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn create_assigns_first_id_and_defaults() {
    let server = TestServer::start().await;
    let (status, body) = server.post_json("/api/catfood", &kibble()).await;
    assert_eq!(status, 201);
    assert_eq!(body["message"], "Product created successfully");
    assert_eq!(body["product"]["id"], "CF-1");
    assert_eq!(body["product"]["stock"], false);
    assert_eq!(body["product"]["desc"], "No description provided.");

    let stored = server.stored_products();
    assert_eq!(stored.as_array().unwrap().len(), 1);
    assert_eq!(stored[0]["id"], "CF-1");
    assert_eq!(stored[0]["type"], "Cat Food");
}

#[tokio::test]
async fn create_continues_existing_prefix_counter() {
    let server = TestServer::start_with_products(json!([{
        "id": "DF-3", "type": "Dog Food", "brand": "Pedigree", "name": "Chunks",
        "price": 80, "img": "d.png", "stock": true, "desc": "Beefy"
    }]))
    .await;
    let (status, body) = server
        .post_json(
            "/api/catfood",
            &json!({"type": "Dog Food", "brand": "Pedigree", "name": "Stew", "price": 90, "stock": "true"}),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(body["product"]["id"], "DF-4");
    assert_eq!(body["product"]["stock"], true);

    let (_, list) = server.get_json("/api/catfood").await;
    let ids: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["DF-3", "DF-4"]);
}

#[tokio::test]
async fn create_with_bad_input_is_400_and_leaves_file_alone() {
    let server = TestServer::start().await;
    server.post_json("/api/catfood", &kibble()).await;
    let before = server.stored_products();

    let (status, body) = server
        .post_json(
            "/api/catfood",
            &json!({"type": "Fish Food", "brand": "B", "name": "N", "price": 1}),
        )
        .await;
    assert_eq!(status, 400);
    assert!(body["message"].as_str().unwrap().contains("Fish Food"));

    let (status, body) = server
        .post_json("/api/catfood", &json!({"type": "Cat Food"}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Missing required fields: brand, name, price");

    assert_eq!(server.stored_products(), before);
}

#[tokio::test]
async fn malformed_body_is_structured_400() {
    let server = TestServer::start().await;
    let resp = server
        .client
        .post(server.url("/api/catfood"))
        .header("content-type", "application/json")
        .body("{ nope")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn update_merges_patch_and_pins_id() {
    let server = TestServer::start().await;
    server.post_json("/api/catfood", &kibble()).await;

    let (status, body) = server
        .put_json(
            "/api/catfood/CF-1",
            &json!({"id": "HP-9", "price": 120, "stock": "true"}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Product updated successfully");
    assert_eq!(body["product"]["id"], "CF-1");
    assert_eq!(body["product"]["price"], 120.0);
    assert_eq!(body["product"]["stock"], true);
    assert_eq!(body["product"]["brand"], "Purina");
    assert_eq!(body["product"]["img"], "x.png");

    let stored = server.stored_products();
    assert_eq!(stored[0], body["product"]);
}

#[tokio::test]
async fn update_unknown_id_is_404() {
    let server = TestServer::start().await;
    server.post_json("/api/catfood", &kibble()).await;
    let before = server.stored_products();

    let (status, body) = server
        .put_json("/api/catfood/CF-42", &json!({"price": 1}))
        .await;
    assert_eq!(status, 404);
    assert!(body["message"].as_str().unwrap().contains("CF-42"));
    assert_eq!(server.stored_products(), before);
}

#[tokio::test]
async fn empty_update_body_leaves_product_unchanged() {
    let server = TestServer::start().await;
    server.post_json("/api/catfood", &kibble()).await;
    let before = server.stored_products();

    let resp = server
        .client
        .put(server.url("/api/catfood/CF-1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["product"], before[0]);
    assert_eq!(server.stored_products(), before);
}

#[tokio::test]
async fn update_unknown_id_with_bad_patch_is_404() {
    let server = TestServer::start().await;
    let (status, _) = server
        .put_json("/api/catfood/ZZ-9", &json!({"price": -1}))
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn one_bad_record_does_not_blank_the_catalog() {
    let server = TestServer::start_with_products(json!([
        {"id": "CF-1", "type": "Cat Food", "brand": "Purina", "name": "Kibble", "price": 10},
        {"id": "DF-1", "type": "Dog Food", "brand": "Pedigree", "name": "Chunks",
         "price": "80", "stock": "true"},
        {"id": "CF-6", "brand": "Legacy", "name": "Untyped", "price": 5}
    ]))
    .await;

    let (status, list) = server.get_json("/api/catfood").await;
    assert_eq!(status, 200);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list[1]["price"], 80.0);
    assert_eq!(list[1]["stock"], true);
    assert_eq!(
        list[2],
        json!({"id": "CF-6", "brand": "Legacy", "name": "Untyped", "price": 5})
    );

    let (status, body) = server.post_json("/api/catfood", &kibble()).await;
    assert_eq!(status, 201);
    assert_eq!(body["product"]["id"], "CF-7");

    let (status, _) = server.delete("/api/catfood/CF-1").await;
    assert_eq!(status, 200);
    let stored = server.stored_products();
    let ids: Vec<&str> = stored
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["DF-1", "CF-6", "CF-7"]);
}

#[tokio::test]
async fn delete_removes_product() {
    let server = TestServer::start().await;
    server.post_json("/api/catfood", &kibble()).await;
    server.post_json("/api/catfood", &kibble()).await;

    let (status, body) = server.delete("/api/catfood/CF-1").await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Product deleted successfully");

    let (_, list) = server.get_json("/api/catfood").await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], "CF-2");
}

#[tokio::test]
async fn delete_unknown_id_is_404() {
    let server = TestServer::start().await;
    server.post_json("/api/catfood", &kibble()).await;

    let (status, _) = server.delete("/api/catfood/AC-1").await;
    assert_eq!(status, 404);
    assert_eq!(server.stored_products().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn corrupt_product_file_lists_empty_and_rejects_writes() {
    let server = TestServer::start().await;
    std::fs::write(server.products_path(), "not json").unwrap();

    let (status, body) = server.get_json("/api/catfood").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!([]));

    let (status, body) = server.post_json("/api/catfood", &kibble()).await;
    assert_eq!(status, 500);
    assert_eq!(body["message"], "Request failed due to a server error.");
    assert_eq!(
        std::fs::read_to_string(server.products_path()).unwrap(),
        "not json"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn serialized_writes_keep_concurrent_creates_unique() {
    let server = TestServer::start_with(None, WriteMode::Serialized).await;

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let client = server.client.clone();
        let url = server.url("/api/catfood");
        tasks.push(tokio::spawn(async move {
            let resp = client.post(url).json(&kibble()).send().await.unwrap();
            assert_eq!(resp.status().as_u16(), 201);
            let body: Value = resp.json().await.unwrap();
            body["product"]["id"].as_str().unwrap().to_string()
        }));
    }
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);
    assert_eq!(server.stored_products().as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn health_reports_counts() {
    let server = TestServer::start().await;
    server.post_json("/api/catfood", &kibble()).await;
    let (status, body) = server.get_json("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["products"], 1);
    assert_eq!(body["users"], 1);
}
