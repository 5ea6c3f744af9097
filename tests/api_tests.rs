use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{
    multipart::{MultipartForm, Part},
    TestRequest, TestServer,
};
use serde_json::{json, Value};
use uuid::Uuid;

use recipe_box::{
    api::{create_router, AppState},
    db::MemoryRecipeStore,
    services::{PhotoStorage, RecipeService},
};

const MAX_PHOTO_BYTES: u64 = 1024;

fn create_test_server() -> TestServer {
    let dir = std::env::temp_dir().join(format!("recipe-box-api-{}", Uuid::new_v4()));
    let service = RecipeService::new(
        Arc::new(MemoryRecipeStore::new()),
        PhotoStorage::new(dir, MAX_PHOTO_BYTES),
    );
    let app = create_router(AppState::with_service(service));
    TestServer::new(app).unwrap()
}

fn as_user(request: TestRequest, user: Uuid, role: &str) -> TestRequest {
    request
        .add_header(
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_str(&user.to_string()).unwrap(),
        )
        .add_header(
            HeaderName::from_static("x-user-role"),
            HeaderValue::from_str(role).unwrap(),
        )
}

fn recipe_body(title: &str) -> Value {
    json!({
        "title": title,
        "description": "A weeknight staple",
        "cuisine": "Italian",
        "difficulty": "easy",
        "tags": ["dinner"],
        "ingredients": [
            { "name": "spaghetti", "quantity": 200, "unit": "g" },
            { "name": "garlic", "quantity": 3, "unit": "clove" }
        ],
        "instructions": [
            { "step": "Boil the pasta", "order": 1 },
            { "step": "Fry the garlic", "order": 2, "timer": { "duration": 2, "unit": "minutes" } }
        ]
    })
}

async fn create_recipe(server: &TestServer, owner: Uuid, title: &str) -> String {
    let response = as_user(server.post("/api/v1/recipes"), owner, "user")
        .json(&recipe_body(title))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    created["data"]["id"].as_str().unwrap().to_string()
}

async fn rate(server: &TestServer, id: &str, user: Uuid, body: Value) -> Value {
    let response = as_user(server.post(&format!("/api/v1/recipes/{}/rating", id)), user, "user")
        .json(&body)
        .await;
    response.assert_status_ok();
    response.json()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert!(!response.header("x-request-id").is_empty());
}

#[tokio::test]
async fn test_create_requires_identity() {
    let server = create_test_server();

    let response = server.post("/api/v1/recipes").json(&recipe_body("Carbonara")).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_create_and_get_recipe() {
    let server = create_test_server();
    let owner = Uuid::new_v4();

    let response = as_user(server.post("/api/v1/recipes"), owner, "chef")
        .json(&recipe_body("Aglio e olio"))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["success"], true);
    assert_eq!(created["data"]["title"], "Aglio e olio");
    assert_eq!(created["data"]["user"], owner.to_string());
    assert_eq!(created["data"]["servings"], 4);
    assert_eq!(created["data"]["views"], 0);
    assert_eq!(created["data"]["averageRating"], 0.0);

    let id = created["data"]["id"].as_str().unwrap();
    let response = server.get(&format!("/api/v1/recipes/{}", id)).await;
    response.assert_status_ok();
    let fetched: Value = response.json();
    assert_eq!(fetched["data"]["title"], "Aglio e olio");
    assert_eq!(fetched["data"]["ingredients"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_reports_missing_fields() {
    let server = create_test_server();

    let response = as_user(server.post("/api/v1/recipes"), Uuid::new_v4(), "user")
        .json(&json!({ "title": "No description" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("Please add a description"));
    assert!(message.contains("Please add a cuisine type"));
}

#[tokio::test]
async fn test_each_read_counts_one_view() {
    let server = create_test_server();
    let id = create_recipe(&server, Uuid::new_v4(), "Risotto").await;

    for expected in 1..=3 {
        let fetched: Value = server.get(&format!("/api/v1/recipes/{}", id)).await.json();
        assert_eq!(fetched["data"]["views"], expected);
    }
}

#[tokio::test]
async fn test_unknown_and_malformed_ids_are_not_found() {
    let server = create_test_server();

    let response = server.get(&format!("/api/v1/recipes/{}", Uuid::new_v4())).await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server.get("/api/v1/recipes/not-an-id").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "Recipe not found with id of not-an-id");
}

#[tokio::test]
async fn test_rating_flow_keeps_one_rating_per_user() {
    let server = create_test_server();
    let id = create_recipe(&server, Uuid::new_v4(), "Lasagne").await;
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    let body = rate(&server, &id, a, json!({ "rating": 4, "comment": "solid" })).await;
    assert_eq!(body["data"]["averageRating"], 4.0);
    assert_eq!(body["data"]["ratings"].as_array().unwrap().len(), 1);

    let body = rate(&server, &id, a, json!({ "rating": 5 })).await;
    let ratings = body["data"]["ratings"].as_array().unwrap();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0]["rating"], 5);
    assert_eq!(ratings[0]["comment"], "solid");
    assert_eq!(body["data"]["averageRating"], 5.0);

    let body = rate(&server, &id, b, json!({ "rating": 3 })).await;
    assert_eq!(body["data"]["ratings"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["averageRating"], 4.0);

    let body = rate(&server, &id, b, json!({ "rating": 2 })).await;
    assert_eq!(body["data"]["ratings"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["averageRating"], 3.5);
}

#[tokio::test]
async fn test_invalid_ratings_are_rejected() {
    let server = create_test_server();
    let id = create_recipe(&server, Uuid::new_v4(), "Tiramisu").await;
    let rater = Uuid::new_v4();

    for body in [json!({ "rating": 6 }), json!({ "rating": 0 }), json!({ "rating": 4.5 })] {
        let response =
            as_user(server.post(&format!("/api/v1/recipes/{}/rating", id)), rater, "user")
                .json(&body)
                .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    let fetched: Value = server.get(&format!("/api/v1/recipes/{}", id)).await.json();
    assert!(fetched["data"]["ratings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_favorite_toggle_and_favorites_listing() {
    let server = create_test_server();
    let id = create_recipe(&server, Uuid::new_v4(), "Panna cotta").await;
    let fan = Uuid::new_v4();
    let path = format!("/api/v1/recipes/{}/favorite", id);

    let response = as_user(server.put(&path), fan, "user").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"], json!({ "isFavorited": true, "favoriteCount": 1 }));

    let favorites: Value = as_user(server.get("/api/v1/recipes/favorites"), fan, "user")
        .await
        .json();
    assert_eq!(favorites["count"], 1);
    assert_eq!(favorites["data"][0]["id"], id);

    let body: Value = as_user(server.put(&path), fan, "user").await.json();
    assert_eq!(body["data"], json!({ "isFavorited": false, "favoriteCount": 0 }));

    let favorites: Value = as_user(server.get("/api/v1/recipes/favorites"), fan, "user")
        .await
        .json();
    assert_eq!(favorites["count"], 0);
}

#[tokio::test]
async fn test_non_owner_cannot_modify() {
    let server = create_test_server();
    let id = create_recipe(&server, Uuid::new_v4(), "Gnocchi").await;
    let stranger = Uuid::new_v4();
    let path = format!("/api/v1/recipes/{}", id);

    let response = as_user(server.put(&path), stranger, "chef")
        .json(&json!({ "title": "Stolen gnocchi" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = as_user(server.delete(&path), stranger, "user").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0u8; 8]).file_name("g.png").mime_type("image/png"),
    );
    let response = as_user(server.put(&format!("{}/photo", path)), stranger, "user")
        .multipart(form)
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let fetched: Value = server.get(&path).await.json();
    assert_eq!(fetched["data"]["title"], "Gnocchi");
    assert!(fetched["data"].get("photo").is_none());
}

#[tokio::test]
async fn test_owner_updates_and_admin_deletes() {
    let server = create_test_server();
    let owner = Uuid::new_v4();
    let id = create_recipe(&server, owner, "Minestrone").await;
    let path = format!("/api/v1/recipes/{}", id);

    let response = as_user(server.put(&path), owner, "user")
        .json(&json!({ "servings": 6, "views": 1000 }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["data"]["servings"], 6);
    assert_eq!(updated["data"]["views"], 0);

    let response = as_user(server.delete(&path), Uuid::new_v4(), "admin").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({ "success": true, "data": {} }));

    server.get(&path).await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_photo_upload() {
    let server = create_test_server();
    let owner = Uuid::new_v4();
    let id = create_recipe(&server, owner, "Focaccia").await;
    let path = format!("/api/v1/recipes/{}/photo", id);

    let not_an_image = MultipartForm::new().add_part(
        "file",
        Part::text("hello").file_name("notes.txt").mime_type("text/plain"),
    );
    let response = as_user(server.put(&path), owner, "user")
        .multipart(not_an_image)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Please upload an image file");

    let too_big = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0u8; MAX_PHOTO_BYTES as usize + 1])
            .file_name("big.png")
            .mime_type("image/png"),
    );
    let response = as_user(server.put(&path), owner, "user").multipart(too_big).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = as_user(server.put(&path), owner, "user").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Please upload a file");

    let photo = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0u8; 64]).file_name("focaccia.jpg").mime_type("image/jpeg"),
    );
    let response = as_user(server.put(&path), owner, "user").multipart(photo).await;
    response.assert_status_ok();
    let body: Value = response.json();
    let expected = format!("photo_{}.jpg", id);
    assert_eq!(body["data"], expected.as_str());

    let fetched: Value = server.get(&format!("/api/v1/recipes/{}", id)).await.json();
    assert_eq!(fetched["data"]["photo"], expected.as_str());
}

fn oversized_photo() -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0u8; 200 * 1024])
            .file_name("huge.png")
            .mime_type("image/png"),
    )
}

#[tokio::test]
async fn test_oversized_upload_checks_recipe_and_owner_first() {
    let server = create_test_server();
    let owner = Uuid::new_v4();
    let id = create_recipe(&server, owner, "Baguette").await;
    let path = format!("/api/v1/recipes/{}/photo", id);

    let response = as_user(server.put(&path), Uuid::new_v4(), "user")
        .multipart(oversized_photo())
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let missing = format!("/api/v1/recipes/{}/photo", Uuid::new_v4());
    let response = as_user(server.put(&missing), owner, "user")
        .multipart(oversized_photo())
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = as_user(server.put(&path), owner, "user")
        .multipart(oversized_photo())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(
        body["error"],
        format!("Please upload an image less than {}", MAX_PHOTO_BYTES).as_str()
    );

    let fetched: Value = server.get(&format!("/api/v1/recipes/{}", id)).await.json();
    assert!(fetched["data"].get("photo").is_none());
}

#[tokio::test]
async fn test_separator_only_sort_uses_default_order() {
    let server = create_test_server();
    let owner = Uuid::new_v4();
    create_recipe(&server, owner, "First").await;
    create_recipe(&server, owner, "Second").await;

    let response = server.get("/api/v1/recipes").add_query_param("sort", ",").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["title"], "Second");
}

#[tokio::test]
async fn test_top_rated_and_user_listing() {
    let server = create_test_server();
    let owner = Uuid::new_v4();
    let great = create_recipe(&server, owner, "Great").await;
    let good = create_recipe(&server, owner, "Good").await;
    let meh = create_recipe(&server, Uuid::new_v4(), "Meh").await;

    rate(&server, &great, Uuid::new_v4(), json!({ "rating": 5 })).await;
    rate(&server, &good, Uuid::new_v4(), json!({ "rating": 4 })).await;
    rate(&server, &meh, Uuid::new_v4(), json!({ "rating": 3 })).await;

    let top: Value = server.get("/api/v1/recipes/top-rated").await.json();
    assert_eq!(top["count"], 2);
    assert_eq!(top["data"][0]["id"], great);
    assert_eq!(top["data"][1]["id"], good);

    let mine: Value = server
        .get(&format!("/api/v1/recipes/user/{}", owner))
        .await
        .json();
    assert_eq!(mine["count"], 2);
}

#[tokio::test]
async fn test_listing_pagination_and_filters() {
    let server = create_test_server();
    let owner = Uuid::new_v4();
    for i in 0..3 {
        create_recipe(&server, owner, &format!("Pasta {}", i)).await;
    }

    let response = server
        .get("/api/v1/recipes")
        .add_query_param("limit", 2)
        .add_query_param("sort", "title")
        .await;
    response.assert_status_ok();
    let page: Value = response.json();
    assert_eq!(page["count"], 2);
    assert_eq!(page["data"][0]["title"], "Pasta 0");
    assert_eq!(page["pagination"], json!({ "next": { "page": 2, "limit": 2 } }));

    let page: Value = server
        .get("/api/v1/recipes")
        .add_query_param("cuisine", "thai")
        .await
        .json();
    assert_eq!(page["count"], 0);

    let response = server
        .get("/api/v1/recipes")
        .add_query_param("sort", "secret")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
