//! Integration tests for accounts, posts, comments, likes, groups,
//! badges, categories, stories, and direct messages.

use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use agora_server::notify::dispatcher::Dispatcher;
use agora_server::storage::memory::MemStorage;
use agora_server::storage::Storage;

async fn start_test_server() -> String {
    let store: Arc<dyn Storage> = Arc::new(MemStorage::new());
    agora_server::categories::seed_default_categories(store.as_ref())
        .await
        .expect("Failed to seed categories");

    let connections = agora_server::ws::new_connection_registry();
    let (notification_tx, notification_rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(Dispatcher::new(connections.clone()).run(notification_rx));

    let state = agora_server::state::AppState {
        store,
        sessions: agora_server::auth::session::new_session_map(),
        connections,
        notification_tx,
    };

    let app = agora_server::routes::build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    format!("http://{}", addr)
}

async fn register_user(base_url: &str, username: &str) -> (String, i64) {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/api/auth/register", base_url))
        .json(&json!({ "username": username, "password": "motdepasse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201, "Registration failed for {}", username);
    let body: serde_json::Value = resp.json().await.unwrap();
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_i64().unwrap(),
    )
}

async fn create_post(base_url: &str, token: &str, content: &str, category_id: i64) -> i64 {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/api/posts", base_url))
        .bearer_auth(token)
        .json(&json!({ "content": content, "categoryId": category_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn register_login_logout_flow() {
    let base_url = start_test_server().await;
    let client = reqwest::Client::new();

    let (token, user_id) = register_user(&base_url, "alice").await;

    // The session works.
    let me: serde_json::Value = client
        .get(format!("{}/api/auth/me", base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["id"].as_i64(), Some(user_id));
    assert_eq!(me["username"], "alice");
    assert!(me.get("passwordDigest").is_none(), "digest must not leak");

    // Wrong password is rejected.
    let resp = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&json!({ "username": "alice", "password": "mauvais_mdp" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Fresh login works.
    let resp = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&json!({ "username": "alice", "password": "motdepasse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Logout revokes the original token.
    let resp = client
        .post(format!("{}/api/auth/logout", base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client
        .get(format!("{}/api/auth/me", base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn duplicate_and_invalid_usernames_rejected() {
    let base_url = start_test_server().await;
    let client = reqwest::Client::new();

    register_user(&base_url, "alice").await;

    let resp = client
        .post(format!("{}/api/auth/register", base_url))
        .json(&json!({ "username": "alice", "password": "motdepasse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    let resp = client
        .post(format!("{}/api/auth/register", base_url))
        .json(&json!({ "username": "ab", "password": "motdepasse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400, "Too-short username must be rejected");

    let resp = client
        .post(format!("{}/api/auth/register", base_url))
        .json(&json!({ "username": "charlie", "password": "court" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400, "Too-short password must be rejected");
}

#[tokio::test]
async fn posting_awards_experience() {
    let base_url = start_test_server().await;
    let (token, _) = register_user(&base_url, "alice").await;

    create_post(&base_url, &token, "mon post", 1).await;

    let client = reqwest::Client::new();
    let me: serde_json::Value = client
        .get(format!("{}/api/auth/me", base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["experience"].as_i64(), Some(50));
}

#[tokio::test]
async fn post_content_is_validated() {
    let base_url = start_test_server().await;
    let (token, _) = register_user(&base_url, "alice").await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/posts", base_url))
        .bearer_auth(&token)
        .json(&json!({ "content": "   ", "categoryId": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400, "Whitespace-only content must be rejected");

    let resp = client
        .post(format!("{}/api/posts", base_url))
        .bearer_auth(&token)
        .json(&json!({ "content": "x".repeat(4001), "categoryId": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);

    let resp = client
        .post(format!("{}/api/posts", base_url))
        .bearer_auth(&token)
        .json(&json!({ "content": "bonne catégorie requise", "categoryId": 99999 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404, "Unknown category must be rejected");
}

#[tokio::test]
async fn posts_filter_by_category_and_sort_by_likes_when_recommended() {
    let base_url = start_test_server().await;
    let (alice_token, _) = register_user(&base_url, "alice").await;
    let (bob_token, _) = register_user(&base_url, "bob").await;
    let client = reqwest::Client::new();

    let anime_post = create_post(&base_url, &alice_token, "post anime", 1).await;
    let tech_post = create_post(&base_url, &alice_token, "post tech", 2).await;

    client
        .post(format!("{}/api/posts/{}/like", base_url, anime_post))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();

    let filtered: Vec<serde_json::Value> = client
        .get(format!("{}/api/posts?categoryId=2", base_url))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["id"].as_i64(), Some(tech_post));
    assert_eq!(filtered[0]["user"]["username"], "alice");

    let recommended: Vec<serde_json::Value> = client
        .get(format!("{}/api/posts?recommended=true", base_url))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(recommended.len(), 2);
    assert_eq!(
        recommended[0]["id"].as_i64(),
        Some(anime_post),
        "Most-liked post comes first"
    );
}

#[tokio::test]
async fn comments_are_listed_oldest_first() {
    let base_url = start_test_server().await;
    let (token, _) = register_user(&base_url, "alice").await;
    let post_id = create_post(&base_url, &token, "un post", 1).await;
    let client = reqwest::Client::new();

    for i in 0..3 {
        let resp = client
            .post(format!("{}/api/posts/{}/comments", base_url, post_id))
            .bearer_auth(&token)
            .json(&json!({ "content": format!("commentaire {}", i) }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
    }

    let comments: Vec<serde_json::Value> = client
        .get(format!("{}/api/posts/{}/comments", base_url, post_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(comments.len(), 3);
    assert_eq!(comments[0]["content"], "commentaire 0");
    assert_eq!(comments[2]["content"], "commentaire 2");
    assert_eq!(comments[0]["user"]["username"], "alice");
}

#[tokio::test]
async fn like_toggles_on_and_off() {
    let base_url = start_test_server().await;
    let (alice_token, _) = register_user(&base_url, "alice").await;
    let (bob_token, _) = register_user(&base_url, "bob").await;
    let post_id = create_post(&base_url, &alice_token, "un post", 1).await;
    let client = reqwest::Client::new();

    let like: serde_json::Value = client
        .post(format!("{}/api/posts/{}/like", base_url, post_id))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(like["liked"], true);
    assert_eq!(like["count"].as_i64(), Some(1));

    let unlike: serde_json::Value = client
        .post(format!("{}/api/posts/{}/like", base_url, post_id))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unlike["liked"], false);
    assert_eq!(unlike["count"].as_i64(), Some(0));

    let count: serde_json::Value = client
        .get(format!("{}/api/posts/{}/likes", base_url, post_id))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(count["count"].as_i64(), Some(0));
}

#[tokio::test]
async fn group_membership_flow() {
    let base_url = start_test_server().await;
    let (alice_token, _) = register_user(&base_url, "alice").await;
    let (bob_token, _) = register_user(&base_url, "bob").await;
    let client = reqwest::Client::new();

    let group: serde_json::Value = client
        .post(format!("{}/api/groups", base_url))
        .bearer_auth(&alice_token)
        .json(&json!({ "name": "Club Rust", "description": "on parle de Rust" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let group_id = group["id"].as_i64().unwrap();

    let groups: Vec<serde_json::Value> = client
        .get(format!("{}/api/groups", base_url))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["name"], "Club Rust");

    let resp = client
        .post(format!("{}/api/groups/{}/join", base_url, group_id))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    // Leave is idempotent.
    for _ in 0..2 {
        let resp = client
            .post(format!("{}/api/groups/{}/leave", base_url, group_id))
            .bearer_auth(&bob_token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);
    }

    let resp = client
        .post(format!("{}/api/groups/{}/join", base_url, 99999))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn only_the_first_account_administers_badges() {
    let base_url = start_test_server().await;
    let (admin_token, _) = register_user(&base_url, "fondatrice").await;
    let (bob_token, bob_id) = register_user(&base_url, "bob").await;
    let client = reqwest::Client::new();

    let badge_body = json!({
        "name": "Pionnier",
        "description": "Parmi les premiers membres",
        "imageUrl": "/badges/pionnier.png",
        "requirement": "early_member"
    });

    // Second account is not admin.
    let resp = client
        .post(format!("{}/api/badges", base_url))
        .bearer_auth(&bob_token)
        .json(&badge_body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // First account is.
    let badge: serde_json::Value = client
        .post(format!("{}/api/badges", base_url))
        .bearer_auth(&admin_token)
        .json(&badge_body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let badge_id = badge["id"].as_i64().unwrap();

    let resp = client
        .post(format!("{}/api/users/{}/badges/{}", base_url, bob_id, badge_id))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let earned: Vec<serde_json::Value> = client
        .get(format!("{}/api/users/{}/badges", base_url, bob_id))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(earned.len(), 1);
    assert_eq!(earned[0]["name"], "Pionnier");
}

#[tokio::test]
async fn default_categories_are_seeded_and_creation_is_admin_only() {
    let base_url = start_test_server().await;
    let (admin_token, _) = register_user(&base_url, "fondatrice").await;
    let (bob_token, _) = register_user(&base_url, "bob").await;
    let client = reqwest::Client::new();

    let categories: Vec<serde_json::Value> = client
        .get(format!("{}/api/categories", base_url))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(categories.len(), 4);
    assert_eq!(categories[0]["name"], "Anime & Manga");
    assert_eq!(categories[0]["type"], "anime");

    let resp = client
        .post(format!("{}/api/categories", base_url))
        .bearer_auth(&bob_token)
        .json(&json!({ "name": "Jeux Vidéo", "type": "tech" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = client
        .post(format!("{}/api/categories", base_url))
        .bearer_auth(&admin_token)
        .json(&json!({ "name": "Jeux Vidéo", "type": "sport" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400, "Unknown category type must be rejected");

    let resp = client
        .post(format!("{}/api/categories", base_url))
        .bearer_auth(&admin_token)
        .json(&json!({ "name": "Jeux Vidéo", "type": "tech" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
}

#[tokio::test]
async fn stories_are_listed_and_views_deduplicated() {
    let base_url = start_test_server().await;
    let (alice_token, _) = register_user(&base_url, "alice").await;
    let (bob_token, _) = register_user(&base_url, "bob").await;
    let client = reqwest::Client::new();

    let story: serde_json::Value = client
        .post(format!("{}/api/stories", base_url))
        .bearer_auth(&alice_token)
        .json(&json!({ "content": "en direct du meetup" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let story_id = story["id"].as_i64().unwrap();

    let stories: Vec<serde_json::Value> = client
        .get(format!("{}/api/stories", base_url))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stories.len(), 1);

    // Two views by the same user count once.
    for _ in 0..2 {
        let views: serde_json::Value = client
            .post(format!("{}/api/stories/{}/view", base_url, story_id))
            .bearer_auth(&bob_token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(views["views"].as_i64(), Some(1));
    }
}

#[tokio::test]
async fn direct_messages_flow_and_read_marking() {
    let base_url = start_test_server().await;
    let (alice_token, alice_id) = register_user(&base_url, "alice").await;
    let (bob_token, bob_id) = register_user(&base_url, "bob").await;
    let client = reqwest::Client::new();

    // Cannot message yourself.
    let resp = client
        .post(format!("{}/api/messages/{}", base_url, alice_id))
        .bearer_auth(&alice_token)
        .json(&json!({ "content": "bonjour moi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{}/api/messages/{}", base_url, bob_id))
        .bearer_auth(&alice_token)
        .json(&json!({ "content": "salut bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    // Bob fetches the conversation; that marks Alice's message read.
    let conversation: Vec<serde_json::Value> = client
        .get(format!("{}/api/messages/{}", base_url, alice_id))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(conversation.len(), 1);
    assert_eq!(conversation[0]["content"], "salut bob");

    let conversation: Vec<serde_json::Value> = client
        .get(format!("{}/api/messages/{}", base_url, bob_id))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(conversation[0]["read"], true);
}
