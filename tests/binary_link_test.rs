mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::*;
use rust_image_backend::entities::{images, prelude::*};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tower::ServiceExt;

/// Uploads a 200x200 PNG for the token's owner and returns the new image id.
async fn upload_image(t: &TestApp, user_id: &str, token: &str) -> i32 {
    let response = t
        .app
        .clone()
        .oneshot(upload_request(Some(token), "source.png", &png_bytes(200, 200)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    Images::find()
        .filter(images::Column::UserId.eq(user_id))
        .order_by_desc(images::Column::Id)
        .one(&t.db)
        .await
        .unwrap()
        .unwrap()
        .id
}

fn link_path(link: &str) -> String {
    link.strip_prefix(PUBLIC_URL).unwrap().to_string()
}

#[tokio::test]
async fn test_exist_seconds_bounds() {
    let t = TestApp::new().await;
    let (user, token) = t.user("ent", Some("Enterprise")).await;
    let image_id = upload_image(&t, &user.id, &token).await;
    let ops_before = t.storage.ops();

    for bad in [0, 299, 30_001, -5] {
        let response = t
            .app
            .clone()
            .oneshot(create_link_request(image_id, Some(&token), bad))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{} accepted", bad);
    }
    assert_eq!(BinaryImageLinks::find().count(&t.db).await.unwrap(), 0);
    assert_eq!(t.storage.ops(), ops_before);

    for good in [300, 30_000] {
        let response = t
            .app
            .clone()
            .oneshot(create_link_request(image_id, Some(&token), good))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    assert_eq!(BinaryImageLinks::find().count(&t.db).await.unwrap(), 2);
}

#[tokio::test]
async fn test_link_requires_owned_image() {
    let t = TestApp::new().await;
    let (owner, owner_token) = t.user("owner", Some("Enterprise")).await;
    let (_, intruder) = t.user("intruder", Some("Enterprise")).await;
    let image_id = upload_image(&t, &owner.id, &owner_token).await;

    let response = t
        .app
        .clone()
        .oneshot(create_link_request(image_id, Some(&intruder), 300))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Image not found");

    let response = t
        .app
        .clone()
        .oneshot(create_link_request(image_id + 100, Some(&owner_token), 300))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // out-of-range lifetime wins over a missing image
    let response = t
        .app
        .clone()
        .oneshot(create_link_request(image_id + 100, Some(&owner_token), 10))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(BinaryImageLinks::find().count(&t.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_link_lifecycle_expires_and_cleans_up() {
    let t = TestApp::new().await;
    let (user, token) = t.user("ent", Some("Enterprise")).await;
    let image_id = upload_image(&t, &user.id, &token).await;

    let response = t
        .app
        .clone()
        .oneshot(create_link_request(image_id, Some(&token), 300))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let link = body_json(response).await["link"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(link.starts_with("http://testserver/images/"));
    let path = link_path(&link);

    let record = BinaryImageLinks::find().one(&t.db).await.unwrap().unwrap();
    assert_eq!(path, format!("/images/{}/", record.id));
    assert_eq!(record.exist_seconds, 300);
    assert!(record.file_key.starts_with("uploads/ent/binary/"));

    // stored rendition is single-channel
    let png = t.storage.get(&record.file_key).unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!(decoded.color(), image::ColorType::L8);

    // valid, and can be fetched repeatedly
    for _ in 0..2 {
        let response = t
            .app
            .clone()
            .oneshot(get_request(&path, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["image"],
            format!("{}/{}", MEDIA_URL, record.file_key)
        );
    }

    t.clock.advance(Duration::seconds(301));

    let response = t
        .app
        .clone()
        .oneshot(get_request(&path, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["image"], "Link expired");

    assert_eq!(BinaryImageLinks::find().count(&t.db).await.unwrap(), 0);
    assert!(!t.storage.contains(&record.file_key));

    let response = t
        .app
        .clone()
        .oneshot(get_request(&path, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["image"], "Link expired");
    assert_eq!(t.storage.deletes_of(&record.file_key), 1);
}

#[tokio::test]
async fn test_link_expires_exactly_at_deadline() {
    let t = TestApp::new().await;
    let (user, token) = t.user("ent", Some("Enterprise")).await;
    let image_id = upload_image(&t, &user.id, &token).await;

    let response = t
        .app
        .clone()
        .oneshot(create_link_request(image_id, Some(&token), 300))
        .await
        .unwrap();
    let path = link_path(body_json(response).await["link"].as_str().unwrap());

    t.clock.advance(Duration::seconds(299));
    let response = t
        .app
        .clone()
        .oneshot(get_request(&path, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    t.clock.advance(Duration::seconds(1));
    let response = t
        .app
        .clone()
        .oneshot(get_request(&path, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_link_looks_expired() {
    let t = TestApp::new().await;

    let response = t
        .app
        .clone()
        .oneshot(get_request(
            "/images/00000000-0000-4000-8000-000000000000/",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["image"], "Link expired");
    assert_eq!(t.storage.ops(), 0);
}

#[tokio::test]
async fn test_concurrent_expired_retrievals_delete_file_once() {
    let t = TestApp::new().await;
    let (user, token) = t.user("ent", Some("Enterprise")).await;
    let image_id = upload_image(&t, &user.id, &token).await;

    let response = t
        .app
        .clone()
        .oneshot(create_link_request(image_id, Some(&token), 300))
        .await
        .unwrap();
    let path = link_path(body_json(response).await["link"].as_str().unwrap());
    let record = BinaryImageLinks::find().one(&t.db).await.unwrap().unwrap();

    t.clock.advance(Duration::seconds(300));

    let requests = (0..4).map(|_| t.app.clone().oneshot(get_request(&path, None)));
    let responses = futures::future::join_all(requests).await;

    for response in responses {
        assert_eq!(response.unwrap().status(), StatusCode::BAD_REQUEST);
    }
    assert_eq!(t.storage.deletes_of(&record.file_key), 1);
    assert_eq!(BinaryImageLinks::find().count(&t.db).await.unwrap(), 0);
}
