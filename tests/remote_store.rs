use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use seat_booking::config::RemoteStoreConfig;
use seat_booking::models::{BookedSeat, NewBooking, NewUser};
use seat_booking::services::selection::BookingMode;
use seat_booking::store::{BookingStore, RemoteBookingStore, StoreError};

fn store(server: &MockServer, failure_threshold: u32) -> RemoteBookingStore {
    RemoteBookingStore::from_config(&RemoteStoreConfig {
        base_url: format!("{}/api/", server.uri()),
        timeout_seconds: 5,
        failure_threshold,
        breaker_timeout_seconds: 60,
    })
    .unwrap()
}

fn remote_booking(id: &str, user: &str, date: &str) -> serde_json::Value {
    json!({
        "_id": id,
        "user": user,
        "date": date,
        "venue": "Main Office",
        "building": "A",
        "floor": "1",
        "bookingType": "self",
        "seats": [{"id": 3}],
        "__v": 0
    })
}

#[tokio::test]
async fn users_lookup_and_create() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(query_param("email", "ann@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "u1", "name": "Ann", "email": "ann@example.com"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/users"))
        .and(body_partial_json(json!({"email": "bob@example.com"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!(
            {"_id": "u2", "name": "Bob", "email": "bob@example.com"}
        )))
        .mount(&server)
        .await;

    let store = store(&server, 5);
    let ann = store.find_user_by_email("ann@example.com").await.unwrap().unwrap();
    assert_eq!(ann.id, "u1");

    let bob = store
        .create_user(&NewUser { name: "Bob".to_string(), email: "bob@example.com".to_string() })
        .await
        .unwrap();
    assert_eq!(bob.id, "u2");
}

#[tokio::test]
async fn bookings_are_filtered_by_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            remote_booking("b1", "u1", "2099-03-01"),
            remote_booking("b2", "u2", "2099-03-02"),
        ])))
        .mount(&server)
        .await;

    let bookings = store(&server, 5).list_bookings("u1").await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].id, "b1");
    assert_eq!(bookings[0].record.mode, BookingMode::Solo);
    assert_eq!(bookings[0].record.seat_ids(), vec![3]);
}

#[tokio::test]
async fn create_and_missing_booking() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bookings"))
        .and(body_partial_json(json!({"bookingType": "self", "seats": [{"id": 3}]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(remote_booking("b9", "u1", "2099-03-01")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/bookings/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = store(&server, 5);
    let booking = solo_booking();
    let created = store.create_booking(&booking).await.unwrap();
    assert_eq!(created.id, "b9");
    assert_eq!(created.record, booking);

    assert!(matches!(store.get_booking("missing").await, Err(StoreError::NotFound(_))));
}

fn solo_booking() -> NewBooking {
    NewBooking {
        user: "u1".to_string(),
        date: chrono::NaiveDate::from_ymd_opt(2099, 3, 1).unwrap(),
        venue: "Main Office".to_string(),
        building: "A".to_string(),
        floor: "1".to_string(),
        mode: BookingMode::Solo,
        seats: vec![BookedSeat { id: 3 }],
        team_members: Vec::new(),
    }
}

#[tokio::test]
async fn client_errors_keep_the_store_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bookings"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "Seat already booked"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/bookings/b1"))
        .respond_with(ResponseTemplate::new(409).set_body_string("conflict"))
        .mount(&server)
        .await;

    let store = store(&server, 1);
    match store.create_booking(&solo_booking()).await {
        Err(StoreError::Rejected { conflict, message }) => {
            assert!(!conflict);
            assert_eq!(message, "Seat already booked");
        }
        other => panic!("unexpected result {:?}", other),
    }

    // тело без message: текст собирается из статуса
    match store.update_booking("b1", &solo_booking()).await {
        Err(StoreError::Rejected { conflict, message }) => {
            assert!(conflict);
            assert!(message.contains("409"));
        }
        other => panic!("unexpected result {:?}", other),
    }

    // отказы клиента не открывают breaker даже при пороге 1
    assert!(matches!(store.create_booking(&solo_booking()).await, Err(StoreError::Rejected { .. })));
}

#[tokio::test]
async fn breaker_opens_after_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/bookings/b1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let store = store(&server, 2);
    for _ in 0..2 {
        assert!(matches!(store.get_booking("b1").await, Err(StoreError::Backend(_))));
    }

    // третий запрос не доходит до сервера
    assert!(matches!(store.get_booking("b1").await, Err(StoreError::Unavailable)));
}
