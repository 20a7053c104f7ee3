use chrono::{Duration, DurationRound, Utc};
use parking_backend::{
    error::AppError,
    models::{
        parking_record::ParkingRecord,
        parking_session::{NavigationStatus, ParkingSession, SessionStatus, SpotType},
        PageRequest,
    },
    repositories::{
        ParkingDirectory, ParkingDirectoryTrait, ParkingSessionRepository,
        ParkingSessionRepositoryTrait, UserRepository, UserRepositoryTrait,
    },
    services::billing,
    types::ParkingSessionId,
};

mod support;

use support::{postgres_pool, seed_pg_driver};

macro_rules! pool_or_skip {
    () => {
        match postgres_pool().await {
            Some(pool) => pool,
            None => {
                eprintln!("skipping: set TEST_DATABASE_URL or USE_TESTCONTAINERS=1");
                return;
            }
        }
    };
}

fn new_session(
    user: &parking_backend::models::user::User,
    vehicle: &parking_backend::models::vehicle::Vehicle,
    lot: &parking_backend::models::parking_lot::ParkingLot,
) -> ParkingSession {
    // Postgres keeps microseconds; truncate so round-tripped rows compare equal.
    let now = Utc::now()
        .duration_trunc(Duration::seconds(1))
        .expect("truncate timestamp");
    let mut session = ParkingSession {
        id: ParkingSessionId::new(),
        user_id: user.id,
        vehicle_id: vehicle.id,
        parking_lot_id: lot.id,
        spot_code: "B2-017".into(),
        spot_type: SpotType::Vip,
        start_time: now,
        end_time: None,
        status: SessionStatus::Active,
        fee_rate: lot.first_hour_fee,
        extra_hour_rate: lot.extra_hour_rate,
        fee_current: 0.0,
        next_billing_time: None,
        next_fee_amount: None,
        current_billing_cycle: 0,
        pricing_rule: String::new(),
        navigation_status: NavigationStatus::EnRoute,
        remaining_distance_m: 2000,
        estimated_minutes: 40,
        total_distance_m: 2000,
        destination_lat: lot.latitude,
        destination_lon: lot.longitude,
        user_position_lat: Some(30.1),
        user_position_lon: None,
        progress_to_destination_percent: 0,
        version: 0,
        created_at: now,
        updated_at: now,
    };
    billing::initialize(&mut session, now);
    session
}

#[tokio::test]
async fn create_and_find_round_trip_enums_and_ids() {
    let pool = pool_or_skip!();
    let (user, vehicle, lot) = seed_pg_driver(&pool).await;
    let repo = ParkingSessionRepository::new(pool.clone());

    let session = new_session(&user, &vehicle, &lot);
    let created = repo.create(&session).await.expect("create session");
    assert_eq!(created.id, session.id);
    assert_eq!(created.spot_type, SpotType::Vip);
    assert_eq!(created.navigation_status, NavigationStatus::EnRoute);

    let active = repo
        .find_active_by_user(user.id)
        .await
        .expect("find active")
        .expect("active session");
    assert_eq!(active.id, session.id);
    assert_eq!(active.pricing_rule, "首小时10元，后续每小时5元");
    assert_eq!(active.start_time, session.start_time);

    let other_user = seed_pg_driver(&pool).await.0;
    let hidden = repo
        .find_by_id_and_user(session.id, other_user.id)
        .await
        .expect("find by id");
    assert!(hidden.is_none());
}

#[tokio::test]
async fn second_active_session_violates_unique_index() {
    let pool = pool_or_skip!();
    let (user, vehicle, lot) = seed_pg_driver(&pool).await;
    let repo = ParkingSessionRepository::new(pool.clone());

    repo.create(&new_session(&user, &vehicle, &lot))
        .await
        .expect("first session");
    let err = repo
        .create(&new_session(&user, &vehicle, &lot))
        .await
        .expect_err("second active session");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn stale_version_update_is_a_conflict() {
    let pool = pool_or_skip!();
    let (user, vehicle, lot) = seed_pg_driver(&pool).await;
    let repo = ParkingSessionRepository::new(pool.clone());
    let created = repo
        .create(&new_session(&user, &vehicle, &lot))
        .await
        .expect("create");

    let mut first = created.clone();
    first.remaining_distance_m = 1950;
    let saved = repo.update(&first).await.expect("first update");
    assert_eq!(saved.version, created.version + 1);
    assert_eq!(saved.remaining_distance_m, 1950);

    let mut stale = created.clone();
    stale.remaining_distance_m = 1900;
    let err = repo.update(&stale).await.expect_err("stale update");
    assert!(matches!(err, AppError::Conflict(_)));

    let stored = repo
        .find_by_id_and_user(created.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.remaining_distance_m, 1950);
}

#[tokio::test]
async fn end_with_record_commits_both_writes() {
    let pool = pool_or_skip!();
    let (user, vehicle, lot) = seed_pg_driver(&pool).await;
    let repo = ParkingSessionRepository::new(pool.clone());
    let created = repo
        .create(&new_session(&user, &vehicle, &lot))
        .await
        .expect("create");

    let end = created.start_time + Duration::minutes(90);
    let mut ending = created.clone();
    billing::settle(&mut ending, end).unwrap();
    ending.end_time = Some(end);
    ending.status = SessionStatus::Ended;
    let record = ParkingRecord::for_session(&ending, end);

    let ended = repo.end_with_record(&ending, &record).await.expect("pay");
    assert_eq!(ended.status, SessionStatus::Ended);
    assert_eq!(ended.fee_current, 15.0);

    let fee: f64 = sqlx::query_scalar("SELECT fee FROM parking_records WHERE session_id = $1")
        .bind(created.id)
        .fetch_one(&pool)
        .await
        .expect("record row");
    assert_eq!(fee, 15.0);

    assert!(repo.find_active_by_user(user.id).await.unwrap().is_none());
    assert_eq!(repo.count_ended_by_user(user.id).await.unwrap(), 1);
    let page = repo
        .list_ended_by_user(user.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].end_time, Some(end));
}

#[tokio::test]
async fn failed_record_insert_rolls_back_session_update() {
    let pool = pool_or_skip!();
    let (user, vehicle, lot) = seed_pg_driver(&pool).await;
    let repo = ParkingSessionRepository::new(pool.clone());
    let created = repo
        .create(&new_session(&user, &vehicle, &lot))
        .await
        .expect("create");

    let end = created.start_time + Duration::minutes(30);
    let mut ending = created.clone();
    billing::settle(&mut ending, end).unwrap();
    ending.end_time = Some(end);
    ending.status = SessionStatus::Ended;
    let record = ParkingRecord::for_session(&ending, end);

    // Occupy the receipt's primary key so the insert inside the transaction fails.
    let decoy_session = ParkingSessionId::new();
    sqlx::query(
        "INSERT INTO parking_sessions (id, user_id, vehicle_id, parking_lot_id, spot_code, \
            start_time, end_time, status, fee_rate, extra_hour_rate, remaining_distance_m, \
            estimated_minutes, total_distance_m, destination_lat, destination_lon) \
         VALUES ($1, $2, $3, $4, 'X', $5, $5, 'ended', 0, 0, 0, 0, 0, 0, 0)",
    )
    .bind(decoy_session)
    .bind(user.id)
    .bind(vehicle.id)
    .bind(lot.id)
    .bind(end)
    .execute(&pool)
    .await
    .expect("decoy session");
    let mut decoy = record.clone();
    decoy.session_id = decoy_session;
    sqlx::query(
        "INSERT INTO parking_records (id, session_id, user_id, vehicle_id, parking_lot_id, \
            spot_code, spot_type, start_time, end_time, fee, duration_hours, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(decoy.id)
    .bind(decoy.session_id)
    .bind(decoy.user_id)
    .bind(decoy.vehicle_id)
    .bind(decoy.parking_lot_id)
    .bind(&decoy.spot_code)
    .bind(decoy.spot_type)
    .bind(decoy.start_time)
    .bind(decoy.end_time)
    .bind(decoy.fee)
    .bind(decoy.duration_hours)
    .bind(decoy.created_at)
    .execute(&pool)
    .await
    .expect("decoy record");

    let err = repo
        .end_with_record(&ending, &record)
        .await
        .expect_err("record insert must fail");
    assert!(matches!(err, AppError::InternalServerError(_)));

    let stored = repo
        .find_by_id_and_user(created.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, SessionStatus::Active);
    assert!(stored.end_time.is_none());
    assert_eq!(stored.version, created.version);
    assert_eq!(stored.next_billing_time, created.next_billing_time);
}

#[tokio::test]
async fn directory_and_users_resolve_seeded_rows() {
    let pool = pool_or_skip!();
    let (user, vehicle, lot) = seed_pg_driver(&pool).await;

    let directory = ParkingDirectory::new(pool.clone());
    let found = directory
        .find_vehicle(vehicle.id)
        .await
        .unwrap()
        .expect("vehicle");
    assert!(found.is_owned_by(user.id));
    let found_lot = directory
        .find_parking_lot(lot.id)
        .await
        .unwrap()
        .expect("lot");
    assert_eq!(found_lot.first_hour_fee, 10.0);
    assert_eq!(found_lot.position(), lot.position());

    let users = UserRepository::new(pool.clone());
    let by_name = users
        .find_by_username(&user.username)
        .await
        .unwrap()
        .expect("user by name");
    assert_eq!(by_name.id, user.id);
    assert!(users.find_by_id(by_name.id).await.unwrap().is_some());
}
