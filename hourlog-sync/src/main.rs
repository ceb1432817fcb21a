use std::sync::Arc;

use serde_json::{json, Map};
use time::macros::date;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use hourlog_core::domain::{
    ActivityType, DailyLog, DocumentId, Email, Notification, NotificationKind, User, UserId,
    WeeklyReport,
};
use hourlog_core::verification::{generate_code, sign_code, verify_code, CODE_TTL_MILLIS};

use hourlog_sync::cache::LocalCache;
use hourlog_sync::config::{read_config, Settings};
use hourlog_sync::ports::{
    EmailSender, LogMailer, ReportRenderer, StaticAuthSession, TextReportRenderer,
};
use hourlog_sync::repositories::{
    NotificationRepository, NotificationRepositoryImpl, WeeklyReportRepository,
    WeeklyReportRepositoryImpl,
};
use hourlog_sync::session::SessionController;
use hourlog_sync::store::{Document, DocumentStore, MemoryStore, PerUserCollection};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = read_config().unwrap_or_else(|_| Settings::for_demo());
    let store = Arc::new(MemoryStore::new());
    seed_legacy_data(&store).await;

    let cache = Arc::new(LocalCache::new());
    let auth = Arc::new(StaticAuthSession::new());
    auth.sign_in(UserId::new("demo-user"));

    let controller = SessionController::new(store.clone(), cache.clone(), auth.clone(), &settings);

    let outcome = controller.session_established(&UserId::new("demo-user")).await;
    println!("session established: {outcome:?}");

    let snapshot = controller.snapshot().await;
    println!(
        "loaded {} logs, {:.2}h rendered, {:.2}h remaining ({}% of target)",
        snapshot.logs.len(),
        snapshot.stats.total_rendered,
        snapshot.stats.remaining,
        snapshot.stats.progress_percentage,
    );

    let added = controller
        .add_log(DailyLog {
            id: DocumentId::default(),
            user_id: UserId::new("demo-user"),
            entry_date: date!(2025 - 01 - 08),
            activity_types: vec![ActivityType::Coding, ActivityType::Meeting],
            task_description: "Wired the weekly report export".to_string(),
            supervisor: "Jane Doe".to_string(),
            daily_hours: 7.5,
            attachments: vec![],
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        })
        .await
        .expect("adding a demo log");
    println!("added log {} ({}h)", added.id, added.daily_hours);

    let snapshot = controller.snapshot().await;
    println!(
        "after add: {:.2}h rendered, this week {:.2}h",
        snapshot.stats.total_rendered, snapshot.stats.hours_this_week,
    );

    // Weekly report: one per week, rendered through the export port.
    let reports = WeeklyReportRepositoryImpl::new(store.clone());
    let report = reports
        .upsert_report(&WeeklyReport {
            id: DocumentId::default(),
            user_id: UserId::new("demo-user"),
            week_start: date!(2025 - 01 - 06),
            week_end: date!(2025 - 01 - 12),
            reflection: "Good first week; migration ran cleanly.".to_string(),
            logs: snapshot.logs.clone(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        })
        .await
        .expect("saving the weekly report");

    // Reports are mirrored locally like logs, then rendered from the
    // cached copy.
    cache.put_reports(&UserId::new("demo-user"), std::slice::from_ref(&report));
    let cached_reports = cache
        .reports(&UserId::new("demo-user"))
        .unwrap_or_default();
    let report = cached_reports.first().unwrap_or(&report);

    let rendered = TextReportRenderer
        .render_weekly(
            &snapshot.user.as_ref().map(|u| u.name.clone()).unwrap_or_default(),
            "Week 1: 2025-01-06 - 2025-01-12",
            &report.reflection,
            &report.logs,
        )
        .expect("rendering the weekly report");
    println!("\n{}", String::from_utf8_lossy(&rendered));

    // Reminder notification, newest-first listing.
    let notifications =
        NotificationRepositoryImpl::new(store.clone(), settings.store.notification_page_size);
    notifications
        .create_notification(&Notification {
            id: DocumentId::default(),
            user_id: UserId::new("demo-user"),
            kind: NotificationKind::Reminder,
            title: "Log your hours".to_string(),
            message: "You have not logged anything today yet".to_string(),
            read: false,
            link: None,
            created_at: OffsetDateTime::now_utc(),
        })
        .await
        .expect("creating a notification");
    let unread = notifications
        .get_notifications(&UserId::new("demo-user"))
        .await
        .expect("listing notifications");
    println!("{} notification(s) pending", unread.len());

    // Email verification round trip against the configured secret.
    let email = "demo@example.com";
    let code = generate_code();
    let expires_at = OffsetDateTime::now_utc().unix_timestamp() * 1000 + CODE_TTL_MILLIS;
    let secret = settings.verification.secret.as_bytes();
    let signature = sign_code(secret, &code, email, expires_at);
    LogMailer
        .send_verification(email, &code)
        .await
        .expect("sending the verification mail");
    let now = OffsetDateTime::now_utc().unix_timestamp() * 1000;
    match verify_code(secret, &code, email, &signature, expires_at, now) {
        Ok(()) => println!("verification code accepted"),
        Err(e) => println!("verification code rejected: {e}"),
    }

    controller.session_cleared().await;
    println!("signed out");
}

/// Seeds the store the way a pre-migration deployment looks: a profile
/// plus flat top-level logs keyed by `userId`, including the schema
/// marker the migration must skip.
async fn seed_legacy_data(store: &MemoryStore) {
    let user = User {
        id: UserId::new("demo-user"),
        name: "Ada Trainee".to_string(),
        email: Email::parse("demo@example.com").expect("demo address is well-formed"),
        total_required_hours: 480.0,
        start_date: date!(2025 - 01 - 06),
        end_date: None,
        created_at: OffsetDateTime::now_utc(),
        supervisors: vec!["Jane Doe".to_string()],
        reminder_enabled: true,
        profile_image_url: None,
    };
    let doc = Document::from_entity(DocumentId::new("demo-user"), &user)
        .expect("encoding the demo profile");
    store
        .set(&hourlog_sync::store::CollectionPath::users(), doc)
        .await
        .expect("seeding the demo profile");

    let flat = PerUserCollection::DailyLogs.flat();
    for (id, entry_date, hours) in [
        ("legacy-1", "2025-01-06", 4.0),
        ("legacy-2", "2025-01-07", 6.0),
    ] {
        let mut fields = Map::new();
        fields.insert("id".to_string(), json!(id));
        fields.insert("userId".to_string(), json!("demo-user"));
        fields.insert("entryDate".to_string(), json!(entry_date));
        fields.insert("activityTypes".to_string(), json!(["Technical"]));
        fields.insert("taskDescription".to_string(), json!("Legacy entry"));
        fields.insert("supervisor".to_string(), json!("Jane Doe"));
        fields.insert("dailyHours".to_string(), json!(hours));
        fields.insert("createdAt".to_string(), json!("2025-01-06T12:00:00Z"));
        fields.insert("updatedAt".to_string(), json!("2025-01-06T12:00:00Z"));
        store
            .set(&flat, Document::new(DocumentId::new(id), fields))
            .await
            .expect("seeding legacy logs");
    }

    let mut marker = Map::new();
    marker.insert("schemaMarker".to_string(), json!(true));
    marker.insert("userId".to_string(), json!("demo-user"));
    store
        .set(&flat, Document::new(DocumentId::new("_schema"), marker))
        .await
        .expect("seeding the schema marker");
}
