use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use common::database::{DatabaseConfig, apply_migrations, init_pool};
use timebank::MIGRATOR;
use timebank::ledger::Ledger;
use timebank::notifier::Notifier;
use timebank::orchestrator::BookingService;
use timebank::repositories::{
    BookingRepository, DirectoryRepository, NotificationRepository, ReviewRepository,
    SlotRepository, StatsRepository, TransactionRepository, WalletRepository,
};
use timebank::routes;
use timebank::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting timebank service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Apply schema migrations
    apply_migrations(&pool, &MIGRATOR).await?;
    info!("Database migrations applied");

    // Initialize repositories
    let bookings = BookingRepository::new(pool.clone());
    let slots = SlotRepository::new(pool.clone());
    let wallets = WalletRepository::new(pool.clone());
    let transactions = TransactionRepository::new(pool.clone());
    let stats = StatsRepository::new(pool.clone());
    let notifications = NotificationRepository::new(pool.clone());
    let reviews = ReviewRepository::new(pool.clone());
    let directory = DirectoryRepository::new(pool.clone());

    // Wire the ledger and the booking orchestrator
    let ledger = Ledger::new(wallets.clone(), transactions.clone());
    let notifier = Notifier::new(notifications.clone());
    let booking_service = BookingService::new(
        pool.clone(),
        bookings.clone(),
        slots.clone(),
        wallets.clone(),
        directory.clone(),
        stats.clone(),
        reviews.clone(),
        ledger,
        notifier,
    );

    let app_state = AppState {
        db_pool: pool,
        booking_service,
        bookings,
        slots,
        wallets,
        transactions,
        stats,
        notifications,
        reviews,
        directory,
    };

    info!("Timebank service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    info!("Timebank service listening on 0.0.0.0:3000");

    axum::serve(listener, app).await?;

    Ok(())
}
