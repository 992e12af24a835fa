pub use sea_orm_migration::prelude::*;

mod m20250301_000000_bootstrap;
mod m20250301_000001_create_users;
mod m20250301_000002_create_categories;
mod m20250301_000003_create_tasks_and_bids;
mod m20250301_000004_create_milestones_and_transactions;
mod m20250301_000005_create_messaging;
mod m20250315_000006_add_otp_attempts;

/// Marketplace schema, applied in order.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000000_bootstrap::Migration),
            Box::new(m20250301_000001_create_users::Migration),
            Box::new(m20250301_000002_create_categories::Migration),
            Box::new(m20250301_000003_create_tasks_and_bids::Migration),
            Box::new(m20250301_000004_create_milestones_and_transactions::Migration),
            Box::new(m20250301_000005_create_messaging::Migration),
            Box::new(m20250315_000006_add_otp_attempts::Migration),
        ]
    }
}
