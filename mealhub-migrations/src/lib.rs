//! Embedded migrations for the backend selected at compile time.

use sqlx::migrate::Migrator;

#[cfg(not(any(feature = "postgres", feature = "sqlite")))]
compile_error!(
    "Enable exactly one of the `postgres` or `sqlite` features for mealhub-migrations."
);

#[cfg(all(feature = "postgres", feature = "sqlite"))]
compile_error!(
    "Activate only one backend feature (`postgres` or `sqlite`) for mealhub-migrations."
);

#[cfg(feature = "sqlite")]
static MIGRATOR: Migrator = sqlx_macros::migrate!("src/migrations_sqlite");
#[cfg(feature = "postgres")]
static MIGRATOR: Migrator = sqlx_macros::migrate!("src/migrations_postgres");

/// The migrator matching the enabled database backend.
pub fn migrator() -> &'static Migrator {
    &MIGRATOR
}
