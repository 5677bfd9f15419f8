/// All backend primary keys are integer ids.
pub type DbId = i64;

/// The backend emits naive UTC timestamps (`datetime.utcnow().isoformat()`).
pub type Timestamp = chrono::NaiveDateTime;
