use uuid::Uuid;

pub mod notification_type;
pub mod notifications;
pub mod users;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;

/// Generates a new notification id.
///
/// Notification ids are time-ordered (UUIDv7) so that ordering by id is the
/// same as ordering by creation, which is what makes an id usable as a
/// pagination cursor.
pub fn new_ordered_id() -> Id {
    Uuid::now_v7()
}
