use uuid::Uuid;

/// Fresh poll id: 128 random bits as 32 lowercase hex characters, with no
/// separators so it survives whitespace-split chat commands.
pub fn new_poll_id() -> String {
    Uuid::new_v4().simple().to_string()
}
