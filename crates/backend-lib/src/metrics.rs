// ============================
// crates/backend-lib/src/metrics.rs
// ============================
//! Central place for metric keys.
pub const WS_CONNECTION: &str = "ws.connection";
pub const WS_ACTIVE: &str = "ws.active";
pub const ROOM_JOIN: &str = "relay.room_join";
pub const CHAT_BROADCAST: &str = "relay.chat_broadcast";
pub const NOTIFY_DELIVERED: &str = "relay.notify_delivered";
pub const NOTIFY_DROPPED: &str = "relay.notify_dropped";
pub const REQUEST_SUBMITTED: &str = "request.submitted";
pub const REQUEST_APPROVED: &str = "request.approved";
pub const REQUEST_REJECTED: &str = "request.rejected";
