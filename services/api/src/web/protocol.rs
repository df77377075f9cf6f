//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between a dashboard page and its
//! tab session.

use discipline_core::{CaseFilter, CaseId, DashboardView};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// The search box or one of the selectors changed.
    SetFilter { filter: CaseFilter },

    /// Asks for the current view without changing anything.
    Refresh,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the socket is attached to the tab session.
    SessionInitialized { session_id: Uuid },

    /// A freshly built dashboard. The page replaces its lists, counters and charts.
    DashboardUpdated { view: DashboardView },

    /// Transient notification for one record merged from the inbox.
    RecordReceived { id: CaseId, title: String },

    /// Transient error notification.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_are_tagged() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"set_filter","filter":{"q":"late","status":"pending"}}"#).unwrap();
        match msg {
            ClientMessage::SetFilter { filter } => {
                assert_eq!(filter.q, "late");
                assert_eq!(filter.status, "pending");
                assert_eq!(filter.priority, "all");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn record_received_serializes_with_tag() {
        let json = serde_json::to_value(ServerMessage::RecordReceived {
            id: CaseId::Number(3),
            title: "Late".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "record_received");
        assert_eq!(json["id"], 3);
    }
}
