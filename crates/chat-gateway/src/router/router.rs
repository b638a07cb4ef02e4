//! Event router
//!
//! Dispatch table from inbound events to state mutations plus the outbound
//! deliveries they cause. The router never sends anything itself; callers
//! hand the returned [`Delivery`] list to the connection manager.
//!
//! Presence edges are the exception: the registry publishes them to the
//! presence feed while the user's entry is locked, and the presence pump
//! broadcasts them.

use super::{Delivery, TypingState};
use crate::connection::{ConnectionRegistry, Unregistered};
use crate::diagnostics::Diagnostics;
use crate::protocol::{
    AuthPayload, ClientEvent, MessagePayload, RoomsPayload, ServerEvent, TypingPayload,
    TypingUpdatePayload,
};
use crate::subscription::SubscriptionTable;
use chat_core::{ConnectionId, RoomId};
use serde_json::Value;
use std::sync::Arc;

/// Routes inbound events for every connection
pub struct EventRouter {
    registry: Arc<ConnectionRegistry>,
    subscriptions: Arc<SubscriptionTable>,
    typing: TypingState,
    diagnostics: Arc<Diagnostics>,
}

impl EventRouter {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        subscriptions: Arc<SubscriptionTable>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            registry,
            subscriptions,
            typing: TypingState::new(),
            diagnostics,
        }
    }

    /// Decode and route a text frame
    ///
    /// Frames that fail to decode are dropped and counted; the connection is
    /// unaffected.
    pub fn handle_text(&self, connection_id: ConnectionId, text: &str) -> Vec<Delivery> {
        match ClientEvent::from_json(text) {
            Ok(event) => self.handle(connection_id, event),
            Err(e) => {
                self.diagnostics.record_protocol_error();
                tracing::debug!(
                    connection_id = %connection_id,
                    error = %e,
                    "Dropped inbound frame"
                );
                Vec::new()
            }
        }
    }

    /// Route a decoded event
    pub fn handle(&self, connection_id: ConnectionId, event: ClientEvent) -> Vec<Delivery> {
        tracing::trace!(
            connection_id = %connection_id,
            event = event.name(),
            "Received event"
        );

        match event {
            ClientEvent::Auth(payload) => self.on_auth(connection_id, payload),
            ClientEvent::JoinRooms(payload) => self.on_join(connection_id, payload),
            ClientEvent::LeaveRooms(payload) => self.on_leave(connection_id, payload),
            ClientEvent::TypingStart(payload) => self.on_typing(connection_id, payload, true),
            ClientEvent::TypingStop(payload) => self.on_typing(connection_id, payload, false),
        }
    }

    fn on_auth(&self, connection_id: ConnectionId, payload: AuthPayload) -> Vec<Delivery> {
        self.registry.register(&payload.user_id, connection_id);
        Vec::new()
    }

    /// Rooms are trusted: authorization already happened upstream.
    fn on_join(&self, connection_id: ConnectionId, payload: RoomsPayload) -> Vec<Delivery> {
        let joined = payload
            .room_ids
            .iter()
            .filter(|room_id| self.subscriptions.join(room_id, connection_id))
            .count();

        tracing::debug!(
            connection_id = %connection_id,
            requested = payload.room_ids.len(),
            joined = joined,
            "Joined rooms"
        );

        Vec::new()
    }

    fn on_leave(&self, connection_id: ConnectionId, payload: RoomsPayload) -> Vec<Delivery> {
        let left = payload
            .room_ids
            .iter()
            .filter(|room_id| self.subscriptions.leave(room_id, connection_id))
            .count();

        tracing::debug!(
            connection_id = %connection_id,
            requested = payload.room_ids.len(),
            left = left,
            "Left rooms"
        );

        Vec::new()
    }

    /// Relay a typing signal to the rest of the room
    ///
    /// Only the originating connection is excluded; the same user's other
    /// devices in the room do receive it.
    fn on_typing(
        &self,
        connection_id: ConnectionId,
        payload: TypingPayload,
        typing: bool,
    ) -> Vec<Delivery> {
        self.typing
            .set(connection_id, &payload.room_id, &payload.user_id, typing);

        let audience: Vec<ConnectionId> = self
            .subscriptions
            .members_of(&payload.room_id)
            .into_iter()
            .filter(|member| *member != connection_id)
            .collect();

        if audience.is_empty() {
            return Vec::new();
        }

        let event = ServerEvent::TypingUpdate(TypingUpdatePayload {
            room_id: payload.room_id,
            user_id: payload.user_id,
            typing,
        });

        vec![Delivery::to(audience, event)]
    }

    /// Tear down a connection
    ///
    /// Leaves every room, releases the user binding and drops the typing
    /// signals the connection sent. An offline edge, if any, has already been
    /// published to the presence feed on return.
    pub fn disconnect(&self, connection_id: ConnectionId) -> Unregistered {
        let outcome = self.registry.unregister(connection_id);

        let cleared = self.typing.clear_connection(connection_id);
        if cleared > 0 {
            tracing::trace!(
                connection_id = %connection_id,
                cleared = cleared,
                "Cleared typing state"
            );
        }

        outcome
    }

    /// Relay a newly committed message to the room
    pub fn message_created(&self, room_id: &RoomId, message: Value) -> Delivery {
        self.room_message(room_id, ServerEvent::MessageNew(MessagePayload { message }))
    }

    /// Relay an updated message to the room
    pub fn message_updated(&self, room_id: &RoomId, message: Value) -> Delivery {
        self.room_message(room_id, ServerEvent::MessageUpdate(MessagePayload { message }))
    }

    fn room_message(&self, room_id: &RoomId, event: ServerEvent) -> Delivery {
        let members = self.subscriptions.members_of(room_id);

        tracing::trace!(
            room_id = %room_id,
            event = event.name(),
            recipients = members.len(),
            "Routing room message"
        );

        Delivery::to(members, event)
    }

    /// Current typing state
    pub fn typing(&self) -> &TypingState {
        &self.typing
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("registry", &self.registry)
            .field("typing", &self.typing.len())
            .finish_non_exhaustive()
    }
}
