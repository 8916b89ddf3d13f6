use crate::adapters::logger;
use crate::domain::subscription::Subscription;
use crate::domain::sync::error::SyncError;
use crate::domain::sync::relay::RelayMessage;
use crate::ports::{ChangeCallback, LostCallback, RealtimePort};
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

/// Realtime channel over the relay server's WebSocket endpoint. Each subscription
/// owns its own socket. A socket that closes before the subscription is released
/// (relay down, unreachable, or restarted) is reported as lost.
#[derive(Debug, Clone, Default)]
pub struct WebSocketRealtime {
    url: Option<String>,
}

impl WebSocketRealtime {
    pub fn new(url: Option<String>) -> Self {
        Self {
            url: url.filter(|url| !url.trim().is_empty()),
        }
    }
}

impl RealtimePort for WebSocketRealtime {
    fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    fn subscribe(
        &self,
        resource: &str,
        on_change: ChangeCallback,
        on_lost: LostCallback,
    ) -> Result<Subscription, SyncError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| SyncError::realtime("No realtime URL configured"))?;

        let ws = WebSocket::new(url)
            .map_err(|e| SyncError::realtime(format!("Cannot open {url}: {:?}", e)))?;

        let subscribe_msg = RelayMessage::Subscribe {
            resource: resource.to_string(),
        }
        .to_json()?;
        let unsubscribe_msg = RelayMessage::Unsubscribe {
            resource: resource.to_string(),
        }
        .to_json()?;

        let socket = ws.clone();
        let channel = resource.to_string();
        let onopen = Closure::wrap(Box::new(move || {
            if let Err(e) = socket.send_with_str(&subscribe_msg) {
                logger().error(&format!("Failed to subscribe to '{}': {:?}", channel, e));
            }
        }) as Box<dyn FnMut()>);

        let channel = resource.to_string();
        let onmessage = Closure::wrap(Box::new(move |e: MessageEvent| {
            let Some(text) = e.data().as_string() else {
                return;
            };
            match serde_json::from_str::<RelayMessage>(&text) {
                Ok(msg) if msg.changed_resource() == Some(channel.as_str()) => on_change(),
                Ok(_) => {}
                Err(e) => logger().error(&format!("Failed to parse relay message: {:?}", e)),
            }
        }) as Box<dyn FnMut(MessageEvent)>);

        let channel = resource.to_string();
        let onerror = Closure::wrap(Box::new(move |_: Event| {
            logger().error(&format!("Realtime socket for '{}' errored", channel));
        }) as Box<dyn FnMut(Event)>);

        let channel = resource.to_string();
        let onclose = Closure::wrap(Box::new(move |e: CloseEvent| {
            logger().warn(&format!(
                "Realtime socket for '{}' closed (code {})",
                channel,
                e.code()
            ));
            on_lost(SyncError::realtime(format!(
                "Socket for '{}' closed with code {}: {}",
                channel,
                e.code(),
                e.reason()
            )));
        }) as Box<dyn FnMut(CloseEvent)>);

        ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

        Ok(Subscription::new(move || {
            if ws.ready_state() == WebSocket::OPEN {
                let _ = ws.send_with_str(&unsubscribe_msg);
            }
            ws.set_onopen(None);
            ws.set_onmessage(None);
            ws.set_onerror(None);
            ws.set_onclose(None);
            let _ = ws.close();
            drop((onopen, onmessage, onerror, onclose));
        }))
    }
}
