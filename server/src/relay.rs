use huddle_shared::server_event::{RelayedAnswer, RelayedIceCandidate, RelayedOffer, ServerEvent};
use log::debug;
use serde_json::Value;

use crate::outbox::Outbox;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayKind {
    Offer,
    Answer,
    IceCandidate,
}

/// Point-to-point forwarding of WebRTC negotiation messages. The payload is never
/// inspected and room state is never consulted; a destination that is no longer
/// connected simply never receives it.
pub struct SignalingRelay;

impl SignalingRelay {
    pub fn relay(outbox: &mut Outbox, kind: RelayKind, payload: Value, from: &str, to: &str) {
        debug!("Relaying {:?} from {} to {}", kind, from, to);

        let from = from.to_string();
        let event = match kind {
            RelayKind::Offer => ServerEvent::Offer(RelayedOffer {
                offer: payload,
                user_id: from,
            }),
            RelayKind::Answer => ServerEvent::Answer(RelayedAnswer {
                answer: payload,
                from,
            }),
            RelayKind::IceCandidate => ServerEvent::IceCandidate(RelayedIceCandidate {
                candidate: payload,
                from,
            }),
        };

        outbox.to_connection(to, event);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::outbox::Recipients;

    #[test]
    fn offer_and_answer_round_trip_between_peers() {
        let mut outbox = Outbox::new();
        let offer = json!({ "type": "offer", "sdp": "v=0\r\no=- 1 2 IN IP4 127.0.0.1" });
        let answer = json!({ "type": "answer", "sdp": "v=0" });

        SignalingRelay::relay(&mut outbox, RelayKind::Offer, offer.clone(), "sender", "x");
        SignalingRelay::relay(&mut outbox, RelayKind::Answer, answer.clone(), "x", "sender");

        let deliveries = outbox.into_deliveries();
        assert_eq!(
            deliveries[0].recipients,
            Recipients::Connections(vec!["x".to_string()])
        );
        assert_eq!(
            deliveries[0].event,
            ServerEvent::Offer(RelayedOffer {
                offer,
                user_id: "sender".to_string(),
            })
        );
        assert_eq!(
            deliveries[1].recipients,
            Recipients::Connections(vec!["sender".to_string()])
        );
        assert_eq!(
            deliveries[1].event,
            ServerEvent::Answer(RelayedAnswer {
                answer,
                from: "x".to_string(),
            })
        );
    }

    #[test]
    fn ice_candidate_is_addressed_with_from() {
        let mut outbox = Outbox::new();

        SignalingRelay::relay(&mut outbox, RelayKind::IceCandidate, Value::Null, "a", "b");

        assert_eq!(
            outbox.into_deliveries()[0].event,
            ServerEvent::IceCandidate(RelayedIceCandidate {
                candidate: Value::Null,
                from: "a".to_string(),
            })
        );
    }
}
