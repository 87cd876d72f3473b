//! # Lost Person Alerts
//!
//! `POST /api/persona-perdida` relays a lost attendee's name, phone and position to Telegram.
//!
//! ## Location Shapes
//!
//! Clients send the position in one of three ways, checked in this order:
//! - `lat` and `lng` as top level fields
//! - `ubicacion` as a `"lat,lng"` string
//! - `ubicacion` as an object `{ lat, lng }`
//!
//! Coordinates may be numbers or numeric strings. Anything else is rejected before Telegram is
//! contacted.
//!
//! ## Fan Out
//!
//! Recipients are the chats named in the request, the configured admin chats and the subscribers.
//! Each one gets a text message with a map button plus a location pin, all sent at once. A failed
//! text counts the recipient as failed; a failed pin is only logged.
use std::sync::Arc;

use axum::{Json, extract::State as AxumState, extract::rejection::JsonRejection};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::{
    error::AppError,
    state::State,
    telegram::{ChatId, MessageOptions, Telegram},
    utils::{Scalar, escape_markdown, payload},
};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LocationInput {
    Joined(String),
    Point {
        lat: Option<Scalar>,
        lng: Option<Scalar>,
    },
    Other(Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChatIds {
    One(ChatId),
    Many(Vec<ChatId>),
}

impl ChatIds {
    fn into_vec(self) -> Vec<ChatId> {
        match self {
            ChatIds::One(id) => vec![id],
            ChatIds::Many(ids) => ids,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LostPersonRequest {
    pub nombre: Option<String>,
    pub telefono: Option<Scalar>,
    pub lat: Option<Scalar>,
    pub lng: Option<Scalar>,
    pub ubicacion: Option<LocationInput>,
    #[serde(rename = "chatId")]
    pub chat_id: Option<ChatIds>,
}

/// The accepted ways of sending a position, borrowed from the request.
#[derive(Debug, Clone, Copy)]
pub enum LocationShape<'a> {
    Fields(&'a Scalar, &'a Scalar),
    Joined(&'a str),
    Object(&'a Scalar, &'a Scalar),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Result<Self, AppError> {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude))
                if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) =>
            {
                Ok(Self {
                    latitude,
                    longitude,
                })
            }
            _ => Err(AppError::MalformedPayload(
                "location coordinates are not valid numbers".to_string(),
            )),
        }
    }

    pub fn maps_url(&self) -> String {
        format!(
            "https://www.google.com/maps?q={},{}",
            self.latitude, self.longitude
        )
    }
}

impl LocationShape<'_> {
    pub fn normalize(&self) -> Result<Location, AppError> {
        match self {
            LocationShape::Fields(lat, lng) | LocationShape::Object(lat, lng) => {
                Location::from_parts(lat.as_f64(), lng.as_f64())
            }
            LocationShape::Joined(text) => {
                let mut parts = text.split(',').map(|part| part.trim().parse::<f64>().ok());
                let latitude = parts.next().flatten().filter(|v| v.is_finite());
                let longitude = parts.next().flatten().filter(|v| v.is_finite());

                Location::from_parts(latitude, longitude)
            }
        }
    }
}

/// Validated alert, ready to send.
#[derive(Debug, Clone)]
pub struct Alert {
    pub name: String,
    pub phone: String,
    pub location: Location,
    pub chat_ids: Vec<ChatId>,
}

impl LostPersonRequest {
    pub fn location_shape(&self) -> Option<LocationShape<'_>> {
        if let (Some(lat), Some(lng)) = (&self.lat, &self.lng) {
            return Some(LocationShape::Fields(lat, lng));
        }

        match &self.ubicacion {
            Some(LocationInput::Joined(text)) if text.contains(',') => {
                Some(LocationShape::Joined(text))
            }
            Some(LocationInput::Point {
                lat: Some(lat),
                lng: Some(lng),
            }) => Some(LocationShape::Object(lat, lng)),
            _ => None,
        }
    }

    pub fn validate(self) -> Result<Alert, AppError> {
        let name = self.nombre.as_deref().map(str::trim).unwrap_or_default();
        let phone = self
            .telefono
            .as_ref()
            .filter(|phone| !phone.is_blank())
            .map(Scalar::as_text)
            .unwrap_or_default();

        if name.is_empty() || phone.is_empty() {
            return Err(AppError::MalformedPayload(
                "nombre and telefono are required".to_string(),
            ));
        }

        let location = self
            .location_shape()
            .ok_or_else(|| {
                AppError::MalformedPayload(
                    "location must be lat and lng fields, ubicacion as \"lat,lng\", or ubicacion as { lat, lng }"
                        .to_string(),
                )
            })?
            .normalize()?;

        Ok(Alert {
            name: name.to_string(),
            phone,
            location,
            chat_ids: self.chat_id.map(ChatIds::into_vec).unwrap_or_default(),
        })
    }
}

impl Alert {
    pub fn message(&self) -> String {
        format!(
            "🆘 *HERMANO PERDIDO - NECESITA AYUDA* 🆘\n\n\
             *Nombre:* {}\n\
             *Teléfono:* {}\n\n\
             Por favor, si puedes ayudar a esta persona a llegar a los bautismos, contacta con ella o usa el botón de ubicación para encontrarla.",
            escape_markdown(&self.name),
            escape_markdown(&self.phone),
        )
    }

    pub fn options(&self) -> MessageOptions {
        MessageOptions::markdown().with_link("📍 Ver ubicación en Google Maps", self.location.maps_url())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedChat {
    pub id: ChatId,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub failed_details: Vec<FailedChat>,
}

/// Request chats first, then the configured ones, each id once.
pub fn recipients(groups: impl IntoIterator<Item = Vec<ChatId>>) -> Vec<ChatId> {
    let mut seen = Vec::new();

    for id in groups.into_iter().flatten() {
        if !id.as_str().is_empty() && !seen.contains(&id) {
            seen.push(id);
        }
    }

    seen
}

pub async fn broadcast(telegram: &Telegram, alert: &Alert, recipients: &[ChatId]) -> BroadcastReport {
    let text = alert.message();
    let options = alert.options();
    let Location {
        latitude,
        longitude,
    } = alert.location;

    let sends = recipients.iter().map(|id| {
        let text = &text;
        let options = &options;

        async move {
            let (message, location) = tokio::join!(
                telegram.send_message(id, text, options),
                telegram.send_location(id, latitude, longitude),
            );

            if let Err(e) = location {
                warn!("Failed to send location to chat {id}: {e}");
            }

            match message {
                Ok(()) => {
                    info!("Alert sent to chat {id}");
                    None
                }
                Err(e) => {
                    error!("Failed to send alert to chat {id}: {e}");
                    Some(FailedChat {
                        id: id.clone(),
                        error: e.to_string(),
                    })
                }
            }
        }
    });

    let failed_details: Vec<FailedChat> = join_all(sends).await.into_iter().flatten().collect();

    BroadcastReport {
        total: recipients.len(),
        successful: recipients.len() - failed_details.len(),
        failed: failed_details.len(),
        failed_details,
    }
}

pub async fn lost_person_handler(
    AxumState(state): AxumState<Arc<State>>,
    request: Result<Json<LostPersonRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let alert = payload(request)?.validate()?;

    let admin_ids: Vec<ChatId> = state
        .config
        .admin_chat_ids
        .iter()
        .map(|id| ChatId::new(id.clone()))
        .collect();
    let subscriber_ids = state.subscribers.chat_ids().await;

    let chat_ids = recipients([alert.chat_ids.clone(), admin_ids, subscriber_ids]);

    if chat_ids.is_empty() {
        info!(
            "No chats configured, alert for {} at {},{} not sent",
            alert.name, alert.location.latitude, alert.location.longitude
        );

        return Ok(Json(json!({
            "success": true,
            "message": "Alert received, but no Telegram chats are configured so it was not sent.",
        })));
    }

    let report = broadcast(&state.telegram, &alert, &chat_ids).await;

    Ok(Json(json!({
        "success": true,
        "message": "Alert processed.",
        "details": report,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: Value) -> LostPersonRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_separate_fields() {
        let alert = request(json!({"nombre": "Juan", "telefono": "600", "lat": 37.6, "lng": "-0.98"}))
            .validate()
            .unwrap();

        assert_eq!(alert.location, Location { latitude: 37.6, longitude: -0.98 });
    }

    #[test]
    fn test_joined_string() {
        let alert = request(json!({"nombre": "Juan", "telefono": 600, "ubicacion": " 37.6 , -0.98 "}))
            .validate()
            .unwrap();

        assert_eq!(alert.location.longitude, -0.98);
        assert_eq!(alert.phone, "600");
    }

    #[test]
    fn test_object() {
        let alert = request(json!({
            "nombre": "Juan",
            "telefono": "600",
            "ubicacion": {"lat": "37.6", "lng": -0.98}
        }))
        .validate()
        .unwrap();

        assert_eq!(alert.location.latitude, 37.6);
    }

    #[test]
    fn test_fields_win_over_ubicacion() {
        let alert = request(json!({
            "nombre": "Juan",
            "telefono": "600",
            "lat": 1, "lng": 2,
            "ubicacion": "3,4"
        }))
        .validate()
        .unwrap();

        assert_eq!(alert.location, Location { latitude: 1.0, longitude: 2.0 });
    }

    #[test]
    fn test_rejects_bad_locations() {
        let bodies = [
            json!({"nombre": "J", "telefono": "1"}),
            json!({"nombre": "J", "telefono": "1", "ubicacion": "37.6"}),
            json!({"nombre": "J", "telefono": "1", "ubicacion": "north,south"}),
            json!({"nombre": "J", "telefono": "1", "ubicacion": {"lat": 1}}),
            json!({"nombre": "J", "telefono": "1", "ubicacion": [1, 2]}),
            json!({"nombre": "J", "telefono": "1", "lat": 1}),
            json!({"nombre": "J", "telefono": "1", "lat": 91, "lng": 0}),
        ];

        for body in bodies {
            assert!(
                matches!(request(body.clone()).validate(), Err(AppError::MalformedPayload(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn test_requires_name_and_phone() {
        assert!(request(json!({"telefono": "1", "lat": 1, "lng": 2})).validate().is_err());
        assert!(request(json!({"nombre": " ", "telefono": "1", "lat": 1, "lng": 2})).validate().is_err());
        assert!(request(json!({"nombre": "J", "telefono": "", "lat": 1, "lng": 2})).validate().is_err());
    }

    #[test]
    fn test_chat_ids_single_or_many() {
        let one = request(json!({"nombre": "J", "telefono": "1", "lat": 1, "lng": 2, "chatId": 5}));
        let many = request(json!({"nombre": "J", "telefono": "1", "lat": 1, "lng": 2, "chatId": ["5", 6]}));

        assert_eq!(one.validate().unwrap().chat_ids, vec![ChatId::new("5")]);
        assert_eq!(
            many.validate().unwrap().chat_ids,
            vec![ChatId::new("5"), ChatId::new("6")]
        );
    }

    #[test]
    fn test_recipients_dedupe_in_order() {
        let ids = recipients([
            vec![ChatId::new("1"), ChatId::new("2")],
            vec![ChatId::new("2"), ChatId::new("3")],
            vec![ChatId::new(""), ChatId::new("1")],
        ]);

        assert_eq!(ids, vec![ChatId::new("1"), ChatId::new("2"), ChatId::new("3")]);
    }

    #[test]
    fn test_message_escapes_user_text() {
        let alert = request(json!({"nombre": "ana_gil", "telefono": "600", "lat": 1, "lng": 2}))
            .validate()
            .unwrap();

        assert!(alert.message().contains("*Nombre:* ana\\_gil"));
        assert_eq!(alert.location.maps_url(), "https://www.google.com/maps?q=1,2");
    }
}
