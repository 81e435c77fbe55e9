use hrsaas_config::PushSettings;
use hrsaas_model::{DisplayNotification, NotificationAction, NotificationData, PushPayload};

/// Turns a raw push payload into what the platform should display.
///
/// JSON objects are read field by field with the configured defaults
/// filling the gaps. Anything else is shown as plain text in the body.
pub fn normalize_payload(raw: Option<&[u8]>, settings: &PushSettings) -> DisplayNotification {
    let raw = raw.unwrap_or_default();
    let payload = match serde_json::from_slice::<serde_json::Value>(raw) {
        Ok(value) => PushPayload::from_json(&value).unwrap_or_else(|| plain_text(raw)),
        Err(_) => plain_text(raw),
    };
    display_model(payload, settings)
}

fn plain_text(raw: &[u8]) -> PushPayload {
    let text = String::from_utf8_lossy(raw).into_owned();
    PushPayload {
        body: (!text.is_empty()).then_some(text),
        ..Default::default()
    }
}

fn display_model(payload: PushPayload, settings: &PushSettings) -> DisplayNotification {
    let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());

    let id = non_empty(payload.id);
    let tag = non_empty(payload.tag)
        .or_else(|| id.clone())
        .unwrap_or_else(|| settings.default_tag.clone());
    let url = non_empty(payload.link)
        .or_else(|| non_empty(payload.url))
        .unwrap_or_else(|| settings.default_url.clone());

    DisplayNotification {
        title: non_empty(payload.title).unwrap_or_else(|| settings.default_title.clone()),
        body: non_empty(payload.body)
            .or_else(|| non_empty(payload.message))
            .unwrap_or_default(),
        icon: non_empty(payload.icon).unwrap_or_else(|| settings.default_icon.clone()),
        badge: non_empty(payload.badge).unwrap_or_else(|| settings.default_badge.clone()),
        tag,
        data: NotificationData { url, id },
        actions: vec![
            NotificationAction::new(NotificationAction::OPEN, "열기"),
            NotificationAction::new(NotificationAction::CLOSE, "닫기"),
        ],
        require_interaction: true,
    }
}
