#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use ratewatch::{
    AppState, config,
    error::{FetchError, MessengerError},
    models::{Catalog, InlineKeyboard, Quotes, Update, UserId},
    services::{
        aggregator::RateAggregator,
        alert_store::AlertStore,
        rate_cache::RateCache,
        sources::RateSource,
        telegram::Messenger,
    },
};

#[derive(Debug, Clone)]
pub struct Sent {
    pub chat_id: UserId,
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

/// Records outgoing messages instead of calling the Bot API.
#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<Sent>>,
    pub answered: Mutex<Vec<String>>,
    pub polled_offsets: Mutex<Vec<Option<i64>>>,
    pub queued: Mutex<Vec<Update>>,
    pub fail_sends: bool,
}

impl RecordingMessenger {
    pub fn failing() -> Self {
        Self {
            fail_sends: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts_to(&self, chat_id: UserId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|s| s.chat_id == chat_id)
            .map(|s| s.text)
            .collect()
    }

    pub fn queue(&self, updates: Vec<Update>) {
        self.queued.lock().unwrap().extend(updates);
    }

    fn record(&self, chat_id: UserId, text: &str, keyboard: Option<&InlineKeyboard>) -> Result<(), MessengerError> {
        if self.fail_sends {
            return Err(MessengerError::Api {
                method: "sendMessage".to_string(),
                description: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        self.sent.lock().unwrap().push(Sent {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, chat_id: UserId, text: &str) -> Result<(), MessengerError> {
        self.record(chat_id, text, None)
    }

    async fn send_with_keyboard(
        &self,
        chat_id: UserId,
        text: &str,
        keyboard: &InlineKeyboard,
    ) -> Result<(), MessengerError> {
        self.record(chat_id, text, Some(keyboard))
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), MessengerError> {
        self.answered.lock().unwrap().push(callback_id.to_string());
        Ok(())
    }

    async fn poll_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, MessengerError> {
        self.polled_offsets.lock().unwrap().push(offset);
        let mut queued = self.queued.lock().unwrap();
        let pending = queued
            .iter()
            .filter(|u| offset.is_none_or(|o| u.update_id >= o))
            .cloned()
            .collect();
        queued.retain(|u| offset.is_none_or(|o| u.update_id >= o));
        Ok(pending)
    }
}

/// A source that always answers with the same quotes, or always fails.
pub struct StaticSource {
    pub name: String,
    pub quotes: Option<Quotes>,
    pub calls: Mutex<usize>,
}

impl StaticSource {
    pub fn ok(name: &str, quotes: Quotes) -> Self {
        Self {
            name: name.to_string(),
            quotes: Some(quotes),
            calls: Mutex::new(0),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            quotes: None,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl RateSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Quotes, FetchError> {
        *self.calls.lock().unwrap() += 1;
        self.quotes.clone().ok_or_else(|| FetchError::Status {
            provider: self.name.clone(),
            status: 503,
        })
    }
}

pub fn settings(alerts_file: &Path, vars: &[(&str, &str)]) -> config::Settings {
    let mut map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    map.insert("ALERTS_FILE".to_string(), alerts_file.display().to_string());
    config::from_lookup(None, move |name| map.get(name).cloned()).unwrap()
}

/// State over a temp alert file, the standard catalog, and fake sources.
pub async fn test_state(
    alerts_file: &Path,
    vars: &[(&str, &str)],
    sources: Vec<Arc<dyn RateSource>>,
    messenger: Arc<RecordingMessenger>,
) -> AppState {
    let settings = settings(alerts_file, vars);
    let catalog = Arc::new(Catalog::standard());
    let cache = Arc::new(RateCache::seeded(&catalog));
    let aggregator = Arc::new(RateAggregator::new(sources, cache));
    let store = Arc::new(AlertStore::open(alerts_file).await.unwrap());

    AppState::new(settings, catalog, store, aggregator, messenger)
}

pub fn text_update(update_id: i64, chat_id: UserId, text: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "message": { "chat": { "id": chat_id }, "text": text }
    }))
    .unwrap()
}

pub fn callback_update(update_id: i64, chat_id: UserId, data: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "callback_query": {
            "id": format!("cb-{update_id}"),
            "message": { "chat": { "id": chat_id } },
            "data": data
        }
    }))
    .unwrap()
}
