//! Inline-menu front end: alert creation, listing, deletion and live rates.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::telegram::CallbackQuery;
use crate::models::{Alert, AssetClass, Catalog, InlineKeyboard, Snapshot, Update, UserId, format_price};
use crate::AppState;

const HELP_TEXT: &str = "📚 <b>How to use:</b>\n\n\
1️⃣ Tap <b>«💰 Add alert»</b>\n\
2️⃣ Pick a pair\n\
3️⃣ Enter the target price\n\n\
The alert fires once when the live price reaches the target.\n\n\
🔹 <b>/start</b> - main menu\n\
🔹 <b>/alert</b> - new alert\n\
🔹 <b>/myalerts</b> - your alerts\n\
🔹 <b>/rates</b> - current rates";

/// An alert being created: `pair` is set once the user picked one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub pair: Option<String>,
}

pub struct CommandHandler {
    state: AppState,
    drafts: Mutex<HashMap<UserId, Draft>>,
}

/// Accepts `1.10` and `1,10`; zero and negatives are rejected.
pub fn parse_target(text: &str) -> Option<Decimal> {
    let normalized = text.trim().replace(',', ".");
    Decimal::from_str(&normalized)
        .ok()
        .filter(|d| *d > Decimal::ZERO)
}

pub fn main_menu() -> InlineKeyboard {
    InlineKeyboard::default()
        .button("💰 Add alert", "start_alert")
        .button("📋 My alerts", "show_alerts")
        .button("📊 Current rates", "show_rates")
        .button("❓ Help", "show_help")
}

pub fn pair_menu(catalog: &Catalog) -> InlineKeyboard {
    let mut kb = InlineKeyboard::default();
    for class in AssetClass::ALL {
        let specs = catalog.of_class(class);
        if specs.is_empty() {
            continue;
        }
        kb = kb.button(format!("·· {} ··", class.as_str().to_uppercase()), "noop");
        for spec in specs {
            kb = kb.button(spec.symbol.clone(), format!("pair_{}", spec.symbol));
        }
    }
    kb.button("◀️ Cancel", "cancel_alert")
}

pub fn format_rates(catalog: &Catalog, snapshot: &Snapshot) -> String {
    let mut msg = String::from("📊 Current rates:\n\n");
    for (pair, rate) in snapshot.rates() {
        let (dp, dollar) = match catalog.get(pair) {
            Some(spec) => (spec.quote_precision, spec.class != AssetClass::Fiat),
            None => (4, false),
        };
        let marker = if snapshot.is_stale(pair) { " (cached)" } else { "" };
        let prefix = if dollar { "$" } else { "" };
        msg.push_str(&format!("{pair}: {prefix}{}{marker}\n", format_price(*rate, dp)));
    }
    msg.push_str(&format!("\n⏱ {} UTC", snapshot.taken_at().format("%H:%M:%S")));
    msg
}

pub fn format_alert_list(alerts: &[Alert]) -> (String, InlineKeyboard) {
    let mut msg = String::from("📋 Your alerts:\n\n");
    let mut kb = InlineKeyboard::default();

    for (i, alert) in alerts.iter().enumerate() {
        let n = i + 1;
        let status = if alert.active { "✅" } else { "⚡️" };
        let target = alert
            .target
            .map(|t| t.normalize().to_string())
            .unwrap_or_else(|| "?".to_string());
        msg.push_str(&format!("{n}. {status} {} = {target}\n", alert.pair));
        kb = kb.button(format!("❌ Delete {n}"), format!("delete_{n}"));
    }

    (msg, kb.button("◀️ Back", "main_menu"))
}

impl CommandHandler {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            drafts: Mutex::new(HashMap::new()),
        }
    }

    pub async fn draft(&self, chat_id: UserId) -> Option<Draft> {
        self.drafts.lock().await.get(&chat_id).cloned()
    }

    pub async fn handle(&self, update: &Update) -> Result<()> {
        if let Some(msg) = &update.message {
            let text = msg.text.as_deref().unwrap_or_default();
            self.on_message(msg.chat.id, text).await?;
        }
        if let Some(cb) = &update.callback_query {
            self.on_callback(cb).await?;
        }
        Ok(())
    }

    async fn on_message(&self, chat_id: UserId, text: &str) -> Result<()> {
        if !self.state.access.is_allowed(chat_id) {
            tracing::info!(chat_id, "message from disallowed chat ignored");
            return Ok(());
        }

        let text = text.trim();
        if text == "/start" || text == "/menu" {
            self.drafts.lock().await.remove(&chat_id);
            return self.show_main_menu(chat_id).await;
        }

        if self.draft(chat_id).await.is_some() {
            return self.handle_target_input(chat_id, text).await;
        }

        match text {
            "/alert" => self.start_alert_creation(chat_id).await,
            "/myalerts" => self.list_alerts(chat_id).await,
            "/rates" => self.show_rates(chat_id).await,
            "/help" => self.show_help(chat_id).await,
            _ => self.show_main_menu(chat_id).await,
        }
    }

    async fn on_callback(&self, cb: &CallbackQuery) -> Result<()> {
        let Some(chat_id) = cb.message.as_ref().map(|m| m.chat.id) else {
            return Ok(());
        };
        if !self.state.access.is_allowed(chat_id) {
            tracing::info!(chat_id, "callback from disallowed chat ignored");
            return Ok(());
        }

        self.state.messenger.answer_callback(&cb.id).await?;

        let data = cb.data.as_deref().unwrap_or_default();
        match data {
            "main_menu" => self.show_main_menu(chat_id).await,
            "start_alert" => self.start_alert_creation(chat_id).await,
            "show_alerts" => self.list_alerts(chat_id).await,
            "show_rates" => self.show_rates(chat_id).await,
            "show_help" => self.show_help(chat_id).await,
            "cancel_alert" => {
                self.drafts.lock().await.remove(&chat_id);
                self.state.messenger.send(chat_id, "❌ Creation cancelled").await?;
                self.show_main_menu(chat_id).await
            }
            "noop" => Ok(()),
            _ => {
                if let Some(pair) = data.strip_prefix("pair_") {
                    self.select_pair(chat_id, pair).await
                } else if let Some(n) = data.strip_prefix("delete_") {
                    self.delete_alert(chat_id, n).await
                } else {
                    tracing::debug!(chat_id, data, "unknown callback");
                    Ok(())
                }
            }
        }
    }

    async fn show_main_menu(&self, chat_id: UserId) -> Result<()> {
        self.state
            .messenger
            .send_with_keyboard(chat_id, "🔍 Choose an action:", &main_menu())
            .await?;
        Ok(())
    }

    async fn show_help(&self, chat_id: UserId) -> Result<()> {
        self.state.messenger.send(chat_id, HELP_TEXT).await?;
        Ok(())
    }

    async fn start_alert_creation(&self, chat_id: UserId) -> Result<()> {
        self.drafts.lock().await.insert(chat_id, Draft::default());
        self.state
            .messenger
            .send_with_keyboard(chat_id, "📈 Choose a pair:", &pair_menu(&self.state.catalog))
            .await?;
        Ok(())
    }

    async fn select_pair(&self, chat_id: UserId, pair: &str) -> Result<()> {
        let Some(spec) = self.state.catalog.get(pair) else {
            tracing::debug!(chat_id, pair, "unknown pair selected");
            return Ok(());
        };

        {
            let mut drafts = self.drafts.lock().await;
            let Some(draft) = drafts.get_mut(&chat_id) else {
                return Ok(());
            };
            draft.pair = Some(spec.symbol.clone());
        }

        let msg = format!(
            "💰 Pair: {}\n\n📝 Enter the target price:\nFor example: {}",
            spec.symbol, spec.hint
        );
        self.state.messenger.send(chat_id, &msg).await?;
        Ok(())
    }

    async fn handle_target_input(&self, chat_id: UserId, text: &str) -> Result<()> {
        let Some(target) = parse_target(text) else {
            self.state
                .messenger
                .send(chat_id, "❌ That is not a valid price! Enter a number (for example: 1.10)")
                .await?;
            return Ok(());
        };

        let Some(pair) = self.draft(chat_id).await.and_then(|d| d.pair) else {
            self.state
                .messenger
                .send(chat_id, "❌ Pick a pair first")
                .await?;
            return Ok(());
        };

        let alert = Alert::new(&pair, target, Utc::now().format("%Y-%m-%d %H:%M:%S").to_string());
        let saved = self
            .state
            .store
            .modify(|book| book.entry(chat_id).or_default().push(alert))
            .await;

        if let Err(e) = saved {
            tracing::error!(chat_id, error = %e, "could not persist new alert");
            self.state
                .messenger
                .send(chat_id, "❌ Could not save the alert, please try again")
                .await?;
            return Ok(());
        }

        self.drafts.lock().await.remove(&chat_id);
        tracing::info!(chat_id, %pair, %target, "alert created");

        let msg = format!("✅ Alert created!\n\n📊 {pair}\n🎯 Target: {}", target.normalize());
        self.state.messenger.send(chat_id, &msg).await?;
        self.show_main_menu(chat_id).await
    }

    async fn list_alerts(&self, chat_id: UserId) -> Result<()> {
        let alerts = self.state.store.alerts_for(chat_id).await;
        if alerts.is_empty() {
            self.state
                .messenger
                .send(chat_id, "📭 You have no alerts yet")
                .await?;
            return Ok(());
        }

        let (msg, kb) = format_alert_list(&alerts);
        self.state.messenger.send_with_keyboard(chat_id, &msg, &kb).await?;
        Ok(())
    }

    async fn delete_alert(&self, chat_id: UserId, n: &str) -> Result<()> {
        let Some(index) = n.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
            return Ok(());
        };

        let removed = self
            .state
            .store
            .modify(|book| {
                let alerts = book.get_mut(&chat_id)?;
                if index >= alerts.len() {
                    return None;
                }
                let alert = alerts.remove(index);
                if alerts.is_empty() {
                    book.remove(&chat_id);
                }
                Some(alert)
            })
            .await;

        match removed {
            Ok(Some(alert)) => {
                tracing::info!(chat_id, pair = %alert.pair, "alert deleted");
                let msg = format!("✅ Alert {} deleted", index + 1);
                self.state.messenger.send(chat_id, &msg).await?;
                self.list_alerts(chat_id).await
            }
            Ok(None) => Ok(()),
            Err(e) => {
                tracing::error!(chat_id, error = %e, "could not persist alert deletion");
                self.state
                    .messenger
                    .send(chat_id, "❌ Could not delete the alert, please try again")
                    .await?;
                Ok(())
            }
        }
    }

    async fn show_rates(&self, chat_id: UserId) -> Result<()> {
        let snapshot = self.state.aggregator.collect().await;
        let kb = InlineKeyboard::default().button("◀️ Back", "main_menu");
        self.state
            .messenger
            .send_with_keyboard(chat_id, &format_rates(&self.state.catalog, &snapshot), &kb)
            .await?;
        Ok(())
    }
}
