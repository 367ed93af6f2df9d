use tracing::debug;

use ostad_types::MAX_MESSAGE_LENGTH;
use ostad_types::models::{Experience, UserId};
use ostad_types::update::{InlineArticle, OutgoingMessage};

use crate::format::{clamp, moderation_view, render_experience, tags};
use crate::keyboards;
use crate::texts::TextStore;
use crate::{AppState, BotResult};

/// Results per search, for commands and inline queries alike.
pub const SEARCH_LIMIT: u32 = 10;

/// `/search <text>`: published experiences only.
pub async fn user_search(state: &AppState, user_id: UserId, query: &str) -> BotResult<()> {
    let texts = &state.texts;
    let query = query.trim();
    if query.is_empty() {
        state
            .messenger
            .send(user_id, OutgoingMessage::text(texts.get("search_usage")))
            .await?;
        return Ok(());
    }

    let results = state.db.search_experiences(query, true, SEARCH_LIMIT)?;
    debug!("User {} searched '{}': {} hits", user_id, query, results.len());
    if results.is_empty() {
        state
            .messenger
            .send(
                user_id,
                OutgoingMessage::text(texts.format("search_no_results", &[("query", &query)])),
            )
            .await?;
        return Ok(());
    }

    for exp in &results {
        let body = clamp(&render_experience(texts, exp), MAX_MESSAGE_LENGTH);
        state.messenger.send(user_id, OutgoingMessage::text(body)).await?;
    }
    Ok(())
}

/// `/find <text>`: every status, with moderation controls.
pub async fn admin_find(state: &AppState, admin_id: UserId, query: &str) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    let texts = &state.texts;
    let query = query.trim();
    if query.is_empty() {
        state
            .messenger
            .send(admin_id, OutgoingMessage::text(texts.get("find_usage")))
            .await?;
        return Ok(());
    }

    let results = state.db.search_experiences(query, false, SEARCH_LIMIT)?;
    if results.is_empty() {
        state
            .messenger
            .send(
                admin_id,
                OutgoingMessage::text(texts.format("search_no_results", &[("query", &query)])),
            )
            .await?;
        return Ok(());
    }

    for exp in &results {
        let mut message = OutgoingMessage::text(clamp(&moderation_view(texts, exp), MAX_MESSAGE_LENGTH));
        if let Some(keyboard) = keyboards::moderation(texts, exp) {
            message = message.with_keyboard(keyboard);
        }
        state.messenger.send(admin_id, message).await?;
    }
    Ok(())
}

/// Live search typed after the bot's username. An empty query lists the
/// newest published experiences.
pub async fn inline(state: &AppState, query_id: &str, query: &str) -> BotResult<()> {
    let results = state.db.search_experiences(query, true, SEARCH_LIMIT)?;
    let articles = inline_articles(&state.texts, &results);
    state.messenger.answer_inline(query_id, articles).await?;
    Ok(())
}

pub fn inline_articles(texts: &TextStore, results: &[Experience]) -> Vec<InlineArticle> {
    results
        .iter()
        .map(|exp| InlineArticle {
            id: exp.id.to_string(),
            title: format!("{} / {}", exp.professor_name, exp.course_name),
            description: tags(exp),
            body: clamp(&render_experience(texts, exp), MAX_MESSAGE_LENGTH),
        })
        .collect()
}
