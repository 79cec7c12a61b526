//! Flavor text for the puppy.
//!
//! Thoughts and chat replies come from Gemini's `generateContent` endpoint.
//! Every request has a local fallback, so a missing key, a slow network or an
//! outage only changes what the bubble says, never whether the pet works.

use crate::config::GeminiSettings;
use crate::model::{ChatMessage, ChatRole, PetSnapshot, ReasonCode};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::sync::mpsc;

pub(crate) const EMPTY_THOUGHT: &str = "Woof!";
pub(crate) const CHAT_FALLBACK: &str = "Wroof... (My connection feels fuzzy...)";
pub(crate) const EMPTY_CHAT: &str = "Woof? (I'm a bit confused!)";

pub(crate) fn fallback_thought(reason: ReasonCode) -> &'static str {
    match reason {
        ReasonCode::Hunger => "Rumbly tummy... Woof? 🍔",
        ReasonCode::Energy => "So... sleepy... Zzz 💤",
        ReasonCode::Happiness => "Play with me? Arf! ⚽",
        ReasonCode::Hygiene => "I'm a bit itchy... *scratch* 🧼",
        ReasonCode::Boredom => "Squirrel?! Where? 🐿️",
        ReasonCode::LevelUp => "I'm a big pup now! ✨",
    }
}

#[derive(Debug, Error)]
pub(crate) enum ThoughtError {
    #[error("no Gemini API key in the environment")]
    MissingKey,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gemini returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Gemini returned no text")]
    Empty,
    #[error("no answer within {0:?}")]
    Timeout(Duration),
}

/* -----------------------------
   Wire format
------------------------------ */

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct Part {
    pub(crate) text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct Content {
    pub(crate) role: String,
    pub(crate) parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct SystemInstruction {
    pub(crate) parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub(crate) temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) top_p: Option<f32>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest {
    pub(crate) system_instruction: SystemInstruction,
    pub(crate) contents: Vec<Content>,
    pub(crate) generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, trimmed. `None` if there is nothing to show.
    pub(crate) fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let joined: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

fn user_turn(text: impl Into<String>) -> Content {
    Content {
        role: "user".to_string(),
        parts: vec![Part { text: text.into() }],
    }
}

fn stats_block(pet: &PetSnapshot) -> String {
    format!(
        "Current Stats:\n\
         - Hunger: {:.0}/100\n\
         - Energy: {:.0}/100\n\
         - Happiness: {:.0}/100\n\
         - Hygiene: {:.0}/100\n\
         - Level: {}",
        pet.hunger, pet.energy, pet.happiness, pet.hygiene, pet.level
    )
}

pub(crate) fn thought_prompt(pet: &PetSnapshot, reason: ReasonCode) -> GenerateRequest {
    let system = format!(
        "You are PixelPup, a cute pixelated puppy dog.\n\
         {}\n\n\
         Context for this thought: {}\n\n\
         Guidelines:\n\
         1. Keep responses extremely short (under 10 words).\n\
         2. Use dog-like sounds (e.g., \"Woof!\", \"Arf!\", \"Bork!\", \"*wags tail*\").\n\
         3. Be cute and expressive.\n\
         4. If the reason is a low stat, mention it in a dog-like way (e.g., \"Tummy is rumbly! Arf!\").",
        stats_block(pet),
        reason.as_str()
    );
    GenerateRequest {
        system_instruction: SystemInstruction {
            parts: vec![Part { text: system }],
        },
        contents: vec![user_turn("What are you thinking right now?")],
        generation_config: GenerationConfig {
            temperature: 0.9,
            top_p: None,
        },
    }
}

pub(crate) fn chat_prompt(
    message: &str,
    pet: &PetSnapshot,
    history: &[ChatMessage],
) -> GenerateRequest {
    let system = format!(
        "You are PixelPup, a cute pixelated puppy dog.\n\
         {}\n\n\
         Dog Personality Guidelines:\n\
         1. Keep responses short (under 2 sentences).\n\
         2. Use dog-like onomatopoeia (e.g., \"Woof!\", \"Arf!\", \"Bork!\", \"Awooo~\", \"*wags tail*\").\n\
         3. If hunger is low, whine and ask for treats. If energy is low, yawn.\n\
         4. You are extremely loyal but easily distracted by imaginary squirrels.\n\
         5. Refer to yourself as a \"good boy\" or \"good pup\".",
        stats_block(pet)
    );

    let mut contents: Vec<Content> = history
        .iter()
        .map(|m| Content {
            role: match m.role {
                ChatRole::User => "user".to_string(),
                ChatRole::Pet => "model".to_string(),
            },
            parts: vec![Part {
                text: m.text.clone(),
            }],
        })
        .collect();
    contents.push(user_turn(message));

    GenerateRequest {
        system_instruction: SystemInstruction {
            parts: vec![Part { text: system }],
        },
        contents,
        generation_config: GenerationConfig {
            temperature: 0.8,
            top_p: Some(0.9),
        },
    }
}

/* -----------------------------
   HTTP client
------------------------------ */

pub(crate) struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub(crate) fn new(api_base: String, api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    pub(crate) fn from_settings(settings: &GeminiSettings) -> Result<Self, ThoughtError> {
        let key = settings.api_key().ok_or(ThoughtError::MissingKey)?;
        Ok(Self::new(
            settings.api_base.clone(),
            key,
            settings.model.clone(),
        ))
    }

    pub(crate) fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    pub(crate) async fn generate(&self, request: &GenerateRequest) -> Result<String, ThoughtError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(ThoughtError::Status { status, body });
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed.text().ok_or(ThoughtError::Empty)
    }
}

/* -----------------------------
   Broker
------------------------------ */

/// Identifies one flavor-text request. Larger tickets are newer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Ticket(u64);

#[derive(Clone, Debug)]
pub(crate) struct ThoughtRequest {
    pub(crate) snapshot: PetSnapshot,
    pub(crate) reason: ReasonCode,
}

#[derive(Clone, Debug)]
pub(crate) struct ChatRequest {
    pub(crate) message: String,
    pub(crate) snapshot: PetSnapshot,
    pub(crate) history: Vec<ChatMessage>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Reply {
    Thought { ticket: Ticket, text: String },
    Chat { ticket: Ticket, text: String },
}

/// Runs flavor-text requests in the background and reports back over a channel.
///
/// The UI loop never waits on these; it drains the receiver each frame.
pub(crate) struct ThoughtBroker {
    client: Option<Arc<GeminiClient>>,
    timeout: Duration,
    tx: mpsc::Sender<Reply>,
    next_ticket: u64,
}

impl ThoughtBroker {
    pub(crate) fn new(
        client: Option<GeminiClient>,
        timeout: Duration,
    ) -> (Self, mpsc::Receiver<Reply>) {
        let (tx, rx) = mpsc::channel(16);
        let broker = Self {
            client: client.map(Arc::new),
            timeout,
            tx,
            next_ticket: 0,
        };
        (broker, rx)
    }

    pub(crate) fn is_online(&self) -> bool {
        self.client.is_some()
    }

    fn issue(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    pub(crate) fn request_thought(&mut self, req: ThoughtRequest) -> Ticket {
        let ticket = self.issue();
        let client = self.client.clone();
        let timeout = self.timeout;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let prompt = thought_prompt(&req.snapshot, req.reason);
            let text = resolve(
                client.as_deref(),
                &prompt,
                timeout,
                fallback_thought(req.reason),
                EMPTY_THOUGHT,
            )
            .await;
            tx.send(Reply::Thought { ticket, text }).await.ok();
        });
        ticket
    }

    pub(crate) fn request_chat(&mut self, req: ChatRequest) -> Ticket {
        let ticket = self.issue();
        let client = self.client.clone();
        let timeout = self.timeout;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let prompt = chat_prompt(&req.message, &req.snapshot, &req.history);
            let text = resolve(client.as_deref(), &prompt, timeout, CHAT_FALLBACK, EMPTY_CHAT).await;
            tx.send(Reply::Chat { ticket, text }).await.ok();
        });
        ticket
    }
}

async fn resolve(
    client: Option<&GeminiClient>,
    prompt: &GenerateRequest,
    timeout: Duration,
    fallback: &str,
    empty: &str,
) -> String {
    let Some(client) = client else {
        return fallback.to_string();
    };
    let result = tokio::time::timeout(timeout, client.generate(prompt))
        .await
        .unwrap_or(Err(ThoughtError::Timeout(timeout)));
    match result {
        Ok(text) => text,
        Err(ThoughtError::Empty) => empty.to_string(),
        Err(err) => {
            tracing::warn!(error = %err, "flavor text request failed, using fallback");
            fallback.to_string()
        }
    }
}
