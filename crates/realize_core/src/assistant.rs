use crate::dashboard::Dashboard;
use crate::error::AppError;
use crate::model::ScheduleEvent;
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;
use time::{OffsetDateTime, Weekday};

pub const QUOTE_DEFAULT: &str =
    "The best way to predict the future is to create it. — Peter Drucker";
pub const QUOTE_ERROR: &str =
    "In learning you will teach, and in teaching you will learn. — Phil Collins";
pub const BRIEFING_UNCONFIGURED: &str =
    "AI Briefing is unavailable. Please configure the API Key.";
pub const BRIEFING_ERROR: &str = "ブリーフィングの生成中にエラーが発生しました。";
pub const CHAT_UNCONFIGURED: &str =
    "AIアシスタントは現在利用できません。APIキーを設定してください。";
pub const CHAT_ERROR: &str = "申し訳ありません、エラーが発生しました。もう一度お試しください。";

const QUOTE_TEMPERATURE: f32 = 0.9;
const QUOTE_PROMPT: &str = "Generate a short, one-sentence inspirational quote suitable for \
teachers in a staff room. Keep it concise and uplifting.";

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub system_instruction: Option<String>,
    pub temperature: Option<f32>,
}

impl GenerateRequest {
    pub fn new<S: Into<String>>(prompt: S) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: None,
            temperature: None,
        }
    }
}

pub trait TextGenerator {
    /// Returns the generated text, possibly empty.
    fn generate(
        &self,
        request: GenerateRequest,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    NotConfigured,
    Empty,
    Failed(AppError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{fallback}")]
pub struct Unavailable {
    pub fallback: &'static str,
    pub reason: UnavailableReason,
}

impl Unavailable {
    pub fn into_text(self) -> String {
        self.fallback.to_string()
    }
}

/// `Result<String, Unavailable>` flattened into the text to show.
pub fn text_or_fallback(result: Result<String, Unavailable>) -> String {
    result.unwrap_or_else(Unavailable::into_text)
}

pub struct Assistant<G> {
    generator: Option<G>,
}

impl<G: TextGenerator> Assistant<G> {
    pub fn new(generator: Option<G>) -> Self {
        Self { generator }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn quote(&self) -> Result<String, Unavailable> {
        let request = GenerateRequest {
            temperature: Some(QUOTE_TEMPERATURE),
            ..GenerateRequest::new(QUOTE_PROMPT)
        };
        self.run("quote", request, QUOTE_DEFAULT, QUOTE_DEFAULT, QUOTE_ERROR)
            .await
    }

    pub async fn daily_briefing(
        &self,
        dashboard: &Dashboard,
        now: OffsetDateTime,
    ) -> Result<String, Unavailable> {
        let request = GenerateRequest::new(briefing_prompt(dashboard, now));
        self.run(
            "briefing",
            request,
            BRIEFING_UNCONFIGURED,
            BRIEFING_ERROR,
            BRIEFING_ERROR,
        )
        .await
    }

    pub async fn chat(
        &self,
        question: &str,
        dashboard: &Dashboard,
        now: OffsetDateTime,
    ) -> Result<String, Unavailable> {
        let request = GenerateRequest {
            system_instruction: Some(chat_system_instruction(now)),
            ..GenerateRequest::new(chat_prompt(question, dashboard)?)
        };
        self.run("chat", request, CHAT_UNCONFIGURED, CHAT_ERROR, CHAT_ERROR)
            .await
    }

    async fn run(
        &self,
        feature: &'static str,
        request: GenerateRequest,
        unconfigured: &'static str,
        empty: &'static str,
        failed: &'static str,
    ) -> Result<String, Unavailable> {
        let Some(generator) = self.generator.as_ref() else {
            return Err(Unavailable {
                fallback: unconfigured,
                reason: UnavailableReason::NotConfigured,
            });
        };

        match generator.generate(request).await {
            Ok(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            Ok(_) => {
                tracing::warn!(feature, "generator returned no text");
                Err(Unavailable {
                    fallback: empty,
                    reason: UnavailableReason::Empty,
                })
            }
            Err(err) => {
                tracing::error!(feature, error = %err, "text generation failed");
                Err(Unavailable {
                    fallback: failed,
                    reason: UnavailableReason::Failed(err),
                })
            }
        }
    }
}

pub fn japanese_weekday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "月曜日",
        Weekday::Tuesday => "火曜日",
        Weekday::Wednesday => "水曜日",
        Weekday::Thursday => "木曜日",
        Weekday::Friday => "金曜日",
        Weekday::Saturday => "土曜日",
        Weekday::Sunday => "日曜日",
    }
}

fn event_time_label(event: &ScheduleEvent, now: OffsetDateTime) -> String {
    if event.is_all_day {
        return "All Day".to_string();
    }
    let local = event.start.to_offset(now.offset());
    format!(
        "{}:{:02}:{:02}",
        local.hour(),
        local.minute(),
        local.second()
    )
}

pub fn briefing_prompt(dashboard: &Dashboard, now: OffsetDateTime) -> String {
    let events: Vec<serde_json::Value> = dashboard
        .events_today(now)
        .into_iter()
        .map(|event| {
            serde_json::json!({
                "title": event.title,
                "time": event_time_label(event, now),
            })
        })
        .collect();
    let announcements: Vec<serde_json::Value> = dashboard
        .announcements()
        .iter()
        .map(|item| serde_json::json!({ "title": item.title, "type": item.kind }))
        .collect();

    format!(
        "You are an AI assistant for a school staff room dashboard. Generate a concise and helpful \"Daily Briefing\" for the teachers.
Today is {weekday}.

Here is the data for today:
- Upcoming Events: {events}
- Announcements: {announcements}
- Pending Tasks: {pending} items.

Based on this data, create a summary in Japanese. Structure it with these sections:
1.  A friendly greeting.
2.  \"今日の予定\" (Today's Schedule): List today's key events.
3.  \"お知らせ\" (Announcements): Mention any 'Important' announcements first, then others.
4.  \"リマインダー\" (Reminders): Briefly mention the number of pending tasks.
5.  A motivational closing sentence.

Keep it clear, friendly, and professional. Use markdown for simple formatting like bolding (**text**).",
        weekday = japanese_weekday(now.weekday()),
        events = serde_json::Value::Array(events),
        announcements = serde_json::Value::Array(announcements),
        pending = dashboard.pending_task_count(),
    )
}

pub fn chat_system_instruction(now: OffsetDateTime) -> String {
    format!(
        "あなたは学校の職員室で使われるダッシュボードの、賢くて親切なAIアシスタントです。
提供されたJSONデータを基に、ユーザーからの質問に日本語で的確に答えてください。
データにない情報は「分かりません」と正直に答えてください。
回答は簡潔で、フレンドリーな口調を心がけてください。
- 今日の日付: {}/{}/{}",
        now.year(),
        u8::from(now.month()),
        now.day()
    )
}

pub fn chat_prompt(question: &str, dashboard: &Dashboard) -> Result<String, Unavailable> {
    let encode = |value: serde_json::Result<String>| {
        value.map_err(|err| Unavailable {
            fallback: CHAT_ERROR,
            reason: UnavailableReason::Failed(AppError::invalid_data(err.to_string())),
        })
    };

    Ok(format!(
        "ユーザーからの質問: \"{question}\"

以下が現在のダッシュボードのデータです。この情報を参考にして回答を生成してください。

- **職員メンバー:** {members}
- **タスクリスト:** {tasks}
- **時間割:** {timetables}
- **週間予定:** {events}
- **お知らせ:** {announcements}",
        members = encode(serde_json::to_string(dashboard.members()))?,
        tasks = encode(serde_json::to_string(dashboard.tasks()))?,
        timetables = encode(serde_json::to_string(dashboard.timetables()))?,
        events = encode(serde_json::to_string(dashboard.schedule_events()))?,
        announcements = encode(serde_json::to_string(dashboard.announcements()))?,
    ))
}

/// Client for the `generateContent` endpoint of the Gemini REST API.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentBody {
    fn from_request(request: GenerateRequest) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.prompt),
                }],
            }],
            system_instruction: request.system_instruction.map(|text| Content {
                role: None,
                parts: vec![Part { text: Some(text) }],
            }),
            generation_config: request
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        }
    }
}

impl GenerateContentResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}

impl GeminiClient {
    pub fn new<K, U, M>(api_key: K, base_url: U, model: M) -> Self
    where
        K: Into<String>,
        U: Into<String>,
        M: Into<String>,
    {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn send(&self, request: GenerateRequest) -> Result<String, AppError> {
        let body = GenerateContentBody::from_request(request);
        tracing::debug!(model = %self.model, "sending generateContent request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| AppError::service(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(AppError::service(format!(
                "generateContent returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| AppError::service(format!("unreadable response: {err}")))?;
        Ok(parsed.text())
    }
}

impl TextGenerator for GeminiClient {
    fn generate(
        &self,
        request: GenerateRequest,
    ) -> impl Future<Output = Result<String, AppError>> + Send {
        self.send(request)
    }
}
