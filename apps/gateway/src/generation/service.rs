//! Course generation service, the generation-specific caller of `RequestGateway`.
//!
//! Flow for every generation call:
//!   validate → rate-limit check (keyed by topic) → request with retry → normalize.
//!
//! Parameter failures and rate-limit denials never touch the network. Only
//! retryable errors (network, 408, 429, 5xx) are retried.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::errors::GatewayError;
use crate::gateway::envelope::{ApiResult, Envelope, Failure};
use crate::gateway::rate_limiter::RateLimiter;
use crate::gateway::retry::RetryExecutor;
use crate::gateway::RequestGateway;
use crate::generation::requests::{
    AssessmentCourseRequest, AssessmentRequest, ChatRequest, ContentRequest, CourseRequest,
    FeedbackRequest, ModuleLessonsRequest, PersonaChatRequest, PersonaContentRequest,
    PersonaCourseRequest, PersonaRequest, PersonaUpdateRequest, PracticeProblemsRequest,
    PracticeRequest, SessionRequest,
};
use crate::models::assessment::{LearningStyle, MCQuestion};
use crate::models::course::{Course, Exercise, Lesson, Session};
use crate::models::persona::{PersonaBundle, PersonaContent, PersonaUpdate};
use crate::models::practice::PracticeProblem;
use crate::normalize::{
    normalize_course, normalize_exercises, normalize_lessons, normalize_persona_bundle,
    normalize_persona_content, normalize_persona_update, normalize_practice_problems,
    normalize_questions, normalize_session, CourseContext, Normalized, Repair,
};

/// Rate-limit key shared by all chat messages.
const CHAT_IDENTIFIER: &str = "chat";

pub mod endpoints {
    pub const COURSE: &str = "course/generate";
    pub const COURSE_FROM_ASSESSMENT: &str = "course/generate-from-assessment";
    pub const MODULE_LESSONS: &str = "module/generate-lessons";
    pub const SESSION: &str = "daily-session/generate";
    pub const ASSESSMENT: &str = "assessment/generate";
    pub const CONTENT: &str = "content/generate";
    pub const PRACTICE: &str = "practice/generate";
    pub const PRACTICE_PROBLEMS: &str = "practice/problems";
    pub const PERSONA: &str = "persona/generate";
    pub const PERSONA_UPDATE: &str = "persona/update";
    pub const PERSONA_CONTENT: &str = "persona/content";
    pub const PERSONA_CHAT: &str = "persona/chat";
    pub const COURSE_WITH_PERSONA: &str = "course/generate-with-persona";
    pub const CHAT: &str = "chat";
    pub const FEEDBACK: &str = "feedback";
}

/// Explicitly constructed by the composition root; no global instance.
#[derive(Clone)]
pub struct CourseGateway {
    gateway: RequestGateway,
    limiter: Arc<RateLimiter>,
    retry: RetryExecutor,
    retries: u32,
}

impl CourseGateway {
    pub fn new(
        gateway: RequestGateway,
        limiter: Arc<RateLimiter>,
        retry: RetryExecutor,
        retries: u32,
    ) -> Self {
        Self {
            gateway,
            limiter,
            retry,
            retries,
        }
    }

    pub async fn generate_course(&self, request: &CourseRequest) -> ApiResult<Normalized<Course>> {
        let endpoint = endpoints::COURSE;
        request.validate().map_err(|e| Failure::new(e, endpoint))?;
        info!("Generating {} course on '{}'", request.difficulty, request.topic.trim());

        let envelope = self
            .generate(endpoint, request.topic.trim(), request.payload())
            .await?;
        let ctx = CourseContext {
            topic: Some(request.topic.trim().to_string()),
            difficulty: Some(request.difficulty),
            duration: Some(request.duration),
        };
        course_result(envelope, &ctx, endpoint)
    }

    pub async fn generate_course_from_assessment(
        &self,
        request: &AssessmentCourseRequest,
    ) -> ApiResult<Normalized<Course>> {
        let endpoint = endpoints::COURSE_FROM_ASSESSMENT;
        request.validate().map_err(|e| Failure::new(e, endpoint))?;
        info!("Generating personalized course on '{}'", request.topic.trim());

        let envelope = self
            .generate(endpoint, request.topic.trim(), request.payload())
            .await?;
        let ctx = CourseContext {
            topic: Some(request.topic.trim().to_string()),
            difficulty: Some(request.assessment.prior_knowledge.level),
            duration: Some(request.duration),
        };
        course_result(envelope, &ctx, endpoint)
    }

    pub async fn generate_module_lessons(
        &self,
        request: &ModuleLessonsRequest,
    ) -> ApiResult<Normalized<Vec<Lesson>>> {
        let envelope = self.module_lessons_raw(request).await?;
        let lessons = normalize_lessons(&envelope.data, &request.module_id);
        if lessons.value.is_empty() {
            warn!(module_id = %request.module_id, "lesson generation came back empty");
            return Err(Failure {
                error: GatewayError::Generation(format!(
                    "no lessons generated for module '{}'",
                    request.module_id
                )),
                metadata: envelope.metadata,
            });
        }
        info!(module_id = %request.module_id, lessons = lessons.value.len(), "lessons generated");
        Ok(Envelope {
            data: lessons,
            metadata: envelope.metadata,
        })
    }

    /// Generates a fresh lesson list for one module of `course` and swaps it in.
    /// The course is left untouched on failure.
    pub async fn regenerate_module_lessons(
        &self,
        course: &mut Course,
        module_id: &str,
        learning_style: &LearningStyle,
    ) -> ApiResult<Vec<Repair>> {
        let endpoint = endpoints::MODULE_LESSONS;
        let module = course.module(module_id).ok_or_else(|| {
            Failure::new(
                GatewayError::InvalidRequest(format!("unknown module '{module_id}'")),
                endpoint,
            )
        })?;
        let request = ModuleLessonsRequest {
            course_id: course.id.clone(),
            module_id: module.id.clone(),
            topic: course.topic.clone(),
            module_title: module.title.clone(),
            module_description: module.description.clone(),
            difficulty: course.difficulty,
            learning_style: learning_style.clone(),
            assessment: None,
        };

        let envelope = self.module_lessons_raw(&request).await?;
        match course.replace_module_lessons(module_id, &envelope.data) {
            Ok(repairs) => Ok(Envelope {
                data: repairs,
                metadata: envelope.metadata,
            }),
            Err(error) => Err(Failure {
                error,
                metadata: envelope.metadata,
            }),
        }
    }

    pub async fn generate_session(&self, request: &SessionRequest) -> ApiResult<Normalized<Session>> {
        let endpoint = endpoints::SESSION;
        request.validate().map_err(|e| Failure::new(e, endpoint))?;
        info!(
            module_id = %request.module_id,
            minutes = request.duration_minutes,
            "Generating session on '{}'",
            request.topic.trim()
        );

        let envelope = self
            .generate(endpoint, request.topic.trim(), request.payload())
            .await?;
        let parent_id = request.parent_id().to_string();
        let index = request.previous_sessions.len();
        Ok(envelope.map(|data| {
            let raw = match data {
                Value::Object(mut map) if map.get("session").is_some_and(Value::is_object) => {
                    map.remove("session").unwrap_or(Value::Null)
                }
                other => other,
            };
            normalize_session(&raw, &parent_id, index)
        }))
    }

    pub async fn generate_assessment(
        &self,
        request: &AssessmentRequest,
    ) -> ApiResult<Normalized<Vec<MCQuestion>>> {
        let endpoint = endpoints::ASSESSMENT;
        request.validate().map_err(|e| Failure::new(e, endpoint))?;
        info!(
            count = request.clamped_count(),
            "Generating {} on '{}'",
            request.kind.as_str(),
            request.topic.trim()
        );

        let envelope = self
            .generate(endpoint, request.topic.trim(), request.payload())
            .await?;
        Ok(envelope.map(|data| normalize_questions(&data)))
    }

    /// Content shapes vary by kind; the payload is returned as sent.
    pub async fn generate_content(&self, request: &ContentRequest) -> ApiResult<Value> {
        let endpoint = endpoints::CONTENT;
        request.validate().map_err(|e| Failure::new(e, endpoint))?;
        self.generate(endpoint, request.topic.trim(), request.payload())
            .await
    }

    pub async fn generate_practice(
        &self,
        request: &PracticeRequest,
    ) -> ApiResult<Normalized<Vec<Exercise>>> {
        let endpoint = endpoints::PRACTICE;
        request.validate().map_err(|e| Failure::new(e, endpoint))?;
        let envelope = self
            .generate(endpoint, request.topic.trim(), request.payload())
            .await?;
        Ok(envelope.map(|data| normalize_exercises(&data, "practice")))
    }

    /// Reply text: the `response` field, or the whole payload as text.
    pub async fn chat(&self, request: &ChatRequest) -> ApiResult<String> {
        let endpoint = endpoints::CHAT;
        request.validate().map_err(|e| Failure::new(e, endpoint))?;
        let envelope = self
            .generate(endpoint, CHAT_IDENTIFIER, request.payload())
            .await?;
        Ok(envelope.map(reply_text))
    }

    /// Batch of standalone problems. An empty batch is a generation error.
    pub async fn generate_practice_problems(
        &self,
        request: &PracticeProblemsRequest,
    ) -> ApiResult<Normalized<Vec<PracticeProblem>>> {
        let endpoint = endpoints::PRACTICE_PROBLEMS;
        request.validate().map_err(|e| Failure::new(e, endpoint))?;
        info!(
            count = request.clamped_count(),
            "Generating practice problems on '{}'",
            request.topic.trim()
        );

        let envelope = self
            .generate(endpoint, request.topic.trim(), request.payload())
            .await?;
        let problems = normalize_practice_problems(
            &envelope.data,
            request.topic.trim(),
            request.difficulty.as_str(),
        );
        if problems.value.is_empty() {
            warn!(endpoint, "practice problems came back empty");
            return Err(Failure {
                error: GatewayError::Generation("no practice problems generated".to_string()),
                metadata: envelope.metadata,
            });
        }
        Ok(Envelope {
            data: problems,
            metadata: envelope.metadata,
        })
    }

    pub async fn generate_persona(
        &self,
        request: &PersonaRequest,
    ) -> ApiResult<Normalized<PersonaBundle>> {
        let endpoint = endpoints::PERSONA;
        request.validate().map_err(|e| Failure::new(e, endpoint))?;
        info!("Generating teaching persona for '{}'", request.topic.trim());

        let envelope = self
            .generate(endpoint, request.topic.trim(), request.payload())
            .await?;
        let topic = request.topic.trim();
        Ok(envelope.map(|data| normalize_persona_bundle(&data, topic)))
    }

    /// Rate limited per persona rather than per topic.
    pub async fn update_persona(
        &self,
        request: &PersonaUpdateRequest,
    ) -> ApiResult<Normalized<PersonaUpdate>> {
        let endpoint = endpoints::PERSONA_UPDATE;
        request.validate().map_err(|e| Failure::new(e, endpoint))?;
        info!(persona_id = %request.persona_id, "Updating teaching persona");

        let envelope = self
            .generate(endpoint, &request.persona_id, request.payload())
            .await?;
        Ok(envelope.map(|data| normalize_persona_update(&data, &request.persona_id)))
    }

    pub async fn generate_persona_content(
        &self,
        request: &PersonaContentRequest,
    ) -> ApiResult<Normalized<PersonaContent>> {
        let endpoint = endpoints::PERSONA_CONTENT;
        request.validate().map_err(|e| Failure::new(e, endpoint))?;
        info!(
            persona_id = %request.persona_id,
            "Generating {} on '{}'",
            request.kind,
            request.topic.trim()
        );

        let envelope = self
            .generate(endpoint, request.topic.trim(), request.payload())
            .await?;
        Ok(envelope.map(|data| {
            normalize_persona_content(&data, &request.persona_id, request.topic.trim(), request.kind)
        }))
    }

    pub async fn generate_course_with_persona(
        &self,
        request: &PersonaCourseRequest,
    ) -> ApiResult<Normalized<Course>> {
        let endpoint = endpoints::COURSE_WITH_PERSONA;
        request.validate().map_err(|e| Failure::new(e, endpoint))?;
        info!(
            persona_id = %request.persona_id,
            "Generating {} course on '{}'",
            request.difficulty,
            request.topic.trim()
        );

        let envelope = self
            .generate(endpoint, request.topic.trim(), request.payload())
            .await?;
        let ctx = CourseContext {
            topic: Some(request.topic.trim().to_string()),
            difficulty: Some(request.difficulty),
            duration: Some(request.duration),
        };
        course_result(envelope, &ctx, endpoint)
    }

    /// Shares the chat rate-limit bucket with `chat`.
    pub async fn persona_chat(&self, request: &PersonaChatRequest) -> ApiResult<String> {
        let endpoint = endpoints::PERSONA_CHAT;
        request.validate().map_err(|e| Failure::new(e, endpoint))?;
        let envelope = self
            .generate(endpoint, CHAT_IDENTIFIER, request.payload())
            .await?;
        Ok(envelope.map(reply_text))
    }

    /// Fire-and-forget feedback. Not rate limited, not retried.
    pub async fn submit_feedback(&self, request: &FeedbackRequest) -> ApiResult<Value> {
        let endpoint = endpoints::FEEDBACK;
        request.validate().map_err(|e| Failure::new(e, endpoint))?;
        self.gateway.request(endpoint, &request.payload()).await
    }

    async fn module_lessons_raw(&self, request: &ModuleLessonsRequest) -> ApiResult<Value> {
        let endpoint = endpoints::MODULE_LESSONS;
        request.validate().map_err(|e| Failure::new(e, endpoint))?;
        info!(module_id = %request.module_id, "Generating lessons for '{}'", request.module_title);
        self.generate(endpoint, request.topic.trim(), request.payload())
            .await
    }

    /// Rate-limit check, then the request wrapped in the retry executor.
    async fn generate(&self, endpoint: &str, identifier: &str, payload: Value) -> ApiResult<Value> {
        if !self.limiter.check(identifier) {
            warn!(endpoint, identifier, "request rejected by local rate limit");
            return Err(Failure::new(
                GatewayError::RateLimitExceeded {
                    identifier: identifier.to_string(),
                },
                endpoint,
            ));
        }

        let gateway = &self.gateway;
        let payload = &payload;
        self.retry
            .execute_when(
                self.retries,
                move || gateway.request(endpoint, payload),
                |failure: &Failure| failure.error.is_retryable(),
            )
            .await
    }
}

fn reply_text(data: Value) -> String {
    match data {
        Value::String(text) => text,
        Value::Object(ref map) => match map.get("response") {
            Some(Value::String(reply)) => reply.clone(),
            _ => data.to_string(),
        },
        other => other.to_string(),
    }
}

fn course_result(
    envelope: Envelope<Value>,
    ctx: &CourseContext,
    endpoint: &str,
) -> ApiResult<Normalized<Course>> {
    let normalized = normalize_course(&envelope.data, ctx);
    if normalized.value.modules.is_empty() {
        warn!(endpoint, "course came back without modules");
        return Err(Failure {
            error: GatewayError::Generation("the generated course has no modules".to_string()),
            metadata: envelope.metadata,
        });
    }
    info!(
        course_id = %normalized.value.id,
        modules = normalized.value.modules.len(),
        repairs = normalized.repairs.len(),
        "course generated"
    );
    Ok(Envelope {
        data: normalized,
        metadata: envelope.metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::transport::scripted::ScriptedTransport;
    use crate::models::course::{Difficulty, DurationClass};
    use crate::generation::requests::AssessmentKind;
    use crate::models::persona::PersonaContentKind;
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::Instant;

    fn service(transport: ScriptedTransport, max_requests: u32) -> (CourseGateway, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let service = CourseGateway::new(
            RequestGateway::new(transport.clone()),
            Arc::new(RateLimiter::new(max_requests, Duration::from_secs(60))),
            RetryExecutor::default(),
            3,
        );
        (service, transport)
    }

    fn course_request(topic: &str) -> CourseRequest {
        CourseRequest {
            topic: topic.to_string(),
            difficulty: Difficulty::Beginner,
            duration: DurationClass::FourWeeks,
        }
    }

    fn course_body() -> Value {
        json!({"success": true, "data": {
            "title": "Rust",
            "modules": [{"title": "Ownership", "lessons": [{"title": "Moves"}]}]
        }})
    }

    #[tokio::test]
    async fn test_generate_course_normalizes_payload() {
        let (service, transport) = service(ScriptedTransport::new().respond_json(200, course_body()), 10);
        let envelope = service.generate_course(&course_request("Rust")).await.unwrap();

        let course = envelope.data.value;
        assert_eq!(course.topic, "Rust");
        assert_eq!(course.modules[0].duration, 4);
        assert_eq!(course.modules[0].lessons[0].duration, 60);
        assert!(!envelope.data.repairs.is_empty());

        let calls = transport.calls();
        assert_eq!(calls[0].0, "course/generate");
        assert_eq!(calls[0].1["duration"], "4-weeks");
    }

    #[tokio::test]
    async fn test_course_without_modules_is_generation_error() {
        let (service, _) = service(
            ScriptedTransport::new().respond_json(200, json!({"success": true, "data": {"title": "Empty"}})),
            10,
        );
        let failure = service.generate_course(&course_request("Rust")).await.unwrap_err();
        assert_eq!(failure.code(), "GENERATION_ERROR");
    }

    #[tokio::test]
    async fn test_invalid_request_never_hits_network() {
        let (service, transport) = service(ScriptedTransport::new(), 10);
        let failure = service.generate_course(&course_request("  ")).await.unwrap_err();
        assert_eq!(failure.code(), "INVALID_REQUEST");
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_fails_fast_without_network() {
        let (service, transport) = service(ScriptedTransport::new().respond_json(200, course_body()), 1);

        assert!(service.generate_course(&course_request("Rust")).await.is_ok());
        let failure = service.generate_course(&course_request("Rust")).await.unwrap_err();
        assert_eq!(failure.code(), "RATE_LIMIT_EXCEEDED");
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_errors_are_retried() {
        let (service, transport) = service(
            ScriptedTransport::new()
                .fail("connection reset")
                .fail("connection reset")
                .respond_json(200, course_body()),
            10,
        );
        let start = Instant::now();
        let envelope = service.generate_course(&course_request("Rust")).await.unwrap();

        assert_eq!(envelope.data.value.modules.len(), 1);
        assert_eq!(transport.call_count(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_surfaces_after_last_attempt() {
        let (service, transport) = service(
            ScriptedTransport::new().fail("down").fail("down").fail("down"),
            10,
        );
        let failure = service.generate_course(&course_request("Rust")).await.unwrap_err();
        assert_eq!(failure.code(), "NETWORK_ERROR");
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn test_validation_error_is_not_retried() {
        let (service, transport) = service(
            ScriptedTransport::new().respond(422, r#"{"detail": [{"loc": ["body", "topic"], "msg": "field required"}]}"#),
            10,
        );
        let failure = service.generate_course(&course_request("Rust")).await.unwrap_err();
        assert_eq!(failure.code(), "VALIDATION_ERROR");
        assert!(failure.message().contains("body.topic: field required"));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_module_lessons_empty_is_generation_error() {
        let (service, _) = service(ScriptedTransport::new().respond_json(200, json!({"lessons": []})), 10);
        let request = ModuleLessonsRequest {
            course_id: "c1".to_string(),
            module_id: "m1".to_string(),
            topic: "Rust".to_string(),
            module_title: "Ownership".to_string(),
            module_description: String::new(),
            difficulty: Difficulty::Beginner,
            learning_style: LearningStyle::default(),
            assessment: None,
        };
        let failure = service.generate_module_lessons(&request).await.unwrap_err();
        assert_eq!(failure.code(), "GENERATION_ERROR");
    }

    #[tokio::test]
    async fn test_regenerate_module_lessons_updates_course() {
        let (service, transport) = service(
            ScriptedTransport::new()
                .respond_json(200, course_body())
                .respond_json(200, json!({"success": true, "data": [{"title": "Borrowing"}, {"title": "Lifetimes"}]})),
            10,
        );
        let mut course = service
            .generate_course(&course_request("Rust"))
            .await
            .unwrap()
            .data
            .value;
        let module_id = course.modules[0].id.clone();

        service
            .regenerate_module_lessons(&mut course, &module_id, &LearningStyle::default())
            .await
            .unwrap();

        let titles: Vec<_> = course.modules[0].lessons.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Borrowing", "Lifetimes"]);
        assert_eq!(transport.calls()[1].1["module_name"], "Ownership");
    }

    #[tokio::test]
    async fn test_generate_session_unwraps_session_key() {
        let (service, _) = service(
            ScriptedTransport::new().respond_json(200, json!({"success": true, "data": {"session": {"title": "Traits 101"}}})),
            10,
        );
        let mut request = SessionRequest::new("u1", "c1", "m1", "Rust");
        request.lesson_id = Some("l1".to_string());
        request.previous_sessions = vec!["Intro".to_string()];

        let session = service.generate_session(&request).await.unwrap().data.value;
        assert_eq!(session.title, "Traits 101");
        assert_eq!(session.id, "session_l1_2");
        assert_eq!(session.duration, 30);
    }

    #[tokio::test]
    async fn test_generate_session_posts_daily_session_payload() {
        let (service, transport) = service(
            ScriptedTransport::new().respond_json(200, json!({"success": true, "data": {"title": "Traits"}})),
            10,
        );
        let mut request = SessionRequest::new("u1", "c1", "m1", "Rust");
        request.previous_sessions = vec!["Intro".to_string()];
        service.generate_session(&request).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls[0].0, "daily-session/generate");
        assert_eq!(calls[0].1["user_id"], "u1");
        assert_eq!(calls[0].1["previous_sessions"][0]["title"], "Intro");
    }

    #[tokio::test]
    async fn test_generate_assessment_falls_back_to_starter_set() {
        let (service, transport) = service(
            ScriptedTransport::new().respond_json(200, json!({"success": true, "data": {"questions": []}})),
            10,
        );
        let request = AssessmentRequest {
            topic: "Rust".to_string(),
            kind: AssessmentKind::Quiz,
            count: 50,
        };
        let questions = service.generate_assessment(&request).await.unwrap().data.value;
        assert_eq!(questions.len(), 3);
        assert_eq!(transport.calls()[0].1["count"], 20);
    }

    #[tokio::test]
    async fn test_chat_extracts_response_text() {
        let (service, _) = service(
            ScriptedTransport::new()
                .respond_json(200, json!({"success": true, "data": {"response": "Use iterators.", "type": "guidance"}}))
                .respond_json(200, json!({"success": true, "data": {"answer": 42}})),
            10,
        );
        let request = ChatRequest {
            message: "How do I loop?".to_string(),
            context: None,
        };
        assert_eq!(service.chat(&request).await.unwrap().data, "Use iterators.");
        assert_eq!(service.chat(&request).await.unwrap().data, r#"{"answer":42}"#);
    }

    #[tokio::test]
    async fn test_feedback_is_not_retried_or_limited() {
        let (service, transport) = service(ScriptedTransport::new().respond(503, "busy"), 0);
        let request = FeedbackRequest {
            course_id: Some("c1".to_string()),
            rating: 5,
            comment: "Great".to_string(),
        };
        let failure = service.submit_feedback(&request).await.unwrap_err();
        assert_eq!(failure.code(), "HTTP_503");
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_generate_practice_normalizes_exercises() {
        let (service, _) = service(
            ScriptedTransport::new().respond_json(200, json!({"success": true, "data": {
                "title": "Loops",
                "exercises": [{"question": "Sum a vector"}]
            }})),
            10,
        );
        let request = PracticeRequest {
            topic: "Rust".to_string(),
            difficulty: Difficulty::Beginner,
            previous_interactions: vec![],
        };
        let exercises = service.generate_practice(&request).await.unwrap().data.value;
        assert_eq!(exercises[0].id, "exercise_practice_1");
    }

    #[tokio::test]
    async fn test_generate_practice_problems() {
        let (service, transport) = service(
            ScriptedTransport::new()
                .respond_json(200, json!({"success": true, "data": [{"title": "FizzBuzz"}]}))
                .respond_json(200, json!({"success": true, "data": []})),
            10,
        );
        let mut request = PracticeProblemsRequest::new("Rust");
        request.count = 25;

        let problems = service.generate_practice_problems(&request).await.unwrap().data.value;
        assert_eq!(problems[0].title, "FizzBuzz");
        assert_eq!(problems[0].difficulty, "intermediate");
        assert_eq!(transport.calls()[0].0, "practice/problems");
        assert_eq!(transport.calls()[0].1["count"], 10);

        let failure = service.generate_practice_problems(&request).await.unwrap_err();
        assert_eq!(failure.code(), "GENERATION_ERROR");
    }

    #[tokio::test]
    async fn test_generate_persona_normalizes_bundle() {
        let (service, transport) = service(
            ScriptedTransport::new().respond_json(200, json!({"success": true, "data": {
                "persona": {"id": "p1", "name": "Ferris", "role": "mentor"},
                "userProfile": {"learningStyle": "visual"},
                "initialContent": {"title": "Welcome", "content": "Hi"}
            }})),
            10,
        );
        let request = PersonaRequest {
            user_input: "I like diagrams".to_string(),
            topic: "Rust".to_string(),
        };
        let bundle = service.generate_persona(&request).await.unwrap().data.value;
        assert_eq!(bundle.persona.name, "Ferris");
        assert_eq!(bundle.user_profile.learning_style, "visual");
        assert_eq!(bundle.initial_content.persona_id, "p1");
        assert_eq!(transport.calls()[0].0, "persona/generate");
    }

    #[tokio::test]
    async fn test_persona_update_is_limited_per_persona() {
        let body = json!({"success": true, "data": {"persona": {"name": "Ferris"}}});
        let (service, transport) = service(
            ScriptedTransport::new()
                .respond_json(200, body.clone())
                .respond_json(200, body),
            1,
        );
        let request = |id: &str| PersonaUpdateRequest {
            persona_id: id.to_string(),
            changes: json!({"tone": "Playful"}),
        };

        let update = service.update_persona(&request("p1")).await.unwrap().data.value;
        assert_eq!(update.persona.id, "p1");
        let failure = service.update_persona(&request("p1")).await.unwrap_err();
        assert_eq!(failure.code(), "RATE_LIMIT_EXCEEDED");
        assert!(service.update_persona(&request("p2")).await.is_ok());
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_persona_content_and_course() {
        let (service, transport) = service(
            ScriptedTransport::new()
                .respond_json(200, json!({"success": true, "data": {"content": "Ownership means..."}}))
                .respond_json(200, course_body()),
            10,
        );
        let content = PersonaContentRequest {
            persona_id: "p1".to_string(),
            topic: "Rust".to_string(),
            kind: PersonaContentKind::Summary,
        };
        let content = service.generate_persona_content(&content).await.unwrap().data.value;
        assert_eq!(content.kind, PersonaContentKind::Summary);
        assert_eq!(content.persona_id, "p1");

        let course = PersonaCourseRequest {
            persona_id: "p1".to_string(),
            topic: "Rust".to_string(),
            difficulty: Difficulty::Advanced,
            duration: DurationClass::TwoWeeks,
        };
        let course = service.generate_course_with_persona(&course).await.unwrap().data.value;
        assert_eq!(course.difficulty, Difficulty::Advanced);
        assert_eq!(course.modules[0].duration, 2);

        let calls = transport.calls();
        assert_eq!(calls[0].0, "persona/content");
        assert_eq!(calls[1].0, "course/generate-with-persona");
        assert_eq!(calls[1].1["personaId"], "p1");
    }

    #[tokio::test]
    async fn test_persona_chat_shares_chat_bucket() {
        let (service, transport) = service(
            ScriptedTransport::new()
                .respond_json(200, json!({"success": true, "data": {"response": "Think of a library card."}})),
            1,
        );
        let request = PersonaChatRequest {
            persona_id: "p1".to_string(),
            message: "Explain borrowing".to_string(),
            history: Vec::new(),
            course_context: None,
        };
        let reply = service.persona_chat(&request).await.unwrap().data;
        assert_eq!(reply, "Think of a library card.");

        let chat = ChatRequest {
            message: "And moves?".to_string(),
            context: None,
        };
        assert_eq!(service.chat(&chat).await.unwrap_err().code(), "RATE_LIMIT_EXCEEDED");
        assert_eq!(transport.call_count(), 1);
    }
}
