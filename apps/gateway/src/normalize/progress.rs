//! In-place mutations of a normalized course: completion toggles and
//! lesson regeneration. Derived progress is recomputed after every change.

use serde_json::Value;
use tracing::{info, warn};

use crate::errors::GatewayError;
use crate::models::course::{Course, Lesson, Module, Session};
use crate::normalize::{normalize_lessons, percent, Repair};

impl Course {
    /// Marks a lesson (and all of its sessions) as done or not done.
    pub fn set_lesson_completed(
        &mut self,
        module_id: &str,
        lesson_id: &str,
        completed: bool,
    ) -> Result<(), GatewayError> {
        let lesson = self.lesson_mut(module_id, lesson_id)?;
        lesson.completed = completed;
        for session in &mut lesson.sessions {
            session.completed = completed;
        }
        self.recompute_progress();
        Ok(())
    }

    pub fn set_session_completed(
        &mut self,
        module_id: &str,
        lesson_id: &str,
        session_id: &str,
        completed: bool,
    ) -> Result<(), GatewayError> {
        self.session_mut(module_id, lesson_id, session_id)?.completed = completed;
        self.recompute_progress();
        Ok(())
    }

    pub fn set_section_completed(
        &mut self,
        module_id: &str,
        lesson_id: &str,
        session_id: &str,
        section_id: &str,
        completed: bool,
    ) -> Result<(), GatewayError> {
        let session = self.session_mut(module_id, lesson_id, session_id)?;
        let section = session
            .sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .ok_or_else(|| not_found("section", section_id))?;
        section.completed = completed;
        self.recompute_progress();
        Ok(())
    }

    /// Re-derives progress bottom-up from the `completed` flags. Nodes whose
    /// progress is caller-owned (`manual_progress`) keep their value. Flags
    /// themselves are never changed here.
    pub fn recompute_progress(&mut self) {
        for module in &mut self.modules {
            for lesson in &mut module.lessons {
                for session in &mut lesson.sessions {
                    let done = session.sections.iter().filter(|s| s.completed).count();
                    derive(&mut session.progress, session.manual_progress, done, session.sections.len());
                }
                let done = lesson.sessions.iter().filter(|s| s.completed).count();
                derive(&mut lesson.progress, lesson.manual_progress, done, lesson.sessions.len());
            }
            let done = module.lessons.iter().filter(|l| l.completed).count();
            derive(&mut module.progress, module.manual_progress, done, module.lessons.len());
        }
        let done = self.modules.iter().filter(|m| m.completed).count();
        derive(&mut self.progress, self.manual_progress, done, self.modules.len());
    }

    /// Normalizes freshly generated lessons under `module_id` and swaps them in.
    /// Returns the repairs the new lessons needed.
    pub fn replace_module_lessons(
        &mut self,
        module_id: &str,
        raw_lessons: &Value,
    ) -> Result<Vec<Repair>, GatewayError> {
        let module = self
            .module_mut(module_id)
            .ok_or_else(|| not_found("module", module_id))?;
        let normalized = normalize_lessons(raw_lessons, module_id);
        if normalized.value.is_empty() {
            warn!(module_id, "regeneration produced no lessons, keeping the old ones");
            return Err(GatewayError::Generation(format!(
                "no lessons generated for module '{module_id}'"
            )));
        }
        swap_lessons(module, normalized.value);
        self.recompute_progress();
        Ok(normalized.repairs)
    }

    fn lesson_mut(&mut self, module_id: &str, lesson_id: &str) -> Result<&mut Lesson, GatewayError> {
        self.module_mut(module_id)
            .ok_or_else(|| not_found("module", module_id))?
            .lesson_mut(lesson_id)
            .ok_or_else(|| not_found("lesson", lesson_id))
    }

    fn session_mut(
        &mut self,
        module_id: &str,
        lesson_id: &str,
        session_id: &str,
    ) -> Result<&mut Session, GatewayError> {
        self.lesson_mut(module_id, lesson_id)?
            .session_mut(session_id)
            .ok_or_else(|| not_found("session", session_id))
    }
}

fn derive(progress: &mut u8, manual: bool, done: usize, total: usize) {
    if !manual {
        *progress = percent(done, total);
    }
}

fn swap_lessons(module: &mut Module, lessons: Vec<Lesson>) {
    info!(
        module_id = %module.id,
        old = module.lessons.len(),
        new = lessons.len(),
        "replacing module lessons"
    );
    module.lessons = lessons;
    module.completed = false;
}

fn not_found(kind: &str, id: &str) -> GatewayError {
    GatewayError::InvalidRequest(format!("unknown {kind} '{id}'"))
}
