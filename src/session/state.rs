use serde::Serialize;

/// Feedback shown before the endpoint has said anything.
pub const WAITING_FEEDBACK: &str = "Waiting...";

/// State of the current exercise attempt. Only the controller mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    exercising: bool,
    exercise_kind: String,
    rep_count: u32,
    feedback: String,
}

impl Session {
    pub fn new(exercise_kind: impl Into<String>) -> Self {
        Self {
            exercising: false,
            exercise_kind: exercise_kind.into(),
            rep_count: 0,
            feedback: WAITING_FEEDBACK.to_string(),
        }
    }

    pub fn is_exercising(&self) -> bool {
        self.exercising
    }

    pub fn exercise_kind(&self) -> &str {
        &self.exercise_kind
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub(crate) fn begin(&mut self) {
        self.exercising = true;
        self.reset_stats();
    }

    pub(crate) fn end(&mut self) {
        self.exercising = false;
    }

    pub(crate) fn select(&mut self, exercise_kind: &str) {
        self.exercise_kind = exercise_kind.to_string();
        self.reset_stats();
    }

    pub(crate) fn record_result(&mut self, rep_count: u32, feedback: &str) {
        self.rep_count = rep_count;
        self.feedback = feedback.to_string();
    }

    fn reset_stats(&mut self) {
        self.rep_count = 0;
        self.feedback = WAITING_FEEDBACK.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_idle_with_defaults() {
        let session = Session::new("squat");
        assert!(!session.is_exercising());
        assert_eq!(session.exercise_kind(), "squat");
        assert_eq!(session.rep_count(), 0);
        assert_eq!(session.feedback(), "Waiting...");
    }

    #[test]
    fn begin_resets_counters() {
        let mut session = Session::new("squat");
        session.record_result(4, "Nice depth!");
        session.begin();
        assert!(session.is_exercising());
        assert_eq!(session.rep_count(), 0);
        assert_eq!(session.feedback(), WAITING_FEEDBACK);
    }

    #[test]
    fn end_keeps_the_last_counters() {
        let mut session = Session::new("squat");
        session.begin();
        session.record_result(4, "Nice depth!");
        session.end();
        assert!(!session.is_exercising());
        assert_eq!(session.rep_count(), 4);
    }

    #[test]
    fn select_changes_kind_and_resets_counters() {
        let mut session = Session::new("squat");
        session.record_result(2, "Ready to squat");
        session.select("push_up");
        assert_eq!(session.exercise_kind(), "push_up");
        assert_eq!(session.rep_count(), 0);
        assert_eq!(session.feedback(), WAITING_FEEDBACK);
    }
}
