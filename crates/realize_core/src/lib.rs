pub mod assistant;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod identity;
pub mod model;
pub mod panel;
pub mod rotation;
pub mod session;
pub mod settings_api;
pub mod storage;

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::model::{Task, TimeSlot};

    #[test]
    fn task_has_required_fields() {
        let task = Task {
            id: "t1".to_string(),
            text: "Grade midterm exams".to_string(),
            completed: false,
            member_id: "1".to_string(),
        };

        assert_eq!(task.id, "t1");
        assert_eq!(task.text, "Grade midterm exams");
        assert!(!task.completed);
        assert_eq!(task.member_id, "1");
    }

    #[test]
    fn time_slot_defaults_to_blank_fields() {
        let slot = TimeSlot::default();

        assert!(slot.period.is_empty());
        assert!(slot.subject.is_empty());
    }

    #[test]
    fn app_error_exposes_code() {
        let err = AppError::invalid_input("missing title");
        assert_eq!(err.code(), "invalid_input");
        assert_eq!(err.to_string(), "invalid_input - missing title");
    }
}
