use crate::action_executor::{ActionError, ActionExecutor};
use crate::model::{ActionType, SearchResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The OS effect succeeded; the session should reset.
    Completed,
    /// The effect failed; the session stays as it is.
    Failed(ActionError),
    /// No OS effect was issued; the caller must start an AI stream.
    StreamRequested { prompt: String },
}

/// Turns a committed result into exactly one side effect.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionDispatcher;

impl ActionDispatcher {
    pub fn dispatch<E: ActionExecutor + ?Sized>(
        &self,
        executor: &mut E,
        result: &SearchResult,
    ) -> DispatchOutcome {
        let effect = match result.action_type {
            ActionType::OpenFile | ActionType::OpenApp | ActionType::OpenUrl => {
                executor.open_path(&result.action_data)
            }
            ActionType::CopyToClipboard => executor.copy_to_clipboard(&result.action_data),
            ActionType::AiResponse => {
                return DispatchOutcome::StreamRequested {
                    prompt: result.action_data.clone(),
                }
            }
        };

        match effect {
            Ok(()) => {
                tracing::info!(
                    id = %result.id,
                    action_type = result.action_type.label(),
                    "action executed"
                );
                DispatchOutcome::Completed
            }
            Err(error) => {
                tracing::warn!(
                    id = %result.id,
                    action_type = result.action_type.label(),
                    %error,
                    "action failed"
                );
                DispatchOutcome::Failed(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionDispatcher, DispatchOutcome};
    use crate::action_executor::{ActionError, ExecutedAction, MockActionExecutor};
    use crate::model::{ActionType, SearchResult};

    #[test]
    fn open_types_issue_open_path() {
        let dispatcher = ActionDispatcher;
        let mut executor = MockActionExecutor::default();

        for (action_type, data) in [
            (ActionType::OpenFile, "/tmp/report.txt"),
            (ActionType::OpenApp, "gnome-calculator.desktop"),
            (ActionType::OpenUrl, "https://example.com"),
        ] {
            let result = SearchResult::new("r", "R", action_type, data);
            assert_eq!(
                dispatcher.dispatch(&mut executor, &result),
                DispatchOutcome::Completed
            );
        }

        assert_eq!(
            executor.executed(),
            [
                ExecutedAction::Open("/tmp/report.txt".into()),
                ExecutedAction::Open("gnome-calculator.desktop".into()),
                ExecutedAction::Open("https://example.com".into()),
            ]
        );
    }

    #[test]
    fn copy_writes_clipboard() {
        let dispatcher = ActionDispatcher;
        let mut executor = MockActionExecutor::default();
        let result = SearchResult::new("calc", "= 4", ActionType::CopyToClipboard, "4");

        assert_eq!(
            dispatcher.dispatch(&mut executor, &result),
            DispatchOutcome::Completed
        );
        assert_eq!(executor.executed(), [ExecutedAction::Copy("4".into())]);
    }

    #[test]
    fn ai_response_requests_stream_without_os_effect() {
        let dispatcher = ActionDispatcher;
        let mut executor = MockActionExecutor::default();
        let result = SearchResult::new("ai", "Ask AI", ActionType::AiResponse, "why is the sky blue");

        assert_eq!(
            dispatcher.dispatch(&mut executor, &result),
            DispatchOutcome::StreamRequested {
                prompt: "why is the sky blue".into()
            }
        );
        assert!(executor.executed().is_empty());
    }

    #[test]
    fn failed_effect_is_reported() {
        let dispatcher = ActionDispatcher;
        let mut executor = MockActionExecutor::default();
        executor.fail_next(ActionError::EmptyTarget);
        let result = SearchResult::new("r", "R", ActionType::OpenFile, "");

        assert_eq!(
            dispatcher.dispatch(&mut executor, &result),
            DispatchOutcome::Failed(ActionError::EmptyTarget)
        );
        assert!(executor.executed().is_empty());
    }
}
