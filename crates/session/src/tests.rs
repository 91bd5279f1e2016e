#[cfg(test)]
mod tests {
    use crate::*;
    use colorbook_common::{ActionKind, Credential, ErrorCategory, IdeaMap, ObservableMetrics};
    use colorbook_config::{OpenAiConfig, PromptRegistry};
    use colorbook_runtime::{
        CredentialGate, ModelSettings, RecordedCall, ScriptedBackend, ScriptedConnector, ScriptedFailure,
    };
    use colorbook_store::{IdeaStore, InMemoryIdeaStore, JsonIdeaStore};
    use std::sync::Arc;

    const GOOD_KEY: &str = "sk-good";

    fn session_with(backend: Arc<ScriptedBackend>, store: Arc<dyn IdeaStore>) -> Session {
        session_with_metrics(backend, store, Arc::new(ObservableMetrics::new()))
    }

    fn session_with_metrics(
        backend: Arc<ScriptedBackend>,
        store: Arc<dyn IdeaStore>,
        metrics: Arc<ObservableMetrics>,
    ) -> Session {
        let prompts = PromptRegistry::load_defaults()
            .and_then(|registry| registry.get_default().cloned())
            .unwrap();
        Session::new(
            CredentialGate::new(Arc::new(ScriptedConnector::new(backend, GOOD_KEY))),
            store,
            prompts,
            ModelSettings::from(&OpenAiConfig::default()),
            metrics,
        )
    }

    async fn logged_in(backend: Arc<ScriptedBackend>, store: Arc<dyn IdeaStore>) -> Session {
        let mut session = session_with(backend, store);
        session.dispatch(Event::SubmitCredential(GOOD_KEY.to_string())).await;
        assert!(session.is_authenticated());
        session
    }

    fn authenticated(ideas: &[&str], selected: Option<usize>) -> SessionState {
        let mut workspace = Workspace::new(Credential::parse(GOOD_KEY).unwrap());
        workspace.ideas = ideas.iter().map(|s| s.to_string()).collect();
        workspace.selected = selected;
        SessionState::Authenticated(workspace)
    }

    fn levels(outcome: &Outcome) -> Vec<NoticeLevel> {
        outcome.notices.iter().map(|notice| notice.level).collect()
    }

    // Pure transitions

    #[test]
    fn test_unauthenticated_accepts_only_credentials() {
        let (state, effects) = handle(Event::ShowIdeas { topic: "zima".into() }, SessionState::Unauthenticated);
        assert_eq!(state, SessionState::Unauthenticated);
        assert_eq!(effects, vec![Effect::Notify(Notice::warning(MSG_LOGIN_FIRST))]);

        let (state, effects) = handle(Event::GenerateColoring, SessionState::Unauthenticated);
        assert_eq!(state, SessionState::Unauthenticated);
        assert_eq!(effects.len(), 1);

        let (_, effects) = handle(Event::SubmitCredential(GOOD_KEY.into()), SessionState::Unauthenticated);
        assert_eq!(
            effects,
            vec![Effect::ValidateCredential(Credential::parse(GOOD_KEY).unwrap())]
        );
    }

    #[test]
    fn test_blank_credential_is_not_checked() {
        let (state, effects) = handle(Event::SubmitCredential("   ".into()), SessionState::Unauthenticated);
        assert_eq!(state, SessionState::Unauthenticated);
        assert_eq!(effects, vec![Effect::Notify(Notice::warning(MSG_EMPTY_KEY))]);
    }

    #[test]
    fn test_malformed_credential_shows_reason() {
        let (state, effects) = handle(Event::SubmitCredential("sk bad".into()), SessionState::Unauthenticated);
        assert_eq!(state, SessionState::Unauthenticated);
        assert_eq!(
            effects,
            vec![Effect::Notify(Notice::warning(
                "🔑 Validation failed: API key cannot contain whitespace"
            ))]
        );

        let (_, effects) = handle(Event::SubmitCredential("k".repeat(513)), SessionState::Unauthenticated);
        match effects.as_slice() {
            [Effect::Notify(notice)] => {
                assert_eq!(notice.level, NoticeLevel::Warning);
                assert!(notice.message.contains("too long"));
                assert_ne!(notice.message, MSG_EMPTY_KEY);
            }
            other => panic!("unexpected effects: {:?}", other),
        }
    }

    #[test]
    fn test_credential_check_result() {
        let credential = Credential::parse(GOOD_KEY).unwrap();

        let (state, _) = handle(
            Event::CredentialChecked { credential: credential.clone(), valid: true },
            SessionState::Unauthenticated,
        );
        assert_eq!(state.credential(), Some(&credential));

        let (state, effects) = handle(
            Event::CredentialChecked { credential, valid: false },
            SessionState::Unauthenticated,
        );
        assert_eq!(state.credential(), None);
        assert_eq!(effects, vec![Effect::Notify(Notice::error(MSG_INVALID_KEY))]);
    }

    #[test]
    fn test_show_ideas_requires_topic() {
        let (state, effects) = handle(Event::ShowIdeas { topic: " \t ".into() }, authenticated(&[], None));
        assert!(state.is_authenticated());
        assert_eq!(effects, vec![Effect::Notify(Notice::warning(MSG_EMPTY_TOPIC))]);

        let (state, effects) = handle(Event::ShowIdeas { topic: "zima".into() }, authenticated(&[], None));
        assert_eq!(effects, vec![Effect::GenerateIdeas { topic: "zima".into() }]);
        assert_eq!(state.workspace().and_then(|w| w.topic.as_deref()), Some("zima"));
    }

    #[test]
    fn test_ideas_ready_selects_first_and_saves() {
        let ideas = vec!["a".to_string(), "b".to_string()];
        let (state, effects) = handle(
            Event::IdeasReady { topic: "zima".into(), ideas: ideas.clone() },
            authenticated(&["old"], None),
        );

        let workspace = state.workspace().unwrap();
        assert_eq!(workspace.ideas, ideas);
        assert_eq!(workspace.selected, Some(0));
        assert_eq!(effects, vec![Effect::SaveIdeas { topic: "zima".into(), ideas }]);
    }

    #[test]
    fn test_select_idea_by_index() {
        let (state, effects) = handle(Event::SelectIdea(1), authenticated(&["a", "b", "c"], Some(0)));
        assert!(effects.is_empty());
        assert_eq!(state.workspace().and_then(|w| w.selected_idea()), Some("b"));

        let (state, _) = handle(Event::SelectIdea(3), state);
        assert_eq!(state.workspace().and_then(|w| w.selected), None);
    }

    #[test]
    fn test_generate_coloring_requires_selection() {
        let (_, effects) = handle(Event::GenerateColoring, authenticated(&["a"], None));
        assert_eq!(effects, vec![Effect::Notify(Notice::warning(MSG_NO_SELECTION))]);

        let (_, effects) = handle(Event::GenerateColoring, authenticated(&["a", "b"], Some(1)));
        assert_eq!(effects.len(), 2);
        assert_eq!(effects[1], Effect::GenerateImages { idea: "b".into() });
    }

    #[test]
    fn test_coloring_ready_shows_images() {
        let (_, effects) = handle(
            Event::ColoringReady { idea: "b".into(), urls: vec!["https://x/1.png".into()] },
            authenticated(&["a", "b"], Some(1)),
        );
        assert_eq!(
            effects,
            vec![Effect::ShowImages(vec![colorbook_common::GeneratedImage {
                idea: "b".into(),
                url: "https://x/1.png".into(),
            }])]
        );
    }

    #[test]
    fn test_failure_keeps_session_usable() {
        let state = authenticated(&["a"], Some(0));
        let (next, effects) = handle(
            Event::ActionFailed { action: ActionKind::ShowIdeas, message: "boom".into() },
            state.clone(),
        );
        assert_eq!(next, state);
        assert_eq!(effects, vec![Effect::Notify(Notice::error("boom"))]);
    }

    // Runner

    #[tokio::test]
    async fn test_valid_credential_authenticates() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = session_with(backend.clone(), Arc::new(InMemoryIdeaStore::new()));

        let outcome = session.dispatch(Event::SubmitCredential(format!("  {}  ", GOOD_KEY))).await;

        assert_eq!(outcome.notices, vec![Notice::success(MSG_LOGGED_IN)]);
        assert_eq!(session.state().credential().map(|c| c.expose()), Some(GOOD_KEY));
        assert_eq!(backend.calls().await, vec![RecordedCall::ListModels]);
    }

    #[tokio::test]
    async fn test_invalid_credential_stays_unauthenticated() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = session_with(backend.clone(), Arc::new(InMemoryIdeaStore::new()));

        let outcome = session.dispatch(Event::SubmitCredential("sk-wrong".into())).await;
        assert_eq!(outcome.notices, vec![Notice::error(MSG_INVALID_KEY)]);
        assert!(!session.is_authenticated());
        assert_eq!(session.state().credential(), None);

        // retrying is always allowed
        session.dispatch(Event::SubmitCredential(GOOD_KEY.into())).await;
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_zima_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonIdeaStore::new(dir.path().join("coloring_ideas.json")));
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = logged_in(backend.clone(), store.clone()).await;

        let outcome = session.dispatch(Event::ShowIdeas { topic: "zima".into() }).await;
        assert_eq!(levels(&outcome), vec![NoticeLevel::Success]);

        let saved = store.get("zima").await.unwrap().unwrap();
        assert_eq!(saved.len(), 5);
        let workspace = session.state().workspace().unwrap();
        assert_eq!(workspace.ideas, saved);
        assert_eq!(workspace.selected, Some(0));

        session.dispatch(Event::SelectIdea(2)).await;
        let before: IdeaMap = store.load_all().await.unwrap();

        let outcome = session.dispatch(Event::GenerateColoring).await;
        assert_eq!(outcome.images.len(), 1);
        assert_eq!(outcome.images[0].idea, saved[2]);
        assert_eq!(levels(&outcome), vec![NoticeLevel::Info]);

        assert_eq!(store.load_all().await.unwrap(), before);
        assert_eq!(backend.generation_calls().await, 2);
    }

    #[tokio::test]
    async fn test_empty_topic_makes_no_calls() {
        let backend = Arc::new(ScriptedBackend::new());
        let store = Arc::new(InMemoryIdeaStore::new());
        let mut session = logged_in(backend.clone(), store.clone()).await;

        let outcome = session.dispatch(Event::ShowIdeas { topic: "   ".into() }).await;

        assert_eq!(outcome.notices, vec![Notice::warning(MSG_EMPTY_TOPIC)]);
        assert_eq!(backend.generation_calls().await, 0);
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_reports_error() {
        let backend = Arc::new(ScriptedBackend::new().failing(ScriptedFailure::Unavailable));
        let store = Arc::new(InMemoryIdeaStore::new());
        let mut session = logged_in(backend.clone(), store.clone()).await;

        let outcome = session.dispatch(Event::ShowIdeas { topic: "kosmos".into() }).await;

        assert_eq!(levels(&outcome), vec![NoticeLevel::Error]);
        assert_eq!(
            outcome.notices[0].message,
            "❌ Nie udało się wygenerować pomysłów: Service unavailable: connection refused"
        );
        assert!(session.is_authenticated());
        assert!(store.load_all().await.unwrap().is_empty());

        let outcome = session.dispatch(Event::GenerateColoring).await;
        assert_eq!(outcome.notices, vec![Notice::warning(MSG_NO_SELECTION)]);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_generated_ideas() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the file should be makes every read fail
        let store = Arc::new(JsonIdeaStore::new(dir.path()));
        let metrics = Arc::new(ObservableMetrics::new());
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = session_with_metrics(backend.clone(), store.clone(), metrics.clone());
        session.dispatch(Event::SubmitCredential(GOOD_KEY.into())).await;

        let outcome = session.dispatch(Event::ShowIdeas { topic: "zima".into() }).await;

        assert_eq!(levels(&outcome), vec![NoticeLevel::Error]);
        assert!(outcome.notices[0]
            .message
            .starts_with("❌ Nie udało się zapisać pomysłów: Storage error: "));
        assert!(session.is_authenticated());
        let workspace = session.state().workspace().unwrap();
        assert_eq!(workspace.ideas.len(), 5);
        assert_eq!(workspace.selected, Some(0));
        assert_eq!(workspace.topic.as_deref(), Some("zima"));

        let snapshot = metrics.snapshot().await;
        assert_eq!(snapshot.recent_errors.len(), 1);
        assert_eq!(snapshot.recent_errors[0].category, ErrorCategory::Storage);

        // the kept ideas are still usable
        let outcome = session.dispatch(Event::GenerateColoring).await;
        assert_eq!(outcome.images.len(), 1);
        assert_eq!(backend.generation_calls().await, 2);
    }

    #[tokio::test]
    async fn test_selection_is_not_an_action() {
        let metrics = Arc::new(ObservableMetrics::new());
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = session_with_metrics(backend, Arc::new(InMemoryIdeaStore::new()), metrics.clone());
        session.dispatch(Event::SubmitCredential(GOOD_KEY.into())).await;
        session.dispatch(Event::ShowIdeas { topic: "zima".into() }).await;

        let outcome = session.dispatch(Event::SelectIdea(3)).await;
        assert_eq!(outcome, Outcome::default());
        assert_eq!(session.state().workspace().unwrap().selected, Some(3));

        let snapshot = metrics.snapshot().await;
        assert_eq!(snapshot.total_actions, 2);
        assert_eq!(snapshot.actions_by_kind.get(&ActionKind::Login), Some(&1));
        assert_eq!(snapshot.actions_by_kind.get(&ActionKind::ShowIdeas), Some(&1));
    }

    #[tokio::test]
    async fn test_recall_saved_ideas_without_generation() {
        let mut entries = IdeaMap::new();
        entries.insert("kosmos".into(), vec!["Rakieta".into(), "Astronauta".into()]);
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = logged_in(backend.clone(), Arc::new(InMemoryIdeaStore::with_entries(entries))).await;

        let outcome = session.dispatch(Event::RecallIdeas { topic: "kosmos".into() }).await;
        assert_eq!(levels(&outcome), vec![NoticeLevel::Info]);
        let workspace = session.state().workspace().unwrap();
        assert_eq!(workspace.ideas, vec!["Rakieta", "Astronauta"]);
        assert_eq!(workspace.selected_idea(), Some("Rakieta"));

        let outcome = session.dispatch(Event::RecallIdeas { topic: "Kosmos".into() }).await;
        assert_eq!(levels(&outcome), vec![NoticeLevel::Warning]);
        // the previous list stays in place
        assert_eq!(session.state().workspace().unwrap().ideas.len(), 2);

        assert_eq!(backend.generation_calls().await, 0);
    }

    #[tokio::test]
    async fn test_images_per_idea() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = session_with(backend.clone(), Arc::new(InMemoryIdeaStore::new())).with_images_per_idea(3);
        session.dispatch(Event::SubmitCredential(GOOD_KEY.into())).await;

        session.dispatch(Event::ShowIdeas { topic: "dinozaury".into() }).await;
        let outcome = session.dispatch(Event::GenerateColoring).await;

        assert_eq!(outcome.images.len(), 3);
        assert!(outcome.images.iter().all(|image| image.idea.starts_with("1.")));
    }
}
