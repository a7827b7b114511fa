//! Unit tests for the agent configuration form.

#[cfg(test)]
mod form_tests {
    use crate::agents::AgentSlot;
    use crate::catalog::ModelCatalog;
    use crate::config::AppConfig;
    use crate::error::ConfigurationError;
    use crate::form::*;
    use crate::test_support::catalog;

    // ============= Default Selection Tests =============

    #[test]
    fn test_populate_selects_defaults() {
        let form = AgentForm::populate(&catalog(), &AppConfig::default());

        assert_eq!(form.agent(AgentSlot::Researcher).model_id, "openhermes:latest");
        assert_eq!(form.agent(AgentSlot::Consultant).model_id, "openhermes:latest");
        assert_eq!(form.agent(AgentSlot::Author).model_id, "mistral:latest");
        assert!(form.entries().iter().all(|e| e.model_error.is_none()));
        assert_eq!(form.validated(&catalog()).unwrap().len(), 3);
    }

    #[test]
    fn test_populate_missing_default_is_an_error() {
        let catalog = ModelCatalog::new(vec!["openhermes:latest".to_string(), "llama3:latest".to_string()]);
        let form = AgentForm::populate(&catalog, &AppConfig::default());

        let author = form.entry(AgentSlot::Author);
        assert_eq!(author.agent.model_id, "");
        assert_eq!(
            author.model_error,
            Some(ConfigurationError::DefaultModelMissing {
                slot: AgentSlot::Author,
                model: "mistral:latest".to_string(),
            })
        );
        // never silently substituted
        assert_ne!(author.agent.model_id, "llama3:latest");
        assert!(matches!(
            form.validated(&catalog),
            Err(ConfigurationError::DefaultModelMissing { slot: AgentSlot::Author, .. })
        ));
    }

    #[test]
    fn test_populate_honours_config_default_model() {
        let config = AppConfig::from_yaml_str("agents:\n  author:\n    default_model: \"openhermes:latest\"\n").unwrap();
        let form = AgentForm::populate(&catalog(), &config);

        assert_eq!(form.agent(AgentSlot::Author).model_id, "openhermes:latest");
    }

    #[test]
    fn test_without_catalog() {
        let form = AgentForm::without_catalog(&AppConfig::default(), "HTTP 500");

        for entry in form.entries() {
            assert_eq!(entry.agent.model_id, "");
            assert_eq!(entry.model_error, Some(ConfigurationError::CatalogUnavailable("HTTP 500".to_string())));
        }
        assert!(form.validated(&ModelCatalog::default()).is_err());
    }

    #[test]
    fn test_select_default_model() {
        assert_eq!(
            select_default_model(&catalog(), AgentSlot::Author, "mistral:latest").unwrap(),
            "mistral:latest"
        );
        assert!(select_default_model(&ModelCatalog::default(), AgentSlot::Author, "mistral:latest").is_err());
    }

    // ============= Edit Tests =============

    #[test]
    fn test_apply_edit() {
        let mut form = AgentForm::populate(&catalog(), &AppConfig::default());
        let edit = AgentEdit {
            role: Some("Market analyst".to_string()),
            model_id: Some("mistral:latest".to_string()),
            temperature: Some(0.7),
            max_iterations: Some(25),
            ..Default::default()
        };

        let agent = form.apply_edit(AgentSlot::Researcher, edit, &catalog()).unwrap();
        assert_eq!(agent.role, "Market analyst");
        assert_eq!(agent.model_id, "mistral:latest");
        assert_eq!(agent.temperature, 0.7);
        assert_eq!(agent.max_iterations.get(), 25);
    }

    #[test]
    fn test_apply_edit_rejects_unknown_model() {
        let mut form = AgentForm::populate(&catalog(), &AppConfig::default());
        let before = form.clone();
        let edit = AgentEdit {
            model_id: Some("gpt-4".to_string()),
            role: Some("changed".to_string()),
            ..Default::default()
        };

        let err = form.apply_edit(AgentSlot::Consultant, edit, &catalog()).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownModel { slot: AgentSlot::Consultant, model: "gpt-4".to_string() }
        );
        assert_eq!(form, before);
    }

    #[test]
    fn test_apply_edit_rejects_bad_temperature_and_iterations() {
        let mut form = AgentForm::populate(&catalog(), &AppConfig::default());

        let hot = AgentEdit { temperature: Some(1.5), ..Default::default() };
        assert_eq!(
            form.apply_edit(AgentSlot::Author, hot, &catalog()).unwrap_err(),
            ConfigurationError::TemperatureOutOfRange { value: 1.5 }
        );

        let odd = AgentEdit { max_iterations: Some(7), ..Default::default() };
        assert_eq!(
            form.apply_edit(AgentSlot::Author, odd, &catalog()).unwrap_err(),
            ConfigurationError::InvalidIterations { value: 7 }
        );
        assert_eq!(form.agent(AgentSlot::Author).temperature, 0.0);
        assert_eq!(form.agent(AgentSlot::Author).max_iterations.get(), 15);
    }

    #[test]
    fn test_apply_edit_clears_model_error() {
        let partial = ModelCatalog::new(vec!["openhermes:latest".to_string()]);
        let mut form = AgentForm::populate(&partial, &AppConfig::default());
        assert!(form.entry(AgentSlot::Author).model_error.is_some());

        let edit = AgentEdit { model_id: Some("openhermes:latest".to_string()), ..Default::default() };
        form.apply_edit(AgentSlot::Author, edit, &partial).unwrap();

        assert!(form.entry(AgentSlot::Author).model_error.is_none());
        assert!(form.validated(&partial).is_ok());
    }

    #[test]
    fn test_validate_temperature_bounds() {
        assert_eq!(validate_temperature(0.0), Ok(0.0));
        assert_eq!(validate_temperature(1.0), Ok(1.0));
        assert!(validate_temperature(-0.1).is_err());
        assert!(validate_temperature(1.01).is_err());
    }

    // ============= Reload Tests =============

    #[test]
    fn test_reconcile_keeps_existing_selection() {
        let mut form = AgentForm::populate(&catalog(), &AppConfig::default());
        let edit = AgentEdit { model_id: Some("mistral:latest".to_string()), ..Default::default() };
        form.apply_edit(AgentSlot::Researcher, edit, &catalog()).unwrap();

        form.reconcile(&catalog(), &AppConfig::default());
        assert_eq!(form.agent(AgentSlot::Researcher).model_id, "mistral:latest");
    }

    #[test]
    fn test_reconcile_after_catalog_recovers() {
        let mut form = AgentForm::without_catalog(&AppConfig::default(), "down");
        form.reconcile(&catalog(), &AppConfig::default());

        assert_eq!(form.agent(AgentSlot::Author).model_id, "mistral:latest");
        assert!(form.entries().iter().all(|e| e.model_error.is_none()));
    }

    #[test]
    fn test_mark_catalog_unavailable_keeps_persona_edits() {
        let mut form = AgentForm::populate(&catalog(), &AppConfig::default());
        let edit = AgentEdit { goal: Some("Find AI startups".to_string()), ..Default::default() };
        form.apply_edit(AgentSlot::Researcher, edit, &catalog()).unwrap();

        form.mark_catalog_unavailable("connection refused");
        assert_eq!(form.agent(AgentSlot::Researcher).goal, "Find AI startups");
        assert_eq!(form.agent(AgentSlot::Researcher).model_id, "");
    }
}
