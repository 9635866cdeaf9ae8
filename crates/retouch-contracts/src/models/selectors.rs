use super::registry::{ModelRegistry, ModelSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: ModelSpec,
    pub requested: Option<String>,
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelSelector {
    pub registry: ModelRegistry,
}

impl ModelSelector {
    pub fn new(registry: Option<ModelRegistry>) -> Self {
        Self {
            registry: registry.unwrap_or_default(),
        }
    }

    pub fn select(
        &self,
        requested: Option<&str>,
        capability: &str,
    ) -> Result<ModelSelection, String> {
        let requested = requested.map(str::trim).filter(|value| !value.is_empty());
        let fallback_reason = match requested {
            Some(requested_value) => {
                if let Some(model) = self.registry.ensure(requested_value, capability) {
                    return Ok(ModelSelection {
                        model,
                        requested: Some(requested_value.to_string()),
                        fallback_reason: None,
                    });
                }
                format!("Requested model '{requested_value}' unavailable for capability '{capability}'.")
            }
            None => "No model specified; using default.".to_string(),
        };

        let Some(model) = self.registry.by_capability(capability).into_iter().next() else {
            return Err(format!("No models available for capability '{capability}'."));
        };
        Ok(ModelSelection {
            model,
            requested: requested.map(str::to_string),
            fallback_reason: Some(fallback_reason),
        })
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::models::{CAPABILITY_IMAGE, DEFAULT_IMAGE_MODEL};

    #[test]
    fn registered_model_is_used_as_is() -> Result<(), String> {
        let selection = ModelSelector::default().select(Some("gemini-3-pro-image-preview"), CAPABILITY_IMAGE)?;
        assert_eq!(selection.model.name, "gemini-3-pro-image-preview");
        assert_eq!(selection.fallback_reason, None);
        Ok(())
    }

    #[test]
    fn unknown_model_falls_back_with_reason() -> Result<(), String> {
        let selection = ModelSelector::default().select(Some("imagen-4"), CAPABILITY_IMAGE)?;
        assert_eq!(selection.model.name, DEFAULT_IMAGE_MODEL);
        assert_eq!(selection.requested.as_deref(), Some("imagen-4"));
        assert!(selection
            .fallback_reason
            .is_some_and(|reason| reason.contains("imagen-4")));
        Ok(())
    }

    #[test]
    fn missing_request_uses_default() -> Result<(), String> {
        let selection = ModelSelector::default().select(Some("  "), CAPABILITY_IMAGE)?;
        assert_eq!(selection.model.name, DEFAULT_IMAGE_MODEL);
        assert_eq!(selection.requested, None);
        Ok(())
    }

    #[test]
    fn empty_registry_is_an_error() {
        let selector = ModelSelector::new(Some(ModelRegistry::new(Some(IndexMap::new()))));
        assert!(selector.select(None, CAPABILITY_IMAGE).is_err());
    }
}
