use kb_core::options::RuleOption;
use kb_core::publish_scope::{serialize_publish_scope, AudienceRuleUI, PublishScope};
use serde::Deserialize;

/// Audience state of the article editor, as exported to JSON.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditorSelection {
    pub base_scope: Option<PublishScope>,
    pub audience_rules: Vec<AudienceRuleUI>,
    pub selected_institution: Option<RuleOption>,
    pub selected_school_class: Option<RuleOption>,
}

impl EditorSelection {
    pub fn to_scope(&self) -> PublishScope {
        serialize_publish_scope(
            self.base_scope.as_ref(),
            &self.audience_rules,
            self.selected_institution.as_ref(),
            self.selected_school_class.as_ref(),
        )
    }
}
