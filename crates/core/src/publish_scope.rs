//! Publish-scope serialization.
//!
//! The article editor collects its audience as option pairs: a scope-wide
//! institution and school class, plus any number of audience rules, each
//! one a row of multi-selects. The backend wants the same information as
//! bare ids in a flat `publish_scope` object.

use serde::{Deserialize, Serialize};

use crate::options::{lenient_course, unwrap_value, unwrap_values, CourseInput, RuleOption};
use crate::types::DbId;

/// Server-bound description of who an article is visible to.
///
/// Keys set by other editor controls that this crate does not model are
/// kept in `extra` and written back unchanged.
///
/// Explicit `null`s are not treated alike. A `null` on a modelled key
/// (`city_id`, `rules`, ...) reads as absent and the key is left out on
/// output. A `null` on an unknown key is part of `extra` and is written
/// back as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishScope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_for_all: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_id: Option<DbId>,
    /// City slug the backend resolves to a real `city_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speciality_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution_type_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_class_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<AudienceRule>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PublishScope {
    /// Visible to everyone.
    pub fn for_all() -> Self {
        Self {
            publish_for_all: Some(true),
            ..Default::default()
        }
    }

    /// Visible to a single city, identified by its slug.
    pub fn for_city_key(city_key: impl Into<String>) -> Self {
        Self {
            city_key: Some(city_key.into()),
            ..Default::default()
        }
    }
}

/// One audience segment with bare ids, as the backend stores it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudienceRule {
    pub institution_type_ids: Vec<DbId>,
    pub education_form_ids: Vec<DbId>,
    pub speciality_ids: Vec<DbId>,
    pub city_ids: Vec<DbId>,
    pub admission_year_ids: Vec<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_class_id: Option<DbId>,
}

/// One audience segment as the editor holds it, still decorated with labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudienceRuleUI {
    pub institution_type_ids: Vec<RuleOption>,
    pub education_form_ids: Vec<RuleOption>,
    pub speciality_ids: Vec<RuleOption>,
    pub city_ids: Vec<RuleOption>,
    pub admission_year_ids: Vec<RuleOption>,
    /// A course that is neither a number nor an option pair reads as unset.
    #[serde(deserialize_with = "lenient_course")]
    pub course: Option<CourseInput>,
    pub school_class_id: Option<RuleOption>,
}

impl From<&AudienceRuleUI> for AudienceRule {
    fn from(rule: &AudienceRuleUI) -> Self {
        Self {
            institution_type_ids: unwrap_values(&rule.institution_type_ids),
            education_form_ids: unwrap_values(&rule.education_form_ids),
            speciality_ids: unwrap_values(&rule.speciality_ids),
            city_ids: unwrap_values(&rule.city_ids),
            admission_year_ids: unwrap_values(&rule.admission_year_ids),
            course: unwrap_value(rule.course.as_ref()),
            school_class_id: unwrap_value(rule.school_class_id.as_ref()),
        }
    }
}

/// Build the `publish_scope` for an article submission.
///
/// Starts from a copy of `base_scope`; the caller's value is never touched.
/// A selected institution or school class overrides the matching flat key.
/// A non-empty rule list replaces `rules` wholesale, one entry per row,
/// empty rows included. An empty rule list leaves `rules` as the base had it.
pub fn serialize_publish_scope(
    base_scope: Option<&PublishScope>,
    audience_rules: &[AudienceRuleUI],
    selected_institution: Option<&RuleOption>,
    selected_school_class: Option<&RuleOption>,
) -> PublishScope {
    let mut scope = base_scope.cloned().unwrap_or_default();

    if let Some(id) = unwrap_value(selected_institution) {
        scope.institution_type_id = Some(id);
    }
    if let Some(id) = unwrap_value(selected_school_class) {
        scope.school_class_id = Some(id);
    }

    if !audience_rules.is_empty() {
        scope.rules = Some(audience_rules.iter().map(AudienceRule::from).collect());
    }

    scope
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_rule() -> AudienceRuleUI {
        AudienceRuleUI {
            education_form_ids: vec![RuleOption::new(1, "Очная")],
            speciality_ids: vec![RuleOption::new(2, "ИТ")],
            city_ids: vec![RuleOption::new(5, "СПб")],
            admission_year_ids: vec![RuleOption::new(7, "2025")],
            course: Some(CourseInput::Option(RuleOption::new(1, "1"))),
            ..Default::default()
        }
    }

    // -- flat overrides ------------------------------------------------------

    #[test]
    fn institution_and_school_class_override_flat_keys() {
        let scope = serialize_publish_scope(
            Some(&PublishScope::default()),
            &[],
            Some(&RuleOption::bare(10)),
            Some(&RuleOption::new(3, "3")),
        );

        assert_eq!(scope.institution_type_id, Some(10));
        assert_eq!(scope.school_class_id, Some(3));
        assert!(scope.rules.is_none());
    }

    #[test]
    fn absent_selections_keep_base_values() {
        let base = PublishScope {
            institution_type_id: Some(4),
            school_class_id: Some(9),
            ..Default::default()
        };
        let scope = serialize_publish_scope(Some(&base), &[], None, None);
        assert_eq!(scope, base);
    }

    #[test]
    fn missing_base_starts_empty() {
        let scope = serialize_publish_scope(None, &[], None, None);
        assert_eq!(scope, PublishScope::default());
        assert_eq!(serde_json::to_value(&scope).unwrap(), json!({}));
    }

    // -- rules ---------------------------------------------------------------

    #[test]
    fn rules_are_unwrapped_to_bare_ids() {
        let scope = serialize_publish_scope(None, &[sample_rule()], None, None);

        let rules = scope.rules.expect("rules should be set");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].education_form_ids, vec![1]);
        assert_eq!(rules[0].speciality_ids, vec![2]);
        assert_eq!(rules[0].city_ids, vec![5]);
        assert_eq!(rules[0].admission_year_ids, vec![7]);
        assert!(rules[0].institution_type_ids.is_empty());
        assert_eq!(rules[0].course, Some(1));
        assert_eq!(rules[0].school_class_id, None);
    }

    #[test]
    fn numeric_course_is_kept_as_is() {
        let rule = AudienceRuleUI {
            course: Some(CourseInput::Number(3)),
            school_class_id: Some(RuleOption::new(11, "11")),
            ..Default::default()
        };
        let scope = serialize_publish_scope(None, &[rule], None, None);
        let rules = scope.rules.unwrap();
        assert_eq!(rules[0].course, Some(3));
        assert_eq!(rules[0].school_class_id, Some(11));
    }

    #[test]
    fn empty_rule_rows_are_kept() {
        let scope = serialize_publish_scope(
            None,
            &[AudienceRuleUI::default(), sample_rule()],
            None,
            None,
        );

        let rules = scope.rules.unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0], AudienceRule::default());
        assert_eq!(
            serde_json::to_value(&rules[0]).unwrap(),
            json!({
                "institution_type_ids": [],
                "education_form_ids": [],
                "speciality_ids": [],
                "city_ids": [],
                "admission_year_ids": [],
            })
        );
    }

    #[test]
    fn empty_rule_list_leaves_base_rules_untouched() {
        let base = PublishScope {
            rules: Some(vec![AudienceRule {
                city_ids: vec![8],
                ..Default::default()
            }]),
            ..Default::default()
        };
        let scope = serialize_publish_scope(Some(&base), &[], None, None);
        assert_eq!(scope.rules, base.rules);
    }

    #[test]
    fn non_empty_rule_list_replaces_base_rules() {
        let base = PublishScope {
            rules: Some(vec![AudienceRule::default(), AudienceRule::default()]),
            ..Default::default()
        };
        let scope = serialize_publish_scope(Some(&base), &[sample_rule()], None, None);
        let rules = scope.rules.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].city_ids, vec![5]);
    }

    // -- purity --------------------------------------------------------------

    #[test]
    fn base_scope_is_not_mutated() {
        let base = PublishScope {
            publish_for_all: Some(false),
            city_id: Some(2),
            ..Default::default()
        };
        let snapshot = base.clone();

        let scope = serialize_publish_scope(
            Some(&base),
            &[sample_rule()],
            Some(&RuleOption::bare(10)),
            None,
        );

        assert_eq!(base, snapshot);
        assert_eq!(scope.city_id, Some(2));
        assert_eq!(scope.publish_for_all, Some(false));
        assert_eq!(scope.institution_type_id, Some(10));
    }

    #[test]
    fn serializing_twice_is_deterministic() {
        let rules = vec![sample_rule()];
        let institution = RuleOption::bare(10);
        let first = serialize_publish_scope(None, &rules, Some(&institution), None);
        let second = serialize_publish_scope(None, &rules, Some(&institution), None);
        assert_eq!(first, second);
    }

    // -- wire shape ----------------------------------------------------------

    #[test]
    fn unknown_base_keys_survive_the_round_trip() {
        let base: PublishScope = serde_json::from_value(json!({
            "publish_for_all": false,
            "faculty_key": "law",
        }))
        .unwrap();

        let scope = serialize_publish_scope(Some(&base), &[], Some(&RuleOption::bare(1)), None);

        assert_eq!(
            serde_json::to_value(&scope).unwrap(),
            json!({
                "publish_for_all": false,
                "institution_type_id": 1,
                "faculty_key": "law",
            })
        );
    }

    #[test]
    fn explicit_nulls_drop_on_known_keys_and_stay_on_unknown_ones() {
        let base: PublishScope = serde_json::from_value(json!({
            "city_id": null,
            "publish_for_all": false,
            "x": null,
        }))
        .unwrap();

        assert_eq!(base.city_id, None);

        let scope = serialize_publish_scope(Some(&base), &[], None, None);
        assert_eq!(
            serde_json::to_value(&scope).unwrap(),
            json!({ "publish_for_all": false, "x": null })
        );
    }

    #[test]
    fn string_course_in_rule_row_is_dropped() {
        let rules: Vec<AudienceRuleUI> = serde_json::from_value(json!([{
            "city_ids": [{ "value": 5, "label": "СПб" }],
            "course": "2",
        }]))
        .unwrap();

        assert_eq!(rules[0].course, None);
        let scope = serialize_publish_scope(None, &rules, None, None);
        let value = serde_json::to_value(&scope).unwrap();
        assert!(value["rules"][0].get("course").is_none());
        assert_eq!(value["rules"][0]["city_ids"], json!([5]));
    }

    #[test]
    fn rule_rows_deserialize_from_editor_json() {
        let rules: Vec<AudienceRuleUI> = serde_json::from_value(json!([{
            "education_form_ids": [{ "value": 1, "label": "Очная" }],
            "city_ids": [{ "value": 5, "label": "СПб" }],
            "course": { "value": 1, "label": "1" },
            "school_class_id": null,
        }]))
        .unwrap();

        let scope = serialize_publish_scope(None, &rules, None, None);
        let value = serde_json::to_value(&scope).unwrap();
        assert_eq!(value["rules"][0]["education_form_ids"], json!([1]));
        assert_eq!(value["rules"][0]["city_ids"], json!([5]));
        assert_eq!(value["rules"][0]["course"], json!(1));
        assert!(value["rules"][0].get("school_class_id").is_none());
    }

    #[test]
    fn shorthand_constructors() {
        assert_eq!(
            serde_json::to_value(PublishScope::for_all()).unwrap(),
            json!({ "publish_for_all": true })
        );
        assert_eq!(
            serde_json::to_value(PublishScope::for_city_key("spb")).unwrap(),
            json!({ "city_key": "spb" })
        );
    }
}
