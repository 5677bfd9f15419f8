use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use kb_core::filters::{
    BuildParamsInput, FeedView, MultiFilters, ParamValue, QueryParams, QuickFilters,
};
use kb_core::types::DbId;

#[derive(Parser, Debug)]
#[command(name = "kb", author, version, about = "Knowledge-base articles API tool")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the endpoint and parameters a filter selection produces.
    Query(FilterArgs),
    /// Fetch the article feed for a filter selection.
    Feed(FilterArgs),
    /// Serialize an editor audience selection (JSON) into a publish scope.
    Scope {
        /// JSON file with the editor selection, `-` for stdin.
        #[arg(default_value = "-")]
        input: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Free-text search.
    #[arg(long)]
    pub search: Option<String>,

    /// Quick filter: audience city id.
    #[arg(long)]
    pub city: Option<String>,

    /// Quick filter: group id.
    #[arg(long)]
    pub group: Option<String>,

    /// Quick filter: `common` or `city`.
    #[arg(long, value_parser = parse_view)]
    pub view: Option<FeedView>,

    #[arg(long = "institution-type")]
    pub institution_type_ids: Vec<DbId>,

    #[arg(long = "education-form")]
    pub education_form_ids: Vec<DbId>,

    #[arg(long = "speciality")]
    pub speciality_ids: Vec<DbId>,

    #[arg(long = "city-id")]
    pub city_ids: Vec<DbId>,

    #[arg(long = "admission-year")]
    pub admission_year_ids: Vec<DbId>,

    /// Query as a student (enables the student feed).
    #[arg(long)]
    pub student: bool,

    /// The student's group id.
    #[arg(long)]
    pub group_id: Option<String>,

    /// Passthrough parameter as `key=value`, repeatable.
    #[arg(long = "extra", value_parser = parse_extra)]
    pub extra: Vec<(String, ParamValue)>,
}

impl FilterArgs {
    pub fn to_input(&self) -> BuildParamsInput {
        let quick = QuickFilters {
            city: self.city.clone(),
            group: self.group.clone(),
            view: self.view,
        };
        let multi = MultiFilters {
            institution_type_ids: self.institution_type_ids.clone(),
            education_form_ids: self.education_form_ids.clone(),
            speciality_ids: self.speciality_ids.clone(),
            city_ids: self.city_ids.clone(),
            admission_year_ids: self.admission_year_ids.clone(),
        };

        BuildParamsInput {
            search: self.search.clone(),
            quick: (quick != QuickFilters::default()).then_some(quick),
            multi: (!multi.is_empty()).then_some(multi),
            extra: self.extra.iter().cloned().collect::<QueryParams>(),
            is_student: self.student,
            group_id: self.group_id.clone(),
        }
    }
}

fn parse_view(raw: &str) -> Result<FeedView, String> {
    FeedView::parse(raw).ok_or_else(|| format!("expected `common` or `city`, got `{raw}`"))
}

/// `key=value`; integers and booleans keep their type, anything else is a string.
fn parse_extra(raw: &str) -> Result<(String, ParamValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in `{raw}`"));
    }

    let value = match value {
        "true" => ParamValue::Bool(true),
        "false" => ParamValue::Bool(false),
        v => v
            .parse::<i64>()
            .map(ParamValue::Int)
            .unwrap_or_else(|_| ParamValue::Str(v.to_string())),
    };
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use kb_core::filters::{build_articles_query, ARTICLES_ENDPOINT, STUDENT_FEED_ENDPOINT};

    use super::*;

    fn filters(argv: &[&str]) -> FilterArgs {
        let mut full = vec!["kb", "query"];
        full.extend_from_slice(argv);
        let cli = Cli::try_parse_from(full).unwrap();
        match cli.command {
            Command::Query(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn no_flags_yield_empty_input() {
        assert_eq!(filters(&[]).to_input(), BuildParamsInput::default());
    }

    #[test]
    fn repeated_flags_keep_order() {
        let input = filters(&["--education-form", "2", "--education-form", "1"]).to_input();
        assert_eq!(input.multi.unwrap().education_form_ids, vec![2, 1]);
    }

    #[test]
    fn student_flags_select_student_feed() {
        let input = filters(&["--student", "--group-id", "10"]).to_input();
        assert_eq!(build_articles_query(&input).endpoint, STUDENT_FEED_ENDPOINT);

        let input = filters(&["--student", "--group-id", "10", "--view", "city"]).to_input();
        assert_eq!(build_articles_query(&input).endpoint, ARTICLES_ENDPOINT);
    }

    #[test]
    fn unknown_view_is_rejected() {
        assert!(Cli::try_parse_from(["kb", "query", "--view", "all"]).is_err());
    }

    #[test]
    fn extra_values_keep_their_type() {
        let input = filters(&[
            "--extra",
            "per_page=50",
            "--extra",
            "is_published=false",
            "--extra",
            "q=a=b",
        ])
        .to_input();
        assert_eq!(input.extra["per_page"], ParamValue::Int(50));
        assert_eq!(input.extra["is_published"], ParamValue::Bool(false));
        assert_eq!(input.extra["q"], ParamValue::from("a=b"));
    }

    #[test]
    fn malformed_extra_is_rejected() {
        assert!(parse_extra("novalue").is_err());
        assert!(parse_extra("=1").is_err());
    }
}
