//! SPARQL query construction over the Dublin Core document schema.
//!
//! Constraint values never enter the query text. Each value becomes a
//! [`Literal`] bound to a `?p_*` variable, and the builder only emits
//! `FILTER`s that reference those variables. Execution backends either
//! pass the bindings out-of-band or inline them as a `VALUES` row through
//! the RDF term serializer, which escapes quotes and control characters.

use std::fmt;
use std::str::FromStr;

use oxigraph::model::vocab::xsd;
use oxigraph::model::Literal;

use crate::extract::ConstraintSet;
use crate::Error;

pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

/// Number of subjects offered as suggested questions.
pub const SUGGESTED_SUBJECTS_LIMIT: usize = 5;

/// Shape of the document query: output columns, ordering and result cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryProfile {
    /// title/date/creator/subject, capped at 20
    #[default]
    Catalog,
    /// adds description, newest first, capped at 30
    Analysis,
    /// adds description, capped at 50
    Extended,
}

impl QueryProfile {
    pub fn limit(self) -> usize {
        match self {
            QueryProfile::Catalog => 20,
            QueryProfile::Analysis => 30,
            QueryProfile::Extended => 50,
        }
    }

    pub fn includes_description(self) -> bool {
        !matches!(self, QueryProfile::Catalog)
    }

    pub fn newest_first(self) -> bool {
        matches!(self, QueryProfile::Analysis)
    }

    /// Filters applied when the builder is not told otherwise.
    pub fn default_filter_mode(self) -> FilterMode {
        match self {
            QueryProfile::Catalog => FilterMode::Fields,
            QueryProfile::Analysis => FilterMode::Keywords,
            QueryProfile::Extended => FilterMode::All,
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        if self.includes_description() {
            &["title", "date", "creator", "subject", "description"]
        } else {
            &["title", "date", "creator", "subject"]
        }
    }
}

impl FromStr for QueryProfile {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "catalog" | "basic" => Ok(QueryProfile::Catalog),
            "analysis" => Ok(QueryProfile::Analysis),
            "extended" => Ok(QueryProfile::Extended),
            other => Err(Error::InvalidArgument(format!("unknown query profile: {other}"))),
        }
    }
}

impl fmt::Display for QueryProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryProfile::Catalog => "catalog",
            QueryProfile::Analysis => "analysis",
            QueryProfile::Extended => "extended",
        };
        f.write_str(name)
    }
}

/// Which constraints turn into filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// year / date / creator / subject
    Fields,
    /// keyword OR-filter on the title (the year filter still applies)
    Keywords,
    /// both of the above
    All,
}

impl FilterMode {
    fn fields(self) -> bool {
        matches!(self, FilterMode::Fields | FilterMode::All)
    }

    fn keywords(self) -> bool {
        matches!(self, FilterMode::Keywords | FilterMode::All)
    }
}

/// A query template plus its variable bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparqlQuery {
    prologue: String,
    body: String,
    epilogue: String,
    bindings: Vec<(String, Literal)>,
}

impl SparqlQuery {
    /// Query text with no bindings inlined; bound variables appear as
    /// plain `?p_*` references.
    pub fn template(&self) -> String {
        format!("{}{}{}", self.prologue, self.body, self.epilogue)
    }

    /// Variable name (without `?`) and value pairs, in declaration order.
    pub fn bindings(&self) -> &[(String, Literal)] {
        &self.bindings
    }

    /// Executable text: bindings are inlined as a single `VALUES` row at the
    /// start of the `WHERE` group.
    pub fn render(&self) -> String {
        if self.bindings.is_empty() {
            return self.template();
        }
        let vars: Vec<String> = self.bindings.iter().map(|(name, _)| format!("?{name}")).collect();
        let values: Vec<String> = self.bindings.iter().map(|(_, lit)| lit.to_string()).collect();
        format!(
            "{}    VALUES ({}) {{ ({}) }}\n{}{}",
            self.prologue,
            vars.join(" "),
            values.join(" "),
            self.body,
            self.epilogue
        )
    }

    pub fn filter_count(&self) -> usize {
        self.body.matches("FILTER(").count()
    }
}

impl fmt::Display for SparqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Builds document queries for one profile.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    profile: QueryProfile,
    filter_mode: FilterMode,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(QueryProfile::default())
    }
}

impl QueryBuilder {
    pub fn new(profile: QueryProfile) -> Self {
        Self {
            profile,
            filter_mode: profile.default_filter_mode(),
        }
    }

    pub fn with_filter_mode(mut self, mode: FilterMode) -> Self {
        self.filter_mode = mode;
        self
    }

    pub fn profile(&self) -> QueryProfile {
        self.profile
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    pub fn build(&self, constraints: &ConstraintSet) -> SparqlQuery {
        let columns: Vec<String> = self
            .profile
            .columns()
            .iter()
            .map(|c| format!("?{c}"))
            .collect();

        let mut prologue = String::new();
        prologue.push_str(&format!("PREFIX dc: <{DC_NS}>\n"));
        prologue.push_str(&format!("PREFIX xsd: <{XSD_NS}>\n"));
        prologue.push_str(&format!("SELECT {} WHERE {{\n", columns.join(" ")));

        let mut body = String::from("    ?doc dc:title ?title .\n");
        for column in self.profile.columns().iter().skip(1) {
            body.push_str(&format!("    OPTIONAL {{ ?doc dc:{column} ?{column} . }}\n"));
        }

        let mut bindings = Vec::new();

        if let Some(year) = &constraints.year {
            bindings.push((
                "p_year".to_string(),
                Literal::new_typed_literal(year.as_str(), xsd::G_YEAR),
            ));
            body.push_str("    FILTER(?date = ?p_year)\n");
        }

        if self.filter_mode.fields() {
            let text_fields = [
                ("date", &constraints.date),
                ("creator", &constraints.creator),
                ("subject", &constraints.subject),
            ];
            for (field, value) in text_fields {
                if let Some(value) = value {
                    let var = format!("p_{field}");
                    body.push_str(&format!("    FILTER({})\n", contains(field, &var)));
                    bindings.push((var, Literal::new_simple_literal(value.as_str())));
                }
            }
        }

        if self.filter_mode.keywords() && !constraints.keywords.is_empty() {
            let mut alternatives = Vec::with_capacity(constraints.keywords.len());
            for (idx, keyword) in constraints.keywords.iter().enumerate() {
                let var = format!("p_kw{idx}");
                alternatives.push(contains("title", &var));
                bindings.push((var, Literal::new_simple_literal(keyword.as_str())));
            }
            body.push_str(&format!("    FILTER({})\n", alternatives.join(" || ")));
        }

        let mut epilogue = String::from("}\n");
        if self.profile.newest_first() {
            epilogue.push_str("ORDER BY DESC(?date)\n");
        }
        epilogue.push_str(&format!("LIMIT {}\n", self.profile.limit()));

        SparqlQuery {
            prologue,
            body,
            epilogue,
            bindings,
        }
    }
}

fn contains(field: &str, var: &str) -> String {
    format!("CONTAINS(LCASE(STR(?{field})), LCASE(?{var}))")
}

/// Most frequent subjects, used to suggest follow-up questions.
pub fn top_subjects_query() -> SparqlQuery {
    SparqlQuery {
        prologue: format!("PREFIX dc: <{DC_NS}>\nSELECT ?subject (COUNT(?doc) AS ?count) WHERE {{\n"),
        body: "    ?doc dc:subject ?subject .\n".to_string(),
        epilogue: format!(
            "}}\nGROUP BY ?subject\nORDER BY DESC(?count)\nLIMIT {SUGGESTED_SUBJECTS_LIMIT}\n"
        ),
        bindings: Vec::new(),
    }
}
