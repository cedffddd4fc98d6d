//! Retrieval query construction.
//!
//! Filters are collected as typed [`Predicate`]s into a [`SearchPlan`], which
//! each backend renders into its own query language. User-supplied values
//! only ever travel as bound parameters; the query text is assembled from
//! fixed fragments and [`Field`] property names.

use super::models::normalize_tags;

pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 60.0;

/// A search as requested by a caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub os: Option<String>,
    pub project_type: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub limit: usize,
    pub fuzzy: bool,
    /// Overrides the configured threshold for this search only.
    pub fuzzy_threshold: Option<f64>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: None,
            os: None,
            project_type: None,
            category: None,
            tags: Vec::new(),
            limit: DEFAULT_LIMIT,
            fuzzy: false,
            fuzzy_threshold: None,
        }
    }
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn os(mut self, os: impl Into<String>) -> Self {
        self.os = Some(os.into());
        self
    }

    pub fn project_type(mut self, project_type: impl Into<String>) -> Self {
        self.project_type = Some(project_type.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn fuzzy(mut self, threshold: Option<f64>) -> Self {
        self.fuzzy = true;
        self.fuzzy_threshold = threshold;
        self
    }

    /// The free-text query, if one was given and is not empty.
    pub fn text(&self) -> Option<&str> {
        non_empty(self.query.as_deref())
    }
}

/// Command properties that can be matched by equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Os,
    ProjectType,
    Category,
}

impl Field {
    /// Property/column name, also used as the parameter name.
    pub fn name(self) -> &'static str {
        match self {
            Field::Os => "os",
            Field::ProjectType => "project_type",
            Field::Category => "category",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Literal, case-sensitive substring of command, description or context.
    TextContains(String),
    FieldEquals(Field, String),
    /// Every listed tag must be attached. Sorted and deduplicated.
    HasAllTags(Vec<String>),
}

/// Accumulates predicates for one search.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    predicates: Vec<Predicate>,
    limit: usize,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}

impl QueryBuilder {
    pub fn new(limit: usize) -> Self {
        Self {
            predicates: Vec::new(),
            limit,
        }
    }

    /// Builder for every filter in `request`, including the text filter.
    pub fn from_request(request: &SearchRequest) -> Self {
        let mut builder = Self::new(request.limit);
        builder
            .contains_text(request.query.as_deref())
            .field_equals(Field::Os, request.os.as_deref())
            .field_equals(Field::ProjectType, request.project_type.as_deref())
            .field_equals(Field::Category, request.category.as_deref())
            .with_all_tags(&request.tags);
        builder
    }

    pub fn contains_text(&mut self, text: Option<&str>) -> &mut Self {
        if let Some(text) = non_empty(text) {
            self.predicates.push(Predicate::TextContains(text.to_string()));
        }
        self
    }

    pub fn field_equals(&mut self, field: Field, value: Option<&str>) -> &mut Self {
        if let Some(value) = non_empty(value) {
            self.predicates
                .push(Predicate::FieldEquals(field, value.to_string()));
        }
        self
    }

    pub fn with_all_tags(&mut self, tags: &[String]) -> &mut Self {
        let tags = normalize_tags(tags.iter().map(String::as_str));
        if !tags.is_empty() {
            self.predicates.push(Predicate::HasAllTags(tags));
        }
        self
    }

    /// Drops the text predicate, if any.
    pub fn without_text(&mut self) -> &mut Self {
        self.predicates
            .retain(|p| !matches!(p, Predicate::TextContains(_)));
        self
    }

    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.limit = limit;
        self
    }

    pub fn has_predicates(&self) -> bool {
        !self.predicates.is_empty()
    }

    pub fn build(&self) -> SearchPlan {
        SearchPlan {
            predicates: self.predicates.clone(),
            limit: self.limit,
        }
    }
}

/// A backend-independent description of one retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    pub predicates: Vec<Predicate>,
    pub limit: usize,
}

impl SearchPlan {
    pub fn tags(&self) -> Option<&[String]> {
        self.predicates.iter().find_map(|p| match p {
            Predicate::HasAllTags(tags) => Some(tags.as_slice()),
            _ => None,
        })
    }

    /// Every predicate except the tag intersection.
    pub fn node_predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates
            .iter()
            .filter(|p| !matches!(p, Predicate::HasAllTags(_)))
    }

    pub fn cypher(&self) -> CypherQuery {
        let mut params = Vec::new();
        let mut text = String::from("MATCH (c:Command)\n");

        // Tag intersection needs an aggregation, so it runs before anything
        // else refers to `c` again.
        if let Some(tags) = self.tags() {
            text.push_str(
                "MATCH (c)-[:TAGGED_WITH]->(t:Tag)\n\
                 WHERE t.name IN $tags\n\
                 WITH c, count(t) AS tag_count\n\
                 WHERE tag_count = size($tags)\n",
            );
            params.push(("tags", ParamValue::List(tags.to_vec())));
        }

        let mut conditions = Vec::new();
        for predicate in self.node_predicates() {
            match predicate {
                Predicate::TextContains(query) => {
                    conditions.push(
                        "(c.command CONTAINS $query OR c.description CONTAINS $query \
                         OR c.context CONTAINS $query)"
                            .to_string(),
                    );
                    params.push(("query", ParamValue::Text(query.clone())));
                }
                Predicate::FieldEquals(field, value) => {
                    conditions.push(format!("c.{0} = ${0}", field.name()));
                    params.push((field.name(), ParamValue::Text(value.clone())));
                }
                Predicate::HasAllTags(_) => {}
            }
        }

        if !conditions.is_empty() {
            if self.tags().is_some() {
                text.push_str("WITH c\n");
            }
            text.push_str("WHERE ");
            text.push_str(&conditions.join(" AND "));
            text.push('\n');
        }

        text.push_str(
            "OPTIONAL MATCH (c)-[:TAGGED_WITH]->(tag:Tag)\n\
             WITH c, collect(tag.name) AS tags\n\
             ORDER BY c.use_count DESC, c.created_at DESC\n\
             LIMIT $limit\n\
             RETURN c, tags",
        );
        params.push(("limit", ParamValue::Int(self.limit as i64)));

        CypherQuery { text, params }
    }
}

/// A bound query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    List(Vec<String>),
    Int(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CypherQuery {
    pub text: String,
    pub params: Vec<(&'static str, ParamValue)>,
}

impl CypherQuery {
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
