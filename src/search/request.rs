// src/search/request.rs

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::StoreError;
use crate::search::filter::{FilterClause, build_filter_expression};

/// Pseudo sort field ranking by the number of matched query tokens.
pub const TEXT_MATCH: &str = "_text_match";

/// At most this many `sort_by` clauses are honoured.
pub const MAX_SORT_CLAUSES: usize = 3;

fn wildcard() -> String {
    "*".to_string()
}

fn default_per_page() -> usize {
    10
}

fn first_page() -> usize {
    1
}

/// A search as it travels on the wire (query-string encoded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default = "wildcard")]
    pub q: String,

    /// Comma-separated searchable fields; empty means all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<String>,

    /// Comma-separated `field:asc|desc` clauses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,

    /// Page size; 0 returns only the match count.
    #[serde(default = "default_per_page")]
    pub per_page: usize,

    /// 1-based page number.
    #[serde(default = "first_page")]
    pub page: usize,

    /// Comma-separated fields kept in returned documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_fields: Option<String>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self::new("*")
    }
}

impl SearchRequest {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            query_by: None,
            filter_by: None,
            sort_by: None,
            per_page: default_per_page(),
            page: first_page(),
            include_fields: None,
        }
    }

    pub fn query_by(mut self, fields: &[&str]) -> Self {
        self.query_by = Some(fields.join(","));
        self
    }

    pub fn filters(mut self, clauses: &[FilterClause]) -> Self {
        self.filter_by = build_filter_expression(clauses);
        self
    }

    /// Sets a raw filter expression.
    pub fn filter_by(mut self, expr: impl Into<String>) -> Self {
        self.filter_by = Some(expr.into());
        self
    }

    pub fn sort_by(mut self, sort: impl Into<String>) -> Self {
        self.sort_by = Some(sort.into());
        self
    }

    pub fn per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn include_fields(mut self, fields: &[&str]) -> Self {
        self.include_fields = Some(fields.join(","));
        self
    }

    pub fn query_fields(&self) -> Vec<&str> {
        split_list(self.query_by.as_deref())
    }

    pub fn projected_fields(&self) -> Vec<&str> {
        split_list(self.include_fields.as_deref())
    }

    pub fn sort_clauses(&self) -> Result<Vec<SortClause>, StoreError> {
        let clauses = split_list(self.sort_by.as_deref())
            .into_iter()
            .map(SortClause::parse)
            .collect::<Result<Vec<_>, _>>()?;

        if clauses.len() > MAX_SORT_CLAUSES {
            return Err(StoreError::InvalidQuery(format!(
                "at most {} sort fields are supported",
                MAX_SORT_CLAUSES
            )));
        }
        Ok(clauses)
    }
}

fn split_list(list: Option<&str>) -> Vec<&str> {
    list.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    pub field: String,
    pub descending: bool,
}

impl SortClause {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    fn parse(raw: &str) -> Result<Self, StoreError> {
        let (field, direction) = raw.split_once(':').ok_or_else(|| {
            StoreError::InvalidQuery(format!("sort clause '{}' needs a direction", raw))
        })?;

        let descending = match direction.trim() {
            "desc" => true,
            "asc" => false,
            other => {
                return Err(StoreError::InvalidQuery(format!(
                    "unknown sort direction '{}'",
                    other
                )));
            }
        };

        Ok(Self {
            field: field.trim().to_string(),
            descending,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit<T> {
    pub document: T,
    /// Relevance score. The embedded store counts distinct matched query
    /// tokens (0 for wildcard queries); remote stores report their own,
    /// much larger, scores.
    #[serde(default)]
    pub text_match: u64,
}

/// Result page of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse<T = serde_json::Value> {
    /// Matches before pagination.
    #[serde(default)]
    pub found: usize,
    /// Documents in the collection.
    #[serde(default)]
    pub out_of: usize,
    #[serde(default = "first_page")]
    pub page: usize,
    #[serde(default)]
    pub search_time_ms: u64,
    #[serde(default)]
    pub hits: Vec<SearchHit<T>>,
}

impl<T> SearchResponse<T> {
    pub fn documents(self) -> Vec<T> {
        self.hits.into_iter().map(|hit| hit.document).collect()
    }
}

impl<T: Serialize> SearchResponse<T> {
    pub fn into_json(self) -> Result<SearchResponse, StoreError> {
        let hits = self
            .hits
            .into_iter()
            .map(|hit| {
                Ok(SearchHit {
                    document: serde_json::to_value(hit.document)
                        .map_err(|e| StoreError::Retrieval(e.to_string()))?,
                    text_match: hit.text_match,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(SearchResponse {
            found: self.found,
            out_of: self.out_of,
            page: self.page,
            search_time_ms: self.search_time_ms,
            hits,
        })
    }
}

impl SearchResponse {
    /// Decodes hit documents; a document that does not fit `T` is a malformed response.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<SearchResponse<T>, StoreError> {
        let hits = self
            .hits
            .into_iter()
            .map(|hit| {
                Ok(SearchHit {
                    document: serde_json::from_value(hit.document).map_err(|e| {
                        StoreError::Retrieval(format!("malformed document in response: {}", e))
                    })?,
                    text_match: hit.text_match,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(SearchResponse {
            found: self.found,
            out_of: self.out_of,
            page: self.page,
            search_time_ms: self.search_time_ms,
            hits,
        })
    }

    /// Keeps only `fields` in every hit document; no-op when `fields` is empty.
    pub fn project(mut self, fields: &[&str]) -> Self {
        if fields.is_empty() {
            return self;
        }
        for hit in &mut self.hits {
            if let serde_json::Value::Object(map) = &mut hit.document {
                map.retain(|key, _| fields.contains(&key.as_str()));
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_encodes_lists() {
        let request = SearchRequest::new("*")
            .query_by(&["question_text", "main_topic"])
            .filters(&[FilterClause::eq("grade", 9)])
            .sort_by("created_at:desc")
            .per_page(20);

        assert_eq!(request.query_fields(), vec!["question_text", "main_topic"]);
        assert_eq!(request.filter_by.as_deref(), Some("grade:=9"));
        assert_eq!(
            request.sort_clauses().unwrap(),
            vec![SortClause::desc("created_at")]
        );
        assert_eq!(request.per_page, 20);
        assert_eq!(request.page, 1);
    }

    #[test]
    fn test_defaults_when_deserialized() {
        let request: SearchRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request, SearchRequest::default());
        assert!(request.sort_clauses().unwrap().is_empty());
    }

    #[test]
    fn test_sort_clause_errors() {
        assert!(SearchRequest::new("*").sort_by("created_at").sort_clauses().is_err());
        assert!(SearchRequest::new("*").sort_by("created_at:up").sort_clauses().is_err());
        assert!(SearchRequest::new("*")
            .sort_by("a:asc,b:asc,c:asc,d:asc")
            .sort_clauses()
            .is_err());
    }

    #[test]
    fn test_project_keeps_requested_fields() {
        let response = SearchResponse {
            found: 1,
            out_of: 1,
            page: 1,
            search_time_ms: 0,
            hits: vec![SearchHit {
                document: json!({"student_id": "s1", "today_questions": 5, "full_name": "Ada"}),
                text_match: 0,
            }],
        };

        let projected = response.project(&["today_questions"]);
        assert_eq!(projected.hits[0].document, json!({"today_questions": 5}));
    }

    #[test]
    fn test_decodes_remote_hit_with_large_score() {
        #[derive(Debug, Deserialize)]
        struct Entry {
            student_id: String,
        }

        let response: SearchResponse = serde_json::from_value(json!({
            "facet_counts": [],
            "found": 1,
            "out_of": 40,
            "page": 1,
            "search_time_ms": 3,
            "hits": [{
                "document": {"student_id": "s1"},
                "highlights": [],
                "text_match": 578730123365187705u64
            }]
        }))
        .unwrap();

        let typed = response.into_typed::<Entry>().unwrap();
        assert_eq!(typed.hits[0].text_match, 578730123365187705);
        assert_eq!(typed.hits[0].document.student_id, "s1");
    }

    #[test]
    fn test_into_typed_reports_malformed_documents() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Count {
            today_questions: u32,
        }

        let response: SearchResponse = serde_json::from_value(json!({
            "found": 1,
            "hits": [{"document": {"today_questions": "many"}}]
        }))
        .unwrap();

        let err = response.into_typed::<Count>().unwrap_err();
        assert!(matches!(err, StoreError::Retrieval(_)));
    }
}
