//! Translation of client parameters into upstream queries.
//!
//! Two targets exist:
//! - the kana JSON API, which takes a nested filter array (`Filter`);
//! - the legacy TCP API, which takes a flat `field op value and ...`
//!   expression (`QueryString`).
//!
//! Both builders only ever append: a predicate, once pushed, stays in the
//! rendered output.

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::ProxyError;

/// Fields requested for every VN fetched from kana.
pub const VN_FIELDS: &str = "title, description, image.url, image.sexual, image.violence, screenshots.thumbnail, screenshots.url, screenshots.sexual, screenshots.violence, rating, length, length_minutes, length_votes, languages, released, aliases, screenshots.dims";

/// Upper bound added to an `id` lookup on the list endpoint.
pub const ID_WINDOW: u64 = 10;

/// Results per page of kana's `/vn` when `results` is not sent.
pub const KANA_PAGE_SIZE: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic {
    And,
    Or,
}

impl Logic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Logic::And => "and",
            Logic::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ge,
    Le,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Ge => ">=",
            Comparator::Le => "<=",
        }
    }
}

/// Kana filter tree. Serializes to the upstream array form:
/// `["and", ["id", ">=", "v5"], ...]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Group { logic: Logic, operands: Vec<Filter> },
    Predicate { field: String, cmp: Comparator, value: Value },
}

impl Filter {
    pub fn predicate(field: &str, cmp: Comparator, value: impl Into<Value>) -> Self {
        Filter::Predicate {
            field: field.to_string(),
            cmp,
            value: value.into(),
        }
    }

    pub fn any_of(operands: Vec<Filter>) -> Self {
        Filter::Group {
            logic: Logic::Or,
            operands,
        }
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Filter::Group { logic, operands } => {
                let mut seq = serializer.serialize_seq(Some(operands.len() + 1))?;
                seq.serialize_element(logic.as_str())?;
                for operand in operands {
                    seq.serialize_element(operand)?;
                }
                seq.end()
            }
            Filter::Predicate { field, cmp, value } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(field)?;
                seq.serialize_element(cmp.as_str())?;
                seq.serialize_element(value)?;
                seq.end()
            }
        }
    }
}

/// Accumulates predicates under a single top-level `and`.
#[derive(Debug, Default, Clone)]
pub struct FilterBuilder {
    operands: Vec<Filter>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: Filter) -> &mut Self {
        self.operands.push(filter);
        self
    }

    /// `None` when nothing was pushed; the upstream then matches every VN.
    pub fn build(self) -> Option<Filter> {
        if self.operands.is_empty() {
            None
        } else {
            Some(Filter::Group {
                logic: Logic::And,
                operands: self.operands,
            })
        }
    }
}

/// Request body for kana's `POST /vn`.
#[derive(Debug, Serialize, Clone)]
pub struct KanaQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filter>,
    pub fields: &'static str,
    pub count: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<u32>,
}

impl KanaQuery {
    pub fn new(filters: Option<Filter>) -> Self {
        Self {
            filters,
            fields: VN_FIELDS,
            count: false,
            page: None,
            results: None,
        }
    }

    /// Single VN by numeric id.
    pub fn by_id(id: u64) -> Self {
        Self::new(Some(Filter::predicate("id", Comparator::Eq, vn_id(id))))
    }

    /// Any of the given numeric ids.
    pub fn any_id(ids: &[u64]) -> Self {
        let operands = ids
            .iter()
            .map(|id| Filter::predicate("id", Comparator::Eq, vn_id(*id)))
            .collect();
        let mut query = Self::new(Some(Filter::any_of(operands)));
        query.results = Some(ids.len() as u32);
        query
    }
}

pub fn vn_id(id: u64) -> String {
    format!("v{}", id)
}

pub fn tag_id(id: u64) -> String {
    format!("g{}", id)
}

/// Query parameters are "present" when given and non-empty.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Strict switch: only the literal `true` turns it on.
pub fn flag(value: &Option<String>) -> bool {
    value.as_deref() == Some("true")
}

/// Loose switch: any non-empty value turns it on, `false` included.
pub fn present(value: &Option<String>) -> bool {
    non_empty(value).is_some()
}

pub fn parse_int<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ProxyError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ProxyError::invalid(name, raw))
}

/// Integer formed by the leading digits of `raw` (`"7abc"` -> 7).
/// `None` when `raw` does not start with a digit.
pub fn leading_int(raw: &str) -> Option<u64> {
    let raw = raw.trim_start();
    let end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    raw[..end].parse().ok()
}

/// Parameters of the VN list/search endpoint.
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VnListParams {
    pub id: Option<String>,
    pub title: Option<String>,
    pub is_larger: Option<String>,
    pub page: Option<String>,
    pub is_count: Option<String>,
    pub tags: Option<String>,
    pub is_contain_last_page: Option<String>,
}

impl VnListParams {
    pub fn wants_last_page(&self) -> bool {
        flag(&self.is_contain_last_page)
    }

    pub fn to_query(&self) -> Result<KanaQuery, ProxyError> {
        let mut filters = FilterBuilder::new();

        if let Some(raw) = non_empty(&self.id) {
            let id: u64 = parse_int("id", raw)?;
            let cmp = if present(&self.is_larger) {
                Comparator::Ge
            } else {
                Comparator::Eq
            };
            filters.push(Filter::predicate("id", cmp, vn_id(id)));
            let upper = id
                .checked_add(ID_WINDOW)
                .ok_or_else(|| ProxyError::invalid("id", raw))?;
            filters.push(Filter::predicate("id", Comparator::Le, vn_id(upper)));
        }

        if let Some(title) = non_empty(&self.title) {
            filters.push(Filter::predicate("search", Comparator::Eq, title));
        }

        // Every tag is required: the VN must carry all of them.
        if let Some(tags) = non_empty(&self.tags) {
            for raw in tags.split(',') {
                let id: u64 = parse_int("tags", raw)?;
                filters.push(Filter::predicate("tag", Comparator::Eq, tag_id(id)));
            }
        }

        let mut query = KanaQuery::new(filters.build());
        query.count = flag(&self.is_count) || self.wants_last_page();
        if let Some(raw) = non_empty(&self.page) {
            query.page = Some(parse_int("page", raw)?);
        }
        Ok(query)
    }
}

/// Parameters of the tag endpoint.
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TagParams {
    pub page: Option<String>,
    pub q: Option<String>,
    pub list: Option<String>,
    pub is_normal: Option<String>,
}

impl TagParams {
    pub fn is_batch(&self) -> bool {
        flag(&self.is_normal)
    }

    /// Requested page, 1 when absent.
    pub fn page(&self) -> Result<usize, ProxyError> {
        match non_empty(&self.page) {
            Some(raw) => parse_int("page", raw),
            None => Ok(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    Exact,
    Fuzzy,
}

impl Match {
    pub fn as_str(&self) -> &'static str {
        match self {
            Match::Exact => "=",
            Match::Fuzzy => "~",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Clause {
    field: &'static str,
    op: Match,
    value: String,
}

/// Flat legacy filter, rendered as `field op value and field op value`.
#[derive(Debug, Default, Clone)]
pub struct QueryString {
    clauses: Vec<Clause>,
}

impl QueryString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, op: Match, raw: &str) -> &mut Self {
        self.clauses.push(Clause {
            field,
            op,
            value: render_value(raw),
        });
        self
    }

    /// Push only when the parameter is present.
    pub fn push_opt(&mut self, field: &'static str, op: Match, raw: &Option<String>) -> &mut Self {
        if let Some(raw) = non_empty(raw) {
            self.push(field, op, raw);
        }
        self
    }
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{} {} {}", clause.field, clause.op.as_str(), clause.value)?;
        }
        Ok(())
    }
}

/// A value that already is one complete JSON token goes out verbatim;
/// anything else becomes a JSON string literal.
pub fn render_value(raw: &str) -> String {
    let trimmed = raw.trim();
    if serde_json::from_str::<Value>(trimmed).is_ok() {
        trimmed.to_string()
    } else {
        Value::String(raw.to_string()).to_string()
    }
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct ReleaseParams {
    pub id: Option<String>,
    pub released: Option<String>,
    pub vn: Option<String>,
    pub producer: Option<String>,
    pub title: Option<String>,
    pub original: Option<String>,
    pub patch: Option<String>,
    pub freeware: Option<String>,
    pub doujin: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub gtin: Option<String>,
    pub catalog: Option<String>,
    pub languages: Option<String>,
    pub platforms: Option<String>,
}

impl ReleaseParams {
    pub fn to_filter(&self) -> QueryString {
        let mut q = QueryString::new();
        q.push_opt("id", Match::Exact, &self.id)
            .push_opt("released", Match::Exact, &self.released)
            .push_opt("vn", Match::Exact, &self.vn)
            .push_opt("producer", Match::Exact, &self.producer)
            .push_opt("title", Match::Exact, &self.title)
            .push_opt("original", Match::Exact, &self.original)
            .push_opt("patch", Match::Exact, &self.patch)
            .push_opt("freeware", Match::Exact, &self.freeware)
            .push_opt("doujin", Match::Exact, &self.doujin)
            .push_opt("type", Match::Exact, &self.kind)
            .push_opt("gtin", Match::Exact, &self.gtin)
            .push_opt("catalog", Match::Exact, &self.catalog)
            .push_opt("languages", Match::Exact, &self.languages)
            .push_opt("platforms", Match::Exact, &self.platforms);
        q
    }

    pub fn command(&self) -> String {
        format!("get release basic,details,vn,producers ({})", self.to_filter())
    }
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct CharacterParams {
    pub id: Option<String>,
    pub name: Option<String>,
    pub original: Option<String>,
    pub search: Option<String>,
    pub vn: Option<String>,
    pub traits: Option<String>,
}

impl CharacterParams {
    pub fn to_filter(&self) -> QueryString {
        let mut q = QueryString::new();
        q.push_opt("id", Match::Exact, &self.id)
            .push_opt("name", Match::Fuzzy, &self.name)
            .push_opt("original", Match::Fuzzy, &self.original)
            .push_opt("search", Match::Fuzzy, &self.search)
            .push_opt("vn", Match::Exact, &self.vn)
            .push_opt("traits", Match::Exact, &self.traits);
        q
    }

    pub fn command(&self) -> String {
        format!(
            "get character basic,details,traits,meas,vns,voiced,instances ({})",
            self.to_filter()
        )
    }
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct StaffParams {
    pub id: Option<String>,
    pub aid: Option<String>,
    pub search: Option<String>,
}

impl StaffParams {
    pub fn to_filter(&self) -> QueryString {
        let mut q = QueryString::new();
        q.push_opt("search", Match::Fuzzy, &self.search)
            .push_opt("id", Match::Exact, &self.id)
            .push_opt("aid", Match::Exact, &self.aid);
        q
    }

    pub fn command(&self) -> String {
        format!("get staff basic,details,aliases,vns,voiced ({})", self.to_filter())
    }
}

pub fn relations_command(vn: u64) -> String {
    format!("get vn relations (id = {})", vn)
}
