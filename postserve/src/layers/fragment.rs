//! Datasource fragment parsing.
//!
//! Layer datasources are SQL subqueries wrapped in parentheses with a
//! trailing alias:
//!
//! ```text
//! (SELECT geometry, class, name FROM layer_water(!bbox!, z(!scale_denominator!))) AS t
//! ```
//!
//! The parser walks the text structurally (parenthesis depth, string
//! literals, quoted identifiers and comments) instead of slicing fixed
//! offsets, so a fragment of the wrong shape is rejected up front rather
//! than turning into broken SQL at query time.

use regex::Regex;
use std::sync::OnceLock;

use thiserror::Error;

/// Name of the geometry column every layer must project.
pub const GEOMETRY_COLUMN: &str = "geometry";

/// Errors raised for malformed datasource fragments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FragmentError {
    /// Fragment does not start with an opening parenthesis.
    #[error("datasource must be a parenthesized subquery, e.g. '(SELECT ...) AS t'")]
    MissingSubquery,

    /// Parentheses do not balance.
    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    /// String literal, quoted identifier or block comment never closed.
    #[error("unterminated {0}")]
    Unterminated(&'static str),

    /// Nothing follows the closing parenthesis.
    #[error("subquery has no trailing alias (expected '... ) AS t')")]
    MissingAlias,

    /// Text after the closing parenthesis is not a plain alias.
    #[error("unexpected text after subquery: '{0}'")]
    InvalidAlias(String),

    /// Inner query is not a SELECT.
    #[error("subquery must start with SELECT")]
    NotASelect,

    /// Inner query has no top-level FROM clause.
    #[error("subquery has no FROM clause")]
    MissingFrom,

    /// Top-level UNION, INTERSECT or EXCEPT after the first FROM.
    #[error("subquery combines SELECTs with {0}; wrap the combined query in its own subquery")]
    SetOperation(String),

    /// Projection list contains an empty item (e.g. a doubled comma).
    #[error("empty item in SELECT list")]
    EmptyProjectionItem,

    /// No projection item is named `geometry`.
    #[error("SELECT list has no '{}' column", GEOMETRY_COLUMN)]
    MissingGeometry,

    /// More than one projection item is named `geometry`.
    #[error("SELECT list has more than one '{}' column", GEOMETRY_COLUMN)]
    DuplicateGeometry,
}

/// Parsed layer datasource.
///
/// Holds the inner query split into its projection items and the remainder
/// starting at the top-level `FROM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerFragment {
    projection: Vec<String>,
    geometry_index: usize,
    geometry_expr: String,
    from_clause: String,
}

impl LayerFragment {
    /// Projection items in source order, trimmed.
    pub fn projection(&self) -> &[String] {
        &self.projection
    }

    /// Index of the geometry item within [`projection`](Self::projection).
    pub fn geometry_index(&self) -> usize {
        self.geometry_index
    }

    /// Expression producing the geometry (the item without its alias).
    pub fn geometry_expr(&self) -> &str {
        &self.geometry_expr
    }

    /// Everything from the top-level `FROM` keyword to the end of the subquery.
    pub fn from_clause(&self) -> &str {
        &self.from_clause
    }
}

fn alias_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Optional AS keyword followed by a single unquoted identifier
        Regex::new(r"^(?:(?i:as)\s+)?([A-Za-z_][A-Za-z0-9_]*)$").unwrap()
    })
}

fn select_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?i:select)\s").unwrap())
}

fn from_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(?i:from)\b").unwrap())
}

fn set_operation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(?i:union|intersect|except)\b").unwrap())
}

fn geometry_alias_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"\s(?i:as)\s+(?:geometry|"geometry")\s*$"#).unwrap())
}

#[derive(Clone, Copy, PartialEq)]
enum ScanState {
    Code,
    Literal,
    QuotedIdent,
    LineComment,
    BlockComment,
}

/// Two views of a SQL fragment sharing the original byte layout.
///
/// `code` keeps only top-level code: string literals, quoted identifiers,
/// comments and anything nested inside parentheses become spaces, while the
/// outermost parentheses themselves stay visible. `clean` is the original
/// text with comments blanked, and is what gets re-emitted into the template.
struct Scan {
    code: String,
    clean: String,
}

impl Scan {
    fn keep(&mut self, c: char, visible: bool) {
        if visible {
            self.code.push(c);
        } else {
            pad(&mut self.code, c);
        }
        self.clean.push(c);
    }

    fn comment(&mut self, c: char) {
        pad(&mut self.code, c);
        if c == '\n' {
            self.clean.push(c);
        } else {
            pad(&mut self.clean, c);
        }
    }
}

fn pad(out: &mut String, c: char) {
    out.extend(std::iter::repeat(' ').take(c.len_utf8()));
}

fn scan(sql: &str) -> Result<Scan, FragmentError> {
    let mut out = Scan {
        code: String::with_capacity(sql.len()),
        clean: String::with_capacity(sql.len()),
    };
    let mut state = ScanState::Code;
    let mut depth: u32 = 0;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            ScanState::Code => match c {
                '\'' => {
                    state = ScanState::Literal;
                    out.keep(c, false);
                }
                '"' => {
                    state = ScanState::QuotedIdent;
                    out.keep(c, false);
                }
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    state = ScanState::LineComment;
                    out.comment('-');
                    out.comment('-');
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = ScanState::BlockComment;
                    out.comment('/');
                    out.comment('*');
                }
                '(' => {
                    out.keep(c, depth == 0);
                    depth += 1;
                }
                ')' => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or(FragmentError::UnbalancedParentheses)?;
                    out.keep(c, depth == 0);
                }
                _ => out.keep(c, depth == 0),
            },
            ScanState::Literal | ScanState::QuotedIdent => {
                let quote = if state == ScanState::Literal { '\'' } else { '"' };
                if c == quote {
                    if chars.peek() == Some(&quote) {
                        // Doubled quote is an escape, stay inside
                        chars.next();
                        out.keep(c, false);
                    } else {
                        state = ScanState::Code;
                    }
                }
                out.keep(c, false);
            }
            ScanState::LineComment => {
                out.comment(c);
                if c == '\n' {
                    state = ScanState::Code;
                }
            }
            ScanState::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = ScanState::Code;
                    out.comment('*');
                    out.comment('/');
                } else {
                    out.comment(c);
                }
            }
        }
    }

    match state {
        ScanState::Literal => return Err(FragmentError::Unterminated("string literal")),
        ScanState::QuotedIdent => return Err(FragmentError::Unterminated("quoted identifier")),
        ScanState::BlockComment => return Err(FragmentError::Unterminated("block comment")),
        ScanState::Code | ScanState::LineComment => {}
    }
    if depth != 0 {
        return Err(FragmentError::UnbalancedParentheses);
    }

    debug_assert_eq!(out.code.len(), sql.len());
    debug_assert_eq!(out.clean.len(), sql.len());
    Ok(out)
}

/// Parse a layer datasource of the form `(SELECT ... FROM ...) AS alias`.
///
/// # Examples
///
/// ```
/// use postserve::layers::parse_fragment;
///
/// let fragment = parse_fragment("(SELECT geometry, name FROM roads) AS t").unwrap();
/// assert_eq!(fragment.projection(), &["geometry", "name"]);
/// assert_eq!(fragment.geometry_index(), 0);
/// assert_eq!(fragment.from_clause(), "FROM roads");
/// ```
pub fn parse_fragment(table: &str) -> Result<LayerFragment, FragmentError> {
    let trimmed = table.trim();
    if !trimmed.starts_with('(') {
        return Err(FragmentError::MissingSubquery);
    }

    let outer = scan(trimmed)?;
    // The opening parenthesis is at depth zero, so the next visible ')' closes it
    let close = outer.code[1..]
        .find(')')
        .map(|i| i + 1)
        .ok_or(FragmentError::UnbalancedParentheses)?;

    let alias = outer.clean[close + 1..].trim();
    if alias.is_empty() {
        return Err(FragmentError::MissingAlias);
    }
    let valid_alias = alias_pattern()
        .captures(alias)
        .map(|caps| !caps[1].eq_ignore_ascii_case("as"))
        .unwrap_or(false);
    if !valid_alias {
        return Err(FragmentError::InvalidAlias(alias.to_string()));
    }

    parse_select(outer.clean[1..close].trim())
}

fn parse_select(inner: &str) -> Result<LayerFragment, FragmentError> {
    let Scan { code, clean } = scan(inner)?;

    let select = select_pattern()
        .find(&code)
        .ok_or(FragmentError::NotASelect)?;
    let from = from_pattern()
        .find_at(&code, select.end())
        .ok_or(FragmentError::MissingFrom)?;

    // Only the first branch's projection gets rewritten, so a later branch
    // would feed raw geometry into the tile
    if let Some(op) = set_operation_pattern().find_at(&code, from.end()) {
        return Err(FragmentError::SetOperation(op.as_str().to_uppercase()));
    }

    let list_start = select.end();
    let list_end = from.start();

    let mut items = Vec::new();
    let mut item_start = list_start;
    let commas = code[list_start..list_end]
        .match_indices(',')
        .map(|(i, _)| list_start + i);
    for boundary in commas.chain(std::iter::once(list_end)) {
        if clean[item_start..boundary].trim().is_empty() {
            return Err(FragmentError::EmptyProjectionItem);
        }
        items.push(item_start..boundary);
        item_start = boundary + 1;
    }

    let mut geometry: Option<(usize, String)> = None;
    for (index, range) in items.iter().enumerate() {
        if let Some(expr) = geometry_expression(&clean[range.clone()], &code[range.clone()]) {
            if geometry.is_some() {
                return Err(FragmentError::DuplicateGeometry);
            }
            geometry = Some((index, expr));
        }
    }
    let (geometry_index, geometry_expr) = geometry.ok_or(FragmentError::MissingGeometry)?;

    Ok(LayerFragment {
        projection: items
            .into_iter()
            .map(|range| clean[range].trim().to_string())
            .collect(),
        geometry_index,
        geometry_expr,
        from_clause: clean[from.start()..].trim().to_string(),
    })
}

/// Returns the geometry expression if this projection item names the
/// geometry column, either bare or through a top-level `AS geometry` alias.
fn geometry_expression(item: &str, code: &str) -> Option<String> {
    let bare = item.trim();
    if bare.eq_ignore_ascii_case(GEOMETRY_COLUMN) || bare == "\"geometry\"" {
        return Some(bare.to_string());
    }

    let alias = geometry_alias_pattern().find(item)?;
    // The AS keyword must be code at this level, not text inside a call or literal
    let keyword = alias.start() + 1;
    if code.as_bytes().get(keyword).map(u8::is_ascii_whitespace) != Some(false) {
        return None;
    }

    let expr = item[..alias.start()].trim();
    (!expr.is_empty()).then(|| expr.to_string())
}
