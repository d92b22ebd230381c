//! WHERE-clause conditions.

use crate::dialect::Dialect;
use crate::value::SqlValue;

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
}

impl Comparison {
    fn operator(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
        }
    }
}

/// A boolean condition over columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `column <op> value`
    Compare {
        /// Column name, unquoted.
        column: String,
        /// Operator.
        op: Comparison,
        /// Right-hand value.
        value: SqlValue,
    },
    /// `column IN (values...)`; an empty list matches nothing.
    In {
        /// Column name, unquoted.
        column: String,
        /// Candidate values.
        values: Vec<SqlValue>,
    },
    /// `column IS [NOT] NULL`
    IsNull {
        /// Column name, unquoted.
        column: String,
        /// `true` renders `IS NOT NULL`.
        negated: bool,
    },
    /// `column LIKE pattern`
    Like {
        /// Column name, unquoted.
        column: String,
        /// Pattern with `%`/`_` wildcards.
        pattern: String,
    },
    /// Conjunction; empty is true.
    And(Vec<Condition>),
    /// Disjunction; empty is false.
    Or(Vec<Condition>),
}

impl Condition {
    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Eq, value)
    }

    /// `column <= value`
    pub fn lt_eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::LtEq, value)
    }

    /// `column <op> value`
    pub fn compare(column: impl Into<String>, op: Comparison, value: impl Into<SqlValue>) -> Self {
        Self::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// `column IN (values...)`
    pub fn in_list<V, I>(column: impl Into<String>, values: I) -> Self
    where
        V: Into<SqlValue>,
        I: IntoIterator<Item = V>,
    {
        Self::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `column IS NULL`
    pub fn is_null(column: impl Into<String>) -> Self {
        Self::IsNull {
            column: column.into(),
            negated: false,
        }
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self::IsNull {
            column: column.into(),
            negated: true,
        }
    }

    /// `column LIKE pattern`
    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    /// Conjoins `other`, flattening nested conjunctions.
    #[must_use]
    pub fn and(self, other: Condition) -> Self {
        match self {
            Self::And(mut parts) => {
                parts.push(other);
                Self::And(parts)
            }
            first => Self::And(vec![first, other]),
        }
    }

    /// Disjoins `other`, flattening nested disjunctions.
    #[must_use]
    pub fn or(self, other: Condition) -> Self {
        match self {
            Self::Or(mut parts) => {
                parts.push(other);
                Self::Or(parts)
            }
            first => Self::Or(vec![first, other]),
        }
    }

    pub(crate) fn render(&self, out: &mut Renderer<'_>) {
        match self {
            Self::Compare { column, op, value } => {
                out.column(column);
                out.text.push(' ');
                out.text.push_str(op.operator());
                out.text.push(' ');
                out.bind(value.clone());
            }
            Self::In { column, values } => {
                if values.is_empty() {
                    out.text.push_str("1 = 0");
                    return;
                }
                out.column(column);
                out.text.push_str(" IN (");
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        out.text.push_str(", ");
                    }
                    out.bind(value.clone());
                }
                out.text.push(')');
            }
            Self::IsNull { column, negated } => {
                out.column(column);
                out.text
                    .push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Self::Like { column, pattern } => {
                out.column(column);
                out.text.push_str(" LIKE ");
                out.bind(SqlValue::Text(pattern.clone()));
            }
            Self::And(parts) => render_group(parts, " AND ", "1 = 1", out),
            Self::Or(parts) => render_group(parts, " OR ", "1 = 0", out),
        }
    }
}

fn render_group(parts: &[Condition], joiner: &str, empty: &str, out: &mut Renderer<'_>) {
    if parts.is_empty() {
        out.text.push_str(empty);
        return;
    }
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            out.text.push_str(joiner);
        }
        let nested = matches!(part, Condition::And(inner) | Condition::Or(inner) if inner.len() > 1);
        if nested {
            out.text.push('(');
        }
        part.render(out);
        if nested {
            out.text.push(')');
        }
    }
}

/// Accumulates statement text and parameters for one dialect.
pub(crate) struct Renderer<'d> {
    pub(crate) dialect: &'d dyn Dialect,
    pub(crate) text: String,
    pub(crate) params: Vec<SqlValue>,
}

impl<'d> Renderer<'d> {
    pub(crate) fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            text: String::new(),
            params: Vec::new(),
        }
    }

    pub(crate) fn column(&mut self, column: &str) {
        let quoted = self.dialect.quote_identifier(column);
        self.text.push_str(&quoted);
    }

    pub(crate) fn bind(&mut self, value: SqlValue) {
        self.params.push(value);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.text.push_str(&placeholder);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{PostgresDialect, SqlServerDialect};

    fn render(condition: &Condition, dialect: &dyn Dialect) -> (String, Vec<SqlValue>) {
        let mut out = Renderer::new(dialect);
        condition.render(&mut out);
        (out.text, out.params)
    }

    #[test]
    fn test_conjunction_numbers_placeholders_in_order() {
        let condition = Condition::eq("aggregate_type", "todo")
            .and(Condition::eq("aggregate_id", "t-1"))
            .and(Condition::lt_eq("version", 3_i64));

        let (text, params) = render(&condition, &PostgresDialect);

        assert_eq!(
            text,
            r#""aggregate_type" = $1 AND "aggregate_id" = $2 AND "version" <= $3"#
        );
        assert_eq!(
            params,
            vec![
                SqlValue::Text("todo".into()),
                SqlValue::Text("t-1".into()),
                SqlValue::BigInt(3)
            ]
        );
    }

    #[test]
    fn test_in_list_renders_one_placeholder_per_value() {
        let condition = Condition::in_list("aggregate_id", ["a", "b"]);

        let (text, params) = render(&condition, &SqlServerDialect);

        assert_eq!(text, "[aggregate_id] IN (@p1, @p2)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_empty_in_list_matches_nothing() {
        let condition = Condition::in_list::<&str, _>("aggregate_id", []);

        let (text, params) = render(&condition, &PostgresDialect);

        assert_eq!(text, "1 = 0");
        assert!(params.is_empty());
    }

    #[test]
    fn test_nested_disjunction_is_parenthesized() {
        let condition = Condition::eq("a", 1_i64)
            .and(Condition::is_null("b").or(Condition::like("c", "x%")));

        let (text, params) = render(&condition, &PostgresDialect);

        assert_eq!(text, r#""a" = $1 AND ("b" IS NULL OR "c" LIKE $2)"#);
        assert_eq!(params[1], SqlValue::Text("x%".into()));
    }

    #[test]
    fn test_is_not_null() {
        let (text, _) = render(&Condition::is_not_null("actor_id"), &PostgresDialect);

        assert_eq!(text, r#""actor_id" IS NOT NULL"#);
    }
}
