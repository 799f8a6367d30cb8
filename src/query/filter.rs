//! Boolean filter expression trees

use crate::schema::Record;
use crate::value::Value;

/// Comparison operator between a column and a literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal
    Eq,

    /// Not equal
    Ne,

    /// Greater than
    Gt,

    /// Greater than or equal
    Ge,

    /// Less than
    Lt,

    /// Less than or equal
    Le,

    /// SQL LIKE pattern match
    Like,
}

impl CompareOp {
    /// SQL spelling of the operator
    pub fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Like => "LIKE",
        }
    }
}

/// One column-against-literal comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Table the attribute belongs to
    pub table: String,

    /// Attribute (column) name
    pub attribute: String,

    /// Comparison operator
    pub op: CompareOp,

    /// Literal operand
    pub value: Value,
}

/// A boolean filter over one or more tables
///
/// `and`/`or` flatten: combining onto an existing `All`/`Any` appends to it
/// rather than nesting, so `a.and(b).and(c)` is one three-way conjunction.
/// Tree shape is not semantically significant - only the matched row set is.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Single comparison
    Compare(Comparison),

    /// Conjunction: every child must hold
    All(Vec<Filter>),

    /// Disjunction: any child may hold
    Any(Vec<Filter>),
}

impl Filter {
    fn compare<R: Record>(attribute: &str, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare(Comparison {
            table: R::TABLE.to_owned(),
            attribute: attribute.to_owned(),
            op,
            value: value.into(),
        })
    }

    /// `attribute = value`
    pub fn equals<R: Record>(attribute: &str, value: impl Into<Value>) -> Self {
        Self::compare::<R>(attribute, CompareOp::Eq, value)
    }

    /// `attribute <> value`
    pub fn not_equals<R: Record>(attribute: &str, value: impl Into<Value>) -> Self {
        Self::compare::<R>(attribute, CompareOp::Ne, value)
    }

    /// `attribute > value`
    pub fn greater_than<R: Record>(attribute: &str, value: impl Into<Value>) -> Self {
        Self::compare::<R>(attribute, CompareOp::Gt, value)
    }

    /// `attribute >= value`
    pub fn greater_or_equal<R: Record>(attribute: &str, value: impl Into<Value>) -> Self {
        Self::compare::<R>(attribute, CompareOp::Ge, value)
    }

    /// `attribute < value`
    pub fn less_than<R: Record>(attribute: &str, value: impl Into<Value>) -> Self {
        Self::compare::<R>(attribute, CompareOp::Lt, value)
    }

    /// `attribute <= value`
    pub fn less_or_equal<R: Record>(attribute: &str, value: impl Into<Value>) -> Self {
        Self::compare::<R>(attribute, CompareOp::Le, value)
    }

    /// `attribute LIKE pattern`
    pub fn like<R: Record>(attribute: &str, pattern: impl Into<String>) -> Self {
        Self::compare::<R>(attribute, CompareOp::Like, Value::Text(pattern.into()))
    }

    /// Combine with another filter; both must hold
    ///
    /// Appends to an existing conjunction instead of nesting.
    pub fn and(self, other: Filter) -> Filter {
        match self {
            Self::All(mut children) => {
                children.push(other);
                Self::All(children)
            }
            node => Self::All(vec![node, other]),
        }
    }

    /// Combine with another filter; either may hold
    ///
    /// Appends to an existing disjunction instead of nesting.
    pub fn or(self, other: Filter) -> Filter {
        match self {
            Self::Any(mut children) => {
                children.push(other);
                Self::Any(children)
            }
            node => Self::Any(vec![node, other]),
        }
    }

    /// Every table name referenced by comparisons in this tree
    ///
    /// Duplicates removed, order of first appearance kept. The SQL layer
    /// extends this set with tables reachable through belongs-to links
    /// before building the join list.
    pub fn referenced_tables(&self) -> Vec<String> {
        let mut tables = Vec::new();
        self.collect_tables(&mut tables);
        tables
    }

    fn collect_tables(&self, out: &mut Vec<String>) {
        match self {
            Self::Compare(cmp) => {
                if !out.iter().any(|t| t == &cmp.table) {
                    out.push(cmp.table.clone());
                }
            }
            Self::All(children) | Self::Any(children) => {
                for child in children {
                    child.collect_tables(out);
                }
            }
        }
    }
}
