use std::fmt;
use crate::core::Value;

/// Predicate tree over member paths and constants.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Member reference by dotted path
    Member(String),

    /// Constant, always bound as a parameter
    Constant(Value),

    /// Comparison or logical connective
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    Not {
        expr: Box<Expr>,
    },

    /// IS [NOT] NULL check
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },

    /// LIKE pattern matching; `%` and `_` in `pattern` are wildcards
    Like {
        expr: Box<Expr>,
        pattern: String,
        negated: bool,
    },

    /// IN list check
    In {
        expr: Box<Expr>,
        list: Vec<Value>,
        negated: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,
}

impl BinaryOp {
    pub fn is_comparison(&self) -> bool {
        !self.is_logical()
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Operator with its operands swapped, `a < b` == `b > a`.
    pub fn flipped(&self) -> Self {
        match self {
            Self::Lt => Self::Gt,
            Self::LtEq => Self::GtEq,
            Self::Gt => Self::Lt,
            Self::GtEq => Self::LtEq,
            other => *other,
        }
    }
}

impl Expr {
    pub fn member(path: impl Into<String>) -> Self {
        Self::Member(path.into())
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant(value.into())
    }

    fn binary(self, op: BinaryOp, right: Expr) -> Self {
        Self::BinaryOp {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    pub fn eq(self, value: impl Into<Value>) -> Self {
        self.binary(BinaryOp::Eq, Self::constant(value))
    }

    pub fn not_eq(self, value: impl Into<Value>) -> Self {
        self.binary(BinaryOp::NotEq, Self::constant(value))
    }

    pub fn lt(self, value: impl Into<Value>) -> Self {
        self.binary(BinaryOp::Lt, Self::constant(value))
    }

    pub fn lt_eq(self, value: impl Into<Value>) -> Self {
        self.binary(BinaryOp::LtEq, Self::constant(value))
    }

    pub fn gt(self, value: impl Into<Value>) -> Self {
        self.binary(BinaryOp::Gt, Self::constant(value))
    }

    pub fn gt_eq(self, value: impl Into<Value>) -> Self {
        self.binary(BinaryOp::GtEq, Self::constant(value))
    }

    /// Compare against another expression, e.g. a second member.
    pub fn compare(self, op: BinaryOp, right: Expr) -> Self {
        self.binary(op, right)
    }

    pub fn and(self, right: Expr) -> Self {
        self.binary(BinaryOp::And, right)
    }

    pub fn or(self, right: Expr) -> Self {
        self.binary(BinaryOp::Or, right)
    }

    pub fn negate(self) -> Self {
        Self::Not { expr: Box::new(self) }
    }

    pub fn is_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    pub fn is_not_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    pub fn like(self, pattern: impl Into<String>) -> Self {
        Self::Like {
            expr: Box::new(self),
            pattern: pattern.into(),
            negated: false,
        }
    }

    pub fn not_like(self, pattern: impl Into<String>) -> Self {
        Self::Like {
            expr: Box::new(self),
            pattern: pattern.into(),
            negated: true,
        }
    }

    pub fn starts_with(self, prefix: &str) -> Self {
        self.like(format!("{}%", escape_like(prefix)))
    }

    pub fn ends_with(self, suffix: &str) -> Self {
        self.like(format!("%{}", escape_like(suffix)))
    }

    pub fn contains(self, fragment: &str) -> Self {
        self.like(format!("%{}%", escape_like(fragment)))
    }

    pub fn in_list<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In {
            expr: Box::new(self),
            list: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    pub fn not_in_list<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In {
            expr: Box::new(self),
            list: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    /// Member paths referenced by this tree, in first-seen order, deduplicated.
    pub fn member_paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        self.collect_member_paths(&mut paths);
        paths
    }

    fn collect_member_paths<'a>(&'a self, paths: &mut Vec<&'a str>) {
        match self {
            Self::Member(path) => {
                if !paths.contains(&path.as_str()) {
                    paths.push(path);
                }
            }
            Self::Constant(_) => {}
            Self::BinaryOp { left, right, .. } => {
                left.collect_member_paths(paths);
                right.collect_member_paths(paths);
            }
            Self::Not { expr }
            | Self::IsNull { expr, .. }
            | Self::Like { expr, .. }
            | Self::In { expr, .. } => expr.collect_member_paths(paths),
        }
    }
}

/// Escape LIKE wildcards so `text` matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '%' | '_' | '[' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Member(path) => write!(f, "{}", path),
            Expr::Constant(Value::Text(s)) => write!(f, "'{}'", s),
            Expr::Constant(value) => write!(f, "{}", value),
            Expr::BinaryOp { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Not { expr } => write!(f, "NOT {}", expr),
            Expr::IsNull { expr, negated } => {
                write!(f, "{} IS {}NULL", expr, if *negated { "NOT " } else { "" })
            }
            Expr::Like { expr, pattern, negated } => {
                write!(f, "{} {}LIKE '{}'", expr, if *negated { "NOT " } else { "" }, pattern)
            }
            Expr::In { expr, list, negated } => {
                let items: Vec<String> = list.iter().map(|v| v.to_string()).collect();
                write!(f, "{} {}IN ({})", expr, if *negated { "NOT " } else { "" }, items.join(", "))
            }
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        };
        write!(f, "{}", token)
    }
}
