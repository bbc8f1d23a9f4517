//! WHERE conditions and ORDER BY terms.

use relmap_core::{Param, Result, SqlTyped, TypeInfo, Value};
use relmap_dialect::DialectChain;
use serde::{Deserialize, Serialize};

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    In,
    IsNull,
    IsNotNull,
}

impl Op {
    /// SQL text of a binary operator.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "<>",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Like => "LIKE",
            Op::In => "IN",
            Op::IsNull => "IS NULL",
            Op::IsNotNull => "IS NOT NULL",
        }
    }
}

/// One `column op value` term; terms are ANDed in order.
#[derive(Debug, Clone)]
pub struct Condition {
    pub(crate) qualifier: Option<String>,
    pub(crate) column: String,
    pub(crate) op: Op,
    pub(crate) value: Value,
    pub(crate) ty: Option<TypeInfo>,
}

impl Condition {
    /// Compare `column` with `value` using `op`.
    pub fn new(column: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Self {
            qualifier: None,
            column: column.into(),
            op,
            value: value.into(),
            ty: None,
        }
    }

    /// `column = value`.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Op::Eq, value)
    }

    /// `column IN (values...)`; an empty list matches nothing.
    pub fn is_in(column: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        Self::new(column, Op::In, Value::Array(values.into_iter().collect()))
    }

    /// `column IS NULL`.
    pub fn is_null(column: impl Into<String>) -> Self {
        Self::new(column, Op::IsNull, Value::Null)
    }

    /// `column IS NOT NULL`.
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self::new(column, Op::IsNotNull, Value::Null)
    }

    /// Compare against a native value, bound through its converter.
    pub fn typed<T: SqlTyped>(column: impl Into<String>, op: Op, value: &T) -> Result<Self> {
        Ok(Self::new(column, op, value.to_value()?).with_type(T::type_info()))
    }

    /// Bind the value through the converter resolved for `ty`.
    #[must_use]
    pub fn with_type(mut self, ty: TypeInfo) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Qualify the column with a join alias instead of the root table.
    #[must_use]
    pub fn on(mut self, alias: impl Into<String>) -> Self {
        self.qualifier = Some(alias.into());
        self
    }

    pub(crate) fn render(
        &self,
        chain: &DialectChain,
        table: &str,
        params: &mut Vec<Param>,
    ) -> Result<String> {
        let column = format!(
            "{}.{}",
            chain.quote_ident(self.qualifier.as_deref().unwrap_or(table)),
            chain.quote_ident(&self.column)
        );
        let converter = match &self.ty {
            Some(ty) => Some(chain.converter_for(ty)?),
            None => None,
        };
        let bind = |value: &Value, params: &mut Vec<Param>, name: String| -> Result<String> {
            let (placeholder, bound) = match &converter {
                Some(c) => (c.format_parameter(&name), c.write(value.clone())?),
                None => (format!(":{name}"), value.clone()),
            };
            params.push(Param::new(name, bound));
            Ok(placeholder)
        };

        match self.op {
            Op::IsNull | Op::IsNotNull => Ok(format!("{column} {}", self.op.as_sql())),
            Op::In => {
                let items = match &self.value {
                    Value::Array(items) => items.as_slice(),
                    single => std::slice::from_ref(single),
                };
                if items.is_empty() {
                    return Ok("1 = 0".to_string());
                }
                let base = params.len() + 1;
                let mut placeholders = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    placeholders.push(bind(item, params, format!("p{base}_{i}"))?);
                }
                Ok(format!("{column} IN ({})", placeholders.join(", ")))
            }
            op => {
                let name = format!("p{}", params.len() + 1);
                let placeholder = bind(&self.value, params, name)?;
                Ok(format!("{column} {} {placeholder}", op.as_sql()))
            }
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One ORDER BY term on a root-table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

impl OrderBy {
    /// Ascending order on `column`.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    /// Descending order on `column`.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}
