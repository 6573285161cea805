use crate::stmt::Value;
use crate::{Error, Result};

/// Outbound conversion: a driver value becomes a query-builder parameter.
pub(crate) fn to_query_value(value: &Value) -> sea_query::Value {
    match value {
        Value::Null => sea_query::Value::String(None),
        Value::Bool(v) => sea_query::Value::Bool(Some(*v)),
        Value::I64(v) => sea_query::Value::BigInt(Some(*v)),
        Value::U64(v) => sea_query::Value::BigUnsigned(Some(*v)),
        Value::F64(v) => sea_query::Value::Double(Some(*v)),
        Value::String(v) => sea_query::Value::String(Some(Box::new(v.clone()))),
        Value::Bytes(v) => sea_query::Value::Bytes(Some(Box::new(v.clone()))),
    }
}

/// Inbound conversion: parameters collected by the query builder come back
/// as driver values for the client call.
pub(crate) fn from_query_value(value: sea_query::Value) -> Result<Value> {
    use sea_query::Value as Q;

    let converted = match value {
        Q::Bool(v) => v.map(Value::Bool),
        Q::TinyInt(v) => v.map(|v| Value::I64(v.into())),
        Q::SmallInt(v) => v.map(|v| Value::I64(v.into())),
        Q::Int(v) => v.map(|v| Value::I64(v.into())),
        Q::BigInt(v) => v.map(Value::I64),
        Q::TinyUnsigned(v) => v.map(|v| Value::U64(v.into())),
        Q::SmallUnsigned(v) => v.map(|v| Value::U64(v.into())),
        Q::Unsigned(v) => v.map(|v| Value::U64(v.into())),
        Q::BigUnsigned(v) => v.map(Value::U64),
        Q::Float(v) => v.map(|v| Value::F64(v.into())),
        Q::Double(v) => v.map(Value::F64),
        Q::String(v) => v.map(|v| Value::String(*v)),
        Q::Char(v) => v.map(|v| Value::String(v.to_string())),
        Q::Bytes(v) => v.map(|v| Value::Bytes(*v)),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(Error::invalid_result(
                "unsupported query parameter requires explicit conversion",
            ))
        }
    };

    Ok(converted.unwrap_or(Value::Null))
}

pub(crate) fn from_query_values(values: sea_query::Values) -> Result<Vec<Value>> {
    values.into_iter().map(from_query_value).collect()
}
