//! Interpretación de cuerpos de lote
//!
//! Un lote llega como un solo objeto, como `{"records": [...]}` o como
//! `{"dataArray": [...]}`. Cada registro se deserializa y valida por su
//! cuenta, así un error de tipo en un registro no tumba a los demás.

use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

use crate::utils::errors::{bad_request_error, from_validation_errors, AppError, AppResult};

const BATCH_KEYS: [&str; 2] = ["records", "dataArray"];

/// Separa el cuerpo en registros crudos. Un lote vacío o que no es
/// objeto ni arreglo es un error del lote completo.
pub fn split_batch(body: Value) -> AppResult<Vec<Value>> {
    let records = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            match BATCH_KEYS.iter().find(|key| map.contains_key(**key)) {
                Some(key) => match map.remove(*key) {
                    Some(Value::Array(items)) => items,
                    _ => return Err(AppError::BadRequest(format!("'{}' must be an array", key))),
                },
                None => vec![Value::Object(map)],
            }
        }
        _ => return Err(bad_request_error("body must be a record object or a records array")),
    };

    if records.is_empty() {
        return Err(bad_request_error("batch contains no records"));
    }
    Ok(records)
}

/// Deserializa y valida un registro
pub fn parse_record<T>(raw: Value) -> AppResult<T>
where
    T: DeserializeOwned + Validate,
{
    let record: T = serde_json::from_value(raw).map_err(|e| AppError::Validation(e.to_string()))?;
    record.validate().map_err(|e| from_validation_errors(&e))?;
    Ok(record)
}

/// Convierte cada registro crudo en el comando del servicio, conservando
/// el error de cada uno en su posición
pub fn parse_records<T, C>(records: Vec<Value>) -> Vec<AppResult<C>>
where
    T: DeserializeOwned + Validate,
    C: TryFrom<T, Error = AppError>,
{
    records
        .into_iter()
        .map(|raw| parse_record::<T>(raw).and_then(C::try_from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_batch_shapes() {
        assert_eq!(split_batch(json!({"monto": 1})).unwrap().len(), 1);
        assert_eq!(split_batch(json!({"records": [{}, {}]})).unwrap().len(), 2);
        assert_eq!(split_batch(json!({"dataArray": [{}, {}, {}]})).unwrap().len(), 3);
        assert_eq!(split_batch(json!([{}])).unwrap().len(), 1);
    }

    #[test]
    fn test_split_batch_rejects_malformed_bodies() {
        assert!(matches!(split_batch(json!({"records": []})), Err(AppError::BadRequest(_))));
        assert!(matches!(split_batch(json!({"records": 5})), Err(AppError::BadRequest(_))));
        assert!(matches!(split_batch(json!("hola")), Err(AppError::BadRequest(_))));
        assert!(matches!(split_batch(json!([])), Err(AppError::BadRequest(_))));
    }
}
