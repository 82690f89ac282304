//! Resultado de un lote procesado registro por registro

use std::fmt::Display;

use tracing::{error, warn};

use crate::utils::errors::{AppError, AppResult};

/// Resultado acumulado de un lote best-effort: lo que se confirmó y la
/// razón de cada registro que falló
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<T> {
    pub processed: Vec<T>,
    pub errors: Vec<String>,
    pub total: usize,
}

impl<T> BatchOutcome<T> {
    pub fn new(total: usize) -> Self {
        Self {
            processed: Vec::with_capacity(total),
            errors: Vec::new(),
            total,
        }
    }

    /// Registra el resultado de un registro. `label` identifica el
    /// registro en el mensaje de error ("record 2", "id 15").
    pub fn push(&mut self, label: impl Display, result: AppResult<T>) {
        match result {
            Ok(value) => self.processed.push(value),
            Err(err) => {
                if err.is_infrastructure() {
                    error!(%label, error = %err, "❌ Registro revertido por error de infraestructura");
                } else {
                    warn!(%label, error = %err, "⚠️ Registro rechazado");
                }
                self.errors.push(format_failure(label, &err));
            }
        }
    }

    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    pub fn failed_count(&self) -> usize {
        self.errors.len()
    }

    /// Ningún registro se confirmó
    pub fn nothing_processed(&self) -> bool {
        self.processed.is_empty()
    }
}

fn format_failure(label: impl Display, err: &AppError) -> String {
    format!("{}: {}", label, err)
}

/// Etiqueta 1-based para registros de entrada
pub fn record_label(index: usize) -> String {
    format!("record {}", index + 1)
}

/// Etiqueta para operaciones sobre ids ya confirmados
pub fn id_label(id: i64) -> String {
    format!("id {}", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_collects_ids_and_labelled_errors() {
        let mut outcome: BatchOutcome<i64> = BatchOutcome::new(3);
        outcome.push(record_label(0), Ok(10));
        outcome.push(record_label(1), Err(AppError::Validation("monto: required".into())));
        outcome.push(record_label(2), Ok(11));

        assert_eq!(outcome.processed, vec![10, 11]);
        assert_eq!(outcome.failed_count(), 1);
        assert!(outcome.errors[0].starts_with("record 2: "));
        assert!(outcome.errors[0].contains("monto"));
        assert!(!outcome.nothing_processed());
    }
}
