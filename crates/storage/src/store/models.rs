#![forbid(unsafe_code)]

use super::{InsertModelRequest, ModelRow, SqliteStore, StoreError, UpdateStateRequest};
use rusqlite::{OptionalExtension, params};
use ss_core::model::initial_states_key;
use ss_core::{Model, apply_state_update};

const MODEL_COLUMNS: &str = "id, name, owner_id, model_json, created_at_ms, updated_at_ms";

fn model_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ModelRow> {
    let created_at_ms: i64 = row.get(4)?;
    Ok(ModelRow {
        id: row.get(0)?,
        name: row.get(1)?,
        owner_id: row.get(2)?,
        model_json: row.get(3)?,
        created_at_ms,
        updated_at_ms: row.get::<_, Option<i64>>(5)?.unwrap_or(created_at_ms),
    })
}

impl SqliteStore {
    pub fn insert_model(&mut self, request: InsertModelRequest) -> Result<ModelRow, StoreError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("model name must not be empty"));
        }
        if request.model.scales.is_empty() {
            return Err(StoreError::InvalidInput("model must have at least one scale"));
        }
        let model_json = serde_json::to_string(&request.model.resolved()?)?;

        self.conn.execute(
            "INSERT INTO models(name, owner_id, model_json, created_at_ms, updated_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![name, request.owner_id, model_json, request.created_at_ms],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_model(id)
    }

    pub fn get_model(&self, model_id: i64) -> Result<ModelRow, StoreError> {
        self.conn
            .query_row(
                &format!("SELECT {MODEL_COLUMNS} FROM models WHERE id=?1"),
                params![model_id],
                model_from_row,
            )
            .optional()?
            .ok_or(StoreError::UnknownId)
    }

    pub fn list_models(&self, owner_id: Option<i64>) -> Result<Vec<ModelRow>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MODEL_COLUMNS} FROM models \
             WHERE ?1 IS NULL OR owner_id=?1 \
             ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map(params![owner_id], model_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Applies a label/description/event edit to every state of the cluster, on every
    /// scale, and persists the model.
    pub fn update_model_state(
        &mut self,
        request: UpdateStateRequest,
    ) -> Result<ModelRow, StoreError> {
        if request.initial_states.is_empty() {
            return Err(StoreError::InvalidInput("initial states must not be empty"));
        }
        let key = initial_states_key(&request.initial_states);

        let tx = self.conn.transaction()?;
        let raw = tx
            .query_row(
                "SELECT model_json FROM models WHERE id=?1",
                params![request.model_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .ok_or(StoreError::UnknownId)?;
        let mut model = Model::from_json(&raw)?;
        if apply_state_update(&mut model, &key, &request.update)? == 0 {
            return Err(StoreError::UnknownStateKey);
        }
        tx.execute(
            "UPDATE models SET model_json=?2, updated_at_ms=?3 WHERE id=?1",
            params![
                request.model_id,
                serde_json::to_string(&model)?,
                request.updated_at_ms
            ],
        )?;
        tx.commit()?;
        self.get_model(request.model_id)
    }
}
