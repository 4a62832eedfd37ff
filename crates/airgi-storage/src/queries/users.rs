// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User profile operations.

use std::str::FromStr;

use airgi_core::types::{Identity, Role, UserId};
use airgi_core::AirgiError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};

type UserRow = (String, String, String, String);

fn row_to_identity((id, name, email, role): UserRow) -> Result<Identity, AirgiError> {
    let role = Role::from_str(&role).map_err(|e| AirgiError::Storage {
        source: format!("bad role `{role}` on user {id}: {e}").into(),
    })?;
    Ok(Identity {
        id: UserId(id),
        name,
        email,
        role,
    })
}

/// Insert or replace a user profile.
pub async fn upsert_user(db: &Database, profile: &Identity) -> Result<(), AirgiError> {
    let id = profile.id.0.clone();
    let name = profile.name.clone();
    let email = profile.email.clone();
    let role = profile.role.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, role)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     email = excluded.email,
                     role = excluded.role,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![id, name, email, role],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_user(db: &Database, id: &UserId) -> Result<Option<Identity>, AirgiError> {
    let id = id.0.clone();
    let row = db
        .connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, email, role FROM users WHERE id = ?1")?;
            match stmt.query_row(params![id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            }) {
                Ok(row) => Ok(Some(row)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    row.map(row_to_identity).transpose()
}

/// All user profiles, ordered by name.
pub async fn list_users(db: &Database) -> Result<Vec<Identity>, AirgiError> {
    let rows: Vec<UserRow> = db
        .connection()
        .call(|conn| {
            let mut stmt = conn.prepare("SELECT id, name, email, role FROM users ORDER BY name")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;

    rows.into_iter().map(row_to_identity).collect()
}
