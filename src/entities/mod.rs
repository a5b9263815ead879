//! Shared entity lifecycle over the single-table store.
//!
//! Every domain entity declares an ordered field schema — name, kind,
//! mutability — consulted by create-time validation, update-patch cleaning and
//! the update whitelist, so the three can never drift apart. Storage records
//! use reserved-word-safe attribute names (`id_`, `name_`, `status_`,
//! `comment_`); client shapes rename them back and drop storage-only
//! attributes.

pub mod cart;
pub mod menu_item;
pub mod order;
pub mod restaurant;
pub mod user;

use std::str::FromStr;

use anyhow::Context;
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::app_error::AppError;
use crate::store::gateway::Gateway;
use crate::store::{
    ATTR_GSI_USER_ORDERS_PARTKEY, ATTR_GSI_USER_ORDERS_SORTKEY, ATTR_PARTKEY, ATTR_SORTKEY,
    ATTR_TTL, Record, RecordKey,
};

/// Synthetic owner id for guest carts-less checkout flows.
pub const UNAUTHORIZED_USER: &str = "unauthorized_user";

pub const ATTR_RECORD_TYPE: &str = "record_type";
pub const ATTR_COMPANY_ID: &str = "company_id";

/// Shape check applied to a single stored attribute. These are type checks,
/// not business rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Str,
    Bool,
    /// Currency value, quantized to two decimal places.
    Money,
    /// Whole-number decimal (times of day, weight).
    Whole,
    /// Feedback rating, 1 through 5.
    Rating,
    List,
    Map,
}

impl Kind {
    pub fn is_valid(self, value: &Value) -> bool {
        match self {
            Self::Str => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Money | Self::Whole => value.is_number(),
            Self::Rating => match value {
                Value::Number(n) => Decimal::from_str(&n.to_string())
                    .is_ok_and(|rate| rate >= Decimal::ONE && rate <= Decimal::from(5)),
                _ => false,
            },
            Self::List => value.is_array(),
            Self::Map => value.is_object(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    /// Required at creation, never updated afterwards.
    CreateOnly,
    /// Required at creation and updatable.
    Required,
    /// Updatable, validated only when present.
    Optional,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: Kind,
    pub mutability: Mutability,
}

pub const fn field(name: &'static str, kind: Kind, mutability: Mutability) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        mutability,
    }
}

/// Attributes that exist only in storage and never reach clients.
const STORAGE_ONLY_ATTRS: &[&str] = &[
    ATTR_PARTKEY,
    ATTR_SORTKEY,
    ATTR_GSI_USER_ORDERS_PARTKEY,
    ATTR_GSI_USER_ORDERS_SORTKEY,
    ATTR_TTL,
    ATTR_RECORD_TYPE,
    ATTR_COMPANY_ID,
];

/// Reserved-word-safe storage name → natural client name.
const FROM_DB_RENAMES: &[(&str, &str)] = &[
    ("id_", "id"),
    ("name_", "name"),
    ("status_", "status"),
    ("comment_", "comment"),
];

fn rename_attr(record: &mut Record, from: &str, to: &str) {
    if let Some(value) = record.remove(from) {
        record.entry(to.to_owned()).or_insert(value);
    }
}

/// Translate a storage record into its client shape.
pub fn to_client_shape(mut record: Record) -> Record {
    for attr in STORAGE_ONLY_ATTRS {
        record.remove(*attr);
    }
    for (from, to) in FROM_DB_RENAMES {
        rename_attr(&mut record, from, to);
    }
    record
}

/// Translate client field names back into storage attribute names.
pub fn to_storage_shape(mut record: Record) -> Record {
    for (db_name, client_name) in FROM_DB_RENAMES {
        rename_attr(&mut record, client_name, db_name);
    }
    record
}

/// ISO-8601 UTC timestamp with second precision, the format every
/// `date_created`/`date_updated` field uses.
pub fn now_iso() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

/// Epoch timestamp for a TTL `hours` from now.
pub fn ttl_in_hours(hours: i64) -> i64 {
    (chrono::Utc::now() + chrono::Duration::hours(hours)).timestamp()
}

pub fn new_entity_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Short order ids, the first group of a v4 uuid.
pub fn new_order_id() -> String {
    uuid::Uuid::new_v4()
        .to_string()
        .split('-')
        .next()
        .unwrap_or_default()
        .to_owned()
}

pub trait TableEntity: Serialize + DeserializeOwned {
    const RECORD_TYPE: &'static str;

    fn schema() -> &'static [FieldSpec];

    fn primary_key(&self) -> RecordKey;

    /// Secondary-index attributes written alongside the primary key. Default:
    /// none.
    fn index_projection(&self) -> Record {
        Record::new()
    }

    /// Serialize to the storage shape: the entity's own fields plus key and
    /// record-type attributes.
    fn to_record(&self) -> Result<Record, AppError> {
        let value = serde_json::to_value(self)
            .with_context(|| format!("Failed to serialize {}", Self::RECORD_TYPE))?;
        let Value::Object(mut record) = value else {
            return Err(AppError::Other(anyhow::anyhow!(
                "{} did not serialize to an object",
                Self::RECORD_TYPE
            )));
        };
        let key = self.primary_key();
        record.insert(ATTR_PARTKEY.to_owned(), Value::String(key.partkey));
        record.insert(ATTR_SORTKEY.to_owned(), Value::String(key.sortkey));
        record.insert(
            ATTR_RECORD_TYPE.to_owned(),
            Value::String(Self::RECORD_TYPE.to_owned()),
        );
        record.extend(self.index_projection());
        Ok(record)
    }

    fn from_record(record: Record) -> Result<Self, AppError> {
        serde_json::from_value(Value::Object(record))
            .with_context(|| format!("Failed to deserialize {} record", Self::RECORD_TYPE))
            .map_err(AppError::Other)
    }

    /// Client shape of this entity: storage-only attributes stripped, safe
    /// names translated back.
    fn to_client(&self) -> Result<Record, AppError> {
        Ok(to_client_shape(self.to_record()?))
    }

    /// Create-time validation: every required field must be present and
    /// well-shaped, optional fields are checked only when present. Fails on
    /// the first offending field.
    fn validate_record(record: &Record) -> Result<(), AppError> {
        for spec in Self::schema() {
            let value = record.get(spec.name);
            let valid = match spec.mutability {
                Mutability::CreateOnly | Mutability::Required => {
                    value.is_some_and(|v| spec.kind.is_valid(v))
                }
                Mutability::Optional => {
                    value.is_none_or(|v| v.is_null() || spec.kind.is_valid(v))
                }
            };
            if !valid {
                tracing::warn!(
                    record_type = Self::RECORD_TYPE,
                    field = spec.name,
                    "validation failed"
                );
                return Err(AppError::Validation(spec.name.to_owned()));
            }
        }
        Ok(())
    }

    /// Updatable attribute names: everything not create-only.
    fn update_whitelist() -> Vec<&'static str> {
        Self::schema()
            .iter()
            .filter(|spec| spec.mutability != Mutability::CreateOnly)
            .map(|spec| spec.name)
            .collect()
    }

    /// Attributes an update may clear by sending an empty value. Default:
    /// none.
    fn deletable_fields() -> Vec<&'static str> {
        Vec::new()
    }

    /// Build a cleaned update patch from the current field values: only
    /// updatable fields survive, and invalid values are dropped with a
    /// warning instead of rejecting the whole update.
    fn clean_update_patch(&self) -> Result<Record, AppError> {
        let record = self.to_record()?;
        let mut patch = Record::new();
        for spec in Self::schema() {
            if spec.mutability == Mutability::CreateOnly {
                continue;
            }
            let Some(value) = record.get(spec.name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            if spec.kind.is_valid(value) {
                patch.insert(spec.name.to_owned(), value.clone());
            } else {
                tracing::warn!(
                    record_type = Self::RECORD_TYPE,
                    field = spec.name,
                    "field value is not valid, removing from update patch"
                );
            }
        }
        Ok(patch)
    }

    /// Validate and insert the storage record. Creation is an unconditional
    /// put: ids are v4 uuids, so collisions are not defended against.
    fn create(&self, gateway: &Gateway) -> impl Future<Output = Result<(), AppError>> + Send
    where
        Self: Sync,
    {
        async move {
            let record = self.to_record()?;
            Self::validate_record(&record)?;
            let key = self.primary_key();
            gateway.put(record).await?;
            tracing::info!(
                record_type = Self::RECORD_TYPE,
                partkey = %key.partkey,
                sortkey = %key.sortkey,
                "record successfully created"
            );
            Ok(())
        }
    }

    /// Apply the cleaned patch through the gateway whitelist.
    fn update(&self, gateway: &Gateway) -> impl Future<Output = Result<(), AppError>> + Send
    where
        Self: Sync,
    {
        async move {
            let patch = self.clean_update_patch()?;
            let key = self.primary_key();
            gateway
                .update(
                    &key,
                    patch,
                    &Self::update_whitelist(),
                    &Self::deletable_fields(),
                )
                .await?;
            tracing::info!(
                record_type = Self::RECORD_TYPE,
                partkey = %key.partkey,
                sortkey = %key.sortkey,
                "record successfully updated"
            );
            Ok(())
        }
    }
}
